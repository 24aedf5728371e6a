pub mod category;
pub mod database;
pub mod pin;
pub mod pin_type;
pub mod table;
pub mod taxonomy;

/// The form of a name used when matching imported categories, pin types and
/// pins against existing ones: surrounding whitespace trimmed, lowercased.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
