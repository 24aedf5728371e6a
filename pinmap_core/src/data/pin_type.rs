use super::table::{Named, Table};

/// Pin types in creation order, keyed by name. Names are unique across all
/// categories.
pub type PinTypesTable = Table<PinType>;

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PinType {
    /// The name of the pin type, e.g. "AK47". Pins refer to their type by
    /// this name.
    name: String,
    /// Marker color as a CSS hex string.
    pub color: String,
    pub visible: bool,
    /// The name of the category this pin type belongs to. Only checked when
    /// the pin type is created; a document may carry a dangling reference.
    category: String,
}

impl PinType {
    pub fn new(name: impl Into<String>, category: impl Into<String>, color: impl Into<String>) -> Self {
        PinType { name: name.into(), color: color.into(), visible: true, category: category.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub(crate) fn set_category(&mut self, category: String) {
        self.category = category;
    }
}

impl Named for PinType {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

pub const DEFAULT_PALETTE: [&str; 12] = [
    "#e74c3c", "#2ecc71", "#3498db", "#f39c12", "#9b59b6", "#1abc9c", "#e84393", "#6c5ce7",
    "#fd79a8", "#fdcb6e", "#00b894", "#0984e3",
];

pub const FALLBACK_COLOR: &str = "#555";

/// The colors handed out to new pin types.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Palette {
    colors: Vec<String>,
    fallback: String,
}

impl Palette {
    pub fn new(colors: Vec<String>, fallback: impl Into<String>) -> Self {
        Palette { colors, fallback: fallback.into() }
    }

    /// Returns the first palette color that none of `used` matches, or the
    /// fallback once every palette color is taken.
    pub fn next_unused<'a>(&self, used: impl Iterator<Item = &'a str> + Clone) -> &str {
        self.colors
            .iter()
            .find(|color| !used.clone().any(|u| u == color.as_str()))
            .unwrap_or(&self.fallback)
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }
}

impl Default for Palette {
    fn default() -> Self {
        Palette::new(DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(), FALLBACK_COLOR)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn next_unused_skips_taken_colors() {
        let palette = Palette::default();
        assert_eq!(palette.next_unused(std::iter::empty()), "#e74c3c");
        assert_eq!(palette.next_unused(["#e74c3c", "#3498db"].into_iter()), "#2ecc71");
    }

    #[test]
    fn next_unused_falls_back_when_exhausted() {
        let palette = Palette::default();
        assert_eq!(palette.next_unused(DEFAULT_PALETTE.into_iter()), FALLBACK_COLOR);
    }
}
