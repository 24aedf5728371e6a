use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use super::taxonomy::Taxonomy;

static IMAGE_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://").expect("valid regex"));

/// Returns whether `url` may be stored as a pin's image link.
pub fn is_valid_image_url(url: &str) -> bool {
    IMAGE_URL_RE.is_match(url)
}

/// A handle to a pin placed in a `PinStore`. Handles are never reused within
/// one store, but they are not persisted; a reloaded store hands out new ones.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone, PartialOrd, Ord)]
pub struct PinId(u64);

/// A single annotation on the map.
#[derive(Debug, PartialEq, Clone)]
pub struct Pin {
    /// Horizontal image coordinate.
    pub x: f64,
    /// Vertical image coordinate, growing downward like image rows.
    pub y: f64,
    pin_type: String,
    comment: Option<String>,
    image_url: Option<String>,
}

impl Pin {
    pub fn new(x: f64, y: f64, pin_type: impl Into<String>) -> Self {
        Pin { x, y, pin_type: pin_type.into(), comment: None, image_url: None }
    }

    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = non_blank(comment);
        self
    }

    /// Attaches an image link. Links that are not http(s) URLs are dropped.
    pub fn with_image_url(mut self, url: &str) -> Self {
        self.image_url = non_blank(url).filter(|url| is_valid_image_url(url));
        self
    }

    pub fn pin_type(&self) -> &str {
        &self.pin_type
    }

    /// The pin's comment, or the empty string if it has none.
    pub fn comment(&self) -> &str {
        self.comment.as_deref().unwrap_or("")
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}

/// The values submitted from the pin editor. Blank fields remove the
/// corresponding attribute.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct PinEdit {
    pub comment: String,
    pub image_url: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PinEditError {
    #[error("Image URL must start with http:// or https://, got \"{0}\"")]
    InvalidUrl(String),
}

/// Placed pins in insertion order. Insertion order is the stacking order of
/// the markers, so it is preserved across export and import.
#[derive(Debug, PartialEq, Clone)]
pub struct PinStore {
    /// The next ID to be assigned to a pin.
    next_pin_id: PinId,
    pins: Vec<(PinId, Pin)>,
}

impl Default for PinStore {
    fn default() -> Self {
        PinStore { next_pin_id: PinId(0), pins: Vec::new() }
    }
}

impl PinStore {
    pub fn new() -> Self {
        PinStore::default()
    }

    // Returns a unique `PinId` and marks that ID as used. Panics if the ID
    // space for this store is exhausted.
    fn gen_unique_pin_id(&mut self) -> PinId {
        let id = self.next_pin_id;
        self.next_pin_id = PinId(id.0.checked_add(1).expect("pin id space exhausted"));
        id
    }

    /// Adds a pin to the end of the store, returning its handle. Does nothing
    /// and returns `None` if the pin's type does not exist in `taxonomy`.
    pub fn place(&mut self, taxonomy: &Taxonomy, pin: Pin) -> Option<PinId> {
        if !taxonomy.pin_types().contains(pin.pin_type()) {
            tracing::debug!(pin_type = %pin.pin_type, x = pin.x, y = pin.y, "dropping pin of unknown type");
            return None;
        }
        let id = self.gen_unique_pin_id();
        self.pins.push((id, pin));
        Some(id)
    }

    pub fn get(&self, id: PinId) -> Option<&Pin> {
        self.pins.iter().find(|(pin_id, _)| *pin_id == id).map(|(_, pin)| pin)
    }

    fn get_mut(&mut self, id: PinId) -> Option<&mut Pin> {
        self.pins.iter_mut().find(|(pin_id, _)| *pin_id == id).map(|(_, pin)| pin)
    }

    pub fn remove(&mut self, id: PinId) -> Option<Pin> {
        let index = self.pins.iter().position(|(pin_id, _)| *pin_id == id)?;
        Some(self.pins.remove(index).1)
    }

    /// Moves a pin to new image coordinates. Returns whether the pin exists.
    pub fn move_to(&mut self, id: PinId, x: f64, y: f64) -> bool {
        match self.get_mut(id) {
            Some(pin) => {
                pin.x = x;
                pin.y = y;
                true
            }
            None => false,
        }
    }

    /// Sets or, when `comment` is blank, removes a pin's comment. Returns
    /// whether the pin exists.
    pub fn set_comment(&mut self, id: PinId, comment: &str) -> bool {
        match self.get_mut(id) {
            Some(pin) => {
                pin.comment = non_blank(comment);
                true
            }
            None => false,
        }
    }

    /// Sets or, when `url` is blank, removes a pin's image link. Returns
    /// whether the pin exists.
    pub fn set_image_url(&mut self, id: PinId, url: &str) -> Result<bool, PinEditError> {
        let url = validated_url(url)?;
        Ok(match self.get_mut(id) {
            Some(pin) => {
                pin.image_url = url;
                true
            }
            None => false,
        })
    }

    /// Applies an editor submission. Nothing is changed if the image URL is
    /// invalid.
    pub fn apply_edit(&mut self, id: PinId, edit: &PinEdit) -> Result<bool, PinEditError> {
        let url = validated_url(&edit.image_url)?;
        Ok(match self.get_mut(id) {
            Some(pin) => {
                pin.comment = non_blank(&edit.comment);
                pin.image_url = url;
                true
            }
            None => false,
        })
    }

    pub fn clear(&mut self) {
        self.pins.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (PinId, &Pin)> {
        self.pins.iter().map(|(id, pin)| (*id, pin))
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    /// Removes every pin of the given type, returning how many were removed.
    pub(crate) fn remove_type(&mut self, pin_type: &str) -> usize {
        let before = self.pins.len();
        self.pins.retain(|(_, pin)| pin.pin_type != pin_type);
        before - self.pins.len()
    }

    /// Points every pin of type `old` at `new`, returning how many changed.
    pub(crate) fn rename_type(&mut self, old: &str, new: &str) -> usize {
        let mut renamed = 0;
        for (_, pin) in self.pins.iter_mut().filter(|(_, pin)| pin.pin_type == old) {
            pin.pin_type = new.to_owned();
            renamed += 1;
        }
        renamed
    }
}

fn validated_url(url: &str) -> Result<Option<String>, PinEditError> {
    match non_blank(url) {
        Some(url) if !is_valid_image_url(&url) => Err(PinEditError::InvalidUrl(url)),
        url => Ok(url),
    }
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;

    use super::*;

    fn taxonomy() -> Taxonomy {
        let mut taxonomy = Taxonomy::default();
        taxonomy.create_category("Weapons").unwrap();
        taxonomy.create_pin_type("AK47", "Weapons", None).unwrap();
        taxonomy.create_pin_type("Pistol", "Weapons", None).unwrap();
        taxonomy
    }

    #[test]
    fn image_url_pattern() {
        assert!(is_valid_image_url("https://example.com/a.png"));
        assert!(is_valid_image_url("http://example.com"));
        assert!(!is_valid_image_url("ftp://example.com"));
        assert!(!is_valid_image_url("example.com/https://"));
    }

    #[test]
    fn place_skips_unknown_types() {
        let taxonomy = taxonomy();
        let mut store = PinStore::new();
        assert!(store.place(&taxonomy, Pin::new(1.0, 2.0, "AK47")).is_some());
        assert_eq!(store.place(&taxonomy, Pin::new(1.0, 2.0, "Bunker")), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn ids_are_not_reused() {
        let taxonomy = taxonomy();
        let mut store = PinStore::new();
        let a = store.place(&taxonomy, Pin::new(1.0, 2.0, "AK47")).unwrap();
        store.remove(a);
        let b = store.place(&taxonomy, Pin::new(1.0, 2.0, "AK47")).unwrap();
        assert_ne!(a, b);
        assert_eq!(store.get(a), None);
    }

    #[test]
    fn blank_fields_remove_attributes() {
        let taxonomy = taxonomy();
        let mut store = PinStore::new();
        let id = store
            .place(
                &taxonomy,
                Pin::new(0.0, 0.0, "AK47").with_comment("loot").with_image_url("https://x.io/a.png"),
            )
            .unwrap();
        assert_eq!(store.get(id).unwrap().comment(), "loot");

        assert!(store.set_comment(id, "   "));
        assert_eq!(store.get(id).unwrap().comment(), "");
        assert_eq!(store.set_image_url(id, ""), Ok(true));
        assert_eq!(store.get(id).unwrap().image_url(), None);
    }

    #[test]
    fn invalid_edit_changes_nothing() {
        let taxonomy = taxonomy();
        let mut store = PinStore::new();
        let id = store.place(&taxonomy, Pin::new(0.0, 0.0, "AK47").with_comment("old")).unwrap();

        let edit = PinEdit { comment: "new".into(), image_url: "javascript:alert(1)".into() };
        assert_matches!(store.apply_edit(id, &edit), Err(PinEditError::InvalidUrl(_)));
        assert_eq!(store.get(id).unwrap().comment(), "old");

        let edit = PinEdit { comment: "new".into(), image_url: " https://x.io/b.png ".into() };
        assert_eq!(store.apply_edit(id, &edit), Ok(true));
        let pin = store.get(id).unwrap();
        assert_eq!(pin.comment(), "new");
        assert_eq!(pin.image_url(), Some("https://x.io/b.png"));
    }

    #[test]
    fn move_to_updates_coordinates() {
        let taxonomy = taxonomy();
        let mut store = PinStore::new();
        let id = store.place(&taxonomy, Pin::new(0.0, 0.0, "AK47")).unwrap();
        assert!(store.move_to(id, 5.5, 6.5));
        assert_eq!((store.get(id).unwrap().x, store.get(id).unwrap().y), (5.5, 6.5));
        store.clear();
        assert!(!store.move_to(id, 1.0, 1.0));
    }

    #[test]
    fn type_cascades_touch_only_matching_pins() {
        let taxonomy = taxonomy();
        let mut store = PinStore::new();
        store.place(&taxonomy, Pin::new(0.0, 0.0, "AK47"));
        store.place(&taxonomy, Pin::new(1.0, 0.0, "Pistol"));
        store.place(&taxonomy, Pin::new(2.0, 0.0, "AK47"));

        assert_eq!(store.rename_type("AK47", "Rifle"), 2);
        assert_eq!(store.remove_type("Rifle"), 2);
        assert_eq!(store.iter().map(|(_, pin)| pin.pin_type()).collect::<Vec<_>>(), vec!["Pistol"]);
    }
}
