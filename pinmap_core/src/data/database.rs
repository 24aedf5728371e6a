use super::{
    pin::{Pin, PinEdit, PinEditError, PinId, PinStore},
    pin_type::Palette,
    taxonomy::{Taxonomy, TaxonomyError},
};

/// Everything a map annotation set consists of: the taxonomy and the pins
/// placed with it. This is the unit that is saved, exported and imported.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct Database {
    taxonomy: Taxonomy,
    pins: PinStore,
}

impl Database {
    pub fn new() -> Self {
        Database::default()
    }

    pub fn with_palette(palette: Palette) -> Self {
        Database { taxonomy: Taxonomy::with_palette(palette), pins: PinStore::new() }
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    pub fn pins(&self) -> &PinStore {
        &self.pins
    }

    pub fn get_pin(&self, id: PinId) -> Option<&Pin> {
        self.pins.get(id)
    }

    pub fn create_category(&mut self, name: &str) -> Result<(), TaxonomyError> {
        self.taxonomy.create_category(name)
    }

    pub fn rename_category(&mut self, old: &str, new: &str) -> Result<(), TaxonomyError> {
        self.taxonomy.rename_category(old, new)
    }

    pub fn delete_category(&mut self, name: &str) -> Result<(), TaxonomyError> {
        self.taxonomy.delete_category(name, &mut self.pins)
    }

    pub fn set_category_visible(&mut self, name: &str, visible: bool) -> Result<(), TaxonomyError> {
        self.taxonomy.set_category_visible(name, visible)
    }

    pub fn toggle_category_collapsed(&mut self, name: &str) -> Result<bool, TaxonomyError> {
        self.taxonomy.toggle_category_collapsed(name)
    }

    pub fn create_pin_type(
        &mut self,
        name: &str,
        category: &str,
        color: Option<&str>,
    ) -> Result<(), TaxonomyError> {
        self.taxonomy.create_pin_type(name, category, color)
    }

    pub fn rename_pin_type(&mut self, old: &str, new: &str) -> Result<(), TaxonomyError> {
        self.taxonomy.rename_pin_type(old, new, &mut self.pins)
    }

    pub fn delete_pin_type(&mut self, name: &str) -> Result<(), TaxonomyError> {
        self.taxonomy.delete_pin_type(name, &mut self.pins)
    }

    pub fn set_pin_type_visible(&mut self, name: &str, visible: bool) -> Result<(), TaxonomyError> {
        self.taxonomy.set_pin_type_visible(name, visible)
    }

    pub fn set_pin_type_color(&mut self, name: &str, color: &str) -> Result<(), TaxonomyError> {
        self.taxonomy.set_pin_type_color(name, color)
    }

    pub fn set_active_pin_type(&mut self, name: &str) -> Result<(), TaxonomyError> {
        self.taxonomy.set_active_pin_type(name)
    }

    /// Places a pin. Pins whose type does not exist are dropped and `None` is
    /// returned.
    pub fn place_pin(&mut self, pin: Pin) -> Option<PinId> {
        self.pins.place(&self.taxonomy, pin)
    }

    pub fn remove_pin(&mut self, id: PinId) -> Option<Pin> {
        self.pins.remove(id)
    }

    pub fn move_pin(&mut self, id: PinId, x: f64, y: f64) -> bool {
        self.pins.move_to(id, x, y)
    }

    pub fn edit_pin(&mut self, id: PinId, edit: &PinEdit) -> Result<bool, PinEditError> {
        self.pins.apply_edit(id, edit)
    }

    pub fn clear_pins(&mut self) {
        self.pins.clear();
    }

    /// Empties the database, keeping its palette.
    pub(crate) fn clear(&mut self) {
        self.taxonomy.clear();
        self.pins.clear();
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut Taxonomy, &mut PinStore) {
        (&mut self.taxonomy, &mut self.pins)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn db_place_requires_known_type() {
        let mut db = Database::new();
        assert_eq!(db.place_pin(Pin::new(1.0, 1.0, "AK47")), None);

        db.create_category("Weapons").unwrap();
        db.create_pin_type("AK47", "Weapons", None).unwrap();
        let id = db.place_pin(Pin::new(1.0, 1.0, "AK47")).unwrap();
        assert_eq!(db.get_pin(id), Some(&Pin::new(1.0, 1.0, "AK47")));
    }

    #[test]
    fn db_cascades_reach_pins() {
        let mut db = Database::new();
        db.create_category("Weapons").unwrap();
        db.create_pin_type("AK47", "Weapons", None).unwrap();
        db.place_pin(Pin::new(1.0, 1.0, "AK47")).unwrap();
        db.place_pin(Pin::new(2.0, 2.0, "AK47")).unwrap();

        db.rename_pin_type("AK47", "Rifle").unwrap();
        assert!(db.pins().iter().all(|(_, pin)| pin.pin_type() == "Rifle"));

        db.delete_category("Weapons").unwrap();
        assert!(db.pins().is_empty());
        assert!(db.taxonomy().pin_types().is_empty());
    }

    #[test]
    fn db_clear_pins_keeps_taxonomy() {
        let mut db = Database::new();
        db.create_category("Weapons").unwrap();
        db.create_pin_type("AK47", "Weapons", None).unwrap();
        db.place_pin(Pin::new(1.0, 1.0, "AK47")).unwrap();

        db.clear_pins();
        assert!(db.pins().is_empty());
        assert_eq!(db.taxonomy().active_pin_type(), Some("AK47"));
    }
}
