use thiserror::Error;

use super::{
    category::{CategoriesTable, Category},
    pin::PinStore,
    pin_type::{Palette, PinType, PinTypesTable},
};

/// Error type for edits to categories and pin types. A failed edit leaves the
/// taxonomy and the pins untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaxonomyError {
    #[error("Name must not be empty")]
    EmptyName,
    #[error("\"{0}\" already exists")]
    DuplicateName(String),
    #[error("Category \"{0}\" does not exist")]
    NoCategory(String),
    #[error("\"{0}\" does not exist")]
    NotFound(String),
}

/// The user-editable set of categories and pin types, along with the pin type
/// that newly placed pins get.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct Taxonomy {
    categories: CategoriesTable,
    pin_types: PinTypesTable,
    /// The pin type that placing a pin uses. Cleared whenever a category or
    /// pin type is deleted.
    active_pin_type: Option<String>,
    palette: Palette,
}

fn checked_name(name: &str) -> Result<&str, TaxonomyError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TaxonomyError::EmptyName);
    }
    Ok(name)
}

impl Taxonomy {
    pub fn with_palette(palette: Palette) -> Self {
        Taxonomy { palette, ..Default::default() }
    }

    pub fn categories(&self) -> &CategoriesTable {
        &self.categories
    }

    pub fn pin_types(&self) -> &PinTypesTable {
        &self.pin_types
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn active_pin_type(&self) -> Option<&str> {
        self.active_pin_type.as_deref()
    }

    /// The pin types belonging to `category`, in creation order.
    pub fn pin_types_in<'s>(&'s self, category: &'s str) -> impl Iterator<Item = &'s PinType> + 's {
        self.pin_types.iter().filter(move |pin_type| pin_type.category() == category)
    }

    pub fn create_category(&mut self, name: &str) -> Result<(), TaxonomyError> {
        let name = checked_name(name)?;
        if !self.categories.insert(Category::new(name)) {
            return Err(TaxonomyError::DuplicateName(name.to_owned()));
        }
        tracing::debug!(category = %name, "created category");
        Ok(())
    }

    /// Renames a category and repoints its pin types at the new name. Pins
    /// refer to pin types, so they are unaffected.
    pub fn rename_category(&mut self, old: &str, new: &str) -> Result<(), TaxonomyError> {
        let new = checked_name(new)?;
        if !self.categories.contains(old) {
            return Err(TaxonomyError::NotFound(old.to_owned()));
        }
        if !self.categories.rename(old, new) {
            return Err(TaxonomyError::DuplicateName(new.to_owned()));
        }
        for pin_type in self.pin_types.iter_mut().filter(|pin_type| pin_type.category() == old) {
            pin_type.set_category(new.to_owned());
        }
        tracing::debug!(old = %old, new = %new, "renamed category");
        Ok(())
    }

    /// Deletes a category along with its pin types and all of their pins. The
    /// active pin type is cleared even if it belonged to another category.
    pub fn delete_category(&mut self, name: &str, pins: &mut PinStore) -> Result<(), TaxonomyError> {
        if self.categories.remove(name).is_none() {
            return Err(TaxonomyError::NotFound(name.to_owned()));
        }
        let owned: Vec<String> =
            self.pin_types_in(name).map(|pin_type| pin_type.name().to_owned()).collect();
        for pin_type in owned {
            let removed = pins.remove_type(&pin_type);
            self.pin_types.remove(&pin_type);
            tracing::debug!(pin_type = %pin_type, pins = removed, "deleted pin type with category");
        }
        self.active_pin_type = None;
        tracing::debug!(category = %name, "deleted category");
        Ok(())
    }

    /// Shows or hides a category. Showing it also turns every one of its pin
    /// types back on; hiding it leaves their flags as they were.
    pub fn set_category_visible(&mut self, name: &str, visible: bool) -> Result<(), TaxonomyError> {
        let category =
            self.categories.get_mut(name).ok_or_else(|| TaxonomyError::NotFound(name.to_owned()))?;
        category.visible = visible;
        if visible {
            for pin_type in self.pin_types.iter_mut().filter(|pin_type| pin_type.category() == name) {
                pin_type.visible = true;
            }
        }
        Ok(())
    }

    pub fn set_category_collapsed(&mut self, name: &str, collapsed: bool) -> Result<(), TaxonomyError> {
        let category =
            self.categories.get_mut(name).ok_or_else(|| TaxonomyError::NotFound(name.to_owned()))?;
        category.collapsed = collapsed;
        Ok(())
    }

    /// Flips a category's collapsed flag, returning the new value.
    pub fn toggle_category_collapsed(&mut self, name: &str) -> Result<bool, TaxonomyError> {
        let category =
            self.categories.get_mut(name).ok_or_else(|| TaxonomyError::NotFound(name.to_owned()))?;
        category.collapsed = !category.collapsed;
        Ok(category.collapsed)
    }

    /// Creates a pin type in an existing category and makes it the active pin
    /// type. Without an explicit color, the next unused palette color is used.
    pub fn create_pin_type(
        &mut self,
        name: &str,
        category: &str,
        color: Option<&str>,
    ) -> Result<(), TaxonomyError> {
        let name = checked_name(name)?;
        if self.pin_types.contains(name) {
            return Err(TaxonomyError::DuplicateName(name.to_owned()));
        }
        if category.trim().is_empty() || !self.categories.contains(category) {
            return Err(TaxonomyError::NoCategory(category.to_owned()));
        }
        let color = match color.map(str::trim).filter(|color| !color.is_empty()) {
            Some(color) => color.to_owned(),
            None => self.next_color().to_owned(),
        };
        tracing::debug!(pin_type = %name, category = %category, color = %color, "created pin type");
        self.pin_types.insert(PinType::new(name, category, color));
        self.active_pin_type = Some(name.to_owned());
        Ok(())
    }

    /// Renames a pin type and repoints its pins at the new name.
    pub fn rename_pin_type(
        &mut self,
        old: &str,
        new: &str,
        pins: &mut PinStore,
    ) -> Result<(), TaxonomyError> {
        let new = checked_name(new)?;
        if !self.pin_types.contains(old) {
            return Err(TaxonomyError::NotFound(old.to_owned()));
        }
        if !self.pin_types.rename(old, new) {
            return Err(TaxonomyError::DuplicateName(new.to_owned()));
        }
        let renamed = pins.rename_type(old, new);
        if self.active_pin_type.as_deref() == Some(old) {
            self.active_pin_type = Some(new.to_owned());
        }
        tracing::debug!(old = %old, new = %new, pins = renamed, "renamed pin type");
        Ok(())
    }

    /// Deletes a pin type and every pin of that type. The active pin type is
    /// cleared even if it was a different type.
    pub fn delete_pin_type(&mut self, name: &str, pins: &mut PinStore) -> Result<(), TaxonomyError> {
        if !self.pin_types.contains(name) {
            return Err(TaxonomyError::NotFound(name.to_owned()));
        }
        let removed = pins.remove_type(name);
        self.pin_types.remove(name);
        self.active_pin_type = None;
        tracing::debug!(pin_type = %name, pins = removed, "deleted pin type");
        Ok(())
    }

    /// Turns a pin type on or off. Turning on a type whose category is hidden
    /// shows the category with only this type enabled.
    pub fn set_pin_type_visible(&mut self, name: &str, visible: bool) -> Result<(), TaxonomyError> {
        let category_name = self
            .pin_types
            .get(name)
            .ok_or_else(|| TaxonomyError::NotFound(name.to_owned()))?
            .category()
            .to_owned();

        let solo = visible
            && self.categories.get(&category_name).is_some_and(|category| !category.visible);
        if solo {
            if let Some(category) = self.categories.get_mut(&category_name) {
                category.visible = true;
            }
            for sibling in
                self.pin_types.iter_mut().filter(|pin_type| pin_type.category() == category_name)
            {
                sibling.visible = false;
            }
            tracing::debug!(pin_type = %name, category = %category_name, "soloed pin type");
        }

        if let Some(pin_type) = self.pin_types.get_mut(name) {
            pin_type.visible = visible;
        }
        Ok(())
    }

    pub fn set_pin_type_color(&mut self, name: &str, color: &str) -> Result<(), TaxonomyError> {
        let pin_type =
            self.pin_types.get_mut(name).ok_or_else(|| TaxonomyError::NotFound(name.to_owned()))?;
        pin_type.color = color.trim().to_owned();
        Ok(())
    }

    pub fn set_active_pin_type(&mut self, name: &str) -> Result<(), TaxonomyError> {
        if !self.pin_types.contains(name) {
            return Err(TaxonomyError::NotFound(name.to_owned()));
        }
        self.active_pin_type = Some(name.to_owned());
        Ok(())
    }

    pub fn clear_active_pin_type(&mut self) {
        self.active_pin_type = None;
    }

    /// The first palette color not used by any pin type, or the fallback gray.
    pub fn next_color(&self) -> &str {
        self.palette.next_unused(self.pin_types.iter().map(|pin_type| pin_type.color.as_str()))
    }

    /// Inserts a category exactly as given, without validating its name.
    /// Returns false if the name is taken.
    pub(crate) fn insert_category(&mut self, category: Category) -> bool {
        self.categories.insert(category)
    }

    /// Inserts a pin type exactly as given, without checking that its
    /// category exists. Returns false if the name is taken.
    pub(crate) fn insert_pin_type(&mut self, pin_type: PinType) -> bool {
        self.pin_types.insert(pin_type)
    }

    /// Drops all categories and pin types, keeping the palette.
    pub(crate) fn clear(&mut self) {
        self.categories.clear();
        self.pin_types.clear();
        self.active_pin_type = None;
    }
}
