use super::table::{Named, Table};

/// Categories in creation order, keyed by name.
pub type CategoriesTable = Table<Category>;

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Category {
    /// The name of the category, e.g. "Weapons". Acts as the key that pin
    /// types refer to.
    name: String,
    /// Whether pins of this category are shown at all. Pin types keep their
    /// own flags while the category is hidden.
    pub visible: bool,
    /// Whether the category's pin types are folded away in the side panel.
    pub collapsed: bool,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Category { name: name.into(), visible: true, collapsed: false }
    }

    pub fn with_flags(name: impl Into<String>, visible: bool, collapsed: bool) -> Self {
        Category { name: name.into(), visible, collapsed }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Category {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}
