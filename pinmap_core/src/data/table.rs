use super::normalize_name;

/// A row that is keyed by its name.
pub trait Named {
    fn name(&self) -> &str;

    fn set_name(&mut self, name: String);
}

/// An ordered table of rows keyed by name. Names are unique within a table
/// and rows are kept in the order they were inserted; renaming a row keeps
/// its position.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Table<T> {
    rows: Vec<T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Table { rows: Vec::new() }
    }
}

impl<T: Named> Table<T> {
    pub fn get(&self, name: &str) -> Option<&T> {
        self.rows.iter().find(|row| row.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        self.rows.iter_mut().find(|row| row.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Finds the first row whose name matches `name` after trimming and
    /// lowercasing both sides.
    pub fn find_normalized(&self, name: &str) -> Option<&T> {
        let wanted = normalize_name(name);
        self.rows.iter().find(|row| normalize_name(row.name()) == wanted)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + Clone {
        self.rows.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.rows.iter_mut()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + Clone {
        self.rows.iter().map(Named::name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends a row. Returns false, leaving the table unchanged, if a row
    /// with the same name already exists.
    pub(crate) fn insert(&mut self, row: T) -> bool {
        if self.contains(row.name()) {
            return false;
        }
        self.rows.push(row);
        true
    }

    /// Renames the row called `old` in place. Returns false if there is no
    /// such row or if `new` is already taken by a different row.
    pub(crate) fn rename(&mut self, old: &str, new: &str) -> bool {
        if old != new && self.contains(new) {
            return false;
        }
        match self.get_mut(old) {
            Some(row) => {
                row.set_name(new.to_owned());
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<T> {
        let index = self.rows.iter().position(|row| row.name() == name)?;
        Some(self.rows.remove(index))
    }

    pub(crate) fn clear(&mut self) {
        self.rows.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug, PartialEq, Eq, Clone)]
    struct Row(String);

    impl Named for Row {
        fn name(&self) -> &str {
            &self.0
        }

        fn set_name(&mut self, name: String) {
            self.0 = name;
        }
    }

    fn table(names: &[&str]) -> Table<Row> {
        let mut table = Table::default();
        for name in names {
            assert!(table.insert(Row(name.to_string())));
        }
        table
    }

    #[test]
    fn insert_rejects_duplicates() {
        let mut table = table(&["a", "b"]);
        assert!(!table.insert(Row("a".into())));
        assert!(table.insert(Row("A".into())));
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["a", "b", "A"]);
    }

    #[test]
    fn rename_keeps_position() {
        let mut table = table(&["a", "b", "c"]);
        assert!(table.rename("b", "z"));
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["a", "z", "c"]);

        // taken by another row
        assert!(!table.rename("a", "c"));
        // missing row
        assert!(!table.rename("b", "y"));
        // renaming to itself is allowed
        assert!(table.rename("a", "a"));
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["a", "z", "c"]);
    }

    #[test]
    fn find_normalized_ignores_case_and_padding() {
        let table = table(&["Weapons", "Safehouses"]);
        assert_eq!(table.find_normalized("  weapons "), Some(&Row("Weapons".into())));
        assert_eq!(table.find_normalized("shops"), None);
    }

    #[test]
    fn names_can_be_walked_twice() {
        let table = table(&["a", "b"]);
        let names = table.names();
        assert_eq!(names.clone().count(), 2);
        assert!(names.clone().any(|name| name == "b"));
        assert_eq!(names.collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn remove_returns_row() {
        let mut table = table(&["a", "b"]);
        assert_eq!(table.remove("a"), Some(Row("a".into())));
        assert_eq!(table.remove("a"), None);
        assert_eq!(table.len(), 1);
    }
}
