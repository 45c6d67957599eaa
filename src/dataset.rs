//! Named collections of tables.

use crate::table::Checkpoint;
use crate::Table;
use indexmap::IndexMap;

/// An ordered collection of uniquely named [`Table`]s.
///
/// Tables keep their insertion order; that is also the order they are encoded in.
///
/// # Examples
///
/// ```rust
/// use serde_dataset::{Dataset, Table};
///
/// let mut dataset = Dataset::new();
/// dataset.insert(Table::new("Orders"));
/// dataset.insert(Table::new("Lines"));
/// assert_eq!(dataset.names(), vec!["Orders", "Lines"]);
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Dataset {
    tables: IndexMap<String, Table>,
}

/// Shape of a dataset before a decode started.
#[derive(Debug)]
pub(crate) struct DatasetCheckpoint {
    len: usize,
    tables: Vec<Checkpoint>,
}

impl Dataset {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `table` under its own name, returning the table it replaces, if any.
    pub fn insert(&mut self, table: Table) -> Option<Table> {
        self.tables.insert(table.name().to_string(), table)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.get_mut(name)
    }

    /// Returns the table called `name`, adding an empty one at the end if there is none.
    pub fn table_mut(&mut self, name: &str) -> &mut Table {
        self.tables
            .entry(name.to_string())
            .or_insert_with(|| Table::new(name))
    }

    /// Removes a table, keeping the order of the others.
    pub fn remove(&mut self, name: &str) -> Option<Table> {
        self.tables.shift_remove(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> + '_ {
        self.tables.values()
    }

    /// Iterates over `(name, table)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Table)> + '_ {
        self.tables.iter().map(|(name, table)| (name.as_str(), table))
    }

    pub fn tables_mut(&mut self) -> impl Iterator<Item = &mut Table> + '_ {
        self.tables.values_mut()
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Returns `true` if any table has pending changes.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.tables.values().any(Table::has_changes)
    }

    /// Commits the pending changes of every table.
    pub fn accept_changes(&mut self) {
        for table in self.tables.values_mut() {
            table.accept_changes();
        }
    }

    pub(crate) fn checkpoint(&self) -> DatasetCheckpoint {
        DatasetCheckpoint {
            len: self.tables.len(),
            tables: self.tables.values().map(Table::checkpoint).collect(),
        }
    }

    /// Drops tables added since `checkpoint` and rolls the others back.
    pub(crate) fn rollback(&mut self, checkpoint: DatasetCheckpoint) {
        self.tables.truncate(checkpoint.len);
        for (table, cp) in self.tables.values_mut().zip(checkpoint.tables) {
            table.rollback(cp);
        }
    }
}

impl FromIterator<Table> for Dataset {
    fn from_iter<I: IntoIterator<Item = Table>>(iter: I) -> Self {
        let mut dataset = Dataset::new();
        for table in iter {
            dataset.insert(table);
        }
        dataset
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Table;
    type IntoIter = indexmap::map::Values<'a, String, Table>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.values()
    }
}
