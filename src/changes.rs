//! Pending changes as insert/update/delete operations.
//!
//! [`Table::changes`] and [`Dataset::changes`] walk the rows that are not Unchanged and
//! describe each as the operation a persistence layer would have to apply:
//!
//! | Row state | Change                                              |
//! |-----------|-----------------------------------------------------|
//! | Added     | [`Change::Insert`] with the current values          |
//! | Modified  | [`Change::Update`] keyed by the original key        |
//! | Deleted   | [`Change::Delete`] keyed by the last-known key      |
//!
//! ```rust
//! use serde_dataset::{changes::Change, row, Table};
//!
//! let mut table = Table::new("Test");
//! table.append_row(row! { "IdTest" => 2, "Name" => "X" }).unwrap();
//! table.set_primary_key(["IdTest"]).unwrap();
//! table.modify_row(0, row! { "IdTest" => 3 }).unwrap();
//!
//! let changes: Vec<_> = table.changes().collect();
//! match &changes[0] {
//!     Change::Update { key, values, .. } => {
//!         assert_eq!(key, &row! { "IdTest" => 2 });
//!         assert_eq!(values.get("IdTest").and_then(|v| v.as_i64()), Some(3));
//!     }
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

use crate::{Dataset, RowState, Table, ValueMap};

/// One pending row operation.
#[derive(Clone, Debug, PartialEq)]
pub enum Change<'a> {
    /// A row to insert
    Insert {
        table: &'a str,
        row: usize,
        values: &'a ValueMap,
    },
    /// A row to update, located by its key before modification
    Update {
        table: &'a str,
        row: usize,
        key: ValueMap,
        values: &'a ValueMap,
    },
    /// A row to delete, located by its last-known key
    Delete {
        table: &'a str,
        row: usize,
        key: ValueMap,
    },
}

impl Change<'_> {
    #[must_use]
    pub fn table(&self) -> &str {
        match self {
            Change::Insert { table, .. } => table,
            Change::Update { table, .. } => table,
            Change::Delete { table, .. } => table,
        }
    }

    /// Index of the row in its table.
    #[must_use]
    pub fn row(&self) -> usize {
        match self {
            Change::Insert { row, .. } => *row,
            Change::Update { row, .. } => *row,
            Change::Delete { row, .. } => *row,
        }
    }

    #[must_use]
    pub fn state(&self) -> RowState {
        match self {
            Change::Insert { .. } => RowState::Added,
            Change::Update { .. } => RowState::Modified,
            Change::Delete { .. } => RowState::Deleted,
        }
    }
}

impl Table {
    /// Iterates over the pending changes, in row order.
    pub fn changes(&self) -> impl Iterator<Item = Change<'_>> + '_ {
        let name = self.name();
        self.rows()
            .iter()
            .enumerate()
            .filter_map(move |(index, row)| match row.state() {
                RowState::Unchanged => None,
                RowState::Added => Some(Change::Insert {
                    table: name,
                    row: index,
                    values: row.current(),
                }),
                RowState::Modified => Some(Change::Update {
                    table: name,
                    row: index,
                    key: row.original_key().cloned().unwrap_or_default(),
                    values: row.current(),
                }),
                RowState::Deleted => Some(Change::Delete {
                    table: name,
                    row: index,
                    key: row.key(self.primary_key()),
                }),
            })
    }
}

impl Dataset {
    /// Iterates over the pending changes of every table, table by table.
    pub fn changes(&self) -> impl Iterator<Item = Change<'_>> + '_ {
        self.tables().flat_map(Table::changes)
    }
}
