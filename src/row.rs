//! Rows and their guarded state transitions.
//!
//! A [`Row`] carries its [`RowState`], its `current` cells and, only while Modified, the
//! original values of the primary-key columns. The only way to change a row's state is
//! through the transitions below; each checks the state it starts from.
//!
//! | Transition      | Allowed from                          | Result                       |
//! |-----------------|---------------------------------------|------------------------------|
//! | `mark_unchanged`| Unchanged, Added, Modified            | baseline; original key clear |
//! | `mark_added`    | Unchanged without original key        | Added                        |
//! | `mark_modified` | Unchanged, table has a primary key    | Modified + original key      |
//! | `mark_deleted`  | Unchanged, Added, Modified            | Deleted (terminal)           |

use crate::{Error, Result, RowState, Value, ValueMap};

const PRIMARY_KEY: &str = "primary key";

/// One row of a [`Table`](crate::Table).
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    state: RowState,
    current: ValueMap,
    original_key: Option<ValueMap>,
}

impl Row {
    /// A fresh Unchanged row. Callers normalise `current` to the table's column order.
    pub(crate) fn new(current: ValueMap) -> Self {
        Row {
            state: RowState::Unchanged,
            current,
            original_key: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> RowState {
        self.state
    }

    /// The row's present cells, one per table column, in column order.
    #[must_use]
    pub fn current(&self) -> &ValueMap {
        &self.current
    }

    /// The current value of a column, `None` if the table has no such column.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.current.get(column)
    }

    /// The pre-mutation primary-key values. `Some` only while the row is Modified.
    #[must_use]
    pub fn original_key(&self) -> Option<&ValueMap> {
        self.original_key.as_ref()
    }

    /// The value a column held before mutation.
    ///
    /// Only primary-key columns keep an original snapshot; every other column (and every
    /// column of a row that is not Modified) reports its current value.
    #[must_use]
    pub fn original(&self, column: &str) -> Option<&Value> {
        self.original_key
            .as_ref()
            .and_then(|key| key.get(column))
            .or_else(|| self.current.get(column))
    }

    /// The current values of the given key columns, in key order.
    #[must_use]
    pub fn key(&self, primary_key: &[String]) -> ValueMap {
        primary_key
            .iter()
            .map(|column| {
                let value = self.current.get(column).cloned().unwrap_or_default();
                (column.clone(), value)
            })
            .collect()
    }

    /// Accepts the row as a baseline.
    pub(crate) fn mark_unchanged(&mut self) -> Result<()> {
        if self.state == RowState::Deleted {
            return Err(Error::invalid_transition(self.state, RowState::Unchanged));
        }
        self.state = RowState::Unchanged;
        self.original_key = None;
        Ok(())
    }

    pub(crate) fn mark_added(&mut self) -> Result<()> {
        if self.state != RowState::Unchanged || self.original_key.is_some() {
            return Err(Error::invalid_transition(self.state, RowState::Added));
        }
        self.state = RowState::Added;
        Ok(())
    }

    /// Marks the row Modified, recording `original_key` as its pre-mutation key.
    ///
    /// `original_key` must name exactly the columns of `primary_key`; the stored copy is
    /// kept in key order. An original key equal to the current key is allowed.
    pub(crate) fn mark_modified(
        &mut self,
        primary_key: &[String],
        original_key: ValueMap,
    ) -> Result<()> {
        if self.state != RowState::Unchanged {
            return Err(Error::invalid_transition(self.state, RowState::Modified));
        }
        if primary_key.is_empty() {
            return Err(Error::missing_field(PRIMARY_KEY, None));
        }

        let ordered = order_original_key(primary_key, &original_key)?;

        self.state = RowState::Modified;
        self.original_key = Some(ordered);
        Ok(())
    }

    /// Marks a row of a keyless table Modified with an empty original key. Only the
    /// decoder's lenient path produces such rows.
    pub(crate) fn mark_modified_keyless(&mut self) -> Result<()> {
        if self.state != RowState::Unchanged {
            return Err(Error::invalid_transition(self.state, RowState::Modified));
        }
        self.state = RowState::Modified;
        self.original_key = Some(ValueMap::new());
        Ok(())
    }

    pub(crate) fn mark_deleted(&mut self) -> Result<()> {
        if self.state == RowState::Deleted {
            return Err(Error::invalid_transition(self.state, RowState::Deleted));
        }
        self.state = RowState::Deleted;
        self.original_key = None;
        Ok(())
    }

    /// Applies `changes` on top of an Unchanged baseline and marks the row Modified,
    /// snapshotting the baseline key as the original key.
    pub(crate) fn modify(&mut self, primary_key: &[String], changes: ValueMap) -> Result<()> {
        if self.state != RowState::Unchanged {
            return Err(Error::invalid_transition(self.state, RowState::Modified));
        }
        if primary_key.is_empty() {
            return Err(Error::missing_field(PRIMARY_KEY, None));
        }
        if let Some(unknown) = changes.keys().find(|k| !self.current.contains_key(k)) {
            return Err(Error::UnknownColumn(unknown.clone()));
        }

        let snapshot = self.key(primary_key);
        for (column, value) in changes {
            if let Some(slot) = self.current.get_mut(&column) {
                *slot = value;
            }
        }
        self.mark_modified(primary_key, snapshot)
    }

    pub(crate) fn cell_mut(&mut self, column: &str) -> Option<&mut Value> {
        self.current.get_mut(column)
    }

    pub(crate) fn push_null_cell(&mut self, column: &str) {
        self.current.insert(column.to_string(), Value::Null);
    }

    pub(crate) fn truncate_cells(&mut self, len: usize) {
        self.current.truncate(len);
    }
}

/// Checks that `original_key` names exactly the `primary_key` columns and returns it in
/// key order.
pub(crate) fn order_original_key(primary_key: &[String], original_key: &ValueMap) -> Result<ValueMap> {
    let mut ordered = ValueMap::with_capacity(primary_key.len());
    for column in primary_key {
        match original_key.get(column) {
            Some(value) => {
                ordered.insert(column.clone(), value.clone());
            }
            None => return Err(Error::missing_field(column, None)),
        }
    }
    if original_key.len() != ordered.len() {
        return Err(Error::missing_field(
            &format!("primary key ({})", primary_key.join(", ")),
            None,
        ));
    }
    Ok(ordered)
}
