//! Change-tracked table snapshots.
//!
//! A [`Table`] is an ordered set of typed [`Column`]s, an ordered set of [`Row`]s and an
//! optional primary key. Columns are created lazily from the first value seen for them
//! and keep their kind from then on; every row always holds a cell for every column.
//!
//! ## Producing a change set
//!
//! ```rust
//! use serde_dataset::{row, RowState, Table};
//!
//! let mut table = Table::new("Test");
//! let first = table.append_row(row! { "IdTest" => 2, "Name" => "X" }).unwrap();
//! table.set_primary_key(["IdTest"]).unwrap();
//!
//! table.modify_row(first, row! { "IdTest" => 3, "Name" => "Y" }).unwrap();
//! table.insert_row(row! { "IdTest" => 4, "Name" => "A" }).unwrap();
//!
//! assert_eq!(table.row(0).unwrap().state(), RowState::Modified);
//! assert_eq!(table.row(1).unwrap().state(), RowState::Added);
//! assert!(table.has_changes());
//! ```

use crate::{ColumnKind, Error, Result, Row, RowState, Value, ValueMap};

/// A named, typed column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    name: String,
    kind: ColumnKind,
    // kind was defaulted from a null or an empty array and may still be refined
    provisional: bool,
}

impl Column {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> ColumnKind {
        self.kind
    }
}

/// An ordered, typed column set plus an ordered row set with per-row mutation state.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    primary_key: Vec<String>,
    rows: Vec<Row>,
}

/// Shape of a table before a decode started, used to undo a failed decode.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Checkpoint {
    columns: usize,
    rows: usize,
    primary_key: usize,
}

impl Table {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Table {
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Declares a column. Existing rows receive a null cell for it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateColumn`] if the name is already taken.
    pub fn add_column(&mut self, name: &str, kind: ColumnKind) -> Result<()> {
        if self.column(name).is_some() {
            return Err(Error::DuplicateColumn(name.to_string()));
        }
        self.columns.push(Column {
            name: name.to_string(),
            kind,
            provisional: false,
        });
        for row in &mut self.rows {
            row.push_null_cell(name);
        }
        Ok(())
    }

    /// Returns the kind of `name`, creating the column with `kind` if it does not exist.
    pub(crate) fn ensure_column(&mut self, name: &str, kind: ColumnKind) -> ColumnKind {
        match self.column(name) {
            Some(column) => column.kind,
            None => {
                tracing::trace!("creating column '{}' ({}) in table '{}'", name, kind, self.name);
                // name is known to be free
                let _ = self.add_column(name, kind);
                kind
            }
        }
    }

    /// Resolves the kind of `name` while decoding.
    ///
    /// `evidence` is the kind implied by the value being read, `None` when that value is a
    /// null or an array without a typed element. A column created without evidence gets
    /// `fallback` and stays provisional: the first concrete kind seen later replaces it, as
    /// long as every cell stored so far is compatible with the new kind.
    pub(crate) fn resolve_column(
        &mut self,
        name: &str,
        evidence: Option<ColumnKind>,
        fallback: ColumnKind,
    ) -> ColumnKind {
        let index = match self.columns.iter().position(|c| c.name == name) {
            Some(index) => index,
            None => {
                let kind = self.ensure_column(name, evidence.unwrap_or(fallback));
                if evidence.is_none() {
                    if let Some(column) = self.columns.last_mut() {
                        column.provisional = true;
                    }
                }
                return kind;
            }
        };

        let Column {
            kind: current,
            provisional,
            ..
        } = self.columns[index];
        let evidence = match evidence {
            Some(kind) if provisional => kind,
            // an untyped array after nulls only: the column becomes an array, still provisional
            None if provisional && current.as_scalar().is_some() && fallback.as_scalar().is_none() => {
                if !self.refine_cells(name, fallback) {
                    return current;
                }
                self.columns[index].kind = fallback;
                return fallback;
            }
            _ => return current,
        };
        if evidence != current && !self.refine_cells(name, evidence) {
            return current;
        }
        tracing::trace!("column '{}' in table '{}' settled as {}", name, self.name, evidence);
        let column = &mut self.columns[index];
        column.kind = evidence;
        column.provisional = false;
        evidence
    }

    /// Converts the cells of a provisional column to `kind`, returning `false` (and
    /// touching nothing) if some stored cell cannot take it.
    fn refine_cells(&mut self, name: &str, kind: ColumnKind) -> bool {
        let fits = |value: &Value| match (kind, value) {
            (_, Value::Null) => true,
            (ColumnKind::Table, Value::Array(items)) => items.is_empty(),
            (ColumnKind::Array(_), Value::Array(items)) => items.iter().all(Value::is_null),
            _ => false,
        };
        if !self.rows.iter().all(|row| row.get(name).map_or(true, fits)) {
            return false;
        }
        if kind == ColumnKind::Table {
            for row in &mut self.rows {
                if let Some(cell) = row.cell_mut(name) {
                    if cell.is_array() {
                        *cell = Value::Table(Box::new(Table::new(name)));
                    }
                }
            }
        }
        true
    }

    /// Fixes the kind of every provisional column.
    pub(crate) fn seal_columns(&mut self) {
        for column in &mut self.columns {
            column.provisional = false;
        }
    }

    #[must_use]
    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    /// Declares the primary key. Every named column must already exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownColumn`] for a name the table does not have.
    pub fn set_primary_key<I, S>(&mut self, columns: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if let Some(unknown) = columns.iter().find(|c| self.column(c).is_none()) {
            return Err(Error::UnknownColumn(unknown.clone()));
        }
        self.primary_key = columns;
        Ok(())
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[must_use]
    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends an Unchanged row, creating columns for names seen for the first time.
    ///
    /// Returns the index of the new row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if a value does not fit the kind of an existing
    /// column. The table is left untouched on error.
    pub fn append_row(&mut self, values: ValueMap) -> Result<usize> {
        self.check_values(&values)?;
        for (name, value) in &values {
            if let Some(kind) = value.kind() {
                self.ensure_column(name, kind);
            } else {
                self.ensure_column(name, ColumnKind::Text);
            }
        }
        let row = Row::new(self.normalize(values));
        self.rows.push(row);
        Ok(self.rows.len() - 1)
    }

    /// Appends a row and marks it Added.
    pub fn insert_row(&mut self, values: ValueMap) -> Result<usize> {
        let index = self.append_row(values)?;
        self.rows[index].mark_added()?;
        Ok(index)
    }

    /// Applies `changes` to an Unchanged row and marks it Modified, keeping the
    /// pre-change primary-key values as the row's original key.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidTransition`] if the row is not Unchanged, [`Error::MissingField`] if
    /// the table has no primary key, [`Error::UnknownColumn`] or [`Error::TypeMismatch`]
    /// for bad changes.
    pub fn modify_row(&mut self, index: usize, changes: ValueMap) -> Result<()> {
        for (name, value) in &changes {
            match self.column(name) {
                Some(column) if !column.kind.accepts(value) => {
                    return Err(Error::type_mismatch(
                        name,
                        &column.kind.to_string(),
                        &value.describe(),
                    ))
                }
                Some(_) => {}
                None => return Err(Error::UnknownColumn(name.clone())),
            }
        }
        let len = self.rows.len();
        let row = self
            .rows
            .get_mut(index)
            .ok_or(Error::RowOutOfRange { index, len })?;
        row.modify(&self.primary_key, changes)
    }

    /// Marks a row Deleted. Its current values stay readable as the last-known values.
    pub fn delete_row(&mut self, index: usize) -> Result<()> {
        self.row_mut(index)?.mark_deleted()
    }

    pub fn mark_added(&mut self, index: usize) -> Result<()> {
        self.row_mut(index)?.mark_added()
    }

    /// Marks a row Modified with an explicit original key.
    ///
    /// # Errors
    ///
    /// [`Error::MissingField`] unless `original_key` names exactly the primary-key columns,
    /// or if the table has no primary key.
    pub fn mark_modified(&mut self, index: usize, original_key: ValueMap) -> Result<()> {
        let len = self.rows.len();
        let row = self
            .rows
            .get_mut(index)
            .ok_or(Error::RowOutOfRange { index, len })?;
        row.mark_modified(&self.primary_key, original_key)
    }

    pub fn mark_deleted(&mut self, index: usize) -> Result<()> {
        self.row_mut(index)?.mark_deleted()
    }

    pub fn mark_unchanged(&mut self, index: usize) -> Result<()> {
        self.row_mut(index)?.mark_unchanged()
    }

    /// Iterates over the rows currently in `state`.
    pub fn rows_in_state(&self, state: RowState) -> impl Iterator<Item = &Row> + '_ {
        self.rows.iter().filter(move |row| row.state() == state)
    }

    /// Returns `true` if any row is Added, Modified or Deleted.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.rows.iter().any(|row| row.state().is_changed())
    }

    /// Commits every pending change: Deleted rows are dropped and the rest become
    /// Unchanged baselines.
    pub fn accept_changes(&mut self) {
        self.rows.retain(|row| row.state() != RowState::Deleted);
        for row in &mut self.rows {
            // only Deleted refuses this transition, and those are gone
            let _ = row.mark_unchanged();
        }
    }

    fn row_mut(&mut self, index: usize) -> Result<&mut Row> {
        let len = self.rows.len();
        self.rows
            .get_mut(index)
            .ok_or(Error::RowOutOfRange { index, len })
    }

    fn check_values(&self, values: &ValueMap) -> Result<()> {
        for (name, value) in values {
            if let Some(column) = self.column(name) {
                if !column.kind.accepts(value) {
                    return Err(Error::type_mismatch(
                        name,
                        &column.kind.to_string(),
                        &value.describe(),
                    ));
                }
            } else if let Value::Array(_) = value {
                if let Some(kind) = value.kind() {
                    if !kind.accepts(value) {
                        return Err(Error::type_mismatch(name, &kind.to_string(), "mixed array"));
                    }
                }
            }
        }
        Ok(())
    }

    /// Reorders `values` into column order, filling absent columns with null.
    pub(crate) fn normalize(&self, mut values: ValueMap) -> ValueMap {
        self.columns
            .iter()
            .map(|column| {
                let value = values.remove(&column.name).unwrap_or_default();
                (column.name.clone(), value)
            })
            .collect()
    }

    pub(crate) fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Adopts `columns` as the primary key if none is declared yet.
    pub(crate) fn adopt_primary_key(&mut self, columns: Vec<String>) {
        if self.primary_key.is_empty() {
            self.primary_key = columns;
        }
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            columns: self.columns.len(),
            rows: self.rows.len(),
            primary_key: self.primary_key.len(),
        }
    }

    /// Undoes every column, row and key adoption since `checkpoint`.
    pub(crate) fn rollback(&mut self, checkpoint: Checkpoint) {
        self.rows.truncate(checkpoint.rows);
        self.columns.truncate(checkpoint.columns);
        self.primary_key.truncate(checkpoint.primary_key);
        for row in &mut self.rows {
            row.truncate_cells(checkpoint.columns);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, ScalarKind};

    fn sample() -> Table {
        let mut table = Table::new("Test");
        table
            .append_row(ValueMap::from([("IdTest", Value::from(1)), ("Name", Value::from("A"))]))
            .unwrap();
        table
            .append_row(ValueMap::from([("IdTest", Value::from(2)), ("Name", Value::from("B"))]))
            .unwrap();
        table.set_primary_key(["IdTest"]).unwrap();
        table
    }

    #[test]
    fn test_columns_created_in_first_seen_order() {
        let mut table = Table::new("T");
        table
            .append_row(ValueMap::from([("b", Value::Null), ("a", Value::from(1.5))]))
            .unwrap();
        table
            .append_row(ValueMap::from([("c", Value::from(true))]))
            .unwrap();

        assert_eq!(table.column_names(), vec!["b", "a", "c"]);
        assert_eq!(table.column("b").unwrap().kind(), ColumnKind::Text);
        assert_eq!(table.column("a").unwrap().kind(), ColumnKind::Float);

        // earlier rows are padded with nulls, later rows filled in column order
        let first: Vec<_> = table.row(0).unwrap().current().keys().cloned().collect();
        assert_eq!(first, vec!["b", "a", "c"]);
        assert_eq!(table.row(0).unwrap().get("c"), Some(&Value::Null));
        assert_eq!(table.row(1).unwrap().get("a"), Some(&Value::Null));
    }

    #[test]
    fn test_append_rejects_kind_conflict() {
        let mut table = sample();
        let err = table
            .append_row(ValueMap::from([("IdTest", Value::from("three"))]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_append_rejects_mixed_array() {
        let mut table = Table::new("T");
        let err = table
            .append_row(ValueMap::from([("Tags", Value::array([Value::from(1), Value::from("x")]))]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert!(table.columns().is_empty());
    }

    #[test]
    fn test_primary_key_must_exist() {
        let mut table = sample();
        assert_eq!(
            table.set_primary_key(["Nope"]).unwrap_err().kind(),
            ErrorKind::UnknownColumn
        );
        assert_eq!(table.primary_key(), &["IdTest".to_string()]);
    }

    #[test]
    fn test_modify_row_records_original_key() {
        let mut table = sample();
        table
            .modify_row(1, ValueMap::from([("IdTest", Value::from(3)), ("Name", Value::from("Y"))]))
            .unwrap();

        let row = table.row(1).unwrap();
        assert_eq!(row.state(), RowState::Modified);
        assert_eq!(row.original_key(), Some(&ValueMap::from([("IdTest", 2)])));
        assert_eq!(row.get("IdTest"), Some(&Value::Integer(3)));
    }

    #[test]
    fn test_modify_row_twice_is_rejected() {
        let mut table = sample();
        table.modify_row(0, ValueMap::from([("Name", "Z")])).unwrap();
        let err = table.modify_row(0, ValueMap::from([("Name", "W")])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    }

    #[test]
    fn test_keyless_table_cannot_modify() {
        let mut table = Table::new("T");
        table.append_row(ValueMap::from([("Name", "A")])).unwrap();

        let err = table.modify_row(0, ValueMap::from([("Name", "B")])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingField);
        let err = table.mark_modified(0, ValueMap::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingField);

        let row = table.row(0).unwrap();
        assert_eq!(row.state(), RowState::Unchanged);
        assert_eq!(row.get("Name"), Some(&Value::from("A")));
    }

    #[test]
    fn test_out_of_range() {
        let mut table = sample();
        assert_eq!(table.delete_row(9).unwrap_err().kind(), ErrorKind::RowOutOfRange);
    }

    #[test]
    fn test_accept_changes() {
        let mut table = sample();
        table.insert_row(ValueMap::from([("IdTest", 5)])).unwrap();
        table.delete_row(0).unwrap();
        table.modify_row(1, ValueMap::from([("Name", "Q")])).unwrap();
        assert!(table.has_changes());
        assert_eq!(table.rows_in_state(RowState::Deleted).count(), 1);

        table.accept_changes();
        assert!(!table.has_changes());
        assert_eq!(table.len(), 2);
        assert!(table.rows().iter().all(|r| r.original_key().is_none()));
    }

    #[test]
    fn test_rollback_restores_shape() {
        let mut table = sample();
        let checkpoint = table.checkpoint();
        table
            .add_column("Tags", ColumnKind::Array(ScalarKind::Text))
            .unwrap();
        table.append_row(ValueMap::from([("IdTest", 7)])).unwrap();

        table.rollback(checkpoint);
        assert_eq!(table, sample());
    }

    #[test]
    fn test_provisional_column_settles_on_first_evidence() {
        let mut table = Table::new("T");
        let kind = table.resolve_column("Lines", None, ColumnKind::Array(ScalarKind::Text));
        assert_eq!(kind, ColumnKind::Array(ScalarKind::Text));
        table.push_row(Row::new(ValueMap::from([("Lines", Value::Array(vec![]))])));

        let kind = table.resolve_column("Lines", Some(ColumnKind::Table), ColumnKind::Table);
        assert_eq!(kind, ColumnKind::Table);
        assert_eq!(
            table.row(0).unwrap().get("Lines"),
            Some(&Value::Table(Box::new(Table::new("Lines"))))
        );

        // settled: later evidence no longer changes the kind
        let kind = table.resolve_column("Lines", Some(ColumnKind::Integer), ColumnKind::Integer);
        assert_eq!(kind, ColumnKind::Table);
    }

    #[test]
    fn test_provisional_column_keeps_kind_when_cells_conflict() {
        let mut table = Table::new("T");
        table.resolve_column("Name", None, ColumnKind::Text);
        table.push_row(Row::new(ValueMap::from([("Name", "A")])));

        let kind = table.resolve_column("Name", Some(ColumnKind::Integer), ColumnKind::Integer);
        assert_eq!(kind, ColumnKind::Text);
    }

    #[test]
    fn test_sealed_column_ignores_evidence() {
        let mut table = Table::new("T");
        table.resolve_column("Note", None, ColumnKind::Text);
        table.seal_columns();

        let kind = table.resolve_column("Note", Some(ColumnKind::Boolean), ColumnKind::Boolean);
        assert_eq!(kind, ColumnKind::Text);
        assert!(!table.column("Note").unwrap().provisional);
    }
}
