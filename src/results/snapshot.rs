use std::sync::Arc;

use super::row::{Columns, SnapshotRow};
use crate::types::SqlValue;

/// Fully materialized, connection-independent copy of a result set.
///
/// Built while the source statement is still open; holds no reference to it, so it
/// stays readable after the statement and its connection are released.
///
/// ```rust
/// use sql_facade::prelude::*;
///
/// let mut snapshot = ResultSnapshot::new(vec!["id".into(), "name".into()]);
/// snapshot.push_row(vec![SqlValue::Integer(7), SqlValue::Text("ada".into())]);
///
/// let name = snapshot
///     .first()
///     .and_then(|row| row.get("name"))
///     .and_then(SqlValue::as_text);
/// assert_eq!(name, Some("ada"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResultSnapshot {
    columns: Arc<Columns>,
    rows: Vec<SnapshotRow>,
}

impl ResultSnapshot {
    #[must_use]
    pub fn new(column_names: Vec<String>) -> Self {
        Self::with_capacity(column_names, 0)
    }

    #[must_use]
    pub fn with_capacity(column_names: Vec<String>, capacity: usize) -> Self {
        Self {
            columns: Arc::new(Columns::new(column_names)),
            rows: Vec::with_capacity(capacity),
        }
    }

    /// Append a row. `values` are in column order.
    pub fn push_row(&mut self, values: Vec<SqlValue>) {
        self.rows
            .push(SnapshotRow::new(Arc::clone(&self.columns), values));
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        self.columns.names()
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.names().len()
    }

    /// 0-based index of a column label (exact, then case-insensitive).
    #[must_use]
    pub fn column_index(&self, column_name: &str) -> Option<usize> {
        self.columns.position(column_name)
    }

    #[must_use]
    pub fn rows(&self) -> &[SnapshotRow] {
        &self.rows
    }

    #[must_use]
    pub fn first(&self) -> Option<&SnapshotRow> {
        self.rows.first()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SnapshotRow> {
        self.rows.iter()
    }

    /// Every value of one column, top to bottom.
    #[must_use]
    pub fn column(&self, column_name: &str) -> Option<Vec<&SqlValue>> {
        let idx = self.column_index(column_name)?;
        Some(
            self.rows
                .iter()
                .filter_map(|row| row.get_by_index(idx))
                .collect(),
        )
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<SnapshotRow> {
        self.rows
    }
}

impl IntoIterator for ResultSnapshot {
    type Item = SnapshotRow;
    type IntoIter = std::vec::IntoIter<SnapshotRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSnapshot {
    type Item = &'a SnapshotRow;
    type IntoIter = std::slice::Iter<'a, SnapshotRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
