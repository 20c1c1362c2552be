use std::collections::HashMap;
use std::sync::Arc;

use crate::types::SqlValue;

/// Column names of a snapshot plus a name → index lookup, shared by every row.
#[derive(Debug, Default)]
pub(crate) struct Columns {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl Columns {
    pub(crate) fn new(names: Vec<String>) -> Self {
        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            // first occurrence wins for duplicated labels
            index.entry(name.clone()).or_insert(i);
        }
        Self { names, index }
    }

    pub(crate) fn names(&self) -> &[String] {
        &self.names
    }

    /// Exact match first, then ASCII case-insensitive.
    pub(crate) fn position(&self, column_name: &str) -> Option<usize> {
        self.index.get(column_name).copied().or_else(|| {
            self.names
                .iter()
                .position(|name| name.eq_ignore_ascii_case(column_name))
        })
    }
}

/// One materialized row of a [`ResultSnapshot`](super::ResultSnapshot).
#[derive(Debug, Clone)]
pub struct SnapshotRow {
    columns: Arc<Columns>,
    values: Vec<SqlValue>,
}

impl SnapshotRow {
    pub(crate) fn new(columns: Arc<Columns>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    /// Value of the named column, or `None` if there is no such column.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&SqlValue> {
        self.columns
            .position(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Value at the 0-based column index.
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        self.columns.names()
    }

    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    #[must_use]
    pub fn into_values(self) -> Vec<SqlValue> {
        self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
