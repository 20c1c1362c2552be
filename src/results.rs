//! Detached query results.

mod row;
mod snapshot;

pub use row::SnapshotRow;
pub use snapshot::ResultSnapshot;
