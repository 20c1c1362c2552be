// SQLite provider
//
// - config: r2d2 pool construction, the `ConnectionProvider` impl
// - connection: pooled connection with auto-commit emulation
// - prepared: statement binding, execution and batch replay
// - params: parameter kinds -> SQLite storage classes
// - query: row extraction into snapshots

pub mod config;
pub mod connection;
pub mod params;
pub mod prepared;
pub mod query;

pub use config::SqlitePool;
pub use connection::SqliteConnection;
pub use prepared::{GENERATED_KEY_COLUMN, SqliteStatement};
pub use query::build_snapshot;
