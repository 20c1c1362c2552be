use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::SqlFacadeError;
use crate::types::DatabaseType;

/// Where and how to open the data source.
///
/// ```rust
/// use sql_facade::prelude::*;
///
/// let cfg = DataSourceConfig::from_json_str(
///     r#"{ "driver": "sqlite", "connection_string": "jdbc:sqlite:app.db" }"#,
/// )?;
/// assert_eq!(cfg.database_type()?, DatabaseType::Sqlite);
/// assert_eq!(cfg.database_path(), "app.db");
/// # Ok::<(), SqlFacadeError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DataSourceConfig {
    /// Driver name, e.g. `sqlite`.
    pub driver: String,
    /// Driver-specific connection string; for `SQLite` a file path or `file:` URI,
    /// optionally prefixed with `sqlite:` or `jdbc:sqlite:`.
    pub connection_string: String,
}

impl DataSourceConfig {
    #[must_use]
    pub fn new(driver: impl Into<String>, connection_string: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            connection_string: connection_string.into(),
        }
    }

    #[must_use]
    pub fn builder() -> DataSourceConfigBuilder {
        DataSourceConfigBuilder::default()
    }

    /// Parse a JSON document.
    ///
    /// # Errors
    /// Returns `SqlFacadeError::ConfigError` if the JSON is malformed or fields are missing.
    pub fn from_json_str(json: &str) -> Result<Self, SqlFacadeError> {
        serde_json::from_str(json)
            .map_err(|e| SqlFacadeError::ConfigError(format!("invalid data source config: {e}")))
    }

    /// Check that both fields are present and the driver is known.
    ///
    /// # Errors
    /// Returns `SqlFacadeError::ConfigError` when either field is blank or the driver
    /// is not supported.
    pub fn validate(&self) -> Result<(), SqlFacadeError> {
        if self.driver.trim().is_empty() || self.connection_string.trim().is_empty() {
            return Err(SqlFacadeError::ConfigError(
                "driver and connection string must be provided".into(),
            ));
        }
        self.database_type().map(|_| ())
    }

    /// The engine named by `driver`, matched case-insensitively.
    ///
    /// # Errors
    /// Returns `SqlFacadeError::ConfigError` for an unknown driver.
    pub fn database_type(&self) -> Result<DatabaseType, SqlFacadeError> {
        DatabaseType::from_str(self.driver.trim(), true)
            .map_err(|_| SqlFacadeError::ConfigError(format!("unsupported driver: {}", self.driver)))
    }

    /// The connection string without any `jdbc:sqlite:` / `sqlite://` / `sqlite:` prefix.
    #[must_use]
    pub fn database_path(&self) -> &str {
        let s = self.connection_string.trim();
        ["jdbc:sqlite:", "sqlite://", "sqlite:"]
            .iter()
            .find_map(|prefix| s.strip_prefix(prefix))
            .unwrap_or(s)
    }
}

/// Fluent builder for [`DataSourceConfig`].
#[derive(Debug, Clone, Default)]
pub struct DataSourceConfigBuilder {
    config: DataSourceConfig,
}

impl DataSourceConfigBuilder {
    #[must_use]
    pub fn driver(mut self, driver: impl Into<String>) -> Self {
        self.config.driver = driver.into();
        self
    }

    #[must_use]
    pub fn connection_string(mut self, connection_string: impl Into<String>) -> Self {
        self.config.connection_string = connection_string.into();
        self
    }

    /// Finish without validating.
    #[must_use]
    pub fn finish(self) -> DataSourceConfig {
        self.config
    }

    /// Validate and finish.
    ///
    /// # Errors
    /// As [`DataSourceConfig::validate`].
    pub fn build(self) -> Result<DataSourceConfig, SqlFacadeError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
