//! Error types for Controlled Table.
//!
//! Errors are reserved for defects detected at construction time (a schema
//! that cannot resolve its column ids) and for host I/O (configuration files,
//! JSON rendering). Stale or invalid commits are not errors; they come back as
//! [`CommitOutcome::Ignored`](crate::CommitOutcome::Ignored).

use std::path::PathBuf;

/// Result type alias for table operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or hosting a controlled table.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A derived column has no explicit id to resolve it by.
    #[error("Column '{header}' uses a derived accessor and must declare an explicit id")]
    MissingColumnId { header: String },

    /// Two columns resolve to the same id.
    #[error("Duplicate column id '{id}'")]
    DuplicateColumnId { id: String },

    /// A key accessor names a field the record type does not have.
    #[error("Column '{id}' reads field '{field}', which the record does not declare")]
    UnknownField { id: String, field: String },

    /// The schema has no columns.
    #[error("Column schema must contain at least one column")]
    EmptySchema,

    /// A state snapshot sorts by a column the schema does not know.
    #[error("Sort references unknown column '{id}'")]
    UnknownSortColumn { id: String },

    /// A state snapshot has a page size of zero.
    #[error("Page size must be greater than zero")]
    ZeroPageSize,

    /// Reading a configuration file failed.
    #[error("Failed to read config '{path}': {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Parsing a configuration file failed.
    #[error("Failed to parse config '{path}': {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Rendering the row store as JSON failed.
    #[error("Failed to serialize table data: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl Error {
    /// Create a missing-id error for the column with the given header.
    pub fn missing_column_id(header: impl Into<String>) -> Self {
        Self::MissingColumnId {
            header: header.into(),
        }
    }

    /// Create a duplicate-id error.
    pub fn duplicate_column_id(id: impl Into<String>) -> Self {
        Self::DuplicateColumnId { id: id.into() }
    }

    /// Create an unknown-field error.
    pub fn unknown_field(id: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            id: id.into(),
            field: field.into(),
        }
    }

    /// Create a config I/O error.
    pub fn config(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Config {
            path: path.into(),
            source,
        }
    }

    /// Create a config parse error.
    pub fn config_parse(path: impl Into<PathBuf>, source: toml::de::Error) -> Self {
        Self::ConfigParse {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` for errors that indicate a defective column schema.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            Self::MissingColumnId { .. }
                | Self::DuplicateColumnId { .. }
                | Self::UnknownField { .. }
                | Self::EmptySchema
        )
    }
}
