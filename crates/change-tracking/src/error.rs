//! Error types for the change-tracking subsystem

use thiserror::Error;

use shared_types::Oid;

/// Errors surfaced to callers of the tracking API
#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("Exceeded maximum number of tracked databases ({max})")]
    CapacityExceeded { max: usize },

    #[error("Database {dbid} is not tracked; register it first")]
    NotTracked { dbid: Oid },

    #[error("Filter for database {dbid} not found; check that the database is registered")]
    FilterNotFound { dbid: Oid },

    #[error("Tracking is in an inconsistent state (database {dbid}); reset the tracking error after investigation")]
    TrackingInconsistent { dbid: Oid },

    #[error("Tracking criteria for database {dbid} are empty; check schemas, relkinds and relstorages")]
    MissingConfiguration { dbid: Oid },

    #[error("Shared tracking state is not available")]
    SharedStateUnavailable,

    #[error("Invalid database id")]
    InvalidDatabase,

    #[error("Database {dbid} does not exist")]
    DatabaseNotFound { dbid: Oid },

    #[error("Schema {name} does not exist")]
    SchemaNotFound { name: String },

    #[error("Invalid relkind: {0}")]
    InvalidRelKind(String),

    #[error("Invalid relstorage: {0}")]
    InvalidRelStorage(String),

    #[error("Read transaction already finished")]
    TransactionFinished,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Data provider error: {0}")]
    DataError(#[from] DataError),
}

/// Errors from configuration loading and validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("{field} = {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },
}

/// Errors from outbound providers (catalog, settings store)
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),
}
