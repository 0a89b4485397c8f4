//! Core error types for interval-core.
//!
//! Every fallible operation in the library returns [`CoreError`] or one of
//! its sub-enums. Failures coming from injected collaborators (persistence,
//! health, transport, store purchases) are wrapped in [`ClientError`] so the
//! session runtime can turn them into `*Failed` events instead of
//! propagating them.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for interval-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// External collaborator errors
    #[error("{0}")]
    Client(#[from] ClientError),

    /// Access to a gated feature without an active subscription.
    #[error("{feature} requires an active subscription")]
    NotSubscribed { feature: String },

    /// The session runtime task is gone (shut down or panicked).
    #[error("Session runtime is no longer running")]
    RuntimeClosed,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Stored row could not be decoded back into a domain value
    #[error("Corrupt row in {table}: {message}")]
    CorruptRow { table: String, message: String },

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Data directory could not be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dotted key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Empty collection
    #[error("Empty collection: {0}")]
    EmptyCollection(String),

    /// Out of bounds
    #[error("Index {index} out of bounds for {collection} (length: {len})")]
    OutOfBounds {
        collection: String,
        index: usize,
        len: usize,
    },

    /// No element with the given id
    #[error("No {kind} with id {id}")]
    NotFound { kind: String, id: uuid::Uuid },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Failure reported by an injected collaborator.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Persistence save/fetch failed
    #[error("Persistence failed: {0}")]
    Persistence(String),

    /// Health/energy query failed
    #[error("Health query failed: {0}")]
    Health(String),

    /// Health query did not answer in time
    #[error("Health query timed out after {timeout_secs}s")]
    HealthTimeout { timeout_secs: u64 },

    /// Store purchase failed
    #[error("Purchase failed: {0}")]
    Purchase(#[from] PurchaseError),
}

/// Store purchase outcomes that are not a success.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseError {
    #[error("transaction could not be verified")]
    FailedVerification,
    #[error("purchase cancelled")]
    UserCancelled,
    #[error("purchase is pending approval")]
    Pending,
    #[error("unknown purchase error")]
    Unknown,
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

impl From<DatabaseError> for ClientError {
    fn from(err: DatabaseError) -> Self {
        ClientError::Persistence(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
