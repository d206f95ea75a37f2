//! Core error types for snoozer-core.
//!
//! Validation problems surface synchronously to the caller; delivery and
//! storage problems are recovered by the scan/heartbeat cycle and are never
//! fatal to the process.

use std::path::PathBuf;
use thiserror::Error;

use crate::record::CancelMode;

/// Core error type for snoozer-core.
#[derive(Error, Debug)]
pub enum EngineError {
    /// One-shot snooze target is zero, negative, or not a finite number of hours.
    #[error("invalid snooze target: {0} hours from now")]
    InvalidTarget(f64),

    /// Bad user input (time format, weekday set).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// No tab context to snooze.
    #[error("no active tab to snooze")]
    NoActiveContext,

    /// Cancellation referenced a key with no stored record.
    #[error("no snooze found for key '{0}'")]
    UnknownKey(String),

    /// Cancel mode applies only to the other record kind
    /// (series modes on a one-shot record, or vice versa).
    #[error("cancel mode {mode:?} does not apply to this record")]
    BadCancelMode { mode: CancelMode },

    /// Storage-related errors
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Reopening a tab failed; the record stays due and is retried.
    #[error("failed to reopen {url}: {message}")]
    Delivery { url: String, message: String },

    /// Registering or clearing a trigger failed.
    #[error("alarm '{name}': {message}")]
    Alarm { name: String, message: String },
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing database
    #[error("failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("store migration failed: {0}")]
    MigrationFailed(String),

    /// A stored value does not decode as a known item kind
    #[error("corrupt entry for key '{key}': {source}")]
    Codec {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::QueryFailed(err.to_string())
    }
}

/// Validation errors for snooze inputs.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Time string is not HH:mm
    #[error("cannot parse '{0}' as HH:mm")]
    BadTimeFormat(String),

    /// Recurring schedule with no weekdays
    #[error("recurring snooze needs at least one weekday")]
    EmptyDays,

    /// Weekday number outside 0..=6
    #[error("weekday {0} out of range (0 = Sunday .. 6 = Saturday)")]
    BadWeekday(u8),
}

/// Result type alias for EngineError
pub type Result<T, E = EngineError> = std::result::Result<T, E>;
