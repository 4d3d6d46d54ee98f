//! Error taxonomy for the sync engine.
//!
//! Mirrors the shape of a typical Tauri-app error enum in this codebase
//! (one variant per failure kind, `thiserror` messages, `From` impls for the
//! I/O boundary) but carries an [`ErrorCode`] on every variant so stats
//! collection (see [`crate::stats`]) doesn't need to match on error text.

use serde::{Deserialize, Serialize};

/// Small, `Copy` result code recorded into [`crate::stats::UpdateStats`].
///
/// Kept separate from [`SyncError`] so a success path and a failure path can
/// both produce an `ErrorCode` without allocating or cloning the error itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    Success,
    SourceUnavailable,
    SourceDecodeError,
    StoreInternalError,
    StoreOutOfSpace,
    SettingsIoError,
    Disabled,
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The source's cursor factory returned null, or a transient runtime
    /// error occurred opening it. Timestamps are not advanced.
    #[error("contact source unavailable: {0}")]
    SourceUnavailable(String),

    /// An error was raised while iterating an open cursor.
    #[error("contact source decode error: {0}")]
    SourceDecodeError(String),

    /// The store rejected an upsert or delete call.
    #[error("store rejected batch: {0}")]
    StoreInternalError(String),

    /// Store-side resource exhaustion; handled identically to
    /// [`SyncError::StoreInternalError`] at this level.
    #[error("store out of space: {0}")]
    StoreOutOfSpace(String),

    /// Settings file could not be loaded or persisted. Never fatal.
    #[error("settings io error: {0}")]
    SettingsIoError(String),

    /// The engine is configured with `indexer_enabled = false`.
    #[error("indexer disabled by configuration")]
    Disabled,
}

impl SyncError {
    pub fn code(&self) -> ErrorCode {
        match self {
            SyncError::SourceUnavailable(_) => ErrorCode::SourceUnavailable,
            SyncError::SourceDecodeError(_) => ErrorCode::SourceDecodeError,
            SyncError::StoreInternalError(_) => ErrorCode::StoreInternalError,
            SyncError::StoreOutOfSpace(_) => ErrorCode::StoreOutOfSpace,
            SyncError::SettingsIoError(_) => ErrorCode::SettingsIoError,
            SyncError::Disabled => ErrorCode::Disabled,
        }
    }
}

impl From<std::io::Error> for SyncError {
    fn from(e: std::io::Error) -> Self {
        SyncError::SettingsIoError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
