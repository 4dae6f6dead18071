//! Storage error types.

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The named disk is not in the registry.
    #[error("unknown storage disk '{disk}'")]
    UnknownDisk {
        /// The disk name that was not found.
        disk: String,
    },

    /// File not found on the disk.
    #[error("file not found: {key}")]
    NotFound {
        /// Path that was not found.
        key: String,
    },

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// OpenDAL operation error.
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl StorageError {
    /// Create an unknown disk error.
    #[must_use]
    pub fn unknown_disk(disk: impl Into<String>) -> Self {
        Self::UnknownDisk { disk: disk.into() }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an operation error.
    #[must_use]
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::not_found(err.to_string()),
            _ => Self::operation(err.to_string()),
        }
    }
}
