//! Error taxonomy shared by every storage backend.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Failure reported by a [`crate::KeyValueStore`] or [`crate::AppStateStore`] backend.
pub enum StorageError {
    /// The backend rejected the write because its capacity is exhausted.
    #[error("storage quota exceeded")]
    QuotaExceeded,
    /// The backend is not reachable in the current host context.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    /// The value could not be converted to or from JSON.
    #[error("storage serialization failed: {0}")]
    Serialize(String),
    /// Any other backend failure.
    #[error("storage backend failed: {0}")]
    Backend(String),
}

impl StorageError {
    /// Returns `true` when a write should be retried against a larger-capacity backend.
    pub fn is_quota(&self) -> bool {
        matches!(self, Self::QuotaExceeded)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialize(err.to_string())
    }
}
