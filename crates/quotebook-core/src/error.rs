//! Error types for quotebook-core

use thiserror::Error;

use crate::storage::StorageError;

/// Result type alias using quotebook-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in quotebook-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Bad user input, never persisted
    #[error("Validation error: {0}")]
    Validation(String),

    /// Malformed import document; nothing was imported
    #[error("Invalid format: {0}")]
    Format(String),

    /// Remote fetch or push failed
    #[error("Network error: {0}")]
    Network(String),

    /// Remote responded, but the payload did not match the expected schema
    #[error("Invalid remote payload: {0}")]
    InvalidPayload(String),

    /// A sync was attempted while a conflict awaits resolution
    #[error("A sync conflict is pending. Resolve the existing conflict first.")]
    ConflictPending,

    /// A sync was attempted while another one is still running
    #[error("A sync is already in progress")]
    SyncInProgress,

    /// Resolution was requested with no conflict pending
    #[error("No sync conflict is pending")]
    NoPendingConflict,

    /// Durable or session storage failure
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error comes from the admission gate rather than a real failure
    pub fn is_rejected_attempt(&self) -> bool {
        matches!(self, Error::ConflictPending | Error::SyncInProgress)
    }

    /// Recovery hint for storage failures a user can fix
    pub fn recovery_hint(&self) -> Option<&'static str> {
        match self {
            Error::Storage(e) => e.recovery_hint(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Error::Network(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_pending_message_asks_for_resolution() {
        let msg = Error::ConflictPending.to_string();
        assert!(msg.contains("Resolve the existing conflict first"));
    }

    #[test]
    fn test_rejected_attempts() {
        assert!(Error::ConflictPending.is_rejected_attempt());
        assert!(Error::SyncInProgress.is_rejected_attempt());
        assert!(!Error::Network("offline".to_string()).is_rejected_attempt());
    }

    #[test]
    fn test_storage_error_is_transparent() {
        let err: Error = StorageError::Corrupt {
            path: "/data/local_storage.json".into(),
            details: "trailing characters".to_string(),
        }
        .into();
        assert!(err.to_string().starts_with("Store file"));
        assert!(err.recovery_hint().is_some());
    }

    #[test]
    fn test_only_storage_errors_carry_hints() {
        assert!(Error::Network("offline".to_string()).recovery_hint().is_none());
        assert!(Error::from(StorageError::Poisoned).recovery_hint().is_none());
    }
}
