//! Storage errors
//!
//! Every file failure carries the path it happened on, and the ones a user
//! can act on come with a hint.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by the key-value stores
#[derive(Error, Debug)]
pub enum StorageError {
    /// The store file exists but could not be read
    #[error("Could not read store file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The store file is not a JSON object of string values
    #[error("Store file '{path}' is corrupt: {details}")]
    Corrupt { path: PathBuf, details: String },

    /// Writing the temporary copy failed
    #[error("Could not write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The filesystem refused access
    #[error("Permission denied for '{path}'")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The disk ran out of space mid-write
    #[error("No space left while writing '{path}'")]
    NoSpace {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Swapping the temporary copy into place failed; the old file is intact
    #[error("Could not replace '{path}': {source}")]
    Replace {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A lock guarding the store was poisoned by a panicking writer
    #[error("Storage lock poisoned")]
    Poisoned,
}

impl StorageError {
    /// Classify a failed write to `path`
    pub(crate) fn on_write(source: io::Error, path: &Path) -> Self {
        let path = path.to_path_buf();
        if source.kind() == io::ErrorKind::PermissionDenied {
            return StorageError::PermissionDenied { path, source };
        }

        let msg = source.to_string().to_lowercase();
        if msg.contains("no space left") || msg.contains("quota exceeded") {
            StorageError::NoSpace { path, source }
        } else {
            StorageError::Write { path, source }
        }
    }

    /// What the user can do about it, if anything
    pub fn recovery_hint(&self) -> Option<&'static str> {
        match self {
            StorageError::Corrupt { .. } => {
                Some("Move the store file aside to start with the default quotes.")
            }
            StorageError::PermissionDenied { .. } => {
                Some("Check permissions on the data directory, or point data_dir elsewhere.")
            }
            StorageError::NoSpace { .. } => Some("Free up disk space and try again."),
            _ => None,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_is_classified() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err = StorageError::on_write(io_err, Path::new("/data/local_storage.tmp"));

        assert!(matches!(err, StorageError::PermissionDenied { .. }));
        assert!(err.recovery_hint().is_some());
    }

    #[test]
    fn test_no_space_is_classified() {
        let io_err = io::Error::new(io::ErrorKind::Other, "No space left on device");
        let err = StorageError::on_write(io_err, Path::new("/full/local_storage.tmp"));

        assert!(matches!(err, StorageError::NoSpace { .. }));
        assert_eq!(err.recovery_hint(), Some("Free up disk space and try again."));
    }

    #[test]
    fn test_other_write_failures_have_no_hint() {
        let io_err = io::Error::new(io::ErrorKind::Other, "device busy");
        let err = StorageError::on_write(io_err, Path::new("/data/local_storage.tmp"));

        assert!(matches!(err, StorageError::Write { .. }));
        assert!(err.recovery_hint().is_none());
    }

    #[test]
    fn test_corrupt_names_the_file() {
        let err = StorageError::Corrupt {
            path: PathBuf::from("/data/local_storage.json"),
            details: "expected value at line 1".to_string(),
        };

        assert!(err.to_string().contains("local_storage.json"));
        assert!(err.recovery_hint().is_some());
    }
}
