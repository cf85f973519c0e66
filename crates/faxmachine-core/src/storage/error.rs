//! Storage error handling
//!
//! Provides typed errors for store operations with descriptive messages
//! and recovery suggestions.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Entry key could not be parsed or contains unsafe segments
    #[error("Invalid entry '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// No stored file exists for the key
    #[error("File '{key}' not found in database")]
    EntryNotFound { key: String },

    /// Category directory does not exist
    #[error("Category '{name}' not found in database")]
    CategoryNotFound { name: String },

    /// File to add does not exist or is not a regular file
    #[error("Source file '{path}' not found")]
    SourceNotFound { path: PathBuf },

    /// An entry with the same key already exists
    #[error("File '{key}' already exists in database")]
    AlreadyExists { key: String },

    /// Inject target exists and overwriting was not requested
    #[error("File '{path}' already exists")]
    DestinationExists { path: PathBuf },

    /// Copy source and destination are the same file
    #[error("'{path}' is the stored file itself")]
    SameFile { path: PathBuf },

    /// Failed to create a directory
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Permission denied accessing path
    #[error("Permission denied: cannot access '{path}'. Check file permissions.")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Disk is full or quota exceeded
    #[error(
        "Disk full or quota exceeded while writing to '{path}'. Free up disk space and try again."
    )]
    DiskFull {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to read file
    #[error("Failed to read '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to write file
    #[error("Failed to write '{path}': {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON sidecar or recent list could not be serialized
    #[error("Failed to encode '{path}': {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// File not found (when expected to exist)
    #[error("File not found: '{path}'")]
    NotFound { path: PathBuf },

    /// Directory walk failed
    #[error("Failed to scan '{path}': {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

impl StoreError {
    /// Create an error from an I/O error with path context
    ///
    /// Classifies the error based on its kind (permission, disk full, etc.)
    pub fn from_io(error: io::Error, path: PathBuf) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => StoreError::PermissionDenied {
                path,
                source: error,
            },
            io::ErrorKind::NotFound => StoreError::NotFound { path },
            // StorageFull is not stable on every toolchain; fall back to the message
            _ if is_disk_full_error(&error) => StoreError::DiskFull {
                path,
                source: error,
            },
            _ => StoreError::WriteError {
                path,
                source: error,
            },
        }
    }

    /// Classify a failed read, keeping permission and missing-file cases distinct
    pub fn from_read(error: io::Error, path: PathBuf) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => StoreError::PermissionDenied {
                path,
                source: error,
            },
            io::ErrorKind::NotFound => StoreError::NotFound { path },
            _ => StoreError::ReadError {
                path,
                source: error,
            },
        }
    }

    /// Whether the error means the addressed entry or category is missing
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::EntryNotFound { .. }
                | StoreError::CategoryNotFound { .. }
                | StoreError::SourceNotFound { .. }
                | StoreError::NotFound { .. }
        )
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StoreError::DiskFull { .. } => Some("Free up disk space and try again."),
            StoreError::PermissionDenied { .. } => {
                Some("Check file and directory permissions. You may need to run with different permissions or change ownership.")
            }
            StoreError::CreateDirectory { .. } => {
                Some("Check that the parent directory exists and you have write permissions.")
            }
            StoreError::AlreadyExists { .. } => {
                Some("Pass --force to replace it, or choose another name with --name.")
            }
            StoreError::DestinationExists { .. } => {
                Some("Pass --force to overwrite, or choose another name with --name.")
            }
            StoreError::SameFile { .. } => {
                Some("Inject into a directory outside the database, or pick another name with --name.")
            }
            StoreError::InvalidKey { .. } => {
                Some("Entries are addressed as <category>/<name> or <category>/<subcategory>/<name>.")
            }
            _ => None,
        }
    }
}

/// Check if an I/O error indicates disk full condition
fn is_disk_full_error(error: &io::Error) -> bool {
    let msg = error.to_string().to_lowercase();
    msg.contains("no space left")
        || msg.contains("disk full")
        || msg.contains("quota exceeded")
        || msg.contains("not enough space")
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_classification() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err = StoreError::from_io(io_err, PathBuf::from("/test/path"));

        assert!(matches!(err, StoreError::PermissionDenied { .. }));
        assert!(err.recovery_suggestion().is_some());
    }

    #[test]
    fn test_not_found_classification() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err = StoreError::from_io(io_err, PathBuf::from("/missing/file"));

        assert!(matches!(err, StoreError::NotFound { .. }));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_disk_full_detection() {
        let io_err = io::Error::new(io::ErrorKind::Other, "No space left on device");
        let err = StoreError::from_io(io_err, PathBuf::from("/full/disk"));

        assert!(matches!(err, StoreError::DiskFull { .. }));
        assert!(err.recovery_suggestion().is_some());
    }

    #[test]
    fn test_read_error_classification() {
        let io_err = io::Error::new(io::ErrorKind::InvalidData, "bad data");
        let err = StoreError::from_read(io_err, PathBuf::from("/db/git/x"));

        assert!(matches!(err, StoreError::ReadError { .. }));
        assert!(err.recovery_suggestion().is_none());
    }

    #[test]
    fn test_error_display() {
        let err = StoreError::EntryNotFound {
            key: "git/missing".to_string(),
        };
        assert_eq!(err.to_string(), "File 'git/missing' not found in database");

        let err = StoreError::DestinationExists {
            path: PathBuf::from("/work/.gitignore"),
        };
        let msg = err.to_string();
        assert!(msg.contains("already exists"));
        assert!(err.recovery_suggestion().unwrap().contains("--force"));
    }
}
