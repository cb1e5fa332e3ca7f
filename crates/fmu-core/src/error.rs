//! Error types for store operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the record store.
///
/// The `Display` form of every variant is the human-readable diagnostic
/// handed back to callers.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage root exists but is not a directory.
    #[error("storage path exists but is not a directory: {}", path.display())]
    InvalidStorageRoot { path: PathBuf },

    /// Underlying filesystem failure (create/open/read/write/sync/rename).
    #[error("{context} failed at {}: {source}", path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A line could not be decoded into a record.
    ///
    /// Scans and compaction swallow this; it only escapes from direct
    /// calls to [`crate::codec::decode`].
    #[error("malformed record: {reason}")]
    MalformedRecord { reason: String },

    /// A caller-supplied argument is out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The configuration could not be read, parsed, or validated.
    #[error("config error at {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl StoreError {
    /// Create an I/O error with the failing operation and path attached.
    pub fn io(context: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            context,
            path: path.into(),
            source,
        }
    }

    /// Create a malformed-record error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            reason: reason.into(),
        }
    }

    /// Create an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a config error with path context.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Convenience alias for store results.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_message_includes_context_and_path() {
        let err = StoreError::io(
            "rename",
            "/data/store.ndjson",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.starts_with("rename failed at /data/store.ndjson"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_invalid_root_message() {
        let err = StoreError::InvalidStorageRoot {
            path: PathBuf::from("/tmp/not-a-dir"),
        };
        assert_eq!(
            err.to_string(),
            "storage path exists but is not a directory: /tmp/not-a-dir"
        );
    }
}
