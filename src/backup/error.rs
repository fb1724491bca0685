//! Backup errors

use std::io;
use std::path::PathBuf;

/// Errors returned by [`BackupEnv::backup`](crate::backup::BackupEnv::backup).
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    /// Listing the database directory failed.
    #[error("failed to list {}: {source}", .dir.display())]
    ListDir {
        /// Directory being backed up.
        dir: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// Querying the size of a growable file failed.
    #[error("failed to stat {}: {source}", .path.display())]
    FileSize {
        /// File whose size was requested.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The sink reported a failure while copying a file.
    #[error("backup failed")]
    CopyFailed {
        /// Name of the file the sink failed on.
        name: String,
        /// Error reported by the sink.
        #[source]
        source: io::Error,
    },
    /// Another backup is already running on this environment.
    #[error("backup already in progress")]
    AlreadyInProgress,
}

impl BackupError {
    /// Check if the backup window was entered before the error occurred
    ///
    /// Errors raised before the window leave no state behind and the call
    /// can simply be retried.
    pub fn entered_backup_window(&self) -> bool {
        matches!(self, BackupError::CopyFailed { .. })
    }

    /// Get the closest matching `io::ErrorKind`
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            BackupError::ListDir { source, .. } | BackupError::FileSize { source, .. } => {
                source.kind()
            }
            BackupError::CopyFailed { .. } => io::ErrorKind::Other,
            BackupError::AlreadyInProgress => io::ErrorKind::WouldBlock,
        }
    }
}

impl From<BackupError> for io::Error {
    fn from(err: BackupError) -> Self {
        match err {
            BackupError::ListDir { source, .. } | BackupError::FileSize { source, .. } => source,
            other => io::Error::new(other.kind(), other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_failure_is_generic_io_error() {
        let err = BackupError::CopyFailed {
            name: "000001.log".into(),
            source: io::Error::new(io::ErrorKind::WriteZero, "disk full"),
        };
        assert_eq!(err.to_string(), "backup failed");
        assert!(err.entered_backup_window());

        let io_err: io::Error = err.into();
        assert_eq!(io_err.kind(), io::ErrorKind::Other);
        assert_eq!(io_err.to_string(), "backup failed");
    }

    #[test]
    fn test_list_failure_keeps_source_kind() {
        let err = BackupError::ListDir {
            dir: PathBuf::from("/db"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(!err.entered_backup_window());
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert!(err.to_string().contains("/db"));

        let io_err: io::Error = err.into();
        assert_eq!(io_err.kind(), io::ErrorKind::PermissionDenied);
    }
}
