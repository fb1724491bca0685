//! Online backup for oxibackup
//!
//! This module provides the backup-aware environment wrapper, the plan
//! entries it produces, and the sink trait that receives them.

mod backup_env;
mod entry;
mod error;
mod sink;

pub use backup_env::{BackupEnv, BackupOptions, BackupReport, BackupToken, DeletionFailure};
pub use entry::{CopyBound, FileEntry};
pub use error::BackupError;
pub use sink::{BackupSink, DirCopySink, DEFAULT_COPY_CHUNK_SIZE};
