//! oxibackup - Online backup for LevelDB-style embedded key-value stores
//!
//! The storage engine performs its file operations through an [`Env`].
//! Wrapping that environment in a [`BackupEnv`] lets an application copy a
//! live database directory while the engine keeps writing and compacting:
//!
//! - Growable files (logs, manifests, `CURRENT`, info logs) are copied only
//!   up to the length they had when the backup was planned
//! - Immutable tables are copied in full
//! - File deletions issued by the engine during a backup are queued and
//!   applied once the copy is finished
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use oxibackup::{BackupEnv, DirCopySink, PosixEnv};
//!
//! let env = BackupEnv::new(PosixEnv::new());
//! // Hand `&env` to the database as its environment, then:
//! let mut sink = DirCopySink::new(PosixEnv::new(), PosixEnv::new(), "/backups/today");
//! let report = env.backup("/var/lib/mydb", &mut sink)?;
//! println!("copied {} files", report.files.len());
//! ```

#![warn(missing_docs)]

pub mod backup;
pub mod config;
pub mod env;
pub mod filename;
pub mod stats;

// Re-exports for convenience
pub use backup::{
    BackupEnv, BackupError, BackupOptions, BackupReport, BackupSink, CopyBound, DirCopySink,
    FileEntry,
};
pub use env::{Env, MemEnv, PosixEnv};
pub use filename::{FileClassifier, FileType, LevelDbClassifier};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::backup::{BackupEnv, BackupError, BackupSink, CopyBound, FileEntry};
    pub use crate::env::Env;
    pub use crate::filename::FileType;
}
