//! File-system environment abstraction for oxibackup
//!
//! This module provides the trait the storage engine performs file operations
//! through, plus a disk-backed and an in-memory implementation.

mod mem_env;
mod posix_env;
mod traits;

pub use mem_env::MemEnv;
pub use posix_env::PosixEnv;
pub use traits::Env;
