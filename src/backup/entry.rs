//! Backup plan entries
//!
//! A backup is planned once, under the coordinator's lock: the directory is
//! listed, every name classified and every growable file measured. The
//! resulting [`FileEntry`] list is what the sink phase works from.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::filename::FileType;

/// How much of a file a backup has to copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CopyBound {
    /// Copy the whole file, however large it is when copied
    EntireFile,
    /// Copy only the first `n` bytes
    Prefix(u64),
}

impl CopyBound {
    /// Signed length used by callers of the historical callback contract
    ///
    /// A negative value means "copy the entire file".
    pub const fn as_signed_len(&self) -> i64 {
        match self {
            CopyBound::EntireFile => -1,
            CopyBound::Prefix(n) => *n as i64,
        }
    }

    /// Inverse of [`as_signed_len`](Self::as_signed_len)
    pub const fn from_signed_len(len: i64) -> Self {
        if len < 0 {
            CopyBound::EntireFile
        } else {
            CopyBound::Prefix(len as u64)
        }
    }

    /// Clamp `available` bytes to this bound
    #[inline]
    pub fn limit(&self, available: u64) -> u64 {
        match self {
            CopyBound::EntireFile => available,
            CopyBound::Prefix(n) => available.min(*n),
        }
    }
}

impl fmt::Display for CopyBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CopyBound::EntireFile => write!(f, "entire file"),
            CopyBound::Prefix(n) => write!(f, "{n} bytes"),
        }
    }
}

/// A file selected for backup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Name inside the database directory
    pub name: String,
    /// Full path (directory joined with `name`)
    pub path: PathBuf,
    /// Role of the file
    pub file_type: FileType,
    /// Copy bound fixed at planning time
    pub bound: CopyBound,
}

impl FileEntry {
    /// Create a new entry
    pub fn new(dir: &Path, name: impl Into<String>, file_type: FileType, bound: CopyBound) -> Self {
        let name = name.into();
        Self {
            path: dir.join(&name),
            name,
            file_type,
            bound,
        }
    }

    /// Bytes this entry pins, if bounded
    pub fn prefix_len(&self) -> Option<u64> {
        match self.bound {
            CopyBound::EntireFile => None,
            CopyBound::Prefix(n) => Some(n),
        }
    }
}
