//! Environment traits for oxibackup
//!
//! This module defines the file-system environment the storage engine runs on.

use std::io;
use std::path::Path;
use std::sync::Arc;

/// File-system environment used by the storage engine
///
/// The engine performs all of its file operations through an `Env`. Backup
/// support is layered on top by wrapping an existing environment, so every
/// method here has to be forwardable without extra context.
pub trait Env: Send + Sync {
    /// List the names (not paths) of the entries directly under `dir`
    fn get_children(&self, dir: &Path) -> io::Result<Vec<String>>;

    /// Get the current size of the file at `path`
    fn file_size(&self, path: &Path) -> io::Result<u64>;

    /// Delete the file at `path`
    fn delete_file(&self, path: &Path) -> io::Result<()>;

    /// Check whether a file exists at `path`
    fn file_exists(&self, path: &Path) -> bool;

    /// Create the directory `path`, including missing parents
    fn create_dir(&self, path: &Path) -> io::Result<()>;

    /// Remove the empty directory `path`
    fn delete_dir(&self, path: &Path) -> io::Result<()>;

    /// Atomically rename `from` to `to`, replacing `to` if it exists
    fn rename_file(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Read up to `buf.len()` bytes from `offset` into `buf`
    ///
    /// Returns the number of bytes read; `0` means end of file.
    fn read_at(&self, path: &Path, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    /// Create or truncate the file at `path` and write `data` to it
    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()>;

    /// Append `data` to the file at `path`, creating it if missing
    fn append_file(&self, path: &Path, data: &[u8]) -> io::Result<()>;
}

impl<E: Env + ?Sized> Env for &E {
    fn get_children(&self, dir: &Path) -> io::Result<Vec<String>> {
        (**self).get_children(dir)
    }

    fn file_size(&self, path: &Path) -> io::Result<u64> {
        (**self).file_size(path)
    }

    fn delete_file(&self, path: &Path) -> io::Result<()> {
        (**self).delete_file(path)
    }

    fn file_exists(&self, path: &Path) -> bool {
        (**self).file_exists(path)
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        (**self).create_dir(path)
    }

    fn delete_dir(&self, path: &Path) -> io::Result<()> {
        (**self).delete_dir(path)
    }

    fn rename_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        (**self).rename_file(from, to)
    }

    fn read_at(&self, path: &Path, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_at(path, offset, buf)
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        (**self).write_file(path, data)
    }

    fn append_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        (**self).append_file(path, data)
    }
}

impl<E: Env + ?Sized> Env for Arc<E> {
    fn get_children(&self, dir: &Path) -> io::Result<Vec<String>> {
        (**self).get_children(dir)
    }

    fn file_size(&self, path: &Path) -> io::Result<u64> {
        (**self).file_size(path)
    }

    fn delete_file(&self, path: &Path) -> io::Result<()> {
        (**self).delete_file(path)
    }

    fn file_exists(&self, path: &Path) -> bool {
        (**self).file_exists(path)
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        (**self).create_dir(path)
    }

    fn delete_dir(&self, path: &Path) -> io::Result<()> {
        (**self).delete_dir(path)
    }

    fn rename_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        (**self).rename_file(from, to)
    }

    fn read_at(&self, path: &Path, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_at(path, offset, buf)
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        (**self).write_file(path, data)
    }

    fn append_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        (**self).append_file(path, data)
    }
}
