//! In-memory environment for testing
//!
//! This module provides an environment that keeps every file in a map.
//! Useful for tests and for exercising the backup path without touching disk.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::env::Env;

#[derive(Default)]
struct MemFs {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
}

impl MemFs {
    fn dir_exists(&self, dir: &Path) -> bool {
        self.dirs.contains(dir) || self.files.keys().any(|p| p.parent() == Some(dir))
    }

    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(dir) = parent {
            if dir.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(dir.to_path_buf());
            parent = dir.parent();
        }
    }
}

/// In-memory environment
///
/// Directories are implicit: writing a file creates all of its parents.
/// Listing returns names in lexicographic order.
#[derive(Default)]
pub struct MemEnv {
    fs: Mutex<MemFs>,
}

impl MemEnv {
    /// Create an empty environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a copy of the contents of a file
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.fs.lock().files.get(path.as_ref()).cloned()
    }

    /// Number of files currently stored
    pub fn file_count(&self) -> usize {
        self.fs.lock().files.len()
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{}: no such file", path.display()),
    )
}

impl Env for MemEnv {
    fn get_children(&self, dir: &Path) -> io::Result<Vec<String>> {
        let fs = self.fs.lock();
        if !fs.dir_exists(dir) {
            return Err(not_found(dir));
        }

        let mut names = BTreeSet::new();
        let children = fs
            .files
            .keys()
            .chain(fs.dirs.iter())
            .filter(|p| p.parent() == Some(dir));
        for child in children {
            if let Some(name) = child.file_name() {
                names.insert(name.to_string_lossy().into_owned());
            }
        }
        Ok(names.into_iter().collect())
    }

    fn file_size(&self, path: &Path) -> io::Result<u64> {
        let fs = self.fs.lock();
        fs.files
            .get(path)
            .map(|data| data.len() as u64)
            .ok_or_else(|| not_found(path))
    }

    fn delete_file(&self, path: &Path) -> io::Result<()> {
        let mut fs = self.fs.lock();
        fs.files.remove(path).map(|_| ()).ok_or_else(|| not_found(path))
    }

    fn file_exists(&self, path: &Path) -> bool {
        self.fs.lock().files.contains_key(path)
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        let mut fs = self.fs.lock();
        fs.add_parents(path);
        fs.dirs.insert(path.to_path_buf());
        Ok(())
    }

    fn delete_dir(&self, path: &Path) -> io::Result<()> {
        let mut fs = self.fs.lock();
        if fs.files.keys().any(|p| p.starts_with(path)) {
            return Err(io::Error::other(format!(
                "{}: directory not empty",
                path.display()
            )));
        }
        if fs.dirs.remove(path) {
            Ok(())
        } else {
            Err(not_found(path))
        }
    }

    fn rename_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut fs = self.fs.lock();
        let data = fs.files.remove(from).ok_or_else(|| not_found(from))?;
        fs.add_parents(to);
        fs.files.insert(to.to_path_buf(), data);
        Ok(())
    }

    fn read_at(&self, path: &Path, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let fs = self.fs.lock();
        let data = fs.files.get(path).ok_or_else(|| not_found(path))?;
        let offset = offset as usize;
        if offset >= data.len() {
            return Ok(0);
        }
        let end = std::cmp::min(offset + buf.len(), data.len());
        let len = end - offset;
        buf[..len].copy_from_slice(&data[offset..end]);
        Ok(len)
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let mut fs = self.fs.lock();
        fs.add_parents(path);
        fs.files.insert(path.to_path_buf(), data.to_vec());
        Ok(())
    }

    fn append_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let mut fs = self.fs.lock();
        fs.add_parents(path);
        fs.files
            .entry(path.to_path_buf())
            .or_default()
            .extend_from_slice(data);
        Ok(())
    }
}
