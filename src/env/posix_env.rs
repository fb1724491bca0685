//! File system environment for oxibackup
//!
//! This module provides the `std::fs` backed environment.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::env::Env;

/// File system environment
///
/// Maps every `Env` operation onto `std::fs`. Relative paths are resolved
/// against an optional root directory.
#[derive(Debug, Clone, Default)]
pub struct PosixEnv {
    /// Root for relative paths
    root: Option<PathBuf>,
}

impl PosixEnv {
    /// Create an environment that uses paths as given
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Create an environment that resolves relative paths against `root`
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        Self {
            root: Some(root.as_ref().to_path_buf()),
        }
    }

    /// Get the root directory, if any
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl Env for PosixEnv {
    fn get_children(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(self.resolve(dir))? {
            let entry = entry?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    fn file_size(&self, path: &Path) -> io::Result<u64> {
        fs::metadata(self.resolve(path)).map(|m| m.len())
    }

    fn delete_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(self.resolve(path))
    }

    fn file_exists(&self, path: &Path) -> bool {
        self.resolve(path).exists()
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(self.resolve(path))
    }

    fn delete_dir(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir(self.resolve(path))
    }

    fn rename_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(self.resolve(from), self.resolve(to))
    }

    fn read_at(&self, path: &Path, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let mut file = File::open(self.resolve(path))?;
        file.seek(SeekFrom::Start(offset))?;

        // Loop so short reads only happen at end of file.
        let mut filled = 0;
        while filled < buf.len() {
            match file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
        Ok(filled)
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.resolve(path))?;
        file.write_all(data)?;
        file.sync_data()
    }

    fn append_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(self.resolve(path))?;
        file.write_all(data)
    }
}
