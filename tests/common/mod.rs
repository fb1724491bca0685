//! Shared test utilities for backup and fault injection tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use oxibackup::backup::{BackupSink, FileEntry};
use oxibackup::env::{Env, MemEnv};

/// A fault-injection wrapper around any `Env`.
///
/// Allows deterministic injection of:
/// - directory listing errors
/// - size query errors for a given file name
/// - deletion errors for given paths
///
/// and records every physical deletion that reaches the wrapped environment.
pub struct FaultInjectionEnv<E> {
    inner: E,
    /// When true, every get_children call fails.
    fail_list: AtomicBool,
    /// File name whose size query fails.
    fail_size_for: Mutex<Option<String>>,
    /// Paths whose deletion fails.
    fail_delete_for: Mutex<HashSet<PathBuf>>,
    /// Listing returned instead of the inner one, in this order.
    listing: Mutex<Option<Vec<String>>>,
    /// Every delete_file call forwarded to the inner environment.
    deletes: Mutex<Vec<PathBuf>>,
}

impl<E: Env> FaultInjectionEnv<E> {
    /// Wrap an existing environment for fault injection.
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            fail_list: AtomicBool::new(false),
            fail_size_for: Mutex::new(None),
            fail_delete_for: Mutex::new(HashSet::new()),
            listing: Mutex::new(None),
            deletes: Mutex::new(Vec::new()),
        }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    /// Make every directory listing fail.
    pub fn inject_list_error(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    /// Make the size query for `name` fail.
    pub fn inject_size_error(&self, name: &str) {
        *self.fail_size_for.lock().unwrap() = Some(name.to_string());
    }

    /// Make deleting `path` fail.
    pub fn inject_delete_error(&self, path: impl AsRef<Path>) {
        self.fail_delete_for
            .lock()
            .unwrap()
            .insert(path.as_ref().to_path_buf());
    }

    /// Return `names` from every listing, in this order.
    pub fn set_listing(&self, names: &[&str]) {
        *self.listing.lock().unwrap() = Some(names.iter().map(|n| n.to_string()).collect());
    }

    /// Physical deletions observed so far, in call order.
    pub fn deletes(&self) -> Vec<PathBuf> {
        self.deletes.lock().unwrap().clone()
    }
}

impl<E: Env> Env for FaultInjectionEnv<E> {
    fn get_children(&self, dir: &Path) -> io::Result<Vec<String>> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(io::Error::other(format!(
                "injected listing error for {}",
                dir.display()
            )));
        }
        if let Some(listing) = self.listing.lock().unwrap().clone() {
            return Ok(listing);
        }
        self.inner.get_children(dir)
    }

    fn file_size(&self, path: &Path) -> io::Result<u64> {
        let fail = self.fail_size_for.lock().unwrap().clone();
        if let Some(name) = fail {
            if path.file_name().and_then(|n| n.to_str()) == Some(name.as_str()) {
                return Err(io::Error::other(format!(
                    "injected size error for {}",
                    path.display()
                )));
            }
        }
        self.inner.file_size(path)
    }

    fn delete_file(&self, path: &Path) -> io::Result<()> {
        self.deletes.lock().unwrap().push(path.to_path_buf());
        if self.fail_delete_for.lock().unwrap().contains(path) {
            return Err(io::Error::other(format!(
                "injected delete error for {}",
                path.display()
            )));
        }
        self.inner.delete_file(path)
    }

    fn file_exists(&self, path: &Path) -> bool {
        self.inner.file_exists(path)
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        self.inner.create_dir(path)
    }

    fn delete_dir(&self, path: &Path) -> io::Result<()> {
        self.inner.delete_dir(path)
    }

    fn rename_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.inner.rename_file(from, to)
    }

    fn read_at(&self, path: &Path, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read_at(path, offset, buf)
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        self.inner.write_file(path, data)
    }

    fn append_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        self.inner.append_file(path, data)
    }
}

/// A sink that records the calls it receives and can fail on a chosen file.
#[derive(Default)]
pub struct RecordingSink {
    /// `(name, signed length)` for every call, in order.
    pub calls: Vec<(String, i64)>,
    /// File name on which to fail.
    pub fail_on: Option<String>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(name: &str) -> Self {
        Self {
            calls: Vec::new(),
            fail_on: Some(name.to_string()),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.calls.iter().map(|(n, _)| n.as_str()).collect()
    }
}

impl BackupSink for RecordingSink {
    fn copy_file(&mut self, entry: &FileEntry) -> io::Result<()> {
        self.calls
            .push((entry.name.clone(), entry.bound.as_signed_len()));
        if self.fail_on.as_deref() == Some(entry.name.as_str()) {
            return Err(io::Error::other(format!("sink refused {}", entry.name)));
        }
        Ok(())
    }
}

/// Signed length used by the historical callback contract for whole files.
pub const ENTIRE_FILE: i64 = -1;

/// Build the three-file database used by most scenarios:
/// `CURRENT` (10 bytes), `000001.log` (5 bytes) and `000002.ldb`.
pub fn seed_small_db(env: &MemEnv, dir: &str) {
    let dir = Path::new(dir);
    env.write_file(&dir.join("CURRENT"), b"MANIFEST-3").unwrap();
    env.write_file(&dir.join("000001.log"), b"01234").unwrap();
    env.write_file(&dir.join("000002.ldb"), &[0xAB; 4096]).unwrap();
}
