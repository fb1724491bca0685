//! Backup-aware environment
//!
//! [`BackupEnv`] wraps the environment a database runs on and adds online
//! backup. A backup runs in two phases:
//!
//! 1. **Planning** (lock held): the database directory is listed, every name
//!    is classified, and every file that can still grow is measured. The
//!    resulting plan never changes afterwards.
//! 2. **Copying** (lock released): the sink is called once per planned file.
//!    Deletions requested by the database during this window are accepted
//!    but only queued.
//!
//! When copying ends, successfully or not, the window is closed and the
//! queued deletions are applied in the order they were requested.

use std::io;
use std::mem;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use uuid::Uuid;

use crate::backup::{BackupError, BackupSink, CopyBound, FileEntry};
use crate::env::Env;
use crate::filename::{FileClassifier, LevelDbClassifier};
use crate::stats::BackupStats;

/// Token identifying a single backup run in logs and reports
pub type BackupToken = Uuid;

/// Options for a backup environment
#[derive(Debug, Clone)]
pub struct BackupOptions {
    /// Names starting with this prefix are never backed up
    ///
    /// An empty prefix disables the filter.
    pub hidden_prefix: String,
}

impl Default for BackupOptions {
    fn default() -> Self {
        Self {
            hidden_prefix: ".".to_string(),
        }
    }
}

impl BackupOptions {
    /// Create default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the hidden-name prefix
    pub fn with_hidden_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.hidden_prefix = prefix.into();
        self
    }

    fn is_hidden(&self, name: &str) -> bool {
        !self.hidden_prefix.is_empty() && name.starts_with(&self.hidden_prefix)
    }
}

/// A deferred deletion that failed when it was finally applied
#[derive(Debug)]
pub struct DeletionFailure {
    /// Path that could not be deleted
    pub path: PathBuf,
    /// Error returned by the underlying environment
    pub error: io::Error,
}

/// Result of a completed backup
#[derive(Debug)]
pub struct BackupReport {
    /// Token of this run
    pub token: BackupToken,
    /// Files handed to the sink, in order
    pub files: Vec<FileEntry>,
    /// Deferred deletions applied when the window closed
    pub flushed_deletions: Vec<PathBuf>,
    /// Deferred deletions that failed when the window closed
    pub failed_deletions: Vec<DeletionFailure>,
    /// Wall time from planning to flush
    pub elapsed: Duration,
}

#[derive(Debug, Default)]
struct FlushOutcome {
    flushed: Vec<PathBuf>,
    failed: Vec<DeletionFailure>,
}

#[derive(Debug, Default)]
struct BackupState {
    in_progress: bool,
    deferred_deletions: Vec<PathBuf>,
}

/// Environment wrapper providing online backup
///
/// All operations except [`delete_file`](Self::delete_file) pass straight
/// through to the wrapped environment. Only one backup may run at a time; a
/// second concurrent call fails with [`BackupError::AlreadyInProgress`].
pub struct BackupEnv<E: Env, C: FileClassifier = LevelDbClassifier> {
    target: E,
    classifier: C,
    options: BackupOptions,
    state: Mutex<BackupState>,
    stats: BackupStats,
}

impl<E: Env> BackupEnv<E> {
    /// Wrap `target` using the engine's file naming rules
    pub fn new(target: E) -> Self {
        Self::with_classifier(target, LevelDbClassifier)
    }
}

impl<E: Env, C: FileClassifier> BackupEnv<E, C> {
    /// Wrap `target` using a custom classifier
    pub fn with_classifier(target: E, classifier: C) -> Self {
        Self {
            target,
            classifier,
            options: BackupOptions::default(),
            state: Mutex::new(BackupState::default()),
            stats: BackupStats::new(),
        }
    }

    /// Replace the options
    pub fn with_options(mut self, options: BackupOptions) -> Self {
        self.options = options;
        self
    }

    /// Get the wrapped environment
    pub fn target(&self) -> &E {
        &self.target
    }

    /// Get the options
    pub fn options(&self) -> &BackupOptions {
        &self.options
    }

    /// Get the statistics
    pub fn stats(&self) -> &BackupStats {
        &self.stats
    }

    /// Check if a backup window is currently open
    pub fn is_backing_up(&self) -> bool {
        self.state.lock().in_progress
    }

    /// Deletions queued in the current backup window, oldest first
    pub fn pending_deletions(&self) -> Vec<PathBuf> {
        self.state.lock().deferred_deletions.clone()
    }

    /// Delete a file, or queue the deletion while a backup is copying
    ///
    /// A queued deletion always reports success; any failure applying it
    /// later shows up in the [`BackupReport`] and the logs only.
    pub fn delete_file(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let path = path.as_ref();
        let mut state = self.state.lock();
        if state.in_progress {
            state.deferred_deletions.push(path.to_path_buf());
            self.stats.record_deletion(true);
            if tracing::enabled!(tracing::Level::DEBUG) {
                tracing::debug!(
                    path = %path.display(),
                    queued = state.deferred_deletions.len(),
                    "deletion deferred during backup"
                );
            }
            return Ok(());
        }

        self.stats.record_deletion(false);
        self.target.delete_file(path)
    }

    /// Plan a backup of `dir` without copying anything
    pub fn plan(&self, dir: impl AsRef<Path>) -> Result<Vec<FileEntry>, BackupError> {
        let state = self.state.lock();
        self.plan_locked(&state, dir.as_ref())
    }

    /// Back up every database file under `dir` through `sink`
    ///
    /// Files are passed to the sink in listing order. Tables are copied in
    /// full; every other file is bounded to the length it had when the
    /// backup was planned. The first sink error stops the copy, but the
    /// backup window is always closed and queued deletions are applied.
    pub fn backup<S>(
        &self,
        dir: impl AsRef<Path>,
        sink: &mut S,
    ) -> Result<BackupReport, BackupError>
    where
        S: BackupSink + ?Sized,
    {
        let dir = dir.as_ref();
        let start = Instant::now();

        let mut state = self.state.lock();
        if state.in_progress {
            return Err(BackupError::AlreadyInProgress);
        }
        self.stats.record_backup_started();

        let entries = match self.plan_locked(&state, dir) {
            Ok(entries) => entries,
            Err(err) => {
                drop(state);
                self.stats.record_backup_finished(false);
                return Err(err);
            }
        };
        state.in_progress = true;
        drop(state);

        let window = BackupWindow::open(self);
        let token = window.token;
        if tracing::enabled!(tracing::Level::INFO) {
            tracing::info!(
                token = %token,
                dir = %dir.display(),
                files = entries.len(),
                "backup window opened"
            );
        }

        let copied = self.copy_entries(token, &entries, sink);
        let flush = window.close();
        let elapsed = start.elapsed();

        match copied {
            Ok(()) => {
                self.stats.record_backup_finished(true);
                if tracing::enabled!(tracing::Level::INFO) {
                    tracing::info!(
                        token = %token,
                        files = entries.len(),
                        flushed = flush.flushed.len(),
                        failed_deletions = flush.failed.len(),
                        elapsed_ms = elapsed.as_millis() as u64,
                        "backup finished"
                    );
                }
                Ok(BackupReport {
                    token,
                    files: entries,
                    flushed_deletions: flush.flushed,
                    failed_deletions: flush.failed,
                    elapsed,
                })
            }
            Err(err) => {
                self.stats.record_backup_finished(false);
                Err(err)
            }
        }
    }

    /// Build the plan for `dir`; the caller holds the state lock.
    fn plan_locked(
        &self,
        _state: &BackupState,
        dir: &Path,
    ) -> Result<Vec<FileEntry>, BackupError> {
        let names = self
            .target
            .get_children(dir)
            .map_err(|source| BackupError::ListDir {
                dir: dir.to_path_buf(),
                source,
            })?;

        let mut entries = Vec::with_capacity(names.len());
        for name in names {
            if self.options.is_hidden(&name) {
                continue;
            }
            let Some(file_type) = self.classifier.classify(&name) else {
                continue;
            };
            if !file_type.is_backup_eligible() {
                continue;
            }

            let bound = if file_type.is_copy_bound_sensitive() {
                let path = dir.join(&name);
                let size = self
                    .target
                    .file_size(&path)
                    .map_err(|source| BackupError::FileSize { path, source })?;
                CopyBound::Prefix(size)
            } else {
                CopyBound::EntireFile
            };
            entries.push(FileEntry::new(dir, name, file_type, bound));
        }
        Ok(entries)
    }

    fn copy_entries<S>(
        &self,
        token: BackupToken,
        entries: &[FileEntry],
        sink: &mut S,
    ) -> Result<(), BackupError>
    where
        S: BackupSink + ?Sized,
    {
        for entry in entries {
            if let Err(source) = sink.copy_file(entry) {
                if tracing::enabled!(tracing::Level::WARN) {
                    tracing::warn!(
                        token = %token,
                        file = %entry.name,
                        error = %source,
                        "backup sink failed"
                    );
                }
                return Err(BackupError::CopyFailed {
                    name: entry.name.clone(),
                    source,
                });
            }
            self.stats.record_file_copied(entry.prefix_len());
            if tracing::enabled!(tracing::Level::DEBUG) {
                tracing::debug!(
                    token = %token,
                    file = %entry.name,
                    bound = %entry.bound,
                    "file copied"
                );
            }
        }
        Ok(())
    }

    /// Close the backup window and apply queued deletions in FIFO order.
    fn end_backup(&self, token: BackupToken) -> FlushOutcome {
        let mut state = self.state.lock();
        state.in_progress = false;
        let deferred = mem::take(&mut state.deferred_deletions);

        let mut outcome = FlushOutcome::default();
        for path in deferred {
            match self.target.delete_file(&path) {
                Ok(()) => {
                    self.stats.record_flush(true);
                    outcome.flushed.push(path);
                }
                Err(error) => {
                    self.stats.record_flush(false);
                    if tracing::enabled!(tracing::Level::WARN) {
                        tracing::warn!(
                            token = %token,
                            path = %path.display(),
                            error = %error,
                            "deferred deletion failed"
                        );
                    }
                    outcome.failed.push(DeletionFailure { path, error });
                }
            }
        }
        outcome
    }
}

/// Open backup window
///
/// Closing happens in [`close`](Self::close) or, if the sink panics, on drop.
struct BackupWindow<'a, E: Env, C: FileClassifier> {
    env: &'a BackupEnv<E, C>,
    token: BackupToken,
    closed: bool,
}

impl<'a, E: Env, C: FileClassifier> BackupWindow<'a, E, C> {
    fn open(env: &'a BackupEnv<E, C>) -> Self {
        Self {
            env,
            token: Uuid::new_v4(),
            closed: false,
        }
    }

    fn close(mut self) -> FlushOutcome {
        self.closed = true;
        self.env.end_backup(self.token)
    }
}

impl<E: Env, C: FileClassifier> Drop for BackupWindow<'_, E, C> {
    fn drop(&mut self) {
        if !self.closed {
            self.env.end_backup(self.token);
        }
    }
}

impl<E: Env, C: FileClassifier> Env for BackupEnv<E, C> {
    fn get_children(&self, dir: &Path) -> io::Result<Vec<String>> {
        self.target.get_children(dir)
    }

    fn file_size(&self, path: &Path) -> io::Result<u64> {
        self.target.file_size(path)
    }

    fn delete_file(&self, path: &Path) -> io::Result<()> {
        BackupEnv::delete_file(self, path)
    }

    fn file_exists(&self, path: &Path) -> bool {
        self.target.file_exists(path)
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        self.target.create_dir(path)
    }

    fn delete_dir(&self, path: &Path) -> io::Result<()> {
        self.target.delete_dir(path)
    }

    fn rename_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.target.rename_file(from, to)
    }

    fn read_at(&self, path: &Path, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        self.target.read_at(path, offset, buf)
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        self.target.write_file(path, data)
    }

    fn append_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        self.target.append_file(path, data)
    }
}
