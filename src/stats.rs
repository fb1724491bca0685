//! Backup statistics
//!
//! Counters are updated with relaxed atomics; a [`BackupStatsSnapshot`] gives
//! a plain copy for reporting.

use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics for a backup environment
#[derive(Debug, Default)]
pub struct BackupStats {
    /// Backups that entered planning
    pub backups_started: AtomicU64,
    /// Backups that finished without error
    pub backups_completed: AtomicU64,
    /// Backups that returned an error
    pub backups_failed: AtomicU64,
    /// Files handed to a sink successfully
    pub files_copied: AtomicU64,
    /// Sum of planned prefix lengths for bounded files
    pub bounded_bytes: AtomicU64,
    /// Deletions forwarded immediately
    pub deletions_passed_through: AtomicU64,
    /// Deletions queued during a backup window
    pub deletions_deferred: AtomicU64,
    /// Deferred deletions applied successfully
    pub deferred_flushed: AtomicU64,
    /// Deferred deletions that failed when applied
    pub deferred_failed: AtomicU64,
}

impl BackupStats {
    /// Create new backup stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a backup entering planning
    pub fn record_backup_started(&self) {
        self.backups_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of a backup
    pub fn record_backup_finished(&self, ok: bool) {
        if ok {
            self.backups_completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.backups_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a file handed to the sink
    pub fn record_file_copied(&self, prefix_len: Option<u64>) {
        self.files_copied.fetch_add(1, Ordering::Relaxed);
        if let Some(len) = prefix_len {
            self.bounded_bytes.fetch_add(len, Ordering::Relaxed);
        }
    }

    /// Record a deletion request
    pub fn record_deletion(&self, deferred: bool) {
        if deferred {
            self.deletions_deferred.fetch_add(1, Ordering::Relaxed);
        } else {
            self.deletions_passed_through.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a deferred deletion being applied
    pub fn record_flush(&self, ok: bool) {
        if ok {
            self.deferred_flushed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.deferred_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Take a plain copy of the counters
    pub fn snapshot(&self) -> BackupStatsSnapshot {
        BackupStatsSnapshot {
            backups_started: self.backups_started.load(Ordering::Relaxed),
            backups_completed: self.backups_completed.load(Ordering::Relaxed),
            backups_failed: self.backups_failed.load(Ordering::Relaxed),
            files_copied: self.files_copied.load(Ordering::Relaxed),
            bounded_bytes: self.bounded_bytes.load(Ordering::Relaxed),
            deletions_passed_through: self.deletions_passed_through.load(Ordering::Relaxed),
            deletions_deferred: self.deletions_deferred.load(Ordering::Relaxed),
            deferred_flushed: self.deferred_flushed.load(Ordering::Relaxed),
            deferred_failed: self.deferred_failed.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters
    pub fn reset(&self) {
        self.backups_started.store(0, Ordering::Relaxed);
        self.backups_completed.store(0, Ordering::Relaxed);
        self.backups_failed.store(0, Ordering::Relaxed);
        self.files_copied.store(0, Ordering::Relaxed);
        self.bounded_bytes.store(0, Ordering::Relaxed);
        self.deletions_passed_through.store(0, Ordering::Relaxed);
        self.deletions_deferred.store(0, Ordering::Relaxed);
        self.deferred_flushed.store(0, Ordering::Relaxed);
        self.deferred_failed.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time copy of [`BackupStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackupStatsSnapshot {
    /// Backups that entered planning
    pub backups_started: u64,
    /// Backups that finished without error
    pub backups_completed: u64,
    /// Backups that returned an error
    pub backups_failed: u64,
    /// Files handed to a sink successfully
    pub files_copied: u64,
    /// Sum of planned prefix lengths for bounded files
    pub bounded_bytes: u64,
    /// Deletions forwarded immediately
    pub deletions_passed_through: u64,
    /// Deletions queued during a backup window
    pub deletions_deferred: u64,
    /// Deferred deletions applied successfully
    pub deferred_flushed: u64,
    /// Deferred deletions that failed when applied
    pub deferred_failed: u64,
}

impl BackupStatsSnapshot {
    /// Deferred deletions not yet applied or failed
    pub fn deletions_outstanding(&self) -> u64 {
        self.deletions_deferred
            .saturating_sub(self.deferred_flushed + self.deferred_failed)
    }
}
