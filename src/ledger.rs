//! Processed-file ledger.
//!
//! Durable map from fingerprint to [`FileRecord`], held in memory and
//! rewritten in full on every mutation. The ledger is the only authority on
//! whether a photo has already been sent to the paid collaborators.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::ingest::hasher::FileIdentity;
use crate::models::{FileRecord, RecordState};

/// Default age after which a processing record is considered abandoned.
pub const DEFAULT_STALE_LOCK: Duration = Duration::from_secs(10 * 60);

/// Snapshot of ledger health for status queries.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerStatus {
    pub initialized: bool,
    pub total_records: usize,
    pub processing: usize,
    pub completed: usize,
    /// Completed records without an output.
    pub failed: usize,
    pub tracking_file: PathBuf,
    pub tracking_file_exists: bool,
}

#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    records: BTreeMap<String, FileRecord>,
    stale_after: chrono::Duration,
    initialized: bool,
}

impl Ledger {
    /// Create an empty, not yet loaded ledger backed by `path`.
    pub fn new(path: impl Into<PathBuf>, stale_after: Duration) -> Self {
        Self {
            path: path.into(),
            records: BTreeMap::new(),
            stale_after: chrono::Duration::from_std(stale_after)
                .unwrap_or(chrono::Duration::MAX),
            initialized: false,
        }
    }

    /// Create and load in one step.
    pub fn open(path: impl Into<PathBuf>, stale_after: Duration) -> Self {
        let mut ledger = Self::new(path, stale_after);
        ledger.initialize();
        ledger
    }

    /// Load records from disk.
    ///
    /// A missing file starts empty. A corrupt file is logged and also starts
    /// empty; the next mutation overwrites it.
    pub fn initialize(&mut self) {
        self.records = if self.path.exists() {
            match Self::load(&self.path) {
                Ok(records) => {
                    tracing::info!(
                        path = %self.path.display(),
                        records = records.len(),
                        "loaded processed-file ledger"
                    );
                    records
                }
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        "could not load ledger, starting fresh: {e}"
                    );
                    BTreeMap::new()
                }
            }
        } else {
            tracing::info!(path = %self.path.display(), "no ledger found, starting fresh");
            BTreeMap::new()
        };
        self.initialized = true;
    }

    fn load(path: &Path) -> Result<BTreeMap<String, FileRecord>> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Rewrite the whole ledger: temp file next to the target, then rename.
    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.records)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn upsert(&mut self, record: FileRecord) -> Result<()> {
        self.records.insert(record.fingerprint.clone(), record);
        self.persist()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True once a completed record exists for this file.
    ///
    /// Falls back to matching `(fileName, filePath, fileSize)` among completed
    /// records, for files whose creation time drifted (restores, copies).
    #[must_use]
    pub fn is_processed(&self, identity: &FileIdentity) -> bool {
        if let Some(record) = self.records.get(&identity.fingerprint) {
            if record.is_completed() {
                tracing::debug!(
                    file = %identity.name,
                    processed_at = %record.recorded_at,
                    "already processed"
                );
                return true;
            }
        }

        let path = identity.path.to_string_lossy();
        let by_name = self.records.values().find(|r| {
            r.is_completed()
                && r.file_name == identity.name
                && r.file_path == path
                && r.size_bytes == identity.size
        });
        if let Some(record) = by_name {
            tracing::debug!(
                file = %identity.name,
                processed_at = %record.recorded_at,
                "already processed (matched by name)"
            );
            return true;
        }
        false
    }

    /// True while a live attempt holds the lock for this fingerprint.
    ///
    /// A lock older than the stale timeout is ignored so a crashed previous
    /// run cannot block the photo forever.
    #[must_use]
    pub fn is_currently_processing(&self, identity: &FileIdentity) -> bool {
        self.is_currently_processing_at(identity, Utc::now())
    }

    fn is_currently_processing_at(&self, identity: &FileIdentity, now: DateTime<Utc>) -> bool {
        let Some(record) = self.records.get(&identity.fingerprint) else {
            return false;
        };
        match record.state {
            RecordState::Completed { .. } => false,
            RecordState::Processing => {
                if now - record.recorded_at > self.stale_after {
                    tracing::warn!(
                        file = %identity.name,
                        locked_at = %record.recorded_at,
                        "stale processing lock, allowing retry"
                    );
                    false
                } else {
                    true
                }
            }
        }
    }

    /// Take the advisory lock. Persisted before returning.
    pub fn mark_processing(&mut self, identity: &FileIdentity) -> Result<()> {
        let record = FileRecord::new(identity, RecordState::Processing, Utc::now());
        self.upsert(record)?;
        tracing::info!(file = %identity.name, hash = identity.short(), "marked as processing");
        Ok(())
    }

    /// Record the terminal state. `output` is `None` for a failed attempt.
    pub fn mark_processed(&mut self, identity: &FileIdentity, output: Option<&Path>) -> Result<()> {
        let state = RecordState::Completed {
            output: output.map(|p| p.to_string_lossy().into_owned()),
        };
        let record = FileRecord::new(identity, state, Utc::now());
        self.upsert(record)?;
        tracing::info!(
            file = %identity.name,
            hash = identity.short(),
            succeeded = output.is_some(),
            "marked as processed"
        );
        Ok(())
    }

    /// Forget every record and delete the backing file.
    pub fn reset_all(&mut self) -> Result<()> {
        tracing::warn!(records = self.records.len(), "resetting all processed files");
        self.records.clear();
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
            tracing::info!(path = %self.path.display(), "deleted ledger file");
        }
        Ok(())
    }

    /// Drop records whose last transition is older than `days`.
    pub fn prune_older_than(&mut self, days: u32) -> Result<usize> {
        let cutoff = Utc::now() - chrono::Duration::days(i64::from(days));
        let before = self.records.len();
        self.records.retain(|_, r| r.recorded_at >= cutoff);
        let removed = before - self.records.len();
        if removed > 0 {
            self.persist()?;
            tracing::info!(removed, "pruned old ledger entries");
        }
        Ok(removed)
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn get(&self, fingerprint: &str) -> Option<&FileRecord> {
        self.records.get(fingerprint)
    }

    /// All records, most recent transition first.
    #[must_use]
    pub fn records(&self) -> Vec<FileRecord> {
        let mut all: Vec<FileRecord> = self.records.values().cloned().collect();
        all.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        all
    }

    #[must_use]
    pub fn status(&self) -> LedgerStatus {
        let processing = self.records.values().filter(|r| r.is_processing()).count();
        let failed = self.records.values().filter(|r| r.is_failed()).count();
        LedgerStatus {
            initialized: self.initialized,
            total_records: self.records.len(),
            processing,
            completed: self.records.len() - processing,
            failed,
            tracking_file: self.path.clone(),
            tracking_file_exists: self.path.exists(),
        }
    }
}
