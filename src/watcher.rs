//! File watcher: the poll loop that drives photos through the pipeline.
//!
//! Each photo goes through lock → analysis → generation → publish →
//! completion. The lock is persisted before any collaborator is called, and
//! every attempt that took the lock ends completed (with or without an
//! output), so no photo is billed twice.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::collab::{self, Analyzer, Generator};
use crate::config::Config;
use crate::error::{PhotoboothError, Result};
use crate::ingest::hasher::{self, FileIdentity};
use crate::ingest::scanner::Scanner;
use crate::ledger::{Ledger, LedgerStatus};
use crate::models::MediaFile;
use crate::publish;

/// Ledger handle shared between the poll loop and status queries.
pub type SharedLedger = Arc<Mutex<Ledger>>;

/// Pipeline step an attempt failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Analysis,
    Generation,
    Publish,
}

/// Result of one attempt at one photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Completed with a published artifact.
    Published(PathBuf),
    /// Completed without an artifact.
    Failed(Stage),
    /// The lock could not be persisted; nothing was sent out.
    LockFailed,
}

/// Why a discovered photo was or was not picked up.
#[derive(Debug)]
enum Eligibility {
    New(FileIdentity),
    Processed,
    InFlight,
    Unreadable,
}

/// Counters for one poll tick.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TickReport {
    pub scanned: usize,
    pub skipped_processed: usize,
    pub skipped_in_flight: usize,
    pub skipped_unreadable: usize,
    pub attempted: usize,
    pub published: usize,
    pub failed: usize,
    pub lock_failures: usize,
    /// Published artifact paths, in processing order.
    pub outputs: Vec<PathBuf>,
}

impl TickReport {
    fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Published(path) => {
                self.attempted += 1;
                self.published += 1;
                self.outputs.push(path);
            }
            FileOutcome::Failed(_) => {
                self.attempted += 1;
                self.failed += 1;
            }
            FileOutcome::LockFailed => self.lock_failures += 1,
        }
    }
}

/// Snapshot for status queries.
#[derive(Debug, Clone, Serialize)]
pub struct WatcherStatus {
    /// Whether this process's poll loop is running.
    pub is_running: bool,
    pub processed_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_check: Option<DateTime<Utc>>,
    pub ledger: LedgerStatus,
}

pub struct Watcher {
    scanner: Scanner,
    ledger: SharedLedger,
    analyzer: Arc<dyn Analyzer>,
    generator: Arc<dyn Generator>,
    output_dir: PathBuf,
    poll_interval: Duration,
    running: AtomicBool,
    last_check: RwLock<Option<DateTime<Utc>>>,
}

impl std::fmt::Debug for Watcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("input", &self.scanner.root())
            .field("output", &self.output_dir)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl Watcher {
    pub fn new(
        scanner: Scanner,
        ledger: SharedLedger,
        analyzer: Arc<dyn Analyzer>,
        generator: Arc<dyn Generator>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            scanner,
            ledger,
            analyzer,
            generator,
            output_dir: output_dir.into(),
            poll_interval: Duration::from_secs(15),
            running: AtomicBool::new(false),
            last_check: RwLock::new(None),
        }
    }

    /// Wire a watcher from config: loads the ledger and builds collaborators.
    pub fn from_config(config: &Config) -> Self {
        let ledger = Ledger::open(&config.ledger_path, config.stale_lock_timeout());
        let (analyzer, generator) = collab::from_config(config);
        Self::new(
            Scanner::new(config.input_dir()),
            Arc::new(Mutex::new(ledger)),
            analyzer,
            generator,
            config.output_dir(),
        )
        .with_poll_interval(config.poll_interval())
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn ledger(&self) -> &SharedLedger {
        &self.ledger
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// One poll tick: scan, filter through the ledger, process new photos
    /// one after another in scan order. Never fails.
    pub async fn check_for_new_files(&self) -> TickReport {
        *self.last_check.write().await = Some(Utc::now());
        let files = self.scanner.list_input_files();
        let mut report = TickReport {
            scanned: files.len(),
            ..TickReport::default()
        };

        for file in &files {
            match self.eligibility(file).await {
                Eligibility::Processed => report.skipped_processed += 1,
                Eligibility::InFlight => report.skipped_in_flight += 1,
                Eligibility::Unreadable => report.skipped_unreadable += 1,
                Eligibility::New(identity) => {
                    tracing::info!(file = %file.name, "new photo detected");
                    let outcome = self.process_file(file, &identity).await;
                    report.record(outcome);
                }
            }
        }
        report
    }

    /// Photos a tick would pick up right now, without processing them.
    pub async fn pending_files(&self) -> Vec<MediaFile> {
        let mut pending = Vec::new();
        for file in self.scanner.list_input_files() {
            if let Eligibility::New(_) = self.eligibility(&file).await {
                pending.push(file);
            }
        }
        pending
    }

    async fn eligibility(&self, file: &MediaFile) -> Eligibility {
        let identity = match probe(file).await {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!(file = %file.name, "skipping this tick: {e}");
                return Eligibility::Unreadable;
            }
        };
        let ledger = self.ledger.lock().await;
        if ledger.is_processed(&identity) {
            Eligibility::Processed
        } else if ledger.is_currently_processing(&identity) {
            tracing::debug!(file = %file.name, "currently being processed");
            Eligibility::InFlight
        } else {
            Eligibility::New(identity)
        }
    }

    /// Run one photo through the pipeline and record the terminal state.
    pub async fn process_file(&self, file: &MediaFile, identity: &FileIdentity) -> FileOutcome {
        let started = Instant::now();

        if let Err(e) = self.ledger.lock().await.mark_processing(identity) {
            tracing::error!(file = %file.name, "cannot persist processing lock, skipping: {e}");
            return FileOutcome::LockFailed;
        }

        let result = self.run_pipeline(file).await;
        let output = match &result {
            Ok(path) => Some(path.as_path()),
            Err((stage, e)) => {
                tracing::error!(
                    file = %file.name,
                    ?stage,
                    external = e.is_external(),
                    "processing failed: {e}"
                );
                None
            }
        };

        // Reached on every path once the lock is held.
        if let Err(e) = self.ledger.lock().await.mark_processed(identity, output) {
            tracing::error!(file = %file.name, "cannot persist completion: {e}");
        }

        let elapsed = started.elapsed().as_secs_f64();
        match result {
            Ok(path) => {
                tracing::info!(
                    file = %file.name,
                    output = %path.display(),
                    elapsed,
                    "photo processed"
                );
                FileOutcome::Published(path)
            }
            Err((stage, _)) => {
                tracing::warn!(
                    file = %file.name,
                    elapsed,
                    "photo marked processed despite failure"
                );
                FileOutcome::Failed(stage)
            }
        }
    }

    async fn run_pipeline(
        &self,
        file: &MediaFile,
    ) -> std::result::Result<PathBuf, (Stage, PhotoboothError)> {
        tracing::info!(file = %file.name, "analyzing photo");
        let directive = self
            .analyzer
            .analyze(&file.path)
            .await
            .map_err(|e| (Stage::Analysis, e))?;

        tracing::info!(file = %file.name, chars = directive.len(), "generating video");
        let artifact = self
            .generator
            .generate(&directive, &file.path, &file.name)
            .await
            .map_err(|e| (Stage::Generation, e))?;

        let name = publish::final_name(&file.name, &artifact, Utc::now());
        publish::publish(&artifact, &name, &self.output_dir)
            .await
            .map_err(|e| (Stage::Publish, e))
    }

    /// Start the poll loop on a background task.
    ///
    /// The first tick fires immediately. Stopping waits for an in-flight tick
    /// to finish; a photo is never abandoned mid-pipeline.
    pub fn spawn(self: Arc<Self>) -> Result<WatcherHandle> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(PhotoboothError::Other("file watcher already running".into()));
        }
        tracing::info!(
            input = %self.scanner.root().display(),
            interval_secs = self.poll_interval.as_secs(),
            "starting file watcher"
        );

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let watcher = Arc::clone(&self);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(watcher.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => {
                        tracing::info!("file watcher stopping");
                        break;
                    }
                    _ = ticker.tick() => {
                        let report = watcher.check_for_new_files().await;
                        if report.attempted > 0 || report.lock_failures > 0 {
                            tracing::info!(
                                attempted = report.attempted,
                                published = report.published,
                                failed = report.failed,
                                "poll tick finished"
                            );
                        } else {
                            tracing::debug!(scanned = report.scanned, "poll tick finished");
                        }
                    }
                }
            }
            watcher.running.store(false, Ordering::SeqCst);
        });

        Ok(WatcherHandle { shutdown_tx, task })
    }

    pub async fn status(&self) -> WatcherStatus {
        let ledger = self.ledger.lock().await;
        WatcherStatus {
            is_running: self.is_running(),
            processed_count: ledger.count(),
            last_check: *self.last_check.read().await,
            ledger: ledger.status(),
        }
    }
}

/// Hash off the async runtime; photos can be large.
async fn probe(file: &MediaFile) -> Result<FileIdentity> {
    let path = file.path.clone();
    let name = file.name.clone();
    tokio::task::spawn_blocking(move || hasher::fingerprint(&path, &name))
        .await
        .map_err(|e| PhotoboothError::Other(format!("hash task failed: {e}")))?
}

/// Handle to a running poll loop.
#[derive(Debug)]
pub struct WatcherHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl WatcherHandle {
    /// Signal shutdown and wait for the loop to exit.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            tracing::error!("file watcher task ended abnormally: {e}");
        }
        tracing::info!("file watcher stopped");
    }
}
