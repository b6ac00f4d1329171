//! Folder preprocessing passes.
//!
//! A folder is either idle or has exactly one pass running. The running set
//! is checked and updated in one critical section with no `.await` inside,
//! and a drop guard clears the entry on every exit path, including panics
//! and errors. Each entry carries a `watch` channel whose sender lives in the
//! guard, so waiters wake the moment the pass ends.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use boxlabel_core::decode::derived_file_name;
use boxlabel_core::{compress, CompressPolicy};
use serde::Serialize;
use tokio::sync::{watch, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::store::{self, DerivedStore, Tier};
use crate::ServiceError;

/// Counts from one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    /// Allow-listed source images found.
    pub discovered: usize,
    /// Images written to the preprocessed tier.
    pub processed: usize,
    /// Images whose preprocessed file already existed, or whose derived
    /// name was taken by an earlier source in the same folder.
    pub skipped: usize,
    /// Images that could not be read, decoded, encoded or written.
    pub failed: usize,
    /// Written, but still larger than the byte budget.
    pub over_budget: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// Another pass for the folder was in flight; nothing was done.
    AlreadyRunning,
    Completed(PassReport),
}

impl PassOutcome {
    pub fn report(&self) -> Option<&PassReport> {
        match self {
            PassOutcome::AlreadyRunning => None,
            PassOutcome::Completed(report) => Some(report),
        }
    }
}

/// Folder name to a receiver that closes when that folder's pass ends.
type RunningSet = Arc<Mutex<HashMap<String, watch::Receiver<()>>>>;

fn lock(running: &RunningSet) -> MutexGuard<'_, HashMap<String, watch::Receiver<()>>> {
    running.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Membership of one folder in the running set.
struct RunningGuard {
    running: RunningSet,
    folder: String,
    // Dropped after the entry is removed, closing every waiter's receiver.
    _done: watch::Sender<()>,
}

impl RunningGuard {
    fn acquire(running: &RunningSet, folder: &str) -> Option<Self> {
        let mut set = lock(running);
        if set.contains_key(folder) {
            return None;
        }
        let (done, finished) = watch::channel(());
        set.insert(folder.to_string(), finished);
        Some(Self {
            running: Arc::clone(running),
            folder: folder.to_string(),
            _done: done,
        })
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        lock(&self.running).remove(&self.folder);
    }
}

/// Runs preprocessing passes, at most one per folder at a time.
///
/// Cloning yields another handle to the same running set.
#[derive(Debug, Clone)]
pub struct PreprocessCoordinator {
    store: DerivedStore,
    policy: CompressPolicy,
    max_concurrent: usize,
    running: RunningSet,
}

impl PreprocessCoordinator {
    pub fn new(store: DerivedStore, policy: CompressPolicy, max_concurrent: usize) -> Self {
        Self {
            store,
            policy,
            max_concurrent: max_concurrent.max(1),
            running: Arc::default(),
        }
    }

    /// Run a pass and wait for it, or return at once if one is running.
    pub async fn trigger(&self, folder: &str) -> Result<PassOutcome, ServiceError> {
        self.run(folder, false).await
    }

    /// Like [`trigger`](Self::trigger), but regenerates existing files.
    pub async fn reprocess(&self, folder: &str) -> Result<PassOutcome, ServiceError> {
        self.run(folder, true).await
    }

    /// Start a pass on the runtime without waiting for it.
    ///
    /// Returns `None` if a pass for the folder is already running. The
    /// running entry is taken before this returns, so a `trigger` issued
    /// right after sees the folder as busy. The handle may be dropped.
    pub fn spawn(
        &self,
        folder: &str,
    ) -> Result<Option<JoinHandle<Result<PassReport, ServiceError>>>, ServiceError> {
        store::validate_name(folder)?;
        let Some(guard) = RunningGuard::acquire(&self.running, folder) else {
            debug!(folder, "preprocessing already running");
            return Ok(None);
        };

        let this = self.clone();
        let folder = folder.to_string();
        Ok(Some(tokio::spawn(async move {
            let _guard = guard;
            this.pass(&folder, false).await
        })))
    }

    pub fn is_running(&self, folder: &str) -> bool {
        lock(&self.running).contains_key(folder)
    }

    /// Wait until no pass is running for `folder`. Returns at once if idle.
    pub async fn wait_idle(&self, folder: &str) {
        let finished = lock(&self.running).get(folder).cloned();
        if let Some(mut finished) = finished {
            // The guard never sends; the call returns once its sender drops.
            while finished.changed().await.is_ok() {}
        }
    }

    async fn run(&self, folder: &str, reprocess: bool) -> Result<PassOutcome, ServiceError> {
        store::validate_name(folder)?;
        let Some(_guard) = RunningGuard::acquire(&self.running, folder) else {
            debug!(folder, "preprocessing already running");
            return Ok(PassOutcome::AlreadyRunning);
        };
        self.pass(folder, reprocess).await.map(PassOutcome::Completed)
    }

    async fn pass(&self, folder: &str, reprocess: bool) -> Result<PassReport, ServiceError> {
        let result = self.pass_inner(folder, reprocess).await;
        match &result {
            Ok(report) => info!(
                folder,
                discovered = report.discovered,
                processed = report.processed,
                skipped = report.skipped,
                failed = report.failed,
                over_budget = report.over_budget,
                "preprocessing finished"
            ),
            Err(err) => error!(folder, error = %err, "preprocessing failed"),
        }
        result
    }

    async fn pass_inner(&self, folder: &str, reprocess: bool) -> Result<PassReport, ServiceError> {
        let sources = self.store.list_source_images(folder).await?;
        let mut report = PassReport {
            discovered: sources.len(),
            ..PassReport::default()
        };
        if sources.is_empty() {
            return Ok(report);
        }
        info!(folder, images = sources.len(), reprocess, "preprocessing started");

        let dest_dir = self.store.tier_dir(folder, Tier::Preprocessed)?;
        tokio::fs::create_dir_all(&dest_dir)
            .await
            .map_err(ServiceError::io(&dest_dir))?;

        let limiter = Arc::new(Semaphore::new(self.max_concurrent));
        let mut jobs = JoinSet::new();
        // Sources are sorted, so the first name per derived file wins.
        let mut claimed = HashSet::new();

        for name in sources {
            if !claimed.insert(derived_file_name(&name)) {
                warn!(folder, image = %name, "another source already maps to this derived file");
                report.skipped += 1;
                continue;
            }

            let (src, dest) = match self.image_paths(folder, &name) {
                Ok(paths) => paths,
                Err(err) => {
                    report.failed += 1;
                    warn!(folder, image = %name, error = %err, "failed to preprocess image");
                    continue;
                }
            };

            if !reprocess {
                match store::file_exists(&dest).await {
                    Ok(true) => {
                        debug!(folder, image = %name, "already preprocessed");
                        report.skipped += 1;
                        continue;
                    }
                    Ok(false) => {}
                    Err(err) => {
                        report.failed += 1;
                        warn!(folder, image = %name, error = %err, "failed to preprocess image");
                        continue;
                    }
                }
            }

            // The semaphore is local to this pass and never closed.
            let Ok(permit) = Arc::clone(&limiter).acquire_owned().await else {
                break;
            };
            let policy = self.policy;
            jobs.spawn(async move {
                let _permit = permit;
                let result = preprocess_one(src, dest, policy).await;
                (name, result)
            });
        }

        while let Some(joined) = jobs.join_next().await {
            match joined {
                Ok((name, Ok(budget_met))) => {
                    report.processed += 1;
                    if !budget_met {
                        report.over_budget += 1;
                        warn!(folder, image = %name, "preprocessed image exceeds byte budget");
                    }
                }
                Ok((name, Err(err))) => {
                    report.failed += 1;
                    warn!(folder, image = %name, error = %err, "failed to preprocess image");
                }
                Err(err) => {
                    report.failed += 1;
                    warn!(folder, error = %err, "preprocessing task aborted");
                }
            }
        }

        Ok(report)
    }

    fn image_paths(&self, folder: &str, image: &str) -> Result<(PathBuf, PathBuf), ServiceError> {
        let src = self.store.source_path(folder, image)?;
        let dest = self.store.tier_path(folder, image, Tier::Preprocessed)?;
        Ok((src, dest))
    }
}

/// Compress one source into the preprocessed tier. Returns whether the
/// output met the byte budget.
async fn preprocess_one(
    src: PathBuf,
    dest: PathBuf,
    policy: CompressPolicy,
) -> Result<bool, ServiceError> {
    let bytes = tokio::fs::read(&src).await.map_err(ServiceError::io(&src))?;
    let source_len = bytes.len();

    let compressed = tokio::task::spawn_blocking(move || compress(&bytes, &policy)).await??;

    debug!(
        source = %src.display(),
        source_len,
        output_len = compressed.bytes.len(),
        quality = compressed.quality,
        width = compressed.width,
        height = compressed.height,
        attempts = compressed.attempts.len(),
        "compressed image"
    );

    store::write_atomic(&dest, &compressed.bytes).await?;
    Ok(compressed.budget_met)
}
