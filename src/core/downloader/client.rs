use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures_util::StreamExt;
use reqwest::Client;
use sha1::{Digest, Sha1};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::retry::RetryPolicy;
use super::task::DownloadTask;
use crate::core::error::{LauncherError, LauncherResult, Silently};
use crate::core::progress::{CancellationToken, Phase, ProgressTracker};

const DEFAULT_CONCURRENCY: usize = 8;

/// Concurrent, SHA-1 validated downloader.
///
/// Cloning is cheap and every clone shares the same permit pool, so the
/// concurrency cap holds across batches running at the same time.
#[derive(Clone)]
pub struct Downloader {
    client: Client,
    /// Maximum number of parallel downloads.
    concurrency: usize,
    permits: Arc<Semaphore>,
    retry: RetryPolicy,
    progress: Arc<ProgressTracker>,
    in_flight: Arc<InFlight>,
}

#[derive(Debug, Default)]
struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
}

struct InFlightSlot<'a>(&'a InFlight);

impl InFlight {
    fn enter(&self) -> InFlightSlot<'_> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        InFlightSlot(self)
    }
}

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        self.0.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Removes a partially written file unless the download was committed.
struct TempFile {
    path: PathBuf,
    armed: bool,
}

impl TempFile {
    fn next_to(dest: &Path) -> Self {
        let name = dest
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let path = dest.with_file_name(format!(".{}.{}.part", name, uuid::Uuid::new_v4()));
        Self { path, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if self.armed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

impl Downloader {
    pub fn new(client: Client, progress: Arc<ProgressTracker>) -> Self {
        Self {
            client,
            concurrency: DEFAULT_CONCURRENCY,
            permits: Arc::new(Semaphore::new(DEFAULT_CONCURRENCY)),
            retry: RetryPolicy::default(),
            progress,
            in_flight: Arc::default(),
        }
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self.permits = Arc::new(Semaphore::new(self.concurrency));
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn progress(&self) -> &Arc<ProgressTracker> {
        &self.progress
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Highest number of downloads observed in flight at once.
    pub fn peak_in_flight(&self) -> usize {
        self.in_flight.peak.load(Ordering::SeqCst)
    }

    // ── Single file download ────────────────────────────

    /// Download `task` and account it against `phase`.
    ///
    /// Returns the verified destination path.
    pub async fn download(&self, task: &DownloadTask, phase: Phase) -> LauncherResult<PathBuf> {
        let path = self.fetch_verified(task).await?;
        self.progress.complete(phase, &task.display_name);
        Ok(path)
    }

    pub async fn download_silent(&self, task: &DownloadTask, phase: Phase) -> Option<PathBuf> {
        self.download(task, phase)
            .await
            .silently(&format!("download of {}", task.url))
    }

    /// Download without touching the progress counters. Used for metadata
    /// such as asset indexes and installer jars.
    pub(crate) async fn fetch_verified(&self, task: &DownloadTask) -> LauncherResult<PathBuf> {
        if task.skip {
            return Ok(task.dest.clone());
        }

        if is_up_to_date(task).await? {
            debug!("Up to date: {:?}", task.dest);
            return Ok(task.dest.clone());
        }

        // Ensure parent dir exists
        if let Some(parent) = task.dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(LauncherError::io(parent))?;
        }

        let this = self;
        if let Err(e) = self.retry.run(&task.url, move |_| this.attempt(task)).await {
            // A stale copy that failed verification must not survive the failed refresh
            match tokio::fs::remove_file(&task.dest).await {
                Ok(()) => warn!("Removed outdated {:?} after failed download", task.dest),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => warn!("Could not remove outdated {:?}: {}", task.dest, err),
            }
            return Err(e);
        }

        debug!("Downloaded: {} -> {:?}", task.url, task.dest);
        Ok(task.dest.clone())
    }

    /// One network attempt: stream to a temp file, verify, then move into place.
    async fn attempt(&self, task: &DownloadTask) -> LauncherResult<()> {
        let temp = TempFile::next_to(&task.dest);

        let response = self.client.get(&task.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: task.url.clone(),
                status: status.as_u16(),
            });
        }

        // Write inside a block so the handle is dropped before the rename
        {
            let mut file = tokio::fs::File::create(&temp.path)
                .await
                .map_err(LauncherError::io(&temp.path))?;
            let mut body = response.bytes_stream();
            while let Some(chunk) = body.next().await {
                let chunk = chunk?;
                file.write_all(&chunk)
                    .await
                    .map_err(LauncherError::io(&temp.path))?;
            }
            file.flush().await.map_err(LauncherError::io(&temp.path))?;
        }

        if let Some(expected) = &task.sha1 {
            let actual = sha1_file(&temp.path).await?;
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(LauncherError::Sha1Mismatch {
                    path: task.dest.clone(),
                    expected: expected.clone(),
                    actual,
                });
            }
        }

        tokio::fs::rename(&temp.path, &task.dest)
            .await
            .map_err(|source| LauncherError::Commit {
                from: temp.path.clone(),
                to: task.dest.clone(),
                source,
            })?;
        temp.disarm();
        Ok(())
    }

    // ── Batch concurrent downloads ──────────────────────

    /// Download every task, at most `concurrency` at a time.
    ///
    /// All-or-nothing: the first unrecoverable failure aborts the remaining
    /// tasks and is returned.
    pub async fn download_batch(
        &self,
        tasks: Vec<DownloadTask>,
        phase: Phase,
        cancel: &CancellationToken,
    ) -> LauncherResult<()> {
        self.progress.add_total(phase, tasks.len() as u64);
        self.run_batch(tasks, phase, cancel).await
    }

    pub async fn download_batch_silent(
        &self,
        tasks: Vec<DownloadTask>,
        phase: Phase,
        cancel: &CancellationToken,
    ) -> bool {
        self.download_batch(tasks, phase, cancel)
            .await
            .silently("batch download")
            .is_some()
    }

    /// Like [`download_batch`](Self::download_batch) for tasks whose totals
    /// were already registered with the progress tracker.
    pub(crate) async fn run_batch(
        &self,
        tasks: Vec<DownloadTask>,
        phase: Phase,
        cancel: &CancellationToken,
    ) -> LauncherResult<()> {
        if tasks.is_empty() {
            return Ok(());
        }

        info!(
            "Starting batch download: {} files, concurrency={}",
            tasks.len(),
            self.concurrency
        );

        let mut workers = JoinSet::new();
        for task in tasks {
            let downloader = self.clone();
            let cancel = cancel.clone();
            workers.spawn(async move {
                let _permit = downloader
                    .permits
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|e| LauncherError::Worker(e.to_string()))?;
                cancel.check()?;
                let _slot = downloader.in_flight.enter();
                downloader.download(&task, phase).await.map(|_| ())
            });
        }

        while let Some(joined) = workers.join_next().await {
            let outcome = joined
                .map_err(|e| LauncherError::Worker(e.to_string()))
                .and_then(|result| result);
            if let Err(e) = outcome {
                warn!("Aborting batch: {}", e);
                workers.abort_all();
                while workers.join_next().await.is_some() {}
                return Err(e);
            }
        }

        Ok(())
    }
}

async fn is_up_to_date(task: &DownloadTask) -> LauncherResult<bool> {
    match tokio::fs::metadata(&task.dest).await {
        Ok(meta) if meta.is_file() => match &task.sha1 {
            None => Ok(true),
            Some(expected) => Ok(sha1_file(&task.dest)
                .await?
                .eq_ignore_ascii_case(expected)),
        },
        _ => Ok(false),
    }
}

/// Hex SHA-1 of a file on disk.
pub async fn sha1_file(path: &Path) -> LauncherResult<String> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(LauncherError::io(path))?;
    let mut hasher = Sha1::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let read = file.read(&mut buf).await.map_err(LauncherError::io(path))?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}
