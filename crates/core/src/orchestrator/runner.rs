//! Job orchestrator implementation.
//!
//! A job fetches one item into the working directory, uploads it with a
//! freshly acquired credential, then deletes the local file. Jobs are
//! independent; the only shared state is the optional concurrency limit and
//! the counters behind [`JobOrchestrator::status`].

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, oneshot, Semaphore};
use tracing::{debug, error, info, warn};

use crate::credentials::{acquire_storage_credential, CredentialProvider};
use crate::fetcher::{DownloadRequest, FetchResult, Fetcher};
use crate::uploader::{UploadJob, UploadProgress, UploadResult, Uploader};

use super::config::OrchestratorConfig;
use super::types::{JobError, JobOutcome, JobReport, JobState, OrchestratorStatus};

/// Callback invoked on every state transition with the job id and new state.
pub type JobUpdateCallback = Arc<dyn Fn(&str, JobState) + Send + Sync>;

/// A submitted job.
///
/// Awaiting `result` waits for the terminal state; dropping it leaves the
/// job running in the background.
#[derive(Debug)]
pub struct JobHandle {
    pub job_id: String,
    pub result: oneshot::Receiver<JobReport>,
}

#[derive(Default)]
struct JobStats {
    active: AtomicUsize,
    queued: AtomicUsize,
    completed: AtomicU64,
    failed: AtomicU64,
}

/// Drives download requests through fetch, upload and cleanup.
#[derive(Clone)]
pub struct JobOrchestrator {
    config: OrchestratorConfig,
    folder_id: String,
    fetcher: Arc<dyn Fetcher>,
    uploader: Arc<dyn Uploader>,
    credentials: Arc<dyn CredentialProvider>,
    limiter: Option<Arc<Semaphore>>,
    stats: Arc<JobStats>,
    on_update: Option<JobUpdateCallback>,
}

impl JobOrchestrator {
    /// Create a new orchestrator uploading into `folder_id`.
    pub fn new(
        config: OrchestratorConfig,
        folder_id: impl Into<String>,
        fetcher: Arc<dyn Fetcher>,
        uploader: Arc<dyn Uploader>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        let limiter = (config.max_concurrent_jobs > 0)
            .then(|| Arc::new(Semaphore::new(config.max_concurrent_jobs)));

        Self {
            config,
            folder_id: folder_id.into(),
            fetcher,
            uploader,
            credentials,
            limiter,
            stats: Arc::new(JobStats::default()),
            on_update: None,
        }
    }

    /// Set a callback to be notified of state transitions.
    pub fn with_update_callback(mut self, callback: JobUpdateCallback) -> Self {
        self.on_update = Some(callback);
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Build a request, falling back to the configured default quality.
    pub fn request(&self, source_url: impl Into<String>, quality: Option<String>) -> DownloadRequest {
        let quality = quality
            .filter(|q| !q.trim().is_empty())
            .unwrap_or_else(|| self.config.default_quality.clone());
        DownloadRequest::new(source_url, quality)
    }

    /// Run a job to completion on the current task.
    pub async fn run(&self, request: DownloadRequest) -> JobReport {
        let job_id = new_job_id();
        self.transition(&job_id, JobState::Received);
        self.execute(job_id, request).await
    }

    /// Schedule a job on the runtime and return immediately.
    pub fn submit(&self, request: DownloadRequest) -> JobHandle {
        let job_id = new_job_id();
        self.transition(&job_id, JobState::Received);

        let (tx, rx) = oneshot::channel();
        let this = self.clone();
        let id = job_id.clone();

        tokio::spawn(async move {
            let report = this.execute(id, request).await;
            // Receiver is gone for fire-and-forget callers
            let _ = tx.send(report);
        });

        JobHandle { job_id, result: rx }
    }

    /// Get current orchestrator status.
    pub fn status(&self) -> OrchestratorStatus {
        OrchestratorStatus {
            active_jobs: self.stats.active.load(Ordering::Relaxed),
            queued_jobs: self.stats.queued.load(Ordering::Relaxed),
            completed_jobs: self.stats.completed.load(Ordering::Relaxed),
            failed_jobs: self.stats.failed.load(Ordering::Relaxed),
            max_concurrent_jobs: self.config.max_concurrent_jobs,
        }
    }

    async fn execute(&self, job_id: String, request: DownloadRequest) -> JobReport {
        let start = Instant::now();
        info!(
            "Job {} received: {} (quality {})",
            job_id, request.source_url, request.quality
        );

        // Held until the job is terminal
        let _permit = match &self.limiter {
            Some(limiter) => {
                self.stats.queued.fetch_add(1, Ordering::Relaxed);
                let permit = Arc::clone(limiter).acquire_owned().await.ok();
                self.stats.queued.fetch_sub(1, Ordering::Relaxed);
                permit
            }
            None => None,
        };
        let active = ActiveJob::enter(&self.stats);
        let outcome = self.drive(&job_id, &request).await;
        drop(active);

        let report = JobReport {
            job_id,
            request,
            outcome,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        match &report.outcome {
            JobOutcome::Success {
                remote_object_id, ..
            } => {
                self.stats.completed.fetch_add(1, Ordering::Relaxed);
                info!(
                    "Job {} completed in {}ms: {}",
                    report.job_id, report.duration_ms, remote_object_id
                );
            }
            JobOutcome::Failure { stage, message, .. } => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                error!(
                    "Job {} failed during {}: {}",
                    report.job_id,
                    stage.as_str(),
                    message
                );
            }
        }
        self.transition(&report.job_id, report.final_state());

        report
    }

    async fn drive(&self, job_id: &str, request: &DownloadRequest) -> JobOutcome {
        self.transition(job_id, JobState::Fetching);
        let fetched = match self.fetcher.fetch(request).await {
            Ok(fetched) => fetched,
            // Nothing was written, so there is nothing to clean up
            Err(e) => return JobOutcome::from(&JobError::from(e)),
        };

        let local_file = LocalFile::new(job_id, &fetched.local_path);

        self.transition(job_id, JobState::Uploading);
        let uploaded = self.upload(job_id, &fetched).await;

        self.transition(job_id, JobState::CleaningUp);
        local_file.remove().await;

        match uploaded {
            Ok(result) => JobOutcome::Success {
                title: fetched.title,
                file_name: result.file_name,
                remote_object_id: result.remote_object_id,
            },
            Err(e) => JobOutcome::from(&e),
        }
    }

    async fn upload(&self, job_id: &str, fetched: &FetchResult) -> Result<UploadResult, JobError> {
        let credential = acquire_storage_credential(self.credentials.as_ref()).await?;
        let job = UploadJob::for_file(&fetched.local_path, &self.folder_id)
            .with_file_name(fetched.file_name());

        let (progress_tx, mut progress_rx) = mpsc::channel::<UploadProgress>(16);
        let upload = self.uploader.upload_with_progress(&job, &credential, progress_tx);
        let report = async {
            while let Some(progress) = progress_rx.recv().await {
                debug!(
                    "Job {} uploaded {}/{} bytes ({:.0}%)",
                    job_id,
                    progress.bytes_sent,
                    progress.total_bytes,
                    progress.fraction() * 100.0
                );
            }
        };

        // The sender lives in the upload future, so the report loop ends with it
        let (result, ()) = tokio::join!(upload, report);
        Ok(result?)
    }

    fn transition(&self, job_id: &str, state: JobState) {
        debug!("Job {} -> {}", job_id, state);
        if let Some(callback) = &self.on_update {
            callback(job_id, state);
        }
    }
}

fn new_job_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Counts a job as active until dropped, so a panicking job still leaves.
struct ActiveJob<'a> {
    stats: &'a JobStats,
}

impl<'a> ActiveJob<'a> {
    fn enter(stats: &'a JobStats) -> Self {
        stats.active.fetch_add(1, Ordering::Relaxed);
        Self { stats }
    }
}

impl Drop for ActiveJob<'_> {
    fn drop(&mut self) {
        self.stats.active.fetch_sub(1, Ordering::Relaxed);
    }
}

/// A fetched file that must not outlive its job.
///
/// [`LocalFile::remove`] is the normal path. If the job unwinds first, the
/// file is removed synchronously on drop.
struct LocalFile {
    job_id: String,
    path: Option<PathBuf>,
}

impl LocalFile {
    fn new(job_id: &str, path: &Path) -> Self {
        Self {
            job_id: job_id.to_string(),
            path: Some(path.to_path_buf()),
        }
    }

    async fn remove(mut self) {
        if let Some(path) = self.path.take() {
            remove_local_file(&self.job_id, &path).await;
        }
    }
}

impl Drop for LocalFile {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            warn!(
                "Job {} aborted, removing {}",
                self.job_id,
                path.display()
            );
            if let Err(e) = std::fs::remove_file(&path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Job {}: failed to remove {}: {}", self.job_id, path.display(), e);
                }
            }
        }
    }
}

/// Delete the fetched file. Failures are logged and never escalated.
async fn remove_local_file(job_id: &str, path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Job {} removed {}", job_id, path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Job {}: {} already gone", job_id, path.display())
        }
        Err(e) => warn!(
            "Job {}: failed to remove {}: {}",
            job_id,
            path.display(),
            e
        ),
    }
}
