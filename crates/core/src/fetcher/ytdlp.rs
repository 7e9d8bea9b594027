//! yt-dlp based fetcher implementation.
//!
//! Each run writes into its own staging directory under the working
//! directory. The finished file is moved up into the working directory;
//! everything else the run produced (partial downloads, playlist entries,
//! intermediate formats) is removed with the staging directory.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

use super::config::FetcherConfig;
use super::error::FetchError;
use super::traits::Fetcher;
use super::types::{DownloadRequest, FetchResult};

static ERROR_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^ERROR:\s*(.+?)\s*$").expect("static regex"));

/// Prefix of per-run staging directories.
const STAGING_PREFIX: &str = ".fetch-";

/// Suffixes yt-dlp uses for in-flight downloads.
const PARTIAL_SUFFIXES: &[&str] = &[".part", ".ytdl"];

/// Info document printed by `--dump-single-json`.
#[derive(Debug, Deserialize)]
struct InfoDocument {
    #[serde(rename = "_type")]
    kind: Option<String>,
    title: Option<String>,
    filename: Option<String>,
    #[serde(rename = "_filename")]
    legacy_filename: Option<String>,
    #[serde(default)]
    requested_downloads: Vec<RequestedDownload>,
    /// Playlist entries; unavailable entries are `null`.
    #[serde(default)]
    entries: Vec<Option<InfoDocument>>,
}

#[derive(Debug, Deserialize)]
struct RequestedDownload {
    filepath: Option<String>,
    #[serde(rename = "_filename")]
    filename: Option<String>,
}

impl InfoDocument {
    /// Final on-disk path, preferring the post-processed location.
    fn resolved_path(&self) -> Option<PathBuf> {
        self.requested_downloads
            .iter()
            .find_map(|d| d.filepath.clone().or_else(|| d.filename.clone()))
            .or_else(|| self.filename.clone())
            .or_else(|| self.legacy_filename.clone())
            .map(PathBuf::from)
    }

    /// Every path the document mentions, playlist entries included.
    fn reported_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .requested_downloads
            .iter()
            .flat_map(|d| [d.filepath.as_ref(), d.filename.as_ref()])
            .chain([self.filename.as_ref(), self.legacy_filename.as_ref()])
            .flatten()
            .map(PathBuf::from)
            .collect();

        for entry in self.entries.iter().flatten() {
            paths.extend(entry.reported_paths());
        }

        paths.sort();
        paths.dedup();
        paths
    }
}

/// Fetcher that shells out to yt-dlp.
pub struct YtDlpFetcher {
    config: FetcherConfig,
}

impl YtDlpFetcher {
    /// Creates a new fetcher with the given configuration.
    pub fn new(config: FetcherConfig) -> Self {
        Self { config }
    }

    /// Creates a fetcher with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(FetcherConfig::default())
    }

    /// Directory downloads are written to.
    pub fn working_dir(&self) -> &Path {
        &self.config.working_dir
    }

    /// Builds yt-dlp arguments for a single-item download into `output_dir`.
    fn build_args(&self, request: &DownloadRequest, output_dir: &Path) -> Vec<String> {
        let output = output_dir.join(&self.config.output_template);

        let mut args = vec![
            "--no-playlist".to_string(),
            "--no-progress".to_string(),
            "--no-simulate".to_string(),
            "--dump-single-json".to_string(),
            "-f".to_string(),
            request.quality.clone(),
            "-o".to_string(),
            output.to_string_lossy().to_string(),
        ];

        args.extend(self.config.extra_args.iter().cloned());

        // End of options: the URL can never be read as a flag
        args.push("--".to_string());
        args.push(request.source_url.trim().to_string());

        args
    }

    /// Last `ERROR:` line yt-dlp wrote, if any.
    fn extract_error(stderr: &str) -> Option<String> {
        ERROR_LINE
            .captures_iter(stderr)
            .last()
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Parses the info document from stdout. yt-dlp prints it as the last
    /// line; anything before it comes from extra args such as `--print`.
    fn parse_document(stdout: &str) -> Result<InfoDocument, FetchError> {
        let line = stdout
            .lines()
            .rev()
            .find(|line| line.trim_start().starts_with('{'))
            .ok_or_else(|| FetchError::ParseError {
                reason: "yt-dlp printed no info document".to_string(),
            })?;

        serde_json::from_str(line).map_err(|e| FetchError::ParseError {
            reason: e.to_string(),
        })
    }

    /// Title and file path of a single-item download.
    fn parse_info(stdout: &str, url: &str) -> Result<(String, PathBuf), FetchError> {
        let info = Self::parse_document(stdout)?;

        if info.kind.as_deref() == Some("playlist") {
            return Err(FetchError::PlaylistNotSupported {
                url: url.to_string(),
            });
        }

        let path = info.resolved_path().ok_or_else(|| FetchError::ParseError {
            reason: "info document has no file path".to_string(),
        })?;

        let title = info.title.clone().unwrap_or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().to_string())
                .unwrap_or_default()
        });

        Ok((title, path))
    }

    async fn run(&self, args: Vec<String>) -> Result<std::process::Output, FetchError> {
        let child = Command::new(&self.config.ytdlp_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    FetchError::BinaryNotFound {
                        path: self.config.ytdlp_path.clone(),
                    }
                } else {
                    FetchError::Io(e)
                }
            })?;

        let output = child.wait_with_output();
        match self.config.timeout_secs {
            // Dropping the future drops the child, which kills it
            Some(secs) => timeout(Duration::from_secs(secs), output)
                .await
                .map_err(|_| FetchError::Timeout { timeout_secs: secs })?
                .map_err(FetchError::Io),
            None => output.await.map_err(FetchError::Io),
        }
    }

    /// Runs yt-dlp into `staging` and moves the result into the working dir.
    async fn fetch_into(
        &self,
        request: &DownloadRequest,
        staging: &Path,
    ) -> Result<FetchResult, FetchError> {
        let start = Instant::now();
        let args = self.build_args(request, staging);
        debug!("Running {:?} {:?}", self.config.ytdlp_path, args);

        let output = self.run(args).await?;
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        let result = if output.status.success() {
            self.finish(&stdout, request, staging).await
        } else {
            let reason = Self::extract_error(&stderr)
                .unwrap_or_else(|| format!("yt-dlp exited with {}", output.status));
            warn!("yt-dlp failed for {}: {}", request.source_url, reason);
            Err(FetchError::extraction_failed(reason, Some(stderr)))
        };

        match result {
            Ok(fetched) => {
                info!(
                    "Downloaded \"{}\" to {} ({} bytes in {}ms)",
                    fetched.title,
                    fetched.local_path.display(),
                    fetched.size_bytes,
                    start.elapsed().as_millis()
                );
                Ok(fetched)
            }
            Err(e) => {
                self.remove_reported_files(&stdout).await;
                Err(e)
            }
        }
    }

    async fn finish(
        &self,
        stdout: &str,
        request: &DownloadRequest,
        staging: &Path,
    ) -> Result<FetchResult, FetchError> {
        let (title, reported) = Self::parse_info(stdout, &request.source_url)?;

        tokio::fs::metadata(&reported)
            .await
            .map_err(|_| FetchError::OutputMissing {
                path: reported.clone(),
            })?;

        let local_path = match reported.file_name() {
            Some(name) if reported.starts_with(staging) => {
                let target = self.config.working_dir.join(name);
                tokio::fs::rename(&reported, &target).await?;
                target
            }
            _ => reported,
        };

        let metadata = tokio::fs::metadata(&local_path).await?;

        Ok(FetchResult {
            title,
            local_path,
            size_bytes: metadata.len(),
        })
    }

    /// Removes files a failed run reported inside the working directory,
    /// along with their partial-download siblings.
    async fn remove_reported_files(&self, stdout: &str) {
        let Ok(info) = Self::parse_document(stdout) else {
            return;
        };

        for path in info.reported_paths() {
            if !path.starts_with(&self.config.working_dir) {
                continue;
            }
            let partials = PARTIAL_SUFFIXES.iter().map(|suffix| {
                let mut name = path.clone().into_os_string();
                name.push(suffix);
                PathBuf::from(name)
            });
            for candidate in std::iter::once(path.clone()).chain(partials) {
                match tokio::fs::remove_file(&candidate).await {
                    Ok(()) => debug!("Removed leftover {}", candidate.display()),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => warn!("Failed to remove {}: {}", candidate.display(), e),
                }
            }
        }
    }
}

/// Deletes a staging directory and whatever is left in it.
async fn remove_staging(staging: &Path) {
    match tokio::fs::remove_dir_all(staging).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove staging dir {}: {}", staging.display(), e),
    }
}

#[async_trait]
impl Fetcher for YtDlpFetcher {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn fetch(&self, request: &DownloadRequest) -> Result<FetchResult, FetchError> {
        request.parsed_url()?;

        let staging = self.config.working_dir.join(format!(
            "{}{}",
            STAGING_PREFIX,
            uuid::Uuid::new_v4().simple()
        ));
        tokio::fs::create_dir_all(&staging).await?;

        let result = self.fetch_into(request, &staging).await;
        remove_staging(&staging).await;
        result
    }

    async fn validate(&self) -> Result<(), FetchError> {
        let output = self.run(vec!["--version".to_string()]).await?;
        if !output.status.success() {
            return Err(FetchError::extraction_failed(
                format!("yt-dlp --version exited with {}", output.status),
                Some(String::from_utf8_lossy(&output.stderr).to_string()),
            ));
        }
        debug!(
            "yt-dlp version {}",
            String::from_utf8_lossy(&output.stdout).trim()
        );
        Ok(())
    }
}
