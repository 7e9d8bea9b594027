//! Configuration for the fetcher module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the yt-dlp fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Path to the yt-dlp binary.
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: PathBuf,

    /// Shared directory for transient downloads. Created at startup.
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,

    /// yt-dlp output template, relative to the per-run staging directory.
    /// The finished file is moved into `working_dir` under the same name.
    #[serde(default = "default_output_template")]
    pub output_template: String,

    /// Extra arguments passed to yt-dlp before the URL.
    #[serde(default)]
    pub extra_args: Vec<String>,

    /// Kill yt-dlp after this many seconds. Unset means wait forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_ytdlp_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_working_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_output_template() -> String {
    "%(title)s.%(ext)s".to_string()
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: default_ytdlp_path(),
            working_dir: default_working_dir(),
            output_template: default_output_template(),
            extra_args: Vec::new(),
            timeout_secs: None,
        }
    }
}

impl FetcherConfig {
    /// Sets the working directory.
    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = path.into();
        self
    }

    /// Sets the yt-dlp binary path.
    pub fn with_ytdlp_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ytdlp_path = path.into();
        self
    }

    /// Sets the extractor timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FetcherConfig::default();
        assert_eq!(config.ytdlp_path, PathBuf::from("yt-dlp"));
        assert_eq!(config.working_dir, PathBuf::from("downloads"));
        assert_eq!(config.output_template, "%(title)s.%(ext)s");
        assert!(config.timeout_secs.is_none());
    }

    #[test]
    fn test_deserialize_partial() {
        let toml = r#"
            working_dir = "/var/tmp/drivedrop"
            extra_args = ["--cookies", "/etc/cookies.txt"]
        "#;
        let config: FetcherConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.working_dir, PathBuf::from("/var/tmp/drivedrop"));
        assert_eq!(config.extra_args.len(), 2);
        assert_eq!(config.ytdlp_path, PathBuf::from("yt-dlp"));
    }
}
