use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::fetcher::FetcherConfig;
use crate::orchestrator::{InvocationMode, OrchestratorConfig, ResponseFormat};
use crate::uploader::UploaderConfig;

/// Default Google OAuth token endpoint.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub uploader: UploaderConfig,
    #[serde(default)]
    pub jobs: OrchestratorConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8000
}

/// Destination storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Drive folder that receives uploaded files
    pub folder_id: String,
    pub credentials: CredentialConfig,
}

/// How the storage credential is obtained.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum CredentialConfig {
    /// Service-account key document, inline or on disk.
    ServiceAccount {
        #[serde(default)]
        service_account_json: Option<String>,
        #[serde(default)]
        service_account_path: Option<PathBuf>,
    },
    /// Long-lived OAuth refresh token exchanged for short-lived access tokens.
    Oauth {
        client_id: String,
        #[serde(default)]
        client_secret: Option<String>,
        refresh_token: String,
        #[serde(default = "default_token_url")]
        token_url: String,
    },
}

impl CredentialConfig {
    pub fn method_name(&self) -> &'static str {
        match self {
            CredentialConfig::ServiceAccount { .. } => "service_account",
            CredentialConfig::Oauth { .. } => "oauth",
        }
    }
}

fn default_token_url() -> String {
    GOOGLE_TOKEN_URL.to_string()
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub storage: SanitizedStorageConfig,
    pub fetcher: FetcherConfig,
    pub uploader: UploaderConfig,
    pub jobs: SanitizedJobsConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedStorageConfig {
    pub folder_id: String,
    pub credentials: SanitizedCredentialConfig,
}

/// Credential config with every secret replaced by a presence flag
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedCredentialConfig {
    pub method: String,
    pub service_account_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub client_secret_configured: bool,
    pub refresh_token_configured: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedJobsConfig {
    pub mode: InvocationMode,
    pub response_format: ResponseFormat,
    pub default_quality: String,
    pub max_concurrent_jobs: usize,
}

impl From<&CredentialConfig> for SanitizedCredentialConfig {
    fn from(config: &CredentialConfig) -> Self {
        match config {
            CredentialConfig::ServiceAccount {
                service_account_json,
                service_account_path,
            } => Self {
                method: config.method_name().to_string(),
                service_account_configured: service_account_json
                    .as_ref()
                    .is_some_and(|json| !json.trim().is_empty())
                    || service_account_path.is_some(),
                client_id: None,
                client_secret_configured: false,
                refresh_token_configured: false,
            },
            CredentialConfig::Oauth {
                client_id,
                client_secret,
                refresh_token,
                ..
            } => Self {
                method: config.method_name().to_string(),
                service_account_configured: false,
                client_id: Some(client_id.clone()),
                client_secret_configured: client_secret.as_ref().is_some_and(|s| !s.is_empty()),
                refresh_token_configured: !refresh_token.is_empty(),
            },
        }
    }
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            storage: SanitizedStorageConfig {
                folder_id: config.storage.folder_id.clone(),
                credentials: SanitizedCredentialConfig::from(&config.storage.credentials),
            },
            fetcher: config.fetcher.clone(),
            uploader: config.uploader.clone(),
            jobs: SanitizedJobsConfig {
                mode: config.jobs.mode,
                response_format: config.jobs.response_format,
                default_quality: config.jobs.default_quality.clone(),
                max_concurrent_jobs: config.jobs.max_concurrent_jobs,
            },
        }
    }
}
