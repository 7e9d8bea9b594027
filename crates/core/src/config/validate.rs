use super::{
    types::{Config, CredentialConfig},
    ConfigError,
};
use crate::uploader::CHUNK_GRANULARITY;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - A destination folder is set
/// - The selected credential method has its secrets
/// - Upload chunks are a non-zero multiple of 256 KiB
/// - The yt-dlp binary path is not empty
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.storage.folder_id.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "storage.folder_id must be set".to_string(),
        ));
    }

    match &config.storage.credentials {
        CredentialConfig::ServiceAccount {
            service_account_json,
            service_account_path,
        } => {
            let has_inline = service_account_json
                .as_ref()
                .is_some_and(|json| !json.trim().is_empty());
            if !has_inline && service_account_path.is_none() {
                return Err(ConfigError::ValidationError(
                    "service_account credentials need service_account_json or service_account_path"
                        .to_string(),
                ));
            }
        }
        CredentialConfig::Oauth {
            client_id,
            refresh_token,
            ..
        } => {
            if client_id.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "oauth credentials need a client_id".to_string(),
                ));
            }
            if refresh_token.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "oauth credentials need a refresh_token".to_string(),
                ));
            }
        }
    }

    let chunk_size = config.uploader.chunk_size_bytes;
    if chunk_size == 0 || chunk_size % CHUNK_GRANULARITY != 0 {
        return Err(ConfigError::ValidationError(format!(
            "uploader.chunk_size_bytes must be a non-zero multiple of {}",
            CHUNK_GRANULARITY
        )));
    }

    if config.fetcher.ytdlp_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "fetcher.ytdlp_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
