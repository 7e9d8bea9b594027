//! Storage API credentials.
//!
//! Two methods are supported: a service-account key document signed into a
//! JWT assertion, and an OAuth refresh token. Both hand out cached access
//! tokens and exchange for a new one lazily when the cached token expires.

mod exchange;
mod refresh_token;
mod service_account;
mod traits;
mod types;

pub use refresh_token::RefreshTokenProvider;
pub use service_account::{ServiceAccountProvider, DRIVE_SCOPE};
pub use traits::*;
pub use types::AccessToken;

use tracing::debug;

use crate::config::CredentialConfig;

/// Factory function to create a credential provider from config
pub fn create_credential_provider(
    config: &CredentialConfig,
) -> Result<Box<dyn CredentialProvider>, AuthError> {
    match config {
        CredentialConfig::ServiceAccount {
            service_account_json,
            service_account_path,
        } => {
            let inline = service_account_json
                .as_deref()
                .filter(|json| !json.trim().is_empty());
            let provider = match (inline, service_account_path) {
                (Some(json), _) => ServiceAccountProvider::from_json(json)?,
                (None, Some(path)) => ServiceAccountProvider::from_file(path)?,
                (None, None) => {
                    return Err(AuthError::MissingSecret(
                        "service_account_json or service_account_path must be set".to_string(),
                    ))
                }
            };
            Ok(Box::new(provider))
        }
        CredentialConfig::Oauth {
            client_id,
            client_secret,
            refresh_token,
            token_url,
        } => Ok(Box::new(RefreshTokenProvider::new(
            client_id.clone(),
            client_secret.clone(),
            refresh_token.clone(),
            token_url.clone(),
        )?)),
    }
}

/// Obtain an access token for the storage API.
pub async fn acquire_storage_credential(
    provider: &dyn CredentialProvider,
) -> Result<AccessToken, AuthError> {
    let token = provider.access_token().await?;
    debug!(
        "Using {} credential valid until {}",
        provider.method_name(),
        token.expires_at()
    );
    Ok(token)
}
