use async_trait::async_trait;
use thiserror::Error;

use super::types::AccessToken;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing credential secret: {0}")]
    MissingSecret(String),

    #[error("Invalid credential document: {0}")]
    InvalidDocument(String),

    #[error("Failed to sign token assertion: {0}")]
    Signing(String),

    #[error("Identity provider rejected the token exchange: {0}")]
    Rejected(String),

    #[error("Token endpoint unreachable: {0}")]
    Transport(String),
}

/// Source of access tokens for the storage API.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Return a valid access token, exchanging for a new one when the cached
    /// token is absent or expired.
    async fn access_token(&self) -> Result<AccessToken, AuthError>;

    /// Name of this credential method
    fn method_name(&self) -> &'static str;
}
