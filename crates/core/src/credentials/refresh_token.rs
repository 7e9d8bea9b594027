//! OAuth refresh-token credentials.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use tracing::info;

use super::exchange::exchange_token;
use super::types::TokenCache;
use super::{AccessToken, AuthError, CredentialProvider};

/// Exchanges a long-lived refresh token for short-lived access tokens.
///
/// Construction does no I/O, so a bad refresh token only shows up on the
/// first request that needs a token.
pub struct RefreshTokenProvider {
    client: Client,
    client_id: String,
    client_secret: Option<Secret<String>>,
    refresh_token: Secret<String>,
    token_url: String,
    cache: TokenCache,
}

impl RefreshTokenProvider {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: Option<String>,
        refresh_token: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let client_id = client_id.into();
        let refresh_token = refresh_token.into();

        if client_id.trim().is_empty() {
            return Err(AuthError::MissingSecret("client_id".to_string()));
        }
        if refresh_token.trim().is_empty() {
            return Err(AuthError::MissingSecret("refresh_token".to_string()));
        }

        Ok(Self {
            client: Client::new(),
            client_id,
            client_secret: client_secret.filter(|s| !s.is_empty()).map(Secret::new),
            refresh_token: Secret::new(refresh_token),
            token_url: token_url.into(),
            cache: TokenCache::default(),
        })
    }

    async fn refresh(&self) -> Result<AccessToken, AuthError> {
        let mut form = vec![
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("refresh_token", self.refresh_token.expose_secret().as_str()),
        ];
        if let Some(secret) = &self.client_secret {
            form.push(("client_secret", secret.expose_secret().as_str()));
        }

        exchange_token(&self.client, &self.token_url, &form).await
    }
}

#[async_trait]
impl CredentialProvider for RefreshTokenProvider {
    async fn access_token(&self) -> Result<AccessToken, AuthError> {
        if let Some(token) = self.cache.valid().await {
            return Ok(token);
        }

        info!("Refreshing OAuth access token for client {}", self.client_id);
        let token = self.refresh().await?;
        self.cache.store(token.clone()).await;
        Ok(token)
    }

    fn method_name(&self) -> &'static str {
        "oauth"
    }
}
