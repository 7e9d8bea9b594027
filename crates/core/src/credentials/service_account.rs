//! Service-account credentials (JWT bearer grant).

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use super::exchange::exchange_token;
use super::types::TokenCache;
use super::{AccessToken, AuthError, CredentialProvider};
use crate::config::GOOGLE_TOKEN_URL;

/// Scope requested for uploads.
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime of the signed assertion. Google caps it at one hour.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// The fields of a service-account key document that the token exchange needs.
#[derive(Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    #[serde(default)]
    private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URL.to_string()
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// Signs JWT assertions with a service-account key and trades them for
/// access tokens.
pub struct ServiceAccountProvider {
    client: Client,
    client_email: String,
    key_id: Option<String>,
    signing_key: EncodingKey,
    token_uri: String,
    cache: TokenCache,
}

impl ServiceAccountProvider {
    /// Parse a key document. The private key is decoded here, so a broken
    /// document fails at startup rather than on the first upload.
    pub fn from_json(json: &str) -> Result<Self, AuthError> {
        if json.trim().is_empty() {
            return Err(AuthError::MissingSecret(
                "service account document is empty".to_string(),
            ));
        }

        let key: ServiceAccountKey =
            serde_json::from_str(json).map_err(|e| AuthError::InvalidDocument(e.to_string()))?;
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| AuthError::InvalidDocument(format!("private_key: {}", e)))?;

        Ok(Self {
            client: Client::new(),
            client_email: key.client_email,
            key_id: key.private_key_id,
            signing_key,
            token_uri: key.token_uri,
            cache: TokenCache::default(),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, AuthError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            AuthError::MissingSecret(format!(
                "cannot read service account file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&json)
    }

    /// Point the exchange at a different token endpoint.
    pub fn with_token_uri(mut self, token_uri: impl Into<String>) -> Self {
        self.token_uri = token_uri.into();
        self
    }

    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    fn sign_assertion(&self) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: DRIVE_SCOPE,
            aud: &self.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key_id.clone();

        encode(&header, &claims, &self.signing_key).map_err(|e| AuthError::Signing(e.to_string()))
    }
}

#[async_trait]
impl CredentialProvider for ServiceAccountProvider {
    async fn access_token(&self) -> Result<AccessToken, AuthError> {
        if let Some(token) = self.cache.valid().await {
            return Ok(token);
        }

        info!("Requesting access token for {}", self.client_email);
        let assertion = self.sign_assertion()?;
        let form = [("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())];
        let token = exchange_token(&self.client, &self.token_uri, &form).await?;

        self.cache.store(token.clone()).await;
        Ok(token)
    }

    fn method_name(&self) -> &'static str {
        "service_account"
    }
}
