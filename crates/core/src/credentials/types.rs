use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use tokio::sync::RwLock;

/// Tokens this close to expiry are treated as expired.
const EXPIRY_LEEWAY_SECS: i64 = 60;

/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_LIFETIME_SECS: i64 = 3600;

/// Short-lived bearer token for the storage API.
#[derive(Clone)]
pub struct AccessToken {
    token: Secret<String>,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: Secret::new(token.into()),
            expires_at,
        }
    }

    /// Token valid for `lifetime_secs` from now.
    pub fn expiring_in(token: impl Into<String>, lifetime_secs: i64) -> Self {
        Self::new(token, Utc::now() + Duration::seconds(lifetime_secs))
    }

    pub fn secret(&self) -> &str {
        self.token.expose_secret()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_LEEWAY_SECS) < self.expires_at
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Body returned by an OAuth token endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: Option<String>,
    pub expires_in: Option<i64>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl TokenResponse {
    pub fn lifetime_secs(&self) -> i64 {
        self.expires_in.unwrap_or(DEFAULT_LIFETIME_SECS)
    }

    /// Human readable rejection reason, if the endpoint reported one.
    pub fn rejection(&self) -> Option<String> {
        match (&self.error, &self.error_description) {
            (Some(error), Some(description)) => Some(format!("{}: {}", error, description)),
            (Some(error), None) => Some(error.clone()),
            (None, Some(description)) => Some(description.clone()),
            (None, None) => None,
        }
    }
}

/// Last token handed out by a provider.
///
/// No lock is held while a new token is fetched, so two callers can refresh
/// at the same time; both results are valid for the same identity.
#[derive(Default)]
pub(crate) struct TokenCache {
    current: RwLock<Option<AccessToken>>,
}

impl TokenCache {
    /// Cached token if it is still valid.
    pub async fn valid(&self) -> Option<AccessToken> {
        self.current
            .read()
            .await
            .as_ref()
            .filter(|token| token.is_valid())
            .cloned()
    }

    pub async fn store(&self, token: AccessToken) {
        *self.current.write().await = Some(token);
    }
}
