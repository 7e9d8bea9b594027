//! Mock credential provider for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::credentials::{AccessToken, AuthError, CredentialProvider};

/// Mock implementation of the CredentialProvider trait.
///
/// Hands out a fixed token unless an error is queued.
#[derive(Debug)]
pub struct MockCredentialProvider {
    token: String,
    next_error: Arc<RwLock<Option<AuthError>>>,
    calls: AtomicUsize,
}

impl Default for MockCredentialProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCredentialProvider {
    pub fn new() -> Self {
        Self::with_token("mock-token")
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            next_error: Arc::new(RwLock::new(None)),
            calls: AtomicUsize::new(0),
        }
    }

    /// Configure the next token request to fail with the given error.
    pub async fn set_next_error(&self, error: AuthError) {
        *self.next_error.write().await = Some(error);
    }

    /// Number of token requests served or refused.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl CredentialProvider for MockCredentialProvider {
    async fn access_token(&self) -> Result<AccessToken, AuthError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        Ok(AccessToken::expiring_in(self.token.clone(), 3600))
    }

    fn method_name(&self) -> &'static str {
        "mock"
    }
}
