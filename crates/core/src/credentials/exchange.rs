//! Token endpoint exchange shared by every credential method.

use reqwest::Client;
use tracing::debug;

use super::traits::AuthError;
use super::types::{AccessToken, TokenResponse};

/// POST a form-encoded grant to `token_url` and parse the access token.
pub(crate) async fn exchange_token(
    client: &Client,
    token_url: &str,
    form: &[(&str, &str)],
) -> Result<AccessToken, AuthError> {
    let response = client
        .post(token_url)
        .form(form)
        .send()
        .await
        .map_err(|e| AuthError::Transport(e.to_string()))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| AuthError::Transport(e.to_string()))?;
    let parsed: Option<TokenResponse> = serde_json::from_str(&body).ok();

    if !status.is_success() {
        let reason = parsed
            .and_then(|r| r.rejection())
            .unwrap_or_else(|| body.chars().take(200).collect());
        return Err(AuthError::Rejected(format!(
            "HTTP {}: {}",
            status.as_u16(),
            reason
        )));
    }

    let parsed = parsed
        .ok_or_else(|| AuthError::Rejected("token endpoint returned invalid JSON".to_string()))?;
    let token = parsed.access_token.clone().ok_or_else(|| {
        AuthError::Rejected(
            parsed
                .rejection()
                .unwrap_or_else(|| "no access_token in token response".to_string()),
        )
    })?;

    debug!(
        "Obtained access token from {} (lifetime {}s)",
        token_url,
        parsed.lifetime_secs()
    );
    Ok(AccessToken::expiring_in(token, parsed.lifetime_secs()))
}
