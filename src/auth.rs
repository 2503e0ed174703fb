use crate::cache::TokenCache;
use crate::client::Credentials;
use crate::error::{Error, Result};
use crate::token::{AuthErrorBody, CachedToken, TokenResponse};
use crate::transport::{HttpMethod, HttpRequest, HttpRequester};
use base64::Engine;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Safety buffer subtracted from the remote-reported token lifetime
pub const TOKEN_EXPIRY_BUFFER_SECS: i64 = 60;

/// Obtains valid bearer tokens, consulting the cache first and fetching
/// from the authorization endpoint on miss, expiry or forced refresh.
///
/// The provider is the sole freshness authority: the expiry buffer is
/// applied here when a token is persisted, keeping [`TokenCache`] a dumb
/// store.
pub struct TokenProvider {
    token_url: String,
    credentials: Credentials,
    cache: TokenCache,
    requester: Arc<dyn HttpRequester>,
}

impl TokenProvider {
    pub fn new(
        token_url: impl Into<String>,
        credentials: Credentials,
        cache: TokenCache,
        requester: Arc<dyn HttpRequester>,
    ) -> Self {
        TokenProvider {
            token_url: token_url.into(),
            credentials,
            cache,
            requester,
        }
    }

    /// Get a valid access token.
    ///
    /// Unless `force_refresh` is set, a fresh cached token is returned
    /// without any network call. Otherwise a new token is fetched with
    /// HTTP Basic client credentials and persisted with
    /// `expires_at = now + expires_in - 60`.
    pub fn get_token(&self, force_refresh: bool) -> Result<String> {
        if !force_refresh {
            if let Some(cached) = self.cache.read() {
                if cached.is_fresh() {
                    debug!("using cached access token");
                    return Ok(cached.access_token);
                }
            }
        }

        let response = self.fetch_token()?;
        let expires_at =
            Utc::now().timestamp() + response.expires_in as i64 - TOKEN_EXPIRY_BUFFER_SECS;

        let token = CachedToken::new(response.access_token, expires_at);
        self.cache.write(&token)?;
        debug!(expires_at, "fetched and cached new access token");

        Ok(token.access_token)
    }

    /// Drop the cached token so the next `get_token` call refetches
    pub fn clear_token(&self) -> Result<()> {
        self.cache.clear()
    }

    fn fetch_token(&self) -> Result<TokenResponse> {
        let url = format!("{}?grant_type=client_credentials", self.token_url);

        let basic = base64::engine::general_purpose::STANDARD.encode(format!(
            "{}:{}",
            self.credentials.consumer_key, self.credentials.consumer_secret
        ));

        let mut headers = HashMap::new();
        headers.insert("Authorization".to_string(), format!("Basic {}", basic));
        headers.insert("Accept".to_string(), "application/json".to_string());

        let request = HttpRequest {
            method: HttpMethod::Get,
            url,
            headers,
            body: None,
        };

        let response = self.requester.send(request).map_err(|e| {
            warn!(error = %e, "authorization endpoint unreachable");
            Error::auth(
                e.status_code().unwrap_or(0),
                None,
                format!("token fetch failed: {}", e),
            )
        })?;

        if !response.is_success() {
            let upstream: Option<AuthErrorBody> = serde_json::from_str(&response.body).ok();
            let (code, message) = match upstream {
                Some(body) => (
                    body.error_code,
                    body.error_message
                        .unwrap_or_else(|| "token request rejected".to_string()),
                ),
                None => (None, format!("token request rejected: {}", response.body)),
            };
            return Err(Error::auth(response.status, code, message));
        }

        serde_json::from_str(&response.body).map_err(|e| {
            Error::auth(
                response.status,
                None,
                format!("malformed token response: {}", e),
            )
        })
    }
}
