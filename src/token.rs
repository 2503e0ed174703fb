use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};

/// A bearer token persisted alongside its absolute expiry.
///
/// `expires_at` already includes the 60-second safety buffer subtracted by
/// the token provider, so a cache hit is trusted while `now < expires_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedToken {
    /// Access token for API requests
    pub access_token: String,
    /// Absolute expiry as a Unix timestamp in seconds
    pub expires_at: i64,
}

impl CachedToken {
    pub fn new(access_token: impl Into<String>, expires_at: i64) -> Self {
        CachedToken {
            access_token: access_token.into(),
            expires_at,
        }
    }

    /// Check whether the token is still trustworthy at the given instant
    pub fn is_fresh_at(&self, now: i64) -> bool {
        now < self.expires_at
    }

    /// Check whether the token is still trustworthy right now
    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Utc::now().timestamp())
    }
}

/// Body returned by the authorization endpoint on success.
/// Some gateways report `expires_in` as a JSON string, others as a number.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(deserialize_with = "string_or_number")]
    pub expires_in: u64,
}

/// Body the authorization endpoint may return on failure
#[derive(Debug, Clone, Deserialize)]
pub struct AuthErrorBody {
    #[serde(rename = "errorCode")]
    pub error_code: Option<String>,
    #[serde(rename = "errorMessage")]
    pub error_message: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(u64),
    }

    match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::Number(n) => Ok(n),
        StringOrNumber::String(s) => s.parse::<u64>().map_err(serde::de::Error::custom),
    }
}
