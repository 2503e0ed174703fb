use crate::endpoints::EndpointMap;
use reqwest::blocking::{Client, ClientBuilder};
use std::path::PathBuf;
use std::time::Duration;

/// Create the HTTP client for API requests
/// with optimized settings for connection pooling and timeouts
pub fn create_http_client(timeout: Duration) -> Client {
    ClientBuilder::new()
        .pool_max_idle_per_host(50)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to create HTTP client")
}

/// Target environment for API calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Sandbox,
    Production,
}

impl Environment {
    /// Default base URL for business endpoints in this environment
    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Sandbox => "https://etims-api-sbx.kra.go.ke/etims-api",
            Environment::Production => "https://etims-api.kra.go.ke/etims-api",
        }
    }

    /// Default authorization endpoint for this environment
    pub fn token_url(&self) -> &'static str {
        match self {
            Environment::Sandbox => "https://api-sbx.kra.go.ke/v1/token/generate",
            Environment::Production => "https://api.kra.go.ke/v1/token/generate",
        }
    }
}

/// OAuth2 client-credentials pair for the authorization endpoint
#[derive(Debug, Clone)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
}

impl Credentials {
    pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
        Credentials {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
        }
    }
}

/// Configuration for the API client.
///
/// A `Config` is an immutable snapshot: obtaining a communication key from
/// device initialization produces a new value via [`Config::with_cmc_key`]
/// rather than mutating a shared one in place.
#[derive(Debug, Clone)]
pub struct Config {
    /// Target environment (selects default URLs and credentials scope)
    pub environment: Environment,
    /// OAuth2 consumer key/secret for this environment
    pub credentials: Credentials,
    /// Taxpayer identification number, sent as the `tin` header
    pub tin: String,
    /// Branch identifier, sent as the `bhfId` header
    pub bhf_id: String,
    /// Communication key obtained from device initialization,
    /// sent as the `cmcKey` header on all non-initialization endpoints
    pub cmc_key: Option<String>,
    /// Override for the business endpoint base URL
    pub base_url: Option<String>,
    /// Override for the authorization endpoint URL
    pub token_url: Option<String>,
    /// HTTP timeout in seconds
    pub timeout_secs: u64,
    /// Business result codes treated as success
    pub success_codes: Vec<String>,
    /// Override for the token cache file location
    pub cache_path: Option<PathBuf>,
    /// Endpoint key to network path table
    pub endpoints: EndpointMap,
}

impl Config {
    /// Create a configuration for the given environment and credentials
    pub fn new(environment: Environment, credentials: Credentials) -> Self {
        Config {
            environment,
            credentials,
            tin: String::new(),
            bhf_id: String::new(),
            cmc_key: None,
            base_url: None,
            token_url: None,
            timeout_secs: 30,
            success_codes: vec!["000".to_string(), "001".to_string()],
            cache_path: None,
            endpoints: EndpointMap::default(),
        }
    }

    /// Set the taxpayer and branch identifiers
    pub fn with_identity(mut self, tin: impl Into<String>, bhf_id: impl Into<String>) -> Self {
        self.tin = tin.into();
        self.bhf_id = bhf_id.into();
        self
    }

    /// Produce a new configuration carrying the communication key
    /// returned by device initialization
    pub fn with_cmc_key(mut self, cmc_key: impl Into<String>) -> Self {
        self.cmc_key = Some(cmc_key.into());
        self
    }

    /// Override the business endpoint base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Override the authorization endpoint URL
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = Some(token_url.into());
        self
    }

    /// Set the HTTP timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Replace the set of result codes treated as success
    pub fn with_success_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.success_codes = codes.into_iter().map(Into::into).collect();
        self
    }

    /// Override the token cache file location
    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    /// Replace the endpoint descriptor table
    pub fn with_endpoints(mut self, endpoints: EndpointMap) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Get the effective base URL for business endpoints
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url())
    }

    /// Get the effective authorization endpoint URL
    pub fn token_url(&self) -> &str {
        self.token_url
            .as_deref()
            .unwrap_or_else(|| self.environment.token_url())
    }

    /// Get the HTTP timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check whether a business result code counts as success
    pub fn is_success_code(&self, code: &str) -> bool {
        self.success_codes.iter().any(|c| c == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config::new(
            Environment::Sandbox,
            Credentials::new("key", "secret"),
        )
        .with_identity("P000000045R", "00")
    }

    #[test]
    fn test_environment_defaults() {
        let config = test_config();
        assert_eq!(config.base_url(), Environment::Sandbox.base_url());
        assert_eq!(config.token_url(), Environment::Sandbox.token_url());
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_url_overrides() {
        let config = test_config()
            .with_base_url("http://localhost:8080/etims-api")
            .with_token_url("http://localhost:8080/token");
        assert_eq!(config.base_url(), "http://localhost:8080/etims-api");
        assert_eq!(config.token_url(), "http://localhost:8080/token");
    }

    #[test]
    fn test_success_codes() {
        let config = test_config();
        assert!(config.is_success_code("000"));
        assert!(config.is_success_code("001"));
        assert!(!config.is_success_code("881"));

        let config = config.with_success_codes(["0000"]);
        assert!(config.is_success_code("0000"));
        assert!(!config.is_success_code("000"));
    }

    #[test]
    fn test_cmc_key_snapshot() {
        let base = test_config();
        assert!(base.cmc_key.is_none());

        let keyed = base.clone().with_cmc_key("CMC123");
        assert_eq!(keyed.cmc_key.as_deref(), Some("CMC123"));
        assert!(base.cmc_key.is_none());
    }
}
