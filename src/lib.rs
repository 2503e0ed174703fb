//! # etims - Tax Authority Transaction API Client
//!
//! A Rust client for the eTIMS tax-authority transaction API. This library
//! handles OAuth2 client-credentials authentication with durable token
//! caching, pre-flight payload validation against per-endpoint schemas,
//! and classification of remote outcomes into typed results.
//!
//! ## Features
//!
//! - Token provider with file-backed cache, expiry buffer, and a single
//!   transparent retry when the remote signals token expiry
//! - Schema-based payload validation with aggregated, field-level error
//!   reports produced before any network call
//! - Response unwrapping into success, business error, or transport error,
//!   preserving the original result code and raw body for diagnostics
//! - Endpoint descriptor table so callers work with logical operation keys,
//!   never raw paths
//!
//! ## Basic Usage
//!
//! ```no_run
//! use etims::{Config, Credentials, Environment, EtimsClient};
//!
//! fn main() -> Result<(), etims::Error> {
//!     let config = Config::new(
//!         Environment::Sandbox,
//!         Credentials::new("consumer-key", "consumer-secret"),
//!     )
//!     .with_identity("P000000045R", "00");
//!
//!     let client = EtimsClient::new(config);
//!
//!     // Device initialization produces the communication key
//!     let init = client.initialize_device(serde_json::json!({
//!         "tin": "P000000045R",
//!         "bhfId": "00",
//!         "dvcSrlNo": "VSCU-0001"
//!     }))?;
//!
//!     println!("initialized: {}", init);
//!     Ok(())
//! }
//! ```
//!
//! ## Carrying the communication key
//!
//! Configuration is an immutable snapshot; when initialization returns the
//! communication key, build a new configuration and client rather than
//! mutating shared state:
//!
//! ```no_run
//! use etims::{Config, Credentials, Environment, EtimsClient};
//!
//! # fn main() -> Result<(), etims::Error> {
//! # let config = Config::new(Environment::Sandbox, Credentials::new("k", "s"));
//! let keyed = config.with_cmc_key("CMC-KEY-FROM-INIT");
//! let client = EtimsClient::new(keyed);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod cache;
pub mod client;
pub mod endpoints;
pub mod error;
pub mod response;
pub mod rest;
pub mod schema;
pub mod schemas;
pub mod token;
pub mod transport;

// Re-export main types for convenience
pub use api::EtimsClient;
pub use auth::TokenProvider;
pub use cache::TokenCache;
pub use client::{Config, Credentials, Environment};
pub use endpoints::EndpointMap;
pub use error::{ApiErrorKind, Error, Result};
pub use response::{ApiResponse, Param};
pub use rest::ApiContext;
pub use schema::{Field, Rule, Schema};
pub use schemas::SchemaRegistry;
pub use token::CachedToken;
pub use transport::{HttpMethod, HttpRequest, HttpRequester, HttpResponse, MockRequester};

// Re-export serde_json for convenience
pub use serde_json::json;
