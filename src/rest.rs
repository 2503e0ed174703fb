use crate::auth::TokenProvider;
use crate::cache::TokenCache;
use crate::client::Config;
use crate::error::{Error, Result};
use crate::response::ApiResponse;
use crate::transport::{HttpMethod, HttpRequest, HttpRequester, HttpResponse, ReqwestRequester};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};
use url::Url;

/// Transport-level fault messages that signal an expired or rejected
/// access token, in addition to a plain 401 status
fn token_expired_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)access token.{0,40}(expired|invalid)|invalid token")
            .expect("invalid token-expiry pattern")
    })
}

/// Context for authenticated API requests.
///
/// One `execute` call runs fully sequentially: build headers, dispatch,
/// classify, with at most one transparent retry after a forced token
/// refresh when the response signals token expiry.
pub struct ApiContext {
    config: Config,
    provider: TokenProvider,
    requester: Arc<dyn HttpRequester>,
}

impl ApiContext {
    /// Create a context with the default reqwest-backed requester
    pub fn new(config: Config) -> Self {
        let requester: Arc<dyn HttpRequester> = Arc::new(ReqwestRequester::new(config.timeout()));
        Self::with_requester(config, requester)
    }

    /// Create a context dispatching through the given requester
    pub fn with_requester(config: Config, requester: Arc<dyn HttpRequester>) -> Self {
        let cache = config
            .cache_path
            .clone()
            .map(TokenCache::new)
            .unwrap_or_default();
        let provider = TokenProvider::new(
            config.token_url(),
            config.credentials.clone(),
            cache,
            requester.clone(),
        );
        ApiContext {
            config,
            provider,
            requester,
        }
    }

    /// The configuration snapshot this context was built from
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The token provider backing this context
    pub fn token_provider(&self) -> &TokenProvider {
        &self.provider
    }

    /// Execute an API request and unwrap the response into its payload.
    ///
    /// `endpoint_key` is a logical key resolved through the endpoint
    /// table; raw paths are rejected so callers cannot bypass it.
    pub fn execute(&self, method: HttpMethod, endpoint_key: &str, payload: &Value) -> Result<Value> {
        if endpoint_key.starts_with('/') {
            return Err(Error::InvalidEndpointKey(endpoint_key.to_string()));
        }
        let path = self
            .config
            .endpoints
            .get(endpoint_key)
            .ok_or_else(|| Error::UnknownEndpoint(endpoint_key.to_string()))?;
        let url = format!("{}{}", self.config.base_url(), path);

        let token = self.provider.get_token(false)?;
        let response = self.dispatch(method, &url, endpoint_key, payload, &token)?;

        let response = if is_expiry_signal(&response) {
            // At most one retry, and only for token expiry
            warn!(endpoint = endpoint_key, "token expiry signal, refreshing and retrying");
            self.provider.clear_token()?;
            let token = self.provider.get_token(true)?;
            let retried = self.dispatch(method, &url, endpoint_key, payload, &token)?;
            if is_expiry_signal(&retried) {
                return Err(Error::auth(
                    retried.status,
                    None,
                    "access token rejected after refresh",
                ));
            }
            retried
        } else {
            response
        };

        self.unwrap_response(response)
    }

    /// Execute a request and unmarshal the enveloped data into the target
    /// type. Responses without an envelope deserialize as a whole.
    pub fn apply<T>(&self, method: HttpMethod, endpoint_key: &str, payload: &Value) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let value = self.execute(method, endpoint_key, payload)?;
        match serde_json::from_value::<ApiResponse>(value.clone()) {
            Ok(envelope) if envelope.data.is_some() => envelope.apply(),
            _ => serde_json::from_value(value).map_err(Error::from),
        }
    }

    fn dispatch(
        &self,
        method: HttpMethod,
        url: &str,
        endpoint_key: &str,
        payload: &Value,
        token: &str,
    ) -> Result<HttpResponse> {
        let mut headers = HashMap::new();
        headers.insert("Authorization".to_string(), format!("Bearer {}", token));
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("Accept".to_string(), "application/json".to_string());

        // The initialization endpoint is what produces the communication
        // key, so it is the one call made without the identity headers.
        if !self.config.endpoints.is_init(endpoint_key) {
            headers.insert("tin".to_string(), self.config.tin.clone());
            headers.insert("bhfId".to_string(), self.config.bhf_id.clone());
            headers.insert(
                "cmcKey".to_string(),
                self.config.cmc_key.clone().unwrap_or_default(),
            );
        }

        let (url, body) = match method {
            HttpMethod::Get => (encode_query(url, payload)?, None),
            HttpMethod::Post => (url.to_string(), Some(payload.to_string())),
        };

        debug!(method = method.as_str(), endpoint = endpoint_key, "dispatching API request");
        self.requester.send(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }

    /// Unwrap a raw response into its payload or a classified error.
    /// Classification order matters: status checks come before any
    /// inspection of the business envelope.
    fn unwrap_response(&self, response: HttpResponse) -> Result<Value> {
        let body = parse_body(&response.body);

        if response.status == 401 {
            return Err(Error::auth(401, None, "unauthorized"));
        }

        if !response.is_success() {
            let message = body
                .get("resultMsg")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {}", response.status));
            return Err(Error::transport(response.status, body, message));
        }

        let code = match body.get("resultCd").and_then(Value::as_str) {
            // No business code: opaque success, return the body as-is
            None => return Ok(body),
            Some(code) => code.to_string(),
        };

        if self.config.is_success_code(&code) {
            return Ok(body);
        }

        let message = body
            .get("resultMsg")
            .and_then(Value::as_str)
            .unwrap_or("unspecified business error")
            .to_string();
        Err(Error::business(response.status, &code, message, body))
    }
}

fn is_expiry_signal(response: &HttpResponse) -> bool {
    response.status == 401 || token_expired_pattern().is_match(&response.body)
}

/// Parse a response body as JSON, surfacing non-JSON bodies verbatim
fn parse_body(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

/// Encode a GET payload as query-string pairs
fn encode_query(url: &str, payload: &Value) -> Result<String> {
    let mut parsed = Url::parse(url)?;
    if let Value::Object(map) = payload {
        let mut pairs = parsed.query_pairs_mut();
        for (key, value) in map {
            match value {
                Value::Null => {}
                Value::String(s) => {
                    pairs.append_pair(key, s);
                }
                // Nested values ride along JSON-encoded
                other => {
                    pairs.append_pair(key, &other.to_string());
                }
            }
        }
    }
    Ok(parsed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Credentials, Environment};
    use crate::endpoints::keys;
    use crate::transport::MockRequester;
    use serde_json::json;

    fn context(dir: &tempfile::TempDir, mock: Arc<MockRequester>) -> ApiContext {
        let config = Config::new(
            Environment::Sandbox,
            Credentials::new("key", "secret"),
        )
        .with_identity("P000000045R", "00")
        .with_cmc_key("CMC-1")
        .with_cache_path(dir.path().join("token.json"));
        ApiContext::with_requester(config, mock)
    }

    fn queue_token(mock: &MockRequester) {
        mock.queue_json(200, &json!({"access_token": "tok", "expires_in": 3600}));
    }

    #[test]
    fn test_unknown_endpoint_fails_before_network() {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockRequester::new());
        let ctx = context(&dir, mock.clone());

        let err = ctx
            .execute(HttpMethod::Post, "no-such-endpoint", &json!({}))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownEndpoint(_)));
        assert_eq!(mock.request_count(), 0);
    }

    #[test]
    fn test_path_like_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockRequester::new());
        let ctx = context(&dir, mock.clone());

        let err = ctx
            .execute(HttpMethod::Post, "/saveItem", &json!({}))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidEndpointKey(_)));
        assert_eq!(mock.request_count(), 0);
    }

    #[test]
    fn test_identity_headers_except_init() {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockRequester::new());
        queue_token(&mock);
        mock.queue_json(200, &json!({"resultCd": "000", "resultMsg": "ok"}));
        mock.queue_json(200, &json!({"resultCd": "000", "resultMsg": "ok"}));

        let ctx = context(&dir, mock.clone());
        ctx.execute(HttpMethod::Post, keys::DEVICE_INIT, &json!({}))
            .unwrap();
        ctx.execute(HttpMethod::Post, keys::SALES_SAVE, &json!({}))
            .unwrap();

        let requests = mock.requests();
        // requests[0] is the token fetch
        let init = &requests[1];
        assert!(!init.headers.contains_key("tin"));
        assert!(!init.headers.contains_key("cmcKey"));
        assert!(init.headers["Authorization"].starts_with("Bearer "));

        let sales = &requests[2];
        assert_eq!(sales.headers["tin"], "P000000045R");
        assert_eq!(sales.headers["bhfId"], "00");
        assert_eq!(sales.headers["cmcKey"], "CMC-1");
    }

    #[test]
    fn test_get_encodes_query_string() {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockRequester::new());
        queue_token(&mock);
        mock.queue_json(200, &json!({"resultCd": "000"}));

        let ctx = context(&dir, mock.clone());
        ctx.execute(
            HttpMethod::Get,
            keys::ITEM_LIST,
            &json!({"lastReqDt": "20240101000000"}),
        )
        .unwrap();

        let request = &mock.requests()[1];
        assert!(request.url.contains("lastReqDt=20240101000000"));
        assert!(request.body.is_none());
    }

    #[test]
    fn test_opaque_success_without_result_code() {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockRequester::new());
        queue_token(&mock);
        mock.queue_json(200, &json!({"itemList": [{"itemCd": "X"}]}));

        let ctx = context(&dir, mock);
        let value = ctx
            .execute(HttpMethod::Get, keys::ITEM_LIST, &json!({}))
            .unwrap();
        assert_eq!(value, json!({"itemList": [{"itemCd": "X"}]}));
    }

    #[test]
    fn test_business_error_preserves_code_and_body() {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockRequester::new());
        queue_token(&mock);
        let body = json!({"resultCd": "881", "resultMsg": "Invalid item code"});
        mock.queue_json(200, &body);

        let ctx = context(&dir, mock);
        let err = ctx
            .execute(HttpMethod::Post, keys::ITEM_SAVE, &json!({}))
            .unwrap_err();
        match err {
            Error::Api { code, message, body: raw, .. } => {
                assert_eq!(code.as_deref(), Some("881"));
                assert_eq!(message, "Invalid item code");
                assert_eq!(raw, body);
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_transport_error_on_non_2xx() {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockRequester::new());
        queue_token(&mock);
        mock.queue(503, "Service Unavailable");

        let ctx = context(&dir, mock);
        let err = ctx
            .execute(HttpMethod::Post, keys::SALES_SAVE, &json!({}))
            .unwrap_err();
        match err {
            Error::Api { status, code, .. } => {
                assert_eq!(status, 503);
                assert!(code.is_none());
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_retry_once_then_success() {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockRequester::new());
        queue_token(&mock);
        mock.queue(401, "");
        queue_token(&mock);
        mock.queue_json(200, &json!({"resultCd": "000", "resultMsg": "ok"}));

        let ctx = context(&dir, mock.clone());
        let value = ctx
            .execute(HttpMethod::Post, keys::SALES_SAVE, &json!({}))
            .unwrap();
        assert_eq!(value["resultCd"], "000");

        // token, dispatch, token refresh, redispatch
        assert_eq!(mock.request_count(), 4);
    }

    #[test]
    fn test_retry_once_never_loops() {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockRequester::new());
        queue_token(&mock);
        mock.queue(401, "");
        queue_token(&mock);
        mock.queue(401, "");

        let ctx = context(&dir, mock.clone());
        let err = ctx
            .execute(HttpMethod::Post, keys::SALES_SAVE, &json!({}))
            .unwrap_err();
        assert!(matches!(err, Error::Authentication { status: 401, .. }));
        assert!(err.is_token_expired());
        assert_eq!(mock.request_count(), 4);
    }

    #[test]
    fn test_body_level_expiry_signal_triggers_retry() {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockRequester::new());
        queue_token(&mock);
        mock.queue_json(
            200,
            &json!({"fault": {"faultstring": "Access Token expired"}}),
        );
        queue_token(&mock);
        mock.queue_json(200, &json!({"resultCd": "000"}));

        let ctx = context(&dir, mock.clone());
        let value = ctx
            .execute(HttpMethod::Post, keys::SALES_SAVE, &json!({}))
            .unwrap();
        assert_eq!(value["resultCd"], "000");
        assert_eq!(mock.request_count(), 4);
    }

    #[test]
    fn test_401_yields_authentication_error_regardless_of_body() {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockRequester::new());
        queue_token(&mock);
        mock.queue(401, r#"{"resultCd": "000", "resultMsg": "looks fine"}"#);
        queue_token(&mock);
        mock.queue(401, r#"{"resultCd": "000", "resultMsg": "looks fine"}"#);

        let ctx = context(&dir, mock);
        let err = ctx
            .execute(HttpMethod::Post, keys::SALES_SAVE, &json!({}))
            .unwrap_err();
        assert!(matches!(err, Error::Authentication { .. }));
    }

    #[test]
    fn test_non_json_success_body_surfaced_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockRequester::new());
        queue_token(&mock);
        mock.queue(200, "OK");

        let ctx = context(&dir, mock);
        let value = ctx
            .execute(HttpMethod::Get, keys::ITEM_LIST, &json!({}))
            .unwrap();
        assert_eq!(value, Value::String("OK".to_string()));
    }

    #[test]
    fn test_apply_unwraps_envelope_data() {
        #[derive(serde::Deserialize)]
        struct Info {
            #[serde(rename = "cmcKey")]
            cmc_key: String,
        }

        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockRequester::new());
        queue_token(&mock);
        mock.queue_json(
            200,
            &json!({"resultCd": "000", "data": {"cmcKey": "CMC-9"}}),
        );

        let ctx = context(&dir, mock);
        let info: Info = ctx
            .apply(HttpMethod::Post, keys::DEVICE_INIT, &json!({}))
            .unwrap();
        assert_eq!(info.cmc_key, "CMC-9");
    }
}
