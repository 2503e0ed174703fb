use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Param is a convenience type for payloads passed to API requests.
pub type Param = std::collections::HashMap<String, Value>;

/// ApiResponse represents the remote envelope with its optional business
/// result code. Endpoints that omit `resultCd` return plain data and are
/// treated as opaque success by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Business result code ("000"/"001" on success in the default set)
    #[serde(rename = "resultCd", skip_serializing_if = "Option::is_none")]
    pub result_cd: Option<String>,

    /// Human-readable result message
    #[serde(rename = "resultMsg", skip_serializing_if = "Option::is_none")]
    pub result_msg: Option<String>,

    /// Server-side timestamp of the result
    #[serde(rename = "resultDt", skip_serializing_if = "Option::is_none")]
    pub result_dt: Option<String>,

    /// Response data payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ApiResponse {
    /// Get the raw data value from the response
    pub fn raw(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Unmarshal the response data into the provided type
    pub fn apply<T>(&self) -> Result<T, crate::error::Error>
    where
        T: serde::de::DeserializeOwned,
    {
        match &self.data {
            Some(data) => serde_json::from_value(data.clone()).map_err(|e| e.into()),
            None => serde_json::from_value(Value::Null).map_err(|e| e.into()),
        }
    }

    /// Get a value from the response data by a slash-separated path.
    /// For example, "info/dvcId" accesses the "dvcId" field inside "info".
    pub fn get(&self, path: &str) -> Option<&Value> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let mut current = self.data.as_ref()?;

        for part in parts {
            current = match current {
                Value::Object(map) => map.get(part)?,
                Value::Array(arr) => {
                    let index: usize = part.parse().ok()?;
                    arr.get(index)?
                }
                _ => return None,
            };
        }

        Some(current)
    }

    /// Get a string value from the response data by a slash-separated path
    pub fn get_string(&self, path: &str) -> Option<String> {
        self.get(path).and_then(|v| v.as_str().map(|s| s.to_string()))
    }
}
