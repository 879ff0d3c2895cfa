//! HTTP fetcher for the Mosaic tile engine.
//!
//! Thin `reqwest` wrapper implementing [`RemoteFetcher`] against a backend
//! edge-function host: each invocation is a POST to
//! `{base}/functions/v1/{function}` with a JSON payload and an optional
//! bearer key. Timeouts live here; the engine never retries.
//!
//! # Example
//! ```rust,no_run
//! use mosaic_client::EdgeClient;
//! use mosaic_core::tiles::defaults;
//! use mosaic_core::{EngineConfig, Mosaic, TileRequest};
//!
//! #[tokio::main]
//! async fn main() -> mosaic_core::Result<()> {
//!     // Reads MOSAIC_FUNCTIONS_URL and MOSAIC_ANON_KEY
//!     let client = EdgeClient::from_env()?;
//!     let mosaic = Mosaic::open("./tiles.redb", EngineConfig::default(), client)?;
//!
//!     let request = TileRequest::new("AI productivity app", defaults::market_size());
//!     let fetch = mosaic.fetch(&request).await?;
//!     println!("TAM: {:?}", fetch.data.metrics.get("tam"));
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use mosaic_core::{InvokeResponse, MosaicError, RemoteFetcher, Result};
use serde_json::Value;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How much of an HTTP error body is carried into the error message.
const MAX_ERROR_BODY: usize = 512;

/// Connection settings for the edge-function host.
#[derive(Debug, Clone)]
pub struct EdgeConfig {
    /// Base URL of the functions host, e.g. `https://project.example.com`.
    pub base_url: String,

    /// Bearer key sent with every invocation, when set.
    pub api_key: Option<String>,

    /// Per-request timeout. Default: 30 seconds.
    pub timeout: Duration,
}

impl EdgeConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read `MOSAIC_FUNCTIONS_URL` (required) and `MOSAIC_ANON_KEY`
    /// (optional) from the environment.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("MOSAIC_FUNCTIONS_URL").map_err(|_| {
            MosaicError::Validation("MOSAIC_FUNCTIONS_URL is not set".into())
        })?;
        let api_key = std::env::var("MOSAIC_ANON_KEY").ok();
        Ok(Self {
            base_url,
            api_key,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    fn function_url(&self, function: &str) -> String {
        format!(
            "{}/functions/v1/{}",
            self.base_url.trim_end_matches('/'),
            function
        )
    }
}

/// A connected edge-function client.
pub struct EdgeClient {
    http: reqwest::Client,
    config: EdgeConfig,
}

impl EdgeClient {
    pub fn new(config: EdgeConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                MosaicError::Validation(format!("HTTP client construction failed: {}", e))
            })?;
        Ok(Self { http, config })
    }

    /// Construct from [`EdgeConfig::from_env`].
    pub fn from_env() -> Result<Self> {
        Self::new(EdgeConfig::from_env()?)
    }

    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }
}

#[async_trait]
impl RemoteFetcher for EdgeClient {
    async fn invoke(&self, function: &str, payload: Value) -> Result<InvokeResponse> {
        let url = self.config.function_url(function);
        log::debug!("POST {}", url);

        let mut request = self.http.post(&url).json(&payload);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| MosaicError::Invoke {
            function: function.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let body: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(MAX_ERROR_BODY)
                .collect();
            return Err(MosaicError::Invoke {
                function: function.to_string(),
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let body: Value = response.json().await.map_err(|e| MosaicError::Invoke {
            function: function.to_string(),
            message: format!("Invalid JSON response: {}", e),
        })?;

        Ok(decode_envelope(body))
    }
}

/// Split a response body into the `{data, error}` envelope. Bodies without
/// the envelope are treated as the payload itself; a null `error` counts as
/// absent.
pub fn decode_envelope(body: Value) -> InvokeResponse {
    let Some(obj) = body.as_object() else {
        return InvokeResponse::ok(body);
    };

    if let Some(error) = obj.get("error").filter(|e| !e.is_null()) {
        return InvokeResponse {
            data: obj.get("data").cloned().unwrap_or(Value::Null),
            error: Some(error.clone()),
        };
    }

    if obj.contains_key("data") || obj.contains_key("error") {
        return InvokeResponse::ok(obj.get("data").cloned().unwrap_or(Value::Null));
    }

    InvokeResponse::ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_function_url() {
        let config = EdgeConfig::new("https://project.example.com");
        assert_eq!(
            config.function_url("market-size"),
            "https://project.example.com/functions/v1/market-size"
        );

        // Trailing slash doesn't double up
        let config = EdgeConfig::new("https://project.example.com/");
        assert_eq!(
            config.function_url("market-size"),
            "https://project.example.com/functions/v1/market-size"
        );
    }

    #[test]
    fn test_decode_envelope_with_data() {
        let decoded = decode_envelope(json!({"data": {"tam": 100}, "error": null}));
        assert!(!decoded.is_error());
        assert_eq!(decoded.data, json!({"tam": 100}));
    }

    #[test]
    fn test_decode_envelope_with_error() {
        let decoded = decode_envelope(json!({"data": {"tam": 100}, "error": {"message": "quota"}}));
        assert!(decoded.is_error());
        // Error wins even when data is present
        assert_eq!(decoded.error.unwrap()["message"], "quota");
    }

    #[test]
    fn test_decode_bare_payload() {
        let decoded = decode_envelope(json!({"tam": 100}));
        assert!(!decoded.is_error());
        assert_eq!(decoded.data, json!({"tam": 100}));
    }

    #[test]
    fn test_decode_non_object() {
        let decoded = decode_envelope(json!([1, 2, 3]));
        assert_eq!(decoded.data, json!([1, 2, 3]));
    }

    #[test]
    fn test_from_env_requires_url() {
        std::env::remove_var("MOSAIC_FUNCTIONS_URL");
        assert!(EdgeConfig::from_env().is_err());

        std::env::set_var("MOSAIC_FUNCTIONS_URL", "https://project.example.com");
        let config = EdgeConfig::from_env().unwrap();
        assert_eq!(config.base_url, "https://project.example.com");
        std::env::remove_var("MOSAIC_FUNCTIONS_URL");
    }

    #[test]
    fn test_builder() {
        let config = EdgeConfig::new("https://x.example.com")
            .with_api_key("anon")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.api_key.as_deref(), Some("anon"));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
