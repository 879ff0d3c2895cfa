use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Response envelope from a backend function invocation.
///
/// A non-null `error` means the invocation failed regardless of what `data`
/// holds.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InvokeResponse {
    pub data: Value,
    pub error: Option<Value>,
}

impl InvokeResponse {
    pub fn ok(data: Value) -> Self {
        Self { data, error: None }
    }

    pub fn failed(error: Value) -> Self {
        Self {
            data: Value::Null,
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Opaque RPC boundary to the backend edge functions.
///
/// Implementations own transport concerns (endpoints, auth, timeouts). The
/// engine never retries an invocation; it only decides whether to call at
/// all.
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    /// Invoke a named backend function with a JSON payload.
    ///
    /// `Err` is a transport failure; an `Ok` response with a non-null
    /// `error` is a backend-reported failure. The engine treats both the
    /// same way.
    async fn invoke(&self, function: &str, payload: Value) -> Result<InvokeResponse>;
}
