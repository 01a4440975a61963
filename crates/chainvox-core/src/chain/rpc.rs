//! ============================================================================
//! JSON-RPC Transport - Typed Requests Over reqwest
//! ============================================================================
//! Posts `{jsonrpc, id, method, params}` envelopes and maps every failure
//! into a `ChainError`, so transport details never leak to callers:
//! - timeouts / connection errors / 5xx  -> NetworkFailure
//! - HTTP 429 or provider throttling     -> RateLimited
//! - undecodable bodies / missing result -> Malformed
//! ============================================================================

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

use crate::types::ChainError;

/// JSON-RPC error code some providers use for throttling
const RATE_LIMIT_RPC_CODE: i64 = 429;

/// Thin JSON-RPC 2.0 client
pub struct JsonRpcTransport {
    client: reqwest::Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl JsonRpcTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ChainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainError::NetworkFailure(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Issue one call and decode its `result`
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, ChainError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        debug!("RPC {} (id {})", method, id);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ChainError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChainError::NetworkFailure(format!(
                "{} returned HTTP {}: {}",
                method,
                status,
                truncate(&body, 200)
            )));
        }

        let body = response
            .text()
            .await
            .map_err(map_transport_error)?;

        decode_response(method, &body)
    }
}

/// Decode a JSON-RPC response body
pub fn decode_response<T: DeserializeOwned>(method: &str, body: &str) -> Result<T, ChainError> {
    let envelope: RpcResponse<T> = serde_json::from_str(body)
        .map_err(|e| ChainError::Malformed(format!("{}: {}", method, e)))?;

    if let Some(error) = envelope.error {
        let lower = error.message.to_lowercase();
        if error.code == RATE_LIMIT_RPC_CODE
            || lower.contains("rate limit")
            || lower.contains("too many requests")
            || lower.contains("compute units")
        {
            return Err(ChainError::RateLimited);
        }
        return Err(ChainError::NetworkFailure(format!(
            "{} error {}: {}",
            method, error.code, error.message
        )));
    }

    envelope
        .result
        .ok_or_else(|| ChainError::Malformed(format!("{}: response has no result", method)))
}

fn map_transport_error(e: reqwest::Error) -> ChainError {
    if e.is_timeout() {
        ChainError::NetworkFailure(format!("request timed out: {}", e))
    } else if e.is_decode() {
        ChainError::Malformed(e.to_string())
    } else {
        ChainError::NetworkFailure(e.to_string())
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_result() {
        let value: String = decode_response("eth_blockNumber", r#"{"jsonrpc":"2.0","id":1,"result":"0x10"}"#).unwrap();
        assert_eq!(value, "0x10");
    }

    #[test]
    fn test_decode_rate_limit_error() {
        let body = r#"{"jsonrpc":"2.0","id":1,"error":{"code":429,"message":"Your app has exceeded its compute units per second capacity"}}"#;
        let result: Result<String, _> = decode_response("eth_gasPrice", body);
        assert_eq!(result, Err(ChainError::RateLimited));
    }

    #[test]
    fn test_decode_provider_error() {
        let body = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32602,"message":"invalid params"}}"#;
        let result: Result<String, _> = decode_response("eth_getBalance", body);
        assert!(matches!(result, Err(ChainError::NetworkFailure(msg)) if msg.contains("invalid params")));
    }

    #[test]
    fn test_decode_garbage_is_malformed() {
        let result: Result<String, _> = decode_response("eth_getCode", "<html>oops</html>");
        assert!(matches!(result, Err(ChainError::Malformed(_))));

        let result: Result<String, _> = decode_response("eth_getCode", r#"{"jsonrpc":"2.0","id":1}"#);
        assert!(matches!(result, Err(ChainError::Malformed(_))));
    }
}
