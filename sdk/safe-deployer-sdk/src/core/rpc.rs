use crate::error::RpcError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Serialize)]
struct Request<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct ErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

/// Minimal JSON-RPC 2.0 client over HTTP POST.
///
/// Building one performs no I/O; the first request opens the connection.
#[derive(Debug)]
pub struct JsonRpcClient {
    http: reqwest::Client,
    url: reqwest::Url,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(url: reqwest::Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            url,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &reqwest::Url {
        &self.url
    }

    /// Send `method` with positional `params` and decode the `result` field.
    ///
    /// A `null` result is handed to `R` as JSON `null`, so callers that
    /// expect "not found yet" answers should ask for an `Option<_>`.
    pub async fn request<R: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<R, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = Request {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };
        log::trace!("rpc -> {} #{} {}", self.url.host_str().unwrap_or(""), id, method);

        let text = self
            .http
            .post(self.url.clone())
            .json(&body)
            .send()
            .await?
            .text()
            .await?;

        let mut response: serde_json::Map<String, Value> = serde_json::from_str(&text)?;
        if response.get("id").and_then(Value::as_u64) != Some(id) {
            log::warn!("rpc <- {} answered with id {:?}, expected {}", method, response.get("id"), id);
        }
        if let Some(err) = response.remove("error").filter(|e| !e.is_null()) {
            let err: ErrorObject = serde_json::from_value(err)?;
            log::debug!("rpc <- {} failed: {} ({})", method, err.message, err.code);
            return Err(RpcError::ErrorResponse {
                code: err.code,
                message: err.message,
                data: err.data,
            });
        }

        match response.remove("result") {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Err(RpcError::MissingResult(method.to_string())),
        }
    }
}
