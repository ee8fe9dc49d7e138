use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, SwapError};
use crate::types::RpcRequest;

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    rpc_url: String,
    next_id: Arc<AtomicU64>,
}

impl HttpTransport {
    pub fn new(rpc_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            rpc_url: rpc_url.into(),
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    pub fn rpc_url(&self) -> &str {
        self.rpc_url.as_str()
    }

    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = RpcRequest::new(id, method, params);
        debug!(method, id, url = %self.rpc_url, "sending rpc call");

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&payload)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(SwapError::Transport(format!(
                "node {} returned HTTP {}",
                self.rpc_url,
                response.status()
            )));
        }

        let body: Value = response.json().await?;

        if let Some(err) = body.get("error") {
            let code = err.get("code").and_then(Value::as_i64).unwrap_or(-32000);
            let message = err
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown rpc error")
                .to_string();
            let data = err.get("data").cloned();

            return Err(SwapError::Rpc {
                code,
                message,
                data,
            });
        }

        let value = body
            .get("result")
            .cloned()
            .ok_or_else(|| SwapError::Serialization("missing JSON-RPC result field".to_string()))?;

        serde_json::from_value(value).map_err(Into::into)
    }

    /// Posts `body` untouched and hands back whatever status and JSON the node answered with.
    pub async fn forward(&self, body: &Value) -> Result<(StatusCode, Value)> {
        let response = self.client.post(&self.rpc_url).json(body).send().await?;
        let status = response.status();
        let payload: Value = response.json().await?;
        Ok((status, payload))
    }
}
