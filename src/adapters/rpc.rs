use crate::domain::model::{Address, Wei};
use crate::domain::ports::ChainRpc;
use crate::utils::error::{RunnerError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
    id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcErrorObject {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

/// JSON-RPC 2.0 over HTTP POST.
pub struct JsonRpcClient {
    endpoint: String,
    filter_probe_error: String,
    client: Client,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(endpoint: String, filter_probe_error: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint,
            filter_probe_error,
            client,
            next_id: AtomicU64::new(1),
        })
    }

    pub async fn call(&self, method: &str, params: Value) -> Result<JsonRpcResponse> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        };

        tracing::debug!("JSON-RPC request to {}: {}", self.endpoint, method);
        let response = self.client.post(&self.endpoint).json(&request).send().await?;
        tracing::debug!("JSON-RPC response status: {}", response.status());

        // 部分節點以 4xx 回傳 JSON-RPC 錯誤，因此不檢查 HTTP 狀態碼
        let text = response.text().await?;
        serde_json::from_str::<JsonRpcResponse>(&text).map_err(|e| RunnerError::OutputParseError {
            source_name: format!("{} response", method),
            message: format!("not a JSON-RPC envelope ({}): {}", e, preview(&text)),
        })
    }
}

fn preview(body: &str) -> String {
    const LIMIT: usize = 200;
    let trimmed = body.trim();
    if trimmed.chars().count() > LIMIT {
        format!("{}...", trimmed.chars().take(LIMIT).collect::<String>())
    } else {
        trimmed.to_string()
    }
}

#[async_trait]
impl ChainRpc for JsonRpcClient {
    async fn supports_filters(&self) -> Result<bool> {
        let response = match self.call("eth_newFilter", json!(["invalid"])).await {
            Ok(response) => response,
            // 回應不是 JSON-RPC，訊息自然不可能相符
            Err(RunnerError::OutputParseError { message, .. }) => {
                tracing::debug!("eth_newFilter probe got an unparseable reply: {}", message);
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        let message = response
            .error
            .as_ref()
            .and_then(|error| error.message.as_deref());
        tracing::debug!("eth_newFilter probe returned error message: {:?}", message);

        Ok(message == Some(self.filter_probe_error.as_str()))
    }

    async fn get_balance(&self, address: &Address) -> Result<Wei> {
        let response = self
            .call("eth_getBalance", json!([address.as_str(), "latest"]))
            .await?;

        if let Some(error) = response.error {
            return Err(RunnerError::RpcError {
                code: error.code,
                message: error.message.unwrap_or_default(),
            });
        }

        match response.result {
            Some(Value::String(quantity)) => Wei::from_hex_quantity(&quantity),
            other => Err(RunnerError::RpcError {
                code: 0,
                message: format!("eth_getBalance returned no hex result: {:?}", other),
            }),
        }
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
