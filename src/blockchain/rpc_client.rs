use alloy::primitives::{hex, Address, Bytes, TxHash, U256, U64};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::blockchain::client::{ChainClient, ChainReceipt, ChainTransaction};
use crate::config::RpcConfig;
use crate::error::{ForwarderError, Result, RpcError};
use crate::logging::{LogContext, MetricsLogger, PerformanceMonitor};
use crate::retry::{RetryConfig, RetryManager};

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Vec<Value>,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Value,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcTransaction {
    hash: TxHash,
    from: Address,
    to: Option<Address>,
    value: U256,
    nonce: U64,
    block_number: Option<U64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: TxHash,
    block_number: Option<U64>,
    /// Absent on pre-Byzantium receipts
    status: Option<U64>,
}

impl From<RpcTransaction> for ChainTransaction {
    fn from(tx: RpcTransaction) -> Self {
        Self {
            hash: tx.hash,
            from: tx.from,
            to: tx.to,
            value: tx.value,
            nonce: tx.nonce.to::<u64>(),
            block_number: tx.block_number.map(|n| n.to::<u64>()),
        }
    }
}

impl From<RpcReceipt> for ChainReceipt {
    fn from(receipt: RpcReceipt) -> Self {
        Self {
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number.map(|n| n.to::<u64>()),
            success: receipt.status.map_or(true, |s| s == U64::from(1)),
        }
    }
}

/// JSON-RPC client over HTTP
pub struct RpcClient {
    client: Client,
    endpoint: String,
    timeout_seconds: u64,
    receipt_poll_interval: Duration,
    retry: RetryConfig,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(endpoint: String, config: &RpcConfig) -> std::result::Result<Self, RpcError> {
        LogContext::new("rpc_client", "initialization")
            .with_metadata("endpoint", json!(endpoint))
            .with_metadata("timeout_seconds", json!(config.timeout_seconds))
            .info("Initializing RPC client");

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            timeout_seconds: config.timeout_seconds,
            receipt_poll_interval: Duration::from_millis(config.receipt_poll_interval_ms),
            retry: RetryConfig::from_rpc(config),
            next_id: AtomicU64::new(1),
        })
    }

    /// Replace the retry policy for read-only calls
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn make_request(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        };

        LogContext::new("rpc_client", "make_request")
            .with_metadata("method", json!(method))
            .trace(&format!("Sending RPC request: {}", method));

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RpcError::Timeout {
                        seconds: self.timeout_seconds,
                    }
                } else if e.is_connect() {
                    RpcError::Connection(e.to_string())
                } else {
                    RpcError::Http(e)
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let seconds = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(60);
            return Err(RpcError::RateLimit { seconds }.into());
        }
        if !status.is_success() {
            return Err(RpcError::Connection(format!(
                "HTTP error: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            ))
            .into());
        }

        let body = response.text().await.map_err(RpcError::Http)?;
        let rpc_response: JsonRpcResponse = serde_json::from_str(&body).map_err(RpcError::Json)?;

        if let Some(error) = rpc_response.error {
            let rpc_error = match error.code {
                -32700 => RpcError::InvalidResponse("Parse error".to_string()),
                -32600 => RpcError::InvalidResponse("Invalid request".to_string()),
                -32602 => RpcError::InvalidResponse(format!("Invalid params: {}", error.message)),
                code => RpcError::Method {
                    code,
                    message: error.message,
                },
            };
            return Err(rpc_error.into());
        }

        Ok(rpc_response.result)
    }

    /// Timed request, logged as one RPC metric
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        let monitor = PerformanceMonitor::new(method);
        let result = self.make_request(method, params).await;
        let duration = monitor.finish_with_result(&result);
        MetricsLogger::log_rpc_call(method, duration, result.is_ok());
        result
    }

    /// Timed request retried on transient failures. Only for idempotent reads.
    async fn call_with_retry(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        RetryManager::new(method, self.retry.clone())
            .execute(|| {
                let params = params.clone();
                async move { self.call(method, params).await }
            })
            .await
    }
}

#[async_trait]
impl ChainClient for RpcClient {
    async fn get_balance(&self, address: Address) -> Result<U256> {
        let result = self
            .call_with_retry("eth_getBalance", vec![json!(address.to_string()), json!("latest")])
            .await?;
        parse_quantity_u256(&result)
    }

    async fn get_transaction_count(&self, address: Address) -> Result<u64> {
        let result = self
            .call_with_retry(
                "eth_getTransactionCount",
                vec![json!(address.to_string()), json!("pending")],
            )
            .await?;
        let count = parse_quantity_u256(&result)?;
        u64::try_from(count)
            .map_err(|_| RpcError::InvalidResponse(format!("Transaction count {} out of range", count)).into())
    }

    async fn get_gas_price(&self) -> Result<u128> {
        let result = self.call_with_retry("eth_gasPrice", vec![]).await?;
        let price = parse_quantity_u256(&result)?;
        u128::try_from(price)
            .map_err(|_| RpcError::InvalidResponse(format!("Gas price {} out of range", price)).into())
    }

    async fn get_transaction(&self, hash: TxHash) -> Result<Option<ChainTransaction>> {
        let result = self
            .call_with_retry("eth_getTransactionByHash", vec![json!(hash.to_string())])
            .await?;
        if result.is_null() {
            return Ok(None);
        }

        let tx: RpcTransaction = serde_json::from_value(result).map_err(RpcError::Json)?;
        Ok(Some(tx.into()))
    }

    async fn send_raw_transaction(&self, raw: &Bytes) -> Result<TxHash> {
        let result = self
            .call("eth_sendRawTransaction", vec![json!(hex::encode_prefixed(raw))])
            .await?;
        let hash = result
            .as_str()
            .ok_or_else(|| RpcError::InvalidResponse("Transaction hash is not a string".to_string()))?;

        hash.parse()
            .map_err(|e| RpcError::InvalidResponse(format!("Invalid transaction hash {}: {}", hash, e)).into())
    }

    async fn wait_for_receipt(&self, hash: TxHash, timeout: Duration) -> Result<Option<ChainReceipt>> {
        let poll = async {
            loop {
                match self.call("eth_getTransactionReceipt", vec![json!(hash.to_string())]).await {
                    Ok(Value::Null) => {}
                    Ok(value) => {
                        let receipt: RpcReceipt = serde_json::from_value(value).map_err(RpcError::Json)?;
                        return Ok::<_, ForwarderError>(receipt.into());
                    }
                    Err(e) if e.is_recoverable() => {
                        LogContext::new("rpc_client", "wait_for_receipt")
                            .with_transaction_hash(&hash)
                            .warn(&format!("Receipt poll failed, retrying: {}", e));
                    }
                    Err(e) => return Err(e),
                }
                tokio::time::sleep(self.receipt_poll_interval).await;
            }
        };

        match tokio::time::timeout(timeout, poll).await {
            Ok(receipt) => receipt.map(Some),
            Err(_) => Ok(None),
        }
    }
}

/// Parse a hex quantity such as `"0x1bc16d674ec80000"`
fn parse_quantity_u256(value: &Value) -> Result<U256> {
    let hex_string = value
        .as_str()
        .ok_or_else(|| RpcError::InvalidResponse(format!("Quantity is not a string: {}", value)))?;

    let hex_without_prefix = hex_string.strip_prefix("0x").unwrap_or(hex_string);
    U256::from_str_radix(hex_without_prefix, 16).map_err(|e| {
        RpcError::InvalidResponse(format!("Failed to parse quantity {}: {}", hex_string, e)).into()
    })
}
