//! JSON-RPC client for the ledger node
//!
//! Only two methods are needed: `getSignaturesForAddress` to list recent
//! activity on the watched address and `getTransaction` to fetch bodies.
//! Responses are decoded into typed records at this boundary so missing or
//! ill-typed fields surface as `MalformedResponse` instead of reaching the
//! classifier.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::constants::polling::COMMITMENT;
use crate::error::{AppError, AppResult};
use crate::metrics::MetricsState;

/// One entry of a `getSignaturesForAddress` listing
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureInfo {
    pub signature: String,
    #[serde(default)]
    pub slot: u64,
    #[serde(default)]
    pub err: Option<Value>,
    #[serde(default)]
    pub block_time: Option<i64>,
    #[serde(default)]
    pub confirmation_status: Option<String>,
}

/// Full transaction as returned by `getTransaction` with `json` encoding
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    #[serde(default)]
    pub slot: u64,
    #[serde(default)]
    pub block_time: Option<i64>,
    pub transaction: TransactionBody,
    #[serde(default)]
    pub meta: Option<TransactionMeta>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionBody {
    #[serde(default)]
    pub signatures: Vec<String>,
    pub message: TransactionMessage,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMessage {
    pub account_keys: Vec<String>,
    pub instructions: Vec<CompiledInstruction>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledInstruction {
    pub program_id_index: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMeta {
    #[serde(default)]
    pub err: Option<Value>,
    pub pre_balances: Vec<u64>,
    pub post_balances: Vec<u64>,
}

impl TransactionRecord {
    /// Whether the ledger reported an execution error
    pub fn has_error(&self) -> bool {
        self.meta.as_ref().is_some_and(|meta| meta.err.is_some())
    }

    /// Program addresses invoked by top-level instructions
    ///
    /// Instructions whose program index falls outside the account list are skipped.
    pub fn program_ids(&self) -> impl Iterator<Item = &str> {
        let keys = &self.transaction.message.account_keys;
        self.transaction
            .message
            .instructions
            .iter()
            .filter_map(move |ix| keys.get(ix.program_id_index).map(String::as_str))
    }

    /// `(address, pre, post)` for every account that has both balances
    pub fn native_balances(&self) -> Vec<(&str, u64, u64)> {
        let Some(meta) = &self.meta else {
            return Vec::new();
        };

        self.transaction
            .message
            .account_keys
            .iter()
            .zip(meta.pre_balances.iter().zip(meta.post_balances.iter()))
            .map(|(address, (pre, post))| (address.as_str(), *pre, *post))
            .collect()
    }
}

/// Ledger RPC operations used by the poller
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Most recent signatures for `address`, newest first
    async fn get_signatures_for_address(
        &self,
        address: &str,
        limit: usize,
    ) -> AppResult<Vec<SignatureInfo>>;

    /// Full transaction body; `None` when the node has nothing for `signature`
    async fn get_transaction(&self, signature: &str) -> AppResult<Option<TransactionRecord>>;
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// HTTP JSON-RPC client
pub struct JsonRpcClient {
    url: String,
    http_client: reqwest::Client,
    metrics: Arc<MetricsState>,
}

impl JsonRpcClient {
    /// Create a client whose every request is bounded by `timeout`
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
        metrics: Arc<MetricsState>,
    ) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            http_client,
            metrics,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call<T>(&self, method: &'static str, params: Value) -> AppResult<Option<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let started = Instant::now();
        let result = self.http_client.post(&self.url).json(&payload).send().await;
        self.metrics
            .rpc_latency
            .with_label_values(&[method])
            .observe(started.elapsed().as_secs_f64() * 1000.0);

        let response =
            result.map_err(|e| AppError::Network(format!("{} request failed: {}", method, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Network(format!("{} returned HTTP {}", method, status)));
        }

        let envelope: RpcEnvelope<T> = response
            .json()
            .await
            .map_err(|e| AppError::MalformedResponse(format!("{} response: {}", method, e)))?;

        if let Some(err) = envelope.error {
            tracing::warn!(
                method,
                code = err.code,
                message = %err.message,
                "RPC returned an error object, treating as empty result"
            );
        }

        Ok(envelope.result)
    }
}

#[async_trait]
impl LedgerRpc for JsonRpcClient {
    async fn get_signatures_for_address(
        &self,
        address: &str,
        limit: usize,
    ) -> AppResult<Vec<SignatureInfo>> {
        let params = json!([
            address,
            {
                "limit": limit,
                "commitment": COMMITMENT,
            }
        ]);

        let listing: Option<Vec<SignatureInfo>> =
            self.call("getSignaturesForAddress", params).await?;
        Ok(listing.unwrap_or_default())
    }

    async fn get_transaction(&self, signature: &str) -> AppResult<Option<TransactionRecord>> {
        let params = json!([
            signature,
            {
                "encoding": "json",
                "commitment": COMMITMENT,
                "maxSupportedTransactionVersion": 0,
            }
        ]);

        self.call("getTransaction", params).await
    }
}
