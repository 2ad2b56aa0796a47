use async_trait::async_trait;
use chaingate_config::NodeConfig;
use chaingate_core::{
    link::transactions::{
        ExecutionError, TransactionHash, TransactionOutcome,
    },
    BlockHeight,
};
use log::debug;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::{
    utils::{base64_decode, next_request_id, string_or_number},
    GatewayError,
};

/// The JSON-RPC error code the node reports for a transaction it has no
/// record of. Shared with genuinely internal failures, so the error text
/// must also name the hash before the lookup is treated as "no data yet".
const NOT_FOUND_CODE: i64 = -32603;

/// The historical side of the result correlation: a request-by-hash lookup
/// against the node's store of settled transactions.
///
/// "Not found" is not a failure of this collaborator; it means no historical
/// result exists yet and the live path should keep waiting.
#[async_trait]
pub trait TransactionArchive: Send + Sync + 'static {
    async fn fetch_transaction(
        &self,
        hash: TransactionHash,
    ) -> Result<TransactionOutcome, LookupError>;
}

#[derive(Debug, Error)]
pub enum LookupError {
    /// The node has no record of the transaction yet.
    #[error("no stored result for transaction {0}")]
    NotFound(TransactionHash),
    /// The lookup collaborator itself is unavailable or misbehaving.
    #[error("{0}")]
    Transport(String),
}

/// [`TransactionArchive`] backed by the node's JSON-RPC endpoint.
pub struct NodeRpcClient {
    http: reqwest::Client,
    url: Url,
}

impl NodeRpcClient {
    pub fn new(config: &NodeConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { http, url: config.url.clone() })
    }
}

#[async_trait]
impl TransactionArchive for NodeRpcClient {
    async fn fetch_transaction(
        &self,
        hash: TransactionHash,
    ) -> Result<TransactionOutcome, LookupError> {
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "id": next_request_id(),
            "method": "tx",
            "params": { "hash": hash.to_string() }
        });

        debug!("looking up historical result for {hash}");
        let response = self
            .http
            .post(self.url.clone())
            .json(&request)
            .send()
            .await
            .map_err(|err| LookupError::Transport(err.to_string()))?;
        let envelope: RpcResponse = response
            .json()
            .await
            .map_err(|err| LookupError::Transport(err.to_string()))?;

        if let Some(error) = envelope.error {
            return Err(classify_rpc_error(&error, &hash));
        }
        let record = envelope.result.ok_or_else(|| {
            LookupError::Transport(
                "lookup response carried neither result nor error".into(),
            )
        })?;
        Ok(outcome_from_record(record))
    }
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<TxRecord>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    #[serde(default)]
    message: String,
    data: Option<String>,
}

/// A stored transaction record, in the node's wire shape.
#[derive(Deserialize)]
struct TxRecord {
    #[serde(deserialize_with = "string_or_number")]
    height: BlockHeight,
    tx: Option<String>,
    tx_result: Option<TxResultRecord>,
}

#[derive(Deserialize)]
struct TxResultRecord {
    #[serde(default, deserialize_with = "string_or_number")]
    code: u32,
    info: Option<String>,
    log: Option<String>,
    data: Option<String>,
}

/// Distinguishes the well-known "no such transaction" error from genuine
/// transport failures: the code must match and the error text must contain
/// the literal hash that was looked up.
fn classify_rpc_error(
    error: &RpcErrorObject,
    hash: &TransactionHash,
) -> LookupError {
    let detail = error.data.as_deref().unwrap_or(&error.message);
    if error.code == NOT_FOUND_CODE
        && detail.to_uppercase().contains(&hash.to_string())
    {
        LookupError::NotFound(*hash)
    } else {
        LookupError::Transport(format!(
            "lookup error {}: {} {}",
            error.code,
            error.message,
            error.data.as_deref().unwrap_or_default()
        ))
    }
}

fn outcome_from_record(record: TxRecord) -> TransactionOutcome {
    let raw = record
        .tx
        .as_deref()
        .and_then(base64_decode)
        .unwrap_or_default();
    let result = match record.tx_result {
        Some(result) if result.code != 0 => Err(ExecutionError {
            code: result.code,
            info: result.info.or(result.log).unwrap_or_default(),
            data: result
                .data
                .as_deref()
                .and_then(base64_decode)
                .unwrap_or_default(),
        }),
        _ => Ok(()),
    };
    TransactionOutcome { raw, height: record.height, result }
}
