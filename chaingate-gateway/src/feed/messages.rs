use chaingate_core::link::{
    blocks::BlockUpdate,
    transactions::{ExecutionError, TransactionEvent, TransactionHash},
};
use chaingate_core::BlockHeight;
use log::warn;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::utils::{base64_decode, string_or_number};

/// A feed message translated into its internal notification class.
pub(crate) enum FeedMessage {
    Transaction(TransactionEvent),
    Block(BlockUpdate),
}

#[derive(Debug, Error)]
pub(crate) enum FeedParseError {
    #[error("malformed feed message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("transaction event carries neither hash attribute nor payload")]
    MissingHash,
}

/// The JSON-RPC envelope wrapping every feed message.
#[derive(Deserialize)]
struct Envelope {
    result: Option<EnvelopeResult>,
}

#[derive(Deserialize)]
struct EnvelopeResult {
    #[serde(default)]
    query: Option<String>,
    data: Option<EventData>,
    /// Attribute groups attached to the event; transaction hashes live here.
    #[serde(default)]
    events: Vec<EventGroup>,
}

#[derive(Deserialize)]
struct EventData {
    value: Option<Value>,
}

#[derive(Deserialize)]
struct EventGroup {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    attributes: Vec<EventAttribute>,
}

#[derive(Deserialize)]
struct EventAttribute {
    key: String,
    /// Attribute values arrive as strings or bare numbers.
    value: Value,
}

/// A transaction execution event, in the feed's wire shape.
#[derive(Deserialize)]
struct TxEventPayload {
    #[serde(deserialize_with = "string_or_number")]
    height: BlockHeight,
    tx: Option<String>,
    result: Option<TxResultPayload>,
}

#[derive(Deserialize)]
struct TxResultPayload {
    /// Success reports routinely omit the code; absent means 0.
    #[serde(default, deserialize_with = "string_or_number")]
    code: u32,
    info: Option<String>,
    log: Option<String>,
    data: Option<String>,
}

/// A new-block event, in the feed's wire shape.
#[derive(Deserialize)]
struct NewBlockPayload {
    block: Option<BlockPayload>,
}

#[derive(Deserialize)]
struct BlockPayload {
    header: BlockHeaderPayload,
    #[serde(default)]
    data: BlockDataPayload,
}

#[derive(Deserialize)]
struct BlockHeaderPayload {
    #[serde(deserialize_with = "string_or_number")]
    height: BlockHeight,
}

#[derive(Deserialize, Default)]
struct BlockDataPayload {
    /// Raw transaction payloads included in the block, base64 encoded.
    #[serde(default)]
    txs: Vec<String>,
}

/// Translates one raw feed message into zero or more internal messages.
///
/// Subscription confirmations and other non-event frames translate to
/// nothing. A transaction frame that names several hashes (unusual, but the
/// feed permits it) yields one event per hash.
pub(crate) fn parse(text: &str) -> Result<Vec<FeedMessage>, FeedParseError> {
    let envelope: Envelope = serde_json::from_str(text)?;
    let Some(result) = envelope.result else {
        return Ok(Vec::new());
    };
    let Some(value) =
        result.data.as_ref().and_then(|data| data.value.as_ref())
    else {
        return Ok(Vec::new());
    };

    if result.query.as_deref().is_some_and(|q| q.contains("NewBlock")) {
        let payload: NewBlockPayload =
            serde_json::from_value(value.clone())?;
        return Ok(translate_block(payload).into_iter().collect());
    }

    let payload: TxEventPayload = serde_json::from_value(value.clone())?;
    translate_transaction(payload, &result.events)
}

fn translate_transaction(
    payload: TxEventPayload,
    groups: &[EventGroup],
) -> Result<Vec<FeedMessage>, FeedParseError> {
    let raw = payload
        .tx
        .as_deref()
        .and_then(base64_decode)
        .unwrap_or_default();

    let mut hashes = extract_hashes(groups);
    if hashes.is_empty() {
        // No hash attribute; recover the identity from the payload itself.
        if raw.is_empty() {
            return Err(FeedParseError::MissingHash);
        }
        hashes.push(TransactionHash::digest(&raw));
    }
    if hashes.len() > 1 {
        warn!("feed message carried {} transaction hashes", hashes.len());
    }

    let result = match &payload.result {
        Some(result) if result.code != 0 => Err(ExecutionError {
            code: result.code,
            info: result
                .info
                .clone()
                .or_else(|| result.log.clone())
                .unwrap_or_default(),
            data: result
                .data
                .as_deref()
                .and_then(base64_decode)
                .unwrap_or_default(),
        }),
        _ => Ok(()),
    };

    Ok(hashes
        .into_iter()
        .map(|hash| {
            FeedMessage::Transaction(TransactionEvent {
                hash,
                height: payload.height,
                raw: raw.clone(),
                result: result.clone(),
            })
        })
        .collect())
}

fn translate_block(payload: NewBlockPayload) -> Option<FeedMessage> {
    let block = payload.block?;
    // Block messages are not indexed by hash; recover each transaction's
    // identity locally by double-hashing its raw payload.
    let included = block
        .data
        .txs
        .iter()
        .filter_map(|tx| base64_decode(tx))
        .map(|raw| TransactionHash::digest(&raw))
        .collect();
    Some(FeedMessage::Block(BlockUpdate {
        height: block.header.height,
        included,
    }))
}

/// Collects unique transaction hashes from the event attribute groups.
fn extract_hashes(groups: &[EventGroup]) -> Vec<TransactionHash> {
    let mut hashes = Vec::new();
    for group in groups {
        if group.kind != "tx" {
            continue;
        }
        for attribute in &group.attributes {
            if attribute.key != "hash" {
                continue;
            }
            let text = match &attribute.value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            match text.parse() {
                Ok(hash) => {
                    if !hashes.contains(&hash) {
                        hashes.push(hash);
                    }
                }
                Err(err) => {
                    warn!("ignoring malformed hash attribute {text}: {err}")
                }
            }
        }
    }
    hashes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(messages: Vec<FeedMessage>) -> FeedMessage {
        let mut messages = messages.into_iter();
        let first = messages.next().expect("expected one translated message");
        assert!(messages.next().is_none(), "expected exactly one message");
        first
    }

    #[test]
    fn subscription_confirmation_translates_to_nothing() {
        let text = r#"{"jsonrpc":"2.0","id":1,"result":{}}"#;
        assert!(parse(text).unwrap().is_empty());
    }

    #[test]
    fn transaction_event_with_missing_code_is_success() {
        let text = r#"{
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "query": "tm.event = 'Tx'",
                "data": {
                    "type": "feed/event/Tx",
                    "value": {
                        "height": 1087,
                        "tx": "aGVsbG8h",
                        "result": { "gas_used": 905760 }
                    }
                },
                "events": [
                    {
                        "type": "tx",
                        "attributes": [
                            {
                                "key": "hash",
                                "value": "13F2EF4097320B234DECCEF063FDAE6A0845AF4380CEC15F2185CE9FACC6EBD5"
                            }
                        ]
                    }
                ]
            }
        }"#;
        let FeedMessage::Transaction(event) = single(parse(text).unwrap())
        else {
            panic!("expected a transaction event");
        };
        assert_eq!(
            event.hash.to_string(),
            "13F2EF4097320B234DECCEF063FDAE6A0845AF4380CEC15F2185CE9FACC6EBD5"
        );
        assert_eq!(event.height, 1087);
        assert_eq!(event.raw, b"hello!");
        assert!(event.result.is_ok());
    }

    #[test]
    fn failed_transaction_event_with_string_fields() {
        let text = r#"{
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "query": "tm.event = 'Tx'",
                "data": {
                    "value": {
                        "height": "1143",
                        "tx": "dGVzdA==",
                        "result": { "code": "1005", "info": "insufficient balance" }
                    }
                },
                "events": [
                    {
                        "type": "tx",
                        "attributes": [
                            { "key": "hash", "value": "fcf3b0d09b8042b7a41f514107cbe1e09bd33c222005a8669a3ebe4b1d59bddf" }
                        ]
                    }
                ]
            }
        }"#;
        let FeedMessage::Transaction(event) = single(parse(text).unwrap())
        else {
            panic!("expected a transaction event");
        };
        // lowercase attribute normalizes to the canonical uppercase form
        assert_eq!(
            event.hash.to_string(),
            "FCF3B0D09B8042B7A41F514107CBE1E09BD33C222005A8669A3EBE4B1D59BDDF"
        );
        assert_eq!(event.height, 1143);
        let error = event.result.unwrap_err();
        assert_eq!(error.code, 1005);
        assert_eq!(error.info, "insufficient balance");
    }

    #[test]
    fn transaction_event_without_hash_attribute_hashes_the_payload() {
        let text = r#"{
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "query": "tm.event = 'Tx'",
                "data": { "value": { "height": 12, "tx": "aGVsbG8h" } },
                "events": []
            }
        }"#;
        let FeedMessage::Transaction(event) = single(parse(text).unwrap())
        else {
            panic!("expected a transaction event");
        };
        assert_eq!(event.hash, TransactionHash::digest(b"hello!"));
    }

    #[test]
    fn transaction_event_with_two_hashes_yields_two_events() {
        let text = r#"{
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "query": "tm.event = 'Tx'",
                "data": { "value": { "height": 200, "tx": "dGVzdA==", "result": {} } },
                "events": [
                    {
                        "type": "tx",
                        "attributes": [
                            { "key": "hash", "value": "1111111111111111111111111111111111111111111111111111111111111111" },
                            { "key": "hash", "value": "2222222222222222222222222222222222222222222222222222222222222222" }
                        ]
                    }
                ]
            }
        }"#;
        let messages = parse(text).unwrap();
        assert_eq!(messages.len(), 2);
    }

    #[test]
    fn new_block_event_hashes_included_payloads() {
        let text = r#"{
            "jsonrpc": "2.0",
            "id": 2,
            "result": {
                "query": "tm.event = 'NewBlock'",
                "data": {
                    "value": {
                        "block": {
                            "header": { "height": "1088" },
                            "data": { "txs": ["aGVsbG8h", "dGVzdA=="] }
                        }
                    }
                }
            }
        }"#;
        let FeedMessage::Block(update) = single(parse(text).unwrap()) else {
            panic!("expected a block update");
        };
        assert_eq!(update.height, 1088);
        assert_eq!(
            update.included.to_vec(),
            vec![
                TransactionHash::digest(b"hello!"),
                TransactionHash::digest(b"test"),
            ]
        );
    }

    #[test]
    fn empty_block_event_translates_without_inclusions() {
        let text = r#"{
            "jsonrpc": "2.0",
            "id": 2,
            "result": {
                "query": "tm.event = 'NewBlock'",
                "data": {
                    "value": { "block": { "header": { "height": 5 } } }
                }
            }
        }"#;
        let FeedMessage::Block(update) = single(parse(text).unwrap()) else {
            panic!("expected a block update");
        };
        assert_eq!(update.height, 5);
        assert!(update.included.is_empty());
    }
}
