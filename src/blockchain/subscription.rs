use alloy::primitives::{Address, Bytes, TxHash, B256, U64};
use alloy::sol;
use alloy::sol_types::SolEvent;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use crate::error::SubscriptionError;
use crate::logging::LogContext;

const EVENT_BUFFER: usize = 256;
const SUBSCRIBE_REQUEST_ID: u64 = 1;

sol! {
    event Transfer(address indexed from, address indexed to, uint256 value);
}

/// `topic0` of an ERC-20 `Transfer` log
pub const TRANSFER_EVENT_TOPIC: B256 = Transfer::SIGNATURE_HASH;

/// Push feed to subscribe to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Topic {
    PendingTransactions,
    /// ERC-20 `Transfer` logs emitted by `token` that pay `recipient`
    TokenTransfers { token: Address, recipient: Address },
}

impl Topic {
    fn params(&self) -> Value {
        match self {
            Topic::PendingTransactions => json!(["newPendingTransactions"]),
            Topic::TokenTransfers { token, recipient } => json!([
                "logs",
                {
                    "address": token.to_string(),
                    "topics": [TRANSFER_EVENT_TOPIC.to_string(), null, recipient.into_word().to_string()],
                }
            ]),
        }
    }
}

/// One notification from the push feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainEvent {
    PendingTransaction(TxHash),
    Log {
        address: Address,
        topics: Vec<B256>,
        data: Bytes,
        transaction_hash: Option<TxHash>,
        log_index: Option<u64>,
    },
    /// Transport hiccup; the stream keeps going
    ConnectionError(String),
    /// The stream has ended
    ConnectionClosed,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcLog {
    address: Address,
    #[serde(default)]
    topics: Vec<B256>,
    #[serde(default)]
    data: Bytes,
    transaction_hash: Option<TxHash>,
    log_index: Option<U64>,
}

/// Ordered stream of push events.
///
/// The socket is read by a background task; dropping the subscription stops it.
pub struct Subscription {
    receiver: mpsc::Receiver<ChainEvent>,
    reader: Option<JoinHandle<()>>,
}

impl Subscription {
    /// A subscription fed by hand through the returned sender
    pub fn channel(capacity: usize) -> (mpsc::Sender<ChainEvent>, Self) {
        let (sender, receiver) = mpsc::channel(capacity);
        (sender, Self { receiver, reader: None })
    }

    /// Next event. A finished feed yields `ConnectionClosed` once it is
    /// drained, so callers never see the stream end silently.
    pub async fn next(&mut self) -> ChainEvent {
        self.receiver.recv().await.unwrap_or(ChainEvent::ConnectionClosed)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

/// Open a WebSocket to `ws_url` and issue `eth_subscribe` for `topic`
pub async fn subscribe(ws_url: &str, topic: Topic) -> Result<Subscription, SubscriptionError> {
    let context = LogContext::new("subscription", "subscribe").with_metadata("topic", json!(topic.params()));

    let (stream, _) = connect_async(ws_url)
        .await
        .map_err(|e| SubscriptionError::Connect(e.to_string()))?;
    let (mut write, mut read) = stream.split();

    let request = json!({
        "jsonrpc": "2.0",
        "id": SUBSCRIBE_REQUEST_ID,
        "method": "eth_subscribe",
        "params": topic.params(),
    });
    write
        .send(Message::text(request.to_string()))
        .await
        .map_err(|e| SubscriptionError::Connect(e.to_string()))?;

    let subscription_id = loop {
        match read.next().await {
            Some(Ok(Message::Text(text))) => {
                let response: Value = match serde_json::from_str(text.as_str()) {
                    Ok(value) => value,
                    Err(_) => continue,
                };
                if response.get("id").and_then(Value::as_u64) != Some(SUBSCRIBE_REQUEST_ID) {
                    continue;
                }
                if let Some(error) = response.get("error") {
                    return Err(SubscriptionError::Rejected(error.to_string()));
                }
                break response
                    .get("result")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| SubscriptionError::Rejected(response.to_string()))?;
            }
            Some(Ok(Message::Close(_))) | None => return Err(SubscriptionError::Closed),
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(SubscriptionError::Connect(e.to_string())),
        }
    };

    context
        .with_metadata("subscription_id", json!(subscription_id))
        .info("WebSocket subscription opened");

    let (sender, mut subscription) = Subscription::channel(EVENT_BUFFER);
    let reader = tokio::spawn(async move {
        // Keeps the socket open for the lifetime of the reader
        let _write = write;

        loop {
            let event = match read.next().await {
                Some(Ok(Message::Text(text))) => match parse_notification(text.as_str()) {
                    Some(event) => event,
                    None => {
                        LogContext::new("subscription", "read")
                            .debug(&format!("Ignoring message: {}", text.as_str()));
                        continue;
                    }
                },
                Some(Ok(Message::Close(_)))
                | Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed))
                | None => {
                    let _ = sender.send(ChainEvent::ConnectionClosed).await;
                    break;
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => ChainEvent::ConnectionError(e.to_string()),
            };

            if sender.send(event).await.is_err() {
                break;
            }
        }
    });
    subscription.reader = Some(reader);

    Ok(subscription)
}

/// Decode an `eth_subscription` notification. Anything else yields `None`.
pub fn parse_notification(text: &str) -> Option<ChainEvent> {
    let message: Value = serde_json::from_str(text).ok()?;
    if message.get("method").and_then(Value::as_str) != Some("eth_subscription") {
        return None;
    }

    let result = message.get("params")?.get("result")?;
    if let Some(hash) = result.as_str() {
        return hash.parse().ok().map(ChainEvent::PendingTransaction);
    }

    let log: RpcLog = serde_json::from_value(result.clone()).ok()?;
    Some(ChainEvent::Log {
        address: log.address,
        topics: log.topics,
        data: log.data,
        transaction_hash: log.transaction_hash,
        log_index: log.log_index.map(|index| index.to::<u64>()),
    })
}
