use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

/// Latest observation for a single symbol. `price` and `error` are
/// mutually exclusive: a failed fetch records the error text instead of
/// a price and the next cycle is the retry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Quote {
    pub fn priced(symbol: String, price: f64) -> Self {
        Self {
            symbol,
            price: Some(price),
            time: now_secs(),
            error: None,
        }
    }

    pub fn failed(symbol: String, error: String) -> Self {
        Self {
            symbol,
            price: None,
            time: now_secs(),
            error: Some(error),
        }
    }
}

/// Full quote table, replaced (never merged) on every poll cycle.
/// Sorted by symbol so serialized snapshots are stable.
pub type QuoteTable = BTreeMap<String, Quote>;

/// Structured event pushed over the stream as a tagged JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BoardEvent {
    Snapshot { quotes: QuoteTable },
    Update { quotes: QuoteTable },
    Info { message: String },
}

/// One entry on the notification board: either a plain text line or a
/// structured event. Immutable once created; ordering is enqueue order.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardMessage {
    Text(String),
    Event(BoardEvent),
}

impl BoardMessage {
    /// Timestamped text line as produced by the push endpoint.
    pub fn text_line(text: &str) -> Self {
        BoardMessage::Text(format!("[{}] {}", chrono::Local::now().format("%H:%M:%S"), text))
    }

    pub fn info(message: impl Into<String>) -> Self {
        BoardMessage::Event(BoardEvent::Info {
            message: message.into(),
        })
    }

    /// Payload carried in one `data:` frame.
    pub fn to_payload(&self) -> Result<String, serde_json::Error> {
        match self {
            BoardMessage::Text(line) => Ok(line.clone()),
            BoardMessage::Event(event) => serde_json::to_string(event),
        }
    }
}

/// Wall-clock observation time, second precision.
pub fn now_secs() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
