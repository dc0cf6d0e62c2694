//! Parser module for level-2 feed messages
//!
//! Handles deserialization of the channel envelope, its events and the price
//! level updates they carry.

use rust_decimal::Decimal;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

use crate::orderbook::Side;

/// Outer message envelope
///
/// Both fields stay raw so a message from another channel is recognised
/// whatever shape the rest of it has.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedEnvelope {
    /// Channel name; absent on control messages
    #[serde(default)]
    channel: Value,

    /// Events; only the first one has to be well formed
    #[serde(default)]
    events: Value,
}

/// Snapshot vs incremental classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Snapshot,
    #[serde(alias = "l2update")]
    Update,
}

/// One book event
#[derive(Debug, Clone, Deserialize)]
pub struct FeedEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,

    /// Instrument id; absent, null and empty all mean "no instrument"
    #[serde(default)]
    pub product_id: Option<String>,

    pub updates: Vec<LevelUpdate>,
}

impl FeedEvent {
    /// Non-empty instrument id, if any
    pub fn product_id(&self) -> Option<&str> {
        self.product_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Single price level change
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LevelUpdate {
    pub side: Side,

    #[serde(rename = "px", deserialize_with = "deserialize_price")]
    pub price: Decimal,

    #[serde(rename = "qty", deserialize_with = "deserialize_quantity")]
    pub quantity: Decimal,
}

impl FeedEnvelope {
    /// Parse a raw WebSocket message
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Channel name, empty when absent or not a string
    pub fn channel(&self) -> &str {
        self.channel.as_str().unwrap_or_default()
    }

    /// Decode the first event, the only one the book consumes
    ///
    /// A missing or empty event list yields `None`; a non-array one is an error.
    pub fn first_event(&self) -> Result<Option<FeedEvent>, serde_json::Error> {
        match &self.events {
            Value::Null => Ok(None),
            Value::Array(events) => events.first().map(|event| FeedEvent::deserialize(event)).transpose(),
            other => Err(serde_json::Error::custom(format!(
                "invalid events: expected an array, found {}",
                json_kind(other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn parse_decimal(raw: &str) -> Result<Decimal, rust_decimal::Error> {
    let raw = raw.trim();
    Decimal::from_str(raw).or_else(|_| Decimal::from_scientific(raw))
}

/// Custom deserializer for Decimal from string or number
///
/// Numbers keep their literal text (serde_json `arbitrary_precision`), so no
/// digits are lost to an f64 round trip.
fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Value::deserialize(deserializer)? {
        Value::String(s) => parse_decimal(&s),
        Value::Number(n) => parse_decimal(&n.to_string()),
        other => {
            return Err(D::Error::custom(format!(
                "invalid decimal: expected a string or number, found {}",
                json_kind(&other)
            )))
        }
    };
    value.map_err(D::Error::custom)
}

fn deserialize_price<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let price = deserialize_decimal(deserializer)?;
    if price.is_sign_negative() && !price.is_zero() {
        return Err(D::Error::custom(format!("negative price: {}", price)));
    }
    Ok(price)
}

fn deserialize_quantity<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let quantity = deserialize_decimal(deserializer)?;
    if quantity.is_sign_negative() && !quantity.is_zero() {
        return Err(D::Error::custom(format!("negative quantity: {}", quantity)));
    }
    Ok(quantity)
}
