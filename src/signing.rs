//! HMAC-SHA256 signing of the feed subscription.
//!
//! The venue checks the signature over
//! `channel + api_key + account_id + timestamp + product_ids.concat()`,
//! keyed with the secret key and base64 encoded. Any change to the field
//! order or separators makes the subscription fail.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;

use crate::credentials::Credentials;
use crate::error::{MarketDataError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Signer for subscribe requests
pub struct SubscriptionSigner<'a> {
    credentials: &'a Credentials,
}

impl<'a> SubscriptionSigner<'a> {
    pub fn new(credentials: &'a Credentials) -> Self {
        Self { credentials }
    }

    /// Byte layout the signature is computed over
    pub fn prehash(&self, channel: &str, timestamp: &str, product_ids: &[String]) -> String {
        let mut message = String::with_capacity(
            channel.len()
                + self.credentials.api_key().len()
                + self.credentials.account_id().len()
                + timestamp.len()
                + product_ids.iter().map(String::len).sum::<usize>(),
        );
        message.push_str(channel);
        message.push_str(self.credentials.api_key());
        message.push_str(self.credentials.account_id());
        message.push_str(timestamp);
        for product_id in product_ids {
            message.push_str(product_id);
        }
        message
    }

    /// Sign the subscription and return the base64-encoded signature.
    pub fn sign(&self, channel: &str, timestamp: &str, product_ids: &[String]) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(self.credentials.expose_secret().as_bytes())
            .map_err(|e| MarketDataError::SigningError(e.to_string()))?;

        mac.update(self.prehash(channel, timestamp, product_ids).as_bytes());
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }
}

/// Outbound subscribe message; field order is part of the wire format
#[derive(Clone, Serialize)]
pub struct SubscribeRequest {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub channel: String,
    pub access_key: String,
    pub api_key_id: String,
    pub timestamp: String,
    pub passphrase: String,
    pub signature: String,
    pub product_ids: Vec<String>,
}

impl SubscribeRequest {
    /// Build and sign a subscribe request for `timestamp_secs`
    pub fn new(
        credentials: &Credentials,
        channel: &str,
        product_ids: &[String],
        timestamp_secs: i64,
    ) -> Result<Self> {
        let timestamp = timestamp_secs.to_string();
        let signature = SubscriptionSigner::new(credentials).sign(channel, &timestamp, product_ids)?;

        Ok(Self {
            kind: "subscribe",
            channel: channel.to_string(),
            access_key: credentials.api_key().to_string(),
            api_key_id: credentials.account_id().to_string(),
            timestamp,
            passphrase: credentials.expose_passphrase().to_string(),
            signature,
            product_ids: product_ids.to_vec(),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| MarketDataError::SerializationError(e.to_string()))
    }
}

impl std::fmt::Debug for SubscribeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscribeRequest")
            .field("channel", &self.channel)
            .field("access_key", &self.access_key)
            .field("api_key_id", &self.api_key_id)
            .field("timestamp", &self.timestamp)
            .field("passphrase", &"[REDACTED]")
            .field("signature", &"[REDACTED]")
            .field("product_ids", &self.product_ids)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn golden_credentials() -> Credentials {
        Credentials::new("K".into(), "S".into(), "P".into(), "A".into())
    }

    #[test]
    fn test_sign_known_vector() {
        let creds = golden_credentials();
        let signer = SubscriptionSigner::new(&creds);
        let products = vec!["ETH-USD".to_string()];

        assert_eq!(signer.prehash("l2_data", "1700000000", &products), "l2_dataKA1700000000ETH-USD");
        assert_eq!(
            signer.sign("l2_data", "1700000000", &products).unwrap(),
            "xF5h6chGUw/5v6YAgZ52gHeYXjht1fV1nR7+9Dbx31E="
        );
    }

    #[test]
    fn test_products_concatenated_without_separator() {
        let creds = golden_credentials();
        let signer = SubscriptionSigner::new(&creds);
        let products = vec!["ETH-USD".to_string(), "BTC-USD".to_string()];

        assert_eq!(
            signer.prehash("l2_data", "1700000000", &products),
            "l2_dataKA1700000000ETH-USDBTC-USD"
        );
        assert_eq!(
            signer.sign("l2_data", "1700000000", &products).unwrap(),
            "5tk5aNYLGkEDPc+hhTeZ0XP0AGruLIZEuYg38/1EEvM="
        );
    }

    #[test]
    fn test_subscribe_payload_field_order() {
        let creds = golden_credentials();
        let request =
            SubscribeRequest::new(&creds, "l2_data", &["ETH-USD".to_string()], 1_700_000_000).unwrap();

        assert_eq!(
            request.to_json().unwrap(),
            r#"{"type":"subscribe","channel":"l2_data","access_key":"K","api_key_id":"A","timestamp":"1700000000","passphrase":"P","signature":"xF5h6chGUw/5v6YAgZ52gHeYXjht1fV1nR7+9Dbx31E=","product_ids":["ETH-USD"]}"#
        );
    }

    #[test]
    fn test_debug_redacts_passphrase_and_signature() {
        let creds = Credentials::new("K".into(), "S".into(), "secret-pass".into(), "A".into());
        let request = SubscribeRequest::new(&creds, "l2_data", &["ETH-USD".to_string()], 1).unwrap();
        let debug_str = format!("{:?}", request);

        assert!(!debug_str.contains("secret-pass"));
        assert!(!debug_str.contains(&request.signature));
    }
}
