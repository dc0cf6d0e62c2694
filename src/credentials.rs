//! API credentials for the authenticated feed subscription.
//!
//! The secret key and passphrase are wrapped in `SecretString` so they never
//! show up in `Debug` output or logs.

use secrecy::{ExposeSecret, SecretString};

use crate::error::{MarketDataError, Result};

pub const API_KEY_VAR: &str = "API_KEY";
pub const SECRET_KEY_VAR: &str = "SECRET_KEY";
pub const PASSPHRASE_VAR: &str = "PASSPHRASE";
pub const ACCOUNT_ID_VAR: &str = "SVC_ACCOUNTID";

/// Credentials used to sign the subscribe request
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    secret_key: SecretString,
    passphrase: SecretString,
    account_id: String,
}

impl Credentials {
    /// Create credentials from explicit values.
    pub fn new(api_key: String, secret_key: String, passphrase: String, account_id: String) -> Self {
        Self {
            api_key,
            secret_key: SecretString::from(secret_key),
            passphrase: SecretString::from(passphrase),
            account_id,
        }
    }

    /// Read all four credentials through `lookup`.
    ///
    /// # Errors
    /// Returns `MarketDataError::ConfigError` naming the first variable that is
    /// missing or empty.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| -> Result<String> {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| MarketDataError::ConfigError(format!("Missing env var: {}", name)))
        };

        Ok(Self::new(
            required(API_KEY_VAR)?,
            required(SECRET_KEY_VAR)?,
            required(PASSPHRASE_VAR)?,
            required(ACCOUNT_ID_VAR)?,
        ))
    }

    /// API key (public, safe to log).
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Service account id (public, safe to log).
    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// Expose the secret key for signing.
    ///
    /// Only use this as HMAC key material. Never log the return value.
    pub fn expose_secret(&self) -> &str {
        self.secret_key.expose_secret()
    }

    /// Expose the passphrase for the subscribe payload.
    pub fn expose_passphrase(&self) -> &str {
        self.passphrase.expose_secret()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("secret_key", &"[REDACTED]")
            .field("passphrase", &"[REDACTED]")
            .field("account_id", &self.account_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_lookup_reads_all_values() {
        let env = vars(&[
            ("API_KEY", "key"),
            ("SECRET_KEY", "secret"),
            ("PASSPHRASE", "pass"),
            ("SVC_ACCOUNTID", "acct"),
        ]);
        let creds = Credentials::from_lookup(|k| env.get(k).cloned()).unwrap();

        assert_eq!(creds.api_key(), "key");
        assert_eq!(creds.expose_secret(), "secret");
        assert_eq!(creds.expose_passphrase(), "pass");
        assert_eq!(creds.account_id(), "acct");
    }

    #[test]
    fn test_missing_value_is_config_error() {
        let env = vars(&[("API_KEY", "key"), ("SECRET_KEY", "secret"), ("PASSPHRASE", "pass")]);
        let err = Credentials::from_lookup(|k| env.get(k).cloned()).unwrap_err();

        assert!(matches!(err, MarketDataError::ConfigError(ref m) if m.contains("SVC_ACCOUNTID")));
    }

    #[test]
    fn test_empty_value_is_config_error() {
        let env = vars(&[
            ("API_KEY", ""),
            ("SECRET_KEY", "secret"),
            ("PASSPHRASE", "pass"),
            ("SVC_ACCOUNTID", "acct"),
        ]);
        let err = Credentials::from_lookup(|k| env.get(k).cloned()).unwrap_err();

        assert!(matches!(err, MarketDataError::ConfigError(ref m) if m.contains("API_KEY")));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials::new(
            "my_api_key".into(),
            "super_secret_key".into(),
            "hunter2".into(),
            "acct-1".into(),
        );
        let debug_str = format!("{:?}", creds);

        assert!(debug_str.contains("my_api_key"));
        assert!(!debug_str.contains("super_secret_key"));
        assert!(!debug_str.contains("hunter2"));
        assert!(debug_str.contains("[REDACTED]"));
    }
}
