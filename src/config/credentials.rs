use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, Result};

pub const API_KEY_VAR: &str = "OANDA_API_KEY";
pub const ACCOUNT_ID_VAR: &str = "OANDA_ACCOUNT_ID";
pub const ENVIRONMENT_VAR: &str = "OANDA_ENVIRONMENT";

const PRACTICE_URL: &str = "https://api-fxpractice.oanda.com";
const LIVE_URL: &str = "https://api-fxtrade.oanda.com";

/// Broker deployment the API key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OandaEnvironment {
    #[default]
    Practice,
    Live,
}

impl OandaEnvironment {
    pub fn base_url(self) -> &'static str {
        match self {
            OandaEnvironment::Practice => PRACTICE_URL,
            OandaEnvironment::Live => LIVE_URL,
        }
    }
}

impl FromStr for OandaEnvironment {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "practice" | "demo" => Ok(OandaEnvironment::Practice),
            "live" | "trade" => Ok(OandaEnvironment::Live),
            other => Err(AppError::message(format!(
                "unknown OANDA environment `{other}` (expected `practice` or `live`)"
            ))),
        }
    }
}

/// API credentials handed to the broker client at construction time.
#[derive(Clone)]
pub struct OandaCredentials {
    pub api_key: String,
    pub account_id: Option<String>,
    pub environment: OandaEnvironment,
}

impl OandaCredentials {
    pub fn new<K: Into<String>>(api_key: K, environment: OandaEnvironment) -> Self {
        Self {
            api_key: clean_secret(&api_key.into()),
            account_id: None,
            environment,
        }
    }

    /// Read credentials from `OANDA_API_KEY`, `OANDA_ACCOUNT_ID` and `OANDA_ENVIRONMENT`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .map(|value| clean_secret(&value))
            .filter(|value| !value.is_empty())
            .ok_or(AppError::MissingCredential(API_KEY_VAR))?;

        let account_id = lookup(ACCOUNT_ID_VAR)
            .map(|value| clean_secret(&value))
            .filter(|value| !value.is_empty());

        let environment = match lookup(ENVIRONMENT_VAR) {
            Some(value) if !value.trim().is_empty() => value.parse()?,
            _ => OandaEnvironment::default(),
        };

        Ok(Self {
            api_key,
            account_id,
            environment,
        })
    }
}

// Keys pasted from dashboards often keep their surrounding quotes.
fn clean_secret(value: &str) -> String {
    value.replace('\'', "").trim().to_string()
}

impl fmt::Debug for OandaCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OandaCredentials")
            .field("account_id", &self.account_id)
            .field("environment", &self.environment)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn strips_quotes_from_api_key() {
        let creds =
            OandaCredentials::from_lookup(lookup_from(&[(API_KEY_VAR, "'abc-123'")])).unwrap();
        assert_eq!(creds.api_key, "abc-123");
        assert_eq!(creds.environment, OandaEnvironment::Practice);
        assert!(creds.account_id.is_none());
    }

    #[test]
    fn missing_key_is_reported() {
        let err = OandaCredentials::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, AppError::MissingCredential(API_KEY_VAR)));
    }

    #[test]
    fn reads_environment_and_account() {
        let creds = OandaCredentials::from_lookup(lookup_from(&[
            (API_KEY_VAR, "k"),
            (ACCOUNT_ID_VAR, "001-001-1-001"),
            (ENVIRONMENT_VAR, "live"),
        ]))
        .unwrap();
        assert_eq!(creds.environment.base_url(), LIVE_URL);
        assert_eq!(creds.account_id.as_deref(), Some("001-001-1-001"));
    }

    #[test]
    fn debug_output_hides_key() {
        let creds = OandaCredentials::new("secret-key", OandaEnvironment::Practice);
        assert!(!format!("{creds:?}").contains("secret-key"));
    }
}
