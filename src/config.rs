use crate::models::Credentials;
use config::{Config, ConfigError, Environment, Map};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_BITGET_BASE_URL: &str = "https://api.bitget.com";
pub const DEFAULT_TAAPI_BASE_URL: &str = "https://api.taapi.io";
pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("{field} must be a positive decimal, got '{value}'")]
    InvalidSize { field: &'static str, value: String },

    #[error("cycle_interval_secs must be greater than zero")]
    ZeroInterval,
}

/// Process-wide configuration, built once at startup and never mutated.
///
/// Every field maps to an upper-case environment variable of the same name
/// (`BITGET_API_KEY` -> `bitget_api_key`).
#[derive(Clone, Deserialize)]
pub struct Settings {
    pub bitget_api_key: String,
    pub bitget_secret: String,
    pub bitget_passphrase: String,
    pub bitget_base_url: String,

    pub groq_api_key: String,
    pub groq_model: String,
    pub groq_base_url: String,

    pub taapi_secret: String,
    pub taapi_base_url: String,
    pub indicator: String,
    pub indicator_exchange: String,
    pub indicator_pair: String,
    pub indicator_interval: String,

    /// Sent as the `paptrading` header on every exchange call
    pub paper_trading: bool,
    pub symbol: String,
    pub open_size: String,
    pub close_size: String,

    pub cycle_interval_secs: u64,
    pub http_timeout_secs: u64,
}

impl Settings {
    /// Load from the process environment (after `.env`, if present)
    pub fn load() -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();
        Self::from_source(None)
    }

    /// Load from an explicit variable map instead of the process environment
    pub fn from_source(source: Option<Map<String, String>>) -> Result<Self, SettingsError> {
        let settings: Settings = Config::builder()
            .set_default("bitget_base_url", DEFAULT_BITGET_BASE_URL)?
            .set_default("groq_model", DEFAULT_GROQ_MODEL)?
            .set_default("groq_base_url", DEFAULT_GROQ_BASE_URL)?
            .set_default("taapi_base_url", DEFAULT_TAAPI_BASE_URL)?
            .set_default("indicator", "rsi")?
            .set_default("indicator_exchange", "binance")?
            .set_default("indicator_pair", "ETH/USDT")?
            .set_default("indicator_interval", "5m")?
            .set_default("paper_trading", true)?
            .set_default("symbol", "ETHUSDT")?
            .set_default("open_size", "0.05")?
            .set_default("close_size", "1000")?
            .set_default("cycle_interval_secs", 300_i64)?
            .set_default("http_timeout_secs", 30_i64)?
            .add_source(Environment::default().source(source))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        check_size("open_size", &self.open_size)?;
        check_size("close_size", &self.close_size)?;

        if self.cycle_interval_secs == 0 {
            return Err(SettingsError::ZeroInterval);
        }

        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            api_key: self.bitget_api_key.clone(),
            api_secret: self.bitget_secret.clone(),
            passphrase: self.bitget_passphrase.clone(),
        }
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.cycle_interval_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("credentials", &self.credentials())
            .field("bitget_base_url", &self.bitget_base_url)
            .field("groq_model", &self.groq_model)
            .field("groq_base_url", &self.groq_base_url)
            .field("taapi_base_url", &self.taapi_base_url)
            .field("indicator", &self.indicator)
            .field("indicator_pair", &self.indicator_pair)
            .field("indicator_interval", &self.indicator_interval)
            .field("paper_trading", &self.paper_trading)
            .field("symbol", &self.symbol)
            .field("open_size", &self.open_size)
            .field("close_size", &self.close_size)
            .field("cycle_interval_secs", &self.cycle_interval_secs)
            .finish_non_exhaustive()
    }
}

fn check_size(field: &'static str, value: &str) -> Result<(), SettingsError> {
    match Decimal::from_str(value.trim()) {
        Ok(size) if size > Decimal::ZERO => Ok(()),
        _ => Err(SettingsError::InvalidSize {
            field,
            value: value.to_string(),
        }),
    }
}
