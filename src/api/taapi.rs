use super::IndicatorSource;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndicatorError {
    #[error("indicator request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("indicator endpoint returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("indicator response was not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("indicator response has no 'value' field")]
    MissingValue,

    #[error("indicator value is not a number: {0:?}")]
    NotNumeric(String),
}

#[derive(Debug, Deserialize)]
struct IndicatorResponse {
    #[serde(default)]
    value: Option<RawValue>,
}

/// taapi normally sends a number, but a numeric string is accepted too
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawValue {
    Number(f64),
    Text(String),
}

impl RawValue {
    fn into_f64(self) -> Result<f64, IndicatorError> {
        match self {
            RawValue::Number(value) => Ok(value),
            RawValue::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| IndicatorError::NotNumeric(text)),
        }
    }
}

/// Client for a single indicator on taapi.io
///
/// Instrument and interval are fixed at construction, so every call asks
/// for the same series.
#[derive(Clone)]
pub struct TaapiClient {
    client: Client,
    base_url: String,
    indicator: String,
    secret: String,
    exchange: String,
    symbol: String,
    interval: String,
}

impl TaapiClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        indicator: impl Into<String>,
        secret: impl Into<String>,
        exchange: impl Into<String>,
        symbol: impl Into<String>,
        interval: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            indicator: indicator.into(),
            secret: secret.into(),
            exchange: exchange.into(),
            symbol: symbol.into(),
            interval: interval.into(),
        }
    }

    pub fn from_settings(client: Client, settings: &crate::Settings) -> Self {
        Self::new(
            client,
            &settings.taapi_base_url,
            &settings.indicator,
            &settings.taapi_secret,
            &settings.indicator_exchange,
            &settings.indicator_pair,
            &settings.indicator_interval,
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/{}", self.base_url, self.indicator)
    }
}

#[async_trait]
impl IndicatorSource for TaapiClient {
    async fn fetch_indicator(&self) -> Result<f64, IndicatorError> {
        tracing::debug!(
            indicator = %self.indicator,
            symbol = %self.symbol,
            interval = %self.interval,
            "Fetching indicator"
        );

        let response = self
            .client
            .get(self.endpoint())
            .query(&[
                ("secret", self.secret.as_str()),
                ("exchange", self.exchange.as_str()),
                ("symbol", self.symbol.as_str()),
                ("interval", self.interval.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            return Err(IndicatorError::Status { status, body });
        }

        let parsed: IndicatorResponse = serde_json::from_str(&body)?;
        parsed.value.ok_or(IndicatorError::MissingValue)?.into_f64()
    }
}
