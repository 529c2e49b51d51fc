use super::signing::SignedRequest;
use super::Exchange;
use crate::models::Credentials;
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

// Bitget v2 REST API
// Docs: https://www.bitget.com/api-doc/contract/trade/Place-Order
pub const PLACE_ORDER_PATH: &str = "/api/v2/mix/order/place-order";
const SUCCESS_CODE: &str = "00000";
const LOCALE: &str = "en-US";

#[derive(Debug, Error)]
pub enum ExchangeError {
    /// The call never produced a response (connect, timeout, body read).
    /// The order outcome is unknown.
    #[error("exchange transport error on {method} {path}: {source}")]
    Transport {
        method: Method,
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to encode order payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Response body, parsed when possible
#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeBody {
    Json(Value),
    /// Body that was not valid JSON (including an empty body)
    Raw(String),
}

impl ExchangeBody {
    fn parse(text: String) -> Self {
        match serde_json::from_str(&text) {
            Ok(json) => ExchangeBody::Json(json),
            Err(_) => ExchangeBody::Raw(text),
        }
    }
}

impl fmt::Display for ExchangeBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExchangeBody::Json(json) => match serde_json::to_string_pretty(json) {
                Ok(pretty) => write!(f, "{}", pretty),
                Err(_) => write!(f, "{}", json),
            },
            ExchangeBody::Raw(text) => write!(f, "{{\"error\": {:?}}}", text),
        }
    }
}

/// Status and body of one exchange call
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeResponse {
    pub status: u16,
    pub body: ExchangeBody,
}

impl ExchangeResponse {
    /// Bitget `code` field, if the body was JSON and carried one
    pub fn code(&self) -> Option<&str> {
        match &self.body {
            ExchangeBody::Json(json) => json.get("code").and_then(Value::as_str),
            ExchangeBody::Raw(_) => None,
        }
    }

    /// 2xx with Bitget's success code
    pub fn is_accepted(&self) -> bool {
        (200..300).contains(&self.status) && self.code() == Some(SUCCESS_CODE)
    }
}

/// Signed REST client for Bitget futures
#[derive(Clone)]
pub struct BitgetClient {
    client: Client,
    base_url: String,
    credentials: Credentials,
    paper_trading: bool,
}

impl BitgetClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        credentials: Credentials,
        paper_trading: bool,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            paper_trading,
        }
    }

    pub fn paper_trading(&self) -> bool {
        self.paper_trading
    }

    fn paper_flag(&self) -> &'static str {
        if self.paper_trading {
            "1"
        } else {
            "0"
        }
    }
}

#[async_trait]
impl Exchange for BitgetClient {
    async fn request(
        &self,
        method: Method,
        path: &str,
        payload: Option<&Value>,
    ) -> Result<ExchangeResponse, ExchangeError> {
        let signed = SignedRequest::new(
            method.as_str(),
            path,
            payload,
            &self.credentials.api_secret,
        );
        let url = format!("{}{}", self.base_url, path);

        let transport = |source| ExchangeError::Transport {
            method: method.clone(),
            path: path.to_string(),
            source,
        };

        let response = self
            .client
            .request(method.clone(), &url)
            .header("ACCESS-KEY", &self.credentials.api_key)
            .header("ACCESS-SIGN", &signed.signature)
            .header("ACCESS-PASSPHRASE", &self.credentials.passphrase)
            .header("ACCESS-TIMESTAMP", &signed.timestamp)
            .header("Content-Type", "application/json")
            .header("locale", LOCALE)
            .header("paptrading", self.paper_flag())
            .body(signed.body)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(transport)?;
        let response = ExchangeResponse {
            status,
            body: ExchangeBody::parse(text),
        };

        tracing::info!("➡️ {} {} → {}", method, path, status);
        if response.is_accepted() {
            tracing::info!("{}", response.body);
        } else {
            tracing::warn!("{}", response.body);
        }

        Ok(response)
    }
}
