pub mod bitget;
pub mod groq;
pub mod signing;
pub mod taapi;

pub use bitget::{BitgetClient, ExchangeBody, ExchangeError, ExchangeResponse};
pub use groq::{AdvisorError, GroqAdvisor};
pub use signing::{sign, SignedRequest};
pub use taapi::{IndicatorError, TaapiClient};

use crate::models::Decision;
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use std::time::Duration;

/// Authenticated access to the exchange REST API.
///
/// `BitgetClient` implements this for real calls; tests substitute a
/// recording fake.
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Send one signed call. HTTP error statuses and unparseable bodies are
    /// returned as `Ok`; only transport failures are `Err`.
    async fn request(
        &self,
        method: Method,
        path: &str,
        payload: Option<&Value>,
    ) -> Result<ExchangeResponse, ExchangeError>;
}

/// Source of the momentum indicator sampled once per cycle
#[async_trait]
pub trait IndicatorSource: Send + Sync {
    async fn fetch_indicator(&self) -> Result<f64, IndicatorError>;
}

/// Advisory model consulted once per cycle
#[async_trait]
pub trait Advisor: Send + Sync {
    async fn advise(&self, indicator: f64) -> Result<Decision, AdvisorError>;
}

/// Shared HTTP client builder so every collaborator gets the same timeout
pub fn http_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder().timeout(timeout).build()
}
