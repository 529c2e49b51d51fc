//! Trade advisor backed by a Groq chat-completion model
//!
//! Groq exposes an OpenAI-compatible API, so the request/response shapes
//! are the usual `messages` in, `choices[].message.content` out.

use super::Advisor;
use crate::models::Decision;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SYSTEM_PROMPT: &str = "You are a world expert at crypto trading.";

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("advisor request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("advisor API error {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("advisor response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("advisor response contained no choices")]
    NoChoices,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    #[serde(default)]
    content: Option<String>,
}

pub struct GroqAdvisor {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    /// Asset named in the prompt, e.g. "ETH"
    asset: String,
}

impl GroqAdvisor {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        asset: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            asset: asset.into(),
        }
    }

    pub fn from_settings(client: Client, settings: &crate::Settings) -> Self {
        Self::new(
            client,
            &settings.groq_base_url,
            &settings.groq_api_key,
            &settings.groq_model,
            base_asset(&settings.indicator_pair),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn user_prompt(&self, indicator: f64) -> String {
        format!(
            "The current Relative Strength Index (RSI) for {} is {}. \
             Based on this, decide if you should BUY, SELL or do NOTHING. \
             Respond with one word only: BUY, SELL or NOTHING.",
            self.asset, indicator
        )
    }

    /// Raw text of the first completion choice
    pub async fn reply(&self, indicator: f64) -> Result<String, AdvisorError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: self.user_prompt(indicator),
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(AdvisorError::Status { status, body });
        }

        let chat: ChatResponse = serde_json::from_str(&body)?;
        let choice = chat.choices.into_iter().next().ok_or(AdvisorError::NoChoices)?;

        Ok(choice.message.content.unwrap_or_default())
    }
}

#[async_trait]
impl Advisor for GroqAdvisor {
    async fn advise(&self, indicator: f64) -> Result<Decision, AdvisorError> {
        let reply = self.reply(indicator).await?;
        let decision = Decision::from_reply(&reply);

        tracing::info!(reply = %reply.trim(), %decision, "🧠 AI Decision");
        Ok(decision)
    }
}

/// "ETH/USDT" -> "ETH"
pub fn base_asset(pair: &str) -> &str {
    pair.split('/').next().unwrap_or(pair)
}
