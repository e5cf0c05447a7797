//! Chat delivery through the Telegram Bot API.
//!
//! [`TelegramDelivery`] posts to `{api_base}/bot{token}/sendMessage`. If
//! `TELEGRAM_BOT_TOKEN` is not set, [`TelegramConfig::from_env`] returns
//! `None` and the chat channel is treated as unavailable.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ChatGateway, DeliveryError};

/// Public Bot API endpoint.
const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// HTTP request timeout for a single send.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the Telegram chat channel.
#[derive(Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Base URL of the Bot API, overridable for tests and self-hosted servers.
    pub api_base: String,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl TelegramConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable             | Required | Default                    |
    /// |----------------------|----------|----------------------------|
    /// | `TELEGRAM_BOT_TOKEN` | yes      | (channel disabled)         |
    /// | `TELEGRAM_API_BASE`  | no       | `https://api.telegram.org` |
    pub fn from_env() -> Option<Self> {
        let bot_token = std::env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())?;
        Some(Self {
            bot_token,
            api_base: std::env::var("TELEGRAM_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
        })
    }

    fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.bot_token
        )
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// The subset of the Bot API response envelope we inspect.
#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends chat messages through the Telegram Bot API.
pub struct TelegramDelivery {
    config: TelegramConfig,
    client: reqwest::Client,
}

impl TelegramDelivery {
    pub fn new(config: TelegramConfig) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl ChatGateway for TelegramDelivery {
    async fn send_chat(&self, chat_id: &str, text: &str) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(self.config.send_message_url())
            .json(&SendMessage { chat_id, text })
            .send()
            .await?;

        let status = response.status();
        let body: Option<ApiResponse> = response.json().await.ok();
        match body {
            Some(ApiResponse { ok: true, .. }) if status.is_success() => {
                tracing::debug!(chat_id, "Telegram message sent");
                Ok(())
            }
            other => Err(DeliveryError::Api {
                status: status.as_u16(),
                description: other
                    .and_then(|b| b.description)
                    .unwrap_or_else(|| "no description".to_string()),
            }),
        }
    }
}
