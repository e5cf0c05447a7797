//! External delivery channels.
//!
//! Each gateway attempts exactly one send per call; retries and fallback
//! belong to the [`NotificationDispatcher`](crate::NotificationDispatcher).

pub mod email;
pub mod telegram;

use async_trait::async_trait;

/// Error type for a single delivery attempt.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),

    /// The HTTP request to the chat API failed (network, DNS, timeout).
    /// Built through `From`, which drops the request URL.
    #[error("HTTP request failed: {0}")]
    Request(reqwest::Error),

    /// The chat API answered but refused the message.
    #[error("Telegram API returned HTTP {status}: {description}")]
    Api { status: u16, description: String },
}

/// The Bot API URL embeds the bot token, so it never reaches error text,
/// logs or audit rows.
impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        Self::Request(err.without_url())
    }
}

/// Sends a text message to a chat destination.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    async fn send_chat(&self, chat_id: &str, text: &str) -> Result<(), DeliveryError>;
}

/// Sends a plain-text email.
#[async_trait]
pub trait EmailGateway: Send + Sync {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), DeliveryError>;
}
