//! Notification dispatcher: chat first, email as fallback.
//!
//! ```text
//!   chat id + chat gateway?  --ok-->  Delivered(telegram)
//!          | missing / failed
//!          v
//!   email + email gateway?   --ok-->  Delivered(email)
//!          | missing / failed
//!          v
//!   Failed(last channel tried)  or  Unreachable(none)
//! ```
//!
//! Each channel is attempted at most once per call. Whatever the terminal
//! state, exactly one row is written to the audit sink. Intermediate
//! failures only appear in the `error` text of a failed row.

use std::sync::Arc;

use serde::Serialize;
use tiketon_core::channels::{CHANNEL_EMAIL, CHANNEL_NONE, CHANNEL_TELEGRAM};
use tiketon_core::error::CoreError;
use tiketon_core::types::DbId;
use tiketon_db::models::notification_log::CreateNotificationLog;
use tiketon_db::DbPool;

use crate::audit::{AuditSink, PgAuditSink};
use crate::delivery::email::{EmailConfig, EmailDelivery};
use crate::delivery::telegram::{TelegramConfig, TelegramDelivery};
use crate::delivery::{ChatGateway, DeliveryError, EmailGateway};

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// Who a notification is for. Either contact may be missing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Recipient {
    pub display_name: String,
    pub email: Option<String>,
    pub chat_id: Option<String>,
}

impl Recipient {
    fn chat_id(&self) -> Option<&str> {
        non_blank(self.chat_id.as_deref())
    }

    fn email(&self) -> Option<&str> {
        non_blank(self.email.as_deref())
    }

    /// Best address to record when nothing could be attempted.
    fn fallback_address(&self) -> String {
        self.chat_id()
            .or(self.email())
            .unwrap_or(&self.display_name)
            .to_string()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// The message itself. Chat delivery sends `body` only; email uses both.
#[derive(Debug, Clone, Serialize)]
pub struct OutgoingMessage {
    pub subject: String,
    pub body: String,
    pub is_test: bool,
}

impl OutgoingMessage {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            is_test: false,
        }
    }

    pub fn test(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            is_test: true,
            ..Self::new(subject, body)
        }
    }
}

/// A successful delivery.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryReceipt {
    pub channel: &'static str,
    pub address: String,
    /// Id of the audit row, if it could be written.
    pub log_id: Option<DbId>,
}

/// A notification that could not be delivered.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DispatchError {
    /// No channel could even be attempted: the recipient has no usable
    /// contact, or the matching gateway is not configured.
    #[error("No usable channel for {recipient}: {reason}")]
    Unreachable { recipient: String, reason: String },

    /// Every attempted channel failed.
    #[error("Delivery to {address} failed: {reason}")]
    Failed {
        channel: &'static str,
        address: String,
        reason: String,
    },
}

impl From<DispatchError> for CoreError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Unreachable { reason, .. } => CoreError::ConfigurationMissing(reason),
            DispatchError::Failed {
                channel, reason, ..
            } => CoreError::DeliveryFailure { channel, reason },
        }
    }
}

/// Which gateways are configured.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ChannelStatus {
    pub telegram: bool,
    pub email: bool,
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Terminal state of one dispatch.
enum Outcome {
    Delivered {
        channel: &'static str,
        address: String,
    },
    Failed {
        channel: &'static str,
        address: String,
        reasons: Vec<String>,
    },
    Unreachable {
        reasons: Vec<String>,
    },
}

/// Delivers messages with chat-to-email fallback and audit logging.
#[derive(Clone)]
pub struct NotificationDispatcher {
    chat: Option<Arc<dyn ChatGateway>>,
    email: Option<Arc<dyn EmailGateway>>,
    audit: Arc<dyn AuditSink>,
}

impl NotificationDispatcher {
    pub fn new(
        chat: Option<Arc<dyn ChatGateway>>,
        email: Option<Arc<dyn EmailGateway>>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self { chat, email, audit }
    }

    /// Build a dispatcher from `TELEGRAM_*` / `SMTP_*` environment variables,
    /// logging to `notification_logs`. Missing configuration disables the
    /// corresponding channel.
    pub fn from_env(pool: DbPool) -> Result<Self, DeliveryError> {
        let chat: Option<Arc<dyn ChatGateway>> = match TelegramConfig::from_env() {
            Some(config) => Some(Arc::new(TelegramDelivery::new(config)?)),
            None => None,
        };
        let email: Option<Arc<dyn EmailGateway>> = EmailConfig::from_env()
            .map(|config| Arc::new(EmailDelivery::new(config)) as Arc<dyn EmailGateway>);

        let dispatcher = Self::new(chat, email, Arc::new(PgAuditSink::new(pool)));
        let status = dispatcher.channels();
        if !status.telegram && !status.email {
            tracing::warn!("No notification channel configured; every dispatch will fail");
        } else {
            tracing::info!(telegram = status.telegram, email = status.email, "Notification channels");
        }
        Ok(dispatcher)
    }

    pub fn channels(&self) -> ChannelStatus {
        ChannelStatus {
            telegram: self.chat.is_some(),
            email: self.email.is_some(),
        }
    }

    /// Deliver `message` to `recipient` and record the outcome.
    pub async fn send(
        &self,
        recipient: &Recipient,
        message: &OutgoingMessage,
    ) -> Result<DeliveryReceipt, DispatchError> {
        let outcome = self.attempt(recipient, message).await;
        let log_id = self.record(recipient, message, &outcome).await;

        match outcome {
            Outcome::Delivered { channel, address } => Ok(DeliveryReceipt {
                channel,
                address,
                log_id,
            }),
            Outcome::Failed {
                channel,
                address,
                reasons,
            } => Err(DispatchError::Failed {
                channel,
                address,
                reason: reasons.join("; "),
            }),
            Outcome::Unreachable { reasons } => Err(DispatchError::Unreachable {
                recipient: recipient.display_name.clone(),
                reason: reasons.join("; "),
            }),
        }
    }

    async fn attempt(&self, recipient: &Recipient, message: &OutgoingMessage) -> Outcome {
        let mut reasons = Vec::new();
        let mut last_tried: Option<(&'static str, String)> = None;

        match (recipient.chat_id(), &self.chat) {
            (Some(chat_id), Some(chat)) => match chat.send_chat(chat_id, &message.body).await {
                Ok(()) => {
                    tracing::info!(channel = CHANNEL_TELEGRAM, recipient = chat_id, "Notification delivered");
                    return Outcome::Delivered {
                        channel: CHANNEL_TELEGRAM,
                        address: chat_id.to_string(),
                    };
                }
                Err(e) => {
                    tracing::warn!(
                        channel = CHANNEL_TELEGRAM,
                        recipient = chat_id,
                        error = %e,
                        "Chat delivery failed, falling back to email"
                    );
                    reasons.push(format!("{CHANNEL_TELEGRAM}: {e}"));
                    last_tried = Some((CHANNEL_TELEGRAM, chat_id.to_string()));
                }
            },
            (Some(_), None) => reasons.push(format!("{CHANNEL_TELEGRAM}: gateway not configured")),
            (None, _) => reasons.push(format!("{CHANNEL_TELEGRAM}: no chat id")),
        }

        match (recipient.email(), &self.email) {
            (Some(address), Some(email)) => {
                match email.send_email(address, &message.subject, &message.body).await {
                    Ok(()) => {
                        tracing::info!(channel = CHANNEL_EMAIL, recipient = address, "Notification delivered");
                        return Outcome::Delivered {
                            channel: CHANNEL_EMAIL,
                            address: address.to_string(),
                        };
                    }
                    Err(e) => {
                        tracing::error!(
                            channel = CHANNEL_EMAIL,
                            recipient = address,
                            error = %e,
                            "Email delivery failed"
                        );
                        reasons.push(format!("{CHANNEL_EMAIL}: {e}"));
                        last_tried = Some((CHANNEL_EMAIL, address.to_string()));
                    }
                }
            }
            (Some(_), None) => reasons.push(format!("{CHANNEL_EMAIL}: gateway not configured")),
            (None, _) => reasons.push(format!("{CHANNEL_EMAIL}: no email address")),
        }

        match last_tried {
            Some((channel, address)) => Outcome::Failed {
                channel,
                address,
                reasons,
            },
            None => {
                tracing::warn!(recipient = %recipient.display_name, "No usable notification channel");
                Outcome::Unreachable { reasons }
            }
        }
    }

    /// Write the single audit row for this dispatch. A failing sink is
    /// logged but does not change the delivery result.
    async fn record(
        &self,
        recipient: &Recipient,
        message: &OutgoingMessage,
        outcome: &Outcome,
    ) -> Option<DbId> {
        let (channel, address, delivered, error) = match outcome {
            Outcome::Delivered { channel, address } => (*channel, address.clone(), true, None),
            Outcome::Failed {
                channel,
                address,
                reasons,
            } => (*channel, address.clone(), false, Some(reasons.join("; "))),
            Outcome::Unreachable { reasons } => (
                CHANNEL_NONE,
                recipient.fallback_address(),
                false,
                Some(reasons.join("; ")),
            ),
        };

        let entry = CreateNotificationLog {
            recipient: address,
            recipient_email: recipient.email().map(str::to_string),
            recipient_telegram_id: recipient.chat_id().map(str::to_string),
            channel: channel.to_string(),
            subject: message.subject.clone(),
            message: message.body.clone(),
            is_test: message.is_test,
            delivered,
            error,
        };

        match self.audit.record(entry).await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::error!(error = %e, channel, "Failed to write notification log");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
