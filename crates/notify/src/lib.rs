//! Tiketon notification delivery.
//!
//! - [`delivery`] -- the chat (Telegram Bot API) and email (SMTP) gateways
//!   behind the [`ChatGateway`] and [`EmailGateway`] traits.
//! - [`NotificationDispatcher`] -- chat first, email as fallback, and exactly
//!   one audit row per logical notification.
//! - [`PgAuditSink`] -- writes those rows to `notification_logs`.

pub mod audit;
pub mod delivery;
pub mod dispatcher;

pub use audit::{AuditSink, PgAuditSink};
pub use delivery::email::{EmailConfig, EmailDelivery};
pub use delivery::telegram::{TelegramConfig, TelegramDelivery};
pub use delivery::{ChatGateway, DeliveryError, EmailGateway};
pub use dispatcher::{
    ChannelStatus, DeliveryReceipt, DispatchError, NotificationDispatcher, OutgoingMessage, Recipient,
};
