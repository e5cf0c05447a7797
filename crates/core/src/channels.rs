//! Well-known notification channel name constants.
//!
//! These must match the values stored in `notification_logs.channel`.

/// Chat message delivered through the Telegram Bot API.
pub const CHANNEL_TELEGRAM: &str = "telegram";

/// Email delivered via SMTP.
pub const CHANNEL_EMAIL: &str = "email";

/// No channel could be attempted (recipient had no usable contact or no
/// gateway was configured).
pub const CHANNEL_NONE: &str = "none";
