//! # Error Types Module
//!
//! Structured errors for the storefront bot. Handler functions return
//! `anyhow::Result`, these enums describe the failure modes that are
//! recovered locally (re-prompt, notice, retry-or-skip) instead of bubbling up.

use thiserror::Error;

/// Malformed input at a conversation step. Always answered with a re-prompt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Phone number must start with `+` and have at least 10 characters
    #[error("invalid phone number format")]
    PhoneFormat,
    /// Submitted code does not match the one issued
    #[error("one-time code mismatch")]
    OtpMismatch,
    /// Price is not a non-negative number
    #[error("invalid price: {0}")]
    Price(String),
    /// Product id is not an integer
    #[error("invalid product id: {0}")]
    ProductId(String),
    /// Field name is not one of the editable product fields
    #[error("unknown product field: {0}")]
    UnknownField(String),
}

/// Rejected menu access. Reported to the user and logged, never mutates state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("user has not verified a phone number")]
    NotVerified,
    #[error("user is not the administrator")]
    NotAdmin,
}

/// Failures of the chat transport (message delivery, media transfer)
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("telegram request failed: {0}")]
    Request(#[from] teloxide::RequestError),
    /// Carries no URL, file URLs contain the bot token
    #[error("media download failed: {0}")]
    Download(reqwest::Error),
    #[error("media file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("media unavailable: {0}")]
    MediaUnavailable(String),
}

/// Failures of the conversation state backend
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("conversation storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Start-up configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("ADMIN_ID must be a valid integer, got {0:?}")]
    InvalidAdminId(String),
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}
