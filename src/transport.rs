//! # Transport Module
//!
//! The chat-platform operations the bot handlers depend on, and the incoming
//! event shapes they consume. [`crate::telegram::TelegramTransport`] is the
//! production implementation.

use std::path::PathBuf;

use async_trait::async_trait;
use teloxide::types::{ChatId, InlineKeyboardMarkup};

use crate::errors::TransportError;
use crate::models::ProductMedia;

/// Binary attachment carried by an incoming message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    Photo { file_id: String },
    Video { file_id: String },
}

/// A text or media message from a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub user_id: i64,
    pub chat_id: ChatId,
    pub text: Option<String>,
    pub attachment: Option<Attachment>,
}

impl IncomingMessage {
    pub fn text(user_id: i64, text: impl Into<String>) -> Self {
        Self {
            user_id,
            chat_id: ChatId(user_id),
            text: Some(text.into()),
            attachment: None,
        }
    }

    pub fn attachment(user_id: i64, attachment: Attachment) -> Self {
        Self {
            user_id,
            chat_id: ChatId(user_id),
            text: None,
            attachment: Some(attachment),
        }
    }
}

/// An inline button press
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackEvent {
    /// Callback query id, needed to answer it
    pub id: String,
    pub user_id: i64,
    pub chat_id: ChatId,
    /// Message carrying the pressed keyboard, if still accessible
    pub message_id: Option<i32>,
    pub data: String,
}

/// Where displayable media comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    Url(String),
    File(PathBuf),
}

/// Media resolved and ready to attach to a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaHandle {
    Photo(MediaSource),
    Video(MediaSource),
}

/// Chat-platform operations used by the handlers
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), TransportError>;

    /// Replace the message that carried the pressed keyboard
    async fn edit_message(
        &self,
        event: &CallbackEvent,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
        media: Option<MediaHandle>,
    ) -> Result<(), TransportError>;

    async fn answer_callback(
        &self,
        event: &CallbackEvent,
        text: Option<&str>,
    ) -> Result<(), TransportError>;

    /// Fetch an attachment and return the stored reference
    async fn download_attachment(&self, attachment: &Attachment) -> Result<String, TransportError>;

    /// Resolve a stored media reference into something sendable
    async fn upload_media(&self, media: &ProductMedia) -> Result<MediaHandle, TransportError>;
}
