//! # Telegram Module
//!
//! Production [`Transport`] on top of teloxide, plus the dispatcher schema
//! that turns Telegram updates into [`IncomingMessage`] and [`CallbackEvent`]
//! values for the bot handlers.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{
    CallbackQuery, CallbackQueryId, ChatId, FileId, InlineKeyboardMarkup, InputFile, Message,
    MessageId,
};
use teloxide::{ApiError, RequestError};
use tracing::{debug, error, info, warn};

use crate::bot::{callback_handler, message_handler, BotContext};
use crate::errors::TransportError;
use crate::models::ProductMedia;
use crate::transport::{
    Attachment, CallbackEvent, IncomingMessage, MediaHandle, MediaSource, Transport,
};

/// Telegram Bot API transport
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
    media_dir: PathBuf,
}

impl TelegramTransport {
    pub fn new(bot: Bot, media_dir: impl Into<PathBuf>) -> Self {
        Self {
            bot,
            media_dir: media_dir.into(),
        }
    }

    async fn send_media(
        &self,
        chat_id: ChatId,
        caption: &str,
        keyboard: Option<InlineKeyboardMarkup>,
        media: MediaHandle,
    ) -> Result<(), TransportError> {
        match media {
            MediaHandle::Photo(source) => {
                let mut request = self
                    .bot
                    .send_photo(chat_id, input_file(source)?)
                    .caption(caption);
                if let Some(keyboard) = keyboard {
                    request = request.reply_markup(keyboard);
                }
                request.await?;
            }
            MediaHandle::Video(source) => {
                let mut request = self
                    .bot
                    .send_video(chat_id, input_file(source)?)
                    .caption(caption);
                if let Some(keyboard) = keyboard {
                    request = request.reply_markup(keyboard);
                }
                request.await?;
            }
        }
        Ok(())
    }
}

fn input_file(source: MediaSource) -> Result<InputFile, TransportError> {
    match source {
        MediaSource::Url(url) => reqwest::Url::parse(&url)
            .map(InputFile::url)
            .map_err(|e| TransportError::MediaUnavailable(format!("{url}: {e}"))),
        MediaSource::File(path) => Ok(InputFile::file(path)),
    }
}

/// GET `url`, dropping the URL from any error since file URLs embed the bot token
async fn fetch_bytes(url: &str) -> Result<Vec<u8>, TransportError> {
    let fetch = async {
        let response = reqwest::get(url).await?.error_for_status()?;
        response.bytes().await
    };
    match fetch.await {
        Ok(bytes) => Ok(bytes.to_vec()),
        Err(e) => Err(TransportError::Download(e.without_url())),
    }
}

fn is_remote(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), TransportError> {
        let mut request = self.bot.send_message(chat_id, text);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(keyboard);
        }
        request.await?;
        Ok(())
    }

    async fn edit_message(
        &self,
        event: &CallbackEvent,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
        media: Option<MediaHandle>,
    ) -> Result<(), TransportError> {
        let Some(message_id) = event.message_id.map(MessageId) else {
            return match media {
                Some(media) => self.send_media(event.chat_id, text, keyboard, media).await,
                None => self.send_message(event.chat_id, text, keyboard).await,
            };
        };

        // A text message cannot be turned into a photo or video
        if let Some(media) = media {
            if let Err(e) = self.bot.delete_message(event.chat_id, message_id).await {
                debug!(chat_id = %event.chat_id, error = %e, "Could not delete menu message");
            }
            return self.send_media(event.chat_id, text, keyboard, media).await;
        }

        let mut request = self.bot.edit_message_text(event.chat_id, message_id, text);
        if let Some(keyboard) = keyboard.clone() {
            request = request.reply_markup(keyboard);
        }
        match request.await {
            Ok(_) | Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
            Err(e) => {
                // Media messages have no text to edit
                debug!(chat_id = %event.chat_id, error = %e, "Edit failed, sending a new message");
                self.send_message(event.chat_id, text, keyboard).await
            }
        }
    }

    async fn answer_callback(
        &self,
        event: &CallbackEvent,
        text: Option<&str>,
    ) -> Result<(), TransportError> {
        let mut request = self
            .bot
            .answer_callback_query(CallbackQueryId(event.id.clone()));
        if let Some(text) = text {
            request = request.text(text);
        }
        request.await?;
        Ok(())
    }

    async fn download_attachment(&self, attachment: &Attachment) -> Result<String, TransportError> {
        let (file_id, suffix) = match attachment {
            Attachment::Photo { file_id } => (file_id, ".jpg"),
            Attachment::Video { file_id } => (file_id, ".mp4"),
        };

        let file = self.bot.get_file(FileId(file_id.clone())).await?;
        let url = format!(
            "https://api.telegram.org/file/bot{}/{}",
            self.bot.token(),
            file.path
        );
        let bytes = fetch_bytes(&url).await?;

        tokio::fs::create_dir_all(&self.media_dir).await?;
        let mut stored = tempfile::Builder::new()
            .prefix("product_")
            .suffix(suffix)
            .tempfile_in(&self.media_dir)?;
        stored.as_file_mut().write_all(&bytes)?;
        let (_, path) = stored.keep().map_err(|e| TransportError::Io(e.error))?;

        let reference = path.to_string_lossy().into_owned();
        info!(path = %reference, size = bytes.len(), "Media downloaded");
        Ok(reference)
    }

    async fn upload_media(&self, media: &ProductMedia) -> Result<MediaHandle, TransportError> {
        let reference = media.reference();
        let source = if is_remote(reference) {
            MediaSource::Url(reference.to_string())
        } else if Path::new(reference).is_file() {
            MediaSource::File(PathBuf::from(reference))
        } else {
            return Err(TransportError::MediaUnavailable(reference.to_string()));
        };

        Ok(match media {
            ProductMedia::Image(_) => MediaHandle::Photo(source),
            ProductMedia::Video(_) => MediaHandle::Video(source),
        })
    }
}

/// Text and media of a user message, `None` for updates without a sender
pub fn incoming_message(msg: Message) -> Option<IncomingMessage> {
    let user_id = msg.from.as_ref()?.id.0 as i64;
    let attachment = if let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) {
        Some(Attachment::Photo {
            file_id: photo.file.id.0.clone(),
        })
    } else {
        msg.video().map(|video| Attachment::Video {
            file_id: video.file.id.0.clone(),
        })
    };

    Some(IncomingMessage {
        user_id,
        chat_id: msg.chat.id,
        text: msg.text().map(str::to_string),
        attachment,
    })
}

/// Button press with its data, `None` when the query carries no data
pub fn callback_event(query: CallbackQuery) -> Option<CallbackEvent> {
    let data = query.data?;
    let user_id = query.from.id.0 as i64;
    let (chat_id, message_id) = match &query.message {
        Some(message) => (message.chat().id, Some(message.id().0)),
        None => (ChatId(user_id), None),
    };

    Some(CallbackEvent {
        id: query.id.0,
        user_id,
        chat_id,
        message_id,
        data,
    })
}

async fn on_message(ctx: Arc<BotContext>, msg: IncomingMessage) -> Result<()> {
    let user_id = msg.user_id;
    if let Err(e) = message_handler(ctx, msg).await {
        error!(user_id, error = ?e, "Message handler failed");
    }
    Ok(())
}

async fn on_callback(ctx: Arc<BotContext>, event: CallbackEvent) -> Result<()> {
    let user_id = event.user_id;
    if let Err(e) = callback_handler(ctx, event).await {
        error!(user_id, error = ?e, "Callback handler failed");
    }
    Ok(())
}

/// Update routing: messages and button presses
pub fn build_schema() -> UpdateHandler<anyhow::Error> {
    let message_branch = Update::filter_message()
        .filter_map(incoming_message)
        .endpoint(on_message);

    let callback_branch = Update::filter_callback_query()
        .filter_map(callback_event)
        .endpoint(on_callback);

    dptree::entry()
        .branch(message_branch)
        .branch(callback_branch)
}

/// Dispatch updates until interrupted
pub async fn run(bot: Bot, ctx: Arc<BotContext>) {
    info!("Bot initialized, starting dispatcher");

    Dispatcher::builder(bot, build_schema())
        .dependencies(dptree::deps![ctx])
        .default_handler(|update| async move {
            warn!(update_id = ?update.id, "Unhandled update");
        })
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
