//! Shared harness for the bot tests: an in-memory shop and a transport fake
//! that records everything the bot sends.
#![allow(dead_code)]

use std::collections::HashSet;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use sqlx::SqlitePool;
use teloxide::types::{ChatId, InlineKeyboardButtonKind, InlineKeyboardMarkup};

use storefront::bot::{callback_handler, message_handler, BotContext};
use storefront::config::ShopSettings;
use storefront::conversation_store::ConversationStore;
use storefront::db::{self, ShopStore, SqliteShopStore};
use storefront::dialogue::Flow;
use storefront::errors::TransportError;
use storefront::models::{NewProduct, ProductMedia};
use storefront::transport::{
    Attachment, CallbackEvent, IncomingMessage, MediaHandle, MediaSource, Transport,
};

pub const ADMIN_ID: i64 = 1000;

/// Something the bot sent through the transport
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    Sent {
        chat_id: i64,
        text: String,
        buttons: Vec<String>,
    },
    Edited {
        chat_id: i64,
        text: String,
        buttons: Vec<String>,
        media: Option<MediaHandle>,
    },
    Answered {
        user_id: i64,
        text: Option<String>,
    },
}

/// Callback data of every button, row by row
pub fn button_data(keyboard: &Option<InlineKeyboardMarkup>) -> Vec<String> {
    keyboard
        .iter()
        .flat_map(|markup| markup.inline_keyboard.iter().flatten())
        .filter_map(|button| match &button.kind {
            InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
            _ => None,
        })
        .collect()
}

#[derive(Default)]
pub struct RecordingTransport {
    outgoing: Mutex<Vec<Outgoing>>,
    unreachable: Mutex<HashSet<i64>>,
    fail_downloads: AtomicBool,
    downloads: AtomicUsize,
}

impl RecordingTransport {
    pub fn fail_recipient(&self, user_id: i64) {
        self.unreachable.lock().unwrap().insert(user_id);
    }

    pub fn fail_downloads(&self, fail: bool) {
        self.fail_downloads.store(fail, Ordering::SeqCst);
    }

    pub fn outgoing(&self) -> Vec<Outgoing> {
        self.outgoing.lock().unwrap().clone()
    }

    pub fn reset(&self) {
        self.outgoing.lock().unwrap().clear();
    }

    /// Texts sent as new messages to `chat_id`
    pub fn sent_to(&self, chat_id: i64) -> Vec<String> {
        self.outgoing()
            .into_iter()
            .filter_map(|out| match out {
                Outgoing::Sent { chat_id: id, text, .. } if id == chat_id => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Latest text shown in `chat_id`, sent or edited
    pub fn last_text(&self, chat_id: i64) -> Option<String> {
        self.outgoing().into_iter().rev().find_map(|out| match out {
            Outgoing::Sent { chat_id: id, text, .. } | Outgoing::Edited { chat_id: id, text, .. }
                if id == chat_id =>
            {
                Some(text)
            }
            _ => None,
        })
    }

    /// Buttons of the latest message shown in `chat_id`
    pub fn last_buttons(&self, chat_id: i64) -> Vec<String> {
        self.outgoing()
            .into_iter()
            .rev()
            .find_map(|out| match out {
                Outgoing::Sent {
                    chat_id: id,
                    buttons,
                    ..
                }
                | Outgoing::Edited {
                    chat_id: id,
                    buttons,
                    ..
                } if id == chat_id => Some(buttons),
                _ => None,
            })
            .unwrap_or_default()
    }

    pub fn last_edit(&self, chat_id: i64) -> Option<Outgoing> {
        self.outgoing()
            .into_iter()
            .rev()
            .find(|out| matches!(out, Outgoing::Edited { chat_id: id, .. } if *id == chat_id))
    }

    /// Callback answers given to `user_id`, in order
    pub fn answers(&self, user_id: i64) -> Vec<Option<String>> {
        self.outgoing()
            .into_iter()
            .filter_map(|out| match out {
                Outgoing::Answered { user_id: id, text } if id == user_id => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record(&self, out: Outgoing) {
        self.outgoing.lock().unwrap().push(out);
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), TransportError> {
        if self.unreachable.lock().unwrap().contains(&chat_id.0) {
            return Err(TransportError::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                format!("chat {} unreachable", chat_id.0),
            )));
        }
        self.record(Outgoing::Sent {
            chat_id: chat_id.0,
            text: text.to_string(),
            buttons: button_data(&keyboard),
        });
        Ok(())
    }

    async fn edit_message(
        &self,
        event: &CallbackEvent,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
        media: Option<MediaHandle>,
    ) -> Result<(), TransportError> {
        self.record(Outgoing::Edited {
            chat_id: event.chat_id.0,
            text: text.to_string(),
            buttons: button_data(&keyboard),
            media,
        });
        Ok(())
    }

    async fn answer_callback(
        &self,
        event: &CallbackEvent,
        text: Option<&str>,
    ) -> Result<(), TransportError> {
        self.record(Outgoing::Answered {
            user_id: event.user_id,
            text: text.map(str::to_string),
        });
        Ok(())
    }

    async fn download_attachment(&self, attachment: &Attachment) -> Result<String, TransportError> {
        if self.fail_downloads.load(Ordering::SeqCst) {
            return Err(TransportError::MediaUnavailable("download refused".to_string()));
        }
        self.downloads.fetch_add(1, Ordering::SeqCst);
        Ok(match attachment {
            Attachment::Photo { file_id } => format!("media/{file_id}.jpg"),
            Attachment::Video { file_id } => format!("media/{file_id}.mp4"),
        })
    }

    async fn upload_media(&self, media: &ProductMedia) -> Result<MediaHandle, TransportError> {
        let reference = media.reference();
        let source = if reference.starts_with("http://") || reference.starts_with("https://") {
            MediaSource::Url(reference.to_string())
        } else {
            MediaSource::File(PathBuf::from(reference))
        };
        Ok(match media {
            ProductMedia::Image(_) => MediaHandle::Photo(source),
            ProductMedia::Video(_) => MediaHandle::Video(source),
        })
    }
}

/// Bot wired to an in-memory database and a recording transport
pub struct TestBot {
    pub ctx: Arc<BotContext>,
    pub transport: Arc<RecordingTransport>,
    pub pool: SqlitePool,
    callbacks: AtomicUsize,
}

impl TestBot {
    pub async fn new() -> Result<Self> {
        let pool = db::connect_in_memory().await?;
        db::init_database_schema(&pool).await?;

        let transport = Arc::new(RecordingTransport::default());
        let ctx = Arc::new(BotContext::new(
            Arc::new(SqliteShopStore::new(pool.clone())),
            transport.clone(),
            ConversationStore::in_memory(),
            ShopSettings::new(ADMIN_ID),
        ));

        Ok(Self {
            ctx,
            transport,
            pool,
            callbacks: AtomicUsize::new(0),
        })
    }

    pub fn store(&self) -> &dyn ShopStore {
        self.ctx.store.as_ref()
    }

    pub async fn send_text(&self, user_id: i64, text: &str) -> Result<()> {
        message_handler(self.ctx.clone(), IncomingMessage::text(user_id, text)).await
    }

    pub async fn send_photo(&self, user_id: i64, file_id: &str) -> Result<()> {
        let attachment = Attachment::Photo {
            file_id: file_id.to_string(),
        };
        message_handler(self.ctx.clone(), IncomingMessage::attachment(user_id, attachment)).await
    }

    pub async fn send_video(&self, user_id: i64, file_id: &str) -> Result<()> {
        let attachment = Attachment::Video {
            file_id: file_id.to_string(),
        };
        message_handler(self.ctx.clone(), IncomingMessage::attachment(user_id, attachment)).await
    }

    pub async fn press(&self, user_id: i64, data: &str) -> Result<()> {
        let n = self.callbacks.fetch_add(1, Ordering::SeqCst);
        let event = CallbackEvent {
            id: format!("cb-{n}"),
            user_id,
            chat_id: ChatId(user_id),
            message_id: Some(1),
            data: data.to_string(),
        };
        callback_handler(self.ctx.clone(), event).await
    }

    pub async fn flow(&self, user_id: i64) -> Result<Option<Flow>> {
        Ok(self.ctx.conversations.lock(user_id).await.get().await?)
    }

    pub async fn set_flow(&self, user_id: i64, flow: Flow) -> Result<()> {
        self.ctx.conversations.lock(user_id).await.set(flow).await?;
        Ok(())
    }

    /// Register a user who already completed verification
    pub async fn verified_user(&self, user_id: i64) -> Result<()> {
        self.store().upsert_user(user_id, "+998901234567").await?;
        self.store().verify_user(user_id).await?;
        Ok(())
    }

    pub async fn product(&self, name: &str, price: f64) -> Result<i64> {
        self.store()
            .add_product(NewProduct {
                name: name.to_string(),
                price,
                description: format!("{name} description"),
                ..Default::default()
            })
            .await
    }

    pub async fn order_count(&self) -> Result<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?)
    }
}
