//! Bot module for handling chat interactions
//!
//! This module is split into several submodules:
//! - `message_handler`: Handles commands and routes text/media into the active flow
//! - `callback_handler`: Handles inline keyboard callback queries
//! - `dialogue_manager`: Flow state transitions and validation
//! - `ui_builder`: Creates keyboards and formats messages
//! - `menu`: Callback data parsing and access levels
//! - `broadcast`: News fan-out
//! - `messages`: User-facing text

use std::sync::Arc;

use crate::config::ShopSettings;
use crate::conversation_store::ConversationStore;
use crate::db::ShopStore;
use crate::transport::Transport;

pub mod broadcast;
pub mod callback_handler;
pub mod dialogue_manager;
pub mod menu;
pub mod message_handler;
pub mod messages;
pub mod ui_builder;

// Re-export main handler functions for use in telegram.rs
pub use callback_handler::callback_handler;
pub use message_handler::message_handler;

/// Everything a handler needs, shared across all updates
pub struct BotContext {
    pub store: Arc<dyn ShopStore>,
    pub transport: Arc<dyn Transport>,
    pub conversations: ConversationStore,
    pub settings: ShopSettings,
}

impl BotContext {
    pub fn new(
        store: Arc<dyn ShopStore>,
        transport: Arc<dyn Transport>,
        conversations: ConversationStore,
        settings: ShopSettings,
    ) -> Self {
        Self {
            store,
            transport,
            conversations,
            settings,
        }
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        user_id == self.settings.admin_id
    }
}
