//! Message Handler module for processing text and media messages

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, error, info};

use crate::conversation_store::ConversationGuard;
use crate::dialogue::Flow;
use crate::transport::IncomingMessage;

use super::dialogue_manager::handle_flow_input;
use super::messages;
use super::ui_builder::main_menu_keyboard;
use super::BotContext;

/// Bot commands handled before any flow input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
}

impl Command {
    /// Recognizes `/start` and `/help`, also in the `/start@shop_bot` and
    /// `/start payload` forms
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let name = word.split('@').next()?;
        match name {
            "/start" => Some(Command::Start),
            "/help" => Some(Command::Help),
            _ => None,
        }
    }
}

/// Entry point for every text or media message
pub async fn message_handler(ctx: Arc<BotContext>, msg: IncomingMessage) -> Result<()> {
    let Err(e) = handle_message(&ctx, &msg).await else {
        return Ok(());
    };
    error!(user_id = msg.user_id, error = ?e, "Failed to handle message");
    ctx.transport
        .send_message(msg.chat_id, messages::GENERIC_ERROR, None)
        .await
        .context("Failed to send error notice")
}

async fn handle_message(ctx: &BotContext, msg: &IncomingMessage) -> Result<()> {
    let conversation = ctx.conversations.lock(msg.user_id).await;

    if let Some(command) = msg.text.as_deref().and_then(Command::parse) {
        return match command {
            Command::Start => handle_start(ctx, &conversation, msg).await,
            Command::Help => {
                debug!(user_id = msg.user_id, "Help requested");
                ctx.transport
                    .send_message(msg.chat_id, messages::HELP, None)
                    .await
                    .context("Failed to send help text")
            }
        };
    }

    match conversation.get().await? {
        Some(flow) => {
            debug!(user_id = msg.user_id, flow = flow.name(), "Routing message into active flow");
            handle_flow_input(ctx, &conversation, msg, flow).await
        }
        None => {
            debug!(user_id = msg.user_id, "Ignoring message outside of any flow");
            Ok(())
        }
    }
}

/// Main menu for verified users, phone verification for everyone else
async fn handle_start(
    ctx: &BotContext,
    conversation: &ConversationGuard<'_>,
    msg: &IncomingMessage,
) -> Result<()> {
    let user = ctx
        .store
        .get_user(msg.user_id)
        .await
        .context("Failed to load user")?;

    if user.is_some_and(|user| user.is_verified) {
        info!(user_id = msg.user_id, "Showing main menu");
        return ctx
            .transport
            .send_message(
                msg.chat_id,
                messages::WELCOME,
                Some(main_menu_keyboard(ctx.is_admin(msg.user_id))),
            )
            .await
            .context("Failed to send main menu");
    }

    conversation.set(Flow::AwaitingPhone).await?;
    info!(user_id = msg.user_id, "Starting phone verification");
    ctx.transport
        .send_message(msg.chat_id, messages::PHONE_PROMPT, None)
        .await
        .context("Failed to send phone prompt")
}
