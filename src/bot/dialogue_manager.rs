//! Dialogue Manager module for handling flow state transitions
//!
//! Each handler receives the user's current [`Flow`] under the conversation
//! lock, stores the next state (or clears it) and then replies.

use anyhow::{Context, Result};
use teloxide::types::InlineKeyboardMarkup;
use tracing::{debug, error, info};

use crate::conversation_store::ConversationGuard;
use crate::dialogue::{
    check_otp, generate_otp, is_skip, parse_price, parse_product_id, validate_phone, EditField,
    EditStep, Flow, ProductDraft,
};
use crate::errors::ValidationError;
use crate::models::{NewProduct, ProductPatch};
use crate::transport::{Attachment, IncomingMessage};

use super::broadcast::broadcast;
use super::menu::MenuAction;
use super::messages;
use super::ui_builder::back_keyboard;
use super::BotContext;

async fn reply(
    ctx: &BotContext,
    msg: &IncomingMessage,
    text: &str,
    keyboard: Option<InlineKeyboardMarkup>,
) -> Result<()> {
    ctx.transport
        .send_message(msg.chat_id, text, keyboard)
        .await
        .context("Failed to send reply")
}

fn admin_back() -> Option<InlineKeyboardMarkup> {
    Some(back_keyboard(MenuAction::AdminPanel))
}

/// Feed one message into the user's active flow
pub async fn handle_flow_input(
    ctx: &BotContext,
    conversation: &ConversationGuard<'_>,
    msg: &IncomingMessage,
    flow: Flow,
) -> Result<()> {
    let text = msg.text.as_deref().map(str::trim);

    match flow {
        Flow::AwaitingPhone => match text {
            Some(text) => handle_phone_input(ctx, conversation, msg, text).await,
            None => ignore_input(msg, "awaiting_phone"),
        },
        Flow::AwaitingOtp { otp, .. } => match text {
            Some(text) => handle_otp_input(ctx, conversation, msg, text, &otp).await,
            None => ignore_input(msg, "awaiting_otp"),
        },
        Flow::AddingProduct(ProductDraft::Media {
            name,
            price,
            description,
        }) => {
            let draft = NewProduct {
                name,
                price,
                description,
                ..Default::default()
            };
            handle_product_media_input(ctx, conversation, msg, text, draft).await
        }
        Flow::AddingProduct(draft) => match text {
            Some(text) => handle_product_draft_input(ctx, conversation, msg, text, draft).await,
            None => ignore_input(msg, "adding_product"),
        },
        Flow::EditingProduct {
            product_id,
            step: EditStep::Field,
        } => match text {
            Some(text) => handle_edit_field_input(ctx, conversation, msg, text, product_id).await,
            None => ignore_input(msg, "editing_product"),
        },
        Flow::EditingProduct {
            product_id,
            step: EditStep::Value { field },
        } => handle_edit_value_input(ctx, conversation, msg, text, product_id, field).await,
        Flow::DeletingProduct { product_id } => match text {
            Some(text) => handle_delete_input(ctx, conversation, msg, text, product_id).await,
            None => ignore_input(msg, "deleting_product"),
        },
        Flow::AddingNews => match text {
            Some(text) => handle_news_input(ctx, conversation, msg, text).await,
            None => ignore_input(msg, "adding_news"),
        },
    }
}

fn ignore_input(msg: &IncomingMessage, step: &str) -> Result<()> {
    debug!(user_id = msg.user_id, step, "Ignoring message without text");
    Ok(())
}

/// Phone number step of verification
async fn handle_phone_input(
    ctx: &BotContext,
    conversation: &ConversationGuard<'_>,
    msg: &IncomingMessage,
    text: &str,
) -> Result<()> {
    match validate_phone(text) {
        Ok(phone) => {
            ctx.store
                .upsert_user(msg.user_id, &phone)
                .await
                .context("Failed to save user phone number")?;

            let otp = generate_otp();
            conversation
                .set(Flow::AwaitingOtp {
                    phone,
                    otp: otp.clone(),
                })
                .await?;
            info!(user_id = msg.user_id, "Phone number accepted, one-time code issued");

            reply(ctx, msg, &messages::otp_sent(&otp), None).await
        }
        Err(e) => {
            debug!(user_id = msg.user_id, error = %e, "Rejected phone number");
            reply(ctx, msg, messages::PHONE_INVALID, None).await
        }
    }
}

async fn handle_otp_input(
    ctx: &BotContext,
    conversation: &ConversationGuard<'_>,
    msg: &IncomingMessage,
    text: &str,
    otp: &str,
) -> Result<()> {
    if check_otp(text, otp).is_err() {
        debug!(user_id = msg.user_id, "One-time code mismatch");
        return reply(ctx, msg, messages::OTP_INVALID, None).await;
    }

    ctx.store
        .verify_user(msg.user_id)
        .await
        .context("Failed to mark user as verified")?;
    conversation.clear().await?;
    info!(user_id = msg.user_id, "User verified");

    reply(ctx, msg, messages::VERIFIED, None).await
}

/// Name, price and description steps of product creation
async fn handle_product_draft_input(
    ctx: &BotContext,
    conversation: &ConversationGuard<'_>,
    msg: &IncomingMessage,
    text: &str,
    draft: ProductDraft,
) -> Result<()> {
    let (next, prompt) = match draft {
        ProductDraft::Name => (
            ProductDraft::Price {
                name: text.to_string(),
            },
            messages::ENTER_PRODUCT_PRICE,
        ),
        ProductDraft::Price { name } => match parse_price(text) {
            Ok(price) => (
                ProductDraft::Description { name, price },
                messages::ENTER_PRODUCT_DESCRIPTION,
            ),
            Err(e) => {
                debug!(user_id = msg.user_id, error = %e, "Rejected product price");
                return reply(ctx, msg, messages::PRICE_INVALID, None).await;
            }
        },
        ProductDraft::Description { name, price } => (
            ProductDraft::Media {
                name,
                price,
                description: text.to_string(),
            },
            messages::SEND_PRODUCT_MEDIA,
        ),
        // Routed to handle_product_media_input
        ProductDraft::Media { .. } => return Ok(()),
    };

    conversation.set(Flow::AddingProduct(next)).await?;
    reply(ctx, msg, prompt, None).await
}

/// Final step of product creation: an attachment or "skip"
async fn handle_product_media_input(
    ctx: &BotContext,
    conversation: &ConversationGuard<'_>,
    msg: &IncomingMessage,
    text: Option<&str>,
    mut product: NewProduct,
) -> Result<()> {
    let notice = if let Some(attachment) = &msg.attachment {
        let reference = match ctx.transport.download_attachment(attachment).await {
            Ok(reference) => reference,
            Err(e) => {
                error!(user_id = msg.user_id, error = %e, "Failed to download product media");
                return reply(ctx, msg, messages::MEDIA_FAILED, None).await;
            }
        };
        match attachment {
            Attachment::Photo { .. } => product.image_url = Some(reference),
            Attachment::Video { .. } => product.video_url = Some(reference),
        }
        messages::PRODUCT_ADDED_WITH_MEDIA
    } else if text.is_some_and(is_skip) {
        messages::PRODUCT_ADDED
    } else {
        debug!(user_id = msg.user_id, "Ignoring text at product media step");
        return Ok(());
    };

    let product_id = ctx
        .store
        .add_product(product)
        .await
        .context("Failed to create product")?;
    conversation.clear().await?;
    info!(user_id = msg.user_id, product_id, "Product added");

    reply(ctx, msg, notice, admin_back()).await
}

async fn handle_edit_field_input(
    ctx: &BotContext,
    conversation: &ConversationGuard<'_>,
    msg: &IncomingMessage,
    text: &str,
    product_id: i64,
) -> Result<()> {
    match text.parse::<EditField>() {
        Ok(field) => {
            conversation
                .set(Flow::EditingProduct {
                    product_id,
                    step: EditStep::Value { field },
                })
                .await?;
            reply(ctx, msg, &messages::enter_new_value(field), None).await
        }
        Err(e) => {
            debug!(user_id = msg.user_id, error = %e, "Rejected product field");
            reply(ctx, msg, messages::EDIT_FIELD_INVALID, None).await
        }
    }
}

/// Patch setting one field from typed text
fn text_patch(field: EditField, text: &str) -> Result<ProductPatch, ValidationError> {
    let mut patch = ProductPatch::default();
    match field {
        EditField::Name => patch.name = Some(text.to_string()),
        EditField::Price => patch.price = Some(parse_price(text)?),
        EditField::Description => patch.description = Some(text.to_string()),
        EditField::Image => patch.image_url = Some(text.to_string()),
        EditField::Video => patch.video_url = Some(text.to_string()),
    }
    Ok(patch)
}

async fn handle_edit_value_input(
    ctx: &BotContext,
    conversation: &ConversationGuard<'_>,
    msg: &IncomingMessage,
    text: Option<&str>,
    product_id: i64,
    field: EditField,
) -> Result<()> {
    let patch = match (&msg.attachment, text) {
        (Some(attachment), _) if field.is_media() => {
            match ctx.transport.download_attachment(attachment).await {
                Ok(reference) => {
                    let mut patch = ProductPatch::default();
                    if field == EditField::Image {
                        patch.image_url = Some(reference);
                    } else {
                        patch.video_url = Some(reference);
                    }
                    patch
                }
                Err(e) => {
                    error!(user_id = msg.user_id, product_id, error = %e, "Failed to download product media");
                    return reply(ctx, msg, messages::MEDIA_EDIT_FAILED, None).await;
                }
            }
        }
        (_, Some(text)) => match text_patch(field, text) {
            Ok(patch) => patch,
            Err(e) => {
                debug!(user_id = msg.user_id, error = %e, "Rejected product value");
                return reply(ctx, msg, messages::EDIT_PRICE_INVALID, None).await;
            }
        },
        (_, None) => return ignore_input(msg, "editing_product"),
    };

    let updated = ctx
        .store
        .update_product(product_id, patch)
        .await
        .context("Failed to update product")?;
    conversation.clear().await?;

    if updated {
        info!(user_id = msg.user_id, product_id, field = %field, "Product updated");
        reply(ctx, msg, &messages::field_updated(field), admin_back()).await
    } else {
        info!(user_id = msg.user_id, product_id, "Product to edit no longer exists");
        reply(ctx, msg, &messages::product_id_not_found(product_id), admin_back()).await
    }
}

/// Deletion confirmation. The typed id is the one deleted.
async fn handle_delete_input(
    ctx: &BotContext,
    conversation: &ConversationGuard<'_>,
    msg: &IncomingMessage,
    text: &str,
    selected_id: i64,
) -> Result<()> {
    let product_id = match parse_product_id(text) {
        Ok(id) => id,
        Err(e) => {
            debug!(user_id = msg.user_id, error = %e, "Rejected product id");
            return reply(ctx, msg, messages::PRODUCT_ID_INVALID, None).await;
        }
    };

    let deleted = ctx
        .store
        .delete_product(product_id)
        .await
        .context("Failed to delete product")?;
    conversation.clear().await?;

    if deleted {
        info!(user_id = msg.user_id, product_id, selected_id, "Product deleted");
        reply(ctx, msg, messages::PRODUCT_DELETED, admin_back()).await
    } else {
        info!(user_id = msg.user_id, product_id, "Product to delete does not exist");
        reply(ctx, msg, &messages::product_id_not_found(product_id), admin_back()).await
    }
}

async fn handle_news_input(
    ctx: &BotContext,
    conversation: &ConversationGuard<'_>,
    msg: &IncomingMessage,
    text: &str,
) -> Result<()> {
    let news_id = ctx
        .store
        .add_news(text)
        .await
        .context("Failed to save news")?;
    conversation.clear().await?;
    info!(user_id = msg.user_id, news_id, "News posted");

    let recipients = ctx
        .store
        .list_all_user_ids()
        .await
        .context("Failed to list broadcast recipients")?;
    let report = broadcast(
        ctx.transport.as_ref(),
        recipients,
        &messages::news_broadcast(text),
        ctx.settings.broadcast_concurrency,
    )
    .await;

    reply(
        ctx,
        msg,
        &messages::news_posted(report.delivered, report.recipients),
        admin_back(),
    )
    .await
}
