//! Callback Handler module for processing inline keyboard callback queries

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use teloxide::types::InlineKeyboardMarkup;
use tracing::{debug, error, info, warn};

use crate::conversation_store::ConversationGuard;
use crate::dialogue::{EditStep, Flow, ProductDraft};
use crate::errors::AccessError;
use crate::transport::CallbackEvent;

use super::menu::{Access, MenuAction};
use super::messages;
use super::ui_builder::{
    admin_menu_keyboard, back_keyboard, catalog_keyboard, format_all_orders, format_news,
    format_product_detail, format_profile, format_user_orders, main_menu_keyboard,
    product_detail_keyboard, product_list_keyboard,
};
use super::BotContext;

/// Short text shown to the user when the callback is answered
type Notice = Option<&'static str>;

/// Handle callback queries from inline keyboards
pub async fn callback_handler(ctx: Arc<BotContext>, event: CallbackEvent) -> Result<()> {
    let action = MenuAction::parse(&event.data);
    debug!(user_id = event.user_id, action = %action, "Received callback query from user");

    let conversation = ctx.conversations.lock(event.user_id).await;

    let notice = match check_access(&ctx, event.user_id, &action).await {
        Err(e) => {
            error!(user_id = event.user_id, error = %e, "Failed to check menu access");
            Some(messages::GENERIC_ERROR)
        }
        Ok(Some(rejection)) => {
            warn!(user_id = event.user_id, action = %action, reason = %rejection, "Rejected menu action");
            Some(match rejection {
                AccessError::NotVerified => messages::VERIFY_FIRST,
                AccessError::NotAdmin => messages::NOT_ADMIN,
            })
        }
        Ok(None) => match dispatch(&ctx, &conversation, &event, action).await {
            Ok(notice) => notice,
            Err(e) => {
                error!(user_id = event.user_id, error = %e, "Failed to handle menu action");
                Some(messages::GENERIC_ERROR)
            }
        },
    };

    ctx.transport
        .answer_callback(&event, notice)
        .await
        .context("Failed to answer callback query")
}

/// `None` when the user may trigger `action`
async fn check_access(
    ctx: &BotContext,
    user_id: i64,
    action: &MenuAction,
) -> Result<Option<AccessError>> {
    match action.access() {
        Access::Anyone => Ok(None),
        Access::Admin if ctx.is_admin(user_id) => Ok(None),
        Access::Admin => Ok(Some(AccessError::NotAdmin)),
        Access::Verified => {
            let user = ctx
                .store
                .get_user(user_id)
                .await
                .context("Failed to load user for access check")?;
            if user.is_some_and(|user| user.is_verified) {
                Ok(None)
            } else {
                Ok(Some(AccessError::NotVerified))
            }
        }
    }
}

async fn dispatch(
    ctx: &BotContext,
    conversation: &ConversationGuard<'_>,
    event: &CallbackEvent,
    action: MenuAction,
) -> Result<Notice> {
    match action {
        MenuAction::Products => {
            show_catalog(ctx, event).await?;
            Ok(None)
        }
        MenuAction::ProductDetail(product_id) => show_product(ctx, event, product_id).await,
        MenuAction::AddToCart(product_id) => add_to_cart(ctx, event, product_id).await,
        MenuAction::MyOrders => show_user_orders(ctx, event).await,
        MenuAction::Profile => show_profile(ctx, event).await,
        MenuAction::News => show_news(ctx, event).await,
        MenuAction::Back => {
            let keyboard = main_menu_keyboard(ctx.is_admin(event.user_id));
            render(ctx, event, messages::WELCOME, keyboard).await?;
            Ok(None)
        }
        MenuAction::AdminPanel => {
            render(ctx, event, messages::ADMIN_PANEL, admin_menu_keyboard()).await?;
            Ok(None)
        }
        MenuAction::ViewOrders => show_all_orders(ctx, event).await,
        MenuAction::AddProduct => {
            conversation
                .set(Flow::AddingProduct(ProductDraft::Name))
                .await?;
            info!(user_id = event.user_id, "Started adding a product");
            prompt(ctx, event, messages::ENTER_PRODUCT_NAME).await?;
            Ok(None)
        }
        MenuAction::EditProduct => {
            show_product_picker(ctx, event, MenuAction::EditSelect, messages::SELECT_PRODUCT_TO_EDIT)
                .await
        }
        MenuAction::EditSelect(product_id) => {
            select_product_to_edit(ctx, conversation, event, product_id).await
        }
        MenuAction::DeleteProduct => {
            show_product_picker(
                ctx,
                event,
                MenuAction::DeleteSelect,
                messages::SELECT_PRODUCT_TO_DELETE,
            )
            .await
        }
        MenuAction::DeleteSelect(product_id) => {
            conversation
                .set(Flow::DeletingProduct { product_id })
                .await?;
            info!(user_id = event.user_id, product_id, "Started deleting a product");
            prompt(ctx, event, &messages::confirm_deletion(product_id)).await?;
            Ok(None)
        }
        MenuAction::AddNews => {
            conversation.set(Flow::AddingNews).await?;
            info!(user_id = event.user_id, "Started adding news");
            prompt(ctx, event, messages::ENTER_NEWS).await?;
            Ok(None)
        }
        MenuAction::Unknown(data) => {
            warn!(user_id = event.user_id, data = %data, "Unknown callback data");
            Ok(Some(messages::UNKNOWN_ACTION))
        }
    }
}

/// Replace the menu message with `text` and `keyboard`
async fn render(
    ctx: &BotContext,
    event: &CallbackEvent,
    text: &str,
    keyboard: InlineKeyboardMarkup,
) -> Result<()> {
    ctx.transport
        .edit_message(event, text, Some(keyboard), None)
        .await
        .context("Failed to update menu message")
}

/// Replace the menu message with a flow prompt awaiting typed input
async fn prompt(ctx: &BotContext, event: &CallbackEvent, text: &str) -> Result<()> {
    ctx.transport
        .edit_message(event, text, None, None)
        .await
        .context("Failed to send flow prompt")
}

async fn show_catalog(ctx: &BotContext, event: &CallbackEvent) -> Result<()> {
    let products = ctx
        .store
        .list_products()
        .await
        .context("Failed to list products")?;

    if products.is_empty() {
        render(ctx, event, messages::CATALOG_EMPTY, back_keyboard(MenuAction::Back)).await
    } else {
        render(ctx, event, messages::SELECT_PRODUCT, catalog_keyboard(&products)).await
    }
}

/// Product detail, falling back to the catalog when it cannot be shown
async fn show_product(ctx: &BotContext, event: &CallbackEvent, product_id: i64) -> Result<Notice> {
    match render_product(ctx, event, product_id).await {
        Ok(true) => Ok(None),
        Ok(false) => {
            debug!(user_id = event.user_id, product_id, "Requested product does not exist");
            show_catalog(ctx, event).await?;
            Ok(Some(messages::PRODUCT_NOT_FOUND))
        }
        Err(e) => {
            error!(user_id = event.user_id, product_id, error = %e, "Failed to display product");
            show_catalog(ctx, event).await?;
            Ok(Some(messages::PRODUCT_DISPLAY_ERROR))
        }
    }
}

/// Returns `false` when the product does not exist
async fn render_product(ctx: &BotContext, event: &CallbackEvent, product_id: i64) -> Result<bool> {
    let Some(product) = ctx
        .store
        .get_product(product_id)
        .await
        .context("Failed to load product")?
    else {
        return Ok(false);
    };

    let media = match product.media() {
        Some(media) => match ctx.transport.upload_media(&media).await {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(product_id, reference = media.reference(), error = %e, "Product media unavailable, showing text only");
                None
            }
        },
        None => None,
    };

    ctx.transport
        .edit_message(
            event,
            &format_product_detail(&product),
            Some(product_detail_keyboard(product.id)),
            media,
        )
        .await
        .context("Failed to show product detail")?;
    Ok(true)
}

async fn add_to_cart(ctx: &BotContext, event: &CallbackEvent, product_id: i64) -> Result<Notice> {
    let product = ctx
        .store
        .get_product(product_id)
        .await
        .context("Failed to load product")?;
    if product.is_none() {
        show_catalog(ctx, event).await?;
        return Ok(Some(messages::PRODUCT_NOT_FOUND));
    }

    let order_id = ctx
        .store
        .add_order(event.user_id, product_id, 1)
        .await
        .context("Failed to create order")?;
    info!(user_id = event.user_id, product_id, order_id, "Product added to cart");

    show_catalog(ctx, event).await?;
    Ok(Some(messages::ADDED_TO_CART))
}

async fn show_user_orders(ctx: &BotContext, event: &CallbackEvent) -> Result<Notice> {
    let orders = ctx
        .store
        .list_orders_for_user(event.user_id)
        .await
        .context("Failed to list user orders")?;

    let text = if orders.is_empty() {
        messages::NO_ORDERS.to_string()
    } else {
        format_user_orders(&orders)
    };
    render(ctx, event, &text, back_keyboard(MenuAction::Back)).await?;
    Ok(None)
}

async fn show_profile(ctx: &BotContext, event: &CallbackEvent) -> Result<Notice> {
    let user = ctx
        .store
        .get_user(event.user_id)
        .await
        .context("Failed to load user")?
        .ok_or_else(|| anyhow!("user {} has no profile", event.user_id))?;
    let order_count = ctx
        .store
        .list_orders_for_user(event.user_id)
        .await
        .context("Failed to count user orders")?
        .len();

    render(
        ctx,
        event,
        &format_profile(&user, order_count),
        back_keyboard(MenuAction::Back),
    )
    .await?;
    Ok(None)
}

async fn show_news(ctx: &BotContext, event: &CallbackEvent) -> Result<Notice> {
    let news = ctx
        .store
        .list_recent_news(ctx.settings.recent_news_limit)
        .await
        .context("Failed to list news")?;

    let text = if news.is_empty() {
        messages::NO_NEWS.to_string()
    } else {
        format_news(&news)
    };
    render(ctx, event, &text, back_keyboard(MenuAction::Back)).await?;
    Ok(None)
}

async fn show_all_orders(ctx: &BotContext, event: &CallbackEvent) -> Result<Notice> {
    let orders = ctx
        .store
        .list_all_orders()
        .await
        .context("Failed to list all orders")?;

    let text = if orders.is_empty() {
        messages::NO_ORDERS_FOUND.to_string()
    } else {
        format_all_orders(&orders)
    };
    render(ctx, event, &text, back_keyboard(MenuAction::AdminPanel)).await?;
    Ok(None)
}

async fn show_product_picker(
    ctx: &BotContext,
    event: &CallbackEvent,
    action: fn(i64) -> MenuAction,
    title: &str,
) -> Result<Notice> {
    let products = ctx
        .store
        .list_products()
        .await
        .context("Failed to list products")?;

    if products.is_empty() {
        render(
            ctx,
            event,
            messages::CATALOG_EMPTY,
            back_keyboard(MenuAction::AdminPanel),
        )
        .await?;
    } else {
        let keyboard = product_list_keyboard(&products, action, MenuAction::AdminPanel);
        render(ctx, event, title, keyboard).await?;
    }
    Ok(None)
}

async fn select_product_to_edit(
    ctx: &BotContext,
    conversation: &ConversationGuard<'_>,
    event: &CallbackEvent,
    product_id: i64,
) -> Result<Notice> {
    let exists = ctx
        .store
        .get_product(product_id)
        .await
        .context("Failed to load product")?
        .is_some();
    if !exists {
        return Ok(Some(messages::PRODUCT_NOT_FOUND));
    }

    conversation
        .set(Flow::EditingProduct {
            product_id,
            step: EditStep::Field,
        })
        .await?;
    info!(user_id = event.user_id, product_id, "Started editing a product");
    prompt(ctx, event, messages::CHOOSE_EDIT_FIELD).await?;
    Ok(None)
}
