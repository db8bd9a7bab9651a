use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use storefront::bot::BotContext;
use storefront::config::BotConfig;
use storefront::conversation_store::ConversationStore;
use storefront::db::{self, SqliteShopStore};
use storefront::telegram::{self, TelegramTransport};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_tracing();

    info!("Starting Storefront Telegram Bot");

    let config = BotConfig::from_env().context("Invalid configuration")?;

    info!(database_url = %config.database_url, "Initializing database");
    let pool = db::connect(&config.database_url).await?;
    db::init_database_schema(&pool).await?;

    if config.seed_sample_products {
        let seeded = db::seed_sample_products(&pool).await?;
        if seeded > 0 {
            info!(count = seeded, "Seeded sample products");
        }
    }

    let bot = Bot::new(&config.bot_token);
    let transport = TelegramTransport::new(bot.clone(), config.media_dir.clone());

    let ctx = Arc::new(BotContext::new(
        Arc::new(SqliteShopStore::new(pool)),
        Arc::new(transport),
        ConversationStore::in_memory(),
        config.shop.clone(),
    ));
    info!(admin_id = ctx.settings.admin_id, "Bot context ready");

    telegram::run(bot, ctx).await;

    Ok(())
}
