//! # Bot Configuration Module
//!
//! Start-up settings read from the environment (a `.env` file is loaded by
//! `main` first). Missing credentials or a malformed admin id abort start-up
//! with a descriptive [`ConfigError`].

use std::path::PathBuf;

use crate::errors::ConfigError;

// Environment variable names
pub const BOT_TOKEN_VAR: &str = "TELEGRAM_BOT_TOKEN";
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
pub const ADMIN_ID_VAR: &str = "ADMIN_ID";
pub const MEDIA_DIR_VAR: &str = "MEDIA_DIR";
pub const BROADCAST_CONCURRENCY_VAR: &str = "BROADCAST_CONCURRENCY";
pub const SEED_SAMPLE_PRODUCTS_VAR: &str = "SEED_SAMPLE_PRODUCTS";

// Defaults for optional settings
pub const DEFAULT_MEDIA_DIR: &str = "media";
pub const DEFAULT_BROADCAST_CONCURRENCY: usize = 8;
pub const RECENT_NEWS_LIMIT: i64 = 5;

/// Settings the handlers need at runtime
#[derive(Debug, Clone, PartialEq)]
pub struct ShopSettings {
    /// The single administrator's user id
    pub admin_id: i64,
    /// Maximum number of in-flight broadcast sends
    pub broadcast_concurrency: usize,
    /// How many news items the news page shows
    pub recent_news_limit: i64,
}

impl ShopSettings {
    pub fn new(admin_id: i64) -> Self {
        Self {
            admin_id,
            broadcast_concurrency: DEFAULT_BROADCAST_CONCURRENCY,
            recent_news_limit: RECENT_NEWS_LIMIT,
        }
    }
}

/// Full process configuration
#[derive(Debug, Clone, PartialEq)]
pub struct BotConfig {
    pub bot_token: String,
    pub database_url: String,
    /// Directory where downloaded product media is kept
    pub media_dir: PathBuf,
    /// Insert the sample catalog when the products table is empty
    pub seed_sample_products: bool,
    pub shop: ShopSettings,
}

impl BotConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary lookup function
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let bot_token = required(BOT_TOKEN_VAR)?;
        let database_url = required(DATABASE_URL_VAR)?;
        let raw_admin_id = required(ADMIN_ID_VAR)?;
        let admin_id = raw_admin_id
            .parse::<i64>()
            .map_err(|_| ConfigError::InvalidAdminId(raw_admin_id.clone()))?;

        let media_dir = lookup(MEDIA_DIR_VAR)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MEDIA_DIR));

        let broadcast_concurrency = match lookup(BROADCAST_CONCURRENCY_VAR) {
            Some(value) => match value.trim().parse::<usize>() {
                Ok(limit) if limit > 0 => limit,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: BROADCAST_CONCURRENCY_VAR,
                        value,
                    })
                }
            },
            None => DEFAULT_BROADCAST_CONCURRENCY,
        };

        let seed_sample_products = match lookup(SEED_SAMPLE_PRODUCTS_VAR) {
            Some(value) => parse_flag(&value).ok_or(ConfigError::Invalid {
                var: SEED_SAMPLE_PRODUCTS_VAR,
                value,
            })?,
            None => true,
        };

        Ok(Self {
            bot_token,
            database_url,
            media_dir,
            seed_sample_products,
            shop: ShopSettings {
                admin_id,
                broadcast_concurrency,
                recent_news_limit: RECENT_NEWS_LIMIT,
            },
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
