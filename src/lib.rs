//! # Storefront Telegram Bot
//!
//! A Telegram shop: customers verify a phone number with a one-time code,
//! browse the catalog, add products to their cart and read news. The
//! administrator manages products and broadcasts news from an inline menu.

pub mod bot;
pub mod config;
pub mod conversation_store;
pub mod db;
pub mod dialogue;
pub mod errors;
pub mod models;
pub mod telegram;
pub mod transport;
