//! # Shop Data Model
//!
//! Rows of the four storefront tables plus the joined order view used for
//! rendering order history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Initial status of every order. No further transitions exist.
pub const ORDER_STATUS_PENDING: &str = "pending";

/// A chat user identified by the platform user id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub user_id: i64,
    pub phone_number: String,
    pub is_verified: bool,
}

/// A catalog product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub description: String,
    /// Local path or URL of the product image
    pub image_url: Option<String>,
    /// Local path or URL of the product video
    pub video_url: Option<String>,
}

impl Product {
    /// Media shown on the detail page, image first
    pub fn media(&self) -> Option<ProductMedia> {
        match (&self.image_url, &self.video_url) {
            (Some(image), _) if !image.is_empty() => Some(ProductMedia::Image(image.clone())),
            (_, Some(video)) if !video.is_empty() => Some(ProductMedia::Video(video.clone())),
            _ => None,
        }
    }
}

/// A stored media reference with its kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductMedia {
    Image(String),
    Video(String),
}

impl ProductMedia {
    pub fn reference(&self) -> &str {
        match self {
            ProductMedia::Image(reference) | ProductMedia::Video(reference) => reference,
        }
    }
}

/// Fields for a new product
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    pub description: String,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
}

/// Partial product update; `None` fields are left untouched
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.description.is_none()
            && self.image_url.is_none()
            && self.video_url.is_none()
    }
}

/// An order joined with its product. Product columns are `None` once the
/// product has been deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct OrderLine {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub product_name: Option<String>,
    pub price: Option<f64>,
    pub quantity: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// A news post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct NewsItem {
    pub id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
