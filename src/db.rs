//! # Shop Database Module
//!
//! SQLite persistence for products, orders, users and news, plus the
//! [`ShopStore`] trait the bot handlers talk to.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite};
use tracing::{debug, info};

use crate::models::{
    NewProduct, NewsItem, OrderLine, Product, ProductPatch, User, ORDER_STATUS_PENDING,
};

/// Storage operations used by the conversation engine and menu dispatcher
#[async_trait]
pub trait ShopStore: Send + Sync {
    async fn add_product(&self, product: NewProduct) -> Result<i64>;
    /// Returns `false` when no product has the given id
    async fn update_product(&self, product_id: i64, patch: ProductPatch) -> Result<bool>;
    /// Returns `false` when no product has the given id
    async fn delete_product(&self, product_id: i64) -> Result<bool>;
    async fn get_product(&self, product_id: i64) -> Result<Option<Product>>;
    async fn list_products(&self) -> Result<Vec<Product>>;
    async fn add_order(&self, user_id: i64, product_id: i64, quantity: i64) -> Result<i64>;
    async fn list_orders_for_user(&self, user_id: i64) -> Result<Vec<OrderLine>>;
    async fn list_all_orders(&self) -> Result<Vec<OrderLine>>;
    /// Creates the user or replaces its phone number, resetting verification
    async fn upsert_user(&self, user_id: i64, phone_number: &str) -> Result<()>;
    async fn verify_user(&self, user_id: i64) -> Result<bool>;
    async fn get_user(&self, user_id: i64) -> Result<Option<User>>;
    async fn add_news(&self, content: &str) -> Result<i64>;
    async fn list_recent_news(&self, limit: i64) -> Result<Vec<NewsItem>>;
    async fn list_all_user_ids(&self) -> Result<Vec<i64>>;
}

/// Open a pool for the given database URL, creating the file when missing
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    info!(database_url = %database_url, "Connecting to database");

    let options = database_url
        .parse::<sqlx::sqlite::SqliteConnectOptions>()
        .context("Invalid DATABASE_URL")?
        .create_if_missing(true);

    SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .context("Failed to connect to database")
}

/// Single-connection in-memory pool that lives as long as the pool does
pub async fn connect_in_memory() -> Result<SqlitePool> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .context("Failed to open in-memory database")
}

/// Initialize the database schema
pub async fn init_database_schema(pool: &SqlitePool) -> Result<()> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS products (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            price REAL NOT NULL,
            description TEXT NOT NULL,
            image_url TEXT,
            video_url TEXT
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create products table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS orders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            product_id INTEGER NOT NULL,
            quantity INTEGER NOT NULL,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create orders table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            user_id INTEGER PRIMARY KEY,
            phone_number TEXT NOT NULL,
            is_verified BOOLEAN NOT NULL DEFAULT 0
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create users table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS news (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            content TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create news table")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_orders_user_id ON orders(user_id)")
        .execute(pool)
        .await
        .context("Failed to create orders index")?;

    info!("Database schema initialized successfully");
    Ok(())
}

/// Insert the demo catalog when no product exists yet
pub async fn seed_sample_products(pool: &SqlitePool) -> Result<usize> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(pool)
        .await
        .context("Failed to count products")?;
    if existing > 0 {
        debug!(existing, "Catalog already populated, skipping sample products");
        return Ok(0);
    }

    let samples = [
        ("iPhone 13", 799.99, "Latest iPhone, 128GB"),
        ("Samsung S23", 699.99, "Flagship Samsung phone"),
        ("MacBook Pro", 1299.99, "16GB RAM, 512GB SSD"),
    ];
    for (name, price, description) in samples {
        create_product(
            pool,
            &NewProduct {
                name: name.to_string(),
                price,
                description: description.to_string(),
                ..Default::default()
            },
        )
        .await?;
    }

    info!(count = samples.len(), "Sample products inserted");
    Ok(samples.len())
}

/// Create a new product
pub async fn create_product(pool: &SqlitePool, product: &NewProduct) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO products (name, price, description, image_url, video_url)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(&product.name)
    .bind(product.price)
    .bind(&product.description)
    .bind(&product.image_url)
    .bind(&product.video_url)
    .execute(pool)
    .await
    .context("Failed to insert product")?;

    let product_id = result.last_insert_rowid();
    info!(product_id, name = %product.name, "Product created");
    Ok(product_id)
}

/// Apply the non-empty fields of `patch` to a product
pub async fn update_product(
    pool: &SqlitePool,
    product_id: i64,
    patch: &ProductPatch,
) -> Result<bool> {
    if patch.is_empty() {
        return Ok(read_product(pool, product_id).await?.is_some());
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE products SET ");
    let mut fields = builder.separated(", ");
    if let Some(name) = &patch.name {
        fields.push("name = ").push_bind_unseparated(name.clone());
    }
    if let Some(price) = patch.price {
        fields.push("price = ").push_bind_unseparated(price);
    }
    if let Some(description) = &patch.description {
        fields
            .push("description = ")
            .push_bind_unseparated(description.clone());
    }
    if let Some(image_url) = &patch.image_url {
        fields
            .push("image_url = ")
            .push_bind_unseparated(image_url.clone());
    }
    if let Some(video_url) = &patch.video_url {
        fields
            .push("video_url = ")
            .push_bind_unseparated(video_url.clone());
    }
    builder.push(" WHERE id = ").push_bind(product_id);

    let rows_affected = builder
        .build()
        .execute(pool)
        .await
        .context("Failed to update product")?
        .rows_affected();

    if rows_affected > 0 {
        info!(product_id, "Product updated");
        Ok(true)
    } else {
        info!(product_id, "No product found to update");
        Ok(false)
    }
}

/// Delete a product by id
pub async fn delete_product(pool: &SqlitePool, product_id: i64) -> Result<bool> {
    let rows_affected = sqlx::query("DELETE FROM products WHERE id = ?1")
        .bind(product_id)
        .execute(pool)
        .await
        .context("Failed to delete product")?
        .rows_affected();

    if rows_affected > 0 {
        info!(product_id, "Product deleted");
        Ok(true)
    } else {
        info!(product_id, "No product found to delete");
        Ok(false)
    }
}

/// Read a product by id
pub async fn read_product(pool: &SqlitePool, product_id: i64) -> Result<Option<Product>> {
    sqlx::query_as::<_, Product>(
        "SELECT id, name, price, description, image_url, video_url FROM products WHERE id = ?1",
    )
    .bind(product_id)
    .fetch_optional(pool)
    .await
    .context("Failed to read product")
}

/// List the whole catalog ordered by id
pub async fn list_products(pool: &SqlitePool) -> Result<Vec<Product>> {
    sqlx::query_as::<_, Product>(
        "SELECT id, name, price, description, image_url, video_url FROM products ORDER BY id",
    )
    .fetch_all(pool)
    .await
    .context("Failed to list products")
}

/// Record a pending order
pub async fn create_order(
    pool: &SqlitePool,
    user_id: i64,
    product_id: i64,
    quantity: i64,
) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO orders (user_id, product_id, quantity, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .bind(ORDER_STATUS_PENDING)
    .bind(Utc::now())
    .execute(pool)
    .await
    .context("Failed to insert order")?;

    let order_id = result.last_insert_rowid();
    info!(order_id, user_id, product_id, "Order created");
    Ok(order_id)
}

const ORDER_LINE_SELECT: &str = "SELECT o.id, o.user_id, o.product_id, p.name AS product_name, p.price,
            o.quantity, o.status, o.created_at
     FROM orders o LEFT JOIN products p ON o.product_id = p.id";

/// Orders placed by one user, oldest first
pub async fn list_orders_by_user(pool: &SqlitePool, user_id: i64) -> Result<Vec<OrderLine>> {
    sqlx::query_as::<_, OrderLine>(&format!(
        "{ORDER_LINE_SELECT} WHERE o.user_id = ?1 ORDER BY o.id"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to list user orders")
}

/// Every order of every user, oldest first
pub async fn list_all_orders(pool: &SqlitePool) -> Result<Vec<OrderLine>> {
    sqlx::query_as::<_, OrderLine>(&format!("{ORDER_LINE_SELECT} ORDER BY o.id"))
        .fetch_all(pool)
        .await
        .context("Failed to list orders")
}

/// Create or replace a user with an unverified phone number
pub async fn upsert_user(pool: &SqlitePool, user_id: i64, phone_number: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO users (user_id, phone_number, is_verified) VALUES (?1, ?2, 0)
         ON CONFLICT(user_id) DO UPDATE SET phone_number = excluded.phone_number, is_verified = 0",
    )
    .bind(user_id)
    .bind(phone_number)
    .execute(pool)
    .await
    .context("Failed to upsert user")?;

    info!(user_id, "User phone number stored");
    Ok(())
}

/// Mark a user's phone number as verified
pub async fn verify_user(pool: &SqlitePool, user_id: i64) -> Result<bool> {
    let rows_affected = sqlx::query("UPDATE users SET is_verified = 1 WHERE user_id = ?1")
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to verify user")?
        .rows_affected();
    Ok(rows_affected > 0)
}

/// Read a user by platform id
pub async fn get_user_by_id(pool: &SqlitePool, user_id: i64) -> Result<Option<User>> {
    sqlx::query_as::<_, User>(
        "SELECT user_id, phone_number, is_verified FROM users WHERE user_id = ?1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("Failed to read user")
}

/// Store a news post
pub async fn create_news(pool: &SqlitePool, content: &str) -> Result<i64> {
    let result = sqlx::query("INSERT INTO news (content, created_at) VALUES (?1, ?2)")
        .bind(content)
        .bind(Utc::now())
        .execute(pool)
        .await
        .context("Failed to insert news")?;

    let news_id = result.last_insert_rowid();
    info!(news_id, "News item created");
    Ok(news_id)
}

/// Most recent news first
pub async fn list_recent_news(pool: &SqlitePool, limit: i64) -> Result<Vec<NewsItem>> {
    sqlx::query_as::<_, NewsItem>(
        "SELECT id, content, created_at FROM news ORDER BY created_at DESC, id DESC LIMIT ?1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to list news")
}

/// Ids of every user that ever submitted a phone number
pub async fn list_user_ids(pool: &SqlitePool) -> Result<Vec<i64>> {
    sqlx::query_scalar::<_, i64>("SELECT user_id FROM users ORDER BY user_id")
        .fetch_all(pool)
        .await
        .context("Failed to list users")
}

/// [`ShopStore`] backed by a SQLite pool
#[derive(Debug, Clone)]
pub struct SqliteShopStore {
    pool: SqlitePool,
}

impl SqliteShopStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ShopStore for SqliteShopStore {
    async fn add_product(&self, product: NewProduct) -> Result<i64> {
        create_product(&self.pool, &product).await
    }

    async fn update_product(&self, product_id: i64, patch: ProductPatch) -> Result<bool> {
        update_product(&self.pool, product_id, &patch).await
    }

    async fn delete_product(&self, product_id: i64) -> Result<bool> {
        delete_product(&self.pool, product_id).await
    }

    async fn get_product(&self, product_id: i64) -> Result<Option<Product>> {
        read_product(&self.pool, product_id).await
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        list_products(&self.pool).await
    }

    async fn add_order(&self, user_id: i64, product_id: i64, quantity: i64) -> Result<i64> {
        create_order(&self.pool, user_id, product_id, quantity).await
    }

    async fn list_orders_for_user(&self, user_id: i64) -> Result<Vec<OrderLine>> {
        list_orders_by_user(&self.pool, user_id).await
    }

    async fn list_all_orders(&self) -> Result<Vec<OrderLine>> {
        list_all_orders(&self.pool).await
    }

    async fn upsert_user(&self, user_id: i64, phone_number: &str) -> Result<()> {
        upsert_user(&self.pool, user_id, phone_number).await
    }

    async fn verify_user(&self, user_id: i64) -> Result<bool> {
        verify_user(&self.pool, user_id).await
    }

    async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        get_user_by_id(&self.pool, user_id).await
    }

    async fn add_news(&self, content: &str) -> Result<i64> {
        create_news(&self.pool, content).await
    }

    async fn list_recent_news(&self, limit: i64) -> Result<Vec<NewsItem>> {
        list_recent_news(&self.pool, limit).await
    }

    async fn list_all_user_ids(&self) -> Result<Vec<i64>> {
        list_user_ids(&self.pool).await
    }
}
