use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;

use flowershop_core::AppConfig;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// Path relative to crates/flowershop-db/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("record not found")]
    NotFound,
    #[error("invalid stored value: {0}")]
    InvalidData(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl DbError {
    /// True when the underlying error is a Postgres unique violation (`23505`).
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DbError::Sqlx(sqlx::Error::Database(db_err)) => {
                db_err.code().as_deref() == Some("23505")
            }
            _ => false,
        }
    }

    /// True when a referenced row does not exist (`23503`).
    #[must_use]
    pub fn is_foreign_key_violation(&self) -> bool {
        match self {
            DbError::Sqlx(sqlx::Error::Database(db_err)) => {
                db_err.code().as_deref() == Some("23503")
            }
            _ => false,
        }
    }
}

/// Connect to Postgres with the pool limits from configuration.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the connection cannot be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Run all pending migrations against the pool.
///
/// Returns the number of migrations that were applied.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, sqlx::migrate::MigrateError> {
    // _sqlx_migrations does not exist on a fresh database; count that as zero.
    let applied_before: i64 =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
            .fetch_one(pool)
            .await
            .unwrap_or(0);

    MIGRATOR.run(pool).await?;

    let applied_after: i64 =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
            .fetch_one(pool)
            .await
            .unwrap_or(0);

    let delta = (applied_after - applied_before).max(0);
    Ok(usize::try_from(delta).unwrap_or(0))
}

/// Send a `SELECT 1` to verify the pool has a live connection.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}

/// Run a full health check: ping the pool and return a typed error on failure.
///
/// # Errors
///
/// Returns [`DbError`] if the ping fails.
pub async fn health_check(pool: &PgPool) -> Result<(), DbError> {
    ping(pool).await?;
    Ok(())
}


pub mod carts;
pub mod categories;
pub mod discounts;
pub mod flower_tags;
pub mod hero_banners;
pub mod managers;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod seed;
pub mod showcase;
pub mod slugs;
pub mod stores;

pub use carts::{
    get_cart_session, load_cart, purge_idle_carts, save_cart, save_checkout, CartSessionRow,
};
pub use categories::{
    category_with_children_ids, create_category, delete_category, get_category,
    get_category_by_name, get_category_by_slug, list_categories, set_category_sort,
    update_category, CategoryRow,
};
pub use discounts::{
    create_discount, delete_discount, get_discount_by_code, list_discounts, update_discount,
    DiscountRow,
};
pub use flower_tags::{get_flower_tag_by_slug, list_flower_tags, FlowerTagRow};
pub use hero_banners::{
    create_hero_banner, current_hero_banner, delete_hero_banner, get_hero_banner,
    list_hero_banners, update_hero_banner, upsert_hero_banner_by_name, HeroBannerInput,
    HeroBannerRow,
};
pub use managers::{
    get_active_manager_by_telegram_id, list_manager_stores, list_managers, manager_can_post_to,
    ManagerRow,
};
pub use orders::{
    create_order, delete_order, get_order, list_order_items, list_orders, OrderItemRow, OrderRow,
};
pub use products::{
    add_product_image, create_bot_product, create_product, delete_product, delete_product_image,
    get_product, get_product_by_slug, list_all_product_images, list_all_products, list_products,
    list_products_by_flower_tag, list_products_by_ids, list_products_in_categories,
    load_product_relations, product_composition, product_slug_taken, set_primary_category,
    set_product_price, set_product_published, set_product_showcase, update_product,
    BotProductInput, NewProduct, ProductFilter, ProductImageRow, ProductPatch, ProductRelations,
    ProductRow,
};
pub use reviews::{
    create_public_review, delete_review, list_reviews, update_review, ReviewPatch, ReviewRow,
    FRONTEND_REVIEW_SOURCE, SUBMITTED_REVIEW_SORT,
};
pub use seed::{seed_catalog, SeedSummary};
pub use showcase::{
    list_category_cards, list_homepage_showcase, list_store_showcase, pin_showcase_item,
    reorder_showcase, unpin_showcase_item, CategoryCardRow, ShowcaseOrder, StoreShowcaseRow,
};
pub use slugs::{list_missing_slugs, list_taken_slugs, set_slug, MissingSlugRow, SlugTarget};
pub use stores::{get_store, list_active_stores, StoreRow};
