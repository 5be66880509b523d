//! Database operations for the `stores` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `stores` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoreRow {
    pub id: i64,
    /// Empty for the main domain.
    pub subdomain: String,
    pub name: String,
    pub is_active: bool,
    pub address: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Returns active stores ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_stores(pool: &PgPool) -> Result<Vec<StoreRow>, DbError> {
    let rows = sqlx::query_as::<_, StoreRow>(
        "SELECT id, subdomain, name, is_active, address, phone, created_at, updated_at \
         FROM stores \
         WHERE is_active = true \
         ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a store by id regardless of its active flag.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_store(pool: &PgPool, store_id: i64) -> Result<Option<StoreRow>, DbError> {
    let row = sqlx::query_as::<_, StoreRow>(
        "SELECT id, subdomain, name, is_active, address, phone, created_at, updated_at \
         FROM stores \
         WHERE id = $1",
    )
    .bind(store_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
