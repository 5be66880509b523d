//! Store managers: the Telegram accounts allowed to post products for their
//! stores.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::stores::StoreRow;
use crate::DbError;

/// A row from the `store_managers` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ManagerRow {
    pub id: i64,
    pub telegram_id: i64,
    pub telegram_username: String,
    pub full_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Looks up an active manager by Telegram user id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_active_manager_by_telegram_id(
    pool: &PgPool,
    telegram_id: i64,
) -> Result<Option<ManagerRow>, DbError> {
    let row = sqlx::query_as::<_, ManagerRow>(
        "SELECT id, telegram_id, telegram_username, full_name, is_active, created_at \
         FROM store_managers \
         WHERE telegram_id = $1 AND is_active = true",
    )
    .bind(telegram_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns every manager, active or not, ordered by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_managers(pool: &PgPool) -> Result<Vec<ManagerRow>, DbError> {
    let rows = sqlx::query_as::<_, ManagerRow>(
        "SELECT id, telegram_id, telegram_username, full_name, is_active, created_at \
         FROM store_managers \
         ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns all stores assigned to a manager, ordered by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_manager_stores(pool: &PgPool, manager_id: i64) -> Result<Vec<StoreRow>, DbError> {
    let rows = sqlx::query_as::<_, StoreRow>(
        "SELECT s.id, s.subdomain, s.name, s.is_active, s.address, s.phone, \
                s.created_at, s.updated_at \
         FROM stores s \
         JOIN store_manager_stores ms ON ms.store_id = s.id \
         WHERE ms.manager_id = $1 \
         ORDER BY s.id",
    )
    .bind(manager_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the store when it is active and assigned to the manager.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn manager_can_post_to(
    pool: &PgPool,
    manager_id: i64,
    store_id: i64,
) -> Result<Option<StoreRow>, DbError> {
    let row = sqlx::query_as::<_, StoreRow>(
        "SELECT s.id, s.subdomain, s.name, s.is_active, s.address, s.phone, \
                s.created_at, s.updated_at \
         FROM stores s \
         JOIN store_manager_stores ms ON ms.store_id = s.id \
         WHERE ms.manager_id = $1 AND s.id = $2 AND s.is_active = true",
    )
    .bind(manager_id)
    .bind(store_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
