//! Server-side cart storage keyed by the session cookie id.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use flowershop_core::cart::PlacedOrder;
use flowershop_core::Cart;

use crate::orders::{insert_order, MissingProducts};
use crate::DbError;

/// A row from the `cart_sessions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartSessionRow {
    pub session_id: Uuid,
    pub items: Json<Cart>,
    pub last_order: Option<Json<PlacedOrder>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Returns the cart bound to `session_id`, or an empty cart for a new session.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails or the stored JSON does not
/// decode.
pub async fn load_cart(pool: &PgPool, session_id: Uuid) -> Result<Cart, DbError> {
    let items = sqlx::query_scalar::<_, Json<Cart>>(
        "SELECT items FROM cart_sessions WHERE session_id = $1",
    )
    .bind(session_id)
    .fetch_optional(pool)
    .await?;

    Ok(items.map(|Json(cart)| cart).unwrap_or_default())
}

/// Returns the full session row, including the last placed order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_cart_session(
    pool: &PgPool,
    session_id: Uuid,
) -> Result<Option<CartSessionRow>, DbError> {
    let row = sqlx::query_as::<_, CartSessionRow>(
        "SELECT session_id, items, last_order, created_at, updated_at \
         FROM cart_sessions WHERE session_id = $1",
    )
    .bind(session_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Persists the cart, creating the session row on first write.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn save_cart(pool: &PgPool, session_id: Uuid, cart: &Cart) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO cart_sessions (session_id, items) VALUES ($1, $2) \
         ON CONFLICT (session_id) DO UPDATE \
         SET items = EXCLUDED.items, updated_at = NOW()",
    )
    .bind(session_id)
    .bind(Json(cart))
    .execute(pool)
    .await?;

    Ok(())
}

/// Records a placed order and empties the cart in one transaction. Lines whose
/// product has been deleted since it was added are dropped. Returns the id of
/// the new `orders` row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if an insert or the upsert fails.
pub async fn save_checkout(
    pool: &PgPool,
    session_id: Uuid,
    order: &PlacedOrder,
    discount_id: Option<i64>,
) -> Result<Uuid, DbError> {
    let mut tx = pool.begin().await?;
    let order_id = insert_order(
        &mut tx,
        Some(session_id),
        order,
        discount_id,
        MissingProducts::Skip,
    )
    .await?;

    sqlx::query(
        "INSERT INTO cart_sessions (session_id, items, last_order) \
         VALUES ($1, '{}'::jsonb, $2) \
         ON CONFLICT (session_id) DO UPDATE \
         SET items = '{}'::jsonb, last_order = EXCLUDED.last_order, updated_at = NOW()",
    )
    .bind(session_id)
    .bind(Json(order))
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(order_id)
}

/// Deletes sessions untouched for `ttl_days` days. Returns how many were removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn purge_idle_carts(pool: &PgPool, ttl_days: u32) -> Result<u64, DbError> {
    let result = sqlx::query(
        "DELETE FROM cart_sessions WHERE updated_at < NOW() - make_interval(days => $1)",
    )
    .bind(i32::try_from(ttl_days).unwrap_or(i32::MAX))
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
