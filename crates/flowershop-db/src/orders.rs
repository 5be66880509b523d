//! Placed orders and their line items.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use flowershop_core::cart::PlacedOrder;

use crate::DbError;

/// A row from `orders` joined with the discount it used, if any.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: Uuid,
    pub session_id: Option<Uuid>,
    pub customer_name: String,
    pub phone: String,
    pub comment: String,
    pub discount_id: Option<i64>,
    pub discount_code: Option<String>,
    pub discount_percent: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// An `order_items` row with the product's current title and price.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderItemRow {
    pub order_id: Uuid,
    pub product_id: i64,
    pub title: String,
    pub price: Option<Decimal>,
    pub qty: i32,
}

/// What to do with cart lines whose product is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MissingProducts {
    /// Fail with a foreign-key violation.
    Reject,
    /// Drop the line.
    Skip,
}

const ORDER_SELECT: &str = "SELECT o.id, o.session_id, o.customer_name, o.phone, o.comment, \
            o.discount_id, d.code AS discount_code, d.percent AS discount_percent, \
            o.created_at \
     FROM orders o \
     LEFT JOIN discounts d ON d.id = o.discount_id";

/// Inserts the order head and its lines inside `tx`. Returns the new order id.
pub(crate) async fn insert_order(
    tx: &mut Transaction<'_, Postgres>,
    session_id: Option<Uuid>,
    order: &PlacedOrder,
    discount_id: Option<i64>,
    missing: MissingProducts,
) -> Result<Uuid, DbError> {
    let order_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO orders (id, session_id, customer_name, phone, comment, discount_id) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(order_id)
    .bind(session_id)
    .bind(&order.name)
    .bind(&order.phone)
    .bind(&order.comment)
    .bind(discount_id)
    .execute(&mut **tx)
    .await?;

    let (product_ids, quantities): (Vec<i64>, Vec<i32>) = order
        .items
        .lines()
        .map(|(id, qty)| (id, i32::try_from(qty).unwrap_or(i32::MAX)))
        .unzip();

    let sql = match missing {
        MissingProducts::Reject => {
            "INSERT INTO order_items (order_id, product_id, qty) \
             SELECT $1, l.product_id, l.qty \
             FROM UNNEST($2::BIGINT[], $3::INT[]) AS l (product_id, qty)"
        }
        MissingProducts::Skip => {
            "INSERT INTO order_items (order_id, product_id, qty) \
             SELECT $1, l.product_id, l.qty \
             FROM UNNEST($2::BIGINT[], $3::INT[]) AS l (product_id, qty) \
             JOIN products p ON p.id = l.product_id"
        }
    };
    sqlx::query(sql)
        .bind(order_id)
        .bind(&product_ids)
        .bind(&quantities)
        .execute(&mut **tx)
        .await?;

    Ok(order_id)
}

/// Records an order entered by staff. Every line must name an existing
/// product; nothing is written otherwise.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if an insert fails, including a foreign-key
/// violation for an unknown product or discount.
pub async fn create_order(
    pool: &PgPool,
    order: &PlacedOrder,
    discount_id: Option<i64>,
) -> Result<Uuid, DbError> {
    let mut tx = pool.begin().await?;
    let order_id = insert_order(&mut tx, None, order, discount_id, MissingProducts::Reject).await?;
    tx.commit().await?;
    Ok(order_id)
}

/// Newest orders first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_orders(pool: &PgPool, limit: i64) -> Result<Vec<OrderRow>, DbError> {
    let sql = format!("{ORDER_SELECT} ORDER BY o.created_at DESC, o.id LIMIT $1");
    let rows = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_order(pool: &PgPool, id: Uuid) -> Result<Option<OrderRow>, DbError> {
    let sql = format!("{ORDER_SELECT} WHERE o.id = $1");
    let row = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Lines of the given orders, grouped by order and ordered by product id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_order_items(
    pool: &PgPool,
    order_ids: &[Uuid],
) -> Result<Vec<OrderItemRow>, DbError> {
    if order_ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = sqlx::query_as::<_, OrderItemRow>(
        "SELECT oi.order_id, oi.product_id, p.title, p.price, oi.qty \
         FROM order_items oi \
         JOIN products p ON p.id = oi.product_id \
         WHERE oi.order_id = ANY($1) \
         ORDER BY oi.order_id, oi.product_id",
    )
    .bind(order_ids)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Returns whether a row was deleted. Lines go with it.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_order(pool: &PgPool, id: Uuid) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM orders WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
