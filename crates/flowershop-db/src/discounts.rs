//! Database operations for percentage `discounts`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `discounts` table. `code` is stored upper-cased.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DiscountRow {
    pub id: i64,
    pub code: String,
    pub percent: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const DISCOUNT_COLUMNS: &str = "id, code, percent, created_at, updated_at";

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_discounts(pool: &PgPool) -> Result<Vec<DiscountRow>, DbError> {
    let sql = format!("SELECT {DISCOUNT_COLUMNS} FROM discounts ORDER BY code");
    let rows = sqlx::query_as::<_, DiscountRow>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Looks a code up exactly; callers normalize it first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_discount_by_code(
    pool: &PgPool,
    code: &str,
) -> Result<Option<DiscountRow>, DbError> {
    let sql = format!("SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE code = $1");
    let row = sqlx::query_as::<_, DiscountRow>(&sql)
        .bind(code)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails; a duplicate code is a
/// unique violation.
pub async fn create_discount(
    pool: &PgPool,
    code: &str,
    percent: i32,
) -> Result<DiscountRow, DbError> {
    let sql = format!(
        "INSERT INTO discounts (code, percent) VALUES ($1, $2) RETURNING {DISCOUNT_COLUMNS}"
    );
    let row = sqlx::query_as::<_, DiscountRow>(&sql)
        .bind(code)
        .bind(percent)
        .fetch_one(pool)
        .await?;
    Ok(row)
}

/// Replaces code and percent.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the discount does not exist, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_discount(
    pool: &PgPool,
    id: i64,
    code: &str,
    percent: i32,
) -> Result<DiscountRow, DbError> {
    let sql = format!(
        "UPDATE discounts SET code = $2, percent = $3, updated_at = NOW() \
         WHERE id = $1 RETURNING {DISCOUNT_COLUMNS}"
    );
    let row = sqlx::query_as::<_, DiscountRow>(&sql)
        .bind(id)
        .bind(code)
        .bind(percent)
        .fetch_optional(pool)
        .await?;
    row.ok_or(DbError::NotFound)
}

/// Orders that used the code keep their rows with `discount_id` cleared.
/// Returns whether a row was deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_discount(pool: &PgPool, id: i64) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM discounts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
