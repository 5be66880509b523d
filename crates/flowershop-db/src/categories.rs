//! Database operations for the `categories` tree.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `categories` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<i64>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns every category ordered by `(sort_order, name)`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_categories(pool: &PgPool) -> Result<Vec<CategoryRow>, DbError> {
    let rows = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, name, slug, parent_id, sort_order, created_at \
         FROM categories \
         ORDER BY sort_order, name, id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns one category by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_category(pool: &PgPool, id: i64) -> Result<Option<CategoryRow>, DbError> {
    let row = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, name, slug, parent_id, sort_order, created_at \
         FROM categories \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns the oldest category carrying `slug`. Category slugs are not unique.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_category_by_slug(
    pool: &PgPool,
    slug: &str,
) -> Result<Option<CategoryRow>, DbError> {
    let row = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, name, slug, parent_id, sort_order, created_at \
         FROM categories \
         WHERE slug = $1 AND slug <> '' \
         ORDER BY id \
         LIMIT 1",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns the first category with exactly this name, roots first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_category_by_name(
    pool: &PgPool,
    name: &str,
) -> Result<Option<CategoryRow>, DbError> {
    let row = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, name, slug, parent_id, sort_order, created_at \
         FROM categories \
         WHERE name = $1 \
         ORDER BY parent_id NULLS FIRST, id \
         LIMIT 1",
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// The category itself plus its direct children, used for catalog filtering.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn category_with_children_ids(pool: &PgPool, id: i64) -> Result<Vec<i64>, DbError> {
    let ids = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM categories WHERE id = $1 OR parent_id = $1 ORDER BY id",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Inserts a category. A duplicate `(name, parent)` surfaces as a unique
/// violation (see [`DbError::is_unique_violation`]).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_category(
    pool: &PgPool,
    name: &str,
    slug: &str,
    parent_id: Option<i64>,
    sort_order: i32,
) -> Result<CategoryRow, DbError> {
    let row = sqlx::query_as::<_, CategoryRow>(
        "INSERT INTO categories (name, slug, parent_id, sort_order) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, name, slug, parent_id, sort_order, created_at",
    )
    .bind(name)
    .bind(slug)
    .bind(parent_id)
    .bind(sort_order)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Renames and/or re-parents a category.
///
/// `parent_id`: `None` keeps the parent, `Some(None)` makes it a root,
/// `Some(Some(id))` moves it under `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no such category exists, or
/// [`DbError::Sqlx`] if the update fails.
#[allow(clippy::option_option)]
pub async fn update_category(
    pool: &PgPool,
    id: i64,
    name: Option<&str>,
    parent_id: Option<Option<i64>>,
) -> Result<CategoryRow, DbError> {
    let parent_supplied = parent_id.is_some();
    let parent_val = parent_id.flatten();

    let row = sqlx::query_as::<_, CategoryRow>(
        "UPDATE categories \
         SET name      = COALESCE($2, name), \
             parent_id = CASE WHEN $3::BOOL THEN $4 ELSE parent_id END \
         WHERE id = $1 \
         RETURNING id, name, slug, parent_id, sort_order, created_at",
    )
    .bind(id)
    .bind(name)
    .bind(parent_supplied)
    .bind(parent_val)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}

/// Sets a category's sort position.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no such category exists, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn set_category_sort(
    pool: &PgPool,
    id: i64,
    sort_order: i32,
) -> Result<CategoryRow, DbError> {
    let row = sqlx::query_as::<_, CategoryRow>(
        "UPDATE categories SET sort_order = $2 WHERE id = $1 \
         RETURNING id, name, slug, parent_id, sort_order, created_at",
    )
    .bind(id)
    .bind(sort_order)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}

/// Deletes a category and, through the FK cascade, its subtree. Products that
/// used it as primary category keep existing with `category_id` nulled.
///
/// Returns whether a row was deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_category(pool: &PgPool, id: i64) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
