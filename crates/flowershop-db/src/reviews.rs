//! Database operations for customer `reviews`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use flowershop_core::ReviewDraft;

use crate::DbError;

/// `source_url` recorded on reviews submitted through the site form.
pub const FRONTEND_REVIEW_SOURCE: &str = "frontend_form";

/// Sort position of freshly submitted reviews, after every curated one.
pub const SUBMITTED_REVIEW_SORT: i32 = 9999;

/// A row from the `reviews` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReviewRow {
    pub id: i64,
    pub author: String,
    pub company: String,
    pub text: String,
    pub rating: i16,
    pub image: String,
    pub source_url: String,
    pub is_published: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Moderation changes to a review. `None` keeps the current value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewPatch {
    pub is_published: Option<bool>,
    pub sort_order: Option<i32>,
}

const REVIEW_COLUMNS: &str = "id, author, company, text, rating, image, source_url, \
     is_published, sort_order, created_at, updated_at";

/// Reviews ordered by `(sort_order, created_at DESC)`. Unpublished reviews are
/// only included when `include_unpublished` is set.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_reviews(
    pool: &PgPool,
    include_unpublished: bool,
) -> Result<Vec<ReviewRow>, DbError> {
    let sql = format!(
        "SELECT {REVIEW_COLUMNS} FROM reviews \
         WHERE $1::BOOL OR is_published \
         ORDER BY sort_order, created_at DESC, id DESC"
    );
    let rows = sqlx::query_as::<_, ReviewRow>(&sql)
        .bind(include_unpublished)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Stores a validated site-form review, unpublished and sorted last.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_public_review(pool: &PgPool, draft: &ReviewDraft) -> Result<ReviewRow, DbError> {
    let sql = format!(
        "INSERT INTO reviews (author, company, text, rating, source_url, is_published, sort_order) \
         VALUES ($1, $2, $3, $4, $5, false, $6) \
         RETURNING {REVIEW_COLUMNS}"
    );
    let row = sqlx::query_as::<_, ReviewRow>(&sql)
        .bind(&draft.author)
        .bind(&draft.company)
        .bind(&draft.text)
        .bind(draft.rating)
        .bind(FRONTEND_REVIEW_SOURCE)
        .bind(SUBMITTED_REVIEW_SORT)
        .fetch_one(pool)
        .await?;
    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if the review does not exist, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_review(pool: &PgPool, id: i64, patch: ReviewPatch) -> Result<ReviewRow, DbError> {
    let sql = format!(
        "UPDATE reviews \
         SET is_published = COALESCE($2, is_published), \
             sort_order   = COALESCE($3, sort_order), \
             updated_at   = NOW() \
         WHERE id = $1 \
         RETURNING {REVIEW_COLUMNS}"
    );
    let row = sqlx::query_as::<_, ReviewRow>(&sql)
        .bind(id)
        .bind(patch.is_published)
        .bind(patch.sort_order)
        .fetch_optional(pool)
        .await?;
    row.ok_or(DbError::NotFound)
}

/// Returns whether a row was deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_review(pool: &PgPool, id: i64) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
