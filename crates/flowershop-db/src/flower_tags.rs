//! Database operations for `flower_tags`.

use sqlx::PgPool;

use crate::DbError;

/// A row from the `flower_tags` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FlowerTagRow {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub sort_order: i32,
}

/// Returns all flower tags ordered by `(sort_order, name)`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_flower_tags(pool: &PgPool) -> Result<Vec<FlowerTagRow>, DbError> {
    let rows = sqlx::query_as::<_, FlowerTagRow>(
        "SELECT id, name, slug, sort_order FROM flower_tags ORDER BY sort_order, name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a flower tag by its (non-empty) slug.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_flower_tag_by_slug(
    pool: &PgPool,
    slug: &str,
) -> Result<Option<FlowerTagRow>, DbError> {
    let row = sqlx::query_as::<_, FlowerTagRow>(
        "SELECT id, name, slug, sort_order FROM flower_tags WHERE slug = $1 AND slug <> ''",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
