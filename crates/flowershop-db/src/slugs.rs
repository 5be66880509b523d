//! Slug maintenance shared by categories, flower tags and products.

use sqlx::PgPool;

use crate::DbError;

/// Table whose `slug` column is being maintained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlugTarget {
    Category,
    FlowerTag,
    Product,
}

impl SlugTarget {
    fn table(self) -> &'static str {
        match self {
            SlugTarget::Category => "categories",
            SlugTarget::FlowerTag => "flower_tags",
            SlugTarget::Product => "products",
        }
    }

    fn label_column(self) -> &'static str {
        match self {
            SlugTarget::Category | SlugTarget::FlowerTag => "name",
            SlugTarget::Product => "title",
        }
    }

    /// Base used when a name transliterates to nothing.
    #[must_use]
    pub fn fallback_prefix(self) -> &'static str {
        match self {
            SlugTarget::Category => "category",
            SlugTarget::FlowerTag => "flower",
            SlugTarget::Product => "product",
        }
    }
}

/// A row still lacking a slug.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MissingSlugRow {
    pub id: i64,
    pub label: String,
}

/// Returns every non-empty slug already used in the target table.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_taken_slugs(pool: &PgPool, target: SlugTarget) -> Result<Vec<String>, DbError> {
    let sql = format!("SELECT slug FROM {} WHERE slug <> ''", target.table());
    let slugs = sqlx::query_scalar::<_, String>(&sql).fetch_all(pool).await?;
    Ok(slugs)
}

/// Returns rows with an empty slug, ordered by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_missing_slugs(
    pool: &PgPool,
    target: SlugTarget,
) -> Result<Vec<MissingSlugRow>, DbError> {
    let sql = format!(
        "SELECT id, {} AS label FROM {} WHERE slug = '' ORDER BY id",
        target.label_column(),
        target.table()
    );
    let rows = sqlx::query_as::<_, MissingSlugRow>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Writes one slug.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn set_slug(
    pool: &PgPool,
    target: SlugTarget,
    id: i64,
    slug: &str,
) -> Result<(), DbError> {
    let sql = format!("UPDATE {} SET slug = $2 WHERE id = $1", target.table());
    sqlx::query(&sql).bind(id).bind(slug).execute(pool).await?;
    Ok(())
}
