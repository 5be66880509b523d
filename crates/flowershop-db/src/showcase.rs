//! Homepage showcase, per-store showcase entries and homepage category cards.

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::products::ProductRow;
use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A root category with the newest two published products that qualify it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryCardRow {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub first_image: Option<String>,
    pub first_uploaded_image: Option<String>,
    /// `None` when only one product qualifies the category.
    pub second_image: Option<String>,
    pub second_uploaded_image: Option<String>,
}

/// A product pinned to a store's showcase.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoreShowcaseRow {
    pub item_id: i64,
    pub sort_order: i32,
    pub product_id: i64,
    pub title: String,
    pub slug: String,
    pub price: Option<Decimal>,
    pub image: String,
    pub uploaded_image: Option<String>,
}

/// New position of one product in the homepage showcase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShowcaseOrder {
    pub product_id: i64,
    pub sort_order: i32,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Published online-showcase products ordered by `(showcase_sort_order, -id)`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_homepage_showcase(pool: &PgPool, limit: i64) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(
        "SELECT p.id, p.title, p.article, p.description, p.price, p.image, p.uploaded_image, \
                p.is_online_showcase, p.showcase_channel, p.showcase_sort_order, \
                p.category_id, c.name AS category_name, p.slug, p.is_published, p.created_by, \
                p.created_at, p.updated_at \
         FROM products p \
         LEFT JOIN categories c ON c.id = p.category_id \
         WHERE p.is_online_showcase AND p.is_published \
         ORDER BY p.showcase_sort_order, p.id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Published products pinned to one store, by `(sort_order, -product id)`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_store_showcase(
    pool: &PgPool,
    store_id: i64,
) -> Result<Vec<StoreShowcaseRow>, DbError> {
    let rows = sqlx::query_as::<_, StoreShowcaseRow>(
        "SELECT si.id AS item_id, si.sort_order, p.id AS product_id, p.title, p.slug, \
                p.price, p.image, p.uploaded_image \
         FROM showcase_items si \
         JOIN products p ON p.id = si.product_id \
         WHERE si.store_id = $1 AND p.is_published \
         ORDER BY si.sort_order, p.id DESC",
    )
    .bind(store_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Rewrites `showcase_sort_order` for each entry in one transaction.
///
/// Returns how many products were updated; ids that do not exist are skipped.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any update fails; nothing is applied then.
pub async fn reorder_showcase(pool: &PgPool, order: &[ShowcaseOrder]) -> Result<u64, DbError> {
    let mut tx = pool.begin().await?;
    let mut updated = 0;

    for entry in order {
        let result = sqlx::query(
            "UPDATE products SET showcase_sort_order = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(entry.product_id)
        .bind(entry.sort_order)
        .execute(&mut *tx)
        .await?;
        updated += result.rows_affected();
    }

    tx.commit().await?;
    Ok(updated)
}

/// Pins a product to a store's showcase, or moves it when already pinned.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails; an unknown store or product
/// is a foreign-key violation.
pub async fn pin_showcase_item(
    pool: &PgPool,
    store_id: i64,
    product_id: i64,
    sort_order: i32,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO showcase_items (store_id, product_id, sort_order) VALUES ($1, $2, $3) \
         ON CONFLICT (store_id, product_id) DO UPDATE SET sort_order = EXCLUDED.sort_order",
    )
    .bind(store_id)
    .bind(product_id)
    .bind(sort_order)
    .execute(pool)
    .await?;
    Ok(())
}

/// Returns whether the product was pinned.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn unpin_showcase_item(
    pool: &PgPool,
    store_id: i64,
    product_id: i64,
) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM showcase_items WHERE store_id = $1 AND product_id = $2")
        .bind(store_id)
        .bind(product_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Root categories in `(sort_order, name)` order that have at least one
/// published product, through either the primary category or the secondary
/// category set. Each card carries images of the two newest such products.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_category_cards(pool: &PgPool) -> Result<Vec<CategoryCardRow>, DbError> {
    let rows = sqlx::query_as::<_, CategoryCardRow>(
        "WITH linked AS ( \
             SELECT DISTINCT c.id AS category_id, p.id AS product_id, p.image, p.uploaded_image \
             FROM categories c \
             JOIN products p ON p.is_published AND ( \
                  p.category_id = c.id OR EXISTS ( \
                      SELECT 1 FROM product_categories pc \
                      WHERE pc.product_id = p.id AND pc.category_id = c.id)) \
             WHERE c.parent_id IS NULL \
         ), ranked AS ( \
             SELECT category_id, image, uploaded_image, \
                    ROW_NUMBER() OVER (PARTITION BY category_id ORDER BY product_id DESC) AS rn \
             FROM linked \
         ) \
         SELECT c.id, c.name, c.slug, \
                r1.image AS first_image, r1.uploaded_image AS first_uploaded_image, \
                r2.image AS second_image, r2.uploaded_image AS second_uploaded_image \
         FROM categories c \
         JOIN ranked r1 ON r1.category_id = c.id AND r1.rn = 1 \
         LEFT JOIN ranked r2 ON r2.category_id = c.id AND r2.rn = 2 \
         WHERE c.parent_id IS NULL \
         ORDER BY c.sort_order, c.name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
