//! Database operations for `products` and their many-to-many relations
//! (`product_categories`, `product_flower_tags`, `product_stores`) plus
//! `product_images`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use crate::categories::CategoryRow;
use crate::flower_tags::FlowerTagRow;
use crate::stores::StoreRow;
use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A product joined with the name of its primary category.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub title: String,
    pub article: String,
    pub description: String,
    pub price: Option<Decimal>,
    pub image: String,
    pub uploaded_image: Option<String>,
    pub is_online_showcase: bool,
    pub showcase_channel: String,
    pub showcase_sort_order: i32,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub slug: String,
    pub is_published: bool,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row from the `product_images` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductImageRow {
    pub id: i64,
    pub product_id: i64,
    pub image: String,
    pub sort_order: i32,
}

/// Everything a product detail view shows besides the product row itself.
#[derive(Debug, Clone, Default)]
pub struct ProductRelations {
    pub categories: Vec<CategoryRow>,
    pub flower_tags: Vec<FlowerTagRow>,
    pub stores: Vec<StoreRow>,
    pub images: Vec<ProductImageRow>,
}

const PRODUCT_SELECT: &str = "\
    SELECT p.id, p.title, p.article, p.description, p.price, p.image, p.uploaded_image, \
           p.is_online_showcase, p.showcase_channel, p.showcase_sort_order, \
           p.category_id, c.name AS category_name, p.slug, p.is_published, p.created_by, \
           p.created_at, p.updated_at \
    FROM products p \
    LEFT JOIN categories c ON c.id = p.category_id";

const PRODUCT_RETURNING: &str = "\
    RETURNING id, title, article, description, price, image, uploaded_image, \
              is_online_showcase, showcase_channel, showcase_sort_order, category_id, \
              (SELECT name FROM categories WHERE id = category_id) AS category_name, \
              slug, is_published, created_by, created_at, updated_at";

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Filters for the public product list.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductFilter<'a> {
    /// Exact primary category name.
    pub category: Option<&'a str>,
    /// Exact store subdomain (empty string is the main store).
    pub store_subdomain: Option<&'a str>,
    /// Exact flower tag name.
    pub flower_tag: Option<&'a str>,
    /// Restrict to the online showcase and order by showcase position.
    pub online_showcase: bool,
    pub include_unpublished: bool,
    pub limit: i64,
}

/// Fields for a staff-created product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub title: String,
    pub article: String,
    pub description: String,
    pub price: Option<Decimal>,
    pub image: String,
    pub is_online_showcase: bool,
    pub showcase_channel: String,
    pub showcase_sort_order: i32,
    pub category_id: Option<i64>,
    pub slug: String,
    pub is_published: bool,
    pub category_ids: Vec<i64>,
    pub flower_tag_ids: Vec<i64>,
    pub store_ids: Vec<i64>,
}

/// Sparse product update. `None` keeps the current value.
#[allow(clippy::option_option)]
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub title: Option<String>,
    pub article: Option<String>,
    pub description: Option<String>,
    pub price: Option<Option<Decimal>>,
    pub image: Option<String>,
    pub is_online_showcase: Option<bool>,
    pub showcase_channel: Option<String>,
    pub showcase_sort_order: Option<i32>,
    pub category_id: Option<Option<i64>>,
    pub slug: Option<String>,
    pub is_published: Option<bool>,
    pub category_ids: Option<Vec<i64>>,
    pub flower_tag_ids: Option<Vec<i64>>,
    pub store_ids: Option<Vec<i64>>,
}

/// A product posted by a store manager through the Telegram bot.
#[derive(Debug, Clone)]
pub struct BotProductInput {
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub slug: String,
    pub uploaded_image: String,
    /// Absolute public URL of the uploaded file.
    pub image: String,
    pub manager_id: i64,
    pub store_id: i64,
    /// Subdomain used to build the article; empty means the main store.
    pub store_subdomain: String,
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Returns products matching `filter`, newest first, or by showcase position
/// when `online_showcase` is set.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products(
    pool: &PgPool,
    filter: ProductFilter<'_>,
) -> Result<Vec<ProductRow>, DbError> {
    let sql = format!(
        "{PRODUCT_SELECT} \
         WHERE ($1::TEXT IS NULL OR c.name = $1) \
           AND ($2::TEXT IS NULL OR EXISTS ( \
                SELECT 1 FROM product_stores ps \
                JOIN stores s ON s.id = ps.store_id \
                WHERE ps.product_id = p.id AND s.subdomain = $2)) \
           AND ($3::TEXT IS NULL OR EXISTS ( \
                SELECT 1 FROM product_flower_tags pf \
                JOIN flower_tags f ON f.id = pf.flower_tag_id \
                WHERE pf.product_id = p.id AND f.name = $3)) \
           AND (NOT $4::BOOL OR p.is_online_showcase) \
           AND ($5::BOOL OR p.is_published) \
         ORDER BY CASE WHEN $4::BOOL THEN p.showcase_sort_order ELSE 0 END, p.id DESC \
         LIMIT $6"
    );
    let rows = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(filter.category)
        .bind(filter.store_subdomain)
        .bind(filter.flower_tag)
        .bind(filter.online_showcase)
        .bind(filter.include_unpublished)
        .bind(filter.limit)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Returns a product by id. Unpublished products are hidden unless
/// `include_unpublished` is set.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product(
    pool: &PgPool,
    id: i64,
    include_unpublished: bool,
) -> Result<Option<ProductRow>, DbError> {
    let sql = format!("{PRODUCT_SELECT} WHERE p.id = $1 AND ($2::BOOL OR p.is_published)");
    let row = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(id)
        .bind(include_unpublished)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Returns a published product by slug.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product_by_slug(pool: &PgPool, slug: &str) -> Result<Option<ProductRow>, DbError> {
    let sql = format!("{PRODUCT_SELECT} WHERE p.slug = $1 AND p.slug <> '' AND p.is_published");
    let row = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Published products whose primary or secondary category is one of
/// `category_ids`, optionally narrowed to a flower tag, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products_in_categories(
    pool: &PgPool,
    category_ids: &[i64],
    flower_tag_id: Option<i64>,
) -> Result<Vec<ProductRow>, DbError> {
    let sql = format!(
        "{PRODUCT_SELECT} \
         WHERE p.is_published \
           AND (p.category_id = ANY($1) OR EXISTS ( \
                SELECT 1 FROM product_categories pc \
                WHERE pc.product_id = p.id AND pc.category_id = ANY($1))) \
           AND ($2::BIGINT IS NULL OR EXISTS ( \
                SELECT 1 FROM product_flower_tags pf \
                WHERE pf.product_id = p.id AND pf.flower_tag_id = $2)) \
         ORDER BY p.id DESC"
    );
    let rows = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(category_ids)
        .bind(flower_tag_id)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Published products carrying a flower tag, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products_by_flower_tag(
    pool: &PgPool,
    flower_tag_id: i64,
) -> Result<Vec<ProductRow>, DbError> {
    let sql = format!(
        "{PRODUCT_SELECT} \
         WHERE p.is_published \
           AND EXISTS (SELECT 1 FROM product_flower_tags pf \
                       WHERE pf.product_id = p.id AND pf.flower_tag_id = $1) \
         ORDER BY p.id DESC"
    );
    let rows = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(flower_tag_id)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Published products among `ids`, used to render a cart.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products_by_ids(pool: &PgPool, ids: &[i64]) -> Result<Vec<ProductRow>, DbError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!("{PRODUCT_SELECT} WHERE p.id = ANY($1) AND p.is_published ORDER BY p.id");
    let rows = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(ids)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Every product ordered by id, for batch maintenance.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_all_products(pool: &PgPool) -> Result<Vec<ProductRow>, DbError> {
    let sql = format!("{PRODUCT_SELECT} ORDER BY p.id");
    let rows = sqlx::query_as::<_, ProductRow>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

/// Loads categories, flower tags, stores and images for one product.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any query fails.
pub async fn load_product_relations(
    pool: &PgPool,
    product_id: i64,
) -> Result<ProductRelations, DbError> {
    let categories = sqlx::query_as::<_, CategoryRow>(
        "SELECT c.id, c.name, c.slug, c.parent_id, c.sort_order, c.created_at \
         FROM categories c \
         JOIN product_categories pc ON pc.category_id = c.id \
         WHERE pc.product_id = $1 \
         ORDER BY c.sort_order, c.name",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    let flower_tags = sqlx::query_as::<_, FlowerTagRow>(
        "SELECT f.id, f.name, f.slug, f.sort_order \
         FROM flower_tags f \
         JOIN product_flower_tags pf ON pf.flower_tag_id = f.id \
         WHERE pf.product_id = $1 \
         ORDER BY f.sort_order, f.name",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    let stores = sqlx::query_as::<_, StoreRow>(
        "SELECT s.id, s.subdomain, s.name, s.is_active, s.address, s.phone, \
                s.created_at, s.updated_at \
         FROM stores s \
         JOIN product_stores ps ON ps.store_id = s.id \
         WHERE ps.product_id = $1 \
         ORDER BY s.id",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    let images = sqlx::query_as::<_, ProductImageRow>(
        "SELECT id, product_id, image, sort_order \
         FROM product_images \
         WHERE product_id = $1 \
         ORDER BY sort_order, id",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    Ok(ProductRelations {
        categories,
        flower_tags,
        stores,
        images,
    })
}

/// Names of a product's flower tags joined by `", "`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn product_composition(pool: &PgPool, product_id: i64) -> Result<String, DbError> {
    let composition = sqlx::query_scalar::<_, Option<String>>(
        "SELECT string_agg(f.name, ', ' ORDER BY f.sort_order, f.name) \
         FROM flower_tags f \
         JOIN product_flower_tags pf ON pf.flower_tag_id = f.id \
         WHERE pf.product_id = $1",
    )
    .bind(product_id)
    .fetch_one(pool)
    .await?;

    Ok(composition.unwrap_or_default())
}

/// Whether any product already uses `slug`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn product_slug_taken(pool: &PgPool, slug: &str) -> Result<bool, DbError> {
    let taken = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM products WHERE slug = $1)")
        .bind(slug)
        .fetch_one(pool)
        .await?;
    Ok(taken)
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Inserts a staff-created product together with its relation sets.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails (slug conflicts, unknown
/// related ids). Nothing is written then.
pub async fn create_product(pool: &PgPool, product: &NewProduct) -> Result<ProductRow, DbError> {
    let mut tx = pool.begin().await?;

    let sql = format!(
        "INSERT INTO products \
             (title, article, description, price, image, is_online_showcase, \
              showcase_channel, showcase_sort_order, category_id, slug, is_published) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         {PRODUCT_RETURNING}"
    );
    let row = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(&product.title)
        .bind(&product.article)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.image)
        .bind(product.is_online_showcase)
        .bind(&product.showcase_channel)
        .bind(product.showcase_sort_order)
        .bind(product.category_id)
        .bind(&product.slug)
        .bind(product.is_published)
        .fetch_one(&mut *tx)
        .await?;

    for (table, column, ids) in [
        ("product_categories", "category_id", &product.category_ids),
        ("product_flower_tags", "flower_tag_id", &product.flower_tag_ids),
        ("product_stores", "store_id", &product.store_ids),
    ] {
        if !ids.is_empty() {
            replace_links(&mut tx, table, column, row.id, ids).await?;
        }
    }

    tx.commit().await?;
    Ok(row)
}

/// Applies a sparse update, replacing relation sets that are supplied.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the product does not exist, or
/// [`DbError::Sqlx`] if any statement fails. The whole update is rolled back
/// on failure.
pub async fn update_product(
    pool: &PgPool,
    id: i64,
    patch: &ProductPatch,
) -> Result<ProductRow, DbError> {
    let mut tx = pool.begin().await?;

    let price_supplied = patch.price.is_some();
    let price_val = patch.price.flatten();
    let category_supplied = patch.category_id.is_some();
    let category_val = patch.category_id.flatten();

    let sql = format!(
        "UPDATE products \
         SET title               = COALESCE($2, title), \
             article             = COALESCE($3, article), \
             description         = COALESCE($4, description), \
             price               = CASE WHEN $5::BOOL THEN $6 ELSE price END, \
             image               = COALESCE($7, image), \
             is_online_showcase  = COALESCE($8, is_online_showcase), \
             showcase_channel    = COALESCE($9, showcase_channel), \
             showcase_sort_order = COALESCE($10, showcase_sort_order), \
             category_id         = CASE WHEN $11::BOOL THEN $12 ELSE category_id END, \
             slug                = COALESCE($13, slug), \
             is_published        = COALESCE($14, is_published), \
             updated_at          = NOW() \
         WHERE id = $1 \
         {PRODUCT_RETURNING}"
    );
    let row = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(id)
        .bind(patch.title.as_deref())
        .bind(patch.article.as_deref())
        .bind(patch.description.as_deref())
        .bind(price_supplied)
        .bind(price_val)
        .bind(patch.image.as_deref())
        .bind(patch.is_online_showcase)
        .bind(patch.showcase_channel.as_deref())
        .bind(patch.showcase_sort_order)
        .bind(category_supplied)
        .bind(category_val)
        .bind(patch.slug.as_deref())
        .bind(patch.is_published)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DbError::NotFound)?;

    if let Some(ids) = &patch.category_ids {
        replace_links(&mut tx, "product_categories", "category_id", id, ids).await?;
    }
    if let Some(ids) = &patch.flower_tag_ids {
        replace_links(&mut tx, "product_flower_tags", "flower_tag_id", id, ids).await?;
    }
    if let Some(ids) = &patch.store_ids {
        replace_links(&mut tx, "product_stores", "store_id", id, ids).await?;
    }

    tx.commit().await?;
    Ok(row)
}

async fn replace_links(
    tx: &mut Transaction<'_, Postgres>,
    table: &str,
    column: &str,
    product_id: i64,
    ids: &[i64],
) -> Result<(), DbError> {
    sqlx::query(&format!("DELETE FROM {table} WHERE product_id = $1"))
        .bind(product_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query(&format!(
        "INSERT INTO {table} (product_id, {column}) \
         SELECT $1, UNNEST($2::BIGINT[]) \
         ON CONFLICT DO NOTHING"
    ))
    .bind(product_id)
    .bind(ids)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Deletes a product. Returns whether a row was deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_product(pool: &PgPool, id: i64) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ---------------------------------------------------------------------------
// Gallery images
// ---------------------------------------------------------------------------

/// Appends a gallery image to a product.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails; an unknown product is a
/// foreign-key violation.
pub async fn add_product_image(
    pool: &PgPool,
    product_id: i64,
    image: &str,
    sort_order: i32,
) -> Result<ProductImageRow, DbError> {
    let row = sqlx::query_as::<_, ProductImageRow>(
        "INSERT INTO product_images (product_id, image, sort_order) VALUES ($1, $2, $3) \
         RETURNING id, product_id, image, sort_order",
    )
    .bind(product_id)
    .bind(image)
    .bind(sort_order)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Removes one gallery image of `product_id`. Returns whether a row was deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_product_image(
    pool: &PgPool,
    product_id: i64,
    image_id: i64,
) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM product_images WHERE id = $1 AND product_id = $2")
        .bind(image_id)
        .bind(product_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Every gallery image, by product then position.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_all_product_images(pool: &PgPool) -> Result<Vec<ProductImageRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductImageRow>(
        "SELECT id, product_id, image, sort_order FROM product_images \
         ORDER BY product_id, sort_order, id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Sets the price of a product.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the product does not exist, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn set_product_price(pool: &PgPool, id: i64, price: Decimal) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE products SET price = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(price)
        .execute(pool)
        .await?;
    expect_one(result.rows_affected())
}

/// Toggles the online showcase flag.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the product does not exist, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn set_product_showcase(pool: &PgPool, id: i64, value: bool) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE products SET is_online_showcase = $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(value)
    .execute(pool)
    .await?;
    expect_one(result.rows_affected())
}

/// Toggles publication.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the product does not exist, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn set_product_published(pool: &PgPool, id: i64, value: bool) -> Result<(), DbError> {
    let result =
        sqlx::query("UPDATE products SET is_published = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(value)
            .execute(pool)
            .await?;
    expect_one(result.rows_affected())
}

/// Sets the primary category.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn set_primary_category(
    pool: &PgPool,
    id: i64,
    category_id: Option<i64>,
) -> Result<(), DbError> {
    sqlx::query("UPDATE products SET category_id = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(category_id)
        .execute(pool)
        .await?;
    Ok(())
}

fn expect_one(rows_affected: u64) -> Result<(), DbError> {
    if rows_affected == 0 {
        Err(DbError::NotFound)
    } else {
        Ok(())
    }
}

/// Creates a bot-uploaded product in one transaction: the product row
/// (published, in the showcase, owned by the manager), its store link, the
/// store showcase entry and an article derived from the store and new id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails (including slug conflicts).
pub async fn create_bot_product(
    pool: &PgPool,
    input: &BotProductInput,
) -> Result<ProductRow, DbError> {
    let mut tx = pool.begin().await?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO products \
             (title, description, price, image, uploaded_image, is_online_showcase, \
              is_published, slug, created_by) \
         VALUES ($1, $2, $3, $4, $5, true, true, $6, $7) \
         RETURNING id",
    )
    .bind(&input.title)
    .bind(&input.description)
    .bind(input.price)
    .bind(&input.image)
    .bind(&input.uploaded_image)
    .bind(&input.slug)
    .bind(input.manager_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO product_stores (product_id, store_id) VALUES ($1, $2)")
        .bind(id)
        .bind(input.store_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "INSERT INTO showcase_items (store_id, product_id) VALUES ($1, $2) \
         ON CONFLICT (store_id, product_id) DO NOTHING",
    )
    .bind(input.store_id)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    let store_slug = if input.store_subdomain.is_empty() {
        "main"
    } else {
        input.store_subdomain.as_str()
    };
    let article = flowershop_core::slug::truncate_slug(
        &flowershop_core::slugify(&format!("{store_slug}-{id}")),
        64,
    );
    sqlx::query(
        "UPDATE products SET article = $2, updated_at = NOW() WHERE id = $1 AND article = ''",
    )
        .bind(id)
        .bind(&article)
        .execute(&mut *tx)
        .await?;

    let sql = format!("{PRODUCT_SELECT} WHERE p.id = $1");
    let row = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(row)
}
