use flowershop_core::seed::{CategorySeed, HeroBannerSeed};
use flowershop_core::{slugify, CatalogFile};
use sqlx::{PgConnection, PgPool};

use crate::hero_banners::{upsert_hero_banner_by_name, HeroBannerInput};
use crate::DbError;

/// How many rows of each kind a seed run inserted or updated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub stores: usize,
    pub categories: usize,
    pub flower_tags: usize,
    pub managers: usize,
    pub hero_banners: usize,
}

/// Upsert the whole catalog file: stores, the category tree, flower tags,
/// managers with their store assignments and hero banners.
///
/// All upserts run inside a single transaction; if any operation fails
/// the entire batch is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails, or
/// [`DbError::InvalidData`] if a manager references a store that is neither in
/// the file nor in the database.
pub async fn seed_catalog(pool: &PgPool, catalog: &CatalogFile) -> Result<SeedSummary, DbError> {
    let mut tx = pool.begin().await?;
    let mut summary = SeedSummary::default();

    for store in &catalog.stores {
        sqlx::query(
            "INSERT INTO stores (subdomain, name, address, phone, is_active) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (subdomain) DO UPDATE SET \
                 name = EXCLUDED.name, \
                 address = EXCLUDED.address, \
                 phone = EXCLUDED.phone, \
                 is_active = EXCLUDED.is_active, \
                 updated_at = NOW()",
        )
        .bind(store.subdomain.trim().to_lowercase())
        .bind(store.name.trim())
        .bind(&store.address)
        .bind(&store.phone)
        .bind(store.is_active)
        .execute(&mut *tx)
        .await?;
        summary.stores += 1;
    }

    summary.categories = seed_category_tree(&mut *tx, &catalog.categories).await?;

    for tag in &catalog.flower_tags {
        let name = tag.name.trim();
        let slug = tag.slug.clone().unwrap_or_else(|| slugify(name));
        sqlx::query(
            "INSERT INTO flower_tags (name, slug, sort_order) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (name) DO UPDATE SET \
                 slug = EXCLUDED.slug, \
                 sort_order = EXCLUDED.sort_order",
        )
        .bind(name)
        .bind(&slug)
        .bind(tag.sort_order)
        .execute(&mut *tx)
        .await?;
        summary.flower_tags += 1;
    }

    for manager in &catalog.managers {
        let manager_id: i64 = sqlx::query_scalar(
            "INSERT INTO store_managers (telegram_id, telegram_username, full_name, is_active) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (telegram_id) DO UPDATE SET \
                 telegram_username = EXCLUDED.telegram_username, \
                 full_name = EXCLUDED.full_name, \
                 is_active = EXCLUDED.is_active \
             RETURNING id",
        )
        .bind(manager.telegram_id)
        .bind(&manager.username)
        .bind(&manager.full_name)
        .bind(manager.is_active)
        .fetch_one(&mut *tx)
        .await?;

        for subdomain in &manager.stores {
            let subdomain = subdomain.trim().to_lowercase();
            let store_id: Option<i64> =
                sqlx::query_scalar("SELECT id FROM stores WHERE subdomain = $1")
                    .bind(&subdomain)
                    .fetch_optional(&mut *tx)
                    .await?;
            let store_id = store_id.ok_or_else(|| {
                DbError::InvalidData(format!(
                    "manager {} references unknown store '{subdomain}'",
                    manager.telegram_id
                ))
            })?;
            sqlx::query(
                "INSERT INTO store_manager_stores (manager_id, store_id) VALUES ($1, $2) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(manager_id)
            .bind(store_id)
            .execute(&mut *tx)
            .await?;
        }
        summary.managers += 1;
    }

    for banner in &catalog.hero_banners {
        upsert_hero_banner_by_name(&mut *tx, &banner_input(banner)).await?;
        summary.hero_banners += 1;
    }

    tx.commit().await?;
    Ok(summary)
}

/// Walks the tree depth-first, parents before children, returning how many
/// categories were upserted.
async fn seed_category_tree(
    conn: &mut PgConnection,
    roots: &[CategorySeed],
) -> Result<usize, DbError> {
    let mut count = 0usize;
    let mut pending: Vec<(&CategorySeed, Option<i64>)> =
        roots.iter().rev().map(|c| (c, None)).collect();

    while let Some((category, parent_id)) = pending.pop() {
        let name = category.name.trim();
        let slug = category.slug.clone().unwrap_or_else(|| slugify(name));
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO categories (name, slug, parent_id, sort_order) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (name, COALESCE(parent_id, 0)) DO UPDATE SET \
                 slug = EXCLUDED.slug, \
                 sort_order = EXCLUDED.sort_order \
             RETURNING id",
        )
        .bind(name)
        .bind(&slug)
        .bind(parent_id)
        .bind(category.sort_order)
        .fetch_one(&mut *conn)
        .await?;
        count += 1;

        pending.extend(category.children.iter().rev().map(|c| (c, Some(id))));
    }

    Ok(count)
}

fn banner_input(seed: &HeroBannerSeed) -> HeroBannerInput {
    HeroBannerInput {
        name: seed.name.trim().to_string(),
        title: seed.title.clone(),
        caption: seed.caption.clone(),
        overview: seed.overview.clone(),
        button_text: seed.button_text.clone(),
        button_url: seed.button_url.clone(),
        desktop_image: seed.desktop_image.clone(),
        mobile_image: seed.mobile_image.clone().filter(|m| !m.is_empty()),
        is_active: seed.is_active,
        starts_on: seed.starts_on,
        ends_on: seed.ends_on,
        sort_order: seed.sort_order,
    }
}
