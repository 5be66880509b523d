//! Database operations for homepage `hero_banners`.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgConnection, PgPool};

use crate::DbError;

/// A row from the `hero_banners` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HeroBannerRow {
    pub id: i64,
    pub name: String,
    pub title: String,
    pub caption: String,
    pub overview: String,
    pub button_text: String,
    pub button_url: String,
    pub desktop_image: String,
    pub mobile_image: Option<String>,
    pub is_active: bool,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Every editable banner field. Saves overwrite all of them.
#[derive(Debug, Clone)]
pub struct HeroBannerInput {
    pub name: String,
    pub title: String,
    pub caption: String,
    pub overview: String,
    pub button_text: String,
    pub button_url: String,
    pub desktop_image: String,
    pub mobile_image: Option<String>,
    pub is_active: bool,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
    pub sort_order: i32,
}

const BANNER_COLUMNS: &str = "id, name, title, caption, overview, button_text, button_url, \
     desktop_image, mobile_image, is_active, starts_on, ends_on, sort_order, \
     created_at, updated_at";

/// Returns every banner ordered by `(sort_order, created_at DESC)`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_hero_banners(pool: &PgPool) -> Result<Vec<HeroBannerRow>, DbError> {
    let sql = format!(
        "SELECT {BANNER_COLUMNS} FROM hero_banners ORDER BY sort_order, created_at DESC, id DESC"
    );
    let rows = sqlx::query_as::<_, HeroBannerRow>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_hero_banner(pool: &PgPool, id: i64) -> Result<Option<HeroBannerRow>, DbError> {
    let sql = format!("SELECT {BANNER_COLUMNS} FROM hero_banners WHERE id = $1");
    let row = sqlx::query_as::<_, HeroBannerRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// The first active banner, in list order, whose window contains `today`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn current_hero_banner(
    pool: &PgPool,
    today: NaiveDate,
) -> Result<Option<HeroBannerRow>, DbError> {
    let sql = format!(
        "SELECT {BANNER_COLUMNS} FROM hero_banners \
         WHERE is_active \
           AND (starts_on IS NULL OR starts_on <= $1) \
           AND (ends_on IS NULL OR ends_on >= $1) \
         ORDER BY sort_order, created_at DESC, id DESC \
         LIMIT 1"
    );
    let row = sqlx::query_as::<_, HeroBannerRow>(&sql)
        .bind(today)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_hero_banner(
    pool: &PgPool,
    input: &HeroBannerInput,
) -> Result<HeroBannerRow, DbError> {
    let sql = format!(
        "INSERT INTO hero_banners \
             (name, title, caption, overview, button_text, button_url, desktop_image, \
              mobile_image, is_active, starts_on, ends_on, sort_order) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
         RETURNING {BANNER_COLUMNS}"
    );
    let row = bind_input(sqlx::query_as::<_, HeroBannerRow>(&sql), input)
        .fetch_one(pool)
        .await?;
    Ok(row)
}

/// Overwrites every editable field of a banner.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the banner does not exist, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_hero_banner(
    pool: &PgPool,
    id: i64,
    input: &HeroBannerInput,
) -> Result<HeroBannerRow, DbError> {
    let sql = format!(
        "UPDATE hero_banners \
         SET name = $1, title = $2, caption = $3, overview = $4, button_text = $5, \
             button_url = $6, desktop_image = $7, mobile_image = $8, is_active = $9, \
             starts_on = $10, ends_on = $11, sort_order = $12, updated_at = NOW() \
         WHERE id = $13 \
         RETURNING {BANNER_COLUMNS}"
    );
    let row = bind_input(sqlx::query_as::<_, HeroBannerRow>(&sql), input)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.ok_or(DbError::NotFound)
}

/// Inserts or overwrites the banner with the same `name`. Used by seeding.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a statement fails.
pub async fn upsert_hero_banner_by_name(
    conn: &mut PgConnection,
    input: &HeroBannerInput,
) -> Result<i64, DbError> {
    let existing: Option<i64> =
        sqlx::query_scalar("SELECT id FROM hero_banners WHERE name = $1 ORDER BY id LIMIT 1")
            .bind(&input.name)
            .fetch_optional(&mut *conn)
            .await?;

    let id = if let Some(id) = existing {
        let sql = "UPDATE hero_banners \
             SET name = $1, title = $2, caption = $3, overview = $4, button_text = $5, \
                 button_url = $6, desktop_image = $7, mobile_image = $8, is_active = $9, \
                 starts_on = $10, ends_on = $11, sort_order = $12, updated_at = NOW() \
             WHERE id = $13 RETURNING id";
        bind_input(sqlx::query_as::<_, (i64,)>(sql), input)
            .bind(id)
            .fetch_one(&mut *conn)
            .await?
            .0
    } else {
        let sql = "INSERT INTO hero_banners \
                 (name, title, caption, overview, button_text, button_url, desktop_image, \
                  mobile_image, is_active, starts_on, ends_on, sort_order) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING id";
        bind_input(sqlx::query_as::<_, (i64,)>(sql), input)
            .fetch_one(&mut *conn)
            .await?
            .0
    };

    Ok(id)
}

/// Returns whether a row was deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_hero_banner(pool: &PgPool, id: i64) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM hero_banners WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

fn bind_input<'q, O>(
    query: sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments>,
    input: &'q HeroBannerInput,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
    query
        .bind(&input.name)
        .bind(&input.title)
        .bind(&input.caption)
        .bind(&input.overview)
        .bind(&input.button_text)
        .bind(&input.button_url)
        .bind(&input.desktop_image)
        .bind(input.mobile_image.as_deref())
        .bind(input.is_active)
        .bind(input.starts_on)
        .bind(input.ends_on)
        .bind(input.sort_order)
}
