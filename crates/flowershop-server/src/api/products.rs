use std::collections::HashSet;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use flowershop_core::catalog::{check_price, FALLBACK_PRODUCT_SLUG};
use flowershop_core::urls::{product_image_url, PRODUCT_PLACEHOLDER};
use flowershop_core::slug::MAX_SLUG_LEN;
use flowershop_core::{clean_title, slugify, unique_slug, ShowcaseChannel};
use flowershop_db::{ProductRelations, ProductRow, SlugTarget};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::middleware::{Caller, RequestId};

use super::catalog::FlowerTagItem;
use super::stores::StoreItem;
use super::{
    double_option, is_truthy, map_db_error, map_write_error, normalize_limit, not_found,
    validation_error, ApiError, ApiResponse, AppState,
};

const MAX_TITLE_CHARS: usize = 100;
const MAX_ARTICLE_CHARS: usize = 64;
const MAX_IMAGE_CHARS: usize = 200;
const MAX_GALLERY_IMAGE_CHARS: usize = 255;
const SLUG_CONFLICT: &str = "a product with that slug already exists";

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct ProductItem {
    pub id: i64,
    pub title: String,
    pub display_title: String,
    pub article: String,
    pub description: String,
    pub price: Option<Decimal>,
    pub image: String,
    pub uploaded_image: Option<String>,
    pub image_url: String,
    pub is_online_showcase: bool,
    pub showcase_channel: String,
    pub showcase_sort_order: i32,
    pub category_id: Option<i64>,
    pub category: Option<String>,
    pub slug: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductItem {
    pub(super) fn from_row(row: ProductRow, media_url: &str) -> Self {
        let image_url = product_image_url(
            row.uploaded_image.as_deref(),
            &row.image,
            media_url,
            PRODUCT_PLACEHOLDER,
        );
        Self {
            id: row.id,
            display_title: clean_title(&row.title),
            title: row.title,
            article: row.article,
            description: row.description,
            price: row.price,
            image: row.image,
            uploaded_image: row.uploaded_image,
            image_url,
            is_online_showcase: row.is_online_showcase,
            showcase_channel: row.showcase_channel,
            showcase_sort_order: row.showcase_sort_order,
            category_id: row.category_id,
            category: row.category_name,
            slug: row.slug,
            is_published: row.is_published,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct CategoryLinkItem {
    id: i64,
    name: String,
    slug: String,
}

#[derive(Debug, Serialize)]
pub(super) struct ProductImageItem {
    id: i64,
    image: String,
    sort_order: i32,
}

impl ProductImageItem {
    fn from_row(row: flowershop_db::ProductImageRow, media_url: &str) -> Self {
        Self {
            id: row.id,
            image: flowershop_core::urls::media_or_legacy_url(media_url, &row.image),
            sort_order: row.sort_order,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ProductImageRequest {
    pub image: String,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Serialize)]
pub(super) struct ProductDetail {
    #[serde(flatten)]
    pub product: ProductItem,
    pub categories: Vec<CategoryLinkItem>,
    pub flower_tags: Vec<FlowerTagItem>,
    pub stores: Vec<StoreItem>,
    pub images: Vec<ProductImageItem>,
}

impl ProductDetail {
    fn new(row: ProductRow, relations: ProductRelations, media_url: &str) -> Self {
        Self {
            product: ProductItem::from_row(row, media_url),
            categories: relations
                .categories
                .into_iter()
                .map(|c| CategoryLinkItem {
                    id: c.id,
                    name: c.name,
                    slug: c.slug,
                })
                .collect(),
            flower_tags: relations
                .flower_tags
                .into_iter()
                .map(FlowerTagItem::from)
                .collect(),
            stores: relations.stores.into_iter().map(StoreItem::from).collect(),
            images: relations
                .images
                .into_iter()
                .map(|img| ProductImageItem::from_row(img, media_url))
                .collect(),
        }
    }
}

/// Loads relations and builds the detail body for a product row.
pub(super) async fn product_detail(
    state: &AppState,
    req_id: &str,
    row: ProductRow,
) -> Result<ProductDetail, ApiError> {
    let relations = flowershop_db::load_product_relations(&state.pool, row.id)
        .await
        .map_err(|e| map_db_error(req_id.to_owned(), &e))?;
    Ok(ProductDetail::new(row, relations, &state.config.media_url))
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct ProductQuery {
    pub category: Option<String>,
    pub store_subdomain: Option<String>,
    pub flower_tag: Option<String>,
    pub online_showcase: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateProductRequest {
    pub title: String,
    #[serde(default)]
    pub article: String,
    #[serde(default)]
    pub description: String,
    pub price: Option<Decimal>,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub is_online_showcase: bool,
    pub showcase_channel: Option<String>,
    #[serde(default)]
    pub showcase_sort_order: i32,
    /// Primary category, by name.
    pub category: Option<String>,
    pub slug: Option<String>,
    pub is_published: Option<bool>,
    pub category_ids: Option<Vec<i64>>,
    pub flower_tag_ids: Option<Vec<i64>>,
    pub store_ids: Option<Vec<i64>>,
}

#[allow(clippy::option_option)]
#[derive(Debug, Default, Deserialize)]
pub(super) struct UpdateProductRequest {
    pub title: Option<String>,
    pub article: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub price: Option<Option<Decimal>>,
    pub image: Option<String>,
    pub is_online_showcase: Option<bool>,
    pub showcase_channel: Option<String>,
    pub showcase_sort_order: Option<i32>,
    /// Primary category by name; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub category: Option<Option<String>>,
    pub slug: Option<String>,
    pub is_published: Option<bool>,
    pub category_ids: Option<Vec<i64>>,
    pub flower_tag_ids: Option<Vec<i64>>,
    pub store_ids: Option<Vec<i64>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PriceRequest {
    pub price: Decimal,
}

#[derive(Debug, Deserialize)]
pub(super) struct FlagRequest {
    pub value: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct DeletedItem {
    pub id: i64,
    pub deleted: bool,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Free product slug derived from `title`, suffixed `-{first_suffix}`, … on
/// collision.
pub(super) async fn generate_product_slug(
    pool: &PgPool,
    title: &str,
    first_suffix: u32,
) -> Result<String, flowershop_db::DbError> {
    let taken: HashSet<String> = flowershop_db::list_taken_slugs(pool, SlugTarget::Product)
        .await?
        .into_iter()
        .collect();
    let base = slugify(title);
    let base = if base.is_empty() {
        FALLBACK_PRODUCT_SLUG.to_string()
    } else {
        base
    };
    Ok(unique_slug(&base, first_suffix, |s| taken.contains(s)))
}

pub(super) fn validate_title(rid: &str, title: &str) -> Result<String, ApiError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > MAX_TITLE_CHARS {
        return Err(validation_error(
            rid,
            format!("title: must be 1-{MAX_TITLE_CHARS} characters"),
        ));
    }
    Ok(title.to_owned())
}

/// Trims `value` and checks it fits a column of `max` characters.
fn validate_len(rid: &str, field: &str, value: &str, max: usize) -> Result<String, ApiError> {
    let value = value.trim();
    if value.chars().count() > max {
        return Err(validation_error(
            rid,
            format!("{field}: must be at most {max} characters"),
        ));
    }
    Ok(value.to_owned())
}

fn validate_channel(rid: &str, raw: &str) -> Result<String, ApiError> {
    raw.parse::<ShowcaseChannel>()
        .map(|ch| ch.as_str().to_owned())
        .map_err(|e| validation_error(rid, e.to_string()))
}

fn validate_price(rid: &str, price: Decimal) -> Result<Decimal, ApiError> {
    check_price(price).map_err(|e| validation_error(rid, e.to_string()))
}

fn validate_sort(rid: &str, field: &str, value: i32) -> Result<i32, ApiError> {
    if value < 0 {
        return Err(validation_error(rid, format!("{field} must be >= 0")));
    }
    Ok(value)
}

async fn resolve_category(
    state: &AppState,
    rid: &str,
    name: &str,
) -> Result<i64, ApiError> {
    flowershop_db::get_category_by_name(&state.pool, name.trim())
        .await
        .map_err(|e| map_db_error(rid.to_owned(), &e))?
        .map(|c| c.id)
        .ok_or_else(|| validation_error(rid, format!("unknown category '{name}'")))
}

// ---------------------------------------------------------------------------
// Read handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/products
pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ApiResponse<Vec<ProductItem>>>, ApiError> {
    let rows = flowershop_db::list_products(
        &state.pool,
        flowershop_db::ProductFilter {
            category: query.category.as_deref().filter(|s| !s.is_empty()),
            store_subdomain: query.store_subdomain.as_deref(),
            flower_tag: query.flower_tag.as_deref().filter(|s| !s.is_empty()),
            online_showcase: is_truthy(query.online_showcase.as_deref()),
            include_unpublished: caller.is_staff,
            limit: normalize_limit(query.limit),
        },
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| ProductItem::from_row(row, &state.config.media_url))
        .collect();

    Ok(Json(ApiResponse::new(data, req_id.0)))
}

/// GET /api/v1/products/{id}
pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ProductDetail>>, ApiError> {
    let rid = &req_id.0;
    let row = flowershop_db::get_product(&state.pool, id, caller.is_staff)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| not_found(rid, "product"))?;

    let detail = product_detail(&state, rid, row).await?;
    Ok(Json(ApiResponse::new(detail, req_id.0)))
}

/// GET /api/v1/products/by-slug/{slug}
pub(super) async fn get_product_by_slug(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<ProductDetail>>, ApiError> {
    let rid = &req_id.0;
    let row = flowershop_db::get_product_by_slug(&state.pool, &slug)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| not_found(rid, "product"))?;

    let detail = product_detail(&state, rid, row).await?;
    Ok(Json(ApiResponse::new(detail, req_id.0)))
}

// ---------------------------------------------------------------------------
// Write handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/products
pub(super) async fn create_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProductDetail>>), ApiError> {
    let rid = &req_id.0;

    let title = validate_title(rid, &body.title)?;
    let price = body.price.map(|p| validate_price(rid, p)).transpose()?;
    let showcase_channel = match body.showcase_channel.as_deref() {
        Some(raw) => validate_channel(rid, raw)?,
        None => ShowcaseChannel::default().as_str().to_owned(),
    };
    let showcase_sort_order = validate_sort(rid, "showcase_sort_order", body.showcase_sort_order)?;
    let article = validate_len(rid, "article", &body.article, MAX_ARTICLE_CHARS)?;
    let image = validate_len(rid, "image", &body.image, MAX_IMAGE_CHARS)?;
    let requested_slug = body
        .slug
        .as_deref()
        .map(|s| validate_len(rid, "slug", s, MAX_SLUG_LEN))
        .transpose()?
        .filter(|s| !s.is_empty());
    let category_id = match body.category.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(name) => Some(resolve_category(&state, rid, name).await?),
        None => None,
    };
    let slug = match requested_slug {
        Some(slug) => slug,
        None => generate_product_slug(&state.pool, &title, 1)
            .await
            .map_err(|e| map_db_error(rid.clone(), &e))?,
    };

    let row = flowershop_db::create_product(
        &state.pool,
        &flowershop_db::NewProduct {
            title,
            article,
            description: body.description,
            price,
            image,
            is_online_showcase: body.is_online_showcase,
            showcase_channel,
            showcase_sort_order,
            category_id,
            slug,
            is_published: body.is_published.unwrap_or(true),
            category_ids: body.category_ids.unwrap_or_default(),
            flower_tag_ids: body.flower_tag_ids.unwrap_or_default(),
            store_ids: body.store_ids.unwrap_or_default(),
        },
    )
    .await
    .map_err(|e| map_write_error(rid, &e, SLUG_CONFLICT))?;

    tracing::info!(product_id = row.id, slug = %row.slug, "product created");

    let detail = product_detail(&state, rid, row).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(detail, req_id.0)),
    ))
}

/// PATCH /api/v1/products/{id}
pub(super) async fn update_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Json<ApiResponse<ProductDetail>>, ApiError> {
    let rid = &req_id.0;

    let title = body
        .title
        .as_deref()
        .map(|t| validate_title(rid, t))
        .transpose()?;
    let price = match body.price {
        Some(Some(p)) => Some(Some(validate_price(rid, p)?)),
        other => other,
    };
    let showcase_channel = body
        .showcase_channel
        .as_deref()
        .map(|raw| validate_channel(rid, raw))
        .transpose()?;
    let showcase_sort_order = body
        .showcase_sort_order
        .map(|v| validate_sort(rid, "showcase_sort_order", v))
        .transpose()?;
    let article = body
        .article
        .as_deref()
        .map(|a| validate_len(rid, "article", a, MAX_ARTICLE_CHARS))
        .transpose()?;
    let image = body
        .image
        .as_deref()
        .map(|i| validate_len(rid, "image", i, MAX_IMAGE_CHARS))
        .transpose()?;
    let slug = body
        .slug
        .as_deref()
        .map(|s| validate_len(rid, "slug", s, MAX_SLUG_LEN))
        .transpose()?
        .filter(|s| !s.is_empty());
    let category_id = match body.category {
        Some(Some(name)) if !name.trim().is_empty() => {
            Some(Some(resolve_category(&state, rid, &name).await?))
        }
        Some(_) => Some(None),
        None => None,
    };

    let patch = flowershop_db::ProductPatch {
        title,
        article,
        description: body.description,
        price,
        image,
        is_online_showcase: body.is_online_showcase,
        showcase_channel,
        showcase_sort_order,
        category_id,
        slug,
        is_published: body.is_published,
        category_ids: body.category_ids,
        flower_tag_ids: body.flower_tag_ids,
        store_ids: body.store_ids,
    };

    let row = flowershop_db::update_product(&state.pool, id, &patch)
        .await
        .map_err(|e| match e {
            flowershop_db::DbError::NotFound => not_found(rid, "product"),
            other => map_write_error(rid, &other, SLUG_CONFLICT),
        })?;

    let detail = product_detail(&state, rid, row).await?;
    Ok(Json(ApiResponse::new(detail, req_id.0)))
}

/// DELETE /api/v1/products/{id}
pub(super) async fn delete_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<DeletedItem>>, ApiError> {
    let rid = &req_id.0;
    let deleted = flowershop_db::delete_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if !deleted {
        return Err(not_found(rid, "product"));
    }
    Ok(Json(ApiResponse::new(DeletedItem { id, deleted }, req_id.0)))
}

/// POST /api/v1/products/{id}/images
///
/// `image` is a path under the media root or a legacy absolute URL.
pub(super) async fn add_image(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<ProductImageRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProductImageItem>>), ApiError> {
    let rid = &req_id.0;
    let image = validate_len(rid, "image", &body.image, MAX_GALLERY_IMAGE_CHARS)?;
    if image.is_empty() {
        return Err(validation_error(rid, "image: must not be empty"));
    }
    if body.sort_order < 0 {
        return Err(validation_error(rid, "sort_order: must be >= 0"));
    }

    let row = flowershop_db::add_product_image(&state.pool, id, &image, body.sort_order)
        .await
        .map_err(|e| {
            if e.is_foreign_key_violation() {
                not_found(rid, "product")
            } else {
                map_db_error(rid.clone(), &e)
            }
        })?;

    tracing::info!(product_id = id, image_id = row.id, "gallery image added");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            ProductImageItem::from_row(row, &state.config.media_url),
            req_id.0,
        )),
    ))
}

/// DELETE /api/v1/products/{id}/images/{image_id}
pub(super) async fn delete_image(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((id, image_id)): Path<(i64, i64)>,
) -> Result<Json<ApiResponse<DeletedItem>>, ApiError> {
    let rid = &req_id.0;
    let deleted = flowershop_db::delete_product_image(&state.pool, id, image_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if !deleted {
        return Err(not_found(rid, "image"));
    }
    Ok(Json(ApiResponse::new(
        DeletedItem {
            id: image_id,
            deleted,
        },
        req_id.0,
    )))
}

/// PUT /api/v1/products/{id}/price
pub(super) async fn set_price(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<PriceRequest>,
) -> Result<Json<ApiResponse<ProductItem>>, ApiError> {
    let rid = &req_id.0;
    let price = validate_price(rid, body.price)?;
    flowershop_db::set_product_price(&state.pool, id, price)
        .await
        .map_err(|e| map_write_error(rid, &e, SLUG_CONFLICT))?;
    reload(&state, req_id.0, id).await
}

/// PUT /api/v1/products/{id}/showcase
pub(super) async fn set_showcase(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<FlagRequest>,
) -> Result<Json<ApiResponse<ProductItem>>, ApiError> {
    flowershop_db::set_product_showcase(&state.pool, id, body.value)
        .await
        .map_err(|e| map_write_error(&req_id.0, &e, SLUG_CONFLICT))?;
    reload(&state, req_id.0, id).await
}

/// PUT /api/v1/products/{id}/published
pub(super) async fn set_published(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<FlagRequest>,
) -> Result<Json<ApiResponse<ProductItem>>, ApiError> {
    flowershop_db::set_product_published(&state.pool, id, body.value)
        .await
        .map_err(|e| map_write_error(&req_id.0, &e, SLUG_CONFLICT))?;
    reload(&state, req_id.0, id).await
}

async fn reload(
    state: &AppState,
    rid: String,
    id: i64,
) -> Result<Json<ApiResponse<ProductItem>>, ApiError> {
    let row = flowershop_db::get_product(&state.pool, id, true)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| not_found(&rid, "product"))?;
    Ok(Json(ApiResponse::new(
        ProductItem::from_row(row, &state.config.media_url),
        rid,
    )))
}
