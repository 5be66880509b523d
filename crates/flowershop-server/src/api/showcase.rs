use axum::{
    extract::{Path, State},
    Extension, Json,
};
use flowershop_core::urls::{
    category_card_href, product_hover_image, product_href, product_image_url, HOME_PLACEHOLDER,
};
use flowershop_core::{clean_title, SHOWCASE_LIMIT};
use flowershop_db::{CategoryCardRow, ProductRow, ShowcaseOrder, StoreShowcaseRow};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, not_found, validation_error, ApiError, ApiResponse, AppState};

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

/// A product card as the storefront renders it.
#[derive(Debug, Serialize)]
pub(super) struct ShowcaseCard {
    id: i64,
    slug: String,
    title: String,
    price: Option<Decimal>,
    image: String,
    hover_image: String,
    href: String,
}

impl ShowcaseCard {
    fn from_product(row: ProductRow, media_url: &str) -> Self {
        let image = product_image_url(
            row.uploaded_image.as_deref(),
            &row.image,
            media_url,
            HOME_PLACEHOLDER,
        );
        Self {
            hover_image: product_hover_image(&row.image, &image),
            href: product_href(&row.slug, row.id),
            id: row.id,
            title: clean_title(&row.title),
            price: row.price,
            image,
            slug: row.slug,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct StoreShowcaseItem {
    item_id: i64,
    sort_order: i32,
    #[serde(flatten)]
    card: ShowcaseCard,
}

impl StoreShowcaseItem {
    fn from_row(row: StoreShowcaseRow, media_url: &str) -> Self {
        let image = product_image_url(
            row.uploaded_image.as_deref(),
            &row.image,
            media_url,
            HOME_PLACEHOLDER,
        );
        Self {
            item_id: row.item_id,
            sort_order: row.sort_order,
            card: ShowcaseCard {
                hover_image: product_hover_image(&row.image, &image),
                href: product_href(&row.slug, row.product_id),
                id: row.product_id,
                title: clean_title(&row.title),
                price: row.price,
                image,
                slug: row.slug,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct CategoryCard {
    id: i64,
    name: String,
    slug: String,
    image: String,
    hover_image: String,
    href: String,
}

impl CategoryCard {
    fn from_row(row: CategoryCardRow, media_url: &str) -> Self {
        let image = product_image_url(
            row.first_uploaded_image.as_deref(),
            row.first_image.as_deref().unwrap_or_default(),
            media_url,
            HOME_PLACEHOLDER,
        );
        // With a single product the hover repeats the card image; a second
        // product without an image shows the placeholder.
        let hover_image = if row.second_image.is_some() {
            product_image_url(
                row.second_uploaded_image.as_deref(),
                row.second_image.as_deref().unwrap_or_default(),
                media_url,
                HOME_PLACEHOLDER,
            )
        } else {
            image.clone()
        };
        Self {
            href: category_card_href(&row.slug, &row.name),
            id: row.id,
            name: row.name,
            slug: row.slug,
            image,
            hover_image,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ReorderResult {
    updated: u64,
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct ReorderRequest {
    pub items: Vec<ReorderEntry>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ReorderEntry {
    pub id: i64,
    pub sort: i32,
}

#[derive(Debug, Deserialize)]
pub(super) struct PinRequest {
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Serialize)]
pub(super) struct PinResult {
    store_id: i64,
    product_id: i64,
    pinned: bool,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/showcase
pub(super) async fn homepage_showcase(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<ShowcaseCard>>>, ApiError> {
    let rows = flowershop_db::list_homepage_showcase(&state.pool, SHOWCASE_LIMIT)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| ShowcaseCard::from_product(row, &state.config.media_url))
        .collect();
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

/// GET /api/v1/home/category-cards
pub(super) async fn category_cards(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<CategoryCard>>>, ApiError> {
    let rows = flowershop_db::list_category_cards(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| CategoryCard::from_row(row, &state.config.media_url))
        .collect();
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

/// GET /api/v1/stores/{id}/showcase
pub(super) async fn store_showcase(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(store_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<StoreShowcaseItem>>>, ApiError> {
    let rid = &req_id.0;
    flowershop_db::get_store(&state.pool, store_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| not_found(rid, "store"))?;

    let rows = flowershop_db::list_store_showcase(&state.pool, store_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| StoreShowcaseItem::from_row(row, &state.config.media_url))
        .collect();
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

/// PUT /api/v1/showcase/order
pub(super) async fn reorder(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ReorderRequest>,
) -> Result<Json<ApiResponse<ReorderResult>>, ApiError> {
    let rid = &req_id.0;

    if let Some(bad) = body.items.iter().find(|entry| entry.sort < 0) {
        return Err(validation_error(
            rid,
            format!("sort for product {} must be >= 0", bad.id),
        ));
    }

    let order: Vec<ShowcaseOrder> = body
        .items
        .iter()
        .map(|entry| ShowcaseOrder {
            product_id: entry.id,
            sort_order: entry.sort,
        })
        .collect();

    let updated = flowershop_db::reorder_showcase(&state.pool, &order)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    tracing::info!(requested = order.len(), updated, "showcase reordered");

    Ok(Json(ApiResponse::new(ReorderResult { updated }, req_id.0)))
}

/// PUT /api/v1/stores/{id}/showcase/{product_id}
///
/// Pins the product, or moves it when it is already pinned.
pub(super) async fn pin_item(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((store_id, product_id)): Path<(i64, i64)>,
    Json(body): Json<PinRequest>,
) -> Result<Json<ApiResponse<PinResult>>, ApiError> {
    let rid = &req_id.0;
    if body.sort_order < 0 {
        return Err(validation_error(rid, "sort_order: must be >= 0"));
    }

    flowershop_db::pin_showcase_item(&state.pool, store_id, product_id, body.sort_order)
        .await
        .map_err(|e| {
            if e.is_foreign_key_violation() {
                not_found(rid, "store or product")
            } else {
                map_db_error(rid.clone(), &e)
            }
        })?;

    tracing::info!(store_id, product_id, sort_order = body.sort_order, "showcase item pinned");
    Ok(Json(ApiResponse::new(
        PinResult {
            store_id,
            product_id,
            pinned: true,
        },
        req_id.0,
    )))
}

/// DELETE /api/v1/stores/{id}/showcase/{product_id}
pub(super) async fn unpin_item(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((store_id, product_id)): Path<(i64, i64)>,
) -> Result<Json<ApiResponse<PinResult>>, ApiError> {
    let rid = &req_id.0;
    let removed = flowershop_db::unpin_showcase_item(&state.pool, store_id, product_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if !removed {
        return Err(not_found(rid, "showcase item"));
    }
    Ok(Json(ApiResponse::new(
        PinResult {
            store_id,
            product_id,
            pinned: false,
        },
        req_id.0,
    )))
}
