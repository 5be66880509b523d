use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use flowershop_core::catalog::category_display_name;
use flowershop_db::FlowerTagRow;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::products::ProductItem;
use super::{map_db_error, not_found, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct FlowerTagItem {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub sort_order: i32,
}

impl From<FlowerTagRow> for FlowerTagItem {
    fn from(row: FlowerTagRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            sort_order: row.sort_order,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct CategoryPage {
    id: i64,
    name: String,
    display_name: String,
    slug: String,
    flower_tag: Option<FlowerTagItem>,
    products: Vec<ProductItem>,
}

#[derive(Debug, Serialize)]
pub(super) struct FlowerPage {
    flower_tag: FlowerTagItem,
    products: Vec<ProductItem>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CategoryPageQuery {
    pub flower_tag_slug: Option<String>,
}

/// GET /api/v1/catalog/categories/{slug}
///
/// Published products whose primary or linked category is the category or one
/// of its direct children, newest first.
pub(super) async fn category_page(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
    Query(query): Query<CategoryPageQuery>,
) -> Result<Json<ApiResponse<CategoryPage>>, ApiError> {
    let rid = &req_id.0;

    let category = flowershop_db::get_category_by_slug(&state.pool, &slug)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| not_found(rid, "category"))?;

    // An unknown tag leaves the listing unfiltered.
    let flower_tag = match query.flower_tag_slug.as_deref().filter(|s| !s.is_empty()) {
        Some(tag_slug) => {
            let tag = flowershop_db::get_flower_tag_by_slug(&state.pool, tag_slug)
                .await
                .map_err(|e| map_db_error(rid.clone(), &e))?;
            if tag.is_none() {
                tracing::debug!(flower_tag = tag_slug, "ignoring unknown flower tag filter");
            }
            tag
        }
        None => None,
    };

    let ids = flowershop_db::category_with_children_ids(&state.pool, category.id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    let rows = flowershop_db::list_products_in_categories(
        &state.pool,
        &ids,
        flower_tag.as_ref().map(|t| t.id),
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?;

    let parent_name = match category.parent_id {
        Some(parent_id) => flowershop_db::get_category(&state.pool, parent_id)
            .await
            .map_err(|e| map_db_error(rid.clone(), &e))?
            .map(|p| p.name),
        None => None,
    };

    let page = CategoryPage {
        id: category.id,
        display_name: category_display_name(&category.name, parent_name.as_deref()),
        name: category.name,
        slug: category.slug,
        flower_tag: flower_tag.map(FlowerTagItem::from),
        products: rows
            .into_iter()
            .map(|row| ProductItem::from_row(row, &state.config.media_url))
            .collect(),
    };

    Ok(Json(ApiResponse::new(page, req_id.0)))
}

/// GET /api/v1/catalog/flowers/{slug}
pub(super) async fn flower_page(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<FlowerPage>>, ApiError> {
    let rid = &req_id.0;

    let tag = flowershop_db::get_flower_tag_by_slug(&state.pool, &slug)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| not_found(rid, "flower tag"))?;

    let rows = flowershop_db::list_products_by_flower_tag(&state.pool, tag.id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let page = FlowerPage {
        flower_tag: FlowerTagItem::from(tag),
        products: rows
            .into_iter()
            .map(|row| ProductItem::from_row(row, &state.config.media_url))
            .collect(),
    };

    Ok(Json(ApiResponse::new(page, req_id.0)))
}

/// GET /api/v1/flower-tags
pub(super) async fn list_flower_tags(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<FlowerTagItem>>>, ApiError> {
    let rows = flowershop_db::list_flower_tags(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows.into_iter().map(FlowerTagItem::from).collect();
    Ok(Json(ApiResponse::new(data, req_id.0)))
}
