use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use flowershop_core::urls::media_or_legacy_url;
use flowershop_core::{validate_review, ReviewDraft};
use flowershop_db::{ReviewPatch, ReviewRow};
use serde::{Deserialize, Serialize};

use crate::middleware::{Caller, RequestId};

use super::products::DeletedItem;
use super::{map_db_error, not_found, validation_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct ReviewItem {
    id: i64,
    author: String,
    company: String,
    text: String,
    rating: i16,
    image_url: String,
    source_url: String,
    is_published: bool,
    sort_order: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ReviewItem {
    fn from_row(row: ReviewRow, media_url: &str) -> Self {
        Self {
            image_url: media_or_legacy_url(media_url, &row.image),
            id: row.id,
            author: row.author,
            company: row.company,
            text: row.text,
            rating: row.rating,
            source_url: row.source_url,
            is_published: row.is_published,
            sort_order: row.sort_order,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ReviewPatchRequest {
    pub is_published: Option<bool>,
    pub sort_order: Option<i32>,
}

/// GET /api/v1/reviews
pub(super) async fn list_reviews(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<ApiResponse<Vec<ReviewItem>>>, ApiError> {
    let rows = flowershop_db::list_reviews(&state.pool, caller.is_staff)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| ReviewItem::from_row(row, &state.config.media_url))
        .collect();
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

/// POST /api/v1/reviews/submit
///
/// Stores a site-form review unpublished, waiting for moderation.
pub(super) async fn submit_review(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(draft): Json<ReviewDraft>,
) -> Result<(StatusCode, Json<ApiResponse<ReviewItem>>), ApiError> {
    let rid = &req_id.0;
    let draft = validate_review(draft).map_err(|e| validation_error(rid, e.to_string()))?;

    let row = flowershop_db::create_public_review(&state.pool, &draft)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    tracing::info!(review_id = row.id, rating = row.rating, "review submitted");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            ReviewItem::from_row(row, &state.config.media_url),
            req_id.0,
        )),
    ))
}

/// PATCH /api/v1/reviews/{id}
pub(super) async fn update_review(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<ReviewPatchRequest>,
) -> Result<Json<ApiResponse<ReviewItem>>, ApiError> {
    let rid = &req_id.0;
    if body.sort_order.is_some_and(|s| s < 0) {
        return Err(validation_error(rid, "sort_order must be >= 0"));
    }

    let patch = ReviewPatch {
        is_published: body.is_published,
        sort_order: body.sort_order,
    };
    let row = flowershop_db::update_review(&state.pool, id, patch)
        .await
        .map_err(|e| match e {
            flowershop_db::DbError::NotFound => not_found(rid, "review"),
            other => map_db_error(rid.clone(), &other),
        })?;

    Ok(Json(ApiResponse::new(
        ReviewItem::from_row(row, &state.config.media_url),
        req_id.0,
    )))
}

/// DELETE /api/v1/reviews/{id}
pub(super) async fn delete_review(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<DeletedItem>>, ApiError> {
    let rid = &req_id.0;
    let deleted = flowershop_db::delete_review(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if !deleted {
        return Err(not_found(rid, "review"));
    }
    Ok(Json(ApiResponse::new(DeletedItem { id, deleted }, req_id.0)))
}
