use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use flowershop_core::{normalize_discount_code, validate_discount_percent};
use flowershop_db::DiscountRow;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::products::DeletedItem;
use super::{
    map_db_error, map_write_error, not_found, validation_error, ApiError, ApiResponse, AppState,
};

const DUPLICATE_CODE: &str = "a discount with this code already exists";

#[derive(Debug, Serialize)]
pub(super) struct DiscountItem {
    pub id: i64,
    pub code: String,
    pub percent: i32,
}

impl From<DiscountRow> for DiscountItem {
    fn from(row: DiscountRow) -> Self {
        Self {
            id: row.id,
            code: row.code,
            percent: row.percent,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct DiscountRequest {
    pub code: String,
    pub percent: i32,
}

/// Resolve an optional customer-supplied code. Blank means no discount; a code
/// that does not exist is a validation error.
pub(super) async fn resolve_discount(
    state: &AppState,
    rid: &str,
    code: Option<&str>,
) -> Result<Option<DiscountRow>, ApiError> {
    let raw = match code.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(raw) => raw,
    };
    let code = normalize_discount_code(raw)
        .map_err(|e| validation_error(rid, format!("discount_{e}")))?;
    let row = flowershop_db::get_discount_by_code(&state.pool, &code)
        .await
        .map_err(|e| map_db_error(rid.to_owned(), &e))?
        .ok_or_else(|| validation_error(rid, "discount_code: unknown code"))?;
    Ok(Some(row))
}

fn validate(rid: &str, body: &DiscountRequest) -> Result<(String, i32), ApiError> {
    let code =
        normalize_discount_code(&body.code).map_err(|e| validation_error(rid, e.to_string()))?;
    let percent = validate_discount_percent(body.percent)
        .map_err(|e| validation_error(rid, e.to_string()))?;
    Ok((code, percent))
}

/// GET /api/v1/discounts
pub(super) async fn list_discounts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<DiscountItem>>>, ApiError> {
    let rows = flowershop_db::list_discounts(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let data = rows.into_iter().map(DiscountItem::from).collect();
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

/// POST /api/v1/discounts
pub(super) async fn create_discount(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<DiscountRequest>,
) -> Result<(StatusCode, Json<ApiResponse<DiscountItem>>), ApiError> {
    let rid = &req_id.0;
    let (code, percent) = validate(rid, &body)?;
    let row = flowershop_db::create_discount(&state.pool, &code, percent)
        .await
        .map_err(|e| map_write_error(rid, &e, DUPLICATE_CODE))?;

    tracing::info!(
        discount_id = row.id,
        code = %row.code,
        percent = row.percent,
        "discount created"
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(DiscountItem::from(row), req_id.0)),
    ))
}

/// PUT /api/v1/discounts/{id}
pub(super) async fn update_discount(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<DiscountRequest>,
) -> Result<Json<ApiResponse<DiscountItem>>, ApiError> {
    let rid = &req_id.0;
    let (code, percent) = validate(rid, &body)?;
    let row = flowershop_db::update_discount(&state.pool, id, &code, percent)
        .await
        .map_err(|e| match e {
            flowershop_db::DbError::NotFound => not_found(rid, "discount"),
            other => map_write_error(rid, &other, DUPLICATE_CODE),
        })?;
    Ok(Json(ApiResponse::new(DiscountItem::from(row), req_id.0)))
}

/// DELETE /api/v1/discounts/{id}
pub(super) async fn delete_discount(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<DeletedItem>>, ApiError> {
    let rid = &req_id.0;
    let deleted = flowershop_db::delete_discount(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if !deleted {
        return Err(not_found(rid, "discount"));
    }
    Ok(Json(ApiResponse::new(DeletedItem { id, deleted }, req_id.0)))
}
