use axum::{extract::State, Extension, Json};
use flowershop_db::StoreRow;
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct StoreItem {
    pub id: i64,
    pub subdomain: String,
    pub name: String,
    pub is_active: bool,
}

impl From<StoreRow> for StoreItem {
    fn from(row: StoreRow) -> Self {
        Self {
            id: row.id,
            subdomain: row.subdomain,
            name: row.name,
            is_active: row.is_active,
        }
    }
}

/// GET /api/v1/stores
pub(super) async fn list_stores(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<StoreItem>>>, ApiError> {
    let rows = flowershop_db::list_active_stores(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows.into_iter().map(StoreItem::from).collect();
    Ok(Json(ApiResponse::new(data, req_id.0)))
}
