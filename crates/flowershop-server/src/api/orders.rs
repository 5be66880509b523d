use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use flowershop_core::cart::checkout as place_order;
use flowershop_core::{apply_discount, Cart, MAX_QTY_PER_LINE};
use flowershop_db::{OrderItemRow, OrderRow};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::discounts::{resolve_discount, DiscountItem};
use super::{
    map_db_error, map_write_error, normalize_limit, not_found, validation_error, ApiError,
    ApiResponse, AppState,
};

// ---------------------------------------------------------------------------
// Bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct OrderLine {
    product_id: i64,
    title: String,
    price: Decimal,
    qty: i32,
    line_total: Decimal,
}

#[derive(Debug, Serialize)]
pub(super) struct OrderView {
    id: Uuid,
    session_id: Option<Uuid>,
    customer_name: String,
    phone: String,
    comment: String,
    discount: Option<DiscountItem>,
    lines: Vec<OrderLine>,
    total: Decimal,
    total_with_discount: Decimal,
    created_at: DateTime<Utc>,
}

impl OrderView {
    /// Prices are the products' current prices; a missing price counts as zero.
    fn build(row: OrderRow, items: Vec<OrderItemRow>) -> Self {
        let lines: Vec<OrderLine> = items
            .into_iter()
            .map(|item| {
                let price = item.price.unwrap_or(Decimal::ZERO);
                OrderLine {
                    line_total: price * Decimal::from(item.qty),
                    product_id: item.product_id,
                    title: item.title,
                    price,
                    qty: item.qty,
                }
            })
            .collect();
        let total: Decimal = lines.iter().map(|l| l.line_total).sum();

        let discount = match (row.discount_id, row.discount_code, row.discount_percent) {
            (Some(id), Some(code), Some(percent)) => Some(DiscountItem { id, code, percent }),
            _ => None,
        };
        let total_with_discount = discount
            .as_ref()
            .map_or(total, |d| apply_discount(total, d.percent));

        Self {
            id: row.id,
            session_id: row.session_id,
            customer_name: row.customer_name,
            phone: row.phone,
            comment: row.comment,
            discount,
            lines,
            total,
            total_with_discount,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct OrderListQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct OrderLineRequest {
    pub product_id: i64,
    pub qty: i64,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateOrderRequest {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub comment: String,
    pub discount_code: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderLineRequest>,
}

#[derive(Debug, Serialize)]
pub(super) struct DeletedOrder {
    id: Uuid,
    deleted: bool,
}

fn cart_from_lines(rid: &str, items: &[OrderLineRequest]) -> Result<Cart, ApiError> {
    let max_qty = i64::from(MAX_QTY_PER_LINE);
    let mut cart = Cart::new();
    for line in items {
        if !(1..=max_qty).contains(&line.qty) {
            return Err(validation_error(
                rid,
                format!("items: qty must be between 1 and {max_qty}"),
            ));
        }
        if cart.qty(line.product_id) > 0 {
            return Err(validation_error(rid, "items: duplicate product_id"));
        }
        cart.set_qty(line.product_id, line.qty);
    }
    Ok(cart)
}

async fn load_views(
    state: &AppState,
    rid: &str,
    rows: Vec<OrderRow>,
) -> Result<Vec<OrderView>, ApiError> {
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let items = flowershop_db::list_order_items(&state.pool, &ids)
        .await
        .map_err(|e| map_db_error(rid.to_owned(), &e))?;

    let mut by_order: HashMap<Uuid, Vec<OrderItemRow>> = HashMap::new();
    for item in items {
        by_order.entry(item.order_id).or_default().push(item);
    }
    Ok(rows
        .into_iter()
        .map(|row| {
            let lines = by_order.remove(&row.id).unwrap_or_default();
            OrderView::build(row, lines)
        })
        .collect())
}

async fn load_view(state: &AppState, rid: &str, id: Uuid) -> Result<OrderView, ApiError> {
    let row = flowershop_db::get_order(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.to_owned(), &e))?
        .ok_or_else(|| not_found(rid, "order"))?;
    let mut views = load_views(state, rid, vec![row]).await?;
    views.pop().ok_or_else(|| not_found(rid, "order"))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/orders
pub(super) async fn list_orders(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<ApiResponse<Vec<OrderView>>>, ApiError> {
    let rid = &req_id.0;
    let rows = flowershop_db::list_orders(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    let views = load_views(&state, rid, rows).await?;
    Ok(Json(ApiResponse::new(views, req_id.0)))
}

/// GET /api/v1/orders/{id}
pub(super) async fn get_order(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderView>>, ApiError> {
    let view = load_view(&state, &req_id.0, id).await?;
    Ok(Json(ApiResponse::new(view, req_id.0)))
}

/// POST /api/v1/orders
///
/// Staff entry of a phone order. Unknown products reject the whole order.
pub(super) async fn create_order(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderView>>), ApiError> {
    let rid = &req_id.0;
    let mut cart = cart_from_lines(rid, &body.items)?;
    let order = place_order(&mut cart, &body.customer_name, &body.phone, &body.comment)
        .map_err(|e| validation_error(rid, e.to_string()))?;
    let discount = resolve_discount(&state, rid, body.discount_code.as_deref()).await?;

    let order_id = flowershop_db::create_order(&state.pool, &order, discount.map(|d| d.id))
        .await
        .map_err(|e| map_write_error(rid, &e, "order already exists"))?;

    tracing::info!(%order_id, items = order.items.count(), "order entered by staff");

    let view = load_view(&state, rid, order_id).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(view, req_id.0))))
}

/// DELETE /api/v1/orders/{id}
pub(super) async fn delete_order(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeletedOrder>>, ApiError> {
    let rid = &req_id.0;
    let deleted = flowershop_db::delete_order(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if !deleted {
        return Err(not_found(rid, "order"));
    }
    Ok(Json(ApiResponse::new(DeletedOrder { id, deleted }, req_id.0)))
}
