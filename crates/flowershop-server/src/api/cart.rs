use axum::{
    extract::{Path, State},
    Extension, Json,
};
use flowershop_core::cart::checkout as place_order;
use flowershop_core::urls::{product_image_url, PRODUCT_PLACEHOLDER};
use flowershop_core::{apply_discount, clean_title, Cart};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::{CartSession, RequestId};

use super::discounts::resolve_discount;
use super::{map_db_error, not_found, validation_error, ApiError, ApiResponse, AppState};

// ---------------------------------------------------------------------------
// Bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct CartLine {
    product_id: i64,
    title: String,
    slug: String,
    price: Decimal,
    image_url: String,
    qty: u32,
    line_total: Decimal,
}

#[derive(Debug, Serialize)]
pub(super) struct CartView {
    lines: Vec<CartLine>,
    total: Decimal,
    cart_count: u32,
}

#[derive(Debug, Serialize)]
pub(super) struct CartCount {
    cart_count: u32,
}

#[derive(Debug, Serialize)]
pub(super) struct LineQty {
    qty: u32,
    cart_count: u32,
}

#[derive(Debug, Serialize)]
pub(super) struct CheckoutResult {
    order_id: Uuid,
    name: String,
    phone: String,
    comment: String,
    lines: Vec<CartLine>,
    total: Decimal,
    discount_percent: Option<i32>,
    total_with_discount: Decimal,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateQtyRequest {
    pub qty: i64,
}

#[derive(Debug, Deserialize)]
pub(super) struct CheckoutRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub comment: String,
    pub discount_code: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn load(state: &AppState, rid: &str, session: CartSession) -> Result<Cart, ApiError> {
    flowershop_db::load_cart(&state.pool, session.0)
        .await
        .map_err(|e| map_db_error(rid.to_owned(), &e))
}

async fn save(
    state: &AppState,
    rid: &str,
    session: CartSession,
    cart: &Cart,
) -> Result<(), ApiError> {
    flowershop_db::save_cart(&state.pool, session.0, cart)
        .await
        .map_err(|e| map_db_error(rid.to_owned(), &e))
}

/// Lines for products that still exist and are published. A missing price
/// counts as zero.
async fn priced_lines(
    state: &AppState,
    rid: &str,
    cart: &Cart,
) -> Result<(Vec<CartLine>, Decimal), ApiError> {
    let rows = flowershop_db::list_products_by_ids(&state.pool, &cart.product_ids())
        .await
        .map_err(|e| map_db_error(rid.to_owned(), &e))?;

    let mut total = Decimal::ZERO;
    let lines: Vec<CartLine> = rows
        .into_iter()
        .filter_map(|row| {
            let qty = cart.qty(row.id);
            if qty == 0 {
                return None;
            }
            let price = row.price.unwrap_or(Decimal::ZERO);
            let line_total = price * Decimal::from(qty);
            total += line_total;
            Some(CartLine {
                image_url: product_image_url(
                    row.uploaded_image.as_deref(),
                    &row.image,
                    &state.config.media_url,
                    PRODUCT_PLACEHOLDER,
                ),
                product_id: row.id,
                title: clean_title(&row.title),
                slug: row.slug,
                price,
                qty,
                line_total,
            })
        })
        .collect();

    Ok((lines, total))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/cart
pub(super) async fn view_cart(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<CartSession>,
) -> Result<Json<ApiResponse<CartView>>, ApiError> {
    let rid = &req_id.0;
    let cart = load(&state, rid, session).await?;
    let (lines, total) = priced_lines(&state, rid, &cart).await?;

    let view = CartView {
        lines,
        total,
        cart_count: cart.count(),
    };
    Ok(Json(ApiResponse::new(view, req_id.0)))
}

/// GET /api/v1/cart/count
pub(super) async fn cart_count(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<CartSession>,
) -> Result<Json<ApiResponse<CartCount>>, ApiError> {
    let cart = load(&state, &req_id.0, session).await?;
    Ok(Json(ApiResponse::new(
        CartCount {
            cart_count: cart.count(),
        },
        req_id.0,
    )))
}

/// POST /api/v1/cart/items/{product_id}
pub(super) async fn add_item(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<CartSession>,
    Path(product_id): Path<i64>,
) -> Result<Json<ApiResponse<LineQty>>, ApiError> {
    let rid = &req_id.0;
    flowershop_db::get_product(&state.pool, product_id, false)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| not_found(rid, "product"))?;

    let mut cart = load(&state, rid, session).await?;
    let qty = cart.add_one(product_id);
    save(&state, rid, session, &cart).await?;

    Ok(Json(ApiResponse::new(
        LineQty {
            qty,
            cart_count: cart.count(),
        },
        req_id.0,
    )))
}

/// PUT /api/v1/cart/items/{product_id}
pub(super) async fn update_item(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<CartSession>,
    Path(product_id): Path<i64>,
    Json(body): Json<UpdateQtyRequest>,
) -> Result<Json<ApiResponse<LineQty>>, ApiError> {
    let rid = &req_id.0;
    let mut cart = load(&state, rid, session).await?;
    let qty = cart.set_qty(product_id, body.qty);
    save(&state, rid, session, &cart).await?;

    Ok(Json(ApiResponse::new(
        LineQty {
            qty,
            cart_count: cart.count(),
        },
        req_id.0,
    )))
}

/// DELETE /api/v1/cart/items/{product_id}
pub(super) async fn remove_item(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<CartSession>,
    Path(product_id): Path<i64>,
) -> Result<Json<ApiResponse<CartCount>>, ApiError> {
    let rid = &req_id.0;
    let mut cart = load(&state, rid, session).await?;
    if cart.remove(product_id) {
        save(&state, rid, session, &cart).await?;
    }

    Ok(Json(ApiResponse::new(
        CartCount {
            cart_count: cart.count(),
        },
        req_id.0,
    )))
}

/// POST /api/v1/cart/checkout
///
/// Writes an `orders` row and empties the cart. An optional `discount_code`
/// must name an existing discount.
pub(super) async fn checkout(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<CartSession>,
    Json(body): Json<CheckoutRequest>,
) -> Result<Json<ApiResponse<CheckoutResult>>, ApiError> {
    let rid = &req_id.0;
    let mut cart = load(&state, rid, session).await?;
    let (lines, total) = priced_lines(&state, rid, &cart).await?;

    let discount = resolve_discount(&state, rid, body.discount_code.as_deref()).await?;

    let order = place_order(&mut cart, &body.name, &body.phone, &body.comment)
        .map_err(|e| validation_error(rid, e.to_string()))?;

    let discount_id = discount.as_ref().map(|d| d.id);
    let order_id = flowershop_db::save_checkout(&state.pool, session.0, &order, discount_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let discount_percent = discount.map(|d| d.percent);
    let total_with_discount = discount_percent.map_or(total, |p| apply_discount(total, p));

    tracing::info!(
        session = %session.0,
        %order_id,
        items = order.items.count(),
        total = %total,
        ?discount_percent,
        "order placed"
    );

    Ok(Json(ApiResponse::new(
        CheckoutResult {
            order_id,
            name: order.name,
            phone: order.phone,
            comment: order.comment,
            lines,
            total,
            discount_percent,
            total_with_discount,
        },
        req_id.0,
    )))
}
