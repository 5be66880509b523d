mod bot;
mod cart;
mod catalog;
mod categories;
mod discounts;
mod hero_banners;
mod orders;
mod products;
mod reviews;
mod showcase;
mod stores;

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{delete, get, patch, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use flowershop_core::AppConfig;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::middleware::{
    cart_session, enforce_rate_limit, identify_caller, request_id, require_bearer_auth,
    require_bot_token, AuthState, BotAuth, RateLimitState, RequestId,
};

/// Room left in a bot upload request for the non-file form fields.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(data: T, request_id: String) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "forbidden" => StatusCode::FORBIDDEN,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "payload_too_large" => StatusCode::PAYLOAD_TOO_LARGE,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

pub(super) fn map_db_error(request_id: String, error: &flowershop_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

/// Like [`map_db_error`], but unique violations become `conflict`, references
/// to rows that do not exist become `validation_error` and a missing row
/// becomes `not_found`.
pub(super) fn map_write_error(
    request_id: &str,
    error: &flowershop_db::DbError,
    conflict_message: &str,
) -> ApiError {
    if error.is_unique_violation() {
        return ApiError::new(request_id, "conflict", conflict_message);
    }
    if error.is_foreign_key_violation() {
        tracing::debug!(error = %error, "write references a missing row");
        return validation_error(request_id, "references a record that does not exist");
    }
    if matches!(error, flowershop_db::DbError::NotFound) {
        return ApiError::new(request_id, "not_found", "not found");
    }
    map_db_error(request_id.to_owned(), error)
}

pub(super) fn not_found(request_id: &str, what: &str) -> ApiError {
    ApiError::new(request_id, "not_found", format!("{what} not found"))
}

pub(super) fn validation_error(request_id: &str, message: impl Into<String>) -> ApiError {
    ApiError::new(request_id, "validation_error", message)
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field
/// (`None`, via `#[serde(default)]`) in PATCH bodies.
#[allow(clippy::option_option)]
pub(super) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Accepts the loose truthy spellings query strings use: `1`, `true`, `yes`.
pub(super) fn is_truthy(raw: Option<&str>) -> bool {
    matches!(
        raw.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes")
    )
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
            HeaderName::from_static("x-bot-token"),
        ])
}

fn public_router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/products", get(products::list_products))
        .route("/api/v1/products/{id}", get(products::get_product))
        .route(
            "/api/v1/products/by-slug/{slug}",
            get(products::get_product_by_slug),
        )
        .route(
            "/api/v1/catalog/categories/{slug}",
            get(catalog::category_page),
        )
        .route("/api/v1/catalog/flowers/{slug}", get(catalog::flower_page))
        .route("/api/v1/showcase", get(showcase::homepage_showcase))
        .route("/api/v1/home/category-cards", get(showcase::category_cards))
        .route("/api/v1/categories", get(categories::list_categories))
        .route("/api/v1/categories/{id}", get(categories::get_category))
        .route("/api/v1/flower-tags", get(catalog::list_flower_tags))
        .route("/api/v1/stores", get(stores::list_stores))
        .route(
            "/api/v1/stores/{id}/showcase",
            get(showcase::store_showcase),
        )
        .route("/api/v1/hero-banners", get(hero_banners::list_banners))
        .route(
            "/api/v1/hero-banners/current",
            get(hero_banners::current_banner),
        )
        .route("/api/v1/reviews", get(reviews::list_reviews))
        .route("/api/v1/reviews/submit", post(reviews::submit_review))
}

fn cart_router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/cart", get(cart::view_cart))
        .route("/api/v1/cart/count", get(cart::cart_count))
        .route(
            "/api/v1/cart/items/{product_id}",
            post(cart::add_item)
                .put(cart::update_item)
                .delete(cart::remove_item),
        )
        .route("/api/v1/cart/checkout", post(cart::checkout))
        .layer(axum::middleware::from_fn(cart_session))
}

fn bot_router(bot: BotAuth, max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/api/v1/auth/bot-token", post(bot::authenticate))
        .route("/api/v1/products/from-bot", post(bot::create_product))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(bot, require_bot_token))
                .layer(DefaultBodyLimit::max(
                    max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
                )),
        )
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/products", post(products::create_product))
        .route(
            "/api/v1/products/{id}",
            patch(products::update_product).delete(products::delete_product),
        )
        .route("/api/v1/products/{id}/price", put(products::set_price))
        .route(
            "/api/v1/products/{id}/showcase",
            put(products::set_showcase),
        )
        .route(
            "/api/v1/products/{id}/published",
            put(products::set_published),
        )
        .route("/api/v1/products/{id}/images", post(products::add_image))
        .route(
            "/api/v1/products/{id}/images/{image_id}",
            delete(products::delete_image),
        )
        .route("/api/v1/showcase/order", put(showcase::reorder))
        .route(
            "/api/v1/stores/{id}/showcase/{product_id}",
            put(showcase::pin_item).delete(showcase::unpin_item),
        )
        .route("/api/v1/categories", post(categories::create_category))
        .route(
            "/api/v1/categories/{id}",
            patch(categories::update_category).delete(categories::delete_category),
        )
        .route(
            "/api/v1/categories/{id}/sort",
            put(categories::set_category_sort),
        )
        .route("/api/v1/hero-banners", post(hero_banners::create_banner))
        .route(
            "/api/v1/hero-banners/{id}",
            put(hero_banners::update_banner).delete(hero_banners::delete_banner),
        )
        .route(
            "/api/v1/reviews/{id}",
            patch(reviews::update_review).delete(reviews::delete_review),
        )
        .route(
            "/api/v1/orders",
            get(orders::list_orders).post(orders::create_order),
        )
        .route(
            "/api/v1/orders/{id}",
            get(orders::get_order).delete(orders::delete_order),
        )
        .route(
            "/api/v1/discounts",
            get(discounts::list_discounts).post(discounts::create_discount),
        )
        .route(
            "/api/v1/discounts/{id}",
            put(discounts::update_discount).delete(discounts::delete_discount),
        )
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let bot = BotAuth::new(state.config.bot_secret.as_deref());
    let media_prefix = state.config.media_url.trim_end_matches('/').to_string();
    let media_root = state.config.media_root.clone();

    let mut app = Router::new()
        .merge(public_router())
        .merge(cart_router())
        .merge(bot_router(bot, state.config.max_upload_bytes))
        .merge(protected_router(auth.clone(), rate_limit));

    if !media_prefix.is_empty() {
        app = app.nest_service(&media_prefix, ServeDir::new(media_root));
    }

    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(build_cors())
            .layer(axum::middleware::from_fn(request_id))
            .layer(axum::middleware::from_fn_with_state(auth, identify_caller)),
    )
    .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match flowershop_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}
