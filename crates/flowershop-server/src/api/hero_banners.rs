use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use flowershop_core::catalog::{
    parse_optional_date, DEFAULT_BANNER_BUTTON_TEXT, DEFAULT_BANNER_BUTTON_URL,
};
use flowershop_core::urls::media_or_legacy_url;
use flowershop_db::{HeroBannerInput, HeroBannerRow};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::products::DeletedItem;
use super::{
    map_db_error, map_write_error, not_found, validation_error, ApiError, ApiResponse, AppState,
};

const DUPLICATE_BANNER: &str = "a banner with that name already exists";

#[derive(Debug, Serialize)]
pub(super) struct HeroBannerItem {
    id: i64,
    name: String,
    title: String,
    caption: String,
    overview: String,
    button_text: String,
    button_url: String,
    desktop_image: String,
    mobile_image: Option<String>,
    desktop_image_url: String,
    mobile_image_url: String,
    is_active: bool,
    starts_on: Option<NaiveDate>,
    ends_on: Option<NaiveDate>,
    sort_order: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl HeroBannerItem {
    fn from_row(row: HeroBannerRow, media_url: &str) -> Self {
        let desktop_image_url = media_or_legacy_url(media_url, &row.desktop_image);
        let mobile_image_url = row
            .mobile_image
            .as_deref()
            .filter(|m| !m.is_empty())
            .map_or_else(
                || desktop_image_url.clone(),
                |m| media_or_legacy_url(media_url, m),
            );
        Self {
            id: row.id,
            name: row.name,
            title: row.title,
            caption: row.caption,
            overview: row.overview,
            button_text: row.button_text,
            button_url: row.button_url,
            desktop_image: row.desktop_image,
            mobile_image: row.mobile_image,
            desktop_image_url,
            mobile_image_url,
            is_active: row.is_active,
            starts_on: row.starts_on,
            ends_on: row.ends_on,
            sort_order: row.sort_order,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// The live banner, or an empty object when none is scheduled for today.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(super) enum CurrentBanner {
    Live(Box<HeroBannerItem>),
    Empty {},
}

#[derive(Debug, Deserialize)]
pub(super) struct BannerRequest {
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub overview: String,
    pub button_text: Option<String>,
    pub button_url: Option<String>,
    #[serde(default)]
    pub desktop_image: String,
    pub mobile_image: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub starts_on: Option<String>,
    pub ends_on: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

fn default_active() -> bool {
    true
}

impl BannerRequest {
    fn into_input(self, rid: &str) -> Result<HeroBannerInput, ApiError> {
        let name = self.name.trim().to_owned();
        if name.is_empty() {
            return Err(validation_error(rid, "name is required"));
        }
        let desktop_image = self.desktop_image.trim().to_owned();
        if desktop_image.is_empty() {
            return Err(validation_error(rid, "desktop_image is required"));
        }
        if self.sort_order < 0 {
            return Err(validation_error(rid, "sort_order must be >= 0"));
        }
        let or_default = |value: Option<String>, default: &str| {
            value
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_owned())
        };

        Ok(HeroBannerInput {
            name,
            title: self.title,
            caption: self.caption,
            overview: self.overview,
            button_text: or_default(self.button_text, DEFAULT_BANNER_BUTTON_TEXT),
            button_url: or_default(self.button_url, DEFAULT_BANNER_BUTTON_URL),
            desktop_image,
            mobile_image: self
                .mobile_image
                .map(|m| m.trim().to_owned())
                .filter(|m| !m.is_empty()),
            is_active: self.is_active,
            starts_on: parse_optional_date(self.starts_on.as_deref()),
            ends_on: parse_optional_date(self.ends_on.as_deref()),
            sort_order: self.sort_order,
        })
    }
}

/// GET /api/v1/hero-banners
pub(super) async fn list_banners(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<HeroBannerItem>>>, ApiError> {
    let rows = flowershop_db::list_hero_banners(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| HeroBannerItem::from_row(row, &state.config.media_url))
        .collect();
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

/// GET /api/v1/hero-banners/current
pub(super) async fn current_banner(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<CurrentBanner>>, ApiError> {
    let today = Utc::now().date_naive();
    let row = flowershop_db::current_hero_banner(&state.pool, today)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = match row {
        Some(row) => CurrentBanner::Live(Box::new(HeroBannerItem::from_row(
            row,
            &state.config.media_url,
        ))),
        None => CurrentBanner::Empty {},
    };
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

/// POST /api/v1/hero-banners
pub(super) async fn create_banner(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<BannerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<HeroBannerItem>>), ApiError> {
    let rid = &req_id.0;
    let input = body.into_input(rid)?;

    let row = flowershop_db::create_hero_banner(&state.pool, &input)
        .await
        .map_err(|e| map_write_error(rid, &e, DUPLICATE_BANNER))?;

    tracing::info!(banner_id = row.id, name = %row.name, "hero banner created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            HeroBannerItem::from_row(row, &state.config.media_url),
            req_id.0,
        )),
    ))
}

/// PUT /api/v1/hero-banners/{id}
pub(super) async fn update_banner(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<BannerRequest>,
) -> Result<Json<ApiResponse<HeroBannerItem>>, ApiError> {
    let rid = &req_id.0;
    let input = body.into_input(rid)?;

    let row = flowershop_db::update_hero_banner(&state.pool, id, &input)
        .await
        .map_err(|e| match e {
            flowershop_db::DbError::NotFound => not_found(rid, "hero banner"),
            other => map_write_error(rid, &other, DUPLICATE_BANNER),
        })?;

    Ok(Json(ApiResponse::new(
        HeroBannerItem::from_row(row, &state.config.media_url),
        req_id.0,
    )))
}

/// DELETE /api/v1/hero-banners/{id}
pub(super) async fn delete_banner(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<DeletedItem>>, ApiError> {
    let rid = &req_id.0;
    let deleted = flowershop_db::delete_hero_banner(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if !deleted {
        return Err(not_found(rid, "hero banner"));
    }
    Ok(Json(ApiResponse::new(DeletedItem { id, deleted }, req_id.0)))
}
