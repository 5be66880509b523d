//! Endpoints the Telegram bot calls on behalf of store managers.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Extension, Json,
};
use flowershop_core::catalog::parse_bot_price;
use flowershop_core::DEFAULT_BOT_TITLE;
use flowershop_db::BotProductInput;
use serde::{Deserialize, Serialize};

use crate::media::{discard_product_image, store_product_image, MediaError, StoredMedia};
use crate::middleware::RequestId;

use super::products::{generate_product_slug, product_detail, validate_title, ProductDetail};
use super::stores::StoreItem;
use super::{map_db_error, validation_error, ApiError, ApiResponse, AppState};

const UNAUTHORIZED_MANAGER: &str = "telegram_id: Пользователь не авторизован.";
const STORE_DENIED: &str = "store_id: Нет доступа к выбранному магазину.";

#[derive(Debug, Deserialize)]
pub(super) struct BotAuthRequest {
    pub telegram_id: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub(super) struct ManagerItem {
    telegram_id: i64,
    telegram_username: String,
    full_name: String,
    is_active: bool,
    stores: Vec<StoreItem>,
}

/// The bot sends ids either as JSON numbers or as strings.
fn telegram_id_from(value: Option<&serde_json::Value>) -> Option<i64> {
    match value? {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// POST /api/v1/auth/bot-token
pub(super) async fn authenticate(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<BotAuthRequest>,
) -> Result<Json<ApiResponse<ManagerItem>>, ApiError> {
    let rid = &req_id.0;
    let telegram_id = telegram_id_from(body.telegram_id.as_ref())
        .filter(|id| *id != 0)
        .ok_or_else(|| ApiError::new(rid.as_str(), "bad_request", "telegram_id is required"))?;

    let manager = flowershop_db::get_active_manager_by_telegram_id(&state.pool, telegram_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| {
            tracing::warn!(telegram_id, "bot auth for unknown or inactive manager");
            ApiError::new(rid.as_str(), "forbidden", "unauthorized")
        })?;

    let stores = flowershop_db::list_manager_stores(&state.pool, manager.id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse::new(
        ManagerItem {
            telegram_id: manager.telegram_id,
            telegram_username: manager.telegram_username,
            full_name: manager.full_name,
            is_active: manager.is_active,
            stores: stores.into_iter().map(StoreItem::from).collect(),
        },
        req_id.0,
    )))
}

// ---------------------------------------------------------------------------
// Product upload
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct UploadForm {
    telegram_id: Option<String>,
    store_id: Option<String>,
    price: Option<String>,
    title: String,
    description: String,
    image: Option<(Vec<u8>, Option<String>)>,
}

fn multipart_error(rid: &str, err: &MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::new(rid, "payload_too_large", "upload exceeds the size limit");
    }
    ApiError::new(rid, "bad_request", err.body_text())
}

fn media_error(rid: &str, err: &MediaError) -> ApiError {
    match err {
        MediaError::TooLarge { .. } => ApiError::new(rid, "payload_too_large", err.to_string()),
        MediaError::Empty => validation_error(rid, format!("uploaded_image: {err}")),
        MediaError::Io { .. } => {
            tracing::error!(error = %err, "failed to store bot upload");
            ApiError::new(rid, "internal_error", "failed to store upload")
        }
    }
}

async fn read_form(rid: &str, mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(rid, &e))?
    {
        let name = field.name().unwrap_or_default().to_owned();
        if name == "uploaded_image" {
            let content_type = field.content_type().map(ToOwned::to_owned);
            let bytes = field.bytes().await.map_err(|e| multipart_error(rid, &e))?;
            if !bytes.is_empty() {
                form.image = Some((bytes.to_vec(), content_type));
            }
            continue;
        }

        let text = field.text().await.map_err(|e| multipart_error(rid, &e))?;
        match name.as_str() {
            "telegram_id" => form.telegram_id = Some(text),
            "store_id" => form.store_id = Some(text),
            "price" => form.price = Some(text),
            "title" => form.title = text.trim().to_owned(),
            "description" => form.description = text,
            other => tracing::debug!(field = other, "ignoring unknown bot form field"),
        }
    }
    Ok(form)
}

/// POST /api/v1/products/from-bot
///
/// Multipart upload of a new bouquet by a store manager. The product goes
/// straight to the homepage showcase and to the store's own showcase.
pub(super) async fn create_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<ProductDetail>>), ApiError> {
    let rid = &req_id.0;
    let form = read_form(rid, multipart).await?;

    let telegram_id = form
        .telegram_id
        .as_deref()
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .ok_or_else(|| validation_error(rid, UNAUTHORIZED_MANAGER))?;
    let manager = flowershop_db::get_active_manager_by_telegram_id(&state.pool, telegram_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| validation_error(rid, UNAUTHORIZED_MANAGER))?;

    let store_id = form
        .store_id
        .as_deref()
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .ok_or_else(|| validation_error(rid, STORE_DENIED))?;
    let store = flowershop_db::manager_can_post_to(&state.pool, manager.id, store_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| {
            tracing::warn!(manager_id = manager.id, store_id, "bot upload to a foreign store");
            validation_error(rid, STORE_DENIED)
        })?;

    let price = parse_bot_price(form.price.as_deref().unwrap_or_default())
        .map_err(|e| validation_error(rid, format!("price: {e}")))?;

    let title = if form.title.is_empty() {
        DEFAULT_BOT_TITLE.to_owned()
    } else {
        validate_title(rid, &form.title)?
    };
    let slug = generate_product_slug(&state.pool, &title, 1)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let stored = match &form.image {
        Some((bytes, content_type)) => {
            store_product_image(&state.config, bytes, content_type.as_deref())
                .await
                .map_err(|e| media_error(rid, &e))?
        }
        None => StoredMedia {
            relative_path: String::new(),
            absolute_url: String::new(),
            created: false,
        },
    };

    let created = flowershop_db::create_bot_product(
        &state.pool,
        &BotProductInput {
            title,
            description: form.description,
            price,
            slug,
            uploaded_image: stored.relative_path.clone(),
            image: stored.absolute_url.clone(),
            manager_id: manager.id,
            store_id: store.id,
            store_subdomain: store.subdomain,
        },
    )
    .await;
    let row = match created {
        Ok(row) => row,
        Err(e) => {
            discard_product_image(&state.config.media_root, &stored).await;
            return Err(map_db_error(rid.clone(), &e));
        }
    };

    tracing::info!(
        product_id = row.id,
        manager_id = manager.id,
        store_id = store.id,
        "bot product created"
    );

    let detail = product_detail(&state, rid, row).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(detail, req_id.0)),
    ))
}
