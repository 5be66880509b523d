use std::collections::{HashMap, HashSet};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use flowershop_core::{slugify, unique_slug};
use flowershop_db::{CategoryRow, SlugTarget};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::products::DeletedItem;
use super::{
    double_option, map_db_error, map_write_error, not_found, validation_error, ApiError,
    ApiResponse, AppState,
};

const DUPLICATE_CATEGORY: &str = "a category with that name already exists under this parent";
const MAX_NAME_CHARS: usize = 100;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub(super) struct CategoryNode {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub parent: Option<i64>,
    pub sort_order: i32,
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    fn leaf(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            parent: row.parent_id,
            sort_order: row.sort_order,
            children: Vec::new(),
        }
    }
}

/// Nests rows under their parents. Input order (already `(sort_order, name)`)
/// is kept at every level; rows whose parent is missing become roots.
pub(super) fn build_tree(rows: Vec<CategoryRow>) -> Vec<CategoryNode> {
    let known: HashSet<i64> = rows.iter().map(|r| r.id).collect();
    let mut by_parent: HashMap<Option<i64>, Vec<CategoryRow>> = HashMap::new();
    for row in rows {
        let key = row.parent_id.filter(|p| known.contains(p));
        by_parent.entry(key).or_default().push(row);
    }

    attach(None, &mut by_parent)
}

fn attach(
    parent: Option<i64>,
    by_parent: &mut HashMap<Option<i64>, Vec<CategoryRow>>,
) -> Vec<CategoryNode> {
    let rows = by_parent.remove(&parent).unwrap_or_default();
    rows.into_iter()
        .map(|row| {
            let id = row.id;
            let mut node = CategoryNode::leaf(row);
            node.children = attach(Some(id), by_parent);
            node
        })
        .collect()
}

/// True when making `new_parent` the parent of `id` would close a loop.
pub(super) fn creates_cycle(rows: &[CategoryRow], id: i64, new_parent: i64) -> bool {
    let parents: HashMap<i64, Option<i64>> = rows.iter().map(|r| (r.id, r.parent_id)).collect();
    let mut cursor = Some(new_parent);
    let mut seen = HashSet::new();
    while let Some(current) = cursor {
        if current == id {
            return true;
        }
        if !seen.insert(current) {
            return false;
        }
        cursor = parents.get(&current).copied().flatten();
    }
    false
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct CreateCategoryRequest {
    pub name: String,
    pub parent: Option<i64>,
    #[serde(default)]
    pub sort_order: i32,
}

#[allow(clippy::option_option)]
#[derive(Debug, Deserialize)]
pub(super) struct UpdateCategoryRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub parent: Option<Option<i64>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SortRequest {
    pub sort_order: i32,
}

fn validate_name(rid: &str, raw: &str) -> Result<String, ApiError> {
    let name = raw.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_CHARS {
        return Err(validation_error(
            rid,
            format!("name must be 1–{MAX_NAME_CHARS} characters"),
        ));
    }
    Ok(name.to_owned())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/categories
pub(super) async fn list_categories(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<CategoryNode>>>, ApiError> {
    let rows = flowershop_db::list_categories(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(build_tree(rows), req_id.0)))
}

/// GET /api/v1/categories/{id}
pub(super) async fn get_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<CategoryNode>>, ApiError> {
    let rid = &req_id.0;
    let rows = flowershop_db::list_categories(&state.pool)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let mut tree = build_tree(rows);
    let node = take_node(&mut tree, id).ok_or_else(|| not_found(rid, "category"))?;
    Ok(Json(ApiResponse::new(node, req_id.0)))
}

fn take_node(nodes: &mut Vec<CategoryNode>, id: i64) -> Option<CategoryNode> {
    if let Some(pos) = nodes.iter().position(|n| n.id == id) {
        return Some(nodes.swap_remove(pos));
    }
    nodes
        .iter_mut()
        .find_map(|n| take_node(&mut n.children, id))
}

/// POST /api/v1/categories
pub(super) async fn create_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryNode>>), ApiError> {
    let rid = &req_id.0;
    let name = validate_name(rid, &body.name)?;
    if body.sort_order < 0 {
        return Err(validation_error(rid, "sort_order must be >= 0"));
    }

    let parent_id = match body.parent {
        Some(parent) => flowershop_db::get_category(&state.pool, parent)
            .await
            .map_err(|e| map_db_error(rid.clone(), &e))?
            .map(|p| p.id),
        None => None,
    };
    if body.parent.is_some() && parent_id.is_none() {
        tracing::debug!(parent = ?body.parent, "unknown parent category; creating a root");
    }

    let taken: HashSet<String> = flowershop_db::list_taken_slugs(&state.pool, SlugTarget::Category)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .into_iter()
        .collect();
    let base = slugify(&name);
    let slug = if base.is_empty() {
        String::new()
    } else {
        unique_slug(&base, 2, |s| taken.contains(s))
    };

    let row = flowershop_db::create_category(&state.pool, &name, &slug, parent_id, body.sort_order)
        .await
        .map_err(|e| map_write_error(rid, &e, DUPLICATE_CATEGORY))?;

    tracing::info!(category_id = row.id, name = %row.name, "category created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(CategoryNode::leaf(row), req_id.0)),
    ))
}

/// PATCH /api/v1/categories/{id}
pub(super) async fn update_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateCategoryRequest>,
) -> Result<Json<ApiResponse<CategoryNode>>, ApiError> {
    let rid = &req_id.0;
    let name = body
        .name
        .as_deref()
        .map(|n| validate_name(rid, n))
        .transpose()?;

    if let Some(Some(parent)) = body.parent {
        if parent == id {
            return Err(validation_error(rid, "a category cannot be its own parent"));
        }
        let rows = flowershop_db::list_categories(&state.pool)
            .await
            .map_err(|e| map_db_error(rid.clone(), &e))?;
        if !rows.iter().any(|r| r.id == parent) {
            return Err(validation_error(rid, format!("unknown parent category {parent}")));
        }
        if creates_cycle(&rows, id, parent) {
            return Err(validation_error(
                rid,
                "a category cannot move under its own descendant",
            ));
        }
    }

    let row = flowershop_db::update_category(&state.pool, id, name.as_deref(), body.parent)
        .await
        .map_err(|e| match e {
            flowershop_db::DbError::NotFound => not_found(rid, "category"),
            other => map_write_error(rid, &other, DUPLICATE_CATEGORY),
        })?;

    Ok(Json(ApiResponse::new(CategoryNode::leaf(row), req_id.0)))
}

/// PUT /api/v1/categories/{id}/sort
pub(super) async fn set_category_sort(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<SortRequest>,
) -> Result<Json<ApiResponse<CategoryNode>>, ApiError> {
    let rid = &req_id.0;
    if body.sort_order < 0 {
        return Err(validation_error(rid, "sort_order must be >= 0"));
    }
    let row = flowershop_db::set_category_sort(&state.pool, id, body.sort_order)
        .await
        .map_err(|e| match e {
            flowershop_db::DbError::NotFound => not_found(rid, "category"),
            other => map_db_error(rid.clone(), &other),
        })?;

    Ok(Json(ApiResponse::new(CategoryNode::leaf(row), req_id.0)))
}

/// DELETE /api/v1/categories/{id}
pub(super) async fn delete_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<DeletedItem>>, ApiError> {
    let rid = &req_id.0;
    let deleted = flowershop_db::delete_category(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if !deleted {
        return Err(not_found(rid, "category"));
    }
    tracing::info!(category_id = id, "category deleted with its subtree");
    Ok(Json(ApiResponse::new(DeletedItem { id, deleted }, req_id.0)))
}
