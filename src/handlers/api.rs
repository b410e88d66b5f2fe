use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::{json, Value};
use crate::AppState;
use crate::handlers::admin::AdminRequest;
use crate::models::{
    errors::AppError,
    item::{ItemPatch, NewItem},
    site_config::SiteConfigPatch,
};

/// API root: reports the site title
pub async fn api_root(State(app_state): State<AppState>) -> Json<Value> {
    let config = app_state.site_config.get().await;

    Json(json!({
        "ok": true,
        "title": config.title
    }))
}

/// List all items, newest first
pub async fn list_items(State(app_state): State<AppState>) -> Json<Value> {
    let items = app_state.items.list().await;

    Json(json!({
        "ok": true,
        "items": items
    }))
}

/// Get a single item by id
pub async fn get_item(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let item = app_state.items.get_by_id(&id).await?;

    Ok(Json(json!({
        "ok": true,
        "item": item
    })))
}

pub async fn create_item(
    State(app_state): State<AppState>,
    admin: AdminRequest,
) -> Result<Json<Value>, AppError> {
    let fields: NewItem = admin.parse()?;
    let item = app_state.items.create(fields).await?;

    Ok(Json(json!({
        "ok": true,
        "item": item
    })))
}

pub async fn update_item(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    admin: AdminRequest,
) -> Result<Json<Value>, AppError> {
    let patch: ItemPatch = admin.parse()?;
    let item = app_state.items.update(&id, patch).await?;

    Ok(Json(json!({
        "ok": true,
        "item": item
    })))
}

pub async fn delete_item(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    _admin: AdminRequest,
) -> Result<Json<Value>, AppError> {
    let removed = app_state.items.delete(&id).await?;

    Ok(Json(json!({
        "ok": true,
        "removed": removed
    })))
}

/// Update site settings (title, description, bannerUrl, adminToken, ownerTelegramId)
pub async fn update_config(
    State(app_state): State<AppState>,
    admin: AdminRequest,
) -> Result<Json<Value>, AppError> {
    let patch: SiteConfigPatch = admin.parse()?;
    let config = app_state.site_config.update(patch).await?;

    Ok(Json(json!({
        "ok": true,
        "config": config
    })))
}
