use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

use crate::{
    modules::{category, menu_item},
    types::Context,
};

/// Whole catalogue, newest categories first, items nested under
/// `menu_items`. An empty system is an error, not an empty list.
async fn get_catalogue(State(ctx): State<Arc<Context>>) -> Response {
    match category::repository::find_all_with_items(&ctx.db_conn.pool).await {
        Ok(categories) if categories.is_empty() => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "No Categories found in the system." })),
        )
            .into_response(),
        Ok(categories) => Json(json!({ "categories": categories })).into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch catalogue" })),
        )
            .into_response(),
    }
}

async fn get_category(
    State(ctx): State<Arc<Context>>,
    Path(category_slug): Path<String>,
) -> Response {
    match category::repository::find_by_slug_with_items(&ctx.db_conn.pool, category_slug.clone())
        .await
    {
        Ok(Some(category)) => Json(json!({ "category": category })).into_response(),
        Ok(None) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "message": format!("No Category {} found in the system.", category_slug)
            })),
        )
            .into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch category" })),
        )
            .into_response(),
    }
}

async fn get_menu_item(
    State(ctx): State<Arc<Context>>,
    Path((category_slug, menu_slug)): Path<(String, String)>,
) -> Response {
    match menu_item::repository::find_by_slug_in_category(
        &ctx.db_conn.pool,
        category_slug,
        menu_slug,
    )
    .await
    {
        Ok(Some(item)) => Json(json!({ "menu_item": item.view() })).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "No result found." })),
        )
            .into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch menu item" })),
        )
            .into_response(),
    }
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/", get(get_catalogue))
        .route("/:category_slug", get(get_category))
        .route("/:category_slug/:menu_slug", get(get_menu_item))
}
