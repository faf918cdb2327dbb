use axum::{routing::get, Router};

use super::{auth, catalogue};
use crate::types::Context;
use std::sync::Arc;

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/", get(catalogue::routes::home))
        .nest("/catalogue", catalogue::routes::get_router())
        .nest("/catalogue.json", catalogue::json::get_router())
        .merge(auth::get_router())
}
