use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::features::tags::handlers;
use crate::features::tags::services::TagService;

/// Create public routes for the tags feature (no authentication required)
pub fn public_routes(service: Arc<TagService>) -> Router {
    Router::new()
        .route("/api/tags", get(handlers::list_tags))
        .with_state(service)
}

/// Create admin routes for the tags feature
pub fn admin_routes(service: Arc<TagService>) -> Router {
    Router::new()
        .route("/api/admin/tags", post(handlers::create_tag))
        .route("/api/admin/tags/{id}", delete(handlers::delete_tag))
        .with_state(service)
}
