use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::features::articles::handlers;
use crate::features::articles::services::ArticleService;

/// Create public routes for the articles feature (no authentication required)
pub fn public_routes(service: Arc<ArticleService>) -> Router {
    Router::new()
        .route("/api/articles", get(handlers::list_articles))
        .route("/api/articles/{slug}", get(handlers::get_article))
        .with_state(service)
}

/// Create admin routes for the articles feature
pub fn admin_routes(service: Arc<ArticleService>) -> Router {
    Router::new()
        .route("/api/admin/articles", get(handlers::list_articles_admin))
        .route("/api/admin/articles", post(handlers::create_article))
        .route("/api/admin/articles/{id}", get(handlers::get_article_admin))
        .route("/api/admin/articles/{id}", put(handlers::update_article))
        .route("/api/admin/articles/{id}", delete(handlers::delete_article))
        .route(
            "/api/admin/articles/{id}/publish",
            post(handlers::publish_article),
        )
        .with_state(service)
}
