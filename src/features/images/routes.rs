use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::features::articles::services::ArticleService;
use crate::features::images::dtos::MAX_IMAGE_SIZE;
use crate::features::images::handlers::{
    bulk_delete_images, image_stats, list_images, reconcile_all_images, run_cleanup, upload_image,
    ImagesState,
};
use crate::features::images::services::{ImageCleanupService, ImageService};

/// Create admin routes for the images feature
pub fn admin_routes(
    image_service: Arc<ImageService>,
    cleanup_service: Arc<ImageCleanupService>,
    article_service: Arc<ArticleService>,
) -> Router {
    let state = ImagesState {
        image_service,
        cleanup_service,
        article_service,
    };

    Router::new()
        .route("/api/admin/images", get(list_images))
        .route("/api/admin/images/stats", get(image_stats))
        .route(
            "/api/admin/images/upload",
            // Allow body size up to MAX_IMAGE_SIZE + buffer for multipart overhead
            post(upload_image).layer(DefaultBodyLimit::max(MAX_IMAGE_SIZE + 1024 * 1024)),
        )
        .route("/api/admin/images/cleanup", post(run_cleanup))
        .route("/api/admin/images/delete", post(bulk_delete_images))
        .route("/api/admin/images/reconcile-all", post(reconcile_all_images))
        .with_state(state)
}
