use std::sync::Arc;

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    Json,
};
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::AppError;
use crate::features::articles::services::ArticleService;
use crate::features::images::dtos::{
    is_mime_type_allowed, AuditReportDto, BulkDeleteImagesDto, CleanupReportDto, ImageResponseDto,
    ImageStatsDto, ListImagesQuery, UploadImageDto, ALLOWED_MIME_TYPES, MAX_IMAGE_SIZE,
};
use crate::features::images::services::{ImageCleanupService, ImageService};
use crate::shared::types::{ApiResponse, Meta};

/// Shared state for the admin image endpoints
#[derive(Clone)]
pub struct ImagesState {
    pub image_service: Arc<ImageService>,
    pub cleanup_service: Arc<ImageCleanupService>,
    pub article_service: Arc<ArticleService>,
}

/// Upload an image to the CDN
///
/// Accepts multipart/form-data with:
/// - `file`: The image to upload (required)
/// - `article_id`: Optional owning article id; omit for ahead-of-time uploads
#[utoipa::path(
    post,
    path = "/api/admin/images/upload",
    tag = "images",
    request_body(
        content = UploadImageDto,
        content_type = "multipart/form-data",
        description = "Image upload form with optional article_id field",
    ),
    responses(
        (status = 201, description = "Image uploaded successfully", body = ApiResponse<ImageResponseDto>),
        (status = 400, description = "Invalid image or validation error"),
        (status = 401, description = "Authentication required"),
        (status = 502, description = "CDN upload failed")
    ),
    security(
        ("admin_auth" = [])
    )
)]
pub async fn upload_image(
    State(state): State<ImagesState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<ImageResponseDto>>), AppError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut content_type: Option<String> = None;
    let mut article_id: Option<Uuid> = None;

    // Process multipart fields
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let ct = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());

                let fname = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unnamed".to_string());

                let data = field.bytes().await.map_err(|e| {
                    debug!("Failed to read file bytes: {}", e);
                    AppError::BadRequest(format!("Failed to read file data: {}", e))
                })?;

                file_data = Some(data.to_vec());
                file_name = Some(fname);
                content_type = Some(ct);
            }
            "article_id" => {
                let text = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read article_id field: {}", e))
                })?;
                if !text.is_empty() {
                    article_id = Some(text.parse().map_err(|_| {
                        AppError::BadRequest(format!("Invalid article_id: {}", text))
                    })?);
                }
            }
            _ => {
                debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    // Validate required fields
    let file_data =
        file_data.ok_or_else(|| AppError::BadRequest("File is required".to_string()))?;
    let file_name =
        file_name.ok_or_else(|| AppError::BadRequest("Filename is required".to_string()))?;
    let content_type =
        content_type.ok_or_else(|| AppError::BadRequest("Content type is required".to_string()))?;

    // Validate file size
    if file_data.len() > MAX_IMAGE_SIZE {
        return Err(AppError::BadRequest(format!(
            "Image too large. Maximum size is {} bytes ({} MB)",
            MAX_IMAGE_SIZE,
            MAX_IMAGE_SIZE / 1024 / 1024
        )));
    }

    // Validate MIME type
    if !is_mime_type_allowed(&content_type) {
        return Err(AppError::BadRequest(format!(
            "File type '{}' is not allowed. Allowed types: {}",
            content_type,
            ALLOWED_MIME_TYPES.join(", ")
        )));
    }

    let response = state
        .image_service
        .upload_image(file_data, &file_name, &content_type, article_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(response), None, None)),
    ))
}

/// List tracked images with an optional usage filter
#[utoipa::path(
    get,
    path = "/api/admin/images",
    tag = "images",
    params(ListImagesQuery),
    responses(
        (status = 200, description = "List of images", body = ApiResponse<Vec<ImageResponseDto>>),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("admin_auth" = [])
    )
)]
pub async fn list_images(
    State(state): State<ImagesState>,
    Query(query): Query<ListImagesQuery>,
) -> Result<Json<ApiResponse<Vec<ImageResponseDto>>>, AppError> {
    let limit = query.page_size.clamp(1, crate::shared::constants::MAX_PAGE_SIZE);
    let offset = (query.page.max(1) - 1) * limit;

    let (images, total) = state.image_service.list(query.filter, offset, limit).await?;

    Ok(Json(ApiResponse::success(
        Some(images),
        None,
        Some(Meta { total }),
    )))
}

/// Aggregate image counters for the dashboard
#[utoipa::path(
    get,
    path = "/api/admin/images/stats",
    tag = "images",
    responses(
        (status = 200, description = "Image statistics", body = ApiResponse<ImageStatsDto>),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("admin_auth" = [])
    )
)]
pub async fn image_stats(
    State(state): State<ImagesState>,
) -> Result<Json<ApiResponse<ImageStatsDto>>, AppError> {
    let stats = state.image_service.stats().await?;
    Ok(Json(ApiResponse::success(Some(stats), None, None)))
}

/// Trigger a cleanup sweep immediately
///
/// Deletes every image whose grace period has expired and reports failures
/// per record without aborting the batch.
#[utoipa::path(
    post,
    path = "/api/admin/images/cleanup",
    tag = "images",
    responses(
        (status = 200, description = "Sweep finished", body = ApiResponse<CleanupReportDto>),
        (status = 401, description = "Authentication required"),
        (status = 503, description = "Record store unavailable")
    ),
    security(
        ("admin_auth" = [])
    )
)]
pub async fn run_cleanup(
    State(state): State<ImagesState>,
) -> Result<Json<ApiResponse<CleanupReportDto>>, AppError> {
    let report = state.cleanup_service.run_sweep().await?;
    Ok(Json(ApiResponse::success(Some(report), None, None)))
}

/// Delete images immediately, bypassing usage checks
#[utoipa::path(
    post,
    path = "/api/admin/images/delete",
    tag = "images",
    request_body = BulkDeleteImagesDto,
    responses(
        (status = 200, description = "Deletion finished", body = ApiResponse<CleanupReportDto>),
        (status = 400, description = "Empty id list"),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("admin_auth" = [])
    )
)]
pub async fn bulk_delete_images(
    State(state): State<ImagesState>,
    Json(dto): Json<BulkDeleteImagesDto>,
) -> Result<Json<ApiResponse<CleanupReportDto>>, AppError> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let report = state.cleanup_service.force_delete(&dto.ids).await?;
    Ok(Json(ApiResponse::success(Some(report), None, None)))
}

/// Re-scan every article and reconcile its image records
///
/// Drift-correction audit; the per-save reconciliation keeps records current
/// so this is only needed after out-of-band content changes.
#[utoipa::path(
    post,
    path = "/api/admin/images/reconcile-all",
    tag = "images",
    responses(
        (status = 200, description = "Audit finished", body = ApiResponse<AuditReportDto>),
        (status = 401, description = "Authentication required"),
        (status = 503, description = "Record store unavailable")
    ),
    security(
        ("admin_auth" = [])
    )
)]
pub async fn reconcile_all_images(
    State(state): State<ImagesState>,
) -> Result<Json<ApiResponse<AuditReportDto>>, AppError> {
    let (articles_scanned, records_updated) =
        state.article_service.reconcile_all_images().await?;

    Ok(Json(ApiResponse::success(
        Some(AuditReportDto {
            articles_scanned,
            records_updated,
        }),
        None,
        None,
    )))
}
