use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::tags::dtos::{CreateTagDto, TagResponseDto};
use crate::features::tags::services::TagService;
use crate::shared::types::ApiResponse;

/// List all tags
#[utoipa::path(
    get,
    path = "/api/tags",
    tag = "tags",
    responses(
        (status = 200, description = "List of tags", body = ApiResponse<Vec<TagResponseDto>>),
    )
)]
pub async fn list_tags(
    State(service): State<Arc<TagService>>,
) -> Result<Json<ApiResponse<Vec<TagResponseDto>>>> {
    let tags = service.list().await?;
    Ok(Json(ApiResponse::success(Some(tags), None, None)))
}

/// Create a tag
#[utoipa::path(
    post,
    path = "/api/admin/tags",
    tag = "tags",
    request_body = CreateTagDto,
    responses(
        (status = 201, description = "Tag created", body = ApiResponse<TagResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("admin_auth" = [])
    )
)]
pub async fn create_tag(
    State(service): State<Arc<TagService>>,
    Json(dto): Json<CreateTagDto>,
) -> Result<(StatusCode, Json<ApiResponse<TagResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let tag = service.create(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(tag), None, None)),
    ))
}

/// Delete a tag
#[utoipa::path(
    delete,
    path = "/api/admin/tags/{id}",
    tag = "tags",
    params(
        ("id" = Uuid, Path, description = "Tag id")
    ),
    responses(
        (status = 200, description = "Tag deleted"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Tag not found")
    ),
    security(
        ("admin_auth" = [])
    )
)]
pub async fn delete_tag(
    State(service): State<Arc<TagService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Tag deleted".to_string()),
        None,
    )))
}
