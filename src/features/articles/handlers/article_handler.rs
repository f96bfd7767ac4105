use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::articles::dtos::{
    ArticleResponseDto, ArticleSummaryDto, CreateArticleDto, PublishArticleDto, UpdateArticleDto,
};
use crate::features::articles::services::ArticleService;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

/// List published articles, newest first
#[utoipa::path(
    get,
    path = "/api/articles",
    tag = "articles",
    params(PaginationQuery),
    responses(
        (status = 200, description = "List of published articles", body = ApiResponse<Vec<ArticleSummaryDto>>),
    )
)]
pub async fn list_articles(
    State(service): State<Arc<ArticleService>>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<ArticleSummaryDto>>>> {
    let (articles, total) = service.list_published(query.offset(), query.limit()).await?;
    Ok(Json(ApiResponse::success(
        Some(articles),
        None,
        Some(Meta { total }),
    )))
}

/// Get a published article by slug
#[utoipa::path(
    get,
    path = "/api/articles/{slug}",
    tag = "articles",
    params(
        ("slug" = String, Path, description = "Article slug")
    ),
    responses(
        (status = 200, description = "Article found", body = ApiResponse<ArticleResponseDto>),
        (status = 404, description = "Article not found")
    )
)]
pub async fn get_article(
    State(service): State<Arc<ArticleService>>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<ArticleResponseDto>>> {
    let article = service.get_by_slug(&slug).await?;
    Ok(Json(ApiResponse::success(Some(article), None, None)))
}

/// List all articles regardless of publish state
#[utoipa::path(
    get,
    path = "/api/admin/articles",
    tag = "articles",
    params(PaginationQuery),
    responses(
        (status = 200, description = "List of articles", body = ApiResponse<Vec<ArticleSummaryDto>>),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("admin_auth" = [])
    )
)]
pub async fn list_articles_admin(
    State(service): State<Arc<ArticleService>>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<ArticleSummaryDto>>>> {
    let (articles, total) = service.list_all(query.offset(), query.limit()).await?;
    Ok(Json(ApiResponse::success(
        Some(articles),
        None,
        Some(Meta { total }),
    )))
}

/// Get an article by id regardless of publish state
#[utoipa::path(
    get,
    path = "/api/admin/articles/{id}",
    tag = "articles",
    params(
        ("id" = Uuid, Path, description = "Article id")
    ),
    responses(
        (status = 200, description = "Article found", body = ApiResponse<ArticleResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Article not found")
    ),
    security(
        ("admin_auth" = [])
    )
)]
pub async fn get_article_admin(
    State(service): State<Arc<ArticleService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ArticleResponseDto>>> {
    let article = service.get_by_id(id).await?;
    Ok(Json(ApiResponse::success(Some(article), None, None)))
}

/// Create an article
///
/// Saving also reconciles the article's image records; a tracking failure is
/// logged and never fails the save.
#[utoipa::path(
    post,
    path = "/api/admin/articles",
    tag = "articles",
    request_body = CreateArticleDto,
    responses(
        (status = 201, description = "Article created", body = ApiResponse<ArticleResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Authentication required"),
        (status = 409, description = "Slug already in use")
    ),
    security(
        ("admin_auth" = [])
    )
)]
pub async fn create_article(
    State(service): State<Arc<ArticleService>>,
    Json(dto): Json<CreateArticleDto>,
) -> Result<(StatusCode, Json<ApiResponse<ArticleResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let article = service.create(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(article), None, None)),
    ))
}

/// Update an article
#[utoipa::path(
    put,
    path = "/api/admin/articles/{id}",
    tag = "articles",
    params(
        ("id" = Uuid, Path, description = "Article id")
    ),
    request_body = UpdateArticleDto,
    responses(
        (status = 200, description = "Article updated", body = ApiResponse<ArticleResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Article not found"),
        (status = 409, description = "Slug already in use")
    ),
    security(
        ("admin_auth" = [])
    )
)]
pub async fn update_article(
    State(service): State<Arc<ArticleService>>,
    Path(id): Path<Uuid>,
    Json(dto): Json<UpdateArticleDto>,
) -> Result<Json<ApiResponse<ArticleResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let article = service.update(id, dto).await?;
    Ok(Json(ApiResponse::success(Some(article), None, None)))
}

/// Delete an article
///
/// The article's images are scheduled for deletion and cleaned up by the
/// sweep after the grace period.
#[utoipa::path(
    delete,
    path = "/api/admin/articles/{id}",
    tag = "articles",
    params(
        ("id" = Uuid, Path, description = "Article id")
    ),
    responses(
        (status = 200, description = "Article deleted"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Article not found")
    ),
    security(
        ("admin_auth" = [])
    )
)]
pub async fn delete_article(
    State(service): State<Arc<ArticleService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Article deleted".to_string()),
        None,
    )))
}

/// Publish or unpublish an article
#[utoipa::path(
    post,
    path = "/api/admin/articles/{id}/publish",
    tag = "articles",
    params(
        ("id" = Uuid, Path, description = "Article id")
    ),
    request_body = PublishArticleDto,
    responses(
        (status = 200, description = "Publish state updated", body = ApiResponse<ArticleResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Article not found")
    ),
    security(
        ("admin_auth" = [])
    )
)]
pub async fn publish_article(
    State(service): State<Arc<ArticleService>>,
    Path(id): Path<Uuid>,
    Json(dto): Json<PublishArticleDto>,
) -> Result<Json<ApiResponse<ArticleResponseDto>>> {
    let article = service.set_published(id, dto.publish).await?;
    Ok(Json(ApiResponse::success(Some(article), None, None)))
}
