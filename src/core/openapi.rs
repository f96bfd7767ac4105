use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::articles::{dtos as articles_dtos, handlers as articles_handlers};
use crate::features::categories::{dtos as categories_dtos, handlers as categories_handlers};
use crate::features::images::store::ImageFilter;
use crate::features::images::{dtos as images_dtos, handlers as images_handlers};
use crate::features::tags::{dtos as tags_dtos, handlers as tags_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Articles (public)
        articles_handlers::list_articles,
        articles_handlers::get_article,
        // Articles (admin)
        articles_handlers::list_articles_admin,
        articles_handlers::get_article_admin,
        articles_handlers::create_article,
        articles_handlers::update_article,
        articles_handlers::delete_article,
        articles_handlers::publish_article,
        // Categories
        categories_handlers::list_categories,
        categories_handlers::get_category,
        categories_handlers::create_category,
        categories_handlers::update_category,
        categories_handlers::delete_category,
        // Tags
        tags_handlers::list_tags,
        tags_handlers::create_tag,
        tags_handlers::delete_tag,
        // Images (admin)
        images_handlers::upload_image,
        images_handlers::list_images,
        images_handlers::image_stats,
        images_handlers::run_cleanup,
        images_handlers::bulk_delete_images,
        images_handlers::reconcile_all_images,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Articles
            articles_dtos::CreateArticleDto,
            articles_dtos::UpdateArticleDto,
            articles_dtos::PublishArticleDto,
            articles_dtos::ArticleResponseDto,
            articles_dtos::ArticleSummaryDto,
            ApiResponse<articles_dtos::ArticleResponseDto>,
            ApiResponse<Vec<articles_dtos::ArticleSummaryDto>>,
            // Categories
            categories_dtos::CreateCategoryDto,
            categories_dtos::UpdateCategoryDto,
            categories_dtos::CategoryResponseDto,
            ApiResponse<categories_dtos::CategoryResponseDto>,
            ApiResponse<Vec<categories_dtos::CategoryResponseDto>>,
            // Tags
            tags_dtos::CreateTagDto,
            tags_dtos::TagResponseDto,
            ApiResponse<tags_dtos::TagResponseDto>,
            ApiResponse<Vec<tags_dtos::TagResponseDto>>,
            // Images
            ImageFilter,
            images_dtos::UploadImageDto,
            images_dtos::ImageResponseDto,
            images_dtos::ImageStatsDto,
            images_dtos::BulkDeleteImagesDto,
            images_dtos::CleanupErrorDto,
            images_dtos::CleanupReportDto,
            images_dtos::AuditReportDto,
            ApiResponse<images_dtos::ImageResponseDto>,
            ApiResponse<Vec<images_dtos::ImageResponseDto>>,
            ApiResponse<images_dtos::ImageStatsDto>,
            ApiResponse<images_dtos::CleanupReportDto>,
            ApiResponse<images_dtos::AuditReportDto>,
        )
    ),
    tags(
        (name = "articles", description = "Blog articles (public reading and admin authoring)"),
        (name = "categories", description = "Article categories"),
        (name = "tags", description = "Article tags"),
        (name = "images", description = "Image upload, usage tracking and cleanup (admin only)"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Inkpress API",
        version = "0.1.0",
        description = "API documentation for Inkpress",
    )
)]
pub struct ApiDoc;

/// Adds the admin basic auth security scheme to the OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "admin_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Basic).build()),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
