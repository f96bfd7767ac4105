use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::articles::models::Article;

/// Request DTO for creating an article
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateArticleDto {
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub title: String,

    /// URL slug; derived from the title when omitted
    pub slug: Option<String>,

    #[serde(default)]
    pub content: String,

    pub excerpt: Option<String>,

    /// Hero image URL; must point at the image CDN to be tracked
    #[validate(url(message = "featured_image_url must be a valid URL"))]
    pub featured_image_url: Option<String>,

    pub category_id: Option<Uuid>,

    /// Tag names; missing tags are created on the fly
    pub tags: Option<Vec<String>>,
}

/// Request DTO for updating an article
///
/// Omitted fields are left unchanged. An empty `featured_image_url` clears
/// the hero image.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateArticleDto {
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub title: Option<String>,

    pub slug: Option<String>,

    pub content: Option<String>,

    pub excerpt: Option<String>,

    pub featured_image_url: Option<String>,

    pub category_id: Option<Uuid>,

    pub tags: Option<Vec<String>>,
}

/// Request DTO for publishing or unpublishing an article
#[derive(Debug, Deserialize, ToSchema)]
pub struct PublishArticleDto {
    pub publish: bool,
}

/// Full article response (detail views and admin)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ArticleResponseDto {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image_url: Option<String>,
    pub is_published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tags: Vec<String>,
}

impl ArticleResponseDto {
    pub fn from_article(article: Article, tags: Vec<String>) -> Self {
        Self {
            id: article.id,
            category_id: article.category_id,
            title: article.title,
            slug: article.slug,
            content: article.content,
            excerpt: article.excerpt,
            featured_image_url: article.featured_image_url,
            is_published: article.is_published,
            published_at: article.published_at,
            created_at: article.created_at,
            updated_at: article.updated_at,
            tags,
        }
    }
}

/// Compact article representation for list views (content omitted)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ArticleSummaryDto {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub featured_image_url: Option<String>,
    pub is_published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Article> for ArticleSummaryDto {
    fn from(article: Article) -> Self {
        Self {
            id: article.id,
            category_id: article.category_id,
            title: article.title,
            slug: article.slug,
            excerpt: article.excerpt,
            featured_image_url: article.featured_image_url,
            is_published: article.is_published,
            published_at: article.published_at,
            created_at: article.created_at,
        }
    }
}
