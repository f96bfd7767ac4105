use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::images::models::{ImageRecord, ImageStats};
use crate::features::images::store::ImageFilter;
use crate::shared::constants::DEFAULT_PAGE_SIZE;

/// Upload image request DTO for OpenAPI documentation
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler uses axum's Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadImageDto {
    /// The image to upload
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
    /// Optional id of the article this image belongs to. Omit when uploading
    /// ahead of article creation; the image is adopted on first save.
    pub article_id: Option<Uuid>,
}

/// Response DTO for a tracked image
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ImageResponseDto {
    pub id: Uuid,
    /// Owning article; null for orphaned uploads
    pub article_id: Option<Uuid>,
    pub remote_url: String,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
    /// Whether the owning article's current content references this image
    pub is_used: bool,
    pub is_featured_image: bool,
    pub created_at: DateTime<Utc>,
    /// When set, the cleanup sweep may delete this image once the timestamp passes
    pub scheduled_for_deletion_at: Option<DateTime<Utc>>,
}

impl From<ImageRecord> for ImageResponseDto {
    fn from(record: ImageRecord) -> Self {
        Self {
            id: record.id,
            article_id: record.article_id,
            remote_url: record.remote_url,
            file_name: record.file_name,
            file_size: record.file_size,
            mime_type: record.mime_type,
            is_used: record.is_used,
            is_featured_image: record.is_featured_image,
            created_at: record.created_at,
            scheduled_for_deletion_at: record.scheduled_for_deletion_at,
        }
    }
}

/// Aggregate counters for the image-management dashboard
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ImageStatsDto {
    pub total_images: i64,
    pub used_images: i64,
    pub unused_images: i64,
    pub pending_deletion: i64,
    /// Combined size in bytes of all tracked images
    pub total_size: i64,
}

impl From<ImageStats> for ImageStatsDto {
    fn from(stats: ImageStats) -> Self {
        Self {
            total_images: stats.total_images,
            used_images: stats.used_images,
            unused_images: stats.unused_images,
            pending_deletion: stats.pending_deletion,
            total_size: stats.total_size,
        }
    }
}

/// Query params for the admin image listing
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListImagesQuery {
    /// Usage filter (default: all)
    #[serde(default)]
    pub filter: ImageFilter,
    /// Page number (1-indexed, default: 1)
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page (default: 10, max: 100)
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

/// Request DTO for operator-initiated bulk deletion
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BulkDeleteImagesDto {
    /// Ids of the images to delete immediately, bypassing usage checks
    #[validate(length(min = 1, message = "ids must not be empty"))]
    pub ids: Vec<Uuid>,
}

/// One failed deletion inside a cleanup batch
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CleanupErrorDto {
    pub image_id: Uuid,
    pub remote_url: String,
    pub error: String,
}

/// Outcome of a cleanup sweep or force delete
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct CleanupReportDto {
    pub deleted_count: u64,
    pub deleted_urls: Vec<String>,
    /// Failed records; they stay scheduled and are retried on the next sweep
    pub errors: Vec<CleanupErrorDto>,
}

/// Outcome of a full-corpus usage audit
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuditReportDto {
    pub articles_scanned: u64,
    pub records_updated: u64,
}

/// Allowed MIME types for image uploads
pub const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Maximum image size in bytes (10MB)
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Check if a MIME type is allowed
pub fn is_mime_type_allowed(content_type: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&content_type)
}
