use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for a tracked image
///
/// One row per uploaded image. `article_id` is null until the image is
/// adopted by the article that first references it; `deleted_at` marks the
/// record as retired after the cleanup sweep removed the object from the CDN.
#[derive(Debug, Clone, FromRow)]
pub struct ImageRecord {
    pub id: Uuid,
    pub article_id: Option<Uuid>,
    pub remote_file_id: String,
    pub remote_url: String,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
    pub is_used: bool,
    pub is_featured_image: bool,
    pub created_at: DateTime<Utc>,
    pub scheduled_for_deletion_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Fields for inserting a freshly uploaded image
#[derive(Debug, Clone)]
pub struct NewImageRecord {
    pub article_id: Option<Uuid>,
    pub remote_file_id: String,
    pub remote_url: String,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
    /// A new upload is unused until a reconciliation sees it referenced,
    /// so it starts life with a deletion deadline already set.
    pub scheduled_for_deletion_at: DateTime<Utc>,
}

/// Aggregate counters for the image-management dashboard
#[derive(Debug, Clone, FromRow)]
pub struct ImageStats {
    pub total_images: i64,
    pub used_images: i64,
    pub unused_images: i64,
    pub pending_deletion: i64,
    pub total_size: i64,
}
