//! Image record store
//!
//! The single shared mutable resource of the image lifecycle subsystem. All
//! mutation of image records goes through this trait; the reconciler, the
//! orphan adoption step, and the cleanup sweep never touch the table from
//! anywhere else.

mod postgres;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::images::models::{ImageRecord, ImageStats, NewImageRecord};

pub use postgres::PgImageRecordStore;

/// Filter for the admin image listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ImageFilter {
    #[default]
    All,
    Used,
    Unused,
    PendingDeletion,
}

/// One planned change to a record's usage state, produced by the reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageTransition {
    pub id: Uuid,
    pub is_used: bool,
    pub is_featured_image: bool,
    pub scheduled_for_deletion_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait ImageRecordStore: Send + Sync {
    /// Insert a freshly uploaded image. An upload whose `remote_url` is
    /// already tracked is not an error: the existing record is refreshed and
    /// returned (its `article_id`, once set, is never overwritten).
    async fn upsert(&self, new: NewImageRecord) -> Result<ImageRecord>;

    async fn get(&self, id: Uuid) -> Result<Option<ImageRecord>>;

    /// Fetch the given records, skipping ids that do not exist.
    async fn get_many(&self, ids: &[Uuid]) -> Result<Vec<ImageRecord>>;

    /// All non-deleted records owned by the article.
    async fn for_article(&self, article_id: Uuid) -> Result<Vec<ImageRecord>>;

    /// Assign unowned records matching `urls` to the article, marking them
    /// used and clearing any deletion schedule. Records owned by a different
    /// article are left untouched. Returns the number of records adopted.
    async fn adopt_orphans(&self, article_id: Uuid, urls: &[String]) -> Result<u64>;

    /// Apply the reconciler's planned transitions. Returns the number of
    /// records actually changed.
    async fn apply_transitions(&self, transitions: &[UsageTransition]) -> Result<u64>;

    /// Records whose grace period has expired and that have not been deleted.
    async fn due_for_deletion(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ImageRecord>>;

    /// Soft-delete a record after its CDN object was removed. Returns false
    /// if the record was already deleted (or does not exist), so a concurrent
    /// sweep can never retire the same record twice.
    async fn mark_deleted(&self, id: Uuid, now: DateTime<Utc>) -> Result<bool>;

    /// Paginated listing for the admin dashboard. Returns (records, total).
    async fn list(
        &self,
        filter: ImageFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<ImageRecord>, i64)>;

    /// Aggregate counters for the admin dashboard.
    async fn stats(&self) -> Result<ImageStats>;
}
