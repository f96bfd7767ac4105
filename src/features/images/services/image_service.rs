use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::info;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::images::dtos::{ImageResponseDto, ImageStatsDto};
use crate::features::images::models::NewImageRecord;
use crate::features::images::store::{ImageFilter, ImageRecordStore};
use crate::modules::storage::CdnGateway;

/// Service for image uploads and the admin image dashboard queries
pub struct ImageService {
    store: Arc<dyn ImageRecordStore>,
    cdn: Arc<dyn CdnGateway>,
    upload_folder: String,
    grace_period: Duration,
}

impl ImageService {
    pub fn new(
        store: Arc<dyn ImageRecordStore>,
        cdn: Arc<dyn CdnGateway>,
        upload_folder: String,
        grace_period: Duration,
    ) -> Self {
        Self {
            store,
            cdn,
            upload_folder,
            grace_period,
        }
    }

    /// Upload image bytes to the CDN and track them in the record store.
    ///
    /// CDN failures propagate to the uploading editor, who retries. A new
    /// record starts unused, carrying a deletion deadline that the first
    /// reconciliation referencing it will clear.
    pub async fn upload_image(
        &self,
        data: Vec<u8>,
        file_name: &str,
        content_type: &str,
        article_id: Option<Uuid>,
    ) -> Result<ImageResponseDto> {
        let file_size = data.len() as i64;

        let uploaded = self
            .cdn
            .upload(data, file_name, content_type, &self.upload_folder)
            .await?;

        let record = self
            .store
            .upsert(NewImageRecord {
                article_id,
                remote_file_id: uploaded.remote_file_id,
                remote_url: uploaded.remote_url,
                file_name: Some(file_name.to_string()),
                file_size: Some(file_size),
                mime_type: Some(content_type.to_string()),
                scheduled_for_deletion_at: Utc::now() + self.grace_period,
            })
            .await?;

        info!(
            "Image uploaded: id={}, url={}, size={}",
            record.id, record.remote_url, file_size
        );

        Ok(record.into())
    }

    /// Paginated image listing for the admin dashboard.
    pub async fn list(
        &self,
        filter: ImageFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<ImageResponseDto>, i64)> {
        let (records, total) = self.store.list(filter, offset, limit).await?;
        Ok((records.into_iter().map(Into::into).collect(), total))
    }

    /// Aggregate counters for the admin dashboard.
    pub async fn stats(&self) -> Result<ImageStatsDto> {
        let stats = self.store.stats().await?;
        Ok(stats.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::images::store::memory::InMemoryImageStore;
    use crate::shared::test_helpers::FakeCdn;

    fn service(store: Arc<InMemoryImageStore>) -> ImageService {
        ImageService::new(
            store,
            Arc::new(FakeCdn::new()),
            "articles".to_string(),
            Duration::days(7),
        )
    }

    #[tokio::test]
    async fn upload_creates_unused_record_with_deadline() {
        let store = Arc::new(InMemoryImageStore::new());
        let service = service(Arc::clone(&store));

        let dto = service
            .upload_image(vec![0u8; 16], "photo.png", "image/png", None)
            .await
            .unwrap();

        assert!(!dto.is_used);
        assert!(dto.scheduled_for_deletion_at.is_some());
        let rec = store.find_by_url(&dto.remote_url).unwrap();
        assert!(rec.article_id.is_none());
        assert_eq!(rec.file_size, Some(16));
    }

    #[tokio::test]
    async fn re_uploading_same_url_is_not_an_error() {
        let store = Arc::new(InMemoryImageStore::new());
        let service = service(Arc::clone(&store));

        let first = service
            .upload_image(vec![0u8; 8], "photo.png", "image/png", None)
            .await
            .unwrap();
        let second = service
            .upload_image(vec![0u8; 24], "photo.png", "image/png", None)
            .await
            .unwrap();

        // FakeCdn derives the URL from the file name, so both uploads collide
        assert_eq!(first.id, second.id);
        assert_eq!(second.file_size, Some(24));
        assert_eq!(store.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn stats_reflect_usage_split() {
        let store = Arc::new(InMemoryImageStore::new());
        let service = service(Arc::clone(&store));

        service
            .upload_image(vec![0u8; 10], "a.png", "image/png", None)
            .await
            .unwrap();
        service
            .upload_image(vec![0u8; 30], "b.png", "image/png", None)
            .await
            .unwrap();

        let stats = service.stats().await.unwrap();
        assert_eq!(stats.total_images, 2);
        assert_eq!(stats.used_images, 0);
        assert_eq!(stats.unused_images, 2);
        assert_eq!(stats.pending_deletion, 2);
        assert_eq!(stats.total_size, 40);
    }
}
