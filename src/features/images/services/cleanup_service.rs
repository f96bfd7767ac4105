use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::images::dtos::{CleanupErrorDto, CleanupReportDto};
use crate::features::images::models::ImageRecord;
use crate::features::images::store::ImageRecordStore;
use crate::modules::storage::CdnGateway;

/// Deletes images whose grace period has expired, from the CDN and the store.
///
/// Records are processed independently: one failed CDN delete never aborts
/// the batch, it is reported and retried on the next sweep. Deletes run with
/// bounded concurrency so a large backlog does not trip CDN rate limits.
pub struct ImageCleanupService {
    store: Arc<dyn ImageRecordStore>,
    cdn: Arc<dyn CdnGateway>,
    delete_concurrency: usize,
    cdn_timeout: Duration,
    sweep_batch_size: i64,
}

impl ImageCleanupService {
    pub fn new(
        store: Arc<dyn ImageRecordStore>,
        cdn: Arc<dyn CdnGateway>,
        delete_concurrency: usize,
        cdn_timeout: Duration,
        sweep_batch_size: i64,
    ) -> Self {
        Self {
            store,
            cdn,
            delete_concurrency,
            cdn_timeout,
            sweep_batch_size,
        }
    }

    /// Delete every record whose deletion deadline has passed.
    pub async fn run_sweep(&self) -> Result<CleanupReportDto> {
        let due = self
            .store
            .due_for_deletion(Utc::now(), self.sweep_batch_size)
            .await?;

        if due.is_empty() {
            return Ok(CleanupReportDto::default());
        }

        info!("Cleanup sweep: {} record(s) past their deadline", due.len());
        let report = self.delete_batch(due).await;
        info!(
            "Cleanup sweep finished: {} deleted, {} failed",
            report.deleted_count,
            report.errors.len()
        );

        Ok(report)
    }

    /// Operator-initiated deletion that bypasses usage checks. Missing and
    /// already-deleted ids are skipped.
    pub async fn force_delete(&self, ids: &[Uuid]) -> Result<CleanupReportDto> {
        let records: Vec<ImageRecord> = self
            .store
            .get_many(ids)
            .await?
            .into_iter()
            .filter(|r| r.deleted_at.is_none())
            .collect();

        info!(
            "Force delete: {} of {} requested record(s) eligible",
            records.len(),
            ids.len()
        );

        Ok(self.delete_batch(records).await)
    }

    async fn delete_batch(&self, records: Vec<ImageRecord>) -> CleanupReportDto {
        let results = stream::iter(records.into_iter().map(|record| {
            let store = Arc::clone(&self.store);
            let cdn = Arc::clone(&self.cdn);
            let timeout = self.cdn_timeout;
            async move { Self::delete_one(store, cdn, timeout, record).await }
        }))
        .buffer_unordered(self.delete_concurrency)
        .collect::<Vec<_>>()
        .await;

        let mut report = CleanupReportDto::default();
        for result in results {
            match result {
                Ok(Some(url)) => {
                    report.deleted_count += 1;
                    report.deleted_urls.push(url);
                }
                Ok(None) => {} // raced with another sweep, nothing to do
                Err(error) => {
                    warn!(
                        "Cleanup failed for image {} ({}): {}",
                        error.image_id, error.remote_url, error.error
                    );
                    report.errors.push(error);
                }
            }
        }
        report
    }

    /// Delete one record: CDN first, then the store. If the process dies in
    /// between, the record is still scheduled and the next sweep retries;
    /// the reverse order would leave an untracked object on the CDN.
    async fn delete_one(
        store: Arc<dyn ImageRecordStore>,
        cdn: Arc<dyn CdnGateway>,
        timeout: Duration,
        record: ImageRecord,
    ) -> std::result::Result<Option<String>, CleanupErrorDto> {
        let failure = |message: String| CleanupErrorDto {
            image_id: record.id,
            remote_url: record.remote_url.clone(),
            error: message,
        };

        match tokio::time::timeout(timeout, cdn.delete(&record.remote_file_id)).await {
            Err(_) => Err(failure(format!(
                "CDN delete timed out after {:?}",
                timeout
            ))),
            Ok(Err(e)) => Err(failure(e.to_string())),
            Ok(Ok(())) => match store.mark_deleted(record.id, Utc::now()).await {
                Ok(true) => Ok(Some(record.remote_url)),
                Ok(false) => Ok(None),
                Err(e) => Err(failure(format!(
                    "CDN object removed but record not marked: {}",
                    e
                ))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::AppError;
    use crate::features::images::store::memory::InMemoryImageStore;
    use crate::shared::test_helpers::FakeCdn;
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;

    fn scheduled_record(url: &str, days_ago: i64) -> ImageRecord {
        let now = Utc::now();
        ImageRecord {
            id: Uuid::new_v4(),
            article_id: Some(Uuid::new_v4()),
            remote_file_id: format!("articles/{}", url.rsplit('/').next().unwrap()),
            remote_url: url.to_string(),
            file_name: None,
            file_size: Some(2048),
            mime_type: Some("image/png".to_string()),
            is_used: false,
            is_featured_image: false,
            created_at: now - ChronoDuration::days(30),
            scheduled_for_deletion_at: Some(now - ChronoDuration::days(days_ago)),
            deleted_at: None,
        }
    }

    fn service(
        store: Arc<InMemoryImageStore>,
        cdn: Arc<dyn CdnGateway>,
    ) -> ImageCleanupService {
        ImageCleanupService::new(store, cdn, 4, Duration::from_secs(5), 100)
    }

    #[tokio::test]
    async fn sweep_deletes_only_records_past_deadline() {
        let store = Arc::new(InMemoryImageStore::new());
        store.insert_record(scheduled_record("https://cdn.example/a.png", 1));
        store.insert_record(scheduled_record("https://cdn.example/b.png", 2));
        // Still inside its grace period
        store.insert_record(scheduled_record("https://cdn.example/c.png", -3));
        let cdn = Arc::new(FakeCdn::new());

        let report = service(Arc::clone(&store), cdn).run_sweep().await.unwrap();

        assert_eq!(report.deleted_count, 2);
        assert!(report.errors.is_empty());
        assert!(store.find_by_url("https://cdn.example/a.png").is_none());
        assert!(store.find_by_url("https://cdn.example/b.png").is_none());
        assert!(store.find_by_url("https://cdn.example/c.png").is_some());
    }

    #[tokio::test]
    async fn sweep_never_double_deletes() {
        let store = Arc::new(InMemoryImageStore::new());
        store.insert_record(scheduled_record("https://cdn.example/a.png", 1));
        let cdn = Arc::new(FakeCdn::new());
        let service = service(Arc::clone(&store), Arc::clone(&cdn) as Arc<dyn CdnGateway>);

        let first = service.run_sweep().await.unwrap();
        let second = service.run_sweep().await.unwrap();

        assert_eq!(first.deleted_count, 1);
        assert_eq!(second.deleted_count, 0);
        assert_eq!(cdn.deleted().len(), 1);
    }

    #[tokio::test]
    async fn one_failing_delete_does_not_abort_the_batch() {
        let store = Arc::new(InMemoryImageStore::new());
        store.insert_record(scheduled_record("https://cdn.example/a.png", 1));
        let failing = scheduled_record("https://cdn.example/b.png", 1);
        let failing_id = failing.id;
        let failing_file_id = failing.remote_file_id.clone();
        store.insert_record(failing);
        store.insert_record(scheduled_record("https://cdn.example/c.png", 1));

        let cdn = Arc::new(FakeCdn::new());
        cdn.fail_on(&failing_file_id);

        let report = service(Arc::clone(&store), cdn).run_sweep().await.unwrap();

        assert_eq!(report.deleted_count, 2);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].image_id, failing_id);

        // The failed record is untouched and will be retried next sweep
        let rec = store.find_by_url("https://cdn.example/b.png").unwrap();
        assert!(rec.deleted_at.is_none());
        assert!(rec.scheduled_for_deletion_at.is_some());
    }

    #[tokio::test]
    async fn force_delete_bypasses_usage_checks() {
        let store = Arc::new(InMemoryImageStore::new());
        let mut used = scheduled_record("https://cdn.example/a.png", 1);
        used.is_used = true;
        used.scheduled_for_deletion_at = None;
        let id = used.id;
        store.insert_record(used);
        let cdn = Arc::new(FakeCdn::new());

        let report = service(Arc::clone(&store), cdn)
            .force_delete(&[id, Uuid::new_v4()])
            .await
            .unwrap();

        assert_eq!(report.deleted_count, 1);
        assert!(store.find_by_url("https://cdn.example/a.png").is_none());
    }

    struct HangingCdn;

    #[async_trait]
    impl CdnGateway for HangingCdn {
        async fn upload(
            &self,
            _data: Vec<u8>,
            _file_name: &str,
            _content_type: &str,
            _folder: &str,
        ) -> std::result::Result<crate::modules::storage::CdnUpload, AppError> {
            unreachable!("upload is not exercised here")
        }

        async fn delete(&self, _remote_file_id: &str) -> std::result::Result<(), AppError> {
            futures::future::pending().await
        }
    }

    #[tokio::test]
    async fn timed_out_delete_counts_as_failure() {
        let store = Arc::new(InMemoryImageStore::new());
        store.insert_record(scheduled_record("https://cdn.example/a.png", 1));

        let service = ImageCleanupService::new(
            Arc::clone(&store) as Arc<dyn ImageRecordStore>,
            Arc::new(HangingCdn),
            2,
            Duration::from_millis(20),
            100,
        );

        let report = service.run_sweep().await.unwrap();

        assert_eq!(report.deleted_count, 0);
        assert_eq!(report.errors.len(), 1);
        let rec = store.find_by_url("https://cdn.example/a.png").unwrap();
        assert!(rec.deleted_at.is_none());
    }
}
