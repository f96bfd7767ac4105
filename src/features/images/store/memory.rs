//! In-memory image record store used by the lifecycle tests

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::images::models::{ImageRecord, ImageStats, NewImageRecord};
use crate::features::images::store::{ImageFilter, ImageRecordStore, UsageTransition};

#[derive(Default)]
pub struct InMemoryImageStore {
    records: Mutex<Vec<ImageRecord>>,
}

impl InMemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record directly, bypassing the upload path.
    pub fn insert_record(&self, record: ImageRecord) {
        self.records.lock().unwrap().push(record);
    }

    pub fn snapshot(&self) -> Vec<ImageRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn find_by_url(&self, url: &str) -> Option<ImageRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.remote_url == url && r.deleted_at.is_none())
            .cloned()
    }
}

fn matches(filter: ImageFilter, r: &ImageRecord) -> bool {
    if r.deleted_at.is_some() {
        return false;
    }
    match filter {
        ImageFilter::All => true,
        ImageFilter::Used => r.is_used,
        ImageFilter::Unused => !r.is_used,
        ImageFilter::PendingDeletion => r.scheduled_for_deletion_at.is_some(),
    }
}

#[async_trait]
impl ImageRecordStore for InMemoryImageStore {
    async fn upsert(&self, new: NewImageRecord) -> Result<ImageRecord> {
        let mut records = self.records.lock().unwrap();

        if let Some(existing) = records
            .iter_mut()
            .find(|r| r.remote_url == new.remote_url && r.deleted_at.is_none())
        {
            if existing.article_id.is_none() {
                existing.article_id = new.article_id;
            }
            existing.remote_file_id = new.remote_file_id;
            existing.file_name = new.file_name;
            existing.file_size = new.file_size;
            existing.mime_type = new.mime_type;
            return Ok(existing.clone());
        }

        let record = ImageRecord {
            id: Uuid::new_v4(),
            article_id: new.article_id,
            remote_file_id: new.remote_file_id,
            remote_url: new.remote_url,
            file_name: new.file_name,
            file_size: new.file_size,
            mime_type: new.mime_type,
            is_used: false,
            is_featured_image: false,
            created_at: Utc::now(),
            scheduled_for_deletion_at: Some(new.scheduled_for_deletion_at),
            deleted_at: None,
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ImageRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn get_many(&self, ids: &[Uuid]) -> Result<Vec<ImageRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| ids.contains(&r.id))
            .cloned()
            .collect())
    }

    async fn for_article(&self, article_id: Uuid) -> Result<Vec<ImageRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.article_id == Some(article_id) && r.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn adopt_orphans(&self, article_id: Uuid, urls: &[String]) -> Result<u64> {
        let mut records = self.records.lock().unwrap();
        let mut adopted = 0;
        for r in records.iter_mut() {
            if r.article_id.is_none() && r.deleted_at.is_none() && urls.contains(&r.remote_url) {
                r.article_id = Some(article_id);
                r.is_used = true;
                r.scheduled_for_deletion_at = None;
                adopted += 1;
            }
        }
        Ok(adopted)
    }

    async fn apply_transitions(&self, transitions: &[UsageTransition]) -> Result<u64> {
        let mut records = self.records.lock().unwrap();
        let mut changed = 0;
        for t in transitions {
            if let Some(r) = records
                .iter_mut()
                .find(|r| r.id == t.id && r.deleted_at.is_none())
            {
                r.is_used = t.is_used;
                r.is_featured_image = t.is_featured_image;
                r.scheduled_for_deletion_at = t.scheduled_for_deletion_at;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn due_for_deletion(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ImageRecord>> {
        let mut due: Vec<ImageRecord> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| {
                r.deleted_at.is_none()
                    && r.scheduled_for_deletion_at
                        .map(|at| at <= now)
                        .unwrap_or(false)
            })
            .cloned()
            .collect();
        due.sort_by_key(|r| r.scheduled_for_deletion_at);
        due.truncate(limit as usize);
        Ok(due)
    }

    async fn mark_deleted(&self, id: Uuid, now: DateTime<Utc>) -> Result<bool> {
        let mut records = self.records.lock().unwrap();
        if let Some(r) = records
            .iter_mut()
            .find(|r| r.id == id && r.deleted_at.is_none())
        {
            r.deleted_at = Some(now);
            r.is_used = false;
            r.scheduled_for_deletion_at = None;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn list(
        &self,
        filter: ImageFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<ImageRecord>, i64)> {
        let records = self.records.lock().unwrap();
        let mut filtered: Vec<ImageRecord> = records
            .iter()
            .filter(|r| matches(filter, r))
            .cloned()
            .collect();
        filtered.sort_by_key(|r| std::cmp::Reverse(r.created_at));
        let total = filtered.len() as i64;
        let page: Vec<ImageRecord> = filtered
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn stats(&self) -> Result<ImageStats> {
        let records = self.records.lock().unwrap();
        let live: Vec<&ImageRecord> = records.iter().filter(|r| r.deleted_at.is_none()).collect();
        Ok(ImageStats {
            total_images: live.len() as i64,
            used_images: live.iter().filter(|r| r.is_used).count() as i64,
            unused_images: live.iter().filter(|r| !r.is_used).count() as i64,
            pending_deletion: live
                .iter()
                .filter(|r| r.scheduled_for_deletion_at.is_some())
                .count() as i64,
            total_size: live.iter().filter_map(|r| r.file_size).sum(),
        })
    }
}
