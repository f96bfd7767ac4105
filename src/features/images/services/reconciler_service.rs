use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::images::models::ImageRecord;
use crate::features::images::services::UrlExtractor;
use crate::features::images::store::{ImageRecordStore, UsageTransition};

/// Reconciles an article's image records against its current content.
///
/// Called on every article save. Failures here must never block the save:
/// the caller logs and continues, because usage tracking is best-effort.
pub struct ImageReconciler {
    store: Arc<dyn ImageRecordStore>,
    extractor: UrlExtractor,
    grace_period: Duration,
    // Serializes concurrent saves of the same article (double submits) so the
    // last save's content decides the final usage state.
    article_locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl ImageReconciler {
    pub fn new(
        store: Arc<dyn ImageRecordStore>,
        extractor: UrlExtractor,
        grace_period: Duration,
    ) -> Self {
        Self {
            store,
            extractor,
            grace_period,
            article_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Bring the article's image records in line with its content.
    ///
    /// 1. Extract referenced CDN URLs from content + featured image.
    /// 2. Adopt matching orphan records (uploaded before the article existed).
    /// 3. Flip `is_used` per record; schedule newly unused records for
    ///    deletion after the grace period, rescue re-referenced ones.
    /// 4. Keep `is_featured_image` exclusive to the featured URL.
    ///
    /// Returns the number of records whose usage or featured state changed.
    pub async fn reconcile_article_images(
        &self,
        article_id: Uuid,
        content: &str,
        featured_image_url: Option<&str>,
    ) -> Result<u64> {
        let lock = {
            let mut locks = self.article_locks.lock().await;
            Arc::clone(locks.entry(article_id).or_default())
        };
        let _guard = lock.lock().await;

        let referenced = self.extractor.extract(content, featured_image_url);
        let urls: Vec<String> = referenced.iter().cloned().collect();

        // Adoption must complete before the usage comparison below: it can
        // add records to the set under consideration.
        let adopted = self.store.adopt_orphans(article_id, &urls).await?;
        if adopted > 0 {
            tracing::info!(
                "Adopted {} orphan image(s) for article {}",
                adopted,
                article_id
            );
        }

        let records = self.store.for_article(article_id).await?;
        let transitions = plan_transitions(
            &records,
            &referenced,
            featured_image_url,
            Utc::now(),
            self.grace_period,
        );
        let changed = self.store.apply_transitions(&transitions).await?;

        if changed > 0 {
            tracing::info!(
                "Reconciled images for article {}: {} referenced, {} record(s) updated",
                article_id,
                referenced.len(),
                changed
            );
        }

        Ok(adopted + changed)
    }
}

/// Compute the usage transitions needed to match the referenced URL set.
///
/// Only records whose state actually changes are emitted. A record that
/// stops being referenced keeps an existing deletion deadline rather than
/// getting a fresh one, so repeated saves do not push the deadline out.
fn plan_transitions(
    records: &[ImageRecord],
    referenced: &HashSet<String>,
    featured_image_url: Option<&str>,
    now: DateTime<Utc>,
    grace_period: Duration,
) -> Vec<UsageTransition> {
    let mut transitions = Vec::new();

    for record in records {
        let is_used = referenced.contains(&record.remote_url);
        let scheduled_for_deletion_at = if is_used {
            None
        } else {
            record
                .scheduled_for_deletion_at
                .or(Some(now + grace_period))
        };
        let is_featured_image = featured_image_url == Some(record.remote_url.as_str());

        if is_used != record.is_used
            || scheduled_for_deletion_at != record.scheduled_for_deletion_at
            || is_featured_image != record.is_featured_image
        {
            transitions.push(UsageTransition {
                id: record.id,
                is_used,
                is_featured_image,
                scheduled_for_deletion_at,
            });
        }
    }

    transitions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::images::store::memory::InMemoryImageStore;

    const CDN_BASE: &str = "https://cdn.example";

    fn record(url: &str, article_id: Option<Uuid>, is_used: bool) -> ImageRecord {
        let now = Utc::now();
        ImageRecord {
            id: Uuid::new_v4(),
            article_id,
            remote_file_id: url.trim_start_matches("https://").to_string(),
            remote_url: url.to_string(),
            file_name: Some("image.png".to_string()),
            file_size: Some(1024),
            mime_type: Some("image/png".to_string()),
            is_used,
            is_featured_image: false,
            created_at: now,
            scheduled_for_deletion_at: if is_used {
                None
            } else {
                Some(now + Duration::days(7))
            },
            deleted_at: None,
        }
    }

    fn reconciler(store: Arc<InMemoryImageStore>) -> ImageReconciler {
        ImageReconciler::new(
            store,
            UrlExtractor::new(&[CDN_BASE.to_string()]).unwrap(),
            Duration::days(7),
        )
    }

    #[tokio::test]
    async fn adopts_orphan_and_marks_used() {
        let store = Arc::new(InMemoryImageStore::new());
        store.insert_record(record("https://cdn.example/x.png", None, false));
        let reconciler = reconciler(Arc::clone(&store));
        let article_id = Uuid::new_v4();

        let changed = reconciler
            .reconcile_article_images(
                article_id,
                "<img src='https://cdn.example/x.png'>",
                None,
            )
            .await
            .unwrap();

        assert_eq!(changed, 1);
        let rec = store.find_by_url("https://cdn.example/x.png").unwrap();
        assert_eq!(rec.article_id, Some(article_id));
        assert!(rec.is_used);
        assert!(rec.scheduled_for_deletion_at.is_none());
    }

    #[tokio::test]
    async fn adoption_is_idempotent() {
        let store = Arc::new(InMemoryImageStore::new());
        store.insert_record(record("https://cdn.example/x.png", None, false));
        let reconciler = reconciler(Arc::clone(&store));
        let article_id = Uuid::new_v4();
        let content = "<img src='https://cdn.example/x.png'>";

        let first = reconciler
            .reconcile_article_images(article_id, content, None)
            .await
            .unwrap();
        let second = reconciler
            .reconcile_article_images(article_id, content, None)
            .await
            .unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 0);
    }

    #[tokio::test]
    async fn does_not_poach_images_owned_by_another_article() {
        let store = Arc::new(InMemoryImageStore::new());
        let owner = Uuid::new_v4();
        store.insert_record(record("https://cdn.example/shared.png", Some(owner), true));
        let reconciler = reconciler(Arc::clone(&store));

        reconciler
            .reconcile_article_images(
                Uuid::new_v4(),
                "<img src='https://cdn.example/shared.png'>",
                None,
            )
            .await
            .unwrap();

        let rec = store.find_by_url("https://cdn.example/shared.png").unwrap();
        assert_eq!(rec.article_id, Some(owner));
    }

    #[tokio::test]
    async fn unreferencing_schedules_deletion_about_a_week_out() {
        let store = Arc::new(InMemoryImageStore::new());
        let article_id = Uuid::new_v4();
        store.insert_record(record("https://cdn.example/x.png", Some(article_id), true));
        let reconciler = reconciler(Arc::clone(&store));

        // Content edited so the image is no longer referenced
        let changed = reconciler
            .reconcile_article_images(article_id, "<p>no images anymore</p>", None)
            .await
            .unwrap();

        assert_eq!(changed, 1);
        let rec = store.find_by_url("https://cdn.example/x.png").unwrap();
        assert!(!rec.is_used);
        let deadline = rec.scheduled_for_deletion_at.expect("deadline must be set");
        let days_out = (deadline - Utc::now()).num_days();
        assert!((6..=7).contains(&days_out), "deadline {} days out", days_out);
    }

    #[tokio::test]
    async fn re_reference_cancels_scheduled_deletion() {
        let store = Arc::new(InMemoryImageStore::new());
        let article_id = Uuid::new_v4();
        store.insert_record(record("https://cdn.example/x.png", Some(article_id), true));
        let reconciler = reconciler(Arc::clone(&store));

        reconciler
            .reconcile_article_images(article_id, "", None)
            .await
            .unwrap();
        assert!(store
            .find_by_url("https://cdn.example/x.png")
            .unwrap()
            .scheduled_for_deletion_at
            .is_some());

        reconciler
            .reconcile_article_images(
                article_id,
                "<img src=\"https://cdn.example/x.png\">",
                None,
            )
            .await
            .unwrap();

        let rec = store.find_by_url("https://cdn.example/x.png").unwrap();
        assert!(rec.is_used);
        assert!(rec.scheduled_for_deletion_at.is_none());
    }

    #[tokio::test]
    async fn repeated_saves_keep_the_original_deadline() {
        let store = Arc::new(InMemoryImageStore::new());
        let article_id = Uuid::new_v4();
        store.insert_record(record("https://cdn.example/x.png", Some(article_id), true));
        let reconciler = reconciler(Arc::clone(&store));

        reconciler
            .reconcile_article_images(article_id, "", None)
            .await
            .unwrap();
        let first_deadline = store
            .find_by_url("https://cdn.example/x.png")
            .unwrap()
            .scheduled_for_deletion_at;

        reconciler
            .reconcile_article_images(article_id, "", None)
            .await
            .unwrap();
        let second_deadline = store
            .find_by_url("https://cdn.example/x.png")
            .unwrap()
            .scheduled_for_deletion_at;

        assert_eq!(first_deadline, second_deadline);
    }

    #[tokio::test]
    async fn featured_image_flag_is_exclusive() {
        let store = Arc::new(InMemoryImageStore::new());
        let article_id = Uuid::new_v4();
        store.insert_record(record("https://cdn.example/a.png", Some(article_id), true));
        store.insert_record(record("https://cdn.example/b.png", Some(article_id), true));
        let reconciler = reconciler(Arc::clone(&store));
        let content =
            "<img src='https://cdn.example/a.png'><img src='https://cdn.example/b.png'>";

        reconciler
            .reconcile_article_images(article_id, content, Some("https://cdn.example/a.png"))
            .await
            .unwrap();
        assert!(store
            .find_by_url("https://cdn.example/a.png")
            .unwrap()
            .is_featured_image);

        // Switching the featured image must unset the previous one
        reconciler
            .reconcile_article_images(article_id, content, Some("https://cdn.example/b.png"))
            .await
            .unwrap();

        assert!(!store
            .find_by_url("https://cdn.example/a.png")
            .unwrap()
            .is_featured_image);
        assert!(store
            .find_by_url("https://cdn.example/b.png")
            .unwrap()
            .is_featured_image);
    }

    // Clearing the content schedules every image of the article for
    // deletion. That is the intended behavior, but it means an accidental
    // content wipe starts the deletion clock on all of them at once.
    #[tokio::test]
    async fn empty_content_schedules_every_image() {
        let store = Arc::new(InMemoryImageStore::new());
        let article_id = Uuid::new_v4();
        store.insert_record(record("https://cdn.example/a.png", Some(article_id), true));
        store.insert_record(record("https://cdn.example/b.png", Some(article_id), true));
        let reconciler = reconciler(Arc::clone(&store));

        let changed = reconciler
            .reconcile_article_images(article_id, "", None)
            .await
            .unwrap();

        assert_eq!(changed, 2);
        for rec in store.snapshot() {
            assert!(!rec.is_used);
            assert!(rec.scheduled_for_deletion_at.is_some());
        }
    }
}
