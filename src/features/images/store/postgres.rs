use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::images::models::{ImageRecord, ImageStats, NewImageRecord};
use crate::features::images::store::{ImageFilter, ImageRecordStore, UsageTransition};

/// Postgres-backed image record store
pub struct PgImageRecordStore {
    pool: PgPool,
}

impl PgImageRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn filter_condition(filter: ImageFilter) -> &'static str {
        match filter {
            ImageFilter::All => "deleted_at IS NULL",
            ImageFilter::Used => "is_used = TRUE AND deleted_at IS NULL",
            ImageFilter::Unused => "is_used = FALSE AND deleted_at IS NULL",
            ImageFilter::PendingDeletion => {
                "scheduled_for_deletion_at IS NOT NULL AND deleted_at IS NULL"
            }
        }
    }
}

#[async_trait]
impl ImageRecordStore for PgImageRecordStore {
    async fn upsert(&self, new: NewImageRecord) -> Result<ImageRecord> {
        // Re-uploading an already tracked URL refreshes the metadata but
        // never re-parents the record: the first owning article is permanent.
        let record = sqlx::query_as::<_, ImageRecord>(
            r#"
            INSERT INTO image_records
                (article_id, remote_file_id, remote_url, file_name, file_size, mime_type,
                 is_used, is_featured_image, scheduled_for_deletion_at)
            VALUES ($1, $2, $3, $4, $5, $6, FALSE, FALSE, $7)
            ON CONFLICT (remote_url) WHERE deleted_at IS NULL
            DO UPDATE SET
                article_id = COALESCE(image_records.article_id, EXCLUDED.article_id),
                remote_file_id = EXCLUDED.remote_file_id,
                file_name = EXCLUDED.file_name,
                file_size = EXCLUDED.file_size,
                mime_type = EXCLUDED.mime_type
            RETURNING *
            "#,
        )
        .bind(new.article_id)
        .bind(&new.remote_file_id)
        .bind(&new.remote_url)
        .bind(&new.file_name)
        .bind(new.file_size)
        .bind(&new.mime_type)
        .bind(new.scheduled_for_deletion_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to upsert image record: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ImageRecord>> {
        sqlx::query_as::<_, ImageRecord>(r#"SELECT * FROM image_records WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get image record: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn get_many(&self, ids: &[Uuid]) -> Result<Vec<ImageRecord>> {
        sqlx::query_as::<_, ImageRecord>(r#"SELECT * FROM image_records WHERE id = ANY($1)"#)
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get image records: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn for_article(&self, article_id: Uuid) -> Result<Vec<ImageRecord>> {
        sqlx::query_as::<_, ImageRecord>(
            r#"
            SELECT * FROM image_records
            WHERE article_id = $1 AND deleted_at IS NULL
            ORDER BY created_at
            "#,
        )
        .bind(article_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list article images: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn adopt_orphans(&self, article_id: Uuid, urls: &[String]) -> Result<u64> {
        if urls.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            UPDATE image_records
            SET article_id = $1, is_used = TRUE, scheduled_for_deletion_at = NULL
            WHERE remote_url = ANY($2)
              AND article_id IS NULL
              AND deleted_at IS NULL
            "#,
        )
        .bind(article_id)
        .bind(urls)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to adopt orphan images: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(result.rows_affected())
    }

    async fn apply_transitions(&self, transitions: &[UsageTransition]) -> Result<u64> {
        if transitions.is_empty() {
            return Ok(0);
        }

        // One transaction per reconciliation so a concurrent save of the same
        // article never observes a half-applied usage state.
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let mut changed = 0u64;
        for t in transitions {
            let result = sqlx::query(
                r#"
                UPDATE image_records
                SET is_used = $2, is_featured_image = $3, scheduled_for_deletion_at = $4
                WHERE id = $1 AND deleted_at IS NULL
                "#,
            )
            .bind(t.id)
            .bind(t.is_used)
            .bind(t.is_featured_image)
            .bind(t.scheduled_for_deletion_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to apply usage transition: {:?}", e);
                AppError::Database(e)
            })?;

            changed += result.rows_affected();
        }

        tx.commit().await.map_err(AppError::Database)?;

        Ok(changed)
    }

    async fn due_for_deletion(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ImageRecord>> {
        sqlx::query_as::<_, ImageRecord>(
            r#"
            SELECT * FROM image_records
            WHERE scheduled_for_deletion_at <= $1 AND deleted_at IS NULL
            ORDER BY scheduled_for_deletion_at
            LIMIT $2
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch records due for deletion: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn mark_deleted(&self, id: Uuid, now: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE image_records
            SET deleted_at = $2, is_used = FALSE, scheduled_for_deletion_at = NULL
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to mark image record deleted: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(
        &self,
        filter: ImageFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<ImageRecord>, i64)> {
        let condition = Self::filter_condition(filter);

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM image_records WHERE {}",
            condition
        ))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count image records: {:?}", e);
            AppError::Database(e)
        })?;

        let records = sqlx::query_as::<_, ImageRecord>(&format!(
            "SELECT * FROM image_records WHERE {} ORDER BY created_at DESC OFFSET $1 LIMIT $2",
            condition
        ))
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list image records: {:?}", e);
            AppError::Database(e)
        })?;

        Ok((records, total))
    }

    async fn stats(&self) -> Result<ImageStats> {
        sqlx::query_as::<_, ImageStats>(
            r#"
            SELECT
                COUNT(*) AS total_images,
                COUNT(*) FILTER (WHERE is_used) AS used_images,
                COUNT(*) FILTER (WHERE NOT is_used) AS unused_images,
                COUNT(*) FILTER (WHERE scheduled_for_deletion_at IS NOT NULL) AS pending_deletion,
                COALESCE(SUM(file_size), 0)::BIGINT AS total_size
            FROM image_records
            WHERE deleted_at IS NULL
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to compute image stats: {:?}", e);
            AppError::Database(e)
        })
    }
}
