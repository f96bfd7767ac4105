use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::tags::dtos::{CreateTagDto, TagResponseDto};
use crate::features::tags::models::Tag;
use crate::shared::validation::slugify;

/// Service for tag operations
pub struct TagService {
    pool: PgPool,
}

impl TagService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List all tags alphabetically
    pub async fn list(&self) -> Result<Vec<TagResponseDto>> {
        let tags = sqlx::query_as::<_, Tag>(r#"SELECT * FROM tags ORDER BY name"#)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list tags: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(tags.into_iter().map(|t| t.into()).collect())
    }

    /// Create a tag; re-creating an existing name is not an error
    pub async fn create(&self, dto: CreateTagDto) -> Result<TagResponseDto> {
        let name = dto.name.trim().to_string();
        let slug = slugify(&name);
        if slug.is_empty() {
            return Err(AppError::Validation(
                "Tag name must contain at least one alphanumeric character".to_string(),
            ));
        }

        let tag = sqlx::query_as::<_, Tag>(
            r#"
            INSERT INTO tags (name, slug)
            VALUES ($1, $2)
            ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
            RETURNING *
            "#,
        )
        .bind(&name)
        .bind(&slug)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create tag: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(tag.into())
    }

    /// Delete a tag; its article associations go with it
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query(r#"DELETE FROM tags WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete tag: {:?}", e);
                AppError::Database(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Tag '{}' not found", id)));
        }

        Ok(())
    }
}
