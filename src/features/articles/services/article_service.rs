use std::sync::Arc;

use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::articles::dtos::{
    ArticleResponseDto, ArticleSummaryDto, CreateArticleDto, UpdateArticleDto,
};
use crate::features::articles::models::Article;
use crate::features::images::services::ImageReconciler;
use crate::shared::validation::{slugify, SLUG_REGEX};

/// Service for article authoring and the public article pages
pub struct ArticleService {
    pool: PgPool,
    reconciler: Arc<ImageReconciler>,
}

impl ArticleService {
    pub fn new(pool: PgPool, reconciler: Arc<ImageReconciler>) -> Self {
        Self { pool, reconciler }
    }

    /// Create an article and reconcile its image references.
    pub async fn create(&self, dto: CreateArticleDto) -> Result<ArticleResponseDto> {
        let slug = match dto.slug {
            Some(slug) => {
                Self::validate_slug(&slug)?;
                slug
            }
            None => {
                let derived = slugify(&dto.title);
                if derived.is_empty() {
                    return Err(AppError::Validation(
                        "Cannot derive a slug from the title, provide one explicitly".to_string(),
                    ));
                }
                derived
            }
        };

        let article = sqlx::query_as::<_, Article>(
            r#"
            INSERT INTO articles (category_id, title, slug, content, excerpt, featured_image_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(dto.category_id)
        .bind(&dto.title)
        .bind(&slug)
        .bind(&dto.content)
        .bind(&dto.excerpt)
        .bind(&dto.featured_image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Self::map_write_error(e, &slug))?;

        info!("Article created: id={}, slug={}", article.id, article.slug);

        if let Some(tags) = &dto.tags {
            self.replace_tags(article.id, tags).await?;
        }

        self.track_images(&article).await;

        let tags = self.tags_for(article.id).await?;
        Ok(ArticleResponseDto::from_article(article, tags))
    }

    /// Update an article; omitted fields keep their current value.
    pub async fn update(&self, id: Uuid, dto: UpdateArticleDto) -> Result<ArticleResponseDto> {
        let existing = self.require_article(id).await?;

        let slug = match dto.slug {
            Some(slug) => {
                Self::validate_slug(&slug)?;
                slug
            }
            None => existing.slug,
        };
        let title = dto.title.unwrap_or(existing.title);
        let content = dto.content.unwrap_or(existing.content);
        let excerpt = dto.excerpt.or(existing.excerpt);
        // Empty string clears the hero image, None keeps it
        let featured_image_url = match dto.featured_image_url {
            Some(url) if url.is_empty() => None,
            Some(url) => Some(url),
            None => existing.featured_image_url,
        };
        let category_id = dto.category_id.or(existing.category_id);

        let article = sqlx::query_as::<_, Article>(
            r#"
            UPDATE articles
            SET category_id = $2, title = $3, slug = $4, content = $5, excerpt = $6,
                featured_image_url = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(category_id)
        .bind(&title)
        .bind(&slug)
        .bind(&content)
        .bind(&excerpt)
        .bind(&featured_image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Self::map_write_error(e, &slug))?;

        if let Some(tags) = &dto.tags {
            self.replace_tags(article.id, tags).await?;
        }

        self.track_images(&article).await;

        let tags = self.tags_for(article.id).await?;
        Ok(ArticleResponseDto::from_article(article, tags))
    }

    /// Delete an article. Its images start their grace period immediately.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let article = self.require_article(id).await?;

        // Reconcile against empty content before the row disappears: the
        // delete sets image_records.article_id to NULL, after which the
        // records would no longer be reachable through this article.
        if let Err(e) = self
            .reconciler
            .reconcile_article_images(article.id, "", None)
            .await
        {
            warn!(
                "Image reconciliation on delete failed for article {}: {}",
                article.id, e
            );
        }

        sqlx::query(r#"DELETE FROM articles WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete article: {:?}", e);
                AppError::Database(e)
            })?;

        info!("Article deleted: id={}, slug={}", article.id, article.slug);
        Ok(())
    }

    /// Publish or unpublish an article.
    pub async fn set_published(&self, id: Uuid, publish: bool) -> Result<ArticleResponseDto> {
        let article = sqlx::query_as::<_, Article>(
            r#"
            UPDATE articles
            SET is_published = $2,
                published_at = CASE
                    WHEN $2 AND published_at IS NULL THEN NOW()
                    ELSE published_at
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(publish)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to set article publish state: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound(format!("Article '{}' not found", id)))?;

        let tags = self.tags_for(article.id).await?;
        Ok(ArticleResponseDto::from_article(article, tags))
    }

    /// Get an article by id (admin, any publish state).
    pub async fn get_by_id(&self, id: Uuid) -> Result<ArticleResponseDto> {
        let article = self.require_article(id).await?;
        let tags = self.tags_for(article.id).await?;
        Ok(ArticleResponseDto::from_article(article, tags))
    }

    /// Get a published article by slug (public site).
    pub async fn get_by_slug(&self, slug: &str) -> Result<ArticleResponseDto> {
        let article = sqlx::query_as::<_, Article>(
            r#"SELECT * FROM articles WHERE slug = $1 AND is_published = TRUE"#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get article by slug: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound(format!("Article '{}' not found", slug)))?;

        let tags = self.tags_for(article.id).await?;
        Ok(ArticleResponseDto::from_article(article, tags))
    }

    /// Paginated list of published articles, newest first (public site).
    pub async fn list_published(
        &self,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<ArticleSummaryDto>, i64)> {
        let total: i64 =
            sqlx::query_scalar(r#"SELECT COUNT(*) FROM articles WHERE is_published = TRUE"#)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to count published articles: {:?}", e);
                    AppError::Database(e)
                })?;

        let articles = sqlx::query_as::<_, Article>(
            r#"
            SELECT * FROM articles
            WHERE is_published = TRUE
            ORDER BY published_at DESC
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list published articles: {:?}", e);
            AppError::Database(e)
        })?;

        Ok((articles.into_iter().map(Into::into).collect(), total))
    }

    /// Paginated list of all articles, newest first (admin).
    pub async fn list_all(
        &self,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<ArticleSummaryDto>, i64)> {
        let total: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM articles"#)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count articles: {:?}", e);
                AppError::Database(e)
            })?;

        let articles = sqlx::query_as::<_, Article>(
            r#"SELECT * FROM articles ORDER BY created_at DESC OFFSET $1 LIMIT $2"#,
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list articles: {:?}", e);
            AppError::Database(e)
        })?;

        Ok((articles.into_iter().map(Into::into).collect(), total))
    }

    /// Re-scan the whole corpus and reconcile every article's images.
    ///
    /// Drift-correction audit; per-article failures are logged and skipped so
    /// one bad article does not abort the run. Returns (scanned, updated).
    pub async fn reconcile_all_images(&self) -> Result<(u64, u64)> {
        let articles = sqlx::query_as::<_, Article>(r#"SELECT * FROM articles ORDER BY created_at"#)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to load articles for audit: {:?}", e);
                AppError::Database(e)
            })?;

        let mut scanned = 0u64;
        let mut updated = 0u64;

        for article in articles {
            scanned += 1;
            match self
                .reconciler
                .reconcile_article_images(
                    article.id,
                    &article.content,
                    article.featured_image_url.as_deref(),
                )
                .await
            {
                Ok(changed) => updated += changed,
                Err(e) => {
                    warn!("Audit failed for article {}: {}", article.id, e);
                }
            }
        }

        info!(
            "Image audit finished: {} article(s) scanned, {} record(s) updated",
            scanned, updated
        );

        Ok((scanned, updated))
    }

    /// Reconcile this article's images, logging instead of failing.
    ///
    /// Usage tracking is best-effort: a storage hiccup here must never fail
    /// the save the editor is waiting on.
    async fn track_images(&self, article: &Article) {
        if let Err(e) = self
            .reconciler
            .reconcile_article_images(
                article.id,
                &article.content,
                article.featured_image_url.as_deref(),
            )
            .await
        {
            warn!(
                "Image reconciliation failed for article {}: {}",
                article.id, e
            );
        }
    }

    async fn require_article(&self, id: Uuid) -> Result<Article> {
        sqlx::query_as::<_, Article>(r#"SELECT * FROM articles WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get article: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound(format!("Article '{}' not found", id)))
    }

    /// Replace the article's tags with the given names, creating missing tags.
    async fn replace_tags(&self, article_id: Uuid, tags: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        sqlx::query(r#"DELETE FROM article_tags WHERE article_id = $1"#)
            .bind(article_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        for name in tags {
            let slug = slugify(name);
            if slug.is_empty() {
                continue;
            }

            let tag_id: Uuid = sqlx::query_scalar(
                r#"
                INSERT INTO tags (name, slug)
                VALUES ($1, $2)
                ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
                RETURNING id
                "#,
            )
            .bind(name.trim())
            .bind(&slug)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;

            sqlx::query(
                r#"
                INSERT INTO article_tags (article_id, tag_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(article_id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn tags_for(&self, article_id: Uuid) -> Result<Vec<String>> {
        sqlx::query_scalar(
            r#"
            SELECT t.name FROM tags t
            JOIN article_tags at ON at.tag_id = t.id
            WHERE at.article_id = $1
            ORDER BY t.name
            "#,
        )
        .bind(article_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load article tags: {:?}", e);
            AppError::Database(e)
        })
    }

    fn validate_slug(slug: &str) -> Result<()> {
        if !SLUG_REGEX.is_match(slug) {
            return Err(AppError::Validation(format!(
                "Invalid slug '{}': use lowercase letters, digits and hyphens",
                slug
            )));
        }
        Ok(())
    }

    fn map_write_error(e: sqlx::Error, slug: &str) -> AppError {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict(format!("Slug '{}' is already in use", slug))
            }
            _ => {
                tracing::error!("Failed to write article: {:?}", e);
                AppError::Database(e)
            }
        }
    }
}
