use crate::models::{MediaAsset, MediaCategory};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::SqlitePool;

/// Persistence seam for uploaded assets. The pipeline only depends on this
/// interface; entity-editing collaborators attach the recorded URL to
/// their own records through their own endpoints.
#[async_trait]
pub trait MediaRepository: Send + Sync {
    async fn record(&self, asset: &MediaAsset) -> Result<()>;

    /// Recorded assets, newest first, optionally restricted to a category.
    async fn list(&self, category: Option<MediaCategory>) -> Result<Vec<MediaAsset>>;

    async fn ping(&self) -> bool;
}

pub struct SqliteMediaRepository {
    pool: SqlitePool,
}

impl SqliteMediaRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MediaRepository for SqliteMediaRepository {
    async fn record(&self, asset: &MediaAsset) -> Result<()> {
        sqlx::query(
            "INSERT INTO media_assets \
             (id, category, owner, filename, url, file_type, media_kind, size, uploaded_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&asset.id)
        .bind(&asset.category)
        .bind(&asset.owner)
        .bind(&asset.filename)
        .bind(&asset.url)
        .bind(&asset.file_type)
        .bind(&asset.media_kind)
        .bind(asset.size)
        .bind(asset.uploaded_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list(&self, category: Option<MediaCategory>) -> Result<Vec<MediaAsset>> {
        let assets = match category {
            Some(cat) => {
                sqlx::query_as::<_, MediaAsset>(
                    "SELECT id, category, owner, filename, url, file_type, media_kind, size, uploaded_at \
                     FROM media_assets WHERE category = ? ORDER BY uploaded_at DESC",
                )
                .bind(cat.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, MediaAsset>(
                    "SELECT id, category, owner, filename, url, file_type, media_kind, size, uploaded_at \
                     FROM media_assets ORDER BY uploaded_at DESC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(assets)
    }

    async fn ping(&self) -> bool {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}
