use crate::config::MediaConfig;
use crate::services::storage::MediaStorage;
use std::sync::Arc;
use tokio::fs;
use tracing::info;

pub async fn setup_storage(config: &MediaConfig) -> anyhow::Result<Arc<MediaStorage>> {
    let storage = MediaStorage::new(
        config.uploads_root.clone(),
        config.public_prefix.clone(),
        config.placeholder_relative(),
    );

    fs::create_dir_all(storage.root()).await?;
    storage.ensure_placeholder().await?;

    info!(
        "🖼️  Media root: {} (served at {})",
        config.uploads_root, config.public_prefix
    );

    Ok(Arc::new(storage))
}
