use crate::models::MediaCategory;
use crate::utils::urls::join_public_url;
use anyhow::{Result, anyhow};
use bytes::Bytes;
use chrono::Utc;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

pub struct MediaStorage {
    root: PathBuf,
    public_prefix: String,
    placeholder_rel: String,
}

pub struct StoredAsset {
    pub relative_path: String,
    pub url: String,
    pub size: i64,
}

impl MediaStorage {
    pub fn new(
        root: impl Into<PathBuf>,
        public_prefix: impl Into<String>,
        placeholder_rel: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.into(),
            placeholder_rel: placeholder_rel.into(),
        }
    }

    pub fn public_prefix(&self) -> &str {
        &self.public_prefix
    }

    pub fn placeholder_rel(&self) -> &str {
        &self.placeholder_rel
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Derive the stored filename for an already-sanitized original name.
    ///
    /// Millisecond timestamps keep names practically unique; two uploads of
    /// the same name landing in the same millisecond can still collide.
    pub fn stored_filename(&self, sanitized_name: &str) -> String {
        format!("{}-{}", Utc::now().timestamp_millis(), sanitized_name)
    }

    /// Persist one upload under its category directory and return the
    /// stored path plus canonical public URL.
    ///
    /// The category directory is created lazily; `create_dir_all` is
    /// idempotent, so concurrent first uploads to a category are safe. The
    /// write is a single whole-buffer operation with no partial-write
    /// recovery.
    pub async fn save(
        &self,
        category: MediaCategory,
        filename: &str,
        data: &[u8],
    ) -> Result<StoredAsset> {
        let dir = self.root.join(category.as_str());
        fs::create_dir_all(&dir).await?;

        let full_path = dir.join(filename);
        let mut file = fs::File::create(&full_path).await?;
        file.write_all(data).await?;
        file.flush().await?;

        tracing::debug!("Saved upload to {:?}", full_path);

        Ok(StoredAsset {
            relative_path: format!("{}/{}", category.as_str(), filename),
            url: join_public_url(&self.public_prefix, category.as_str(), filename),
            size: data.len() as i64,
        })
    }

    /// Read a stored file by its root-relative path. Returns `Ok(None)`
    /// when the file does not exist; rejects paths that escape the root.
    pub async fn read(&self, relative_path: &str) -> Result<Option<Bytes>> {
        let full_path = self.resolve_under_root(relative_path)?;
        match fs::read(&full_path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(anyhow!("Failed to read {}: {}", relative_path, e)),
        }
    }

    /// Read the placeholder asset. Present from startup onward, so a miss
    /// here is a deployment error.
    pub async fn read_placeholder(&self) -> Result<Bytes> {
        self.read(&self.placeholder_rel)
            .await?
            .ok_or_else(|| anyhow!("Placeholder asset {} is missing", self.placeholder_rel))
    }

    /// List the stored filenames of one category, in directory order.
    pub async fn list_category(&self, category: MediaCategory) -> Result<Vec<String>> {
        let dir = self.root.join(category.as_str());
        let mut names = Vec::new();

        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }

        Ok(names)
    }

    /// Write the default placeholder if it is not already present, so the
    /// fallback target of URL resolution is always servable.
    pub async fn ensure_placeholder(&self) -> Result<()> {
        let full_path = self.resolve_under_root(&self.placeholder_rel)?;
        if full_path.exists() {
            return Ok(());
        }

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let data = render_default_placeholder()?;
        fs::write(&full_path, data).await?;
        tracing::info!("Generated placeholder asset at {:?}", full_path);
        Ok(())
    }

    fn resolve_under_root(&self, relative_path: &str) -> Result<PathBuf> {
        let rel = Path::new(relative_path);
        let escapes = rel.components().any(|c| {
            !matches!(c, Component::Normal(_))
        });
        if escapes || relative_path.is_empty() {
            return Err(anyhow!("Invalid storage path: {}", relative_path));
        }
        Ok(self.root.join(rel))
    }
}

/// A neutral grey PNG used when no placeholder asset has been deployed.
fn render_default_placeholder() -> Result<Vec<u8>> {
    let img = image::RgbImage::from_pixel(600, 400, image::Rgb([229, 231, 235]));
    let mut out = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut out);
    image::DynamicImage::ImageRgb8(img).write_to(&mut cursor, image::ImageFormat::Png)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(dir: &tempfile::TempDir) -> MediaStorage {
        MediaStorage::new(dir.path(), "/images", "placeholder.png")
    }

    #[tokio::test]
    async fn test_save_and_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);

        let asset = storage
            .save(MediaCategory::Team, "1700000000000-photo.png", b"bytes")
            .await
            .unwrap();

        assert_eq!(asset.url, "/images/team/1700000000000-photo.png");
        assert_eq!(asset.relative_path, "team/1700000000000-photo.png");
        assert_eq!(asset.size, 5);

        let data = storage.read(&asset.relative_path).await.unwrap().unwrap();
        assert_eq!(&data[..], b"bytes");
    }

    #[tokio::test]
    async fn test_read_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);
        assert!(storage.read("team/nope.png").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);
        assert!(storage.read("../outside.png").await.is_err());
        assert!(storage.read("team/../../outside.png").await.is_err());
        assert!(storage.read("/etc/passwd").await.is_err());
    }

    #[tokio::test]
    async fn test_stored_filename_keeps_sanitized_name() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);
        let name = storage.stored_filename("photo.png");
        assert!(name.ends_with("-photo.png"));
        let millis: i64 = name.split('-').next().unwrap().parse().unwrap();
        assert!(millis > 0);
    }

    #[tokio::test]
    async fn test_categories_are_disjoint() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);

        storage
            .save(MediaCategory::Team, "1-photo.png", b"a")
            .await
            .unwrap();
        storage
            .save(MediaCategory::Faculty, "1-photo.png", b"b")
            .await
            .unwrap();

        let team = storage.list_category(MediaCategory::Team).await.unwrap();
        let faculty = storage.list_category(MediaCategory::Faculty).await.unwrap();
        assert_eq!(team, vec!["1-photo.png"]);
        assert_eq!(faculty, vec!["1-photo.png"]);

        let team_bytes = storage.read("team/1-photo.png").await.unwrap().unwrap();
        let faculty_bytes = storage.read("faculty/1-photo.png").await.unwrap().unwrap();
        assert_ne!(team_bytes, faculty_bytes);
    }

    #[tokio::test]
    async fn test_ensure_placeholder_generates_once() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);

        storage.ensure_placeholder().await.unwrap();
        let first = storage.read_placeholder().await.unwrap();
        assert!(!first.is_empty());

        // Second call keeps the existing file untouched
        storage.ensure_placeholder().await.unwrap();
        let second = storage.read_placeholder().await.unwrap();
        assert_eq!(first, second);
    }
}
