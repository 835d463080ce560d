use std::env;

/// Configuration for the media ingestion pipeline
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Directory uploads are persisted under (default: "./uploads")
    pub uploads_root: String,

    /// Public URL prefix the stored files are served at (default: "/images")
    pub public_prefix: String,

    /// Placeholder shown whenever an image value is missing or unreachable
    /// (default: "/images/placeholder.png")
    pub placeholder_path: String,

    /// Storage-root prefix some legacy write paths embedded into stored
    /// values; stripped at resolution time (default: "public")
    pub legacy_storage_prefix: String,

    /// Maximum upload size in bytes (default: 10 MB)
    pub max_upload_size: usize,

    /// JPEG quality used when re-encoding confirmed crops (default: 95)
    pub jpeg_quality: u8,

    /// How long client notifications stay visible, in milliseconds
    /// (default: 3000)
    pub notification_dismiss_ms: u64,

    /// Comma-separated CORS allow-list, or "*" (default: "*")
    pub cors_allowed_origins: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            uploads_root: "./uploads".to_string(),
            public_prefix: "/images".to_string(),
            placeholder_path: "/images/placeholder.png".to_string(),
            legacy_storage_prefix: "public".to_string(),
            max_upload_size: 10 * 1024 * 1024, // 10 MB
            jpeg_quality: 95,
            notification_dismiss_ms: 3000,
            cors_allowed_origins: "*".to_string(),
        }
    }
}

impl MediaConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            uploads_root: env::var("UPLOADS_ROOT").unwrap_or(default.uploads_root),

            public_prefix: env::var("PUBLIC_PREFIX").unwrap_or(default.public_prefix),

            placeholder_path: env::var("PLACEHOLDER_PATH").unwrap_or(default.placeholder_path),

            legacy_storage_prefix: env::var("LEGACY_STORAGE_PREFIX")
                .unwrap_or(default.legacy_storage_prefix),

            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),

            jpeg_quality: env::var("JPEG_QUALITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.jpeg_quality),

            notification_dismiss_ms: env::var("NOTIFICATION_DISMISS_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.notification_dismiss_ms),

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or(default.cors_allowed_origins),
        }
    }

    /// Create config for development (small limits, open CORS)
    pub fn development() -> Self {
        Self {
            uploads_root: "./uploads".to_string(),
            public_prefix: "/images".to_string(),
            placeholder_path: "/images/placeholder.png".to_string(),
            legacy_storage_prefix: "public".to_string(),
            max_upload_size: 10 * 1024 * 1024,
            jpeg_quality: 95,
            notification_dismiss_ms: 3000,
            cors_allowed_origins: "*".to_string(),
        }
    }

    /// Create config for production (explicit CORS allow-list expected)
    pub fn production() -> Self {
        Self {
            uploads_root: env::var("UPLOADS_ROOT").unwrap_or_else(|_| "/var/lib/site-media/uploads".to_string()),
            public_prefix: "/images".to_string(),
            placeholder_path: "/images/placeholder.png".to_string(),
            legacy_storage_prefix: "public".to_string(),
            max_upload_size: 10 * 1024 * 1024,
            jpeg_quality: 95,
            notification_dismiss_ms: 3000,
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| String::new()),
        }
    }

    /// Path of the placeholder file relative to the uploads root.
    ///
    /// The placeholder is addressed by its public URL in config, but it is
    /// stored under the same root as every other asset.
    pub fn placeholder_relative(&self) -> String {
        let prefix = self.public_prefix.trim_matches('/');
        let path = self.placeholder_path.trim_start_matches('/');
        path.strip_prefix(prefix)
            .map(|rest| rest.trim_start_matches('/').to_string())
            .unwrap_or_else(|| path.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MediaConfig::default();
        assert_eq!(config.max_upload_size, 10 * 1024 * 1024);
        assert_eq!(config.public_prefix, "/images");
        assert_eq!(config.jpeg_quality, 95);
        assert_eq!(config.notification_dismiss_ms, 3000);
    }

    #[test]
    fn test_placeholder_relative() {
        let config = MediaConfig::default();
        assert_eq!(config.placeholder_relative(), "placeholder.png");

        let nested = MediaConfig {
            placeholder_path: "/images/defaults/missing.png".to_string(),
            ..MediaConfig::default()
        };
        assert_eq!(nested.placeholder_relative(), "defaults/missing.png");
    }

    #[test]
    fn test_development_config() {
        let config = MediaConfig::development();
        assert_eq!(config.cors_allowed_origins, "*");
    }

    #[test]
    fn test_production_config() {
        let config = MediaConfig::production();
        assert_eq!(config.public_prefix, "/images");
        assert_eq!(config.max_upload_size, 10 * 1024 * 1024);
    }
}
