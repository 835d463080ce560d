use crate::models::MediaKind;
use anyhow::{Result, anyhow};
use std::path::Path;

/// Default maximum upload size: 10 MB
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validates upload size against the configured limit
pub fn validate_upload_size(size: usize, max_size: usize) -> Result<()> {
    if size > max_size {
        return Err(anyhow!(ValidationError {
            code: "FILE_TOO_LARGE",
            message: format!(
                "Upload of {} bytes exceeds maximum allowed {} bytes ({} MB)",
                size,
                max_size,
                max_size / 1024 / 1024
            ),
        }));
    }
    Ok(())
}

/// Reduces an uploaded filename to its base name with every character
/// outside `[A-Za-z0-9.-]` stripped. The stored name is later prefixed
/// with a millisecond timestamp, so the result only has to be a safe
/// single path segment.
pub fn sanitize_upload_filename(filename: &str) -> Result<String> {
    // Drop any directory components the client may have sent
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path components in uploaded filename: {}", filename);
    }

    let stripped: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '-')
        .collect();

    if stripped.trim_matches(|c| c == '.' || c == '-').is_empty() {
        return Err(anyhow!(ValidationError {
            code: "INVALID_FILENAME",
            message: format!("Filename '{}' has no usable characters", filename),
        }));
    }

    // ASCII-only at this point, so a byte truncation is safe
    let stripped = if stripped.len() > 200 {
        stripped[..200].to_string()
    } else {
        stripped
    };

    Ok(stripped)
}

/// Determines the MIME type and coarse kind of an upload.
///
/// Magic bytes win over the client-declared content type; the declared
/// type is only a fallback for formats `infer` does not know. Anything
/// that is not an image or a video is rejected.
pub fn classify_media(header: &[u8], declared: Option<&str>) -> Result<(String, MediaKind)> {
    if header.is_empty() {
        return Err(anyhow!(ValidationError {
            code: "EMPTY_FILE",
            message: "File appears to be empty".to_string(),
        }));
    }

    let sniffed = infer::get(header).map(|t| t.mime_type().to_string());
    let mime = sniffed
        .or_else(|| declared.map(normalize_mime))
        .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string());

    let kind = if mime.starts_with("image/") {
        MediaKind::Image
    } else if mime.starts_with("video/") {
        MediaKind::Video
    } else {
        return Err(anyhow!(ValidationError {
            code: "UNSUPPORTED_MEDIA_TYPE",
            message: format!("'{}' is not an image or video", mime),
        }));
    };

    Ok((mime, kind))
}

fn normalize_mime(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_upload_size() {
        assert!(validate_upload_size(1024, DEFAULT_MAX_UPLOAD_SIZE).is_ok());
        assert!(validate_upload_size(DEFAULT_MAX_UPLOAD_SIZE, DEFAULT_MAX_UPLOAD_SIZE).is_ok());
        assert!(validate_upload_size(DEFAULT_MAX_UPLOAD_SIZE + 1, DEFAULT_MAX_UPLOAD_SIZE).is_err());
    }

    #[test]
    fn test_sanitize_upload_filename() {
        assert_eq!(sanitize_upload_filename("photo.png").unwrap(), "photo.png");
        assert_eq!(
            sanitize_upload_filename("team photo (1).jpg").unwrap(),
            "teamphoto1.jpg"
        );
        assert_eq!(
            sanitize_upload_filename("head-shot.2024.png").unwrap(),
            "head-shot.2024.png"
        );

        // Path components are dropped, not preserved
        assert_eq!(
            sanitize_upload_filename("../../../etc/passwd").unwrap(),
            "passwd"
        );

        // Nothing usable left after stripping
        assert!(sanitize_upload_filename("профиль").is_err());
        assert!(sanitize_upload_filename("...").is_err());
        assert!(sanitize_upload_filename("").is_err());
    }

    #[test]
    fn test_classify_media_by_magic_bytes() {
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        let (mime, kind) = classify_media(&png, None).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(kind, MediaKind::Image);

        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46];
        let (mime, kind) = classify_media(&jpeg, Some("image/png")).unwrap();
        assert_eq!(mime, "image/jpeg");
        assert_eq!(kind, MediaKind::Image);
    }

    #[test]
    fn test_classify_media_falls_back_to_declared_type() {
        let opaque = b"not a known signature";
        let (mime, kind) = classify_media(opaque, Some("image/svg+xml; charset=utf-8")).unwrap();
        assert_eq!(mime, "image/svg+xml");
        assert_eq!(kind, MediaKind::Image);
    }

    #[test]
    fn test_classify_media_rejects_non_media() {
        assert!(classify_media(b"", None).is_err());
        assert!(classify_media(b"plain text", Some("text/plain")).is_err());
        // ELF binary claiming to be an image
        let mut elf = vec![0u8; 64];
        elf[..4].copy_from_slice(&[0x7F, 0x45, 0x4C, 0x46]);
        assert!(classify_media(&elf, Some("image/png")).is_err());
    }
}
