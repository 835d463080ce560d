//! Canonicalization of stored image values.
//!
//! Image fields come from several write paths: fresh uploads, legacy seed
//! records that embedded the storage root, hand-entered external URLs, or
//! nothing at all. Every consumer goes through `resolve_image_url` so the
//! same value renders the same way on every page.

/// Resolve a stored image value to a browser-fetchable path.
///
/// Rules, in order:
/// 1. empty or blank values resolve to `placeholder`;
/// 2. a value that starts with the legacy storage prefix (e.g.
///    `public/images/...`) has that prefix stripped;
/// 3. anything else passes through unchanged.
///
/// The transform is idempotent: resolving an already-resolved value is a
/// no-op.
pub fn resolve_image_url(value: Option<&str>, legacy_prefix: &str, placeholder: &str) -> String {
    let trimmed = value.unwrap_or("").trim();
    if trimmed.is_empty() {
        return placeholder.to_string();
    }

    if let Some(rest) = strip_storage_prefix(trimmed, legacy_prefix) {
        return rest;
    }

    trimmed.to_string()
}

/// Strip the legacy storage-root prefix from a path, if present.
///
/// Returns `None` when the value does not carry the prefix. The prefix only
/// matches as a full leading path segment, so `publicity/...` is left
/// alone when the prefix is `public`.
pub fn strip_storage_prefix(value: &str, legacy_prefix: &str) -> Option<String> {
    let prefix = legacy_prefix.trim_matches('/');
    if prefix.is_empty() {
        return None;
    }

    let without_slash = value.strip_prefix('/').unwrap_or(value);
    let rest = without_slash.strip_prefix(prefix)?;
    if !rest.starts_with('/') {
        return None;
    }

    Some(format!("/{}", rest.trim_start_matches('/')))
}

/// Join the public prefix, category and filename into a canonical URL with
/// single slashes throughout.
pub fn join_public_url(public_prefix: &str, category: &str, filename: &str) -> String {
    format!(
        "/{}/{}/{}",
        public_prefix.trim_matches('/'),
        category.trim_matches('/'),
        filename.trim_start_matches('/')
    )
}
