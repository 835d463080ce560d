use crate::api::error::AppError;
use crate::models::{MediaAsset, MediaCategory};
use crate::services::repository::MediaRepository;
use crate::utils::urls::resolve_image_url;
use crate::utils::validation::{classify_media, sanitize_upload_filename, validate_upload_size};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Multipart form shape of the upload endpoint, for the API docs.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    image: String,
    category: String,
    owner: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
    pub file_type: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub size: i64,
}

#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data", description = "Image upload: `image` file field plus `category` and optional `owner` text fields"),
    responses(
        (status = 200, description = "File stored, canonical URL returned", body = UploadResponse),
        (status = 400, description = "No file, unknown category, or unsupported media"),
        (status = 500, description = "Storage failure")
    ),
    tag = "media"
)]
pub async fn upload_media(
    State(state): State<crate::AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut file: Option<(String, Option<String>, Bytes)> = None;
    let mut category_raw: Option<String> = None;
    let mut owner: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "image" => {
                let original_name = field.file_name().unwrap_or("unnamed").to_string();
                let declared_type = field.content_type().map(|s| s.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Read error: {}", e)))?;
                file = Some((original_name, declared_type, data));
            }
            "category" => category_raw = field.text().await.ok(),
            "owner" => owner = field.text().await.ok().filter(|s| !s.trim().is_empty()),
            _ => {}
        }
    }

    let (original_name, declared_type, data) =
        file.ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;

    let category: MediaCategory = category_raw
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(AppError::BadRequest)?;

    validate_upload_size(data.len(), state.config.max_upload_size)
        .map_err(|e| AppError::PayloadTooLarge(e.to_string()))?;

    let sanitized = sanitize_upload_filename(&original_name)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let (file_type, kind) = classify_media(&data, declared_type.as_deref())
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let stored_name = state.storage.stored_filename(&sanitized);
    let saved = state
        .storage
        .save(category, &stored_name, &data)
        .await
        .map_err(|e| {
            tracing::error!("Failed to persist upload {}: {:?}", stored_name, e);
            AppError::Internal("Failed to store upload".to_string())
        })?;

    // A failed record leaves the stored file as an orphan; there is no
    // cleanup transaction spanning write and record.
    let asset = MediaAsset {
        id: Uuid::new_v4().to_string(),
        category: category.as_str().to_string(),
        owner,
        filename: stored_name,
        url: saved.url.clone(),
        file_type: file_type.clone(),
        media_kind: kind.as_str().to_string(),
        size: saved.size,
        uploaded_at: Some(Utc::now()),
    };
    state.repo.record(&asset).await.map_err(|e| {
        tracing::error!("Failed to record upload {}: {:?}", asset.url, e);
        AppError::Internal("Failed to record upload".to_string())
    })?;

    tracing::info!(
        "Stored {} upload {} ({} bytes)",
        category,
        saved.url,
        saved.size
    );

    Ok(Json(UploadResponse {
        success: true,
        url: saved.url,
        file_type,
        kind: kind.as_str().to_string(),
        size: saved.size,
    }))
}

#[utoipa::path(
    get,
    path = "/media",
    responses(
        (status = 200, description = "All recorded uploads, newest first", body = Vec<MediaAsset>)
    ),
    tag = "media"
)]
pub async fn list_media(
    State(state): State<crate::AppState>,
) -> Result<Json<Vec<MediaAsset>>, AppError> {
    let assets = state.repo.list(None).await?;
    Ok(Json(resolve_urls(assets, &state)))
}

#[utoipa::path(
    get,
    path = "/media/{category}",
    params(
        ("category" = String, Path, description = "Upload category")
    ),
    responses(
        (status = 200, description = "Recorded uploads for one category", body = Vec<MediaAsset>),
        (status = 400, description = "Unknown category")
    ),
    tag = "media"
)]
pub async fn list_media_by_category(
    State(state): State<crate::AppState>,
    Path(category): Path<String>,
) -> Result<Json<Vec<MediaAsset>>, AppError> {
    let category: MediaCategory = category.parse().map_err(AppError::BadRequest)?;
    let assets = state.repo.list(Some(category)).await?;
    Ok(Json(resolve_urls(assets, &state)))
}

/// Every read path hands out resolved URLs, whatever was stored.
fn resolve_urls(mut assets: Vec<MediaAsset>, state: &crate::AppState) -> Vec<MediaAsset> {
    for asset in &mut assets {
        asset.url = resolve_image_url(
            Some(&asset.url),
            &state.config.legacy_storage_prefix,
            &state.config.placeholder_path,
        );
    }
    assets
}

/// Serve stored files at the public prefix.
///
/// A request for a file that does not exist answers with the placeholder
/// image instead of a 404, so a stale stored URL degrades to the default
/// image exactly once, with no redirect or retry loop.
pub async fn serve_media(
    State(state): State<crate::AppState>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    let (data, served_path) = match state.storage.read(&path).await {
        Ok(Some(data)) => (data, path),
        Ok(None) => {
            tracing::debug!("Missing media {}, serving placeholder", path);
            let placeholder = state.storage.read_placeholder().await.map_err(|e| {
                tracing::error!("Placeholder unavailable: {:?}", e);
                AppError::NotFound("Media not found".to_string())
            })?;
            (placeholder, state.storage.placeholder_rel().to_string())
        }
        Err(e) => {
            tracing::warn!("Rejected media path {}: {}", path, e);
            return Err(AppError::BadRequest("Invalid media path".to_string()));
        }
    };

    let content_type = infer::get(&data)
        .map(|t| t.mime_type().to_string())
        .unwrap_or_else(|| guess_type_from_extension(&served_path));

    Ok((
        [(header::CONTENT_TYPE, content_type)],
        Body::from(data),
    )
        .into_response())
}

fn guess_type_from_extension(path: &str) -> String {
    match path.rsplit('.').next() {
        Some("png") => mime::IMAGE_PNG.to_string(),
        Some("jpg") | Some("jpeg") => mime::IMAGE_JPEG.to_string(),
        Some("gif") => mime::IMAGE_GIF.to_string(),
        Some("svg") => mime::IMAGE_SVG.to_string(),
        Some("webp") => "image/webp".to_string(),
        _ => mime::APPLICATION_OCTET_STREAM.to_string(),
    }
}
