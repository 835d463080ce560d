pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::MediaConfig;
use crate::services::repository::MediaRepository;
use crate::services::storage::MediaStorage;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::health::health_check,
        api::handlers::media::upload_media,
        api::handlers::media::list_media,
        api::handlers::media::list_media_by_category,
    ),
    components(
        schemas(
            api::handlers::health::HealthResponse,
            api::handlers::media::UploadForm,
            api::handlers::media::UploadResponse,
            models::MediaAsset,
            models::MediaCategory,
            models::MediaKind,
        )
    ),
    tags(
        (name = "media", description = "Upload and media listing endpoints"),
        (name = "system", description = "Health and diagnostics")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<MediaStorage>,
    pub repo: Arc<dyn MediaRepository>,
    pub config: MediaConfig,
}

pub fn create_app(state: AppState) -> Router {
    // The public prefix is configuration, so the serving route is built at
    // startup rather than hard-coded.
    let serve_route = format!(
        "{}/*path",
        state.config.public_prefix.trim_end_matches('/')
    );

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route("/upload", post(api::handlers::media::upload_media))
        .route("/media", get(api::handlers::media::list_media))
        .route(
            "/media/:category",
            get(api::handlers::media::list_media_by_category),
        )
        .route(&serve_route, get(api::handlers::media::serve_media))
        .with_state(state)
}
