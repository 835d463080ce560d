use site_media_backend::config::MediaConfig;
use site_media_backend::models::MediaCategory;
use site_media_backend::services::crop::{CropRegion, CropSession, CroppedImage};
use site_media_backend::services::repository::SqliteMediaRepository;
use site_media_backend::services::storage::MediaStorage;
use site_media_backend::services::uploader::{NotificationKind, UploadClient};
use image::GenericImageView;
use site_media_backend::{AppState, create_app};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

async fn spawn_server() -> (String, TempDir) {
    let pool = SqlitePoolOptions::new()
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let config = MediaConfig {
        uploads_root: dir.path().to_string_lossy().to_string(),
        ..MediaConfig::development()
    };

    let storage = MediaStorage::new(
        dir.path(),
        config.public_prefix.clone(),
        config.placeholder_relative(),
    );
    storage.ensure_placeholder().await.unwrap();

    let state = AppState {
        storage: Arc::new(storage),
        repo: Arc::new(SqliteMediaRepository::new(pool)),
        config,
    };

    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), dir)
}

fn png_fixture(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([12, 160, 90]));
    let mut out = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

fn client_config(dismiss_ms: u64) -> MediaConfig {
    MediaConfig {
        notification_dismiss_ms: dismiss_ms,
        ..MediaConfig::development()
    }
}

#[tokio::test]
async fn test_crop_and_upload_round_trip() {
    let (base_url, _dir) = spawn_server().await;
    let config = client_config(100);

    // Crop a centered half of a 200x200 source
    let mut session = CropSession::new(config.jpeg_quality);
    session
        .select_file(&png_fixture(200, 200), "team-photo.png")
        .unwrap();
    session
        .adjust_region(CropRegion {
            x: 25.0,
            y: 25.0,
            width: 50.0,
            height: 50.0,
            scale: 1.0,
            rotation_degrees: 0,
        })
        .unwrap();
    let cropped = session.confirm().unwrap();
    assert_eq!((cropped.width, cropped.height), (100, 100));

    let client = UploadClient::new(format!("{}/upload", base_url), &config);
    let outcome = client
        .upload(cropped, MediaCategory::Event, "Jordan Lee")
        .await
        .unwrap();

    assert!(outcome.url.starts_with("/images/event/"));
    assert!(outcome.url.ends_with("-team-photo.png"));
    assert_eq!(outcome.media_kind, "image");
    assert!(outcome.byte_size > 0);
    assert!(!client.is_busy());

    // The canonical URL serves the cropped JPEG back
    let served = reqwest::get(format!("{}{}", base_url, outcome.url))
        .await
        .unwrap();
    assert!(served.status().is_success());
    let bytes = served.bytes().await.unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!(decoded.dimensions(), (100, 100));

    // Success notification, then auto-dismiss
    let active = client.notifier().active();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].kind, NotificationKind::Success);

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(client.notifier().active().is_empty());
}

#[tokio::test]
async fn test_server_rejection_reason_is_surfaced() {
    let (base_url, _dir) = spawn_server().await;
    let client = UploadClient::new(format!("{}/upload", base_url), &client_config(5_000));

    // Hand-built blob that the endpoint will refuse to classify as media
    let bogus = CroppedImage {
        data: bytes::Bytes::from_static(b"definitely not media"),
        file_name: "notes.txt".to_string(),
        content_type: "text/plain".to_string(),
        width: 0,
        height: 0,
    };

    let err = client
        .upload(bogus, MediaCategory::Media, "Jordan Lee")
        .await
        .unwrap_err();
    assert!(
        err.to_string().contains("not an image or video"),
        "unexpected error: {}",
        err
    );

    let active = client.notifier().active();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].kind, NotificationKind::Error);
}

#[tokio::test]
async fn test_transport_failure_surfaces_as_error_notification() {
    // Nothing listens on port 1; the call fails without reaching a server
    let client = UploadClient::new("http://127.0.0.1:1/upload", &client_config(5_000));

    let mut session = CropSession::default();
    session
        .select_file(&png_fixture(40, 40), "portrait.png")
        .unwrap();
    let cropped = session.confirm().unwrap();

    let result = client
        .upload(cropped, MediaCategory::Team, "Jordan Lee")
        .await;
    assert!(result.is_err());

    let active = client.notifier().active();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].kind, NotificationKind::Error);
    assert!(active[0].message.starts_with("Upload failed"));
}
