//! HTTP client side of the upload pipeline.
//!
//! One invocation, one network call: the cropped blob travels as the
//! `image` multipart field with `category` and `owner` alongside it. There
//! is no retry and no cancellation of an in-flight upload; every outcome
//! surfaces as a notification that dismisses itself after a fixed delay.

use crate::config::MediaConfig;
use crate::models::MediaCategory;
use crate::services::crop::CroppedImage;
use crate::utils::urls::strip_storage_prefix;
use anyhow::{Context, Result, bail};
use reqwest::multipart;
use serde::Deserialize;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub message: String,
}

/// Transient user-facing messages that auto-dismiss after a fixed delay,
/// independent of the upload outcome.
#[derive(Clone)]
pub struct Notifier {
    entries: Arc<Mutex<Vec<Notification>>>,
    next_id: Arc<AtomicU64>,
    dismiss_after: Duration,
}

impl Notifier {
    pub fn new(dismiss_after: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            dismiss_after,
        }
    }

    pub fn push(&self, kind: NotificationKind, message: impl Into<String>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().push(Notification {
            id,
            kind,
            message: message.into(),
        });

        let entries = Arc::clone(&self.entries);
        let dismiss_after = self.dismiss_after;
        tokio::spawn(async move {
            tokio::time::sleep(dismiss_after).await;
            entries
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .retain(|n| n.id != id);
        });
    }

    pub fn active(&self) -> Vec<Notification> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Notification>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug)]
pub struct UploadOutcome {
    pub url: String,
    pub media_kind: String,
    pub byte_size: i64,
}

#[derive(Deserialize)]
struct WireResponse {
    url: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    size: Option<i64>,
}

#[derive(Deserialize)]
struct WireError {
    error: String,
}

pub struct UploadClient {
    http: reqwest::Client,
    endpoint: String,
    legacy_storage_prefix: String,
    notifier: Notifier,
    in_flight: AtomicBool,
}

impl UploadClient {
    pub fn new(endpoint: impl Into<String>, config: &MediaConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            legacy_storage_prefix: config.legacy_storage_prefix.clone(),
            notifier: Notifier::new(Duration::from_millis(config.notification_dismiss_ms)),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Whether an upload is currently on the wire. The UI shows a busy
    /// indicator off this flag; the call itself cannot be cancelled.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Send a cropped image to the upload endpoint. Exactly one network
    /// call; all failures surface through the same notification path.
    pub async fn upload(
        &self,
        image: CroppedImage,
        category: MediaCategory,
        owner_label: &str,
    ) -> Result<UploadOutcome> {
        self.in_flight.store(true, Ordering::Relaxed);
        let result = self.send(image, category, owner_label).await;
        self.in_flight.store(false, Ordering::Relaxed);

        match &result {
            Ok(outcome) => {
                self.notifier.push(
                    NotificationKind::Success,
                    format!("Image uploaded to {}", outcome.url),
                );
            }
            Err(e) => {
                self.notifier
                    .push(NotificationKind::Error, format!("Upload failed: {}", e));
            }
        }

        result
    }

    async fn send(
        &self,
        image: CroppedImage,
        category: MediaCategory,
        owner_label: &str,
    ) -> Result<UploadOutcome> {
        let fallback_size = image.data.len() as i64;

        let part = multipart::Part::bytes(image.data.to_vec())
            .file_name(image.file_name)
            .mime_str(&image.content_type)
            .context("Invalid content type for upload")?;
        let form = multipart::Form::new()
            .part("image", part)
            .text("category", category.as_str())
            .text("owner", owner_label.to_string());

        let response = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .context("Upload request could not be sent")?;

        let status = response.status();
        if !status.is_success() {
            let reason = response
                .json::<WireError>()
                .await
                .map(|e| e.error)
                .unwrap_or_else(|_| format!("server responded with {}", status));
            bail!(reason);
        }

        let body: WireResponse = response
            .json()
            .await
            .context("Upload response was not well-formed JSON")?;

        // Some write paths historically embedded the storage root; never
        // hand that prefix back to callers.
        let url = strip_storage_prefix(&body.url, &self.legacy_storage_prefix)
            .unwrap_or(body.url);

        Ok(UploadOutcome {
            url,
            media_kind: body.kind.unwrap_or_else(|| "image".to_string()),
            byte_size: body.size.unwrap_or(fallback_size),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_notifications_auto_dismiss() {
        let notifier = Notifier::new(Duration::from_millis(50));
        notifier.push(NotificationKind::Success, "uploaded");
        notifier.push(NotificationKind::Error, "failed");

        let active = notifier.active();
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].kind, NotificationKind::Success);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(notifier.active().is_empty());
    }
}
