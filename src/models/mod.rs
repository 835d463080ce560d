use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Namespace for uploaded files. Each category maps to its own
/// subdirectory under the uploads root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaCategory {
    Team,
    Faculty,
    Event,
    Events,
    Media,
    Leader,
}

impl MediaCategory {
    pub const ALL: [MediaCategory; 6] = [
        MediaCategory::Team,
        MediaCategory::Faculty,
        MediaCategory::Event,
        MediaCategory::Events,
        MediaCategory::Media,
        MediaCategory::Leader,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaCategory::Team => "team",
            MediaCategory::Faculty => "faculty",
            MediaCategory::Event => "event",
            MediaCategory::Events => "events",
            MediaCategory::Media => "media",
            MediaCategory::Leader => "leader",
        }
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "team" => Ok(MediaCategory::Team),
            "faculty" => Ok(MediaCategory::Faculty),
            "event" => Ok(MediaCategory::Event),
            "events" => Ok(MediaCategory::Events),
            "media" => Ok(MediaCategory::Media),
            "leader" => Ok(MediaCategory::Leader),
            other => Err(format!(
                "Unknown category '{}'. Allowed: team, faculty, event, events, media, leader",
                other
            )),
        }
    }
}

/// Coarse media classification used for the `type` field of upload
/// responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One persisted upload. `url` is the canonical public path returned to
/// the caller; entity records reference it as an opaque string.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MediaAsset {
    pub id: String,
    pub category: String,
    pub owner: Option<String>,
    pub filename: String,
    pub url: String,
    pub file_type: String,
    pub media_kind: String,
    pub size: i64,
    pub uploaded_at: Option<DateTime<Utc>>,
}
