#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Clip lengths the backend knows how to script for, in seconds.
pub const SUPPORTED_DURATIONS: [u32; 4] = [15, 30, 45, 60];
pub const DEFAULT_DURATION_SECONDS: u32 = 30;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum VideoStyle {
    #[default]
    Documentary,
    Cinematic,
    Emotional,
    Upbeat,
    Horror,
}

impl VideoStyle {
    pub const ALL: [VideoStyle; 5] =
        [Self::Documentary, Self::Cinematic, Self::Emotional, Self::Upbeat, Self::Horror];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Documentary => "documentary",
            Self::Cinematic => "cinematic",
            Self::Emotional => "emotional",
            Self::Upbeat => "upbeat",
            Self::Horror => "horror",
        }
    }
}

impl fmt::Display for VideoStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VideoStyle {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let needle = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|style| style.as_str() == needle)
            .ok_or_else(|| value.to_string())
    }
}

pub fn is_supported_duration(seconds: u32) -> bool {
    SUPPORTED_DURATIONS.contains(&seconds)
}

/// One submitted generation request. Immutable once the backend has assigned an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: String,
    pub topic: String,
    pub style: VideoStyle,
    pub duration_seconds: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerateRequest {
    pub topic: String,
    pub video_style: VideoStyle,
    pub duration: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    pub id: String,
}

/// Status strings reported by `GET /api/status/{id}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RemoteStatus {
    Pending,
    Starting,
    Processing,
    Completed,
    Failed,
}

impl RemoteStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub status: RemoteStatus,
    #[serde(default)]
    pub progress: Option<i64>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl StatusResponse {
    /// Reported progress clamped into 0..=100.
    pub fn progress_percent(&self) -> u8 {
        self.progress.unwrap_or(0).clamp(0, 100) as u8
    }
}

/// Entry of the completed-video listing.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoRecord {
    pub id: String,
    pub status: RemoteStatus,
    #[serde(default)]
    pub video_url: Option<String>,
}
