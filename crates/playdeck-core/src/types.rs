//! Core types for Playdeck

use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Identifier of a playlist entry.
///
/// Playlists written by hand often use bare numbers for ids, so both JSON
/// strings and numbers deserialize into the same textual id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VideoId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for VideoId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for VideoId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for VideoId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => VideoId(s),
            // JS hosts hand every number over as a float
            RawId::Number(n) => VideoId(match n.as_f64() {
                Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 9.0e15 => {
                    (f as i64).to_string()
                }
                _ => n.to_string(),
            }),
        })
    }
}

/// A playlist entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: VideoId,
    pub title: String,
    /// Direct media URI or adaptive-stream manifest URI
    #[serde(alias = "src")]
    pub source: String,
    #[serde(default)]
    pub poster: Option<String>,
    /// Caption resource hosted alongside the video
    #[serde(default, alias = "subtitles")]
    pub subtitle_track: Option<String>,
    #[serde(default, alias = "qualityOptions")]
    pub quality_labels: Vec<String>,
}

impl Video {
    pub fn new(id: impl Into<VideoId>, title: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            source: source.into(),
            poster: None,
            subtitle_track: None,
            quality_labels: Vec::new(),
        }
    }

    pub fn with_poster(mut self, poster: impl Into<String>) -> Self {
        self.poster = Some(poster.into());
        self
    }

    pub fn with_subtitle_track(mut self, track: impl Into<String>) -> Self {
        self.subtitle_track = Some(track.into());
        self
    }

    pub fn with_quality_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.quality_labels = labels.into_iter().map(Into::into).collect();
        self
    }
}

/// Transport state machine. There is no terminal state: end of media moves
/// on to the next playlist entry and keeps playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportState {
    Paused,
    Playing,
}

impl TransportState {
    pub fn from_playing(is_playing: bool) -> Self {
        if is_playing {
            TransportState::Playing
        } else {
            TransportState::Paused
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            TransportState::Paused => TransportState::Playing,
            TransportState::Playing => TransportState::Paused,
        }
    }
}

impl std::fmt::Display for TransportState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportState::Paused => write!(f, "paused"),
            TransportState::Playing => write!(f, "playing"),
        }
    }
}

/// Subtitle selection: a BCP-47 language tag or off
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleSelection {
    #[default]
    Off,
    Language(String),
}

impl SubtitleSelection {
    /// Parse the value a subtitle picker emits; `"off"` and the empty string
    /// both disable subtitles.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("off") {
            SubtitleSelection::Off
        } else {
            SubtitleSelection::Language(value.to_string())
        }
    }

    pub fn language(&self) -> Option<&str> {
        match self {
            SubtitleSelection::Off => None,
            SubtitleSelection::Language(tag) => Some(tag),
        }
    }
}

impl std::fmt::Display for SubtitleSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubtitleSelection::Off => write!(f, "off"),
            SubtitleSelection::Language(tag) => write!(f, "{}", tag),
        }
    }
}

/// Clamp a requested volume into [0, 1]. NaN maps to silence.
pub fn clamp_volume(volume: f64) -> f64 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

/// Read-only view of the shared player state.
///
/// Published on every mutation; consumers never write back into it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub playlist: Arc<[Video]>,
    pub current_index: usize,
    pub current_video: Video,
    pub is_playing: bool,
    pub volume: f64,
    pub is_muted: bool,
    pub playback_rate: f64,
    pub current_time: f64,
    pub duration: f64,
    pub is_full_screen: bool,
    pub selected_subtitle: SubtitleSelection,
    /// Bookmarks of the current video, in creation order
    pub bookmarks: Vec<f64>,
}

impl PlayerSnapshot {
    /// Volume actually applied to the media element
    pub fn effective_volume(&self) -> f64 {
        if self.is_muted {
            0.0
        } else {
            self.volume
        }
    }

    pub fn transport(&self) -> TransportState {
        TransportState::from_playing(self.is_playing)
    }

    /// Duration, if the media element has reported one
    pub fn known_duration(&self) -> Option<f64> {
        (self.duration > 0.0).then_some(self.duration)
    }
}

/// Unique identifier for a streaming or recording session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A file handed to the host for download
#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: bytes::Bytes,
}

impl Download {
    pub fn new(file_name: impl Into<String>, mime_type: &'static str, bytes: impl Into<bytes::Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type,
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Render as a `data:` URL
    pub fn to_data_url(&self) -> String {
        use base64::Engine;
        format!(
            "data:{};base64,{}",
            self.mime_type,
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}
