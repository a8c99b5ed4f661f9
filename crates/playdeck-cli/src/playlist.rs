//! Playlist files
//!
//! A playlist file is a JSON array of videos. Entries may carry a
//! `duration` in seconds, used by the headless element when playing.

use anyhow::Context;
use playdeck_core::Video;
use serde::Deserialize;
use std::path::Path;

/// Duration assumed for entries that do not declare one
pub const DEFAULT_DURATION: f64 = 30.0;

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistFileEntry {
    #[serde(flatten)]
    pub video: Video,
    #[serde(default)]
    pub duration: Option<f64>,
}

impl PlaylistFileEntry {
    pub fn duration_or_default(&self) -> f64 {
        self.duration
            .filter(|d| d.is_finite() && *d > 0.0)
            .unwrap_or(DEFAULT_DURATION)
    }
}

pub fn parse(json: &str) -> anyhow::Result<Vec<PlaylistFileEntry>> {
    let entries: Vec<PlaylistFileEntry> = serde_json::from_str(json)?;
    anyhow::ensure!(!entries.is_empty(), "playlist is empty");
    Ok(entries)
}

pub fn load(path: &Path) -> anyhow::Result<Vec<PlaylistFileEntry>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading playlist {}", path.display()))?;
    parse(&json).with_context(|| format!("parsing playlist {}", path.display()))
}

pub fn videos(entries: &[PlaylistFileEntry]) -> Vec<Video> {
    entries.iter().map(|e| e.video.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use playdeck_core::VideoId;

    #[test]
    fn test_parse_playlist() {
        let entries = parse(
            r#"[
                {"id": 1, "title": "One", "src": "/videos/1.mp4", "duration": 12.5},
                {"id": "two", "title": "Two", "source": "/streams/2.m3u8", "poster": "/images/2.jpg"}
            ]"#,
        )
        .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].video.id, VideoId::from(1));
        assert_eq!(entries[0].duration_or_default(), 12.5);
        assert_eq!(entries[1].video.poster.as_deref(), Some("/images/2.jpg"));
        assert_eq!(entries[1].duration_or_default(), DEFAULT_DURATION);
    }

    #[test]
    fn test_empty_playlist_rejected() {
        assert!(parse("[]").is_err());
    }
}
