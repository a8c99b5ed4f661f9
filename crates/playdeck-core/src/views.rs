//! Playlist and bookmark list views

use crate::controls::Command;
use crate::types::{PlayerSnapshot, VideoId};
use serde::Serialize;

/// Shown when the current video has no bookmarks
pub const NO_BOOKMARKS: &str = "No bookmarks for the current video.";

/// Format seconds as `mm:ss`. Minutes are not wrapped into hours; anything
/// non-finite renders as `00:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() {
        return "00:00".to_string();
    }
    let total = seconds.max(0.0).floor() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// One row of the playlist
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistEntry {
    pub index: usize,
    pub id: VideoId,
    pub title: String,
    pub poster: Option<String>,
    pub is_active: bool,
}

pub struct PlaylistView;

impl PlaylistView {
    pub fn render(state: &PlayerSnapshot) -> Vec<PlaylistEntry> {
        state
            .playlist
            .iter()
            .enumerate()
            .map(|(index, video)| PlaylistEntry {
                index,
                id: video.id.clone(),
                title: video.title.clone(),
                poster: video.poster.clone(),
                is_active: index == state.current_index,
            })
            .collect()
    }

    /// Command for clicking row `index`
    pub fn select(state: &PlayerSnapshot, index: usize) -> Option<Command> {
        state
            .playlist
            .get(index)
            .map(|video| Command::SelectVideo(video.id.clone()))
    }
}

/// One row of the bookmark list
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkEntry {
    pub index: usize,
    pub label: String,
    pub timestamp: String,
    pub position: f64,
}

pub struct BookmarkView;

impl BookmarkView {
    pub fn render(state: &PlayerSnapshot) -> Vec<BookmarkEntry> {
        state
            .bookmarks
            .iter()
            .enumerate()
            .map(|(index, &position)| BookmarkEntry {
                index,
                label: format!("Bookmark {}", index + 1),
                timestamp: format_time(position),
                position,
            })
            .collect()
    }

    /// Command for clicking row `index`: seek there and play
    pub fn select(state: &PlayerSnapshot, index: usize) -> Option<Command> {
        (index < state.bookmarks.len()).then_some(Command::JumpToBookmark(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SubtitleSelection, Video};

    fn snapshot() -> PlayerSnapshot {
        let playlist: Vec<Video> = vec![
            Video::new(1, "One", "/videos/1.mp4").with_poster("/images/1.jpg"),
            Video::new(2, "Two", "/videos/2.mp4"),
        ];
        PlayerSnapshot {
            current_video: playlist[1].clone(),
            playlist: playlist.into(),
            current_index: 1,
            is_playing: false,
            volume: 1.0,
            is_muted: false,
            playback_rate: 1.0,
            current_time: 0.0,
            duration: 0.0,
            is_full_screen: false,
            selected_subtitle: SubtitleSelection::Off,
            bookmarks: vec![5.0, 65.4, 3725.0],
        }
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "00:00");
        assert_eq!(format_time(65.9), "01:05");
        assert_eq!(format_time(3725.0), "62:05");
        assert_eq!(format_time(f64::NAN), "00:00");
        assert_eq!(format_time(-3.0), "00:00");
    }

    #[test]
    fn test_playlist_highlights_active() {
        let rows = PlaylistView::render(&snapshot());
        assert_eq!(rows.len(), 2);
        assert!(!rows[0].is_active);
        assert!(rows[1].is_active);
        assert_eq!(rows[0].poster.as_deref(), Some("/images/1.jpg"));
    }

    #[test]
    fn test_playlist_select() {
        let state = snapshot();
        assert_eq!(
            PlaylistView::select(&state, 0),
            Some(Command::SelectVideo(VideoId::from(1)))
        );
        assert_eq!(PlaylistView::select(&state, 5), None);
    }

    #[test]
    fn test_bookmark_rows() {
        let rows = BookmarkView::render(&snapshot());
        assert_eq!(rows[0].label, "Bookmark 1");
        assert_eq!(rows[1].timestamp, "01:05");
        assert_eq!(rows[2].timestamp, "62:05");
        assert_eq!(BookmarkView::select(&snapshot(), 2), Some(Command::JumpToBookmark(2)));
        assert_eq!(BookmarkView::select(&snapshot(), 3), None);
    }
}
