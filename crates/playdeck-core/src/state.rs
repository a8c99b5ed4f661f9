//! Shared player state
//!
//! [`PlayerStore`] is the single writer of the player state. Other
//! components read [`PlayerSnapshot`]s, either borrowed through
//! [`PlayerStore::state`] or pushed over a `watch` channel, and request
//! changes through the `set_*` operations below.
//!
//! Every operation is a synchronous in-memory update. Playback position and
//! bookmarks are then written through the persistence adapter under the
//! active video id.

use crate::config::PlayerConfig;
use crate::storage::Persistence;
use crate::types::{clamp_volume, PlayerSnapshot, SubtitleSelection, Video, VideoId};
use crate::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

/// Per-video bookmark lists, in creation order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookmarkStore {
    entries: HashMap<VideoId, Vec<f64>>,
}

impl BookmarkStore {
    pub fn get(&self, id: &VideoId) -> &[f64] {
        self.entries.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn replace(&mut self, id: &VideoId, bookmarks: Vec<f64>) {
        self.entries.insert(id.clone(), bookmarks);
    }

    fn push(&mut self, id: &VideoId, position: f64) -> usize {
        let list = self.entries.entry(id.clone()).or_default();
        list.push(position);
        list.len() - 1
    }
}

/// Last known playback position per video
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackHistory {
    positions: HashMap<VideoId, f64>,
}

impl PlaybackHistory {
    pub fn get(&self, id: &VideoId) -> Option<f64> {
        self.positions.get(id).copied()
    }

    fn record(&mut self, id: &VideoId, position: f64) {
        self.positions.insert(id.clone(), position);
    }

    fn forget(&mut self, id: &VideoId) {
        self.positions.remove(id);
    }
}

/// Owner of the player state
pub struct PlayerStore {
    state: PlayerSnapshot,
    persistence: Persistence,
    bookmarks: BookmarkStore,
    history: PlaybackHistory,
    generation: u64,
    tx: watch::Sender<PlayerSnapshot>,
}

impl PlayerStore {
    /// Create a store positioned on the first playlist entry
    pub fn new(config: &PlayerConfig, playlist: Vec<Video>, persistence: Persistence) -> Result<Self> {
        validate_playlist(&playlist)?;
        let playlist: Arc<[Video]> = playlist.into();
        let current_video = playlist[0].clone();

        let state = PlayerSnapshot {
            playlist,
            current_index: 0,
            current_video,
            is_playing: false,
            volume: clamp_volume(config.initial_volume),
            is_muted: false,
            playback_rate: 1.0,
            current_time: 0.0,
            duration: 0.0,
            is_full_screen: false,
            selected_subtitle: SubtitleSelection::Off,
            bookmarks: Vec::new(),
        };
        let (tx, _) = watch::channel(state.clone());

        let mut store = Self {
            state,
            persistence,
            bookmarks: BookmarkStore::default(),
            history: PlaybackHistory::default(),
            generation: 1,
            tx,
        };
        store.load_video_records();
        store.publish();
        Ok(store)
    }

    /// Current state, borrowed
    pub fn state(&self) -> &PlayerSnapshot {
        &self.state
    }

    /// Current state, owned
    pub fn snapshot(&self) -> PlayerSnapshot {
        self.state.clone()
    }

    /// Receive a snapshot after every mutation
    pub fn subscribe(&self) -> watch::Receiver<PlayerSnapshot> {
        self.tx.subscribe()
    }

    /// Bumped by every `set_current_video`; the binding reloads when it
    /// differs from the generation it last loaded
    pub fn load_generation(&self) -> u64 {
        self.generation
    }

    pub fn current_id(&self) -> &VideoId {
        &self.state.current_video.id
    }

    /// Saved position for the current video, loaded on the last switch
    pub fn resume_position(&self) -> Option<f64> {
        self.history.get(self.current_id())
    }

    pub fn history(&self) -> &PlaybackHistory {
        &self.history
    }

    pub fn bookmarks(&self) -> &BookmarkStore {
        &self.bookmarks
    }

    pub fn persistence(&self) -> &Persistence {
        &self.persistence
    }

    pub fn persistence_mut(&mut self) -> &mut Persistence {
        &mut self.persistence
    }

    pub fn index_of(&self, id: &VideoId) -> Option<usize> {
        self.state.playlist.iter().position(|v| &v.id == id)
    }

    /// Switch to `id`, loading its saved records and resetting position
    pub fn set_current_video(&mut self, id: &VideoId) -> Result<()> {
        let index = self
            .index_of(id)
            .ok_or_else(|| Error::UnknownVideo { id: id.to_string() })?;

        self.state.current_index = index;
        self.state.current_video = self.state.playlist[index].clone();
        self.state.current_time = 0.0;
        self.state.duration = 0.0;
        self.generation += 1;
        self.load_video_records();

        info!(
            video = %id,
            index,
            generation = self.generation,
            resume = ?self.resume_position(),
            "Current video changed"
        );
        self.publish();
        Ok(())
    }

    /// Replace the playlist. The current video is kept while its id is
    /// still present; it reloads only if its source changed. Otherwise the
    /// first entry becomes current.
    pub fn set_playlist(&mut self, playlist: Vec<Video>) -> Result<()> {
        validate_playlist(&playlist)?;
        let current = self.state.current_video.clone();
        self.state.playlist = playlist.into();

        let Some(index) = self.index_of(&current.id) else {
            let first = self.state.playlist[0].id.clone();
            return self.set_current_video(&first);
        };

        if self.state.playlist[index].source != current.source {
            info!(video = %current.id, "Source of current video replaced");
            return self.set_current_video(&current.id);
        }

        self.state.current_index = index;
        self.state.current_video = self.state.playlist[index].clone();
        debug!(len = self.state.playlist.len(), index, "Playlist replaced");
        self.publish();
        Ok(())
    }

    /// Move to the next entry, wrapping after the last
    pub fn advance(&mut self) -> Result<VideoId> {
        let next = (self.state.current_index + 1) % self.state.playlist.len();
        let id = self.state.playlist[next].id.clone();
        self.set_current_video(&id)?;
        Ok(id)
    }

    pub fn set_is_playing(&mut self, is_playing: bool) {
        if self.state.is_playing != is_playing {
            self.state.is_playing = is_playing;
            self.publish();
        }
    }

    /// Set the stored volume, clamped to [0, 1]
    pub fn set_volume(&mut self, volume: f64) {
        let volume = clamp_volume(volume);
        if self.state.volume != volume {
            self.state.volume = volume;
            self.publish();
        }
    }

    pub fn set_is_muted(&mut self, is_muted: bool) {
        if self.state.is_muted != is_muted {
            self.state.is_muted = is_muted;
            self.publish();
        }
    }

    pub fn set_playback_rate(&mut self, rate: f64) -> Result<()> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(Error::InvalidPlaybackRate { rate });
        }
        if self.state.playback_rate != rate {
            self.state.playback_rate = rate;
            self.publish();
        }
        Ok(())
    }

    /// Record the playback position. Non-finite positions are ignored; once
    /// the duration is known the position never exceeds it.
    pub fn set_current_time(&mut self, position: f64) {
        if !position.is_finite() {
            debug!(position, "Ignoring non-finite position");
            return;
        }
        let mut position = position.max(0.0);
        if self.state.duration > 0.0 {
            position = position.min(self.state.duration);
        }
        self.state.current_time = position;
        self.persist_position();
        self.publish();
    }

    /// Record the media duration; unknown or unbounded durations store 0
    pub fn set_duration(&mut self, duration: f64) {
        let duration = if duration.is_finite() && duration > 0.0 {
            duration
        } else {
            0.0
        };
        self.state.duration = duration;
        if duration > 0.0 && self.state.current_time > duration {
            self.state.current_time = duration;
        }
        self.persist_position();
        self.publish();
    }

    /// Replace the current video's bookmarks
    pub fn set_bookmarks(&mut self, bookmarks: Vec<f64>) {
        let bookmarks: Vec<f64> = bookmarks
            .into_iter()
            .filter(|t| t.is_finite() && *t >= 0.0)
            .collect();
        let id = self.state.current_video.id.clone();
        self.bookmarks.replace(&id, bookmarks.clone());
        self.persistence.save_bookmarks(&id, &bookmarks);
        self.state.bookmarks = bookmarks;
        self.publish();
    }

    /// Append a bookmark to the current video's list; returns its index
    pub fn add_bookmark(&mut self, position: f64) -> Option<usize> {
        if !position.is_finite() || position < 0.0 {
            return None;
        }
        let id = self.state.current_video.id.clone();
        let index = self.bookmarks.push(&id, position);
        self.state.bookmarks = self.bookmarks.get(&id).to_vec();
        self.persistence.save_bookmarks(&id, &self.state.bookmarks);
        debug!(video = %id, index, position, "Bookmark added");
        self.publish();
        Some(index)
    }

    pub fn set_selected_subtitle(&mut self, selection: SubtitleSelection) {
        if self.state.selected_subtitle != selection {
            self.state.selected_subtitle = selection;
            self.publish();
        }
    }

    pub fn set_is_full_screen(&mut self, is_full_screen: bool) {
        if self.state.is_full_screen != is_full_screen {
            self.state.is_full_screen = is_full_screen;
            self.publish();
        }
    }

    /// The current video played to its end: the next visit starts over
    pub fn mark_finished(&mut self) {
        let id = self.state.current_video.id.clone();
        self.history.record(&id, 0.0);
        self.persistence.save_history(&id, 0.0);
        debug!(video = %id, "Video finished");
    }

    fn persist_position(&mut self) {
        let position = self.state.current_time;
        if position > 0.0 && position < self.state.duration {
            let id = self.state.current_video.id.clone();
            self.history.record(&id, position);
            self.persistence.save_history(&id, position);
        }
    }

    fn load_video_records(&mut self) {
        let id = self.state.current_video.id.clone();

        let bookmarks = self.persistence.load_bookmarks(&id);
        self.bookmarks.replace(&id, bookmarks.clone());
        self.state.bookmarks = bookmarks;

        match self.persistence.load_history(&id) {
            Some(position) => self.history.record(&id, position),
            None => self.history.forget(&id),
        }
    }

    fn publish(&self) {
        self.tx.send_replace(self.state.clone());
    }
}

impl std::fmt::Debug for PlayerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerStore")
            .field("state", &self.state)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

fn validate_playlist(playlist: &[Video]) -> Result<()> {
    if playlist.is_empty() {
        return Err(Error::EmptyPlaylist);
    }
    let mut seen = HashSet::new();
    for video in playlist {
        if !seen.insert(&video.id) {
            return Err(Error::DuplicateVideo {
                id: video.id.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn playlist() -> Vec<Video> {
        vec![
            Video::new(1, "Sample Video 1", "/videos/sample1.mp4"),
            Video::new(2, "Sample Video 2", "/videos/sample2.mp4"),
            Video::new(3, "Live", "https://cdn.example.com/live/master.m3u8"),
        ]
    }

    fn store_with(backend: &MemoryStore) -> PlayerStore {
        let persistence = Persistence::new(Box::new(backend.clone()), "video");
        PlayerStore::new(&PlayerConfig::default(), playlist(), persistence).unwrap()
    }

    #[test]
    fn test_store_creation() {
        let store = store_with(&MemoryStore::new());
        let state = store.state();
        assert_eq!(state.current_video.id, VideoId::from(1));
        assert!(!state.is_playing);
        assert_eq!(state.volume, 1.0);
        assert_eq!(state.playback_rate, 1.0);
        assert_eq!(state.selected_subtitle, SubtitleSelection::Off);
        assert_eq!(store.load_generation(), 1);
    }

    #[test]
    fn test_empty_and_duplicate_playlists_rejected() {
        let persistence = Persistence::new(Box::new(MemoryStore::new()), "video");
        assert!(matches!(
            PlayerStore::new(&PlayerConfig::default(), Vec::new(), persistence),
            Err(Error::EmptyPlaylist)
        ));

        let persistence = Persistence::new(Box::new(MemoryStore::new()), "video");
        let dup = vec![Video::new(1, "a", "a.mp4"), Video::new(1, "b", "b.mp4")];
        assert!(matches!(
            PlayerStore::new(&PlayerConfig::default(), dup, persistence),
            Err(Error::DuplicateVideo { .. })
        ));
    }

    #[test]
    fn test_volume_is_clamped() {
        let mut store = store_with(&MemoryStore::new());
        store.set_volume(3.0);
        assert_eq!(store.state().volume, 1.0);
        store.set_volume(-1.0);
        assert_eq!(store.state().volume, 0.0);
    }

    #[test]
    fn test_effective_volume_zero_when_muted() {
        let mut store = store_with(&MemoryStore::new());
        store.set_volume(0.7);
        store.set_is_muted(true);
        assert_eq!(store.state().effective_volume(), 0.0);
        assert_eq!(store.state().volume, 0.7);
        store.set_is_muted(false);
        assert_eq!(store.state().effective_volume(), 0.7);
    }

    #[test]
    fn test_invalid_playback_rate() {
        let mut store = store_with(&MemoryStore::new());
        assert!(store.set_playback_rate(0.0).is_err());
        assert!(store.set_playback_rate(f64::NAN).is_err());
        assert!(store.set_playback_rate(1.5).is_ok());
        assert_eq!(store.state().playback_rate, 1.5);
    }

    #[test]
    fn test_position_persisted_only_within_duration() {
        let backend = MemoryStore::new();
        let mut store = store_with(&backend);

        store.set_current_time(5.0);
        assert_eq!(backend.raw("video-1-history"), None);

        store.set_duration(120.0);
        assert_eq!(backend.raw("video-1-history").as_deref(), Some("5"));

        store.set_current_time(60.5);
        assert_eq!(backend.raw("video-1-history").as_deref(), Some("60.5"));

        store.set_current_time(500.0);
        assert_eq!(store.state().current_time, 120.0);
        assert_eq!(backend.raw("video-1-history").as_deref(), Some("60.5"));
    }

    #[test]
    fn test_duration_clamps_position() {
        let mut store = store_with(&MemoryStore::new());
        store.set_current_time(90.0);
        store.set_duration(30.0);
        assert_eq!(store.state().current_time, 30.0);
        store.set_duration(f64::INFINITY);
        assert_eq!(store.state().duration, 0.0);
    }

    #[test]
    fn test_switch_loads_records_and_resets_position() {
        let backend = MemoryStore::new();
        backend.insert_raw("video-2-history", "42");
        backend.insert_raw("video-2-bookmarks", "[10.0,20.0]");
        let mut store = store_with(&backend);
        store.set_duration(100.0);
        store.set_current_time(50.0);

        store.set_current_video(&VideoId::from(2)).unwrap();
        let state = store.state();
        assert_eq!(state.current_index, 1);
        assert_eq!(state.current_time, 0.0);
        assert_eq!(state.duration, 0.0);
        assert_eq!(state.bookmarks, vec![10.0, 20.0]);
        assert_eq!(store.resume_position(), Some(42.0));
        assert_eq!(store.load_generation(), 2);
    }

    #[test]
    fn test_unknown_video_rejected() {
        let mut store = store_with(&MemoryStore::new());
        assert!(matches!(
            store.set_current_video(&VideoId::from(99)),
            Err(Error::UnknownVideo { .. })
        ));
        assert_eq!(store.load_generation(), 1);
    }

    #[test]
    fn test_bookmarks_are_per_video() {
        let backend = MemoryStore::new();
        let mut store = store_with(&backend);
        store.add_bookmark(12.0);
        store.set_current_video(&VideoId::from(2)).unwrap();
        store.add_bookmark(7.5);
        store.add_bookmark(8.5);

        assert_eq!(backend.raw("video-1-bookmarks").as_deref(), Some("[12.0]"));
        assert_eq!(backend.raw("video-2-bookmarks").as_deref(), Some("[7.5,8.5]"));
        assert_eq!(store.bookmarks().get(&VideoId::from(1)), &[12.0]);
        assert_eq!(store.state().bookmarks, vec![7.5, 8.5]);
    }

    #[test]
    fn test_set_bookmarks_filters_invalid() {
        let mut store = store_with(&MemoryStore::new());
        store.set_bookmarks(vec![1.0, f64::NAN, -3.0, 4.0]);
        assert_eq!(store.state().bookmarks, vec![1.0, 4.0]);
        assert_eq!(store.add_bookmark(f64::INFINITY), None);
    }

    #[test]
    fn test_advance_wraps() {
        let mut store = store_with(&MemoryStore::new());
        store.set_current_video(&VideoId::from(3)).unwrap();
        let next = store.advance().unwrap();
        assert_eq!(next, VideoId::from(1));
        assert_eq!(store.state().current_index, 0);
    }

    #[test]
    fn test_set_playlist_keeps_current_when_present() {
        let mut store = store_with(&MemoryStore::new());
        store.set_current_video(&VideoId::from(2)).unwrap();
        let generation = store.load_generation();

        let mut reordered = playlist();
        reordered.reverse();
        store.set_playlist(reordered).unwrap();
        assert_eq!(store.state().current_video.id, VideoId::from(2));
        assert_eq!(store.state().current_index, 1);
        assert_eq!(store.load_generation(), generation);

        store
            .set_playlist(vec![Video::new(9, "Other", "/videos/other.mp4")])
            .unwrap();
        assert_eq!(store.state().current_video.id, VideoId::from(9));
        assert_eq!(store.load_generation(), generation + 1);
    }

    #[test]
    fn test_set_playlist_matches_current_by_id() {
        let mut store = store_with(&MemoryStore::new());
        store.set_current_video(&VideoId::from(2)).unwrap();
        store.set_duration(120.0);
        store.set_current_time(42.0);
        let generation = store.load_generation();

        let mut edited = playlist();
        edited[1].title = "Sample Video 2 (remastered)".to_string();
        edited[1].quality_labels = vec!["720p".to_string()];
        store.set_playlist(edited).unwrap();

        let state = store.state();
        assert_eq!(state.current_video.id, VideoId::from(2));
        assert_eq!(state.current_video.title, "Sample Video 2 (remastered)");
        assert_eq!(state.current_index, 1);
        assert_eq!(state.current_time, 42.0);
        assert_eq!(store.load_generation(), generation);
    }

    #[test]
    fn test_set_playlist_reloads_when_source_changes() {
        let mut store = store_with(&MemoryStore::new());
        store.set_current_video(&VideoId::from(2)).unwrap();
        let generation = store.load_generation();

        let mut edited = playlist();
        edited[1].source = "/videos/sample2-hd.mp4".to_string();
        store.set_playlist(edited).unwrap();

        assert_eq!(store.state().current_video.id, VideoId::from(2));
        assert_eq!(store.state().current_video.source, "/videos/sample2-hd.mp4");
        assert_eq!(store.load_generation(), generation + 1);
    }

    #[test]
    fn test_mark_finished_resets_saved_position() {
        let backend = MemoryStore::new();
        let mut store = store_with(&backend);
        store.set_duration(60.0);
        store.set_current_time(59.0);
        store.mark_finished();
        assert_eq!(backend.raw("video-1-history").as_deref(), Some("0"));
        assert_eq!(store.resume_position(), Some(0.0));
    }

    #[tokio::test]
    async fn test_subscribers_see_mutations() {
        let mut store = store_with(&MemoryStore::new());
        let mut rx = store.subscribe();
        assert!(!rx.borrow_and_update().is_playing);

        store.set_is_playing(true);
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_playing);
    }
}
