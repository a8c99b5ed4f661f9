//! Player facade
//!
//! [`Player`] owns the state store, the media binding, the controls and the
//! theme preference. Hosts feed it commands, key presses, media events and
//! recorded data; everything else happens inside.

use crate::binding::MediaBinding;
use crate::config::PlayerConfig;
use crate::controls::{Command, CommandOutcome, Controls};
use crate::keys::{KeyEvent, Shortcuts};
use crate::media::{ListenerId, MediaElement, MediaEvent, StreamingEngine};
use crate::state::PlayerStore;
use crate::storage::{KeyValueStore, Persistence};
use crate::theme::{Theme, ThemeToggle};
use crate::types::{PlayerSnapshot, Video};
use crate::views::{BookmarkEntry, BookmarkView, PlaylistEntry, PlaylistView};
use crate::Result;
use bytes::Bytes;
use tokio::sync::watch;
use tracing::{debug, info};

/// Result of a handled key press
#[derive(Debug, Clone, PartialEq)]
pub struct KeyResponse {
    /// The host should suppress the browser default for this key
    pub prevent_default: bool,
    pub outcome: CommandOutcome,
}

/// A complete player bound to one media element
pub struct Player<M, E>
where
    M: MediaElement,
    E: StreamingEngine<Media = M>,
{
    config: PlayerConfig,
    store: PlayerStore,
    binding: MediaBinding<M, E>,
    controls: Controls,
    shortcuts: Shortcuts,
    theme: ThemeToggle,
}

impl<M, E> Player<M, E>
where
    M: MediaElement,
    E: StreamingEngine<Media = M>,
{
    /// Build a player positioned on the first playlist entry and load it
    pub fn new(
        config: PlayerConfig,
        playlist: Vec<Video>,
        backend: Box<dyn KeyValueStore>,
        media: M,
        engine: E,
    ) -> Result<Self> {
        config.validate()?;

        let persistence = Persistence::new(backend, config.storage_namespace.clone());
        let theme = ThemeToggle::load(&persistence);
        let mut store = PlayerStore::new(&config, playlist, persistence)?;
        let mut binding = MediaBinding::new(media, engine, config.stream_extensions.clone());
        binding.sync(&mut store)?;

        info!(
            videos = store.state().playlist.len(),
            first = %store.current_id(),
            theme = %theme.theme(),
            "Player ready"
        );

        Ok(Self {
            controls: Controls::new(&config),
            shortcuts: Shortcuts::new(&config),
            config,
            store,
            binding,
            theme,
        })
    }

    /// Execute a command, then bring the media element in line
    pub fn dispatch(&mut self, command: Command) -> Result<CommandOutcome> {
        let outcome = self
            .controls
            .execute(command, &mut self.store, &mut self.binding)?;
        self.binding.sync(&mut self.store)?;
        Ok(outcome)
    }

    /// Resolve a key press to its shortcut and run it. Unbound keys and
    /// keys typed into text inputs return `None`.
    pub fn handle_key(&mut self, event: &KeyEvent) -> Result<Option<KeyResponse>> {
        let Some(action) = self.shortcuts.resolve(event) else {
            return Ok(None);
        };
        debug!(key = ?event.key, command = ?action.command, "Shortcut");
        let outcome = self.dispatch(action.command)?;
        Ok(Some(KeyResponse {
            prevent_default: action.prevent_default,
            outcome,
        }))
    }

    pub fn handle_media_event(&mut self, listener: ListenerId, event: MediaEvent) -> Result<()> {
        self.binding.handle_event(&mut self.store, listener, event)
    }

    /// Recorded data delivered by the host's recorder
    pub fn handle_recording_data(&mut self, chunk: Bytes) {
        self.controls.push_recording_chunk(chunk);
    }

    pub fn state(&self) -> &PlayerSnapshot {
        self.store.state()
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlayerSnapshot> {
        self.store.subscribe()
    }

    pub fn playlist_view(&self) -> Vec<PlaylistEntry> {
        PlaylistView::render(self.store.state())
    }

    pub fn bookmark_view(&self) -> Vec<BookmarkEntry> {
        BookmarkView::render(self.store.state())
    }

    /// Click on playlist row `index`
    pub fn select_playlist_entry(&mut self, index: usize) -> Result<CommandOutcome> {
        match PlaylistView::select(self.store.state(), index) {
            Some(command) => self.dispatch(command),
            None => Ok(CommandOutcome::Ignored),
        }
    }

    /// Click on bookmark row `index`
    pub fn select_bookmark(&mut self, index: usize) -> Result<CommandOutcome> {
        match BookmarkView::select(self.store.state(), index) {
            Some(command) => self.dispatch(command),
            None => Ok(CommandOutcome::Ignored),
        }
    }

    pub fn set_playlist(&mut self, playlist: Vec<Video>) -> Result<()> {
        self.store.set_playlist(playlist)?;
        self.binding.sync(&mut self.store)
    }

    pub fn theme(&self) -> Theme {
        self.theme.theme()
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme.toggle(self.store.persistence_mut())
    }

    pub fn is_recording(&self) -> bool {
        self.controls.is_recording()
    }

    pub fn playback_rates(&self) -> &[f64] {
        self.controls.playback_rates()
    }

    pub fn store(&self) -> &PlayerStore {
        &self.store
    }

    pub fn binding(&self) -> &MediaBinding<M, E> {
        &self.binding
    }

    pub fn media(&self) -> &M {
        self.binding.media()
    }

    pub fn media_mut(&mut self) -> &mut M {
        self.binding.media_mut()
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }
}

impl<M, E> std::fmt::Debug for Player<M, E>
where
    M: MediaElement,
    E: StreamingEngine<Media = M>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("store", &self.store)
            .field("binding", &self.binding)
            .field("theme", &self.theme)
            .finish_non_exhaustive()
    }
}
