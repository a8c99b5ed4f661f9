//! Media binding - keeps one media element in step with the player state
//!
//! Coordinates:
//! - Source loading (direct assignment or adaptive stream)
//! - Teardown of the previous load's streaming session and listeners
//! - Play/pause, volume/mute and rate sync rules
//! - Media events: time updates, metadata, end of media
//! - Position restore, once per load
//!
//! The binding owns the list of listeners it registered. Every load tears
//! the whole list down before registering new ones, and events arriving
//! for a listener that is no longer on the list are dropped, so a late
//! callback from the previous video can never write into the current one.

use crate::media::{
    ListenerId, MediaElement, MediaEvent, MediaEventKind, StreamSession, StreamingEngine,
};
use crate::source::{classify, SourceKind};
use crate::state::PlayerStore;
use crate::types::VideoId;
use crate::Result;
use tracing::{debug, info, instrument, warn};

/// A listener registered for one load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    pub id: ListenerId,
    pub kind: MediaEventKind,
    /// Load generation the listener belongs to
    pub generation: u64,
}

/// Values last pushed to the element by each sync rule
#[derive(Debug, Default, Clone, Copy)]
struct Applied {
    playing: Option<bool>,
    volume: Option<f64>,
    rate: Option<f64>,
}

const ELEMENT_EVENTS: [MediaEventKind; 3] = [
    MediaEventKind::TimeUpdate,
    MediaEventKind::LoadedMetadata,
    MediaEventKind::Ended,
];

/// Binds a [`PlayerStore`] to a media element
pub struct MediaBinding<M, E>
where
    M: MediaElement,
    E: StreamingEngine<Media = M>,
{
    media: M,
    engine: E,
    stream_extensions: Vec<String>,
    stream: Option<E::Session>,
    subscriptions: Vec<Subscription>,
    next_listener: u64,
    loaded_generation: Option<u64>,
    loaded_video: Option<VideoId>,
    restored: bool,
    applied: Applied,
}

impl<M, E> MediaBinding<M, E>
where
    M: MediaElement,
    E: StreamingEngine<Media = M>,
{
    pub fn new(media: M, engine: E, stream_extensions: Vec<String>) -> Self {
        Self {
            media,
            engine,
            stream_extensions,
            stream: None,
            subscriptions: Vec::new(),
            next_listener: 1,
            loaded_generation: None,
            loaded_video: None,
            restored: false,
            applied: Applied::default(),
        }
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    pub fn media_mut(&mut self) -> &mut M {
        &mut self.media
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Listeners registered for the current load
    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    pub fn has_stream_session(&self) -> bool {
        self.stream.is_some()
    }

    pub fn loaded_video(&self) -> Option<&VideoId> {
        self.loaded_video.as_ref()
    }

    /// Reload if the current video changed, then re-apply every sync rule
    /// whose dependency moved since it last ran
    pub fn sync(&mut self, store: &mut PlayerStore) -> Result<()> {
        if self.loaded_generation != Some(store.load_generation()) {
            self.load(store)?;
        }

        let state = store.state();

        if self.applied.playing != Some(state.is_playing) {
            let result = if state.is_playing {
                self.media.play()
            } else {
                self.media.pause()
            };
            if let Err(e) = result {
                warn!(playing = state.is_playing, error = %e, "Media element rejected transport change");
            }
            debug!(playing = state.is_playing, "Applied transport");
            self.applied.playing = Some(state.is_playing);
        }

        let volume = state.effective_volume();
        if self.applied.volume != Some(volume) {
            self.media.set_volume(volume);
            debug!(volume, muted = state.is_muted, "Applied volume");
            self.applied.volume = Some(volume);
        }

        if self.applied.rate != Some(state.playback_rate) {
            self.media.set_playback_rate(state.playback_rate);
            debug!(rate = state.playback_rate, "Applied playback rate");
            self.applied.rate = Some(state.playback_rate);
        }

        Ok(())
    }

    /// Route a media event. Events for detached listeners are dropped.
    pub fn handle_event(
        &mut self,
        store: &mut PlayerStore,
        listener: ListenerId,
        event: MediaEvent,
    ) -> Result<()> {
        let Some(subscription) = self
            .subscriptions
            .iter()
            .find(|s| s.id == listener)
            .copied()
        else {
            debug!(%listener, ?event, "Dropping event from detached listener");
            return Ok(());
        };

        if subscription.kind != event.kind() {
            debug!(%listener, expected = ?subscription.kind, ?event, "Dropping mismatched event");
            return Ok(());
        }

        match event {
            MediaEvent::TimeUpdate { position } => {
                store.set_current_time(position);
            }
            MediaEvent::LoadedMetadata { duration } => {
                store.set_duration(duration);
                if !self.restored {
                    self.restored = true;
                    self.restore_position(store);
                }
            }
            MediaEvent::ManifestParsed => {
                if store.state().is_playing {
                    if let Err(e) = self.media.play() {
                        warn!(error = %e, "Media element refused to start after manifest");
                    }
                }
            }
            MediaEvent::Ended => {
                store.mark_finished();
                let next = store.advance()?;
                store.set_is_playing(true);
                info!(next = %next, "Auto-advanced to next video");
            }
        }

        self.sync(store)
    }

    /// Seek the element, then mirror the position into the store.
    /// Returns the position actually applied.
    pub fn seek(&mut self, store: &mut PlayerStore, position: f64) -> f64 {
        if !position.is_finite() {
            return store.state().current_time;
        }
        let mut target = position.max(0.0);
        if let Some(duration) = store.state().known_duration() {
            target = target.min(duration);
        }
        self.media.set_current_time(target);
        store.set_current_time(target);
        debug!(target, "Seeked");
        target
    }

    #[instrument(skip(self, store), fields(generation = store.load_generation()))]
    fn load(&mut self, store: &PlayerStore) -> Result<()> {
        self.teardown();

        let generation = store.load_generation();
        let video = store.state().current_video.clone();

        for kind in ELEMENT_EVENTS {
            let id = self.allocate_listener();
            self.media.subscribe(id, kind)?;
            self.subscriptions.push(Subscription { id, kind, generation });
        }

        self.media.set_poster(video.poster.as_deref());
        self.media.set_subtitle_source(video.subtitle_track.as_deref());

        match classify(&video.source, &self.stream_extensions) {
            SourceKind::AdaptiveStream if self.engine.is_supported() => {
                let id = self.allocate_listener();
                match self.engine.start(&mut self.media, &video.source, id) {
                    Ok(session) => {
                        info!(video = %video.id, session = %session.id(), source = %video.source, "Loaded adaptive stream");
                        self.subscriptions.push(Subscription {
                            id,
                            kind: MediaEventKind::ManifestParsed,
                            generation,
                        });
                        self.stream = Some(session);
                    }
                    Err(e) => {
                        warn!(video = %video.id, error = %e, "Streaming engine failed; assigning source directly");
                        self.media.set_source(&video.source);
                    }
                }
            }
            SourceKind::AdaptiveStream if self.media.can_play_manifest() => {
                info!(video = %video.id, source = %video.source, "Loaded manifest natively");
                self.media.set_source(&video.source);
            }
            SourceKind::AdaptiveStream => {
                warn!(video = %video.id, source = %video.source, "No adaptive streaming support; assigning source directly");
                self.media.set_source(&video.source);
            }
            SourceKind::Direct => {
                info!(video = %video.id, source = %video.source, "Loaded source");
                self.media.set_source(&video.source);
            }
        }

        self.loaded_generation = Some(generation);
        self.loaded_video = Some(video.id);
        self.restored = false;
        self.applied = Applied::default();
        Ok(())
    }

    /// Discard the streaming session and every listener of the last load
    fn teardown(&mut self) {
        if let Some(session) = self.stream.take() {
            debug!(session = %session.id(), "Destroying streaming session");
            session.destroy();
        }

        for subscription in self.subscriptions.drain(..) {
            // manifest listeners live on the engine and die with the session
            if subscription.kind != MediaEventKind::ManifestParsed {
                self.media.unsubscribe(subscription.id);
            }
        }

        if self.loaded_generation.is_some() {
            self.media.clear_source();
        }
    }

    fn restore_position(&mut self, store: &mut PlayerStore) {
        let Some(saved) = store.resume_position() else {
            return;
        };
        // live streams report no usable duration and start at the live edge
        let duration = store.state().duration;
        if saved > 0.0 && saved < duration {
            self.media.set_current_time(saved);
            store.set_current_time(saved);
            info!(video = %store.current_id(), position = saved, "Restored playback position");
        }
    }

    fn allocate_listener(&mut self) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        id
    }
}

impl<M, E> Drop for MediaBinding<M, E>
where
    M: MediaElement,
    E: StreamingEngine<Media = M>,
{
    fn drop(&mut self) {
        if let Some(session) = self.stream.take() {
            session.destroy();
        }
    }
}

impl<M, E> std::fmt::Debug for MediaBinding<M, E>
where
    M: MediaElement,
    E: StreamingEngine<Media = M>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaBinding")
            .field("subscriptions", &self.subscriptions)
            .field("loaded_generation", &self.loaded_generation)
            .field("loaded_video", &self.loaded_video)
            .field("has_stream_session", &self.stream.is_some())
            .finish_non_exhaustive()
    }
}
