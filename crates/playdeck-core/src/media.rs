//! Host media seams
//!
//! The binding drives one [`MediaElement`] and, for manifest sources, one
//! [`StreamingEngine`]. Hosts implement these over the browser media element
//! and hls.js (see `playdeck-wasm`) or over the headless simulator.
//!
//! Optional capabilities (fullscreen, picture-in-picture, frame capture,
//! recording) have default implementations returning
//! [`Error::Unsupported`]; commands that hit them degrade to a no-op.

use crate::recording::{CaptureSink, RecordingContainer};
use crate::snapshot::VideoFrame;
use crate::types::SessionId;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// Listener registration handle, allocated by the binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListenerId(pub u64);

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Media-originated event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaEventKind {
    TimeUpdate,
    LoadedMetadata,
    Ended,
    /// Raised by the streaming engine, not the element
    ManifestParsed,
}

impl MediaEventKind {
    /// DOM event name for element events
    pub fn dom_name(&self) -> &'static str {
        match self {
            MediaEventKind::TimeUpdate => "timeupdate",
            MediaEventKind::LoadedMetadata => "loadedmetadata",
            MediaEventKind::Ended => "ended",
            MediaEventKind::ManifestParsed => "hlsManifestParsed",
        }
    }
}

/// Media-originated events
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MediaEvent {
    TimeUpdate { position: f64 },
    LoadedMetadata { duration: f64 },
    Ended,
    ManifestParsed,
}

impl MediaEvent {
    pub fn kind(&self) -> MediaEventKind {
        match self {
            MediaEvent::TimeUpdate { .. } => MediaEventKind::TimeUpdate,
            MediaEvent::LoadedMetadata { .. } => MediaEventKind::LoadedMetadata,
            MediaEvent::Ended => MediaEventKind::Ended,
            MediaEvent::ManifestParsed => MediaEventKind::ManifestParsed,
        }
    }
}

/// Text track display mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackMode {
    Showing,
    Hidden,
    Disabled,
}

/// Text track as exposed by the element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextTrackInfo {
    /// BCP-47 language tag
    pub language: String,
    pub label: String,
    pub mode: TrackMode,
}

impl TextTrackInfo {
    pub fn new(language: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            label: label.into(),
            mode: TrackMode::Disabled,
        }
    }
}

/// A single playable media element
pub trait MediaElement {
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self) -> Result<()>;
    fn set_volume(&mut self, volume: f64);
    fn set_playback_rate(&mut self, rate: f64);
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, position: f64);

    /// Assign a directly playable source
    fn set_source(&mut self, uri: &str);

    /// Detach the current source
    fn clear_source(&mut self);

    /// Caption resource for the current source, if any
    fn set_subtitle_source(&mut self, _uri: Option<&str>) {}

    /// Image shown before playback starts
    fn set_poster(&mut self, _uri: Option<&str>) {}

    /// Whether the element plays manifests natively (Safari-style)
    fn can_play_manifest(&self) -> bool {
        false
    }

    /// Route events of `kind` to `id` until unsubscribed
    fn subscribe(&mut self, id: ListenerId, kind: MediaEventKind) -> Result<()>;

    fn unsubscribe(&mut self, id: ListenerId);

    fn text_tracks(&self) -> Vec<TextTrackInfo> {
        Vec::new()
    }

    fn set_text_track_mode(&mut self, _index: usize, _mode: TrackMode) {}

    fn capture_frame(&self) -> Result<VideoFrame> {
        Err(Error::Unsupported("frame capture"))
    }

    /// Request fullscreen on the element's container
    fn request_fullscreen(&mut self) -> Result<()> {
        Err(Error::Unsupported("fullscreen"))
    }

    fn exit_fullscreen(&mut self) -> Result<()> {
        Err(Error::Unsupported("fullscreen"))
    }

    fn is_picture_in_picture(&self) -> bool {
        false
    }

    fn request_picture_in_picture(&mut self) -> Result<()> {
        Err(Error::Unsupported("picture-in-picture"))
    }

    fn exit_picture_in_picture(&mut self) -> Result<()> {
        Err(Error::Unsupported("picture-in-picture"))
    }

    /// Begin capturing the element's output
    fn start_capture(&mut self, _container: RecordingContainer) -> Result<Box<dyn CaptureSink>> {
        Err(Error::Unsupported("recording"))
    }
}

/// Adaptive-streaming client attached to a media element
pub trait StreamingEngine {
    type Media: MediaElement;
    type Session: StreamSession;

    fn is_supported(&self) -> bool;

    /// Load `source` into `media`. The engine raises
    /// [`MediaEvent::ManifestParsed`] for `manifest_listener`.
    fn start(
        &mut self,
        media: &mut Self::Media,
        source: &str,
        manifest_listener: ListenerId,
    ) -> Result<Self::Session>;
}

/// One live streaming session; destroyed exactly once
pub trait StreamSession {
    fn id(&self) -> SessionId;
    fn destroy(self);
}

/// Engine for hosts without adaptive-streaming support
#[derive(Debug)]
pub struct NoStreaming<M>(PhantomData<M>);

impl<M> NoStreaming<M> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<M> Default for NoStreaming<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Session type of [`NoStreaming`]; never constructed
#[derive(Debug)]
pub enum NoSession {}

impl StreamSession for NoSession {
    fn id(&self) -> SessionId {
        match *self {}
    }

    fn destroy(self) {
        match self {}
    }
}

impl<M: MediaElement> StreamingEngine for NoStreaming<M> {
    type Media = M;
    type Session = NoSession;

    fn is_supported(&self) -> bool {
        false
    }

    fn start(&mut self, _media: &mut M, _source: &str, _listener: ListenerId) -> Result<NoSession> {
        Err(Error::Unsupported("adaptive streaming"))
    }
}
