//! Headless media element and streaming engine
//!
//! A simulated host used by the CLI and by tests. [`HeadlessMedia`] keeps a
//! virtual clock that only moves when [`HeadlessMedia::advance`] is called,
//! and every call the binding makes is appended to a shared [`OpLog`] so
//! the exact order of loads, teardowns and sync rules can be inspected.
//!
//! Events are queued per listener and handed to the host with
//! [`HeadlessMedia::take_events`]. Queued events are not withdrawn when a
//! listener is removed; they stand in for callbacks already in flight.

use crate::media::{
    ListenerId, MediaElement, MediaEvent, MediaEventKind, StreamSession, StreamingEngine,
    TextTrackInfo, TrackMode,
};
use crate::player::Player;
use crate::recording::{CaptureSink, RecordingContainer};
use crate::snapshot::VideoFrame;
use crate::types::SessionId;
use crate::{Error, Result};
use bytes::Bytes;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use tracing::{debug, trace};

/// One call made on the headless host
#[derive(Debug, Clone, PartialEq)]
pub enum MediaOp {
    SetSource(String),
    ClearSource,
    SetSubtitleSource(Option<String>),
    Play,
    Pause,
    SetVolume(f64),
    SetPlaybackRate(f64),
    Seek(f64),
    Subscribe(ListenerId, MediaEventKind),
    Unsubscribe(ListenerId),
    SetTrackMode(usize, TrackMode),
    Fullscreen(bool),
    PictureInPicture(bool),
    CaptureStarted(RecordingContainer),
    CaptureStopped,
    /// A streaming session attached `source` to the element
    StreamStarted { session: SessionId, source: String },
    StreamDestroyed(SessionId),
}

/// Shared, append-only operation log
pub type OpLog = Rc<RefCell<Vec<MediaOp>>>;

/// Simulated media element
#[derive(Debug)]
pub struct HeadlessMedia {
    log: OpLog,
    durations: HashMap<String, f64>,
    default_duration: Option<f64>,
    source: Option<String>,
    duration: Option<f64>,
    metadata_pending: bool,
    position: f64,
    playing: bool,
    volume: f64,
    rate: f64,
    listeners: Vec<(ListenerId, MediaEventKind)>,
    pending: VecDeque<(ListenerId, MediaEvent)>,
    text_tracks: Vec<TextTrackInfo>,
    frame: Option<VideoFrame>,
    native_manifest: bool,
    fullscreen_supported: bool,
    fullscreen: bool,
    pip_supported: bool,
    pip: bool,
    capture_tail: Option<Vec<Bytes>>,
    capture_fails: bool,
}

impl Default for HeadlessMedia {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessMedia {
    /// An element with no optional capabilities
    pub fn new() -> Self {
        Self {
            log: Rc::new(RefCell::new(Vec::new())),
            durations: HashMap::new(),
            default_duration: None,
            source: None,
            duration: None,
            metadata_pending: false,
            position: 0.0,
            playing: false,
            volume: 1.0,
            rate: 1.0,
            listeners: Vec::new(),
            pending: VecDeque::new(),
            text_tracks: Vec::new(),
            frame: None,
            native_manifest: false,
            fullscreen_supported: false,
            fullscreen: false,
            pip_supported: false,
            pip: false,
            capture_tail: None,
            capture_fails: false,
        }
    }

    /// Record into an existing log, e.g. one shared with [`HeadlessStreaming`]
    pub fn with_log(mut self, log: OpLog) -> Self {
        self.log = log;
        self
    }

    /// Duration reported once `uri` is loaded
    pub fn with_duration(mut self, uri: impl Into<String>, seconds: f64) -> Self {
        self.durations.insert(uri.into(), seconds);
        self
    }

    /// Duration for sources without an explicit one
    pub fn with_default_duration(mut self, seconds: f64) -> Self {
        self.default_duration = Some(seconds);
        self
    }

    pub fn with_text_tracks(mut self, tracks: Vec<TextTrackInfo>) -> Self {
        self.text_tracks = tracks;
        self
    }

    /// Frame returned by frame capture
    pub fn with_frame(mut self, frame: VideoFrame) -> Self {
        self.frame = Some(frame);
        self
    }

    /// Play manifests without a streaming engine
    pub fn with_native_manifest(mut self) -> Self {
        self.native_manifest = true;
        self
    }

    pub fn with_fullscreen(mut self) -> Self {
        self.fullscreen_supported = true;
        self
    }

    pub fn with_picture_in_picture(mut self) -> Self {
        self.pip_supported = true;
        self
    }

    /// Enable recording; `tail` is flushed by the sink when it stops
    pub fn with_capture(mut self, tail: Vec<Bytes>) -> Self {
        self.capture_tail = Some(tail);
        self
    }

    /// Enable recording with a sink whose stop fails
    pub fn with_failing_capture(mut self) -> Self {
        self.capture_tail = Some(Vec::new());
        self.capture_fails = true;
        self
    }

    pub fn log(&self) -> OpLog {
        Rc::clone(&self.log)
    }

    /// Copy of the operation log
    pub fn ops(&self) -> Vec<MediaOp> {
        self.log.borrow().clone()
    }

    pub fn clear_ops(&self) {
        self.log.borrow_mut().clear();
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn playback_rate(&self) -> f64 {
        self.rate
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Element listeners currently attached
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Move the clock forward by `dt` seconds of wall time.
    ///
    /// A freshly loaded source first reports its metadata and nothing else;
    /// playback starts counting from the following call. Reaching the end
    /// raises a final time update followed by `Ended` and pauses.
    pub fn advance(&mut self, dt: f64) {
        if self.source.is_none() {
            return;
        }

        if self.metadata_pending {
            self.metadata_pending = false;
            let duration = self.duration.unwrap_or(f64::INFINITY);
            self.emit(MediaEvent::LoadedMetadata { duration });
            return;
        }

        if !self.playing || !dt.is_finite() || dt <= 0.0 {
            return;
        }

        self.position += dt * self.rate;
        match self.duration {
            Some(duration) if self.position >= duration => {
                self.position = duration;
                self.emit(MediaEvent::TimeUpdate {
                    position: self.position,
                });
                self.playing = false;
                self.emit(MediaEvent::Ended);
            }
            _ => self.emit(MediaEvent::TimeUpdate {
                position: self.position,
            }),
        }
    }

    /// Queue `event` for one listener, bypassing element subscriptions
    pub fn push_event(&mut self, listener: ListenerId, event: MediaEvent) {
        self.pending.push_back((listener, event));
    }

    /// Drain queued events in delivery order
    pub fn take_events(&mut self) -> Vec<(ListenerId, MediaEvent)> {
        self.pending.drain(..).collect()
    }

    pub fn has_pending_events(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Attach a source on behalf of a streaming session
    pub fn load_stream(&mut self, source: &str) {
        self.attach(source);
    }

    fn attach(&mut self, source: &str) {
        self.source = Some(source.to_string());
        self.duration = self
            .durations
            .get(source)
            .copied()
            .or(self.default_duration);
        self.metadata_pending = true;
        self.position = 0.0;
    }

    fn emit(&mut self, event: MediaEvent) {
        let kind = event.kind();
        for (id, _) in self.listeners.iter().filter(|(_, k)| *k == kind) {
            trace!(listener = %id, ?event, "Queued media event");
            self.pending.push_back((*id, event));
        }
    }

    fn record(&self, op: MediaOp) {
        self.log.borrow_mut().push(op);
    }
}

impl MediaElement for HeadlessMedia {
    fn play(&mut self) -> Result<()> {
        self.record(MediaOp::Play);
        if self.source.is_none() {
            return Err(Error::Media("no source assigned".to_string()));
        }
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.record(MediaOp::Pause);
        self.playing = false;
        Ok(())
    }

    fn set_volume(&mut self, volume: f64) {
        self.record(MediaOp::SetVolume(volume));
        self.volume = volume;
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.record(MediaOp::SetPlaybackRate(rate));
        self.rate = rate;
    }

    fn current_time(&self) -> f64 {
        self.position
    }

    fn set_current_time(&mut self, position: f64) {
        self.record(MediaOp::Seek(position));
        self.position = match self.duration {
            Some(duration) => position.clamp(0.0, duration),
            None => position.max(0.0),
        };
    }

    fn set_source(&mut self, uri: &str) {
        self.record(MediaOp::SetSource(uri.to_string()));
        self.attach(uri);
    }

    fn clear_source(&mut self) {
        self.record(MediaOp::ClearSource);
        self.source = None;
        self.duration = None;
        self.metadata_pending = false;
        self.position = 0.0;
        self.playing = false;
    }

    fn set_subtitle_source(&mut self, uri: Option<&str>) {
        self.record(MediaOp::SetSubtitleSource(uri.map(str::to_string)));
    }

    fn can_play_manifest(&self) -> bool {
        self.native_manifest
    }

    fn subscribe(&mut self, id: ListenerId, kind: MediaEventKind) -> Result<()> {
        if self.listeners.iter().any(|(existing, _)| *existing == id) {
            return Err(Error::Media(format!("{} is already attached", id)));
        }
        self.record(MediaOp::Subscribe(id, kind));
        self.listeners.push((id, kind));
        Ok(())
    }

    fn unsubscribe(&mut self, id: ListenerId) {
        self.record(MediaOp::Unsubscribe(id));
        self.listeners.retain(|(existing, _)| *existing != id);
    }

    fn text_tracks(&self) -> Vec<TextTrackInfo> {
        self.text_tracks.clone()
    }

    fn set_text_track_mode(&mut self, index: usize, mode: TrackMode) {
        if let Some(track) = self.text_tracks.get_mut(index) {
            track.mode = mode;
            self.record(MediaOp::SetTrackMode(index, mode));
        }
    }

    fn capture_frame(&self) -> Result<VideoFrame> {
        self.frame.clone().ok_or(Error::Unsupported("frame capture"))
    }

    fn request_fullscreen(&mut self) -> Result<()> {
        if !self.fullscreen_supported {
            return Err(Error::Unsupported("fullscreen"));
        }
        self.record(MediaOp::Fullscreen(true));
        self.fullscreen = true;
        Ok(())
    }

    fn exit_fullscreen(&mut self) -> Result<()> {
        if !self.fullscreen_supported {
            return Err(Error::Unsupported("fullscreen"));
        }
        self.record(MediaOp::Fullscreen(false));
        self.fullscreen = false;
        Ok(())
    }

    fn is_picture_in_picture(&self) -> bool {
        self.pip
    }

    fn request_picture_in_picture(&mut self) -> Result<()> {
        if !self.pip_supported {
            return Err(Error::Unsupported("picture-in-picture"));
        }
        self.record(MediaOp::PictureInPicture(true));
        self.pip = true;
        Ok(())
    }

    fn exit_picture_in_picture(&mut self) -> Result<()> {
        if !self.pip_supported {
            return Err(Error::Unsupported("picture-in-picture"));
        }
        self.record(MediaOp::PictureInPicture(false));
        self.pip = false;
        Ok(())
    }

    fn start_capture(&mut self, container: RecordingContainer) -> Result<Box<dyn CaptureSink>> {
        let Some(tail) = self.capture_tail.clone() else {
            return Err(Error::Unsupported("recording"));
        };
        self.record(MediaOp::CaptureStarted(container));
        Ok(Box::new(HeadlessCapture {
            log: self.log(),
            tail,
            stopped: false,
            fails: self.capture_fails,
        }))
    }
}

/// Capture sink of [`HeadlessMedia`]
#[derive(Debug)]
pub struct HeadlessCapture {
    log: OpLog,
    tail: Vec<Bytes>,
    stopped: bool,
    fails: bool,
}

impl CaptureSink for HeadlessCapture {
    fn stop(&mut self) -> Result<Vec<Bytes>> {
        if self.stopped {
            return Err(Error::Recording("capture already stopped".to_string()));
        }
        self.stopped = true;
        if self.fails {
            return Err(Error::Recording("recorder failed to flush".to_string()));
        }
        self.log.borrow_mut().push(MediaOp::CaptureStopped);
        Ok(std::mem::take(&mut self.tail))
    }
}

/// Simulated adaptive-streaming engine
#[derive(Debug)]
pub struct HeadlessStreaming {
    log: OpLog,
    supported: bool,
    active: Rc<Cell<usize>>,
}

impl HeadlessStreaming {
    pub fn new(log: OpLog) -> Self {
        Self {
            log,
            supported: true,
            active: Rc::new(Cell::new(0)),
        }
    }

    /// An engine reporting no support on this host
    pub fn unsupported(log: OpLog) -> Self {
        Self {
            supported: false,
            ..Self::new(log)
        }
    }

    /// Sessions started and not yet destroyed
    pub fn active_sessions(&self) -> usize {
        self.active.get()
    }
}

impl StreamingEngine for HeadlessStreaming {
    type Media = HeadlessMedia;
    type Session = HeadlessStream;

    fn is_supported(&self) -> bool {
        self.supported
    }

    fn start(
        &mut self,
        media: &mut HeadlessMedia,
        source: &str,
        manifest_listener: ListenerId,
    ) -> Result<HeadlessStream> {
        if !self.supported {
            return Err(Error::Unsupported("adaptive streaming"));
        }

        let id = SessionId::new();
        self.log.borrow_mut().push(MediaOp::StreamStarted {
            session: id,
            source: source.to_string(),
        });
        media.load_stream(source);
        media.push_event(manifest_listener, MediaEvent::ManifestParsed);
        self.active.set(self.active.get() + 1);
        debug!(session = %id, source, "Headless stream started");

        Ok(HeadlessStream {
            id,
            log: Rc::clone(&self.log),
            active: Rc::clone(&self.active),
        })
    }
}

/// Session of [`HeadlessStreaming`]
#[derive(Debug)]
pub struct HeadlessStream {
    id: SessionId,
    log: OpLog,
    active: Rc<Cell<usize>>,
}

impl StreamSession for HeadlessStream {
    fn id(&self) -> SessionId {
        self.id
    }

    fn destroy(self) {
        self.log.borrow_mut().push(MediaOp::StreamDestroyed(self.id));
        self.active.set(self.active.get().saturating_sub(1));
    }
}

impl<E> Player<HeadlessMedia, E>
where
    E: StreamingEngine<Media = HeadlessMedia>,
{
    /// Deliver queued events until the element has none left.
    /// Returns how many were handled.
    pub fn pump(&mut self) -> Result<usize> {
        let mut handled = 0;
        loop {
            let events = self.media_mut().take_events();
            if events.is_empty() {
                return Ok(handled);
            }
            for (listener, event) in events {
                self.handle_media_event(listener, event)?;
                handled += 1;
            }
        }
    }

    /// Advance the simulated clock by `dt` seconds and deliver the results
    pub fn tick(&mut self, dt: f64) -> Result<usize> {
        self.media_mut().advance(dt);
        self.pump()
    }
}
