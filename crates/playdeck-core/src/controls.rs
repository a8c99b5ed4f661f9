//! Controls surface
//!
//! Each [`Command`] either changes a field through the [`PlayerStore`] or
//! performs a side effect on the media element through the binding.
//! Commands needing a capability the host lacks return
//! [`CommandOutcome::Ignored`] rather than an error.

use crate::binding::MediaBinding;
use crate::config::PlayerConfig;
use crate::media::{MediaElement, StreamingEngine, TrackMode};
use crate::recording::{RecordingContainer, RecordingSession};
use crate::snapshot;
use crate::state::PlayerStore;
use crate::types::{clamp_volume, Download, SessionId, SubtitleSelection, VideoId};
use crate::{Error, Result};
use bytes::Bytes;
use tracing::{debug, info, warn};

/// User-facing player commands
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    TogglePlay,
    Play,
    Pause,
    /// Set the volume; a positive volume also unmutes
    SetVolume(f64),
    ToggleMute,
    /// Seek to an absolute position in seconds
    Seek(f64),
    /// Seek relative to the element's current position
    SeekBy(f64),
    ToggleFullscreen,
    SetPlaybackRate(f64),
    SelectSubtitle(SubtitleSelection),
    Screenshot,
    ToggleRecording,
    AddBookmark,
    TogglePictureInPicture,
    SelectVideo(VideoId),
    /// Seek to the n-th bookmark of the current video and play
    JumpToBookmark(usize),
}

/// What a command did
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Applied,
    /// The host lacks the capability; nothing changed
    Ignored,
    RecordingStarted(SessionId),
    /// A file for the host to offer as a download
    Download(Download),
}

/// Executes commands against the store and binding
#[derive(Debug)]
pub struct Controls {
    playback_rates: Vec<f64>,
    recording_container: RecordingContainer,
    recording: Option<RecordingSession>,
}

impl Controls {
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            playback_rates: config.playback_rates.clone(),
            recording_container: config.recording_container,
            recording: None,
        }
    }

    /// Rates offered by the rate picker
    pub fn playback_rates(&self) -> &[f64] {
        &self.playback_rates
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// Buffer recorded data delivered by the host
    pub fn push_recording_chunk(&mut self, chunk: Bytes) {
        match self.recording.as_mut() {
            Some(session) => session.push_chunk(chunk),
            None => debug!(bytes = chunk.len(), "Dropping recording data outside a session"),
        }
    }

    pub fn execute<M, E>(
        &mut self,
        command: Command,
        store: &mut PlayerStore,
        binding: &mut MediaBinding<M, E>,
    ) -> Result<CommandOutcome>
    where
        M: MediaElement,
        E: StreamingEngine<Media = M>,
    {
        debug!(?command, "Executing command");

        match command {
            Command::TogglePlay => {
                let playing = store.state().is_playing;
                store.set_is_playing(!playing);
            }
            Command::Play => store.set_is_playing(true),
            Command::Pause => store.set_is_playing(false),
            Command::SetVolume(volume) => {
                let volume = clamp_volume(volume);
                store.set_volume(volume);
                if volume > 0.0 {
                    store.set_is_muted(false);
                }
            }
            Command::ToggleMute => {
                let muted = store.state().is_muted;
                store.set_is_muted(!muted);
            }
            Command::Seek(position) => {
                binding.seek(store, position);
            }
            Command::SeekBy(delta) => {
                let position = binding.media().current_time() + delta;
                binding.seek(store, position);
            }
            Command::ToggleFullscreen => {
                let full = store.state().is_full_screen;
                let result = if full {
                    binding.media_mut().exit_fullscreen()
                } else {
                    binding.media_mut().request_fullscreen()
                };
                if degrade(result)?.is_none() {
                    return Ok(CommandOutcome::Ignored);
                }
                store.set_is_full_screen(!full);
            }
            Command::SetPlaybackRate(rate) => {
                if !self.offers_rate(rate) {
                    return Err(Error::UnsupportedPlaybackRate { rate });
                }
                store.set_playback_rate(rate)?;
            }
            Command::SelectSubtitle(selection) => {
                let media = binding.media_mut();
                let tracks = media.text_tracks();
                for (index, track) in tracks.iter().enumerate() {
                    let mode = if selection.language() == Some(track.language.as_str()) {
                        TrackMode::Showing
                    } else {
                        TrackMode::Disabled
                    };
                    media.set_text_track_mode(index, mode);
                }
                debug!(%selection, tracks = tracks.len(), "Subtitle track selected");
                store.set_selected_subtitle(selection);
            }
            Command::Screenshot => {
                let Some(frame) = degrade(binding.media().capture_frame())? else {
                    return Ok(CommandOutcome::Ignored);
                };
                let download = snapshot::screenshot(&frame)?;
                info!(width = frame.width, height = frame.height, bytes = download.len(), "Captured screenshot");
                return Ok(CommandOutcome::Download(download));
            }
            Command::ToggleRecording => {
                if let Some(session) = self.recording.take() {
                    let id = session.id();
                    return match session.stop() {
                        Ok(download) => Ok(CommandOutcome::Download(download)),
                        Err(e) => {
                            warn!(session = %id, error = %e, "Recording lost; sink failed to stop");
                            Err(e)
                        }
                    };
                }
                let container = self.recording_container;
                let Some(sink) = degrade(binding.media_mut().start_capture(container))? else {
                    return Ok(CommandOutcome::Ignored);
                };
                let session = RecordingSession::start(sink, container);
                let id = session.id();
                self.recording = Some(session);
                return Ok(CommandOutcome::RecordingStarted(id));
            }
            Command::AddBookmark => {
                let position = binding.media().current_time();
                store.add_bookmark(position);
            }
            Command::TogglePictureInPicture => {
                let media = binding.media_mut();
                let result = if media.is_picture_in_picture() {
                    media.exit_picture_in_picture()
                } else {
                    media.request_picture_in_picture()
                };
                if degrade(result)?.is_none() {
                    return Ok(CommandOutcome::Ignored);
                }
            }
            Command::SelectVideo(id) => {
                store.set_current_video(&id)?;
            }
            Command::JumpToBookmark(index) => {
                let bookmarks = &store.state().bookmarks;
                let position = *bookmarks.get(index).ok_or(Error::BookmarkOutOfRange {
                    index,
                    len: bookmarks.len(),
                })?;
                binding.seek(store, position);
                store.set_is_playing(true);
            }
        }

        Ok(CommandOutcome::Applied)
    }

    fn offers_rate(&self, rate: f64) -> bool {
        self.playback_rates
            .iter()
            .any(|offered| (offered - rate).abs() < f64::EPSILON)
    }
}

/// Map an unsupported capability to `None`
fn degrade<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_unsupported() => {
            debug!(error = %e, "Capability unavailable; ignoring command");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
