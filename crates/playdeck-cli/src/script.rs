//! Scripted playback sessions
//!
//! A script is a JSON array of steps run in order against the player:
//!
//! ```json
//! [
//!   {"action": "play"},
//!   {"action": "wait", "seconds": 12},
//!   {"action": "bookmark"},
//!   {"action": "key", "key": "ArrowRight"},
//!   {"action": "select", "id": 2}
//! ]
//! ```

use anyhow::Context;
use playdeck_core::{Command, SubtitleSelection, VideoId};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Play,
    Pause,
    /// Let the clock run
    Wait { seconds: f64 },
    Seek { position: f64 },
    Volume { level: f64 },
    Mute,
    Rate { rate: f64 },
    Subtitle { language: String },
    Bookmark,
    /// Jump to the n-th bookmark of the current video
    Jump { index: usize },
    Select { id: VideoId },
    /// A key press, as a DOM `KeyboardEvent.key` value
    Key { key: String },
    Screenshot,
    Record,
    Fullscreen,
    Pip,
}

/// What a step asks of the runner
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Command(Command),
    Key(String),
    Wait(f64),
}

impl Step {
    pub fn action(&self) -> Action {
        let command = match self {
            Step::Wait { seconds } => return Action::Wait(*seconds),
            Step::Key { key } => return Action::Key(key.clone()),
            Step::Play => Command::Play,
            Step::Pause => Command::Pause,
            Step::Seek { position } => Command::Seek(*position),
            Step::Volume { level } => Command::SetVolume(*level),
            Step::Mute => Command::ToggleMute,
            Step::Rate { rate } => Command::SetPlaybackRate(*rate),
            Step::Subtitle { language } => Command::SelectSubtitle(SubtitleSelection::parse(language)),
            Step::Bookmark => Command::AddBookmark,
            Step::Jump { index } => Command::JumpToBookmark(*index),
            Step::Select { id } => Command::SelectVideo(id.clone()),
            Step::Screenshot => Command::Screenshot,
            Step::Record => Command::ToggleRecording,
            Step::Fullscreen => Command::ToggleFullscreen,
            Step::Pip => Command::TogglePictureInPicture,
        };
        Action::Command(command)
    }
}

/// Script used when none is given: play for `seconds`
pub fn default_script(seconds: f64) -> Vec<Step> {
    vec![Step::Play, Step::Wait { seconds }]
}

pub fn parse(json: &str) -> anyhow::Result<Vec<Step>> {
    Ok(serde_json::from_str(json)?)
}

pub fn load(path: &Path) -> anyhow::Result<Vec<Step>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading script {}", path.display()))?;
    parse(&json).with_context(|| format!("parsing script {}", path.display()))
}
