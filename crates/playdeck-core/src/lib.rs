//! Playdeck Core - playlist video player library
//!
//! This crate provides the platform-independent part of the player:
//! - Shared player state with a single writer and `watch` subscriptions
//! - Media binding that keeps one media element in step with the state
//! - Per-video persistence of playback position and bookmarks
//! - Controls, keyboard shortcuts and list view models
//! - Light/dark theme preference
//! - Screenshot encoding and recording sessions
//!
//! Hosts supply the media element and streaming engine through the traits
//! in [`media`]; [`headless`] provides a simulated one.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Playdeck Core                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐          │
//! │  │   Controls   │  │  Shortcuts   │  │  List Views  │          │
//! │  │   Surface    │  │              │  │              │          │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘          │
//! │         │                 │                 │                   │
//! │         └─────────────────┼─────────────────┘                   │
//! │                           │                                     │
//! │                    ┌──────┴──────┐                              │
//! │                    │   Player    │                              │
//! │                    │    Store    │                              │
//! │                    └──────┬──────┘                              │
//! │                           │                                     │
//! │  ┌──────────────┐  ┌──────┴──────┐  ┌──────────────┐           │
//! │  │ Persistence  │  │    Media    │  │  Streaming   │           │
//! │  │   Adapter    │  │   Binding   │──│   Engine     │           │
//! │  └──────────────┘  └─────────────┘  └──────────────┘           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod types;
pub mod config;
pub mod storage;
pub mod state;
pub mod source;
pub mod media;
pub mod binding;
pub mod controls;
pub mod keys;
pub mod views;
pub mod theme;
pub mod snapshot;
pub mod recording;
pub mod player;
pub mod headless;

pub use error::{Error, Result};
pub use types::*;
pub use config::PlayerConfig;
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore, Persistence, StorageKey};
pub use state::PlayerStore;
pub use media::{ListenerId, MediaElement, MediaEvent, MediaEventKind, NoStreaming, StreamingEngine};
pub use binding::MediaBinding;
pub use controls::{Command, CommandOutcome, Controls};
pub use keys::{FocusTarget, Key, KeyEvent, Shortcuts};
pub use views::{format_time, BookmarkView, PlaylistView};
pub use theme::{CssVariables, Theme, ThemeToggle};
pub use snapshot::VideoFrame;
pub use recording::{CaptureSink, RecordingContainer, RecordingSession};
pub use player::{KeyResponse, Player};
pub use headless::{HeadlessMedia, HeadlessStreaming};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the player library
pub fn init() {
    tracing::info!(version = VERSION, "Playdeck Core initialized");
}
