//! Playdeck WASM - browser host for the playlist video player
//!
//! Binds the platform-independent player in `playdeck-core` to the page:
//! - `<video>` element as the media element
//! - hls.js for adaptive streams on browsers without native support
//! - `localStorage` for positions, bookmarks and the theme
//! - Object-URL downloads for screenshots and recordings
//!
//! ## Usage
//!
//! ```javascript
//! import init, { WebPlayer } from '@playdeck/wasm';
//!
//! await init();
//! const player = new WebPlayer(
//!   document.querySelector('video'),
//!   document.querySelector('.player'),
//!   [{ id: 1, title: 'Intro', src: '/videos/intro.m3u8' }],
//!   { seek_step: 10 },
//! );
//! player.subscribe((state) => render(state));
//! document.addEventListener('keydown', (e) => player.handleKey(e));
//! ```

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

mod download;
mod events;
mod hls;
mod media;
mod player;
mod storage;

pub use hls::{HlsEngine, HlsSession};
pub use media::WebMedia;
pub use player::WebPlayer;
pub use storage::LocalStorage;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    playdeck_core::init();
    log(&format!("Initialized v{}", playdeck_core::VERSION));
}

/// Library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Format seconds as `mm:ss`
#[wasm_bindgen(js_name = formatTime)]
pub fn format_time(seconds: f64) -> String {
    playdeck_core::format_time(seconds)
}

pub(crate) fn document() -> Result<web_sys::Document, JsValue> {
    web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| JsValue::from_str("no document available"))
}

pub(crate) fn log(message: &str) {
    web_sys::console::log_1(&format!("[Playdeck] {}", message).into());
}

pub(crate) fn warn(message: &str) {
    web_sys::console::warn_1(&format!("[Playdeck] {}", message).into());
}

/// Best-effort text of a thrown JS value
pub(crate) fn describe(value: &JsValue) -> String {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}
