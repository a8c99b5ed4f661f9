//! `WebPlayer` - the JS-facing player class

use crate::download::save_download;
use crate::events::Dispatcher;
use crate::hls::HlsEngine;
use crate::media::WebMedia;
use crate::storage::LocalStorage;
use playdeck_core::{
    Command, CommandOutcome, CssVariables, Error, FocusTarget, Key, KeyEvent, Player,
    PlayerConfig, SubtitleSelection, Theme, Video, VideoId,
};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlElement, HtmlInputElement, HtmlTextAreaElement, HtmlVideoElement, KeyboardEvent, Node};

type BrowserPlayer = Player<WebMedia, HlsEngine>;

/// Playlist video player bound to a `<video>` element
#[wasm_bindgen]
pub struct WebPlayer {
    inner: Rc<RefCell<BrowserPlayer>>,
    dispatcher: Rc<Dispatcher>,
}

#[wasm_bindgen]
impl WebPlayer {
    /// Create a player for `video`. `container` is the element taken
    /// fullscreen; `config` may be `undefined`.
    #[wasm_bindgen(constructor)]
    pub fn new(
        video: HtmlVideoElement,
        container: HtmlElement,
        playlist: JsValue,
        config: JsValue,
    ) -> Result<WebPlayer, JsError> {
        let playlist: Vec<Video> = serde_wasm_bindgen::from_value(playlist)?;
        let config: PlayerConfig = if config.is_undefined() || config.is_null() {
            PlayerConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };

        let dispatcher = Dispatcher::new();
        let media = WebMedia::new(video, container, Rc::clone(&dispatcher));
        let player = Player::new(
            config,
            playlist,
            LocalStorage::open_or_memory(),
            media,
            HlsEngine::new(),
        )
        .map_err(to_js)?;
        apply_theme(player.theme());

        let inner = Rc::new(RefCell::new(player));
        let weak = Rc::downgrade(&inner);
        dispatcher.set_pump(move |dispatcher| {
            let Some(player) = weak.upgrade() else {
                return true;
            };
            let Ok(mut player) = player.try_borrow_mut() else {
                return false;
            };
            while let Some((listener, event)) = dispatcher.pop() {
                if let Err(e) = player.handle_media_event(listener, event) {
                    crate::warn(&format!("{:?} failed: {}", event, e));
                }
            }
            true
        });

        Ok(Self { inner, dispatcher })
    }

    /// Current player state as a plain object
    pub fn state(&self) -> Result<JsValue, JsError> {
        to_value(self.inner.borrow().state())
    }

    /// Call `callback` with the state now and after every change
    pub fn subscribe(&self, callback: js_sys::Function) -> Result<(), JsError> {
        let mut rx = self.inner.borrow().subscribe();
        let initial = to_value(&*rx.borrow_and_update())?;
        callback.call1(&JsValue::NULL, &initial).map_err(from_js)?;

        wasm_bindgen_futures::spawn_local(async move {
            while rx.changed().await.is_ok() {
                let state = match to_value(&*rx.borrow_and_update()) {
                    Ok(state) => state,
                    Err(_) => continue,
                };
                if let Err(e) = callback.call1(&JsValue::NULL, &state) {
                    crate::warn(&format!("state subscriber threw: {}", crate::describe(&e)));
                }
            }
        });
        Ok(())
    }

    #[wasm_bindgen(js_name = playlistView)]
    pub fn playlist_view(&self) -> Result<JsValue, JsError> {
        to_value(&self.inner.borrow().playlist_view())
    }

    #[wasm_bindgen(js_name = bookmarkView)]
    pub fn bookmark_view(&self) -> Result<JsValue, JsError> {
        to_value(&self.inner.borrow().bookmark_view())
    }

    #[wasm_bindgen(js_name = setPlaylist)]
    pub fn set_playlist(&self, playlist: JsValue) -> Result<(), JsError> {
        let playlist: Vec<Video> = serde_wasm_bindgen::from_value(playlist)?;
        self.inner.borrow_mut().set_playlist(playlist).map_err(to_js)
    }

    #[wasm_bindgen(js_name = togglePlay)]
    pub fn toggle_play(&self) -> Result<String, JsError> {
        self.run(Command::TogglePlay)
    }

    pub fn play(&self) -> Result<String, JsError> {
        self.run(Command::Play)
    }

    pub fn pause(&self) -> Result<String, JsError> {
        self.run(Command::Pause)
    }

    #[wasm_bindgen(js_name = setVolume)]
    pub fn set_volume(&self, volume: f64) -> Result<String, JsError> {
        self.run(Command::SetVolume(volume))
    }

    #[wasm_bindgen(js_name = toggleMute)]
    pub fn toggle_mute(&self) -> Result<String, JsError> {
        self.run(Command::ToggleMute)
    }

    pub fn seek(&self, position: f64) -> Result<String, JsError> {
        self.run(Command::Seek(position))
    }

    #[wasm_bindgen(js_name = seekBy)]
    pub fn seek_by(&self, delta: f64) -> Result<String, JsError> {
        self.run(Command::SeekBy(delta))
    }

    #[wasm_bindgen(js_name = toggleFullscreen)]
    pub fn toggle_fullscreen(&self) -> Result<String, JsError> {
        self.run(Command::ToggleFullscreen)
    }

    #[wasm_bindgen(js_name = setPlaybackRate)]
    pub fn set_playback_rate(&self, rate: f64) -> Result<String, JsError> {
        self.run(Command::SetPlaybackRate(rate))
    }

    /// Select a subtitle language; `"off"` disables subtitles
    #[wasm_bindgen(js_name = selectSubtitle)]
    pub fn select_subtitle(&self, language: &str) -> Result<String, JsError> {
        self.run(Command::SelectSubtitle(SubtitleSelection::parse(language)))
    }

    pub fn screenshot(&self) -> Result<String, JsError> {
        self.run(Command::Screenshot)
    }

    #[wasm_bindgen(js_name = toggleRecording)]
    pub fn toggle_recording(&self) -> Result<String, JsError> {
        self.run(Command::ToggleRecording)
    }

    #[wasm_bindgen(js_name = addBookmark)]
    pub fn add_bookmark(&self) -> Result<String, JsError> {
        self.run(Command::AddBookmark)
    }

    #[wasm_bindgen(js_name = jumpToBookmark)]
    pub fn jump_to_bookmark(&self, index: usize) -> Result<String, JsError> {
        self.run(Command::JumpToBookmark(index))
    }

    #[wasm_bindgen(js_name = togglePictureInPicture)]
    pub fn toggle_picture_in_picture(&self) -> Result<String, JsError> {
        self.run(Command::TogglePictureInPicture)
    }

    /// Switch to the video with `id` (string or number)
    #[wasm_bindgen(js_name = selectVideo)]
    pub fn select_video(&self, id: JsValue) -> Result<String, JsError> {
        let id: VideoId = serde_wasm_bindgen::from_value(id)?;
        self.run(Command::SelectVideo(id))
    }

    /// Click on playlist row `index`
    #[wasm_bindgen(js_name = selectPlaylistEntry)]
    pub fn select_playlist_entry(&self, index: usize) -> Result<String, JsError> {
        let outcome = self
            .inner
            .borrow_mut()
            .select_playlist_entry(index)
            .map_err(to_js)?;
        Ok(finish(outcome))
    }

    /// Click on bookmark row `index`
    #[wasm_bindgen(js_name = selectBookmark)]
    pub fn select_bookmark(&self, index: usize) -> Result<String, JsError> {
        let outcome = self.inner.borrow_mut().select_bookmark(index).map_err(to_js)?;
        Ok(finish(outcome))
    }

    /// Run the shortcut bound to `event`, if any. Returns whether a
    /// shortcut handled it.
    #[wasm_bindgen(js_name = handleKey)]
    pub fn handle_key(&self, event: &KeyboardEvent) -> Result<bool, JsError> {
        let focus = {
            let player = self.inner.borrow();
            focus_of(event, player.media().container())
        };
        let key = KeyEvent::new(Key::from_dom(&event.key()), focus);

        let Some(response) = self.inner.borrow_mut().handle_key(&key).map_err(to_js)? else {
            return Ok(false);
        };
        if response.prevent_default {
            event.prevent_default();
        }
        finish(response.outcome);
        Ok(true)
    }

    pub fn theme(&self) -> String {
        self.inner.borrow().theme().to_string()
    }

    /// Flip the theme, persist it and restyle the page
    #[wasm_bindgen(js_name = toggleTheme)]
    pub fn toggle_theme(&self) -> String {
        let theme = self.inner.borrow_mut().toggle_theme();
        apply_theme(theme);
        theme.to_string()
    }

    /// Stylesheet body with the palette of the current theme
    #[wasm_bindgen(js_name = cssVariables)]
    pub fn css_variables(&self) -> String {
        CssVariables::generate(self.inner.borrow().theme())
    }

    #[wasm_bindgen(getter, js_name = isRecording)]
    pub fn is_recording(&self) -> bool {
        self.inner.borrow().is_recording()
    }

    #[wasm_bindgen(getter, js_name = playbackRates)]
    pub fn playback_rates(&self) -> Vec<f64> {
        self.inner.borrow().playback_rates().to_vec()
    }

    /// Media events not yet delivered
    #[wasm_bindgen(getter, js_name = pendingEvents)]
    pub fn pending_events(&self) -> usize {
        self.dispatcher.pending()
    }

    fn run(&self, command: Command) -> Result<String, JsError> {
        let outcome = self.inner.borrow_mut().dispatch(command).map_err(to_js)?;
        Ok(finish(outcome))
    }
}

/// Hand downloads to the browser and name the outcome for JS
fn finish(outcome: CommandOutcome) -> String {
    match outcome {
        CommandOutcome::Applied => "applied".to_string(),
        CommandOutcome::Ignored => "ignored".to_string(),
        CommandOutcome::RecordingStarted(_) => "recording".to_string(),
        // the web recorder saves its own blob once it has flushed
        CommandOutcome::Download(download) if download.is_empty() => "saved".to_string(),
        CommandOutcome::Download(download) => {
            if let Err(e) = save_download(&download) {
                crate::warn(&format!("cannot save {}: {}", download.file_name, crate::describe(&e)));
            }
            "saved".to_string()
        }
    }
}

fn focus_of(event: &KeyboardEvent, container: &HtmlElement) -> FocusTarget {
    let Some(target) = event.target() else {
        return FocusTarget::Page;
    };
    if target.is_instance_of::<HtmlInputElement>() || target.is_instance_of::<HtmlTextAreaElement>() {
        return FocusTarget::TextInput;
    }
    if target
        .dyn_ref::<HtmlElement>()
        .is_some_and(HtmlElement::is_content_editable)
    {
        return FocusTarget::TextInput;
    }
    if container.contains(target.dyn_ref::<Node>()) {
        return FocusTarget::Player;
    }
    FocusTarget::Page
}

fn apply_theme(theme: Theme) {
    let Some(root) = crate::document().ok().and_then(|document| document.document_element()) else {
        return;
    };
    if let Err(e) = root.class_list().toggle_with_force("dark", theme.root_class().is_some()) {
        crate::warn(&format!("cannot apply theme: {}", crate::describe(&e)));
    }
}

fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsError> {
    Ok(value.serialize(&serde_wasm_bindgen::Serializer::json_compatible())?)
}

fn to_js(e: Error) -> JsError {
    JsError::new(&format!("{}: {}", e.error_code(), e))
}

fn from_js(e: JsValue) -> JsError {
    JsError::new(&crate::describe(&e))
}
