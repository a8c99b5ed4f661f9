//! hls.js streaming engine
//!
//! Browsers without native manifest playback (Chrome, Firefox, Edge) go
//! through hls.js. The JS side lives in `web/hls-bridge.js`.

use crate::media::WebMedia;
use playdeck_core::media::StreamSession;
use playdeck_core::{Error, ListenerId, MediaEvent, Result, SessionId, StreamingEngine};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlVideoElement;

#[wasm_bindgen(module = "/web/hls-bridge.js")]
extern "C" {
    #[wasm_bindgen(js_name = "isHlsSupported")]
    fn js_is_hls_supported() -> bool;

    /// Attach a new Hls instance to `video` and load `url`.
    /// Returns the Hls instance handle.
    #[wasm_bindgen(catch, js_name = "createHls")]
    fn js_create_hls(
        video: &HtmlVideoElement,
        url: &str,
        on_manifest_parsed: &js_sys::Function,
    ) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(js_name = "destroyHls")]
    fn js_destroy_hls(hls: &JsValue);
}

/// Streaming engine backed by hls.js
#[derive(Debug)]
pub struct HlsEngine {
    supported: bool,
}

impl HlsEngine {
    pub fn new() -> Self {
        Self {
            supported: js_is_hls_supported(),
        }
    }
}

impl Default for HlsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamingEngine for HlsEngine {
    type Media = WebMedia;
    type Session = HlsSession;

    fn is_supported(&self) -> bool {
        self.supported
    }

    fn start(
        &mut self,
        media: &mut WebMedia,
        source: &str,
        manifest_listener: ListenerId,
    ) -> Result<HlsSession> {
        let dispatcher = media.dispatcher();
        let callback = Closure::<dyn FnMut()>::new(move || {
            dispatcher.push(manifest_listener, MediaEvent::ManifestParsed);
        });

        let handle = js_create_hls(media.video(), source, callback.as_ref().unchecked_ref())
            .map_err(|e| Error::Streaming(crate::describe(&e)))?;

        Ok(HlsSession {
            id: SessionId::new(),
            handle,
            _callback: callback,
        })
    }
}

/// A live hls.js instance
pub struct HlsSession {
    id: SessionId,
    handle: JsValue,
    // hls.js holds this until destroyed
    _callback: Closure<dyn FnMut()>,
}

impl StreamSession for HlsSession {
    fn id(&self) -> SessionId {
        self.id
    }

    fn destroy(self) {
        js_destroy_hls(&self.handle);
    }
}
