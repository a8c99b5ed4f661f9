//! `<video>` element backend
//!
//! Wraps one `HtmlVideoElement` and the container it is fullscreened with.
//! Element listeners forward into the [`Dispatcher`]; the closures live in
//! `listeners` until the binding unsubscribes them.

use crate::download::{blob_from_parts, save_blob};
use crate::events::Dispatcher;
use bytes::Bytes;
use js_sys::{Array, Function, Object, Reflect};
use playdeck_core::media::{TextTrackInfo, TrackMode};
use playdeck_core::{
    CaptureSink, Error, ListenerId, MediaElement, MediaEvent, MediaEventKind, RecordingContainer,
    Result, VideoFrame,
};
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    BlobEvent, CanvasRenderingContext2d, Event, HtmlCanvasElement, HtmlElement, HtmlTrackElement,
    HtmlVideoElement, MediaRecorder, MediaRecorderOptions, MediaStream, TextTrackMode,
};

const HLS_MIME_TYPE: &str = "application/vnd.apple.mpegurl";

/// Caption track attached for the current source
const SUBTITLE_LABEL: &str = "English";
const SUBTITLE_LANGUAGE: &str = "en";

type Listener = Closure<dyn FnMut(Event)>;

pub struct WebMedia {
    video: HtmlVideoElement,
    container: HtmlElement,
    dispatcher: Rc<Dispatcher>,
    listeners: HashMap<ListenerId, (MediaEventKind, Listener)>,
    track: Option<HtmlTrackElement>,
}

impl WebMedia {
    pub fn new(video: HtmlVideoElement, container: HtmlElement, dispatcher: Rc<Dispatcher>) -> Self {
        Self {
            video,
            container,
            dispatcher,
            listeners: HashMap::new(),
            track: None,
        }
    }

    pub fn video(&self) -> &HtmlVideoElement {
        &self.video
    }

    pub fn container(&self) -> &HtmlElement {
        &self.container
    }

    pub fn dispatcher(&self) -> Rc<Dispatcher> {
        Rc::clone(&self.dispatcher)
    }

    pub fn is_fullscreen(&self) -> bool {
        crate::document()
            .ok()
            .and_then(|document| document.fullscreen_element())
            .is_some()
    }

    fn remove_track(&mut self) {
        if let Some(track) = self.track.take() {
            track.remove();
        }
    }
}

impl MediaElement for WebMedia {
    fn play(&mut self) -> Result<()> {
        let promise = self.video.play().map_err(media_error)?;
        // autoplay policy rejections surface asynchronously
        observe("play()", promise);
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.video.pause().map_err(media_error)
    }

    fn set_volume(&mut self, volume: f64) {
        self.video.set_volume(volume);
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.video.set_playback_rate(rate);
    }

    fn current_time(&self) -> f64 {
        self.video.current_time()
    }

    fn set_current_time(&mut self, position: f64) {
        self.video.set_current_time(position);
    }

    fn set_source(&mut self, uri: &str) {
        self.video.set_src(uri);
    }

    fn clear_source(&mut self) {
        let _ = self.video.remove_attribute("src");
        self.video.load();
    }

    fn set_subtitle_source(&mut self, uri: Option<&str>) {
        self.remove_track();
        let Some(uri) = uri else {
            return;
        };

        let track = crate::document()
            .and_then(|document| document.create_element("track"))
            .and_then(|element| element.dyn_into::<HtmlTrackElement>().map_err(JsValue::from));
        let track = match track {
            Ok(track) => track,
            Err(e) => {
                crate::warn(&format!("cannot create subtitle track: {}", crate::describe(&e)));
                return;
            }
        };

        track.set_kind("subtitles");
        track.set_label(SUBTITLE_LABEL);
        track.set_srclang(SUBTITLE_LANGUAGE);
        track.set_src(uri);
        track.set_default(true);
        if let Err(e) = self.video.append_child(&track) {
            crate::warn(&format!("cannot attach subtitle track: {}", crate::describe(&e)));
            return;
        }
        self.track = Some(track);
    }

    fn set_poster(&mut self, uri: Option<&str>) {
        self.video.set_poster(uri.unwrap_or_default());
    }

    fn can_play_manifest(&self) -> bool {
        !self.video.can_play_type(HLS_MIME_TYPE).is_empty()
    }

    fn subscribe(&mut self, id: ListenerId, kind: MediaEventKind) -> Result<()> {
        if kind == MediaEventKind::ManifestParsed {
            return Err(Error::Media(format!("{} is raised by the streaming engine", kind.dom_name())));
        }
        if self.listeners.contains_key(&id) {
            return Err(Error::Media(format!("{} is already attached", id)));
        }

        let video = self.video.clone();
        let dispatcher = Rc::clone(&self.dispatcher);
        let listener = Listener::new(move |_: Event| {
            let event = match kind {
                MediaEventKind::TimeUpdate => MediaEvent::TimeUpdate {
                    position: video.current_time(),
                },
                MediaEventKind::LoadedMetadata => MediaEvent::LoadedMetadata {
                    duration: video.duration(),
                },
                MediaEventKind::Ended => MediaEvent::Ended,
                MediaEventKind::ManifestParsed => return,
            };
            dispatcher.push(id, event);
        });

        self.video
            .add_event_listener_with_callback(kind.dom_name(), listener.as_ref().unchecked_ref())
            .map_err(media_error)?;
        self.listeners.insert(id, (kind, listener));
        Ok(())
    }

    fn unsubscribe(&mut self, id: ListenerId) {
        if let Some((kind, listener)) = self.listeners.remove(&id) {
            let _ = self
                .video
                .remove_event_listener_with_callback(kind.dom_name(), listener.as_ref().unchecked_ref());
        }
    }

    fn text_tracks(&self) -> Vec<TextTrackInfo> {
        let Some(list) = self.video.text_tracks() else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|index| list.get(index))
            .map(|track| TextTrackInfo {
                language: track.language(),
                label: track.label(),
                mode: match track.mode() {
                    TextTrackMode::Showing => TrackMode::Showing,
                    TextTrackMode::Hidden => TrackMode::Hidden,
                    _ => TrackMode::Disabled,
                },
            })
            .collect()
    }

    fn set_text_track_mode(&mut self, index: usize, mode: TrackMode) {
        let Some(track) = self
            .video
            .text_tracks()
            .and_then(|list| list.get(index as u32))
        else {
            return;
        };
        track.set_mode(match mode {
            TrackMode::Showing => TextTrackMode::Showing,
            TrackMode::Hidden => TextTrackMode::Hidden,
            TrackMode::Disabled => TextTrackMode::Disabled,
        });
    }

    fn capture_frame(&self) -> Result<VideoFrame> {
        let width = self.video.video_width();
        let height = self.video.video_height();
        if width == 0 || height == 0 {
            return Err(Error::Media("no decoded frame yet".to_string()));
        }

        let rgba = draw_frame(&self.video, width, height).map_err(media_error)?;
        VideoFrame::new(width, height, rgba)
    }

    fn request_fullscreen(&mut self) -> Result<()> {
        let result = call_first(
            &self.container,
            &["requestFullscreen", "webkitRequestFullscreen", "msRequestFullscreen"],
        )
        .ok_or(Error::Unsupported("fullscreen"))?;
        settle("requestFullscreen()", result.map_err(media_error)?);
        Ok(())
    }

    fn exit_fullscreen(&mut self) -> Result<()> {
        if !self.is_fullscreen() {
            return Ok(());
        }
        let document = crate::document().map_err(media_error)?;
        let result = call_first(
            &document,
            &["exitFullscreen", "webkitExitFullscreen", "msExitFullscreen"],
        )
        .ok_or(Error::Unsupported("fullscreen"))?;
        settle("exitFullscreen()", result.map_err(media_error)?);
        Ok(())
    }

    fn is_picture_in_picture(&self) -> bool {
        crate::document()
            .ok()
            .and_then(|document| Reflect::get(&document, &"pictureInPictureElement".into()).ok())
            .is_some_and(|element| Object::is(&element, &self.video))
    }

    fn request_picture_in_picture(&mut self) -> Result<()> {
        let result = call_first(&self.video, &["requestPictureInPicture"])
            .ok_or(Error::Unsupported("picture-in-picture"))?;
        settle("requestPictureInPicture()", result.map_err(media_error)?);
        Ok(())
    }

    fn exit_picture_in_picture(&mut self) -> Result<()> {
        let document = crate::document().map_err(media_error)?;
        let result = call_first(&document, &["exitPictureInPicture"])
            .ok_or(Error::Unsupported("picture-in-picture"))?;
        settle("exitPictureInPicture()", result.map_err(media_error)?);
        Ok(())
    }

    fn start_capture(&mut self, container: RecordingContainer) -> Result<Box<dyn CaptureSink>> {
        let stream = call_first(&self.video, &["captureStream", "mozCaptureStream"])
            .ok_or(Error::Unsupported("recording"))?
            .and_then(|stream| stream.dyn_into::<MediaStream>())
            .map_err(|e| Error::Recording(crate::describe(&e)))?;

        WebCapture::start(&stream, container).map(|capture| Box::new(capture) as Box<dyn CaptureSink>)
    }
}

impl Drop for WebMedia {
    fn drop(&mut self) {
        let ids: Vec<ListenerId> = self.listeners.keys().copied().collect();
        for id in ids {
            self.unsubscribe(id);
        }
        self.remove_track();
    }
}

/// A `MediaRecorder` over the element's capture stream.
///
/// Chunks stay on the JS side as blobs; on stop the recorder assembles and
/// downloads them itself, so [`CaptureSink::stop`] hands none back.
struct WebCapture {
    recorder: MediaRecorder,
    chunks: Array,
    on_data: Option<Closure<dyn FnMut(BlobEvent)>>,
    container: RecordingContainer,
}

impl WebCapture {
    fn start(stream: &MediaStream, container: RecordingContainer) -> Result<Self> {
        let options = MediaRecorderOptions::new();
        if MediaRecorder::is_type_supported(container.mime_type()) {
            options.set_mime_type(container.mime_type());
        }
        let recorder = MediaRecorder::new_with_media_stream_and_media_recorder_options(stream, &options)
            .map_err(recording_error)?;

        let chunks = Array::new();
        let sink = chunks.clone();
        let on_data = Closure::<dyn FnMut(BlobEvent)>::new(move |event: BlobEvent| {
            if let Some(blob) = event.data().filter(|blob| blob.size() > 0.0) {
                sink.push(&blob);
            }
        });
        recorder.set_ondataavailable(Some(on_data.as_ref().unchecked_ref()));
        recorder.start().map_err(recording_error)?;

        Ok(Self {
            recorder,
            chunks,
            on_data: Some(on_data),
            container,
        })
    }
}

impl CaptureSink for WebCapture {
    fn stop(&mut self) -> Result<Vec<Bytes>> {
        let Some(on_data) = self.on_data.take() else {
            return Err(Error::Recording("recorder already stopped".to_string()));
        };

        let recorder = self.recorder.clone();
        let chunks = self.chunks.clone();
        let container = self.container;
        // the final dataavailable fires before stop
        let on_stop = Closure::once_into_js(move || {
            recorder.set_ondataavailable(None);
            drop(on_data);
            let saved = blob_from_parts(&chunks, container.mime_type())
                .and_then(|blob| save_blob(&blob, &container.file_name()));
            if let Err(e) = saved {
                crate::warn(&format!("cannot save recording: {}", crate::describe(&e)));
            }
        });

        self.recorder.set_onstop(Some(on_stop.unchecked_ref()));
        self.recorder.stop().map_err(recording_error)?;
        Ok(Vec::new())
    }
}

impl Drop for WebCapture {
    fn drop(&mut self) {
        if self.on_data.take().is_some() {
            self.recorder.set_ondataavailable(None);
            let _ = self.recorder.stop();
        }
    }
}

fn draw_frame(video: &HtmlVideoElement, width: u32, height: u32) -> std::result::Result<Vec<u8>, JsValue> {
    let canvas: HtmlCanvasElement = crate::document()?.create_element("canvas")?.dyn_into()?;
    canvas.set_width(width);
    canvas.set_height(height);

    let context: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
        .dyn_into()?;
    context.draw_image_with_html_video_element(video, 0.0, 0.0)?;

    // throws SecurityError on cross-origin sources without CORS
    let image = context.get_image_data(0.0, 0.0, width as f64, height as f64)?;
    Ok(image.data().0)
}

/// Call the first of `methods` that `target` defines. `None` if it has none.
fn call_first(target: &JsValue, methods: &[&str]) -> Option<std::result::Result<JsValue, JsValue>> {
    methods.iter().find_map(|name| {
        let method = Reflect::get(target, &JsValue::from_str(name)).ok()?;
        let method = method.dyn_into::<Function>().ok()?;
        Some(method.call0(target))
    })
}

/// Log the rejection of a promise-returning call, if it returned one
fn settle(what: &'static str, value: JsValue) {
    if let Ok(promise) = value.dyn_into::<js_sys::Promise>() {
        observe(what, promise);
    }
}

fn observe(what: &'static str, promise: js_sys::Promise) {
    wasm_bindgen_futures::spawn_local(async move {
        if let Err(e) = JsFuture::from(promise).await {
            crate::warn(&format!("{} rejected: {}", what, crate::describe(&e)));
        }
    });
}

fn media_error(e: JsValue) -> Error {
    Error::Media(crate::describe(&e))
}

fn recording_error(e: JsValue) -> Error {
    Error::Recording(crate::describe(&e))
}
