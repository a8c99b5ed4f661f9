//! Browser downloads via object URLs

use js_sys::{Array, Uint8Array};
use playdeck_core::Download;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Url};

/// Offer a core download to the user
pub fn save_download(download: &Download) -> Result<(), JsValue> {
    let parts = Array::new();
    parts.push(&Uint8Array::from(download.bytes.as_ref()));
    let blob = blob_from_parts(&parts, download.mime_type)?;
    save_blob(&blob, &download.file_name)
}

pub fn blob_from_parts(parts: &Array, mime_type: &str) -> Result<Blob, JsValue> {
    let options = BlobPropertyBag::new();
    options.set_type(mime_type);
    Blob::new_with_blob_sequence_and_options(parts, &options)
}

/// Click a temporary anchor pointing at `blob`
pub fn save_blob(blob: &Blob, file_name: &str) -> Result<(), JsValue> {
    let document = crate::document()?;
    let url = Url::create_object_url_with_blob(blob)?;

    let anchor: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
    anchor.set_href(&url);
    anchor.set_download(file_name);
    anchor.click();

    Url::revoke_object_url(&url)?;
    Ok(())
}
