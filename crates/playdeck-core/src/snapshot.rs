//! Still-frame capture

use crate::types::Download;
use crate::{Error, Result};
use std::io::Cursor;

/// Download name of a captured frame
pub const SCREENSHOT_FILE_NAME: &str = "screenshot.png";

/// A decoded frame in RGBA8 layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl VideoFrame {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || rgba.len() != expected {
            return Err(Error::InvalidFrame {
                width,
                height,
                len: rgba.len(),
            });
        }
        Ok(Self { width, height, rgba })
    }

    /// A frame filled with one colour
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self> {
        let pixels = rgba.repeat(width as usize * height as usize);
        Self::new(width, height, pixels)
    }
}

/// Encode `frame` as PNG
pub fn encode_png(frame: &VideoFrame) -> Result<Vec<u8>> {
    let buffer = image::RgbaImage::from_raw(frame.width, frame.height, frame.rgba.clone())
        .ok_or(Error::InvalidFrame {
            width: frame.width,
            height: frame.height,
            len: frame.rgba.len(),
        })?;

    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(buffer).write_to(&mut out, image::ImageFormat::Png)?;
    Ok(out.into_inner())
}

/// Encode `frame` as the `screenshot.png` download
pub fn screenshot(frame: &VideoFrame) -> Result<Download> {
    let png = encode_png(frame)?;
    Ok(Download::new(SCREENSHOT_FILE_NAME, "image/png", png))
}
