use base64::Engine;
use bytes::Bytes;
use image::ImageFormat;
use serde::Serialize;
use std::io::Cursor;
use thiserror::Error;

const PREVIEW_SIDE: u32 = 256;

#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("photo is empty")] Empty,
    #[error("not a supported image: {0}")] Unsupported(String),
    #[error("could not decode image: {0}")] Decode(String),
}

/// The uploaded subject photo. `bytes` is sent untouched; `preview` is a
/// small PNG data URL for display only.
#[derive(Debug, Clone)]
pub struct PersonPhoto {
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Bytes,
    pub width: u32,
    pub height: u32,
    pub preview: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PhotoView {
    pub filename: String,
    pub mime: String,
    pub width: u32,
    pub height: u32,
    pub preview: String,
}

impl PersonPhoto {
    pub fn from_upload(filename: impl Into<String>, bytes: Bytes) -> Result<Self, PhotoError> {
        if bytes.is_empty() {
            return Err(PhotoError::Empty);
        }
        let format = image::guess_format(&bytes).map_err(|e| PhotoError::Unsupported(e.to_string()))?;
        let decoded = image::load_from_memory_with_format(&bytes, format)
            .map_err(|e| PhotoError::Decode(e.to_string()))?;

        let thumb = decoded.thumbnail(PREVIEW_SIDE, PREVIEW_SIDE);
        let mut png = Vec::new();
        thumb
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| PhotoError::Decode(e.to_string()))?;
        let preview = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&png)
        );

        let mut filename = filename.into();
        if filename.trim().is_empty() {
            filename = format!("person.{}", format.extensions_str().first().copied().unwrap_or("img"));
        }

        Ok(Self {
            filename,
            mime: format.to_mime_type(),
            width: decoded.width(),
            height: decoded.height(),
            bytes,
            preview,
        })
    }

    pub fn view(&self) -> PhotoView {
        PhotoView {
            filename: self.filename.clone(),
            mime: self.mime.to_string(),
            width: self.width,
            height: self.height,
            preview: self.preview.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_png(width: u32, height: u32) -> Bytes {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 120, 40]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    Bytes::from(buf)
}
