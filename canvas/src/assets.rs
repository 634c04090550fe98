//! Raster images and the asset library that resolves object sources to pixels.
//!
//! Icons reference their artwork by a palette key (the drag-and-drop payload).
//! The background bitmap is stored inline in the scene as a PNG data URL so a
//! snapshot is self-contained; restoring a snapshot re-registers those URLs.

#[cfg(test)]
#[path = "assets_test.rs"]
mod assets_test;

use std::collections::HashMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;

use crate::error::{CanvasError, Result};
use crate::export::encode_png;

const DATA_URL_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// A straight-alpha RGBA8 bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RasterImage {
    /// Wrap an RGBA8 buffer.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidImage`] if either dimension is zero or the
    /// buffer length is not `width * height * 4`.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(CanvasError::InvalidImage(format!("empty raster {width}x{height}")));
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| CanvasError::InvalidImage(format!("raster {width}x{height} is too large")))?;
        if pixels.len() != expected {
            return Err(CanvasError::InvalidImage(format!(
                "raster {width}x{height} needs {expected} bytes, got {}",
                pixels.len()
            )));
        }
        Ok(Self { width, height, pixels })
    }

    /// A raster filled with one colour.
    ///
    /// # Errors
    ///
    /// Same conditions as [`RasterImage::new`].
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self> {
        let count = (width as usize).saturating_mul(height as usize);
        Self::new(width, height, rgba.repeat(count))
    }

    /// Decode PNG/JPEG/etc. bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidImage`] if the bytes are not a decodable image.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes).map_err(|e| CanvasError::InvalidImage(e.to_string()))?;
        Self::from_rgba_image(img.to_rgba8())
    }

    /// Take ownership of an `image` crate buffer.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidImage`] for a zero-sized image.
    pub fn from_rgba_image(img: image::RgbaImage) -> Result<Self> {
        let (width, height) = img.dimensions();
        Self::new(width, height, img.into_raw())
    }

    /// Copy into an `image` crate buffer.
    #[must_use]
    pub fn to_rgba_image(&self) -> image::RgbaImage {
        image::RgbaImage::from_fn(self.width, self.height, |x, y| {
            let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
            image::Rgba([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]])
        })
    }

    /// Encode as a `data:image/png;base64,...` URL.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Encoder`] if PNG encoding fails.
    pub fn to_data_url(&self) -> Result<String> {
        let png = encode_png(self)?;
        Ok(format!("{DATA_URL_PREFIX}image/png{BASE64_MARKER}{}", B64.encode(png)))
    }

    /// Decode a base64 image data URL.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidImage`] if the URL is not a base64 image
    /// data URL or its payload does not decode.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix(DATA_URL_PREFIX)
            .ok_or_else(|| CanvasError::InvalidImage("not a data URL".into()))?;
        let (mime, payload) = rest
            .split_once(BASE64_MARKER)
            .ok_or_else(|| CanvasError::InvalidImage("data URL is not base64-encoded".into()))?;
        if !mime.starts_with("image/") {
            return Err(CanvasError::InvalidImage(format!("data URL has non-image type {mime}")));
        }
        let bytes = B64
            .decode(payload.trim())
            .map_err(|e| CanvasError::InvalidImage(e.to_string()))?;
        Self::decode(&bytes)
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw straight-alpha RGBA8 bytes, row-major.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// `true` if `src` is an inline data URL rather than a palette key.
#[must_use]
pub fn is_data_url(src: &str) -> bool {
    src.starts_with(DATA_URL_PREFIX)
}

/// Resolves an object's `src` to its pixels.
pub trait AssetResolver {
    fn resolve(&self, src: &str) -> Option<&RasterImage>;
}

/// In-memory asset registry keyed by source string.
#[derive(Debug, Clone, Default)]
pub struct AssetLibrary {
    images: HashMap<String, RasterImage>,
}

impl AssetLibrary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the raster for `key`.
    pub fn insert(&mut self, key: impl Into<String>, raster: RasterImage) {
        self.images.insert(key.into(), raster);
    }

    /// Decode `url` and register it under its own text.
    ///
    /// Already-registered URLs are not decoded again.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidImage`] if the URL does not decode.
    pub fn register_data_url(&mut self, url: &str) -> Result<()> {
        if self.images.contains_key(url) {
            return Ok(());
        }
        let raster = RasterImage::from_data_url(url)?;
        self.images.insert(url.to_owned(), raster);
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Option<RasterImage> {
        self.images.remove(key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.images.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl AssetResolver for AssetLibrary {
    fn resolve(&self, src: &str) -> Option<&RasterImage> {
        self.images.get(src)
    }
}
