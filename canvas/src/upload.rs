//! Background uploads: file-type gate and the rasterizer seam.
//!
//! Paginated documents need an external rasterizer; only the first page is
//! ever rendered. Plain raster uploads are decoded in-crate by
//! [`ImageRasterizer`].

#[cfg(test)]
#[path = "upload_test.rs"]
mod upload_test;

use std::path::Path;

use crate::assets::RasterImage;
use crate::error::{CanvasError, Result};

/// Accepted upload types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Pdf,
    Png,
    Jpeg,
}

impl UploadKind {
    /// Classify an upload by its file extension.
    ///
    /// # Errors
    ///
    /// [`CanvasError::UnsupportedUpload`] for anything but pdf/png/jpg/jpeg.
    pub fn from_file_name(name: &str) -> Result<Self> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| CanvasError::UnsupportedUpload(format!("{name} has no file extension")))?;
        match ext.as_str() {
            "pdf" => Ok(Self::Pdf),
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            other => Err(CanvasError::UnsupportedUpload(format!(".{other} (expected pdf, png, jpg or jpeg)"))),
        }
    }

    /// Classify an upload by its MIME type.
    ///
    /// # Errors
    ///
    /// [`CanvasError::UnsupportedUpload`] for any other type.
    pub fn from_mime(mime: &str) -> Result<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "application/pdf" => Ok(Self::Pdf),
            "image/png" => Ok(Self::Png),
            "image/jpeg" | "image/jpg" => Ok(Self::Jpeg),
            other => Err(CanvasError::UnsupportedUpload(other.to_owned())),
        }
    }

    #[must_use]
    pub fn is_paginated(self) -> bool {
        self == Self::Pdf
    }
}

/// Turns an uploaded file into a bitmap of its first page.
pub trait DocumentRasterizer {
    /// Render the first page of `bytes` at `target_scale`.
    ///
    /// # Errors
    ///
    /// [`CanvasError::RasterizerUnavailable`] if this rasterizer cannot handle
    /// `kind`, or an input error if the file is malformed.
    fn render_first_page(&self, kind: UploadKind, bytes: &[u8], target_scale: f64) -> Result<RasterImage>;
}

/// Decodes PNG and JPEG uploads at their native resolution.
///
/// Raster uploads have no intrinsic page size to scale, so `target_scale` is
/// ignored. PDF uploads are reported as unavailable; the `pdf` feature adds
/// `PdfiumRasterizer` for those.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageRasterizer;

impl DocumentRasterizer for ImageRasterizer {
    fn render_first_page(&self, kind: UploadKind, bytes: &[u8], _target_scale: f64) -> Result<RasterImage> {
        match kind {
            UploadKind::Png | UploadKind::Jpeg => RasterImage::decode(bytes),
            UploadKind::Pdf => Err(CanvasError::RasterizerUnavailable("no PDF rasterizer is configured".into())),
        }
    }
}
