//! PDF backgrounds through pdfium.
//!
//! The pdfium shared library is bound at runtime, so a missing library is a
//! [`CanvasError::RasterizerUnavailable`] from [`PdfiumRasterizer::new`]
//! rather than a build failure.

#[cfg(test)]
#[path = "pdf_test.rs"]
mod pdf_test;

use std::path::Path;

use pdfium_render::prelude::*;
use tracing::{debug, info};

use crate::assets::RasterImage;
use crate::consts::MAX_EXPORT_EDGE_PX;
use crate::error::{CanvasError, Result};
use crate::upload::{DocumentRasterizer, ImageRasterizer, UploadKind};

/// Renders the first page of a PDF with pdfium. PNG and JPEG uploads are
/// handed to [`ImageRasterizer`].
pub struct PdfiumRasterizer {
    pdfium: Pdfium,
}

impl PdfiumRasterizer {
    /// Bind pdfium from `library_dir` when given, then from the working
    /// directory, then from the system library path.
    ///
    /// # Errors
    ///
    /// [`CanvasError::RasterizerUnavailable`] if no pdfium library loads.
    pub fn new(library_dir: Option<&Path>) -> Result<Self> {
        let dir = library_dir.unwrap_or_else(|| Path::new("./"));
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| CanvasError::RasterizerUnavailable(format!("failed to load pdfium: {e}")))?;
        info!(dir = %dir.display(), "pdfium bound");
        Ok(Self { pdfium: Pdfium::new(bindings) })
    }

    fn render_pdf(&self, bytes: &[u8], target_scale: f64) -> Result<RasterImage> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| CanvasError::InvalidImage(format!("pdf: {e}")))?;
        let page = document
            .pages()
            .get(0)
            .map_err(|e| CanvasError::InvalidImage(format!("pdf has no first page: {e}")))?;

        // Page sizes are in points.
        let width = page_pixels(page.width().value, target_scale)?;
        let height = page_pixels(page.height().value, target_scale)?;
        let config = PdfRenderConfig::new()
            .set_target_width(width)
            .set_target_height(height)
            .rotate_if_landscape(PdfPageRenderRotation::None, false);
        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| CanvasError::RasterizerUnavailable(format!("pdfium render failed: {e}")))?;

        let to_u32 = |v: Pixels| u32::try_from(v).map_err(|_| CanvasError::InvalidImage(format!("pdf bitmap size {v}")));
        let raster = RasterImage::new(to_u32(bitmap.width())?, to_u32(bitmap.height())?, bitmap.as_rgba_bytes())?;
        debug!(width = raster.width(), height = raster.height(), target_scale, "pdf page rendered");
        Ok(raster)
    }
}

impl DocumentRasterizer for PdfiumRasterizer {
    fn render_first_page(&self, kind: UploadKind, bytes: &[u8], target_scale: f64) -> Result<RasterImage> {
        match kind {
            UploadKind::Pdf => self.render_pdf(bytes, target_scale),
            UploadKind::Png | UploadKind::Jpeg => ImageRasterizer.render_first_page(kind, bytes, target_scale),
        }
    }
}

/// Pixel length of a page edge of `points` rendered at `scale` pixels per point.
#[allow(clippy::cast_possible_truncation)]
fn page_pixels(points: f32, scale: f64) -> Result<i32> {
    let px = (f64::from(points) * scale).round();
    if !px.is_finite() || px < 1.0 || px > f64::from(MAX_EXPORT_EDGE_PX) {
        return Err(CanvasError::InvalidImage(format!(
            "pdf page edge of {points}pt at scale {scale} gives {px} px"
        )));
    }
    Ok(px as i32)
}
