//! Page export: render the page region on its own pass, then encode.
//!
//! The export raster is computed from world coordinates and the multiplier
//! alone. The live viewport transform is never consulted, so the output is
//! identical however the user has panned or zoomed.
//!
//! Encoders:
//! - PNG straight from the raster.
//! - JPEG with alpha flattened onto white.
//! - PDF with a single page whose MediaBox is the physical page size in
//!   points and the JPEG image drawn to fill it exactly.

#[cfg(test)]
#[path = "export_test.rs"]
mod export_test;

use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use image::ExtendedColorType;
use image::codecs::jpeg::JpegEncoder;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use serde::{Deserialize, Serialize};
use tiny_skia::Transform;

use crate::assets::{AssetResolver, RasterImage};
use crate::camera::Rect;
use crate::consts::{MAX_EXPORT_EDGE_PX, PT_PER_MM};
use crate::error::{CanvasError, Result};
use crate::raster;
use crate::scene::{SceneEngine, page_region};

/// Output format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Png,
    Jpeg,
    Pdf,
}

impl ExportFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Pdf => "pdf",
        }
    }

    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Pdf => "application/pdf",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = CanvasError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "pdf" => Ok(Self::Pdf),
            other => Err(CanvasError::InvalidExport(format!("unknown export format {other:?}"))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Physical page size in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width_mm: f64,
    pub height_mm: f64,
}

impl PageSize {
    /// Orient a `long_mm` x `short_mm` sheet to match `region`.
    #[must_use]
    pub fn for_region(region: Rect, long_mm: f64, short_mm: f64) -> Self {
        if region.is_landscape() {
            Self { width_mm: long_mm, height_mm: short_mm }
        } else {
            Self { width_mm: short_mm, height_mm: long_mm }
        }
    }

    #[must_use]
    pub fn width_pt(&self) -> f64 {
        self.width_mm * PT_PER_MM
    }

    #[must_use]
    pub fn height_pt(&self) -> f64 {
        self.height_mm * PT_PER_MM
    }
}

/// Render exactly `region` at `multiplier` pixels per world unit.
///
/// # Errors
///
/// [`CanvasError::InvalidExport`] if the multiplier is not positive or the
/// resulting raster would be empty or exceed the size limit.
pub fn render_region<S: SceneEngine + ?Sized>(
    scene: &S,
    assets: &dyn AssetResolver,
    region: Rect,
    multiplier: f64,
) -> Result<RasterImage> {
    if !multiplier.is_finite() || multiplier <= 0.0 {
        return Err(CanvasError::InvalidExport(format!("multiplier must be positive, got {multiplier}")));
    }
    let width = export_edge(region.width * multiplier)?;
    let height = export_edge(region.height * multiplier)?;

    let mut pixmap = raster::new_pixmap(width, height)?;
    #[allow(clippy::cast_possible_truncation)]
    let (m, tx, ty) = (multiplier as f32, (-region.x * multiplier) as f32, (-region.y * multiplier) as f32);
    raster::draw_scene(&mut pixmap, &scene.objects(), assets, Transform::from_row(m, 0.0, 0.0, m, tx, ty));
    raster::pixmap_to_raster(&pixmap)
}

/// Render the scene's page region.
///
/// # Errors
///
/// Fails with an integrity error if the scene does not hold exactly one page
/// region, and otherwise as [`render_region`].
pub fn render_page<S: SceneEngine + ?Sized>(scene: &S, assets: &dyn AssetResolver, multiplier: f64) -> Result<RasterImage> {
    let region = page_region(scene)?;
    render_region(scene, assets, region, multiplier)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn export_edge(extent: f64) -> Result<u32> {
    let px = extent.round();
    if !px.is_finite() || px < 1.0 || px > f64::from(MAX_EXPORT_EDGE_PX) {
        return Err(CanvasError::InvalidExport(format!(
            "export edge of {extent} px is outside 1..={MAX_EXPORT_EDGE_PX}"
        )));
    }
    Ok(px as u32)
}

/// Encode as PNG.
///
/// # Errors
///
/// [`CanvasError::Encoder`] if the encoder fails.
pub fn encode_png(raster: &RasterImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    raster
        .to_rgba_image()
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| CanvasError::Encoder(e.to_string()))?;
    Ok(bytes)
}

/// Encode as baseline JPEG at `quality` in `0.0..=1.0`.
///
/// # Errors
///
/// [`CanvasError::InvalidExport`] for a quality outside the range and
/// [`CanvasError::Encoder`] if the encoder fails.
pub fn encode_jpeg(raster: &RasterImage, quality: f64) -> Result<Vec<u8>> {
    let q = jpeg_quality(quality)?;
    let rgb = flatten_onto_white(raster);
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, q)
        .encode(&rgb, raster.width(), raster.height(), ExtendedColorType::Rgb8)
        .map_err(|e| CanvasError::Encoder(e.to_string()))?;
    Ok(bytes)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn jpeg_quality(quality: f64) -> Result<u8> {
    if !(0.0..=1.0).contains(&quality) {
        return Err(CanvasError::InvalidExport(format!("jpeg quality must be within 0..=1, got {quality}")));
    }
    Ok((quality * 100.0).round().clamp(1.0, 100.0) as u8)
}

fn flatten_onto_white(raster: &RasterImage) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(raster.pixels().len() / 4 * 3);
    for px in raster.pixels().chunks_exact(4) {
        let a = u32::from(px[3]);
        for &c in &px[..3] {
            let v = (u32::from(c) * a + 255 * (255 - a) + 127) / 255;
            rgb.push(u8::try_from(v).unwrap_or(u8::MAX));
        }
    }
    rgb
}

/// Compose a single-page PDF of `page_width_mm` x `page_height_mm` with
/// `raster` stretched over the whole page.
///
/// # Errors
///
/// [`CanvasError::InvalidExport`] for a non-positive page size and
/// [`CanvasError::Encoder`] if the image or document cannot be written.
pub fn compose_pdf(raster: &RasterImage, page_width_mm: f64, page_height_mm: f64, jpeg_quality: f64) -> Result<Vec<u8>> {
    for (name, v) in [("width", page_width_mm), ("height", page_height_mm)] {
        if !v.is_finite() || v <= 0.0 {
            return Err(CanvasError::InvalidExport(format!("page {name} must be positive, got {v} mm")));
        }
    }
    let page = PageSize { width_mm: page_width_mm, height_mm: page_height_mm };
    let (w_pt, h_pt) = (real(page.width_pt()), real(page.height_pt()));
    let jpeg = encode_jpeg(raster, jpeg_quality)?;

    let mut doc = Document::with_version("1.4");
    let id_pages = doc.new_object_id();

    let id_image = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(raster.width()),
            "Height" => i64::from(raster.height()),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        jpeg,
    ));

    // The image unit square is scaled to the full MediaBox.
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new("cm", vec![w_pt.clone(), 0.into(), 0.into(), h_pt.clone(), 0.into(), 0.into()]),
            Operation::new("Do", vec!["Im0".into()]),
            Operation::new("Q", vec![]),
        ],
    };
    let encoded = content.encode().map_err(|e| CanvasError::Encoder(e.to_string()))?;
    let id_content = doc.add_object(Stream::new(dictionary! {}, encoded));

    let id_page = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => id_pages,
        "Contents" => id_content,
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => id_image },
        },
    });
    doc.set_object(
        id_pages,
        dictionary! {
            "Type" => "Pages",
            "Count" => 1,
            "Kids" => vec![Object::Reference(id_page)],
            "MediaBox" => vec![0.into(), 0.into(), w_pt, h_pt],
        },
    );
    let id_catalog = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => id_pages,
    });
    doc.trailer.set("Root", id_catalog);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).map_err(|e| CanvasError::Encoder(e.to_string()))?;
    Ok(buffer)
}

#[allow(clippy::cast_possible_truncation)]
fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

/// Encode an already-rendered page raster in `format`.
///
/// # Errors
///
/// As the individual encoders.
pub fn encode(raster: &RasterImage, format: ExportFormat, page: PageSize, jpeg_quality: f64) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Png => encode_png(raster),
        ExportFormat::Jpeg => encode_jpeg(raster, jpeg_quality),
        ExportFormat::Pdf => compose_pdf(raster, page.width_mm, page.height_mm, jpeg_quality),
    }
}
