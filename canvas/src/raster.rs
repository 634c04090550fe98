//! Software rasterizer for scenes, built on tiny-skia.
//!
//! Both the live viewport and the page export go through [`draw_scene`]; they
//! differ only in the world-to-pixel transform handed in. Nothing here reads
//! viewport state on its own.

#[cfg(test)]
#[path = "raster_test.rs"]
mod raster_test;

use tiny_skia::{Color, ColorU8, FillRule, IntSize, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform};

use crate::assets::{AssetResolver, RasterImage};
use crate::camera::ViewportTransform;
use crate::doc::{ObjectKind, SceneObject};
use crate::error::{CanvasError, Result};

/// Fill colour of the area around the page in the live view.
const DESK_RGBA: [u8; 4] = [0xe5, 0xe7, 0xeb, 0xff];

/// Fill colour of an icon whose artwork could not be resolved.
const PLACEHOLDER_RGBA: [u8; 4] = [0xd1, 0xd5, 0xdb, 0xff];

/// Outline colour of the placeholder.
const PLACEHOLDER_STROKE_RGBA: [u8; 4] = [0x6b, 0x72, 0x80, 0xff];

/// Allocate a transparent pixmap.
///
/// # Errors
///
/// Returns [`CanvasError::InvalidImage`] for a zero-sized or oversized surface.
pub fn new_pixmap(width: u32, height: u32) -> Result<Pixmap> {
    Pixmap::new(width, height).ok_or_else(|| CanvasError::InvalidImage(format!("cannot allocate {width}x{height} surface")))
}

/// Draw `objects` (bottom first) into `pixmap` through `view`, which maps
/// world coordinates to pixmap pixels.
pub fn draw_scene(pixmap: &mut Pixmap, objects: &[&SceneObject], assets: &dyn AssetResolver, view: Transform) {
    for obj in objects {
        match obj.kind {
            ObjectKind::Page => draw_page(pixmap, obj, view),
            ObjectKind::Background | ObjectKind::Icon => draw_image_object(pixmap, obj, assets, view),
        }
    }
}

/// Render the visible viewport into a `width_px` x `height_px` raster.
///
/// `dpr` scales CSS-pixel device coordinates to backing-store pixels.
///
/// # Errors
///
/// Returns [`CanvasError::InvalidImage`] if the surface cannot be allocated.
pub fn render_view(
    objects: &[&SceneObject],
    assets: &dyn AssetResolver,
    transform: &ViewportTransform,
    width_px: u32,
    height_px: u32,
    dpr: f64,
) -> Result<RasterImage> {
    let mut pixmap = new_pixmap(width_px, height_px)?;
    pixmap.fill(color(DESK_RGBA));
    let view = Transform::from_row(
        to_f32(transform.scale * dpr),
        0.0,
        0.0,
        to_f32(transform.scale * dpr),
        to_f32(transform.translate_x * dpr),
        to_f32(transform.translate_y * dpr),
    );
    draw_scene(&mut pixmap, objects, assets, view);
    pixmap_to_raster(&pixmap)
}

/// Copy a premultiplied pixmap out as straight-alpha RGBA8.
///
/// # Errors
///
/// Propagates [`RasterImage::new`] failures (never for a valid pixmap).
pub fn pixmap_to_raster(pixmap: &Pixmap) -> Result<RasterImage> {
    let mut bytes = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let c = px.demultiply();
        bytes.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    RasterImage::new(pixmap.width(), pixmap.height(), bytes)
}

/// Premultiply a raster into a pixmap.
fn raster_to_pixmap(raster: &RasterImage) -> Option<Pixmap> {
    let mut data = Vec::with_capacity(raster.pixels().len());
    for px in raster.pixels().chunks_exact(4) {
        let c = ColorU8::from_rgba(px[0], px[1], px[2], px[3]).premultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Pixmap::from_vec(data, IntSize::from_wh(raster.width(), raster.height())?)
}

fn draw_page(pixmap: &mut Pixmap, page: &SceneObject, view: Transform) {
    let b = page.bounds();
    let Some(rect) = tiny_skia::Rect::from_xywh(to_f32(b.x), to_f32(b.y), to_f32(b.width), to_f32(b.height)) else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color(Color::WHITE);
    pixmap.fill_rect(rect, &paint, view, None);
}

fn draw_image_object(pixmap: &mut Pixmap, obj: &SceneObject, assets: &dyn AssetResolver, view: Transform) {
    let image = obj.src.as_deref().and_then(|src| assets.resolve(src));
    let Some(image) = image.and_then(raster_to_pixmap) else {
        tracing::warn!(id = %obj.id, src = ?obj.src, "asset not resolved; drawing placeholder");
        draw_placeholder(pixmap, obj, view);
        return;
    };
    let placement = object_transform(obj, f64::from(image.width()), f64::from(image.height()));
    let paint = PixmapPaint { quality: tiny_skia::FilterQuality::Bilinear, ..PixmapPaint::default() };
    pixmap.draw_pixmap(0, 0, image.as_ref(), &paint, view.pre_concat(placement), None);
}

fn draw_placeholder(pixmap: &mut Pixmap, obj: &SceneObject, view: Transform) {
    let Some(rect) = tiny_skia::Rect::from_xywh(0.0, 0.0, to_f32(obj.width), to_f32(obj.height)) else {
        return;
    };
    let path = PathBuilder::from_rect(rect);
    let placement = view.pre_concat(object_transform(obj, obj.width, obj.height));

    let mut fill = Paint::default();
    fill.set_color(color(PLACEHOLDER_RGBA));
    pixmap.fill_path(&path, &fill, FillRule::Winding, placement, None);

    let mut outline = Paint::default();
    outline.set_color(color(PLACEHOLDER_STROKE_RGBA));
    outline.anti_alias = true;
    let stroke = Stroke { width: to_f32(obj.width.min(obj.height) * 0.05).max(1.0), ..Stroke::default() };
    pixmap.stroke_path(&path, &outline, &stroke, placement, None);
}

/// Map a `source_w` x `source_h` image onto the object's world footprint:
/// scaled to the object's size, rotated about and centred on its centre.
fn object_transform(obj: &SceneObject, source_w: f64, source_h: f64) -> Transform {
    let sx = if source_w > 0.0 { obj.width * obj.scale / source_w } else { obj.scale };
    let sy = if source_h > 0.0 { obj.height * obj.scale / source_h } else { obj.scale };
    Transform::from_translate(to_f32(obj.x), to_f32(obj.y))
        .pre_concat(Transform::from_rotate(to_f32(obj.angle)))
        .pre_concat(Transform::from_scale(to_f32(sx), to_f32(sy)))
        .pre_concat(Transform::from_translate(to_f32(-source_w * 0.5), to_f32(-source_h * 0.5)))
}

fn color([r, g, b, a]: [u8; 4]) -> Color {
    Color::from_rgba8(r, g, b, a)
}

#[allow(clippy::cast_possible_truncation)]
fn to_f32(v: f64) -> f32 {
    v as f32
}
