//! Rendering: puts the rasterized viewport on a 2D context and draws the
//! interactive overlays (page outline, selection) on top.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! It receives a read-only view of the engine and produces pixels; it does not
//! mutate any application state.
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.
//! The top-level caller ([`crate::engine::Engine::render`]) handles the result.

use wasm_bindgen::{Clamped, JsValue};
use web_sys::{CanvasRenderingContext2d, ImageData};

use crate::doc::SceneObject;
use crate::engine::EngineCore;
use crate::scene::{SceneEngine, page_object};

/// Selection dash segment length in screen pixels.
const SELECTION_DASH_PX: f64 = 4.0;
/// Selection outline colour.
const SELECTION_STROKE: &str = "#1E90FF";
/// Page outline colour.
const PAGE_STROKE: &str = "#9ca3af";

/// Draw the full scene: the rasterized objects, then the page outline and
/// the selection UI.
///
/// # Errors
///
/// Returns `Err` if rasterizing fails or any `Canvas2D` call fails.
pub fn draw<S: SceneEngine>(ctx: &CanvasRenderingContext2d, core: &EngineCore<S>) -> Result<(), JsValue> {
    let Some(surface) = core.viewport().surface() else {
        return Ok(());
    };
    let Some(raster) = core.render_view().map_err(|e| JsValue::from_str(&e.to_string()))? else {
        return Ok(());
    };

    // Layer 1: scene pixels, blitted 1:1 into the backing store.
    ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)?;
    let image = ImageData::new_with_u8_clamped_array_and_sh(Clamped(raster.pixels()), raster.width(), raster.height())?;
    ctx.put_image_data(&image, 0.0, 0.0)?;

    // Layers 2+: overlays in world coordinates.
    let t = core.transform();
    let dpr = surface.dpr;
    ctx.set_transform(t.scale * dpr, 0.0, 0.0, t.scale * dpr, t.translate_x * dpr, t.translate_y * dpr)?;

    if let Ok(page) = page_object(&core.scene) {
        draw_page_outline(ctx, page, t.scale);
    }

    if let Some(obj) = core.selection().and_then(|id| core.object(&id)) {
        draw_selection(ctx, obj, t.scale)?;
    }

    Ok(())
}

fn draw_page_outline(ctx: &CanvasRenderingContext2d, page: &SceneObject, zoom: f64) {
    let b = page.bounds();
    ctx.save();
    ctx.set_stroke_style_str(PAGE_STROKE);
    ctx.set_line_width(1.0 / zoom);
    ctx.stroke_rect(b.x, b.y, b.width, b.height);
    ctx.restore();
}

fn draw_selection(ctx: &CanvasRenderingContext2d, obj: &SceneObject, zoom: f64) -> Result<(), JsValue> {
    ctx.save();

    // Dashed bounding box (rotated with the object).
    translate_and_rotate(ctx, obj)?;

    let w = obj.width * obj.scale;
    let h = obj.height * obj.scale;
    let dash_world = SELECTION_DASH_PX / zoom;

    ctx.set_stroke_style_str(SELECTION_STROKE);
    ctx.set_line_width(1.0 / zoom);
    let dash_array = js_sys::Array::new();
    dash_array.push(&dash_world.into());
    dash_array.push(&dash_world.into());
    ctx.set_line_dash(&dash_array)?;

    ctx.stroke_rect(-w / 2.0, -h / 2.0, w, h);
    ctx.set_line_dash(&js_sys::Array::new())?;

    ctx.restore();
    Ok(())
}

/// Translate to the object's centre and rotate by its angle.
fn translate_and_rotate(ctx: &CanvasRenderingContext2d, obj: &SceneObject) -> Result<(), JsValue> {
    ctx.translate(obj.x, obj.y)?;
    ctx.rotate(obj.angle.to_radians())?;
    Ok(())
}
