use smallvec::{SmallVec, smallvec};
use tracing::{debug, info, warn};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::assets::{AssetLibrary, AssetResolver, RasterImage};
use crate::camera::{Point, ViewportTransform};
use crate::config::CanvasConfig;
use crate::doc::{DocStore, ObjectId, ObjectKind, ObjectTransform, SceneObject, normalize_degrees};
use crate::error::{CanvasError, Result};
use crate::export::{self, ExportFormat, PageSize};
use crate::fit::fit_region;
use crate::input::{Button, GestureConfig, GestureRouter, GestureState, Intent, Key, Modifiers, ObjectHit, UiState, WheelDelta};
use crate::raster;
use crate::render;
use crate::scene::{SceneEngine, ids_of_kind, page_object, page_region};
use crate::snapshot::{self, Reconciliation, SavedDocumentSnapshot};
use crate::upload::{DocumentRasterizer, UploadKind};
use crate::viewport::ViewportController;

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Cursor shown while the pan key is held.
const CURSOR_GRAB: &str = "grab";
/// Cursor shown during a pan.
const CURSOR_GRABBING: &str = "grabbing";
/// Cursor shown otherwise.
const CURSOR_DEFAULT: &str = "default";

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    None,
    ObjectCreated(SceneObject),
    ObjectUpdated { id: ObjectId, transform: ObjectTransform },
    ObjectDeleted { id: ObjectId },
    SelectionChanged(Option<ObjectId>),
    SetCursor(&'static str),
    /// The event was consumed; the host must suppress the browser default.
    SuppressDefault,
    RenderNeeded,
}

/// What one engine call produced. Pointer moves yield at most two actions,
/// so the hot path stays off the heap.
pub type Actions = SmallVec<[Action; 4]>;

/// Core engine state: all logic that doesn't depend on the canvas element.
///
/// Separated from `Engine` so it can be tested without WASM/browser dependencies.
pub struct EngineCore<S: SceneEngine = DocStore> {
    pub scene: S,
    pub assets: AssetLibrary,
    pub ui: UiState,
    viewport: ViewportController,
    router: GestureRouter,
    config: CanvasConfig,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineCore {
    /// An engine with the default configuration and a fresh page.
    #[must_use]
    pub fn new() -> Self {
        let config = CanvasConfig::default();
        let mut scene = DocStore::new();
        scene.add_object(SceneObject::page(config.page_width, config.page_height));
        Self::assemble(scene, config)
    }

    /// An engine with a fresh page sized from `config`.
    ///
    /// # Errors
    ///
    /// [`CanvasError::InvalidConfig`] if `config` does not validate.
    pub fn with_config(config: CanvasConfig) -> Result<Self> {
        Self::with_scene(DocStore::new(), config)
    }
}

impl<S: SceneEngine> EngineCore<S> {
    /// Wrap an existing scene. A scene without a page region gets one sized
    /// from `config`.
    ///
    /// # Errors
    ///
    /// [`CanvasError::InvalidConfig`] for a bad config and
    /// [`CanvasError::DuplicatePageRegion`] if the scene holds several pages.
    pub fn with_scene(mut scene: S, config: CanvasConfig) -> Result<Self> {
        config.validate()?;
        match page_object(&scene) {
            Ok(_) => {}
            Err(CanvasError::PageRegionMissing) => {
                scene.add_object(SceneObject::page(config.page_width, config.page_height));
            }
            Err(err) => return Err(err),
        }
        Ok(Self::assemble(scene, config))
    }

    fn assemble(scene: S, config: CanvasConfig) -> Self {
        Self {
            scene,
            assets: AssetLibrary::new(),
            ui: UiState::default(),
            viewport: ViewportController::new(config.zoom),
            router: GestureRouter::new(GestureConfig::from(&config)),
            config,
        }
    }

    // --- Viewport ---

    /// The host surface has been laid out and measured. Records the size and
    /// fits the page into it; call again on every resize.
    ///
    /// # Errors
    ///
    /// An integrity error if the scene lost its page region.
    pub fn surface_ready(&mut self, width: f64, height: f64, dpr: f64) -> Result<Actions> {
        if !self.viewport.set_surface(width, height, dpr) {
            debug!(width, height, "ignoring unmeasured surface");
            return Ok(Actions::new());
        }
        let actions = self.fit_page()?;
        debug!(width, height, dpr, scale = self.viewport.transform().scale, "surface ready; page fitted");
        Ok(actions)
    }

    /// Fit the page region into the surface. A no-op until the surface is known.
    ///
    /// # Errors
    ///
    /// An integrity error if the scene does not hold exactly one page region.
    pub fn fit_page(&mut self) -> Result<Actions> {
        self.fit_viewport()?;
        Ok(self.render_actions())
    }

    /// Set the fitted transform without forwarding the render request.
    /// Returns false when there is no surface yet.
    fn fit_viewport(&mut self) -> Result<bool> {
        let region = page_region(&self.scene)?;
        let Some(surface) = self.viewport.surface() else {
            return Ok(false);
        };
        let transform = fit_region(
            region,
            surface.width,
            surface.height,
            self.config.fit_padding_px,
            self.viewport.limits(),
        );
        self.viewport.set_transform(transform);
        Ok(true)
    }

    /// Pan by a device-pixel delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) -> Actions {
        self.viewport.pan_by(dx, dy);
        self.render_actions()
    }

    /// Zoom to `scale` (clamped) keeping the world point under `device` fixed.
    pub fn zoom_at(&mut self, device: Point, scale: f64) -> Actions {
        self.viewport.zoom_at(device, scale);
        self.render_actions()
    }

    /// Zoom about the surface centre by an additive step.
    pub fn zoom_by(&mut self, delta: f64) -> Actions {
        self.viewport.zoom_by(delta);
        self.render_actions()
    }

    /// Replace the viewport transform; the scale is clamped into the bounds.
    pub fn set_transform(&mut self, transform: ViewportTransform) -> Actions {
        self.viewport.set_transform(transform);
        self.render_actions()
    }

    pub fn zoom_in(&mut self) -> Actions {
        self.zoom_by(self.config.zoom_step)
    }

    pub fn zoom_out(&mut self) -> Actions {
        self.zoom_by(-self.config.zoom_step)
    }

    /// Back to the identity transform (scale clamped into the zoom bounds).
    pub fn reset_view(&mut self) -> Actions {
        self.set_transform(ViewportTransform::default())
    }

    /// Forward a pending viewport render request to the scene.
    fn flush_render(&mut self) -> bool {
        if self.viewport.take_render_request() {
            self.scene.request_render();
            true
        } else {
            false
        }
    }

    fn render_actions(&mut self) -> Actions {
        if self.flush_render() { smallvec![Action::RenderNeeded] } else { Actions::new() }
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, device: Point, button: Button, modifiers: Modifiers) -> Actions {
        let hit = self.object_hit(device);
        let intent = self.router.on_pointer_down(device, button, modifiers, hit);
        self.apply_intent(intent)
    }

    pub fn on_pointer_move(&mut self, device: Point) -> Actions {
        let intent = self.router.on_pointer_move(device);
        self.apply_intent(intent)
    }

    pub fn on_pointer_up(&mut self, device: Point, button: Button) -> Actions {
        let hit = self.scene.hit_test(device, &self.viewport.transform());
        let intent = self.router.on_pointer_up(device, button, hit);
        self.apply_intent(intent)
    }

    pub fn on_wheel(&mut self, device: Point, delta: WheelDelta) -> Actions {
        let intent = self.router.on_wheel(device, delta);
        let mut actions = self.apply_intent(intent);
        actions.push(Action::SuppressDefault);
        actions
    }

    /// `editing_text` is true while focus is inside a text input; keys then
    /// pass through untouched.
    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers, editing_text: bool) -> Actions {
        let Some(intent) = self.router.on_key_down(key, modifiers, editing_text) else {
            return Actions::new();
        };
        let mut actions = self.apply_intent(intent);
        actions.push(Action::SuppressDefault);
        actions
    }

    pub fn on_key_up(&mut self, key: &Key) -> Actions {
        match self.router.on_key_up(key) {
            Some(intent) => self.apply_intent(intent),
            None => Actions::new(),
        }
    }

    fn object_hit(&self, device: Point) -> Option<ObjectHit> {
        let id = self.scene.hit_test(device, &self.viewport.transform())?;
        let rotatable = self.scene.object(&id).is_some_and(SceneObject::is_rotatable);
        Some(ObjectHit { id, rotatable })
    }

    fn apply_intent(&mut self, intent: Intent) -> Actions {
        let mut actions = Actions::new();
        match intent {
            Intent::None | Intent::ClickReleased { .. } | Intent::DragEnded { .. } => {}
            Intent::PanStarted { deselect } => {
                if deselect {
                    actions.extend(self.select(None));
                }
                actions.push(Action::SetCursor(CURSOR_GRABBING));
            }
            Intent::PanBy { dx, dy } => actions.extend(self.pan_by(dx, dy)),
            Intent::PanEnded => {
                let cursor = if self.router.pan_key_held() { CURSOR_GRAB } else { CURSOR_DEFAULT };
                actions.push(Action::SetCursor(cursor));
            }
            Intent::Select { id } => actions.extend(self.select(Some(id))),
            Intent::DragBy { id, dx, dy } => actions.extend(self.drag_object(&id, dx, dy)),
            Intent::Rotate { id, degrees } => actions.extend(self.rotate_object(&id, degrees)),
            Intent::ZoomBy { anchor, factor } => {
                let target = self.viewport.transform().scale * factor;
                actions.extend(self.zoom_at(anchor, target));
            }
            Intent::DeleteSelection => actions.extend(self.delete_selection()),
            Intent::PanKey { held } => {
                let idle = matches!(self.router.state(), GestureState::Idle | GestureState::PanCandidate);
                if idle {
                    let cursor = if held { CURSOR_GRAB } else { CURSOR_DEFAULT };
                    actions.push(Action::SetCursor(cursor));
                }
            }
        }
        actions
    }

    // --- Object operations ---

    /// Change the selection. Protected objects are never selected.
    pub fn select(&mut self, id: Option<ObjectId>) -> Actions {
        let id = id.filter(|id| self.scene.object(id).is_some_and(|o| !o.kind.is_protected()));
        if self.ui.selected_id == id {
            return Actions::new();
        }
        self.ui.selected_id = id;
        self.scene.request_render();
        smallvec![Action::SelectionChanged(id), Action::RenderNeeded]
    }

    /// Move an object by a device-pixel delta.
    fn drag_object(&mut self, id: &ObjectId, dx: f64, dy: f64) -> Actions {
        let Some(mut transform) = self.scene.object(id).map(SceneObject::transform) else {
            return Actions::new();
        };
        let vt = self.viewport.transform();
        transform.x += vt.device_dist_to_world(dx);
        transform.y += vt.device_dist_to_world(dy);
        self.update_transform(id, transform)
    }

    /// Rotate an icon by `degrees`, normalizing the result into `[0, 360)`.
    pub fn rotate_object(&mut self, id: &ObjectId, degrees: f64) -> Actions {
        let Some(obj) = self.scene.object(id) else {
            return Actions::new();
        };
        if !obj.is_rotatable() {
            debug!(%id, kind = ?obj.kind, "rotation refused");
            return Actions::new();
        }
        let mut transform = obj.transform();
        transform.angle = normalize_degrees(transform.angle + degrees);
        self.update_transform(id, transform)
    }

    fn update_transform(&mut self, id: &ObjectId, transform: ObjectTransform) -> Actions {
        if !self.scene.set_object_transform(id, transform) {
            return Actions::new();
        }
        self.scene.request_render();
        let stored = self.scene.object(id).map_or(transform, SceneObject::transform);
        smallvec![Action::ObjectUpdated { id: *id, transform: stored }, Action::RenderNeeded]
    }

    /// Remove the selected object unless it is the page or the background.
    pub fn delete_selection(&mut self) -> Actions {
        let Some(id) = self.ui.selected_id else {
            return Actions::new();
        };
        match self.scene.object(&id).map(|o| o.kind) {
            Some(kind) if kind.is_protected() => {
                debug!(%id, ?kind, "refusing to delete protected object");
                return Actions::new();
            }
            Some(_) => {}
            None => {
                self.ui.selected_id = None;
                return smallvec![Action::SelectionChanged(None)];
            }
        }
        self.scene.remove_object(&id);
        self.ui.selected_id = None;
        self.scene.request_render();
        smallvec![Action::ObjectDeleted { id }, Action::SelectionChanged(None), Action::RenderNeeded]
    }

    /// Make `raster` available to icons placed with `key`.
    pub fn register_asset(&mut self, key: impl Into<String>, raster: RasterImage) {
        self.assets.insert(key, raster);
    }

    /// Place the asset named by a drag-and-drop payload centred on a
    /// device-space drop point.
    ///
    /// # Errors
    ///
    /// [`CanvasError::UnknownAsset`] for an empty or unregistered payload.
    pub fn drop_asset(&mut self, payload: &str, device: Point) -> Result<Actions> {
        let world = self.viewport.transform().to_world(device);
        self.place_icon(payload, world)
    }

    /// Place the asset `key` centred on a world-space point.
    ///
    /// # Errors
    ///
    /// [`CanvasError::UnknownAsset`] for an empty or unregistered key.
    pub fn place_icon(&mut self, key: &str, world: Point) -> Result<Actions> {
        let key = key.trim();
        if key.is_empty() {
            warn!("rejected drop with empty payload");
            return Err(CanvasError::UnknownAsset("empty drop payload".into()));
        }
        let Some(image) = self.assets.resolve(key) else {
            warn!(key, "rejected drop of unregistered asset");
            return Err(CanvasError::UnknownAsset(key.to_owned()));
        };
        let icon = SceneObject::icon(key.to_owned(), f64::from(image.width()), f64::from(image.height()), world);
        let id = icon.id;
        self.scene.add_object(icon);
        self.scene.request_render();
        debug!(%id, key, x = world.x, y = world.y, "icon placed");
        let created = self.scene.object(&id).cloned().map_or(Action::None, Action::ObjectCreated);
        Ok(smallvec![created, Action::RenderNeeded])
    }

    // --- Background ---

    /// Rasterize an uploaded document and make its first page the background.
    ///
    /// # Errors
    ///
    /// [`CanvasError::UnsupportedUpload`] for a file type outside pdf/png/jpg,
    /// and whatever the rasterizer reports. The scene is untouched on error.
    pub fn upload_background(
        &mut self,
        file_name: &str,
        bytes: &[u8],
        rasterizer: &dyn DocumentRasterizer,
    ) -> Result<Actions> {
        let kind = UploadKind::from_file_name(file_name).inspect_err(|err| warn!(file_name, %err, "upload rejected"))?;
        let raster = rasterizer
            .render_first_page(kind, bytes, self.config.background_render_scale)
            .inspect_err(|err| warn!(file_name, ?kind, %err, "rasterizing upload failed"))?;
        self.set_background(raster)
    }

    /// Replace the background with `raster`, fitted inside the page and
    /// centred, then re-fit the viewport.
    ///
    /// # Errors
    ///
    /// An integrity error if the page region is missing, or
    /// [`CanvasError::Encoder`] if the raster cannot be inlined.
    pub fn set_background(&mut self, raster: RasterImage) -> Result<Actions> {
        let page = page_region(&self.scene)?;
        let src = raster.to_data_url()?;
        let background =
            SceneObject::background(src.clone(), f64::from(raster.width()), f64::from(raster.height()), page);

        let mut actions = Actions::new();
        for old in ids_of_kind(&self.scene, ObjectKind::Background) {
            if let Some(removed) = self.scene.remove_object(&old) {
                if let Some(old_src) = removed.src {
                    self.assets.remove(&old_src);
                }
            }
            actions.push(Action::ObjectDeleted { id: old });
        }

        info!(width = raster.width(), height = raster.height(), replaced = actions.len(), "background set");
        self.assets.insert(src, raster);
        self.scene.add_object(background.clone());
        self.scene.request_render();
        actions.push(Action::ObjectCreated(background));

        // One render covers both the new background and the re-fit.
        self.fit_viewport()?;
        self.flush_render();
        actions.push(Action::RenderNeeded);
        Ok(actions)
    }

    // --- Export ---

    /// Render the page region at `multiplier` (the configured default when
    /// `None`). Independent of the live viewport.
    ///
    /// # Errors
    ///
    /// An integrity error without exactly one page region, or
    /// [`CanvasError::InvalidExport`] for an out-of-range multiplier.
    pub fn render_page(&self, multiplier: Option<f64>) -> Result<RasterImage> {
        export::render_page(&self.scene, &self.assets, multiplier.unwrap_or(self.config.export_multiplier))
    }

    /// Render and encode the page region.
    ///
    /// # Errors
    ///
    /// As [`EngineCore::render_page`], plus encoder failures.
    pub fn export_page(&self, format: ExportFormat, multiplier: Option<f64>) -> Result<Vec<u8>> {
        let region = page_region(&self.scene)?;
        let raster = self.render_page(multiplier)?;
        let page = PageSize::for_region(region, self.config.page_long_edge_mm, self.config.page_short_edge_mm);
        let bytes = export::encode(&raster, format, page, self.config.jpeg_quality)?;
        info!(
            %format,
            width = raster.width(),
            height = raster.height(),
            bytes = bytes.len(),
            "page exported"
        );
        Ok(bytes)
    }

    /// Render the visible viewport at backing-store resolution, or `None`
    /// before the surface has been measured.
    ///
    /// # Errors
    ///
    /// [`CanvasError::InvalidImage`] if the surface cannot be allocated.
    pub fn render_view(&self) -> Result<Option<RasterImage>> {
        let Some(surface) = self.viewport.surface() else {
            return Ok(None);
        };
        let (w, h) = backing_size(surface.width, surface.height, surface.dpr);
        let raster = raster::render_view(
            &self.scene.objects(),
            &self.assets,
            &self.viewport.transform(),
            w,
            h,
            surface.dpr,
        )?;
        Ok(Some(raster))
    }

    // --- Snapshots ---

    /// Capture the scene under `name`, stamped `saved_at` (ms since epoch).
    ///
    /// # Errors
    ///
    /// Propagates the scene's serialization error.
    pub fn snapshot(&self, name: &str, saved_at: i64) -> Result<SavedDocumentSnapshot> {
        snapshot::capture(&self.scene, name, saved_at)
    }

    /// Replace the scene with `snapshot`, reconcile, and re-fit the page.
    ///
    /// # Errors
    ///
    /// Input errors for a bad snapshot; the scene is rolled back on error.
    pub fn restore(&mut self, snapshot: &SavedDocumentSnapshot) -> Result<Reconciliation> {
        let report = snapshot::restore_into(&mut self.scene, &mut self.assets, snapshot)
            .inspect_err(|err| warn!(name = %snapshot.name, %err, "restore rejected"))?;
        if report.changed() {
            warn!(
                relocked = report.relocked,
                unlocked = report.unlocked,
                angles = report.angles_normalized,
                backgrounds_dropped = report.backgrounds_dropped,
                "snapshot needed reconciliation"
            );
        }
        info!(name = %snapshot.name, objects = report.objects, "snapshot restored");
        self.ui = UiState::default();
        self.router.reset();
        self.fit_viewport()?;
        self.flush_render();
        Ok(report)
    }

    /// Parse an imported JSON document and restore it.
    ///
    /// # Errors
    ///
    /// As [`SavedDocumentSnapshot::from_json`] and [`EngineCore::restore`].
    pub fn import_snapshot(&mut self, raw: &str) -> Result<Reconciliation> {
        let snapshot = SavedDocumentSnapshot::from_json(raw).inspect_err(|err| warn!(%err, "import rejected"))?;
        self.restore(&snapshot)
    }

    // --- Queries ---

    /// The currently selected object, if any.
    #[must_use]
    pub fn selection(&self) -> Option<ObjectId> {
        self.ui.selected_id
    }

    #[must_use]
    pub fn transform(&self) -> ViewportTransform {
        self.viewport.transform()
    }

    #[must_use]
    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    #[must_use]
    pub fn gesture_state(&self) -> GestureState {
        self.router.state()
    }

    #[must_use]
    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    /// Look up an object by ID.
    #[must_use]
    pub fn object(&self, id: &ObjectId) -> Option<&SceneObject> {
        self.scene.object(id)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn backing_size(width: f64, height: f64, dpr: f64) -> (u32, u32) {
    let px = |v: f64| (v * dpr).round().max(1.0) as u32;
    (px(width), px(height))
}

/// The full canvas engine. Wraps `EngineCore` and owns the browser canvas element.
pub struct Engine {
    canvas: HtmlCanvasElement,
    pub core: EngineCore,
}

impl Engine {
    /// Create a new engine bound to the given canvas element.
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        Self { canvas, core: EngineCore::new() }
    }

    /// Report the measured CSS size and device pixel ratio after layout.
    /// Resizes the backing store and fits the page.
    ///
    /// # Errors
    ///
    /// As [`EngineCore::surface_ready`].
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) -> Result<Actions> {
        let actions = self.core.surface_ready(width_css, height_css, dpr)?;
        if let Some(surface) = self.core.viewport().surface() {
            let (w, h) = backing_size(surface.width, surface.height, surface.dpr);
            self.canvas.set_width(w);
            self.canvas.set_height(h);
        }
        Ok(actions)
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Actions {
        self.core.on_pointer_down(screen_pt, button, modifiers)
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point) -> Actions {
        self.core.on_pointer_move(screen_pt)
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, button: Button) -> Actions {
        self.core.on_pointer_up(screen_pt, button)
    }

    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta) -> Actions {
        self.core.on_wheel(screen_pt, delta)
    }

    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers, editing_text: bool) -> Actions {
        self.core.on_key_down(key, modifiers, editing_text)
    }

    pub fn on_key_up(&mut self, key: &Key) -> Actions {
        self.core.on_key_up(key)
    }

    /// Drop handler: `payload` is the drag-data string.
    ///
    /// # Errors
    ///
    /// As [`EngineCore::drop_asset`].
    pub fn on_drop(&mut self, payload: &str, screen_pt: Point) -> Result<Actions> {
        self.core.drop_asset(payload, screen_pt)
    }

    /// Capture the scene stamped with the browser clock.
    ///
    /// # Errors
    ///
    /// As [`EngineCore::snapshot`].
    #[allow(clippy::cast_possible_truncation)]
    pub fn snapshot(&self, name: &str) -> Result<SavedDocumentSnapshot> {
        self.core.snapshot(name, js_sys::Date::now() as i64)
    }

    // --- Render ---

    /// Draw the current state to the canvas.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the 2D context is unavailable or a `Canvas2D` call fails.
    pub fn render(&self) -> std::result::Result<(), JsValue> {
        let ctx = self
            .canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(JsValue::from)?;
        render::draw(&ctx, &self.core)
    }

    // --- Delegated queries ---

    #[must_use]
    pub fn selection(&self) -> Option<ObjectId> {
        self.core.selection()
    }

    #[must_use]
    pub fn transform(&self) -> ViewportTransform {
        self.core.transform()
    }

    #[must_use]
    pub fn object(&self, id: &ObjectId) -> Option<&SceneObject> {
        self.core.object(id)
    }
}
