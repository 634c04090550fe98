//! Document model: scene objects and the in-memory scene store.
//!
//! A document holds exactly one page region (the printable sheet), at most one
//! background raster, and any number of icons. Draw order is fixed by kind
//! (page, then background, then icons) and within a kind by `z_index`.
//!
//! [`DocStore`] is the reference [`SceneEngine`]: the engine drives it in tests
//! and in headless hosts, and a browser host may substitute its own.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::camera::{Point, Rect, ViewportTransform};
use crate::error::{CanvasError, Result};
use crate::hit;
use crate::scene::SceneEngine;

/// Unique identifier for a scene object.
pub type ObjectId = Uuid;

/// The kind of a scene object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// The fixed printable page; the crop source for every export.
    Page,
    /// The rasterized uploaded document, fitted inside the page.
    Background,
    /// A placed icon.
    Icon,
}

impl ObjectKind {
    /// Draw layer; lower layers are drawn first.
    #[must_use]
    pub fn layer(self) -> u8 {
        match self {
            Self::Page => 0,
            Self::Background => 1,
            Self::Icon => 2,
        }
    }

    /// Page and background are never selectable, rotatable or deletable.
    #[must_use]
    pub fn is_protected(self) -> bool {
        matches!(self, Self::Page | Self::Background)
    }
}

/// Placement of an object: centre position, uniform scale and rotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectTransform {
    /// Centre x in world coordinates.
    pub x: f64,
    /// Centre y in world coordinates.
    pub y: f64,
    /// Uniform scale applied to the intrinsic size.
    pub scale: f64,
    /// Clockwise rotation in degrees, within `[0, 360)`.
    pub angle: f64,
}

fn one() -> f64 {
    1.0
}

/// An object in the scene, as stored and as serialized in snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: ObjectId,
    pub kind: ObjectKind,
    /// Centre x in world coordinates.
    pub x: f64,
    /// Centre y in world coordinates.
    pub y: f64,
    /// Intrinsic width in world units, before `scale`.
    pub width: f64,
    /// Intrinsic height in world units, before `scale`.
    pub height: f64,
    #[serde(default = "one")]
    pub scale: f64,
    /// Clockwise rotation in degrees.
    #[serde(default)]
    pub angle: f64,
    /// Locked objects are neither selectable nor hit by pointer events.
    #[serde(default)]
    pub locked: bool,
    /// Stacking order within the object's layer.
    #[serde(default)]
    pub z_index: i64,
    /// Image source: an asset key or a data URL. Absent for the page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
}

impl SceneObject {
    /// The page region with its top-left corner at the world origin.
    #[must_use]
    pub fn page(width: f64, height: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: ObjectKind::Page,
            x: width * 0.5,
            y: height * 0.5,
            width,
            height,
            scale: 1.0,
            angle: 0.0,
            locked: true,
            z_index: 0,
            src: None,
        }
    }

    /// A background raster of `width` x `height` scaled to fit entirely inside
    /// `page` and centred on it.
    #[must_use]
    pub fn background(src: String, width: f64, height: f64, page: Rect) -> Self {
        let scale = if width > 0.0 && height > 0.0 {
            (page.width / width).min(page.height / height)
        } else {
            1.0
        };
        let center = page.center();
        Self {
            id: Uuid::new_v4(),
            kind: ObjectKind::Background,
            x: center.x,
            y: center.y,
            width,
            height,
            scale,
            angle: 0.0,
            locked: true,
            z_index: 0,
            src: Some(src),
        }
    }

    /// An unlocked icon centred on `center`.
    #[must_use]
    pub fn icon(src: String, width: f64, height: f64, center: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: ObjectKind::Icon,
            x: center.x,
            y: center.y,
            width,
            height,
            scale: 1.0,
            angle: 0.0,
            locked: false,
            z_index: 0,
            src: Some(src),
        }
    }

    #[must_use]
    pub fn transform(&self) -> ObjectTransform {
        ObjectTransform { x: self.x, y: self.y, scale: self.scale, angle: self.angle }
    }

    pub fn apply_transform(&mut self, t: ObjectTransform) {
        self.x = t.x;
        self.y = t.y;
        self.scale = t.scale;
        self.angle = normalize_degrees(t.angle);
    }

    /// Scaled, unrotated bounds in world space.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        let w = self.width * self.scale;
        let h = self.height * self.scale;
        Rect::new(self.x - w * 0.5, self.y - h * 0.5, w, h)
    }

    /// Whether the click-to-rotate gesture applies to this object.
    #[must_use]
    pub fn is_rotatable(&self) -> bool {
        self.kind == ObjectKind::Icon && !self.locked
    }
}

/// Normalize an angle in degrees into `[0, 360)`.
#[must_use]
pub fn normalize_degrees(angle: f64) -> f64 {
    if !angle.is_finite() {
        return 0.0;
    }
    let a = angle.rem_euclid(360.0);
    // rem_euclid can round a tiny negative input up to exactly 360.
    if a >= 360.0 { 0.0 } else { a }
}

/// Serialized form of a whole scene.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneDocument {
    pub objects: Vec<SceneObject>,
}

/// In-memory scene store.
#[derive(Debug, Default)]
pub struct DocStore {
    objects: HashMap<ObjectId, SceneObject>,
    next_z: i64,
    render_requests: u64,
}

impl DocStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an object. If an object with the same `id` already
    /// exists it is overwritten.
    pub fn insert(&mut self, obj: SceneObject) {
        self.next_z = self.next_z.max(obj.z_index.saturating_add(1));
        self.objects.insert(obj.id, obj);
    }

    /// Remove an object by id, returning it if it was present.
    pub fn remove(&mut self, id: &ObjectId) -> Option<SceneObject> {
        self.objects.remove(id)
    }

    /// Return a reference to an object by id.
    #[must_use]
    pub fn get(&self, id: &ObjectId) -> Option<&SceneObject> {
        self.objects.get(id)
    }

    /// Return all objects sorted by `(layer, z_index, id)` for draw-order.
    #[must_use]
    pub fn sorted_objects(&self) -> Vec<&SceneObject> {
        let mut objs: Vec<&SceneObject> = self.objects.values().collect();
        objs.sort_by(|a, b| {
            a.kind
                .layer()
                .cmp(&b.kind.layer())
                .then_with(|| a.z_index.cmp(&b.z_index))
                .then_with(|| a.id.cmp(&b.id))
        });
        objs
    }

    /// Number of objects currently in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns `true` if the store contains no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// How many render requests the store has received.
    #[must_use]
    pub fn render_requests(&self) -> u64 {
        self.render_requests
    }
}

impl SceneEngine for DocStore {
    fn add_object(&mut self, mut object: SceneObject) {
        if object.kind == ObjectKind::Icon {
            object.z_index = self.next_z;
        }
        self.insert(object);
    }

    fn remove_object(&mut self, id: &ObjectId) -> Option<SceneObject> {
        self.remove(id)
    }

    fn objects(&self) -> Vec<&SceneObject> {
        self.sorted_objects()
    }

    fn object(&self, id: &ObjectId) -> Option<&SceneObject> {
        self.get(id)
    }

    fn hit_test(&self, device: Point, transform: &ViewportTransform) -> Option<ObjectId> {
        hit::hit_test(transform.to_world(device), &self.sorted_objects())
    }

    fn set_object_transform(&mut self, id: &ObjectId, transform: ObjectTransform) -> bool {
        let Some(obj) = self.objects.get_mut(id) else {
            return false;
        };
        obj.apply_transform(transform);
        true
    }

    fn set_object_locked(&mut self, id: &ObjectId, locked: bool) -> bool {
        let Some(obj) = self.objects.get_mut(id) else {
            return false;
        };
        obj.locked = locked;
        true
    }

    fn request_render(&mut self) {
        self.render_requests = self.render_requests.saturating_add(1);
    }

    fn serialize(&self) -> Result<serde_json::Value> {
        let doc = SceneDocument { objects: self.sorted_objects().into_iter().cloned().collect() };
        serde_json::to_value(doc).map_err(|e| CanvasError::InvalidSnapshot(e.to_string()))
    }

    fn deserialize(&mut self, scene: &serde_json::Value) -> Result<()> {
        let doc = SceneDocument::deserialize(scene).map_err(|e| CanvasError::InvalidSnapshot(e.to_string()))?;
        for obj in doc.objects {
            self.insert(obj);
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.objects.clear();
        self.next_z = 0;
    }
}
