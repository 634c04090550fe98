//! Scene-engine contract consumed by the viewport core.
//!
//! The scene engine owns the authoritative object list, hit-tests and draws.
//! The core only reads objects, writes transform and lock mutations, and asks
//! for redraws. [`crate::doc::DocStore`] is the in-crate implementation.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use crate::camera::{Point, Rect, ViewportTransform};
use crate::doc::{ObjectId, ObjectKind, ObjectTransform, SceneObject};
use crate::error::{CanvasError, Result};

pub trait SceneEngine {
    fn add_object(&mut self, object: SceneObject);

    fn remove_object(&mut self, id: &ObjectId) -> Option<SceneObject>;

    /// All objects in draw order, bottom first.
    fn objects(&self) -> Vec<&SceneObject>;

    fn object(&self, id: &ObjectId) -> Option<&SceneObject>;

    /// Topmost unlocked object under a device-space point.
    fn hit_test(&self, device: Point, transform: &ViewportTransform) -> Option<ObjectId>;

    /// Returns false if the object does not exist.
    fn set_object_transform(&mut self, id: &ObjectId, transform: ObjectTransform) -> bool;

    /// Returns false if the object does not exist.
    fn set_object_locked(&mut self, id: &ObjectId, locked: bool) -> bool;

    /// Ask for a redraw. Coalescing is the scene's business.
    fn request_render(&mut self);

    /// # Errors
    ///
    /// Returns an error if the scene cannot be represented as JSON.
    fn serialize(&self) -> Result<serde_json::Value>;

    /// Add the objects described by `scene` to the current contents.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidSnapshot`] if `scene` is malformed.
    fn deserialize(&mut self, scene: &serde_json::Value) -> Result<()>;

    fn clear(&mut self);
}

/// Ids of every object of `kind`, in draw order.
pub fn ids_of_kind<S: SceneEngine + ?Sized>(scene: &S, kind: ObjectKind) -> Vec<ObjectId> {
    scene.objects().into_iter().filter(|o| o.kind == kind).map(|o| o.id).collect()
}

/// The single page object.
///
/// # Errors
///
/// [`CanvasError::PageRegionMissing`] if there is none and
/// [`CanvasError::DuplicatePageRegion`] if there are several.
pub fn page_object<S: SceneEngine + ?Sized>(scene: &S) -> Result<&SceneObject> {
    let mut pages = scene.objects().into_iter().filter(|o| o.kind == ObjectKind::Page);
    let first = pages.next().ok_or(CanvasError::PageRegionMissing)?;
    let extra = pages.count();
    if extra > 0 {
        return Err(CanvasError::DuplicatePageRegion(extra + 1));
    }
    Ok(first)
}

/// World-space rectangle of the single page object.
///
/// # Errors
///
/// Same as [`page_object`].
pub fn page_region<S: SceneEngine + ?Sized>(scene: &S) -> Result<Rect> {
    page_object(scene).map(SceneObject::bounds)
}
