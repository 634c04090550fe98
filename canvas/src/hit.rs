#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::Point;
use crate::doc::{ObjectId, SceneObject};

/// Topmost unlocked object containing `world_pt`.
///
/// `objects` must be in draw order (bottom first). Locked objects (the page
/// and the background) are transparent to pointer events.
#[must_use]
pub fn hit_test(world_pt: Point, objects: &[&SceneObject]) -> Option<ObjectId> {
    objects
        .iter()
        .rev()
        .find(|obj| !obj.locked && contains(obj, world_pt))
        .map(|obj| obj.id)
}

/// Whether `world_pt` lies inside the object's rotated bounds.
#[must_use]
pub fn contains(obj: &SceneObject, world_pt: Point) -> bool {
    let local = to_local(obj, world_pt);
    let hw = obj.width * obj.scale * 0.5;
    let hh = obj.height * obj.scale * 0.5;
    local.x.abs() <= hw && local.y.abs() <= hh
}

/// Undo the object's rotation about its centre.
fn to_local(obj: &SceneObject, world_pt: Point) -> Point {
    let dx = world_pt.x - obj.x;
    let dy = world_pt.y - obj.y;
    let (sin, cos) = (-obj.angle.to_radians()).sin_cos();
    Point::new(dx * cos - dy * sin, dx * sin + dy * cos)
}
