#![allow(clippy::float_cmp)]

use serde_json::json;

use super::*;

fn icon(x: f64, y: f64) -> SceneObject {
    SceneObject::icon("icons/valve.png".into(), 32.0, 32.0, Point::new(x, y))
}

// =============================================================
// ObjectKind
// =============================================================

#[test]
fn kind_serde_lowercase() {
    let cases = [
        (ObjectKind::Page, "\"page\""),
        (ObjectKind::Background, "\"background\""),
        (ObjectKind::Icon, "\"icon\""),
    ];
    for (kind, expected) in cases {
        assert_eq!(serde_json::to_string(&kind).unwrap(), expected);
        let back: ObjectKind = serde_json::from_str(expected).unwrap();
        assert_eq!(back, kind);
    }
}

#[test]
fn kind_layers_order_page_background_icon() {
    assert!(ObjectKind::Page.layer() < ObjectKind::Background.layer());
    assert!(ObjectKind::Background.layer() < ObjectKind::Icon.layer());
}

#[test]
fn only_page_and_background_are_protected() {
    assert!(ObjectKind::Page.is_protected());
    assert!(ObjectKind::Background.is_protected());
    assert!(!ObjectKind::Icon.is_protected());
}

// =============================================================
// SceneObject constructors
// =============================================================

#[test]
fn page_is_locked_at_origin() {
    let page = SceneObject::page(2480.0, 1754.0);
    assert!(page.locked);
    assert_eq!(page.bounds(), Rect::new(0.0, 0.0, 2480.0, 1754.0));
    assert!(!page.is_rotatable());
}

#[test]
fn background_fits_inside_page_and_centres() {
    let page = Rect::new(0.0, 0.0, 2480.0, 1754.0);
    // Portrait document on a landscape page: height limits.
    let bg = SceneObject::background("data:image/png;base64,".into(), 1000.0, 2000.0, page);
    assert!(bg.locked);
    assert_eq!(bg.scale, 1754.0 / 2000.0);
    let b = bg.bounds();
    assert!((b.height - 1754.0).abs() < 1e-9);
    assert!(b.width <= page.width);
    assert_eq!(bg.x, 1240.0);
    assert_eq!(bg.y, 877.0);
}

#[test]
fn icon_is_unlocked_and_rotatable() {
    let obj = icon(10.0, 20.0);
    assert!(!obj.locked);
    assert!(obj.is_rotatable());
    assert_eq!(obj.bounds(), Rect::new(-6.0, 4.0, 32.0, 32.0));
}

#[test]
fn locked_icon_is_not_rotatable() {
    let mut obj = icon(0.0, 0.0);
    obj.locked = true;
    assert!(!obj.is_rotatable());
}

#[test]
fn apply_transform_normalizes_angle() {
    let mut obj = icon(0.0, 0.0);
    obj.apply_transform(ObjectTransform { x: 5.0, y: 6.0, scale: 2.0, angle: -90.0 });
    assert_eq!(obj.transform(), ObjectTransform { x: 5.0, y: 6.0, scale: 2.0, angle: 270.0 });
}

// =============================================================
// normalize_degrees
// =============================================================

#[test]
fn normalize_degrees_wraps_into_range() {
    assert_eq!(normalize_degrees(0.0), 0.0);
    assert_eq!(normalize_degrees(360.0), 0.0);
    assert_eq!(normalize_degrees(450.0), 90.0);
    assert_eq!(normalize_degrees(-90.0), 270.0);
    assert_eq!(normalize_degrees(-720.0), 0.0);
}

#[test]
fn normalize_degrees_never_returns_360() {
    let a = normalize_degrees(-1e-20);
    assert!((0.0..360.0).contains(&a));
}

#[test]
fn normalize_degrees_non_finite_is_zero() {
    assert_eq!(normalize_degrees(f64::NAN), 0.0);
    assert_eq!(normalize_degrees(f64::INFINITY), 0.0);
}

// =============================================================
// SceneObject serde
// =============================================================

#[test]
fn scene_object_defaults_optional_fields() {
    let id = Uuid::new_v4();
    let obj: SceneObject = serde_json::from_value(json!({
        "id": id,
        "kind": "icon",
        "x": 1.0, "y": 2.0, "width": 3.0, "height": 4.0,
    }))
    .unwrap();
    assert_eq!(obj.scale, 1.0);
    assert_eq!(obj.angle, 0.0);
    assert!(!obj.locked);
    assert!(obj.src.is_none());
}

#[test]
fn page_serializes_without_src() {
    let value = serde_json::to_value(SceneObject::page(10.0, 10.0)).unwrap();
    assert!(value.get("src").is_none());
    assert_eq!(value["kind"], "page");
}

// =============================================================
// DocStore
// =============================================================

#[test]
fn insert_get_remove() {
    let mut store = DocStore::new();
    let obj = icon(0.0, 0.0);
    let id = obj.id;
    store.insert(obj);
    assert_eq!(store.len(), 1);
    assert!(store.get(&id).is_some());
    assert!(store.remove(&id).is_some());
    assert!(store.is_empty());
}

#[test]
fn sorted_objects_orders_by_layer_then_insertion() {
    let mut store = DocStore::new();
    let a = icon(0.0, 0.0);
    let b = icon(0.0, 0.0);
    let page = SceneObject::page(100.0, 100.0);
    let bg = SceneObject::background("bg".into(), 10.0, 10.0, page.bounds());
    let (a_id, b_id, page_id, bg_id) = (a.id, b.id, page.id, bg.id);

    store.add_object(a);
    store.add_object(bg);
    store.add_object(b);
    store.add_object(page);

    let order: Vec<ObjectId> = store.objects().iter().map(|o| o.id).collect();
    assert_eq!(order, vec![page_id, bg_id, a_id, b_id]);
}

#[test]
fn hit_test_uses_viewport_transform() {
    let mut store = DocStore::new();
    let obj = icon(100.0, 100.0);
    let id = obj.id;
    store.add_object(obj);
    let vt = ViewportTransform::new(2.0, 10.0, 10.0);
    // world (100, 100) -> device (210, 210)
    assert_eq!(store.hit_test(Point::new(210.0, 210.0), &vt), Some(id));
    assert!(store.hit_test(Point::new(100.0, 100.0), &vt).is_none());
}

#[test]
fn set_object_transform_missing_returns_false() {
    let mut store = DocStore::new();
    let t = ObjectTransform { x: 0.0, y: 0.0, scale: 1.0, angle: 0.0 };
    assert!(!store.set_object_transform(&Uuid::new_v4(), t));
}

#[test]
fn set_object_locked_toggles() {
    let mut store = DocStore::new();
    let obj = icon(0.0, 0.0);
    let id = obj.id;
    store.add_object(obj);
    assert!(store.set_object_locked(&id, true));
    assert!(store.get(&id).is_some_and(|o| o.locked));
}

#[test]
fn request_render_counts() {
    let mut store = DocStore::new();
    store.request_render();
    store.request_render();
    assert_eq!(store.render_requests(), 2);
}

#[test]
fn serialize_then_deserialize_into_empty_store() {
    let mut store = DocStore::new();
    store.add_object(SceneObject::page(100.0, 50.0));
    store.add_object(icon(10.0, 10.0));
    store.add_object(icon(20.0, 20.0));
    let json = store.serialize().unwrap();
    assert_eq!(json["objects"].as_array().map(Vec::len), Some(3));

    let mut other = DocStore::new();
    other.deserialize(&json).unwrap();
    let a: Vec<&SceneObject> = store.objects();
    let b: Vec<&SceneObject> = other.objects();
    assert_eq!(a, b);
}

#[test]
fn deserialize_rejects_malformed_scene() {
    let mut store = DocStore::new();
    let err = store.deserialize(&json!({ "objects": [{ "kind": "icon" }] }));
    assert!(matches!(err, Err(CanvasError::InvalidSnapshot(_))));
    assert!(store.is_empty());
}

#[test]
fn icons_added_after_deserialize_stack_on_top() {
    let mut store = DocStore::new();
    let mut old = icon(0.0, 0.0);
    old.z_index = 41;
    store.deserialize(&json!({ "objects": [old] })).unwrap();
    let fresh = icon(0.0, 0.0);
    let fresh_id = fresh.id;
    store.add_object(fresh);
    assert_eq!(store.get(&fresh_id).map(|o| o.z_index), Some(42));
}

#[test]
fn clear_empties_store() {
    let mut store = DocStore::new();
    store.add_object(icon(0.0, 0.0));
    store.clear();
    assert!(store.is_empty());
}
