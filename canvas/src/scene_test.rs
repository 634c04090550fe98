#![allow(clippy::float_cmp)]

use super::*;
use crate::doc::DocStore;

fn icon() -> SceneObject {
    SceneObject::icon("icons/valve.png".into(), 10.0, 10.0, Point::new(5.0, 5.0))
}

#[test]
fn page_region_is_page_bounds() {
    let mut store = DocStore::new();
    store.add_object(SceneObject::page(2480.0, 1754.0));
    store.add_object(icon());
    assert_eq!(page_region(&store).unwrap(), Rect::new(0.0, 0.0, 2480.0, 1754.0));
}

#[test]
fn page_region_missing_is_an_error() {
    let mut store = DocStore::new();
    store.add_object(icon());
    assert!(matches!(page_region(&store), Err(CanvasError::PageRegionMissing)));
}

#[test]
fn duplicate_pages_are_counted() {
    let mut store = DocStore::new();
    store.add_object(SceneObject::page(10.0, 10.0));
    store.add_object(SceneObject::page(10.0, 10.0));
    store.add_object(SceneObject::page(10.0, 10.0));
    assert!(matches!(page_object(&store), Err(CanvasError::DuplicatePageRegion(3))));
}

#[test]
fn ids_of_kind_filters() {
    let mut store = DocStore::new();
    let page = SceneObject::page(10.0, 10.0);
    let page_id = page.id;
    store.add_object(page);
    store.add_object(icon());
    store.add_object(icon());
    assert_eq!(ids_of_kind(&store, ObjectKind::Page), vec![page_id]);
    assert_eq!(ids_of_kind(&store, ObjectKind::Icon).len(), 2);
    assert!(ids_of_kind(&store, ObjectKind::Background).is_empty());
}

#[test]
fn trait_object_hit_test_is_usable() {
    let mut store = DocStore::new();
    let obj = icon();
    let id = obj.id;
    store.add_object(obj);
    let scene: &dyn SceneEngine = &store;
    assert_eq!(scene.hit_test(Point::new(5.0, 5.0), &ViewportTransform::default()), Some(id));
    assert_eq!(scene.object(&id).map(|o| o.kind), Some(ObjectKind::Icon));
}
