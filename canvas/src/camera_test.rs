#![allow(clippy::float_cmp)]

use proptest::prelude::*;

use super::*;

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON * a.abs().max(b.abs()).max(1.0)
}

fn point_approx_eq(a: Point, b: Point) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

fn t(scale: f64, tx: f64, ty: f64) -> ViewportTransform {
    ViewportTransform::new(scale, tx, ty)
}

// --- Point / Rect ---

#[test]
fn point_distance() {
    assert!(approx_eq(Point::new(0.0, 0.0).distance(Point::new(3.0, 4.0)), 5.0));
}

#[test]
fn rect_center() {
    let r = Rect::new(10.0, 20.0, 100.0, 50.0);
    assert_eq!(r.center(), Point::new(60.0, 45.0));
}

#[test]
fn rect_orientation_is_landscape_when_square() {
    assert!(Rect::new(0.0, 0.0, 10.0, 10.0).is_landscape());
    assert!(Rect::new(0.0, 0.0, 2480.0, 1754.0).is_landscape());
    assert!(!Rect::new(0.0, 0.0, 1754.0, 2480.0).is_landscape());
}

// --- Defaults ---

#[test]
fn default_transform_is_identity() {
    let vt = ViewportTransform::default();
    assert_eq!(vt.scale, 1.0);
    assert_eq!(vt.translate_x, 0.0);
    assert_eq!(vt.translate_y, 0.0);
}

// --- to_world ---

#[test]
fn to_world_identity() {
    let world = to_world(Point::new(50.0, 75.0), &ViewportTransform::default());
    assert!(point_approx_eq(world, Point::new(50.0, 75.0)));
}

#[test]
fn to_world_with_scale() {
    let world = to_world(Point::new(40.0, 80.0), &t(4.0, 0.0, 0.0));
    assert!(point_approx_eq(world, Point::new(10.0, 20.0)));
}

#[test]
fn to_world_with_translation() {
    let world = to_world(Point::new(100.0, 50.0), &t(1.0, 100.0, 50.0));
    assert!(point_approx_eq(world, Point::new(0.0, 0.0)));
}

#[test]
fn to_world_origin_with_scale_and_translation() {
    let world = t(2.0, 50.0, 30.0).to_world(Point::new(0.0, 0.0));
    assert!(point_approx_eq(world, Point::new(-25.0, -15.0)));
}

// --- to_device ---

#[test]
fn to_device_with_scale_and_translation() {
    // 5*3 + 20 = 35, 5*3 + 10 = 25
    let device = to_device(Point::new(5.0, 5.0), &t(3.0, 20.0, 10.0));
    assert!(point_approx_eq(device, Point::new(35.0, 25.0)));
}

#[test]
fn to_device_negative_world() {
    let device = t(1.0, 0.0, 0.0).to_device(Point::new(-10.0, -20.0));
    assert!(point_approx_eq(device, Point::new(-10.0, -20.0)));
}

// --- Round trips ---

#[test]
fn round_trip_device_first_over_many_transforms() {
    let transforms = [
        t(1.0, 0.0, 0.0),
        t(2.0, 50.0, -30.0),
        t(0.75, 13.7, -42.3),
        t(0.02, -500.0, 900.0),
        t(12.0, 1e4, -1e4),
    ];
    let points = [Point::new(0.0, 0.0), Point::new(400.0, 300.0), Point::new(-17.5, 1234.25)];
    for vt in &transforms {
        for &p in &points {
            let back = to_device(to_world(p, vt), vt);
            assert!(point_approx_eq(p, back), "{p:?} via {vt:?} came back as {back:?}");
        }
    }
}

#[test]
fn round_trip_world_first() {
    let vt = t(1.5, 10.0, 20.0);
    let world = Point::new(333.3, -999.9);
    assert!(point_approx_eq(world, vt.to_world(vt.to_device(world))));
}

proptest! {
    #[test]
    fn round_trip_holds_for_any_transform(
        scale in 0.02f64..12.0,
        tx in -1e4f64..1e4,
        ty in -1e4f64..1e4,
        x in -1e4f64..1e4,
        y in -1e4f64..1e4,
    ) {
        let vt = t(scale, tx, ty);
        let device = Point::new(x, y);
        let back = to_device(to_world(device, &vt), &vt);
        prop_assert!(point_approx_eq(device, back), "{device:?} via {vt:?} came back as {back:?}");

        let world = Point::new(y, x);
        prop_assert!(point_approx_eq(world, to_world(to_device(world, &vt), &vt)));
    }
}

// --- device_dist_to_world ---

#[test]
fn device_dist_scales_inversely() {
    assert!(approx_eq(t(2.0, 0.0, 0.0).device_dist_to_world(10.0), 5.0));
    assert!(approx_eq(t(0.5, 0.0, 0.0).device_dist_to_world(10.0), 20.0));
}

#[test]
fn device_dist_ignores_translation() {
    assert!(approx_eq(t(4.0, 999.0, -999.0).device_dist_to_world(8.0), 2.0));
}
