#![allow(clippy::float_cmp)]

use uuid::Uuid;

use super::*;

fn router() -> GestureRouter {
    GestureRouter::new(GestureConfig::default())
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn hit(id: ObjectId) -> Option<ObjectHit> {
    Some(ObjectHit { id, rotatable: true })
}

fn key(name: &str) -> Key {
    Key::new(name)
}

const NO_MODS: Modifiers = Modifiers { shift: false, ctrl: false, alt: false, meta: false };
const SHIFT: Modifiers = Modifiers { shift: true, ctrl: false, alt: false, meta: false };

// =============================================================
// Modifiers / Key
// =============================================================

#[test]
fn modifiers_default_all_false() {
    let m = Modifiers::default();
    assert!(!m.any());
    assert_eq!(m, NO_MODS);
}

#[test]
fn modifiers_any_detects_each_key() {
    assert!(SHIFT.any());
    assert!(Modifiers { ctrl: true, ..NO_MODS }.any());
    assert!(Modifiers { alt: true, ..NO_MODS }.any());
    assert!(Modifiers { meta: true, ..NO_MODS }.any());
}

#[test]
fn key_names_for_space() {
    assert!(key(" ").is_pan_key());
    assert!(key("Space").is_pan_key());
    assert!(!key("s").is_pan_key());
}

// =============================================================
// Panning
// =============================================================

#[test]
fn press_on_empty_space_pans_and_deselects() {
    let mut r = router();
    let intent = r.on_pointer_down(pt(10.0, 10.0), Button::Primary, NO_MODS, None);
    assert_eq!(intent, Intent::PanStarted { deselect: true });
    assert_eq!(r.state(), GestureState::Panning { last: pt(10.0, 10.0) });
}

#[test]
fn pan_moves_report_incremental_deltas() {
    let mut r = router();
    r.on_pointer_down(pt(10.0, 10.0), Button::Primary, NO_MODS, None);
    assert_eq!(r.on_pointer_move(pt(15.0, 12.0)), Intent::PanBy { dx: 5.0, dy: 2.0 });
    assert_eq!(r.on_pointer_move(pt(14.0, 20.0)), Intent::PanBy { dx: -1.0, dy: 8.0 });
    assert_eq!(r.on_pointer_up(pt(14.0, 20.0), Button::Primary, None), Intent::PanEnded);
    assert_eq!(r.state(), GestureState::Idle);
}

#[test]
fn middle_button_pans_even_over_objects() {
    let mut r = router();
    let id = Uuid::new_v4();
    let intent = r.on_pointer_down(pt(0.0, 0.0), Button::Middle, NO_MODS, hit(id));
    assert_eq!(intent, Intent::PanStarted { deselect: false });
    assert!(matches!(r.state(), GestureState::Panning { .. }));
}

#[test]
fn secondary_button_is_ignored() {
    let mut r = router();
    let id = Uuid::new_v4();
    assert_eq!(r.on_pointer_down(pt(0.0, 0.0), Button::Secondary, NO_MODS, hit(id)), Intent::None);
    assert_eq!(r.state(), GestureState::Idle);
    assert_eq!(r.on_pointer_up(pt(0.0, 0.0), Button::Secondary, Some(id)), Intent::None);
}

#[test]
fn space_held_pans_over_objects_without_deselecting() {
    let mut r = router();
    assert_eq!(r.on_key_down(&key(" "), NO_MODS, false), Some(Intent::PanKey { held: true }));
    assert_eq!(r.state(), GestureState::PanCandidate);

    let id = Uuid::new_v4();
    let intent = r.on_pointer_down(pt(5.0, 5.0), Button::Primary, NO_MODS, hit(id));
    assert_eq!(intent, Intent::PanStarted { deselect: false });

    // Releasing the pointer with space still held re-arms the pan.
    r.on_pointer_up(pt(5.0, 5.0), Button::Primary, Some(id));
    assert_eq!(r.state(), GestureState::PanCandidate);

    assert_eq!(r.on_key_up(&key(" ")), Some(Intent::PanKey { held: false }));
    assert_eq!(r.state(), GestureState::Idle);
}

#[test]
fn releasing_space_mid_pan_keeps_panning_until_pointer_up() {
    let mut r = router();
    r.on_key_down(&key(" "), NO_MODS, false);
    r.on_pointer_down(pt(0.0, 0.0), Button::Primary, NO_MODS, None);
    r.on_key_up(&key(" "));
    assert_eq!(r.on_pointer_move(pt(3.0, 4.0)), Intent::PanBy { dx: 3.0, dy: 4.0 });
    r.on_pointer_up(pt(3.0, 4.0), Button::Primary, None);
    assert_eq!(r.state(), GestureState::Idle);
}

#[test]
fn move_without_press_does_nothing() {
    let mut r = router();
    assert_eq!(r.on_pointer_move(pt(100.0, 100.0)), Intent::None);
    assert_eq!(r.on_pointer_up(pt(100.0, 100.0), Button::Primary, None), Intent::None);
}

// =============================================================
// Click-to-rotate vs drag
// =============================================================

#[test]
fn press_on_object_selects_and_becomes_click_candidate() {
    let mut r = router();
    let id = Uuid::new_v4();
    assert_eq!(r.on_pointer_down(pt(50.0, 50.0), Button::Primary, NO_MODS, hit(id)), Intent::Select { id });
    assert!(matches!(r.state(), GestureState::ClickCandidate { target, .. } if target == id));
}

#[test]
fn click_within_threshold_rotates_clockwise() {
    let mut r = router();
    let id = Uuid::new_v4();
    r.on_pointer_down(pt(50.0, 50.0), Button::Primary, NO_MODS, hit(id));
    assert_eq!(r.on_pointer_move(pt(53.0, 54.0)), Intent::None);
    let intent = r.on_pointer_up(pt(53.0, 54.0), Button::Primary, Some(id));
    assert_eq!(intent, Intent::Rotate { id, degrees: 90.0 });
    assert_eq!(r.state(), GestureState::Idle);
}

#[test]
fn shift_click_rotates_counter_clockwise() {
    let mut r = router();
    let id = Uuid::new_v4();
    r.on_pointer_down(pt(50.0, 50.0), Button::Primary, SHIFT, hit(id));
    assert_eq!(r.on_pointer_up(pt(50.0, 50.0), Button::Primary, Some(id)), Intent::Rotate { id, degrees: -90.0 });
}

#[test]
fn release_over_a_different_object_does_not_rotate() {
    let mut r = router();
    let id = Uuid::new_v4();
    r.on_pointer_down(pt(50.0, 50.0), Button::Primary, NO_MODS, hit(id));
    let other = Uuid::new_v4();
    assert_eq!(r.on_pointer_up(pt(51.0, 50.0), Button::Primary, Some(other)), Intent::ClickReleased { id });
}

#[test]
fn non_rotatable_object_is_only_selected() {
    let mut r = router();
    let id = Uuid::new_v4();
    r.on_pointer_down(pt(0.0, 0.0), Button::Primary, NO_MODS, Some(ObjectHit { id, rotatable: false }));
    assert_eq!(r.on_pointer_up(pt(0.0, 0.0), Button::Primary, Some(id)), Intent::ClickReleased { id });
}

#[test]
fn movement_exactly_at_threshold_is_still_a_click() {
    let mut r = router();
    let id = Uuid::new_v4();
    r.on_pointer_down(pt(0.0, 0.0), Button::Primary, NO_MODS, hit(id));
    assert_eq!(r.on_pointer_move(pt(3.0, 4.0)), Intent::None);
    assert_eq!(r.on_pointer_up(pt(3.0, 4.0), Button::Primary, Some(id)), Intent::Rotate { id, degrees: 90.0 });
}

#[test]
fn crossing_threshold_starts_drag_with_full_offset() {
    let mut r = router();
    let id = Uuid::new_v4();
    r.on_pointer_down(pt(0.0, 0.0), Button::Primary, NO_MODS, hit(id));
    assert_eq!(r.on_pointer_move(pt(6.0, 0.0)), Intent::DragBy { id, dx: 6.0, dy: 0.0 });
    assert_eq!(r.on_pointer_move(pt(10.0, 2.0)), Intent::DragBy { id, dx: 4.0, dy: 2.0 });
    assert_eq!(r.on_pointer_up(pt(10.0, 2.0), Button::Primary, Some(id)), Intent::DragEnded { id });
    assert_eq!(r.state(), GestureState::Idle);
}

#[test]
fn drag_that_returns_to_start_does_not_rotate() {
    let mut r = router();
    let id = Uuid::new_v4();
    r.on_pointer_down(pt(0.0, 0.0), Button::Primary, NO_MODS, hit(id));
    r.on_pointer_move(pt(20.0, 0.0));
    r.on_pointer_move(pt(0.0, 0.0));
    assert_eq!(r.on_pointer_up(pt(0.0, 0.0), Button::Primary, Some(id)), Intent::DragEnded { id });
}

#[test]
fn release_beyond_threshold_without_move_events_is_not_a_click() {
    let mut r = router();
    let id = Uuid::new_v4();
    r.on_pointer_down(pt(0.0, 0.0), Button::Primary, NO_MODS, hit(id));
    assert_eq!(r.on_pointer_up(pt(30.0, 0.0), Button::Primary, Some(id)), Intent::ClickReleased { id });
}

#[test]
fn custom_threshold_is_respected() {
    let mut r = GestureRouter::new(GestureConfig { drag_threshold_px: 0.0, ..GestureConfig::default() });
    let id = Uuid::new_v4();
    r.on_pointer_down(pt(0.0, 0.0), Button::Primary, NO_MODS, hit(id));
    assert_eq!(r.on_pointer_move(pt(0.5, 0.0)), Intent::DragBy { id, dx: 0.5, dy: 0.0 });
}

// =============================================================
// Wheel
// =============================================================

#[test]
fn wheel_zoom_is_exponential() {
    let r = router();
    let Intent::ZoomBy { anchor, factor } = r.on_wheel(pt(7.0, 8.0), WheelDelta { dx: 0.0, dy: -100.0 }) else {
        panic!("expected zoom intent");
    };
    assert_eq!(anchor, pt(7.0, 8.0));
    assert!((factor - 0.999_f64.powf(-100.0)).abs() < 1e-12);
    assert!(factor > 1.0);
}

#[test]
fn wheel_down_zooms_out() {
    let r = router();
    let Intent::ZoomBy { factor, .. } = r.on_wheel(pt(0.0, 0.0), WheelDelta { dx: 0.0, dy: 50.0 }) else {
        panic!("expected zoom intent");
    };
    assert!(factor < 1.0);
}

#[test]
fn wheel_nan_is_ignored() {
    let r = router();
    assert_eq!(r.on_wheel(pt(0.0, 0.0), WheelDelta { dx: 0.0, dy: f64::NAN }), Intent::None);
}

// =============================================================
// Keyboard
// =============================================================

#[test]
fn arrows_pan_by_step() {
    let mut r = router();
    assert_eq!(r.on_key_down(&key("ArrowLeft"), NO_MODS, false), Some(Intent::PanBy { dx: 20.0, dy: 0.0 }));
    assert_eq!(r.on_key_down(&key("ArrowRight"), NO_MODS, false), Some(Intent::PanBy { dx: -20.0, dy: 0.0 }));
    assert_eq!(r.on_key_down(&key("ArrowUp"), NO_MODS, false), Some(Intent::PanBy { dx: 0.0, dy: 20.0 }));
    assert_eq!(r.on_key_down(&key("ArrowDown"), NO_MODS, false), Some(Intent::PanBy { dx: 0.0, dy: -20.0 }));
}

#[test]
fn arrows_with_modifier_use_large_step() {
    let mut r = router();
    assert_eq!(r.on_key_down(&key("ArrowLeft"), SHIFT, false), Some(Intent::PanBy { dx: 100.0, dy: 0.0 }));
}

#[test]
fn keys_are_not_swallowed_while_editing_text() {
    let mut r = router();
    assert_eq!(r.on_key_down(&key("ArrowLeft"), NO_MODS, true), None);
    assert_eq!(r.on_key_down(&key("Backspace"), NO_MODS, true), None);
    assert_eq!(r.on_key_down(&key(" "), NO_MODS, true), None);
    assert!(!r.pan_key_held());
}

#[test]
fn delete_and_backspace_request_deletion() {
    let mut r = router();
    assert_eq!(r.on_key_down(&key("Delete"), NO_MODS, false), Some(Intent::DeleteSelection));
    assert_eq!(r.on_key_down(&key("Backspace"), NO_MODS, false), Some(Intent::DeleteSelection));
}

#[test]
fn unrelated_keys_pass_through() {
    let mut r = router();
    assert_eq!(r.on_key_down(&key("a"), NO_MODS, false), None);
    assert_eq!(r.on_key_up(&key("a")), None);
}

#[test]
fn reset_returns_to_idle() {
    let mut r = router();
    r.on_key_down(&key(" "), NO_MODS, false);
    r.on_pointer_down(pt(0.0, 0.0), Button::Primary, NO_MODS, None);
    r.reset();
    assert_eq!(r.state(), GestureState::Idle);
    assert!(!r.pan_key_held());
}
