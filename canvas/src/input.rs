//! Input model: modifier keys, mouse buttons, and the gesture state machine.
//!
//! [`GestureRouter`] turns the raw pointer/keyboard stream into [`Intent`]s.
//! It is pure: hit-test results are passed in by the caller and the intents
//! are applied by the engine, so every transition can be driven from tests.
//!
//! A press on an object is only a *candidate* click until the pointer travels
//! more than the drag threshold. Releasing within the threshold over the same
//! object rotates it a quarter turn; travelling further hands the object to
//! the scene's drag instead. A press on empty space, with the middle button,
//! or while the pan key (space) is held pans the viewport.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::camera::Point;
use crate::config::CanvasConfig;
use crate::consts::ROTATE_STEP_DEG;
use crate::doc::ObjectId;

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Whether any modifier is held.
    #[must_use]
    pub fn any(self) -> bool {
        self.shift || self.ctrl || self.alt || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// A keyboard key, named as the browser reports it (e.g. `"ArrowLeft"`, `" "`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    fn is_pan_key(&self) -> bool {
        matches!(self.0.as_str(), " " | "Space" | "Spacebar")
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// UI-only state that is not persisted with the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    /// The currently selected icon, if any.
    pub selected_id: Option<ObjectId>,
}

/// What the scene reported under the pointer at press time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectHit {
    pub id: ObjectId,
    /// Whether click-to-rotate applies to this object.
    pub rotatable: bool,
}

/// The gesture being tracked between pointer-down and pointer-up.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// The pan key is held with no pointer down; the next press pans.
    PanCandidate,
    /// The viewport follows the pointer.
    Panning {
        /// Device position of the previous pointer event.
        last: Point,
    },
    /// A press on an object that has not yet moved past the threshold.
    ClickCandidate {
        target: ObjectId,
        /// Device position of the press.
        start: Point,
        /// Rotate backwards on release (shift was held at press time).
        backward: bool,
        rotatable: bool,
    },
    /// The scene is dragging the object.
    ObjectDragging {
        target: ObjectId,
        /// Device position of the previous pointer event.
        last: Point,
    },
}

/// What the engine should do in response to an input event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    /// Nothing to do.
    None,
    /// A pan gesture began. `deselect` is set when the press hit empty space.
    PanStarted { deselect: bool },
    /// Translate the viewport by a device-pixel delta.
    PanBy { dx: f64, dy: f64 },
    /// The pan gesture ended.
    PanEnded,
    /// A press landed on an object; forward it to the scene's selection.
    Select { id: ObjectId },
    /// The scene's drag should move the object by a device-pixel delta.
    DragBy { id: ObjectId, dx: f64, dy: f64 },
    /// The object drag ended.
    DragEnded { id: ObjectId },
    /// Rotate the object by `degrees` (clockwise positive).
    Rotate { id: ObjectId, degrees: f64 },
    /// A click that did not rotate; already handled as a selection.
    ClickReleased { id: ObjectId },
    /// Multiply the viewport scale by `factor` about `anchor`.
    ZoomBy { anchor: Point, factor: f64 },
    /// Remove the selected object.
    DeleteSelection,
    /// The pan key was pressed or released.
    PanKey { held: bool },
}

/// Tunables the router reads, lifted from [`CanvasConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureConfig {
    pub drag_threshold_px: f64,
    pub arrow_step_px: f64,
    pub arrow_step_large_px: f64,
    pub wheel_zoom_base: f64,
}

impl From<&CanvasConfig> for GestureConfig {
    fn from(config: &CanvasConfig) -> Self {
        Self {
            drag_threshold_px: config.drag_threshold_px,
            arrow_step_px: config.arrow_step_px,
            arrow_step_large_px: config.arrow_step_large_px,
            wheel_zoom_base: config.wheel_zoom_base,
        }
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self::from(&CanvasConfig::default())
    }
}

/// The gesture state machine.
#[derive(Debug, Clone, Default)]
pub struct GestureRouter {
    state: GestureState,
    pan_key_held: bool,
    config: GestureConfig,
}

impl GestureRouter {
    #[must_use]
    pub fn new(config: GestureConfig) -> Self {
        Self { state: GestureState::Idle, pan_key_held: false, config }
    }

    #[must_use]
    pub fn state(&self) -> GestureState {
        self.state
    }

    #[must_use]
    pub fn pan_key_held(&self) -> bool {
        self.pan_key_held
    }

    /// Drop any gesture in progress and forget the pan key.
    pub fn reset(&mut self) {
        self.state = GestureState::Idle;
        self.pan_key_held = false;
    }

    fn rest_state(&self) -> GestureState {
        if self.pan_key_held { GestureState::PanCandidate } else { GestureState::Idle }
    }

    pub fn on_pointer_down(
        &mut self,
        device: Point,
        button: Button,
        modifiers: Modifiers,
        hit: Option<ObjectHit>,
    ) -> Intent {
        match button {
            Button::Secondary => return Intent::None,
            Button::Middle => {
                self.state = GestureState::Panning { last: device };
                return Intent::PanStarted { deselect: false };
            }
            Button::Primary => {}
        }

        if self.pan_key_held {
            self.state = GestureState::Panning { last: device };
            return Intent::PanStarted { deselect: false };
        }

        match hit {
            None => {
                self.state = GestureState::Panning { last: device };
                Intent::PanStarted { deselect: true }
            }
            Some(hit) => {
                self.state = GestureState::ClickCandidate {
                    target: hit.id,
                    start: device,
                    backward: modifiers.shift,
                    rotatable: hit.rotatable,
                };
                Intent::Select { id: hit.id }
            }
        }
    }

    pub fn on_pointer_move(&mut self, device: Point) -> Intent {
        match self.state {
            GestureState::Panning { last } => {
                self.state = GestureState::Panning { last: device };
                Intent::PanBy { dx: device.x - last.x, dy: device.y - last.y }
            }
            GestureState::ClickCandidate { target, start, .. } => {
                if device.distance(start) > self.config.drag_threshold_px {
                    self.state = GestureState::ObjectDragging { target, last: device };
                    Intent::DragBy { id: target, dx: device.x - start.x, dy: device.y - start.y }
                } else {
                    Intent::None
                }
            }
            GestureState::ObjectDragging { target, last } => {
                self.state = GestureState::ObjectDragging { target, last: device };
                Intent::DragBy { id: target, dx: device.x - last.x, dy: device.y - last.y }
            }
            GestureState::Idle | GestureState::PanCandidate => Intent::None,
        }
    }

    /// `hit` is the object under the pointer at release time.
    pub fn on_pointer_up(&mut self, device: Point, button: Button, hit: Option<ObjectId>) -> Intent {
        if button == Button::Secondary {
            return Intent::None;
        }
        let rest = self.rest_state();
        match self.state {
            GestureState::Panning { .. } => {
                self.state = rest;
                Intent::PanEnded
            }
            GestureState::ClickCandidate { target, start, backward, rotatable } => {
                self.state = rest;
                let is_click = device.distance(start) <= self.config.drag_threshold_px;
                if is_click && hit == Some(target) && rotatable {
                    let degrees = if backward { -ROTATE_STEP_DEG } else { ROTATE_STEP_DEG };
                    Intent::Rotate { id: target, degrees }
                } else {
                    Intent::ClickReleased { id: target }
                }
            }
            GestureState::ObjectDragging { target, .. } => {
                self.state = rest;
                Intent::DragEnded { id: target }
            }
            GestureState::Idle | GestureState::PanCandidate => Intent::None,
        }
    }

    /// Wheel zoom is exponential in the delta and ignores gesture state.
    #[must_use]
    pub fn on_wheel(&self, device: Point, delta: WheelDelta) -> Intent {
        if !delta.dy.is_finite() {
            return Intent::None;
        }
        Intent::ZoomBy { anchor: device, factor: self.config.wheel_zoom_base.powf(delta.dy) }
    }

    /// Returns `None` for keys the router does not own; the host should then
    /// let the browser's default action run. `Some` means "swallow".
    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers, editing_text: bool) -> Option<Intent> {
        if editing_text {
            return None;
        }
        if key.is_pan_key() {
            self.pan_key_held = true;
            if self.state == GestureState::Idle {
                self.state = GestureState::PanCandidate;
            }
            return Some(Intent::PanKey { held: true });
        }
        let step = if modifiers.any() { self.config.arrow_step_large_px } else { self.config.arrow_step_px };
        match key.0.as_str() {
            "ArrowLeft" => Some(Intent::PanBy { dx: step, dy: 0.0 }),
            "ArrowRight" => Some(Intent::PanBy { dx: -step, dy: 0.0 }),
            "ArrowUp" => Some(Intent::PanBy { dx: 0.0, dy: step }),
            "ArrowDown" => Some(Intent::PanBy { dx: 0.0, dy: -step }),
            "Delete" | "Backspace" => Some(Intent::DeleteSelection),
            _ => None,
        }
    }

    pub fn on_key_up(&mut self, key: &Key) -> Option<Intent> {
        if !key.is_pan_key() {
            return None;
        }
        self.pan_key_held = false;
        if self.state == GestureState::PanCandidate {
            self.state = GestureState::Idle;
        }
        Some(Intent::PanKey { held: false })
    }
}
