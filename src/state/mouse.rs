//! Mouse Module - Hit testing and pointer dispatch
//!
//! Pointer events arrive in display coordinates. The host reports the
//! stack of boxes under the point, topmost first; [`Display::hit_test`]
//! walks it to find the control that takes the hit:
//!
//! - Boxes without a bound control are skipped
//! - Hit-opaque controls let hits through their transparent pixels
//! - Interactive controls take the hit
//! - Controls flagged "yield focus" let hits through to what is beneath
//! - Any other control stops the walk and takes the hit itself
//!
//! [`Display::dispatch_pointer`] then tracks hover, press capture, focus on
//! press and hit / double-hit detection.
//!
//! # Example
//!
//! ```ignore
//! use spark_controls::state::mouse::{PointerButton, PointerEvent};
//! use std::time::Duration;
//!
//! display.on(button, EventKind::Hit, |_| {
//!     println!("pressed");
//!     true
//! })?;
//! display.dispatch_pointer(PointerEvent::down(PointerButton::Left, 15.0, 20.0));
//! ```

use std::time::Duration;

use taffy::geometry::Point;
use tracing::trace;

use super::keyboard::Modifiers;
use crate::display::Display;
use crate::engine::ControlTree;
use crate::error::Result;
use crate::host::Host;
use crate::state::events::{ControlEvent, EventData, EventKind, PointerInfo};
use crate::types::{ControlFlags, ControlId, ControlState};

// =============================================================================
// TYPES
// =============================================================================

/// Pointer action type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    Down,
    Up,
    Move,
}

/// Pointer button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerButton {
    Left,
    Middle,
    Right,
    #[default]
    None,
}

/// Pointer event in display coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub action: PointerAction,
    pub button: PointerButton,
    pub x: f32,
    pub y: f32,
    pub modifiers: Modifiers,
    /// Time since an arbitrary origin; only differences matter.
    pub timestamp: Duration,
}

impl PointerEvent {
    pub fn new(action: PointerAction, button: PointerButton, x: f32, y: f32) -> Self {
        Self {
            action,
            button,
            x,
            y,
            modifiers: Modifiers::default(),
            timestamp: Duration::ZERO,
        }
    }

    pub fn down(button: PointerButton, x: f32, y: f32) -> Self {
        Self::new(PointerAction::Down, button, x, y)
    }

    pub fn up(button: PointerButton, x: f32, y: f32) -> Self {
        Self::new(PointerAction::Up, button, x, y)
    }

    pub fn move_to(x: f32, y: f32) -> Self {
        Self::new(PointerAction::Move, PointerButton::None, x, y)
    }

    /// Same event at another time.
    pub fn at(mut self, timestamp: Duration) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    fn point(&self) -> Point<f32> {
        Point { x: self.x, y: self.y }
    }
}

/// Result of a hit test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitTarget {
    pub control: ControlId,
    /// Hit point relative to the control's top-left corner.
    pub local: Point<f32>,
}

// =============================================================================
// STATE
// =============================================================================

/// Hover, press and double-hit bookkeeping of one display.
#[derive(Debug, Default)]
pub(crate) struct PointerState {
    hovered: Option<ControlId>,
    pressed: Option<ControlId>,
    /// Target and time of the last single hit.
    last_hit: Option<(ControlId, Duration)>,
    /// Was the pointer released since the last hit?
    released: bool,
}

impl PointerState {
    pub(crate) fn forget(&mut self, id: ControlId) {
        if self.hovered == Some(id) {
            self.hovered = None;
        }
        if self.pressed == Some(id) {
            self.pressed = None;
        }
        if self.last_hit.is_some_and(|(hit, _)| hit == id) {
            self.last_hit = None;
        }
    }

    /// Forget `id` and every control beneath it.
    pub(crate) fn forget_within(&mut self, tree: &ControlTree, id: ControlId) {
        let within = |other: ControlId| other == id || tree.is_ancestor(id, other);
        if self.hovered.is_some_and(within) {
            self.hovered = None;
        }
        if self.pressed.is_some_and(within) {
            self.pressed = None;
        }
        if self.last_hit.is_some_and(|(hit, _)| within(hit)) {
            self.last_hit = None;
        }
    }
}

// =============================================================================
// HIT TESTING
// =============================================================================

impl<H: Host> Display<H> {
    /// Control hovered by the pointer.
    pub fn hovered_control(&self) -> Option<ControlId> {
        self.pointer.hovered
    }

    /// Control that took the last press, until release.
    pub fn pressed_control(&self) -> Option<ControlId> {
        self.pointer.pressed
    }

    /// Find the control under a display point.
    pub fn hit_test(&self, point: Point<f32>) -> Option<HitTarget> {
        for entry in self.host.stack_at(point) {
            let Some(id) = entry else {
                continue;
            };
            let Some(control) = self.tree.get(id) else {
                continue;
            };
            if !control.state.is_live() {
                continue;
            }
            let local = self.to_local(id, point)?;

            if control.is_hit_opaque() && !self.host.is_opaque_at(id, local) {
                continue;
            }
            if !control.is_interactive() && control.yields_focus() {
                continue;
            }
            return Some(HitTarget { control: id, local });
        }
        None
    }

    pub fn set_yield_focus(&mut self, id: ControlId, yield_focus: bool) -> Result<()> {
        self.tree
            .control_mut(id)?
            .flags
            .set(ControlFlags::YIELD_FOCUS, yield_focus);
        Ok(())
    }

    pub fn set_hit_opaque(&mut self, id: ControlId, hit_opaque: bool) -> Result<()> {
        self.tree
            .control_mut(id)?
            .flags
            .set(ControlFlags::HIT_OPAQUE, hit_opaque);
        Ok(())
    }

    // =========================================================================
    // DISPATCH
    // =========================================================================

    /// Dispatch a pointer event. Returns true if a handler consumed it.
    pub fn dispatch_pointer(&mut self, event: PointerEvent) -> bool {
        let point = event.point();
        let hit = self.hit_test(point);
        let target = hit.map(|h| h.control);
        trace!(action = ?event.action, x = event.x, y = event.y, ?target, "pointer");

        self.update_hover(target, &event);

        match event.action {
            PointerAction::Move => {
                let mut consumed = self.emit_pointer(target, EventKind::PointerMove, &event);
                let pressed = self.pointer.pressed;
                if pressed.is_some() && pressed != target {
                    consumed |= self.emit_pointer(pressed, EventKind::PointerMove, &event);
                }
                consumed
            }
            PointerAction::Down => self.pointer_down(target, &event),
            PointerAction::Up => {
                let pressed = self.pointer.pressed.take();
                self.pointer.released = true;
                let mut consumed = self.emit_pointer(target, EventKind::PointerUp, &event);
                if pressed.is_some() && pressed != target {
                    consumed |= self.emit_pointer(pressed, EventKind::PointerUp, &event);
                }
                consumed
            }
        }
    }

    fn pointer_down(&mut self, target: Option<ControlId>, event: &PointerEvent) -> bool {
        self.pointer.pressed = target;
        let Some(target) = target else {
            self.pointer.last_hit = None;
            return false;
        };

        if self.tree.get(target).is_some_and(|c| c.is_interactive()) {
            self.set_current_control(target);
        }
        let mut consumed = self.emit_pointer(Some(target), EventKind::PointerDown, event);

        let timeout = self.config.double_hit_timeout;
        let double = self.pointer.released
            && self.pointer.last_hit.is_some_and(|(last, at)| {
                last == target && event.timestamp.saturating_sub(at) <= timeout
            });
        self.pointer.released = false;

        let kind = if double {
            self.pointer.last_hit = None;
            EventKind::DoubleHit
        } else {
            self.pointer.last_hit = Some((target, event.timestamp));
            EventKind::Hit
        };
        consumed |= self.emit_pointer(Some(target), kind, event);
        consumed
    }

    fn update_hover(&mut self, target: Option<ControlId>, event: &PointerEvent) {
        let previous = self.pointer.hovered;
        if previous == target {
            return;
        }

        if let Some(previous) = previous {
            if self.tree.get(previous).is_some_and(|c| c.state == ControlState::Hover) {
                self.write_state(previous, ControlState::Alive);
            }
            self.emit_pointer(Some(previous), EventKind::PointerLeave, event);
        }

        self.pointer.hovered = target;
        if let Some(target) = target {
            if self.tree.get(target).is_some_and(|c| c.state == ControlState::Alive) {
                self.write_state(target, ControlState::Hover);
            }
            self.emit_pointer(Some(target), EventKind::PointerEnter, event);
        }
    }

    fn emit_pointer(&self, target: Option<ControlId>, kind: EventKind, event: &PointerEvent) -> bool {
        let Some(target) = target else {
            return false;
        };
        let Some(local) = self.to_local(target, event.point()) else {
            return false;
        };
        self.emit(ControlEvent::new(
            target,
            kind,
            EventData::Pointer(PointerInfo {
                local,
                button: event.button,
                modifiers: event.modifiers,
            }),
        ))
    }
}
