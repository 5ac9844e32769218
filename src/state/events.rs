//! Events Module - Static event map and handler registry
//!
//! Every widget kind declares the events it raises in a fixed table
//! ([`ControlKind::events`]). Registering a handler for an event the kind
//! does not raise is an error, so a misspelt subscription fails loudly at
//! registration instead of silently never firing.
//!
//! # API
//!
//! - `ControlKind::events()` - Events raised by a kind
//! - `Display::on(id, kind, fn)` - Subscribe to an event of one control
//! - `Display::off(handler)` - Unsubscribe
//!
//! # Example
//!
//! ```ignore
//! use spark_controls::{Display, EventKind, HeadlessHost};
//!
//! let handler = display.on(button, EventKind::Hit, |event| {
//!     println!("hit {:?}", event.target);
//!     true // Consume event
//! })?;
//! display.off(handler);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use taffy::geometry::Point;

use super::keyboard::{KeyboardEvent, Modifiers};
use super::mouse::PointerButton;
use crate::engine::Bounds;
use crate::types::{ControlId, ControlKind};

// =============================================================================
// TYPES
// =============================================================================

/// Event kinds raised by controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    FocusIn,
    FocusOut,
    /// Position changed.
    Relocate,
    /// Size changed.
    Resize,
    /// A sequenced child was moved by the panel layout.
    ChildRelocated,
    Hit,
    DoubleHit,
    PointerDown,
    PointerUp,
    PointerMove,
    PointerEnter,
    PointerLeave,
    Key,
    /// Enter pressed while this control is its container's default.
    DefaultAction,
    /// The display breakpoint changed.
    ViewportChange,
}

const CONTROL_EVENTS: &[EventKind] = &[
    EventKind::FocusIn,
    EventKind::FocusOut,
    EventKind::Relocate,
    EventKind::Resize,
    EventKind::Hit,
    EventKind::DoubleHit,
    EventKind::PointerDown,
    EventKind::PointerUp,
    EventKind::PointerMove,
    EventKind::PointerEnter,
    EventKind::PointerLeave,
    EventKind::Key,
    EventKind::DefaultAction,
];

const PANEL_EVENTS: &[EventKind] = &[
    EventKind::FocusIn,
    EventKind::FocusOut,
    EventKind::Relocate,
    EventKind::Resize,
    EventKind::ChildRelocated,
    EventKind::Hit,
    EventKind::DoubleHit,
    EventKind::PointerDown,
    EventKind::PointerUp,
    EventKind::PointerMove,
    EventKind::PointerEnter,
    EventKind::PointerLeave,
    EventKind::Key,
    EventKind::DefaultAction,
];

const DISPLAY_EVENTS: &[EventKind] = &[
    EventKind::FocusIn,
    EventKind::FocusOut,
    EventKind::Relocate,
    EventKind::Resize,
    EventKind::ChildRelocated,
    EventKind::Hit,
    EventKind::DoubleHit,
    EventKind::PointerDown,
    EventKind::PointerUp,
    EventKind::PointerMove,
    EventKind::PointerEnter,
    EventKind::PointerLeave,
    EventKind::Key,
    EventKind::DefaultAction,
    EventKind::ViewportChange,
];

impl ControlKind {
    /// Events raised by controls of this kind.
    pub const fn events(self) -> &'static [EventKind] {
        match self {
            Self::Control | Self::Container => CONTROL_EVENTS,
            Self::Panel => PANEL_EVENTS,
            Self::Display => DISPLAY_EVENTS,
        }
    }

    pub fn raises(self, event: EventKind) -> bool {
        self.events().contains(&event)
    }
}

/// Pointer details delivered with pointer events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInfo {
    /// Position relative to the target's top-left corner.
    pub local: Point<f32>,
    pub button: PointerButton,
    pub modifiers: Modifiers,
}

/// Event payload.
#[derive(Debug, Clone, PartialEq)]
pub enum EventData {
    None,
    /// The control focus moved from (focus-in) or to (focus-out).
    Focus { related: Option<ControlId> },
    Geometry { bounds: Bounds, previous: Bounds },
    Child(ControlId),
    Pointer(PointerInfo),
    Key(KeyboardEvent),
    Viewport { name: String, width: f32, height: f32 },
}

/// An event delivered to handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlEvent {
    pub target: ControlId,
    pub kind: EventKind,
    pub data: EventData,
}

impl ControlEvent {
    pub fn new(target: ControlId, kind: EventKind, data: EventData) -> Self {
        Self { target, kind, data }
    }

    pub fn pointer(&self) -> Option<&PointerInfo> {
        match &self.data {
            EventData::Pointer(info) => Some(info),
            _ => None,
        }
    }

    pub fn key(&self) -> Option<&KeyboardEvent> {
        match &self.data {
            EventData::Key(event) => Some(event),
            _ => None,
        }
    }
}

/// Handler for control events. Return true to consume the event.
pub type EventHandler = Rc<dyn Fn(&ControlEvent) -> bool>;

/// Registration handle returned by [`Display::on`](crate::Display::on).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(usize);

// =============================================================================
// HANDLER REGISTRY
// =============================================================================

/// Handlers keyed by target and event kind, in registration order.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<(ControlId, EventKind), Vec<(HandlerId, EventHandler)>>,
    next_id: usize,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn register(&mut self, target: ControlId, kind: EventKind, handler: EventHandler) -> HandlerId {
        let id = self.next_id();
        self.handlers.entry((target, kind)).or_default().push((id, handler));
        id
    }

    /// Remove one handler. Returns false if it was not registered.
    pub fn remove(&mut self, id: HandlerId) -> bool {
        let mut removed = false;
        self.handlers.retain(|_, list| {
            let before = list.len();
            list.retain(|(handler_id, _)| *handler_id != id);
            removed |= list.len() != before;
            !list.is_empty()
        });
        removed
    }

    /// Drop every handler of a control.
    pub fn remove_target(&mut self, target: ControlId) {
        self.handlers.retain(|(owner, _), _| *owner != target);
    }

    /// Snapshot of the handlers for one event, so callers can run them
    /// without holding a borrow of the registry.
    pub fn handlers(&self, target: ControlId, kind: EventKind) -> Vec<EventHandler> {
        self.handlers
            .get(&(target, kind))
            .map(|list| list.iter().map(|(_, h)| Rc::clone(h)).collect())
            .unwrap_or_default()
    }

    pub fn count(&self, target: ControlId) -> usize {
        self.handlers
            .iter()
            .filter(|((owner, _), _)| *owner == target)
            .map(|(_, list)| list.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("slots", &self.handlers.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
