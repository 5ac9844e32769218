//! State Module - Interaction state of a display
//!
//! - **Events** - Static event map per widget kind, handler registry
//! - **Focus** - Tab caches, focus transitions, tab navigation
//! - **Keyboard** - Key events, Tab handling, key bubbling, default action
//! - **Mouse** - Hit testing, hover, press capture, double-hit
//! - **Input** - crossterm conversion and routing

pub mod events;
pub mod focus;
pub mod input;
pub mod keyboard;
pub mod mouse;

pub use events::{ControlEvent, EventData, EventHandler, EventKind, HandlerId, PointerInfo};
pub use input::InputEvent;
pub use keyboard::{KeyState, KeyboardEvent, Modifiers};
pub use mouse::{HitTarget, PointerAction, PointerButton, PointerEvent};
