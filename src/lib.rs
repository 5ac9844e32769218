//! # spark-controls
//!
//! Retained-mode control tree for Rust: geometry with auto rules and
//! anchors, flow layout, a coalesced render scheduler and container-based
//! focus and tab order, all driven through one explicit [`Display`].
//!
//! ## Architecture
//!
//! Controls live in a generational arena owned by the display. A control is
//! an id; its kind (`Control`, `Container`, `Panel`, `Display`) decides which
//! capability parts it carries. Rendering goes to a [`Host`], which owns one
//! box per control:
//!
//! ```text
//! setters → geometry / layout / focus → shadow diff + dirty → frame() → Host
//! ```
//!
//! [`HeadlessHost`] is an in-memory host for tests and tooling.
//!
//! ## Modules
//!
//! - [`types`] - Ids, kinds, states, flag sets
//! - [`engine`] - The control arena
//! - [`layout`] - Auto rules, anchors, flow layout
//! - [`pipeline`] - Style diffs and the render queue
//! - [`state`] - Events, focus, keyboard, pointer, input conversion
//! - [`host`] - The host contract and the headless host
//!
//! ## Example
//!
//! ```ignore
//! use spark_controls::{Anchors, Bounds, ControlKind, Display, DisplayConfig, FlowLayout, HeadlessHost};
//!
//! let mut display = Display::new(HeadlessHost::new(), DisplayConfig::default());
//! let root = display.root();
//!
//! let toolbar = display.create_in(root, ControlKind::Panel, Some("toolbar"))?;
//! display.set_anchors(toolbar, Anchors::LEFT | Anchors::RIGHT | Anchors::TOP)?;
//! display.set_layout(toolbar, FlowLayout::Horizontal)?;
//! for name in ["open", "save"] {
//!     let button = display.create_in(toolbar, ControlKind::Control, Some(name))?;
//!     display.set_bounds(button, Bounds::new(0.0, 0.0, 80.0, 24.0))?;
//!     display.set_can_focus(button, true)?;
//! }
//! display.set_sequence(toolbar, ["open", "save"])?;
//!
//! while display.frame_pending() {
//!     display.frame();
//! }
//! ```

pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod host;
pub mod layout;
pub mod pipeline;
pub mod state;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use config::{Breakpoint, DisplayConfig};
pub use display::{Display, DISPLAY_NAME};
pub use engine::{Bounds, Control, ControlTree};
pub use error::{ControlError, Result};
pub use host::{BoxMetrics, HeadlessHost, Host};
pub use layout::{AutoKeyword, AutoValue, ViewportValue};
pub use pipeline::{StyleDiff, StyleKey, StyleValue};
pub use state::{
    ControlEvent, EventData, EventKind, HandlerId, InputEvent, KeyboardEvent, Modifiers,
    PointerButton, PointerEvent,
};
