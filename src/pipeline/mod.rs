//! Render Pipeline
//!
//! Connects control state to the host boxes.
//!
//! ```text
//! setter → shadow diff + dirty flags → render queue → frame() → host box
//!                                                       ↓
//!                                        recalculate (metrics → auto_adjust)
//! ```
//!
//! ## Key Design Principles
//!
//! - **Coalesced**: a control is queued at most once per frame however many
//!   times it is invalidated
//! - **Taken, not shared**: the shadow style diff is moved out at flush time
//! - **Bounded**: work queued during a flush lands in the next frame

pub mod scheduler;
pub mod style;

pub use scheduler::RenderQueue;
pub use style::{compose_class_name, StyleDiff, StyleKey, StyleValue};
