//! Layout Module - auto rules, anchors and flow layout.
//!
//! Three cooperating pieces position every control:
//!
//! 1. [`auto`] - the rule language (`"0.5"`, `"center"`, `"fit"`, per
//!    breakpoint maps) and its resolution against an owner box
//! 2. `geometry` - setters, auto-adjust with anchors, content measurement
//!    and change propagation up and down the tree
//! 3. `flow` - panels placing their sequenced children in rows or columns
//!
//! A child's geometry change notifies its owner (relayout or refit); an
//! owner's size change re-adjusts its children. Per-control guards stop
//! the recursion.
//!
//! # Example
//!
//! ```ignore
//! use spark_controls::{AutoKeyword, FlowLayout};
//!
//! display.set_auto_width(sidebar, Some(0.25_f32.into()))?;
//! display.set_auto_x(dialog, Some(AutoKeyword::Center.into()))?;
//!
//! display.set_layout(toolbar, FlowLayout::Horizontal)?;
//! display.set_sequence(toolbar, ["open", "save", "close"])?;
//! ```

pub mod auto;
mod flow;
mod geometry;

pub use auto::{AutoKeyword, AutoRules, AutoValue, Resolved, ViewportValue};
pub use flow::{linear_positions, wrap_positions};
