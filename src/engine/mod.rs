//! Control Engine - the arena and the node record.
//!
//! The engine manages the core data structures:
//! - Registry: id allocation, names, owner/child links
//! - Control: geometry, state, flags and render bookkeeping of one node
//!
//! # Architecture
//!
//! Controls are NOT objects holding pointers to each other. They are records
//! in a slot map, linked by id:
//!
//! ```text
//! display (owner=-,       children=[toolbar, body])
//! toolbar (owner=display, children=[ok, cancel])
//! ok      (owner=toolbar, children=[])
//! ```
//!
//! Every operation that needs more than one record (layout, focus, the render
//! queue) runs on [`Display`](crate::Display), which owns the arena.

mod control;
mod registry;

pub use control::*;
pub use registry::*;
