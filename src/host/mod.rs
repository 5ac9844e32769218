//! Host boxes - the contract between the control tree and whatever draws it.
//!
//! Each control binds to exactly one host box. The engine only ever:
//! - mirrors the ownership tree onto boxes (`create_box`, `attach_box`, ...)
//! - flushes style diffs, class names and content into them
//! - reads box metrics back (shell insets, intrinsic content size)
//! - asks for the element stack under a point for hit-testing
//! - requests animation frames
//!
//! [`HeadlessHost`] implements the contract in memory.

mod headless;

pub use headless::{HeadlessBox, HeadlessHost};

use taffy::geometry::{Point, Rect, Size};

use crate::pipeline::style::StyleDiff;
use crate::types::ControlId;

/// Metrics measured on a host box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxMetrics {
    /// Padding + border on each edge.
    pub shell: Rect<f32>,
    /// Intrinsic size of the box content (text, images). Boxes with child
    /// controls are measured from the children instead.
    pub content: Size<f32>,
}

/// The host a [`Display`](crate::Display) renders into.
pub trait Host {
    /// Bind the display root to the document body.
    fn bind_root(&mut self, id: ControlId);

    fn create_box(&mut self, id: ControlId);

    fn remove_box(&mut self, id: ControlId);

    /// Mirror an ownership edge.
    fn attach_box(&mut self, parent: ControlId, child: ControlId);

    fn detach_box(&mut self, child: ControlId);

    /// Write a batch of style changes.
    fn apply_style(&mut self, id: ControlId, diff: &StyleDiff);

    fn set_class_name(&mut self, id: ControlId, class_name: &str);

    fn set_content(&mut self, id: ControlId, content: &str);

    fn metrics(&self, id: ControlId) -> BoxMetrics;

    /// Elements under `point`, topmost first. Elements with no bound control
    /// are reported as `None`.
    fn stack_at(&self, point: Point<f32>) -> Vec<Option<ControlId>>;

    /// Is the pixel at box-local `point` opaque?
    fn is_opaque_at(&self, id: ControlId, point: Point<f32>) -> bool;

    /// Ask for one animation-frame callback ([`Display::frame`](crate::Display::frame)).
    fn request_frame(&mut self);

    /// Move native input focus to the box.
    fn focus_native(&mut self, id: ControlId);
}
