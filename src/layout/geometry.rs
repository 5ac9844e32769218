//! Geometry resolver - setters, auto rules and anchors.
//!
//! Position and size live in the control's [`Bounds`]. Two kinds of writes
//! reach them:
//!
//! - explicit setters (`set_x`, `set_width`, ...), ignored while an auto
//!   rule drives the property
//! - `auto_adjust`, which re-resolves auto rules and applies anchor deltas
//!   whenever the owner's inner box changes
//!
//! Both end in [`commit_bounds`](Display::commit_bounds): one shadow-diff
//! batch, then a single coordinates-changed notification that fans out to
//! children (resize propagation) and to the owner (relayout / fit).

use taffy::geometry::{Point, Size};
use tracing::{trace, warn};

use super::auto::{AutoValue, Resolved, resolve};
use crate::display::Display;
use crate::engine::{Bounds, Control};
use crate::error::Result;
use crate::host::Host;
use crate::pipeline::style::{StyleKey, StyleValue};
use crate::state::events::{ControlEvent, EventData, EventKind};
use crate::types::{Anchors, Axis, ControlFlags, ControlId, Dirty, GeometryProp};

const ALL_PROPS: [GeometryProp; 4] = [
    GeometryProp::X,
    GeometryProp::Y,
    GeometryProp::Width,
    GeometryProp::Height,
];

fn size_prop(axis: Axis) -> GeometryProp {
    match axis {
        Axis::Horizontal => GeometryProp::Width,
        Axis::Vertical => GeometryProp::Height,
    }
}

fn along(size: Size<f32>, axis: Axis) -> f32 {
    match axis {
        Axis::Horizontal => size.width,
        Axis::Vertical => size.height,
    }
}

impl<H: Host> Display<H> {
    // =========================================================================
    // Explicit setters
    // =========================================================================

    /// Write one geometry property.
    ///
    /// No-op while an auto rule drives `prop`. Non-finite values are ignored;
    /// sizes clamp at zero.
    pub fn set_geometry(&mut self, id: ControlId, prop: GeometryProp, value: f32) -> Result<()> {
        let control = self.tree.control(id)?;
        if control.geometry.auto.get(prop).is_some() || !value.is_finite() {
            return Ok(());
        }
        let value = if prop.is_size() { value.max(0.0) } else { value };

        let mut next = control.geometry.bounds;
        next.set(prop, value);
        self.commit_bounds(id, next);
        Ok(())
    }

    pub fn set_x(&mut self, id: ControlId, x: f32) -> Result<()> {
        self.set_geometry(id, GeometryProp::X, x)
    }

    pub fn set_y(&mut self, id: ControlId, y: f32) -> Result<()> {
        self.set_geometry(id, GeometryProp::Y, y)
    }

    pub fn set_width(&mut self, id: ControlId, width: f32) -> Result<()> {
        self.set_geometry(id, GeometryProp::Width, width)
    }

    pub fn set_height(&mut self, id: ControlId, height: f32) -> Result<()> {
        self.set_geometry(id, GeometryProp::Height, height)
    }

    /// Set position and size together; auto-driven properties keep their
    /// resolved values.
    pub fn set_bounds(&mut self, id: ControlId, bounds: Bounds) -> Result<()> {
        let control = self.tree.control(id)?;
        let mut next = control.geometry.bounds;
        for prop in ALL_PROPS {
            let value = bounds.get(prop);
            if control.geometry.auto.get(prop).is_none() && value.is_finite() {
                next.set(prop, if prop.is_size() { value.max(0.0) } else { value });
            }
        }
        self.commit_bounds(id, next);
        Ok(())
    }

    pub fn set_anchors(&mut self, id: ControlId, anchors: Anchors) -> Result<()> {
        self.tree.control_mut(id)?.geometry.anchors = anchors;
        Ok(())
    }

    pub fn set_z_index(&mut self, id: ControlId, z_index: i32) -> Result<()> {
        let control = self.tree.control_mut(id)?;
        if control.z_index == z_index {
            return Ok(());
        }
        control.z_index = z_index;
        control.shadow.set(StyleKey::ZIndex, StyleValue::Integer(z_index));
        self.mark_dirty(id, Dirty::COORDS);
        Ok(())
    }

    /// Opacity clamps to `[0, 1]`; non-finite values are ignored.
    pub fn set_opacity(&mut self, id: ControlId, opacity: f32) -> Result<()> {
        let control = self.tree.control_mut(id)?;
        if !opacity.is_finite() {
            return Ok(());
        }
        let opacity = opacity.clamp(0.0, 1.0);
        if control.opacity == opacity {
            return Ok(());
        }
        control.opacity = opacity;
        control.shadow.set(StyleKey::Opacity, StyleValue::Number(opacity));
        self.mark_dirty(id, Dirty::COORDS);
        Ok(())
    }

    /// Show or hide a control. Hidden controls drop out of flow layout, tab
    /// order and hit-testing.
    pub fn set_visible(&mut self, id: ControlId, visible: bool) -> Result<()> {
        let control = self.tree.control_mut(id)?;
        if control.is_visible() == visible {
            return Ok(());
        }
        control.flags.set(ControlFlags::VISIBLE, visible);
        let value = if visible { StyleValue::Visible } else { StyleValue::Hidden };
        control.shadow.set(StyleKey::Visibility, value);

        self.mark_dirty(id, Dirty::COORDS);
        self.refresh_interactive(id);
        if !visible {
            self.drop_focus_within(id);
        }
        if let Some(owner) = self.tree.owner(id) {
            self.relayout_owner(owner);
        }
        Ok(())
    }

    // =========================================================================
    // Auto setters
    // =========================================================================

    /// Set (or clear with `None`) the auto rule driving `prop`.
    ///
    /// The rule is validated first and resolved right away when the control
    /// has an owner. On failure the previous rule and geometry stay in place.
    pub fn set_auto(&mut self, id: ControlId, prop: GeometryProp, value: Option<AutoValue>) -> Result<()> {
        let control = self.tree.control(id)?;
        if control.geometry.auto.get(prop) == value.as_ref() {
            return Ok(());
        }
        if let Some(rule) = &value {
            resolve(rule, prop, 0.0, 0.0, &self.viewport_name)?;
        }
        let has_owner = control.owner.is_some();

        let previous = std::mem::replace(self.tree.control_mut(id)?.geometry.auto.slot(prop), value);
        if !has_owner {
            return Ok(());
        }
        if self.queue.is_suppressed() {
            self.queue.defer(id);
            return Ok(());
        }

        if let Err(err) = self.auto_adjust(id) {
            *self.tree.control_mut(id)?.geometry.auto.slot(prop) = previous;
            return Err(err);
        }
        Ok(())
    }

    /// Parse and set an auto rule from text (`"0.5"`, `"right"`, `"fit"`).
    pub fn set_auto_str(&mut self, id: ControlId, prop: GeometryProp, text: &str) -> Result<()> {
        let value = AutoValue::parse_for(prop, text)?;
        self.set_auto(id, prop, Some(value))
    }

    pub fn set_auto_x(&mut self, id: ControlId, value: Option<AutoValue>) -> Result<()> {
        self.set_auto(id, GeometryProp::X, value)
    }

    pub fn set_auto_y(&mut self, id: ControlId, value: Option<AutoValue>) -> Result<()> {
        self.set_auto(id, GeometryProp::Y, value)
    }

    pub fn set_auto_width(&mut self, id: ControlId, value: Option<AutoValue>) -> Result<()> {
        self.set_auto(id, GeometryProp::Width, value)
    }

    pub fn set_auto_height(&mut self, id: ControlId, value: Option<AutoValue>) -> Result<()> {
        self.set_auto(id, GeometryProp::Height, value)
    }

    // =========================================================================
    // Auto adjust
    // =========================================================================

    /// Re-resolve auto rules and apply anchor deltas after the owner's inner
    /// box changed.
    ///
    /// Returns `Ok(true)` when the bounds changed. Inactive controls (no auto
    /// rule, no delta on a right/bottom anchor) and reentrant calls return
    /// `Ok(false)`. On error the previous geometry is kept and the
    /// owner delta stays pending for the next successful adjust.
    pub fn auto_adjust(&mut self, id: ControlId) -> Result<bool> {
        let control = self.tree.control(id)?;
        let Some(owner) = control.owner else {
            return Ok(false);
        };
        if control.flags.contains(ControlFlags::ADJUSTING) {
            return Ok(false);
        }
        let owner_inner = self.tree.control(owner)?.inner_size();

        let control = self.tree.control_mut(id)?;
        let dx = owner_inner.width - control.geometry.owner_size.width;
        let dy = owner_inner.height - control.geometry.owner_size.height;

        let anchors = control.geometry.anchors;
        let active = control.geometry.auto.any()
            || (dx != 0.0 && anchors.contains(Anchors::RIGHT))
            || (dy != 0.0 && anchors.contains(Anchors::BOTTOM));
        if !active {
            control.geometry.owner_size = owner_inner;
            return Ok(false);
        }

        // The owner size is only consumed once the deltas are applied
        control.flags.insert(ControlFlags::ADJUSTING);
        let outcome = self.resolve_bounds(id, owner_inner, dx, dy).map(|next| {
            if let Some(control) = self.tree.get_mut(id) {
                control.geometry.owner_size = owner_inner;
            }
            self.commit_bounds(id, next)
        });
        if let Some(control) = self.tree.get_mut(id) {
            control.flags.remove(ControlFlags::ADJUSTING);
        }

        trace!(?id, dx, dy, ?outcome, "auto adjust");
        outcome
    }

    /// Bounds after auto rules and anchor deltas; sizes first, then positions.
    fn resolve_bounds(&self, id: ControlId, owner_inner: Size<f32>, dx: f32, dy: f32) -> Result<Bounds> {
        let control = self.tree.control(id)?;
        let auto = &control.geometry.auto;
        let breakpoint = self.viewport_name.as_str();
        let mut next = control.geometry.bounds;

        for axis in [Axis::Horizontal, Axis::Vertical] {
            let prop = size_prop(axis);
            let Some(rule) = auto.get(prop) else {
                continue;
            };
            let value = match resolve(rule, prop, along(owner_inner, axis), next.get(prop), breakpoint)? {
                Resolved::Px(v) => v,
                Resolved::Fit => self.measure_fit(id, axis),
                Resolved::Max => self.content_extent(id, axis),
            };
            next.set(prop, value.max(0.0));
        }

        for (prop, axis) in [(GeometryProp::X, Axis::Horizontal), (GeometryProp::Y, Axis::Vertical)] {
            let Some(rule) = auto.get(prop) else {
                continue;
            };
            let size = next.get(size_prop(axis));
            if let Resolved::Px(v) = resolve(rule, prop, along(owner_inner, axis), size, breakpoint)? {
                next.set(prop, v);
            }
        }

        let anchors = control.geometry.anchors;
        if dx != 0.0 {
            if anchors.contains(Anchors::LEFT | Anchors::RIGHT) {
                if auto.width.is_none() {
                    next.width = (next.width + dx).max(0.0);
                }
            } else if anchors.contains(Anchors::RIGHT) && auto.x.is_none() {
                next.x += dx;
            }
        }
        if dy != 0.0 {
            if anchors.contains(Anchors::TOP | Anchors::BOTTOM) {
                if auto.height.is_none() {
                    next.height = (next.height + dy).max(0.0);
                }
            } else if anchors.contains(Anchors::BOTTOM) && auto.y.is_none() {
                next.y += dy;
            }
        }

        Ok(next)
    }

    // =========================================================================
    // Content measurement
    // =========================================================================

    /// Extent demanded by a control's content on `axis`, shell insets
    /// included: the bounding box of visible children, or the host's
    /// intrinsic content size for a control without visible children.
    pub fn content_extent(&self, id: ControlId, axis: Axis) -> f32 {
        let Some(control) = self.tree.get(id) else {
            return 0.0;
        };
        let shell = control.geometry.shell;

        let children = control
            .children
            .iter()
            .filter_map(|child| self.tree.get(*child))
            .filter(|child| child.is_visible())
            .map(|child| match axis {
                Axis::Horizontal => child.x() + child.width(),
                Axis::Vertical => child.y() + child.height(),
            })
            .reduce(f32::max);

        let content = children.unwrap_or_else(|| along(self.host.metrics(id).content, axis));
        let insets = match axis {
            Axis::Horizontal => shell.left + shell.right,
            Axis::Vertical => shell.top + shell.bottom,
        };
        content.max(0.0) + insets
    }

    /// Fit size: the content extent, bounded by the inner box of the nearest
    /// ancestor that is not itself fit-sized on `axis`.
    pub fn measure_fit(&self, id: ControlId, axis: Axis) -> f32 {
        let extent = self.content_extent(id, axis);
        let prop = size_prop(axis);
        let breakpoint = self.viewport_name.as_str();

        let bound = self
            .tree
            .ancestors(id)
            .filter_map(|a| self.tree.get(a))
            .find(|a| !a.auto(prop).is_some_and(|rule| rule.is_fit_at(breakpoint)))
            .map(|a| along(a.inner_size(), axis));

        bound.map_or(extent, |bound| extent.min(bound))
    }

    // =========================================================================
    // Commit and propagation
    // =========================================================================

    /// Write bounds and their style keys without any notification. Returns
    /// the previous bounds if anything changed.
    pub(crate) fn write_bounds(&mut self, id: ControlId, next: Bounds) -> Option<Bounds> {
        let control = self.tree.get_mut(id)?;
        let previous = control.geometry.bounds;
        if previous == next {
            return None;
        }
        for prop in ALL_PROPS {
            if previous.get(prop) != next.get(prop) {
                control.shadow.set(prop.into(), StyleValue::Px(next.get(prop)));
            }
        }
        control.geometry.bounds = next;
        Some(previous)
    }

    /// Copy all four bounds into the shadow diff.
    pub(crate) fn write_bounds_styles(&mut self, id: ControlId) {
        if let Some(control) = self.tree.get_mut(id) {
            let bounds = control.geometry.bounds;
            for prop in ALL_PROPS {
                control.shadow.set(prop.into(), StyleValue::Px(bounds.get(prop)));
            }
        }
    }

    /// Write bounds as one batch and notify once. Returns whether anything
    /// changed.
    pub(crate) fn commit_bounds(&mut self, id: ControlId, next: Bounds) -> bool {
        let Some(previous) = self.write_bounds(id, next) else {
            return false;
        };
        if self.queue.is_suppressed() {
            self.mark_dirty(id, Dirty::COORDS);
            self.queue.defer(id);
        } else {
            self.coords_changed(id, previous);
        }
        true
    }

    /// Coordinates-changed notification.
    fn coords_changed(&mut self, id: ControlId, previous: Bounds) {
        self.mark_dirty(id, Dirty::COORDS);
        let Some(bounds) = self.tree.get(id).map(Control::bounds) else {
            return;
        };

        if bounds.moved_from(&previous) {
            self.emit(ControlEvent::new(
                id,
                EventKind::Relocate,
                EventData::Geometry { bounds, previous },
            ));
        }
        if bounds.resized_from(&previous) {
            self.emit(ControlEvent::new(
                id,
                EventKind::Resize,
                EventData::Geometry { bounds, previous },
            ));
            self.propagate_resize(id);
        }
        self.notify_owner(id);
    }

    /// The inner box of `id` changed: re-adjust its children and relayout.
    pub(crate) fn propagate_resize(&mut self, id: ControlId) {
        let children = self.tree.children(id).to_vec();
        for child in children {
            if let Err(err) = self.auto_adjust(child) {
                warn!(?child, %err, "auto rule failed during resize propagation");
            }
        }
        if self.tree.get(id).is_some_and(|c| c.panel.is_some()) {
            self.calc_layout(id);
        }
    }

    /// A child's geometry changed: relayout a panel that sequences it, or
    /// re-fit a content-sized owner.
    pub(crate) fn notify_owner(&mut self, id: ControlId) {
        let Some(control) = self.tree.get(id) else {
            return;
        };
        let Some(owner) = control.owner else {
            return;
        };
        let Some(owner_control) = self.tree.get(owner) else {
            return;
        };

        let sequenced = owner_control
            .panel
            .as_ref()
            .is_some_and(|p| p.sequence.iter().any(|n| *n == control.name));
        if sequenced {
            self.calc_layout(owner);
        } else if owner_control.geometry.auto.is_content_sized() {
            if let Err(err) = self.auto_adjust(owner) {
                warn!(?owner, %err, "auto rule failed while fitting to content");
            }
        }
    }

    // =========================================================================
    // Coordinates
    // =========================================================================

    /// Top-left corner of `id` in display coordinates.
    pub fn absolute_position(&self, id: ControlId) -> Option<Point<f32>> {
        let control = self.tree.get(id)?;
        let mut x = control.x();
        let mut y = control.y();
        for ancestor in self.tree.ancestors(id) {
            let owner = self.tree.get(ancestor)?;
            x += owner.x() + owner.shell().left;
            y += owner.y() + owner.shell().top;
        }
        Some(Point { x, y })
    }

    /// Convert a display point into `id`-local coordinates.
    pub fn to_local(&self, id: ControlId, point: Point<f32>) -> Option<Point<f32>> {
        let origin = self.absolute_position(id)?;
        Some(Point {
            x: point.x - origin.x,
            y: point.y - origin.y,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
