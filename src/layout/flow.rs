//! Flow layout - panels arranging a named sequence of children.
//!
//! A panel lays out only the children named in its `sequence`; other
//! children keep whatever geometry they were given. Four arrangements:
//!
//! ```text
//! horizontal + wrap      horizontal linear     vertical + wrap   vertical linear
//! [a][b][c]              [a][b][c][d][e]...    [a][d]            [a]
//! [d][e]                                       [b][e]            [b]
//!                                              [c]               [c]
//! ```
//!
//! Positions are computed by the pure functions [`wrap_positions`] and
//! [`linear_positions`]; [`Display::calc_layout`] feeds them and commits
//! the results.

use taffy::geometry::{Point, Size};
use tracing::{debug, warn};

use crate::display::Display;
use crate::engine::PanelState;
use crate::error::{ControlError, Result};
use crate::host::Host;
use crate::state::events::{ControlEvent, EventData, EventKind};
use crate::types::{Anchors, Axis, ContentAlign, ControlFlags, ControlId, FlowLayout};

// =============================================================================
// Placement
// =============================================================================

fn main_cross(size: Size<f32>, axis: Axis) -> (f32, f32) {
    match axis {
        Axis::Horizontal => (size.width, size.height),
        Axis::Vertical => (size.height, size.width),
    }
}

fn point(main: f32, cross: f32, axis: Axis) -> Point<f32> {
    match axis {
        Axis::Horizontal => Point { x: main, y: cross },
        Axis::Vertical => Point { x: cross, y: main },
    }
}

/// Wrapped flow along `axis`.
///
/// An item starts a new line when it would extend past `limit` and the
/// current line is not empty; an item exactly filling the remaining space
/// stays on the line.
pub fn wrap_positions(
    sizes: &[Size<f32>],
    axis: Axis,
    limit: f32,
    split_main: f32,
    split_cross: f32,
) -> Vec<Point<f32>> {
    let mut lft = 0.0_f32;
    let mut top = 0.0_f32;
    let mut line = 0.0_f32;

    sizes
        .iter()
        .map(|size| {
            let (main, cross) = main_cross(*size, axis);
            if lft + main > limit && lft != 0.0 {
                top += line + split_cross;
                lft = 0.0;
                line = 0.0;
            }
            let at = point(lft, top, axis);
            line = line.max(cross);
            lft += main + split_main;
            at
        })
        .collect()
}

/// Single-line flow along `axis`.
///
/// The line is as thick as the thickest item, or `cross_extent` if that is
/// larger and `fit_cross` is false. Items align inside the line per `align`;
/// keywords not meaningful for the axis align to the start edge.
pub fn linear_positions(
    sizes: &[Size<f32>],
    axis: Axis,
    cross_extent: f32,
    split_main: f32,
    align: Option<ContentAlign>,
    fit_cross: bool,
) -> Vec<Point<f32>> {
    let thickest = sizes
        .iter()
        .map(|size| main_cross(*size, axis).1)
        .fold(0.0_f32, f32::max);
    let line = if fit_cross { thickest } else { thickest.max(cross_extent) };

    let mut lft = 0.0_f32;
    sizes
        .iter()
        .map(|size| {
            let (main, cross) = main_cross(*size, axis);
            let offset = match (axis, align) {
                (_, Some(ContentAlign::Center)) => (line - cross) / 2.0,
                (Axis::Horizontal, Some(ContentAlign::Bottom)) => line - cross,
                (Axis::Vertical, Some(ContentAlign::Right)) => line - cross,
                _ => 0.0,
            };
            let at = point(lft, offset, axis);
            lft += main + split_main;
            at
        })
        .collect()
}

// =============================================================================
// Panel properties
// =============================================================================

impl<H: Host> Display<H> {
    fn panel_mut(&mut self, panel: ControlId) -> Result<&mut PanelState> {
        self.tree
            .control_mut(panel)?
            .panel
            .as_mut()
            .ok_or(ControlError::NotAPanel(panel))
    }

    /// Relayout now, or once the suppression window closes.
    fn relayout(&mut self, panel: ControlId) {
        if self.queue.is_suppressed() {
            self.queue.defer(panel);
        } else {
            self.calc_layout(panel);
        }
    }

    pub fn set_layout(&mut self, panel: ControlId, layout: FlowLayout) -> Result<()> {
        let state = self.panel_mut(panel)?;
        if state.layout != layout {
            state.layout = layout;
            self.relayout(panel);
        }
        Ok(())
    }

    pub fn set_wrap(&mut self, panel: ControlId, wrap: bool) -> Result<()> {
        let state = self.panel_mut(panel)?;
        if state.wrap != wrap {
            state.wrap = wrap;
            self.relayout(panel);
        }
        Ok(())
    }

    /// Horizontal gap. Clamps at zero; non-finite values are ignored.
    pub fn set_split_x(&mut self, panel: ControlId, split: f32) -> Result<()> {
        let state = self.panel_mut(panel)?;
        if split.is_finite() && state.split_x != split.max(0.0) {
            state.split_x = split.max(0.0);
            self.relayout(panel);
        }
        Ok(())
    }

    /// Vertical gap. Clamps at zero; non-finite values are ignored.
    pub fn set_split_y(&mut self, panel: ControlId, split: f32) -> Result<()> {
        let state = self.panel_mut(panel)?;
        if split.is_finite() && state.split_y != split.max(0.0) {
            state.split_y = split.max(0.0);
            self.relayout(panel);
        }
        Ok(())
    }

    pub fn set_content_align(&mut self, panel: ControlId, align: Option<ContentAlign>) -> Result<()> {
        let state = self.panel_mut(panel)?;
        if state.content_align != align {
            state.content_align = align;
            self.relayout(panel);
        }
        Ok(())
    }

    /// Set the alignment from a keyword. Unknown keywords align to the start.
    pub fn set_content_align_str(&mut self, panel: ControlId, keyword: &str) -> Result<()> {
        self.set_content_align(panel, ContentAlign::parse(keyword))
    }

    /// Replace the sequence. Names that do not resolve to a child are
    /// dropped, as are repeats.
    pub fn set_sequence<I, S>(&mut self, panel: ControlId, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.panel_mut(panel)?;
        let mut sequence: Vec<String> = Vec::new();
        for name in names {
            let name = name.as_ref();
            if self.tree.child_by_name(panel, name).is_some() && !sequence.iter().any(|n| n == name) {
                sequence.push(name.to_string());
            }
        }

        let state = self.panel_mut(panel)?;
        if state.sequence != sequence {
            state.sequence = sequence;
            self.relayout(panel);
        }
        Ok(())
    }

    /// Sequence names that still resolve to children.
    pub fn sequence(&self, panel: ControlId) -> Result<Vec<String>> {
        let state = self
            .tree
            .control(panel)?
            .panel
            .as_ref()
            .ok_or(ControlError::NotAPanel(panel))?;
        Ok(state
            .sequence
            .iter()
            .filter(|name| self.tree.child_by_name(panel, name).is_some())
            .cloned()
            .collect())
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Arrange the panel's sequenced children.
    ///
    /// No-op for non-panels, `FlowLayout::None`, an empty sequence, a panel
    /// outside the live tree, or a reentrant call.
    pub fn calc_layout(&mut self, panel: ControlId) {
        let Some(control) = self.tree.get(panel) else {
            return;
        };
        let Some(state) = control.panel.as_ref() else {
            return;
        };
        if state.layout == FlowLayout::None
            || state.sequence.is_empty()
            || !control.state.is_live()
            || control.flags.contains(ControlFlags::CALCULATING)
        {
            return;
        }

        if let Some(control) = self.tree.get_mut(panel) {
            control.flags.insert(ControlFlags::CALCULATING);
        }
        self.layout_sequence(panel);
        if let Some(control) = self.tree.get_mut(panel) {
            control.flags.remove(ControlFlags::CALCULATING);
        }
    }

    /// Live, visible sequenced children in sequence order. Stale names are
    /// pruned from the stored sequence.
    fn collect_sequenced(&mut self, panel: ControlId) -> Vec<ControlId> {
        let names = self
            .tree
            .get(panel)
            .and_then(|c| c.panel.as_ref())
            .map(|p| p.sequence.clone())
            .unwrap_or_default();

        let mut live = Vec::with_capacity(names.len());
        let mut items = Vec::with_capacity(names.len());
        for name in names {
            let Some(child) = self.tree.child_by_name(panel, &name) else {
                continue;
            };
            if live.contains(&name) {
                continue;
            }
            if self.tree.get(child).is_some_and(|c| c.is_visible()) {
                items.push(child);
            }
            live.push(name);
        }

        if let Some(state) = self.tree.get_mut(panel).and_then(|c| c.panel.as_mut()) {
            state.sequence = live;
        }
        items
    }

    fn layout_sequence(&mut self, panel: ControlId) {
        let items = self.collect_sequenced(panel);
        if items.is_empty() {
            return;
        }

        // The layout owns item positions
        for item in &items {
            if let Some(control) = self.tree.get_mut(*item) {
                control.geometry.auto.x = None;
                control.geometry.auto.y = None;
                control.geometry.anchors.remove(Anchors::RIGHT | Anchors::BOTTOM);
            }
        }

        let Some(control) = self.tree.get(panel) else {
            return;
        };
        let Some(state) = control.panel.as_ref() else {
            return;
        };
        let inner = control.inner_size();
        let auto = &control.geometry.auto;

        let sizes: Vec<Size<f32>> = items
            .iter()
            .filter_map(|item| self.tree.get(*item))
            .map(|c| Size {
                width: c.width(),
                height: c.height(),
            })
            .collect();

        let positions = match (state.layout, state.wrap) {
            (FlowLayout::None, _) => return,
            (FlowLayout::Horizontal, true) => {
                wrap_positions(&sizes, Axis::Horizontal, inner.width, state.split_x, state.split_y)
            }
            (FlowLayout::Vertical, true) => {
                wrap_positions(&sizes, Axis::Vertical, inner.height, state.split_y, state.split_x)
            }
            (FlowLayout::Horizontal, false) => {
                let fit = auto.height.as_ref().is_some_and(|r| r.is_content_sized());
                linear_positions(&sizes, Axis::Horizontal, inner.height, state.split_x, state.content_align, fit)
            }
            (FlowLayout::Vertical, false) => {
                let fit = auto.width.as_ref().is_some_and(|r| r.is_content_sized());
                linear_positions(&sizes, Axis::Vertical, inner.width, state.split_y, state.content_align, fit)
            }
        };
        let content_sized = auto.is_content_sized();

        let mut moved = 0;
        for (item, at) in items.into_iter().zip(positions) {
            let Some(mut bounds) = self.tree.get(item).map(|c| c.bounds()) else {
                continue;
            };
            bounds.x = at.x;
            bounds.y = at.y;
            if self.commit_bounds(item, bounds) {
                moved += 1;
                self.emit(ControlEvent::new(
                    panel,
                    EventKind::ChildRelocated,
                    EventData::Child(item),
                ));
            }
        }
        debug!(?panel, moved, "layout pass");

        if content_sized {
            if let Err(err) = self.auto_adjust(panel) {
                warn!(?panel, %err, "auto rule failed after layout");
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
