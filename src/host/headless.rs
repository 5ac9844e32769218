//! In-memory host.
//!
//! Keeps one [`HeadlessBox`] per control, placed from the applied
//! `left/top/width/height` styles. Stacking is approximated by tree depth,
//! then z-index, then creation order.

use slotmap::SecondaryMap;
use taffy::geometry::{Point, Rect, Size};

use super::{BoxMetrics, Host};
use crate::engine::{ZERO_INSETS, ZERO_SIZE};
use crate::pipeline::style::{StyleDiff, StyleKey, StyleValue};
use crate::types::ControlId;

/// State of one host box.
#[derive(Debug, Clone)]
pub struct HeadlessBox {
    parent: Option<ControlId>,
    children: Vec<ControlId>,
    style: StyleDiff,
    class_name: String,
    content: String,
    shell: Rect<f32>,
    intrinsic: Size<f32>,
    /// Box-local regions that do not take hits.
    transparent: Vec<Rect<f32>>,
    order: u64,
}

impl HeadlessBox {
    fn new(order: u64) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            style: StyleDiff::new(),
            class_name: String::new(),
            content: String::new(),
            shell: ZERO_INSETS,
            intrinsic: ZERO_SIZE,
            transparent: Vec::new(),
            order,
        }
    }

    pub fn parent(&self) -> Option<ControlId> {
        self.parent
    }

    pub fn children(&self) -> &[ControlId] {
        &self.children
    }

    /// Every style value applied so far.
    pub fn style(&self) -> &StyleDiff {
        &self.style
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    fn px(&self, key: StyleKey) -> f32 {
        self.style.get(key).and_then(StyleValue::as_f32).unwrap_or(0.0)
    }

    fn is_hidden(&self) -> bool {
        self.style.get(StyleKey::Visibility) == Some(StyleValue::Hidden)
    }

    fn z_index(&self) -> i32 {
        match self.style.get(StyleKey::ZIndex) {
            Some(StyleValue::Integer(z)) => z,
            _ => 0,
        }
    }
}

/// A host with no real document behind it.
#[derive(Debug, Default)]
pub struct HeadlessHost {
    boxes: SecondaryMap<ControlId, HeadlessBox>,
    root: Option<ControlId>,
    /// Absolute rectangles of elements bound to no control, above everything.
    overlays: Vec<Rect<f32>>,
    frame_requests: usize,
    style_flushes: usize,
    focused: Option<ControlId>,
    next_order: u64,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub fn get(&self, id: ControlId) -> Option<&HeadlessBox> {
        self.boxes.get(id)
    }

    pub fn contains(&self, id: ControlId) -> bool {
        self.boxes.contains_key(id)
    }

    /// Total number of `request_frame` calls.
    pub fn frame_requests(&self) -> usize {
        self.frame_requests
    }

    /// Total number of non-empty style batches applied.
    pub fn style_flushes(&self) -> usize {
        self.style_flushes
    }

    /// Box holding native focus.
    pub fn focused(&self) -> Option<ControlId> {
        self.focused
    }

    /// Absolute edges of a box in the document, if it is in one.
    pub fn absolute_rect(&self, id: ControlId) -> Option<Rect<f32>> {
        let (left, top) = self.origin(id)?;
        let b = self.boxes.get(id)?;
        Some(Rect {
            left,
            right: left + b.px(StyleKey::Width),
            top,
            bottom: top + b.px(StyleKey::Height),
        })
    }

    // =========================================================================
    // Fixtures
    // =========================================================================

    /// Set padding + border insets reported for a box.
    pub fn set_shell(&mut self, id: ControlId, shell: Rect<f32>) {
        if let Some(b) = self.boxes.get_mut(id) {
            b.shell = shell;
        }
    }

    /// Set the intrinsic content size reported for a box.
    pub fn set_intrinsic_size(&mut self, id: ControlId, size: Size<f32>) {
        if let Some(b) = self.boxes.get_mut(id) {
            b.intrinsic = size;
        }
    }

    /// Mark a box-local region as transparent to hits.
    pub fn add_transparent_region(&mut self, id: ControlId, region: Rect<f32>) {
        if let Some(b) = self.boxes.get_mut(id) {
            b.transparent.push(region);
        }
    }

    /// Add an absolute element bound to no control on top of the document.
    pub fn add_overlay(&mut self, rect: Rect<f32>) {
        self.overlays.push(rect);
    }

    // =========================================================================
    // Placement
    // =========================================================================

    /// Absolute top-left corner; `None` for boxes outside the document.
    fn origin(&self, id: ControlId) -> Option<(f32, f32)> {
        let b = self.boxes.get(id)?;
        let (left, top) = (b.px(StyleKey::Left), b.px(StyleKey::Top));
        match b.parent {
            Some(parent) => {
                let (px, py) = self.origin(parent)?;
                let shell = self.boxes.get(parent)?.shell;
                Some((px + shell.left + left, py + shell.top + top))
            }
            None if self.root == Some(id) => Some((left, top)),
            None => None,
        }
    }

    fn depth_if_shown(&self, id: ControlId) -> Option<usize> {
        let mut depth = 0;
        let mut current = Some(id);
        while let Some(next) = current {
            let b = self.boxes.get(next)?;
            if b.is_hidden() {
                return None;
            }
            depth += 1;
            current = b.parent;
        }
        Some(depth)
    }
}

fn contains(rect: &Rect<f32>, point: Point<f32>) -> bool {
    point.x >= rect.left && point.x < rect.right && point.y >= rect.top && point.y < rect.bottom
}

impl Host for HeadlessHost {
    fn bind_root(&mut self, id: ControlId) {
        self.root = Some(id);
    }

    fn create_box(&mut self, id: ControlId) {
        let order = self.next_order;
        self.next_order += 1;
        self.boxes.insert(id, HeadlessBox::new(order));
    }

    fn remove_box(&mut self, id: ControlId) {
        self.detach_box(id);
        if let Some(b) = self.boxes.remove(id) {
            for child in b.children {
                if let Some(child) = self.boxes.get_mut(child) {
                    child.parent = None;
                }
            }
        }
        if self.focused == Some(id) {
            self.focused = None;
        }
        if self.root == Some(id) {
            self.root = None;
        }
    }

    fn attach_box(&mut self, parent: ControlId, child: ControlId) {
        self.detach_box(child);
        if !self.boxes.contains_key(parent) {
            return;
        }
        if let Some(b) = self.boxes.get_mut(child) {
            b.parent = Some(parent);
        }
        if let Some(p) = self.boxes.get_mut(parent) {
            p.children.push(child);
        }
    }

    fn detach_box(&mut self, child: ControlId) {
        let Some(parent) = self.boxes.get_mut(child).and_then(|b| b.parent.take()) else {
            return;
        };
        if let Some(p) = self.boxes.get_mut(parent) {
            p.children.retain(|id| *id != child);
        }
    }

    fn apply_style(&mut self, id: ControlId, diff: &StyleDiff) {
        if diff.is_empty() {
            return;
        }
        if let Some(b) = self.boxes.get_mut(id) {
            for (key, value) in diff.iter() {
                b.style.set(key, value);
            }
            self.style_flushes += 1;
        }
    }

    fn set_class_name(&mut self, id: ControlId, class_name: &str) {
        if let Some(b) = self.boxes.get_mut(id) {
            b.class_name = class_name.to_string();
        }
    }

    fn set_content(&mut self, id: ControlId, content: &str) {
        if let Some(b) = self.boxes.get_mut(id) {
            b.content = content.to_string();
        }
    }

    fn metrics(&self, id: ControlId) -> BoxMetrics {
        match self.boxes.get(id) {
            Some(b) => BoxMetrics {
                shell: b.shell,
                content: b.intrinsic,
            },
            None => BoxMetrics {
                shell: ZERO_INSETS,
                content: ZERO_SIZE,
            },
        }
    }

    fn stack_at(&self, point: Point<f32>) -> Vec<Option<ControlId>> {
        let mut hits: Vec<(usize, i32, u64, ControlId)> = self
            .boxes
            .iter()
            .filter_map(|(id, b)| {
                let depth = self.depth_if_shown(id)?;
                let rect = self.absolute_rect(id)?;
                contains(&rect, point).then_some((depth, b.z_index(), b.order, id))
            })
            .collect();

        hits.sort_by(|a, b| (b.0, b.1, b.2).cmp(&(a.0, a.1, a.2)));

        let overlays = self
            .overlays
            .iter()
            .filter(|rect| contains(rect, point))
            .map(|_| None);

        overlays.chain(hits.into_iter().map(|hit| Some(hit.3))).collect()
    }

    fn is_opaque_at(&self, id: ControlId, point: Point<f32>) -> bool {
        self.boxes
            .get(id)
            .is_some_and(|b| !b.transparent.iter().any(|region| contains(region, point)))
    }

    fn request_frame(&mut self) {
        self.frame_requests += 1;
    }

    fn focus_native(&mut self, id: ControlId) {
        self.focused = Some(id);
    }
}
