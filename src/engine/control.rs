//! Control - the node record stored in the arena.
//!
//! A control is plain data. Everything that needs the surrounding tree (owner
//! sizes, the render queue, the host box) lives on [`Display`](crate::Display).
//!
//! Capabilities are composed, not inherited: containers carry a
//! [`ContainerState`], panels additionally a [`PanelState`].

use taffy::geometry::{Rect, Size};

use crate::layout::auto::{AutoRules, AutoValue};
use crate::pipeline::style::{StyleDiff, StyleKey, StyleValue};
use crate::types::{
    Anchors, ContentAlign, ControlFlags, ControlId, ControlKind, ControlState, Dirty, FlowLayout,
    GeometryProp,
};

/// Shell insets of a box without padding or border.
pub const ZERO_INSETS: Rect<f32> = Rect {
    left: 0.0,
    right: 0.0,
    top: 0.0,
    bottom: 0.0,
};

pub const ZERO_SIZE: Size<f32> = Size {
    width: 0.0,
    height: 0.0,
};

// =============================================================================
// Geometry
// =============================================================================

/// Position and size of a control inside its owner's inner box.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn get(&self, prop: GeometryProp) -> f32 {
        match prop {
            GeometryProp::X => self.x,
            GeometryProp::Y => self.y,
            GeometryProp::Width => self.width,
            GeometryProp::Height => self.height,
        }
    }

    pub fn set(&mut self, prop: GeometryProp, value: f32) {
        match prop {
            GeometryProp::X => self.x = value,
            GeometryProp::Y => self.y = value,
            GeometryProp::Width => self.width = value,
            GeometryProp::Height => self.height = value,
        }
    }

    pub fn moved_from(&self, other: &Bounds) -> bool {
        self.x != other.x || self.y != other.y
    }

    pub fn resized_from(&self, other: &Bounds) -> bool {
        self.width != other.width || self.height != other.height
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Geometry {
    pub(crate) bounds: Bounds,
    pub(crate) auto: AutoRules,
    pub(crate) anchors: Anchors,
    /// Padding + border of the host box.
    pub(crate) shell: Rect<f32>,
    /// Owner inner size seen by the last `auto_adjust`.
    pub(crate) owner_size: Size<f32>,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            bounds: Bounds::default(),
            auto: AutoRules::default(),
            anchors: Anchors::default(),
            shell: ZERO_INSETS,
            owner_size: ZERO_SIZE,
        }
    }
}

// =============================================================================
// Capability parts
// =============================================================================

/// Focus bookkeeping of a container.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerState {
    pub(crate) tabs_loop: bool,
    pub(crate) focus: Option<ControlId>,
    pub(crate) default_control: Option<ControlId>,
    /// `None` when nothing is tab-reachable.
    pub(crate) tab_cache: Option<Vec<ControlId>>,
    pub(crate) tabs_dirty: bool,
}

impl Default for ContainerState {
    fn default() -> Self {
        Self {
            tabs_loop: true,
            focus: None,
            default_control: None,
            tab_cache: None,
            tabs_dirty: true,
        }
    }
}

impl ContainerState {
    pub fn tabs_loop(&self) -> bool {
        self.tabs_loop
    }

    /// The child on the path to the focused leaf.
    pub fn focus(&self) -> Option<ControlId> {
        self.focus
    }

    pub fn default_control(&self) -> Option<ControlId> {
        self.default_control
    }

    pub fn is_tab_cache_valid(&self) -> bool {
        !self.tabs_dirty
    }
}

/// Flow layout properties of a panel.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PanelState {
    pub(crate) layout: FlowLayout,
    pub(crate) wrap: bool,
    pub(crate) sequence: Vec<String>,
    pub(crate) split_x: f32,
    pub(crate) split_y: f32,
    pub(crate) content_align: Option<ContentAlign>,
}

impl PanelState {
    pub fn layout(&self) -> FlowLayout {
        self.layout
    }

    pub fn wrap(&self) -> bool {
        self.wrap
    }

    /// Raw sequence; may hold names of children detached since the last
    /// layout. Use [`Display::sequence`](crate::Display::sequence) for the
    /// live view.
    pub fn raw_sequence(&self) -> &[String] {
        &self.sequence
    }

    pub fn split_x(&self) -> f32 {
        self.split_x
    }

    pub fn split_y(&self) -> f32 {
        self.split_y
    }

    pub fn content_align(&self) -> Option<ContentAlign> {
        self.content_align
    }
}

// =============================================================================
// Control
// =============================================================================

/// A node of the control tree.
#[derive(Debug, Clone)]
pub struct Control {
    pub(crate) kind: ControlKind,
    pub(crate) name: String,
    pub(crate) owner: Option<ControlId>,
    pub(crate) children: Vec<ControlId>,
    pub(crate) geometry: Geometry,
    pub(crate) state: ControlState,
    pub(crate) flags: ControlFlags,
    pub(crate) tab_index: i32,
    pub(crate) z_index: i32,
    pub(crate) opacity: f32,
    pub(crate) classes: Vec<String>,
    pub(crate) content: Option<String>,
    pub(crate) shadow: StyleDiff,
    pub(crate) dirty: Dirty,
    pub(crate) container: Option<ContainerState>,
    pub(crate) panel: Option<PanelState>,
}

impl Control {
    pub(crate) fn new(kind: ControlKind, name: String) -> Self {
        let mut flags = ControlFlags::VISIBLE;
        if kind.default_can_focus() {
            flags |= ControlFlags::CAN_FOCUS;
        }

        // Seed the diff so the first flush places the host box
        let mut shadow = StyleDiff::new();
        for key in [StyleKey::Left, StyleKey::Top, StyleKey::Width, StyleKey::Height] {
            shadow.set(key, StyleValue::Px(0.0));
        }
        shadow.set(StyleKey::ZIndex, StyleValue::Integer(0));
        shadow.set(StyleKey::Opacity, StyleValue::Number(1.0));
        shadow.set(StyleKey::Visibility, StyleValue::Visible);

        Self {
            kind,
            name,
            owner: None,
            children: Vec::new(),
            geometry: Geometry::default(),
            state: ControlState::Sleep,
            flags,
            tab_index: 0,
            z_index: 0,
            opacity: 1.0,
            classes: Vec::new(),
            content: None,
            shadow,
            dirty: Dirty::empty(),
            container: kind.is_container().then(ContainerState::default),
            panel: kind.is_panel().then(PanelState::default),
        }
    }

    // -------------------------------------------------------------------------
    // Identity and tree
    // -------------------------------------------------------------------------

    pub fn kind(&self) -> ControlKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> Option<ControlId> {
        self.owner
    }

    pub fn children(&self) -> &[ControlId] {
        &self.children
    }

    pub fn as_container(&self) -> Option<&ContainerState> {
        self.container.as_ref()
    }

    pub fn as_panel(&self) -> Option<&PanelState> {
        self.panel.as_ref()
    }

    // -------------------------------------------------------------------------
    // Geometry
    // -------------------------------------------------------------------------

    pub fn x(&self) -> f32 {
        self.geometry.bounds.x
    }

    pub fn y(&self) -> f32 {
        self.geometry.bounds.y
    }

    pub fn width(&self) -> f32 {
        self.geometry.bounds.width
    }

    pub fn height(&self) -> f32 {
        self.geometry.bounds.height
    }

    pub fn bounds(&self) -> Bounds {
        self.geometry.bounds
    }

    pub fn auto(&self, prop: GeometryProp) -> Option<&AutoValue> {
        self.geometry.auto.get(prop)
    }

    pub fn auto_x(&self) -> Option<&AutoValue> {
        self.geometry.auto.x.as_ref()
    }

    pub fn auto_y(&self) -> Option<&AutoValue> {
        self.geometry.auto.y.as_ref()
    }

    pub fn auto_width(&self) -> Option<&AutoValue> {
        self.geometry.auto.width.as_ref()
    }

    pub fn auto_height(&self) -> Option<&AutoValue> {
        self.geometry.auto.height.as_ref()
    }

    pub fn anchors(&self) -> Anchors {
        self.geometry.anchors
    }

    /// Padding + border insets last read from the host box.
    pub fn shell(&self) -> Rect<f32> {
        self.geometry.shell
    }

    /// Size of the box children are laid out in.
    pub fn inner_size(&self) -> Size<f32> {
        let shell = self.geometry.shell;
        let bounds = self.geometry.bounds;
        Size {
            width: (bounds.width - shell.left - shell.right).max(0.0),
            height: (bounds.height - shell.top - shell.bottom).max(0.0),
        }
    }

    // -------------------------------------------------------------------------
    // State and flags
    // -------------------------------------------------------------------------

    pub fn state(&self) -> ControlState {
        self.state
    }

    pub fn flags(&self) -> ControlFlags {
        self.flags
    }

    pub fn is_visible(&self) -> bool {
        self.flags.contains(ControlFlags::VISIBLE)
    }

    pub fn can_focus(&self) -> bool {
        self.flags.contains(ControlFlags::CAN_FOCUS)
    }

    pub fn is_interactive(&self) -> bool {
        self.flags.contains(ControlFlags::INTERACTIVE)
    }

    pub fn yields_focus(&self) -> bool {
        self.flags.contains(ControlFlags::YIELD_FOCUS)
    }

    pub fn is_hit_opaque(&self) -> bool {
        self.flags.contains(ControlFlags::HIT_OPAQUE)
    }

    /// May this container take focus while it has no focusable children?
    pub fn focus_when_empty(&self) -> bool {
        self.flags.contains(ControlFlags::FOCUS_EMPTY)
    }

    pub fn tab_index(&self) -> i32 {
        self.tab_index
    }

    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    // -------------------------------------------------------------------------
    // Rendering
    // -------------------------------------------------------------------------

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn dirty(&self) -> Dirty {
        self.dirty
    }

    /// Style changes not yet flushed to the host box.
    pub fn pending_style(&self) -> &StyleDiff {
        &self.shadow
    }

    pub(crate) fn compute_interactive(&self) -> bool {
        self.flags.contains(ControlFlags::VISIBLE | ControlFlags::CAN_FOCUS) && self.state.is_live()
    }
}
