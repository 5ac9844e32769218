//! Core types for spark-controls.
//!
//! These types define the foundation that everything builds on: control
//! identity, kinds, lifecycle state, the flag sets each control carries, and
//! the small enums the geometry and layout engines speak in.

use std::fmt;
use std::str::FromStr;

// =============================================================================
// Control identity
// =============================================================================

slotmap::new_key_type! {
    /// Identifier of a control inside a [`Display`](crate::Display) arena.
    ///
    /// Ids are generational: once a control is destroyed its id never
    /// resolves again, even if the slot is reused.
    pub struct ControlId;
}

// =============================================================================
// Control kind
// =============================================================================

/// The widget kind of a control.
///
/// Kinds form a capability ladder: every Container is usable as a Control,
/// every Panel as a Container, and the Display as a Panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    Control,
    Container,
    Panel,
    Display,
}

impl ControlKind {
    /// Does this kind manage focus among its children?
    #[inline]
    pub const fn is_container(self) -> bool {
        matches!(self, Self::Container | Self::Panel | Self::Display)
    }

    /// Does this kind arrange a sequence of children?
    #[inline]
    pub const fn is_panel(self) -> bool {
        matches!(self, Self::Panel | Self::Display)
    }

    /// Base class names contributed by the kind, most generic first.
    pub const fn class_chain(self) -> &'static [&'static str] {
        match self {
            Self::Control => &["control"],
            Self::Container => &["control", "container"],
            Self::Panel => &["control", "container", "panel"],
            Self::Display => &["control", "container", "panel", "display"],
        }
    }

    /// Whether controls of this kind are focusable when created.
    #[inline]
    pub const fn default_can_focus(self) -> bool {
        self.is_container()
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Control => "control",
            Self::Container => "container",
            Self::Panel => "panel",
            Self::Display => "display",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Control state
// =============================================================================

/// Lifecycle and interaction state of a control.
///
/// Transitions are checked by [`ControlState::can_transition`]; `Dying` is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum ControlState {
    Dying = 0,
    Alive = 1,
    Hover = 2,
    Focus = 3,
    /// Constructed but not attached to the live tree.
    #[default]
    Sleep = 4,
}

impl ControlState {
    /// Live controls take part in rendering, layout and focus.
    #[inline]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Alive | Self::Hover | Self::Focus)
    }

    /// Check whether moving from `self` to `next` is allowed.
    pub const fn can_transition(self, next: Self) -> bool {
        match (self, next) {
            (Self::Dying, _) => false,
            (_, Self::Dying) => true,
            (Self::Alive, Self::Hover) => true,
            (Self::Alive | Self::Hover, Self::Focus) => true,
            (Self::Hover | Self::Focus | Self::Sleep, Self::Alive) => true,
            (Self::Alive | Self::Hover | Self::Focus, Self::Sleep) => true,
            _ => false,
        }
    }

    /// Class name composed into the host box for this state.
    pub const fn class_name(self) -> &'static str {
        match self {
            Self::Dying => "is-dying",
            Self::Alive => "is-alive",
            Self::Hover => "is-hover",
            Self::Focus => "is-focus",
            Self::Sleep => "is-sleep",
        }
    }
}

// =============================================================================
// Flag sets (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Boolean properties and runtime guards of a control.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ControlFlags: u16 {
        const VISIBLE = 1 << 0;
        const CAN_FOCUS = 1 << 1;
        /// Derived: visible, focusable and live.
        const INTERACTIVE = 1 << 2;
        /// Let controls beneath this one take pointer hits.
        const YIELD_FOCUS = 1 << 3;
        /// Only opaque pixels are hittable.
        const HIT_OPAQUE = 1 << 4;
        /// A container that may take focus while it has no focusable children.
        const FOCUS_EMPTY = 1 << 5;
        /// `auto_adjust` is running for this control.
        const ADJUSTING = 1 << 6;
        /// `calc_layout` is running for this panel.
        const CALCULATING = 1 << 7;
    }
}

bitflags::bitflags! {
    /// Edges a control is anchored to inside its owner.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Anchors: u8 {
        const LEFT = 1 << 0;
        const TOP = 1 << 1;
        const RIGHT = 1 << 2;
        const BOTTOM = 1 << 3;
    }
}

impl Default for Anchors {
    fn default() -> Self {
        Self::LEFT | Self::TOP
    }
}

bitflags::bitflags! {
    /// Sticky render flags; any set flag means the control is queued for the
    /// next frame.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Dirty: u8 {
        const CONTENT = 1 << 0;
        const CLASSES = 1 << 1;
        const COORDS = 1 << 2;
    }
}

// =============================================================================
// Geometry vocabulary
// =============================================================================

/// Layout axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// One of the four geometry properties of a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryProp {
    X,
    Y,
    Width,
    Height,
}

impl GeometryProp {
    #[inline]
    pub const fn axis(self) -> Axis {
        match self {
            Self::X | Self::Width => Axis::Horizontal,
            Self::Y | Self::Height => Axis::Vertical,
        }
    }

    #[inline]
    pub const fn is_size(self) -> bool {
        matches!(self, Self::Width | Self::Height)
    }
}

impl fmt::Display for GeometryProp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::X => "autoX",
            Self::Y => "autoY",
            Self::Width => "autoWidth",
            Self::Height => "autoHeight",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Flow layout vocabulary
// =============================================================================

/// Arrangement applied by a panel to its sequenced children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FlowLayout {
    #[default]
    None,
    Horizontal,
    Vertical,
}

/// Cross-axis alignment keyword of a panel.
///
/// Which keywords are meaningful depends on the layout axis: a horizontal
/// layout honours `Top|Center|Bottom`, a vertical one `Left|Center|Right`.
/// Anything else aligns to the start edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentAlign {
    Left,
    Center,
    Right,
    Top,
    Bottom,
}

impl ContentAlign {
    /// Parse a keyword, yielding `None` for unrecognized text.
    pub fn parse(keyword: &str) -> Option<Self> {
        keyword.parse().ok()
    }
}

impl FromStr for ContentAlign {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "left" => Ok(Self::Left),
            "center" => Ok(Self::Center),
            "right" => Ok(Self::Right),
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            _ => Err(()),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
