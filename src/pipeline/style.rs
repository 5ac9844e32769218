//! Shadow style diff and class composition.
//!
//! Every style write lands in a per-control [`StyleDiff`] first. The render
//! pass moves the diff out of the control (leaving an empty one behind) and
//! hands it to the host box in one go.

use std::collections::BTreeMap;
use std::fmt;

use crate::types::{ControlKind, ControlState, GeometryProp};

// =============================================================================
// Keys and values
// =============================================================================

/// CSS-like style key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StyleKey {
    Left,
    Top,
    Width,
    Height,
    ZIndex,
    Opacity,
    Visibility,
}

impl StyleKey {
    pub const fn as_css(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Top => "top",
            Self::Width => "width",
            Self::Height => "height",
            Self::ZIndex => "z-index",
            Self::Opacity => "opacity",
            Self::Visibility => "visibility",
        }
    }
}

impl From<GeometryProp> for StyleKey {
    fn from(prop: GeometryProp) -> Self {
        match prop {
            GeometryProp::X => Self::Left,
            GeometryProp::Y => Self::Top,
            GeometryProp::Width => Self::Width,
            GeometryProp::Height => Self::Height,
        }
    }
}

impl fmt::Display for StyleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_css())
    }
}

/// Style value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StyleValue {
    Px(f32),
    Number(f32),
    Integer(i32),
    Visible,
    Hidden,
}

impl StyleValue {
    /// Pixel or plain number payload, if any.
    pub fn as_f32(self) -> Option<f32> {
        match self {
            Self::Px(v) | Self::Number(v) => Some(v),
            Self::Integer(v) => Some(v as f32),
            Self::Visible | Self::Hidden => None,
        }
    }
}

impl fmt::Display for StyleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Px(v) => write!(f, "{v}px"),
            Self::Number(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Visible => f.write_str("visible"),
            Self::Hidden => f.write_str("hidden"),
        }
    }
}

// =============================================================================
// StyleDiff
// =============================================================================

/// Pending style changes of one control. Later writes to a key replace
/// earlier ones.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyleDiff {
    entries: BTreeMap<StyleKey, StyleValue>,
}

impl StyleDiff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: StyleKey, value: StyleValue) {
        self.entries.insert(key, value);
    }

    pub fn get(&self, key: StyleKey) -> Option<StyleValue> {
        self.entries.get(&key).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StyleKey, StyleValue)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, *v))
    }
}

// =============================================================================
// Class composition
// =============================================================================

/// Compose the host class name: kind chain, state class, then user classes.
/// Duplicates are dropped, first occurrence wins.
pub fn compose_class_name(kind: ControlKind, state: ControlState, classes: &[String]) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(kind.class_chain().len() + 1 + classes.len());
    parts.extend_from_slice(kind.class_chain());
    parts.push(state.class_name());

    for class in classes {
        let class = class.as_str();
        if !class.is_empty() && !parts.contains(&class) {
            parts.push(class);
        }
    }

    parts.join(" ")
}
