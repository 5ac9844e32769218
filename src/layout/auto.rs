//! Auto values - geometry driven by a rule instead of a literal number.
//!
//! An auto value is one of:
//! - a number: fractional of the owner's inner dimension when strictly
//!   between 0 and 1, an absolute pixel value otherwise
//! - a keyword: `right`/`bottom`/`center` position the control against its
//!   own size, `fit`/`max` size it from its content
//! - a viewport object: breakpoint name → value, with `df` as the fallback
//!
//! Resolution here is pure. Content measurement for `fit`/`max` is done by the
//! geometry resolver, which receives [`Resolved::Fit`] / [`Resolved::Max`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{ControlError, Result};
use crate::types::GeometryProp;

/// Key of the fallback entry in a viewport object.
pub const VIEWPORT_DEFAULT_KEY: &str = "df";

// =============================================================================
// Types
// =============================================================================

/// Keyword auto values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AutoKeyword {
    Right,
    Bottom,
    Center,
    /// Smallest box holding the content, bounded by the nearest non-fit
    /// ancestor.
    Fit,
    /// Whatever the content demands, unbounded.
    Max,
}

impl AutoKeyword {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Right => "right",
            Self::Bottom => "bottom",
            Self::Center => "center",
            Self::Fit => "fit",
            Self::Max => "max",
        }
    }
}

impl fmt::Display for AutoKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AutoKeyword {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "right" => Ok(Self::Right),
            "bottom" => Ok(Self::Bottom),
            "center" => Ok(Self::Center),
            "fit" => Ok(Self::Fit),
            "max" => Ok(Self::Max),
            other => Err(format!("unknown keyword `{other}`")),
        }
    }
}

/// Breakpoint-selected auto value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewportValue {
    values: BTreeMap<String, AutoValue>,
}

impl ViewportValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the value used while `breakpoint` is active.
    pub fn with(mut self, breakpoint: impl Into<String>, value: impl Into<AutoValue>) -> Self {
        self.values.insert(breakpoint.into(), value.into());
        self
    }

    /// Add the `df` fallback.
    pub fn with_default(self, value: impl Into<AutoValue>) -> Self {
        self.with(VIEWPORT_DEFAULT_KEY, value)
    }

    pub fn get(&self, breakpoint: &str) -> Option<&AutoValue> {
        self.values.get(breakpoint)
    }

    /// Value for `breakpoint`, falling back to `df`.
    pub fn select(&self, breakpoint: &str) -> Option<&AutoValue> {
        self.get(breakpoint).or_else(|| self.get(VIEWPORT_DEFAULT_KEY))
    }
}

/// A geometry rule.
#[derive(Debug, Clone, PartialEq)]
pub enum AutoValue {
    Number(f32),
    Keyword(AutoKeyword),
    Viewport(ViewportValue),
}

impl AutoValue {
    /// Parse text for `prop`, reporting failures as `InvalidAutoValue`.
    pub fn parse_for(prop: GeometryProp, text: &str) -> Result<Self> {
        text.parse()
            .map_err(|reason| ControlError::InvalidAutoValue { prop, reason })
    }

    /// `fit` or `max`, directly or through any viewport entry.
    pub fn is_content_sized(&self) -> bool {
        match self {
            Self::Keyword(AutoKeyword::Fit | AutoKeyword::Max) => true,
            Self::Viewport(vp) => vp.values.values().any(AutoValue::is_content_sized),
            _ => false,
        }
    }

    /// Is this rule `fit` while `breakpoint` is active?
    pub fn is_fit_at(&self, breakpoint: &str) -> bool {
        match self {
            Self::Keyword(AutoKeyword::Fit) => true,
            Self::Viewport(vp) => vp
                .select(breakpoint)
                .is_some_and(|v| matches!(v, Self::Keyword(AutoKeyword::Fit))),
            _ => false,
        }
    }
}

impl From<f32> for AutoValue {
    fn from(value: f32) -> Self {
        Self::Number(value)
    }
}

impl From<AutoKeyword> for AutoValue {
    fn from(value: AutoKeyword) -> Self {
        Self::Keyword(value)
    }
}

impl From<ViewportValue> for AutoValue {
    fn from(value: ViewportValue) -> Self {
        Self::Viewport(value)
    }
}

impl FromStr for AutoValue {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let text = s.trim();
        if let Ok(number) = text.parse::<f32>() {
            if !number.is_finite() {
                return Err(format!("`{text}` is not a finite number"));
            }
            return Ok(Self::Number(number));
        }
        text.parse::<AutoKeyword>().map(Self::Keyword)
    }
}

// =============================================================================
// Per-control rule set
// =============================================================================

/// The four auto rules of a control. `None` means "not automatic".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AutoRules {
    pub x: Option<AutoValue>,
    pub y: Option<AutoValue>,
    pub width: Option<AutoValue>,
    pub height: Option<AutoValue>,
}

impl AutoRules {
    pub fn get(&self, prop: GeometryProp) -> Option<&AutoValue> {
        match prop {
            GeometryProp::X => self.x.as_ref(),
            GeometryProp::Y => self.y.as_ref(),
            GeometryProp::Width => self.width.as_ref(),
            GeometryProp::Height => self.height.as_ref(),
        }
    }

    pub fn slot(&mut self, prop: GeometryProp) -> &mut Option<AutoValue> {
        match prop {
            GeometryProp::X => &mut self.x,
            GeometryProp::Y => &mut self.y,
            GeometryProp::Width => &mut self.width,
            GeometryProp::Height => &mut self.height,
        }
    }

    pub fn any(&self) -> bool {
        self.x.is_some() || self.y.is_some() || self.width.is_some() || self.height.is_some()
    }

    /// Does either size rule depend on content?
    pub fn is_content_sized(&self) -> bool {
        [&self.width, &self.height]
            .into_iter()
            .flatten()
            .any(AutoValue::is_content_sized)
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Outcome of resolving one rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved {
    Px(f32),
    Fit,
    Max,
}

/// Resolve a numeric rule against owner inner dimension `d`.
#[inline]
pub fn resolve_number(value: f32, d: f32) -> f32 {
    if value <= 0.0 || value >= 1.0 {
        value
    } else {
        value * d
    }
}

/// Resolve `value` for `prop`.
///
/// * `owner_inner` - the owner's inner box dimension on the prop's axis
/// * `size` - the control's resolved size on that axis (used by position
///   keywords)
/// * `breakpoint` - the active viewport name
pub fn resolve(
    value: &AutoValue,
    prop: GeometryProp,
    owner_inner: f32,
    size: f32,
    breakpoint: &str,
) -> Result<Resolved> {
    let value = match value {
        AutoValue::Viewport(vp) => {
            vp.select(breakpoint)
                .ok_or_else(|| ControlError::MissingViewportValue {
                    prop,
                    breakpoint: breakpoint.to_string(),
                })?
        }
        other => other,
    };

    match value {
        AutoValue::Number(v) if v.is_finite() => Ok(Resolved::Px(resolve_number(*v, owner_inner))),
        AutoValue::Number(v) => Err(invalid(prop, format!("`{v}` is not a finite number"))),
        AutoValue::Keyword(keyword) => resolve_keyword(*keyword, prop, owner_inner, size),
        AutoValue::Viewport(_) => Err(invalid(prop, "viewport objects cannot nest")),
    }
}

fn resolve_keyword(keyword: AutoKeyword, prop: GeometryProp, d: f32, size: f32) -> Result<Resolved> {
    use AutoKeyword::*;
    use GeometryProp::*;

    match (prop, keyword) {
        (X, Right) | (Y, Bottom) => Ok(Resolved::Px(d - size)),
        (X | Y, Center) => Ok(Resolved::Px((d - size) / 2.0)),
        (Width | Height, Fit) => Ok(Resolved::Fit),
        (Width | Height, Max) => Ok(Resolved::Max),
        _ => Err(invalid(prop, format!("`{keyword}` does not apply"))),
    }
}

fn invalid(prop: GeometryProp, reason: impl Into<String>) -> ControlError {
    ControlError::InvalidAutoValue {
        prop,
        reason: reason.into(),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn px(value: &AutoValue, prop: GeometryProp, d: f32, size: f32) -> f32 {
        match resolve(value, prop, d, size, "md").unwrap() {
            Resolved::Px(v) => v,
            other => panic!("expected pixels, got {other:?}"),
        }
    }

    #[test]
    fn test_fraction_of_owner() {
        let half = AutoValue::from(0.5_f32);
        assert_eq!(px(&half, GeometryProp::Width, 200.0, 0.0), 100.0);
        // The rule depends on the value, not on the owner's scale
        assert_eq!(px(&half, GeometryProp::Width, 2.0, 0.0), 1.0);
    }

    #[test]
    fn test_absolute_numbers() {
        assert_eq!(px(&AutoValue::from(1.0_f32), GeometryProp::Width, 200.0, 0.0), 1.0);
        assert_eq!(px(&AutoValue::from(0.0_f32), GeometryProp::X, 200.0, 0.0), 0.0);
        assert_eq!(px(&AutoValue::from(40.0_f32), GeometryProp::Height, 200.0, 0.0), 40.0);
        assert_eq!(px(&AutoValue::from(-10.0_f32), GeometryProp::Y, 200.0, 0.0), -10.0);
    }

    #[test]
    fn test_position_keywords() {
        let right = AutoValue::from(AutoKeyword::Right);
        let center = AutoValue::from(AutoKeyword::Center);
        let bottom = AutoValue::from(AutoKeyword::Bottom);

        assert_eq!(px(&right, GeometryProp::X, 300.0, 100.0), 200.0);
        assert_eq!(px(&center, GeometryProp::X, 300.0, 100.0), 100.0);
        assert_eq!(px(&bottom, GeometryProp::Y, 300.0, 50.0), 250.0);
        assert_eq!(px(&center, GeometryProp::Y, 300.0, 50.0), 125.0);
    }

    #[test]
    fn test_content_keywords() {
        let fit = AutoValue::from(AutoKeyword::Fit);
        let max = AutoValue::from(AutoKeyword::Max);
        assert_eq!(resolve(&fit, GeometryProp::Width, 100.0, 0.0, "md"), Ok(Resolved::Fit));
        assert_eq!(resolve(&max, GeometryProp::Height, 100.0, 0.0, "md"), Ok(Resolved::Max));
    }

    #[test]
    fn test_keyword_on_wrong_axis() {
        let bottom = AutoValue::from(AutoKeyword::Bottom);
        let err = resolve(&bottom, GeometryProp::X, 100.0, 10.0, "md").unwrap_err();
        assert!(matches!(err, ControlError::InvalidAutoValue { prop: GeometryProp::X, .. }));

        let fit = AutoValue::from(AutoKeyword::Fit);
        assert!(resolve(&fit, GeometryProp::Y, 100.0, 10.0, "md").is_err());
    }

    #[test]
    fn test_viewport_selection() {
        let value = AutoValue::from(
            ViewportValue::new()
                .with("sm", 0.25_f32)
                .with_default(120.0_f32),
        );
        assert_eq!(
            resolve(&value, GeometryProp::Width, 400.0, 0.0, "sm"),
            Ok(Resolved::Px(100.0))
        );
        assert_eq!(
            resolve(&value, GeometryProp::Width, 400.0, 0.0, "xl"),
            Ok(Resolved::Px(120.0))
        );
    }

    #[test]
    fn test_viewport_missing_value() {
        let value = AutoValue::from(ViewportValue::new().with("sm", 10.0_f32));
        let err = resolve(&value, GeometryProp::Height, 400.0, 0.0, "lg").unwrap_err();
        assert_eq!(
            err,
            ControlError::MissingViewportValue {
                prop: GeometryProp::Height,
                breakpoint: "lg".to_string(),
            }
        );
    }

    #[test]
    fn test_nested_viewport_is_invalid() {
        let inner = ViewportValue::new().with_default(10.0_f32);
        let value = AutoValue::from(ViewportValue::new().with_default(inner));
        assert!(matches!(
            resolve(&value, GeometryProp::X, 100.0, 0.0, "md"),
            Err(ControlError::InvalidAutoValue { .. })
        ));
    }

    #[test]
    fn test_non_finite_number_is_invalid() {
        let value = AutoValue::Number(f32::NAN);
        assert!(resolve(&value, GeometryProp::Width, 100.0, 0.0, "md").is_err());
    }

    #[test]
    fn test_parse() {
        assert_eq!("0.5".parse::<AutoValue>(), Ok(AutoValue::Number(0.5)));
        assert_eq!(" right ".parse::<AutoValue>(), Ok(AutoValue::Keyword(AutoKeyword::Right)));
        assert!(AutoValue::parse_for(GeometryProp::X, "sideways").is_err());
        assert!(AutoValue::parse_for(GeometryProp::X, "inf").is_err());
    }

    #[test]
    fn test_fit_at_breakpoint() {
        let value = AutoValue::from(
            ViewportValue::new()
                .with("sm", AutoKeyword::Fit)
                .with_default(0.5_f32),
        );
        assert!(value.is_content_sized());
        assert!(value.is_fit_at("sm"));
        assert!(!value.is_fit_at("lg"));
    }

    #[test]
    fn test_rules() {
        let mut rules = AutoRules::default();
        assert!(!rules.any());
        *rules.slot(GeometryProp::Height) = Some(AutoValue::from(AutoKeyword::Max));
        assert!(rules.any());
        assert!(rules.is_content_sized());
        assert!(rules.get(GeometryProp::Width).is_none());
    }
}
