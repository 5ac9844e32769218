//! Error types for control tree operations.

use thiserror::Error;

use crate::state::events::EventKind;
use crate::types::{ControlId, ControlKind, GeometryProp};

/// Result type for control tree operations.
pub type Result<T> = std::result::Result<T, ControlError>;

/// Errors surfaced to the host application.
///
/// Structural misuse (cycles, a second display, unknown ids) and malformed
/// auto values are errors. Layout and focus misuse never are: those degrade
/// to no-ops.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ControlError {
    /// The id does not name a live control in this display.
    #[error("unknown control {0:?}")]
    UnknownControl(ControlId),

    /// An auto value has the wrong shape for the property it drives.
    #[error("invalid {prop} value: {reason}")]
    InvalidAutoValue { prop: GeometryProp, reason: String },

    /// A viewport object has neither the active breakpoint nor `df`.
    #[error("{prop} has no value for breakpoint `{breakpoint}` and no `df` default")]
    MissingViewportValue { prop: GeometryProp, breakpoint: String },

    /// Attaching would make a control its own ancestor.
    #[error("attaching {child:?} under {parent:?} would create an ownership cycle")]
    CyclicOwnership { parent: ControlId, child: ControlId },

    /// A sibling with the same name already exists.
    #[error("{owner:?} already owns a control named `{name}`")]
    DuplicateName { owner: ControlId, name: String },

    /// Only one display may exist per context.
    #[error("a display already exists in this context")]
    DisplayExists,

    /// The display root cannot be detached, reparented or destroyed.
    #[error("the display root cannot be detached or destroyed")]
    RootDetach,

    #[error("{0:?} is not a container")]
    NotAContainer(ControlId),

    #[error("{0:?} is not a panel")]
    NotAPanel(ControlId),

    /// The widget kind does not declare this event.
    #[error("{kind} controls do not raise {event:?}")]
    UnsupportedEvent { kind: ControlKind, event: EventKind },
}
