//! Keyboard Module - Key events and keyboard dispatch
//!
//! Routing of a key press, in order:
//!
//! 1. `Tab` / `Shift+Tab` move focus through the tab order, escalating to
//!    outer containers when the current one has nowhere to go. Always
//!    reported as handled so the host suppresses its own tab handling.
//! 2. Anything else is raised as `Key` on the focused control, then on each
//!    container above it, until a handler consumes it.
//! 3. An unconsumed `Enter` raises `DefaultAction` on the default control of
//!    the nearest container that has one.
//!
//! # Example
//!
//! ```ignore
//! use spark_controls::state::keyboard::{KeyboardEvent, Modifiers};
//!
//! display.on(dialog, EventKind::Key, |event| {
//!     event.key().is_some_and(|key| key.key == "Escape")
//! })?;
//! display.dispatch_key(KeyboardEvent::with_modifiers("Tab", Modifiers::shift()));
//! ```

use tracing::trace;

use crate::display::Display;
use crate::host::Host;
use crate::state::events::{ControlEvent, EventData, EventKind};
use crate::types::ControlId;

// =============================================================================
// TYPES
// =============================================================================

/// Keyboard modifier state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn ctrl() -> Self {
        Self { ctrl: true, ..Self::default() }
    }

    pub fn alt() -> Self {
        Self { alt: true, ..Self::default() }
    }

    pub fn shift() -> Self {
        Self { shift: true, ..Self::default() }
    }
}

/// Key event state (press, repeat, release)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum KeyState {
    #[default]
    Press,
    Repeat,
    Release,
}

/// Keyboard event
#[derive(Clone, Debug, PartialEq)]
pub struct KeyboardEvent {
    /// Key name ("a", "Enter", "ArrowUp", "F5")
    pub key: String,
    pub modifiers: Modifiers,
    pub state: KeyState,
}

impl KeyboardEvent {
    /// A plain key press
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            modifiers: Modifiers::default(),
            state: KeyState::Press,
        }
    }

    /// A key press with modifiers
    pub fn with_modifiers(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            key: key.into(),
            modifiers,
            state: KeyState::Press,
        }
    }

    pub fn is_press(&self) -> bool {
        self.state == KeyState::Press
    }

    fn is_tab(&self) -> bool {
        self.key == "Tab" && !self.modifiers.ctrl && !self.modifiers.alt && !self.modifiers.meta
    }
}

// =============================================================================
// DISPATCH
// =============================================================================

impl<H: Host> Display<H> {
    /// Dispatch a key event. Returns true when it was handled and the host
    /// should suppress its default behavior.
    pub fn dispatch_key(&mut self, event: KeyboardEvent) -> bool {
        if event.state == KeyState::Release {
            return false;
        }

        if event.is_tab() {
            let moved = if event.modifiers.shift {
                self.focus_previous()
            } else {
                self.focus_next()
            };
            trace!(backward = event.modifiers.shift, moved, "tab");
            return true;
        }

        let start = self.current_control.unwrap_or(self.root);
        let chain: Vec<ControlId> = std::iter::once(start)
            .chain(
                self.tree
                    .ancestors(start)
                    .filter(|a| self.tree.get(*a).is_some_and(|c| c.kind.is_container())),
            )
            .collect();

        let is_enter = event.key == "Enter";
        let data = EventData::Key(event);
        for id in chain {
            if self.emit(ControlEvent::new(id, EventKind::Key, data.clone())) {
                trace!(?id, "key consumed");
                return true;
            }
        }

        is_enter && self.default_action()
    }

    /// Raise `DefaultAction` on the default control of the nearest
    /// container that has a usable one.
    fn default_action(&self) -> bool {
        let start = self.current_container.unwrap_or(self.root);
        let target = std::iter::once(start)
            .chain(self.tree.ancestors(start))
            .filter_map(|c| self.tree.get(c)?.as_container()?.default_control())
            .find(|d| self.tree.get(*d).is_some_and(|c| c.state().is_live() && c.is_visible()));

        let Some(target) = target else {
            return false;
        };
        trace!(?target, "default action");
        self.emit(ControlEvent::new(target, EventKind::DefaultAction, EventData::None));
        true
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DisplayConfig;
    use crate::host::HeadlessHost;
    use crate::types::ControlKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Root > form(container) > [name, email, submit], all tab stops.
    fn setup() -> (Display<HeadlessHost>, ControlId, Vec<ControlId>) {
        let mut display = Display::new(HeadlessHost::new(), DisplayConfig::default());
        let root = display.root();
        let form = display.create_in(root, ControlKind::Container, Some("form")).unwrap();
        let fields = ["name", "email", "submit"]
            .iter()
            .map(|name| {
                let id = display.create_in(form, ControlKind::Control, Some(name)).unwrap();
                display.set_can_focus(id, true).unwrap();
                id
            })
            .collect();
        (display, form, fields)
    }

    fn key_log(display: &mut Display<HeadlessHost>, ids: &[ControlId], consume: Option<ControlId>) -> Rc<RefCell<Vec<ControlId>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        for id in ids {
            let log = log.clone();
            let id = *id;
            display
                .on(id, EventKind::Key, move |_| {
                    log.borrow_mut().push(id);
                    consume == Some(id)
                })
                .unwrap();
        }
        log
    }

    #[test]
    fn test_modifiers() {
        assert!(Modifiers::ctrl().ctrl);
        assert!(Modifiers::shift().shift);
        assert_eq!(Modifiers::none(), Modifiers::default());
    }

    #[test]
    fn test_tab_moves_focus() {
        let (mut display, _, fields) = setup();

        assert!(display.dispatch_key(KeyboardEvent::new("Tab")));
        assert_eq!(display.current_control(), Some(fields[0]));
        display.dispatch_key(KeyboardEvent::new("Tab"));
        assert_eq!(display.current_control(), Some(fields[1]));

        display.dispatch_key(KeyboardEvent::with_modifiers("Tab", Modifiers::shift()));
        assert_eq!(display.current_control(), Some(fields[0]));
    }

    #[test]
    fn test_tab_is_handled_with_nothing_to_focus() {
        let mut display = Display::new(HeadlessHost::new(), DisplayConfig::default());
        assert!(display.dispatch_key(KeyboardEvent::new("Tab")));
        assert_eq!(display.current_control(), None);
    }

    #[test]
    fn test_ctrl_tab_is_a_plain_key() {
        let (mut display, form, fields) = setup();
        display.set_current_control(fields[0]);
        let log = key_log(&mut display, &[fields[0], form], None);

        display.dispatch_key(KeyboardEvent::with_modifiers("Tab", Modifiers::ctrl()));
        assert_eq!(display.current_control(), Some(fields[0]));
        assert_eq!(*log.borrow(), vec![fields[0], form]);
    }

    #[test]
    fn test_key_bubbles_until_consumed() {
        let (mut display, form, fields) = setup();
        let root = display.root();
        display.set_current_control(fields[1]);
        let log = key_log(&mut display, &[fields[1], form, root], Some(form));

        assert!(display.dispatch_key(KeyboardEvent::new("x")));
        assert_eq!(*log.borrow(), vec![fields[1], form]);
    }

    #[test]
    fn test_release_is_ignored() {
        let (mut display, _, fields) = setup();
        display.set_current_control(fields[0]);
        let log = key_log(&mut display, &[fields[0]], None);

        let mut release = KeyboardEvent::new("a");
        release.state = KeyState::Release;
        assert!(!display.dispatch_key(release));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_enter_runs_default_action() {
        let (mut display, form, fields) = setup();
        display.set_default_control(form, Some(fields[2])).unwrap();
        display.set_current_control(fields[0]);

        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        display
            .on(fields[2], EventKind::DefaultAction, move |_| {
                *h.borrow_mut() += 1;
                true
            })
            .unwrap();

        assert!(display.dispatch_key(KeyboardEvent::new("Enter")));
        assert_eq!(*hits.borrow(), 1);

        // A consumed Enter never reaches the default control
        let _log = key_log(&mut display, &[fields[0]], Some(fields[0]));
        display.dispatch_key(KeyboardEvent::new("Enter"));
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn test_enter_without_default_is_unhandled() {
        let (mut display, _, fields) = setup();
        display.set_current_control(fields[0]);
        assert!(!display.dispatch_key(KeyboardEvent::new("Enter")));
    }
}
