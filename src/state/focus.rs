//! Focus Module - Tab order and focus transitions
//!
//! Every container keeps a tab cache: its tab-reachable children sorted by
//! `tab_index`. The cache is only marked dirty when something relevant
//! changes (attach, detach, interactivity, tab index) and is rebuilt
//! lazily on the next query.
//!
//! Focus always lands on a leaf. Focusing a container delegates to its
//! [`valid_focus`](Display::valid_focus) unless it is empty and allowed to
//! take focus itself. Each container on the path to the focused leaf
//! remembers which child leads there.
//!
//! # API
//!
//! - `fetch_focus_children(c, tab_only)` - Focusable children, unordered
//! - `calculate_tabs(c)` - Rebuild the tab cache
//! - `next_tab(c, backward)` - Next stop, honoring `tabs_loop`
//! - `valid_focus(c)` - Where focus goes when `c` is focused
//! - `set_current_control(id)` - Focus transition
//! - `focus_next()` / `focus_previous()` - Tab navigation with escalation
//!
//! # Example
//!
//! ```ignore
//! display.set_tab_index(ok, 0)?;
//! display.set_tab_index(cancel, 1)?;
//! display.set_current_control(dialog); // focuses `ok`
//! display.focus_next();                // focuses `cancel`
//! ```

use tracing::{debug, trace};

use crate::display::Display;
use crate::engine::ContainerState;
use crate::error::{ControlError, Result};
use crate::host::Host;
use crate::state::events::{ControlEvent, EventData, EventKind};
use crate::types::{ControlFlags, ControlId, ControlState};

impl<H: Host> Display<H> {
    fn container_state(&self, container: ControlId) -> Result<&ContainerState> {
        self.tree
            .control(container)?
            .container
            .as_ref()
            .ok_or(ControlError::NotAContainer(container))
    }

    fn container_state_mut(&mut self, container: ControlId) -> Result<&mut ContainerState> {
        self.tree
            .control_mut(container)?
            .container
            .as_mut()
            .ok_or(ControlError::NotAContainer(container))
    }

    // =========================================================================
    // Focusable queries
    // =========================================================================

    /// Interactive children of `container`, in child order.
    ///
    /// With `tab_only`, children with a negative tab index are skipped. A
    /// nested container counts only if it may be focused while empty or has
    /// a focusable descendant of its own. Returns `None` when nothing
    /// qualifies.
    pub fn fetch_focus_children(&self, container: ControlId, tab_only: bool) -> Option<Vec<ControlId>> {
        let found: Vec<ControlId> = self
            .tree
            .children(container)
            .iter()
            .copied()
            .filter(|child| self.is_focus_candidate(*child, tab_only))
            .collect();
        (!found.is_empty()).then_some(found)
    }

    fn is_focus_candidate(&self, id: ControlId, tab_only: bool) -> bool {
        let Some(control) = self.tree.get(id) else {
            return false;
        };
        if !control.is_interactive() || (tab_only && control.tab_index < 0) {
            return false;
        }
        if control.kind.is_container() && !control.focus_when_empty() {
            return self.fetch_focus_children(id, tab_only).is_some();
        }
        true
    }

    /// Rebuild the tab cache of `container`.
    ///
    /// The tab-reachable children are stably sorted by tab index, then each
    /// one's tab index is rewritten to its position in the order.
    pub fn calculate_tabs(&mut self, container: ControlId) -> Option<Vec<ControlId>> {
        let mut order = self.fetch_focus_children(container, true);
        if let Some(items) = order.as_mut() {
            items.sort_by_key(|id| self.tree.get(*id).map_or(0, |c| c.tab_index));
            for (position, id) in items.iter().enumerate() {
                if let Some(control) = self.tree.get_mut(*id) {
                    control.tab_index = position as i32;
                }
            }
        }

        if let Ok(state) = self.container_state_mut(container) {
            state.tab_cache = order.clone();
            state.tabs_dirty = false;
        }
        trace!(?container, stops = order.as_ref().map_or(0, Vec::len), "tab cache rebuilt");
        order
    }

    /// Tab order of `container`, rebuilding the cache if it is dirty.
    pub fn tab_order(&mut self, container: ControlId) -> Option<Vec<ControlId>> {
        let state = self.container_state(container).ok()?;
        if state.tabs_dirty {
            return self.calculate_tabs(container);
        }
        state.tab_cache.clone()
    }

    /// The stop after (or before) the container's focused child.
    ///
    /// Stepping past either end wraps when `tabs_loop` is set and clamps to
    /// that end otherwise. Returns `None` when nothing in the container is
    /// tab-reachable.
    pub fn next_tab(&mut self, container: ControlId, backward: bool) -> Option<ControlId> {
        let order = self.tab_order(container)?;
        let state = self.container_state(container).ok()?;

        let len = order.len() as isize;
        let current = state
            .focus
            .and_then(|focus| order.iter().position(|id| *id == focus))
            .map_or(-1, |p| p as isize);

        let mut next = if backward { current - 1 } else { current + 1 };
        if next >= len {
            next = if state.tabs_loop { 0 } else { len - 1 };
        } else if next < 0 {
            next = if state.tabs_loop { len - 1 } else { 0 };
        }
        order.get(next as usize).copied()
    }

    /// Where focus goes when `container` itself is focused: its remembered
    /// child if still focusable, else its first tab stop, else the container
    /// when it may be focused while empty.
    pub fn valid_focus(&mut self, container: ControlId) -> Option<ControlId> {
        let state = self.container_state(container).ok()?;
        if let Some(focus) = state.focus {
            let focusable = self
                .fetch_focus_children(container, false)
                .is_some_and(|children| children.contains(&focus));
            if focusable {
                return Some(focus);
            }
        }
        if let Some(next) = self.next_tab(container, false) {
            return Some(next);
        }

        let control = self.tree.get(container)?;
        (control.focus_when_empty() && control.is_interactive()).then_some(container)
    }

    // =========================================================================
    // Focus transitions
    // =========================================================================

    /// Move focus to `target`.
    ///
    /// Non-interactive targets and the current control are ignored; native
    /// focus is re-asserted on the current control instead. A container
    /// target hands focus to its [`valid_focus`](Self::valid_focus).
    /// Returns whether focus moved.
    pub fn set_current_control(&mut self, target: ControlId) -> bool {
        let Some((interactive, is_container)) = self
            .tree
            .get(target)
            .map(|c| (c.is_interactive(), c.kind.is_container()))
        else {
            self.refresh_native_focus();
            return false;
        };
        if !interactive || self.current_control == Some(target) {
            self.refresh_native_focus();
            return false;
        }

        if is_container {
            match self.valid_focus(target) {
                Some(leaf) if leaf == target => {}
                Some(leaf) => return self.set_current_control(leaf),
                None => {
                    self.refresh_native_focus();
                    return false;
                }
            }
        }

        let previous = self.current_control.take();
        if let Some(previous) = previous {
            self.emit(ControlEvent::new(
                previous,
                EventKind::FocusOut,
                EventData::Focus { related: Some(target) },
            ));
            self.release_focus_state(previous);
        }

        self.current_control = Some(target);
        self.current_container = self.tree.nearest_container(target);
        self.write_state(target, ControlState::Focus);
        self.host.focus_native(target);
        self.emit(ControlEvent::new(
            target,
            EventKind::FocusIn,
            EventData::Focus { related: previous },
        ));

        // Every container on the way up remembers the path
        let mut child = target;
        let ancestors: Vec<ControlId> = self.tree.ancestors(target).collect();
        for ancestor in ancestors {
            if let Ok(state) = self.container_state_mut(ancestor) {
                state.focus = Some(child);
            }
            child = ancestor;
        }

        debug!(?previous, ?target, "focus moved");
        true
    }

    fn refresh_native_focus(&mut self) {
        if let Some(current) = self.current_control {
            self.host.focus_native(current);
        }
    }

    /// Remove focus from the focused control, if any.
    pub fn blur(&mut self) {
        if let Some(current) = self.current_control {
            self.drop_focus_within(current);
        }
    }

    /// Clear focus if it rests on `id` or inside its subtree.
    pub(crate) fn drop_focus_within(&mut self, id: ControlId) {
        let Some(current) = self.current_control else {
            return;
        };
        if current != id && !self.tree.is_ancestor(id, current) {
            return;
        }

        self.current_control = None;
        self.current_container = None;
        self.emit(ControlEvent::new(
            current,
            EventKind::FocusOut,
            EventData::Focus { related: None },
        ));
        self.release_focus_state(current);
    }

    /// Leave the `Focus` state: back to `Hover` while the pointer rests on
    /// the control, `Alive` otherwise.
    fn release_focus_state(&mut self, id: ControlId) {
        if !self.tree.get(id).is_some_and(|c| c.state == ControlState::Focus) {
            return;
        }
        self.write_state(id, ControlState::Alive);
        if self.hovered_control() == Some(id) {
            self.write_state(id, ControlState::Hover);
        }
    }

    /// Tab forward from the focused control.
    pub fn focus_next(&mut self) -> bool {
        self.step_tab(false)
    }

    /// Tab backward from the focused control.
    pub fn focus_previous(&mut self) -> bool {
        self.step_tab(true)
    }

    /// Ask the current container for its next stop, escalating one
    /// container up whenever a container has none.
    fn step_tab(&mut self, backward: bool) -> bool {
        let mut container = self.current_container.unwrap_or(self.root);
        loop {
            if let Some(next) = self.next_tab(container, backward) {
                return self.set_current_control(next);
            }
            match self.tree.nearest_container(container) {
                Some(up) => container = up,
                None => return false,
            }
        }
    }

    // =========================================================================
    // Properties
    // =========================================================================

    pub fn set_tabs_loop(&mut self, container: ControlId, tabs_loop: bool) -> Result<()> {
        self.container_state_mut(container)?.tabs_loop = tabs_loop;
        Ok(())
    }

    /// Set the remembered child of `container`. Ignored unless `child` is a
    /// direct child.
    pub fn set_container_focus(&mut self, container: ControlId, child: Option<ControlId>) -> Result<bool> {
        self.container_state(container)?;
        if child.is_some_and(|c| self.tree.owner(c) != Some(container)) {
            return Ok(false);
        }
        self.container_state_mut(container)?.focus = child;
        Ok(true)
    }

    /// Set the control that takes the container's default action on Enter.
    /// Ignored unless `control` lives inside the container.
    pub fn set_default_control(&mut self, container: ControlId, control: Option<ControlId>) -> Result<bool> {
        self.container_state(container)?;
        if control.is_some_and(|c| !self.tree.is_ancestor(container, c)) {
            return Ok(false);
        }
        self.container_state_mut(container)?.default_control = control;
        Ok(true)
    }

    pub fn set_can_focus(&mut self, id: ControlId, can_focus: bool) -> Result<()> {
        let control = self.tree.control_mut(id)?;
        control.flags.set(ControlFlags::CAN_FOCUS, can_focus);
        self.refresh_interactive(id);
        if !can_focus {
            self.drop_focus_within(id);
        }
        Ok(())
    }

    /// Set the tab index. Negative values take the control out of the tab
    /// order while keeping it focusable by pointer.
    pub fn set_tab_index(&mut self, id: ControlId, tab_index: i32) -> Result<()> {
        let control = self.tree.control_mut(id)?;
        if control.tab_index == tab_index {
            return Ok(());
        }
        control.tab_index = tab_index;
        if control.is_interactive() {
            self.mark_tabs_dirty(id);
        }
        Ok(())
    }

    /// Allow `container` to take focus itself while it has no focusable
    /// children.
    pub fn set_focus_when_empty(&mut self, container: ControlId, allow: bool) -> Result<()> {
        self.container_state(container)?;
        self.tree
            .control_mut(container)?
            .flags
            .set(ControlFlags::FOCUS_EMPTY, allow);
        self.mark_tabs_dirty(container);
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::config::DisplayConfig;
    use crate::display::Display;
    use crate::error::ControlError;
    use crate::host::{HeadlessHost, Host};
    use crate::state::events::{EventData, EventKind};
    use crate::types::{ControlId, ControlKind, ControlState};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Root > group(container, no loop) > [a, b, c] with tab indices.
    fn setup(tab_indices: [i32; 3]) -> (Display<HeadlessHost>, ControlId, Vec<ControlId>) {
        let mut display = Display::new(HeadlessHost::new(), DisplayConfig::default());
        let root = display.root();
        let group = display.create_in(root, ControlKind::Container, Some("group")).unwrap();
        display.set_tabs_loop(group, false).unwrap();

        let items = ["a", "b", "c"]
            .iter()
            .zip(tab_indices)
            .map(|(name, tab_index)| {
                let id = display.create_in(group, ControlKind::Control, Some(name)).unwrap();
                display.set_can_focus(id, true).unwrap();
                display.set_tab_index(id, tab_index).unwrap();
                id
            })
            .collect();
        (display, group, items)
    }

    #[test]
    fn test_calculate_tabs_orders_by_tab_index() {
        let (mut display, group, items) = setup([2, 0, 1]);
        let order = display.calculate_tabs(group).unwrap();
        assert_eq!(order, vec![items[1], items[2], items[0]]);
        assert!(display.control(group).unwrap().as_container().unwrap().is_tab_cache_valid());

        // From no focus, the first stop
        assert_eq!(display.next_tab(group, false), Some(items[1]));
    }

    #[test]
    fn test_calculate_tabs_renumbers() {
        let (mut display, group, items) = setup([5, 0, 5]);
        let order = display.calculate_tabs(group).unwrap();
        // Stable: a before c on the tie
        assert_eq!(order, vec![items[1], items[0], items[2]]);

        let indices: Vec<i32> = items.iter().map(|i| display.control(*i).unwrap().tab_index()).collect();
        assert_eq!(indices, vec![1, 0, 2]);
    }

    #[test]
    fn test_fetch_focus_children() {
        let (mut display, group, items) = setup([0, -1, 1]);
        assert_eq!(display.fetch_focus_children(group, false).unwrap().len(), 3);
        assert_eq!(display.fetch_focus_children(group, true), Some(vec![items[0], items[2]]));

        for item in &items {
            display.set_can_focus(*item, false).unwrap();
        }
        assert_eq!(display.fetch_focus_children(group, false), None);
    }

    #[test]
    fn test_nested_container_needs_focusables() {
        let (mut display, group, items) = setup([0, 1, 2]);
        let nested = display.create_in(group, ControlKind::Container, Some("nested")).unwrap();
        assert!(!display.fetch_focus_children(group, false).unwrap().contains(&nested));

        display.set_focus_when_empty(nested, true).unwrap();
        assert!(display.fetch_focus_children(group, false).unwrap().contains(&nested));

        display.set_focus_when_empty(nested, false).unwrap();
        let leaf = display.create_in(nested, ControlKind::Control, Some("leaf")).unwrap();
        display.set_can_focus(leaf, true).unwrap();
        let children = display.fetch_focus_children(group, false).unwrap();
        assert_eq!(children, vec![items[0], items[1], items[2], nested]);
    }

    #[test]
    fn test_tab_clamps_without_loop() {
        let (mut display, group, items) = setup([0, 1, 2]);
        display.set_container_focus(group, Some(items[2])).unwrap();

        for _ in 0..3 {
            assert_eq!(display.next_tab(group, false), Some(items[2]));
        }
        // Backward from nothing clamps to the first stop
        display.set_container_focus(group, None).unwrap();
        assert_eq!(display.next_tab(group, true), Some(items[0]));
    }

    #[test]
    fn test_tab_wraps_with_loop() {
        let (mut display, group, items) = setup([0, 1, 2]);
        display.set_tabs_loop(group, true).unwrap();
        assert!(display.set_current_control(items[1]));

        for _ in 0..items.len() {
            let next = display.next_tab(group, false).unwrap();
            display.set_current_control(next);
        }
        assert_eq!(display.current_control(), Some(items[1]));

        display.set_container_focus(group, None).unwrap();
        assert_eq!(display.next_tab(group, true), Some(items[2]));
    }

    #[test]
    fn test_tab_cache_invalidated_by_attach() {
        let (mut display, group, items) = setup([0, 1, 2]);
        assert_eq!(display.tab_order(group).unwrap().len(), 3);

        let late = display.create(ControlKind::Control, Some("late")).unwrap();
        display.set_can_focus(late, true).unwrap();
        display.attach(group, late).unwrap();
        assert!(!display.control(group).unwrap().as_container().unwrap().is_tab_cache_valid());
        assert_eq!(display.tab_order(group).unwrap().len(), 4);

        display.detach(items[0]).unwrap();
        assert_eq!(display.tab_order(group).unwrap().len(), 3);
    }

    #[test]
    fn test_set_current_control() {
        let (mut display, group, items) = setup([0, 1, 2]);
        let log = Rc::new(RefCell::new(Vec::new()));
        for item in &items {
            for kind in [EventKind::FocusIn, EventKind::FocusOut] {
                let log = log.clone();
                display
                    .on(*item, kind, move |event| {
                        if let EventData::Focus { related } = event.data {
                            log.borrow_mut().push((event.target, event.kind, related));
                        }
                        false
                    })
                    .unwrap();
            }
        }

        assert!(display.set_current_control(items[0]));
        assert!(display.set_current_control(items[2]));
        assert_eq!(
            *log.borrow(),
            vec![
                (items[0], EventKind::FocusIn, None),
                (items[0], EventKind::FocusOut, Some(items[2])),
                (items[2], EventKind::FocusIn, Some(items[0])),
            ]
        );

        assert_eq!(display.current_control(), Some(items[2]));
        assert_eq!(display.current_container(), Some(group));
        assert_eq!(display.control(items[0]).unwrap().state(), ControlState::Alive);
        assert_eq!(display.control(items[2]).unwrap().state(), ControlState::Focus);
        assert_eq!(display.host().focused(), Some(items[2]));

        // Path pointers
        let root = display.root();
        assert_eq!(display.control(group).unwrap().as_container().unwrap().focus(), Some(items[2]));
        assert_eq!(display.control(root).unwrap().as_container().unwrap().focus(), Some(group));
    }

    #[test]
    fn test_invalid_focus_is_a_refresh() {
        let (mut display, _, items) = setup([0, 1, 2]);
        display.set_current_control(items[0]);
        display.host_mut().focus_native(items[1]);

        display.set_can_focus(items[2], false).unwrap();
        assert!(!display.set_current_control(items[2]));
        assert!(!display.set_current_control(items[0]));
        assert_eq!(display.current_control(), Some(items[0]));
        // Native focus re-asserted
        assert_eq!(display.host().focused(), Some(items[0]));
    }

    #[test]
    fn test_focusing_container_lands_on_leaf() {
        let (mut display, group, items) = setup([2, 0, 1]);
        assert!(display.set_current_control(group));
        assert_eq!(display.current_control(), Some(items[1]));

        // Remembered child wins next time
        display.set_current_control(items[0]);
        display.blur();
        assert_eq!(display.current_control(), None);
        display.set_current_control(group);
        assert_eq!(display.current_control(), Some(items[0]));
    }

    #[test]
    fn test_empty_container_focus() {
        let mut display = Display::new(HeadlessHost::new(), DisplayConfig::default());
        let root = display.root();
        let empty = display.create_in(root, ControlKind::Container, Some("empty")).unwrap();

        assert!(!display.set_current_control(empty));
        display.set_focus_when_empty(empty, true).unwrap();
        assert!(display.set_current_control(empty));
        assert_eq!(display.current_control(), Some(empty));
    }

    #[test]
    fn test_focus_next_escalates() {
        let mut display = Display::new(HeadlessHost::new(), DisplayConfig::default());
        let root = display.root();
        let inner = display.create_in(root, ControlKind::Container, Some("inner")).unwrap();
        let hidden = display.create_in(inner, ControlKind::Control, Some("pointer-only")).unwrap();
        display.set_can_focus(hidden, true).unwrap();
        display.set_tab_index(hidden, -1).unwrap();
        let outer = display.create_in(root, ControlKind::Control, Some("outer")).unwrap();
        display.set_can_focus(outer, true).unwrap();

        display.set_current_control(hidden);
        assert_eq!(display.current_container(), Some(inner));

        assert!(display.focus_next());
        assert_eq!(display.current_control(), Some(outer));
    }

    #[test]
    fn test_detach_drops_focus() {
        let (mut display, group, items) = setup([0, 1, 2]);
        display.set_current_control(items[1]);

        display.detach(items[1]).unwrap();
        assert_eq!(display.current_control(), None);
        assert_eq!(display.control(items[1]).unwrap().state(), ControlState::Sleep);
        assert_eq!(display.control(group).unwrap().as_container().unwrap().focus(), None);
    }

    #[test]
    fn test_container_property_guards() {
        let (mut display, group, items) = setup([0, 1, 2]);
        let root = display.root();

        // Not a direct child
        assert_eq!(display.set_container_focus(root, Some(items[0])), Ok(false));
        assert_eq!(display.set_container_focus(group, Some(items[0])), Ok(true));

        // Descendants are fine for the default control
        assert_eq!(display.set_default_control(root, Some(items[0])), Ok(true));
        assert_eq!(display.set_default_control(group, Some(root)), Ok(false));

        assert_eq!(
            display.set_tabs_loop(items[0], true),
            Err(ControlError::NotAContainer(items[0]))
        );
    }
}
