//! Display - the explicit context that owns a control tree.
//!
//! A `Display` holds everything that used to be process-global: the arena,
//! the root panel, the render queue, handlers, focus and pointer state, and
//! the host the boxes live in. Independent trees are independent values.
//!
//! # API
//!
//! - `Display::new(host, config)` - Build the root and bind it to the host
//! - `create` / `create_in` / `attach` / `detach` / `destroy` - Lifecycle
//! - `resize(w, h)` - Viewport change, breakpoint tracking
//! - `on` / `off` - Event subscriptions
//!
//! Geometry, layout, scheduling, focus and input operations are further
//! `impl Display` blocks in their own modules.
//!
//! # Example
//!
//! ```ignore
//! use spark_controls::{ControlKind, Display, DisplayConfig, HeadlessHost};
//!
//! let mut display = Display::new(HeadlessHost::new(), DisplayConfig::default());
//! let root = display.root();
//! let ok = display.create_in(root, ControlKind::Control, Some("ok"))?;
//! display.set_width(ok, 80.0)?;
//! while display.frame_pending() {
//!     display.frame();
//! }
//! ```

use taffy::geometry::Size;
use tracing::{debug, warn};

use crate::config::DisplayConfig;
use crate::engine::{Control, ControlTree};
use crate::error::{ControlError, Result};
use crate::host::Host;
use crate::pipeline::scheduler::RenderQueue;
use crate::state::events::{ControlEvent, EventData, EventKind, HandlerId, HandlerRegistry};
use crate::state::mouse::PointerState;
use crate::types::{ControlFlags, ControlId, ControlKind, ControlState, Dirty};

/// Name given to the root control.
pub const DISPLAY_NAME: &str = "display";

// =============================================================================
// Display
// =============================================================================

/// The root of a control tree and the context every operation runs in.
pub struct Display<H: Host> {
    pub(crate) tree: ControlTree,
    pub(crate) host: H,
    pub(crate) config: DisplayConfig,
    pub(crate) queue: RenderQueue,
    pub(crate) handlers: HandlerRegistry,
    pub(crate) pointer: PointerState,
    pub(crate) root: ControlId,
    pub(crate) current_control: Option<ControlId>,
    pub(crate) current_container: Option<ControlId>,
    pub(crate) viewport_name: String,
    pub(crate) viewport: Size<f32>,
}

impl<H: Host> Display<H> {
    /// Build the root panel, bind it to the host document and schedule the
    /// first frame.
    pub fn new(mut host: H, config: DisplayConfig) -> Self {
        let (mut tree, root) = ControlTree::with_display(DISPLAY_NAME);
        let width = config.width.max(0.0);
        let height = config.height.max(0.0);

        if let Some(control) = tree.get_mut(root) {
            control.state = ControlState::Alive;
            control.geometry.bounds.width = width;
            control.geometry.bounds.height = height;
            if let Some(container) = control.container.as_mut() {
                container.tabs_loop = config.tabs_loop;
            }
        }

        host.create_box(root);
        host.bind_root(root);

        let viewport_name = config.breakpoint_for(width).to_string();
        debug!(width, height, breakpoint = %viewport_name, "display created");

        let mut display = Self {
            tree,
            host,
            config,
            queue: RenderQueue::new(),
            handlers: HandlerRegistry::new(),
            pointer: PointerState::default(),
            root,
            current_control: None,
            current_container: None,
            viewport_name,
            viewport: Size { width, height },
        };
        display.refresh_interactive(root);
        display.write_bounds_styles(root);
        display.invalidate(root);
        display
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn root(&self) -> ControlId {
        self.root
    }

    pub fn tree(&self) -> &ControlTree {
        &self.tree
    }

    pub fn get(&self, id: ControlId) -> Option<&Control> {
        self.tree.get(id)
    }

    pub fn control(&self, id: ControlId) -> Result<&Control> {
        self.tree.control(id)
    }

    pub fn contains(&self, id: ControlId) -> bool {
        self.tree.contains(id)
    }

    /// Child of `owner` named `name`.
    pub fn child(&self, owner: ControlId, name: &str) -> Option<ControlId> {
        self.tree.child_by_name(owner, name)
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    /// Focused control.
    pub fn current_control(&self) -> Option<ControlId> {
        self.current_control
    }

    /// Container of the focused control.
    pub fn current_container(&self) -> Option<ControlId> {
        self.current_container
    }

    /// Active breakpoint name.
    pub fn viewport_name(&self) -> &str {
        &self.viewport_name
    }

    pub fn viewport_size(&self) -> Size<f32> {
        self.viewport
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Create a detached control. It sleeps until attached into the live tree.
    pub fn create(&mut self, kind: ControlKind, name: Option<&str>) -> Result<ControlId> {
        let id = self.tree.allocate(kind, name)?;
        self.host.create_box(id);
        self.invalidate(id);
        Ok(id)
    }

    /// Create a control and attach it under `owner`.
    pub fn create_in(&mut self, owner: ControlId, kind: ControlKind, name: Option<&str>) -> Result<ControlId> {
        self.tree.control(owner)?;
        let id = self.create(kind, name)?;
        if let Err(err) = self.attach(owner, id) {
            self.discard(id);
            return Err(err);
        }
        Ok(id)
    }

    /// Attach `child` as the last child of `owner`, moving it from any
    /// previous owner.
    ///
    /// Attaching into the live tree wakes the subtree; the child's auto
    /// rules resolve against the new owner right away.
    pub fn attach(&mut self, owner: ControlId, child: ControlId) -> Result<()> {
        if child == self.root {
            return Err(ControlError::RootDetach);
        }
        let previous = self.tree.control(child)?.owner;
        self.tree.check_link(owner, child)?;
        if previous == Some(owner) {
            return Ok(());
        }

        if let Some(previous) = previous {
            self.release_from_owner(child, previous);
        }
        self.tree.link(owner, child)?;
        self.host.attach_box(owner, child);
        if let Some(previous) = previous {
            self.relayout_owner(previous);
        }

        let live = self.tree.get(owner).is_some_and(|c| c.state.is_live());
        let state = if live { ControlState::Alive } else { ControlState::Sleep };
        self.set_subtree_state(child, state);
        self.mark_tabs_dirty(child);

        let owner_inner = self.tree.control(owner)?.inner_size();
        self.tree.control_mut(child)?.geometry.owner_size = owner_inner;
        if let Err(err) = self.auto_adjust(child) {
            warn!(?child, %err, "auto rule failed on attach");
        }
        if live {
            self.layout_subtree(child);
        }
        self.notify_owner(child);
        self.invalidate(child);
        Ok(())
    }

    /// Detach `child` from its owner. The subtree goes back to sleep.
    pub fn detach(&mut self, child: ControlId) -> Result<()> {
        if child == self.root {
            return Err(ControlError::RootDetach);
        }
        let Some(owner) = self.tree.control(child)?.owner else {
            return Ok(());
        };

        self.release_from_owner(child, owner);
        self.tree.unlink(child);
        self.host.detach_box(child);
        self.set_subtree_state(child, ControlState::Sleep);
        self.relayout_owner(owner);
        Ok(())
    }

    /// Destroy a control and its subtree, children first.
    pub fn destroy(&mut self, id: ControlId) -> Result<()> {
        if id == self.root {
            return Err(ControlError::RootDetach);
        }
        self.detach(id)?;

        let mut doomed = vec![id];
        doomed.extend(self.tree.descendants(id));
        debug!(?id, count = doomed.len(), "destroying subtree");

        for dead in doomed.into_iter().rev() {
            self.discard(dead);
        }
        Ok(())
    }

    /// Drop a detached control and all state that refers to it.
    fn discard(&mut self, id: ControlId) {
        if let Some(control) = self.tree.get_mut(id) {
            control.state = ControlState::Dying;
            control.flags.remove(ControlFlags::INTERACTIVE);
        }
        self.queue.forget(id);
        self.handlers.remove_target(id);
        self.pointer.forget(id);
        self.host.remove_box(id);
        self.tree.unlink(id);
        self.tree.remove(id);
    }

    /// Clear everything the old owner chain remembers about `child`.
    fn release_from_owner(&mut self, child: ControlId, owner: ControlId) {
        self.drop_focus_within(child);
        self.pointer.forget_within(&self.tree, child);
        self.mark_tabs_dirty(child);

        let name = self.tree.get(child).map(|c| c.name.clone()).unwrap_or_default();
        if let Some(panel) = self.tree.get_mut(owner).and_then(|c| c.panel.as_mut()) {
            panel.sequence.retain(|n| *n != name);
        }

        let ancestors: Vec<ControlId> = self.tree.ancestors(child).collect();
        for ancestor in ancestors {
            let default = self
                .tree
                .get(ancestor)
                .and_then(|c| c.container.as_ref())
                .and_then(|c| c.default_control);
            let clear_default =
                default.is_some_and(|d| d == child || self.tree.is_ancestor(child, d));

            if let Some(container) = self.tree.get_mut(ancestor).and_then(|c| c.container.as_mut()) {
                if container.focus == Some(child) {
                    container.focus = None;
                }
                if clear_default {
                    container.default_control = None;
                }
            }
        }
    }

    /// Lay out every panel of a freshly woken subtree, deepest first, and
    /// refit the content-sized controls on the way up.
    fn layout_subtree(&mut self, id: ControlId) {
        let mut ids = vec![id];
        ids.extend(self.tree.descendants(id));
        for id in ids.into_iter().rev() {
            let Some(control) = self.tree.get(id) else {
                continue;
            };
            let is_panel = control.panel.is_some();
            let content_sized = control.geometry.auto.is_content_sized();
            if is_panel {
                self.calc_layout(id);
            }
            if content_sized {
                if let Err(err) = self.auto_adjust(id) {
                    warn!(?id, %err, "auto rule failed while waking subtree");
                }
            }
        }
    }

    /// Re-run layout and content sizing of an owner whose children changed.
    pub(crate) fn relayout_owner(&mut self, owner: ControlId) {
        let Some(control) = self.tree.get(owner) else {
            return;
        };
        let content_sized = control.geometry.auto.is_content_sized();
        if control.panel.is_some() {
            self.calc_layout(owner);
        }
        if content_sized {
            if let Err(err) = self.auto_adjust(owner) {
                warn!(?owner, %err, "auto rule failed after child change");
            }
        }
    }

    // =========================================================================
    // State
    // =========================================================================

    /// Request a state change. Returns whether the state changed.
    ///
    /// `Focus` goes through [`set_current_control`](Self::set_current_control)
    /// and `Dying` through [`destroy`](Self::destroy), so the display's own
    /// bookkeeping stays consistent.
    pub fn set_state(&mut self, id: ControlId, state: ControlState) -> Result<bool> {
        let current = self.tree.control(id)?.state;
        match state {
            ControlState::Focus => Ok(self.set_current_control(id)),
            ControlState::Dying => self.destroy(id).map(|_| true),
            _ if !current.can_transition(state) => Ok(false),
            _ => {
                if current == ControlState::Focus && self.current_control == Some(id) {
                    self.drop_focus_within(id);
                }
                self.write_state(id, state);
                Ok(true)
            }
        }
    }

    /// Store a state, recompose classes and re-derive interactivity.
    pub(crate) fn write_state(&mut self, id: ControlId, state: ControlState) {
        let Some(control) = self.tree.get_mut(id) else {
            return;
        };
        if control.state == state || control.state == ControlState::Dying {
            return;
        }
        control.state = state;
        self.mark_dirty(id, Dirty::CLASSES);
        self.refresh_interactive(id);
    }

    /// Wake (`Alive`) or put to sleep (`Sleep`) a whole subtree.
    fn set_subtree_state(&mut self, id: ControlId, state: ControlState) {
        let mut ids = vec![id];
        ids.extend(self.tree.descendants(id));
        for id in ids {
            let Some(current) = self.tree.get(id).map(Control::state) else {
                continue;
            };
            let change = match state {
                ControlState::Alive => current == ControlState::Sleep,
                ControlState::Sleep => current.is_live(),
                _ => false,
            };
            if change {
                self.write_state(id, state);
            }
        }
    }

    /// Re-derive the interactive flag; a change dirties the tab caches above.
    pub(crate) fn refresh_interactive(&mut self, id: ControlId) {
        let Some(control) = self.tree.get_mut(id) else {
            return;
        };
        let interactive = control.compute_interactive();
        if interactive == control.is_interactive() {
            return;
        }
        control.flags.set(ControlFlags::INTERACTIVE, interactive);
        self.mark_tabs_dirty(id);
    }

    /// Invalidate the tab cache of every container above `id`.
    pub(crate) fn mark_tabs_dirty(&mut self, id: ControlId) {
        let ancestors: Vec<ControlId> = self.tree.ancestors(id).collect();
        for ancestor in ancestors {
            if let Some(container) = self.tree.get_mut(ancestor).and_then(|c| c.container.as_mut()) {
                container.tabs_dirty = true;
            }
        }
    }

    // =========================================================================
    // Viewport
    // =========================================================================

    /// Resize the viewport. The root takes the new size; a breakpoint change
    /// re-resolves every auto rule and relays out every panel.
    pub fn resize(&mut self, width: f32, height: f32) {
        if !width.is_finite() || !height.is_finite() {
            return;
        }
        let width = width.max(0.0);
        let height = height.max(0.0);
        self.viewport = Size { width, height };

        let root = self.root;
        if let Some(mut bounds) = self.tree.get(root).map(Control::bounds) {
            bounds.width = width;
            bounds.height = height;
            self.commit_bounds(root, bounds);
        }

        let name = self.config.breakpoint_for(width).to_string();
        if name == self.viewport_name {
            return;
        }
        debug!(from = %self.viewport_name, to = %name, "breakpoint changed");
        self.viewport_name = name.clone();
        self.adjust_all();

        self.emit(ControlEvent::new(
            root,
            EventKind::ViewportChange,
            EventData::Viewport { name, width, height },
        ));
    }

    /// Re-resolve every auto rule top-down, then relayout every panel.
    fn adjust_all(&mut self) {
        let ids = self.tree.descendants(self.root);
        for id in &ids {
            if let Err(err) = self.auto_adjust(*id) {
                warn!(id = ?id, %err, "auto rule failed after breakpoint change");
            }
        }
        self.calc_layout(self.root);
        for id in ids {
            if self.tree.get(id).is_some_and(|c| c.panel.is_some()) {
                self.calc_layout(id);
            }
        }
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Subscribe to `kind` on control `id`.
    ///
    /// Fails with `UnsupportedEvent` when the control's kind does not raise
    /// `kind`.
    pub fn on<F>(&mut self, id: ControlId, kind: EventKind, handler: F) -> Result<HandlerId>
    where
        F: Fn(&ControlEvent) -> bool + 'static,
    {
        let control_kind = self.tree.control(id)?.kind;
        if !control_kind.raises(kind) {
            return Err(ControlError::UnsupportedEvent {
                kind: control_kind,
                event: kind,
            });
        }
        Ok(self.handlers.register(id, kind, std::rc::Rc::new(handler)))
    }

    /// Unsubscribe. Returns false for unknown handles.
    pub fn off(&mut self, handler: HandlerId) -> bool {
        self.handlers.remove(handler)
    }

    /// Run the handlers of `event`. Returns true if one consumed it.
    pub(crate) fn emit(&self, event: ControlEvent) -> bool {
        self.handlers
            .handlers(event.target, event.kind)
            .into_iter()
            .any(|handler| handler(&event))
    }
}

impl<H: Host + std::fmt::Debug> std::fmt::Debug for Display<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Display")
            .field("root", &self.root)
            .field("controls", &self.tree.len())
            .field("viewport", &self.viewport_name)
            .field("current_control", &self.current_control)
            .field("queue", &self.queue)
            .field("host", &self.host)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HeadlessHost;
    use std::cell::Cell;
    use std::rc::Rc;

    fn setup() -> Display<HeadlessHost> {
        Display::new(HeadlessHost::new(), DisplayConfig::default().with_size(400.0, 300.0))
    }

    #[test]
    fn test_new_display() {
        let display = setup();
        let root = display.control(display.root()).unwrap();
        assert_eq!(root.kind(), ControlKind::Display);
        assert_eq!(root.name(), DISPLAY_NAME);
        assert_eq!(root.state(), ControlState::Alive);
        assert!(root.is_interactive());
        assert_eq!(root.width(), 400.0);
        assert_eq!(display.viewport_name(), "xs");
        assert!(display.frame_pending());
    }

    #[test]
    fn test_second_display_is_rejected() {
        let mut display = setup();
        assert_eq!(
            display.create(ControlKind::Display, None),
            Err(ControlError::DisplayExists)
        );
    }

    #[test]
    fn test_attach_wakes_and_detach_sleeps() {
        let mut display = setup();
        let root = display.root();
        let group = display.create(ControlKind::Container, Some("group")).unwrap();
        let leaf = display.create_in(group, ControlKind::Control, Some("leaf")).unwrap();
        assert_eq!(display.control(leaf).unwrap().state(), ControlState::Sleep);

        display.attach(root, group).unwrap();
        assert_eq!(display.control(group).unwrap().state(), ControlState::Alive);
        assert_eq!(display.control(leaf).unwrap().state(), ControlState::Alive);
        assert!(display.control(group).unwrap().is_interactive());

        display.detach(group).unwrap();
        assert_eq!(display.control(leaf).unwrap().state(), ControlState::Sleep);
        assert!(!display.control(group).unwrap().is_interactive());
        assert_eq!(display.child(root, "group"), None);
    }

    #[test]
    fn test_root_cannot_be_detached() {
        let mut display = setup();
        let root = display.root();
        let panel = display.create_in(root, ControlKind::Panel, None).unwrap();

        assert_eq!(display.detach(root), Err(ControlError::RootDetach));
        assert_eq!(display.destroy(root), Err(ControlError::RootDetach));
        assert_eq!(display.attach(panel, root), Err(ControlError::RootDetach));
    }

    #[test]
    fn test_attach_rejects_cycle_without_side_effects() {
        let mut display = setup();
        let root = display.root();
        let outer = display.create_in(root, ControlKind::Container, None).unwrap();
        let inner = display.create_in(outer, ControlKind::Container, None).unwrap();

        assert!(matches!(
            display.attach(inner, outer),
            Err(ControlError::CyclicOwnership { .. })
        ));
        assert_eq!(display.tree().owner(outer), Some(root));
        assert_eq!(display.control(outer).unwrap().state(), ControlState::Alive);
    }

    #[test]
    fn test_destroy_clears_everything() {
        let mut display = setup();
        let root = display.root();
        let group = display.create_in(root, ControlKind::Container, None).unwrap();
        let leaf = display.create_in(group, ControlKind::Control, None).unwrap();
        display.on(leaf, EventKind::Hit, |_| true).unwrap();

        display.destroy(group).unwrap();
        assert!(!display.contains(group));
        assert!(!display.contains(leaf));
        assert!(!display.render_queue().contains(leaf));
        assert!(!display.host().contains(leaf));
        assert!(display.control(root).unwrap().children().is_empty());
        assert_eq!(display.destroy(group), Err(ControlError::UnknownControl(group)));
    }

    #[test]
    fn test_unsupported_event() {
        let mut display = setup();
        let root = display.root();
        let leaf = display.create_in(root, ControlKind::Control, None).unwrap();

        assert_eq!(
            display.on(leaf, EventKind::ViewportChange, |_| false),
            Err(ControlError::UnsupportedEvent {
                kind: ControlKind::Control,
                event: EventKind::ViewportChange
            })
        );
    }

    #[test]
    fn test_resize_changes_breakpoint() {
        let mut display = setup();
        let root = display.root();
        let seen = Rc::new(Cell::new(0));
        let seen_clone = seen.clone();
        display
            .on(root, EventKind::ViewportChange, move |event| {
                if let EventData::Viewport { name, .. } = &event.data {
                    assert_eq!(name, "md");
                }
                seen_clone.set(seen_clone.get() + 1);
                false
            })
            .unwrap();

        display.resize(800.0, 600.0);
        assert_eq!(display.viewport_name(), "md");
        assert_eq!(display.control(root).unwrap().width(), 800.0);
        assert_eq!(seen.get(), 1);

        // Same bucket, no event
        display.resize(900.0, 600.0);
        assert_eq!(seen.get(), 1);
    }
}
