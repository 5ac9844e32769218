//! Render scheduler - dirty flags, the render queue and the frame flush.
//!
//! ```text
//! setter → mark_dirty → enqueue (dedup) → request_frame (once)
//!                                              ↓
//!                     frame(): swap batch → pass 1 render → pass 2 recalculate
//!                                              ↓
//!                              queue non-empty? → request_frame
//! ```
//!
//! Each frame captures the queue and runs both passes over that batch only.
//! Anything enqueued while the frame runs lands in the fresh queue and waits
//! for the next frame callback, so a frame always terminates.

use tracing::{debug, trace, warn};

use super::style::compose_class_name;
use crate::display::Display;
use crate::error::Result;
use crate::host::Host;
use crate::types::{ControlId, Dirty};

// =============================================================================
// Render queue
// =============================================================================

/// Queue state owned by a [`Display`].
#[derive(Debug, Default)]
pub struct RenderQueue {
    queue: Vec<ControlId>,
    post: Vec<ControlId>,
    frame_requested: bool,
    blocked: bool,
    suppress_depth: usize,
    /// Controls dirtied while suppressed.
    deferred: Vec<ControlId>,
    frames: u64,
}

impl RenderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Controls waiting for the next frame, in enqueue order.
    pub fn pending(&self) -> &[ControlId] {
        &self.queue
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn contains(&self, id: ControlId) -> bool {
        self.queue.contains(&id)
    }

    pub fn is_frame_requested(&self) -> bool {
        self.frame_requested
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppress_depth > 0
    }

    /// Number of frames flushed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Append unless present. Returns whether it was added.
    fn push(&mut self, id: ControlId) -> bool {
        if self.queue.contains(&id) {
            return false;
        }
        self.queue.push(id);
        true
    }

    pub(crate) fn defer(&mut self, id: ControlId) {
        if !self.deferred.contains(&id) {
            self.deferred.push(id);
        }
    }

    /// Drop every reference to a destroyed control.
    pub(crate) fn forget(&mut self, id: ControlId) {
        self.queue.retain(|q| *q != id);
        self.post.retain(|q| *q != id);
        self.deferred.retain(|q| *q != id);
    }
}

// =============================================================================
// Scheduling
// =============================================================================

impl<H: Host> Display<H> {
    pub fn render_queue(&self) -> &RenderQueue {
        &self.queue
    }

    /// Is a frame callback outstanding?
    pub fn frame_pending(&self) -> bool {
        self.queue.frame_requested
    }

    /// Add a control to the render queue. Refused while rendering is blocked.
    /// Returns whether the control was added.
    pub fn enqueue(&mut self, id: ControlId) -> bool {
        if self.queue.blocked || !self.tree.contains(id) {
            return false;
        }
        if !self.queue.push(id) {
            return false;
        }
        trace!(?id, pending = self.queue.len(), "enqueued");
        if !self.queue.frame_requested {
            self.queue.frame_requested = true;
            self.host.request_frame();
        }
        true
    }

    /// Set dirty flags. Only flags not already set have an effect; the first
    /// one queues the control (or defers it while suppressed).
    pub fn mark_dirty(&mut self, id: ControlId, flags: Dirty) {
        let Some(control) = self.tree.get_mut(id) else {
            return;
        };
        if control.dirty.contains(flags) {
            return;
        }
        control.dirty |= flags;

        if self.queue.is_suppressed() {
            self.queue.defer(id);
        } else {
            self.enqueue(id);
        }
    }

    /// Set all three dirty flags and queue the control.
    pub fn invalidate(&mut self, id: ControlId) {
        let Some(control) = self.tree.get_mut(id) else {
            return;
        };
        control.dirty = Dirty::all();

        if self.queue.is_suppressed() {
            self.queue.defer(id);
        } else {
            self.enqueue(id);
        }
    }

    pub fn content_changed(&mut self, id: ControlId) {
        self.mark_dirty(id, Dirty::CONTENT);
    }

    pub fn classes_changed(&mut self, id: ControlId) {
        self.mark_dirty(id, Dirty::CLASSES);
    }

    // =========================================================================
    // Suppression and blocking
    // =========================================================================

    /// Run `f` with invalidation suppressed.
    ///
    /// Flags are still set inside the window but nothing is queued and no
    /// geometry propagates. When the outermost window closes, every control
    /// dirtied inside it is re-resolved, relaid out and queued once.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.queue.suppress_depth += 1;
        let result = f(self);
        self.queue.suppress_depth -= 1;

        if self.queue.suppress_depth == 0 {
            let deferred = std::mem::take(&mut self.queue.deferred);
            debug!(count = deferred.len(), "suppression lifted");
            for id in deferred {
                self.revalidate(id);
            }
        }
        result
    }

    fn revalidate(&mut self, id: ControlId) {
        let Some(control) = self.tree.get(id) else {
            return;
        };
        let dirty = !control.dirty.is_empty();

        if let Err(err) = self.auto_adjust(id) {
            warn!(?id, %err, "auto rule failed after batch");
        }
        self.propagate_resize(id);
        self.notify_owner(id);
        if dirty {
            self.enqueue(id);
        }
    }

    /// Block or unblock rendering. Unblocking queues every control that is
    /// still dirty.
    pub fn set_rendering_blocked(&mut self, blocked: bool) {
        if self.queue.blocked == blocked {
            return;
        }
        self.queue.blocked = blocked;
        if blocked {
            return;
        }

        let dirty: Vec<ControlId> = self
            .tree
            .ids()
            .filter(|id| self.tree.get(*id).is_some_and(|c| !c.dirty.is_empty()))
            .collect();
        for id in dirty {
            self.enqueue(id);
        }
    }

    // =========================================================================
    // Render properties
    // =========================================================================

    pub fn add_class(&mut self, id: ControlId, class: &str) -> Result<()> {
        let control = self.tree.control_mut(id)?;
        if class.is_empty() || control.classes.iter().any(|c| c == class) {
            return Ok(());
        }
        control.classes.push(class.to_string());
        self.classes_changed(id);
        Ok(())
    }

    pub fn remove_class(&mut self, id: ControlId, class: &str) -> Result<()> {
        let control = self.tree.control_mut(id)?;
        let before = control.classes.len();
        control.classes.retain(|c| c != class);
        if control.classes.len() != before {
            self.classes_changed(id);
        }
        Ok(())
    }

    /// Add or remove `class`. Returns whether it is now present.
    pub fn toggle_class(&mut self, id: ControlId, class: &str) -> Result<bool> {
        if self.tree.control(id)?.classes.iter().any(|c| c == class) {
            self.remove_class(id, class)?;
            Ok(false)
        } else {
            self.add_class(id, class)?;
            Ok(!class.is_empty())
        }
    }

    /// Replace the content rendered into the host box.
    pub fn set_content(&mut self, id: ControlId, content: Option<&str>) -> Result<()> {
        let control = self.tree.control_mut(id)?;
        if control.content.as_deref() == content {
            return Ok(());
        }
        control.content = content.map(str::to_string);
        self.content_changed(id);
        Ok(())
    }

    // =========================================================================
    // Frame flush
    // =========================================================================

    /// Animation-frame callback.
    ///
    /// Pass 1 renders every control of the captured batch, pass 2
    /// recalculates the same controls in the same order. Requests another
    /// frame if anything was queued meanwhile.
    pub fn frame(&mut self) {
        self.queue.frame_requested = false;
        let batch = std::mem::take(&mut self.queue.queue);
        if batch.is_empty() {
            return;
        }
        self.queue.frames += 1;
        debug!(frame = self.queue.frames, batch = batch.len(), "frame flush");

        for id in batch {
            self.render_control(id);
        }

        let post = std::mem::take(&mut self.queue.post);
        for id in post {
            self.recalculate(id);
        }

        if !self.queue.queue.is_empty() && !self.queue.frame_requested {
            self.queue.frame_requested = true;
            self.host.request_frame();
        }
    }

    /// Pass 1: flush the style diff, class name and content.
    fn render_control(&mut self, id: ControlId) {
        let Some(control) = self.tree.get_mut(id) else {
            return;
        };
        let diff = std::mem::take(&mut control.shadow);
        let dirty = std::mem::take(&mut control.dirty);
        let class_name = dirty
            .contains(Dirty::CLASSES)
            .then(|| compose_class_name(control.kind, control.state, &control.classes));
        let content = dirty
            .contains(Dirty::CONTENT)
            .then(|| control.content.clone().unwrap_or_default());

        self.host.apply_style(id, &diff);
        if let Some(class_name) = class_name {
            self.host.set_class_name(id, &class_name);
        }
        if let Some(content) = content {
            self.host.set_content(id, &content);
        }
        self.queue.post.push(id);
    }

    /// Pass 2: refresh shell insets from the host box and re-resolve.
    fn recalculate(&mut self, id: ControlId) {
        let metrics = self.host.metrics(id);
        let Some(control) = self.tree.get_mut(id) else {
            return;
        };
        let before = control.inner_size();
        control.geometry.shell = metrics.shell;
        let inner_changed = control.inner_size() != before;

        if inner_changed {
            self.propagate_resize(id);
        }
        if let Err(err) = self.auto_adjust(id) {
            warn!(?id, %err, "auto rule failed during recalculation");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
