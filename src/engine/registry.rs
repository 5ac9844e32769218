//! Control Registry - the arena that owns every control.
//!
//! Manages the lifecycle of control ids:
//! - Generational ids from a slot map (stale ids never resolve)
//! - Name generation and sibling-unique names
//! - Owner/child links with acyclicity enforced at link time
//! - Traversal helpers (ancestors, descendants, nearest container)
//!
//! Owner and child edges are plain ids. Lifetime belongs to the arena alone.

use slotmap::SlotMap;

use super::control::Control;
use crate::error::{ControlError, Result};
use crate::types::{ControlId, ControlKind};

// =============================================================================
// Registry State
// =============================================================================

/// Arena of controls.
#[derive(Debug, Default)]
pub struct ControlTree {
    controls: SlotMap<ControlId, Control>,
    root: Option<ControlId>,
    /// Counter for generated names.
    name_counter: usize,
    has_display: bool,
}

impl ControlTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// A tree holding only its display root.
    pub(crate) fn with_display(name: &str) -> (Self, ControlId) {
        let mut tree = Self {
            has_display: true,
            ..Self::default()
        };
        let root = tree
            .controls
            .insert(Control::new(ControlKind::Display, name.to_string()));
        tree.root = Some(root);
        (tree, root)
    }

    // =========================================================================
    // Allocation
    // =========================================================================

    /// Allocate a detached control.
    ///
    /// A name is generated when none is given. Only one `Display` may ever be
    /// allocated per tree.
    pub(crate) fn allocate(&mut self, kind: ControlKind, name: Option<&str>) -> Result<ControlId> {
        if kind == ControlKind::Display {
            if self.has_display {
                return Err(ControlError::DisplayExists);
            }
            self.has_display = true;
        }

        let name = match name {
            Some(name) => name.to_string(),
            None => {
                let name = format!("c{}", self.name_counter);
                self.name_counter += 1;
                name
            }
        };

        Ok(self.controls.insert(Control::new(kind, name)))
    }

    /// Remove a control from the arena. Links must already be cleared.
    pub(crate) fn remove(&mut self, id: ControlId) -> Option<Control> {
        if self.root == Some(id) {
            self.root = None;
        }
        self.controls.remove(id)
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub fn root(&self) -> Option<ControlId> {
        self.root
    }

    pub fn contains(&self, id: ControlId) -> bool {
        self.controls.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    pub fn get(&self, id: ControlId) -> Option<&Control> {
        self.controls.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: ControlId) -> Option<&mut Control> {
        self.controls.get_mut(id)
    }

    /// Like [`get`](Self::get) but reports unknown ids as errors.
    pub fn control(&self, id: ControlId) -> Result<&Control> {
        self.controls.get(id).ok_or(ControlError::UnknownControl(id))
    }

    pub(crate) fn control_mut(&mut self, id: ControlId) -> Result<&mut Control> {
        self.controls.get_mut(id).ok_or(ControlError::UnknownControl(id))
    }

    pub fn ids(&self) -> impl Iterator<Item = ControlId> + '_ {
        self.controls.keys()
    }

    pub fn owner(&self, id: ControlId) -> Option<ControlId> {
        self.controls.get(id).and_then(|c| c.owner)
    }

    /// Children of `id`; empty for unknown ids.
    pub fn children(&self, id: ControlId) -> &[ControlId] {
        self.controls.get(id).map(|c| c.children.as_slice()).unwrap_or(&[])
    }

    /// Strict ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: ControlId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.owner(id),
        }
    }

    /// Is `ancestor` a strict ancestor of `id`?
    pub fn is_ancestor(&self, ancestor: ControlId, id: ControlId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// Nearest strict ancestor that is a container.
    pub fn nearest_container(&self, id: ControlId) -> Option<ControlId> {
        self.ancestors(id)
            .find(|a| self.get(*a).is_some_and(|c| c.kind.is_container()))
    }

    pub fn child_by_name(&self, owner: ControlId, name: &str) -> Option<ControlId> {
        self.children(owner)
            .iter()
            .copied()
            .find(|child| self.get(*child).is_some_and(|c| c.name == name))
    }

    /// Descendants of `id` in pre-order, excluding `id`.
    pub fn descendants(&self, id: ControlId) -> Vec<ControlId> {
        let mut result = Vec::new();
        let mut stack: Vec<ControlId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            result.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        result
    }

    // =========================================================================
    // Links
    // =========================================================================

    /// Check that `child` may be linked under `parent` without changing
    /// anything.
    pub(crate) fn check_link(&self, parent: ControlId, child: ControlId) -> Result<()> {
        self.control(parent)?;
        let child_name = &self.control(child)?.name;

        if parent == child || self.is_ancestor(child, parent) {
            return Err(ControlError::CyclicOwnership { parent, child });
        }

        match self.child_by_name(parent, child_name) {
            Some(existing) if existing != child => Err(ControlError::DuplicateName {
                owner: parent,
                name: child_name.clone(),
            }),
            _ => Ok(()),
        }
    }

    /// Make `child` the last child of `parent`, unlinking it from any
    /// previous owner first.
    pub(crate) fn link(&mut self, parent: ControlId, child: ControlId) -> Result<()> {
        self.check_link(parent, child)?;
        if self.owner(child) == Some(parent) {
            return Ok(());
        }

        self.unlink(child);

        self.control_mut(child)?.owner = Some(parent);
        self.control_mut(parent)?.children.push(child);
        Ok(())
    }

    /// Detach `child` from its owner. Returns the previous owner.
    pub(crate) fn unlink(&mut self, child: ControlId) -> Option<ControlId> {
        let owner = self.get_mut(child)?.owner.take()?;
        if let Some(parent) = self.get_mut(owner) {
            parent.children.retain(|id| *id != child);
        }
        Some(owner)
    }
}

/// Iterator over strict ancestors, nearest first.
pub struct Ancestors<'a> {
    tree: &'a ControlTree,
    next: Option<ControlId>,
}

impl Iterator for Ancestors<'_> {
    type Item = ControlId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.owner(current);
        Some(current)
    }
}
