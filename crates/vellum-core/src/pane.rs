//! Tabs, panes and the recursive pane tree.
//!
//! The tree is a tagged union: a leaf holds one [`Pane`], an interior node
//! is a split with ordered children and parallel size proportions. There
//! are no parent pointers; lookups and updates traverse from the root, and
//! updates rebuild the path to the target while sharing every untouched
//! branch through `Arc`.
//!
//! The reducer treats the first leaf found in pre-order as *the* active
//! pane. The tree supports arbitrary nesting, but command logic assumes
//! single-effective-pane semantics throughout.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::buffer::BufferId;

/// Unique identifier for a tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TabId(pub u64);

impl std::fmt::Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tab-{}", self.0)
    }
}

/// Unique identifier for a pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaneId(pub u64);

impl std::fmt::Display for PaneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pane-{}", self.0)
    }
}

/// A UI-addressable reference to a buffer within a pane.
///
/// Multiple tabs may reference one buffer; the buffer outlives any single
/// tab and dies with the last one.
#[derive(Debug, Clone, PartialEq)]
pub struct Tab {
    pub id: TabId,
    pub buffer: BufferId,
    pub label: String,
    pub active: bool,
    pub pinned: bool,
}

impl Tab {
    pub fn new(id: TabId, buffer: BufferId, label: impl Into<String>) -> Self {
        Self {
            id,
            buffer,
            label: label.into(),
            active: false,
            pinned: false,
        }
    }
}

/// What a pane displays. Only `Editor` panes are populated by this core;
/// the other kinds are placeholders for the surrounding shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaneKind {
    #[default]
    Editor,
    Terminal,
    Explorer,
    Output,
}

/// Direction of a split node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitDirection {
    Horizontal,
    Vertical,
}

/// A rectangular region holding an ordered tab list and an active-tab
/// pointer.
///
/// Invariant: `active_tab` is either `None` or the id of a tab present in
/// `tabs`, and exactly one tab has its `active` flag set iff `active_tab`
/// is `Some`. The pure helpers below maintain this.
#[derive(Debug, Clone, PartialEq)]
pub struct Pane {
    pub id: PaneId,
    pub kind: PaneKind,
    pub tabs: Vec<Tab>,
    pub active_tab: Option<TabId>,
    /// Relative size within the parent split
    pub size: f32,
}

impl Pane {
    pub fn empty(id: PaneId) -> Self {
        Self {
            id,
            kind: PaneKind::Editor,
            tabs: Vec::new(),
            active_tab: None,
            size: 1.0,
        }
    }

    pub fn active_index(&self) -> Option<usize> {
        let active = self.active_tab?;
        self.tabs.iter().position(|t| t.id == active)
    }

    pub fn tab(&self, id: TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    /// Appends a tab and makes it active, deactivating all siblings.
    pub fn with_tab_appended(&self, tab: Tab) -> Pane {
        let mut next = self.clone();
        for t in &mut next.tabs {
            t.active = false;
        }
        let id = tab.id;
        next.tabs.push(Tab { active: true, ..tab });
        next.active_tab = Some(id);
        next
    }

    /// Switches the active tab. No-op when `id` is not in this pane.
    pub fn with_active(&self, id: TabId) -> Pane {
        if self.tab(id).is_none() {
            return self.clone();
        }
        let mut next = self.clone();
        for t in &mut next.tabs {
            t.active = t.id == id;
        }
        next.active_tab = Some(id);
        next
    }

    /// Removes a tab, returning the new pane and the removed tab.
    ///
    /// When the removed tab was active, the tab now occupying
    /// `min(former index, new count - 1)` becomes active; a previously
    /// active sibling is left alone. An emptied pane has `active_tab =
    /// None`.
    pub fn with_tab_removed(&self, id: TabId) -> Option<(Pane, Tab)> {
        let index = self.tabs.iter().position(|t| t.id == id)?;
        let mut next = self.clone();
        let removed = next.tabs.remove(index);

        if next.tabs.is_empty() {
            next.active_tab = None;
        } else if removed.active {
            let successor = index.min(next.tabs.len() - 1);
            let successor_id = next.tabs[successor].id;
            for t in &mut next.tabs {
                t.active = t.id == successor_id;
            }
            next.active_tab = Some(successor_id);
        }
        Some((next, removed))
    }
}

/// A node in the pane tree: leaf pane or split.
#[derive(Debug, Clone)]
pub enum PaneNode {
    Leaf(Pane),
    Split {
        direction: SplitDirection,
        children: Vec<Arc<PaneNode>>,
        /// Parallel to `children`; same length by construction.
        sizes: Vec<f32>,
    },
}

impl PaneNode {
    /// The first leaf in pre-order: the effective active pane.
    pub fn first_leaf(&self) -> &Pane {
        match self {
            PaneNode::Leaf(pane) => pane,
            // A split always has at least one child.
            PaneNode::Split { children, .. } => children[0].first_leaf(),
        }
    }

    /// All leaves, in pre-order.
    pub fn leaves(&self) -> Vec<&Pane> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Pane>) {
        match self {
            PaneNode::Leaf(pane) => out.push(pane),
            PaneNode::Split { children, .. } => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
        }
    }

    pub fn find_pane(&self, id: PaneId) -> Option<&Pane> {
        self.leaves().into_iter().find(|p| p.id == id)
    }

    /// The pane containing a given tab.
    pub fn pane_of_tab(&self, tab: TabId) -> Option<&Pane> {
        self.leaves().into_iter().find(|p| p.tab(tab).is_some())
    }

    /// Rewrites the leaf with id `target` through a pure updater,
    /// rebuilding only the path from the root to that leaf. Returns `None`
    /// when the pane is not in the tree.
    pub fn update_pane(
        self: &Arc<Self>,
        target: PaneId,
        f: &dyn Fn(&Pane) -> Pane,
    ) -> Option<Arc<PaneNode>> {
        match self.as_ref() {
            PaneNode::Leaf(pane) => {
                if pane.id == target {
                    Some(Arc::new(PaneNode::Leaf(f(pane))))
                } else {
                    None
                }
            }
            PaneNode::Split {
                direction,
                children,
                sizes,
            } => {
                for (i, child) in children.iter().enumerate() {
                    if let Some(updated) = child.update_pane(target, f) {
                        let mut next_children = children.clone();
                        next_children[i] = updated;
                        return Some(Arc::new(PaneNode::Split {
                            direction: *direction,
                            children: next_children,
                            sizes: sizes.clone(),
                        }));
                    }
                }
                None
            }
        }
    }

    /// Replaces the leaf `target` with a split holding the old pane and
    /// `second`, halving the space between them.
    pub fn split_pane(
        self: &Arc<Self>,
        target: PaneId,
        direction: SplitDirection,
        second: Pane,
    ) -> Option<Arc<PaneNode>> {
        match self.as_ref() {
            PaneNode::Leaf(pane) => {
                if pane.id == target {
                    let first = Pane {
                        size: 0.5,
                        ..pane.clone()
                    };
                    let second = Pane { size: 0.5, ..second };
                    Some(Arc::new(PaneNode::Split {
                        direction,
                        children: vec![
                            Arc::new(PaneNode::Leaf(first)),
                            Arc::new(PaneNode::Leaf(second)),
                        ],
                        sizes: vec![0.5, 0.5],
                    }))
                } else {
                    None
                }
            }
            PaneNode::Split {
                direction: dir,
                children,
                sizes,
            } => {
                for (i, child) in children.iter().enumerate() {
                    if let Some(updated) = child.split_pane(target, direction, second.clone()) {
                        let mut next_children = children.clone();
                        next_children[i] = updated;
                        return Some(Arc::new(PaneNode::Split {
                            direction: *dir,
                            children: next_children,
                            sizes: sizes.clone(),
                        }));
                    }
                }
                None
            }
        }
    }

    /// Removes the leaf `target`. A split left with a single child
    /// collapses into that child; sibling sizes renormalize to sum to 1.
    /// Returns `None` when the pane is not found or is the root leaf
    /// (the tree always keeps at least one pane).
    pub fn remove_pane(self: &Arc<Self>, target: PaneId) -> Option<Arc<PaneNode>> {
        match self.as_ref() {
            PaneNode::Leaf(_) => None,
            PaneNode::Split {
                direction,
                children,
                sizes,
            } => {
                // Direct child leaf?
                if let Some(i) = children
                    .iter()
                    .position(|c| matches!(c.as_ref(), PaneNode::Leaf(p) if p.id == target))
                {
                    let mut next_children = children.clone();
                    let mut next_sizes = sizes.clone();
                    next_children.remove(i);
                    next_sizes.remove(i);
                    if next_children.len() == 1 {
                        return next_children.pop();
                    }
                    let total: f32 = next_sizes.iter().sum();
                    if total > 0.0 {
                        for s in &mut next_sizes {
                            *s /= total;
                        }
                    }
                    return Some(Arc::new(PaneNode::Split {
                        direction: *direction,
                        children: next_children,
                        sizes: next_sizes,
                    }));
                }
                // Recurse into split children.
                for (i, child) in children.iter().enumerate() {
                    if let Some(updated) = child.remove_pane(target) {
                        let mut next_children = children.clone();
                        next_children[i] = updated;
                        return Some(Arc::new(PaneNode::Split {
                            direction: *direction,
                            children: next_children,
                            sizes: sizes.clone(),
                        }));
                    }
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pane_with_tabs(pane_id: u64, tab_ids: &[u64]) -> Pane {
        let mut pane = Pane::empty(PaneId(pane_id));
        for &id in tab_ids {
            pane = pane.with_tab_appended(Tab::new(TabId(id), BufferId(id), format!("t{id}")));
        }
        pane
    }

    #[test]
    fn append_activates_and_deactivates_siblings() {
        let pane = pane_with_tabs(1, &[1, 2, 3]);
        assert_eq!(pane.active_tab, Some(TabId(3)));
        assert_eq!(pane.tabs.iter().filter(|t| t.active).count(), 1);
    }

    #[test]
    fn removing_active_tab_activates_adjacent() {
        let pane = pane_with_tabs(1, &[1, 2, 3]).with_active(TabId(2));
        let (next, removed) = pane.with_tab_removed(TabId(2)).unwrap();
        assert_eq!(removed.id, TabId(2));
        // Former index 1 is now tab 3.
        assert_eq!(next.active_tab, Some(TabId(3)));
    }

    #[test]
    fn removing_last_tab_in_list_activates_new_last() {
        let pane = pane_with_tabs(1, &[1, 2, 3]);
        let (next, _) = pane.with_tab_removed(TabId(3)).unwrap();
        assert_eq!(next.active_tab, Some(TabId(2)));
    }

    #[test]
    fn removing_inactive_tab_keeps_active() {
        let pane = pane_with_tabs(1, &[1, 2, 3]);
        let (next, _) = pane.with_tab_removed(TabId(1)).unwrap();
        assert_eq!(next.active_tab, Some(TabId(3)));
    }

    #[test]
    fn removing_only_tab_clears_active() {
        let pane = pane_with_tabs(1, &[1]);
        let (next, _) = pane.with_tab_removed(TabId(1)).unwrap();
        assert!(next.tabs.is_empty());
        assert_eq!(next.active_tab, None);
    }

    #[test]
    fn first_leaf_is_preorder() {
        let root = Arc::new(PaneNode::Split {
            direction: SplitDirection::Horizontal,
            children: vec![
                Arc::new(PaneNode::Leaf(Pane::empty(PaneId(1)))),
                Arc::new(PaneNode::Leaf(Pane::empty(PaneId(2)))),
            ],
            sizes: vec![0.5, 0.5],
        });
        assert_eq!(root.first_leaf().id, PaneId(1));
    }

    #[test]
    fn update_shares_untouched_siblings() {
        let left = Arc::new(PaneNode::Leaf(Pane::empty(PaneId(1))));
        let right = Arc::new(PaneNode::Leaf(Pane::empty(PaneId(2))));
        let root = Arc::new(PaneNode::Split {
            direction: SplitDirection::Vertical,
            children: vec![left, right.clone()],
            sizes: vec![0.5, 0.5],
        });
        let next = root
            .update_pane(PaneId(1), &|p| Pane {
                kind: PaneKind::Output,
                ..p.clone()
            })
            .unwrap();
        match next.as_ref() {
            PaneNode::Split { children, .. } => {
                assert!(Arc::ptr_eq(&children[1], &right));
            }
            _ => panic!("expected split"),
        }
    }

    #[test]
    fn split_then_remove_collapses() {
        let root = Arc::new(PaneNode::Leaf(Pane::empty(PaneId(1))));
        let split = root
            .split_pane(PaneId(1), SplitDirection::Horizontal, Pane::empty(PaneId(2)))
            .unwrap();
        assert_eq!(split.leaves().len(), 2);
        let collapsed = split.remove_pane(PaneId(2)).unwrap();
        assert_eq!(collapsed.leaves().len(), 1);
        assert_eq!(collapsed.first_leaf().id, PaneId(1));
    }

    #[test]
    fn removing_root_leaf_is_refused() {
        let root = Arc::new(PaneNode::Leaf(Pane::empty(PaneId(1))));
        assert!(root.remove_pane(PaneId(1)).is_none());
    }

    #[test]
    fn sizes_stay_parallel_to_children() {
        let root = Arc::new(PaneNode::Leaf(Pane::empty(PaneId(1))));
        let split = root
            .split_pane(PaneId(1), SplitDirection::Vertical, Pane::empty(PaneId(2)))
            .unwrap();
        let split = split
            .split_pane(PaneId(2), SplitDirection::Horizontal, Pane::empty(PaneId(3)))
            .unwrap();
        fn check(node: &PaneNode) {
            if let PaneNode::Split { children, sizes, .. } = node {
                assert_eq!(children.len(), sizes.len());
                for c in children {
                    check(c);
                }
            }
        }
        check(&split);
    }
}
