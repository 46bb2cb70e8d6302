//! Workspace root and the directory-tree snapshot.
//!
//! The tree is a lazily populated snapshot, not recomputed from disk on
//! every render: each node carries an explicit expanded/collapsed flag and
//! the File System Port rebuilds subtrees on demand. Toggling a node
//! rewrites only the path from the root to that node; sibling branches are
//! shared by reference.

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A node in the directory snapshot.
#[derive(Debug, Clone)]
pub struct DirNode {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
    pub expanded: bool,
    pub children: Arc<Vec<DirNode>>,
}

impl DirNode {
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            is_dir: false,
            expanded: false,
            children: Arc::new(Vec::new()),
        }
    }

    pub fn directory(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        expanded: bool,
        children: Vec<DirNode>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            is_dir: true,
            expanded,
            children: Arc::new(children),
        }
    }

    /// Flips the expanded flag on the node whose path equals `target`,
    /// rewriting only the branch containing it. Returns `None` when the
    /// path is not in this subtree, so callers can keep the old node by
    /// reference.
    pub fn with_toggled(&self, target: &Path) -> Option<DirNode> {
        if self.path == target {
            let mut next = self.clone();
            next.expanded = !next.expanded;
            return Some(next);
        }
        if !target.starts_with(&self.path) {
            return None;
        }
        for (i, child) in self.children.iter().enumerate() {
            if let Some(updated) = child.with_toggled(target) {
                let mut next_children: Vec<DirNode> = self.children.as_ref().clone();
                next_children[i] = updated;
                let mut next = self.clone();
                next.children = Arc::new(next_children);
                return Some(next);
            }
        }
        None
    }

    /// Finds a node by path.
    pub fn find(&self, target: &Path) -> Option<&DirNode> {
        if self.path == target {
            return Some(self);
        }
        if !target.starts_with(&self.path) {
            return None;
        }
        self.children.iter().find_map(|c| c.find(target))
    }
}

/// Nullable workspace root plus the directory snapshot.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceState {
    pub root: Option<PathBuf>,
    pub tree: Option<DirNode>,
}
