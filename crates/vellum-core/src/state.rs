//! The root state aggregate.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::action::Diagnostic;
use crate::buffer::BufferTable;
use crate::overlay::{Focus, OverlayState};
use crate::pane::{Pane, PaneId, PaneNode};
use crate::theme::Theme;
use crate::workspace::WorkspaceState;

/// Unique identifier for a terminal session.
///
/// Unlike buffer/tab/pane ids, terminal identities are assigned outside
/// the reducer (by the process manager that owns the PTY), so they ride in
/// on the action that introduces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TerminalId(pub Uuid);

impl TerminalId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TerminalId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TerminalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tracked terminal session. Terminals are global records, independent
/// of the pane/tab model; the underlying process outlives UI focus.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalInfo {
    pub id: TerminalId,
    pub title: String,
    pub cwd: PathBuf,
    pub active: bool,
}

/// Allocator for buffer/tab/pane identities, carried inside the state so
/// the reducer stays pure: the same (state, action) pair always produces
/// the same ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdGen {
    next: u64,
}

impl IdGen {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn alloc(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

impl Default for IdGen {
    fn default() -> Self {
        Self::new()
    }
}

/// The single root state aggregate. Snapshots are immutable-per-version:
/// the store replaces the whole value on every dispatch, and `Arc`-wrapped
/// subtrees keep that cheap.
#[derive(Debug, Clone)]
pub struct AppState {
    pub workspace: WorkspaceState,
    pub panes: Arc<PaneNode>,
    pub buffers: BufferTable,
    pub overlays: OverlayState,
    pub terminals: Vec<TerminalInfo>,
    pub diagnostics: Vec<Diagnostic>,
    pub theme: Theme,
    pub focus: Focus,
    pub should_quit: bool,
    pub ids: IdGen,
    /// Count of untitled buffers ever created, for `untitled-N` labels.
    pub untitled_counter: u64,
}

impl AppState {
    /// Initial state: one empty editor pane, no workspace, default theme.
    pub fn new() -> Self {
        Self::with_theme(Theme::default())
    }

    pub fn with_theme(theme: Theme) -> Self {
        let mut ids = IdGen::new();
        let pane = Pane::empty(PaneId(ids.alloc()));
        Self {
            workspace: WorkspaceState::default(),
            panes: Arc::new(PaneNode::Leaf(pane)),
            buffers: BufferTable::new(),
            overlays: OverlayState::default(),
            terminals: Vec::new(),
            diagnostics: Vec::new(),
            theme,
            focus: Focus::Editor,
            should_quit: false,
            ids,
            untitled_counter: 0,
        }
    }

    /// The effective active pane: first leaf in pre-order.
    pub fn active_pane(&self) -> &Pane {
        self.panes.first_leaf()
    }

    /// The active terminal, if any.
    pub fn active_terminal(&self) -> Option<&TerminalInfo> {
        self.terminals.iter().find(|t| t.active)
    }

    /// Number of tabs across all panes referencing `buffer`.
    pub fn tab_refs(&self, buffer: crate::buffer::BufferId) -> usize {
        self.panes
            .leaves()
            .iter()
            .flat_map(|p| p.tabs.iter())
            .filter(|t| t.buffer == buffer)
            .count()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
