//! The transition vocabulary.
//!
//! Actions are plain values; dispatching one is the only way any state
//! changes. The vocabulary is a closed enum, so the reducer is total by
//! exhaustive match, and actions referencing identities that no longer
//! exist are safe no-ops (the pane tree may have changed between an effect
//! starting and completing).

use std::path::PathBuf;

use crate::buffer::{BufferId, CursorPosition, Selection};
use crate::overlay::Focus;
use crate::pane::{PaneId, SplitDirection, TabId};
use crate::state::TerminalId;
use crate::workspace::DirNode;

/// Severity of a diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// One entry in the diagnostics/log channel. Failures surface here; there
/// is no modal error dialog in this core.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
        }
    }
}

/// Every state transition the reducer understands.
#[derive(Debug, Clone)]
pub enum Action {
    // Files and tabs
    /// Open a file path in the active pane. If a buffer for the path
    /// already exists, switches to its tab instead of duplicating.
    OpenFile { path: PathBuf },
    /// Open a fresh untitled buffer in the active pane.
    NewUntitled,
    CloseTab { tab: TabId },
    SwitchTab { tab: TabId },
    NextTab,
    PrevTab,

    // Buffer metadata
    SetBufferContent { buffer: BufferId, content: String },
    /// Content arrived from disk: sets both content and the saved
    /// baseline in one transition.
    BufferLoaded { buffer: BufferId, content: String },
    /// Save completed: the current content becomes the baseline.
    MarkBufferSaved { buffer: BufferId },
    /// Re-target a buffer to a new path (save-as), recomputing label and
    /// language.
    SetBufferPath { buffer: BufferId, path: PathBuf },
    SetCursor { buffer: BufferId, cursor: CursorPosition },
    SetSelection { buffer: BufferId, selection: Option<Selection> },

    // Pane tree
    SplitPane { direction: SplitDirection },
    ClosePane { pane: PaneId },

    // Workspace
    SetWorkspaceRoot { root: Option<PathBuf> },
    SetFileTree { tree: Option<DirNode> },
    ToggleDirExpanded { path: PathBuf },

    // Overlays
    OpenCommandLine,
    SetCommandLineInput { input: String },
    CloseCommandLine,
    OpenPalette,
    SetPaletteQuery { query: String },
    ClosePalette,
    OpenFilePicker,
    SetFilePickerQuery { query: String },
    CloseFilePicker,
    OpenThemePicker,
    CloseThemePicker,

    // Terminals
    OpenTerminal {
        id: TerminalId,
        title: String,
        cwd: PathBuf,
    },
    CloseTerminal { id: TerminalId },
    SetActiveTerminal { id: TerminalId },

    // Appearance and focus
    SetTheme { id: String },
    SetFocus { focus: Focus },

    // Diagnostics
    PushDiagnostic { diagnostic: Diagnostic },
    ClearDiagnostics,

    // Lifecycle
    RequestQuit,
}
