//! # Vellum Core
//!
//! State model and transition engine for the vellum editor shell.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        Store                             │
//! │   ┌───────────────┐   ┌─────────┐   ┌────────────────┐   │
//! │   │  AppState     │──▶│ reduce  │──▶│  AppState'     │   │
//! │   │  (snapshot)   │   │ (pure)  │   │  (snapshot)    │   │
//! │   └───────────────┘   └─────────┘   └───────┬────────┘   │
//! │                                             │            │
//! │                              notify every subscriber     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Every mutation of the application state flows through
//! [`Store::dispatch`]. The reducer is a pure, total function: it never
//! performs I/O, never fails, and treats actions that reference stale
//! identities as no-ops. Side effects (file system, clipboard, processes,
//! settings) live in the command layer, which rejoins the single dispatch
//! path once its asynchronous work completes.

pub mod action;
pub mod buffer;
pub mod language;
pub mod overlay;
pub mod pane;
pub mod reducer;
pub mod settings;
pub mod state;
pub mod store;
pub mod theme;
pub mod workspace;

pub use action::{Action, Diagnostic, Severity};
pub use buffer::{Buffer, BufferId, BufferTable, CursorPosition, Selection};
pub use overlay::{Focus, OverlayState};
pub use pane::{Pane, PaneId, PaneKind, PaneNode, SplitDirection, Tab, TabId};
pub use reducer::reduce;
pub use settings::Settings;
pub use state::{AppState, TerminalId, TerminalInfo};
pub use store::{Store, Subscription};
pub use theme::Theme;
pub use workspace::{DirNode, WorkspaceState};
