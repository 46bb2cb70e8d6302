//! The pure state-transition function.
//!
//! `reduce` never performs I/O and never fails: every action kind has a
//! branch, and actions referencing identities that no longer exist return
//! the input state unchanged. Effects that need the file system, the
//! clipboard, processes or settings live in the command layer and rejoin
//! here through dispatch.

use std::sync::Arc;

use crate::action::Action;
use crate::buffer::Buffer;
use crate::language::language_for_path;
use crate::overlay::Focus;
use crate::buffer::BufferId;
use crate::pane::{Pane, PaneId, PaneNode, Tab, TabId};
use crate::state::{AppState, TerminalInfo};

/// Diagnostics entries kept before the oldest are dropped.
const DIAGNOSTIC_LIMIT: usize = 100;

/// Applies one action to a snapshot, producing the next snapshot.
/// Untouched parts of the state are shared by reference with the input.
pub fn reduce(state: &AppState, action: &Action) -> AppState {
    match action {
        Action::OpenFile { path } => {
            if let Some(buffer) = state.buffers.find_by_path(path) {
                // Already open: switch to its tab, never duplicate.
                let Some(pane) = state.panes.leaves().into_iter().find(|p| {
                    p.tabs.iter().any(|t| t.buffer == buffer)
                }) else {
                    return state.clone();
                };
                let Some(tab) = pane.tabs.iter().find(|t| t.buffer == buffer) else {
                    return state.clone();
                };
                return switch_tab(state, tab.id);
            }

            let mut next = state.clone();
            let buffer = Buffer::for_path(
                crate::buffer::BufferId(next.ids.alloc()),
                path,
            );
            let label = buffer.label();
            let tab = Tab::new(TabId(next.ids.alloc()), buffer.id, label);
            let pane_id = next.active_pane().id;
            next.buffers.insert(buffer);
            if let Some(panes) = next
                .panes
                .update_pane(pane_id, &|p| p.with_tab_appended(tab.clone()))
            {
                next.panes = panes;
            }
            next.focus = Focus::Editor;
            next
        }

        Action::NewUntitled => {
            let mut next = state.clone();
            next.untitled_counter += 1;
            let buffer = Buffer::untitled(crate::buffer::BufferId(next.ids.alloc()));
            let label = format!("untitled-{}", next.untitled_counter);
            let tab = Tab::new(TabId(next.ids.alloc()), buffer.id, label);
            let pane_id = next.active_pane().id;
            next.buffers.insert(buffer);
            if let Some(panes) = next
                .panes
                .update_pane(pane_id, &|p| p.with_tab_appended(tab.clone()))
            {
                next.panes = panes;
            }
            next.focus = Focus::Editor;
            next
        }

        Action::CloseTab { tab } => {
            let Some(pane) = state.panes.pane_of_tab(*tab) else {
                tracing::debug!(%tab, "close for unknown tab ignored");
                return state.clone();
            };
            let pane_id = pane.id;
            let Some((updated, removed)) = pane.with_tab_removed(*tab) else {
                return state.clone();
            };
            let mut next = state.clone();
            if let Some(panes) = next.panes.update_pane(pane_id, &|_| updated.clone()) {
                next.panes = panes;
            }
            // Last referencing tab gone: the buffer goes in the same
            // transition, never later.
            if next.tab_refs(removed.buffer) == 0 {
                next.buffers.remove(removed.buffer);
            }
            next
        }

        Action::SwitchTab { tab } => switch_tab(state, *tab),

        Action::NextTab => step_tab(state, 1),
        Action::PrevTab => step_tab(state, -1),

        Action::SetBufferContent { buffer, content } => {
            let mut next = state.clone();
            let changed = next.buffers.update(*buffer, |b| Buffer {
                content: content.clone(),
                ..b.clone()
            });
            if !changed {
                tracing::debug!(%buffer, "content for unknown buffer ignored");
                return state.clone();
            }
            next
        }

        Action::BufferLoaded { buffer, content } => {
            let mut next = state.clone();
            let changed = next.buffers.update(*buffer, |b| Buffer {
                content: content.clone(),
                saved_text: content.clone(),
                ..b.clone()
            });
            if !changed {
                return state.clone();
            }
            next
        }

        Action::MarkBufferSaved { buffer } => {
            let mut next = state.clone();
            let changed = next.buffers.update(*buffer, |b| Buffer {
                saved_text: b.content.clone(),
                ..b.clone()
            });
            if !changed {
                return state.clone();
            }
            next
        }

        Action::SetBufferPath { buffer, path } => {
            let mut next = state.clone();
            let changed = next.buffers.update(*buffer, |b| Buffer {
                path: Some(path.clone()),
                language: language_for_path(path).map(str::to_string),
                ..b.clone()
            });
            if !changed {
                return state.clone();
            }
            // Tabs referencing the buffer pick up the new label.
            let label = next
                .buffers
                .get(*buffer)
                .map(|b| b.label())
                .unwrap_or_default();
            next.panes = relabel_tabs(&next.panes, *buffer, &label);
            next
        }

        Action::SetCursor { buffer, cursor } => {
            let mut next = state.clone();
            if !next.buffers.update(*buffer, |b| Buffer {
                cursor: *cursor,
                ..b.clone()
            }) {
                return state.clone();
            }
            next
        }

        Action::SetSelection { buffer, selection } => {
            let mut next = state.clone();
            if !next.buffers.update(*buffer, |b| Buffer {
                selection: *selection,
                ..b.clone()
            }) {
                return state.clone();
            }
            next
        }

        Action::SplitPane { direction } => {
            let mut next = state.clone();
            let target = next.active_pane().id;
            let second = Pane::empty(PaneId(next.ids.alloc()));
            if let Some(panes) = next.panes.split_pane(target, *direction, second) {
                next.panes = panes;
            }
            next
        }

        Action::ClosePane { pane } => {
            let Some(closing) = state.panes.find_pane(*pane) else {
                return state.clone();
            };
            let orphaned: Vec<_> = closing.tabs.iter().map(|t| t.buffer).collect();
            let Some(panes) = state.panes.remove_pane(*pane) else {
                // Root leaf: the tree always keeps at least one pane.
                return state.clone();
            };
            let mut next = state.clone();
            next.panes = panes;
            for buffer in orphaned {
                if next.tab_refs(buffer) == 0 {
                    next.buffers.remove(buffer);
                }
            }
            next
        }

        Action::SetWorkspaceRoot { root } => {
            let mut next = state.clone();
            next.workspace.root = root.clone();
            next.workspace.tree = None;
            next
        }

        Action::SetFileTree { tree } => {
            let mut next = state.clone();
            next.workspace.tree = tree.clone();
            next
        }

        Action::ToggleDirExpanded { path } => {
            let Some(tree) = &state.workspace.tree else {
                return state.clone();
            };
            let Some(toggled) = tree.with_toggled(path) else {
                tracing::debug!(path = %path.display(), "toggle for unknown node ignored");
                return state.clone();
            };
            let mut next = state.clone();
            next.workspace.tree = Some(toggled);
            next
        }

        Action::OpenCommandLine => open_overlay(state, Focus::CommandLine),
        Action::OpenPalette => open_overlay(state, Focus::Palette),
        Action::OpenFilePicker => open_overlay(state, Focus::FilePicker),
        Action::OpenThemePicker => open_overlay(state, Focus::ThemePicker),

        Action::SetCommandLineInput { input } => {
            if !state.overlays.command_line.open {
                return state.clone();
            }
            let mut next = state.clone();
            next.overlays.command_line.input = input.clone();
            next
        }

        Action::SetPaletteQuery { query } => {
            if !state.overlays.palette.open {
                return state.clone();
            }
            let mut next = state.clone();
            next.overlays.palette.query = query.clone();
            next.overlays.palette.selected = 0;
            next
        }

        Action::SetFilePickerQuery { query } => {
            if !state.overlays.file_picker.open {
                return state.clone();
            }
            let mut next = state.clone();
            next.overlays.file_picker.query = query.clone();
            next
        }

        Action::CloseCommandLine => close_overlay(state, state.overlays.command_line.open),
        Action::ClosePalette => close_overlay(state, state.overlays.palette.open),
        Action::CloseFilePicker => close_overlay(state, state.overlays.file_picker.open),
        Action::CloseThemePicker => close_overlay(state, state.overlays.theme_picker.open),

        Action::OpenTerminal { id, title, cwd } => {
            if state.terminals.iter().any(|t| t.id == *id) {
                return state.clone();
            }
            let mut next = state.clone();
            for t in &mut next.terminals {
                t.active = false;
            }
            next.terminals.push(TerminalInfo {
                id: *id,
                title: title.clone(),
                cwd: cwd.clone(),
                active: true,
            });
            next.focus = Focus::Terminal;
            next
        }

        Action::CloseTerminal { id } => {
            let Some(index) = state.terminals.iter().position(|t| t.id == *id) else {
                return state.clone();
            };
            let mut next = state.clone();
            let removed = next.terminals.remove(index);
            if removed.active {
                if let Some(last) = next.terminals.last_mut() {
                    last.active = true;
                }
            }
            if next.terminals.is_empty() && next.focus == Focus::Terminal {
                next.focus = Focus::Editor;
            }
            next
        }

        Action::SetActiveTerminal { id } => {
            if !state.terminals.iter().any(|t| t.id == *id) {
                return state.clone();
            }
            let mut next = state.clone();
            for t in &mut next.terminals {
                t.active = t.id == *id;
            }
            next.focus = Focus::Terminal;
            next
        }

        Action::SetTheme { id } => match crate::theme::Theme::by_id(id) {
            Some(theme) => {
                let mut next = state.clone();
                next.theme = theme;
                next
            }
            None => {
                tracing::debug!(theme = %id, "unknown theme ignored");
                state.clone()
            }
        },

        Action::SetFocus { focus } => {
            let mut next = state.clone();
            next.focus = *focus;
            next
        }

        Action::PushDiagnostic { diagnostic } => {
            let mut next = state.clone();
            next.diagnostics.push(diagnostic.clone());
            if next.diagnostics.len() > DIAGNOSTIC_LIMIT {
                let excess = next.diagnostics.len() - DIAGNOSTIC_LIMIT;
                next.diagnostics.drain(..excess);
            }
            next
        }

        Action::ClearDiagnostics => {
            let mut next = state.clone();
            next.diagnostics.clear();
            next
        }

        Action::RequestQuit => {
            let mut next = state.clone();
            next.should_quit = true;
            next
        }
    }
}

fn switch_tab(state: &AppState, tab: TabId) -> AppState {
    let Some(pane) = state.panes.pane_of_tab(tab) else {
        tracing::debug!(%tab, "switch to unknown tab ignored");
        return state.clone();
    };
    let pane_id = pane.id;
    let mut next = state.clone();
    if let Some(panes) = next.panes.update_pane(pane_id, &|p| p.with_active(tab)) {
        next.panes = panes;
    }
    next.focus = Focus::Editor;
    next
}

/// Next/Prev are defined in terms of Switch over the active pane's tab
/// list in its current order. With zero tabs these are no-ops.
fn step_tab(state: &AppState, delta: isize) -> AppState {
    let pane = state.active_pane();
    let count = pane.tabs.len();
    if count == 0 {
        return state.clone();
    }
    let current = pane.active_index().unwrap_or(0) as isize;
    let index = (current + delta).rem_euclid(count as isize) as usize;
    switch_tab(state, pane.tabs[index].id)
}

fn open_overlay(state: &AppState, focus: Focus) -> AppState {
    let mut next = state.clone();
    next.overlays = crate::overlay::OverlayState::all_closed();
    match focus {
        Focus::CommandLine => next.overlays.command_line.open = true,
        Focus::Palette => next.overlays.palette.open = true,
        Focus::FilePicker => next.overlays.file_picker.open = true,
        Focus::ThemePicker => next.overlays.theme_picker.open = true,
        Focus::Editor | Focus::Terminal => {}
    }
    next.focus = focus;
    next
}

/// Closing an overlay always restores focus to the editor, not to the
/// previously focused target. Closing one that is not open is a no-op.
fn close_overlay(state: &AppState, was_open: bool) -> AppState {
    if !was_open {
        return state.clone();
    }
    let mut next = state.clone();
    next.overlays = crate::overlay::OverlayState::all_closed();
    next.focus = Focus::Editor;
    next
}

fn relabel_tabs(root: &Arc<PaneNode>, buffer: BufferId, label: &str) -> Arc<PaneNode> {
    let mut panes = root.clone();
    let affected: Vec<PaneId> = root
        .leaves()
        .into_iter()
        .filter(|p| p.tabs.iter().any(|t| t.buffer == buffer))
        .map(|p| p.id)
        .collect();
    for pane_id in affected {
        if let Some(updated) = panes.update_pane(pane_id, &|p| {
            let mut next = p.clone();
            for t in &mut next.tabs {
                if t.buffer == buffer {
                    t.label = label.to_string();
                }
            }
            next
        }) {
            panes = updated;
        }
    }
    panes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Diagnostic;
    use crate::pane::SplitDirection;
    use crate::state::TerminalId;
    use std::path::PathBuf;

    fn apply(state: AppState, actions: &[Action]) -> AppState {
        actions.iter().fold(state, |s, a| reduce(&s, a))
    }

    fn open(path: &str) -> Action {
        Action::OpenFile {
            path: PathBuf::from(path),
        }
    }

    /// Structural invariants that must hold after any action sequence.
    fn check_invariants(state: &AppState) {
        for pane in state.panes.leaves() {
            match pane.active_tab {
                Some(active) => {
                    assert!(
                        pane.tabs.iter().any(|t| t.id == active),
                        "active_tab not present in tab list"
                    );
                    assert_eq!(
                        pane.tabs.iter().filter(|t| t.active).count(),
                        1,
                        "exactly one tab must carry the active flag"
                    );
                    assert!(pane.tabs.iter().find(|t| t.id == active).unwrap().active);
                }
                None => {
                    assert!(
                        pane.tabs.iter().all(|t| !t.active),
                        "no tab may be active in a pane without active_tab"
                    );
                }
            }
            for tab in &pane.tabs {
                assert!(
                    state.buffers.get(tab.buffer).is_some(),
                    "tab references a missing buffer"
                );
            }
        }
        for buffer in state.buffers.iter() {
            assert!(
                state.tab_refs(buffer.id) > 0,
                "buffer retained with zero referencing tabs"
            );
        }
        assert!(state.terminals.iter().filter(|t| t.active).count() <= 1);
    }

    #[test]
    fn open_file_creates_buffer_tab_and_language() {
        let state = apply(AppState::new(), &[open("/a.ts")]);
        assert_eq!(state.buffers.len(), 1);
        let pane = state.active_pane();
        assert_eq!(pane.tabs.len(), 1);
        assert_eq!(pane.tabs[0].label, "a.ts");
        let buffer = state.buffers.get(pane.tabs[0].buffer).unwrap();
        assert_eq!(buffer.language.as_deref(), Some("typescript"));
        assert_eq!(state.focus, Focus::Editor);
        check_invariants(&state);
    }

    #[test]
    fn opening_same_path_twice_never_duplicates() {
        let state = apply(AppState::new(), &[open("/a.ts"), open("/a.ts")]);
        assert_eq!(state.buffers.len(), 1);
        assert_eq!(state.active_pane().tabs.len(), 1);
        check_invariants(&state);
    }

    #[test]
    fn second_open_switches_to_existing_tab() {
        let state = apply(AppState::new(), &[open("/a.rs"), open("/b.rs"), open("/a.rs")]);
        let pane = state.active_pane();
        assert_eq!(pane.tabs.len(), 2);
        let active = pane.active_index().unwrap();
        assert_eq!(pane.tabs[active].label, "a.rs");
        check_invariants(&state);
    }

    #[test]
    fn open_twice_then_close_empties_everything() {
        let mut state = apply(AppState::new(), &[open("/a.ts"), open("/a.ts")]);
        let tab = state.active_pane().tabs[0].id;
        state = reduce(&state, &Action::CloseTab { tab });
        assert_eq!(state.buffers.len(), 0);
        assert!(state.active_pane().tabs.is_empty());
        assert_eq!(state.active_pane().active_tab, None);
        check_invariants(&state);
    }

    #[test]
    fn closing_last_reference_removes_buffer_in_same_transition() {
        let state = apply(AppState::new(), &[open("/a.rs"), open("/b.rs")]);
        let a_tab = state.active_pane().tabs[0].id;
        let next = reduce(&state, &Action::CloseTab { tab: a_tab });
        assert_eq!(next.buffers.len(), 1);
        check_invariants(&next);
    }

    #[test]
    fn closing_active_middle_tab_activates_same_index() {
        let state = apply(AppState::new(), &[open("/a"), open("/b"), open("/c")]);
        let pane = state.active_pane();
        let b = pane.tabs[1].id;
        let state = reduce(&state, &Action::SwitchTab { tab: b });
        let state = reduce(&state, &Action::CloseTab { tab: b });
        let pane = state.active_pane();
        // Former index 1 now holds "c".
        assert_eq!(pane.tabs[pane.active_index().unwrap()].label, "c");
        check_invariants(&state);
    }

    #[test]
    fn closing_active_last_tab_activates_new_last() {
        let state = apply(AppState::new(), &[open("/a"), open("/b"), open("/c")]);
        let c = state.active_pane().tabs[2].id;
        let state = reduce(&state, &Action::CloseTab { tab: c });
        let pane = state.active_pane();
        assert_eq!(pane.tabs[pane.active_index().unwrap()].label, "b");
        check_invariants(&state);
    }

    #[test]
    fn prev_tab_walks_backwards_and_wraps() {
        // Three tabs a, b, c with c active.
        let mut state = apply(AppState::new(), &[open("/a"), open("/b"), open("/c")]);
        for expected in ["b", "a", "c"] {
            state = reduce(&state, &Action::PrevTab);
            let pane = state.active_pane();
            assert_eq!(pane.tabs[pane.active_index().unwrap()].label, expected);
        }
        check_invariants(&state);
    }

    #[test]
    fn next_then_prev_round_trips() {
        let state = apply(AppState::new(), &[open("/a"), open("/b"), open("/c")]);
        let state = reduce(&state, &Action::SwitchTab { tab: state.active_pane().tabs[1].id });
        let before = state.active_pane().active_tab;
        let state = apply(state, &[Action::NextTab, Action::PrevTab]);
        assert_eq!(state.active_pane().active_tab, before);
    }

    #[test]
    fn next_prev_with_no_tabs_is_noop() {
        let state = AppState::new();
        let next = reduce(&state, &Action::NextTab);
        assert!(next.active_pane().tabs.is_empty());
        let next = reduce(&next, &Action::PrevTab);
        assert!(next.active_pane().tabs.is_empty());
    }

    #[test]
    fn dirty_recomputes_against_loaded_baseline() {
        let state = apply(AppState::new(), &[open("/a.rs")]);
        let buffer = state.active_pane().tabs[0].buffer;
        let state = reduce(&state, &Action::BufferLoaded { buffer, content: "hello".into() });
        assert!(!state.buffers.get(buffer).unwrap().is_dirty());
        let state = reduce(&state, &Action::SetBufferContent { buffer, content: "hello!".into() });
        assert!(state.buffers.get(buffer).unwrap().is_dirty());
        // Editing back to the baseline clears the flag: not sticky.
        let state = reduce(&state, &Action::SetBufferContent { buffer, content: "hello".into() });
        assert!(!state.buffers.get(buffer).unwrap().is_dirty());
    }

    #[test]
    fn setting_identical_content_keeps_clean_flag() {
        let state = apply(AppState::new(), &[open("/a.rs")]);
        let buffer = state.active_pane().tabs[0].buffer;
        let state = reduce(&state, &Action::BufferLoaded { buffer, content: "x".into() });
        let state = reduce(&state, &Action::SetBufferContent { buffer, content: "x".into() });
        assert!(!state.buffers.get(buffer).unwrap().is_dirty());
    }

    #[test]
    fn mark_saved_clears_dirty_only() {
        let state = apply(AppState::new(), &[open("/a.rs")]);
        let buffer = state.active_pane().tabs[0].buffer;
        let state = reduce(&state, &Action::SetBufferContent { buffer, content: "new".into() });
        assert!(state.buffers.get(buffer).unwrap().is_dirty());
        let state = reduce(&state, &Action::MarkBufferSaved { buffer });
        let buf = state.buffers.get(buffer).unwrap();
        assert!(!buf.is_dirty());
        assert_eq!(buf.content, "new");
    }

    #[test]
    fn set_buffer_path_relabels_tabs_and_language() {
        let state = apply(AppState::new(), &[Action::NewUntitled]);
        let buffer = state.active_pane().tabs[0].buffer;
        assert_eq!(state.active_pane().tabs[0].label, "untitled-1");
        let state = reduce(
            &state,
            &Action::SetBufferPath { buffer, path: PathBuf::from("/x/lib.py") },
        );
        assert_eq!(state.active_pane().tabs[0].label, "lib.py");
        assert_eq!(
            state.buffers.get(buffer).unwrap().language.as_deref(),
            Some("python")
        );
    }

    #[test]
    fn stale_identities_are_noops() {
        let state = apply(AppState::new(), &[open("/a.rs")]);
        let ghost_tab = TabId(9999);
        let ghost_buffer = crate::buffer::BufferId(9999);
        let next = reduce(&state, &Action::CloseTab { tab: ghost_tab });
        assert_eq!(next.buffers.len(), state.buffers.len());
        let next = reduce(&state, &Action::SetBufferContent {
            buffer: ghost_buffer,
            content: "x".into(),
        });
        assert_eq!(next.buffers.len(), 1);
        check_invariants(&next);
    }

    #[test]
    fn split_keeps_first_preorder_leaf_active() {
        let state = apply(AppState::new(), &[open("/a.rs")]);
        let before = state.active_pane().id;
        let state = reduce(&state, &Action::SplitPane { direction: SplitDirection::Vertical });
        assert_eq!(state.panes.leaves().len(), 2);
        assert_eq!(state.active_pane().id, before);
        check_invariants(&state);
    }

    #[test]
    fn closing_split_pane_drops_orphaned_buffers() {
        let state = apply(AppState::new(), &[open("/a.rs")]);
        let state = reduce(&state, &Action::SplitPane { direction: SplitDirection::Horizontal });
        let second = state.panes.leaves()[1].id;
        // Root pane holds the only tab; closing the empty second pane
        // removes nothing from the buffer table.
        let state = reduce(&state, &Action::ClosePane { pane: second });
        assert_eq!(state.panes.leaves().len(), 1);
        assert_eq!(state.buffers.len(), 1);
        check_invariants(&state);
    }

    #[test]
    fn overlays_are_mutually_exclusive_and_close_to_editor() {
        let state = reduce(&AppState::new(), &Action::OpenCommandLine);
        assert!(state.overlays.command_line.open);
        assert_eq!(state.focus, Focus::CommandLine);

        let state = reduce(&state, &Action::OpenPalette);
        assert!(!state.overlays.command_line.open);
        assert!(state.overlays.palette.open);
        assert_eq!(state.focus, Focus::Palette);

        let state = reduce(&state, &Action::ClosePalette);
        assert!(!state.overlays.any_open());
        assert_eq!(state.focus, Focus::Editor);
    }

    #[test]
    fn command_line_input_requires_open_overlay() {
        let state = AppState::new();
        let next = reduce(&state, &Action::SetCommandLineInput { input: ":w".into() });
        assert_eq!(next.overlays.command_line.input, "");
        let next = apply(state, &[
            Action::OpenCommandLine,
            Action::SetCommandLineInput { input: ":w".into() },
        ]);
        assert_eq!(next.overlays.command_line.input, ":w");
    }

    #[test]
    fn terminal_open_close_semantics() {
        let t1 = TerminalId::new();
        let t2 = TerminalId::new();
        let state = apply(AppState::new(), &[
            Action::OpenTerminal { id: t1, title: "sh".into(), cwd: PathBuf::from("/") },
            Action::OpenTerminal { id: t2, title: "sh".into(), cwd: PathBuf::from("/") },
        ]);
        assert_eq!(state.terminals.len(), 2);
        assert_eq!(state.active_terminal().unwrap().id, t2);
        assert_eq!(state.focus, Focus::Terminal);

        let state = reduce(&state, &Action::CloseTerminal { id: t2 });
        assert_eq!(state.active_terminal().unwrap().id, t1);
        assert_eq!(state.focus, Focus::Terminal);

        let state = reduce(&state, &Action::CloseTerminal { id: t1 });
        assert!(state.terminals.is_empty());
        assert_eq!(state.focus, Focus::Editor);
    }

    #[test]
    fn closing_inactive_terminal_keeps_active() {
        let t1 = TerminalId::new();
        let t2 = TerminalId::new();
        let state = apply(AppState::new(), &[
            Action::OpenTerminal { id: t1, title: "a".into(), cwd: PathBuf::from("/") },
            Action::OpenTerminal { id: t2, title: "b".into(), cwd: PathBuf::from("/") },
            Action::CloseTerminal { id: t1 },
        ]);
        assert_eq!(state.active_terminal().unwrap().id, t2);
    }

    #[test]
    fn unknown_theme_is_noop() {
        let state = AppState::new();
        let next = reduce(&state, &Action::SetTheme { id: "no-such-theme".into() });
        assert_eq!(next.theme.id, state.theme.id);
        let next = reduce(&state, &Action::SetTheme { id: "light".into() });
        assert_eq!(next.theme.id, "light");
    }

    #[test]
    fn toggle_dir_only_flips_target() {
        use crate::workspace::DirNode;
        let tree = DirNode::directory(
            "ws",
            "/ws",
            true,
            vec![
                DirNode::directory("a", "/ws/a", false, vec![]),
                DirNode::directory("b", "/ws/b", false, vec![]),
            ],
        );
        let state = apply(AppState::new(), &[
            Action::SetWorkspaceRoot { root: Some(PathBuf::from("/ws")) },
            Action::SetFileTree { tree: Some(tree) },
            Action::ToggleDirExpanded { path: PathBuf::from("/ws/a") },
        ]);
        let tree = state.workspace.tree.as_ref().unwrap();
        assert!(tree.find(std::path::Path::new("/ws/a")).unwrap().expanded);
        assert!(!tree.find(std::path::Path::new("/ws/b")).unwrap().expanded);
    }

    #[test]
    fn untouched_state_is_shared_by_reference() {
        let state = apply(AppState::new(), &[open("/a.rs")]);
        let next = reduce(&state, &Action::PushDiagnostic {
            diagnostic: Diagnostic::info("hello"),
        });
        assert!(Arc::ptr_eq(&state.panes, &next.panes));
    }

    #[test]
    fn diagnostics_are_capped() {
        let mut state = AppState::new();
        for i in 0..150 {
            state = reduce(&state, &Action::PushDiagnostic {
                diagnostic: Diagnostic::info(format!("d{i}")),
            });
        }
        assert_eq!(state.diagnostics.len(), DIAGNOSTIC_LIMIT);
        assert_eq!(state.diagnostics.last().unwrap().message, "d149");
    }

    #[test]
    fn quit_flag_sets_once() {
        let state = reduce(&AppState::new(), &Action::RequestQuit);
        assert!(state.should_quit);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        /// Schematic operations that resolve to concrete actions against
        /// the current state, so generated sequences always reference
        /// live identities (plus a stale-id case for the no-op path).
        #[derive(Debug, Clone)]
        enum Op {
            Open(u8),
            NewUntitled,
            CloseActive,
            CloseStale,
            Next,
            Prev,
            Split,
            Edit(u8),
            OpenTerm,
            CloseActiveTerm,
            OpenOverlay(u8),
            CloseOverlay(u8),
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0u8..5).prop_map(Op::Open),
                Just(Op::NewUntitled),
                any::<bool>().prop_map(|b| if b { Op::CloseActive } else { Op::CloseStale }),
                any::<bool>().prop_map(|b| if b { Op::Next } else { Op::Prev }),
                Just(Op::Split),
                (0u8..4).prop_map(Op::Edit),
                any::<bool>().prop_map(|b| if b { Op::OpenTerm } else { Op::CloseActiveTerm }),
                (0u8..4).prop_map(Op::OpenOverlay),
                (0u8..4).prop_map(Op::CloseOverlay),
            ]
        }

        fn resolve(state: &AppState, op: &Op) -> Action {
            match op {
                Op::Open(n) => Action::OpenFile {
                    path: PathBuf::from(format!("/f{n}.rs")),
                },
                Op::NewUntitled => Action::NewUntitled,
                Op::CloseActive => match state.active_pane().active_tab {
                    Some(tab) => Action::CloseTab { tab },
                    None => Action::NextTab,
                },
                Op::CloseStale => Action::CloseTab { tab: TabId(u64::MAX) },
                Op::Next => Action::NextTab,
                Op::Prev => Action::PrevTab,
                Op::Split => Action::SplitPane {
                    direction: SplitDirection::Vertical,
                },
                Op::Edit(n) => {
                    let buffer = state
                        .active_pane()
                        .active_tab
                        .and_then(|t| state.active_pane().tab(t))
                        .map(|t| t.buffer)
                        .unwrap_or(crate::buffer::BufferId(u64::MAX));
                    Action::SetBufferContent {
                        buffer,
                        content: format!("content {n}"),
                    }
                }
                Op::OpenTerm => Action::OpenTerminal {
                    id: TerminalId::new(),
                    title: "shell".into(),
                    cwd: PathBuf::from("/"),
                },
                Op::CloseActiveTerm => match state.active_terminal() {
                    Some(t) => Action::CloseTerminal { id: t.id },
                    None => Action::ClearDiagnostics,
                },
                Op::OpenOverlay(n) => match n % 4 {
                    0 => Action::OpenCommandLine,
                    1 => Action::OpenPalette,
                    2 => Action::OpenFilePicker,
                    _ => Action::OpenThemePicker,
                },
                Op::CloseOverlay(n) => match n % 4 {
                    0 => Action::CloseCommandLine,
                    1 => Action::ClosePalette,
                    2 => Action::CloseFilePicker,
                    _ => Action::CloseThemePicker,
                },
            }
        }

        proptest! {
            #[test]
            fn invariants_hold_for_all_sequences(ops in prop::collection::vec(op_strategy(), 0..60)) {
                let mut state = AppState::new();
                for op in &ops {
                    let action = resolve(&state, op);
                    state = reduce(&state, &action);
                    check_invariants(&state);
                }
            }

            #[test]
            fn open_is_idempotent_on_buffer_count(n in 1u8..5) {
                let mut state = AppState::new();
                for _ in 0..n {
                    state = reduce(&state, &open("/same.rs"));
                }
                prop_assert_eq!(state.buffers.len(), 1);
                prop_assert_eq!(state.active_pane().tabs.len(), 1);
            }

            #[test]
            fn next_prev_round_trip_from_any_start(tabs in 1usize..6, start in 0usize..6) {
                let mut state = AppState::new();
                for i in 0..tabs {
                    state = reduce(&state, &open(&format!("/f{i}.rs")));
                }
                let start = start % tabs;
                let tab = state.active_pane().tabs[start].id;
                state = reduce(&state, &Action::SwitchTab { tab });
                let before = state.active_pane().active_tab;
                state = reduce(&state, &Action::NextTab);
                state = reduce(&state, &Action::PrevTab);
                prop_assert_eq!(state.active_pane().active_tab, before);
            }
        }
    }
}
