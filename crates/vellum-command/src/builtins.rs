//! The built-in command surface.
//!
//! Every command here follows the same discipline: call ports for side
//! effects, then rejoin the state machine through `dispatch`. A failing
//! effect aborts the remaining dispatches, and multi-dispatch commands
//! are ordered so every intermediate state is independently valid: no
//! half-created tab ever exists without its buffer.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use vellum_core::{
    Action, AppState, Buffer, CursorPosition, DirNode, SplitDirection, TerminalId, Theme,
};
use vellum_proc::{PtyEvent, PtyOptions, SessionId};

use crate::registry::{Command, CommandContext, CommandRegistry};
use crate::{parser, CommandError};

/// Registers every built-in command.
pub fn register_builtins(registry: &Arc<CommandRegistry>) {
    register_file(registry);
    register_tabs_and_panes(registry);
    register_edit(registry);
    register_workspace(registry);
    register_terminal(registry);
    register_view(registry);
    register_misc(registry);
}

fn register_file(registry: &Arc<CommandRegistry>) {
    registry.register(Command::new("file.new", "New File", |ctx, _args| {
        Box::pin(async move {
            ctx.store.dispatch(Action::NewUntitled);
            Ok(())
        })
    }));

    registry.register(Command::new("file.open", "Open File", |ctx, args| {
        Box::pin(async move {
            let Some(raw) = args.first() else {
                // No path: hand the choice to the file picker overlay.
                ctx.store.dispatch(Action::OpenFilePicker);
                return Ok(());
            };
            let path = PathBuf::from(raw);

            if ctx.store.get_state().buffers.find_by_path(&path).is_some() {
                // Already open: the reducer switches to the existing tab.
                ctx.store.dispatch(Action::OpenFile { path });
                return Ok(());
            }

            // Read before any dispatch so a failed read leaves no
            // half-created tab behind.
            let content = ctx.fs.read_file(&path).await?;
            ctx.store.dispatch(Action::OpenFile { path: path.clone() });
            let state = ctx.store.get_state();
            if let Some(buffer) = state.buffers.find_by_path(&path) {
                ctx.store.dispatch(Action::BufferLoaded { buffer, content });
            }
            Ok(())
        })
    }));

    registry.register(Command::new("file.save", "Save File", |ctx, _args| {
        Box::pin(async move {
            let state = ctx.store.get_state();
            let Some(buffer) = active_buffer(&state) else {
                return Err(CommandError::Usage("no active buffer to save".into()));
            };
            let Some(path) = buffer.path.clone() else {
                return Err(CommandError::Usage(
                    "buffer has no path; use file.saveAs <path>".into(),
                ));
            };
            ctx.fs.write_file(&path, &buffer.content).await?;
            ctx.store.dispatch(Action::MarkBufferSaved { buffer: buffer.id });
            Ok(())
        })
    }));

    registry.register(Command::new("file.saveAs", "Save File As", |ctx, args| {
        Box::pin(async move {
            let Some(raw) = args.first() else {
                return Err(CommandError::Usage("usage: file.saveAs <path>".into()));
            };
            let path = PathBuf::from(raw);
            let state = ctx.store.get_state();
            let Some(buffer) = active_buffer(&state) else {
                return Err(CommandError::Usage("no active buffer to save".into()));
            };
            // Persist first; only then re-target the buffer.
            ctx.fs.write_file(&path, &buffer.content).await?;
            ctx.store.dispatch(Action::SetBufferPath {
                buffer: buffer.id,
                path,
            });
            ctx.store.dispatch(Action::MarkBufferSaved { buffer: buffer.id });
            Ok(())
        })
    }));
}

fn register_tabs_and_panes(registry: &Arc<CommandRegistry>) {
    registry.register(Command::new("tab.close", "Close Tab", |ctx, args| {
        Box::pin(async move {
            let state = ctx.store.get_state();
            let pane = state.active_pane();
            let tab = match args.first() {
                Some(raw) => {
                    let index: usize = raw
                        .parse()
                        .map_err(|_| CommandError::Usage("usage: tab.close [index]".into()))?;
                    pane.tabs
                        .get(index)
                        .map(|t| t.id)
                        .ok_or_else(|| CommandError::Usage(format!("no tab at index {index}")))?
                }
                None => match pane.active_tab {
                    Some(tab) => tab,
                    None => return Ok(()),
                },
            };
            ctx.store.dispatch(Action::CloseTab { tab });
            Ok(())
        })
    }));

    registry.register(Command::new("tab.switch", "Switch Tab", |ctx, args| {
        Box::pin(async move {
            let Some(raw) = args.first() else {
                return Err(CommandError::Usage("usage: tab.switch <index>".into()));
            };
            let index: usize = raw
                .parse()
                .map_err(|_| CommandError::Usage("usage: tab.switch <index>".into()))?;
            let state = ctx.store.get_state();
            let Some(tab) = state.active_pane().tabs.get(index).map(|t| t.id) else {
                return Err(CommandError::Usage(format!("no tab at index {index}")));
            };
            ctx.store.dispatch(Action::SwitchTab { tab });
            Ok(())
        })
    }));

    registry.register(Command::new("tab.next", "Next Tab", |ctx, _args| {
        Box::pin(async move {
            ctx.store.dispatch(Action::NextTab);
            Ok(())
        })
    }));

    registry.register(Command::new("tab.prev", "Previous Tab", |ctx, _args| {
        Box::pin(async move {
            ctx.store.dispatch(Action::PrevTab);
            Ok(())
        })
    }));

    registry.register(Command::new(
        "pane.splitHorizontal",
        "Split Pane Horizontally",
        |ctx, _args| {
            Box::pin(async move {
                ctx.store.dispatch(Action::SplitPane {
                    direction: SplitDirection::Horizontal,
                });
                Ok(())
            })
        },
    ));

    registry.register(Command::new(
        "pane.splitVertical",
        "Split Pane Vertically",
        |ctx, _args| {
            Box::pin(async move {
                ctx.store.dispatch(Action::SplitPane {
                    direction: SplitDirection::Vertical,
                });
                Ok(())
            })
        },
    ));

    registry.register(Command::new("pane.close", "Close Pane", |ctx, _args| {
        Box::pin(async move {
            let pane = ctx.store.get_state().active_pane().id;
            ctx.store.dispatch(Action::ClosePane { pane });
            Ok(())
        })
    }));
}

fn register_edit(registry: &Arc<CommandRegistry>) {
    registry.register(Command::new("edit.copy", "Copy Selection", |ctx, _args| {
        Box::pin(async move {
            let state = ctx.store.get_state();
            let Some(buffer) = active_buffer(&state) else {
                return Ok(());
            };
            let Some(selection) = buffer.selection.filter(|s| !s.is_empty()) else {
                return Ok(());
            };
            let text = slice_chars(
                &buffer.content,
                selection.start().offset,
                selection.end().offset,
            );
            ctx.clipboard.write_text(&text).await?;
            Ok(())
        })
    }));

    registry.register(Command::new("edit.cut", "Cut Selection", |ctx, _args| {
        Box::pin(async move {
            let state = ctx.store.get_state();
            let Some(buffer) = active_buffer(&state) else {
                return Ok(());
            };
            let Some(selection) = buffer.selection.filter(|s| !s.is_empty()) else {
                return Ok(());
            };
            let (start, end) = (selection.start().offset, selection.end().offset);
            let text = slice_chars(&buffer.content, start, end);
            ctx.clipboard.write_text(&text).await?;

            let content = splice_chars(&buffer.content, start, end, "");
            let cursor = CursorPosition::at_offset(&content, start);
            ctx.store.dispatch(Action::SetBufferContent {
                buffer: buffer.id,
                content,
            });
            ctx.store.dispatch(Action::SetSelection {
                buffer: buffer.id,
                selection: None,
            });
            ctx.store.dispatch(Action::SetCursor {
                buffer: buffer.id,
                cursor,
            });
            Ok(())
        })
    }));

    registry.register(Command::new("edit.paste", "Paste", |ctx, _args| {
        Box::pin(async move {
            let text = ctx.clipboard.read_text().await;
            if text.is_empty() {
                return Ok(());
            }
            let state = ctx.store.get_state();
            let Some(buffer) = active_buffer(&state) else {
                return Ok(());
            };
            // Replace the selection when there is one, insert at the
            // cursor otherwise.
            let (start, end) = match buffer.selection {
                Some(sel) if !sel.is_empty() => (sel.start().offset, sel.end().offset),
                _ => (buffer.cursor.offset, buffer.cursor.offset),
            };
            let content = splice_chars(&buffer.content, start, end, &text);
            let cursor = CursorPosition::at_offset(&content, start + text.chars().count());
            ctx.store.dispatch(Action::SetBufferContent {
                buffer: buffer.id,
                content,
            });
            ctx.store.dispatch(Action::SetSelection {
                buffer: buffer.id,
                selection: None,
            });
            ctx.store.dispatch(Action::SetCursor {
                buffer: buffer.id,
                cursor,
            });
            Ok(())
        })
    }));
}

fn register_workspace(registry: &Arc<CommandRegistry>) {
    registry.register(Command::new("workspace.open", "Open Workspace", |ctx, args| {
        Box::pin(async move {
            let Some(raw) = args.first() else {
                return Err(CommandError::Usage("usage: workspace.open <dir>".into()));
            };
            let path = PathBuf::from(raw);
            if !ctx.fs.is_directory(&path).await {
                return Err(CommandError::Usage(format!(
                    "not a directory: {}",
                    path.display()
                )));
            }
            let tree = ctx.fs.build_tree(&path, 3).await?;
            ctx.store.dispatch(Action::SetWorkspaceRoot {
                root: Some(path.clone()),
            });
            ctx.store.dispatch(Action::SetFileTree { tree: Some(tree) });

            let mut settings = ctx.settings.current().await?;
            settings.remember_workspace(&path.display().to_string());
            ctx.settings.save(&settings).await?;
            Ok(())
        })
    }));

    registry.register(Command::new(
        "explorer.toggle",
        "Toggle Directory",
        |ctx, args| {
            Box::pin(async move {
                let Some(raw) = args.first() else {
                    return Err(CommandError::Usage("usage: explorer.toggle <dir>".into()));
                };
                let path = PathBuf::from(raw);
                let state = ctx.store.get_state();
                let Some(tree) = &state.workspace.tree else {
                    return Err(CommandError::Usage("no workspace open".into()));
                };

                // A collapsed directory that was never listed gets its
                // children built lazily before expanding.
                let needs_children = tree
                    .find(&path)
                    .map(|n| n.is_dir && !n.expanded && n.children.is_empty())
                    .unwrap_or(false);
                if needs_children {
                    let subtree = ctx.fs.build_tree(&path, 1).await?;
                    let grafted = graft(tree, &path, &subtree);
                    ctx.store.dispatch(Action::SetFileTree {
                        tree: Some(grafted),
                    });
                } else {
                    ctx.store.dispatch(Action::ToggleDirExpanded { path });
                }
                Ok(())
            })
        },
    ));
}

fn register_terminal(registry: &Arc<CommandRegistry>) {
    registry.register(Command::new("terminal.open", "Open Terminal", |ctx, args| {
        Box::pin(async move {
            let program = args
                .first()
                .cloned()
                .or_else(|| std::env::var("SHELL").ok())
                .unwrap_or_else(|| "/bin/sh".to_string());
            let state = ctx.store.get_state();
            let cwd = state
                .workspace
                .root
                .clone()
                .unwrap_or_else(|| PathBuf::from("."));

            let session = ctx.processes.spawn_pty(
                &program,
                &[],
                PtyOptions {
                    cwd: Some(cwd.clone()),
                    ..Default::default()
                },
            )?;

            let id = TerminalId(session.id().0);
            let title = program
                .rsplit('/')
                .next()
                .unwrap_or(&program)
                .to_string();
            ctx.store.dispatch(Action::OpenTerminal { id, title, cwd });

            // The session's exit rejoins the state machine; its data
            // stream is forwarded straight to whatever consumer
            // subscribes, never through the store.
            let store = ctx.store.clone();
            let mut events = session.subscribe();
            tokio::spawn(async move {
                loop {
                    match events.recv().await {
                        Ok(PtyEvent::Exit(_)) => {
                            store.dispatch(Action::CloseTerminal { id });
                            break;
                        }
                        Ok(PtyEvent::Data(_)) => {}
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    }
                }
            });
            Ok(())
        })
    }));

    registry.register(Command::new("terminal.close", "Close Terminal", |ctx, _args| {
        Box::pin(async move {
            let state = ctx.store.get_state();
            let Some(terminal) = state.active_terminal() else {
                return Ok(());
            };
            let id = terminal.id;
            // Kill is best-effort: the session may already have exited.
            let _ = ctx.processes.kill(SessionId(id.0));
            ctx.store.dispatch(Action::CloseTerminal { id });
            Ok(())
        })
    }));

    registry.register(Command::new(
        "terminal.write",
        "Write To Terminal",
        |ctx, args| {
            Box::pin(async move {
                let state = ctx.store.get_state();
                let Some(terminal) = state.active_terminal() else {
                    return Err(CommandError::Usage("no active terminal".into()));
                };
                let mut text = args.join(" ");
                text.push('\n');
                ctx.processes.write_to(SessionId(terminal.id.0), &text)?;
                Ok(())
            })
        },
    ));
}

fn register_view(registry: &Arc<CommandRegistry>) {
    registry.register(Command::new(
        "view.commandLine",
        "Show Command Line",
        |ctx, _args| {
            Box::pin(async move {
                ctx.store.dispatch(Action::OpenCommandLine);
                Ok(())
            })
        },
    ));

    registry.register(Command::new(
        "view.palette",
        "Show Command Palette",
        |ctx, _args| {
            Box::pin(async move {
                ctx.store.dispatch(Action::OpenPalette);
                Ok(())
            })
        },
    ));

    registry.register(Command::new(
        "view.filePicker",
        "Show File Picker",
        |ctx, _args| {
            Box::pin(async move {
                ctx.store.dispatch(Action::OpenFilePicker);
                Ok(())
            })
        },
    ));

    registry.register(Command::new(
        "view.themePicker",
        "Show Theme Picker",
        |ctx, _args| {
            Box::pin(async move {
                ctx.store.dispatch(Action::OpenThemePicker);
                Ok(())
            })
        },
    ));

    registry.register(Command::new(
        "view.closeOverlay",
        "Close Overlay",
        |ctx, _args| {
            Box::pin(async move {
                let state = ctx.store.get_state();
                let action = if state.overlays.command_line.open {
                    Action::CloseCommandLine
                } else if state.overlays.palette.open {
                    Action::ClosePalette
                } else if state.overlays.file_picker.open {
                    Action::CloseFilePicker
                } else if state.overlays.theme_picker.open {
                    Action::CloseThemePicker
                } else {
                    return Ok(());
                };
                ctx.store.dispatch(action);
                Ok(())
            })
        },
    ));
}

fn register_misc(registry: &Arc<CommandRegistry>) {
    registry.register(Command::new("theme.set", "Set Theme", |ctx, args| {
        Box::pin(async move {
            let Some(id) = args.first() else {
                return Err(CommandError::Usage("usage: theme.set <id>".into()));
            };
            if Theme::by_id(id).is_none() {
                return Err(CommandError::Usage(format!("unknown theme: {id}")));
            }
            ctx.store.dispatch(Action::SetTheme { id: id.clone() });
            // The choice is durable immediately.
            ctx.settings
                .set("ui.theme", serde_json::Value::String(id.clone()))
                .await?;
            Ok(())
        })
    }));

    registry.register(Command::new(
        "cmdline.execute",
        "Execute Command Line",
        |ctx, args| {
            Box::pin(async move {
                let input = args.join(" ");
                // Whatever happens next, the invoking overlay closes.
                if ctx.store.get_state().overlays.command_line.open {
                    ctx.store.dispatch(Action::CloseCommandLine);
                }
                match parser::parse_command_line(&input) {
                    Ok(parsed) => {
                        let Some(registry) = ctx.registry() else {
                            return Ok(());
                        };
                        // Sequential await; errors were already surfaced
                        // as diagnostics by the inner execution.
                        let _ = registry.execute(parsed.id, parsed.args).await;
                        Ok(())
                    }
                    Err(parser::ParseError::Empty) => Ok(()),
                    Err(parser::ParseError::UnknownCommand(word)) => {
                        ctx.diagnose(
                            vellum_core::Severity::Error,
                            format!("Unknown command: {word}"),
                        );
                        Ok(())
                    }
                }
            })
        },
    ));

    registry.register(Command::new(
        "diagnostics.clear",
        "Clear Diagnostics",
        |ctx, _args| {
            Box::pin(async move {
                ctx.store.dispatch(Action::ClearDiagnostics);
                Ok(())
            })
        },
    ));

    registry.register(Command::new("app.quit", "Quit", |ctx, _args| {
        Box::pin(async move {
            ctx.store.dispatch(Action::RequestQuit);
            Ok(())
        })
    }));
}

/// The buffer behind the active pane's active tab.
fn active_buffer(state: &AppState) -> Option<Arc<Buffer>> {
    let pane = state.active_pane();
    let tab = pane.tab(pane.active_tab?)?;
    state.buffers.get(tab.buffer).cloned()
}

/// Byte index of a character offset, clamped to the end.
fn byte_at(content: &str, char_offset: usize) -> usize {
    content
        .char_indices()
        .nth(char_offset)
        .map(|(i, _)| i)
        .unwrap_or(content.len())
}

fn slice_chars(content: &str, start: usize, end: usize) -> String {
    content[byte_at(content, start)..byte_at(content, end)].to_string()
}

fn splice_chars(content: &str, start: usize, end: usize, insert: &str) -> String {
    let mut out = String::with_capacity(content.len() + insert.len());
    out.push_str(&content[..byte_at(content, start)]);
    out.push_str(insert);
    out.push_str(&content[byte_at(content, end)..]);
    out
}

/// Replaces the node at `target` with `replacement`, sharing every branch
/// that does not contain it.
fn graft(node: &DirNode, target: &Path, replacement: &DirNode) -> DirNode {
    if node.path == target {
        return replacement.clone();
    }
    if !target.starts_with(&node.path) {
        return node.clone();
    }
    let children: Vec<DirNode> = node
        .children
        .iter()
        .map(|c| graft(c, target, replacement))
        .collect();
    DirNode {
        name: node.name.clone(),
        path: node.path.clone(),
        is_dir: node.is_dir,
        expanded: node.expanded,
        children: Arc::new(children),
    }
}
