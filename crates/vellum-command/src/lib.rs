//! # Vellum Command
//!
//! The bridge between user intent and state transitions: a process-wide
//! registry of named asynchronous commands, the modal command-line parser,
//! and the built-in command surface.
//!
//! Command identifiers are dot-namespaced strings (`file.save`,
//! `tab.next`, `theme.set`, …) and are the system's external API:
//! keybindings, the command line and the palette all resolve to them, and
//! external keybinding configuration references them by string, so they
//! stay stable across versions.

pub mod builtins;
pub mod parser;
pub mod registry;

pub use builtins::register_builtins;
pub use parser::{parse_command_line, ParseError, ParsedCommand};
pub use registry::{Command, CommandContext, CommandRegistry};

use vellum_ports::PortError;
use vellum_proc::ProcError;

/// Errors surfaced by command execution. All of these are non-fatal: they
/// land in the diagnostics channel and the application keeps running.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Port(#[from] PortError),

    #[error(transparent)]
    Proc(#[from] ProcError),
}

/// Result type for command execution.
pub type CommandResult<T> = Result<T, CommandError>;
