//! # Vellum Proc
//!
//! Child-process and pseudo-terminal lifecycle management.
//!
//! Two spawn paths with one contract each: [`spawn`](process::spawn) runs
//! a plain child process with piped stdio and a single exit signal;
//! [`ProcessManager::spawn_pty`] runs an interactive session whose output
//! is published as an ordered event stream any number of consumers can
//! subscribe to. `kill` is the only cancellation primitive; there are no
//! automatic timeouts, and a session's lifetime is independent of what the
//! UI currently focuses.

pub mod manager;
pub mod process;
pub mod pty;

pub use manager::ProcessManager;
pub use process::{spawn, ChildProcess, SpawnOptions};
pub use pty::{PtyEvent, PtyOptions, PtySession, SessionId};

/// Errors from process and PTY operations.
#[derive(Debug, thiserror::Error)]
pub enum ProcError {
    #[error("Failed to spawn `{command}`: {reason}")]
    Spawn { command: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown session: {0}")]
    UnknownSession(SessionId),

    #[error("Process already finished")]
    Finished,
}

/// Result type for process operations.
pub type ProcResult<T> = Result<T, ProcError>;
