//! Pseudo-terminal sessions.
//!
//! A session's output is an explicit event stream: zero or more `Data`
//! fragments in byte order, terminated by exactly one `Exit`. Any number
//! of consumers may subscribe, before or after output starts; a consumer
//! attached late sees events from its subscription point forward, never a
//! replay. A fragment is delivered whole, never split or reordered
//! relative to itself. No ordering holds *between* different sessions.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use portable_pty::{
    native_pty_system, Child as _, ChildKiller, CommandBuilder, MasterPty, PtySize,
    PtySystem as _, SlavePty as _,
};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{ProcError, ProcResult};

/// Unique identity of a spawned process or PTY session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Options for spawning a PTY session.
#[derive(Debug, Clone)]
pub struct PtyOptions {
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
    pub cols: u16,
    pub rows: u16,
}

impl Default for PtyOptions {
    fn default() -> Self {
        Self {
            cwd: None,
            env: Vec::new(),
            cols: 80,
            rows: 24,
        }
    }
}

/// One event on a session's output stream.
#[derive(Debug, Clone)]
pub enum PtyEvent {
    /// A decoded output fragment, in production order.
    Data(String),
    /// The session ended. Delivered exactly once, after all data.
    Exit(i32),
}

/// An interactive pseudo-terminal session.
pub struct PtySession {
    id: SessionId,
    events: broadcast::Sender<PtyEvent>,
    writer: Mutex<Box<dyn Write + Send>>,
    master: Mutex<Box<dyn MasterPty + Send>>,
    killer: Mutex<Box<dyn ChildKiller + Send + Sync>>,
}

impl PtySession {
    /// Launches `command` on a fresh PTY. A failed launch is a returned
    /// error, never an empty handle.
    pub fn spawn(command: &str, args: &[String], options: PtyOptions) -> ProcResult<PtySession> {
        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows: options.rows,
                cols: options.cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| ProcError::Spawn {
                command: command.to_string(),
                reason: e.to_string(),
            })?;

        let mut builder = CommandBuilder::new(command);
        builder.args(args);
        if let Some(cwd) = &options.cwd {
            builder.cwd(cwd);
        }
        for (k, v) in &options.env {
            builder.env(k, v);
        }

        let mut child = pair
            .slave
            .spawn_command(builder)
            .map_err(|e| ProcError::Spawn {
                command: command.to_string(),
                reason: e.to_string(),
            })?;
        // The slave side lives on in the child.
        drop(pair.slave);

        let killer = child.clone_killer();
        let mut reader = pair.master.try_clone_reader().map_err(|e| ProcError::Spawn {
            command: command.to_string(),
            reason: e.to_string(),
        })?;
        let writer = pair.master.take_writer().map_err(|e| ProcError::Spawn {
            command: command.to_string(),
            reason: e.to_string(),
        })?;

        let (events, _) = broadcast::channel(512);
        let events_tx = events.clone();
        let id = SessionId::new();

        // Blocking reader thread: output order is preserved because a
        // single thread both reads and publishes. After EOF the child is
        // reaped and the stream terminates with one Exit event.
        std::thread::spawn(move || {
            let mut buf = [0u8; 4096];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        let chunk = String::from_utf8_lossy(&buf[..n]).to_string();
                        // No subscribers yet is fine; late subscribers
                        // simply start from their subscription point.
                        let _ = events_tx.send(PtyEvent::Data(chunk));
                    }
                }
            }
            let code = child
                .wait()
                .map(|status| status.exit_code() as i32)
                .unwrap_or(-1);
            let _ = events_tx.send(PtyEvent::Exit(code));
        });

        Ok(PtySession {
            id,
            events,
            writer: Mutex::new(writer),
            master: Mutex::new(pair.master),
            killer: Mutex::new(killer),
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Subscribes to the output stream from this point forward.
    pub fn subscribe(&self) -> broadcast::Receiver<PtyEvent> {
        self.events.subscribe()
    }

    /// Writes input to the session.
    pub fn write(&self, text: &str) -> ProcResult<()> {
        let mut writer = self.writer.lock().expect("pty writer lock poisoned");
        writer.write_all(text.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    /// Propagates new terminal dimensions. Geometry is best-effort: a
    /// resize the backend cannot honor is a safe no-op.
    pub fn resize(&self, cols: u16, rows: u16) {
        let master = self.master.lock().expect("pty master lock poisoned");
        if let Err(e) = master.resize(PtySize {
            rows,
            cols,
            pixel_width: 0,
            pixel_height: 0,
        }) {
            tracing::debug!(session = %self.id, "pty resize not honored: {e}");
        }
    }

    /// Terminates the session's process. Killing an already finished
    /// session is a no-op.
    pub fn kill(&self) {
        let mut killer = self.killer.lock().expect("pty killer lock poisoned");
        if let Err(e) = killer.kill() {
            tracing::debug!(session = %self.id, "pty kill: {e}");
        }
    }
}
