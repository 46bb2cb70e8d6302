//! Session table for live PTY sessions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::process::{spawn, ChildProcess, SpawnOptions};
use crate::pty::{PtyEvent, PtyOptions, PtySession, SessionId};
use crate::{ProcError, ProcResult};

/// Tracks live PTY sessions by id so commands can address them, and
/// reaps table entries when a session exits. Plain child processes are
/// not tracked; their handle is the only owner.
#[derive(Default)]
pub struct ProcessManager {
    sessions: Mutex<HashMap<SessionId, Arc<PtySession>>>,
}

impl ProcessManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Launches a plain child process. Pass-through to [`spawn`].
    pub fn spawn(
        &self,
        command: &str,
        args: &[String],
        options: SpawnOptions,
    ) -> ProcResult<ChildProcess> {
        spawn(command, args, options)
    }

    /// Launches a PTY session and registers it in the table. The entry
    /// is removed automatically once the session's exit event fires.
    pub fn spawn_pty(
        self: &Arc<Self>,
        command: &str,
        args: &[String],
        options: PtyOptions,
    ) -> ProcResult<Arc<PtySession>> {
        let session = Arc::new(PtySession::spawn(command, args, options)?);
        let id = session.id();
        self.sessions
            .lock()
            .expect("session table lock poisoned")
            .insert(id, session.clone());

        let manager = Arc::downgrade(self);
        let mut events = session.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(PtyEvent::Exit(code)) => {
                        tracing::debug!(session = %id, code, "pty session exited");
                        break;
                    }
                    Ok(PtyEvent::Data(_)) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            if let Some(manager) = manager.upgrade() {
                manager.remove(id);
            }
        });

        Ok(session)
    }

    /// Looks up a live session.
    pub fn session(&self, id: SessionId) -> Option<Arc<PtySession>> {
        self.sessions
            .lock()
            .expect("session table lock poisoned")
            .get(&id)
            .cloned()
    }

    /// Writes input to a session by id.
    pub fn write_to(&self, id: SessionId, text: &str) -> ProcResult<()> {
        self.session(id)
            .ok_or(ProcError::UnknownSession(id))?
            .write(text)
    }

    /// Resizes a session by id; unknown sessions and unsupported
    /// backends are both safe no-ops.
    pub fn resize(&self, id: SessionId, cols: u16, rows: u16) {
        if let Some(session) = self.session(id) {
            session.resize(cols, rows);
        }
    }

    /// Kills a session by id.
    pub fn kill(&self, id: SessionId) -> ProcResult<()> {
        self.session(id)
            .ok_or(ProcError::UnknownSession(id))?
            .kill();
        Ok(())
    }

    /// Ids of all live sessions.
    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions
            .lock()
            .expect("session table lock poisoned")
            .keys()
            .copied()
            .collect()
    }

    /// Kills every live session. Used on shutdown.
    pub fn kill_all(&self) {
        for id in self.session_ids() {
            let _ = self.kill(id);
        }
    }

    fn remove(&self, id: SessionId) {
        self.sessions
            .lock()
            .expect("session table lock poisoned")
            .remove(&id);
    }
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sessions_are_tracked_until_exit() {
        let manager = Arc::new(ProcessManager::new());
        let session = manager
            .spawn_pty("cat", &[], PtyOptions::default())
            .unwrap();
        let id = session.id();
        assert!(manager.session(id).is_some());

        manager.kill(id).unwrap();
        // The reaper task removes the entry once the exit event lands.
        for _ in 0..100 {
            if manager.session(id).is_none() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }
        panic!("session was not reaped after exit");
    }

    #[tokio::test]
    async fn write_to_unknown_session_is_an_error() {
        let manager = Arc::new(ProcessManager::new());
        let ghost = SessionId::new();
        assert!(matches!(
            manager.write_to(ghost, "x"),
            Err(ProcError::UnknownSession(_))
        ));
        // Resize of an unknown session is the documented no-op.
        manager.resize(ghost, 80, 24);
    }
}
