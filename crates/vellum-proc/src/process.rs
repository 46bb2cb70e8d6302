//! Plain child processes with piped stdio.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};

use crate::pty::SessionId;
use crate::{ProcError, ProcResult};

/// Options for [`spawn`].
#[derive(Debug, Clone, Default)]
pub struct SpawnOptions {
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

/// Handle to a spawned child process.
///
/// Output and error chunks arrive on separate channels in production
/// order; the exit code is delivered exactly once through [`wait`].
/// A non-zero exit code is data, not an error; callers decide what it
/// means.
///
/// [`wait`]: ChildProcess::wait
pub struct ChildProcess {
    pub id: SessionId,
    /// OS process id, when the child started far enough to have one.
    pub pid: Option<u32>,
    pub stdout: mpsc::Receiver<String>,
    pub stderr: mpsc::Receiver<String>,
    stdin: Option<tokio::process::ChildStdin>,
    exit: Option<oneshot::Receiver<i32>>,
    exit_code: Option<i32>,
    kill_tx: Option<oneshot::Sender<()>>,
}

impl ChildProcess {
    /// Writes to the child's stdin.
    pub async fn write(&mut self, data: &str) -> ProcResult<()> {
        let stdin = self.stdin.as_mut().ok_or(ProcError::Finished)?;
        stdin.write_all(data.as_bytes()).await?;
        stdin.flush().await?;
        Ok(())
    }

    /// Closes the child's stdin, signalling end of input.
    pub fn close_stdin(&mut self) {
        self.stdin.take();
    }

    /// Requests termination. Safe to call more than once.
    pub fn kill(&mut self) {
        if let Some(tx) = self.kill_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Waits for the exit code. Subsequent calls return the same code.
    pub async fn wait(&mut self) -> ProcResult<i32> {
        if let Some(code) = self.exit_code {
            return Ok(code);
        }
        let rx = self.exit.take().ok_or(ProcError::Finished)?;
        let code = rx.await.map_err(|_| ProcError::Finished)?;
        self.exit_code = Some(code);
        Ok(code)
    }
}

/// Launches a child process. A failed launch is a returned error, never
/// an empty handle.
pub fn spawn(
    command: &str,
    args: &[String],
    options: SpawnOptions,
) -> ProcResult<ChildProcess> {
    let mut cmd = Command::new(command);
    cmd.args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }
    for (k, v) in &options.env {
        cmd.env(k, v);
    }

    let mut child = cmd.spawn().map_err(|e| ProcError::Spawn {
        command: command.to_string(),
        reason: e.to_string(),
    })?;

    let id = SessionId::new();
    let pid = child.id();
    let stdin = child.stdin.take();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let (stdout_tx, stdout_rx) = mpsc::channel(64);
    let (stderr_tx, stderr_rx) = mpsc::channel(64);
    let (exit_tx, exit_rx) = oneshot::channel();
    let (kill_tx, mut kill_rx) = oneshot::channel::<()>();

    if let Some(out) = stdout {
        tokio::spawn(forward_chunks(out, stdout_tx));
    }
    if let Some(err) = stderr {
        tokio::spawn(forward_chunks(err, stderr_tx));
    }

    tokio::spawn(async move {
        let status = tokio::select! {
            status = child.wait() => status,
            _ = &mut kill_rx => {
                if let Err(e) = child.start_kill() {
                    tracing::debug!("kill failed: {e}");
                }
                child.wait().await
            }
        };
        let code = status
            .ok()
            .and_then(|s| s.code())
            .unwrap_or(-1);
        let _ = exit_tx.send(code);
    });

    Ok(ChildProcess {
        id,
        pid,
        stdout: stdout_rx,
        stderr: stderr_rx,
        stdin,
        exit: Some(exit_rx),
        exit_code: None,
        kill_tx: Some(kill_tx),
    })
}

async fn forward_chunks(
    mut reader: impl tokio::io::AsyncRead + Unpin,
    tx: mpsc::Sender<String>,
) {
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let chunk = String::from_utf8_lossy(&buf[..n]).to_string();
                if tx.send(chunk).await.is_err() {
                    break;
                }
            }
        }
    }
}
