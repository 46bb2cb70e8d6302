//! Clipboard Port.
//!
//! `read_text` never fails: an unavailable clipboard yields an empty
//! string. Writes report failure to the caller.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::PortResult;

/// The clipboard contract consumed by the command layer.
#[async_trait]
pub trait ClipboardPort: Send + Sync {
    /// The current clipboard text; empty when unavailable.
    async fn read_text(&self) -> String;
    async fn write_text(&self, text: &str) -> PortResult<()>;
}

/// System clipboard via `arboard`.
///
/// The backend handle is created lazily and kept for the process
/// lifetime; environments without a clipboard (headless CI) degrade to
/// the empty-string contract instead of erroring.
pub struct SystemClipboard {
    inner: Mutex<Option<arboard::Clipboard>>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    fn with_clipboard<T>(&self, f: impl FnOnce(&mut arboard::Clipboard) -> T) -> Option<T> {
        let mut guard = self.inner.lock().ok()?;
        if guard.is_none() {
            match arboard::Clipboard::new() {
                Ok(clipboard) => *guard = Some(clipboard),
                Err(e) => {
                    tracing::debug!("clipboard unavailable: {e}");
                    return None;
                }
            }
        }
        guard.as_mut().map(f)
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClipboardPort for SystemClipboard {
    async fn read_text(&self) -> String {
        self.with_clipboard(|c| c.get_text().unwrap_or_default())
            .unwrap_or_default()
    }

    async fn write_text(&self, text: &str) -> PortResult<()> {
        let result = self.with_clipboard(|c| c.set_text(text.to_string()));
        match result {
            Some(Ok(())) => Ok(()),
            Some(Err(e)) => Err(crate::PortError::Io(std::io::Error::other(e.to_string()))),
            // No clipboard to write to; match the read contract and
            // treat it as best-effort.
            None => Ok(()),
        }
    }
}

/// In-memory clipboard for tests and headless runs.
#[derive(Default)]
pub struct MemoryClipboard {
    text: Mutex<String>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClipboardPort for MemoryClipboard {
    async fn read_text(&self) -> String {
        self.text.lock().map(|t| t.clone()).unwrap_or_default()
    }

    async fn write_text(&self, text: &str) -> PortResult<()> {
        if let Ok(mut guard) = self.text.lock() {
            *guard = text.to_string();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_clipboard_round_trips() {
        let clip = MemoryClipboard::new();
        assert_eq!(clip.read_text().await, "");
        clip.write_text("copied").await.unwrap();
        assert_eq!(clip.read_text().await, "copied");
    }
}
