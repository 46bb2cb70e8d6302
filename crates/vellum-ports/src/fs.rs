//! File System Port.
//!
//! Directory listings come back sorted directories-first, then
//! lexicographically by name. `build_tree` builds a depth-limited snapshot
//! for the workspace explorer: freshly built directory nodes with
//! remaining depth are marked expanded, nodes at the depth limit are
//! collapsed and filled in lazily later.

use std::path::{Path, PathBuf};
use std::sync::mpsc as std_mpsc;
use std::time::SystemTime;

use async_trait::async_trait;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use vellum_core::DirNode;

use crate::{PortError, PortResult};

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Metadata for a path.
#[derive(Debug, Clone, Copy)]
pub struct FileStat {
    pub is_dir: bool,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

/// A file change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Created(PathBuf),
    Modified(PathBuf),
    Deleted(PathBuf),
}

/// Handle to an active watch; dropping it stops the watcher.
pub struct FsWatcher {
    // Held only to keep the backend alive.
    _watcher: notify::RecommendedWatcher,
    rx: mpsc::Receiver<WatchEvent>,
}

impl FsWatcher {
    /// Waits for the next change event; `None` once the watcher closes.
    pub async fn recv(&mut self) -> Option<WatchEvent> {
        self.rx.recv().await
    }
}

/// The file system contract consumed by the command layer.
#[async_trait]
pub trait FileSystemPort: Send + Sync {
    async fn read_file(&self, path: &Path) -> PortResult<String>;
    async fn write_file(&self, path: &Path, contents: &str) -> PortResult<()>;
    async fn list_directory(&self, path: &Path) -> PortResult<Vec<DirEntry>>;
    async fn build_tree(&self, path: &Path, depth: usize) -> PortResult<DirNode>;
    async fn exists(&self, path: &Path) -> bool;
    async fn is_directory(&self, path: &Path) -> bool;
    async fn stat(&self, path: &Path) -> PortResult<FileStat>;
    async fn mkdir(&self, path: &Path) -> PortResult<()>;
    async fn remove(&self, path: &Path) -> PortResult<()>;
    async fn rename(&self, from: &Path, to: &Path) -> PortResult<()>;
    fn watch(&self, path: &Path) -> PortResult<FsWatcher>;
}

/// Default implementation over the local disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileSystemPort for LocalFs {
    async fn read_file(&self, path: &Path) -> PortResult<String> {
        Ok(tokio::fs::read_to_string(path).await?)
    }

    async fn write_file(&self, path: &Path, contents: &str) -> PortResult<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(tokio::fs::write(path, contents).await?)
    }

    async fn list_directory(&self, path: &Path) -> PortResult<Vec<DirEntry>> {
        if !tokio::fs::metadata(path).await?.is_dir() {
            return Err(PortError::NotADirectory(path.display().to_string()));
        }
        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(path).await?;
        while let Some(entry) = dir.next_entry().await? {
            let file_type = entry.file_type().await?;
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                path: entry.path(),
                is_dir: file_type.is_dir(),
            });
        }
        sort_entries(&mut entries);
        Ok(entries)
    }

    async fn build_tree(&self, path: &Path, depth: usize) -> PortResult<DirNode> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || build_node(&path, depth))
            .await
            .map_err(|e| PortError::Io(std::io::Error::other(e)))?
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn is_directory(&self, path: &Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    async fn stat(&self, path: &Path) -> PortResult<FileStat> {
        let meta = tokio::fs::metadata(path).await?;
        Ok(FileStat {
            is_dir: meta.is_dir(),
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }

    async fn mkdir(&self, path: &Path) -> PortResult<()> {
        Ok(tokio::fs::create_dir_all(path).await?)
    }

    async fn remove(&self, path: &Path) -> PortResult<()> {
        let meta = tokio::fs::metadata(path).await?;
        if meta.is_dir() {
            Ok(tokio::fs::remove_dir_all(path).await?)
        } else {
            Ok(tokio::fs::remove_file(path).await?)
        }
    }

    async fn rename(&self, from: &Path, to: &Path) -> PortResult<()> {
        Ok(tokio::fs::rename(from, to).await?)
    }

    fn watch(&self, path: &Path) -> PortResult<FsWatcher> {
        let (tx, rx) = mpsc::channel(100);
        // notify delivers on its own thread; bridge into the async world
        // through a std channel drained by a forwarding task.
        let (raw_tx, raw_rx) = std_mpsc::channel::<WatchEvent>();

        let mut watcher =
            notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    for path in event.paths {
                        let change = match event.kind {
                            EventKind::Create(_) => WatchEvent::Created(path),
                            EventKind::Modify(_) => WatchEvent::Modified(path),
                            EventKind::Remove(_) => WatchEvent::Deleted(path),
                            _ => continue,
                        };
                        let _ = raw_tx.send(change);
                    }
                }
            })
            .map_err(|e| PortError::Watch(e.to_string()))?;

        watcher
            .watch(path, RecursiveMode::Recursive)
            .map_err(|e| PortError::Watch(e.to_string()))?;

        tokio::task::spawn_blocking(move || {
            while let Ok(event) = raw_rx.recv() {
                if tx.blocking_send(event).is_err() {
                    break;
                }
            }
        });

        Ok(FsWatcher { _watcher: watcher, rx })
    }
}

fn sort_entries(entries: &mut [DirEntry]) {
    entries.sort_by(|a, b| match (a.is_dir, b.is_dir) {
        (true, false) => std::cmp::Ordering::Less,
        (false, true) => std::cmp::Ordering::Greater,
        _ => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
    });
}

/// Entries skipped when building the explorer snapshot.
fn is_ignored(name: &str) -> bool {
    name.starts_with('.') || name == "node_modules" || name == "target" || name == "__pycache__"
}

fn build_node(path: &Path, depth: usize) -> PortResult<DirNode> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let meta = std::fs::metadata(path)?;
    if meta.is_file() {
        return Ok(DirNode::file(name, path));
    }

    let mut children = Vec::new();
    if depth > 0 {
        let mut listed: Vec<DirEntry> = std::fs::read_dir(path)?
            .flatten()
            .filter(|e| !is_ignored(&e.file_name().to_string_lossy()))
            .map(|e| {
                let is_dir = e.file_type().map(|t| t.is_dir()).unwrap_or(false);
                DirEntry {
                    name: e.file_name().to_string_lossy().to_string(),
                    path: e.path(),
                    is_dir,
                }
            })
            .collect();
        sort_entries(&mut listed);
        for entry in listed {
            if let Ok(child) = build_node(&entry.path, depth.saturating_sub(1)) {
                children.push(child);
            }
        }
    }

    Ok(DirNode::directory(name, path, depth > 0, children))
}
