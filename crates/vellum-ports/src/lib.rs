//! # Vellum Ports
//!
//! The narrow contracts through which the engine reaches the outside
//! world: file system, clipboard and settings. Each port is a trait plus
//! a default implementation; commands hold ports as trait objects so
//! tests can substitute in-memory versions.
//!
//! Ports are stateless from the store's point of view, except for the
//! settings cache, which is read-through: a miss triggers a full reload
//! before the first read.

pub mod clipboard;
pub mod fs;
pub mod settings;

pub use clipboard::{ClipboardPort, MemoryClipboard, SystemClipboard};
pub use fs::{DirEntry, FileStat, FileSystemPort, FsWatcher, LocalFs, WatchEvent};
pub use settings::{JsonSettings, SettingsPort};

/// Errors surfaced by port operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config directory not found")]
    NoConfigDir,

    #[error("Watch error: {0}")]
    Watch(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Unknown settings key: {0}")]
    UnknownKey(String),
}

/// Result type for port operations.
pub type PortResult<T> = Result<T, PortError>;
