//! Buffers and the buffer table.
//!
//! A buffer is the in-memory representation of a file (or untitled
//! document): opaque content plus separately tracked cursor/selection
//! metadata. Buffers are reference-counted by the tabs pointing at them,
//! not owned by any single tab; the reducer removes a buffer in the same
//! transition that removes its last referencing tab.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::language::language_for_path;

/// Unique identifier for a buffer.
///
/// Allocated from the monotonic counter carried inside [`crate::AppState`],
/// so the reducer stays deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BufferId(pub u64);

impl std::fmt::Display for BufferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "buffer-{}", self.0)
    }
}

/// A position in buffer content.
///
/// Line and column are 0-indexed; `offset` is the absolute character
/// offset. All three are kept consistent by construction: positions are
/// derived from content via [`CursorPosition::at_offset`] rather than
/// mutated field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CursorPosition {
    /// Line number (0-indexed)
    pub line: usize,
    /// Column number (0-indexed, in characters)
    pub column: usize,
    /// Absolute character offset from the start of the content
    pub offset: usize,
}

impl CursorPosition {
    /// Position at the start of a buffer.
    pub const ZERO: CursorPosition = CursorPosition {
        line: 0,
        column: 0,
        offset: 0,
    };

    /// Derives the full (line, column, offset) triple for a character
    /// offset into `content`. Offsets past the end clamp to the end.
    pub fn at_offset(content: &str, offset: usize) -> Self {
        let mut line = 0;
        let mut column = 0;
        let mut seen = 0;
        for ch in content.chars() {
            if seen == offset {
                break;
            }
            seen += 1;
            if ch == '\n' {
                line += 1;
                column = 0;
            } else {
                column += 1;
            }
        }
        Self {
            line,
            column,
            offset: seen,
        }
    }
}

impl std::fmt::Display for CursorPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // 1-indexed for user-facing output
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

/// A selection: anchor plus focus cursor pair.
///
/// The anchor is where the selection started; the focus is the moving end.
/// Either order is valid, `start`/`end` normalize on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: CursorPosition,
    pub focus: CursorPosition,
}

impl Selection {
    pub fn new(anchor: CursorPosition, focus: CursorPosition) -> Self {
        Self { anchor, focus }
    }

    /// The earlier end of the selection.
    pub fn start(&self) -> CursorPosition {
        if self.anchor.offset <= self.focus.offset {
            self.anchor
        } else {
            self.focus
        }
    }

    /// The later end of the selection.
    pub fn end(&self) -> CursorPosition {
        if self.anchor.offset <= self.focus.offset {
            self.focus
        } else {
            self.anchor
        }
    }

    /// Zero-width selections carry no text.
    pub fn is_empty(&self) -> bool {
        self.anchor.offset == self.focus.offset
    }
}

/// In-memory state of one open file or untitled document.
#[derive(Debug, Clone)]
pub struct Buffer {
    /// Unique identifier
    pub id: BufferId,

    /// Backing file path (`None` for untitled buffers)
    pub path: Option<PathBuf>,

    /// Current content
    pub content: String,

    /// Content as of the last load or save; the dirty flag is always
    /// recomputed against this baseline, never stored sticky.
    pub saved_text: String,

    /// Language tag inferred from the file extension
    pub language: Option<String>,

    /// Cursor position
    pub cursor: CursorPosition,

    /// Active selection, if any
    pub selection: Option<Selection>,
}

impl Buffer {
    /// Creates an empty buffer for a file path. Content arrives later via
    /// a `BufferLoaded` transition once the read completes.
    pub fn for_path(id: BufferId, path: &Path) -> Self {
        Self {
            id,
            path: Some(path.to_path_buf()),
            content: String::new(),
            saved_text: String::new(),
            language: language_for_path(path).map(str::to_string),
            cursor: CursorPosition::ZERO,
            selection: None,
        }
    }

    /// Creates an untitled scratch buffer.
    pub fn untitled(id: BufferId) -> Self {
        Self {
            id,
            path: None,
            content: String::new(),
            saved_text: String::new(),
            language: None,
            cursor: CursorPosition::ZERO,
            selection: None,
        }
    }

    /// True when content differs from the last loaded/saved value.
    pub fn is_dirty(&self) -> bool {
        self.content != self.saved_text
    }

    /// Display label: final path segment, or "untitled".
    pub fn label(&self) -> String {
        self.path
            .as_deref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "untitled".to_string())
    }
}

/// Mapping from buffer identity to buffer state.
///
/// Values are `Arc`-wrapped so cloning the table for a new snapshot shares
/// buffer contents; replacing one entry leaves the rest untouched.
#[derive(Debug, Clone, Default)]
pub struct BufferTable {
    entries: std::collections::HashMap<BufferId, Arc<Buffer>>,
}

impl BufferTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: BufferId) -> Option<&Arc<Buffer>> {
        self.entries.get(&id)
    }

    pub fn insert(&mut self, buffer: Buffer) {
        self.entries.insert(buffer.id, Arc::new(buffer));
    }

    pub fn remove(&mut self, id: BufferId) -> Option<Arc<Buffer>> {
        self.entries.remove(&id)
    }

    /// Finds the buffer already backed by `path`, if the file is open.
    pub fn find_by_path(&self, path: &Path) -> Option<BufferId> {
        self.entries
            .values()
            .find(|b| b.path.as_deref() == Some(path))
            .map(|b| b.id)
    }

    /// Replaces one buffer through a pure updater, leaving the other
    /// entries shared.
    pub fn update(&mut self, id: BufferId, f: impl FnOnce(&Buffer) -> Buffer) -> bool {
        let Some(current) = self.entries.get(&id) else {
            return false;
        };
        let next = f(current.as_ref());
        self.entries.insert(id, Arc::new(next));
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Buffer>> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
