//! Raw file access for the hexed editing core.
//!
//! Leaf crate of the workspace: position newtypes, the seek-and-read /
//! seek-and-write [`RawFile`] handle with its in-place shift primitives,
//! and the [`ConstrainedFile`] view that restricts a file to a half-open
//! byte window. Higher layers (action log, block cache, editor facade)
//! build on these without ever touching `std::fs` themselves.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

mod position;
mod raw;
mod window;

pub use position::{Absolute, Natural, Relative};
pub use raw::{OpenFlags, RawFile};
pub use window::ConstrainedFile;

/// Filesystem node types that cannot be edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnopenableKind {
    Directory,
    CharacterDevice,
    Fifo,
    Socket,
}

impl std::fmt::Display for UnopenableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            UnopenableKind::Directory => "directory",
            UnopenableKind::CharacterDevice => "character device",
            UnopenableKind::Fifo => "fifo",
            UnopenableKind::Socket => "socket",
        };
        f.write_str(name)
    }
}

/// Structural failures raised when opening a file for editing.
#[derive(Debug, Error)]
pub enum OpenError {
    #[error("file does not exist: {}", .0.display())]
    FileDoesNotExist(PathBuf),
    #[error("cannot open {kind}: {}", path.display())]
    Unopenable { path: PathBuf, kind: UnopenableKind },
    #[error(transparent)]
    Range(#[from] RangeError),
    #[error("failed to open {}: {source}", path.display())]
    Unknown {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Window violations, raised at construction (bad span) or per call
/// (position outside the window).
#[derive(Debug, Error)]
pub enum RangeError {
    #[error("natural position {position} translates past the window end {end}")]
    PositionOutOfRange { position: usize, end: usize },
    #[error("zero-span window at offset {at}")]
    ZeroSpan { at: usize },
    #[error("window start {start} is past its end {end}")]
    InvertedWindow { start: usize, end: usize },
}

/// An I/O failure during a read, distinguishable from a plain short read
/// at end of file (which is not an error).
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("failed to read file data: {0}")]
    Io(#[from] io::Error),
}
