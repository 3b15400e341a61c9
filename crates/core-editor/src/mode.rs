//! File modes: which operations are legal and how a save materializes.
//!
//! Some operations cannot reasonably be done in certain situations (an
//! insertion into a fixed window would shift bytes the window does not
//! own), so every editor carries a mode answering five questions by match:
//! window start, window end, insert?, delete?, and save strategy.

use core_file::Absolute;
use thiserror::Error;

/// How a save writes pending actions back to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStrategy {
    /// Rebuild the whole file through a temp copy and atomic rename.
    WholeFile,
    /// Write only the window back in place; for spotty files where
    /// rewriting the rest of the file would be wrong.
    InPlaceWindow,
}

/// The closed set of editing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    /// Edit the entire file; insertion and deletion allowed.
    Whole,
    /// Edit `[start, end)` only; no insertion or deletion, whole-file save.
    Partial { start: Absolute, end: Absolute },
    /// Edit `[start, end-of-file)`; insertion and deletion allowed.
    OpenPartial { start: Absolute },
    /// Edit `[start, end)` of a spotty file; saves write the window back
    /// in place and never rebuild the file.
    Spotty { start: Absolute, end: Absolute },
}

impl FileMode {
    pub fn start(&self) -> Option<Absolute> {
        match self {
            FileMode::Whole => None,
            FileMode::Partial { start, .. } => Some(*start),
            FileMode::OpenPartial { start } => Some(*start),
            FileMode::Spotty { start, .. } => Some(*start),
        }
    }

    pub fn end(&self) -> Option<Absolute> {
        match self {
            FileMode::Whole | FileMode::OpenPartial { .. } => None,
            FileMode::Partial { end, .. } => Some(*end),
            FileMode::Spotty { end, .. } => Some(*end),
        }
    }

    pub fn supports_insertion(&self) -> bool {
        matches!(self, FileMode::Whole | FileMode::OpenPartial { .. })
    }

    pub fn supports_deletion(&self) -> bool {
        matches!(self, FileMode::Whole | FileMode::OpenPartial { .. })
    }

    pub fn save_strategy(&self) -> SaveStrategy {
        match self {
            FileMode::Spotty { .. } => SaveStrategy::InPlaceWindow,
            _ => SaveStrategy::WholeFile,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FileMode::Whole => "whole",
            FileMode::Partial { .. } => "partial",
            FileMode::OpenPartial { .. } => "open-partial",
            FileMode::Spotty { .. } => "spotty",
        }
    }
}

/// An operation was requested in a mode that forbids it.
#[derive(Debug, Error)]
pub enum ModeError {
    #[error("insertion is unsupported in {mode} mode")]
    InsertionUnsupported { mode: &'static str },
    #[error("deletion is unsupported in {mode} mode")]
    DeletionUnsupported { mode: &'static str },
}
