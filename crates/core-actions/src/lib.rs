//! Edit actions and their versioned log.
//!
//! Edits never touch the backing file directly: they accumulate as
//! [`Action`] values in an [`ActionLog`] overlaying the file, and are
//! materialized to disk only when a save replays them. An action answers
//! three questions: where should a read really look
//! ([`Action::reverse_position`]), how much does it change the file size
//! ([`Action::size_delta`]), and how does it write itself out
//! ([`Action::materialize`]).
//!
//! The three primitive actions are plain data; undo and redo do not touch
//! the file either, they only move the log cursor. `Bundled` groups
//! children into one atomic history entry.

use std::io;
use tracing::trace;

use core_file::{Absolute, Natural, RawFile, Relative};

mod log;
mod observer;

pub use log::ActionLog;
pub use observer::{EditObserver, FnEditObserver, NoopEditObserver};

/// Chunk size the materializers hand to the shift primitives. Balances
/// carry-buffer memory against syscall count; correctness does not depend
/// on the value.
pub const DEFAULT_CHUNK_SIZE: usize = 120;

/// Byte value an insertion exposes before anything overwrites the gap.
pub const INSERTION_FILL: u8 = 0x00;

/// Outcome of undoing a history entry.
///
/// Anything other than `Success` is some form of failure (or partial
/// failure); check with `!= UndoStatus::Success`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoStatus {
    Success,
    UnknownFailure,
    /// There is nothing to undo.
    Nothing,
    /// The entry at the cursor cannot be undone.
    Unable,
    /// Undoing failed partway and rollback failed too; the entry is
    /// neither applied nor unapplied.
    InvalidState,
}

/// Outcome of redoing a history entry. Same taxonomy as [`UndoStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedoStatus {
    Success,
    UnknownFailure,
    Nothing,
    Unable,
    InvalidState,
}

/// First-run application shares the redo path, so it shares the status.
pub type ActionStatus = RedoStatus;

/// Result of threading a read position through an action: either the
/// action itself supplies the byte, or the position is rewritten to the
/// coordinate the next-older layer should be asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    Byte(u8),
    Position(Natural),
}

/// One entry of edit history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Replace `data.len()` bytes starting at `position`.
    Edit { position: Natural, data: Vec<u8> },
    /// Insert `amount` null bytes before `position`.
    Insertion { position: Natural, amount: usize },
    /// Remove `amount` bytes starting at `position`.
    Deletion { position: Natural, amount: usize },
    /// An atomic group, undone and resolved as one unit.
    Bundled { children: Vec<Action> },
}

impl Action {
    /// Translate a read position back through this action. See the module
    /// docs; `Bundled` consults its children newest-first.
    pub fn reverse_position(&self, read_pos: Natural) -> Resolved {
        match self {
            Action::Edit { position, data } => {
                if data.is_empty() {
                    return Resolved::Position(read_pos);
                }
                if read_pos >= *position && read_pos < *position + Relative::new(data.len()) {
                    Resolved::Byte(data[(read_pos - *position).get()])
                } else {
                    Resolved::Position(read_pos)
                }
            }
            Action::Insertion { position, amount } => {
                if read_pos >= *position && read_pos < *position + Relative::new(*amount) {
                    Resolved::Byte(INSERTION_FILL)
                } else if read_pos >= *position {
                    Resolved::Position(read_pos - Relative::new(*amount))
                } else {
                    Resolved::Position(read_pos)
                }
            }
            Action::Deletion { position, amount } => {
                if read_pos >= *position {
                    Resolved::Position(read_pos + Relative::new(*amount))
                } else {
                    Resolved::Position(read_pos)
                }
            }
            Action::Bundled { children } => {
                let mut pos = read_pos;
                for child in children.iter().rev() {
                    match child.reverse_position(pos) {
                        Resolved::Byte(b) => return Resolved::Byte(b),
                        Resolved::Position(p) => pos = p,
                    }
                }
                Resolved::Position(pos)
            }
        }
    }

    /// Net change this action makes to the file size.
    pub fn size_delta(&self) -> isize {
        match self {
            Action::Edit { .. } => 0,
            Action::Insertion { amount, .. } => *amount as isize,
            Action::Deletion { amount, .. } => -(*amount as isize),
            Action::Bundled { children } => children.iter().map(Action::size_delta).sum(),
        }
    }

    /// Write this action into `file`. `origin` is where the view's natural
    /// position zero sits in that file, so a windowed view replays at the
    /// right absolute offsets.
    pub fn materialize(
        &self,
        file: &mut RawFile,
        origin: Absolute,
        chunk_size: usize,
    ) -> io::Result<()> {
        let translate = |pos: &Natural| Absolute::new(origin.get() + pos.get());
        match self {
            Action::Edit { position, data } => file.write_at(translate(position), data),
            Action::Insertion { position, amount } => {
                file.insert_zeroed(translate(position), *amount, chunk_size)
            }
            Action::Deletion { position, amount } => {
                file.shift_delete(translate(position), *amount, chunk_size)
            }
            Action::Bundled { children } => {
                for child in children {
                    child.materialize(file, origin, chunk_size)?;
                }
                Ok(())
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        match self {
            Action::Bundled { children } => children.iter().all(Action::can_undo),
            _ => true,
        }
    }

    pub fn can_redo(&self) -> bool {
        match self {
            Action::Bundled { children } => children.iter().all(Action::can_redo),
            _ => true,
        }
    }

    /// The primitives exist only to store data, so undoing them is moving
    /// the log cursor; the interesting case is `Bundled`, which unwinds its
    /// children newest-first and rolls forward again if one of them fails.
    pub fn undo(&mut self) -> UndoStatus {
        match self {
            Action::Bundled { children } => {
                if !children.iter().all(Action::can_undo) {
                    return UndoStatus::Unable;
                }
                for i in (0..children.len()).rev() {
                    let status = children[i].undo();
                    if status != UndoStatus::Success {
                        // Roll the already-undone tail forward again.
                        for child in children[i + 1..].iter_mut() {
                            if child.redo() != RedoStatus::Success {
                                return UndoStatus::InvalidState;
                            }
                        }
                        return status;
                    }
                }
                UndoStatus::Success
            }
            _ => UndoStatus::Success,
        }
    }

    pub fn redo(&mut self) -> RedoStatus {
        match self {
            Action::Bundled { children } => {
                if !children.iter().all(Action::can_redo) {
                    return RedoStatus::Unable;
                }
                for i in 0..children.len() {
                    let status = children[i].redo();
                    if status != RedoStatus::Success {
                        for child in children[..i].iter_mut().rev() {
                            if child.undo() != UndoStatus::Success {
                                return RedoStatus::InvalidState;
                            }
                        }
                        return status;
                    }
                }
                RedoStatus::Success
            }
            _ => RedoStatus::Success,
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Action::Edit { .. } => "edit",
            Action::Insertion { .. } => "insertion",
            Action::Deletion { .. } => "deletion",
            Action::Bundled { .. } => "bundled",
        }
    }
}

impl Action {
    /// Helper for the pattern-tiling insert: an insertion bundled with an
    /// edit whose payload repeats `pattern` across `amount` bytes.
    pub fn insertion_with_pattern(position: Natural, amount: usize, pattern: &[u8]) -> Action {
        debug_assert!(!pattern.is_empty(), "pattern must have at least one byte");
        let mut data = Vec::with_capacity(amount);
        for i in 0..amount {
            data.push(pattern[i % pattern.len()]);
        }
        trace!(
            target: "actions.log",
            position = position.get(),
            amount,
            pattern_len = pattern.len(),
            "bundled_pattern_insertion"
        );
        Action::Bundled {
            children: vec![
                Action::Insertion { position, amount },
                Action::Edit { position, data },
            ],
        }
    }
}
