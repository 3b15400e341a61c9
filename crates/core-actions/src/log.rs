//! The ordered action log and its history cursor.
//!
//! `actions[0..index]` are applied, `actions[index..]` are redoable.
//! Pushing a new action truncates the redoable tail first, so history
//! never forks. Reads resolve against the applied prefix only: walking it
//! newest-to-oldest lets each action either answer the read outright or
//! rewrite the position for the next-older layer, reducing any read to at
//! most one access against the un-mutated base file.

use std::io;
use tracing::{debug, trace};

use crate::{Action, ActionStatus, RedoStatus, Resolved, UndoStatus};
use core_file::{Absolute, Natural, RawFile};

#[derive(Debug, Default)]
pub struct ActionLog {
    actions: Vec<Action>,
    /// Cursor separating applied from unapplied history. With actions
    /// `{a, b}`: index 0 means both unapplied, 1 means `a` applied,
    /// 2 means both applied.
    index: usize,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn has_applied(&self) -> bool {
        self.index > 0
    }

    pub fn has_unapplied(&self) -> bool {
        self.index < self.actions.len()
    }

    pub fn can_undo(&self) -> bool {
        self.has_applied() && self.actions[self.index - 1].can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.has_unapplied() && self.actions[self.index].can_redo()
    }

    /// Record and apply a new action: drop the redoable tail, append,
    /// advance the cursor, then drive the shared redo path so first-run
    /// and later redos behave identically.
    pub fn push(&mut self, action: Action) -> ActionStatus {
        self.clear_unapplied();
        trace!(
            target: "actions.log",
            kind = action.kind(),
            index = self.index,
            len = self.actions.len(),
            "push"
        );
        self.actions.push(action);
        self.index += 1;
        self.actions[self.index - 1].redo()
    }

    pub fn undo(&mut self) -> UndoStatus {
        if !self.has_applied() {
            return UndoStatus::Nothing;
        }
        if !self.can_undo() {
            return UndoStatus::Unable;
        }
        // Step back first; the entry being undone sits one behind the cursor.
        self.index -= 1;
        let status = self.actions[self.index].undo();
        trace!(target: "actions.log", index = self.index, ?status, "undo");
        status
    }

    pub fn redo(&mut self) -> RedoStatus {
        if !self.has_unapplied() {
            return RedoStatus::Nothing;
        }
        if !self.can_redo() {
            return RedoStatus::Unable;
        }
        self.index += 1;
        let status = self.actions[self.index - 1].redo();
        trace!(target: "actions.log", index = self.index, ?status, "redo");
        status
    }

    /// Drop the redoable tail.
    pub fn clear_unapplied(&mut self) {
        if self.has_unapplied() {
            let dropped = self.actions.len() - self.index;
            self.actions.truncate(self.index);
            debug!(target: "actions.log", dropped, "redo_tail_truncated");
        }
    }

    /// Resolve a read against the overlay: thread the position through the
    /// applied actions newest-to-oldest until one of them supplies a byte.
    /// A surviving position is the right place to read in the base file.
    pub fn resolve_read(&self, position: Natural) -> Resolved {
        let mut pos = position;
        for action in self.actions[..self.index].iter().rev() {
            match action.reverse_position(pos) {
                Resolved::Byte(b) => return Resolved::Byte(b),
                Resolved::Position(p) => pos = p,
            }
        }
        Resolved::Position(pos)
    }

    /// Net size change of the applied prefix.
    pub fn applied_size_delta(&self) -> isize {
        self.actions[..self.index]
            .iter()
            .map(Action::size_delta)
            .sum()
    }

    /// `base` adjusted by the applied prefix's summed delta, clamped at
    /// zero so an oversized deletion cannot wrap.
    pub fn adjusted_size(&self, base: usize) -> usize {
        base.checked_add_signed(self.applied_size_delta()).unwrap_or(0)
    }

    /// Replay the applied prefix into `file` in submission order, then
    /// clear the whole log (the unapplied tail dies with the save).
    pub fn save_into(
        &mut self,
        file: &mut RawFile,
        origin: Absolute,
        chunk_size: usize,
    ) -> io::Result<()> {
        let applied = self.index;
        for action in &self.actions[..applied] {
            action.materialize(file, origin, chunk_size)?;
        }
        debug!(
            target: "actions.log",
            materialized = applied,
            discarded = self.actions.len() - applied,
            "saved"
        );
        self.actions.clear();
        self.index = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nat(v: usize) -> Natural {
        Natural::new(v)
    }

    fn edit(pos: usize, byte: u8) -> Action {
        Action::Edit {
            position: nat(pos),
            data: vec![byte],
        }
    }

    #[test]
    fn empty_log_has_nothing_to_do() {
        let mut log = ActionLog::new();
        assert_eq!(log.undo(), UndoStatus::Nothing);
        assert_eq!(log.redo(), RedoStatus::Nothing);
        assert!(!log.can_undo());
        assert!(!log.can_redo());
    }

    #[test]
    fn push_advances_cursor_and_applies() {
        let mut log = ActionLog::new();
        assert_eq!(log.push(edit(0, b'a')), ActionStatus::Success);
        assert_eq!(log.index(), 1);
        assert_eq!(log.len(), 1);
        assert!(log.can_undo());
        assert!(!log.can_redo());
    }

    #[test]
    fn undo_then_redo_moves_cursor_within_bounds() {
        let mut log = ActionLog::new();
        log.push(edit(0, b'a'));
        log.push(edit(1, b'b'));
        assert_eq!(log.undo(), UndoStatus::Success);
        assert_eq!(log.index(), 1);
        assert_eq!(log.undo(), UndoStatus::Success);
        assert_eq!(log.index(), 0);
        assert_eq!(log.undo(), UndoStatus::Nothing);
        assert_eq!(log.redo(), RedoStatus::Success);
        assert_eq!(log.redo(), RedoStatus::Success);
        assert_eq!(log.redo(), RedoStatus::Nothing);
        assert!(log.index() <= log.len());
    }

    #[test]
    fn push_truncates_redoable_tail() {
        let mut log = ActionLog::new();
        log.push(edit(0, b'a'));
        log.push(edit(1, b'b'));
        log.undo();
        log.push(edit(2, b'c'));
        assert_eq!(log.len(), 2);
        assert_eq!(log.index(), 2);
        // The undone 'b' edit is gone; redo finds nothing.
        assert_eq!(log.redo(), RedoStatus::Nothing);
    }

    #[test]
    fn resolve_read_sees_applied_actions_only() {
        let mut log = ActionLog::new();
        log.push(edit(2, b'Z'));
        assert_eq!(log.resolve_read(nat(2)), Resolved::Byte(b'Z'));
        log.undo();
        // Undone edit must not answer reads.
        assert_eq!(log.resolve_read(nat(2)), Resolved::Position(nat(2)));
        log.redo();
        assert_eq!(log.resolve_read(nat(2)), Resolved::Byte(b'Z'));
    }

    #[test]
    fn resolve_read_threads_positions_through_layers() {
        let mut log = ActionLog::new();
        // "ABCDEF": insert one byte before 1, then delete the byte at 3.
        log.push(Action::Insertion {
            position: nat(1),
            amount: 1,
        });
        log.push(Action::Deletion {
            position: nat(3),
            amount: 1,
        });
        // Read at 3: deletion shifts to 4, insertion shifts back to 3 in
        // the base file.
        assert_eq!(log.resolve_read(nat(3)), Resolved::Position(nat(3)));
        // Read at 1 hits the insertion gap.
        assert_eq!(log.resolve_read(nat(1)), Resolved::Byte(crate::INSERTION_FILL));
    }

    #[test]
    fn size_delta_tracks_cursor() {
        let mut log = ActionLog::new();
        log.push(Action::Insertion {
            position: nat(0),
            amount: 3,
        });
        log.push(Action::Deletion {
            position: nat(0),
            amount: 1,
        });
        assert_eq!(log.applied_size_delta(), 2);
        log.undo();
        assert_eq!(log.applied_size_delta(), 3);
        log.undo();
        assert_eq!(log.applied_size_delta(), 0);
    }

    #[test]
    fn adjusted_size_clamps_at_zero() {
        let mut log = ActionLog::new();
        log.push(Action::Deletion {
            position: nat(0),
            amount: 10,
        });
        assert_eq!(log.adjusted_size(4), 0);
        assert_eq!(log.adjusted_size(14), 4);
    }

    #[test]
    fn clear_unapplied_drops_tail_only() {
        let mut log = ActionLog::new();
        log.push(edit(0, b'a'));
        log.push(edit(1, b'b'));
        log.undo();
        log.clear_unapplied();
        assert_eq!(log.len(), 1);
        assert_eq!(log.index(), 1);
    }
}
