//! Editor facade: a byte-addressable view of a file with pending edits.
//!
//! The editor composes a constrained file window, a block cache, and an
//! action log. Reads resolve against the log overlay first; only a
//! position no pending action answers falls through to the cache and the
//! base file. Edits, insertions and deletions never touch the file; they
//! append history entries, and a save replays the applied entries
//! against a temp copy that is atomically renamed into place (or, for
//! spotty files, directly into the window).
//!
//! The editor is single-threaded and owned by one caller; nothing here
//! locks or suspends.

use std::path::Path;
use thiserror::Error;
use tracing::debug;

use core_actions::{Action, ActionLog, Resolved, INSERTION_FILL};
pub use core_actions::{
    ActionStatus, EditObserver, FnEditObserver, NoopEditObserver, RedoStatus, UndoStatus,
};
use core_file::ConstrainedFile;
pub use core_file::{Absolute, Natural, OpenError, OpenFlags, RangeError, ReadError, Relative};

mod cache;
pub mod hex;
mod mode;
mod save;

pub use cache::BlockCache;
pub use mode::{FileMode, ModeError, SaveStrategy};
pub use save::SaveStatus;

/// Per-call failures of the editor API.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Range(#[from] RangeError),
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error(transparent)]
    Mode(#[from] ModeError),
}

/// Construction knobs. The defaults mirror the config crate's.
#[derive(Debug, Clone, Copy)]
pub struct EditorOptions {
    pub block_size: usize,
    pub max_block_count: usize,
    pub chunk_size: usize,
    pub mode: FileMode,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            block_size: core_config::DEFAULT_BLOCK_SIZE,
            max_block_count: core_config::DEFAULT_MAX_BLOCKS,
            chunk_size: core_config::DEFAULT_CHUNK_SIZE,
            mode: FileMode::Whole,
        }
    }
}

impl EditorOptions {
    /// Build options from a loaded config file and a mode choice.
    pub fn from_config(config: &core_config::Config, mode: FileMode) -> Self {
        let (block_size, max_block_count, chunk_size) = config.effective();
        Self {
            block_size,
            max_block_count,
            chunk_size,
            mode,
        }
    }
}

pub struct Editor {
    mode: FileMode,
    chunk_size: usize,
    file: ConstrainedFile,
    cache: BlockCache,
    log: ActionLog,
    observer: Box<dyn EditObserver>,
}

impl Editor {
    /// Open `path` for editing in the mode carried by `options`. The
    /// mode's window bounds become the view's constraint.
    pub fn open(path: &Path, flags: OpenFlags, options: EditorOptions) -> Result<Self, OpenError> {
        Self::with_observer(path, flags, options, Box::new(NoopEditObserver))
    }

    /// Like [`Editor::open`] with an edit observer registered up front.
    /// The observer sees every edit before it is recorded and may replace
    /// the bytes that get stored.
    pub fn with_observer(
        path: &Path,
        flags: OpenFlags,
        options: EditorOptions,
        observer: Box<dyn EditObserver>,
    ) -> Result<Self, OpenError> {
        let mode = options.mode;
        let file = ConstrainedFile::open(path, mode.start(), mode.end(), flags)?;
        debug!(
            target: "editor",
            path = %file.path().display(),
            mode = mode.name(),
            block_size = options.block_size,
            "editor_opened"
        );
        Ok(Self {
            mode,
            chunk_size: options.chunk_size.max(1),
            file,
            cache: BlockCache::new(options.block_size, options.max_block_count),
            log: ActionLog::new(),
            observer,
        })
    }

    pub fn mode(&self) -> &FileMode {
        &self.mode
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Whether the backing file can be written. When false everything
    /// still works in memory, but saving to the same path will fail.
    pub fn is_writable(&self) -> bool {
        self.file.is_writable()
    }

    /// Read one byte at `pos` as the file currently appears through the
    /// overlay. `None` past end of data; positions outside the mode's
    /// window are a range error.
    pub fn read(&mut self, pos: Natural) -> Result<Option<u8>, EditorError> {
        match self.log.resolve_read(pos) {
            Resolved::Byte(b) => Ok(Some(b)),
            Resolved::Position(p) => self.read_single_raw(p),
        }
    }

    /// Read up to `amount` bytes starting at `pos`. Stops early at end of
    /// data or at the window's edge, returning the bytes collected so far.
    pub fn read_range(&mut self, pos: Natural, amount: usize) -> Result<Vec<u8>, EditorError> {
        let mut data = Vec::with_capacity(amount);
        for i in 0..amount {
            match self.read(pos + Relative::new(i)) {
                Ok(Some(byte)) => data.push(byte),
                Ok(None) => break,
                Err(EditorError::Range(_)) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(data)
    }

    /// [`Editor::read_range`] rendered as space-separated uppercase hex
    /// pairs, for display-oriented callers.
    pub fn read_hex(&mut self, pos: Natural, amount: usize) -> Result<String, EditorError> {
        let bytes = self.read_range(pos, amount)?;
        let mut out = String::with_capacity(bytes.len() * 3);
        for (i, byte) in bytes.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            let (high, low) = hex::byte_to_hex(*byte);
            out.push(high);
            out.push(low);
        }
        Ok(out)
    }

    /// Record an overwrite of one byte. Legal in every mode.
    pub fn edit(&mut self, pos: Natural, value: u8) -> ActionStatus {
        self.edit_bytes(pos, vec![value])
    }

    /// Record an overwrite of a run of bytes. The observer runs first and
    /// its (possibly rewritten) buffer is what gets stored.
    pub fn edit_bytes(&mut self, pos: Natural, mut data: Vec<u8>) -> ActionStatus {
        self.observer.on_edit(pos, &mut data);
        self.log.push(Action::Edit {
            position: pos,
            data,
        })
    }

    /// Record an insertion of `amount` null bytes before `pos`.
    pub fn insert(&mut self, pos: Natural, amount: usize) -> Result<ActionStatus, EditorError> {
        self.insert_filled(pos, amount, INSERTION_FILL)
    }

    /// Record an insertion filled with `fill`. The zero byte needs no
    /// extra work (insertions already read back as zero); anything else
    /// bundles the insertion with an edit over the gap.
    pub fn insert_filled(
        &mut self,
        pos: Natural,
        amount: usize,
        fill: u8,
    ) -> Result<ActionStatus, EditorError> {
        self.check_insertion()?;
        let action = if fill == INSERTION_FILL {
            Action::Insertion {
                position: pos,
                amount,
            }
        } else {
            Action::insertion_with_pattern(pos, amount, &[fill])
        };
        Ok(self.log.push(action))
    }

    /// Record an insertion whose gap is tiled with `pattern`, repeated via
    /// modulo indexing across `amount` bytes.
    pub fn insert_pattern(
        &mut self,
        pos: Natural,
        amount: usize,
        pattern: &[u8],
    ) -> Result<ActionStatus, EditorError> {
        self.check_insertion()?;
        let action = if pattern.is_empty() {
            Action::Insertion {
                position: pos,
                amount,
            }
        } else {
            Action::insertion_with_pattern(pos, amount, pattern)
        };
        Ok(self.log.push(action))
    }

    /// Record a deletion of `amount` bytes starting at `pos`.
    pub fn delete(&mut self, pos: Natural, amount: usize) -> Result<ActionStatus, EditorError> {
        if !self.mode.supports_deletion() {
            return Err(ModeError::DeletionUnsupported {
                mode: self.mode.name(),
            }
            .into());
        }
        Ok(self.log.push(Action::Deletion {
            position: pos,
            amount,
        }))
    }

    pub fn can_undo(&self) -> bool {
        self.log.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.log.can_redo()
    }

    pub fn undo(&mut self) -> UndoStatus {
        self.log.undo()
    }

    pub fn redo(&mut self) -> RedoStatus {
        self.log.redo()
    }

    /// Size of the file as it currently appears: base size plus the
    /// applied actions' summed delta.
    pub fn size(&self) -> Result<usize, EditorError> {
        let base = self.file.size().map_err(ReadError::from)?;
        Ok(self.log.adjusted_size(base))
    }

    /// Editable bytes visible through the window, overlay-adjusted the
    /// same way.
    pub fn editable_size(&self) -> Result<usize, EditorError> {
        let base = self.file.editable_size().map_err(ReadError::from)?;
        Ok(self.log.adjusted_size(base))
    }

    /// Persist pending actions to the file this editor was opened on.
    /// Whole-file modes rebuild through the temp-and-rename pipeline;
    /// spotty mode writes the window back in place. Consumes the log.
    pub fn save(&mut self) -> SaveStatus {
        match self.mode.save_strategy() {
            SaveStrategy::WholeFile => {
                let dest = self.file.path().to_path_buf();
                self.save_as_file(&dest)
            }
            SaveStrategy::InPlaceWindow => self.save_in_place(),
        }
    }

    /// Persist to another path. Only whole-file modes can do this; spotty
    /// mode owns just its window and refuses.
    pub fn save_as(&mut self, destination: &Path) -> SaveStatus {
        match self.mode.save_strategy() {
            SaveStrategy::WholeFile => self.save_as_file(destination),
            SaveStrategy::InPlaceWindow => SaveStatus::InvalidMode,
        }
    }

    fn save_as_file(&mut self, destination: &Path) -> SaveStatus {
        let source = self.file.path().to_path_buf();
        let origin = self.file.origin();
        let dest = match save::resolve_destination(&source, destination) {
            Ok(d) => d,
            Err(status) => return status,
        };
        let status =
            save::save_whole_file(&source, origin, &mut self.log, self.chunk_size, &dest);
        if status == SaveStatus::Success {
            // The base file may have been replaced; cached blocks are stale.
            self.cache.clear();
            let replaced = std::fs::canonicalize(&dest)
                .map(|d| d == source)
                .unwrap_or(dest == source);
            if replaced {
                // The rename put a new inode at our path; the old handle
                // still reads the replaced file.
                if let Err(e) = self.file.reopen() {
                    tracing::warn!(target: "editor.save", ?e, "reopen_after_save_failed");
                    return SaveStatus::UnknownFailure;
                }
            }
        }
        status
    }

    /// Direct in-place save for spotty windows: no insertions or
    /// deletions exist in this mode, so replaying edits over the live
    /// window is exact.
    fn save_in_place(&mut self) -> SaveStatus {
        let origin = self.file.origin();
        let chunk_size = self.chunk_size;
        match self.log.save_into(self.file.raw_mut(), origin, chunk_size) {
            Ok(()) => {
                self.cache.clear();
                debug!(target: "editor.save", path = %self.file.path().display(), "saved_in_place");
                SaveStatus::Success
            }
            Err(e) => {
                tracing::warn!(target: "editor.save", ?e, "in_place_save_failed");
                SaveStatus::UnknownFailure
            }
        }
    }

    fn read_single_raw(&mut self, pos: Natural) -> Result<Option<u8>, EditorError> {
        // Surface out-of-window positions as the range error they are
        // before the cache turns them into a silent miss.
        self.file.constrain(pos)?;
        Ok(self.cache.read(&mut self.file, pos)?)
    }

    fn check_insertion(&self) -> Result<(), EditorError> {
        if !self.mode.supports_insertion() {
            return Err(ModeError::InsertionUnsupported {
                mode: self.mode.name(),
            }
            .into());
        }
        Ok(())
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("path", &self.file.path())
            .field("mode", &self.mode)
            .field("pending_actions", &self.log.len())
            .field("applied", &self.log.index())
            .finish()
    }
}

