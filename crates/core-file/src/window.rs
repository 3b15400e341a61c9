//! A raw file restricted to a half-open byte window.
//!
//! The window translates *natural* positions (what the client addresses)
//! into *absolute* offsets of the backing file: `A = start + N`, rejected
//! with a range error when the result lands at or past `end`. Reads are
//! clamped so bytes outside the window never leak out.

use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::position::{Absolute, Natural};
use crate::raw::{OpenFlags, RawFile};
use crate::{OpenError, RangeError, ReadError, UnopenableKind};

/// A file opened for editing through an optional `[start, end)` window.
#[derive(Debug)]
pub struct ConstrainedFile {
    path: PathBuf,
    file: RawFile,
    start: Option<Absolute>,
    end: Option<Absolute>,
    flags: OpenFlags,
}

impl ConstrainedFile {
    /// Open `path`, canonicalizing it first. Directories, character
    /// devices, FIFOs and sockets are rejected; symlinks are followed.
    /// A window where both bounds are present and equal is zero-span and
    /// useless, so construction rejects it too.
    pub fn open(
        path: &Path,
        start: Option<Absolute>,
        end: Option<Absolute>,
        flags: OpenFlags,
    ) -> Result<Self, OpenError> {
        if let (Some(s), Some(e)) = (start, end) {
            if s == e {
                return Err(RangeError::ZeroSpan { at: s.get() }.into());
            }
            if s > e {
                return Err(RangeError::InvertedWindow {
                    start: s.get(),
                    end: e.get(),
                }
                .into());
            }
        }

        let path = std::fs::canonicalize(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                OpenError::FileDoesNotExist(path.to_path_buf())
            } else {
                OpenError::Unknown {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        let meta = std::fs::metadata(&path).map_err(|e| OpenError::Unknown {
            path: path.clone(),
            source: e,
        })?;
        if let Some(kind) = unopenable_kind(&meta) {
            return Err(OpenError::Unopenable { path, kind });
        }

        let file = RawFile::open(&path, flags).map_err(|e| OpenError::Unknown {
            path: path.clone(),
            source: e,
        })?;
        debug!(
            target: "file.window",
            path = %path.display(),
            start = start.map(Absolute::get),
            end = end.map(Absolute::get),
            writable = flags.write,
            "opened"
        );
        Ok(Self {
            path,
            file,
            start,
            end,
            flags,
        })
    }

    /// Re-open the backing handle at the same path. Required after a
    /// whole-file save renames a fresh file over this one: the old handle
    /// still addresses the replaced inode.
    pub fn reopen(&mut self) -> io::Result<()> {
        self.file = RawFile::open(&self.path, self.flags)?;
        debug!(target: "file.window", path = %self.path.display(), "reopened");
        Ok(())
    }

    /// The canonical path this view was opened on.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_writable(&self) -> bool {
        self.file.is_writable()
    }

    /// Where natural position zero lands in the backing file.
    pub fn origin(&self) -> Absolute {
        self.start.unwrap_or(Absolute::new(0))
    }

    /// Translate a natural position into an absolute offset, rejecting
    /// positions at or past the window's end.
    pub fn constrain(&self, pos: Natural) -> Result<Absolute, RangeError> {
        let absolute = self.origin().get() + pos.get();
        if let Some(end) = self.end {
            if absolute >= end.get() {
                return Err(RangeError::PositionOutOfRange {
                    position: pos.get(),
                    end: end.get(),
                });
            }
        }
        Ok(Absolute::new(absolute))
    }

    /// Non-panicking window membership check.
    pub fn can_constrain(&self, pos: Natural) -> bool {
        self.constrain(pos).is_ok()
    }

    /// Read a single byte. `None` for positions outside the window or past
    /// end of file.
    pub fn read(&mut self, pos: Natural) -> Result<Option<u8>, ReadError> {
        let bytes = self.read_range(pos, 1)?;
        Ok(bytes.first().copied())
    }

    /// Read up to `amount` bytes starting at `pos`, clamped to the window
    /// and to end of file. Out-of-window start positions yield an empty
    /// vector rather than an error.
    pub fn read_range(&mut self, pos: Natural, amount: usize) -> Result<Vec<u8>, ReadError> {
        let absolute = match self.constrain(pos) {
            Ok(a) => a,
            Err(_) => return Ok(Vec::new()),
        };
        let clamped = match self.end {
            Some(end) => amount.min(end.get() - absolute.get()),
            None => amount,
        };
        if clamped == 0 {
            return Ok(Vec::new());
        }
        Ok(self.file.read_vec(absolute, clamped)?)
    }

    /// Overwrite bytes in place at the translated position.
    pub fn edit(&mut self, pos: Natural, data: &[u8]) -> io::Result<()> {
        let absolute = self
            .constrain(pos)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        self.file.write_at(absolute, data)
    }

    /// Shift-insert `amount` undefined bytes before the translated position.
    pub fn insert(&mut self, pos: Natural, amount: usize, chunk_size: usize) -> io::Result<()> {
        let absolute = Absolute::new(self.origin().get() + pos.get());
        self.file.shift_insert(absolute, amount, chunk_size)
    }

    /// Shift-delete `amount` bytes starting at the translated position.
    /// The caller resizes afterwards, as with [`RawFile::shift_delete`].
    pub fn delete(&mut self, pos: Natural, amount: usize, chunk_size: usize) -> io::Result<()> {
        let absolute = Absolute::new(self.origin().get() + pos.get());
        self.file.shift_delete(absolute, amount, chunk_size)
    }

    /// Size of the whole backing file, not the window.
    pub fn size(&self) -> io::Result<usize> {
        self.file.size()
    }

    /// Bytes actually editable through the window:
    /// `min(end, file_size) - start`.
    pub fn editable_size(&self) -> io::Result<usize> {
        let size = self.size()?;
        let upper = match self.end {
            Some(end) => end.get().min(size),
            None => size,
        };
        Ok(upper.saturating_sub(self.origin().get()))
    }

    /// Direct access to the underlying handle, for callers that replay
    /// pending actions against it (partial in-place save).
    pub fn raw_mut(&mut self) -> &mut RawFile {
        &mut self.file
    }
}

#[cfg(unix)]
fn unopenable_kind(meta: &std::fs::Metadata) -> Option<UnopenableKind> {
    use std::os::unix::fs::FileTypeExt;
    let ft = meta.file_type();
    if ft.is_dir() {
        Some(UnopenableKind::Directory)
    } else if ft.is_char_device() {
        Some(UnopenableKind::CharacterDevice)
    } else if ft.is_fifo() {
        Some(UnopenableKind::Fifo)
    } else if ft.is_socket() {
        Some(UnopenableKind::Socket)
    } else {
        None
    }
}

#[cfg(not(unix))]
fn unopenable_kind(meta: &std::fs::Metadata) -> Option<UnopenableKind> {
    if meta.file_type().is_dir() {
        Some(UnopenableKind::Directory)
    } else {
        None
    }
}
