//! Raw file handle: positioned reads and writes plus the in-place shift
//! primitives that open or close a gap in the middle of a file.
//!
//! Every operation seeks explicitly to the offset it was given; nothing here
//! relies on a hidden stream position. Shifts move bytes chunk-wise in the
//! direction that guarantees each source range is read before any
//! overlapping destination write happens: tail-first for insertion,
//! front-first for deletion.

use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{trace, warn};

use crate::position::Absolute;

/// How the backing file is opened. Reading is unconditional; files are
/// always treated as raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenFlags {
    pub write: bool,
}

impl OpenFlags {
    pub const fn new(write: bool) -> Self {
        Self { write }
    }
}

impl Default for OpenFlags {
    fn default() -> Self {
        Self { write: true }
    }
}

/// An open file addressed by absolute byte offsets.
#[derive(Debug)]
pub struct RawFile {
    file: File,
    writable: bool,
}

impl RawFile {
    pub fn open(path: &Path, flags: OpenFlags) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(flags.write)
            .open(path)?;
        Ok(Self {
            file,
            writable: flags.write,
        })
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// Read into `buf` starting at `offset`. Short reads at end of file are
    /// not an error; the returned count says how much arrived.
    pub fn read_at(&mut self, offset: Absolute, buf: &mut [u8]) -> io::Result<usize> {
        self.file.seek(SeekFrom::Start(offset.get() as u64))?;
        let mut total = 0;
        while total < buf.len() {
            match self.file.read(&mut buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        debug_assert!(total <= buf.len(), "read past requested amount");
        Ok(total)
    }

    /// Read up to `amount` bytes at `offset`, returning what was available.
    pub fn read_vec(&mut self, offset: Absolute, amount: usize) -> io::Result<Vec<u8>> {
        let mut bytes = vec![0u8; amount];
        let got = self.read_at(offset, &mut bytes)?;
        bytes.truncate(got);
        Ok(bytes)
    }

    pub fn write_at(&mut self, offset: Absolute, data: &[u8]) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(offset.get() as u64))?;
        self.file.write_all(data)
    }

    pub fn size(&self) -> io::Result<usize> {
        Ok(self.file.metadata()?.len() as usize)
    }

    pub fn resize(&mut self, len: usize) -> io::Result<()> {
        self.file.set_len(len as u64)
    }

    /// Open a gap of `amount` bytes before `position` by shifting the tail
    /// of the file forward. The gap's contents are left undefined; callers
    /// wanting a particular fill write it afterwards (or use
    /// [`RawFile::insert_zeroed`] / [`RawFile::insert_bytes`]).
    ///
    /// The tail is moved in chunks of `chunk_size`, last chunk first, so no
    /// source range is overwritten before it has been read. The first (tail)
    /// chunk has length `(size - position) % chunk_size`, or a full chunk if
    /// that remainder is zero.
    pub fn shift_insert(
        &mut self,
        position: Absolute,
        amount: usize,
        chunk_size: usize,
    ) -> io::Result<()> {
        if amount == 0 {
            return Ok(());
        }
        let size = self.size()?;
        let pos = position.get().min(size);
        self.resize(size + amount)?;

        let shift_amount = size - pos;
        trace!(
            target: "file.raw",
            position = pos,
            amount,
            chunk_size,
            shift_amount,
            "shift_insert"
        );
        if shift_amount == 0 {
            return Ok(());
        }

        let tail_len = match shift_amount % chunk_size {
            0 => chunk_size,
            rem => rem,
        };
        let iterations = shift_amount.div_ceil(chunk_size);
        let mut carry = vec![0u8; chunk_size];
        for i in 0..iterations {
            let slice_len = if i == 0 { tail_len } else { chunk_size };
            let slice_start = size - tail_len - i * chunk_size;
            let got = self.read_at(Absolute::new(slice_start), &mut carry[..slice_len])?;
            if got != slice_len {
                warn!(
                    target: "file.raw",
                    expected = slice_len,
                    got,
                    slice_start,
                    "shift_insert_short_read"
                );
            }
            self.write_at(Absolute::new(slice_start + amount), &carry[..got])?;
        }
        Ok(())
    }

    /// Shift-insert and fill the opened gap with zero bytes, written out in
    /// `chunk_size` slices.
    pub fn insert_zeroed(
        &mut self,
        position: Absolute,
        amount: usize,
        chunk_size: usize,
    ) -> io::Result<()> {
        let pos = position.get().min(self.size()?);
        self.shift_insert(Absolute::new(pos), amount, chunk_size)?;

        let zeroes = vec![0u8; chunk_size];
        let fill_end = pos + amount;
        let mut slice_start = pos;
        while slice_start < fill_end {
            let slice_end = (slice_start + chunk_size).min(fill_end);
            self.write_at(Absolute::new(slice_start), &zeroes[..slice_end - slice_start])?;
            slice_start = slice_end;
        }
        Ok(())
    }

    /// Shift-insert and fill the opened gap with the caller's bytes.
    pub fn insert_bytes(
        &mut self,
        position: Absolute,
        data: &[u8],
        chunk_size: usize,
    ) -> io::Result<()> {
        let pos = Absolute::new(position.get().min(self.size()?));
        self.shift_insert(pos, data.len(), chunk_size)?;
        self.write_at(pos, data)
    }

    /// Close a gap of `amount` bytes starting at `position` by shifting the
    /// tail of the file backward, front chunk first. The file is *not*
    /// truncated; the caller resizes once it has collected every deletion,
    /// dropping the trailing garbage in a single [`RawFile::resize`].
    pub fn shift_delete(
        &mut self,
        position: Absolute,
        amount: usize,
        chunk_size: usize,
    ) -> io::Result<()> {
        if amount == 0 {
            return Ok(());
        }
        let size = self.size()?;
        let shift_start = position.get().saturating_add(amount).min(size);
        let shift_amount = size - shift_start;
        trace!(
            target: "file.raw",
            position = position.get(),
            amount,
            chunk_size,
            shift_amount,
            "shift_delete"
        );

        let mut carry = vec![0u8; chunk_size];
        let iterations = shift_amount.div_ceil(chunk_size);
        for i in 0..iterations {
            let slice_start = shift_start + i * chunk_size;
            let slice_end = (slice_start + chunk_size).min(size);
            let slice_len = slice_end - slice_start;
            let got = self.read_at(Absolute::new(slice_start), &mut carry[..slice_len])?;
            if got != slice_len {
                warn!(
                    target: "file.raw",
                    expected = slice_len,
                    got,
                    slice_start,
                    "shift_delete_short_read"
                );
            }
            self.write_at(Absolute::new(slice_start - amount), &carry[..got])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(content: &[u8]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content).unwrap();
        (dir, path)
    }

    fn contents(path: &Path) -> Vec<u8> {
        std::fs::read(path).unwrap()
    }

    #[test]
    fn read_at_short_read_at_eof() {
        let (_dir, path) = fixture(b"hello");
        let mut raw = RawFile::open(&path, OpenFlags::default()).unwrap();
        let mut buf = [0u8; 16];
        let got = raw.read_at(Absolute::new(3), &mut buf).unwrap();
        assert_eq!(got, 2);
        assert_eq!(&buf[..got], b"lo");
        // Past end of file: zero bytes, no error.
        assert_eq!(raw.read_at(Absolute::new(99), &mut buf).unwrap(), 0);
    }

    #[test]
    fn write_at_overwrites_in_place() {
        let (_dir, path) = fixture(b"abcdef");
        let mut raw = RawFile::open(&path, OpenFlags::default()).unwrap();
        raw.write_at(Absolute::new(2), b"XY").unwrap();
        drop(raw);
        assert_eq!(contents(&path), b"abXYef");
    }

    #[test]
    fn shift_insert_preserves_both_sides_of_gap() {
        // Chunk size smaller than the tail to force several iterations.
        let (_dir, path) = fixture(b"abcdefghijklmnopqrstuvwxyz");
        let mut raw = RawFile::open(&path, OpenFlags::default()).unwrap();
        raw.shift_insert(Absolute::new(5), 3, 4).unwrap();
        drop(raw);
        let after = contents(&path);
        assert_eq!(after.len(), 29);
        assert_eq!(&after[..5], b"abcde");
        assert_eq!(&after[8..], b"fghijklmnopqrstuvwxyz");
    }

    #[test]
    fn shift_insert_with_unaligned_tail_chunk() {
        // (size - pos) % chunk != 0 exercises the short first slice.
        let (_dir, path) = fixture(b"0123456789");
        let mut raw = RawFile::open(&path, OpenFlags::default()).unwrap();
        raw.shift_insert(Absolute::new(3), 1, 4).unwrap();
        drop(raw);
        let after = contents(&path);
        assert_eq!(&after[..3], b"012");
        assert_eq!(&after[4..], b"3456789");
    }

    #[test]
    fn shift_insert_at_eof_only_grows() {
        let (_dir, path) = fixture(b"abc");
        let mut raw = RawFile::open(&path, OpenFlags::default()).unwrap();
        raw.shift_insert(Absolute::new(3), 2, 120).unwrap();
        assert_eq!(raw.size().unwrap(), 5);
        drop(raw);
        assert_eq!(&contents(&path)[..3], b"abc");
    }

    #[test]
    fn zero_length_shift_is_a_noop() {
        let (_dir, path) = fixture(b"abc");
        let mut raw = RawFile::open(&path, OpenFlags::default()).unwrap();
        raw.shift_insert(Absolute::new(1), 0, 120).unwrap();
        raw.shift_delete(Absolute::new(1), 0, 120).unwrap();
        drop(raw);
        assert_eq!(contents(&path), b"abc");
    }

    #[test]
    fn insert_zeroed_fills_gap() {
        let (_dir, path) = fixture(b"HELLO");
        let mut raw = RawFile::open(&path, OpenFlags::default()).unwrap();
        raw.insert_zeroed(Absolute::new(2), 3, 2).unwrap();
        drop(raw);
        assert_eq!(contents(&path), b"HE\x00\x00\x00LLO");
    }

    #[test]
    fn insert_bytes_fills_gap_with_payload() {
        let (_dir, path) = fixture(b"ABCDE");
        let mut raw = RawFile::open(&path, OpenFlags::default()).unwrap();
        raw.insert_bytes(Absolute::new(5), &[0xAA, 0xBB], 120).unwrap();
        drop(raw);
        assert_eq!(contents(&path), b"ABCDE\xAA\xBB");
    }

    #[test]
    fn shift_delete_then_resize_drops_range() {
        let (_dir, path) = fixture(b"0123456789");
        let mut raw = RawFile::open(&path, OpenFlags::default()).unwrap();
        raw.shift_delete(Absolute::new(3), 4, 3).unwrap();
        raw.resize(6).unwrap();
        drop(raw);
        assert_eq!(contents(&path), b"012789");
    }

    #[test]
    fn shift_delete_without_resize_leaves_trailing_garbage() {
        let (_dir, path) = fixture(b"abcdef");
        let mut raw = RawFile::open(&path, OpenFlags::default()).unwrap();
        raw.shift_delete(Absolute::new(0), 2, 120).unwrap();
        assert_eq!(raw.size().unwrap(), 6);
        drop(raw);
        assert_eq!(&contents(&path)[..4], b"cdef");
    }
}
