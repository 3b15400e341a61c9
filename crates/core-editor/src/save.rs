//! Whole-file save pipeline.
//!
//! Pending actions are never replayed against the live file. The pipeline
//! copies the source to a temp file beside the destination, grows it so
//! in-place shifts have room, replays the applied actions, shrinks it to
//! the final size, and renames it over the destination. A crash anywhere
//! before the rename leaves the destination untouched; any failure after
//! the temp file exists unlinks it.

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

use core_actions::ActionLog;
use core_file::{Absolute, OpenFlags, RawFile};

/// Result of a save. Anything but `Success` left the destination as it
/// was (modulo `UnknownFailure` during an in-place window save).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Success,
    /// An I/O failure with no more specific classification.
    UnknownFailure,
    /// Ill-formed destination name (empty, `.` or `..`).
    InvalidFilename,
    /// The directory the destination should live in does not exist.
    InvalidDestination,
    InsufficientPermissions,
    /// Could not find a free temp filename within the attempt limit.
    /// May be a sign of a bug.
    TempFileIterationLimit,
    /// The current mode cannot perform this kind of save.
    InvalidMode,
}

const MAX_TEMP_NAME_ATTEMPTS: usize = 10;

/// Validate and resolve a destination: collapse dot components, reject
/// ill-formed names, default a bare filename to the source's directory,
/// and require that directory to exist.
pub(crate) fn resolve_destination(source: &Path, dest: &Path) -> Result<PathBuf, SaveStatus> {
    let dest = lexical_normalize(dest);
    if dest.as_os_str().is_empty() || dest.file_name().is_none() {
        return Err(SaveStatus::InvalidFilename);
    }

    // A bare filename saves beside the file being edited.
    let dest = match dest.parent() {
        None => return Err(SaveStatus::InvalidFilename),
        Some(p) if p.as_os_str().is_empty() => match source.parent() {
            Some(src_parent) => src_parent.join(&dest),
            None => dest,
        },
        Some(_) => dest,
    };
    match dest.parent() {
        Some(p) if p.exists() => Ok(dest),
        _ => Err(SaveStatus::InvalidDestination),
    }
}

/// Replay `log`'s applied actions into a temp copy of `source` and rename
/// it to `dest` (already resolved by [`resolve_destination`]). Clears the
/// log on success.
pub(crate) fn save_whole_file(
    source: &Path,
    origin: Absolute,
    log: &mut ActionLog,
    chunk_size: usize,
    dest: &Path,
) -> SaveStatus {
    let parent = match dest.parent() {
        Some(p) => p.to_path_buf(),
        None => return SaveStatus::InvalidDestination,
    };

    let previous_size = match std::fs::metadata(source) {
        Ok(m) => m.len() as usize,
        Err(e) => return status_from_io(&e, "source_stat_failed"),
    };
    let result_size = log.adjusted_size(previous_size);

    let temp_path = match pick_temp_path(&parent, dest) {
        Some(p) => p,
        None => return SaveStatus::TempFileIterationLimit,
    };

    if let Err(e) = std::fs::copy(source, &temp_path) {
        return status_from_io(&e, "temp_copy_failed");
    }
    debug!(
        target: "editor.save",
        temp = %temp_path.display(),
        previous_size,
        result_size,
        "temp_file_created"
    );

    match replay_into(&temp_path, origin, log, chunk_size, previous_size, result_size) {
        Ok(()) => {}
        Err(e) => {
            let status = status_from_io(&e, "temp_replay_failed");
            remove_temp(&temp_path);
            return status;
        }
    }

    if let Err(e) = std::fs::rename(&temp_path, dest) {
        let status = status_from_io(&e, "rename_failed");
        remove_temp(&temp_path);
        return status;
    }
    debug!(target: "editor.save", dest = %dest.display(), result_size, "saved");
    SaveStatus::Success
}

/// Grow, replay, shrink. Separated out so every error feeds the one
/// cleanup path in the caller.
fn replay_into(
    temp_path: &Path,
    origin: Absolute,
    log: &mut ActionLog,
    chunk_size: usize,
    previous_size: usize,
    result_size: usize,
) -> io::Result<()> {
    let mut temp = RawFile::open(temp_path, OpenFlags::new(true))?;
    // Room for in-place shifts before trailing bytes are cut off.
    temp.resize(previous_size.max(result_size))?;
    log.save_into(&mut temp, origin, chunk_size)?;
    temp.resize(result_size)
}

/// Candidate names are `<dest-name>.<8 hex chars>.tmp`; give up after a
/// bounded number of collisions.
fn pick_temp_path(parent: &Path, dest: &Path) -> Option<PathBuf> {
    let dest_name = dest.file_name()?.to_string_lossy().into_owned();
    let state = RandomState::new();
    for attempt in 0..MAX_TEMP_NAME_ATTEMPTS {
        let mut hasher = state.build_hasher();
        hasher.write_usize(attempt);
        let salt = hasher.finish() as u32;
        let candidate = parent.join(format!("{dest_name}.{salt:08x}.tmp"));
        if !candidate.exists() {
            return Some(candidate);
        }
    }
    None
}

fn remove_temp(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        warn!(target: "editor.save", temp = %path.display(), ?e, "temp_cleanup_failed");
    }
}

fn status_from_io(e: &io::Error, stage: &'static str) -> SaveStatus {
    warn!(target: "editor.save", ?e, stage, "save_io_failure");
    if e.kind() == io::ErrorKind::PermissionDenied {
        SaveStatus::InsufficientPermissions
    } else {
        SaveStatus::UnknownFailure
    }
}

/// Collapse `.` and `..` components without touching the filesystem.
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}
