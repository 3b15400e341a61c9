#![allow(dead_code)] // Shared across many integration tests; each test binary uses a subset of helpers.

use core_editor::{Editor, EditorOptions, FileMode, Natural, OpenFlags};
use std::io::Write as _;
use std::path::PathBuf;

pub fn nat(value: usize) -> Natural {
    Natural::new(value)
}

/// Write `content` into a fresh temp file and return the handle keeping
/// the directory alive plus the file's path.
pub fn fixture(content: &[u8]) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.bin");
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(content).unwrap();
    (dir, path)
}

pub fn open_with(content: &[u8], mode: FileMode) -> (tempfile::TempDir, PathBuf, Editor) {
    let (dir, path) = fixture(content);
    let options = EditorOptions {
        mode,
        ..EditorOptions::default()
    };
    let editor = Editor::open(&path, OpenFlags::default(), options).unwrap();
    (dir, path, editor)
}

pub fn open_whole(content: &[u8]) -> (tempfile::TempDir, PathBuf, Editor) {
    open_with(content, FileMode::Whole)
}

/// Any temp files the save pipeline may have leaked into `dir`.
pub fn leftover_temp_files(dir: &std::path::Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "tmp"))
        .collect()
}
