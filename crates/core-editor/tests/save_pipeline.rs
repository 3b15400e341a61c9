//! Size accounting and save pipeline behavior beyond the happy path.

mod common;

use common::{nat, open_whole};
use core_editor::{Editor, EditorOptions, OpenFlags, SaveStatus};

#[test]
fn visible_size_tracks_applied_deltas() {
    let (_dir, _path, mut ed) = open_whole(b"HELLO");
    assert_eq!(ed.size().unwrap(), 5);
    ed.insert(nat(2), 3).unwrap();
    assert_eq!(ed.size().unwrap(), 8);
    ed.delete(nat(0), 2).unwrap();
    assert_eq!(ed.size().unwrap(), 6);
    ed.undo();
    assert_eq!(ed.size().unwrap(), 8);
    ed.redo();
    assert_eq!(ed.size().unwrap(), 6);
}

#[test]
fn save_consumes_log_and_preserves_visible_bytes() {
    let (_dir, path, mut ed) = open_whole(b"0123456789");
    ed.insert_filled(nat(0), 2, b'>').unwrap();
    ed.delete(nat(7), 3).unwrap();
    let before = ed.read_range(nat(0), 16).unwrap();
    assert_eq!(ed.save(), SaveStatus::Success);
    let after = ed.read_range(nat(0), 16).unwrap();
    assert_eq!(before, after);
    assert_eq!(std::fs::read(&path).unwrap(), before);
    assert!(!ed.can_undo());
    assert!(!ed.can_redo());
}

#[test]
fn consecutive_saves_accumulate_correctly() {
    let (_dir, path, mut ed) = open_whole(b"aaaa");
    ed.edit(nat(0), b'b');
    assert_eq!(ed.save(), SaveStatus::Success);
    ed.edit(nat(3), b'c');
    assert_eq!(ed.save(), SaveStatus::Success);
    assert_eq!(std::fs::read(&path).unwrap(), b"baac");
}

#[test]
fn stacked_insertions_replay_in_submission_order() {
    let (_dir, path, mut ed) = open_whole(b"XY");
    ed.insert_filled(nat(1), 1, b'1').unwrap(); // X1Y
    ed.insert_filled(nat(2), 1, b'2').unwrap(); // X12Y
    ed.insert_filled(nat(0), 1, b'0').unwrap(); // 0X12Y
    assert_eq!(ed.read_range(nat(0), 5).unwrap(), b"0X12Y");
    assert_eq!(ed.save(), SaveStatus::Success);
    assert_eq!(std::fs::read(&path).unwrap(), b"0X12Y");
}

#[test]
fn read_only_editor_still_edits_in_memory_and_saves_elsewhere() {
    let (dir, path, mut ed) = {
        let (dir, path) = common::fixture(b"abc");
        let ed = Editor::open(&path, OpenFlags::new(false), EditorOptions::default()).unwrap();
        (dir, path, ed)
    };
    assert!(!ed.is_writable());
    ed.edit(nat(0), b'Z');
    assert_eq!(ed.read_range(nat(0), 3).unwrap(), b"Zbc");
    // The whole-file pipeline writes a fresh temp copy, so a read-only
    // source can still be saved to a new destination.
    let out = dir.path().join("copy.bin");
    assert_eq!(ed.save_as(&out), SaveStatus::Success);
    assert_eq!(std::fs::read(&out).unwrap(), b"Zbc");
    assert_eq!(std::fs::read(&path).unwrap(), b"abc");
}

#[test]
fn options_from_config_drive_the_editor() {
    let (dir, path) = common::fixture(b"abcdef");
    let cfg_path = dir.path().join("hexed.toml");
    std::fs::write(&cfg_path, "[cache]\nblock_size = 2\nmax_blocks = 2\n").unwrap();
    let cfg = core_config::load_from(Some(cfg_path)).unwrap();
    let options = core_editor::EditorOptions::from_config(&cfg, core_editor::FileMode::Whole);
    assert_eq!(options.block_size, 2);
    assert_eq!(options.max_block_count, 2);
    assert_eq!(options.chunk_size, core_config::DEFAULT_CHUNK_SIZE);

    let mut ed = Editor::open(&path, OpenFlags::default(), options).unwrap();
    assert_eq!(ed.read_range(nat(0), 6).unwrap(), b"abcdef");
}

#[test]
fn small_block_cache_still_reads_correctly() {
    // Force lots of block churn: 2-byte blocks, 2 slots.
    let (_dir, path) = common::fixture(b"abcdefghijklmnop");
    let options = EditorOptions {
        block_size: 2,
        max_block_count: 2,
        ..EditorOptions::default()
    };
    let mut ed = Editor::open(&path, OpenFlags::default(), options).unwrap();
    assert_eq!(ed.read_range(nat(0), 16).unwrap(), b"abcdefghijklmnop");
    // Revisit earlier blocks after they were evicted.
    assert_eq!(ed.read(nat(0)).unwrap(), Some(b'a'));
    assert_eq!(ed.read(nat(15)).unwrap(), Some(b'p'));
}
