// CLASSIFICATION: COMMUNITY
// Filename: engine_session.rs v0.3
// Date Modified: 2026-07-20
// Author: Lukas Bower

//! Full register-sequence sessions against the transfer engine, driven the
//! way a remote peer would drive them: selector writes, staged parameters,
//! buffer traffic, execute strobes, and status reads.

use regdoor::{
    AccessMode, DiskFile, MemoryFile, OpKind, OpenMode, RegisterBank, RegisterError, RegisterFile,
    RegisterLayout, TransferEngine, DEFAULT_BASE_ADDRESS,
};
use tempfile::tempdir;

type Session = RegisterFile<TransferEngine>;

fn attach(engine: TransferEngine) -> (RegisterLayout, Session) {
    let layout = engine.layout();
    let mut bank = RegisterBank::new();
    engine.publish(&mut bank).expect("publish registers");
    (layout, RegisterFile::new(bank, engine))
}

fn memory_session(capacity: u32) -> (RegisterLayout, Session) {
    let mut engine = TransferEngine::new(DEFAULT_BASE_ADDRESS);
    engine.add_file(Box::new(MemoryFile::new("scratch", capacity)));
    attach(engine)
}

fn select(regs: &mut Session, layout: RegisterLayout, selector: u32) {
    regs.host_write(layout.file_selector(), selector)
        .expect("select file");
}

fn execute(regs: &mut Session, layout: RegisterLayout, op: OpKind) {
    regs.host_write(layout.operation_selector(), op as u32)
        .expect("select operation");
    regs.host_write(layout.operation_execute(), 1)
        .expect("execute");
}

fn status_of(regs: &mut Session, layout: RegisterLayout, op: OpKind) -> (u32, u32) {
    regs.host_write(layout.operation_selector(), op as u32)
        .expect("select operation");
    let status = regs.host_read(layout.operation_status()).expect("status");
    let result = regs.host_read(layout.operation_result()).expect("result");
    (status, result)
}

fn stage(regs: &mut Session, layout: RegisterLayout, op: OpKind, offset: u32, length: u32) {
    regs.host_write(layout.operation_selector(), op as u32)
        .expect("select operation");
    regs.host_write(layout.access_offset(), offset)
        .expect("stage offset");
    regs.host_write(layout.access_length(), length)
        .expect("stage length");
}

#[test]
fn clamped_memory_write_reports_the_requested_length() {
    let (layout, mut regs) = memory_session(16);
    select(&mut regs, layout, 0);
    regs.host_write(layout.open_mode(), OpenMode::Write as u32)
        .expect("open mode");
    execute(&mut regs, layout, OpKind::Open);
    assert_eq!(status_of(&mut regs, layout, OpKind::Open), (0, 0));

    stage(&mut regs, layout, OpKind::Write, 10, 10);
    regs.host_write_block(layout.access_buffer(), &[0xAB; 10])
        .expect("fill buffer");
    execute(&mut regs, layout, OpKind::Write);

    // Ten bytes acknowledged although only six fit at offsets 10..15.
    assert_eq!(status_of(&mut regs, layout, OpKind::Write), (0, 10));
    assert_eq!(regs.host_read(layout.file_size()).expect("size"), 10);
}

#[test]
fn close_without_open_reports_failure() {
    let (layout, mut regs) = memory_session(16);
    select(&mut regs, layout, 0);
    execute(&mut regs, layout, OpKind::Close);
    assert_eq!(status_of(&mut regs, layout, OpKind::Close), (1, 0));
}

#[test]
fn selecting_a_write_only_file_coerces_the_open_mode() {
    let dir = tempdir().expect("tempdir");
    let mut engine = TransferEngine::new(DEFAULT_BASE_ADDRESS);
    engine.add_file(Box::new(MemoryFile::new("wo-scratch", 64)));
    engine.add_file(Box::new(DiskFile::new(
        "rw-settings",
        dir.path().join("settings.bin"),
        AccessMode::ReadWrite,
        true,
    )));
    let (layout, mut regs) = attach(engine);

    // Write-only file: read intent is rewritten to Write.
    regs.host_write(layout.open_mode(), OpenMode::Read as u32)
        .expect("open mode");
    select(&mut regs, layout, 0);
    assert_eq!(
        regs.host_read(layout.open_mode()).expect("open mode"),
        OpenMode::Write as u32
    );

    // Read-write file: any open mode passes through untouched.
    regs.host_write(layout.open_mode(), OpenMode::Read as u32)
        .expect("open mode");
    select(&mut regs, layout, 1);
    assert_eq!(
        regs.host_read(layout.open_mode()).expect("open mode"),
        OpenMode::Read as u32
    );
}

#[test]
fn selecting_a_read_only_file_coerces_write_intent_down() {
    let dir = tempdir().expect("tempdir");
    let mut engine = TransferEngine::new(DEFAULT_BASE_ADDRESS);
    engine.add_file(Box::new(DiskFile::new(
        "ro-log",
        dir.path().join("device.log"),
        AccessMode::ReadOnly,
        false,
    )));
    let (layout, mut regs) = attach(engine);

    regs.host_write(layout.open_mode(), OpenMode::ReadWrite as u32)
        .expect("open mode");
    select(&mut regs, layout, 0);
    assert_eq!(
        regs.host_read(layout.open_mode()).expect("open mode"),
        OpenMode::Read as u32
    );
}

#[test]
fn disk_round_trip_through_the_buffer_register() {
    let dir = tempdir().expect("tempdir");
    let mut engine = TransferEngine::new(DEFAULT_BASE_ADDRESS);
    engine.add_file(Box::new(DiskFile::new(
        "settings",
        dir.path().join("settings.bin"),
        AccessMode::ReadWrite,
        true,
    )));
    let (layout, mut regs) = attach(engine);
    let payload = *b"doorknob";

    select(&mut regs, layout, 0);
    regs.host_write(layout.open_mode(), OpenMode::Write as u32)
        .expect("open mode");
    execute(&mut regs, layout, OpKind::Open);
    stage(&mut regs, layout, OpKind::Write, 0, payload.len() as u32);
    regs.host_write_block(layout.access_buffer(), &payload)
        .expect("fill buffer");
    execute(&mut regs, layout, OpKind::Write);
    assert_eq!(status_of(&mut regs, layout, OpKind::Write), (0, 8));
    execute(&mut regs, layout, OpKind::Close);

    regs.host_write(layout.open_mode(), OpenMode::Read as u32)
        .expect("open mode");
    execute(&mut regs, layout, OpKind::Open);
    assert_eq!(status_of(&mut regs, layout, OpKind::Open), (0, 0));
    assert_eq!(regs.host_read(layout.file_size()).expect("size"), 8);

    stage(&mut regs, layout, OpKind::Read, 0, payload.len() as u32);
    execute(&mut regs, layout, OpKind::Read);
    assert_eq!(status_of(&mut regs, layout, OpKind::Read), (0, 8));

    let mut back = [0u8; 8];
    regs.host_read_block(layout.access_buffer(), &mut back)
        .expect("collect buffer");
    assert_eq!(back, payload);
}

#[test]
fn memory_reads_fail_even_when_open() {
    let (layout, mut regs) = memory_session(64);
    select(&mut regs, layout, 0);
    execute(&mut regs, layout, OpKind::Open);
    stage(&mut regs, layout, OpKind::Read, 0, 4);
    execute(&mut regs, layout, OpKind::Read);
    assert_eq!(status_of(&mut regs, layout, OpKind::Read), (1, 0));
}

#[test]
fn each_operation_keeps_its_own_status_slot() {
    let (layout, mut regs) = memory_session(64);
    select(&mut regs, layout, 0);

    execute(&mut regs, layout, OpKind::Open);
    execute(&mut regs, layout, OpKind::Open);
    execute(&mut regs, layout, OpKind::Delete);

    // Second open failed, but the delete outcome lives in its own slot.
    assert_eq!(status_of(&mut regs, layout, OpKind::Open), (1, 0));
    assert_eq!(status_of(&mut regs, layout, OpKind::Delete), (0, 0));
    // Close never ran; its slot still reads the initial success.
    assert_eq!(status_of(&mut regs, layout, OpKind::Close), (0, 0));
}

#[test]
fn staged_parameters_are_cached_per_file_and_operation() {
    let mut engine = TransferEngine::new(DEFAULT_BASE_ADDRESS);
    engine.add_file(Box::new(MemoryFile::new("a", 64)));
    engine.add_file(Box::new(MemoryFile::new("b", 64)));
    let (layout, mut regs) = attach(engine);

    select(&mut regs, layout, 0);
    stage(&mut regs, layout, OpKind::Read, 111, 11);
    stage(&mut regs, layout, OpKind::Write, 222, 22);
    select(&mut regs, layout, 1);
    stage(&mut regs, layout, OpKind::Read, 333, 33);

    // Registers are recomputed from the selected (file, operation) pair.
    select(&mut regs, layout, 0);
    regs.host_write(layout.operation_selector(), OpKind::Read as u32)
        .expect("select operation");
    assert_eq!(regs.host_read(layout.access_offset()).expect("offset"), 111);
    assert_eq!(regs.host_read(layout.access_length()).expect("length"), 11);
    regs.host_write(layout.operation_selector(), OpKind::Write as u32)
        .expect("select operation");
    assert_eq!(regs.host_read(layout.access_offset()).expect("offset"), 222);
    assert_eq!(regs.host_read(layout.access_length()).expect("length"), 22);

    select(&mut regs, layout, 1);
    regs.host_write(layout.operation_selector(), OpKind::Read as u32)
        .expect("select operation");
    assert_eq!(regs.host_read(layout.access_offset()).expect("offset"), 333);
    assert_eq!(regs.host_read(layout.access_length()).expect("length"), 33);
}

#[test]
fn size_register_tracks_open_and_write() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("seeded.bin");
    std::fs::write(&path, [0u8; 16]).expect("seed");

    let mut engine = TransferEngine::new(DEFAULT_BASE_ADDRESS);
    engine.add_file(Box::new(DiskFile::new(
        "seeded",
        &path,
        AccessMode::ReadWrite,
        true,
    )));
    let (layout, mut regs) = attach(engine);

    select(&mut regs, layout, 0);
    regs.host_write(layout.open_mode(), OpenMode::ReadWrite as u32)
        .expect("open mode");
    execute(&mut regs, layout, OpKind::Open);
    assert_eq!(regs.host_read(layout.file_size()).expect("size"), 16);

    stage(&mut regs, layout, OpKind::Write, 0, 4);
    regs.host_write_block(layout.access_buffer(), &[1, 2, 3, 4])
        .expect("fill buffer");
    execute(&mut regs, layout, OpKind::Write);
    assert_eq!(regs.host_read(layout.file_size()).expect("size"), 20);
}

#[test]
fn out_of_range_selector_is_ignored() {
    let (layout, mut regs) = memory_session(16);
    select(&mut regs, layout, 7);
    execute(&mut regs, layout, OpKind::Open);
    // Nothing executed, nothing recorded; the real file is untouched.
    select(&mut regs, layout, 0);
    assert_eq!(status_of(&mut regs, layout, OpKind::Open), (0, 0));
    execute(&mut regs, layout, OpKind::Open);
    assert_eq!(status_of(&mut regs, layout, OpKind::Open), (0, 0));
}

#[test]
fn unknown_operation_selector_is_ignored() {
    let (layout, mut regs) = memory_session(16);
    select(&mut regs, layout, 0);
    regs.host_write(layout.operation_selector(), 9)
        .expect("select operation");
    regs.host_write(layout.operation_execute(), 1)
        .expect("execute");
    assert_eq!(status_of(&mut regs, layout, OpKind::Open), (0, 0));
}

#[test]
fn read_only_registers_refuse_peer_writes() {
    let (layout, mut regs) = memory_session(16);
    assert!(matches!(
        regs.host_write(layout.operation_status(), 0),
        Err(RegisterError::AccessDenied(_))
    ));
    assert!(matches!(
        regs.host_write(layout.file_size(), 0),
        Err(RegisterError::AccessDenied(_))
    ));
    // The execute strobe is a command register: write-only.
    assert!(matches!(
        regs.host_read(layout.operation_execute()),
        Err(RegisterError::AccessDenied(_))
    ));
}

#[test]
fn publishing_with_no_files_is_refused() {
    let engine = TransferEngine::new(DEFAULT_BASE_ADDRESS);
    let mut bank = RegisterBank::new();
    assert!(matches!(
        engine.publish(&mut bank),
        Err(RegisterError::EmptyRegistry)
    ));
}
