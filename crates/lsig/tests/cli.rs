//! End-to-end runs of the `lsig` binary.

use std::path::Path;
use std::process::{Command, Output};

fn lsig(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lsig"))
        .args(args)
        .env_remove("LSIG_REFERENCE")
        .env_remove("LSIG_CANDIDATE")
        .env_remove("LSIG_LOGIC_VERSION")
        .env_remove("LSIG_MAX_COST")
        .output()
        .unwrap()
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_pack_then_inspect() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("one.bin");

    let out = lsig(&[
        "pack",
        "--program",
        "0x038101",
        "--arg",
        "aabb",
        "-o",
        path_str(&input),
    ]);
    assert!(out.status.success());
    assert_eq!(
        std::fs::read(&input).unwrap(),
        vec![0x01, 0x00, 0x02, 0xaa, 0xbb, 0x03, 0x81, 0x01]
    );

    let out = lsig(&["inspect", path_str(&input)]);
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.contains("program bytes: 038101"));
    assert!(stdout.contains("#pragma version 3"));
    assert!(stdout.contains("arg 0: aabb"));
}

#[test]
fn test_run_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("empty-program"), [0x00]).unwrap();
    std::fs::write(dir.path().join("truncated"), [0x01, 0xff, 0xff]).unwrap();
    std::fs::write(dir.path().join("pushint"), [0x00, 0x03, 0x81, 0x01]).unwrap();

    let out = lsig(&["run", "-j", "2", path_str(dir.path())]);
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.contains("empty-program: interesting"));
    assert!(stdout.contains("pushint: interesting"));
    assert!(stdout.contains("truncated: skipped"));
}

#[test]
fn test_eval_rejects_skipped_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("truncated");
    std::fs::write(&input, [0x01, 0xff, 0xff]).unwrap();

    let out = lsig(&["eval", "--engine", "lowered", path_str(&input)]);
    assert_eq!(out.status.code(), Some(1));
}
