//! Integration tests for the `camera-ctl` CLI binary.
//!
//! These tests exercise the compiled binary via `std::process::Command`.
//! They do **not** require a capture device; only argument handling and
//! the failure to open a device node can be tested without hardware.

use std::process::Command;

/// Helper: run the binary with the given args.
fn run(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_camera-ctl"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to execute binary")
}

// ── Help / usage ──────────────────────────────────────────────────────

#[test]
fn help_flag_shows_usage() {
    let out = run(&["--help"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Usage:"), "expected usage text");
    assert!(stdout.contains("EXAMPLES:"));
}

#[test]
fn help_lists_every_option() {
    let out = run(&["-h"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    for flag in ["-a", "-c", "-d", "-f", "-i", "-l", "-p", "-v"] {
        assert!(stdout.contains(flag), "expected {} in help", flag);
    }
    assert!(stdout.contains("/dev/video0"), "expected default device");
    assert!(stdout.contains("/boot/camera.txt"), "expected default config");
}

#[test]
fn version_flag_succeeds() {
    let out = run(&["--version"]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("camera-ctl"));
}

// ── Argument errors ───────────────────────────────────────────────────

#[test]
fn unknown_flag_exits_one() {
    let out = run(&["--bogus-flag"]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn fps_ceiling_below_range_exits_one() {
    let out = run(&["-f", "0", "-v", "/nonexistent/video0"]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("1 to 120"), "expected valid range in: {}", stderr);
}

#[test]
fn fps_ceiling_above_range_exits_one() {
    let out = run(&["-f", "121", "-v", "/nonexistent/video0"]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn fps_ceiling_not_a_number_exits_one() {
    let out = run(&["--fps-max", "fast"]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn missing_value_exits_one() {
    let out = run(&["-v"]);
    assert_eq!(out.status.code(), Some(1));
}

// ── Device errors (no hardware needed) ────────────────────────────────

#[test]
fn missing_device_exits_one() {
    let out = run(&["-v", "/nonexistent/video0"]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("/nonexistent/video0"), "expected device path in: {}", stderr);
}

#[test]
fn list_mode_on_missing_device_exits_one() {
    let out = run(&["-l", "-v", "/nonexistent/video0"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
}

#[test]
fn regular_file_is_not_a_capture_device() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("video0");
    std::fs::write(&path, b"").unwrap();

    let out = run(&["-l", "-v", path.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
}
