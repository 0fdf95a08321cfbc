//! Crash test harness for subprocess management
//!
//! Runs `scriptorium write-doc` with `SCRIPTORIUM_CRASH_POINT` armed and the
//! data directory pointed at a temp dir.

use std::path::Path;
use std::process::{Command, ExitStatus};

use scriptorium::config::DATA_DIR_ENV;
use scriptorium::crash_point::CRASH_POINT_ENV;

/// Result of a crash test execution
#[derive(Debug)]
pub struct CrashTestResult {
    /// Whether the process died instead of exiting cleanly
    pub crashed: bool,
    pub exit_status: Option<ExitStatus>,
    pub stdout: String,
    pub stderr: String,
}

/// Replace document `key` with `json` in a subprocess.
///
/// `crash_point` of `None` runs without injection.
pub fn write_doc_with_crash_point(
    crash_point: Option<&str>,
    data_dir: &Path,
    key: &str,
    json: &str,
) -> CrashTestResult {
    let config_path = data_dir.join("absent-config.json");
    let mut command = Command::new(env!("CARGO_BIN_EXE_scriptorium"));
    command
        .arg("write-doc")
        .arg("--config")
        .arg(&config_path)
        .arg(key)
        .arg(json)
        .env(DATA_DIR_ENV, data_dir)
        .env("RUST_LOG", "scriptorium=debug")
        .env_remove(CRASH_POINT_ENV);
    if let Some(point) = crash_point {
        command.env(CRASH_POINT_ENV, point);
    }

    match command.output() {
        Ok(output) => CrashTestResult {
            crashed: !output.status.success(),
            exit_status: Some(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        },
        Err(e) => CrashTestResult {
            crashed: true,
            exit_status: None,
            stdout: String::new(),
            stderr: format!("Failed to execute: {}", e),
        },
    }
}

/// Report crash test failure
pub fn report_failure(crash_point: &str, expected: &str, result: &CrashTestResult) {
    eprintln!("=== CRASH TEST FAILURE ===");
    eprintln!("Crash point: {}", crash_point);
    eprintln!("Expected: {}", expected);
    eprintln!("Exit status: {:?}", result.exit_status);
    eprintln!("stdout:\n{}", result.stdout);
    eprintln!("stderr:\n{}", result.stderr);
    eprintln!("==========================");
}
