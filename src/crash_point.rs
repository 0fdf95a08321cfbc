//! Crash point injection for testing durability
//!
//! Named points inside the document write path can be armed through the
//! `SCRIPTORIUM_CRASH_POINT` environment variable. When the armed point is
//! reached the process terminates via `std::process::abort()`: no cleanup,
//! no unwinding, no temp-file removal.
//!
//! # Usage
//!
//! ```ignore
//! use scriptorium::crash_point::{maybe_crash, points};
//!
//! maybe_crash(points::STORE_BEFORE_PERSIST);
//! ```
//!
//! ```bash
//! SCRIPTORIUM_CRASH_POINT=store_before_persist scriptorium write-doc comments '{}'
//! ```

use std::sync::OnceLock;

/// Environment variable naming the armed crash point
pub const CRASH_POINT_ENV: &str = "SCRIPTORIUM_CRASH_POINT";

static CRASH_POINT: OnceLock<Option<String>> = OnceLock::new();

#[inline]
fn get_crash_point() -> Option<&'static str> {
    CRASH_POINT
        .get_or_init(|| std::env::var(CRASH_POINT_ENV).ok())
        .as_deref()
}

/// Returns true if `SCRIPTORIUM_CRASH_POINT` equals the given name.
#[inline]
pub fn crash_point_enabled(name: &str) -> bool {
    get_crash_point().map(|p| p == name).unwrap_or(false)
}

/// Abort the process if the named crash point is armed.
///
/// No-op when the environment variable is unset or names another point.
#[inline]
pub fn maybe_crash(name: &str) {
    if crash_point_enabled(name) {
        eprintln!("[CRASH] Triggering crash at point: {}", name);
        std::process::abort();
    }
}

/// All defined crash point names
pub mod points {
    /// Half of the serialized document is in the temp file
    pub const STORE_MID_TEMP_WRITE: &str = "store_mid_temp_write";
    /// Temp file is complete and synced, target not yet replaced
    pub const STORE_BEFORE_PERSIST: &str = "store_before_persist";
    /// Target replaced, directory not yet synced
    pub const STORE_AFTER_PERSIST: &str = "store_after_persist";

    pub fn all() -> &'static [&'static str] {
        &[STORE_MID_TEMP_WRITE, STORE_BEFORE_PERSIST, STORE_AFTER_PERSIST]
    }
}
