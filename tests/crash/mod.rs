//! Crash testing framework for Scriptorium
//!
//! - Crash injection at the named points of the document write path
//! - Subprocess management (the real binary, aborted mid-write)
//! - Post-crash validation of the on-disk documents

pub mod harness;
pub mod scenarios;
pub mod utils;
