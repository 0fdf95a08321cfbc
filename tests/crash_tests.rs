//! Crash tests for Scriptorium
//!
//! - Real filesystem (no mocks)
//! - The real binary, aborted at named crash points

mod crash;
