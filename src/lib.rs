//! scriptorium - page comments, roles and profiles over atomic JSON documents
//!
//! Every collection (comments, permissions, users, sessions, profiles,
//! activity) is one JSON document, rewritten whole on each mutation under a
//! per-document lock and committed with an atomic replace.

pub mod activity;
pub mod auth;
pub mod cli;
pub mod comments;
pub mod config;
pub mod crash_point;
pub mod http_server;
pub mod observability;
pub mod profiles;
pub mod store;
pub mod timestamp;
