//! CLI module for Scriptorium
//!
//! Provides command-line interface for:
//! - init: Create the data directory
//! - start: Serve the HTTP API
//! - grant / revoke: Offline permissions administration
//! - session: Development login without the OAuth flow
//! - write-doc: Replace a document wholesale

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{grant, init, revoke, run, run_command, session, start, write_doc};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::write_response;
