//! CLI argument definitions using clap
//!
//! Commands:
//! - scriptorium init --config <path>
//! - scriptorium start --config <path> [--port <port>]
//! - scriptorium grant <user> <role>
//! - scriptorium revoke <user>
//! - scriptorium session <id> <username> [--avatar <url>]
//! - scriptorium write-doc <key> <json>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::auth::Role;
use crate::config::DEFAULT_CONFIG_PATH;

/// Scriptorium - page comments, roles and profiles over JSON documents
#[derive(Parser, Debug)]
#[command(name = "scriptorium")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the data directory
    Init {
        /// Path to configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },

    /// Serve the HTTP API
    Start {
        /// Path to configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Set a permissions entry (username or identity id)
    Grant {
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        user: String,

        /// user, admin or owner
        role: Role,
    },

    /// Remove a permissions entry
    Revoke {
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        user: String,
    },

    /// Upsert an identity and print a session token for it
    Session {
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        id: String,

        username: String,

        #[arg(long)]
        avatar: Option<String>,
    },

    /// Replace a whole document with the given JSON
    WriteDoc {
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        key: String,

        json: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
