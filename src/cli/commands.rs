//! CLI command implementations

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::info;

use crate::activity::ActivityLog;
use crate::auth::{AuthorityResolver, IdentityProfile, Role};
use crate::config::Config;
use crate::http_server::{session_cookie, AppState, HttpServer};
use crate::observability::init_logging;
use crate::store::{DocumentStore, FileDocumentStore};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::write_response;

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Start { config, port } => start(&config, port),
        Command::Grant { config, user, role } => grant(&config, &user, role),
        Command::Revoke { config, user } => revoke(&config, &user),
        Command::Session {
            config,
            id,
            username,
            avatar,
        } => session(&config, &id, &username, avatar),
        Command::WriteDoc { config, key, json } => write_doc(&config, &key, &json),
    }
}

fn load_config(config_path: &Path) -> CliResult<Config> {
    let config = Config::load(config_path)?;
    init_logging(config.log_format);
    Ok(config)
}

fn open_store(config: &Config) -> CliResult<Arc<dyn DocumentStore>> {
    let store = FileDocumentStore::open(&config.data_dir)?;
    Ok(Arc::new(store))
}

fn authority(config: &Config, store: Arc<dyn DocumentStore>) -> AuthorityResolver {
    let activity = ActivityLog::new(store.clone(), config.activity_limit);
    AuthorityResolver::new(store, activity, config.authority_config())
}

/// Create the data directory.
///
/// Refuses to run twice on the same directory.
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let data_dir = config.data_dir.as_path();

    if data_dir.exists() {
        return Err(CliError::already_initialized(data_dir));
    }
    fs::create_dir_all(data_dir).map_err(|e| {
        CliError::io_error(format!("Failed to create directory {:?}: {}", data_dir, e))
    })?;

    info!(data_dir = %data_dir.display(), "data directory initialized");
    write_response(json!({"initialized": true, "data_dir": data_dir.display().to_string()}))
}

/// Serve the HTTP API until the process is stopped.
pub fn start(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let mut config = load_config(config_path)?;
    if let Some(port) = port {
        config.server.port = port;
    }
    if !config.data_dir.is_dir() {
        return Err(CliError::not_initialized(&config.data_dir));
    }

    let store = open_store(&config)?;
    let state = Arc::new(AppState::new(
        store,
        config.authority_config(),
        config.activity_limit,
    ));

    let purged = state.authority.purge_expired_sessions()?;
    if purged > 0 {
        info!(purged, "expired sessions removed");
    }

    let server = HttpServer::new(config.server.clone(), state);
    info!(
        addr = %server.socket_addr(),
        data_dir = %config.data_dir.display(),
        "starting scriptorium"
    );

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;
    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Set a permissions map entry without an authority check.
pub fn grant(config_path: &Path, user: &str, role: Role) -> CliResult<()> {
    let config = load_config(config_path)?;
    let authority = authority(&config, open_store(&config)?);
    authority.grant(user, role)?;
    write_response(json!({"user": user, "role": role}))
}

pub fn revoke(config_path: &Path, user: &str) -> CliResult<()> {
    let config = load_config(config_path)?;
    let authority = authority(&config, open_store(&config)?);
    let removed = authority.revoke_permission(user)?;
    write_response(json!({"user": user, "removed": removed}))
}

/// Upsert an identity and open a session for it.
pub fn session(config_path: &Path, id: &str, username: &str, avatar: Option<String>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let authority = authority(&config, open_store(&config)?);

    let mut profile = IdentityProfile::new(id, username);
    if let Some(avatar) = avatar {
        profile = profile.with_avatar(avatar);
    }
    let (identity, token) = authority.login(profile)?;
    let role = authority.effective_role(&identity);

    write_response(json!({
        "user": {
            "id": identity.id,
            "username": identity.username,
            "role": role,
        },
        "token": token,
        "cookie": session_cookie(&token, config.session_max_age_secs()),
    }))
}

/// Replace a document wholesale.
pub fn write_doc(config_path: &Path, key: &str, raw: &str) -> CliResult<()> {
    let config = load_config(config_path)?;
    let value: Value = serde_json::from_str(raw)?;
    let store = open_store(&config)?;
    store.write(key, &value)?;
    write_response(json!({"key": key, "written": true}))
}
