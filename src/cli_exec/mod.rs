use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use navgate::config::GateConfig;
use navgate::model::{ConnectionMode, ServerInfo};
use navgate::session::SessionContext;

use crate::Commands;

mod navigate;
mod routes;
mod servers;

pub(super) async fn handle_command(
    data_dir: &Path,
    base_path: Option<&str>,
    command: Commands,
) -> Result<()> {
    // Pure mapping; no session needed.
    if let Commands::RouteUrl { item, options } = &command {
        return navigate::route_url(item, options.as_deref());
    }

    let mut config = GateConfig::load_or_init(data_dir)
        .with_context(|| format!("load config from {}", data_dir.display()))?;
    if let Some(base_path) = base_path {
        config.base_path = base_path.to_string();
    }
    let session = SessionContext::open(data_dir, config)?;

    match command {
        Commands::Connect {
            no_auto_login,
            json,
        } => servers::connect(&session, no_auto_login, json).await,
        Commands::Servers { json } => servers::list(&session, json),
        Commands::AddServer { address, json } => {
            servers::add_server(&session, &address, json).await
        }
        Commands::Login {
            server,
            user,
            password,
        } => servers::login(&session, server.as_deref(), &user, &password).await,
        Commands::Logout { all } => servers::logout(&session, all).await,
        Commands::Forget { server_id } => servers::forget(&session, &server_id),
        Commands::Navigate { paths, back, json } => {
            navigate::navigate(session, paths, back, json).await
        }
        Commands::Guard { location, level } => {
            navigate::guard(session, &location, level).await
        }
        Commands::RouteUrl { .. } => Ok(()),
    }
}

/// What the CLI shows about a saved server. Tokens never leave the store.
#[derive(Debug, Serialize)]
struct ServerSummary {
    id: Option<String>,
    name: Option<String>,
    address: Option<String>,
    last_connection_mode: ConnectionMode,
    date_last_accessed: i64,
    signed_in: bool,
}

impl From<&ServerInfo> for ServerSummary {
    fn from(s: &ServerInfo) -> Self {
        Self {
            id: s.id.clone(),
            name: s.name.clone(),
            address: s.preferred_address().map(str::to_string),
            last_connection_mode: s.last_connection_mode,
            date_last_accessed: s.date_last_accessed,
            signed_in: s.access_token.is_some() && s.user_id.is_some(),
        }
    }
}

fn print_json<T: Serialize>(value: &T, what: &str) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).with_context(|| format!("serialize {} json", what))?
    );
    Ok(())
}
