use anyhow::{Context, Result};
use serde::Serialize;

use navgate::model::{ConnectionResult, ConnectionState};
use navgate::resolver::ConnectOptions;
use navgate::session::SessionContext;

use super::{ServerSummary, print_json};

#[derive(Serialize)]
struct ConnectionReport {
    state: ConnectionState,
    server_id: Option<String>,
    address: Option<String>,
    servers: Vec<ServerSummary>,
}

impl From<&ConnectionResult> for ConnectionReport {
    fn from(result: &ConnectionResult) -> Self {
        Self {
            state: result.state,
            server_id: result.server_id(),
            address: result.client.as_ref().map(|c| c.address()),
            servers: result.servers.iter().map(ServerSummary::from).collect(),
        }
    }
}

fn print_result(result: &ConnectionResult, json: bool) -> Result<()> {
    if json {
        return print_json(&ConnectionReport::from(result), "connection");
    }
    println!("state: {}", result.state);
    if let Some(id) = result.server_id() {
        println!("server: {}", id);
    }
    if let Some(client) = &result.client {
        println!("address: {}", client.address());
    }
    Ok(())
}

pub(super) async fn connect(session: &SessionContext, no_auto_login: bool, json: bool) -> Result<()> {
    let options = ConnectOptions {
        enable_auto_login: no_auto_login.then_some(false),
    };
    let result = session.resolver().connect(options).await;
    print_result(&result, json)
}

pub(super) fn list(session: &SessionContext, json: bool) -> Result<()> {
    let servers: Vec<ServerSummary> = session
        .registry()
        .saved_servers()
        .iter()
        .map(ServerSummary::from)
        .collect();
    if json {
        return print_json(&servers, "servers");
    }
    if servers.is_empty() {
        println!("No saved servers");
        return Ok(());
    }
    for s in servers {
        println!(
            "{} {} {}{}",
            s.id.as_deref().unwrap_or("-"),
            s.name.as_deref().unwrap_or("-"),
            s.address.as_deref().unwrap_or("-"),
            if s.signed_in { " (signed in)" } else { "" }
        );
    }
    Ok(())
}

pub(super) async fn add_server(session: &SessionContext, address: &str, json: bool) -> Result<()> {
    let result = session
        .resolver()
        .connect_to_address(address, ConnectOptions::default())
        .await?;
    if result.state == ConnectionState::Unavailable {
        anyhow::bail!("could not reach a server at {}", address);
    }
    if let Some(client) = &result.client {
        session.registry().set_active_client(client);
    }
    print_result(&result, json)
}

pub(super) async fn login(
    session: &SessionContext,
    server: Option<&str>,
    user: &str,
    password: &str,
) -> Result<()> {
    let registry = session.registry();
    let client = match server {
        Some(id) => registry.get_or_create_client(id)?,
        None => registry
            .active_client()
            .context("no saved server (run `navgate add-server` first)")?,
    };

    let result = client
        .authenticate_by_name(user, password)
        .await
        .context("sign in")?;
    registry.on_authenticated(&client, &result);
    println!(
        "Signed in as {} on {}",
        result.user.name.as_deref().unwrap_or(&result.user.id),
        result.server_id
    );
    Ok(())
}

pub(super) async fn logout(session: &SessionContext, all: bool) -> Result<()> {
    let registry = session.registry();
    if all {
        registry.logout_all().await;
        println!("Signed out of all servers");
        return Ok(());
    }
    match registry.active_client().filter(|c| c.is_logged_in()) {
        Some(client) => {
            registry.sign_out(&client).await;
            println!("Signed out");
        }
        None => println!("Not signed in"),
    }
    Ok(())
}

pub(super) fn forget(session: &SessionContext, server_id: &str) -> Result<()> {
    if session.registry().credentials().find(server_id).is_none() {
        anyhow::bail!("server not found: {}", server_id);
    }
    session.registry().delete_server(server_id);
    println!("Removed {}", server_id);
    Ok(())
}
