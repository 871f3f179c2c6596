use std::cmp::Ordering;
use std::sync::Arc;

use anyhow::Result;

use crate::client::ClientHandle;
use crate::events::SessionEvent;
use crate::model::{
    ConnectionMode, ConnectionResult, ConnectionState, PublicSystemInfo, ServerInfo,
};
use crate::registry::{ConnectionRegistry, now_millis};

mod reconnect;

/// Per-call overrides. `None` falls back to the config.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConnectOptions {
    pub enable_auto_login: Option<bool>,
}

/// Outcome of the first-run wizard check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WizardProbe {
    Completed,
    Incomplete,
    /// The probe failed. Treated as "wizard not needed".
    Unknown,
}

/// Computes a `ConnectionResult` from saved servers and their reachability.
#[derive(Clone)]
pub struct ConnectionResolver {
    registry: Arc<ConnectionRegistry>,
}

impl ConnectionResolver {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Resolve against the saved servers. Never fails: every error degrades to
    /// `ServerSelection`.
    pub async fn connect(&self, options: ConnectOptions) -> ConnectionResult {
        let servers = self.registry.saved_servers();
        tracing::debug!(servers = servers.len(), "connect");
        self.connect_to_servers(servers, options).await
    }

    pub async fn connect_to_servers(
        &self,
        servers: Vec<ServerInfo>,
        options: ConnectOptions,
    ) -> ConnectionResult {
        let Some(first) = servers.first().cloned() else {
            return ConnectionResult::server_selection(servers);
        };
        let mut result = self.connect_to_server(first, options).await;
        if result.state == ConnectionState::Unavailable {
            result.state = ConnectionState::ServerSelection;
        }
        tracing::debug!(state = %result.state, "connect_to_servers resolved");
        result
    }

    /// One server. May return `Unavailable`.
    pub async fn connect_to_server(
        &self,
        mut server: ServerInfo,
        options: ConnectOptions,
    ) -> ConnectionResult {
        let reached = match self.try_reconnect(&server).await {
            Ok(reached) => reached,
            Err(err) => {
                tracing::debug!("server unreachable: {:#}", err);
                return ConnectionResult::unavailable();
            }
        };

        let reported = reached.info.version.as_deref().unwrap_or("0");
        if compare_versions(&self.registry.config().min_server_version, reported)
            == Ordering::Greater
        {
            tracing::info!(
                version = reported,
                min = %self.registry.config().min_server_version,
                "server is older than the minimum supported version"
            );
            return ConnectionResult {
                state: ConnectionState::ServerUpdateNeeded,
                client: None,
                servers: vec![server],
            };
        }

        if let (Some(known), Some(found)) = (&server.id, &reached.info.id)
            && known != found
        {
            tracing::info!(known = %known, found = %found, "server id changed");
            return ConnectionResult::unavailable();
        }

        let auto_login = options
            .enable_auto_login
            .unwrap_or(self.registry.config().enable_auto_login);
        if !auto_login {
            server.clear_credentials();
        } else if server.access_token.is_some() {
            self.validate_authentication(&mut server, &reached.url).await;
        }

        self.on_successful_connection(server, reached, auto_login)
            .await
    }

    async fn on_successful_connection(
        &self,
        mut server: ServerInfo,
        reached: reconnect::Reached,
        auto_login: bool,
    ) -> ConnectionResult {
        server.apply_public_info(&reached.info);
        server.last_connection_mode = reached.mode;
        server.date_last_accessed = now_millis();
        self.registry.save_server(&server);

        let client = self.registry.get_or_add_client(&server, &reached.url);
        client.update_server_info(&server, &reached.url);
        client.set_system_info(reached.info);

        let state = if server.access_token.is_some() && auto_login {
            ConnectionState::SignedIn
        } else {
            ConnectionState::ServerSignIn
        };

        if state == ConnectionState::SignedIn {
            self.registry.set_active_client(&client);
            match client.current_user().await {
                Ok(user) => self.registry.events().publish(SessionEvent::LocalUserSignedIn {
                    server_id: server.id.clone().unwrap_or_default(),
                    user_id: user.id,
                }),
                Err(err) => tracing::warn!("fetch current user: {:#}", err),
            }
        }

        self.registry.events().publish(SessionEvent::Connected {
            state,
            server_id: server.id.clone(),
        });

        ConnectionResult {
            state,
            client: Some(client),
            servers: vec![server],
        }
    }

    /// Check a stored token against `/System/Info`. A rejected token is
    /// cleared, in memory and on disk; the connection itself still succeeds.
    async fn validate_authentication(&self, server: &mut ServerInfo, url: &str) {
        let probe = self.registry.new_client(url, server.clone());
        match probe.system_info().await {
            Ok(info) => {
                if let Some(name) = info.server_name {
                    server.name = Some(name);
                }
                if let Some(local) = info.local_address {
                    server.local_address = Some(local);
                }
            }
            Err(err) => {
                tracing::info!("stored token rejected: {:#}", err);
                server.clear_credentials();
                self.registry.store_server_credentials(server);
            }
        }
    }

    /// Connect to a user-entered address. Without a scheme, https is tried
    /// before http.
    pub async fn connect_to_address(
        &self,
        address: &str,
        options: ConnectOptions,
    ) -> Result<ConnectionResult> {
        let address = normalize_address(address);
        if address.is_empty() {
            anyhow::bail!("server address is empty");
        }

        let candidates = if has_scheme(&address) {
            vec![address]
        } else {
            vec![format!("https://{}", address), format!("http://{}", address)]
        };

        for url in candidates {
            let server = ServerInfo::from_manual_address(&url);
            let result = self.connect_to_server(server, options).await;
            if result.state != ConnectionState::Unavailable {
                return Ok(result);
            }
            tracing::debug!(url = %url, "connect_to_address attempt failed");
        }
        Ok(ConnectionResult::unavailable())
    }

    /// Ask the server whether its first-run wizard still has to run.
    pub async fn probe_startup_wizard(&self, client: &ClientHandle) -> WizardProbe {
        match client.public_system_info().await {
            Ok(info) => wizard_state(&info),
            Err(err) => {
                tracing::warn!("startup wizard probe failed: {:#}", err);
                WizardProbe::Unknown
            }
        }
    }
}

pub(crate) fn wizard_state(info: &PublicSystemInfo) -> WizardProbe {
    if info.startup_wizard_completed == Some(false) {
        WizardProbe::Incomplete
    } else {
        WizardProbe::Completed
    }
}

pub fn normalize_address(address: &str) -> String {
    let address = address.trim();
    if let Some(rest) = address.strip_prefix("Https:") {
        format!("https:{}", rest)
    } else if let Some(rest) = address.strip_prefix("Http:") {
        format!("http:{}", rest)
    } else {
        address.to_string()
    }
}

fn has_scheme(address: &str) -> bool {
    address
        .split_once("://")
        .is_some_and(|(scheme, _)| !scheme.is_empty() && !scheme.contains(':'))
}

/// Dotted numeric comparison. Missing or non-numeric parts count as 0.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let parse = |v: &str| -> Vec<u64> {
        v.split('.')
            .map(|part| {
                let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
                digits.parse().unwrap_or(0)
            })
            .collect()
    };
    let (a, b) = (parse(a), parse(b));
    let len = a.len().max(b.len());
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

impl ConnectionMode {
    /// Start delay for this mode in the reconnect race.
    fn stagger_ms(self) -> u64 {
        match self {
            Self::Local => 0,
            Self::Manual => 100,
            Self::Remote => 200,
        }
    }
}

#[cfg(test)]
#[path = "tests/resolver_tests.rs"]
mod tests;
