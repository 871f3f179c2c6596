use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};

use crate::client::ClientHandle;
use crate::client::transport::Transport;
use crate::config::GateConfig;
use crate::events::{EventBus, SessionEvent};
use crate::model::{AuthenticationResult, ConnectionMode, Credentials, ServerInfo};
use crate::store::CredentialStore;

/// Owns every `ClientHandle` and the single active-client pointer.
///
/// Persistence is best-effort: failures are logged and never surface to
/// navigation.
pub struct ConnectionRegistry {
    store: CredentialStore,
    transport: Arc<dyn Transport>,
    config: Arc<GateConfig>,
    events: EventBus,
    state: Mutex<RegistryState>,
}

#[derive(Default)]
struct RegistryState {
    clients: Vec<ClientHandle>,
    active: Option<ClientHandle>,
}

pub(crate) fn now_millis() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

impl ConnectionRegistry {
    pub fn new(
        store: CredentialStore,
        transport: Arc<dyn Transport>,
        config: Arc<GateConfig>,
        events: EventBus,
    ) -> Self {
        Self {
            store,
            transport,
            config,
            events,
            state: Mutex::new(RegistryState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &Arc<GateConfig> {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn credentials(&self) -> Credentials {
        self.store.credentials()
    }

    fn persist(&self, label: &str, f: impl FnOnce(&mut Credentials)) {
        if let Err(err) = self.store.update(f) {
            tracing::warn!("{}: {:#}", label, err);
        }
    }

    pub fn clients(&self) -> Vec<ClientHandle> {
        self.state().clients.clone()
    }

    pub fn get_client(&self, server_id: &str) -> Option<ClientHandle> {
        self.state()
            .clients
            .iter()
            .find(|c| {
                c.server_id()
                    .is_some_and(|id| id.eq_ignore_ascii_case(server_id))
            })
            .cloned()
    }

    /// Build a handle that shares this registry's transport and config.
    pub fn new_client(&self, address: &str, server: ServerInfo) -> ClientHandle {
        ClientHandle::new(address, server, self.transport.clone(), self.config.clone())
    }

    /// Register a handle created outside the registry.
    ///
    /// Idempotent per server id (or per address for handles without one):
    /// the already-registered handle is returned in that case.
    pub fn add_client(&self, handle: ClientHandle) -> ClientHandle {
        let address = handle.address();
        {
            let st = self.state();
            let existing = st.clients.iter().find(|c| {
                c.same_as(&handle)
                    || match (c.server_id(), handle.server_id()) {
                        (Some(a), Some(b)) => a.eq_ignore_ascii_case(&b),
                        _ => c.address().eq_ignore_ascii_case(&address),
                    }
            });
            if let Some(existing) = existing {
                return existing.clone();
            }
        }

        let creds = self.store.credentials();
        let mut server = creds
            .servers
            .iter()
            .find(|s| s.has_address(&address))
            .cloned()
            .unwrap_or_else(|| handle.server_info());
        server.date_last_accessed = now_millis();
        server.last_connection_mode = ConnectionMode::Manual;
        server.manual_address = Some(address.clone());
        let info = handle.server_info();
        if info.manual_address_only {
            server.manual_address_only = true;
        }
        if server.id.is_none() {
            server.id = info.id;
        }
        if server.access_token.is_none() {
            server.access_token = info.access_token;
            server.user_id = info.user_id;
        }
        handle.update_server_info(&server, &address);

        self.persist("save added server", |c| c.add_or_update(&server));
        self.register(handle.clone());
        handle
    }

    fn register(&self, handle: ClientHandle) {
        handle.attach_events(self.events.clone());
        self.state().clients.push(handle.clone());
        self.events.publish(SessionEvent::ClientCreated {
            server_id: handle.server_id(),
            address: handle.address(),
        });
    }

    /// Existing handle for `server`'s id, or a new one at `address`.
    pub fn get_or_add_client(&self, server: &ServerInfo, address: &str) -> ClientHandle {
        if let Some(id) = &server.id
            && let Some(existing) = self.get_client(id)
        {
            return existing;
        }
        let handle = self.new_client(address, server.clone());
        self.register(handle.clone());
        handle
    }

    pub fn get_or_create_client(&self, server_id: &str) -> Result<ClientHandle> {
        let creds = self.store.credentials();
        let server = creds
            .find(server_id)
            .cloned()
            .with_context(|| format!("server not found: {}", server_id))?;
        let address = server
            .preferred_address()
            .map(str::to_string)
            .with_context(|| format!("server {} has no address", server_id))?;
        Ok(self.get_or_add_client(&server, &address))
    }

    /// Create handles for every saved server that has an id.
    pub fn restore_clients(&self) -> Vec<ClientHandle> {
        for server in self.store.credentials().sorted_servers() {
            if let (Some(_), Some(address)) = (&server.id, server.preferred_address()) {
                let address = address.to_string();
                self.get_or_add_client(&server, &address);
            }
        }
        self.clients()
    }

    pub fn set_active_client(&self, handle: &ClientHandle) {
        let handle = self.add_client(handle.clone());
        let server_id = handle.server_id();
        self.state().active = Some(handle);
        self.persist("save current server", |c| c.current_server_id = server_id);
    }

    /// The active handle, else the server that was active when the store was
    /// last written, else the most recently used saved server.
    ///
    /// Never cache the result across an await point.
    pub fn active_client(&self) -> Option<ClientHandle> {
        if let Some(active) = self.state().active.clone() {
            return Some(active);
        }
        let creds = self.store.credentials();
        let remembered = creds
            .current_server_id
            .as_deref()
            .and_then(|id| creds.find(id))
            .and_then(|s| s.id.clone());
        let last_used = match remembered {
            Some(id) => id,
            None => creds.sorted_servers().into_iter().find_map(|s| s.id)?,
        };
        self.get_or_create_client(&last_used).ok()
    }

    pub fn saved_servers(&self) -> Vec<ServerInfo> {
        self.store.credentials().sorted_servers()
    }

    /// Forget the handle's credentials and drop it from the registry.
    pub fn remove_client(&self, handle: &ClientHandle) {
        let server_id = handle.server_id();
        handle.clear_credentials();
        {
            let mut st = self.state();
            st.clients.retain(|c| !c.same_as(handle));
            if st.active.as_ref().is_some_and(|a| a.same_as(handle)) {
                st.active = None;
            }
        }
        if let Some(id) = &server_id {
            self.persist("clear server credentials", |c| {
                c.clear_credentials_for(id);
                if c.current_server_id.as_deref() == Some(id.as_str()) {
                    c.current_server_id = None;
                }
            });
        }
        self.events
            .publish(SessionEvent::LocalUserSignedOut { server_id });
    }

    /// Log out on the server (best effort), then `remove_client`.
    pub async fn sign_out(&self, handle: &ClientHandle) {
        if let Err(err) = handle.logout().await {
            tracing::warn!("logout on server failed: {:#}", err);
        }
        self.remove_client(handle);
    }

    /// Log out every handle holding a token and clear all stored tokens.
    pub async fn logout_all(&self) {
        for client in self.clients() {
            if client.access_token().is_none() {
                continue;
            }
            if let Err(err) = client.logout().await {
                tracing::warn!("logout on server failed: {:#}", err);
            }
            self.events.publish(SessionEvent::LocalUserSignedOut {
                server_id: client.server_id(),
            });
        }
        self.persist("clear stored tokens", |c| {
            for server in &mut c.servers {
                server.clear_credentials();
            }
        });
    }

    /// Record a successful sign-in and make the handle active.
    pub fn on_authenticated(&self, handle: &ClientHandle, result: &AuthenticationResult) {
        let creds = self.store.credentials();
        let mut server = creds
            .find(&result.server_id)
            .cloned()
            .unwrap_or_else(|| handle.server_info());
        server.date_last_accessed = now_millis();
        server.id = Some(result.server_id.clone());
        server.user_id = Some(result.user.id.clone());
        server.access_token = Some(result.access_token.clone());

        self.persist("save credentials", |c| c.add_or_update(&server));
        handle.update_server_info(&server, &handle.address());
        handle.set_credentials(&result.user.id, &result.access_token);

        let handle = self.add_client(handle.clone());
        self.set_active_client(&handle);
        self.events.publish(SessionEvent::LocalUserSignedIn {
            server_id: result.server_id.clone(),
            user_id: result.user.id.clone(),
        });
    }

    /// Persist a server record produced by a connection attempt.
    pub(crate) fn save_server(&self, server: &ServerInfo) {
        self.persist("save server", |c| c.add_or_update(server));
    }

    /// Overwrite a server's stored token state (used after token validation).
    pub(crate) fn store_server_credentials(&self, server: &ServerInfo) {
        let Some(id) = server.id.clone() else {
            return;
        };
        let user_id = server.user_id.clone();
        let token = server.access_token.clone();
        self.persist("save server credentials", |c| {
            if let Some(s) = c
                .servers
                .iter_mut()
                .find(|s| s.id.as_deref() == Some(id.as_str()))
            {
                s.user_id = user_id;
                s.access_token = token;
            }
        });
    }

    pub fn delete_server(&self, server_id: &str) {
        if let Some(client) = self.get_client(server_id) {
            let mut st = self.state();
            st.clients.retain(|c| !c.same_as(&client));
            if st.active.as_ref().is_some_and(|a| a.same_as(&client)) {
                st.active = None;
            }
        }
        let id = server_id.to_string();
        self.persist("delete server", |c| {
            c.servers
                .retain(|s| !s.id.as_deref().is_some_and(|sid| sid.eq_ignore_ascii_case(&id)));
            if c.current_server_id.as_deref() == Some(id.as_str()) {
                c.current_server_id = None;
            }
        });
    }

    /// Clear the active pointer without touching credentials (session teardown).
    pub(crate) fn clear_active(&self) {
        self.state().active = None;
    }
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
