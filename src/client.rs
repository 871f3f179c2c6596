use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};

use crate::config::GateConfig;
use crate::events::{EventBus, SessionEvent};
use crate::model::{AuthenticationResult, PublicSystemInfo, ServerInfo, SystemInfo, UserDto};

mod http;
pub mod transport;

pub use self::http::RequestFailed;
use self::transport::{HttpRequest, Transport};

/// One connection to one server. Clones share state.
#[derive(Clone)]
pub struct ClientHandle {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    state: Mutex<ClientState>,
    transport: Arc<dyn Transport>,
    config: Arc<GateConfig>,
    events: Mutex<Option<EventBus>>,
}

struct ClientState {
    address: String,
    server: ServerInfo,
    access_token: Option<String>,
    user_id: Option<String>,
    system_info: Option<PublicSystemInfo>,
}

impl std::fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let st = self.state();
        f.debug_struct("ClientHandle")
            .field("server_id", &st.server.id)
            .field("address", &st.address)
            .field("logged_in", &(st.access_token.is_some() && st.user_id.is_some()))
            .finish()
    }
}

impl ClientHandle {
    pub fn new(
        address: &str,
        server: ServerInfo,
        transport: Arc<dyn Transport>,
        config: Arc<GateConfig>,
    ) -> Self {
        let access_token = server.access_token.clone();
        let user_id = server.user_id.clone();
        Self {
            inner: Arc::new(ClientInner {
                state: Mutex::new(ClientState {
                    address: address.trim_end_matches('/').to_string(),
                    server,
                    access_token,
                    user_id,
                    system_info: None,
                }),
                transport,
                config,
                events: Mutex::new(None),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, ClientState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn attach_events(&self, events: EventBus) {
        *self
            .inner
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(events);
    }

    fn publish(&self, event: SessionEvent) {
        let events = self
            .inner
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(events) = events {
            events.publish(event);
        }
    }

    pub fn same_as(&self, other: &ClientHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn server_id(&self) -> Option<String> {
        self.state().server.id.clone()
    }

    pub fn server_info(&self) -> ServerInfo {
        self.state().server.clone()
    }

    pub fn address(&self) -> String {
        self.state().address.clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.state().access_token.clone()
    }

    pub fn user_id(&self) -> Option<String> {
        self.state().user_id.clone()
    }

    /// Public info from the last successful resolution.
    pub fn last_public_info(&self) -> Option<PublicSystemInfo> {
        self.state().system_info.clone()
    }

    pub fn is_logged_in(&self) -> bool {
        let st = self.state();
        st.access_token.is_some() && st.user_id.is_some()
    }

    pub(crate) fn set_credentials(&self, user_id: &str, access_token: &str) {
        let mut st = self.state();
        st.user_id = Some(user_id.to_string());
        st.access_token = Some(access_token.to_string());
        st.server.user_id = Some(user_id.to_string());
        st.server.access_token = Some(access_token.to_string());
    }

    pub(crate) fn clear_credentials(&self) {
        let mut st = self.state();
        st.user_id = None;
        st.access_token = None;
        st.server.clear_credentials();
    }

    pub(crate) fn update_server_info(&self, server: &ServerInfo, address: &str) {
        let mut st = self.state();
        st.server = server.clone();
        st.address = address.trim_end_matches('/').to_string();
        st.access_token = server.access_token.clone();
        st.user_id = server.user_id.clone();
    }

    pub(crate) fn set_system_info(&self, info: PublicSystemInfo) {
        self.state().system_info = Some(info);
    }

    pub fn url(&self, path: &str) -> String {
        let address = self.address();
        if path.starts_with('/') {
            format!("{}{}", address, path)
        } else {
            format!("{}/{}", address, path)
        }
    }

    pub async fn public_system_info(&self) -> Result<PublicSystemInfo> {
        let req = HttpRequest::get(self.url("/System/Info/Public"));
        let resp = self.send(req, "public system info").await?;
        serde_json::from_str(&resp.body).context("parse public system info")
    }

    pub async fn system_info(&self) -> Result<SystemInfo> {
        let req = self.authed(HttpRequest::get(self.url("/System/Info")));
        let resp = self.send(req, "system info").await?;
        serde_json::from_str(&resp.body).context("parse system info")
    }

    pub async fn current_user(&self) -> Result<UserDto> {
        if self.user_id().is_none() {
            anyhow::bail!("no user signed in on this client");
        }
        let req = self.authed(HttpRequest::get(self.url("/Users/Me")));
        let resp = self.send(req, "current user").await?;
        serde_json::from_str(&resp.body).context("parse current user")
    }

    pub async fn authenticate_by_name(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthenticationResult> {
        let req = self.authed(HttpRequest::post(
            self.url("/Users/AuthenticateByName"),
            Some(serde_json::json!({
                "Username": username,
                "Pw": password,
            })),
        ));
        let resp = self.send(req, "authenticate").await?;
        serde_json::from_str(&resp.body).context("parse authentication result")
    }

    pub async fn logout(&self) -> Result<()> {
        if self.access_token().is_none() {
            return Ok(());
        }
        let req = self.authed(HttpRequest::post(self.url("/Sessions/Logout"), None));
        let result = self.send(req, "logout").await.map(|_| ());
        // The local session ends regardless of what the server said.
        self.clear_credentials();
        result
    }

    /// Fetch a server-hosted view fragment.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let req = self.authed(HttpRequest::get(url));
        let resp = self.send(req, "fetch content").await?;
        Ok(resp.body)
    }
}

#[cfg(test)]
#[path = "tests/client_tests.rs"]
mod tests;
