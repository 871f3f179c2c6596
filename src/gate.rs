use std::sync::Arc;

use anyhow::Result;
use futures_util::future::try_join_all;

use crate::client::ClientHandle;
use crate::host::{AppHost, Notifier};
use crate::model::{ConnectionResult, ConnectionState, NavigationRequest, RouteType};
use crate::resolver::{ConnectOptions, WizardProbe};
use crate::session::SessionContext;

pub const HOME_PATH: &str = "/home";
pub const LOGIN_PATH: &str = "/login";
pub const SELECT_SERVER_PATH: &str = "/selectserver";
pub const WIZARD_START_PATH: &str = "/wizard/start";

pub const UPDATE_NEEDED_MESSAGE: &str =
    "This server is too old for this client. Please update the server to continue.";

pub fn login_path(server_id: Option<&str>) -> String {
    match server_id {
        Some(id) => format!("{}?serverid={}", LOGIN_PATH, id),
        None => LOGIN_PATH.to_string(),
    }
}

/// What the router should do with a navigation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    /// Navigate here instead.
    Redirect(String),
    /// Back past the start page. The host was asked to exit if it can.
    Exit,
}

/// Per-navigation authorization.
pub struct AuthGate {
    session: Arc<SessionContext>,
    host: Arc<dyn AppHost>,
    notifier: Arc<dyn Notifier>,
}

impl AuthGate {
    pub fn new(
        session: Arc<SessionContext>,
        host: Arc<dyn AppHost>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            session,
            host,
            notifier,
        }
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub async fn authorize(&self, request: &NavigationRequest) -> GateDecision {
        if let Some(first) = self.session.take_first_connection() {
            match first.state {
                ConnectionState::SignedIn => {}
                ConnectionState::ServerSignIn => return self.consume_server_sign_in(&first).await,
                _ => return self.handle_connection_result(&first),
            }
        }

        let route = &request.route;
        let current_is_startup = self
            .session
            .current_route()
            .map(|c| c.route.startup)
            .unwrap_or(true);
        if request.is_back && route.is_default_route && current_is_startup {
            tracing::debug!(path = %request.path, "back past the start page");
            if self.host.supports("exit") {
                self.host.exit();
            }
            return GateDecision::Exit;
        }

        let client = self.session.registry().active_client();
        let logged_in = client.as_ref().is_some_and(ClientHandle::is_logged_in);

        if !logged_in {
            if route.anonymous {
                tracing::debug!(path = %request.path, "anonymous route");
                return GateDecision::Proceed;
            }
            tracing::debug!(path = %request.path, "route needs a signed-in user");
            return self.begin_connection_wizard().await;
        }

        if route.is_default_route && route.route_type != RouteType::Home {
            return GateDecision::Redirect(HOME_PATH.to_string());
        }

        let roles = route.required_roles();
        if let Some(client) = client
            && !roles.is_empty()
            && let Err(err) = validate_roles(&client, &roles).await
        {
            tracing::debug!(path = %request.path, "role check failed: {:#}", err);
            return self.begin_connection_wizard().await;
        }

        tracing::debug!(path = %request.path, "proceeding");
        GateDecision::Proceed
    }

    /// The startup result asked for a sign-in. A server whose first-run
    /// wizard has not completed goes to the wizard instead.
    async fn consume_server_sign_in(&self, first: &ConnectionResult) -> GateDecision {
        let Some(client) = &first.client else {
            return self.handle_connection_result(first);
        };
        match self.session.resolver().probe_startup_wizard(client).await {
            WizardProbe::Incomplete => {
                self.session.registry().set_active_client(client);
                GateDecision::Redirect(WIZARD_START_PATH.to_string())
            }
            WizardProbe::Completed | WizardProbe::Unknown => self.handle_connection_result(first),
        }
    }

    /// Re-run resolution and redirect to wherever it lands.
    pub async fn begin_connection_wizard(&self) -> GateDecision {
        let result = self
            .session
            .resolver()
            .connect(ConnectOptions::default())
            .await;
        self.handle_connection_result(&result)
    }

    pub fn handle_connection_result(&self, result: &ConnectionResult) -> GateDecision {
        let target = match result.state {
            ConnectionState::SignedIn => HOME_PATH.to_string(),
            ConnectionState::ServerSignIn => login_path(result.server_id().as_deref()),
            ConnectionState::ServerSelection | ConnectionState::Unavailable => {
                SELECT_SERVER_PATH.to_string()
            }
            ConnectionState::ServerUpdateNeeded => {
                self.notifier.alert(UPDATE_NEEDED_MESSAGE);
                SELECT_SERVER_PATH.to_string()
            }
        };
        tracing::debug!(state = %result.state, target = %target, "connection result");
        GateDecision::Redirect(target)
    }
}

/// Every role must pass. Checks run concurrently.
pub async fn validate_roles(client: &ClientHandle, roles: &[&str]) -> Result<()> {
    let checks = roles
        .iter()
        .map(|role| validate_role(client.clone(), role.to_string()));
    try_join_all(checks).await?;
    Ok(())
}

async fn validate_role(client: ClientHandle, role: String) -> Result<()> {
    if role == "admin" {
        let user = client.current_user().await?;
        if !user.policy.is_administrator {
            anyhow::bail!("user {} is not an administrator", user.id);
        }
    }
    // Unknown roles pass.
    Ok(())
}

#[cfg(test)]
#[path = "tests/gate_tests.rs"]
mod tests;
