use std::sync::Arc;

use anyhow::{Context, Result};

use crate::client::ClientHandle;
use crate::gate::{HOME_PATH, LOGIN_PATH, SELECT_SERVER_PATH, WIZARD_START_PATH};
use crate::model::{ConnectionResult, ConnectionState, PublicSystemInfo};
use crate::resolver::ConnectOptions;
use crate::router::{encode_component, split_query};
use crate::session::SessionContext;

/// Product name a public info response must mention to count as a server.
const SERVER_PRODUCT: &str = "jellyfin";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AccessLevel {
    Admin,
    #[default]
    User,
    Public,
    Wizard,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GuardProps {
    pub level: AccessLevel,
}

impl GuardProps {
    pub fn new(level: AccessLevel) -> Self {
        Self { level }
    }

    pub fn from_flags(is_admin_route: bool, is_user_route: bool) -> Self {
        let level = if is_admin_route {
            AccessLevel::Admin
        } else if is_user_route {
            AccessLevel::User
        } else {
            AccessLevel::Public
        };
        Self { level }
    }

    /// Comma-separated roles; `admin` makes the route an admin route.
    pub fn from_roles(roles: &str) -> Self {
        if roles.split(',').any(|r| r.trim() == "admin") {
            Self::new(AccessLevel::Admin)
        } else {
            Self::new(AccessLevel::User)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardOutcome {
    Render,
    Navigate(String),
    /// Show the connection error page for this state.
    Error(ConnectionState),
    /// Nothing usable answered; offer to add a server.
    NoServerFound,
}

/// Render-time mirror of the auth gate for component-tree routing.
pub struct RouteGuard {
    session: Arc<SessionContext>,
    props: GuardProps,
    loading: bool,
    outcome: Option<GuardOutcome>,
}

impl RouteGuard {
    pub fn new(session: Arc<SessionContext>, props: GuardProps) -> Self {
        Self {
            session,
            props,
            loading: true,
            outcome: None,
        }
    }

    pub fn props(&self) -> GuardProps {
        self.props
    }

    /// True until an evaluation settles on something other than navigating away.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn outcome(&self) -> Option<&GuardOutcome> {
        self.outcome.as_ref()
    }

    pub fn should_render_children(&self) -> bool {
        !self.loading && self.outcome == Some(GuardOutcome::Render)
    }

    /// Re-evaluate if the access level changed. Returns the new outcome.
    pub async fn set_props(&mut self, props: GuardProps, location: &str) -> Option<GuardOutcome> {
        if props == self.props {
            return None;
        }
        self.props = props;
        Some(self.evaluate(location).await)
    }

    /// `location` is the current pathname plus query string.
    pub async fn evaluate(&mut self, location: &str) -> GuardOutcome {
        self.loading = true;
        let outcome = self.decide(location).await;
        tracing::debug!(location, ?outcome, level = ?self.props.level, "route guard");
        self.loading = matches!(outcome, GuardOutcome::Navigate(_));
        self.outcome = Some(outcome.clone());
        outcome
    }

    async fn decide(&self, location: &str) -> GuardOutcome {
        let (pathname, _) = split_query(location);

        let first = if self.session.has_connected() {
            None
        } else {
            let result = self
                .session
                .resolver()
                .connect(ConnectOptions::default())
                .await;
            self.session.mark_connected();
            Some(result)
        };

        // Unreachable servers already come back as ServerSelection.
        if let Some(first) = &first
            && first.state == ConnectionState::ServerUpdateNeeded
        {
            if pathname == "/" {
                return GuardOutcome::Navigate(SELECT_SERVER_PATH.to_string());
            }
            return GuardOutcome::Error(first.state);
        }

        if self.props.level == AccessLevel::Wizard {
            return self.handle_wizard(first.as_ref()).await;
        }

        let logged_in = self
            .session
            .registry()
            .active_client()
            .is_some_and(|c| c.is_logged_in());
        if let Some(first) = &first
            && first.state != ConnectionState::SignedIn
            && !logged_in
        {
            return self.handle_incomplete_wizard(first, location).await;
        }

        self.validate_user_access(location).await
    }

    async fn handle_wizard(&self, first: Option<&ConnectionResult>) -> GuardOutcome {
        let client = first
            .and_then(|f| f.client.clone())
            .or_else(|| self.session.registry().active_client());
        let Some(client) = client else {
            return GuardOutcome::NoServerFound;
        };
        match fetch_public_system_info(&client).await {
            Ok(info) if info.startup_wizard_completed == Some(true) => {
                GuardOutcome::Navigate(HOME_PATH.to_string())
            }
            Ok(_) => {
                self.session.registry().set_active_client(&client);
                GuardOutcome::Render
            }
            Err(err) => {
                tracing::warn!("wizard check failed: {:#}", err);
                GuardOutcome::NoServerFound
            }
        }
    }

    async fn handle_incomplete_wizard(
        &self,
        first: &ConnectionResult,
        location: &str,
    ) -> GuardOutcome {
        if first.state == ConnectionState::ServerSignIn
            && let Some(client) = &first.client
        {
            match fetch_public_system_info(client).await {
                Ok(info) if info.startup_wizard_completed != Some(true) => {
                    self.session.registry().set_active_client(client);
                    return GuardOutcome::Navigate(WIZARD_START_PATH.to_string());
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!("invalid server detected: {:#}", err);
                    return GuardOutcome::NoServerFound;
                }
            }
        }
        bounce(first, location)
    }

    async fn validate_user_access(&self, location: &str) -> GuardOutcome {
        let level = self.props.level;
        let client = self.session.registry().active_client();
        let needs_user = matches!(level, AccessLevel::Admin | AccessLevel::User);

        let Some(client) = client.filter(ClientHandle::is_logged_in) else {
            if needs_user {
                return self.reconnect_and_bounce(location).await;
            }
            return GuardOutcome::Render;
        };

        if level == AccessLevel::Admin {
            // Always re-fetched: admin rights can change between mounts.
            match client.current_user().await {
                Ok(user) if user.policy.is_administrator => {}
                Ok(_) => return self.reconnect_and_bounce(location).await,
                Err(err) => {
                    tracing::warn!("admin check failed: {:#}", err);
                    return self.reconnect_and_bounce(location).await;
                }
            }
        }
        GuardOutcome::Render
    }

    async fn reconnect_and_bounce(&self, location: &str) -> GuardOutcome {
        let result = self
            .session
            .resolver()
            .connect(ConnectOptions::default())
            .await;
        bounce(&result, location)
    }
}

fn bounce(result: &ConnectionResult, location: &str) -> GuardOutcome {
    let (pathname, _) = split_query(location);
    match result.state {
        ConnectionState::SignedIn => GuardOutcome::Navigate(HOME_PATH.to_string()),
        ConnectionState::ServerSignIn => {
            if pathname == LOGIN_PATH {
                return GuardOutcome::Render;
            }
            GuardOutcome::Navigate(format!(
                "{}?serverid={}&url={}",
                LOGIN_PATH,
                result.server_id().unwrap_or_default(),
                encode_component(location)
            ))
        }
        ConnectionState::ServerSelection => {
            if pathname == SELECT_SERVER_PATH {
                return GuardOutcome::Render;
            }
            GuardOutcome::Navigate(SELECT_SERVER_PATH.to_string())
        }
        state => GuardOutcome::Error(state),
    }
}

/// Public info, rejected unless it identifies a real server.
async fn fetch_public_system_info(client: &ClientHandle) -> Result<PublicSystemInfo> {
    let info = client
        .public_system_info()
        .await
        .context("public system info")?;
    if info.id.as_deref().unwrap_or_default().is_empty() {
        anyhow::bail!("server did not report an id");
    }
    let product = info.product_name.as_deref().unwrap_or_default();
    if !product.to_ascii_lowercase().contains(SERVER_PRODUCT) {
        anyhow::bail!("unexpected product {:?}", product);
    }
    Ok(info)
}

#[cfg(test)]
#[path = "tests/guard_tests.rs"]
mod tests;
