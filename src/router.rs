use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use anyhow::Result;
use tokio::sync::broadcast::error::RecvError;

use crate::events::SessionEvent;
use crate::gate::{AuthGate, GateDecision, HOME_PATH, LOGIN_PATH, SELECT_SERVER_PATH, login_path};
use crate::loader::ViewLoadCoordinator;
use crate::model::{NavigationRequest, RouteDescriptor, RouteType};
use crate::resolver::ConnectOptions;
use crate::session::SessionContext;

pub mod forced_logout;
mod history;
mod path;
pub mod route_url;

use self::forced_logout::{ACCESS_RESTRICTED_MESSAGE, ForcedLogoutNotice};
pub use self::history::MemoryHistory;
pub use self::path::{encode_component, normalize_path, pattern_matches, split_query};
pub use self::route_url::{ItemRef, RouteItem, RouteOptions, get_route_url};

/// Redirects followed within one navigation before giving up.
pub const MAX_REDIRECT_DEPTH: usize = 5;

const START_PAGE_PATHS: &[&str] = &[HOME_PATH, LOGIN_PATH, SELECT_SERVER_PATH];

#[derive(Debug, thiserror::Error)]
pub enum NavigationError {
    #[error("no route matches {0}")]
    RouteNotFound(String),

    #[error("too many redirects navigating to {0}")]
    RedirectLoop(String),

    #[error("a default route is already registered ({0})")]
    DuplicateDefaultRoute(String),
}

pub struct Router {
    session: Arc<SessionContext>,
    gate: AuthGate,
    loader: ViewLoadCoordinator,
    routes: Mutex<Vec<Arc<RouteDescriptor>>>,
    history: Mutex<MemoryHistory>,
    forced_logout: ForcedLogoutNotice,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Router {
    pub fn new(session: Arc<SessionContext>, gate: AuthGate, loader: ViewLoadCoordinator) -> Self {
        let delay = Duration::from_millis(session.config().forced_logout_delay_ms);
        let forced_logout = ForcedLogoutNotice::new(gate.notifier().clone(), delay);
        Self {
            session,
            gate,
            loader,
            routes: Mutex::new(Vec::new()),
            history: Mutex::new(MemoryHistory::new("/")),
            forced_logout,
        }
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    /// Registration order is match priority.
    pub fn add_route(&self, route: RouteDescriptor) -> Result<(), NavigationError> {
        let mut routes = lock(&self.routes);
        if route.is_default_route
            && let Some(existing) = routes.iter().find(|r| r.is_default_route)
        {
            return Err(NavigationError::DuplicateDefaultRoute(existing.path.clone()));
        }
        routes.push(Arc::new(route));
        Ok(())
    }

    pub fn match_route(&self, pathname: &str) -> Option<Arc<RouteDescriptor>> {
        lock(&self.routes)
            .iter()
            .find(|r| pattern_matches(&r.path, pathname))
            .cloned()
    }

    /// The route that last finished loading.
    pub fn current(&self) -> Option<Arc<RouteDescriptor>> {
        self.session.current_route().map(|c| c.route)
    }

    pub fn history_len(&self) -> usize {
        lock(&self.history).len()
    }

    fn normalize(&self, path: &str) -> String {
        normalize_path(path, &self.session.config().base_path)
    }

    /// Whether `path` is already on screen and may not be re-entered.
    fn is_current(&self, path: &str, route: &RouteDescriptor) -> bool {
        route.route_type != RouteType::Home
            && self
                .session
                .current_route()
                .is_some_and(|current| current.path == path)
    }

    /// Resolve the startup connection once, then dispatch `location`.
    pub async fn start(&self, location: &str) -> Result<()> {
        let result = self
            .session
            .resolver()
            .connect(ConnectOptions::default())
            .await;
        tracing::info!(state = %result.state, "first connection resolved");
        self.session.set_first_connection(result);

        let location = self.normalize(location);
        lock(&self.history).reset(&location);
        self.dispatch(location, false).await
    }

    pub async fn show(&self, path: &str) -> Result<()> {
        let path = self.normalize(path);
        let (pathname, _) = split_query(&path);
        let route = self
            .match_route(pathname)
            .ok_or_else(|| NavigationError::RouteNotFound(path.clone()))?;
        if self.is_current(&path, &route) {
            tracing::debug!(path = %path, "path did not change, ignoring");
            return Ok(());
        }

        lock(&self.history).push(&path);
        self.dispatch(path, false).await
    }

    /// Step back one history entry. A no-op at the first entry.
    pub async fn back(&self) -> Result<()> {
        let Some(previous) = lock(&self.history).back() else {
            tracing::debug!("no history to go back to");
            return Ok(());
        };
        self.dispatch(previous, true).await
    }

    pub fn can_go_back(&self) -> bool {
        let Some(current) = self.session.current_route() else {
            return false;
        };
        let at_start = current.route.route_type.is_start_page()
            || START_PAGE_PATHS.contains(&current.pathname());
        if at_start && !self.loader.views().has_open_dialog() {
            return false;
        }
        self.history_len() > 1
    }

    async fn dispatch(&self, mut path: String, mut is_back: bool) -> Result<()> {
        for _ in 0..=MAX_REDIRECT_DEPTH {
            let (pathname, querystring) = split_query(&path);
            let route = self
                .match_route(pathname)
                .ok_or_else(|| NavigationError::RouteNotFound(path.clone()))?;
            let request = NavigationRequest::new(pathname, querystring, is_back, route);

            match self.gate.authorize(&request).await {
                GateDecision::Proceed => {
                    let outcome = self.loader.load_route(&request).await?;
                    tracing::debug!(path = %request.path, ?outcome, "navigation finished");
                    return Ok(());
                }
                GateDecision::Exit => return Ok(()),
                GateDecision::Redirect(target) => {
                    let target = self.normalize(&target);
                    tracing::debug!(from = %path, to = %target, "redirect");
                    let (target_pathname, _) = split_query(&target);
                    if let Some(route) = self.match_route(target_pathname)
                        && self.is_current(&target, &route)
                    {
                        return Ok(());
                    }
                    lock(&self.history).push(&target);
                    path = target;
                    is_back = false;
                }
            }
        }
        Err(NavigationError::RedirectLoop(path).into())
    }

    pub async fn go_home(&self) -> Result<()> {
        self.show(HOME_PATH).await
    }

    pub async fn show_local_login(&self, server_id: Option<&str>) -> Result<()> {
        self.show(&login_path(server_id)).await
    }

    pub async fn show_select_server(&self) -> Result<()> {
        self.show(SELECT_SERVER_PATH).await
    }

    pub async fn show_settings(&self) -> Result<()> {
        self.show("/mypreferencesmenu").await
    }

    pub async fn show_search(&self) -> Result<()> {
        self.show("/search").await
    }

    pub async fn show_guide(&self) -> Result<()> {
        self.show("/livetv?tab=1").await
    }

    pub async fn show_live_tv(&self) -> Result<()> {
        self.show("/livetv").await
    }

    pub async fn show_recorded_tv(&self) -> Result<()> {
        self.show("/livetv?tab=3").await
    }

    pub async fn show_favorites(&self) -> Result<()> {
        self.show("/home?tab=1").await
    }

    pub async fn show_now_playing(&self) -> Result<()> {
        self.show("/nowplaying").await
    }

    pub async fn show_item(&self, item: &RouteItem, options: &RouteOptions) -> Result<()> {
        let url = get_route_url(item, options)?;
        self.show(&url).await
    }

    /// `library-<id>_<server>`, `item-<id>_<server>` or `<name>_<server>`.
    pub async fn invoke_shortcut(&self, id: &str) -> Result<()> {
        let entity = id
            .strip_prefix("library-")
            .or_else(|| id.strip_prefix("item-"));
        let (target, server_id) = match entity.unwrap_or(id).split_once('_') {
            Some((target, server)) => (target, Some(server.to_string())),
            None => (entity.unwrap_or(id), None),
        };
        let options = RouteOptions {
            server_id,
            ..RouteOptions::default()
        };
        let item = match entity {
            Some(_) => RouteItem::Item(ItemRef {
                id: Some(target.to_string()),
                ..ItemRef::default()
            }),
            None => RouteItem::Named(target.to_string()),
        };
        self.show_item(&item, &options).await
    }

    /// A 403 with `ParentalControl` on a protected page queues a notice and
    /// shows that server's login page.
    pub async fn on_request_fail(
        &self,
        server_id: Option<&str>,
        status: u16,
        error_code: Option<&str>,
    ) -> Result<()> {
        if status != 403 || error_code != Some("ParentalControl") {
            return Ok(());
        }
        let current_allowed = self
            .session
            .current_route()
            .map(|c| c.route.anonymous || c.route.startup)
            .unwrap_or(true);
        if current_allowed {
            return Ok(());
        }
        tracing::info!(server_id = ?server_id, "access restricted by parental control");
        self.forced_logout.show(ACCESS_RESTRICTED_MESSAGE);
        self.show_local_login(server_id).await
    }

    /// Feed `RequestFailed` events into `on_request_fail` until the router
    /// is dropped.
    pub fn spawn_request_fail_listener(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let mut rx = self.session.events().subscribe();
        let router: Weak<Router> = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                let event = match rx.recv().await {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "session events dropped");
                        continue;
                    }
                    Err(RecvError::Closed) => return,
                };
                let SessionEvent::RequestFailed {
                    server_id,
                    status,
                    error_code,
                } = event
                else {
                    continue;
                };
                let Some(router) = router.upgrade() else {
                    return;
                };
                if let Err(err) = router
                    .on_request_fail(server_id.as_deref(), status, error_code.as_deref())
                    .await
                {
                    tracing::warn!("forced logout navigation: {:#}", err);
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "tests/router_tests.rs"]
mod tests;
