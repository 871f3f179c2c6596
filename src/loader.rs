use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use futures_util::future::BoxFuture;

use crate::host::ViewManager;
use crate::model::{ControllerId, CurrentRouteInfo, NavigationRequest, RouteType};
use crate::session::SessionContext;

/// Shared cancellation flag for one view load.
#[derive(Clone, Debug, Default)]
pub struct LoadToken(Arc<AtomicBool>);

impl LoadToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn same_as(&self, other: &LoadToken) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// The load currently considered authoritative.
#[derive(Clone, Debug)]
pub struct InFlightLoad {
    pub url: String,
    pub token: LoadToken,
    /// Content fetched for this load, once it has arrived.
    pub view: Option<String>,
}

/// A loaded page controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControllerFactory {
    pub id: ControllerId,
}

/// What the view manager is asked to show or restore.
#[derive(Clone, Debug)]
pub struct ViewLoadRequest {
    /// Base path plus the navigated path.
    pub url: String,
    pub path: String,
    pub is_back: bool,
    pub route_type: RouteType,
    pub controller: Option<ControllerFactory>,
    /// Fetched content. `None` for restore attempts.
    pub view: Option<String>,
    pub token: LoadToken,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    Restored,
    /// A newer navigation superseded this one; nothing was applied.
    Cancelled,
}

type ControllerLoader = Arc<dyn Fn() -> BoxFuture<'static, Result<ControllerFactory>> + Send + Sync>;
type ContentLoader = Arc<dyn Fn(&str) -> BoxFuture<'static, Result<String>> + Send + Sync>;

/// Startup-time table of page controllers, loaded lazily on first use.
#[derive(Clone, Default)]
pub struct ControllerRegistry {
    loaders: HashMap<ControllerId, ControllerLoader>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, id: ControllerId, loader: F)
    where
        F: Fn() -> BoxFuture<'static, Result<ControllerFactory>> + Send + Sync + 'static,
    {
        self.loaders.insert(id, Arc::new(loader));
    }

    /// Register a controller that loads immediately.
    pub fn register_ready(&mut self, id: ControllerId) {
        self.register(id, move || Box::pin(async move { Ok(ControllerFactory { id }) }));
    }

    pub async fn load(&self, id: ControllerId) -> Result<ControllerFactory> {
        let loader = self
            .loaders
            .get(&id)
            .with_context(|| format!("unknown controller {}", id))?
            .clone();
        loader().await.with_context(|| format!("load controller {}", id))
    }
}

/// Startup-time table of local view content keyed by content path.
#[derive(Clone, Default)]
pub struct ContentRegistry {
    loaders: Vec<(String, ContentLoader)>,
}

impl ContentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `path` matches the content url without its query string.
    pub fn register<F>(&mut self, path: &str, loader: F)
    where
        F: Fn(&str) -> BoxFuture<'static, Result<String>> + Send + Sync + 'static,
    {
        self.loaders.push((path.to_string(), Arc::new(loader)));
    }

    pub fn register_static(&mut self, path: &str, html: &str) {
        let html = html.to_string();
        self.register(path, move |_| {
            let html = html.clone();
            Box::pin(async move { Ok(html) })
        });
    }

    pub async fn load(&self, url: &str) -> Result<String> {
        let key = url.split('?').next().unwrap_or_default();
        let (_, loader) = self
            .loaders
            .iter()
            .find(|(path, _)| path == key)
            .with_context(|| format!("no content registered for {}", key))?;
        let loader = loader.clone();
        loader(url).await.with_context(|| format!("load content {}", url))
    }
}

/// Releases the in-flight slot however `load_route` exits, unless a newer
/// load already took it.
struct FinishOnDrop<'a> {
    coordinator: &'a ViewLoadCoordinator,
    token: LoadToken,
}

impl Drop for FinishOnDrop<'_> {
    fn drop(&mut self) {
        self.coordinator.finish(&self.token);
    }
}

/// Owns the single authoritative in-flight load.
pub struct ViewLoadCoordinator {
    session: Arc<SessionContext>,
    views: Arc<dyn ViewManager>,
    controllers: ControllerRegistry,
    content: ContentRegistry,
    in_flight: Mutex<Option<InFlightLoad>>,
}

impl ViewLoadCoordinator {
    pub fn new(
        session: Arc<SessionContext>,
        views: Arc<dyn ViewManager>,
        controllers: ControllerRegistry,
        content: ContentRegistry,
    ) -> Self {
        Self {
            session,
            views,
            controllers,
            content,
            in_flight: Mutex::new(None),
        }
    }

    fn in_flight(&self) -> MutexGuard<'_, Option<InFlightLoad>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn views(&self) -> &Arc<dyn ViewManager> {
        &self.views
    }

    pub fn current_load(&self) -> Option<InFlightLoad> {
        self.in_flight().clone()
    }

    /// Cancel whatever is in flight and install a fresh token for `url`.
    pub fn begin(&self, url: &str) -> LoadToken {
        let token = LoadToken::new();
        let previous = self.in_flight().replace(InFlightLoad {
            url: url.to_string(),
            token: token.clone(),
            view: None,
        });
        if let Some(previous) = previous {
            tracing::debug!(url = %previous.url, "cancelling superseded load");
            previous.token.cancel();
        }
        token
    }

    fn record_view(&self, token: &LoadToken, html: &str) {
        if let Some(load) = self.in_flight().as_mut()
            && load.token.same_as(token)
        {
            load.view = Some(html.to_string());
        }
    }

    fn finish(&self, token: &LoadToken) {
        let mut in_flight = self.in_flight();
        if in_flight.as_ref().is_some_and(|l| l.token.same_as(token)) {
            *in_flight = None;
        }
    }

    pub async fn load_route(&self, request: &NavigationRequest) -> Result<LoadOutcome> {
        let url = format!("{}{}", self.session.config().base_path, request.path);
        let token = self.begin(&url);
        let _finish = FinishOnDrop {
            coordinator: self,
            token: token.clone(),
        };
        let route = request.route.clone();

        let controller = match route.controller {
            Some(id) => Some(self.controllers.load(id).await?),
            None => None,
        };
        if token.is_cancelled() {
            return Ok(LoadOutcome::Cancelled);
        }

        let mut view_request = ViewLoadRequest {
            url,
            path: request.path.clone(),
            is_back: request.is_back,
            route_type: route.route_type,
            controller,
            view: None,
            token: token.clone(),
        };

        if request.is_back {
            match self.views.try_restore_view(view_request.clone()).await {
                Ok(()) => {
                    if token.is_cancelled() {
                        return Ok(LoadOutcome::Cancelled);
                    }
                    self.session.set_current_route(CurrentRouteInfo {
                        route,
                        path: request.path.clone(),
                    });
                    return Ok(LoadOutcome::Restored);
                }
                Err(rejected) if rejected.cancelled => {
                    tracing::debug!(path = %request.path, "view restore cancelled");
                    return Ok(LoadOutcome::Cancelled);
                }
                Err(_) => {}
            }
        }

        let html = self.fetch_content(request).await?;
        if token.is_cancelled() {
            tracing::debug!(path = %request.path, "discarding superseded load");
            return Ok(LoadOutcome::Cancelled);
        }

        self.record_view(&token, &html);
        view_request.view = Some(html);
        self.views.load_view(view_request);
        self.session.set_current_route(CurrentRouteInfo {
            route,
            path: request.path.clone(),
        });
        Ok(LoadOutcome::Loaded)
    }

    async fn fetch_content(&self, request: &NavigationRequest) -> Result<String> {
        let url = request.route.content_url(&request.querystring);
        if !request.route.server_request {
            return self.content.load(&url).await;
        }
        let client = self
            .session
            .registry()
            .active_client()
            .context("server-hosted content needs an active server")?;
        let full = client.url(&format!("/web{}", url));
        client
            .get_text(&full)
            .await
            .with_context(|| format!("fetch {}", full))
    }
}

#[cfg(test)]
#[path = "tests/loader_tests.rs"]
mod tests;
