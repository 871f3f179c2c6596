use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::Result;

use crate::client::transport::{HttpTransport, Transport};
use crate::config::GateConfig;
use crate::events::EventBus;
use crate::model::{ConnectionResult, CurrentRouteInfo};
use crate::registry::ConnectionRegistry;
use crate::resolver::ConnectionResolver;
use crate::store::CredentialStore;

/// Everything a navigation needs to know about the current session.
///
/// Created once by `init` and passed to the router, gate, loader and guard.
pub struct SessionContext {
    config: Arc<GateConfig>,
    registry: Arc<ConnectionRegistry>,
    resolver: ConnectionResolver,
    first_connection: Mutex<Option<ConnectionResult>>,
    connected: AtomicBool,
    current_route: Mutex<Option<CurrentRouteInfo>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionContext {
    pub fn init(
        config: GateConfig,
        store: CredentialStore,
        transport: Arc<dyn Transport>,
    ) -> Arc<Self> {
        let config = Arc::new(config);
        let registry = Arc::new(ConnectionRegistry::new(
            store,
            transport,
            config.clone(),
            EventBus::new(),
        ));
        registry.restore_clients();
        let resolver = ConnectionResolver::new(registry.clone());
        Arc::new(Self {
            config,
            registry,
            resolver,
            first_connection: Mutex::new(None),
            connected: AtomicBool::new(false),
            current_route: Mutex::new(None),
        })
    }

    /// File-backed session over the real HTTP transport.
    pub fn open(data_dir: &Path, config: GateConfig) -> Result<Arc<Self>> {
        let store = CredentialStore::open(data_dir)?;
        let user_agent = format!("{}/{}", config.app_name, config.app_version);
        let transport = HttpTransport::new(
            &user_agent,
            Duration::from_millis(config.request_timeout_ms),
        )?;
        Ok(Self::init(config, store, Arc::new(transport)))
    }

    /// Drop per-session state. Saved servers and credentials are kept.
    pub fn teardown(&self) {
        lock(&self.first_connection).take();
        lock(&self.current_route).take();
        self.connected.store(false, Ordering::SeqCst);
        self.registry.clear_active();
        tracing::debug!("session torn down");
    }

    pub fn config(&self) -> &Arc<GateConfig> {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn resolver(&self) -> &ConnectionResolver {
        &self.resolver
    }

    pub fn events(&self) -> &EventBus {
        self.registry.events()
    }

    /// Store the startup resolution. Read back at most once.
    pub fn set_first_connection(&self, result: ConnectionResult) {
        *lock(&self.first_connection) = Some(result);
        self.connected.store(true, Ordering::SeqCst);
    }

    pub fn take_first_connection(&self) -> Option<ConnectionResult> {
        lock(&self.first_connection).take()
    }

    /// Whether a startup resolution has happened, even if already consumed.
    pub fn has_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_connected(&self) {
        self.connected.store(true, Ordering::SeqCst);
    }

    pub fn current_route(&self) -> Option<CurrentRouteInfo> {
        lock(&self.current_route).clone()
    }

    pub(crate) fn set_current_route(&self, info: CurrentRouteInfo) {
        *lock(&self.current_route) = Some(info);
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
