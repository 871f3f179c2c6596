use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use futures_util::future::BoxFuture;

use crate::client::transport::{HttpRequest, HttpResponse, Transport};
use crate::config::GateConfig;
use crate::host::{AppHost, Notifier};
use crate::model::{ConnectionMode, ServerInfo};
use crate::session::SessionContext;
use crate::store::CredentialStore;

/// Canned responses keyed by full url. Unknown urls fail like a refused
/// connection.
#[derive(Default)]
pub(crate) struct FakeTransport {
    replies: Mutex<HashMap<String, HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn reply_json(&self, url: &str, body: serde_json::Value) {
        self.replies.lock().unwrap().insert(
            url.to_string(),
            HttpResponse {
                status: 200,
                error_code: None,
                body: body.to_string(),
            },
        );
    }

    pub(crate) fn reply_text(&self, url: &str, body: &str) {
        self.replies.lock().unwrap().insert(
            url.to_string(),
            HttpResponse {
                status: 200,
                error_code: None,
                body: body.to_string(),
            },
        );
    }

    pub(crate) fn reply_status(&self, url: &str, status: u16, error_code: Option<&str>) {
        self.replies.lock().unwrap().insert(
            url.to_string(),
            HttpResponse {
                status,
                error_code: error_code.map(str::to_string),
                body: String::new(),
            },
        );
    }

    pub(crate) fn remove(&self, url: &str) {
        self.replies.lock().unwrap().remove(url);
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn calls_to(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url == url)
            .count()
    }

    /// A reachable server reporting `id` and `version` with a completed wizard.
    pub(crate) fn serve(&self, address: &str, id: &str, version: &str) {
        self.reply_json(
            &format!("{}/System/Info/Public", address),
            public_info(id, version, true),
        );
    }

    /// Accept stored tokens and answer `/Users/Me` for `user_id`.
    pub(crate) fn serve_user(&self, address: &str, server_id: &str, user_id: &str, admin: bool) {
        self.reply_json(
            &format!("{}/System/Info", address),
            serde_json::json!({"Id": server_id, "ServerName": "test server", "Version": "10.9.0"}),
        );
        self.reply_json(
            &format!("{}/Users/Me", address),
            serde_json::json!({
                "Id": user_id,
                "Name": "tester",
                "Policy": {"IsAdministrator": admin},
            }),
        );
    }
}

impl Transport for FakeTransport {
    fn send(&self, req: HttpRequest) -> BoxFuture<'static, Result<HttpResponse>> {
        let reply = self.replies.lock().unwrap().get(&req.url).cloned();
        let url = req.url.clone();
        self.requests.lock().unwrap().push(req);
        Box::pin(async move { reply.ok_or_else(|| anyhow::anyhow!("connection refused: {}", url)) })
    }
}

pub(crate) fn public_info(id: &str, version: &str, wizard_completed: bool) -> serde_json::Value {
    serde_json::json!({
        "Id": id,
        "ServerName": "test server",
        "Version": version,
        "ProductName": "Jellyfin Server",
        "StartupWizardCompleted": wizard_completed,
    })
}

pub(crate) fn test_config() -> GateConfig {
    GateConfig {
        device_id: "test-device".to_string(),
        forced_logout_delay_ms: 0,
        ..GateConfig::default()
    }
}

pub(crate) fn saved_server(id: &str, address: &str) -> ServerInfo {
    ServerInfo {
        id: Some(id.to_string()),
        name: Some("test server".to_string()),
        manual_address: Some(address.to_string()),
        last_connection_mode: ConnectionMode::Manual,
        date_last_accessed: 1,
        ..ServerInfo::default()
    }
}

pub(crate) fn signed_in_server(id: &str, address: &str, user_id: &str, token: &str) -> ServerInfo {
    ServerInfo {
        user_id: Some(user_id.to_string()),
        access_token: Some(token.to_string()),
        ..saved_server(id, address)
    }
}

pub(crate) fn session_with(
    transport: Arc<FakeTransport>,
    servers: &[ServerInfo],
) -> Arc<SessionContext> {
    session_with_config(transport, servers, test_config())
}

pub(crate) fn session_with_config(
    transport: Arc<FakeTransport>,
    servers: &[ServerInfo],
    config: GateConfig,
) -> Arc<SessionContext> {
    let store = CredentialStore::in_memory();
    store
        .update(|c| {
            for server in servers {
                c.add_or_update(server);
            }
        })
        .unwrap();
    SessionContext::init(config, store, transport)
}

/// Host whose exit support is configurable; counts exit calls.
#[derive(Default)]
pub(crate) struct FakeHost {
    pub(crate) can_exit: bool,
    pub(crate) exits: AtomicUsize,
}

impl FakeHost {
    pub(crate) fn exiting() -> Arc<Self> {
        Arc::new(Self {
            can_exit: true,
            exits: AtomicUsize::new(0),
        })
    }

    pub(crate) fn exit_count(&self) -> usize {
        self.exits.load(Ordering::SeqCst)
    }
}

impl AppHost for FakeHost {
    fn supports(&self, capability: &str) -> bool {
        self.can_exit && capability == "exit"
    }

    fn exit(&self) {
        self.exits.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    alerts: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub(crate) fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }
}
