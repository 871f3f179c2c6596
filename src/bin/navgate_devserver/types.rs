use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::Result;
use tokio::sync::RwLock;

pub(crate) const PRODUCT_NAME: &str = "Jellyfin Server";

#[derive(Clone, Debug)]
pub(crate) struct DevUser {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) password: String,
    pub(crate) admin: bool,
}

impl DevUser {
    /// `name:password[:admin]`
    pub(crate) fn parse(spec: &str) -> Result<Self> {
        let mut parts = spec.splitn(3, ':');
        let name = parts.next().unwrap_or_default().trim();
        if name.is_empty() {
            anyhow::bail!("user spec {:?} has no name", spec);
        }
        let password = parts.next().unwrap_or_default();
        let admin = match parts.next() {
            None => false,
            Some("admin") => true,
            Some(other) => anyhow::bail!("unknown user flag {:?} in {:?}", other, spec),
        };
        Ok(Self {
            id: random_hex(16)?,
            name: name.to_string(),
            password: password.to_string(),
            admin,
        })
    }

    pub(crate) fn dto(&self) -> serde_json::Value {
        serde_json::json!({
            "Id": self.id,
            "Name": self.name,
            "Policy": { "IsAdministrator": self.admin },
        })
    }
}

/// The caller behind a valid access token.
#[derive(Clone, Debug)]
pub(crate) struct Subject {
    pub(crate) token: String,
    pub(crate) user_id: String,
}

pub(crate) struct AppState {
    pub(crate) server_id: String,
    pub(crate) server_name: String,
    pub(crate) version: String,
    pub(crate) local_address: String,
    pub(crate) wizard_completed: AtomicBool,

    /// Keyed by lowercased user name.
    pub(crate) users: RwLock<HashMap<String, DevUser>>,

    /// Access token to user id.
    pub(crate) tokens: RwLock<HashMap<String, String>>,

    /// User ids whose content requests fail with a parental-control 403.
    pub(crate) restricted: HashSet<String>,
}

pub(crate) type SharedState = Arc<AppState>;

impl AppState {
    pub(crate) async fn user_by_id(&self, user_id: &str) -> Option<DevUser> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.id == user_id)
            .cloned()
    }
}

pub(crate) fn random_hex(len: usize) -> Result<String> {
    let mut bytes = vec![0u8; len];
    getrandom::getrandom(&mut bytes).map_err(|e| anyhow::anyhow!("random bytes: {}", e))?;
    Ok(bytes.iter().map(|b| format!("{:02x}", b)).collect())
}
