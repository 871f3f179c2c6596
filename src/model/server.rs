use serde::{Deserialize, Serialize};

/// How a server address was last reached.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionMode {
    Local,
    Remote,
    #[default]
    Manual,
}

/// A saved (or discovered) server plus the credentials stored for it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub manual_address: Option<String>,

    #[serde(default)]
    pub local_address: Option<String>,

    #[serde(default)]
    pub remote_address: Option<String>,

    #[serde(default)]
    pub last_connection_mode: ConnectionMode,

    /// Unix milliseconds.
    #[serde(default)]
    pub date_last_accessed: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(default)]
    pub manual_address_only: bool,
}

impl ServerInfo {
    pub fn from_manual_address(address: &str) -> Self {
        Self {
            manual_address: Some(address.to_string()),
            last_connection_mode: ConnectionMode::Manual,
            ..Self::default()
        }
    }

    pub fn address_for(&self, mode: ConnectionMode) -> Option<&str> {
        match mode {
            ConnectionMode::Local => self.local_address.as_deref(),
            ConnectionMode::Remote => self.remote_address.as_deref(),
            ConnectionMode::Manual => self.manual_address.as_deref(),
        }
    }

    /// Address for the last connection mode, falling back to any known address.
    pub fn preferred_address(&self) -> Option<&str> {
        self.address_for(self.last_connection_mode)
            .or(self.manual_address.as_deref())
            .or(self.local_address.as_deref())
            .or(self.remote_address.as_deref())
    }

    pub fn has_address(&self, address: &str) -> bool {
        [
            self.manual_address.as_deref(),
            self.local_address.as_deref(),
            self.remote_address.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|a| a.eq_ignore_ascii_case(address))
    }

    pub fn clear_credentials(&mut self) {
        self.user_id = None;
        self.access_token = None;
    }

    pub fn apply_public_info(&mut self, info: &PublicSystemInfo) {
        if let Some(name) = &info.server_name {
            self.name = Some(name.clone());
        }
        if let Some(id) = &info.id {
            self.id = Some(id.clone());
        }
        if let Some(local) = &info.local_address {
            self.local_address = Some(local.clone());
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Credentials {
    pub version: u32,

    #[serde(default)]
    pub servers: Vec<ServerInfo>,

    /// Server id of the active client when the process last exited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_server_id: Option<String>,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            version: 1,
            servers: Vec::new(),
            current_server_id: None,
        }
    }
}

impl Credentials {
    /// Insert or merge `server`, matching by id first and by address second.
    pub fn add_or_update(&mut self, server: &ServerInfo) {
        let existing = self.servers.iter_mut().find(|s| match (&s.id, &server.id) {
            (Some(a), Some(b)) => a == b,
            _ => server
                .preferred_address()
                .is_some_and(|addr| s.has_address(addr)),
        });

        let Some(existing) = existing else {
            self.servers.push(server.clone());
            return;
        };

        if server.date_last_accessed > existing.date_last_accessed {
            existing.date_last_accessed = server.date_last_accessed;
        }
        if server.access_token.is_some() {
            existing.access_token = server.access_token.clone();
            existing.user_id = server.user_id.clone();
        }
        if server.id.is_some() {
            existing.id = server.id.clone();
        }
        if server.name.is_some() {
            existing.name = server.name.clone();
        }
        if server.manual_address.is_some() {
            existing.manual_address = server.manual_address.clone();
        }
        if server.local_address.is_some() {
            existing.local_address = server.local_address.clone();
        }
        if server.remote_address.is_some() {
            existing.remote_address = server.remote_address.clone();
        }
        if server.manual_address_only {
            existing.manual_address_only = true;
        }
        existing.last_connection_mode = server.last_connection_mode;
    }

    pub fn find(&self, server_id: &str) -> Option<&ServerInfo> {
        self.servers
            .iter()
            .find(|s| s.id.as_deref().is_some_and(|id| id.eq_ignore_ascii_case(server_id)))
    }

    /// Drop the stored user id and token for one server. Returns false if unknown.
    pub fn clear_credentials_for(&mut self, server_id: &str) -> bool {
        let Some(server) = self
            .servers
            .iter_mut()
            .find(|s| s.id.as_deref().is_some_and(|id| id.eq_ignore_ascii_case(server_id)))
        else {
            return false;
        };
        server.clear_credentials();
        true
    }

    /// Saved servers, most recently accessed first.
    pub fn sorted_servers(&self) -> Vec<ServerInfo> {
        let mut servers = self.servers.clone();
        servers.sort_by(|a, b| b.date_last_accessed.cmp(&a.date_last_accessed));
        servers
    }
}

/// `GET /System/Info/Public`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PublicSystemInfo {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub server_name: Option<String>,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub product_name: Option<String>,

    #[serde(default)]
    pub local_address: Option<String>,

    #[serde(default)]
    pub startup_wizard_completed: Option<bool>,
}

/// `GET /System/Info` (authenticated). Only the fields the gate reads.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SystemInfo {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub server_name: Option<String>,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub local_address: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserPolicy {
    #[serde(default)]
    pub is_administrator: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserDto {
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub policy: UserPolicy,
}

/// Response of `POST /Users/AuthenticateByName`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthenticationResult {
    pub user: UserDto,
    pub access_token: String,
    pub server_id: String,
}
