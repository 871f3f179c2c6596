use std::fmt;

use serde::{Deserialize, Serialize};

use crate::client::ClientHandle;

use super::ServerInfo;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    SignedIn,
    ServerSignIn,
    ServerSelection,
    ServerUpdateNeeded,
    /// A single connection attempt failed. Never escapes `connect`.
    Unavailable,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::SignedIn => "SignedIn",
            Self::ServerSignIn => "ServerSignIn",
            Self::ServerSelection => "ServerSelection",
            Self::ServerUpdateNeeded => "ServerUpdateNeeded",
            Self::Unavailable => "Unavailable",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug)]
pub struct ConnectionResult {
    pub state: ConnectionState,
    pub client: Option<ClientHandle>,
    pub servers: Vec<ServerInfo>,
}

impl ConnectionResult {
    pub fn server_selection(servers: Vec<ServerInfo>) -> Self {
        Self {
            state: ConnectionState::ServerSelection,
            client: None,
            servers,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            state: ConnectionState::Unavailable,
            client: None,
            servers: Vec::new(),
        }
    }

    /// Server id for login redirects: the client's, else the first server's.
    pub fn server_id(&self) -> Option<String> {
        self.client
            .as_ref()
            .and_then(|c| c.server_id())
            .or_else(|| self.servers.first().and_then(|s| s.id.clone()))
    }
}
