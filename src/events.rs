use tokio::sync::broadcast;

use crate::model::ConnectionState;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    ClientCreated {
        server_id: Option<String>,
        address: String,
    },
    LocalUserSignedIn {
        server_id: String,
        user_id: String,
    },
    LocalUserSignedOut {
        server_id: Option<String>,
    },
    Connected {
        state: ConnectionState,
        server_id: Option<String>,
    },
    RequestFailed {
        server_id: Option<String>,
        status: u16,
        error_code: Option<String>,
    },
}

/// Typed publish/subscribe channel scoped to one session context.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn publish(&self, event: SessionEvent) {
        tracing::debug!(?event, "session event");
        // No subscribers is fine.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
