use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::host::Notifier;

pub const ACCESS_RESTRICTED_MESSAGE: &str =
    "Access is currently restricted. Please try again later.";

/// Shows a forced-logout message after a short delay. A newer message
/// replaces a pending one.
pub struct ForcedLogoutNotice {
    notifier: Arc<dyn Notifier>,
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl ForcedLogoutNotice {
    pub fn new(notifier: Arc<dyn Notifier>, delay: Duration) -> Self {
        Self {
            notifier,
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn show(&self, message: &str) {
        let notifier = self.notifier.clone();
        let delay = self.delay;
        let message = message.to_string();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            notifier.alert(&message);
        });

        let previous = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
    }
}
