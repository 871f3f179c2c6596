//! Collaborators the gate drives but does not implement.

use std::sync::Mutex;

use futures_util::future::BoxFuture;

use crate::loader::ViewLoadRequest;

/// `try_restore_view` rejection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("view restore rejected (cancelled: {cancelled})")]
pub struct RestoreRejected {
    pub cancelled: bool,
}

pub trait ViewManager: Send + Sync {
    /// Bring back a previously rendered view for a back navigation.
    fn try_restore_view(
        &self,
        request: ViewLoadRequest,
    ) -> BoxFuture<'static, Result<(), RestoreRejected>>;

    fn load_view(&self, request: ViewLoadRequest);

    /// Whether an overlay dialog is currently open.
    fn has_open_dialog(&self) -> bool {
        false
    }
}

pub trait AppHost: Send + Sync {
    fn supports(&self, capability: &str) -> bool;
    fn exit(&self);
}

pub trait Notifier: Send + Sync {
    fn alert(&self, message: &str);
}

/// Host that cannot exit. Used by the CLI and tests.
pub struct HeadlessHost;

impl AppHost for HeadlessHost {
    fn supports(&self, _capability: &str) -> bool {
        false
    }

    fn exit(&self) {}
}

/// Prints alerts through `tracing`.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn alert(&self, message: &str) {
        tracing::warn!("{}", message);
    }
}

/// Records loaded views in memory; never restores.
#[derive(Default)]
pub struct RecordingViewManager {
    loaded: Mutex<Vec<ViewLoadRequest>>,
}

impl RecordingViewManager {
    pub fn loaded(&self) -> Vec<ViewLoadRequest> {
        self.loaded
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl ViewManager for RecordingViewManager {
    fn try_restore_view(
        &self,
        _request: ViewLoadRequest,
    ) -> BoxFuture<'static, Result<(), RestoreRejected>> {
        Box::pin(async { Err(RestoreRejected { cancelled: false }) })
    }

    fn load_view(&self, request: ViewLoadRequest) {
        tracing::info!(url = %request.url, "view loaded");
        self.loaded
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(request);
    }
}
