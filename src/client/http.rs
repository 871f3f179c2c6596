use anyhow::Result;

use super::ClientHandle;
use super::transport::{HttpRequest, HttpResponse};
use crate::events::SessionEvent;

/// A non-success HTTP status. Recoverable with `anyhow::Error::downcast_ref`.
#[derive(Debug, thiserror::Error)]
#[error("{label}: server returned {status}")]
pub struct RequestFailed {
    pub label: String,
    pub status: u16,
    pub error_code: Option<String>,
}

impl ClientHandle {
    pub(super) fn authed(&self, req: HttpRequest) -> HttpRequest {
        let token = self.access_token();
        let value = self.inner.config.authorization_header(token.as_deref());
        req.header("Authorization", value)
    }

    pub(super) async fn send(&self, req: HttpRequest, label: &str) -> Result<HttpResponse> {
        tracing::debug!(url = %req.url, "{}", label);
        let resp = self.inner.transport.send(req).await?;
        self.ensure_ok(resp, label)
    }

    fn ensure_ok(&self, resp: HttpResponse, label: &str) -> Result<HttpResponse> {
        if resp.is_success() {
            return Ok(resp);
        }
        self.publish(SessionEvent::RequestFailed {
            server_id: self.server_id(),
            status: resp.status,
            error_code: resp.error_code.clone(),
        });
        Err(RequestFailed {
            label: label.to_string(),
            status: resp.status,
            error_code: resp.error_code,
        }
        .into())
    }
}
