use axum::extract::State;
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

use crate::http_error::unauthorized;
use crate::types::{SharedState, Subject};

/// Pull `Token="..."` out of a `MediaBrowser ...` authorization header.
pub(crate) fn token_from_header(value: &str) -> Option<&str> {
    let params = value.trim().strip_prefix("MediaBrowser")?;
    params.split(',').find_map(|part| {
        let (key, raw) = part.trim().split_once('=')?;
        if key.trim() != "Token" {
            return None;
        }
        let token = raw.trim().trim_matches('"');
        (!token.is_empty()).then_some(token)
    })
}

pub(crate) async fn require_token(
    State(state): State<SharedState>,
    req: axum::extract::Request,
    next: Next,
) -> Response {
    let Some(value) = req.headers().get(header::AUTHORIZATION) else {
        return unauthorized();
    };
    let Ok(value) = value.to_str() else {
        return unauthorized();
    };
    let Some(token) = token_from_header(value) else {
        return unauthorized();
    };

    let user_id = {
        let tokens = state.tokens.read().await;
        tokens.get(token).cloned()
    };
    let Some(user_id) = user_id else {
        return unauthorized();
    };

    let subject = Subject {
        token: token.to_string(),
        user_id,
    };
    let mut req = req;
    req.extensions_mut().insert(subject);
    next.run(req).await
}
