use std::sync::atomic::Ordering;

use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::http_error::{bad_request, not_found, parental_control, unauthorized};
use crate::types::{PRODUCT_NAME, SharedState, Subject, random_hex};

pub(crate) async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

pub(crate) async fn public_system_info(State(state): State<SharedState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "Id": state.server_id,
        "ServerName": state.server_name,
        "Version": state.version,
        "ProductName": PRODUCT_NAME,
        "LocalAddress": state.local_address,
        "StartupWizardCompleted": state.wizard_completed.load(Ordering::SeqCst),
    }))
}

pub(crate) async fn system_info(State(state): State<SharedState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "Id": state.server_id,
        "ServerName": state.server_name,
        "Version": state.version,
        "LocalAddress": state.local_address,
    }))
}

pub(crate) async fn current_user(
    State(state): State<SharedState>,
    Extension(subject): Extension<Subject>,
) -> Response {
    match state.user_by_id(&subject.user_id).await {
        Some(user) => Json(user.dto()).into_response(),
        None => unauthorized(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct AuthenticateRequest {
    username: String,
    #[serde(default)]
    pw: String,
}

pub(crate) async fn authenticate_by_name(
    State(state): State<SharedState>,
    Json(body): Json<AuthenticateRequest>,
) -> Response {
    let user = {
        let users = state.users.read().await;
        users.get(&body.username.to_lowercase()).cloned()
    };
    let Some(user) = user.filter(|u| u.password == body.pw) else {
        return unauthorized();
    };

    let token = match random_hex(16) {
        Ok(token) => token,
        Err(err) => return bad_request(&format!("{:#}", err)),
    };
    state
        .tokens
        .write()
        .await
        .insert(token.clone(), user.id.clone());

    Json(serde_json::json!({
        "User": user.dto(),
        "AccessToken": token,
        "ServerId": state.server_id,
    }))
    .into_response()
}

pub(crate) async fn logout(
    State(state): State<SharedState>,
    Extension(subject): Extension<Subject>,
) -> StatusCode {
    state.tokens.write().await.remove(&subject.token);
    StatusCode::NO_CONTENT
}

pub(crate) async fn complete_wizard(State(state): State<SharedState>) -> StatusCode {
    state.wizard_completed.store(true, Ordering::SeqCst);
    StatusCode::NO_CONTENT
}

/// Server-hosted page fragments.
pub(crate) async fn web_content(
    State(state): State<SharedState>,
    Extension(subject): Extension<Subject>,
    Path(path): Path<String>,
) -> Response {
    if state.restricted.contains(&subject.user_id) {
        return parental_control();
    }
    if path.is_empty() || path.contains("..") {
        return not_found();
    }
    Html(format!("<div data-page=\"/{}\"></div>", path)).into_response()
}
