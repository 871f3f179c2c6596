use axum::Router;
use axum::middleware;
use axum::routing::{get, post};

use crate::auth::require_token;
use crate::handlers::{
    authenticate_by_name, complete_wizard, current_user, healthz, logout, public_system_info,
    system_info, web_content,
};
use crate::types::SharedState;

fn authed_router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/System/Info", get(system_info))
        .route("/Users/Me", get(current_user))
        .route("/Sessions/Logout", post(logout))
        .route("/web/*path", get(web_content))
        .layer(middleware::from_fn_with_state(state, require_token))
}

pub(crate) fn app_router(state: SharedState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/System/Info/Public", get(public_system_info))
        .route("/Users/AuthenticateByName", post(authenticate_by_name))
        .route("/Startup/Complete", post(complete_wizard))
        .merge(authed_router(state.clone()))
        .with_state(state)
}
