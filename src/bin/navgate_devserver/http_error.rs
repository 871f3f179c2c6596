use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub(crate) const ERROR_CODE_HEADER: &str = "X-Application-Error-Code";

pub(crate) fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({"error": "unauthorized"})),
    )
        .into_response()
}

pub(crate) fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({"error": message})),
    )
        .into_response()
}

pub(crate) fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"error": "not found"})),
    )
        .into_response()
}

/// 403 carrying the error code clients use to force a sign-out.
pub(crate) fn parental_control() -> Response {
    (
        StatusCode::FORBIDDEN,
        [(ERROR_CODE_HEADER, "ParentalControl")],
        Json(serde_json::json!({"error": "access restricted"})),
    )
        .into_response()
}
