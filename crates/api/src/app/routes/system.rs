use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::context::PrincipalContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(principal): Extension<PrincipalContext>) -> impl IntoResponse {
    let role = principal.role();
    Json(serde_json::json!({
        "username": principal.username(),
        "role": role,
        "permissions": role.permissions().iter().map(|p| p.as_str()).collect::<Vec<_>>(),
        "expires_at": principal.session_expires_at(),
    }))
}
