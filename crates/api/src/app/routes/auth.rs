use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use hcm_auth::SessionIssuer;

use crate::app::dto::{self, LoginRequest, SessionResponse};
use crate::app::errors;
use crate::app::services::AppServices;

/// Exchange a username/password for a session token.
///
/// Logout is client-side: the token is simply discarded.
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<serde_json::Value>,
) -> axum::response::Response {
    let body: LoginRequest = match dto::parse_body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    let principal = match services
        .directory
        .authenticate(&body.username, &body.password)
        .await
    {
        Ok(p) => p,
        Err(e) => return errors::directory_error_to_response(e),
    };

    match services.sessions.install(principal.username(), principal.role()) {
        Ok(session) => (StatusCode::OK, Json(SessionResponse::from(session))).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to issue session");
            errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "session_error",
                "failed to issue session",
            )
        }
    }
}
