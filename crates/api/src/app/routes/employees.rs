use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use hcm_auth::{Session, SessionIssuer};
use hcm_directory::{ClaimsRefresh, EmployeeProfile, NewEmployee};

use crate::app::dto::{self, UpdateEmployeeResponse};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_employees).post(create_employee))
        .route(
            "/:id",
            get(get_employee).put(update_employee).delete(delete_employee),
        )
}

pub async fn list_employees(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    match services.directory.list_employees(principal.principal()).await {
        Ok(list) => Json(list).into_response(),
        Err(e) => errors::directory_error_to_response(e),
    }
}

pub async fn get_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match dto::parse_employee_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.directory.get_employee(id, principal.principal()).await {
        Ok(employee) => Json(employee).into_response(),
        Err(e) => errors::directory_error_to_response(e),
    }
}

pub async fn create_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<serde_json::Value>,
) -> axum::response::Response {
    let input: NewEmployee = match dto::parse_body(body) {
        Ok(input) => input,
        Err(resp) => return resp,
    };

    match services.directory.create_employee(input, principal.principal()).await {
        Ok(employee) => (StatusCode::CREATED, Json(employee)).into_response(),
        Err(e) => errors::directory_error_to_response(e),
    }
}

pub async fn update_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> axum::response::Response {
    let id = match dto::parse_employee_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let profile: EmployeeProfile = match dto::parse_body(body) {
        Ok(profile) => profile,
        Err(resp) => return resp,
    };

    let outcome = match services
        .directory
        .update_employee(id, profile, principal.principal())
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => return errors::directory_error_to_response(e),
    };

    let session = outcome
        .claims_refresh
        .as_ref()
        .and_then(|refresh| refresh_session(&services, refresh));

    Json(UpdateEmployeeResponse::new(outcome, session)).into_response()
}

pub async fn delete_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match dto::parse_employee_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.directory.delete_employee(id, principal.principal()).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::directory_error_to_response(e),
    }
}

/// Install the refreshed claims. The update is already committed, so a
/// signing failure only costs the caller a re-login.
fn refresh_session(services: &AppServices, refresh: &ClaimsRefresh) -> Option<Session> {
    match services.sessions.install(&refresh.username, refresh.role) {
        Ok(session) => Some(session),
        Err(e) => {
            tracing::warn!(
                error = %e,
                username = %refresh.username,
                "failed to refresh session claims"
            );
            None
        }
    }
}
