use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use hcm_auth::{Role, Session};
use hcm_core::EmployeeId;
use hcm_directory::{Employee, UpdateOutcome, User};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

// Employee create/update bodies deserialize straight into
// `hcm_directory::NewEmployee` / `EmployeeProfile` via `parse_body`.

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub username: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            token: session.token,
            username: session.claims.sub,
            role: session.claims.role,
            expires_at: session.claims.expires_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UpdateEmployeeResponse {
    pub employee: Employee,
    pub user: Option<User>,
    /// Replacement session when the caller changed their own account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionResponse>,
}

impl UpdateEmployeeResponse {
    pub fn new(outcome: UpdateOutcome, session: Option<Session>) -> Self {
        Self {
            employee: outcome.employee,
            user: outcome.user,
            session: session.map(SessionResponse::from),
        }
    }
}

// -------------------------
// Mapping helpers
// -------------------------

pub fn parse_employee_id(raw: &str) -> Result<EmployeeId, axum::response::Response> {
    raw.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid employee id")
    })
}

/// Decode a JSON body, reporting shape errors as `validation_error`.
pub fn parse_body<T: DeserializeOwned>(
    body: serde_json::Value,
) -> Result<T, axum::response::Response> {
    serde_json::from_value(body).map_err(|e| {
        errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string())
    })
}
