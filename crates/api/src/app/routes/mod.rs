use axum::{Router, routing::get};

pub mod auth;
pub mod employees;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/employees", employees::router())
}
