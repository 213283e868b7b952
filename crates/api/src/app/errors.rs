use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use hcm_directory::DirectoryError;

pub fn directory_error_to_response(err: DirectoryError) -> axum::response::Response {
    match err {
        DirectoryError::NotFound => {
            json_error(StatusCode::NOT_FOUND, "not_found", "employee not found")
        }
        DirectoryError::Forbidden(msg) => json_error(StatusCode::FORBIDDEN, "forbidden", msg),
        DirectoryError::CallerNotFound => json_error(
            StatusCode::FORBIDDEN,
            "caller_not_found",
            "authenticated user has no directory record",
        ),
        DirectoryError::ValidationFailed(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        DirectoryError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DirectoryError::InvalidCredentials => json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "invalid username or password",
        ),
        DirectoryError::StoreUnavailable(msg) => {
            tracing::error!(error = %msg, "directory store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_unavailable", "internal error")
        }
        DirectoryError::Hashing(msg) => {
            tracing::error!(error = %msg, "credential hashing failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_failures_map_to_distinct_codes() {
        let cases = [
            (DirectoryError::NotFound, StatusCode::NOT_FOUND),
            (DirectoryError::forbidden("no"), StatusCode::FORBIDDEN),
            (DirectoryError::CallerNotFound, StatusCode::FORBIDDEN),
            (DirectoryError::ValidationFailed("bad".into()), StatusCode::BAD_REQUEST),
            (DirectoryError::Conflict("stale".into()), StatusCode::CONFLICT),
            (DirectoryError::StoreUnavailable("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(directory_error_to_response(err).status(), status);
        }
    }
}
