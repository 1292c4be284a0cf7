use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use warden_core::DomainError;

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::InvalidInput(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg)
        }
        DomainError::DuplicateName(name) => json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "duplicate_name",
            format!("{name} is already taken"),
        ),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DomainError::Unauthorized => json_error(
            StatusCode::UNAUTHORIZED,
            "unauthenticated",
            "User not authenticated",
        ),
        DomainError::Forbidden(what) => json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            format!("missing permission: {what}"),
        ),
        DomainError::VerificationRequired => json_error(
            StatusCode::FORBIDDEN,
            "verification_required",
            "Your email is not verified. Please verify your account.",
        ),
        DomainError::AlreadyVerified => json_error(
            StatusCode::BAD_REQUEST,
            "already_verified",
            "Email already verified.",
        ),
        DomainError::Storage(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", msg)
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
