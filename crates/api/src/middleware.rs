use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::app::errors::json_error;
use crate::app::services::AppServices;
use crate::context::{ClientMeta, CurrentUser};

#[derive(Clone)]
pub struct AuthState {
    pub services: Arc<AppServices>,
}

/// Resolve the bearer token to a principal and attach it to the request.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_bearer(req.headers())?;

    let user = state
        .services
        .sessions
        .validate(token)
        .map_err(|_| unauthenticated())?;

    let meta = ClientMeta::from_headers(req.headers());
    req.extensions_mut().insert(CurrentUser::new(user));
    req.extensions_mut().insert(meta);

    Ok(next.run(req).await)
}

/// Reject authenticated but unverified principals.
///
/// Runs inside `auth_middleware`, so the `CurrentUser` extension is present.
pub async fn require_verified(
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let verified = req
        .extensions()
        .get::<CurrentUser>()
        .map(|current| current.user().is_verified())
        .ok_or_else(unauthenticated)?;

    if !verified {
        return Err(json_error(
            StatusCode::FORBIDDEN,
            "verification_required",
            "Your email is not verified. Please verify your account.",
        ));
    }

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, Response> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(unauthenticated)?;

    let header = header.to_str().map_err(|_| unauthenticated())?;

    let header = header.strip_prefix("Bearer ").ok_or_else(unauthenticated)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(unauthenticated());
    }

    Ok(token)
}

fn unauthenticated() -> Response {
    json_error(
        StatusCode::UNAUTHORIZED,
        "unauthenticated",
        "User not authenticated",
    )
}
