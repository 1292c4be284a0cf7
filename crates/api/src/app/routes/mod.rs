use axum::{
    routing::{get, post},
    Router,
};

use crate::middleware;

pub mod activity;
pub mod auth;
pub mod common;
pub mod permissions;
pub mod profile;
pub mod roles;
pub mod system;
pub mod users;

/// Unauthenticated endpoints.
pub fn public_router() -> Router {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/email/verify/:user_id/:signature", get(auth::verify_email))
}

/// Router for all authenticated endpoints.
///
/// Everything except `/email/resend` additionally requires a verified email.
pub fn router() -> Router {
    let verified = Router::new()
        .nest("/auth", auth::session_router())
        .nest("/role", roles::router())
        .nest("/permission", permissions::router())
        .nest("/user", users::router())
        .nest("/profile", profile::router())
        .nest("/log-activity", activity::router())
        .layer(axum::middleware::from_fn(middleware::require_verified));

    Router::new()
        .route("/email/resend", post(auth::resend_verification))
        .merge(verified)
}
