//! HTTP application wiring (Axum router + service wiring).
//!
//! Layout:
//! - `services.rs`: domain service graph (stores, registry, resolver, sessions)
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `errors.rs`: consistent JSON error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::middleware;

pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// `app_key` signs email-verification links.
pub fn build_app(app_key: String) -> anyhow::Result<Router> {
    let services = Arc::new(services::build_services(&app_key)?);
    let auth_state = middleware::AuthState {
        services: Arc::clone(&services),
    };

    let protected = routes::router().layer(
        ServiceBuilder::new().layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        )),
    );

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::public_router())
        .merge(protected)
        .layer(Extension(services)))
}
