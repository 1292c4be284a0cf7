//! Permission catalog endpoints (bypass-role gate).

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use warden_core::{DomainError, PermissionId};
use warden_rbac::RbacStore;

use crate::app::errors::domain_error_to_response;
use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::context::{ClientMeta, CurrentUser};

pub fn router() -> Router {
    Router::new()
        .route("/index", get(index))
        .route("/show/:id", get(show))
        .route("/store", post(store))
        .route("/update/:id", put(update))
        .route("/destroy/:id", delete(destroy))
}

#[derive(Debug, Deserialize)]
pub struct PermissionRequest {
    pub name: String,
}

pub async fn index(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Response, Response> {
    common::ensure_role(&services, current.user(), &[])?;

    let permissions: Vec<Value> = services
        .rbac
        .permissions()
        .iter()
        .map(common::permission_json)
        .collect();
    Ok((StatusCode::OK, Json(json!({ "data": permissions }))).into_response())
}

pub async fn show(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    common::ensure_role(&services, current.user(), &[])?;

    let id: PermissionId = id.parse().map_err(domain_error_to_response)?;
    let permission = services
        .rbac
        .permission(id)
        .ok_or_else(|| domain_error_to_response(DomainError::NotFound))?;
    Ok((
        StatusCode::OK,
        Json(json!({ "data": common::permission_json(&permission) })),
    )
        .into_response())
}

pub async fn store(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Extension(meta): Extension<ClientMeta>,
    Json(req): Json<PermissionRequest>,
) -> Result<Response, Response> {
    common::ensure_role(&services, current.user(), &[])?;

    let ctx = meta.context_for(current.user());
    let permission = services
        .registry
        .create_permission(&ctx, &req.name)
        .map_err(domain_error_to_response)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Permission created successfully",
            "data": common::permission_json(&permission),
        })),
    )
        .into_response())
}

pub async fn update(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Extension(meta): Extension<ClientMeta>,
    Path(id): Path<String>,
    Json(req): Json<PermissionRequest>,
) -> Result<Response, Response> {
    common::ensure_role(&services, current.user(), &[])?;

    let id: PermissionId = id.parse().map_err(domain_error_to_response)?;
    let ctx = meta.context_for(current.user());
    let permission = services
        .registry
        .rename_permission(&ctx, id, &req.name)
        .map_err(domain_error_to_response)?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Permission updated successfully",
            "data": common::permission_json(&permission),
        })),
    )
        .into_response())
}

pub async fn destroy(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Extension(meta): Extension<ClientMeta>,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    common::ensure_role(&services, current.user(), &[])?;

    let id: PermissionId = id.parse().map_err(domain_error_to_response)?;
    let ctx = meta.context_for(current.user());
    services
        .registry
        .delete_permission(&ctx, id)
        .map_err(domain_error_to_response)?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Permission deleted successfully" })),
    )
        .into_response())
}
