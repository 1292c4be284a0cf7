//! Role registry endpoints (bypass-role gate).

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

use warden_core::{DomainError, PermissionId, RoleId};
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
pub struct StoreRoleRequest {
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    pub permissions: Option<Vec<String>>,
}

pub async fn index(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Response, Response> {
    common::ensure_role(&services, current.user(), &[])?;

    let roles: Vec<Value> = services
        .rbac
        .roles()
        .iter()
        .map(|r| common::role_json(&services, r))
        .collect();
    Ok((StatusCode::OK, Json(json!({ "data": roles }))).into_response())
}

pub async fn show(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    common::ensure_role(&services, current.user(), &[])?;

    let id: RoleId = id.parse().map_err(domain_error_to_response)?;
    let role = services
        .rbac
        .role(id)
        .ok_or_else(|| domain_error_to_response(DomainError::NotFound))?;
    Ok((
        StatusCode::OK,
        Json(json!({ "data": common::role_json(&services, &role) })),
    )
        .into_response())
}

pub async fn store(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Extension(meta): Extension<ClientMeta>,
    Json(req): Json<StoreRoleRequest>,
) -> Result<Response, Response> {
    common::ensure_role(&services, current.user(), &[])?;

    let permission_ids = parse_permission_ids(&req.permissions)?;
    let ctx = meta.context_for(current.user());
    let role = services
        .registry
        .create_role(&ctx, &req.name, permission_ids)
        .map_err(domain_error_to_response)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Role created successfully",
            "data": common::role_json(&services, &role),
        })),
    )
        .into_response())
}

pub async fn update(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Extension(meta): Extension<ClientMeta>,
    Path(id): Path<String>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<Response, Response> {
    common::ensure_role(&services, current.user(), &[])?;

    let id: RoleId = id.parse().map_err(domain_error_to_response)?;
    let ctx = meta.context_for(current.user());

    let mut role = services
        .rbac
        .role(id)
        .ok_or_else(|| domain_error_to_response(DomainError::NotFound))?;
    if let Some(name) = &req.name {
        role = services
            .registry
            .rename_role(&ctx, id, name)
            .map_err(domain_error_to_response)?;
    }
    if let Some(permissions) = &req.permissions {
        let permission_ids = parse_permission_ids(permissions)?;
        services
            .registry
            .sync_role_permissions(&ctx, id, permission_ids)
            .map_err(domain_error_to_response)?;
    }

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Role updated successfully",
            "data": common::role_json(&services, &role),
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

    let id: RoleId = id.parse().map_err(domain_error_to_response)?;
    let ctx = meta.context_for(current.user());
    services
        .registry
        .delete_role(&ctx, id)
        .map_err(domain_error_to_response)?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Role deleted successfully" })),
    )
        .into_response())
}

fn parse_permission_ids(raw: &[String]) -> Result<Vec<PermissionId>, Response> {
    raw.iter()
        .map(|s| s.parse::<PermissionId>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(domain_error_to_response)
}
