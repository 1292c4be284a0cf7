//! User management endpoints (bypass or `Admin` role gate).

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use warden_audit::{AttributeDiff, EntityRef, Properties};
use warden_core::{DomainError, RoleId, UserId};
use warden_rbac::{AccountStatus, RbacStore, UserStore};
use warden_session::verify_password;

use crate::app::errors::{domain_error_to_response, json_error};
use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::context::{ClientMeta, CurrentUser};

const MANAGER_ROLES: &[&str] = &["Admin"];

pub fn router() -> Router {
    Router::new()
        .route("/index", get(index))
        .route("/show/:id", get(show))
        .route("/update/:id", put(update))
        .route("/deactivate", post(deactivate))
        .route("/destroy/:id", delete(destroy))
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub role_id: Option<String>,
    pub active: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeactivateRequest {
    pub password: String,
}

pub async fn index(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Response, Response> {
    common::ensure_role(&services, current.user(), MANAGER_ROLES)?;

    let users: Vec<Value> = services
        .users
        .users()
        .iter()
        .map(|u| common::user_json(&services, u))
        .collect();
    Ok((StatusCode::OK, Json(json!({ "data": users }))).into_response())
}

pub async fn show(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    common::ensure_role(&services, current.user(), MANAGER_ROLES)?;

    let id: UserId = id.parse().map_err(domain_error_to_response)?;
    let user = services
        .users
        .user(id)
        .filter(|u| !u.is_deleted())
        .ok_or_else(|| domain_error_to_response(DomainError::NotFound))?;
    Ok((
        StatusCode::OK,
        Json(json!({ "data": common::user_json(&services, &user) })),
    )
        .into_response())
}

pub async fn update(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Extension(meta): Extension<ClientMeta>,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Response, Response> {
    common::ensure_role(&services, current.user(), MANAGER_ROLES)?;

    let id: UserId = id.parse().map_err(domain_error_to_response)?;
    let mut user = services
        .users
        .user(id)
        .filter(|u| !u.is_deleted())
        .ok_or_else(|| domain_error_to_response(DomainError::NotFound))?;

    let before = user.audit_attributes();
    apply_update(&services, &mut user, req)?;

    services
        .users
        .update_user(user.clone())
        .map_err(domain_error_to_response)?;

    services
        .recorder
        .record(
            &meta.context_for(current.user()),
            Some(EntityRef::user(user.id)),
            "update user",
            "User updated user.",
            Properties::new(),
            Some(AttributeDiff::new(before, user.audit_attributes())),
        )
        .map_err(domain_error_to_response)?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "User updated successfully",
            "data": common::user_json(&services, &user),
        })),
    )
        .into_response())
}

/// Deactivate the authenticated account (password confirmation required).
pub async fn deactivate(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Extension(meta): Extension<ClientMeta>,
    Json(req): Json<DeactivateRequest>,
) -> Result<Response, Response> {
    common::ensure_role(&services, current.user(), MANAGER_ROLES)?;
    deactivate_account(&services, current.user(), &meta, &req.password)
}

/// Flip the account to inactive and revoke every session. Shared with the
/// self-service profile route, which reaches it without a role gate.
pub(super) fn deactivate_account(
    services: &AppServices,
    user: &warden_rbac::User,
    meta: &ClientMeta,
    password: &str,
) -> Result<Response, Response> {
    let mut user = user.clone();
    if !verify_password(password, &user.credential_hash) {
        return Err(json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "Password is incorrect.",
        ));
    }

    let before = user.audit_attributes();
    user.status = AccountStatus::Inactive;
    services
        .users
        .update_user(user.clone())
        .map_err(domain_error_to_response)?;

    services
        .recorder
        .record(
            &meta.context_for(&user),
            Some(EntityRef::user(user.id)),
            "deactivate user",
            &format!("User {} deactivated their account.", user.name),
            Properties::new(),
            Some(AttributeDiff::new(before, user.audit_attributes())),
        )
        .map_err(domain_error_to_response)?;

    services
        .sessions
        .revoke_all(user.id)
        .map_err(domain_error_to_response)?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Account deactivated successfully" })),
    )
        .into_response())
}

/// Soft-delete a user and revoke their sessions.
pub async fn destroy(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Extension(meta): Extension<ClientMeta>,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    common::ensure_role(&services, current.user(), MANAGER_ROLES)?;

    let id: UserId = id.parse().map_err(domain_error_to_response)?;
    let mut user = services
        .users
        .user(id)
        .filter(|u| !u.is_deleted())
        .ok_or_else(|| domain_error_to_response(DomainError::NotFound))?;

    user.deleted_at = Some(Utc::now());
    services
        .users
        .update_user(user.clone())
        .map_err(domain_error_to_response)?;

    services
        .recorder
        .record(
            &meta.context_for(current.user()),
            Some(EntityRef::user(user.id)),
            "delete user",
            "User deleted user.",
            Properties::new(),
            None,
        )
        .map_err(domain_error_to_response)?;

    services
        .sessions
        .revoke_all(user.id)
        .map_err(domain_error_to_response)?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "User deleted successfully" })),
    )
        .into_response())
}

fn apply_update(
    services: &AppServices,
    user: &mut warden_rbac::User,
    req: UpdateUserRequest,
) -> Result<(), Response> {
    if let Some(name) = req.name {
        user.name = name;
    }
    if let Some(email) = req.email {
        user.email = email;
    }
    if let Some(phone) = req.phone {
        user.phone = Some(phone);
    }
    if let Some(address) = req.address {
        user.address = Some(address);
    }
    if let Some(city) = req.city {
        user.city = Some(city);
    }
    if let Some(role_id) = req.role_id {
        let role_id: RoleId = role_id.parse().map_err(domain_error_to_response)?;
        if services.rbac.role(role_id).is_none() {
            return Err(domain_error_to_response(DomainError::NotFound));
        }
        user.role_id = Some(role_id);
    }
    if let Some(active) = req.active {
        user.status = match active.as_str() {
            "active" => AccountStatus::Active,
            "inactive" => AccountStatus::Inactive,
            _ => {
                return Err(domain_error_to_response(DomainError::invalid_input(
                    "active must be one of: active, inactive",
                )))
            }
        };
    }
    Ok(())
}
