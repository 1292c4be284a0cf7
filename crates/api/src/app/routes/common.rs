//! Shared response shaping and gate helpers.

use axum::http::StatusCode;
use serde_json::{json, Value};

use warden_audit::ActivityEntry;
use warden_rbac::{Permission, RbacStore, Role, User};

use crate::app::errors::json_error;
use crate::app::services::AppServices;

/// Role gate: bypass holders pass every gate, so `any_of: &[]` reads as
/// "bypass role only".
pub fn ensure_role(
    services: &AppServices,
    user: &User,
    any_of: &[&str],
) -> Result<(), axum::response::Response> {
    if services.resolver.authorize_role(user, any_of) {
        Ok(())
    } else {
        Err(json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "User does not have the right roles.",
        ))
    }
}

pub fn user_json(services: &AppServices, user: &User) -> Value {
    let role = services.resolver.role_of(user).map(|r| r.name);
    json!({
        "id": user.id.to_string(),
        "name": user.name,
        "email": user.email,
        "phone": user.phone,
        "address": user.address,
        "city": user.city,
        "role": role,
        "active": user.status.to_string(),
        "email_verified_at": user.email_verified_at,
        "created_at": user.created_at,
    })
}

pub fn permission_json(permission: &Permission) -> Value {
    json!({
        "id": permission.id.to_string(),
        "name": permission.name,
    })
}

pub fn role_json(services: &AppServices, role: &Role) -> Value {
    // Dangling permission ids resolve to nothing, same as the resolver.
    let permissions: Vec<Value> = services
        .rbac
        .role_permissions(role.id)
        .iter()
        .filter_map(|id| services.rbac.permission(*id))
        .map(|p| permission_json(&p))
        .collect();
    json!({
        "id": role.id.to_string(),
        "name": role.name,
        "permissions": permissions,
    })
}

pub fn entry_json(entry: &ActivityEntry) -> Value {
    serde_json::to_value(entry).unwrap_or(Value::Null)
}
