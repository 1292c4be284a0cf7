//! Self-service profile endpoints (any verified principal, no role gate).

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use warden_audit::{AttributeDiff, EntityRef, Properties};
use warden_core::DomainError;
use warden_rbac::UserStore;
use warden_session::{hash_password, verify_password};

use crate::app::errors::{domain_error_to_response, json_error};
use crate::app::routes::{common, users};
use crate::app::services::AppServices;
use crate::context::{ClientMeta, CurrentUser};

const MAX_NAME_LEN: usize = 255;
const MAX_PHONE_LEN: usize = 15;
const MAX_ADDRESS_LEN: usize = 255;
const MAX_CITY_LEN: usize = 100;
const MIN_NEW_PASSWORD: usize = 6;

pub fn router() -> Router {
    Router::new()
        .route("/", get(index))
        .route("/update-profile", put(update_profile))
        .route("/update-password", post(update_password))
        .route("/deactivate", post(deactivate))
}

pub async fn index(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Response, Response> {
    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "User profile retrieved successfully",
            "data": common::user_json(&services, current.user()),
        })),
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
}

/// Update the caller's own identity fields. Email uniqueness is the user
/// store's check; the role and status fields are not reachable from here.
pub async fn update_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Extension(meta): Extension<ClientMeta>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Response, Response> {
    validate_profile(&req).map_err(domain_error_to_response)?;

    let mut user = current.user().clone();
    let before = user.audit_attributes();
    user.name = req.name.trim().to_string();
    user.email = req.email.trim().to_lowercase();
    user.phone = req.phone.map(|p| p.trim().to_string());
    user.address = req.address;
    user.city = req.city;

    services
        .users
        .update_user(user.clone())
        .map_err(domain_error_to_response)?;

    services
        .recorder
        .record(
            &meta.context_for(&user),
            Some(EntityRef::user(user.id)),
            "update profile",
            &format!("User {} updated profile.", user.name),
            Properties::new(),
            Some(AttributeDiff::new(before, user.audit_attributes())),
        )
        .map_err(domain_error_to_response)?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Profile updated successfully",
            "data": common::user_json(&services, &user),
        })),
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub new_password_confirmation: String,
}

pub async fn update_password(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Extension(meta): Extension<ClientMeta>,
    Json(req): Json<UpdatePasswordRequest>,
) -> Result<Response, Response> {
    let mut user = current.user().clone();
    if !verify_password(&req.current_password, &user.credential_hash) {
        return Err(json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "validation_error",
            "Current password is incorrect.",
        ));
    }
    if req.new_password.len() < MIN_NEW_PASSWORD {
        return Err(json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "validation_error",
            "New password must be at least 6 characters.",
        ));
    }
    if req.new_password != req.new_password_confirmation {
        return Err(json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "validation_error",
            "New password confirmation does not match.",
        ));
    }
    if req.new_password == req.current_password {
        return Err(json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "validation_error",
            "New password must be different from current password.",
        ));
    }

    user.credential_hash = hash_password(&req.new_password).map_err(domain_error_to_response)?;
    services
        .users
        .update_user(user.clone())
        .map_err(domain_error_to_response)?;

    services
        .recorder
        .record(
            &meta.context_for(&user),
            Some(EntityRef::user(user.id)),
            "update password",
            &format!("User {} updated password.", user.name),
            identity_props(&user),
            None,
        )
        .map_err(domain_error_to_response)?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Password updated successfully" })),
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
pub struct DeactivateRequest {
    pub password: String,
}

/// Self-service deactivation, open to any verified principal.
pub async fn deactivate(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Extension(meta): Extension<ClientMeta>,
    Json(req): Json<DeactivateRequest>,
) -> Result<Response, Response> {
    users::deactivate_account(&services, current.user(), &meta, &req.password)
}

fn validate_profile(req: &UpdateProfileRequest) -> Result<(), DomainError> {
    let name = req.name.trim();
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(DomainError::invalid_input(
            "Name is required and must be at most 255 characters.",
        ));
    }
    let email = req.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(DomainError::invalid_input("Email format is invalid."));
    }
    if let Some(phone) = &req.phone {
        if phone.len() > MAX_PHONE_LEN {
            return Err(DomainError::invalid_input(
                "Phone must be at most 15 characters.",
            ));
        }
    }
    if let Some(address) = &req.address {
        if address.len() > MAX_ADDRESS_LEN {
            return Err(DomainError::invalid_input(
                "Address must be at most 255 characters.",
            ));
        }
    }
    if let Some(city) = &req.city {
        if city.len() > MAX_CITY_LEN {
            return Err(DomainError::invalid_input(
                "City must be at most 100 characters.",
            ));
        }
    }
    Ok(())
}

fn identity_props(user: &warden_rbac::User) -> Properties {
    let mut props = Properties::new();
    props.insert("id".into(), json!(user.id.to_string()));
    props.insert("email".into(), json!(user.email));
    props
}
