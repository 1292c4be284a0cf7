//! Authentication, session and email-verification endpoints.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use warden_audit::{EntityRef, Properties};
use warden_core::{DomainError, UserId};
use warden_rbac::{User, UserStore};
use warden_session::{hash_password, verify_password, VerificationLink};

use crate::app::errors::{domain_error_to_response, json_error};
use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::context::{ClientMeta, CurrentUser};

const MIN_REGISTER_PASSWORD: usize = 6;
const MIN_LOGIN_PASSWORD: usize = 3;
const MIN_RESET_PASSWORD: usize = 8;
const MAX_NAME_LEN: usize = 255;
const MAX_PHONE_LEN: usize = 15;

/// Session endpoints nested under `/auth` (authenticated + verified).
pub fn session_router() -> Router {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/permission", get(permission))
        .route("/forgot-password", post(forgot_password))
}

// ─────────────────────────────────────────────────────────────────────────
// Public endpoints
// ─────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    pub phone: Option<String>,
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    Json(req): Json<RegisterRequest>,
) -> Result<Response, Response> {
    validate_register(&req).map_err(domain_error_to_response)?;

    let hash = hash_password(&req.password).map_err(domain_error_to_response)?;
    let mut user = User::new(req.name.trim(), req.email.trim(), hash);
    user.phone = req.phone;

    services
        .users
        .insert_user(user.clone())
        .map_err(domain_error_to_response)?;

    let ctx = ClientMeta::from_headers(&headers).context_for(&user);
    services
        .recorder
        .record(
            &ctx,
            Some(EntityRef::user(user.id)),
            "register",
            &format!("User {} registered an account.", user.name),
            identity_props(&user),
            None,
        )
        .map_err(domain_error_to_response)?;

    // No mailer: the verification link is returned to the caller.
    let link = services
        .verifier
        .mint(&user, Utc::now())
        .map_err(domain_error_to_response)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully, please verify your email.",
            "verification": verification_json(&link),
        })),
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<Response, Response> {
    if req.password.len() < MIN_LOGIN_PASSWORD {
        return Err(json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "validation_error",
            "Password must be at least 3 characters.",
        ));
    }

    let Some(user) = services.users.user_by_email(req.email.trim()) else {
        return Err(json_error(
            StatusCode::NOT_FOUND,
            "not_registered",
            "This email is not registered. Please sign up first.",
        ));
    };

    if !verify_password(&req.password, &user.credential_hash) {
        return Err(json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "Password is incorrect.",
        ));
    }

    let token = services
        .sessions
        .issue(&user)
        .map_err(domain_error_to_response)?;

    // Unverified users get their token but are told to verify first.
    if !user.is_verified() {
        return Ok((
            StatusCode::FORBIDDEN,
            Json(json!({
                "message": "Email verification required",
                "access_token": token,
                "token_type": "Bearer",
                "url_resend_email": "/email/resend",
            })),
        )
            .into_response());
    }

    let ctx = ClientMeta::from_headers(&headers).context_for(&user);
    services
        .recorder
        .record(
            &ctx,
            Some(EntityRef::user(user.id)),
            "login",
            &format!("User {} logged in.", user.name),
            identity_props(&user),
            None,
        )
        .map_err(domain_error_to_response)?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Login successful",
            "data": common::user_json(&services, &user),
            "access_token": token,
            "token_type": "Bearer",
        })),
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub expires: i64,
}

pub async fn verify_email(
    Extension(services): Extension<Arc<AppServices>>,
    Path((user_id, signature)): Path<(String, String)>,
    Query(query): Query<VerifyQuery>,
) -> Result<Response, Response> {
    let user_id: UserId = user_id.parse().map_err(domain_error_to_response)?;

    let user = services
        .verifier
        .verify(user_id, &signature, query.expires, Utc::now())
        .map_err(domain_error_to_response)?;

    // Original behavior: a successful verification logs the user in.
    let token = services
        .sessions
        .issue(&user)
        .map_err(domain_error_to_response)?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Email verified successfully.",
            "access_token": token,
            "token_type": "Bearer",
            "user": common::user_json(&services, &user),
        })),
    )
        .into_response())
}

/// `POST /email/resend`: authenticated, verification not required.
pub async fn resend_verification(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Response, Response> {
    let user = current.user();
    if user.is_verified() {
        return Err(domain_error_to_response(DomainError::AlreadyVerified));
    }

    let link = services
        .verifier
        .mint(user, Utc::now())
        .map_err(domain_error_to_response)?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Verification link sent!",
            "verification": verification_json(&link),
        })),
    )
        .into_response())
}

// ─────────────────────────────────────────────────────────────────────────
// Authenticated + verified endpoints
// ─────────────────────────────────────────────────────────────────────────

pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Extension(meta): Extension<ClientMeta>,
) -> Result<Response, Response> {
    let user = current.user();
    services
        .recorder
        .record(
            &meta.context_for(user),
            Some(EntityRef::user(user.id)),
            "me",
            &format!("User {} get data.", user.name),
            identity_props(user),
            None,
        )
        .map_err(domain_error_to_response)?;

    Ok((
        StatusCode::OK,
        Json(json!({ "data": common::user_json(&services, user) })),
    )
        .into_response())
}

pub async fn permission(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Response, Response> {
    let user = current.user();
    let permissions: Vec<Value> = services
        .resolver
        .materialize(user)
        .iter()
        .map(common::permission_json)
        .collect();
    let role = services.resolver.role_of(user).map(|r| r.name);

    Ok((
        StatusCode::OK,
        Json(json!({ "permissions": permissions, "role": role })),
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

pub async fn forgot_password(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(meta): Extension<ClientMeta>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Response, Response> {
    if req.password.len() < MIN_RESET_PASSWORD {
        return Err(json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "validation_error",
            "Password must be at least 8 characters.",
        ));
    }
    if req.password != req.password_confirmation {
        return Err(json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "validation_error",
            "Password confirmation does not match.",
        ));
    }

    let Some(mut user) = services.users.user_by_email(req.email.trim()) else {
        return Err(json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "validation_error",
            "Email is not registered.",
        ));
    };

    user.credential_hash = hash_password(&req.password).map_err(domain_error_to_response)?;
    services
        .users
        .update_user(user.clone())
        .map_err(domain_error_to_response)?;

    services
        .recorder
        .record(
            &meta.context_for(&user),
            Some(EntityRef::user(user.id)),
            "forgot-password",
            &format!("User {} reset their password.", user.name),
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

pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Extension(meta): Extension<ClientMeta>,
) -> Result<Response, Response> {
    let user = current.user();
    services
        .recorder
        .record(
            &meta.context_for(user),
            Some(EntityRef::user(user.id)),
            "logout",
            &format!("User {} logged out.", user.name),
            identity_props(user),
            None,
        )
        .map_err(domain_error_to_response)?;

    services
        .sessions
        .revoke_all(user.id)
        .map_err(domain_error_to_response)?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "User logged out successfully" })),
    )
        .into_response())
}

// ─────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────

fn validate_register(req: &RegisterRequest) -> Result<(), DomainError> {
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
    if req.password.len() < MIN_REGISTER_PASSWORD {
        return Err(DomainError::invalid_input(
            "Password must be at least 6 characters.",
        ));
    }
    if req.password != req.password_confirmation {
        return Err(DomainError::invalid_input(
            "Password confirmation does not match.",
        ));
    }
    if let Some(phone) = &req.phone {
        if phone.len() > MAX_PHONE_LEN {
            return Err(DomainError::invalid_input(
                "Phone must be at most 15 characters.",
            ));
        }
    }
    Ok(())
}

fn identity_props(user: &User) -> Properties {
    let mut props = Properties::new();
    props.insert("id".into(), json!(user.id.to_string()));
    props.insert("name".into(), json!(user.name));
    props.insert("email".into(), json!(user.email));
    props
}

fn verification_json(link: &VerificationLink) -> Value {
    json!({
        "user_id": link.user_id.to_string(),
        "signature": link.signature,
        "expires": link.expires_at,
        "url": format!(
            "/email/verify/{}/{}?expires={}",
            link.user_id, link.signature, link.expires_at
        ),
    })
}
