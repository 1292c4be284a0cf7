//! Activity-trail endpoints.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use warden_audit::Pagination;
use warden_core::{ActivityId, DomainError};

use crate::app::errors::domain_error_to_response;
use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::context::CurrentUser;

pub fn router() -> Router {
    Router::new()
        .route("/", get(index))
        .route("/show/:id", get(show))
        .route("/destroy/:id", delete(destroy))
        .route("/user-activity", get(user_activity))
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl PageQuery {
    fn pagination(&self) -> Pagination {
        let default = Pagination::default();
        Pagination {
            limit: self.limit.unwrap_or(default.limit),
            offset: self.offset.unwrap_or(default.offset),
        }
    }
}

/// Full trail, bypass-role gate.
pub async fn index(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Query(page): Query<PageQuery>,
) -> Result<Response, Response> {
    common::ensure_role(&services, current.user(), &[])?;

    let entries = services
        .recorder
        .list(page.pagination())
        .map_err(domain_error_to_response)?;
    let total = services.recorder.count().map_err(domain_error_to_response)?;

    let data: Vec<Value> = entries.iter().map(common::entry_json).collect();
    Ok((StatusCode::OK, Json(json!({ "data": data, "total": total }))).into_response())
}

pub async fn show(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    let id: ActivityId = id.parse().map_err(domain_error_to_response)?;
    let entry = services
        .recorder
        .get(id)
        .map_err(domain_error_to_response)?
        .ok_or_else(|| domain_error_to_response(DomainError::NotFound))?;

    Ok((
        StatusCode::OK,
        Json(json!({ "data": common::entry_json(&entry) })),
    )
        .into_response())
}

/// Administrative purge, bypass-role gate. The purge itself is not audited.
pub async fn destroy(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    common::ensure_role(&services, current.user(), &[])?;

    let id: ActivityId = id.parse().map_err(domain_error_to_response)?;
    services
        .recorder
        .delete(id)
        .map_err(domain_error_to_response)?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Activity deleted successfully" })),
    )
        .into_response())
}

/// The caller's own entries.
pub async fn user_activity(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Response, Response> {
    let entries = services
        .recorder
        .list_by_causer(current.user().id)
        .map_err(domain_error_to_response)?;

    let data: Vec<Value> = entries.iter().map(common::entry_json).collect();
    Ok((StatusCode::OK, Json(json!({ "data": data }))).into_response())
}
