use axum::http::HeaderMap;

use warden_audit::RequestContext;
use warden_rbac::User;

/// Authenticated principal for a request, inserted by the auth middleware.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    user: User,
}

impl CurrentUser {
    pub fn new(user: User) -> Self {
        Self { user }
    }

    pub fn user(&self) -> &User {
        &self.user
    }
}

/// Forensic request metadata recorded alongside activity entries.
///
/// The values are taken from client-supplied headers and are stored
/// verbatim; nothing authorizes against them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientMeta {
    pub ip: Option<String>,
    pub device: Option<String>,
}

impl ClientMeta {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        // First hop of x-forwarded-for.
        let ip = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let device = headers
            .get(axum::http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        Self { ip, device }
    }

    /// Audit context for an action caused by the given user.
    pub fn context_for(&self, user: &User) -> RequestContext {
        let mut ctx = RequestContext::for_user(user.id);
        ctx.ip = self.ip.clone();
        ctx.device = self.device.clone();
        ctx
    }
}
