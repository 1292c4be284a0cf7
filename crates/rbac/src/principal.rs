use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use warden_audit::Properties;
use warden_core::{RoleId, UserId};

/// Account activation status.
///
/// Inactive users keep their data but resolve to the empty permission set
/// and cannot pass any authorization gate, bypass role included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Active,
    Inactive,
}

impl core::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AccountStatus::Active => write!(f, "active"),
            AccountStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// An authenticatable principal.
///
/// # Invariants
/// - At most one role (`role_id`); the store slot is the whole model, so
///   "first-assigned wins" is structural.
/// - Soft-deleted users (`deleted_at` set) are excluded from authentication
///   and resolution but retained for audit referential integrity.
/// - `credential_hash` never leaves this crate in serialized form; response
///   shaping is the HTTP layer's job and the audit recorder scrubs it.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub credential_hash: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub role_id: Option<RoleId>,
    pub status: AccountStatus,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        credential_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: UserId::new(),
            name: name.into(),
            email: email.into(),
            credential_hash: credential_hash.into(),
            phone: None,
            address: None,
            city: None,
            role_id: None,
            status: AccountStatus::Active,
            email_verified_at: None,
            deleted_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn is_verified(&self) -> bool {
        self.email_verified_at.is_some()
    }

    /// Snapshot of the logged attributes for audit diffing.
    ///
    /// Deliberately includes the credential hash under `"password"`: the
    /// recorder's denylist must strip it regardless of caller discipline,
    /// and this keeps that contract exercised.
    pub fn audit_attributes(&self) -> Properties {
        let mut attrs = Properties::new();
        attrs.insert("name".into(), Value::String(self.name.clone()));
        attrs.insert("email".into(), Value::String(self.email.clone()));
        attrs.insert("password".into(), Value::String(self.credential_hash.clone()));
        attrs.insert("phone".into(), opt_str(&self.phone));
        attrs.insert("address".into(), opt_str(&self.address));
        attrs.insert("city".into(), opt_str(&self.city));
        attrs.insert("active".into(), Value::String(self.status.to_string()));
        attrs
    }
}

fn opt_str(value: &Option<String>) -> Value {
    value
        .as_ref()
        .map(|s| Value::String(s.clone()))
        .unwrap_or(Value::Null)
}
