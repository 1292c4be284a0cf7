use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use warden_core::{ActivityId, PermissionId, RoleId, UserId};

/// Ordered string-keyed property bag attached to an activity entry.
///
/// Producers in this workspace only ever store scalar values here; the map
/// preserves insertion order (`serde_json` with `preserve_order`).
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// Request-scoped audit context, passed explicitly to every `record` call.
///
/// There is intentionally no ambient "current request" state: the causer and
/// the forensic metadata travel as a parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub causer: Option<UserId>,
    pub ip: Option<String>,
    pub device: Option<String>,
}

impl RequestContext {
    /// Context for a system-initiated action (no causer).
    pub fn system() -> Self {
        Self::default()
    }

    pub fn for_user(causer: UserId) -> Self {
        Self {
            causer: Some(causer),
            ..Self::default()
        }
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }
}

/// The entity an activity entry was performed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub subject_type: String,
    pub subject_id: Option<Uuid>,
}

impl EntityRef {
    pub fn new(subject_type: impl Into<String>, subject_id: Option<Uuid>) -> Self {
        Self {
            subject_type: subject_type.into(),
            subject_id,
        }
    }

    pub fn user(id: UserId) -> Self {
        Self::new("user", Some(id.into()))
    }

    pub fn role(id: RoleId) -> Self {
        Self::new("role", Some(id.into()))
    }

    pub fn permission(id: PermissionId) -> Self {
        Self::new("permission", Some(id.into()))
    }
}

/// Before/after attribute snapshot of an updated entity.
///
/// Field names mirror the stored layout: `old` holds the previous values for
/// the changed keys, `attributes` the new ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDiff {
    pub old: Properties,
    pub attributes: Properties,
}

impl AttributeDiff {
    pub fn new(old: Properties, attributes: Properties) -> Self {
        Self { old, attributes }
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// An entry accepted by the recorder but not yet durably appended.
///
/// The store assigns the monotonic `sequence` on append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivityEntry {
    pub id: ActivityId,
    pub causer_id: Option<UserId>,
    pub subject_type: Option<String>,
    pub subject_id: Option<Uuid>,
    pub event: String,
    pub description: String,
    pub properties: Properties,
    pub diff: Option<AttributeDiff>,
    pub created_at: DateTime<Utc>,
}

/// A durably appended activity entry. Never mutated after creation.
///
/// Display ordering is `created_at` descending with `sequence` (assigned
/// monotonically by the store) breaking ties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: ActivityId,
    pub sequence: u64,
    pub causer_id: Option<UserId>,
    pub subject_type: Option<String>,
    pub subject_id: Option<Uuid>,
    pub event: String,
    pub description: String,
    pub properties: Properties,
    pub diff: Option<AttributeDiff>,
    pub created_at: DateTime<Utc>,
}
