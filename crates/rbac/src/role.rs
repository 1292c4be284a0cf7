use serde::{Deserialize, Serialize};

use warden_core::RoleId;

/// A named role owning a set of permissions.
///
/// The permission association lives in the store (`role_permissions`), not
/// on the entity; the reserved bypass role is identified by its configured
/// name, never by its stored grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: RoleId::new(),
            name: name.into(),
        }
    }
}
