use serde::{Deserialize, Serialize};

use warden_core::PermissionId;

/// A named capability in the catalog.
///
/// Names are globally unique (case-sensitive) and opaque at this layer;
/// the domain convention is "action-resource" (e.g. `"edit-user"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub name: String,
}

impl Permission {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: PermissionId::new(),
            name: name.into(),
        }
    }
}
