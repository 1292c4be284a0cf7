//! Catalog and role mutations, each emitting one audit entry.

use std::sync::Arc;

use serde_json::{json, Value};

use warden_audit::{
    ActivityRecorder, AttributeDiff, AuditStore, EntityRef, Properties, RequestContext,
};
use warden_core::{DomainError, DomainResult, PermissionId, RoleId};

use crate::permission::Permission;
use crate::role::Role;
use crate::store::RbacStore;

/// Upper bound on role/permission name length.
pub const MAX_NAME_LEN: usize = 255;

/// Validated, audit-emitting mutations over the permission catalog and the
/// role registry.
///
/// Every effective mutation appends exactly one activity entry with the
/// acting principal as causer and the affected entity as subject. A failed
/// append fails the call; the mutation must not be treated as committed.
#[derive(Debug)]
pub struct Registry<S, A> {
    store: Arc<S>,
    recorder: ActivityRecorder<A>,
}

impl<S, A> Clone for Registry<S, A> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            recorder: self.recorder.clone(),
        }
    }
}

impl<S: RbacStore, A: AuditStore> Registry<S, A> {
    pub fn new(store: Arc<S>, recorder: ActivityRecorder<A>) -> Self {
        Self { store, recorder }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Permissions
    // ─────────────────────────────────────────────────────────────────────

    pub fn create_permission(
        &self,
        ctx: &RequestContext,
        name: &str,
    ) -> DomainResult<Permission> {
        let name = validate_name("permission", name)?;
        let permission = Permission::new(name);
        self.store.insert_permission(permission.clone())?;

        self.recorder.record(
            ctx,
            Some(EntityRef::permission(permission.id)),
            "create permission",
            "User created permission.",
            Properties::new(),
            None,
        )?;
        Ok(permission)
    }

    pub fn rename_permission(
        &self,
        ctx: &RequestContext,
        id: PermissionId,
        name: &str,
    ) -> DomainResult<Permission> {
        let name = validate_name("permission", name)?;
        let previous = self.store.permission(id).ok_or(DomainError::NotFound)?;
        let updated = self.store.rename_permission(id, name)?;

        self.recorder.record(
            ctx,
            Some(EntityRef::permission(id)),
            "update permission",
            "User updated permission.",
            Properties::new(),
            Some(name_diff(&previous.name, &updated.name)),
        )?;
        Ok(updated)
    }

    pub fn delete_permission(
        &self,
        ctx: &RequestContext,
        id: PermissionId,
    ) -> DomainResult<Permission> {
        let removed = self.store.remove_permission(id)?;

        self.recorder.record(
            ctx,
            Some(EntityRef::permission(id)),
            "delete permission",
            "User deleted permission.",
            Properties::new(),
            None,
        )?;
        Ok(removed)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Roles
    // ─────────────────────────────────────────────────────────────────────

    pub fn create_role(
        &self,
        ctx: &RequestContext,
        name: &str,
        permission_ids: Vec<PermissionId>,
    ) -> DomainResult<Role> {
        let name = validate_name("role", name)?;
        let role = Role::new(name);
        self.store.insert_role(role.clone())?;

        // The atomic replace re-checks the ids inside the store lock; undo
        // the insert if any of them is unknown so no half-created role leaks.
        if let Err(e) = self
            .store
            .replace_role_permissions(role.id, permission_ids.clone())
        {
            if let Err(rollback) = self.store.remove_role(role.id) {
                tracing::warn!(role_id = %role.id, error = %rollback, "rollback of half-created role failed");
            }
            return Err(e);
        }

        let mut props = Properties::new();
        props.insert("permissions".into(), permission_ids_value(&permission_ids));
        self.recorder.record(
            ctx,
            Some(EntityRef::role(role.id)),
            "create role",
            "User created role.",
            props,
            None,
        )?;
        Ok(role)
    }

    pub fn rename_role(&self, ctx: &RequestContext, id: RoleId, name: &str) -> DomainResult<Role> {
        let name = validate_name("role", name)?;
        let previous = self.store.role(id).ok_or(DomainError::NotFound)?;
        let updated = self.store.rename_role(id, name)?;

        self.recorder.record(
            ctx,
            Some(EntityRef::role(id)),
            "update role",
            "User updated role.",
            Properties::new(),
            Some(name_diff(&previous.name, &updated.name)),
        )?;
        Ok(updated)
    }

    pub fn delete_role(&self, ctx: &RequestContext, id: RoleId) -> DomainResult<Role> {
        let removed = self.store.remove_role(id)?;

        self.recorder.record(
            ctx,
            Some(EntityRef::role(id)),
            "delete role",
            "User deleted role.",
            Properties::new(),
            None,
        )?;
        Ok(removed)
    }

    /// Replace a role's permission set with exactly the given ids.
    ///
    /// Idempotent: syncing the already-current set changes nothing and emits
    /// no audit entry. Unknown ids reject the whole call (`NotFound`).
    pub fn sync_role_permissions(
        &self,
        ctx: &RequestContext,
        role_id: RoleId,
        permission_ids: Vec<PermissionId>,
    ) -> DomainResult<Vec<PermissionId>> {
        if self.store.role(role_id).is_none() {
            return Err(DomainError::NotFound);
        }

        let mut new_ids = permission_ids;
        new_ids.sort();
        new_ids.dedup();

        let mut previous = self
            .store
            .replace_role_permissions(role_id, new_ids.clone())?;
        previous.sort();

        if previous == new_ids {
            return Ok(new_ids);
        }

        let diff = AttributeDiff::new(
            [("permissions".to_string(), permission_ids_value(&previous))]
                .into_iter()
                .collect(),
            [("permissions".to_string(), permission_ids_value(&new_ids))]
                .into_iter()
                .collect(),
        );
        self.recorder.record(
            ctx,
            Some(EntityRef::role(role_id)),
            "update role",
            "User updated role.",
            Properties::new(),
            Some(diff),
        )?;
        Ok(new_ids)
    }
}

fn name_diff(old: &str, new: &str) -> AttributeDiff {
    AttributeDiff::new(
        [("name".to_string(), Value::String(old.to_string()))]
            .into_iter()
            .collect(),
        [("name".to_string(), Value::String(new.to_string()))]
            .into_iter()
            .collect(),
    )
}

fn permission_ids_value(ids: &[PermissionId]) -> Value {
    json!(ids.iter().map(|id| id.to_string()).collect::<Vec<_>>())
}

/// Reject empty and over-long names. Comparison for uniqueness is the
/// store's job and stays case-sensitive.
pub fn validate_name(kind: &str, name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::invalid_input(format!(
            "{kind} name must not be empty"
        )));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(DomainError::invalid_input(format!(
            "{kind} name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}
