use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use warden_core::{DomainError, DomainResult, PermissionId, RoleId};
use warden_rbac::{Permission, RbacStore, Role};

#[derive(Debug, Default)]
struct RbacTables {
    permissions: HashMap<PermissionId, Permission>,
    roles: HashMap<RoleId, Role>,
    role_permissions: HashMap<RoleId, HashSet<PermissionId>>,
}

/// In-memory RBAC store.
///
/// Uniqueness and the atomic permission-set replacement are enforced inside
/// a single write-lock section. Intended for tests/dev; not optimized.
///
/// Read methods fail closed: a poisoned lock reads as "absent" (logged),
/// never as an error. The resolver depends on that.
#[derive(Debug, Default)]
pub struct InMemoryRbacStore {
    inner: RwLock<RbacTables>,
}

impl InMemoryRbacStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> DomainResult<std::sync::RwLockWriteGuard<'_, RbacTables>> {
        self.inner
            .write()
            .map_err(|_| DomainError::storage("rbac store lock poisoned"))
    }

    fn read(&self) -> Option<std::sync::RwLockReadGuard<'_, RbacTables>> {
        match self.inner.read() {
            Ok(guard) => Some(guard),
            Err(_) => {
                tracing::warn!("rbac store lock poisoned; reading as empty");
                None
            }
        }
    }
}

impl RbacStore for InMemoryRbacStore {
    fn insert_permission(&self, permission: Permission) -> DomainResult<()> {
        let mut tables = self.write()?;
        if tables.permissions.values().any(|p| p.name == permission.name) {
            return Err(DomainError::duplicate_name(permission.name));
        }
        tables.permissions.insert(permission.id, permission);
        Ok(())
    }

    fn rename_permission(&self, id: PermissionId, name: String) -> DomainResult<Permission> {
        let mut tables = self.write()?;
        if !tables.permissions.contains_key(&id) {
            return Err(DomainError::NotFound);
        }
        if tables
            .permissions
            .values()
            .any(|p| p.id != id && p.name == name)
        {
            return Err(DomainError::duplicate_name(name));
        }
        let permission = tables
            .permissions
            .get_mut(&id)
            .ok_or(DomainError::NotFound)?;
        permission.name = name;
        Ok(permission.clone())
    }

    fn remove_permission(&self, id: PermissionId) -> DomainResult<Permission> {
        // Association rows keep the dead id (dangling-reference policy);
        // the resolver skips ids without a catalog row.
        let mut tables = self.write()?;
        tables.permissions.remove(&id).ok_or(DomainError::NotFound)
    }

    fn permission(&self, id: PermissionId) -> Option<Permission> {
        self.read()?.permissions.get(&id).cloned()
    }

    fn permissions(&self) -> Vec<Permission> {
        let Some(tables) = self.read() else {
            return Vec::new();
        };
        let mut all: Vec<_> = tables.permissions.values().cloned().collect();
        // UUIDv7 ids are time-ordered, so id desc is newest first.
        all.sort_by(|a, b| b.id.cmp(&a.id));
        all
    }

    fn insert_role(&self, role: Role) -> DomainResult<()> {
        let mut tables = self.write()?;
        if tables.roles.values().any(|r| r.name == role.name) {
            return Err(DomainError::duplicate_name(role.name));
        }
        tables.role_permissions.insert(role.id, HashSet::new());
        tables.roles.insert(role.id, role);
        Ok(())
    }

    fn rename_role(&self, id: RoleId, name: String) -> DomainResult<Role> {
        let mut tables = self.write()?;
        if !tables.roles.contains_key(&id) {
            return Err(DomainError::NotFound);
        }
        if tables.roles.values().any(|r| r.id != id && r.name == name) {
            return Err(DomainError::duplicate_name(name));
        }
        let role = tables.roles.get_mut(&id).ok_or(DomainError::NotFound)?;
        role.name = name;
        Ok(role.clone())
    }

    fn remove_role(&self, id: RoleId) -> DomainResult<Role> {
        // The role's own association rows go with it; user rows pointing at
        // the role are left dangling and resolve to no access.
        let mut tables = self.write()?;
        let removed = tables.roles.remove(&id).ok_or(DomainError::NotFound)?;
        tables.role_permissions.remove(&id);
        Ok(removed)
    }

    fn role(&self, id: RoleId) -> Option<Role> {
        self.read()?.roles.get(&id).cloned()
    }

    fn role_by_name(&self, name: &str) -> Option<Role> {
        self.read()?.roles.values().find(|r| r.name == name).cloned()
    }

    fn roles(&self) -> Vec<Role> {
        let Some(tables) = self.read() else {
            return Vec::new();
        };
        let mut all: Vec<_> = tables.roles.values().cloned().collect();
        all.sort_by(|a, b| b.id.cmp(&a.id));
        all
    }

    fn role_permissions(&self, id: RoleId) -> Vec<PermissionId> {
        let Some(tables) = self.read() else {
            return Vec::new();
        };
        tables
            .role_permissions
            .get(&id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    fn replace_role_permissions(
        &self,
        id: RoleId,
        permission_ids: Vec<PermissionId>,
    ) -> DomainResult<Vec<PermissionId>> {
        let mut tables = self.write()?;
        if !tables.roles.contains_key(&id) {
            return Err(DomainError::NotFound);
        }
        // Full rejection on any unknown id, checked under the same lock as
        // the replace so a concurrent reader sees old set or new set, never
        // a partial one.
        for permission_id in &permission_ids {
            if !tables.permissions.contains_key(permission_id) {
                return Err(DomainError::NotFound);
            }
        }
        let new_set: HashSet<PermissionId> = permission_ids.into_iter().collect();
        let previous = tables
            .role_permissions
            .insert(id, new_set)
            .unwrap_or_default();
        Ok(previous.into_iter().collect())
    }
}
