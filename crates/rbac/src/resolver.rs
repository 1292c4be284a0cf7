//! Effective-permission resolution with universal-bypass short-circuit.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use warden_core::DomainResult;

use crate::permission::Permission;
use crate::principal::User;
use crate::role::Role;
use crate::store::RbacStore;

/// RBAC configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RbacConfig {
    /// Reserved name of the universal-bypass role. Holders satisfy every
    /// permission check regardless of the role's stored grants. This is the
    /// only place in the system that names it.
    pub bypass_role: String,
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self {
            bypass_role: "Super Admin".to_string(),
        }
    }
}

/// A principal's resolved permission set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectivePermissions {
    /// Holder of the bypass role: every check passes, the role's own stored
    /// permission set is never consulted.
    Bypass,
    /// Named grants via the principal's role (empty for inactive, deleted,
    /// role-less or dangling-role principals).
    Granted(BTreeSet<String>),
}

impl EffectivePermissions {
    pub fn none() -> Self {
        Self::Granted(BTreeSet::new())
    }

    pub fn contains(&self, permission: &str) -> bool {
        match self {
            Self::Bypass => true,
            Self::Granted(names) => names.contains(permission),
        }
    }

    pub fn is_bypass(&self) -> bool {
        matches!(self, Self::Bypass)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Bypass => false,
            Self::Granted(names) => names.is_empty(),
        }
    }
}

/// Resolves principals to effective permission sets.
///
/// Resolution is deliberately infallible and fail-closed: missing roles,
/// dangling references and storage-read failures all degrade to "no
/// access", never to an error.
#[derive(Debug)]
pub struct PrincipalResolver<S> {
    store: Arc<S>,
    config: RbacConfig,
}

impl<S> Clone for PrincipalResolver<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S: RbacStore> PrincipalResolver<S> {
    pub fn new(store: Arc<S>, config: RbacConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &RbacConfig {
        &self.config
    }

    /// Compute the principal's effective permission set.
    ///
    /// Order matters: the bypass check runs before the role's stored grants
    /// are read, so misconfiguring the bypass role's permission assignments
    /// can never lock its holders out.
    pub fn effective_permissions(&self, user: &User) -> EffectivePermissions {
        if user.is_deleted() || !user.is_active() {
            return EffectivePermissions::none();
        }

        let Some(role_id) = user.role_id else {
            return EffectivePermissions::none();
        };
        let Some(role) = self.store.role(role_id) else {
            // Dangling role reference: the role was deleted out from under
            // the user. Not an error; no access.
            return EffectivePermissions::none();
        };

        if role.name == self.config.bypass_role {
            return EffectivePermissions::Bypass;
        }

        let mut names = BTreeSet::new();
        for permission_id in self.store.role_permissions(role_id) {
            // Ids whose catalog row was deleted resolve to nothing.
            if let Some(permission) = self.store.permission(permission_id) {
                names.insert(permission.name);
            }
        }
        EffectivePermissions::Granted(names)
    }

    /// True iff the principal holds the required permission.
    pub fn authorize(&self, user: &User, permission: &str) -> bool {
        self.effective_permissions(user).contains(permission)
    }

    /// True iff the principal holds at least one of the permissions.
    pub fn authorize_any(&self, user: &User, any_of: &[&str]) -> bool {
        let effective = self.effective_permissions(user);
        any_of.iter().any(|p| effective.contains(p))
    }

    /// One-of-N role gate. Bypass holders satisfy every gate; inactive and
    /// deleted principals satisfy none.
    pub fn authorize_role(&self, user: &User, role_names: &[&str]) -> bool {
        if user.is_deleted() || !user.is_active() {
            return false;
        }
        let Some(role) = user.role_id.and_then(|id| self.store.role(id)) else {
            return false;
        };
        if role.name == self.config.bypass_role {
            return true;
        }
        role_names.iter().any(|name| *name == role.name)
    }

    /// `authorize` as a typed result (`Forbidden` carries the permission).
    pub fn require(&self, user: &User, permission: &str) -> DomainResult<()> {
        if self.authorize(user, permission) {
            Ok(())
        } else {
            Err(warden_core::DomainError::forbidden(permission))
        }
    }

    /// The principal's role row, if it resolves.
    pub fn role_of(&self, user: &User) -> Option<Role> {
        user.role_id.and_then(|id| self.store.role(id))
    }

    /// Materialize the permission rows a principal effectively holds: the
    /// full catalog for bypass holders, the role's resolvable grants
    /// otherwise.
    pub fn materialize(&self, user: &User) -> Vec<Permission> {
        match self.effective_permissions(user) {
            EffectivePermissions::Bypass => self.store.permissions(),
            EffectivePermissions::Granted(names) => self
                .store
                .permissions()
                .into_iter()
                .filter(|p| names.contains(&p.name))
                .collect(),
        }
    }
}
