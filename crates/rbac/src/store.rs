//! Storage ports for the RBAC core.
//!
//! Read methods are infallible over data: absence is `None`/empty, never an
//! error, so the resolver can stay fail-closed. Write methods surface the
//! store's own constraint checks (`DuplicateName`, `NotFound`) as typed
//! results; the store is the authority on uniqueness races.

use warden_core::{DomainResult, PermissionId, RoleId, UserId};

use crate::permission::Permission;
use crate::principal::User;
use crate::role::Role;

pub trait RbacStore {
    /// Insert a new permission; `DuplicateName` if the name is taken
    /// (exact, case-sensitive match).
    fn insert_permission(&self, permission: Permission) -> DomainResult<()>;

    /// Rename a permission; `NotFound` / `DuplicateName`. Returns the
    /// updated row.
    fn rename_permission(&self, id: PermissionId, name: String) -> DomainResult<Permission>;

    /// Remove a permission. Association rows referencing it are left in
    /// place (dangling-reference policy, see DESIGN.md).
    fn remove_permission(&self, id: PermissionId) -> DomainResult<Permission>;

    fn permission(&self, id: PermissionId) -> Option<Permission>;

    /// Full catalog, newest first.
    fn permissions(&self) -> Vec<Permission>;

    fn insert_role(&self, role: Role) -> DomainResult<()>;

    fn rename_role(&self, id: RoleId, name: String) -> DomainResult<Role>;

    /// Remove a role. Users still pointing at it keep a dangling reference
    /// that resolves to the empty permission set.
    fn remove_role(&self, id: RoleId) -> DomainResult<Role>;

    fn role(&self, id: RoleId) -> Option<Role>;

    fn role_by_name(&self, name: &str) -> Option<Role>;

    /// All roles, newest first.
    fn roles(&self) -> Vec<Role>;

    /// The permission ids attached to a role (unordered; may contain ids
    /// whose catalog row has since been deleted).
    fn role_permissions(&self, id: RoleId) -> Vec<PermissionId>;

    /// Atomically replace a role's permission set with exactly the given
    /// ids, returning the previous set. Any unknown permission id rejects
    /// the whole call with `NotFound`; a concurrent reader never observes a
    /// partially-replaced set.
    fn replace_role_permissions(
        &self,
        id: RoleId,
        permission_ids: Vec<PermissionId>,
    ) -> DomainResult<Vec<PermissionId>>;
}

pub trait UserStore {
    /// Insert a new user; `DuplicateName` if the email is taken.
    fn insert_user(&self, user: User) -> DomainResult<()>;

    /// Replace the stored row for `user.id`; `NotFound` if absent.
    /// Soft deletion is an update with `deleted_at` set.
    fn update_user(&self, user: User) -> DomainResult<()>;

    /// Fetch by id, soft-deleted rows included (audit integrity).
    fn user(&self, id: UserId) -> Option<User>;

    /// Fetch by email, excluding soft-deleted rows (authentication path).
    fn user_by_email(&self, email: &str) -> Option<User>;

    /// All non-deleted users, newest first.
    fn users(&self) -> Vec<User>;
}
