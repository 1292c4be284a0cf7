//! `warden-rbac`: role-based access control core.
//!
//! Three pieces:
//! - the permission catalog and role registry (validated, audit-emitting
//!   mutations over the [`RbacStore`] port),
//! - the principal (user) model with its single optional role,
//! - the [`PrincipalResolver`], which turns a principal into an effective
//!   permission set with a universal-bypass short-circuit and fail-closed
//!   handling of dangling references.

pub mod permission;
pub mod principal;
pub mod registry;
pub mod resolver;
pub mod role;
pub mod store;

pub use permission::Permission;
pub use principal::{AccountStatus, User};
pub use registry::Registry;
pub use resolver::{EffectivePermissions, PrincipalResolver, RbacConfig};
pub use role::Role;
pub use store::{RbacStore, UserStore};
