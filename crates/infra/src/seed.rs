//! Demo catalog and accounts for development and tests.
//!
//! Writes directly to the stores, bypassing the registry, so seeding leaves
//! no audit entries.

use chrono::Utc;

use warden_core::{DomainResult, PermissionId, RoleId, UserId};
use warden_rbac::{Permission, RbacStore, Role, User, UserStore};
use warden_session::hash_password;

/// Role name whose members bypass permission checks entirely.
pub const BYPASS_ROLE: &str = "Super Admin";

/// Shared password of the demo accounts.
pub const DEMO_PASSWORD: &str = "string";

const ACTIONS: [&str; 5] = ["get", "create", "show", "edit", "delete"];
const SUBJECTS: [&str; 3] = ["role", "permission", "user"];

const USER_MANAGEMENT: [&str; 5] =
    ["get-user", "create-user", "show-user", "edit-user", "delete-user"];
const SELF_SERVICE: [&str; 3] = ["get-user", "show-user", "edit-user"];

/// Ids of the seeded rows, for wiring and assertions.
#[derive(Debug, Clone)]
pub struct SeedOutcome {
    pub permission_ids: Vec<PermissionId>,
    pub super_admin_role: RoleId,
    pub admin_role: RoleId,
    pub operator_role: RoleId,
    pub user_role: RoleId,
    pub super_admin: UserId,
    pub admins: Vec<UserId>,
}

/// Seed the full demo fixture: fifteen `action-subject` permissions, the
/// four stock roles and three verified accounts.
///
/// The bypass role gets no explicit grants; its members are expected to
/// pass every gate through the resolver's name check alone.
pub fn seed_demo_data<R, U>(rbac: &R, users: &U) -> DomainResult<SeedOutcome>
where
    R: RbacStore,
    U: UserStore,
{
    let mut permission_ids = Vec::new();
    for subject in SUBJECTS {
        for action in ACTIONS {
            let permission = Permission::new(format!("{action}-{subject}"));
            permission_ids.push(permission.id);
            rbac.insert_permission(permission)?;
        }
    }

    let every_permission: Vec<String> = SUBJECTS
        .iter()
        .flat_map(|subject| ACTIONS.iter().map(move |action| format!("{action}-{subject}")))
        .collect();
    let every_permission: Vec<&str> = every_permission.iter().map(String::as_str).collect();

    let super_admin_role = seed_role(rbac, BYPASS_ROLE, &[])?;
    let admin_role = seed_role(rbac, "Admin", &every_permission)?;
    let operator_role = seed_role(rbac, "Operator", &USER_MANAGEMENT)?;
    let user_role = seed_role(rbac, "User", &SELF_SERVICE)?;

    let hash = hash_password(DEMO_PASSWORD)?;
    let super_admin = seed_user(
        users,
        "Super Admin",
        "s@s.com",
        &hash,
        "6282386825834",
        super_admin_role,
    )?;
    let roby = seed_user(users, "Roby", "r@r.com", &hash, "6282386825834", admin_role)?;
    let putri = seed_user(users, "Putri", "p@p.com", &hash, "6282172766306", admin_role)?;

    Ok(SeedOutcome {
        permission_ids,
        super_admin_role,
        admin_role,
        operator_role,
        user_role,
        super_admin,
        admins: vec![roby, putri],
    })
}

fn seed_role<R: RbacStore>(rbac: &R, name: &str, grants: &[&str]) -> DomainResult<RoleId> {
    let role = Role::new(name);
    let role_id = role.id;
    rbac.insert_role(role)?;

    let grant_ids: Vec<PermissionId> = rbac
        .permissions()
        .into_iter()
        .filter(|p| grants.contains(&p.name.as_str()))
        .map(|p| p.id)
        .collect();
    rbac.replace_role_permissions(role_id, grant_ids)?;
    Ok(role_id)
}

fn seed_user<U: UserStore>(
    users: &U,
    name: &str,
    email: &str,
    hash: &str,
    phone: &str,
    role_id: RoleId,
) -> DomainResult<UserId> {
    let mut user = User::new(name, email, hash);
    user.phone = Some(phone.to_string());
    user.city = Some("Pekanbaru".to_string());
    user.address = Some("Jl. Hangtuah Ujung".to_string());
    user.role_id = Some(role_id);
    user.email_verified_at = Some(Utc::now());
    let user_id = user.id;
    users.insert_user(user)?;
    Ok(user_id)
}
