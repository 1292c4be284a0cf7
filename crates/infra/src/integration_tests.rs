//! Cross-crate behavior tests over the in-memory adapters.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;

use warden_audit::{
    ActivityRecorder, AttributeDiff, AuditStore, EntityRef, Pagination, RequestContext,
};
use warden_core::DomainError;
use warden_rbac::{
    AccountStatus, PrincipalResolver, RbacConfig, RbacStore, Registry, User, UserStore,
};
use warden_session::{verify_password, EmailVerifier, SessionManager, TokenStore};

use crate::seed::{seed_demo_data, SeedOutcome, DEMO_PASSWORD};
use crate::{InMemoryAuditStore, InMemoryRbacStore, InMemoryTokenStore, InMemoryUserStore};

struct Harness {
    rbac: Arc<InMemoryRbacStore>,
    users: Arc<InMemoryUserStore>,
    audit: Arc<InMemoryAuditStore>,
    tokens: Arc<InMemoryTokenStore>,
    recorder: ActivityRecorder<InMemoryAuditStore>,
    registry: Registry<InMemoryRbacStore, InMemoryAuditStore>,
    resolver: PrincipalResolver<InMemoryRbacStore>,
    sessions: SessionManager<InMemoryTokenStore, InMemoryUserStore>,
    seeded: SeedOutcome,
}

fn harness() -> Harness {
    let rbac = Arc::new(InMemoryRbacStore::new());
    let users = Arc::new(InMemoryUserStore::new());
    let audit = Arc::new(InMemoryAuditStore::new());
    let tokens = Arc::new(InMemoryTokenStore::new());

    let seeded = seed_demo_data(rbac.as_ref(), users.as_ref()).unwrap();
    let recorder = ActivityRecorder::new(Arc::clone(&audit));
    Harness {
        registry: Registry::new(Arc::clone(&rbac), recorder.clone()),
        resolver: PrincipalResolver::new(Arc::clone(&rbac), RbacConfig::default()),
        sessions: SessionManager::new(Arc::clone(&tokens), Arc::clone(&users)),
        rbac,
        users,
        audit,
        tokens,
        recorder,
        seeded,
    }
}

fn super_admin(h: &Harness) -> User {
    h.users.user(h.seeded.super_admin).unwrap()
}

fn first_admin(h: &Harness) -> User {
    h.users.user(h.seeded.admins[0]).unwrap()
}

// ─────────────────────────────────────────────────────────────────────────
// Resolution
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn bypass_holder_passes_every_gate_with_zero_grants() {
    let h = harness();
    assert!(h.rbac.role_permissions(h.seeded.super_admin_role).is_empty());

    let boss = super_admin(&h);
    let effective = h.resolver.effective_permissions(&boss);
    assert!(effective.is_bypass());
    assert!(h.resolver.authorize(&boss, "delete-user"));
    assert!(h.resolver.authorize(&boss, "permission-that-does-not-exist"));
    assert!(h.resolver.authorize_role(&boss, &["Admin"]));
}

#[test]
fn seeded_roles_grant_the_expected_sets() {
    let h = harness();
    let admin = first_admin(&h);
    let effective = h.resolver.effective_permissions(&admin);
    assert!(!effective.is_bypass());
    for name in ["get-role", "delete-permission", "edit-user"] {
        assert!(effective.contains(name), "admin should hold {name}");
    }

    let mut operator = User::new("Op", "op@op.com", "hash");
    operator.role_id = Some(h.seeded.operator_role);
    assert!(h.resolver.authorize(&operator, "delete-user"));
    assert!(!h.resolver.authorize(&operator, "get-role"));

    let mut member = User::new("M", "m@m.com", "hash");
    member.role_id = Some(h.seeded.user_role);
    assert!(h.resolver.authorize(&member, "edit-user"));
    assert!(!h.resolver.authorize(&member, "delete-user"));
}

#[test]
fn inactive_principal_loses_all_access_even_bypass() {
    let h = harness();
    let mut boss = super_admin(&h);
    boss.status = AccountStatus::Inactive;

    assert!(h.resolver.effective_permissions(&boss).is_empty());
    assert!(!h.resolver.authorize(&boss, "get-user"));
    assert!(!h.resolver.authorize_role(&boss, &["Super Admin"]));
}

#[test]
fn authorize_any_short_circuits_on_bypass() {
    let h = harness();
    let boss = super_admin(&h);
    assert!(h.resolver.authorize_any(&boss, &["no-such-permission"]));

    let mut operator = User::new("Op", "op@op.com", "hash");
    operator.role_id = Some(h.seeded.operator_role);
    assert!(h.resolver.authorize_any(&operator, &["get-role", "delete-user"]));
    assert!(!h.resolver.authorize_any(&operator, &["get-role", "create-role"]));
    assert!(!h.resolver.authorize_any(&operator, &[]));

    operator.status = AccountStatus::Inactive;
    assert!(!h.resolver.authorize_any(&operator, &["delete-user"]));
}

#[test]
fn require_maps_denial_to_forbidden() {
    let h = harness();
    let boss = super_admin(&h);
    assert!(h.resolver.require(&boss, "anything-at-all").is_ok());

    let mut member = User::new("M", "m@m.com", "hash");
    member.role_id = Some(h.seeded.user_role);
    assert!(h.resolver.require(&member, "edit-user").is_ok());
    assert!(matches!(
        h.resolver.require(&member, "delete-user"),
        Err(DomainError::Forbidden(_))
    ));

    // Inactive beats bypass in the derived check too.
    let mut boss = super_admin(&h);
    boss.status = AccountStatus::Inactive;
    assert!(matches!(
        h.resolver.require(&boss, "get-user"),
        Err(DomainError::Forbidden(_))
    ));
}

#[test]
fn deleting_a_role_leaves_members_with_no_access() {
    let h = harness();
    let admin = first_admin(&h);
    assert!(h.resolver.authorize(&admin, "get-user"));

    h.registry
        .delete_role(&RequestContext::system(), h.seeded.admin_role)
        .unwrap();

    // The user row still points at the dead role id.
    let stale = h.users.user(admin.id).unwrap();
    assert_eq!(stale.role_id, Some(h.seeded.admin_role));
    assert!(h.resolver.effective_permissions(&stale).is_empty());
}

#[test]
fn deleting_a_permission_drops_it_from_resolution() {
    let h = harness();
    let admin = first_admin(&h);
    let target = h.rbac.permissions().into_iter().find(|p| p.name == "get-role").unwrap();

    h.registry
        .delete_permission(&RequestContext::system(), target.id)
        .unwrap();

    // The association row dangles; resolution just skips it.
    assert!(h.rbac.role_permissions(h.seeded.admin_role).contains(&target.id));
    let effective = h.resolver.effective_permissions(&admin);
    assert!(!effective.contains("get-role"));
    assert!(effective.contains("create-role"));
}

// ─────────────────────────────────────────────────────────────────────────
// Catalog and registry
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn duplicate_names_are_rejected_case_sensitively() {
    let h = harness();
    let ctx = RequestContext::system();

    let err = h.registry.create_role(&ctx, "Admin", vec![]).unwrap_err();
    assert!(matches!(err, DomainError::DuplicateName(_)));

    // Different case is a different name.
    h.registry.create_role(&ctx, "admin", vec![]).unwrap();
    let err = h.registry.create_permission(&ctx, "get-user").unwrap_err();
    assert!(matches!(err, DomainError::DuplicateName(_)));
}

#[test]
fn create_role_with_unknown_permission_rolls_back() {
    let h = harness();
    let phantom = warden_core::PermissionId::new();

    let err = h
        .registry
        .create_role(&RequestContext::system(), "Auditor", vec![phantom])
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound));
    assert!(h.rbac.role_by_name("Auditor").is_none());
}

#[test]
fn sync_with_unknown_id_rejects_the_whole_set() {
    let h = harness();
    let before = h.rbac.role_permissions(h.seeded.operator_role);
    let mut requested = before.clone();
    requested.push(warden_core::PermissionId::new());

    let err = h
        .registry
        .sync_role_permissions(&RequestContext::system(), h.seeded.operator_role, requested)
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound));

    let mut after = h.rbac.role_permissions(h.seeded.operator_role);
    let mut before = before;
    before.sort();
    after.sort();
    assert_eq!(before, after);
}

#[test]
fn sync_is_idempotent_and_audited_once() {
    let h = harness();
    let ctx = RequestContext::for_user(h.seeded.super_admin);
    let target = h.seeded.user_role;
    let new_set = h.rbac.role_permissions(h.seeded.operator_role);

    h.registry
        .sync_role_permissions(&ctx, target, new_set.clone())
        .unwrap();
    let count_after_first = h.recorder.count().unwrap();

    // Same set again, in a different order with duplicates.
    let mut shuffled = new_set.clone();
    shuffled.reverse();
    shuffled.push(new_set[0]);
    h.registry.sync_role_permissions(&ctx, target, shuffled).unwrap();

    assert_eq!(h.recorder.count().unwrap(), count_after_first);
}

#[test]
fn sync_emits_one_update_role_entry_with_the_membership_diff() {
    let h = harness();
    let ctx = RequestContext::for_user(h.seeded.super_admin).with_ip("10.0.0.1");
    let grants = h.rbac.role_permissions(h.seeded.user_role);

    h.registry
        .sync_role_permissions(&ctx, h.seeded.operator_role, grants)
        .unwrap();

    let entries = h.recorder.list_by_causer(h.seeded.super_admin).unwrap();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.event, "update role");
    assert_eq!(entry.subject_type.as_deref(), Some("role"));
    assert_eq!(entry.subject_id, Some(h.seeded.operator_role.into()));
    assert_eq!(entry.properties["ip"], json!("10.0.0.1"));

    let diff = entry.diff.as_ref().unwrap();
    assert!(diff.old.contains_key("permissions"));
    assert!(diff.attributes.contains_key("permissions"));
}

// ─────────────────────────────────────────────────────────────────────────
// Recorder behavior over real snapshots
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn noop_user_update_is_suppressed() {
    let h = harness();
    let admin = first_admin(&h);
    let snapshot = admin.audit_attributes();

    let recorded = h
        .recorder
        .record(
            &RequestContext::for_user(h.seeded.super_admin),
            Some(EntityRef::user(admin.id)),
            "update user",
            "User updated user.",
            Default::default(),
            Some(AttributeDiff::new(snapshot.clone(), snapshot)),
        )
        .unwrap();

    assert!(recorded.is_none());
    assert_eq!(h.audit.count().unwrap(), 0);
}

#[test]
fn credential_changes_never_reach_the_stored_diff() {
    let h = harness();
    let mut admin = first_admin(&h);
    let before = admin.audit_attributes();
    admin.credential_hash = "rotated".to_string();
    admin.name = "Roby A".to_string();
    let after = admin.audit_attributes();

    let entry = h
        .recorder
        .record(
            &RequestContext::for_user(admin.id),
            Some(EntityRef::user(admin.id)),
            "update user",
            "User updated user.",
            Default::default(),
            Some(AttributeDiff::new(before, after)),
        )
        .unwrap()
        .unwrap();

    let diff = entry.diff.as_ref().unwrap();
    assert!(!diff.old.contains_key("password"));
    assert!(!diff.attributes.contains_key("password"));
    assert_eq!(diff.attributes["name"], json!("Roby A"));
    // Forensic date stamp is always present.
    assert!(entry.properties.contains_key("date"));
}

#[test]
fn activity_listing_is_newest_first_and_paginates() {
    let h = harness();
    let ctx = RequestContext::for_user(h.seeded.super_admin);
    let mut created = Vec::new();
    for i in 0..5 {
        let p = h
            .registry
            .create_permission(&ctx, &format!("probe-{i}"))
            .unwrap();
        created.push(p.id);
    }

    let first_page = h.recorder.list(Pagination { limit: 3, offset: 0 }).unwrap();
    assert_eq!(first_page.len(), 3);
    assert_eq!(first_page[0].subject_id, Some(created[4].into()));
    assert!(first_page.windows(2).all(|w| {
        (w[0].created_at, w[0].sequence) >= (w[1].created_at, w[1].sequence)
    }));

    let second_page = h.recorder.list(Pagination { limit: 3, offset: 3 }).unwrap();
    assert_eq!(second_page.len(), 2);
    assert_eq!(second_page[1].subject_id, Some(created[0].into()));
}

#[test]
fn purging_an_entry_leaves_no_audit_trace() {
    let h = harness();
    let ctx = RequestContext::for_user(h.seeded.super_admin);
    h.registry.create_permission(&ctx, "ephemeral").unwrap();

    let entries = h.recorder.list(Pagination::default()).unwrap();
    let target = entries[0].id;
    h.recorder.delete(target).unwrap();

    assert_eq!(h.recorder.count().unwrap(), 0);
    assert!(h.recorder.get(target).unwrap().is_none());
    assert!(matches!(h.recorder.delete(target), Err(DomainError::NotFound)));
}

// ─────────────────────────────────────────────────────────────────────────
// Sessions
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn seeded_accounts_authenticate_with_the_demo_password() {
    let h = harness();
    let boss = h.users.user_by_email("s@s.com").unwrap();
    assert!(verify_password(DEMO_PASSWORD, &boss.credential_hash));
    assert!(!verify_password("wrong", &boss.credential_hash));
    assert!(boss.is_verified());
}

#[test]
fn token_roundtrip_and_bulk_revocation() {
    let h = harness();
    let boss = super_admin(&h);

    let phone = h.sessions.issue(&boss).unwrap();
    let laptop = h.sessions.issue(&boss).unwrap();
    assert_eq!(h.tokens.live_tokens(boss.id).len(), 2);

    assert_eq!(h.sessions.validate(&phone).unwrap().id, boss.id);
    assert_eq!(h.sessions.validate(&laptop).unwrap().id, boss.id);

    assert_eq!(h.sessions.revoke_all(boss.id).unwrap(), 2);
    assert!(matches!(h.sessions.validate(&phone), Err(DomainError::Unauthorized)));
    assert!(h.tokens.live_tokens(boss.id).is_empty());
}

#[test]
fn tampered_token_secret_fails_validation() {
    let h = harness();
    let boss = super_admin(&h);
    let plaintext = h.sessions.issue(&boss).unwrap();

    let (id, _) = plaintext.split_once('|').unwrap();
    let forged = format!("{id}|{}", "0".repeat(32));
    assert!(matches!(h.sessions.validate(&forged), Err(DomainError::Unauthorized)));
}

#[test]
fn soft_deleted_user_cannot_authenticate() {
    let h = harness();
    let mut admin = first_admin(&h);
    let token = h.sessions.issue(&admin).unwrap();

    admin.deleted_at = Some(Utc::now());
    h.users.update_user(admin.clone()).unwrap();

    assert!(matches!(h.sessions.validate(&token), Err(DomainError::Unauthorized)));
    assert!(matches!(h.sessions.issue(&admin), Err(DomainError::NotFound)));
    assert!(h.users.user_by_email("r@r.com").is_none());
    // Audit integrity: the row is still reachable by id.
    assert!(h.users.user(admin.id).is_some());
}

// ─────────────────────────────────────────────────────────────────────────
// Email verification
// ─────────────────────────────────────────────────────────────────────────

fn verifier(h: &Harness) -> EmailVerifier<InMemoryUserStore> {
    EmailVerifier::new(Arc::clone(&h.users), *b"verification-secret", Duration::minutes(60))
}

fn unverified_user(h: &Harness) -> User {
    let user = User::new("Fresh", "f@f.com", "hash");
    h.users.insert_user(user.clone()).unwrap();
    user
}

#[test]
fn verification_link_roundtrip() {
    let h = harness();
    let verifier = verifier(&h);
    let user = unverified_user(&h);
    let now = Utc::now();

    let link = verifier.mint(&user, now).unwrap();
    let verified = verifier
        .verify(link.user_id, &link.signature, link.expires_at, now)
        .unwrap();

    assert!(verified.is_verified());
    assert!(h.users.user(user.id).unwrap().is_verified());
}

#[test]
fn expired_link_is_unauthorized() {
    let h = harness();
    let verifier = verifier(&h);
    let user = unverified_user(&h);
    let minted_at = Utc::now();

    let link = verifier.mint(&user, minted_at).unwrap();
    let later = minted_at + Duration::minutes(61);
    assert!(matches!(
        verifier.verify(link.user_id, &link.signature, link.expires_at, later),
        Err(DomainError::Unauthorized)
    ));
    assert!(!h.users.user(user.id).unwrap().is_verified());
}

#[test]
fn tampered_link_is_unauthorized() {
    let h = harness();
    let verifier = verifier(&h);
    let user = unverified_user(&h);
    let now = Utc::now();
    let link = verifier.mint(&user, now).unwrap();

    // Stretching the expiry invalidates the signature.
    assert!(matches!(
        verifier.verify(link.user_id, &link.signature, link.expires_at + 3600, now),
        Err(DomainError::Unauthorized)
    ));
    assert!(matches!(
        verifier.verify(link.user_id, "deadbeef", link.expires_at, now),
        Err(DomainError::Unauthorized)
    ));
}

#[test]
fn second_verification_is_already_verified() {
    let h = harness();
    let verifier = verifier(&h);
    let user = unverified_user(&h);
    let now = Utc::now();
    let link = verifier.mint(&user, now).unwrap();

    verifier
        .verify(link.user_id, &link.signature, link.expires_at, now)
        .unwrap();
    assert!(matches!(
        verifier.verify(link.user_id, &link.signature, link.expires_at, now),
        Err(DomainError::AlreadyVerified)
    ));
}
