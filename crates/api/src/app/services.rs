use std::sync::Arc;

use chrono::Duration;

use warden_audit::ActivityRecorder;
use warden_core::DomainResult;
use warden_infra::seed::seed_demo_data;
use warden_infra::{InMemoryAuditStore, InMemoryRbacStore, InMemoryTokenStore, InMemoryUserStore};
use warden_rbac::{PrincipalResolver, RbacConfig, Registry};
use warden_session::{EmailVerifier, SessionManager};

/// How long a minted email-verification link stays valid.
const VERIFICATION_TTL_MINUTES: i64 = 60;

/// Wired domain services shared by all handlers.
pub struct AppServices {
    pub users: Arc<InMemoryUserStore>,
    pub rbac: Arc<InMemoryRbacStore>,
    pub recorder: ActivityRecorder<InMemoryAuditStore>,
    pub registry: Registry<InMemoryRbacStore, InMemoryAuditStore>,
    pub resolver: PrincipalResolver<InMemoryRbacStore>,
    pub sessions: SessionManager<InMemoryTokenStore, InMemoryUserStore>,
    pub verifier: EmailVerifier<InMemoryUserStore>,
}

/// Build the in-memory service graph and seed the demo fixture.
pub fn build_services(app_key: &str) -> DomainResult<AppServices> {
    let rbac = Arc::new(InMemoryRbacStore::new());
    let users = Arc::new(InMemoryUserStore::new());
    let audit = Arc::new(InMemoryAuditStore::new());
    let tokens = Arc::new(InMemoryTokenStore::new());

    seed_demo_data(rbac.as_ref(), users.as_ref())?;

    let recorder = ActivityRecorder::new(Arc::clone(&audit));
    Ok(AppServices {
        registry: Registry::new(Arc::clone(&rbac), recorder.clone()),
        resolver: PrincipalResolver::new(Arc::clone(&rbac), RbacConfig::default()),
        sessions: SessionManager::new(Arc::clone(&tokens), Arc::clone(&users)),
        verifier: EmailVerifier::new(
            Arc::clone(&users),
            app_key.as_bytes().to_vec(),
            Duration::minutes(VERIFICATION_TTL_MINUTES),
        ),
        users,
        rbac,
        recorder,
    })
}
