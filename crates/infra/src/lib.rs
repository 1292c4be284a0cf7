//! `warden-infra`: storage adapters for the domain ports.
//!
//! In-memory, RwLock-backed implementations of the RBAC, user, audit and
//! token stores. Constraint checks (name uniqueness, atomic permission-set
//! replacement, atomic revoke-all) run entirely inside one write-lock
//! section, which is what makes the store the authority on races.

pub mod audit_store;
pub mod rbac_store;
pub mod seed;
pub mod token_store;
pub mod user_store;

#[cfg(test)]
mod integration_tests;

pub use audit_store::InMemoryAuditStore;
pub use rbac_store::InMemoryRbacStore;
pub use token_store::InMemoryTokenStore;
pub use user_store::InMemoryUserStore;
