//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// uniqueness, access control). Every component returns these as typed
/// results; nothing is thrown past a component boundary as an opaque failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed or over-long name).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A uniqueness constraint was violated (exact, case-sensitive match).
    #[error("duplicate name: {0}")]
    DuplicateName(String),

    /// A requested entity was not found.
    #[error("not found")]
    NotFound,

    /// The operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// No valid credentials / token for this request.
    #[error("unauthorized")]
    Unauthorized,

    /// A valid principal lacking the required permission.
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),

    /// The principal's email address has not been verified yet.
    #[error("email verification required")]
    VerificationRequired,

    /// The principal's email address is already verified.
    #[error("email already verified")]
    AlreadyVerified,

    /// The backing store failed (lock poisoned, append failed, ...).
    #[error("storage failure: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn duplicate_name(name: impl Into<String>) -> Self {
        Self::DuplicateName(name.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn forbidden(permission: impl Into<String>) -> Self {
        Self::Forbidden(permission.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
