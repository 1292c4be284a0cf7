//! Opaque bearer tokens: issue, validate, revoke-all.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use warden_core::{DomainError, DomainResult, TokenId, UserId};
use warden_rbac::{User, UserStore};

/// A stored session token. Plaintext secrets never hit the store; only the
/// SHA-256 digest does. States: issued, then revoked (terminal).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    pub id: TokenId,
    pub user_id: UserId,
    pub secret_digest: String,
    pub issued_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl TokenRecord {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}

/// Token storage port.
pub trait TokenStore {
    fn insert_token(&self, token: TokenRecord) -> DomainResult<()>;

    fn token(&self, id: TokenId) -> Option<TokenRecord>;

    /// Stamp `revoked_at` on every live token of the user, atomically with
    /// respect to concurrent reads: once this returns, no token of the user
    /// validates. Returns the number of tokens revoked.
    fn revoke_all(&self, user_id: UserId, at: DateTime<Utc>) -> DomainResult<usize>;

    /// Live (unrevoked) tokens for a user, for introspection.
    fn live_tokens(&self, user_id: UserId) -> Vec<TokenRecord>;
}

/// Issues and validates bearer tokens tied to a principal.
///
/// Multiple live tokens per user are allowed (multi-device sessions);
/// logout and deactivation revoke them all at once.
#[derive(Debug)]
pub struct SessionManager<T, U> {
    tokens: Arc<T>,
    users: Arc<U>,
}

impl<T, U> Clone for SessionManager<T, U> {
    fn clone(&self) -> Self {
        Self {
            tokens: Arc::clone(&self.tokens),
            users: Arc::clone(&self.users),
        }
    }
}

impl<T: TokenStore, U: UserStore> SessionManager<T, U> {
    pub fn new(tokens: Arc<T>, users: Arc<U>) -> Self {
        Self { tokens, users }
    }

    /// Issue a fresh token for a resolvable, non-deleted principal.
    ///
    /// Email verification is deliberately not checked here: unverified
    /// users authenticate fine, the verified gate lives at the route layer.
    pub fn issue(&self, user: &User) -> DomainResult<String> {
        if user.is_deleted() {
            return Err(DomainError::NotFound);
        }

        let id = TokenId::new();
        let secret = Uuid::new_v4().simple().to_string();
        self.tokens.insert_token(TokenRecord {
            id,
            user_id: user.id,
            secret_digest: digest(&secret),
            issued_at: Utc::now(),
            revoked_at: None,
        })?;

        Ok(format!("{id}|{secret}"))
    }

    /// Resolve a plaintext bearer token to its principal.
    ///
    /// Every failure mode (malformed token, unknown id, digest mismatch,
    /// revoked token, deleted user) is the same `Unauthorized`; callers
    /// get no oracle for which part was wrong.
    pub fn validate(&self, plaintext: &str) -> DomainResult<User> {
        let (id, secret) = parse_plaintext(plaintext).ok_or(DomainError::Unauthorized)?;

        let record = self.tokens.token(id).ok_or(DomainError::Unauthorized)?;
        if record.is_revoked() || digest(secret) != record.secret_digest {
            return Err(DomainError::Unauthorized);
        }

        let user = self
            .users
            .user(record.user_id)
            .ok_or(DomainError::Unauthorized)?;
        if user.is_deleted() {
            return Err(DomainError::Unauthorized);
        }
        Ok(user)
    }

    /// Revoke every live token of the user (logout, deactivation, delete).
    pub fn revoke_all(&self, user_id: UserId) -> DomainResult<usize> {
        let revoked = self.tokens.revoke_all(user_id, Utc::now())?;
        tracing::debug!(%user_id, revoked, "revoked all sessions");
        Ok(revoked)
    }
}

fn digest(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

fn parse_plaintext(plaintext: &str) -> Option<(TokenId, &str)> {
    let (id, secret) = plaintext.split_once('|')?;
    if secret.is_empty() {
        return None;
    }
    TokenId::from_str(id).ok().map(|id| (id, secret))
}
