//! Signed, time-limited, one-time email verification.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use warden_core::{DomainError, DomainResult, UserId};
use warden_rbac::{User, UserStore};

type HmacSha256 = Hmac<Sha256>;

/// A minted verification link: the parameters the route layer puts in the
/// URL (`/email/verify/{user_id}/{signature}?expires={expires_at}`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationLink {
    pub user_id: UserId,
    pub expires_at: i64,
    pub signature: String,
}

/// Mints and verifies email-verification links.
///
/// The signature binds user id, email address and expiry, so a link stops
/// working if the account's email changes. Verification is one-time:
/// re-verifying an already-verified principal fails with `AlreadyVerified`.
#[derive(Debug)]
pub struct EmailVerifier<U> {
    users: Arc<U>,
    secret: Vec<u8>,
    ttl: Duration,
}

impl<U> Clone for EmailVerifier<U> {
    fn clone(&self) -> Self {
        Self {
            users: Arc::clone(&self.users),
            secret: self.secret.clone(),
            ttl: self.ttl,
        }
    }
}

impl<U: UserStore> EmailVerifier<U> {
    pub fn new(users: Arc<U>, secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self {
            users: Arc::clone(&users),
            secret: secret.into(),
            ttl,
        }
    }

    /// Mint a link for the user, valid until `now + ttl`.
    pub fn mint(&self, user: &User, now: DateTime<Utc>) -> DomainResult<VerificationLink> {
        let expires_at = (now + self.ttl).timestamp();
        Ok(VerificationLink {
            user_id: user.id,
            expires_at,
            signature: self.sign(user.id, &user.email, expires_at)?,
        })
    }

    /// Check a presented link and mark the user verified.
    ///
    /// Order: signature, then expiry, then one-time check. Signature and
    /// expiry failures are both `Unauthorized` (the caller cannot tell a
    /// forged link from a stale one).
    pub fn verify(
        &self,
        user_id: UserId,
        signature: &str,
        expires_at: i64,
        now: DateTime<Utc>,
    ) -> DomainResult<User> {
        let user = self
            .users
            .user(user_id)
            .filter(|u| !u.is_deleted())
            .ok_or(DomainError::NotFound)?;

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| DomainError::storage(format!("hmac init failed: {e}")))?;
        mac.update(payload(user.id, &user.email, expires_at).as_bytes());
        let presented = hex::decode(signature).map_err(|_| DomainError::Unauthorized)?;
        mac.verify_slice(&presented)
            .map_err(|_| DomainError::Unauthorized)?;

        if now.timestamp() > expires_at {
            return Err(DomainError::Unauthorized);
        }
        if user.is_verified() {
            return Err(DomainError::AlreadyVerified);
        }

        let mut verified = user;
        verified.email_verified_at = Some(now);
        self.users.update_user(verified.clone())?;
        Ok(verified)
    }

    fn sign(&self, user_id: UserId, email: &str, expires_at: i64) -> DomainResult<String> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| DomainError::storage(format!("hmac init failed: {e}")))?;
        mac.update(payload(user_id, email, expires_at).as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

fn payload(user_id: UserId, email: &str, expires_at: i64) -> String {
    format!("{user_id}.{email}.{expires_at}")
}
