//! `warden-session`: bearer-token lifecycle and credential handling.
//!
//! Tokens are opaque (`"{token_id}|{secret}"`), stored digest-at-rest, and
//! revocable in bulk; there is no implicit expiry. Email verification is a
//! signed, time-limited, one-time action. Credentials are Argon2id hashes.

pub mod credentials;
pub mod token;
pub mod verification;

pub use credentials::{hash_password, verify_password};
pub use token::{SessionManager, TokenRecord, TokenStore};
pub use verification::{EmailVerifier, VerificationLink};
