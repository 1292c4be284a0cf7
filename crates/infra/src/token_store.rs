use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use warden_core::{DomainError, DomainResult, TokenId, UserId};
use warden_session::{TokenRecord, TokenStore};

/// In-memory token store.
///
/// `revoke_all` stamps every live token of the user inside one write-lock
/// section; a concurrent `validate` sees either the state before the
/// revocation or the state after it, never a partially revoked set.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    inner: RwLock<HashMap<TokenId, TokenRecord>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(
        &self,
    ) -> DomainResult<std::sync::RwLockWriteGuard<'_, HashMap<TokenId, TokenRecord>>> {
        self.inner
            .write()
            .map_err(|_| DomainError::storage("token store lock poisoned"))
    }

    fn read(&self) -> Option<std::sync::RwLockReadGuard<'_, HashMap<TokenId, TokenRecord>>> {
        match self.inner.read() {
            Ok(guard) => Some(guard),
            Err(_) => {
                tracing::warn!("token store lock poisoned; reading as empty");
                None
            }
        }
    }
}

impl TokenStore for InMemoryTokenStore {
    fn insert_token(&self, token: TokenRecord) -> DomainResult<()> {
        self.write()?.insert(token.id, token);
        Ok(())
    }

    fn token(&self, id: TokenId) -> Option<TokenRecord> {
        self.read()?.get(&id).cloned()
    }

    fn revoke_all(&self, user_id: UserId, at: DateTime<Utc>) -> DomainResult<usize> {
        let mut tokens = self.write()?;
        let mut revoked = 0;
        for token in tokens.values_mut() {
            if token.user_id == user_id && token.revoked_at.is_none() {
                token.revoked_at = Some(at);
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    fn live_tokens(&self, user_id: UserId) -> Vec<TokenRecord> {
        let Some(tokens) = self.read() else {
            return Vec::new();
        };
        tokens
            .values()
            .filter(|t| t.user_id == user_id && !t.is_revoked())
            .cloned()
            .collect()
    }
}
