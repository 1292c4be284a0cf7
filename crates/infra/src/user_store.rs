use std::collections::HashMap;
use std::sync::RwLock;

use warden_core::{DomainError, DomainResult, UserId};
use warden_rbac::{User, UserStore};

/// In-memory user store.
///
/// Soft-deleted rows stay in the table for audit referential integrity;
/// email uniqueness counts them (a deleted account does not free its
/// address).
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> DomainResult<std::sync::RwLockWriteGuard<'_, HashMap<UserId, User>>> {
        self.inner
            .write()
            .map_err(|_| DomainError::storage("user store lock poisoned"))
    }

    fn read(&self) -> Option<std::sync::RwLockReadGuard<'_, HashMap<UserId, User>>> {
        match self.inner.read() {
            Ok(guard) => Some(guard),
            Err(_) => {
                tracing::warn!("user store lock poisoned; reading as empty");
                None
            }
        }
    }
}

impl UserStore for InMemoryUserStore {
    fn insert_user(&self, user: User) -> DomainResult<()> {
        let mut users = self.write()?;
        if users.values().any(|u| u.email == user.email) {
            return Err(DomainError::duplicate_name(user.email));
        }
        users.insert(user.id, user);
        Ok(())
    }

    fn update_user(&self, user: User) -> DomainResult<()> {
        let mut users = self.write()?;
        if !users.contains_key(&user.id) {
            return Err(DomainError::NotFound);
        }
        if users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(DomainError::duplicate_name(user.email));
        }
        users.insert(user.id, user);
        Ok(())
    }

    fn user(&self, id: UserId) -> Option<User> {
        self.read()?.get(&id).cloned()
    }

    fn user_by_email(&self, email: &str) -> Option<User> {
        self.read()?
            .values()
            .find(|u| u.email == email && !u.is_deleted())
            .cloned()
    }

    fn users(&self) -> Vec<User> {
        let Some(users) = self.read() else {
            return Vec::new();
        };
        let mut all: Vec<_> = users
            .values()
            .filter(|u| !u.is_deleted())
            .cloned()
            .collect();
        all.sort_by(|a, b| b.id.cmp(&a.id));
        all
    }
}
