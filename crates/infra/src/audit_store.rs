use std::sync::RwLock;

use warden_audit::{ActivityEntry, AuditStore, NewActivityEntry, Pagination};
use warden_core::{ActivityId, DomainError, DomainResult, UserId};

#[derive(Debug, Default)]
struct AuditLog {
    entries: Vec<ActivityEntry>,
    // Survives deletions; sequence numbers are never reused.
    next_sequence: u64,
}

/// In-memory append-only audit store.
///
/// Appends take the write lock only to push; display ordering is computed
/// at read time (`created_at` desc, `sequence` desc), not by arrival.
#[derive(Debug, Default)]
pub struct InMemoryAuditStore {
    inner: RwLock<AuditLog>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> DomainResult<std::sync::RwLockWriteGuard<'_, AuditLog>> {
        self.inner
            .write()
            .map_err(|_| DomainError::storage("audit store lock poisoned"))
    }

    fn read(&self) -> DomainResult<std::sync::RwLockReadGuard<'_, AuditLog>> {
        self.inner
            .read()
            .map_err(|_| DomainError::storage("audit store lock poisoned"))
    }

    fn sorted_newest_first(entries: &[ActivityEntry]) -> Vec<ActivityEntry> {
        let mut all = entries.to_vec();
        all.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.sequence.cmp(&a.sequence))
        });
        all
    }
}

impl AuditStore for InMemoryAuditStore {
    fn append(&self, entry: NewActivityEntry) -> DomainResult<ActivityEntry> {
        let mut log = self.write()?;
        log.next_sequence += 1;
        let stored = ActivityEntry {
            id: entry.id,
            sequence: log.next_sequence,
            causer_id: entry.causer_id,
            subject_type: entry.subject_type,
            subject_id: entry.subject_id,
            event: entry.event,
            description: entry.description,
            properties: entry.properties,
            diff: entry.diff,
            created_at: entry.created_at,
        };
        log.entries.push(stored.clone());
        Ok(stored)
    }

    fn list(&self, page: Pagination) -> DomainResult<Vec<ActivityEntry>> {
        let log = self.read()?;
        Ok(Self::sorted_newest_first(&log.entries)
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect())
    }

    fn list_by_causer(&self, causer: UserId) -> DomainResult<Vec<ActivityEntry>> {
        let log = self.read()?;
        Ok(Self::sorted_newest_first(&log.entries)
            .into_iter()
            .filter(|e| e.causer_id == Some(causer))
            .collect())
    }

    fn get(&self, id: ActivityId) -> DomainResult<Option<ActivityEntry>> {
        let log = self.read()?;
        Ok(log.entries.iter().find(|e| e.id == id).cloned())
    }

    fn delete(&self, id: ActivityId) -> DomainResult<ActivityEntry> {
        let mut log = self.write()?;
        let index = log
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(DomainError::NotFound)?;
        Ok(log.entries.remove(index))
    }

    fn count(&self) -> DomainResult<u64> {
        Ok(self.read()?.entries.len() as u64)
    }
}
