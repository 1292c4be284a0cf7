use warden_core::{ActivityId, DomainResult, UserId};

use crate::entry::{ActivityEntry, NewActivityEntry};

/// Page window for activity listings.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub limit: u32,
    pub offset: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: 10,
            offset: 0,
        }
    }
}

/// Append-only storage port for activity entries.
///
/// Implementations must never overwrite an appended entry; the only
/// mutation allowed is `delete` (administrative purge).
pub trait AuditStore {
    /// Durably append one entry, assigning its monotonic sequence number.
    fn append(&self, entry: NewActivityEntry) -> DomainResult<ActivityEntry>;

    /// List entries newest first (`created_at` desc, `sequence` desc).
    fn list(&self, page: Pagination) -> DomainResult<Vec<ActivityEntry>>;

    /// All entries caused by the given user, newest first.
    fn list_by_causer(&self, causer: UserId) -> DomainResult<Vec<ActivityEntry>>;

    fn get(&self, id: ActivityId) -> DomainResult<Option<ActivityEntry>>;

    /// Remove one entry. Returns `NotFound` if it does not exist.
    fn delete(&self, id: ActivityId) -> DomainResult<ActivityEntry>;

    fn count(&self) -> DomainResult<u64>;
}
