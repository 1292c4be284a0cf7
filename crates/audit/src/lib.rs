//! `warden-audit`: append-only activity trail.
//!
//! The recorder is the single write path for audit entries: it scrubs
//! sensitive fields, computes dirty attribute diffs, suppresses no-op
//! writes, and stamps every entry with a wall-clock timestamp. Storage is
//! behind the [`AuditStore`] port; adapters live in `warden-infra`.

pub mod entry;
pub mod recorder;
pub mod store;

pub use entry::{
    ActivityEntry, AttributeDiff, EntityRef, NewActivityEntry, Properties, RequestContext,
};
pub use recorder::ActivityRecorder;
pub use store::{AuditStore, Pagination};
