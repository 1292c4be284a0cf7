//! The single write path for the activity trail.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use warden_core::{ActivityId, DomainResult, UserId};

use crate::entry::{
    ActivityEntry, AttributeDiff, EntityRef, NewActivityEntry, Properties, RequestContext,
};
use crate::store::{AuditStore, Pagination};

/// Attribute keys that must never reach a stored diff, regardless of what
/// the caller put in the raw snapshots.
const SENSITIVE_FIELDS: &[&str] = &["password", "credential_hash", "remember_token"];

/// Append-only activity recorder.
///
/// `record` scrubs sensitive fields, reduces a supplied before/after
/// snapshot to its dirty subset, and suppresses entries that would carry
/// neither a change nor any caller-supplied properties. Callers rely on
/// audit-log absence to infer no-op updates, so the suppression rule is a
/// contract, not an optimization.
#[derive(Debug)]
pub struct ActivityRecorder<S> {
    store: Arc<S>,
}

impl<S> Clone for ActivityRecorder<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: AuditStore> ActivityRecorder<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Append one entry describing an action.
    ///
    /// Returns `Ok(None)` when the write was suppressed: a diff was supplied,
    /// nothing in it actually changed, and the caller provided no properties
    /// (the context ip/device count as caller properties here).
    ///
    /// A failed append is fatal to the triggering operation; callers must
    /// propagate the error and not report their own mutation as committed.
    pub fn record(
        &self,
        ctx: &RequestContext,
        subject: Option<EntityRef>,
        event: &str,
        description: &str,
        properties: Properties,
        diff: Option<AttributeDiff>,
    ) -> DomainResult<Option<ActivityEntry>> {
        let had_diff = diff.is_some();
        let dirty = diff.map(|d| dirty_subset(scrub(d)));

        let mut props = properties;
        if let Some(ip) = &ctx.ip {
            props.insert("ip".to_string(), Value::String(ip.clone()));
        }
        if let Some(device) = &ctx.device {
            props.insert("device".to_string(), Value::String(device.clone()));
        }

        let dirty_is_empty = dirty.as_ref().is_none_or(AttributeDiff::is_empty);
        if had_diff && dirty_is_empty && props.is_empty() {
            tracing::debug!(event, "suppressed no-op activity entry");
            return Ok(None);
        }

        let now = Utc::now();
        props.insert("date".to_string(), Value::String(now.to_rfc3339()));

        let entry = NewActivityEntry {
            id: ActivityId::new(),
            causer_id: ctx.causer,
            subject_type: subject.as_ref().map(|s| s.subject_type.clone()),
            subject_id: subject.and_then(|s| s.subject_id),
            event: event.to_string(),
            description: description.to_string(),
            properties: props,
            diff: dirty.filter(|d| !d.is_empty()),
            created_at: now,
        };

        let stored = self.store.append(entry)?;
        tracing::debug!(event, sequence = stored.sequence, "recorded activity entry");
        Ok(Some(stored))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Query surface
    // ─────────────────────────────────────────────────────────────────────

    /// All entries, newest first.
    pub fn list(&self, page: Pagination) -> DomainResult<Vec<ActivityEntry>> {
        self.store.list(page)
    }

    /// Entries caused by one user, newest first.
    pub fn list_by_causer(&self, causer: UserId) -> DomainResult<Vec<ActivityEntry>> {
        self.store.list_by_causer(causer)
    }

    pub fn get(&self, id: ActivityId) -> DomainResult<Option<ActivityEntry>> {
        self.store.get(id)
    }

    /// Administrative purge of a single entry.
    ///
    /// Deliberately not itself audited; see DESIGN.md.
    pub fn delete(&self, id: ActivityId) -> DomainResult<ActivityEntry> {
        self.store.delete(id)
    }

    pub fn count(&self) -> DomainResult<u64> {
        self.store.count()
    }
}

/// Drop sensitive fields from both snapshot sides.
fn scrub(mut diff: AttributeDiff) -> AttributeDiff {
    for field in SENSITIVE_FIELDS {
        diff.old.shift_remove(*field);
        diff.attributes.shift_remove(*field);
    }
    diff
}

/// Reduce a before/after snapshot to the keys whose value actually changed.
///
/// A key missing from `old` counts as changed; `old` in the result only
/// carries previous values that existed.
fn dirty_subset(diff: AttributeDiff) -> AttributeDiff {
    let mut dirty = AttributeDiff::default();
    for (key, new_value) in diff.attributes {
        if diff.old.get(&key) == Some(&new_value) {
            continue;
        }
        if let Some(old_value) = diff.old.get(&key) {
            dirty.old.insert(key.clone(), old_value.clone());
        }
        dirty.attributes.insert(key, new_value);
    }
    dirty
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(pairs: &[(&str, Value)]) -> Properties {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn dirty_subset_keeps_only_changed_keys() {
        let diff = AttributeDiff::new(
            props(&[("name", json!("Alice")), ("email", json!("a@a.com"))]),
            props(&[("name", json!("Alice B")), ("email", json!("a@a.com"))]),
        );

        let dirty = dirty_subset(diff);
        assert_eq!(dirty.attributes.len(), 1);
        assert_eq!(dirty.attributes["name"], json!("Alice B"));
        assert_eq!(dirty.old["name"], json!("Alice"));
        assert!(!dirty.old.contains_key("email"));
    }

    #[test]
    fn dirty_subset_treats_missing_old_key_as_changed() {
        let diff = AttributeDiff::new(
            Properties::new(),
            props(&[("phone", json!("628123"))]),
        );

        let dirty = dirty_subset(diff);
        assert_eq!(dirty.attributes["phone"], json!("628123"));
        assert!(dirty.old.is_empty());
    }

    #[test]
    fn dirty_subset_of_identical_snapshots_is_empty() {
        let snapshot = props(&[("name", json!("Alice")), ("city", json!("Pekanbaru"))]);
        let dirty = dirty_subset(AttributeDiff::new(snapshot.clone(), snapshot));
        assert!(dirty.is_empty());
    }

    #[test]
    fn scrub_strips_sensitive_fields_from_both_sides() {
        let diff = AttributeDiff::new(
            props(&[("password", json!("old-hash")), ("name", json!("A"))]),
            props(&[("password", json!("new-hash")), ("name", json!("B"))]),
        );

        let scrubbed = scrub(diff);
        assert!(!scrubbed.old.contains_key("password"));
        assert!(!scrubbed.attributes.contains_key("password"));
        assert!(scrubbed.attributes.contains_key("name"));
    }
}
