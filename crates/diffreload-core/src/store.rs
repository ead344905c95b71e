#![forbid(unsafe_code)]

//! Fingerprint store: what each live row instance currently displays.
//!
//! # Design
//!
//! [`RowFingerprintStore`] maps a row instance to a [`FingerprintRecord`]
//! (the identifier it was bound to and the fingerprint captured at bind time).
//! Keys are row identities; the store keeps only a weak reference to each row,
//! so a record whose row has been dropped is dead: lookups skip it, and its
//! memory is reclaimed only by [`purge_retired`](RowFingerprintStore::purge_retired)
//! (run before each apply unless `ReloadConfig::purge_before_apply` is off).
//! Surfaces that retire rows while still holding the handle call
//! [`remove_instance`](RowFingerprintStore::remove_instance).
//!
//! # Invariants
//!
//! 1. At most one record per row instance; `put` replaces wholesale.
//! 2. With [`DuplicatePolicy::EvictOthers`], after `put(row, id, _)` no other
//!    live row holds a record for `id`.
//! 3. After `evict(ids)`, no live record names any identifier in `ids`.
//! 4. Dead records are never returned by lookups.

use std::hash::Hash;

use ahash::{AHashMap, AHashSet};

use crate::row::{RowInstance, RowInstanceId, WeakRow};

/// How `put` treats other rows already bound to the same identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Remove records of other rows bound to the same identifier, so every
    /// identifier has at most one live record.
    #[default]
    EvictOthers,
    /// Keep them; duplicates disappear only when their rows are re-bound,
    /// evicted, or dropped.
    AllowTransient,
}

/// Identifier and fingerprint captured when a row was bound.
///
/// A `None` fingerprint marks the row as always stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintRecord<I, F> {
    identifier: I,
    fingerprint: Option<F>,
}

impl<I, F> FingerprintRecord<I, F> {
    #[must_use]
    pub fn new(identifier: I, fingerprint: Option<F>) -> Self {
        Self {
            identifier,
            fingerprint,
        }
    }

    #[must_use]
    pub fn identifier(&self) -> &I {
        &self.identifier
    }

    #[must_use]
    pub fn fingerprint(&self) -> Option<&F> {
        self.fingerprint.as_ref()
    }
}

#[derive(Debug)]
struct Entry<I, F> {
    row: WeakRow,
    record: FingerprintRecord<I, F>,
}

/// Registry of live row instances and the content they display.
#[derive(Debug)]
pub struct RowFingerprintStore<I, F> {
    entries: AHashMap<RowInstanceId, Entry<I, F>>,
    policy: DuplicatePolicy,
}

impl<I, F> Default for RowFingerprintStore<I, F> {
    fn default() -> Self {
        Self {
            entries: AHashMap::new(),
            policy: DuplicatePolicy::default(),
        }
    }
}

impl<I: Eq + Hash + Clone, F> RowFingerprintStore<I, F> {
    /// Create an empty store using `policy` for duplicate identifiers.
    #[must_use]
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            entries: AHashMap::new(),
            policy,
        }
    }

    #[must_use]
    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: DuplicatePolicy) {
        self.policy = policy;
    }

    /// Record that `row` now displays `identifier` with `fingerprint`.
    ///
    /// Returns the record the row held before, if any.
    pub fn put(
        &mut self,
        row: &RowInstance,
        identifier: I,
        fingerprint: Option<F>,
    ) -> Option<FingerprintRecord<I, F>> {
        let row_id = row.id();
        if self.policy == DuplicatePolicy::EvictOthers {
            self.entries
                .retain(|id, entry| *id == row_id || entry.record.identifier != identifier);
        }
        self.entries
            .insert(
                row_id,
                Entry {
                    row: row.downgrade(),
                    record: FingerprintRecord::new(identifier, fingerprint),
                },
            )
            .map(|previous| previous.record)
    }

    /// Live records whose identifier is in `identifiers`.
    pub fn records_where_identifier_in<'a>(
        &'a self,
        identifiers: &'a AHashSet<I>,
    ) -> impl Iterator<Item = &'a FingerprintRecord<I, F>> + 'a {
        self.entries
            .values()
            .filter(|entry| entry.row.is_alive() && identifiers.contains(&entry.record.identifier))
            .map(|entry| &entry.record)
    }

    /// Remove every record naming one of `identifiers`, whichever row holds it.
    ///
    /// Returns the number of live records removed. Dead records naming one of
    /// `identifiers` go too, uncounted.
    pub fn evict(&mut self, identifiers: &AHashSet<I>) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let keep = !identifiers.contains(&entry.record.identifier);
            if !keep && entry.row.is_alive() {
                removed += 1;
            }
            keep
        });
        removed
    }

    /// Explicit lifecycle hook: forget `row` because it was retired.
    pub fn remove_instance(&mut self, row: RowInstanceId) -> Option<FingerprintRecord<I, F>> {
        self.entries.remove(&row).map(|entry| entry.record)
    }

    /// Record currently held by `row`.
    #[must_use]
    pub fn record_for(&self, row: &RowInstance) -> Option<&FingerprintRecord<I, F>> {
        self.entries
            .get(&row.id())
            .filter(|entry| entry.row.is_alive())
            .map(|entry| &entry.record)
    }

    /// Live rows holding a record for `identifier`.
    pub fn rows_for<'a>(&'a self, identifier: &'a I) -> impl Iterator<Item = RowInstanceId> + 'a {
        self.entries
            .iter()
            .filter(move |(_, entry)| entry.row.is_alive() && entry.record.identifier == *identifier)
            .map(|(id, _)| *id)
    }

    /// Distinct identifiers with at least one live record.
    #[must_use]
    pub fn identifiers(&self) -> AHashSet<I> {
        self.entries
            .values()
            .filter(|entry| entry.row.is_alive())
            .map(|entry| entry.record.identifier.clone())
            .collect()
    }

    /// Drop records whose rows no longer exist. Returns how many were dropped.
    pub fn purge_retired(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.row.is_alive());
        before - self.entries.len()
    }

    /// Number of live records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.row.is_alive())
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records held, counting dead ones not yet purged.
    #[must_use]
    pub fn retained(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[&'static str]) -> AHashSet<&'static str> {
        ids.iter().copied().collect()
    }

    #[test]
    fn put_replaces_record_of_same_row() {
        let mut store = RowFingerprintStore::new(DuplicatePolicy::EvictOthers);
        let row = RowInstance::new();
        assert!(store.put(&row, "A", Some(1)).is_none());
        let previous = store.put(&row, "B", Some(2)).expect("row had a record");
        assert_eq!(previous.identifier(), &"A");
        assert_eq!(store.len(), 1);
        let record = store.record_for(&row).expect("row has a record");
        assert_eq!(record.identifier(), &"B");
        assert_eq!(record.fingerprint(), Some(&2));
    }

    #[test]
    fn evict_others_keeps_one_row_per_identifier() {
        let mut store = RowFingerprintStore::new(DuplicatePolicy::EvictOthers);
        let r1 = RowInstance::new();
        let r2 = RowInstance::new();
        store.put(&r1, "A", Some(1));
        store.put(&r2, "A", Some(2));
        assert_eq!(store.rows_for(&"A").collect::<Vec<_>>(), vec![r2.id()]);
        assert!(store.record_for(&r1).is_none());
    }

    #[test]
    fn allow_transient_keeps_duplicates() {
        let mut store = RowFingerprintStore::new(DuplicatePolicy::AllowTransient);
        let r1 = RowInstance::new();
        let r2 = RowInstance::new();
        store.put(&r1, "A", Some(1));
        store.put(&r2, "A", Some(2));
        assert_eq!(store.rows_for(&"A").count(), 2);
        assert_eq!(store.evict(&set(&["A"])), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn eviction_removes_all_matching_records() {
        let mut store = RowFingerprintStore::default();
        let r1 = RowInstance::new();
        let r2 = RowInstance::new();
        store.put(&r1, "A", Some(1));
        store.put(&r2, "B", Some(2));
        assert_eq!(store.evict(&set(&["A", "Z"])), 1);
        let wanted = set(&["A"]);
        assert_eq!(store.records_where_identifier_in(&wanted).count(), 0);
        let wanted = set(&["B"]);
        assert_eq!(store.records_where_identifier_in(&wanted).count(), 1);
    }

    #[test]
    fn dropped_row_is_invisible_then_purged() {
        let mut store = RowFingerprintStore::default();
        let kept = RowInstance::new();
        let dropped = RowInstance::new();
        store.put(&kept, "A", Some(1));
        store.put(&dropped, "B", Some(2));
        drop(dropped);

        assert_eq!(store.len(), 1);
        let wanted = set(&["A", "B"]);
        let ids: Vec<_> = store
            .records_where_identifier_in(&wanted)
            .map(|r| *r.identifier())
            .collect();
        assert_eq!(ids, vec!["A"]);
        assert_eq!(store.identifiers(), set(&["A"]));
        assert_eq!(store.purge_retired(), 1);
        assert_eq!(store.purge_retired(), 0);
    }

    #[test]
    fn dead_records_stay_until_purged() {
        let mut store = RowFingerprintStore::default();
        let dropped = RowInstance::new();
        store.put(&dropped, "A", Some(1));
        drop(dropped);

        let fresh = RowInstance::new();
        store.put(&fresh, "B", Some(2));
        assert_eq!(store.evict(&set(&["Z"])), 0);
        assert_eq!(store.len(), 1);
        assert_eq!(store.retained(), 2);

        assert_eq!(store.purge_retired(), 1);
        assert_eq!(store.retained(), 1);
    }

    #[test]
    fn evict_counts_only_live_records() {
        let mut store = RowFingerprintStore::new(DuplicatePolicy::AllowTransient);
        let dropped = RowInstance::new();
        let live = RowInstance::new();
        store.put(&dropped, "A", Some(1));
        store.put(&live, "A", Some(2));
        drop(dropped);
        assert_eq!(store.evict(&set(&["A"])), 1);
        assert_eq!(store.retained(), 0);
    }

    #[test]
    fn remove_instance_is_explicit_retirement() {
        let mut store = RowFingerprintStore::default();
        let row = RowInstance::new();
        store.put(&row, "A", None::<u8>);
        let record = store.remove_instance(row.id()).expect("record existed");
        assert_eq!(record.fingerprint(), None);
        assert!(store.record_for(&row).is_none());
        assert!(store.remove_instance(row.id()).is_none());
    }

    #[test]
    fn records_are_filtered_by_identifier() {
        let mut store = RowFingerprintStore::default();
        let rows: Vec<RowInstance> = (0..4).map(|_| RowInstance::new()).collect();
        for (row, id) in rows.iter().zip(["A", "B", "C", "D"]) {
            store.put(row, id, Some(id.len()));
        }
        let wanted = set(&["B", "D", "X"]);
        let mut ids: Vec<_> = store
            .records_where_identifier_in(&wanted)
            .map(|r| *r.identifier())
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["B", "D"]);
    }
}
