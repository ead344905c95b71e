#![forbid(unsafe_code)]

//! Change detection: which displayed rows are stale.
//!
//! # Algorithm
//!
//! For every live record in the store whose identifier is a candidate:
//!
//! 1. Read the current fingerprint through the producer, bracketed by the
//!    observer's `will_read` / `did_read`.
//! 2. `None` from the producer → stale (the backing record vanished or opted
//!    out).
//! 3. `None` stored at bind time → stale.
//! 4. Otherwise stale iff the fingerprints differ.
//!
//! Candidates without a record are never reported: nothing was rendered for
//! them, so there is nothing to compare. The producer runs at most once per
//! distinct identifier per call, even when several rows hold a record for the
//! same identifier; each such record is compared against that single reading.

use std::hash::Hash;

use ahash::{AHashMap, AHashSet};

use crate::logging::trace;
use crate::observer::{ReadObserver, observed_read};
use crate::store::RowFingerprintStore;

/// Identifiers among `candidates` whose displayed content is out of date.
pub fn identifiers_needing_reload<I, F, P>(
    store: &RowFingerprintStore<I, F>,
    candidates: &AHashSet<I>,
    mut current_fingerprint_of: P,
    observer: &dyn ReadObserver<I>,
) -> AHashSet<I>
where
    I: Eq + Hash + Clone,
    F: PartialEq,
    P: FnMut(&I) -> Option<F>,
{
    let mut readings: AHashMap<&I, Option<F>> = AHashMap::new();
    let mut stale = AHashSet::new();

    for record in store.records_where_identifier_in(candidates) {
        let identifier = record.identifier();
        if stale.contains(identifier) {
            continue;
        }
        let current = readings.entry(identifier).or_insert_with(|| {
            observed_read(observer, identifier, &mut current_fingerprint_of)
        });
        let changed = match (current.as_ref(), record.fingerprint()) {
            (Some(now), Some(then)) => now != then,
            _ => true,
        };
        if changed {
            trace!(message = "reload.stale", fresh = current.is_some());
            stale.insert(identifier.clone());
        }
    }

    stale
}
