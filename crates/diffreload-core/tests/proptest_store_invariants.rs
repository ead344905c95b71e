//! Property-based invariant tests for the fingerprint store, the detector and
//! full reload cycles.
//!
//! These tests verify:
//!
//! 1. Under `EvictOthers`, no identifier is held by more than one live row.
//! 2. After `evict(ids)`, no live record names any of `ids`.
//! 3. The detector only reports candidates that have a live record.
//! 4. A producer that replays the stored fingerprints reports nothing.
//! 5. After every `apply_with_reload`, each visible row stores the current
//!    fingerprint of the record it shows.
//! 6. A second cycle over unchanged data is clean.

use std::cell::RefCell;
use std::rc::Rc;

use ahash::{AHashMap, AHashSet};
use diffreload_core::{
    ApplyOptions, Arrangement, DuplicatePolicy, NoopObserver, ReloadingDataSource, RowInstance,
    RowFingerprintStore, VirtualSurface, identifiers_needing_reload,
};
use proptest::prelude::*;

// ── Strategies ────────────────────────────────────────────────────────────

/// `(row index, identifier, fingerprint)` bind events over a small row pool.
fn binds_strategy() -> impl Strategy<Value = Vec<(usize, u8, Option<u8>)>> {
    prop::collection::vec((0usize..8, 0u8..6, prop::option::of(0u8..4)), 0..40)
}

#[derive(Debug, Clone)]
enum Step {
    Bump(u8),
    Remove(u8),
    Restore(u8),
    Reorder(Vec<u8>),
    Scroll(usize),
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0u8..10).prop_map(Step::Bump),
        (0u8..10).prop_map(Step::Remove),
        (0u8..10).prop_map(Step::Restore),
        Just((0u8..10).collect::<Vec<_>>())
            .prop_shuffle()
            .prop_map(Step::Reorder),
        (1usize..12).prop_map(Step::Scroll),
    ]
}

fn replay(
    store: &mut RowFingerprintStore<u8, u8>,
    rows: &[RowInstance],
    binds: &[(usize, u8, Option<u8>)],
) {
    for &(row, id, fingerprint) in binds {
        store.put(&rows[row], id, fingerprint);
    }
}

// ═══ 1. Duplicate policy ══════════════════════════════════════════════════

proptest! {
    #[test]
    fn evict_others_keeps_identifiers_unique(binds in binds_strategy()) {
        let rows: Vec<RowInstance> = (0..8).map(|_| RowInstance::new()).collect();
        let mut store = RowFingerprintStore::new(DuplicatePolicy::EvictOthers);
        replay(&mut store, &rows, &binds);
        for id in 0u8..6 {
            prop_assert!(store.rows_for(&id).count() <= 1, "identifier {id} held twice");
        }
    }

    #[test]
    fn allow_transient_keeps_one_record_per_row(binds in binds_strategy()) {
        let rows: Vec<RowInstance> = (0..8).map(|_| RowInstance::new()).collect();
        let mut store = RowFingerprintStore::new(DuplicatePolicy::AllowTransient);
        replay(&mut store, &rows, &binds);
        let distinct_rows: AHashSet<usize> = binds.iter().map(|(row, _, _)| *row).collect();
        prop_assert_eq!(store.len(), distinct_rows.len());
    }
}

// ═══ 2. Eviction ══════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn evicted_identifiers_are_gone(
        binds in binds_strategy(),
        evicted in prop::collection::hash_set(0u8..6, 0..6),
    ) {
        let rows: Vec<RowInstance> = (0..8).map(|_| RowInstance::new()).collect();
        let mut store = RowFingerprintStore::new(DuplicatePolicy::AllowTransient);
        replay(&mut store, &rows, &binds);

        let evicted: AHashSet<u8> = evicted.into_iter().collect();
        let before = store.len();
        let removed = store.evict(&evicted);
        prop_assert_eq!(store.len(), before - removed);
        prop_assert_eq!(store.records_where_identifier_in(&evicted).count(), 0);
        prop_assert!(store.identifiers().is_disjoint(&evicted));
    }
}

// ═══ 3–4. Detector ════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn detector_reports_subset_of_stored_candidates(
        binds in binds_strategy(),
        candidates in prop::collection::hash_set(0u8..8, 0..8),
        fresh in prop::collection::vec(prop::option::of(0u8..4), 8),
    ) {
        let rows: Vec<RowInstance> = (0..8).map(|_| RowInstance::new()).collect();
        let mut store = RowFingerprintStore::default();
        replay(&mut store, &rows, &binds);

        let candidates: AHashSet<u8> = candidates.into_iter().collect();
        let changed = identifiers_needing_reload(
            &store,
            &candidates,
            |id: &u8| fresh[usize::from(*id)],
            &NoopObserver,
        );
        let stored = store.identifiers();
        for id in &changed {
            prop_assert!(candidates.contains(id));
            prop_assert!(stored.contains(id));
        }
    }

    #[test]
    fn replaying_stored_fingerprints_is_clean(binds in binds_strategy()) {
        let rows: Vec<RowInstance> = (0..8).map(|_| RowInstance::new()).collect();
        let mut store = RowFingerprintStore::default();
        // Drop binds without a fingerprint: those are always stale.
        let binds: Vec<_> = binds.into_iter().filter(|(_, _, fp)| fp.is_some()).collect();
        replay(&mut store, &rows, &binds);

        let mut current: AHashMap<u8, u8> = AHashMap::new();
        let all: AHashSet<u8> = (0u8..6).collect();
        for record in store.records_where_identifier_in(&all) {
            if let Some(fp) = record.fingerprint() {
                current.insert(*record.identifier(), *fp);
            }
        }
        let changed = identifiers_needing_reload(
            &store,
            &all,
            |id: &u8| current.get(id).copied(),
            &NoopObserver,
        );
        prop_assert!(changed.is_empty());
    }
}

// ═══ 5–6. Reload cycles ═══════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(96))]

    #[test]
    fn visible_rows_stay_fresh(steps in prop::collection::vec(step_strategy(), 1..24)) {
        let prices: Rc<RefCell<AHashMap<u8, u32>>> =
            Rc::new(RefCell::new((0u8..10).map(|id| (id, u32::from(id))).collect()));
        let lookup = Rc::clone(&prices);
        let mut source = ReloadingDataSource::new(
            VirtualSurface::<u8, u8>::new().with_visible_limit(6).with_pool_limit(2),
            |_, _| true,
            move |id: &u8| lookup.borrow().get(id).copied(),
        );
        let mut order: Vec<u8> = (0u8..10).collect();

        for step in steps {
            match step {
                Step::Bump(id) => {
                    if let Some(price) = prices.borrow_mut().get_mut(&id) {
                        *price += 1;
                    }
                }
                Step::Remove(id) => {
                    prices.borrow_mut().remove(&id);
                }
                Step::Restore(id) => {
                    prices.borrow_mut().entry(id).or_insert(0);
                }
                Step::Reorder(next) => order = next,
                Step::Scroll(limit) => source.surface_mut().set_visible_limit(Some(limit)),
            }

            let arrangement = Arrangement::from_sections([(0u8, order.clone())])
                .expect("permutation is valid");
            source
                .apply_with_reload(arrangement.clone(), ApplyOptions::immediate())
                .expect("apply");

            for (id, row) in source.surface().visible_rows() {
                let record = source.store().record_for(row).expect("visible row has a record");
                prop_assert_eq!(record.identifier(), id);
                let expected = prices.borrow().get(id).copied();
                prop_assert_eq!(record.fingerprint().copied(), expected);
            }

            if prices.borrow().len() == 10 {
                let again = source
                    .apply_with_reload(arrangement, ApplyOptions::immediate())
                    .expect("apply");
                prop_assert!(again.is_clean());
            }
        }
    }
}
