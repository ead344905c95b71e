#![forbid(unsafe_code)]

//! Headless list surface with row reuse.
//!
//! [`VirtualSurface`] behaves like a recycling list view without drawing
//! anything: it keeps a window of visible items, binds one row per visible
//! item, parks rows that scroll out or get reloaded in a reuse pool, and
//! drops rows once the pool is full. Every apply is recorded as a
//! [`TransitionRecord`] so tests and the demo can inspect exactly which rows
//! were configured.
//!
//! # Row lifecycle
//!
//! - Newly visible item: dequeue a pooled row (or create one) and bind it.
//! - Visible item carrying a reload mark: its row returns to the pool and a
//!   row is dequeued and bound again. The pool is LIFO, so this is usually
//!   the same row.
//! - Item leaving the window: its row returns to the pool.
//! - Refused bind: the row returns to the pool and the item stays blank.
//! - Pool over `pool_limit`: the oldest pooled rows are dropped.

use std::hash::Hash;

use ahash::{AHashMap, AHashSet};

use crate::arrangement::Arrangement;
use crate::row::RowInstance;
use crate::surface::{ListSurface, RowBinder, Transition};

/// Default number of rows kept for reuse.
pub const DEFAULT_POOL_LIMIT: usize = 16;

/// What one `apply` did.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionRecord<S, I> {
    /// Arrangement as passed in, reload marks included.
    pub arrangement: Arrangement<S, I>,
    pub transition: Transition,
    /// Items passed to the binder, in display order.
    pub configured: Vec<I>,
    /// Items whose bind was refused.
    pub refused: Vec<I>,
    /// Visible items re-bound because of a reload mark.
    pub reloaded: Vec<I>,
}

/// In-memory [`ListSurface`].
#[derive(Debug)]
pub struct VirtualSurface<S, I> {
    arrangement: Arrangement<S, I>,
    visible_limit: Option<usize>,
    pool_limit: usize,
    bound: AHashMap<I, RowInstance>,
    pool: Vec<RowInstance>,
    created: usize,
    history: Vec<TransitionRecord<S, I>>,
}

impl<S, I> Default for VirtualSurface<S, I> {
    fn default() -> Self {
        Self {
            arrangement: Arrangement::default(),
            visible_limit: None,
            pool_limit: DEFAULT_POOL_LIMIT,
            bound: AHashMap::new(),
            pool: Vec::new(),
            created: 0,
            history: Vec::new(),
        }
    }
}

impl<S, I> VirtualSurface<S, I>
where
    S: PartialEq + Clone,
    I: Eq + Hash + Clone,
{
    /// Surface showing every item.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only the first `limit` items (in flattened order) are visible.
    #[must_use]
    pub fn with_visible_limit(mut self, limit: usize) -> Self {
        self.visible_limit = Some(limit);
        self
    }

    /// Keep at most `limit` rows in the reuse pool.
    #[must_use]
    pub fn with_pool_limit(mut self, limit: usize) -> Self {
        self.pool_limit = limit;
        self
    }

    /// Change the visible window. Takes effect on the next apply.
    pub fn set_visible_limit(&mut self, limit: Option<usize>) {
        self.visible_limit = limit;
    }

    #[must_use]
    pub fn visible_limit(&self) -> Option<usize> {
        self.visible_limit
    }

    /// Currently displayed arrangement.
    #[must_use]
    pub fn arrangement(&self) -> &Arrangement<S, I> {
        &self.arrangement
    }

    /// Row displaying `identifier`, if it is visible and bound.
    #[must_use]
    pub fn row_for(&self, identifier: &I) -> Option<&RowInstance> {
        self.bound.get(identifier)
    }

    /// Visible, bound items with their rows, in display order.
    pub fn visible_rows(&self) -> impl Iterator<Item = (&I, &RowInstance)> {
        self.arrangement
            .item_identifiers()
            .filter_map(|id| self.bound.get_key_value(id))
    }

    /// Rows waiting for reuse.
    #[must_use]
    pub fn pooled(&self) -> usize {
        self.pool.len()
    }

    /// Rows ever created by this surface.
    #[must_use]
    pub fn created_rows(&self) -> usize {
        self.created
    }

    #[must_use]
    pub fn history(&self) -> &[TransitionRecord<S, I>] {
        &self.history
    }

    /// Drain the recorded transitions.
    pub fn take_history(&mut self) -> Vec<TransitionRecord<S, I>> {
        std::mem::take(&mut self.history)
    }

    fn dequeue(&mut self) -> RowInstance {
        self.pool.pop().unwrap_or_else(|| {
            self.created += 1;
            RowInstance::new()
        })
    }

    fn enqueue(&mut self, row: RowInstance) {
        self.pool.push(row);
    }

    fn trim_pool(&mut self) {
        let excess = self.pool.len().saturating_sub(self.pool_limit);
        self.pool.drain(..excess);
    }
}

impl<S, I> ListSurface<S, I> for VirtualSurface<S, I>
where
    S: PartialEq + Clone,
    I: Eq + Hash + Clone,
{
    fn snapshot(&self) -> Arrangement<S, I> {
        self.arrangement.clone().without_reload_marks()
    }

    fn apply(
        &mut self,
        arrangement: Arrangement<S, I>,
        transition: Transition,
        binder: &mut dyn RowBinder<I>,
    ) {
        let limit = self.visible_limit.unwrap_or(usize::MAX);
        let visible: Vec<I> = arrangement.item_identifiers().take(limit).cloned().collect();
        let marked: AHashSet<&I> = arrangement.reloaded_items().iter().collect();

        let leaving: Vec<I> = {
            let still_visible: AHashSet<&I> = visible.iter().collect();
            self.bound
                .keys()
                .filter(|id| !still_visible.contains(id))
                .cloned()
                .collect()
        };
        for id in &leaving {
            if let Some(row) = self.bound.remove(id) {
                self.enqueue(row);
            }
        }

        let mut configured = Vec::new();
        let mut refused = Vec::new();
        let mut reloaded = Vec::new();
        for id in &visible {
            match self.bound.remove(id) {
                Some(row) if !marked.contains(id) => {
                    self.bound.insert(id.clone(), row);
                    continue;
                }
                Some(row) => {
                    self.enqueue(row);
                    reloaded.push(id.clone());
                }
                None => {}
            }
            let row = self.dequeue();
            configured.push(id.clone());
            if binder.bind(&row, id) {
                self.bound.insert(id.clone(), row);
            } else {
                refused.push(id.clone());
                self.enqueue(row);
            }
        }
        self.trim_pool();

        self.history.push(TransitionRecord {
            arrangement: arrangement.clone(),
            transition,
            configured,
            refused,
            reloaded,
        });
        self.arrangement = arrangement.without_reload_marks();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arrangement(items: &[&'static str]) -> Arrangement<u8, &'static str> {
        Arrangement::from_sections([(0u8, items.to_vec())]).expect("valid arrangement")
    }

    fn accept_all(_: &RowInstance, _: &&'static str) -> bool {
        true
    }

    #[test]
    fn binds_new_items_once() {
        let mut surface = VirtualSurface::new();
        surface.apply(arrangement(&["a", "b"]), Transition::immediate(), &mut accept_all);
        surface.apply(arrangement(&["b", "a"]), Transition::immediate(), &mut accept_all);
        let history = surface.history();
        assert_eq!(history[0].configured, vec!["a", "b"]);
        assert!(history[1].configured.is_empty());
        assert_eq!(surface.created_rows(), 2);
        let order: Vec<_> = surface.visible_rows().map(|(id, _)| *id).collect();
        assert_eq!(order, vec!["b", "a"]);
    }

    #[test]
    fn reload_mark_rebinds_visible_row() {
        let mut surface = VirtualSurface::new();
        surface.apply(arrangement(&["a", "b"]), Transition::immediate(), &mut accept_all);
        let before = surface.row_for(&"a").expect("a bound").id();

        let mut marked = arrangement(&["a", "b"]);
        marked.reload_items(["a"]).expect("a present");
        surface.apply(marked, Transition::immediate(), &mut accept_all);

        let last = surface.history().last().expect("recorded");
        assert_eq!(last.configured, vec!["a"]);
        assert_eq!(last.reloaded, vec!["a"]);
        assert_eq!(surface.row_for(&"a").expect("a bound").id(), before);
        assert!(!surface.snapshot().has_reload_marks());
    }

    #[test]
    fn window_limits_binding_and_recycles() {
        let mut surface = VirtualSurface::new().with_visible_limit(2);
        surface.apply(arrangement(&["a", "b", "c"]), Transition::immediate(), &mut accept_all);
        assert!(surface.row_for(&"c").is_none());
        let a_row = surface.row_for(&"a").expect("a bound").id();

        surface.apply(arrangement(&["c", "b", "a"]), Transition::immediate(), &mut accept_all);
        let c_row = surface.row_for(&"c").expect("c bound").id();
        assert_eq!(c_row, a_row, "row of a is reused for c");
        assert!(surface.row_for(&"a").is_none());
        assert_eq!(surface.created_rows(), 2);
    }

    #[test]
    fn refused_rows_are_not_displayed() {
        let mut surface = VirtualSurface::new();
        let mut refuse_b = |_: &RowInstance, id: &&'static str| *id != "b";
        surface.apply(arrangement(&["a", "b"]), Transition::immediate(), &mut refuse_b);
        assert!(surface.row_for(&"b").is_none());
        assert_eq!(surface.history()[0].refused, vec!["b"]);
        assert_eq!(surface.pooled(), 1);
    }

    #[test]
    fn pool_is_trimmed() {
        let mut surface = VirtualSurface::new().with_pool_limit(1);
        surface.apply(arrangement(&["a", "b", "c"]), Transition::immediate(), &mut accept_all);
        surface.apply(arrangement(&[]), Transition::immediate(), &mut accept_all);
        assert_eq!(surface.pooled(), 1);
        assert_eq!(surface.take_history().len(), 2);
        assert!(surface.history().is_empty());
    }
}
