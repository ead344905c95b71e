#![forbid(unsafe_code)]

//! Row instance handles.
//!
//! A [`RowInstance`] stands for one concrete, reusable rendering unit owned by
//! a list surface. It is a cheap `Rc` handle: clones refer to the same row,
//! and the row is retired when the last clone is dropped. The fingerprint
//! store only keeps weak references, so retiring a row silently retires its
//! stored record.

use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ROW_ID: AtomicU64 = AtomicU64::new(1);

fn next_row_id() -> RowInstanceId {
    RowInstanceId(NEXT_ROW_ID.fetch_add(1, Ordering::Relaxed))
}

/// Process-unique identity of a row instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowInstanceId(u64);

impl RowInstanceId {
    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
struct RowInner {
    id: RowInstanceId,
}

/// Handle to a reusable rendering unit.
#[derive(Debug, Clone)]
pub struct RowInstance {
    inner: Rc<RowInner>,
}

impl RowInstance {
    /// Allocate a fresh row instance with a new identity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RowInner { id: next_row_id() }),
        }
    }

    #[must_use]
    pub fn id(&self) -> RowInstanceId {
        self.inner.id
    }

    /// Whether both handles refer to the same row.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn downgrade(&self) -> WeakRow {
        WeakRow(Rc::downgrade(&self.inner))
    }
}

impl Default for RowInstance {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for RowInstance {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for RowInstance {}

/// Non-owning reference held by the fingerprint store.
#[derive(Debug, Clone)]
pub(crate) struct WeakRow(Weak<RowInner>);

impl WeakRow {
    pub(crate) fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}
