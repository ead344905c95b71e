#![forbid(unsafe_code)]

//! The list surface seam.
//!
//! A [`ListSurface`] is whatever displays an [`Arrangement`]: it owns row
//! instances, keeps the last applied arrangement, and applies new ones with a
//! [`Transition`]. While applying it asks a [`RowBinder`] to configure every
//! row it needs to (re)display. The engine plugs its bookkeeping in through
//! the binder, so any surface that honours the contract below gets reloads
//! for free.
//!
//! # Contract
//!
//! 1. `snapshot()` returns the arrangement most recently applied, without
//!    reload marks.
//! 2. `apply()` calls `bind` for every item that is newly visible and for
//!    every item in the arrangement's reload marks that is visible.
//! 3. A row reported as refused (`bind` returned `false`) is not displayed.
//! 4. A row that is retired is either dropped or passed to the binder again
//!    before it displays something else.

use crate::arrangement::Arrangement;
use crate::row::RowInstance;

/// Visual style of row insertions, deletions and reloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum RowAnimation {
    /// Let the surface pick.
    #[default]
    Automatic,
    None,
    Fade,
    Left,
    Right,
    Top,
    Bottom,
    Middle,
}

/// How an arrangement is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Transition {
    /// Whether changes are animated at all.
    pub animated: bool,
    /// Style used when `animated` is set.
    pub row_animation: RowAnimation,
}

impl Transition {
    /// Apply without animation.
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            animated: false,
            row_animation: RowAnimation::Automatic,
        }
    }

    /// Apply with `row_animation`.
    #[must_use]
    pub const fn animated(row_animation: RowAnimation) -> Self {
        Self {
            animated: true,
            row_animation,
        }
    }
}

/// Configures a row to display an item.
pub trait RowBinder<I> {
    /// Bind `row` to `identifier`. Returns `false` when the row should not be
    /// displayed.
    fn bind(&mut self, row: &RowInstance, identifier: &I) -> bool;
}

impl<I, F> RowBinder<I> for F
where
    F: FnMut(&RowInstance, &I) -> bool,
{
    fn bind(&mut self, row: &RowInstance, identifier: &I) -> bool {
        self(row, identifier)
    }
}

/// Anything that displays sectioned lists of identified rows.
pub trait ListSurface<S, I> {
    /// The arrangement currently displayed.
    fn snapshot(&self) -> Arrangement<S, I>;

    /// Display `arrangement`, binding rows through `binder`.
    fn apply(
        &mut self,
        arrangement: Arrangement<S, I>,
        transition: Transition,
        binder: &mut dyn RowBinder<I>,
    );
}
