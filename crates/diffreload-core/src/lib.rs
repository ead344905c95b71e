#![forbid(unsafe_code)]

//! Reload detection for diffable lists.
//!
//! A diffable list applies arrangements of *identifiers*; when the record
//! behind an identifier changes but the identifier does not, the list keeps
//! showing stale content. This crate closes that gap:
//!
//! - [`RowFingerprintStore`] remembers, per live row, which identifier it
//!   shows and a fingerprint of the content it rendered.
//! - [`identifiers_needing_reload`] compares those fingerprints with fresh
//!   ones from a content provider.
//! - [`ReloadingDataSource`] reloads the stale rows against the current
//!   arrangement, then applies the new one.
//!
//! Rows are [`RowInstance`] handles owned by a [`ListSurface`]. The store only
//! holds weak references, so a row dropped by the surface takes its record
//! with it. [`VirtualSurface`] is a headless surface with row reuse for tests
//! and tooling.
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use diffreload_core::{ApplyOptions, Arrangement, ReloadingDataSource, VirtualSurface};
//!
//! let prices = Rc::new(RefCell::new(vec![10u32, 20]));
//! let lookup = Rc::clone(&prices);
//! let mut source = ReloadingDataSource::new(
//!     VirtualSurface::<&str, usize>::new(),
//!     |_row, _id| true,
//!     move |id: &usize| lookup.borrow().get(*id).copied(),
//! );
//!
//! let rows = || Arrangement::from_sections([("main", vec![0usize, 1])]);
//! source.apply_with_reload(rows()?, ApplyOptions::immediate())?;
//!
//! prices.borrow_mut()[1] = 25;
//! let report = source.apply_with_reload(rows()?, ApplyOptions::immediate())?;
//! assert_eq!(report.reloaded, vec![1]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod arrangement;
pub mod config;
pub mod detector;
pub mod error;
mod logging;
pub mod observer;
pub mod row;
pub mod source;
pub mod store;
pub mod surface;
pub mod virtual_surface;

pub use arrangement::Arrangement;
pub use config::ReloadConfig;
pub use detector::identifiers_needing_reload;
pub use error::{ApplyError, ArrangementError, BuildError, Result};
pub use observer::{NoopObserver, ReadObserver};
pub use row::{RowInstance, RowInstanceId};
pub use source::{ApplyOptions, Binding, ReloadReport, ReloadingDataSource, ReloadingDataSourceBuilder};
pub use store::{DuplicatePolicy, FingerprintRecord, RowFingerprintStore};
pub use surface::{ListSurface, RowAnimation, RowBinder, Transition};
pub use virtual_surface::{TransitionRecord, VirtualSurface};
