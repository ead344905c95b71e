#![forbid(unsafe_code)]

//! diffreload public facade crate.
//!
//! Re-exports the reload engine and the content fingerprint builders under a
//! single prelude.

pub use diffreload_content as content;
pub use diffreload_core as core;

pub mod prelude {
    pub use diffreload_content::{
        EncodableContent, EncodedFingerprint, HashFingerprint, HashableContent,
    };
    pub use diffreload_core::{
        ApplyOptions, Arrangement, Binding, DuplicatePolicy, ListSurface, ReadObserver,
        ReloadConfig, ReloadReport, ReloadingDataSource, RowAnimation, RowBinder, RowInstance,
        Transition, VirtualSurface,
    };
}
