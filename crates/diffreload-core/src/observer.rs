#![forbid(unsafe_code)]

//! Read notifications around content-provider calls.
//!
//! Every call the engine makes into the content provider is bracketed by
//! [`ReadObserver::will_read`] and [`ReadObserver::did_read`]. Owners of
//! backing data that is mutated from another thread use the pair to hold a
//! read lock for exactly the duration of the read. Both methods default to
//! no-ops.

/// Receives `will_read` / `did_read` around each content read.
pub trait ReadObserver<I> {
    /// Called just before the content provider reads `identifier`.
    fn will_read(&self, _identifier: &I) {}

    /// Called just after the content provider read `identifier`.
    fn did_read(&self, _identifier: &I) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl<I> ReadObserver<I> for NoopObserver {}

/// Run `read` between the observer's notifications.
pub(crate) fn observed_read<I, T>(
    observer: &dyn ReadObserver<I>,
    identifier: &I,
    read: impl FnOnce(&I) -> T,
) -> T {
    observer.will_read(identifier);
    let value = read(identifier);
    observer.did_read(identifier);
    value
}
