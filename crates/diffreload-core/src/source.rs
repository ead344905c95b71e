#![forbid(unsafe_code)]

//! The reloading data source: two-phase apply on top of a [`ListSurface`].
//!
//! # Design
//!
//! [`ReloadingDataSource`] owns the surface, the fingerprint store and the
//! providers. Whenever the surface binds a row it goes through a short-lived
//! binding context that borrows the store and providers disjointly from the
//! surface, so the row-render path records `{row, identifier, fingerprint}`
//! without any back-reference from surface to source.
//!
//! [`apply_with_reload`](ReloadingDataSource::apply_with_reload) then runs:
//!
//! 1. detection over the incoming arrangement's items,
//! 2. if anything changed: eviction of the changed identifiers and a
//!    reload-only apply of the *current* arrangement, marking the changed
//!    items that it still contains,
//! 3. the apply of the incoming arrangement,
//! 4. the completion callback, which may re-enter the source.
//!
//! # Failure Modes
//!
//! | Condition | Behaviour |
//! |-----------|-----------|
//! | Incoming arrangement carries reload marks | `ApplyError::ReloadMarksInArrangement`, nothing applied |
//! | Content provider returns `None` | Row stored as always stale; reloaded on the next cycle |
//! | Row provider refuses a row | Row left unbound, any record it held is dropped |
//! | Observer dropped | Reads proceed without notifications |

use std::hash::Hash;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use ahash::AHashSet;

use crate::arrangement::Arrangement;
use crate::config::ReloadConfig;
use crate::detector::identifiers_needing_reload;
use crate::error::{ApplyError, BuildError, Result};
use crate::logging::debug;
use crate::observer::{NoopObserver, ReadObserver, observed_read};
use crate::row::{RowInstance, RowInstanceId};
use crate::store::RowFingerprintStore;
use crate::surface::{ListSurface, RowAnimation, RowBinder, Transition};

/// Result of a row-with-content provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding<F> {
    /// The row was configured; the fingerprint of what it now shows.
    Bound(Option<F>),
    /// The row should not be displayed.
    Refused,
}

type ContentProvider<I, F> = Box<dyn FnMut(&I) -> Option<F>>;

enum RowProvider<I, F> {
    /// Configures the row; the fingerprint comes from the content provider.
    Plain(Box<dyn FnMut(&RowInstance, &I) -> bool>),
    /// Configures the row and returns its fingerprint in one call.
    WithContent(Box<dyn FnMut(&RowInstance, &I) -> Binding<F>>),
}

/// Per-call knobs of [`ReloadingDataSource::apply_with_reload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Animate the final apply.
    pub animating_differences: bool,
    /// Animation of the reload pass; falls back to
    /// [`ReloadConfig::default_reload_animation`].
    pub reload_animation: Option<RowAnimation>,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            animating_differences: true,
            reload_animation: None,
        }
    }
}

impl ApplyOptions {
    /// No animation in either pass.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            animating_differences: false,
            reload_animation: None,
        }
    }

    #[must_use]
    pub fn with_reload_animation(mut self, animation: RowAnimation) -> Self {
        self.reload_animation = Some(animation);
        self
    }

    #[must_use]
    pub fn with_animating_differences(mut self, animate: bool) -> Self {
        self.animating_differences = animate;
        self
    }
}

/// What one `apply_with_reload` call did.
#[derive(Debug, Clone)]
pub struct ReloadReport<I> {
    /// Identifiers whose displayed content was stale.
    pub changed: AHashSet<I>,
    /// Changed identifiers present in the pre-apply arrangement, in its order.
    pub reloaded: Vec<I>,
    /// Store records removed before the reload pass.
    pub evicted: usize,
    /// Whether the reload-only transition was applied.
    pub reload_pass_applied: bool,
}

impl<I> ReloadReport<I> {
    fn unchanged() -> Self {
        Self {
            changed: AHashSet::new(),
            reloaded: Vec::new(),
            evicted: 0,
            reload_pass_applied: false,
        }
    }

    /// No row needed a reload.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.changed.is_empty()
    }
}

/// Diffable data source that reloads rows whose content changed.
pub struct ReloadingDataSource<S, I, F, Surf> {
    surface: Surf,
    store: RowFingerprintStore<I, F>,
    row_provider: RowProvider<I, F>,
    content_provider: ContentProvider<I, F>,
    observer: Option<Weak<dyn ReadObserver<I>>>,
    config: ReloadConfig,
    _sections: PhantomData<fn() -> S>,
}

impl<S, I, F, Surf> std::fmt::Debug for ReloadingDataSource<S, I, F, Surf>
where
    I: std::fmt::Debug,
    F: std::fmt::Debug,
    Surf: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReloadingDataSource")
            .field("surface", &self.surface)
            .field("store", &self.store)
            .field("has_observer", &self.observer.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S, I, F, Surf> ReloadingDataSource<S, I, F, Surf>
where
    S: PartialEq + Clone,
    I: Eq + Hash + Clone,
    F: PartialEq,
    Surf: ListSurface<S, I>,
{
    /// Source whose row provider only configures rows; fingerprints stored at
    /// bind time come from `content_provider`.
    pub fn new(
        surface: Surf,
        row_provider: impl FnMut(&RowInstance, &I) -> bool + 'static,
        content_provider: impl FnMut(&I) -> Option<F> + 'static,
    ) -> Self {
        Self::from_parts(
            surface,
            RowProvider::Plain(Box::new(row_provider)),
            Box::new(content_provider),
            None,
            ReloadConfig::default(),
        )
    }

    /// Source whose row provider returns the fingerprint with the binding.
    /// `content_provider` is still used for change detection.
    pub fn with_row_content(
        surface: Surf,
        row_provider: impl FnMut(&RowInstance, &I) -> Binding<F> + 'static,
        content_provider: impl FnMut(&I) -> Option<F> + 'static,
    ) -> Self {
        Self::from_parts(
            surface,
            RowProvider::WithContent(Box::new(row_provider)),
            Box::new(content_provider),
            None,
            ReloadConfig::default(),
        )
    }

    /// Start a builder around `surface`.
    #[must_use]
    pub fn builder(surface: Surf) -> ReloadingDataSourceBuilder<S, I, F, Surf> {
        ReloadingDataSourceBuilder::new(surface)
    }

    fn from_parts(
        surface: Surf,
        row_provider: RowProvider<I, F>,
        content_provider: ContentProvider<I, F>,
        observer: Option<Weak<dyn ReadObserver<I>>>,
        config: ReloadConfig,
    ) -> Self {
        Self {
            surface,
            store: RowFingerprintStore::new(config.duplicate_policy),
            row_provider,
            content_provider,
            observer,
            config,
            _sections: PhantomData,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────

    #[must_use]
    pub fn surface(&self) -> &Surf {
        &self.surface
    }

    /// Mutable access to the surface, e.g. to scroll it.
    pub fn surface_mut(&mut self) -> &mut Surf {
        &mut self.surface
    }

    #[must_use]
    pub fn into_surface(self) -> Surf {
        self.surface
    }

    #[must_use]
    pub fn store(&self) -> &RowFingerprintStore<I, F> {
        &self.store
    }

    #[must_use]
    pub fn config(&self) -> &ReloadConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ReloadConfig) {
        self.store.set_policy(config.duplicate_policy);
        self.config = config;
    }

    /// Observe content reads. Only a weak reference is kept.
    pub fn set_observer<O: ReadObserver<I> + 'static>(&mut self, observer: &Rc<O>) {
        let weak: Weak<dyn ReadObserver<I>> = Rc::downgrade(observer) as Weak<O>;
        self.observer = Some(weak);
    }

    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    /// The arrangement the surface currently displays.
    #[must_use]
    pub fn snapshot(&self) -> Arrangement<S, I> {
        self.surface.snapshot()
    }

    // ── Hooks ────────────────────────────────────────────────────────────

    /// Record what `row` displays, for surfaces that bind rows outside
    /// [`ListSurface::apply`].
    pub fn store_content(&mut self, row: &RowInstance, identifier: I, fingerprint: Option<F>) {
        self.store.put(row, identifier, fingerprint);
    }

    /// Forget `row`, which the surface retired while still holding it.
    pub fn retire_row(&mut self, row: RowInstanceId) {
        if self.store.remove_instance(row).is_some() {
            debug!(message = "reload.retire", row = row.raw());
        }
    }

    /// Which of `candidates` currently display stale content.
    pub fn item_identifiers_needing_reload<'a>(
        &mut self,
        candidates: impl IntoIterator<Item = &'a I>,
    ) -> AHashSet<I>
    where
        I: 'a,
    {
        let candidates: AHashSet<I> = candidates.into_iter().cloned().collect();
        let observer = self.observer.as_ref().and_then(Weak::upgrade);
        identifiers_needing_reload(
            &self.store,
            &candidates,
            &mut *self.content_provider,
            observer_or_noop(observer.as_deref()),
        )
    }

    // ── Apply ────────────────────────────────────────────────────────────

    /// Apply without change detection.
    pub fn apply(&mut self, arrangement: Arrangement<S, I>, transition: Transition) {
        if self.config.purge_before_apply {
            self.store.purge_retired();
        }
        self.apply_to_surface(arrangement, transition);
    }

    /// Reload rows whose content changed, then apply `arrangement`.
    pub fn apply_with_reload(
        &mut self,
        arrangement: Arrangement<S, I>,
        options: ApplyOptions,
    ) -> Result<ReloadReport<I>> {
        self.apply_with_reload_then(arrangement, options, |_| {})
    }

    /// [`apply_with_reload`](Self::apply_with_reload), then `on_complete`.
    ///
    /// `on_complete` runs after the final apply and may call back into the
    /// source; such a call is an independent cycle.
    pub fn apply_with_reload_then(
        &mut self,
        arrangement: Arrangement<S, I>,
        options: ApplyOptions,
        on_complete: impl FnOnce(&mut Self),
    ) -> Result<ReloadReport<I>> {
        if arrangement.has_reload_marks() {
            return Err(ApplyError::ReloadMarksInArrangement {
                count: arrangement.reloaded_items().len(),
            });
        }

        let report = {
            #[cfg(feature = "tracing")]
            let span = tracing::debug_span!(
                "reload.apply",
                candidates = arrangement.number_of_items(),
                changed = tracing::field::Empty,
                reloaded = tracing::field::Empty,
            );
            #[cfg(feature = "tracing")]
            let _guard = span.enter();

            let report = self.reload_changed(&arrangement, options)?;

            #[cfg(feature = "tracing")]
            {
                span.record("changed", report.changed.len());
                span.record("reloaded", report.reloaded.len());
            }

            let transition = if options.animating_differences {
                Transition::animated(RowAnimation::Automatic)
            } else {
                Transition::immediate()
            };
            self.apply_to_surface(arrangement, transition);
            report
        };

        on_complete(self);
        Ok(report)
    }

    /// Detection, eviction and the reload-only pass.
    fn reload_changed(
        &mut self,
        incoming: &Arrangement<S, I>,
        options: ApplyOptions,
    ) -> Result<ReloadReport<I>> {
        if self.config.purge_before_apply {
            self.store.purge_retired();
        }

        let changed = self.item_identifiers_needing_reload(incoming.item_identifiers());
        if changed.is_empty() {
            return Ok(ReloadReport::unchanged());
        }

        let mut current = self.surface.snapshot();
        let reloaded: Vec<I> = current
            .item_identifiers()
            .filter(|id| changed.contains(*id))
            .cloned()
            .collect();
        let evicted = self.store.evict(&changed);
        debug!(message = "reload.evict", evicted, changed = changed.len());

        let reload_pass_applied = !reloaded.is_empty();
        if reload_pass_applied {
            current.reload_items(reloaded.iter().cloned())?;
            let transition = match options
                .reload_animation
                .or(self.config.default_reload_animation)
            {
                Some(animation) => Transition::animated(animation),
                None => Transition::immediate(),
            };
            self.apply_to_surface(current, transition);
        }

        Ok(ReloadReport {
            changed,
            reloaded,
            evicted,
            reload_pass_applied,
        })
    }

    fn apply_to_surface(&mut self, arrangement: Arrangement<S, I>, transition: Transition) {
        let observer = self.observer.as_ref().and_then(Weak::upgrade);
        let mut binder = BindContext {
            store: &mut self.store,
            row_provider: &mut self.row_provider,
            content_provider: &mut self.content_provider,
            observer: observer_or_noop(observer.as_deref()),
        };
        self.surface.apply(arrangement, transition, &mut binder);
    }
}

fn observer_or_noop<'a, I>(observer: Option<&'a dyn ReadObserver<I>>) -> &'a dyn ReadObserver<I> {
    match observer {
        Some(observer) => observer,
        None => &NoopObserver,
    }
}

/// Row-render path handed to the surface for one apply.
struct BindContext<'a, I, F> {
    store: &'a mut RowFingerprintStore<I, F>,
    row_provider: &'a mut RowProvider<I, F>,
    content_provider: &'a mut ContentProvider<I, F>,
    observer: &'a dyn ReadObserver<I>,
}

impl<I: Eq + Hash + Clone, F> RowBinder<I> for BindContext<'_, I, F> {
    fn bind(&mut self, row: &RowInstance, identifier: &I) -> bool {
        let fingerprint = match &mut *self.row_provider {
            RowProvider::Plain(configure) => {
                if configure(row, identifier) {
                    Some(observed_read(
                        self.observer,
                        identifier,
                        &mut **self.content_provider,
                    ))
                } else {
                    None
                }
            }
            RowProvider::WithContent(configure) => match configure(row, identifier) {
                Binding::Bound(fingerprint) => Some(fingerprint),
                Binding::Refused => None,
            },
        };

        match fingerprint {
            Some(fingerprint) => {
                self.store.put(row, identifier.clone(), fingerprint);
                true
            }
            None => {
                self.store.remove_instance(row.id());
                debug!(message = "reload.refused_row", row = row.id().raw());
                false
            }
        }
    }
}

/// Step-by-step construction of a [`ReloadingDataSource`].
pub struct ReloadingDataSourceBuilder<S, I, F, Surf> {
    surface: Surf,
    row_provider: Option<RowProvider<I, F>>,
    content_provider: Option<ContentProvider<I, F>>,
    observer: Option<Weak<dyn ReadObserver<I>>>,
    config: ReloadConfig,
    _sections: PhantomData<fn() -> S>,
}

impl<S, I, F, Surf> ReloadingDataSourceBuilder<S, I, F, Surf>
where
    S: PartialEq + Clone,
    I: Eq + Hash + Clone,
    F: PartialEq,
    Surf: ListSurface<S, I>,
{
    #[must_use]
    pub fn new(surface: Surf) -> Self {
        Self {
            surface,
            row_provider: None,
            content_provider: None,
            observer: None,
            config: ReloadConfig::default(),
            _sections: PhantomData,
        }
    }

    /// Row provider that only configures rows. Replaces any earlier one.
    #[must_use]
    pub fn row_provider(
        mut self,
        provider: impl FnMut(&RowInstance, &I) -> bool + 'static,
    ) -> Self {
        self.row_provider = Some(RowProvider::Plain(Box::new(provider)));
        self
    }

    /// Row provider that also returns the fingerprint. Replaces any earlier one.
    #[must_use]
    pub fn row_with_content_provider(
        mut self,
        provider: impl FnMut(&RowInstance, &I) -> Binding<F> + 'static,
    ) -> Self {
        self.row_provider = Some(RowProvider::WithContent(Box::new(provider)));
        self
    }

    #[must_use]
    pub fn content_provider(mut self, provider: impl FnMut(&I) -> Option<F> + 'static) -> Self {
        self.content_provider = Some(Box::new(provider));
        self
    }

    #[must_use]
    pub fn observer<O: ReadObserver<I> + 'static>(mut self, observer: &Rc<O>) -> Self {
        let weak: Weak<dyn ReadObserver<I>> = Rc::downgrade(observer) as Weak<O>;
        self.observer = Some(weak);
        self
    }

    #[must_use]
    pub fn config(mut self, config: ReloadConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> std::result::Result<ReloadingDataSource<S, I, F, Surf>, BuildError> {
        let row_provider = self.row_provider.ok_or(BuildError::MissingRowProvider)?;
        let content_provider = self
            .content_provider
            .ok_or(BuildError::MissingContentProvider)?;
        Ok(ReloadingDataSource::from_parts(
            self.surface,
            row_provider,
            content_provider,
            self.observer,
            self.config,
        ))
    }
}
