#![forbid(unsafe_code)]

//! Tunables for [`ReloadingDataSource`](crate::ReloadingDataSource).

use crate::store::DuplicatePolicy;
use crate::surface::RowAnimation;

/// Engine configuration.
///
/// The defaults match what most list UIs want: one live record per
/// identifier, an unanimated reload pass, and a purge of retired rows before
/// every detection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadConfig {
    /// How the store treats several rows bound to the same identifier.
    pub duplicate_policy: DuplicatePolicy,
    /// Animation of the reload pass when the call does not pick one.
    /// `None` applies the reload pass without animation.
    pub default_reload_animation: Option<RowAnimation>,
    /// Drop records of dropped rows at the start of every apply. When off, those
    /// records hold their memory until the caller runs
    /// [`purge_retired`](crate::RowFingerprintStore::purge_retired).
    pub purge_before_apply: bool,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::EvictOthers,
            default_reload_animation: None,
            purge_before_apply: true,
        }
    }
}

impl ReloadConfig {
    #[must_use]
    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    #[must_use]
    pub fn with_default_reload_animation(mut self, animation: Option<RowAnimation>) -> Self {
        self.default_reload_animation = animation;
        self
    }

    #[must_use]
    pub fn with_purge_before_apply(mut self, purge: bool) -> Self {
        self.purge_before_apply = purge;
        self
    }
}
