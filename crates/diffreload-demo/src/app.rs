#![forbid(unsafe_code)]

//! Headless garage list wired to a [`ReloadingDataSource`].
//!
//! Rows render into a screen map keyed by row instance. A row is *stale* when
//! the text it shows differs from what its record would render now; with
//! reload detection on, no visible row is ever stale after an action.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ahash::AHashMap;
use diffreload_content::{EncodedFingerprint, HashFingerprint};
use diffreload_core::{
    ApplyOptions, Binding, ReadObserver, ReloadingDataSource, RowAnimation, RowInstanceId,
    Transition, VirtualSurface,
};
use tracing::{debug, info, trace};

use crate::cli::Opts;
use crate::error::Result;
use crate::view_model::{Action, CellViewModel, Garage, ItemId, SectionId};

/// Which fingerprint the source compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerprintMode {
    /// Encoded field values; equal fingerprints mean equal content.
    Exact,
    /// Hashed field values; cheaper, collisions possible.
    Fast,
}

impl FingerprintMode {
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "exact" => Some(Self::Exact),
            "fast" => Some(Self::Fast),
            _ => None,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Fast => "fast",
        }
    }

    #[must_use]
    pub fn fingerprint(self, cell: &CellViewModel) -> Option<CellFingerprint> {
        match self {
            Self::Exact => cell.exact_fingerprint().map(CellFingerprint::Exact),
            Self::Fast => Some(CellFingerprint::Fast(cell.fast_fingerprint())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellFingerprint {
    Exact(EncodedFingerprint),
    Fast(HashFingerprint),
}

/// Counts record reads made on behalf of the source.
#[derive(Debug, Default)]
pub struct ReadAudit {
    reads: Cell<usize>,
}

impl ReadAudit {
    #[must_use]
    pub fn reads(&self) -> usize {
        self.reads.get()
    }
}

impl ReadObserver<ItemId> for ReadAudit {
    fn will_read(&self, identifier: &ItemId) {
        trace!(message = "demo.read", identifier = ?identifier);
    }

    fn did_read(&self, _identifier: &ItemId) {
        self.reads.set(self.reads.get() + 1);
    }
}

type Screen = Rc<RefCell<AHashMap<RowInstanceId, String>>>;
type GarageSource =
    ReloadingDataSource<SectionId, ItemId, CellFingerprint, VirtualSurface<SectionId, ItemId>>;

/// Summary of one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub action: Action,
    /// Identifiers detected as changed.
    pub changed: usize,
    /// Rows reloaded before the final apply.
    pub reloaded: usize,
    /// Visible rows showing outdated content afterwards.
    pub stale_rows: usize,
}

pub struct DemoApp {
    garage: Rc<RefCell<Garage>>,
    screen: Screen,
    source: GarageSource,
    audit: Rc<ReadAudit>,
    reload: bool,
    animate: bool,
}

impl std::fmt::Debug for DemoApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DemoApp")
            .field("source", &self.source)
            .field("reload", &self.reload)
            .field("animate", &self.animate)
            .finish_non_exhaustive()
    }
}

impl DemoApp {
    /// Build the garage and lay it out without animation.
    pub fn new(opts: &Opts) -> Result<Self> {
        let garage = Rc::new(RefCell::new(Garage::new(opts.seed)));
        let screen: Screen = Rc::default();
        let mode = opts.fingerprint;

        let mut surface = VirtualSurface::new();
        surface.set_visible_limit(opts.visible_rows);

        let render_garage = Rc::clone(&garage);
        let render_screen = Rc::clone(&screen);
        let lookup = Rc::clone(&garage);
        let mut source = ReloadingDataSource::with_row_content(
            surface,
            move |row, id: &ItemId| match render_garage.borrow().cell_view_model(id) {
                Some(cell) => {
                    render_screen.borrow_mut().insert(row.id(), cell.render());
                    Binding::Bound(mode.fingerprint(&cell))
                }
                None => Binding::Refused,
            },
            move |id: &ItemId| {
                lookup
                    .borrow()
                    .cell_view_model(id)
                    .and_then(|cell| mode.fingerprint(&cell))
            },
        );

        let audit = Rc::new(ReadAudit::default());
        source.set_observer(&audit);

        let arrangement = garage.borrow().arrangement()?;
        source.apply(arrangement, Transition::immediate());
        debug!(
            message = "demo.ready",
            seed = opts.seed,
            fingerprint = mode.name(),
            reload = opts.reload
        );

        Ok(Self {
            garage,
            screen,
            source,
            audit,
            reload: opts.reload,
            animate: opts.animate,
        })
    }

    /// Perform `action` on the garage and apply the resulting layout.
    pub fn run(&mut self, action: Action) -> Result<ActionOutcome> {
        self.garage.borrow_mut().perform(action);
        let arrangement = self.garage.borrow().arrangement()?;

        let (changed, reloaded) = if self.reload {
            let options = if self.animate {
                ApplyOptions::default().with_reload_animation(RowAnimation::Fade)
            } else {
                ApplyOptions::immediate()
            };
            let report = self.source.apply_with_reload(arrangement, options)?;
            (report.changed.len(), report.reloaded.len())
        } else {
            let transition = if self.animate {
                Transition::animated(RowAnimation::Automatic)
            } else {
                Transition::immediate()
            };
            self.source.apply(arrangement, transition);
            (0, 0)
        };
        self.source.surface_mut().take_history();
        self.prune_screen();

        let outcome = ActionOutcome {
            action,
            changed,
            reloaded,
            stale_rows: self.stale_rows(),
        };
        info!(
            message = "demo.action",
            action = action.name(),
            changed = outcome.changed,
            reloaded = outcome.reloaded,
            stale = outcome.stale_rows
        );
        Ok(outcome)
    }

    /// Visible rows as rendered, in display order.
    #[must_use]
    pub fn visible_lines(&self) -> Vec<String> {
        let screen = self.screen.borrow();
        self.source
            .surface()
            .visible_rows()
            .map(|(_, row)| screen.get(&row.id()).cloned().unwrap_or_default())
            .collect()
    }

    /// Visible rows whose rendered text no longer matches their record.
    #[must_use]
    pub fn stale_rows(&self) -> usize {
        let screen = self.screen.borrow();
        let garage = self.garage.borrow();
        self.source
            .surface()
            .visible_rows()
            .filter(|(id, row)| {
                let current = garage.cell_view_model(id).map(|cell| cell.render());
                screen.get(&row.id()) != current.as_ref()
            })
            .count()
    }

    /// Record reads reported to the observer so far.
    #[must_use]
    pub fn reads(&self) -> usize {
        self.audit.reads()
    }

    #[must_use]
    pub fn source(&self) -> &GarageSource {
        &self.source
    }

    fn prune_screen(&self) {
        let visible: Vec<RowInstanceId> = self
            .source
            .surface()
            .visible_rows()
            .map(|(_, row)| row.id())
            .collect();
        self.screen
            .borrow_mut()
            .retain(|row, _| visible.contains(row));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(reload: bool) -> Opts {
        Opts {
            reload,
            animate: false,
            ..Opts::default()
        }
    }

    #[test]
    fn initial_screen_is_fresh() {
        let app = DemoApp::new(&opts(true)).expect("app");
        assert_eq!(app.visible_lines().len(), 11);
        assert_eq!(app.stale_rows(), 0);
        // Initial layout binds through the row provider only.
        assert_eq!(app.reads(), 0);
    }

    #[test]
    fn price_change_is_reloaded() {
        let mut app = DemoApp::new(&opts(true)).expect("app");
        let outcome = app.run(Action::IncreaseFordPrices).expect("run");
        // Two Fords at least; random cars may add more.
        assert!(outcome.changed >= 2);
        assert_eq!(outcome.reloaded, outcome.changed);
        assert_eq!(outcome.stale_rows, 0);
        assert_eq!(app.reads(), 11);
    }

    #[test]
    fn plain_apply_leaves_stale_rows() {
        let mut app = DemoApp::new(&opts(false)).expect("app");
        let outcome = app.run(Action::IncreaseFordPrices).expect("run");
        assert_eq!(outcome.reloaded, 0);
        assert!(outcome.stale_rows >= 2);
    }

    #[test]
    fn fast_fingerprints_detect_color_changes() {
        let mut app = DemoApp::new(&Opts {
            fingerprint: FingerprintMode::Fast,
            ..opts(true)
        })
        .expect("app");
        let outcome = app.run(Action::ChangeVolkswagenColors).expect("run");
        assert_eq!(outcome.reloaded, outcome.changed);
        assert_eq!(outcome.stale_rows, 0);
    }

    #[test]
    fn fingerprint_mode_names() {
        assert_eq!(FingerprintMode::from_name("FAST"), Some(FingerprintMode::Fast));
        assert_eq!(FingerprintMode::from_name("exact"), Some(FingerprintMode::Exact));
        assert_eq!(FingerprintMode::from_name("fuzzy"), None);
    }
}
