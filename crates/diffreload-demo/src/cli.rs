#![forbid(unsafe_code)]

//! Command-line argument parsing for the demo.
//!
//! Parses args manually to keep the binary lean. Supports environment
//! variable overrides via the `DIFFRELOAD_DEMO_*` prefix; explicit flags win.

use std::env;

use crate::app::FingerprintMode;
use crate::error::{DemoError, Result};
use crate::view_model::Action;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const HELP_TEXT: &str = "\
diffreload demo: cars and motorcycles with automatic row reloads

USAGE:
    diffreload-demo [OPTIONS]

OPTIONS:
    --seed=N              Seed for the generated fleet (default: 2021)
    --fingerprint=MODE    'exact' (encoded fields) or 'fast' (hashed fields) (default: exact)
    --visible-rows=N      Only the first N rows are visible (default: all)
    --actions=A,B,...     Actions to run, in order (default: all)
    --no-reload           Apply arrangements without reload detection
    --no-animation        Apply every transition immediately
    --verbose, -v         Debug logging (overridden by RUST_LOG)
    --help, -h            Show this help message
    --version, -V         Show version

ACTIONS:
    ford      Increase price of all Ford cars
    vw        Change color of all Volkswagen cars
    ducati    Change plates of all Ducati motorcycles
    move      Increase prices, change plates and move a motorcycle
    switch    Switch sections
    shuffle   Increase prices, change colors and shuffle section one

ENVIRONMENT VARIABLES:
    DIFFRELOAD_DEMO_SEED           Override --seed
    DIFFRELOAD_DEMO_FINGERPRINT    Override --fingerprint
    DIFFRELOAD_DEMO_VISIBLE_ROWS   Override --visible-rows
    DIFFRELOAD_DEMO_ACTIONS        Override --actions
    DIFFRELOAD_DEMO_NO_RELOAD      Override --no-reload (1/true to enable)";

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq)]
pub struct Opts {
    /// Seed for fleet generation and random actions.
    pub seed: u64,
    pub fingerprint: FingerprintMode,
    /// Visible window; `None` shows every row.
    pub visible_rows: Option<usize>,
    pub actions: Vec<Action>,
    /// Run reload detection. Off shows the stale rows a plain apply leaves.
    pub reload: bool,
    pub animate: bool,
    pub verbose: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            seed: 2021,
            fingerprint: FingerprintMode::Exact,
            visible_rows: None,
            actions: Action::ALL.to_vec(),
            reload: true,
            animate: true,
            verbose: false,
        }
    }
}

/// What the binary should do.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Run(Opts),
    Help,
    Version,
}

impl Opts {
    /// Parse the process arguments and environment.
    pub fn parse() -> Result<Command> {
        Self::parse_from(env::args().skip(1), |key| env::var(key).ok())
    }

    /// Parse `args` (without the program name), reading overrides through
    /// `var`.
    pub fn parse_from(
        args: impl IntoIterator<Item = String>,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Command> {
        let mut opts = Self::default();

        // Environment first; flags below override it.
        if let Some(val) = var("DIFFRELOAD_DEMO_SEED") {
            opts.seed = parse_number("DIFFRELOAD_DEMO_SEED", &val)?;
        }
        if let Some(val) = var("DIFFRELOAD_DEMO_FINGERPRINT") {
            opts.fingerprint = parse_fingerprint(&val)?;
        }
        if let Some(val) = var("DIFFRELOAD_DEMO_VISIBLE_ROWS") {
            opts.visible_rows = Some(parse_number("DIFFRELOAD_DEMO_VISIBLE_ROWS", &val)?);
        }
        if let Some(val) = var("DIFFRELOAD_DEMO_ACTIONS") {
            opts.actions = parse_actions(&val)?;
        }
        if let Some(val) = var("DIFFRELOAD_DEMO_NO_RELOAD") {
            opts.reload = !(val == "1" || val.eq_ignore_ascii_case("true"));
        }

        for arg in args {
            match arg.as_str() {
                "--help" | "-h" => return Ok(Command::Help),
                "--version" | "-V" => return Ok(Command::Version),
                "--no-reload" => opts.reload = false,
                "--no-animation" => opts.animate = false,
                "--verbose" | "-v" => opts.verbose = true,
                other => {
                    if let Some(val) = other.strip_prefix("--seed=") {
                        opts.seed = parse_number("--seed", val)?;
                    } else if let Some(val) = other.strip_prefix("--fingerprint=") {
                        opts.fingerprint = parse_fingerprint(val)?;
                    } else if let Some(val) = other.strip_prefix("--visible-rows=") {
                        opts.visible_rows = Some(parse_number("--visible-rows", val)?);
                    } else if let Some(val) = other.strip_prefix("--actions=") {
                        opts.actions = parse_actions(val)?;
                    } else {
                        return Err(DemoError::invalid_argument(format!(
                            "unknown argument: {other} (run with --help for usage)"
                        )));
                    }
                }
            }
        }

        Ok(Command::Run(opts))
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, val: &str) -> Result<T> {
    val.parse()
        .map_err(|_| DemoError::invalid_argument(format!("invalid {name} value: {val}")))
}

fn parse_fingerprint(val: &str) -> Result<FingerprintMode> {
    FingerprintMode::from_name(val)
        .ok_or_else(|| DemoError::invalid_argument(format!("invalid fingerprint mode: {val}")))
}

fn parse_actions(val: &str) -> Result<Vec<Action>> {
    val.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            Action::from_name(name)
                .ok_or_else(|| DemoError::invalid_argument(format!("unknown action: {name}")))
        })
        .collect()
}
