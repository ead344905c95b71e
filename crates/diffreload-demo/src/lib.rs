#![forbid(unsafe_code)]

//! Cars and motorcycles demo for `diffreload`.
//!
//! Runs a scripted sequence of garage actions against a headless list and
//! prints the visible rows after each one. `--no-reload` shows what a plain
//! diffable apply leaves behind.

pub mod app;
pub mod cli;
pub mod error;
pub mod models;
pub mod view_model;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::app::DemoApp;
use crate::cli::{Command, HELP_TEXT, Opts, VERSION};
use crate::error::Result;

/// Parse the process arguments and run the demo.
pub fn run_from_env() -> Result<()> {
    match Opts::parse()? {
        Command::Help => {
            println!("{HELP_TEXT}");
            Ok(())
        }
        Command::Version => {
            println!("diffreload-demo {VERSION}");
            Ok(())
        }
        Command::Run(opts) => {
            init_logging(opts.verbose);
            run(&opts)
        }
    }
}

fn init_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "info" };
    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init();
}

/// Run the scripted actions and print the screen after each.
pub fn run(opts: &Opts) -> Result<()> {
    let mut app = DemoApp::new(opts)?;
    print_screen("initial", &app.visible_lines());

    for action in &opts.actions {
        let outcome = app.run(*action)?;
        print_screen(action.description(), &app.visible_lines());
        println!(
            "  changed={} reloaded={} stale={}",
            outcome.changed, outcome.reloaded, outcome.stale_rows
        );
    }

    println!("record reads: {}", app.reads());
    Ok(())
}

fn print_screen(title: &str, lines: &[String]) {
    println!("== {title} ==");
    for line in lines {
        println!("  {line}");
    }
}
