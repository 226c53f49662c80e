mod archive;
mod config;
mod fs_ops;
mod installer;
mod logging;
mod paths;
mod payload;
mod shortcuts;
mod state;

use anyhow::{bail, Context, Result};
use std::{process::ExitCode, sync::Arc};

use installer::{Event, InstallProgress, Lifecycle, Operation, Reporter};
use paths::PlatformPaths;
use state::{Action, InstallationState};

const USAGE: &str = "usage: desk-installer [status|install|update|uninstall|about]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Status,
    About,
    Run(Action),
}

pub fn parse_command(args: &[String]) -> Result<Command> {
    match args.first().map(String::as_str) {
        None | Some("status") => Ok(Command::Status),
        Some("about") => Ok(Command::About),
        Some("install") => Ok(Command::Run(Action::Install)),
        Some("update") => Ok(Command::Run(Action::Update)),
        Some("uninstall") => Ok(Command::Run(Action::Uninstall)),
        Some(other) => bail!("unknown command: {other}\n{USAGE}"),
    }
}

fn main() -> Result<ExitCode> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match parse_command(&args)? {
        Command::About => {
            print_about();
            Ok(ExitCode::SUCCESS)
        }
        Command::Status => {
            print_status(&start()?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Run(action) => run_action(Arc::new(start()?), action),
    }
}

/// Resolves paths and opens the log file; only commands that touch the
/// install tree need this.
fn start() -> Result<Lifecycle> {
    let paths = PlatformPaths::current(config::NAME)?;
    let log_path = logging::init(&paths.temp_dir, config::NAME)?;
    tracing::info!(log = %log_path.display(), version = config::VERSION, "installer started");
    Ok(Lifecycle::new(paths, payload::EMBEDDED_PAYLOAD, config::icon_name()))
}

fn print_about() {
    println!("{} installer v{}", config::NAME, config::VERSION);
    if !config::DESCRIPTION.is_empty() {
        println!("{}", config::DESCRIPTION);
    }
}

fn print_status(lifecycle: &Lifecycle) {
    let state = lifecycle.state();
    println!("Welcome to the {} installer!", config::NAME);
    println!("install dir: {}", lifecycle.paths().install_dir.display());
    println!("state: {state:?}");
    let actions: Vec<&str> = state.actions().iter().map(|a| a.label()).collect();
    println!("available: {}", actions.join(", "));
}

fn run_action(lifecycle: Arc<Lifecycle>, action: Action) -> Result<ExitCode> {
    if let Err(err) = ensure_offered(lifecycle.state(), action) {
        tracing::warn!(%err, "refusing action");
        eprintln!("error: {err}");
        return Ok(ExitCode::FAILURE);
    }

    let (handle, events) = installer::spawn(lifecycle, Operation::from(action))?;
    let mut progress = InstallProgress::default();
    let mut outcome = None;
    for event in events {
        match event {
            Event::Progress(value) => {
                progress.progress(value);
                println!("[{:>3.0}%]", progress.value * 100.0);
            }
            Event::Status(text) => {
                progress.status(&text);
                println!("{}", progress.status);
            }
            Event::Finished(result) => outcome = Some(result),
        }
    }
    if handle.join().is_err() {
        bail!("operation thread panicked");
    }

    match outcome.context("operation ended without a result")? {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            eprintln!("error: {:#}", err.source);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Only the actions offered for `state` may run.
pub fn ensure_offered(state: InstallationState, action: Action) -> Result<()> {
    if !state.actions().contains(&action) {
        bail!("{} is not available while {state:?}", action.label());
    }
    Ok(())
}
