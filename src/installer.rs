use anyhow::{Context, Result};
use std::{
    fs,
    process::{Command, ExitStatus},
    sync::{mpsc, Arc},
    thread,
};
use tracing::{error, info};

use crate::{
    archive, fs_ops, payload,
    paths::PlatformPaths,
    shortcuts,
    state::{self, Action, InstallationState},
};

pub const STATUS_INSTALLING: &str = "Installing...";
pub const STATUS_INSTALLED: &str = "Installation successful!";
pub const STATUS_UNINSTALLING: &str = "Uninstalling application...";
pub const STATUS_REMOVING_SHORTCUT: &str = "Removing shortcut...";
pub const STATUS_UNINSTALLED: &str = "Uninstall successful";

/// The step of an operation that failed; decides the status line shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Install,
    Shortcut,
    Uninstall,
}

impl Step {
    pub fn failure_status(self) -> &'static str {
        match self {
            Step::Install => "Install failed",
            Step::Shortcut => "Shortcut creation failed",
            Step::Uninstall => "Uninstall failed",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{}", .step.failure_status())]
pub struct OperationError {
    pub step: Step,
    #[source]
    pub source: anyhow::Error,
}

/// Receives progress and status updates while an operation runs.
pub trait Reporter {
    fn progress(&mut self, value: f64);
    fn status(&mut self, text: &str);
}

#[derive(Debug)]
pub enum Event {
    Progress(f64),
    Status(String),
    Finished(Result<(), OperationError>),
}

impl Reporter for mpsc::Sender<Event> {
    fn progress(&mut self, value: f64) {
        let _ = self.send(Event::Progress(value));
    }

    fn status(&mut self, text: &str) {
        let _ = self.send(Event::Status(text.to_string()));
    }
}

/// Last reported fraction and status line.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallProgress {
    pub value: f64,
    pub status: String,
}

impl Default for InstallProgress {
    fn default() -> Self {
        Self {
            value: 0.0,
            status: "Waiting...".to_string(),
        }
    }
}

impl Reporter for InstallProgress {
    fn progress(&mut self, value: f64) {
        self.value = value.clamp(0.0, 1.0);
    }

    fn status(&mut self, text: &str) {
        self.status = text.to_string();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Install,
    Uninstall,
}

impl From<Action> for Operation {
    fn from(action: Action) -> Self {
        match action {
            Action::Install | Action::Update => Operation::Install,
            Action::Uninstall => Operation::Uninstall,
        }
    }
}

pub struct Lifecycle {
    paths: PlatformPaths,
    payload: String,
    icon_name: String,
}

impl Lifecycle {
    pub fn new(paths: PlatformPaths, payload: impl Into<String>, icon_name: impl Into<String>) -> Self {
        Self {
            paths,
            payload: payload.into(),
            icon_name: icon_name.into(),
        }
    }

    pub fn paths(&self) -> &PlatformPaths {
        &self.paths
    }

    pub fn state(&self) -> InstallationState {
        state::detect(&self.paths.install_dir)
    }

    pub fn run(&self, op: Operation, reporter: &mut dyn Reporter) -> Result<(), OperationError> {
        match op {
            Operation::Install => self.install(reporter),
            Operation::Uninstall => self.uninstall(reporter),
        }
    }

    /// Install and update share this path; existing files are overwritten.
    pub fn install(&self, reporter: &mut dyn Reporter) -> Result<(), OperationError> {
        self.install_with(reporter, shortcuts::run_script_host)
    }

    pub fn install_with(
        &self,
        reporter: &mut dyn Reporter,
        exec: impl FnMut(&mut Command) -> Result<ExitStatus>,
    ) -> Result<(), OperationError> {
        reporter.progress(0.0);
        info!(install_dir = %self.paths.install_dir.display(), "starting install");

        if let Err(err) = self.unpack(reporter) {
            return Err(failed(reporter, Step::Install, err));
        }
        if let Err(err) = shortcuts::create_shortcut_with(&self.paths, &self.icon_name, exec) {
            return Err(failed(reporter, Step::Shortcut, err));
        }

        reporter.progress(1.0);
        reporter.status(STATUS_INSTALLED);
        info!("install completed successfully");
        Ok(())
    }

    fn unpack(&self, reporter: &mut dyn Reporter) -> Result<()> {
        let install_dir = &self.paths.install_dir;
        fs_ops::create_dir_all_with_mode(install_dir, 0o700)?;
        let data = payload::decode(&self.payload)?;
        reporter.status(STATUS_INSTALLING);
        archive::extract(&data, install_dir, |value| reporter.progress(value))
    }

    /// A missing install directory is reported as a not-found error.
    pub fn uninstall(&self, reporter: &mut dyn Reporter) -> Result<(), OperationError> {
        reporter.progress(0.0);
        reporter.status(STATUS_UNINSTALLING);
        info!(install_dir = %self.paths.install_dir.display(), "starting uninstall");

        let install_dir = &self.paths.install_dir;
        if let Err(err) = fs::remove_dir_all(install_dir)
            .with_context(|| format!("remove {}", install_dir.display()))
        {
            return Err(failed(reporter, Step::Uninstall, err));
        }

        reporter.status(STATUS_REMOVING_SHORTCUT);
        if let Some(shortcut) = &self.paths.shortcut {
            if let Err(err) = shortcuts::remove_shortcut(shortcut) {
                return Err(failed(reporter, Step::Uninstall, err));
            }
        }

        reporter.progress(1.0);
        reporter.status(STATUS_UNINSTALLED);
        info!("uninstall completed successfully");
        Ok(())
    }
}

fn failed(reporter: &mut dyn Reporter, step: Step, source: anyhow::Error) -> OperationError {
    error!(?step, error = %format!("{source:#}"), "operation failed");
    reporter.status(step.failure_status());
    OperationError { step, source }
}

/// Runs `op` on its own thread. The receiver yields progress and status
/// events followed by exactly one `Event::Finished`.
pub fn spawn(
    lifecycle: Arc<Lifecycle>,
    op: Operation,
) -> Result<(thread::JoinHandle<()>, mpsc::Receiver<Event>)> {
    let (tx, rx) = mpsc::channel();
    let handle = thread::Builder::new()
        .name(format!("{op:?}").to_lowercase())
        .spawn(move || {
            let mut tx = tx;
            let result = lifecycle.run(op, &mut tx);
            let _ = tx.send(Event::Finished(result));
        })
        .context("spawn operation thread")?;
    Ok((handle, rx))
}
