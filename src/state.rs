use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallationState {
    NotInstalled,
    Installed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Install,
    Update,
    Uninstall,
}

impl Action {
    pub fn label(self) -> &'static str {
        match self {
            Action::Install => "install",
            Action::Update => "update",
            Action::Uninstall => "uninstall",
        }
    }
}

impl InstallationState {
    /// Actions the front end offers in this state.
    pub fn actions(self) -> &'static [Action] {
        match self {
            InstallationState::NotInstalled => &[Action::Install],
            InstallationState::Installed => &[Action::Uninstall, Action::Update],
        }
    }
}

/// Derived from the filesystem on every call; never persisted.
pub fn detect(install_dir: &Path) -> InstallationState {
    if install_dir.exists() {
        InstallationState::Installed
    } else {
        InstallationState::NotInstalled
    }
}
