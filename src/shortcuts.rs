use anyhow::{bail, Context, Result};
use std::{
    io::Write,
    path::Path,
    process::{Command, ExitStatus},
};
use tracing::{debug, info, warn};

use crate::{
    fs_ops,
    paths::{PlatformPaths, ShortcutKind},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed,
    AlreadyAbsent,
}

/// Runs a shortcut script through the OS script host and waits for it.
pub fn run_script_host(cmd: &mut Command) -> Result<ExitStatus> {
    cmd.status().context("run wscript")
}

/// Creates the launcher for `paths.platform`. Shell links are produced by an
/// external script host, invoked through `exec`.
pub fn create_shortcut_with(
    paths: &PlatformPaths,
    icon_name: &str,
    exec: impl FnMut(&mut Command) -> Result<ExitStatus>,
) -> Result<()> {
    let kind = paths.platform.shortcut_kind();
    if kind == ShortcutKind::None {
        debug!(platform = ?paths.platform, "platform has no shortcuts");
        return Ok(());
    }
    let Some(location) = paths.shortcut.as_deref() else {
        bail!("no shortcut location for {:?}", paths.platform);
    };

    match kind {
        ShortcutKind::DesktopEntry => write_desktop_entry(location, paths, icon_name)?,
        ShortcutKind::ShellLink => create_shell_link(location, paths, icon_name, exec)?,
        ShortcutKind::None => {}
    }
    info!(shortcut = %location.display(), "shortcut created");
    Ok(())
}

pub fn remove_shortcut(location: &Path) -> Result<Removal> {
    if fs_ops::remove_file_if_exists(location)? {
        info!(shortcut = %location.display(), "shortcut removed");
        Ok(Removal::Removed)
    } else {
        warn!(shortcut = %location.display(), "shortcut already absent");
        Ok(Removal::AlreadyAbsent)
    }
}

pub fn desktop_entry(paths: &PlatformPaths, icon_name: &str) -> String {
    format!(
        "[Desktop Entry]\nName={}\nType=Application\nTerminal=false\nExec={}\nIcon={}",
        paths.app_name,
        paths.executable_path().display(),
        paths.install_dir.join(icon_name).display(),
    )
}

fn write_desktop_entry(location: &Path, paths: &PlatformPaths, icon_name: &str) -> Result<()> {
    let content = desktop_entry(paths, icon_name);
    fs_ops::write_bytes_atomic(location, content.as_bytes(), 0o700)
}

pub fn shell_link_script(location: &Path, paths: &PlatformPaths, icon_name: &str) -> String {
    let lnk = vbs_quote(&location.display().to_string());
    let target = vbs_quote(&paths.executable_path().display().to_string());
    let icon = vbs_quote(&paths.install_dir.join(icon_name).display().to_string());
    let description = vbs_quote(&paths.app_name);
    format!(
        "Set link = WScript.CreateObject(\"WScript.Shell\").CreateShortcut({lnk})\n\
         link.TargetPath = {target}\n\
         link.IconLocation = {icon}\n\
         link.Description = {description}\n\
         link.Save\n"
    )
}

fn create_shell_link(
    location: &Path,
    paths: &PlatformPaths,
    icon_name: &str,
    mut exec: impl FnMut(&mut Command) -> Result<ExitStatus>,
) -> Result<()> {
    if let Some(parent) = location.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create {}", parent.display()))?;
    }
    std::fs::create_dir_all(&paths.temp_dir)
        .with_context(|| format!("create {}", paths.temp_dir.display()))?;

    let mut script = tempfile::Builder::new()
        .prefix("CreateShortcut-")
        .suffix(".vbs")
        .tempfile_in(&paths.temp_dir)
        .context("create temp shortcut script")?;
    script
        .write_all(shell_link_script(location, paths, icon_name).as_bytes())
        .and_then(|()| script.flush())
        .with_context(|| format!("write {}", script.path().display()))?;

    let mut cmd = Command::new("wscript");
    cmd.arg(script.path());
    let outcome = exec(&mut cmd);

    let script_path = script.path().to_path_buf();
    if let Err(err) = script.close() {
        warn!(script = %script_path.display(), %err, "failed to remove shortcut script");
    }

    let status = outcome?;
    if !status.success() {
        bail!("failed to create shortcut (exit {:?})", status.code());
    }
    Ok(())
}

fn vbs_quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}
