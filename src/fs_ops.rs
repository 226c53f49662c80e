use anyhow::{Context, Result};
use std::{
    fs,
    io::{self, Write},
    path::Path,
};

/// Stages `bytes` in a temp file next to `dest` and renames it over `dest`,
/// so readers never see a half-written file. `mode` is applied before the
/// rename on unix. The staged file is dropped on every error path.
pub fn write_bytes_atomic(dest: &Path, bytes: &[u8], mode: u32) -> Result<()> {
    let parent = dest.parent().context("dest has no parent")?;
    fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    let mut tmp = tempfile::Builder::new()
        .prefix(".desk-installer-")
        .tempfile_in(parent)
        .with_context(|| format!("create temp file in {}", parent.display()))?;
    tmp.write_all(bytes)
        .and_then(|()| tmp.flush())
        .with_context(|| format!("write {}", tmp.path().display()))?;
    set_mode(tmp.path(), mode)?;
    tmp.persist(dest)
        .map_err(|err| err.error)
        .with_context(|| format!("rename into {}", dest.display()))?;
    Ok(())
}

/// Creates `dir` and its parents; on unix new directories get `mode`.
pub fn create_dir_all_with_mode(dir: &Path, mode: u32) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;
    builder
        .create(dir)
        .with_context(|| format!("create {}", dir.display()))
}

/// Returns `Ok(false)` when there was nothing to remove.
pub fn remove_file_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err).with_context(|| format!("remove {}", path.display())),
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .with_context(|| format!("set permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
