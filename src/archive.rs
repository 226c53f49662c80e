use anyhow::{Context, Result};
use std::{
    fs,
    io::{self, Cursor},
    path::Path,
};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("malformed archive")]
    Malformed(#[source] zip::result::ZipError),
    #[error("invalid path in archive: {0}")]
    UnsafeEntry(String),
}

/// Unpacks every entry of a zip archive under `dest_root`.
///
/// `on_progress` receives `(index + 1) / total` after each entry, including one
/// that failed, so callers see how far extraction got before an error.
pub fn extract(
    archive: &[u8],
    dest_root: &Path,
    mut on_progress: impl FnMut(f64),
) -> Result<()> {
    let mut zip = zip::ZipArchive::new(Cursor::new(archive)).map_err(ArchiveError::Malformed)?;
    let total = zip.len();
    info!(entries = total, dest = %dest_root.display(), "extracting archive");

    if total == 0 {
        on_progress(1.0);
        return Ok(());
    }

    for i in 0..total {
        let result = extract_entry(&mut zip, i, dest_root);
        on_progress((i + 1) as f64 / total as f64);
        result?;
    }

    info!(entries = total, "archive extracted");
    Ok(())
}

fn extract_entry(
    zip: &mut zip::ZipArchive<Cursor<&[u8]>>,
    index: usize,
    dest_root: &Path,
) -> Result<()> {
    let mut entry = zip.by_index(index).map_err(ArchiveError::Malformed)?;
    let rel = entry
        .enclosed_name()
        .map(Path::to_path_buf)
        .ok_or_else(|| ArchiveError::UnsafeEntry(entry.name().to_string()))?;
    let out_path = dest_root.join(rel);
    let mode = entry.unix_mode();

    if entry.is_dir() {
        debug!(path = %out_path.display(), "create directory");
        fs::create_dir_all(&out_path)
            .with_context(|| format!("create {}", out_path.display()))?;
        return apply_mode(&out_path, mode);
    }

    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }

    // A previous run may have left a read-only file here; replace it rather
    // than truncate it.
    match fs::symlink_metadata(&out_path) {
        Ok(meta) if !meta.is_dir() => fs::remove_file(&out_path)
            .with_context(|| format!("remove {}", out_path.display()))?,
        _ => {}
    }

    debug!(path = %out_path.display(), size = entry.size(), "write file");
    let mut out_file = fs::File::create(&out_path)
        .with_context(|| format!("create {}", out_path.display()))?;
    io::copy(&mut entry, &mut out_file)
        .with_context(|| format!("write {}", out_path.display()))?;
    drop(out_file);
    apply_mode(&out_path, mode)
}

#[cfg(unix)]
fn apply_mode(path: &Path, mode: Option<u32>) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let Some(mode) = mode else {
        return Ok(());
    };
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))
        .with_context(|| format!("set permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: Option<u32>) -> Result<()> {
    Ok(())
}
