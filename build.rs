use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use std::{
    fs::{self, File},
    io::{self, Cursor, Read, Write},
    path::{Path, PathBuf},
};

fn main() {
    let out_dir = std::env::var("OUT_DIR").expect("OUT_DIR not set");
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set");
    let manifest_dir = PathBuf::from(manifest_dir);
    let app_dir = manifest_dir.join("app");
    println!("cargo:rerun-if-changed={}", app_dir.display());

    let config = load_config(&manifest_dir).unwrap_or_else(|err| {
        panic!("failed to load config.toml: {err}");
    });

    if !app_dir.exists() {
        panic!("app/ directory not found; cannot embed payload");
    }

    let out_path = PathBuf::from(&out_dir).join("app_payload.b64");
    if let Err(err) = write_payload(&app_dir, &out_path) {
        panic!("failed to build payload: {err}");
    }

    if let Err(err) = write_config_rs(&PathBuf::from(&out_dir), &config) {
        panic!("failed to write config: {err}");
    }
}

fn write_payload(app_dir: &Path, out_path: &Path) -> io::Result<()> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    add_dir_recursive(app_dir, app_dir, &mut zip)?;
    let bytes = zip.finish()?.into_inner();
    fs::write(out_path, general_purpose::STANDARD.encode(bytes))
}

fn add_dir_recursive(
    root: &Path,
    dir: &Path,
    zip: &mut zip::ZipWriter<Cursor<Vec<u8>>>,
) -> io::Result<()> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<_>>()?;
    paths.sort();

    for path in paths {
        let rel = path.strip_prefix(root).unwrap_or(&path);
        let name = rel.to_string_lossy().replace('\\', "/");
        let options = zip::write::FileOptions::default().unix_permissions(mode_of(&path)?);
        if path.is_dir() {
            zip.add_directory(format!("{name}/"), options)?;
            add_dir_recursive(root, &path, zip)?;
        } else if path.is_file() {
            zip.start_file(name, options)?;
            let mut f = File::open(&path)?;
            let mut buf = Vec::new();
            f.read_to_end(&mut buf)?;
            zip.write_all(&buf)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn mode_of(path: &Path) -> io::Result<u32> {
    use std::os::unix::fs::PermissionsExt;
    Ok(fs::metadata(path)?.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn mode_of(path: &Path) -> io::Result<u32> {
    Ok(if path.is_dir() { 0o755 } else { 0o644 })
}

#[derive(Debug, Deserialize)]
struct Config {
    name: String,
    version: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
}

fn load_config(manifest_dir: &Path) -> io::Result<Config> {
    let config_path = manifest_dir.join("config.toml");
    println!("cargo:rerun-if-changed={}", config_path.display());
    let contents = fs::read_to_string(&config_path)?;
    let cfg: Config = toml::from_str(&contents)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
    if cfg.name.trim().is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "config.toml name is empty",
        ));
    }
    Ok(cfg)
}

fn write_config_rs(out_dir: &Path, config: &Config) -> io::Result<()> {
    let out_path = out_dir.join("installer_config.rs");
    let mut file = File::create(&out_path)?;
    writeln!(file, "pub const NAME: &str = {:?};", config.name.trim())?;
    writeln!(file, "pub const VERSION: &str = {:?};", config.version.trim())?;
    writeln!(file, "pub const DESCRIPTION: &str = {:?};", config.description)?;
    writeln!(file, "pub const ICON: &str = {:?};", config.icon.trim())?;
    Ok(())
}
