use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

/// Target platform families the installer knows how to lay out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Windows,
    Linux,
    Other,
}

/// How a platform represents an application launcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutKind {
    None,
    DesktopEntry,
    ShellLink,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(windows) {
            Platform::Windows
        } else if cfg!(target_os = "linux") {
            Platform::Linux
        } else {
            Platform::Other
        }
    }

    pub fn shortcut_kind(self) -> ShortcutKind {
        match self {
            Platform::Linux => ShortcutKind::DesktopEntry,
            Platform::Windows => ShortcutKind::ShellLink,
            Platform::MacOs | Platform::Other => ShortcutKind::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformPaths {
    pub platform: Platform,
    pub username: String,
    pub app_name: String,
    pub temp_dir: PathBuf,
    pub install_dir: PathBuf,
    /// `None` when the platform has no launcher concept.
    pub shortcut: Option<PathBuf>,
    pub executable: String,
}

impl PlatformPaths {
    pub fn resolve(platform: Platform, username: &str, app_name: &str, cwd: &Path) -> Self {
        Self {
            platform,
            username: username.to_string(),
            app_name: app_name.to_string(),
            temp_dir: temp_dir(platform, username),
            install_dir: install_dir(platform, username, app_name, cwd),
            shortcut: shortcut_path(platform, username, app_name),
            executable: executable_name(platform, app_name),
        }
    }

    /// Resolves paths for the running process: OS account, compile target
    /// and working directory.
    pub fn current(app_name: &str) -> Result<Self> {
        if app_name.is_empty() {
            bail!("app_name is empty");
        }
        let username = resolve_username()?;
        let cwd = std::env::current_dir().context("current_dir")?;
        Ok(Self::resolve(Platform::current(), &username, app_name, &cwd))
    }

    pub fn executable_path(&self) -> PathBuf {
        self.install_dir.join(&self.executable)
    }
}

/// Looks up the current OS account name.
pub fn resolve_username() -> Result<String> {
    let raw = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .context("neither USER nor USERNAME is set")?;
    let name = normalize_username(&raw);
    if name.is_empty() {
        bail!("current user name is empty");
    }
    Ok(name.to_string())
}

/// Windows reports `HOST\user`; keep only the part after the last backslash.
pub fn normalize_username(raw: &str) -> &str {
    match raw.rfind('\\') {
        Some(idx) => &raw[idx + 1..],
        None => raw,
    }
}

pub fn temp_dir(platform: Platform, username: &str) -> PathBuf {
    match platform {
        Platform::MacOs => PathBuf::from("/tmp/"),
        Platform::Windows => PathBuf::from(format!("C:/Users/{username}/AppData/Local/Temp/")),
        Platform::Linux | Platform::Other => PathBuf::from(format!("/home/{username}/.cache/")),
    }
}

pub fn install_dir(platform: Platform, username: &str, app_name: &str, cwd: &Path) -> PathBuf {
    match platform {
        Platform::MacOs => PathBuf::from(format!("/Applications/{app_name}/")),
        Platform::Windows => {
            PathBuf::from(format!("C:/Users/{username}/AppData/Local/{app_name}/"))
        }
        Platform::Linux => {
            PathBuf::from(format!("/home/{username}/.local/share/{app_name}/"))
        }
        Platform::Other => cwd.join(format!("{app_name}/")),
    }
}

pub fn shortcut_path(platform: Platform, username: &str, app_name: &str) -> Option<PathBuf> {
    match platform.shortcut_kind() {
        ShortcutKind::DesktopEntry => Some(PathBuf::from(format!(
            "/home/{username}/.local/share/applications/{}.desktop",
            app_name.to_lowercase()
        ))),
        ShortcutKind::ShellLink => Some(PathBuf::from(format!(
            "C:/Users/{username}/AppData/Roaming/Microsoft/Windows/Start Menu/Programs/{app_name}.lnk"
        ))),
        ShortcutKind::None => None,
    }
}

pub fn executable_name(platform: Platform, app_name: &str) -> String {
    match platform {
        Platform::Windows => format!("{app_name}.exe"),
        _ => app_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Platform; 4] = [
        Platform::MacOs,
        Platform::Windows,
        Platform::Linux,
        Platform::Other,
    ];

    #[test]
    fn normalize_strips_host_prefix() {
        assert_eq!(normalize_username("HOST\\alice"), "alice");
        assert_eq!(normalize_username("DOMAIN\\HOST\\bob"), "bob");
        assert_eq!(normalize_username("alice"), "alice");
    }

    #[test]
    fn install_dir_per_platform() {
        let cwd = PathBuf::from("/work");
        assert_eq!(
            install_dir(Platform::MacOs, "alice", "OpenRQ", &cwd),
            PathBuf::from("/Applications/OpenRQ/")
        );
        assert_eq!(
            install_dir(Platform::Windows, "alice", "OpenRQ", &cwd),
            PathBuf::from("C:/Users/alice/AppData/Local/OpenRQ/")
        );
        assert_eq!(
            install_dir(Platform::Linux, "alice", "OpenRQ", &cwd),
            PathBuf::from("/home/alice/.local/share/OpenRQ/")
        );
        let other = install_dir(Platform::Other, "alice", "OpenRQ", &cwd);
        assert_eq!(other.to_string_lossy(), "/work/OpenRQ/");
    }

    #[test]
    fn every_install_dir_ends_with_separator() {
        let cwd = PathBuf::from("/work");
        for platform in ALL {
            let dir = install_dir(platform, "alice", "OpenRQ", &cwd);
            assert!(dir.to_string_lossy().ends_with("OpenRQ/"), "{platform:?}: {dir:?}");
        }
    }

    static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

    fn restore_env(key: &str, value: Option<std::ffi::OsString>) {
        match value {
            Some(v) => std::env::set_var(key, v),
            None => std::env::remove_var(key),
        }
    }

    #[test]
    fn resolve_username_reads_user_then_username() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let prev_user = std::env::var_os("USER");
        let prev_username = std::env::var_os("USERNAME");

        std::env::set_var("USER", "HOST\\alice");
        std::env::set_var("USERNAME", "ignored");
        let from_user = resolve_username();

        std::env::remove_var("USER");
        std::env::set_var("USERNAME", "bob");
        let from_username = resolve_username();

        std::env::set_var("USER", "HOST\\");
        let empty = resolve_username();

        std::env::remove_var("USER");
        std::env::remove_var("USERNAME");
        let missing = resolve_username();

        restore_env("USER", prev_user);
        restore_env("USERNAME", prev_username);

        assert_eq!(from_user.unwrap(), "alice");
        assert_eq!(from_username.unwrap(), "bob");
        assert!(empty.unwrap_err().to_string().contains("current user name is empty"));
        assert!(missing
            .unwrap_err()
            .to_string()
            .contains("neither USER nor USERNAME is set"));
    }

    #[test]
    fn temp_dir_per_platform() {
        assert_eq!(temp_dir(Platform::MacOs, "alice"), PathBuf::from("/tmp/"));
        assert_eq!(
            temp_dir(Platform::Windows, "alice"),
            PathBuf::from("C:/Users/alice/AppData/Local/Temp/")
        );
        assert_eq!(
            temp_dir(Platform::Linux, "alice"),
            PathBuf::from("/home/alice/.cache/")
        );
        assert_eq!(temp_dir(Platform::Other, "alice"), temp_dir(Platform::Linux, "alice"));
    }

    #[test]
    fn shortcut_only_where_supported() {
        assert_eq!(
            shortcut_path(Platform::Linux, "alice", "OpenRQ"),
            Some(PathBuf::from("/home/alice/.local/share/applications/openrq.desktop"))
        );
        assert_eq!(
            shortcut_path(Platform::Windows, "alice", "OpenRQ"),
            Some(PathBuf::from(
                "C:/Users/alice/AppData/Roaming/Microsoft/Windows/Start Menu/Programs/OpenRQ.lnk"
            ))
        );
        assert_eq!(shortcut_path(Platform::MacOs, "alice", "OpenRQ"), None);
        assert_eq!(shortcut_path(Platform::Other, "alice", "OpenRQ"), None);
    }

    #[test]
    fn executable_gets_exe_on_windows_only() {
        assert_eq!(executable_name(Platform::Windows, "OpenRQ"), "OpenRQ.exe");
        for platform in [Platform::MacOs, Platform::Linux, Platform::Other] {
            assert_eq!(executable_name(platform, "OpenRQ"), "OpenRQ");
        }
    }

    #[test]
    fn resolve_is_pure() {
        let cwd = PathBuf::from("/work");
        for platform in ALL {
            for user in ["alice", "bob.smith", "x"] {
                let a = PlatformPaths::resolve(platform, user, "OpenRQ", &cwd);
                let b = PlatformPaths::resolve(platform, user, "OpenRQ", &cwd);
                assert_eq!(a, b);
                let install = a.install_dir.to_string_lossy().to_string();
                assert!(install.contains("OpenRQ"));
                if matches!(platform, Platform::Windows | Platform::Linux) {
                    assert!(install.contains(user));
                    assert!(a.temp_dir.to_string_lossy().contains(user));
                }
            }
        }
    }

    #[test]
    fn executable_path_joins_install_dir() {
        let paths = PlatformPaths::resolve(Platform::Linux, "alice", "OpenRQ", Path::new("/"));
        assert_eq!(
            paths.executable_path(),
            PathBuf::from("/home/alice/.local/share/OpenRQ/OpenRQ")
        );
    }
}
