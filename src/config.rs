include!(concat!(env!("OUT_DIR"), "/installer_config.rs"));

/// Icon file name inside the install directory. Falls back to the
/// executable's base name when `config.toml` leaves `icon` empty.
pub fn icon_name() -> &'static str {
    if ICON.is_empty() {
        NAME
    } else {
        ICON
    }
}
