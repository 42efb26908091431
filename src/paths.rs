//! Per-user configuration directory resolution.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

/// Directory name under the platform config root.
pub const APP_DIR_NAME: &str = "note-converter";

/// Returns `$XDG_CONFIG_HOME/note-converter`, `$HOME/.config/note-converter`
/// or `%APPDATA%/note-converter`, whichever is available first.
#[must_use]
pub fn default_config_dir() -> Option<PathBuf> {
    resolve_config_dir(
        sanitize_env_path(env::var_os("XDG_CONFIG_HOME")),
        sanitize_env_path(env::var_os("HOME")),
        sanitize_env_path(env::var_os("APPDATA")),
    )
}

fn sanitize_env_path(value: Option<OsString>) -> Option<PathBuf> {
    let value = value?;
    if value.to_string_lossy().trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(value))
}

fn resolve_config_dir(
    xdg_config_home: Option<PathBuf>,
    home: Option<PathBuf>,
    app_data: Option<PathBuf>,
) -> Option<PathBuf> {
    xdg_config_home
        .map(|xdg| xdg.join(APP_DIR_NAME))
        .or_else(|| home.map(|home| home.join(".config").join(APP_DIR_NAME)))
        .or_else(|| app_data.map(|app_data| app_data.join(APP_DIR_NAME)))
}
