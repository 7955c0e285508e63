//! Centralized path management for the gallery-cache CLI

use std::path::PathBuf;

/// The name of the application directory used across all platforms
const APP_DIR: &str = "gallery-cache";

/// The name of the configuration file
const CONFIG_FILE: &str = "config.toml";

/// Returns the path to the configuration directory
///
/// `$XDG_CONFIG_HOME/gallery-cache` when set (outside Windows), otherwise the
/// platform config directory, falling back to `.gallery-cache`.
pub fn get_config_dir() -> PathBuf {
    #[cfg(not(target_os = "windows"))]
    if let Some(xdg_config) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(xdg_config).join(APP_DIR);
    }

    dirs::config_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".gallery-cache"))
}

/// Returns the path to the configuration file
pub fn get_config_path() -> PathBuf {
    get_config_dir().join(CONFIG_FILE)
}

/// Returns the default location of the file-backed store
pub fn get_store_path() -> PathBuf {
    gallery_cache_core::config::default_store_path()
}
