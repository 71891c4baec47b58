//! Configuration file loading and root folder resolution

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root (data) folder
pub const ROOT_FOLDER_ENV: &str = "MORA_ROOT_FOLDER";

/// Environment variable pointing at a TOML config file
pub const CONFIG_PATH_ENV: &str = "MORA_CONFIG";

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config value
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml_value: Option<&Path>,
) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = toml_value {
        return path.to_path_buf();
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/mora (or /var/lib/mora for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("mora"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/mora"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/mora
        dirs::data_dir()
            .map(|d| d.join("mora"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/mora"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\mora
        dirs::data_local_dir()
            .map(|d| d.join("mora"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\mora"))
    } else {
        PathBuf::from("./mora_data")
    }
}

/// Locate the TOML config file for a module
///
/// Priority: explicit path → `MORA_CONFIG` → `<config dir>/mora/<module>.toml`.
/// Returns `None` when no candidate exists on disk.
pub fn locate_config_file(explicit: Option<&Path>, module_name: &str) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    let user_config = dirs::config_dir()
        .map(|d| d.join("mora").join(format!("{}.toml", module_name)));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/mora").join(format!("{}.toml", module_name));
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Read and parse a TOML file
pub fn load_toml_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load TOML config, falling back to defaults when no file is available
///
/// A missing file is not an error (warning + defaults). An explicitly
/// requested file that fails to parse is.
pub fn load_toml_or_default<T: DeserializeOwned + Default>(
    explicit: Option<&Path>,
    module_name: &str,
) -> Result<T> {
    match locate_config_file(explicit, module_name) {
        Some(path) if path.exists() => {
            info!("Loading configuration from {}", path.display());
            load_toml_file(&path)
        }
        Some(path) => {
            if explicit.is_some() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            warn!(
                "Config file {} not found - using built-in defaults",
                path.display()
            );
            Ok(T::default())
        }
        None => {
            info!("No config file found - using built-in defaults");
            Ok(T::default())
        }
    }
}
