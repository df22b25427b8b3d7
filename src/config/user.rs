//! User configuration loading for ghostwire.
//!
//! User config location: $XDG_CONFIG_HOME/ghostwire/ghostwire.toml
//! Fallback: the platform config dir reported by `dirs`.

use std::fs;
use std::path::PathBuf;

use super::GhostSettings;
use super::defaults::CONFIG_FILE_NAME;
use crate::error::{GhostError, GhostResult};

/// Returns the path to the user configuration file.
///
/// 1. If $XDG_CONFIG_HOME is set: $XDG_CONFIG_HOME/ghostwire/ghostwire.toml
/// 2. Otherwise: `dirs::config_dir()`/ghostwire/ghostwire.toml
///
/// Returns None if no config directory can be determined.
pub fn user_config_path() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(dirs::config_dir)?;
    Some(base.join("ghostwire").join(CONFIG_FILE_NAME))
}

/// Load the user config. `Ok(None)` means there is no file, which is fine.
pub fn load_user_config() -> GhostResult<Option<GhostSettings>> {
    let Some(path) = user_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(&path)?;
    toml::from_str(&contents)
        .map(Some)
        .map_err(|err| GhostError::config(format!("{}: {}", path.display(), err)))
}
