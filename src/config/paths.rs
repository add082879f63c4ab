//! XDG path resolution for toolchat's config and cache directories.

use anyhow::Result;
use std::path::PathBuf;

use super::types::Config;

impl Config {
    /// `~/.config/toolchat/` on Linux.
    pub fn config_dir() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join(crate::constants::APP_NAME);
        Ok(dir)
    }

    /// `~/.cache/toolchat/` on Linux. Holds readline history and the log file.
    pub fn cache_dir() -> Result<PathBuf> {
        let dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine cache directory"))?
            .join(crate::constants::APP_NAME);
        Ok(dir)
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(crate::constants::CONFIG_FILENAME))
    }

    /// Manifest directory that is always scanned, `~/.config/toolchat/tools/`.
    pub fn default_tools_dir() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("tools"))
    }
}
