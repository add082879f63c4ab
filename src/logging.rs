//! File-based tracing setup.
//!
//! Logs go to `~/.cache/toolchat/toolchat.log` so they never interleave with
//! the chat on the terminal. The filter comes from `TOOLCHAT_LOG` and
//! defaults to `warn`.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::constants::{LOG_ENV_VAR, LOG_FILENAME};

pub fn init() -> Result<()> {
    let dir = Config::cache_dir()?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(LOG_FILENAME);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install the log subscriber: {}", e))
}
