use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono_tz::Tz;
use tracing::info;

use crate::models::Config;

const DEFAULT_SESSION_FILE: &str = "session.json";

/// Load the config file, falling back to defaults when it does not exist.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        info!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let config: Config =
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(config)
}

/// Where the session file lives: `[session] path`, resolved against the
/// config file's directory, or `session.json` next to the config file.
pub fn session_path(cfg: &Config, config_path: &Path) -> PathBuf {
    let dir = config_path.parent().unwrap_or(Path::new("."));
    match cfg.session.path.as_deref() {
        Some(p) if Path::new(p).is_absolute() => PathBuf::from(p),
        Some(p) => dir.join(p),
        None => dir.join(DEFAULT_SESSION_FILE),
    }
}

pub fn timezone(cfg: &Config) -> Result<Tz> {
    cfg.display
        .timezone
        .parse::<Tz>()
        .map_err(|e| anyhow!("Invalid timezone '{}': {}", cfg.display.timezone, e))
}
