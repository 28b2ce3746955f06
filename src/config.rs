use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::breaker::{self, BreakerConfig};
use crate::error::{ErrorCode, TodoError};

pub const CONFIG_FILE: &str = "config.json";
pub const DEFAULT_HOME: &str = ".todo";
pub const DEFAULT_LOG_FILTER: &str = "warn";

pub const ENV_HOME: &str = "TODO_HOME";
pub const ENV_LOG: &str = "TODO_LOG";
pub const ENV_BREAKER_THRESHOLD: &str = "TODO_BREAKER_THRESHOLD";
pub const ENV_BREAKER_COOLDOWN_SECS: &str = "TODO_BREAKER_COOLDOWN_SECS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerSettings {
    pub threshold: u32,
    pub cooldown_secs: u64,
    pub half_open_probes: u32,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            threshold: breaker::DEFAULT_THRESHOLD,
            cooldown_secs: breaker::DEFAULT_COOLDOWN.as_secs(),
            half_open_probes: breaker::DEFAULT_HALF_OPEN_PROBES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub breaker: BreakerSettings,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            breaker: BreakerSettings::default(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

/// Data directory: the `--home` flag, then `TODO_HOME`, then `./.todo`.
pub fn resolve_home(flag: Option<&Path>) -> PathBuf {
    if let Some(home) = flag {
        return home.to_path_buf();
    }
    env::var_os(ENV_HOME)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_HOME))
}

pub fn config_path(home: &Path) -> PathBuf {
    home.join(CONFIG_FILE)
}

impl Config {
    /// Reads `config.json` under `home` if present, then applies env overrides.
    pub fn load(home: &Path) -> Result<Self, TodoError> {
        let path = config_path(home);
        let mut config = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                TodoError::wrap(e, ErrorCode::InvalidArgument, format!("invalid {}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Config::default(),
            Err(e) => return Err(e.into()),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Writes this config to `home` unless a config file already exists.
    pub fn write_if_missing(&self, home: &Path) -> Result<PathBuf, TodoError> {
        let path = config_path(home);
        if !path.exists() {
            fs::create_dir_all(home)?;
            fs::write(&path, serde_json::to_string_pretty(self)?)?;
        }
        Ok(path)
    }

    pub fn breaker_config(&self) -> BreakerConfig {
        BreakerConfig {
            threshold: self.breaker.threshold,
            cooldown: Duration::from_secs(self.breaker.cooldown_secs),
            half_open_probes: self.breaker.half_open_probes,
        }
    }

    fn apply_env(&mut self) -> Result<(), TodoError> {
        if let Some(v) = env_parse(ENV_BREAKER_THRESHOLD)? {
            self.breaker.threshold = v;
        }
        if let Some(v) = env_parse(ENV_BREAKER_COOLDOWN_SECS)? {
            self.breaker.cooldown_secs = v;
        }
        Ok(())
    }
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>, TodoError> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| TodoError::invalid_argument(format!("invalid {key}: {raw}"))),
        _ => Ok(None),
    }
}
