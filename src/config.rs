use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::constants::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_SETTLE, DEFAULT_SWITCH_IP, DEFAULT_SWITCH_PORT,
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub switch_ip: String,
    pub switch_port: u16,
    pub connect_timeout_ms: u64,
    /// Pause after each click or stick move.
    pub settle_ms: u64,
    pub log_level: String,
    /// Library used when `run --name` is given without `--library`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library: Option<PathBuf>,
}

// Default values for the config
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            switch_ip: DEFAULT_SWITCH_IP.into(),
            switch_port: DEFAULT_SWITCH_PORT,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT.as_millis() as u64,
            settle_ms: DEFAULT_SETTLE.as_millis() as u64,
            log_level: "info".into(),
            library: None,
        }
    }
}

pub fn config_path() -> io::Result<PathBuf> {
    ProjectDirs::from("com", "MacrosNX", "MacrosNX")
        .map(|d| d.config_dir().join("config.toml"))
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Could not determine config dir"))
}

impl AppConfig {
    pub fn load_from(path: &Path) -> io::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let txt = fs::read_to_string(path)?;
        toml::from_str(&txt).map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("TOML parse error: {e}"))
        })
    }

    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let toml = toml::to_string_pretty(self).map_err(io::Error::other)?;
        fs::write(path, toml)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}
