use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::hid::locator::{default_allow_list, DeviceIdentity};
use crate::hid::status::{ProtocolVariant, BATTERY_REQUEST};

const APP_DIR: &str = "headset-battery";
const CONFIG_FILE: &str = "config.toml";

/// Longest report the request packet may be
pub const MAX_REQUEST_LEN: usize = 64;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub poll_interval: u64,         // Seconds between polls
    pub read_timeout_ms: u64,       // Upper bound on waiting for one response
    pub cycle_timeout_ms: u64,      // Upper bound on one whole poll
    pub variant: ProtocolVariant,   // Firmware decoding table
    pub request_packet: Vec<u8>,    // Sent as-is, report ID first
    pub devices: Vec<DeviceIdentity>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            poll_interval: 10,
            read_timeout_ms: 2000,
            cycle_timeout_ms: 8000,
            variant: ProtocolVariant::A,
            request_packet: BATTERY_REQUEST.to_vec(),
            devices: default_allow_list(),
        }
    }
}

pub fn get_config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR))
}

pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.poll_interval < 1 {
        return Err(Error::Config("poll_interval must be at least 1 second".into()));
    }
    if config.poll_interval > 3600 {
        return Err(Error::Config("poll_interval must not exceed 3600 seconds".into()));
    }
    if !(100..=10_000).contains(&config.read_timeout_ms) {
        return Err(Error::Config(
            "read_timeout_ms must be between 100 and 10000".into(),
        ));
    }
    if config.read_timeout_ms >= config.poll_interval * 1000 {
        return Err(Error::Config(
            "read_timeout_ms must be shorter than poll_interval".into(),
        ));
    }
    if config.cycle_timeout_ms < config.read_timeout_ms
        || config.cycle_timeout_ms >= config.poll_interval * 1000
    {
        return Err(Error::Config(
            "cycle_timeout_ms must be between read_timeout_ms and poll_interval".into(),
        ));
    }
    if config.request_packet.is_empty() || config.request_packet.len() > MAX_REQUEST_LEN {
        return Err(Error::Config(format!(
            "request_packet must be 1 to {} bytes",
            MAX_REQUEST_LEN
        )));
    }
    if config.devices.is_empty() {
        return Err(Error::Config("devices must list at least one headset".into()));
    }

    let mut seen = HashSet::new();
    for device in &config.devices {
        if device.vendor_id == 0 {
            return Err(Error::Config(format!("{} has a zero vendor_id", device)));
        }
        if !seen.insert(*device) {
            return Err(Error::Config(format!("{} is listed twice", device)));
        }
    }

    Ok(())
}

/// Loads `config.toml` from the user config directory, writing the defaults
/// on first run.
pub fn load_config() -> Result<AppConfig> {
    load_config_from(&get_config_dir()?.join(CONFIG_FILE))
}

pub fn load_config_from(config_path: &Path) -> Result<AppConfig> {
    let io_err = |source| Error::ConfigIo {
        path: config_path.to_path_buf(),
        source,
    };

    if !config_path.exists() {
        if let Some(dir) = config_path.parent() {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
        let default_config = AppConfig::default();
        let config_str = toml::to_string(&default_config)?;
        fs::write(config_path, config_str).map_err(io_err)?;
        info!("Created default config file at {:?}", config_path);
        return Ok(default_config);
    }

    let config_str = fs::read_to_string(config_path).map_err(io_err)?;
    let config: AppConfig = toml::from_str(&config_str).map_err(|source| Error::ConfigParse {
        path: config_path.to_path_buf(),
        source,
    })?;
    validate_config(&config)?;
    Ok(config)
}
