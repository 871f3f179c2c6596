use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::store::write_atomic;

pub const CONFIG_FILE: &str = "config.json";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GateConfig {
    pub version: u32,

    #[serde(default = "default_app_name")]
    pub app_name: String,

    #[serde(default = "default_app_version")]
    pub app_version: String,

    #[serde(default = "default_device_name")]
    pub device_name: String,

    /// Generated on first load when empty.
    #[serde(default)]
    pub device_id: String,

    /// Servers reporting an older version resolve to `ServerUpdateNeeded`.
    #[serde(default = "default_min_server_version")]
    pub min_server_version: String,

    /// Prefix stripped from every navigated path (e.g. `/web`).
    #[serde(default)]
    pub base_path: String,

    #[serde(default = "default_true")]
    pub enable_auto_login: bool,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_forced_logout_delay_ms")]
    pub forced_logout_delay_ms: u64,
}

fn default_app_name() -> String {
    "navgate".to_string()
}

fn default_app_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_device_name() -> String {
    "navgate".to_string()
}

fn default_min_server_version() -> String {
    "10.0.0".to_string()
}

fn default_true() -> bool {
    true
}

fn default_request_timeout_ms() -> u64 {
    20_000
}

fn default_forced_logout_delay_ms() -> u64 {
    100
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            version: 1,
            app_name: default_app_name(),
            app_version: default_app_version(),
            device_name: default_device_name(),
            device_id: String::new(),
            min_server_version: default_min_server_version(),
            base_path: String::new(),
            enable_auto_login: true,
            request_timeout_ms: default_request_timeout_ms(),
            forced_logout_delay_ms: default_forced_logout_delay_ms(),
        }
    }
}

impl GateConfig {
    /// Read `config.json` from `dir`, creating it (with a fresh device id) if missing.
    pub fn load_or_init(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        let mut cfg = if path.exists() {
            let bytes = fs::read(&path).context("read config.json")?;
            serde_json::from_slice::<GateConfig>(&bytes).context("parse config.json")?
        } else {
            GateConfig::default()
        };
        if cfg.version != 1 {
            anyhow::bail!("unsupported config version {}", cfg.version);
        }

        if cfg.device_id.is_empty() || !path.exists() {
            if cfg.device_id.is_empty() {
                cfg.device_id = generate_device_id()?;
            }
            fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
            cfg.write(dir)?;
        }
        Ok(cfg)
    }

    pub fn write(&self, dir: &Path) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(self).context("serialize config")?;
        write_atomic(&dir.join(CONFIG_FILE), &bytes).context("write config.json")?;
        Ok(())
    }

    /// Authorization header value sent with every request.
    pub fn authorization_header(&self, token: Option<&str>) -> String {
        let mut value = format!(
            "MediaBrowser Client=\"{}\", Device=\"{}\", DeviceId=\"{}\", Version=\"{}\"",
            self.app_name, self.device_name, self.device_id, self.app_version
        );
        if let Some(token) = token {
            value.push_str(&format!(", Token=\"{}\"", token));
        }
        value
    }
}

pub fn generate_device_id() -> Result<String> {
    let mut bytes = [0u8; 16];
    getrandom::getrandom(&mut bytes).map_err(|e| anyhow::anyhow!("generate device id: {}", e))?;
    Ok(bytes.iter().map(|b| format!("{:02x}", b)).collect())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
