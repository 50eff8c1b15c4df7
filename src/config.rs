//! Configuration management
//!
//! Manages monitor cadence, upstream endpoints, storage locations and the
//! HTTP server binding. Stored as TOML in the platform config directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Polling cadence
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// Registration page source
    #[serde(default)]
    pub registration: RegistrationConfig,
    /// Push notification endpoint
    #[serde(default)]
    pub ntfy: NtfyConfig,
    /// User store location
    #[serde(default)]
    pub store: StoreConfig,
    /// Per-user activity journals
    #[serde(default)]
    pub journal: JournalConfig,
    /// HTTP API binding
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Seconds to sleep between polling passes
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_poll_interval() -> u64 {
    10
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
        }
    }
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationConfig {
    /// Class detail page, queried with `term_in` and `crn_in`
    #[serde(default = "default_registration_url")]
    pub base_url: String,
    #[serde(default = "default_registration_timeout")]
    pub request_timeout_secs: u64,
}

fn default_registration_url() -> String {
    "https://oscar.gatech.edu/bprod/bwckschd.p_disp_detail_sched".to_string()
}

fn default_registration_timeout() -> u64 {
    30
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            base_url: default_registration_url(),
            request_timeout_secs: default_registration_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NtfyConfig {
    #[serde(default = "default_ntfy_url")]
    pub base_url: String,
    #[serde(default = "default_ntfy_timeout")]
    pub request_timeout_secs: u64,
}

fn default_ntfy_url() -> String {
    "https://ntfy.sh".to_string()
}

fn default_ntfy_timeout() -> u64 {
    15
}

impl Default for NtfyConfig {
    fn default() -> Self {
        Self {
            base_url: default_ntfy_url(),
            request_timeout_secs: default_ntfy_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of users.yaml (defaults to the data directory)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JournalConfig {
    /// Directory for per-user log files (defaults to `<data dir>/logs`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Load configuration from an explicit path, creating it if missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .context("Failed to read config file")?;
            let config: Config = toml::from_str(&contents)
                .context("Failed to parse config file")?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let parent = path.parent()
            .context("Config path has no parent")?;

        std::fs::create_dir_all(parent)
            .context("Failed to create config directory")?;

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Resolved path of the user store
    pub fn store_path(&self) -> Result<PathBuf> {
        match &self.store.path {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join("users.yaml")),
        }
    }

    /// Resolved directory of the per-user journals
    pub fn journal_dir(&self) -> Result<PathBuf> {
        match &self.journal.dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(data_dir()?.join("logs")),
        }
    }
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    let base = directories::ProjectDirs::from("com", "seat-watch", "seat-watch")
        .context("Failed to get project directories")?;
    Ok(base.config_dir().join("config.toml"))
}

/// Get the data directory path
pub fn data_dir() -> Result<PathBuf> {
    let base = directories::ProjectDirs::from("com", "seat-watch", "seat-watch")
        .context("Failed to get project directories")?;
    Ok(base.data_dir().to_path_buf())
}

/// Show current configuration
pub fn show_config(config: &Config) -> Result<()> {
    println!("Seat Watch Configuration");
    println!("========================");
    println!("Poll interval:     {}s", config.monitor.poll_interval_secs);
    println!("Registration page: {}", config.registration.base_url);
    println!("ntfy server:       {}", config.ntfy.base_url);
    println!("User store:        {}", config.store_path()?.display());
    println!("Journal directory: {}", config.journal_dir()?.display());
    println!("API server:        http://{}:{}", config.server.host, config.server.port);
    Ok(())
}
