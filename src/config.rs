use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub sampler: SamplerConfig,
    pub console: ConsoleConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub push_interval_ms: u64,
    /// Zero disables the timeout on the first read from a client.
    pub read_timeout_ms: u64,
    pub static_root: PathBuf,
    pub index_file: String,
    pub json_layout: String,
    pub push_framing: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "0.0.0.0".to_string(),
            port: 8080,
            push_interval_ms: 1000,
            read_timeout_ms: 5000,
            static_root: PathBuf::from("web"),
            index_file: "index.html".to_string(),
            json_layout: "bytes".to_string(),
            push_framing: "raw".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    pub max_processes: usize,
    pub min_working_set_mb: Option<u64>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig {
            max_processes: 1024,
            min_working_set_mb: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub refresh_rate_ms: u64,
    pub max_processes: usize,
    pub min_working_set_mb: Option<u64>,
    pub bar_width: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        ConsoleConfig {
            refresh_rate_ms: 1000,
            max_processes: 10,
            min_working_set_mb: Some(50),
            bar_width: 50,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: String,
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            format: "text".to_string(),
            filter: "info".to_string(),
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("memtrack").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
        Err(_) => Config::default(),
    }
}
