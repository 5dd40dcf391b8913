use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_REQUEST_RATE_LIMIT_SECS: u64 = 30;
const DEFAULT_ICECAST_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_LIQUIDSOAP_ADDR: &str = "127.0.0.1:1234";
const DEFAULT_LIQUIDSOAP_QUEUE: &str = "request";
const DEFAULT_LIQUIDSOAP_OUTPUT: &str = "cadence1";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;
const DEFAULT_TIMEOUT_SECS: u64 = 5;

#[derive(Deserialize, Default, Debug)]
pub struct FileConfig {
    pub port: Option<u16>,
    pub localhost: Option<bool>,
    pub music_dir: Option<PathBuf>,
    pub request_rate_limit: Option<u64>,
    pub redis_url: Option<String>,
    pub icecast_url: Option<String>,
    pub mountpoint: Option<String>,
    pub liquidsoap_addr: Option<String>,
    pub liquidsoap_queue: Option<String>,
    pub liquidsoap_output: Option<String>,
    pub poll_interval_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub dev_mode: Option<bool>,
    pub version: Option<String>,
}

#[derive(Debug)]
pub struct Config {
    pub port: u16,
    pub localhost: bool,
    pub music_dir: Option<PathBuf>,
    pub request_rate_limit: Duration,
    pub redis_url: Option<String>,
    pub icecast_url: String,
    pub mountpoint: Option<String>,
    pub liquidsoap_addr: String,
    pub liquidsoap_queue: String,
    pub liquidsoap_output: String,
    pub poll_interval: Duration,
    pub timeout: Duration,
    pub dev_mode: bool,
    pub version: String,
}

impl Config {
    /// CLI (and its environment variables) over TOML over defaults.
    pub fn resolve(file: Option<FileConfig>, args: &crate::cli::Args) -> Self {
        let file = file.unwrap_or_default();
        Config {
            port: args.port.or(file.port).unwrap_or(DEFAULT_PORT),
            localhost: args.localhost || file.localhost.unwrap_or(false),
            music_dir: args.music_dir.clone().or(file.music_dir),
            request_rate_limit: Duration::from_secs(
                args.request_rate_limit
                    .or(file.request_rate_limit)
                    .unwrap_or(DEFAULT_REQUEST_RATE_LIMIT_SECS),
            ),
            redis_url: args.redis_url.clone().or(file.redis_url),
            icecast_url: args
                .icecast_url
                .clone()
                .or(file.icecast_url)
                .unwrap_or_else(|| DEFAULT_ICECAST_URL.to_string()),
            mountpoint: args.mountpoint.clone().or(file.mountpoint),
            liquidsoap_addr: args
                .liquidsoap_addr
                .clone()
                .or(file.liquidsoap_addr)
                .unwrap_or_else(|| DEFAULT_LIQUIDSOAP_ADDR.to_string()),
            liquidsoap_queue: file
                .liquidsoap_queue
                .unwrap_or_else(|| DEFAULT_LIQUIDSOAP_QUEUE.to_string()),
            liquidsoap_output: file
                .liquidsoap_output
                .unwrap_or_else(|| DEFAULT_LIQUIDSOAP_OUTPUT.to_string()),
            poll_interval: Duration::from_secs(
                args.poll_interval
                    .or(file.poll_interval_secs)
                    .unwrap_or(DEFAULT_POLL_INTERVAL_SECS)
                    .max(1),
            ),
            timeout: Duration::from_secs(
                args.timeout
                    .or(file.timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS)
                    .max(1),
            ),
            dev_mode: args.dev_mode || file.dev_mode.unwrap_or(false),
            version: file
                .version
                .unwrap_or_else(|| env!("CADENCE_BUILD_VERSION").to_string()),
        }
    }
}

pub fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_owned());
    }
    let cwd_config = PathBuf::from("cadence.toml");
    if cwd_config.exists() {
        return Some(cwd_config);
    }
    if let Some(config_dir) = dirs::config_dir() {
        let xdg_config = config_dir.join("cadence").join("config.toml");
        if xdg_config.exists() {
            return Some(xdg_config);
        }
    }
    None
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

pub fn load_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: FileConfig = toml::from_str(&content)?;
    Ok(config)
}
