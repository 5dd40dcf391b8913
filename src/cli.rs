use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(
    name = "cadence",
    about = "Internet radio control plane: catalog search, song requests and now-playing",
    long_about = None,
    version = env!("CADENCE_BUILD_VERSION"),
)]
pub struct Args {
    /// Directory of music files to index
    #[arg(env = "CADENCE_MUSIC_DIR")]
    pub music_dir: Option<PathBuf>,

    /// HTTP port to listen on [default: 8080]
    #[arg(short, long, env = "CADENCE_PORT")]
    pub port: Option<u16>,

    /// Path to TOML config file (overrides default search: ./cadence.toml, ~/.config/cadence/config.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Bind to localhost only (127.0.0.1) instead of all interfaces
    #[arg(long)]
    pub localhost: bool,

    /// Seconds a client must wait between song requests [default: 30]
    #[arg(long, env = "CADENCE_REQUEST_RATE_LIMIT", value_name = "SECS")]
    pub request_rate_limit: Option<u64>,

    /// Redis URL for rate-limit counters; in-process store when unset
    #[arg(long, env = "CADENCE_REDIS_URL")]
    pub redis_url: Option<String>,

    /// Icecast base URL [default: http://127.0.0.1:8000]
    #[arg(long, env = "CADENCE_ICECAST_URL")]
    pub icecast_url: Option<String>,

    /// Icecast mountpoint to follow when the server carries several
    #[arg(long, env = "CADENCE_MOUNTPOINT")]
    pub mountpoint: Option<String>,

    /// Liquidsoap telnet address [default: 127.0.0.1:1234]
    #[arg(long, env = "CADENCE_LIQUIDSOAP_ADDR")]
    pub liquidsoap_addr: Option<String>,

    /// Seconds between now-playing polls [default: 2]
    #[arg(long, env = "CADENCE_POLL_INTERVAL", value_name = "SECS")]
    pub poll_interval: Option<u64>,

    /// Timeout in seconds for each external call and API request [default: 5]
    #[arg(long, env = "CADENCE_TIMEOUT", value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Enable development endpoints (/api/dev/skip)
    #[arg(long, env = "CADENCE_DEV_MODE")]
    pub dev_mode: bool,
}
