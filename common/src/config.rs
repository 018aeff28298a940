use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::network::endpoint::DNS_PORT;

pub const DEFAULT_COUNTRY: &str = "US";
pub const DEFAULT_DB_PATH: &str = "./GeoLite2-Country.mmdb";
/// Environment variable that takes precedence over the database path flag.
pub const DB_PATH_ENV: &str = "MMDB";

const QUEUE_DEPTH_PER_WORKER: usize = 4;

/// How the output stage renders results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// One matching domain per line.
    #[default]
    Default,
    /// One JSON object per processed record, matching or not.
    Json,
    /// Same results as [`OutputMode::Default`], plus progress on stdout.
    Verbose,
}

impl OutputMode {
    pub fn is_verbose(self) -> bool {
        self == OutputMode::Verbose
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputMode::Default => "default",
            OutputMode::Json => "json",
            OutputMode::Verbose => "verbose",
        };
        f.write_str(name)
    }
}

/// Run-wide settings. Built once before any worker starts and only read afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    /// ISO 3166 alpha-2 code, compared case-sensitively against the database.
    pub country: String,
    pub db_path: PathBuf,
    pub resolvers: Vec<SocketAddr>,
    /// Worker count for both the resolution and geo stages.
    pub workers: usize,
    pub output_mode: OutputMode,
    /// Suppresses non-fatal diagnostics.
    pub silent: bool,
}

impl Config {
    /// Capacity of each bounded queue between stages.
    pub fn queue_capacity(&self) -> usize {
        self.workers.max(1) * QUEUE_DEPTH_PER_WORKER
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            country: DEFAULT_COUNTRY.to_string(),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            resolvers: default_resolvers(),
            workers: 1,
            output_mode: OutputMode::default(),
            silent: false,
        }
    }
}

/// Quad9, Cloudflare and Google public resolvers.
pub fn default_resolvers() -> Vec<SocketAddr> {
    [
        Ipv4Addr::new(9, 9, 9, 9),
        Ipv4Addr::new(1, 1, 1, 1),
        Ipv4Addr::new(8, 8, 8, 8),
    ]
    .into_iter()
    .map(|ip| SocketAddr::new(IpAddr::V4(ip), DNS_PORT))
    .collect()
}
