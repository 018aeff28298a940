use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, ValueEnum};
use geopipe_common::config::{
    Config, DEFAULT_COUNTRY, DEFAULT_DB_PATH, OutputMode, default_resolvers,
};
use geopipe_common::network::endpoint::parse_endpoints;

#[derive(Parser, Debug)]
#[command(name = "geopipe", version)]
#[command(about = "Keeps the domains whose IPs geolocate to a given country.")]
#[command(override_usage = "cat domains.txt | geopipe [OPTIONS]")]
pub struct CommandLine {
    /// Two letter country code of the country to pipe through
    #[arg(short, long, default_value = DEFAULT_COUNTRY)]
    pub country: String,

    /// Path to the 'GeoLite2-Country.mmdb' file ($MMDB takes precedence)
    #[arg(short = 'f', long, default_value = DEFAULT_DB_PATH)]
    pub db_path: PathBuf,

    /// Comma separated DNS resolvers as ip[:port] [default: 9.9.9.9:53,1.1.1.1:53,8.8.8.8:53]
    // Fully qualified so clap hands the whole list to `parse_endpoints`.
    #[arg(short, long, value_parser = parse_endpoints)]
    pub resolvers: Option<::std::vec::Vec<SocketAddr>>,

    /// Number of resolution and geo workers to spawn
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: u16,

    /// Output mode
    #[arg(short, long, value_enum, default_value_t = ModeArg::Default)]
    pub output_mode: ModeArg,

    /// Suppress non-fatal error messages
    #[arg(short, long)]
    pub silent: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    /// One matching domain per line
    Default,
    /// One JSON object per processed address
    Json,
    /// Matching domains plus progress information
    Verbose,
}

impl From<ModeArg> for OutputMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Default => OutputMode::Default,
            ModeArg::Json => OutputMode::Json,
            ModeArg::Verbose => OutputMode::Verbose,
        }
    }
}

impl CommandLine {
    pub fn parse_args() -> Result<Self, clap::Error> {
        Self::try_parse()
    }

    /// Builds the run configuration. `env_db_path` wins over `--db-path`.
    pub fn into_config(self, env_db_path: Option<PathBuf>) -> Config {
        Config {
            country: self.country,
            db_path: env_db_path.unwrap_or(self.db_path),
            resolvers: self.resolvers.unwrap_or_else(default_resolvers),
            workers: usize::from(self.workers),
            output_mode: self.output_mode.into(),
            silent: self.silent,
        }
    }
}

pub fn usage() -> String {
    CommandLine::command().render_usage().to_string()
}
