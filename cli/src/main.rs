mod commands;
mod terminal;

use std::env;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use clap::error::ErrorKind;
use commands::CommandLine;
use geopipe_common::config::{Config, DB_PATH_ENV};
use geopipe_core::Pipeline;
use geopipe_protocols::{dns, mmdb::GeoDb};
use terminal::{logging, print};
use thiserror::Error;
use tracing::{debug, error, info};

/// Startup problems that come with a usage hint.
#[derive(Debug, Error)]
enum UsageError {
    #[error("file {} does not exist", .0.display())]
    MissingDatabase(PathBuf),
    #[error("stdin was empty, pipe a list of domains into geopipe")]
    InteractiveInput,
}

fn main() -> ExitCode {
    let commands = match CommandLine::parse_args() {
        Ok(commands) => commands,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(parse_failure_code(e.kind()));
        }
    };

    let env_db_path: Option<PathBuf> = env::var_os(DB_PATH_ENV).map(PathBuf::from);
    let db_from_env: bool = env_db_path.is_some();
    let cfg: Config = commands.into_config(env_db_path);

    logging::init_logging(cfg.output_mode, cfg.silent);
    if db_from_env {
        debug!("Got database path from ${DB_PATH_ENV}");
    }

    match run(&cfg) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            if wants_usage_hint(&e) {
                print::usage_hint(&commands::usage());
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cfg: &Config) -> anyhow::Result<()> {
    let start_time: Instant = Instant::now();

    if !cfg.db_path.is_file() {
        return Err(UsageError::MissingDatabase(cfg.db_path.clone()).into());
    }
    debug!("File {} exists", cfg.db_path.display());

    print::banner(cfg.output_mode);
    info!("Mode: {}", cfg.output_mode);

    let geo_db: GeoDb = GeoDb::open(&cfg.db_path).context("opening geo database")?;
    info!("Opened {} database", geo_db.database_type());

    require_piped_input(io::stdin().is_terminal())?;

    let clients = dns::build_clients(&cfg.resolvers, cfg.workers).context("creating DNS clients")?;

    let mut stdout = io::stdout();
    let summary = Pipeline::new(cfg, &geo_db).run(io::stdin().lock(), clients, &mut stdout)?;

    print::summary(&summary, &cfg.country, start_time.elapsed());
    Ok(())
}

/// Help and version requests are not failures; every other clap error is.
fn parse_failure_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

fn require_piped_input(interactive: bool) -> Result<(), UsageError> {
    if interactive {
        return Err(UsageError::InteractiveInput);
    }
    Ok(())
}

fn wants_usage_hint(e: &anyhow::Error) -> bool {
    e.downcast_ref::<UsageError>().is_some()
}
