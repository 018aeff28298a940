//! The three-stage domain filtering pipeline.
//!
//! ```text
//! input ─▶ DomainSource ─▶ [domains] ─▶ N × resolution ─▶ [addresses] ─▶ N × geo ─▶ [results] ─▶ output
//! ```
//!
//! Each arrow in brackets is a bounded queue shared by every worker of the
//! next stage, so work is handed to whichever worker is free. Nothing is
//! ordered across workers; the output stage decides what is printed and in
//! which order, on a "first match wins" basis.
//!
//! **Shutdown:**
//! A stage learns that no more work is coming only when its input queue is
//! closed, and a queue is only closed once every producer feeding it has
//! returned:
//!
//! 1. The source reaches end of input and drops the domain sender.
//! 2. The coordinator joins every resolution worker, then drops the address sender.
//! 3. The coordinator joins every geo worker, then drops the result sender,
//!    which lets the output stage finish and report its count.
//!
//! Closing any queue earlier would let a downstream worker see end of stream
//! while results are still in flight.
//!
//! If reading the input fails the same drain still runs, but the output stage
//! is told to stop writing first so nothing is printed for a failed run.

use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, Scope, ScopedJoinHandle};

use crossbeam_channel::bounded;
use geopipe_common::{
    config::Config,
    lookup::{CountryLookup, Resolve},
    models::{GeoResult, ResolvedAddress},
    network::domain::Domain,
};
use tracing::{debug, error, info};

use crate::error::PipelineError;

mod geo;
mod output;
mod resolution;
mod source;

pub use output::OutputStage;
pub use source::{DomainSource, SourceStats};

use geo::GeoStats;
use resolution::ResolutionStats;

/// Counters collected over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Domains that passed validation and were queued for resolution.
    pub valid_domains: usize,
    /// Non-blank input lines rejected by validation.
    pub skipped_lines: usize,
    pub resolved_domains: usize,
    pub unresolved_domains: usize,
    pub addresses: usize,
    pub failed_lookups: usize,
    /// Distinct domains with at least one address in the target country.
    pub matched_domains: usize,
}

impl RunSummary {
    /// Share of valid domains that matched, in whole percent.
    pub fn match_percentage(&self) -> Option<usize> {
        if self.valid_domains == 0 {
            return None;
        }
        Some(self.matched_domains * 100 / self.valid_domains)
    }
}

/// Wires the stages together for one run.
///
/// The geo database is borrowed, not owned: it is opened once by the caller
/// and every geo worker reads from the same handle.
pub struct Pipeline<'a, L: CountryLookup + ?Sized> {
    cfg: &'a Config,
    geo_db: &'a L,
}

impl<'a, L: CountryLookup + ?Sized> Pipeline<'a, L> {
    pub fn new(cfg: &'a Config, geo_db: &'a L) -> Self {
        Self { cfg, geo_db }
    }

    /// Runs the pipeline to completion.
    ///
    /// One resolution worker is started per client in `clients`; the geo
    /// stage gets `cfg.workers` workers. Results are written to `out` as
    /// they are decided.
    pub fn run<R, I, W>(
        &self,
        input: I,
        clients: Vec<R>,
        out: &mut W,
    ) -> Result<RunSummary, PipelineError>
    where
        R: Resolve,
        I: BufRead,
        W: Write + Send,
    {
        if clients.is_empty() {
            return Err(PipelineError::NoResolvers);
        }

        let cfg: &'a Config = self.cfg;
        let geo_db: &'a L = self.geo_db;
        let target: &'a str = cfg.country.as_str();
        let capacity: usize = cfg.queue_capacity();
        let geo_workers: usize = cfg.workers.max(1);
        let dns_workers: usize = clients.len();
        let aborted = AtomicBool::new(false);
        let aborted: &AtomicBool = &aborted;

        thread::scope(move |scope| -> Result<RunSummary, PipelineError> {
            let (domain_tx, domain_rx) = bounded::<Domain>(capacity);
            let (addr_tx, addr_rx) = bounded::<ResolvedAddress>(capacity);
            let (result_tx, result_rx) = bounded::<GeoResult>(capacity);

            let output = OutputStage::new(out, cfg.output_mode);
            let output_handle = spawn(scope, "output", 0, move || output.run(result_rx, aborted))?;
            debug!("Created 1 output worker");

            let geo_handles = (0..geo_workers)
                .map(|id| {
                    let jobs = addr_rx.clone();
                    let results = result_tx.clone();
                    spawn(scope, "geo", id, move || {
                        geo::run_worker(id, geo_db, target, jobs, results)
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            drop(addr_rx);
            debug!("Created {geo_workers} geo worker(s)");

            let dns_handles = clients
                .into_iter()
                .enumerate()
                .map(|(id, client)| {
                    let jobs = domain_rx.clone();
                    let addrs = addr_tx.clone();
                    spawn(scope, "resolution", id, move || {
                        resolution::run_worker(id, client, jobs, addrs)
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            drop(domain_rx);
            debug!("Created {dns_workers} resolution worker(s)");

            info!("Reading domains from input");
            let fed = DomainSource::new(input).feed(&domain_tx);
            if fed.is_err() {
                aborted.store(true, Ordering::Release);
                debug!("Input failed, discarding results still in flight");
            }

            drop(domain_tx);
            let dns_stats = join_all("resolution", dns_handles);

            drop(addr_tx);
            let geo_stats = join_all("geo", geo_handles);

            drop(result_tx);
            let matched = join_all("output", vec![output_handle]);

            let source_stats: SourceStats = fed?;
            info!("Got a total of {} valid domains", source_stats.accepted);

            Ok(summarize(
                source_stats,
                &dns_stats?,
                &geo_stats?,
                matched?.into_iter().sum(),
            ))
        })
    }
}

fn spawn<'scope, 'env, T, F>(
    scope: &'scope Scope<'scope, 'env>,
    stage: &'static str,
    id: usize,
    f: F,
) -> Result<ScopedJoinHandle<'scope, T>, PipelineError>
where
    F: FnOnce() -> T + Send + 'scope,
    T: Send + 'scope,
{
    thread::Builder::new()
        .name(format!("{stage}-{id}"))
        .spawn_scoped(scope, f)
        .map_err(|source| PipelineError::Spawn { stage, source })
}

/// Waits for every worker of a stage, even if some of them panicked.
fn join_all<T>(
    stage: &'static str,
    handles: Vec<ScopedJoinHandle<'_, T>>,
) -> Result<Vec<T>, PipelineError> {
    let mut results: Vec<T> = Vec::with_capacity(handles.len());
    let mut panicked: usize = 0;

    for handle in handles {
        match handle.join() {
            Ok(res) => results.push(res),
            Err(_) => panicked += 1,
        }
    }

    if panicked > 0 {
        error!("{panicked} {stage} worker(s) panicked");
        return Err(PipelineError::WorkerPanicked {
            stage,
            count: panicked,
        });
    }
    debug!("All {stage} workers are done");
    Ok(results)
}

fn summarize(
    source: SourceStats,
    dns: &[ResolutionStats],
    geo: &[GeoStats],
    matched_domains: usize,
) -> RunSummary {
    RunSummary {
        valid_domains: source.accepted,
        skipped_lines: source.skipped,
        resolved_domains: dns.iter().map(|s| s.resolved).sum(),
        unresolved_domains: dns.iter().map(|s| s.failed).sum(),
        addresses: dns.iter().map(|s| s.addresses).sum(),
        failed_lookups: geo.iter().map(|s| s.failed).sum(),
        matched_domains,
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
