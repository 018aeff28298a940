use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex};

use geopipe_common::config::{Config, OutputMode};
use geopipe_common::lookup::{CountryLookup, LookupError, Resolve, ResolveError};
use geopipe_common::network::domain::Domain;
use geopipe_core::{Pipeline, PipelineError, RunSummary};

/// In-memory DNS. Unknown names fail like NXDOMAIN. Every query is recorded.
#[derive(Clone, Default)]
pub struct StubResolver {
    records: Arc<HashMap<String, Vec<Ipv4Addr>>>,
    queried: Arc<Mutex<Vec<String>>>,
}

impl StubResolver {
    pub fn new(records: &[(&str, &[Ipv4Addr])]) -> Self {
        let records = records
            .iter()
            .map(|(name, addrs)| (name.to_string(), addrs.to_vec()))
            .collect();
        Self {
            records: Arc::new(records),
            queried: Arc::default(),
        }
    }

    pub fn from_map(records: HashMap<String, Vec<Ipv4Addr>>) -> Self {
        Self {
            records: Arc::new(records),
            queried: Arc::default(),
        }
    }

    pub fn queried(&self) -> Vec<String> {
        self.queried.lock().unwrap().clone()
    }
}

impl Resolve for StubResolver {
    fn resolve(&mut self, domain: &Domain) -> Result<Vec<Ipv4Addr>, ResolveError> {
        self.queried.lock().unwrap().push(domain.to_string());
        // Give other workers a chance to interleave.
        std::thread::yield_now();
        match self.records.get(domain.as_str()) {
            Some(addrs) if !addrs.is_empty() => Ok(addrs.clone()),
            Some(_) => Err(ResolveError::NoRecords(domain.clone())),
            None => Err(ResolveError::Failed {
                domain: domain.clone(),
                reason: "NXDOMAIN".to_string(),
            }),
        }
    }
}

/// In-memory country database. Addresses in `broken` fail the lookup.
#[derive(Default)]
pub struct StubGeoDb {
    countries: HashMap<Ipv4Addr, &'static str>,
    broken: HashSet<Ipv4Addr>,
}

impl StubGeoDb {
    pub fn new(countries: &[(Ipv4Addr, &'static str)]) -> Self {
        Self {
            countries: countries.iter().copied().collect(),
            broken: HashSet::new(),
        }
    }

    pub fn with_broken(mut self, addr: Ipv4Addr) -> Self {
        self.broken.insert(addr);
        self
    }
}

impl CountryLookup for StubGeoDb {
    fn country_code(&self, addr: IpAddr) -> Result<String, LookupError> {
        let IpAddr::V4(v4) = addr else {
            return Ok(String::new());
        };
        if self.broken.contains(&v4) {
            return Err(LookupError::Database {
                addr,
                reason: "corrupt search tree".to_string(),
            });
        }
        Ok(self.countries.get(&v4).copied().unwrap_or_default().to_string())
    }
}

pub struct Outcome {
    pub summary: RunSummary,
    pub stdout: String,
}

impl Outcome {
    pub fn lines(&self) -> Vec<&str> {
        self.stdout.lines().collect()
    }

    pub fn line_set(&self) -> HashSet<&str> {
        self.stdout.lines().collect()
    }
}

pub fn config(workers: usize, mode: OutputMode) -> Config {
    Config {
        workers,
        output_mode: mode,
        ..Config::default()
    }
}

pub fn try_run(
    cfg: &Config,
    resolver: &StubResolver,
    db: &StubGeoDb,
    input: &str,
) -> Result<Outcome, PipelineError> {
    let clients: Vec<StubResolver> = vec![resolver.clone(); cfg.workers];
    let mut out: Vec<u8> = Vec::new();
    let summary = Pipeline::new(cfg, db).run(Cursor::new(input.to_string()), clients, &mut out)?;
    Ok(Outcome {
        summary,
        stdout: String::from_utf8(out).expect("output is utf-8"),
    })
}

pub fn run(cfg: &Config, resolver: &StubResolver, db: &StubGeoDb, input: &str) -> Outcome {
    try_run(cfg, resolver, db, input).expect("pipeline run failed")
}
