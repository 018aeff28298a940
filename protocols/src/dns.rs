//! DNS client for the resolution stage.
//!
//! Each resolution worker owns one [`DnsClient`]. A client wraps a hickory
//! resolver pinned to the configured endpoints and a single-threaded tokio
//! runtime, so a lookup is a plain blocking call on the worker's own thread.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use geopipe_common::lookup::{Resolve, ResolveError};
use geopipe_common::network::domain::Domain;
use hickory_resolver::{
    TokioResolver,
    config::{NameServerConfigGroup, ResolverConfig, ResolverOpts, ServerOrderingStrategy},
    name_server::TokioConnectionProvider,
};
use rand::seq::SliceRandom;
use thiserror::Error;
use tokio::runtime::{self, Runtime};
use tracing::debug;

/// Attempts per query before a domain is given up on.
pub const ATTEMPTS: usize = 3;
const QUERY_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum DnsSetupError {
    #[error("no resolver endpoints configured")]
    NoEndpoints,
    #[error("failed to start DNS runtime")]
    Runtime(#[from] std::io::Error),
}

pub struct DnsClient {
    runtime: Runtime,
    resolver: TokioResolver,
    endpoints: Vec<SocketAddr>,
}

impl DnsClient {
    /// Builds a client that queries `endpoints` in a random order.
    ///
    /// Every client shuffles independently, which spreads the load of a
    /// worker pool across all endpoints instead of hammering the first one.
    pub fn new(endpoints: &[SocketAddr]) -> Result<Self, DnsSetupError> {
        if endpoints.is_empty() {
            return Err(DnsSetupError::NoEndpoints);
        }

        let mut endpoints: Vec<SocketAddr> = endpoints.to_vec();
        endpoints.shuffle(&mut rand::rng());

        let runtime: Runtime = runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let config = ResolverConfig::from_parts(None, vec![], name_servers(&endpoints));
        let mut opts = ResolverOpts::default();
        opts.attempts = ATTEMPTS;
        opts.timeout = QUERY_TIMEOUT;
        opts.server_ordering_strategy = ServerOrderingStrategy::UserProvidedOrder;

        let resolver = TokioResolver::builder_with_config(config, TokioConnectionProvider::default())
            .with_options(opts)
            .build();

        Ok(Self {
            runtime,
            resolver,
            endpoints,
        })
    }

    /// Endpoints in the order this client tries them.
    pub fn endpoints(&self) -> &[SocketAddr] {
        &self.endpoints
    }
}

impl Resolve for DnsClient {
    fn resolve(&mut self, domain: &Domain) -> Result<Vec<Ipv4Addr>, ResolveError> {
        let lookup = self
            .runtime
            .block_on(self.resolver.ipv4_lookup(domain.as_str()))
            .map_err(|e| ResolveError::Failed {
                domain: domain.clone(),
                reason: e.to_string(),
            })?;

        let addrs: Vec<Ipv4Addr> = lookup.iter().map(|record| record.0).collect();
        if addrs.is_empty() {
            return Err(ResolveError::NoRecords(domain.clone()));
        }
        Ok(addrs)
    }
}

/// Builds one client per resolution worker.
///
/// All clients are created up front so that a setup failure aborts the run
/// before any worker has started.
pub fn build_clients(endpoints: &[SocketAddr], count: usize) -> Result<Vec<DnsClient>, DnsSetupError> {
    (0..count.max(1))
        .map(|id| {
            let client = DnsClient::new(endpoints)?;
            debug!("DNS client {id} will query {:?}", client.endpoints());
            Ok(client)
        })
        .collect()
}

fn name_servers(endpoints: &[SocketAddr]) -> NameServerConfigGroup {
    let mut group = NameServerConfigGroup::new();
    for endpoint in endpoints {
        group.merge(NameServerConfigGroup::from_ips_clear(
            &[endpoint.ip()],
            endpoint.port(),
            true,
        ));
    }
    group
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
