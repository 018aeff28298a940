//! The two external lookups the pipeline depends on.
//!
//! The pipeline only ever talks to these traits. The concrete DNS client and
//! MaxMind reader live in the protocols crate, and tests plug in stubs.

use std::net::{IpAddr, Ipv4Addr};

use thiserror::Error;

use crate::network::domain::Domain;

/// A per-domain resolution failure. Never fatal to the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("no A records for {0}")]
    NoRecords(Domain),
    #[error("resolving {domain} failed: {reason}")]
    Failed { domain: Domain, reason: String },
}

/// A per-address lookup failure. Never fatal to the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("geo database lookup for {addr} failed: {reason}")]
    Database { addr: IpAddr, reason: String },
}

/// Resolves a domain to its IPv4 addresses.
///
/// Each resolution worker owns one instance, so implementations may keep
/// mutable per-connection state.
pub trait Resolve: Send {
    fn resolve(&mut self, domain: &Domain) -> Result<Vec<Ipv4Addr>, ResolveError>;
}

/// Maps an address to an ISO 3166 alpha-2 country code.
///
/// One handle is shared by every geo worker, so lookups take `&self` and
/// must be safe to run concurrently. An address the database does not know
/// yields `Ok` with an empty code.
pub trait CountryLookup: Send + Sync {
    fn country_code(&self, addr: IpAddr) -> Result<String, LookupError>;
}
