//! Records passed between pipeline stages.

use std::net::Ipv4Addr;

use crate::network::domain::Domain;

/// One address returned for a domain. A domain resolves to zero or more of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAddress {
    pub domain: Domain,
    pub addr: Ipv4Addr,
}

impl ResolvedAddress {
    pub fn new(domain: Domain, addr: Ipv4Addr) -> Self {
        Self { domain, addr }
    }
}

/// A geolocated address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoResult {
    pub domain: Domain,
    pub addr: Ipv4Addr,
    /// Empty when the database has no entry for the address.
    pub country_code: String,
    pub matched: bool,
}

impl GeoResult {
    /// Builds a result, marking it matched when `country_code` equals `target` exactly.
    pub fn new(resolved: ResolvedAddress, country_code: String, target: &str) -> Self {
        let matched = !country_code.is_empty() && country_code == target;
        Self {
            domain: resolved.domain,
            addr: resolved.addr,
            country_code,
            matched,
        }
    }
}
