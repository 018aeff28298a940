//! Resolver endpoint parsing.
//!
//! Endpoints are given as a comma separated list of `ip:port` pairs. A bare IP
//! means the standard DNS port.

use std::net::{IpAddr, SocketAddr};

use thiserror::Error;

pub const DNS_PORT: u16 = 53;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    #[error("resolver list is empty")]
    Empty,
    #[error("invalid resolver endpoint '{0}', expected ip or ip:port")]
    Invalid(String),
}

/// Parses a single endpoint like `1.1.1.1:53`, `1.1.1.1` or `[2606:4700::1111]:53`.
pub fn parse_endpoint(s: &str) -> Result<SocketAddr, EndpointError> {
    let s = s.trim();
    if let Ok(addr) = s.parse::<SocketAddr>() {
        return Ok(addr);
    }
    s.parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, DNS_PORT))
        .map_err(|_| EndpointError::Invalid(s.to_string()))
}

/// Parses a comma separated endpoint list, skipping empty entries.
pub fn parse_endpoints(s: &str) -> Result<Vec<SocketAddr>, EndpointError> {
    let endpoints = s
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(parse_endpoint)
        .collect::<Result<Vec<SocketAddr>, _>>()?;

    if endpoints.is_empty() {
        return Err(EndpointError::Empty);
    }
    Ok(endpoints)
}
