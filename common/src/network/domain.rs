//! # Domain Model
//!
//! A [`Domain`] is a hostname that has passed syntax validation. Anything the
//! pipeline resolves has been through [`Domain::from_str`] first, so stages
//! never have to re-check what they are handed.
//!
//! Accepted names:
//! * At most 255 characters once the dots are removed.
//! * Dot separated labels of 1 to 63 characters made of ASCII letters,
//!   digits, `-` and `_`. A label never starts with `-`.
//! * Optionally one trailing `.` or `_`.
//! * Not an IP literal.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use thiserror::Error;

const MAX_NAME_LEN: usize = 255;

static DNS_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([a-zA-Z0-9_]{1}[a-zA-Z0-9_-]{0,62}){1}(\.[a-zA-Z0-9_]{1}[a-zA-Z0-9_-]{0,62})*[\._]?$",
    )
    .expect("hostname pattern compiles")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("empty hostname")]
    Empty,
    #[error("hostname has {0} characters besides dots, limit is 255")]
    TooLong(usize),
    #[error("'{0}' is an IP address, not a hostname")]
    IpLiteral(String),
    #[error("'{0}' is not a valid hostname")]
    Malformed(String),
}

/// A validated hostname.
///
/// Cloning is cheap: one domain fans out into a record per resolved address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Domain(Arc<str>);

impl Domain {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Domain {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate(s)?;
        Ok(Self(Arc::from(s)))
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn validate(s: &str) -> Result<(), DomainError> {
    if s.is_empty() {
        return Err(DomainError::Empty);
    }

    let len: usize = s.chars().filter(|&c| c != '.').count();
    if len > MAX_NAME_LEN {
        return Err(DomainError::TooLong(len));
    }
    if s.parse::<IpAddr>().is_ok() {
        return Err(DomainError::IpLiteral(s.to_string()));
    }
    if !DNS_NAME.is_match(s) {
        return Err(DomainError::Malformed(s.to_string()));
    }
    Ok(())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
