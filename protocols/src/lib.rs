//! Concrete implementations of the pipeline's external lookups.

pub mod dns;
pub mod mmdb;
