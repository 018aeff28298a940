//! Types shared by every geopipe crate: run configuration, the records that
//! travel between pipeline stages, and the lookup seams the stages call into.

pub mod config;
pub mod lookup;
pub mod models;
pub mod network;
