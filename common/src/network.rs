pub mod domain;
pub mod endpoint;
