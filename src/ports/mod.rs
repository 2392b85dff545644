//! Port traits between the domain and its adapters.

pub mod config_port;
pub mod dataset_port;
pub mod rate_port;
