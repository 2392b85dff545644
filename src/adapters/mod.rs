//! Concrete adapter implementations for ports.

pub mod csv_dataset_adapter;
pub mod file_config_adapter;
pub mod chart_svg;
#[cfg(feature = "fetch")]
pub mod cbr_adapter;
