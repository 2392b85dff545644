//! Core domain types and logic.

pub mod record;
pub mod store;
pub mod layout;
pub mod query;
pub mod analysis;
pub mod annotation;
pub mod collect;
pub mod context;
pub mod config_validation;
pub mod error;
