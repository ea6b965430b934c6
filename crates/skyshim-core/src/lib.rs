//! skyshim-core — shared data model for the multi-cloud control plane.
//!
//! Every other skyshim crate speaks in these types: provider names,
//! instance snapshots, deployment specs, metrics samples and scaling
//! decisions. Configuration parsing lives here as well so that a config
//! file can be rejected before any provider is contacted.

pub mod config;
pub mod error;
pub mod types;

pub use config::SkyshimConfig;
pub use error::{ConfigError, ConfigResult, ValidationError};
pub use types::*;
