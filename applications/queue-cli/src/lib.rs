//! Soul Queue harness library
//!
//! Configuration loading and the simulation driver behind the `soul-queue`
//! binary, exposed for testing.

pub mod config;
pub mod error;
pub mod simulate;

pub use config::{CliConfig, SimulationSettings};
pub use error::{CliError, Result};
pub use simulate::{simulate, SimulateOptions, SimulationReport};
