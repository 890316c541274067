//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the fan-app core:
//! - Logging and tracing infrastructure
//! - Configuration management
//!
//! ## Overview
//!
//! Every other core crate depends on this one for its configuration type and
//! logging conventions. The repositories receive their back end, clock and
//! table names through [`CoreConfig`](config::CoreConfig).

pub mod config;
pub mod error;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder, StorageConfig, TableNames};
pub use error::{Error, Result};
