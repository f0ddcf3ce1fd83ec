#![allow(clippy::must_use_candidate)]

//! Configuration for the IELTS prep AI services
//!
//! Loaded from a TOML file with `{{ env.VAR }}` placeholders, or assembled
//! directly from the process environment when no file is given.

pub mod ai;
mod duration;
mod env;
mod loader;
pub mod telemetry;

use serde::Deserialize;

pub use ai::*;
pub use telemetry::{LogFormat, TelemetryConfig};

/// Top-level configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// AI completion provider configuration
    #[serde(default)]
    pub ai: AiConfig,
    /// Logging configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}
