//! Command-line runner for the Resistance Cascade simulation.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `CASCADE_CONFIG` (default
//!    `cascade-config.yaml`), falling back to defaults
//! 2. Initialize structured logging (tracing)
//! 3. Build the simulation and run it to termination
//! 4. Log the result and print the final report as JSON

mod callback;
mod error;

use std::path::PathBuf;

use cascade_core::config::CascadeConfig;
use cascade_core::{Simulation, runner};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::callback::LoggingCallback;
use crate::error::EngineError;

/// Config file used when `CASCADE_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "cascade-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, setup, or the run fails.
fn main() -> anyhow::Result<()> {
    let (config, source) = load_config()?;
    init_logging(&config)?;

    info!(
        source = %source,
        width = config.world.width,
        height = config.world.height,
        citizen_density = config.population.citizen_density,
        security_density = config.population.security_density,
        max_iters = config.simulation.max_iters,
        "Configuration loaded"
    );

    let report_interval = config.logging.report_interval;
    let mut simulation = Simulation::new(config).map_err(EngineError::from)?;
    let mut callback = LoggingCallback::new(report_interval);
    let result =
        runner::run_simulation(&mut simulation, &mut callback).map_err(EngineError::from)?;

    runner::log_simulation_end(&result);

    let json = serde_json::to_string_pretty(&result.final_report).map_err(EngineError::from)?;
    println!("{json}");
    Ok(())
}

/// Load configuration, returning it with a description of where it came
/// from.
fn load_config() -> Result<(CascadeConfig, String), EngineError> {
    let path = std::env::var("CASCADE_CONFIG")
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if path.exists() {
        let config = CascadeConfig::from_file(&path)?;
        Ok((config, path.display().to_string()))
    } else {
        let mut config = CascadeConfig::default();
        config.apply_env_overrides();
        Ok((config, String::from("defaults")))
    }
}

/// Install the tracing subscriber. `RUST_LOG` wins over `logging.level`.
fn init_logging(config: &CascadeConfig) -> Result<(), EngineError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .map_err(|e| EngineError::Logging {
            message: format!("invalid log filter: {e}"),
        })?;

    let installed = if config.logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
    };
    installed.map_err(|e| EngineError::Logging {
        message: e.to_string(),
    })
}
