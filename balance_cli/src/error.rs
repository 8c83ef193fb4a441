//! CLI error type

use balance_core::{BalanceError, ConfigError, FormulaError, SimulationError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write output: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Balance(#[from] BalanceError),
    #[error("Invalid argument: {0}")]
    Argument(String),
    #[error("No solution: {0}")]
    Unsolved(String),
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Balance(e.into())
    }
}

impl From<SimulationError> for CliError {
    fn from(e: SimulationError) -> Self {
        CliError::Balance(e.into())
    }
}

impl From<FormulaError> for CliError {
    fn from(e: FormulaError) -> Self {
        CliError::Balance(e.into())
    }
}
