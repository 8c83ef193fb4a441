//! Crate-level error type

use crate::combat::SimulationError;
use crate::config::ConfigError;
use crate::formula::{EvalError, FormulaError};
use thiserror::Error;

/// Any failure the engine reports to a caller
#[derive(Error, Debug)]
pub enum BalanceError {
    #[error(transparent)]
    Formula(#[from] FormulaError),
    #[error(transparent)]
    Eval(#[from] EvalError),
    #[error(transparent)]
    Simulation(#[from] SimulationError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, BalanceError>;
