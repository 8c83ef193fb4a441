//! Prelude module for convenient imports
//!
//! ```rust
//! use balance_core::prelude::*;
//! ```

// Core types
pub use crate::types::{EntityId, Metric, ModifierOp, Side, StatName};
pub use crate::stat_block::{resolve, StatBlock};

// Formulas
pub use crate::formula::{check_formula, evaluate, Formula, FormulaContext, FormulaError};

// Authoring records
pub use crate::model::{Entity, Item, ItemModifier, StatCurve, Trait, TraitEffect, TraitTrigger};
pub use crate::rules::RuleSet;

// Combat
pub use crate::combat::{
    run_battle_batch, run_monte_carlo, Arena, BatchResult, MonteCarloConfig, MonteCarloResult,
};

// Analysis
pub use crate::analysis::{analyze, metric_series, solve_growth, CrossoverEvent, GrowthTarget};

// Config
pub use crate::config::{default_project, parse_project, Project};
pub use crate::error::BalanceError;
