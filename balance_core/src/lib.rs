//! balance_core - Game balance engine
//!
//! This library provides:
//! - Formula: a small expression language evaluated against named stats
//! - StatBlock: an entity's stats at a level with item modifiers applied
//! - Combat: seeded batch and Monte Carlo duel simulation
//! - Analysis: per-level metric series, crossover detection, growth solving

pub mod analysis;
pub mod combat;
pub mod config;
pub mod error;
pub mod formula;
pub mod model;
pub mod prelude;
pub mod rules;
pub mod source;
pub mod stat_block;
pub mod types;

// Re-export core types for convenience
pub use analysis::{analyze, metric_series, solve_growth, CrossoverEvent, EntitySeries, GrowthTarget};
pub use combat::{
    base_damage, run_battle_batch, run_monte_carlo, Arena, BatchResult, Combatant, Duel,
    MonteCarloConfig, MonteCarloResult, SimulationError,
};
pub use config::{default_project, parse_project, ConfigError, Project};
pub use error::BalanceError;
pub use formula::{check_formula, evaluate, Formula, FormulaContext, FormulaError};
pub use model::{Entity, Item, ItemModifier, StatCurve, Trait};
pub use rules::{CombatRoles, RuleSet};
pub use source::{ItemSource, LevelCurveSource, StatSource};
pub use stat_block::{resolve, StatAccumulator, StatBlock};
pub use types::{EntityId, Metric, ModifierOp, Side, StatName};
