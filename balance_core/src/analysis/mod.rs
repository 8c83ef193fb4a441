//! Level-range analysis: metric series, crossovers and growth solving

mod crossover;
mod series;
mod solver;

pub use crossover::{analyze, CrossoverEvent};
pub use series::{evaluate_metric, metric_at, metric_series, EntitySeries};
pub use solver::{solve_growth, GrowthTarget};
