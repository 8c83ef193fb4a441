//! Per-level metric series

use crate::formula::{EvalError, FormulaContext};
use crate::model::{Entity, Item};
use crate::rules::RuleSet;
use crate::stat_block::{resolve, StatBlock};
use crate::types::{EntityId, Metric};
use serde::{Deserialize, Serialize};

/// One entity's metric value at levels `1..=max_level`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySeries {
    pub entity: EntityId,
    pub name: String,
    /// `values[0]` is level 1
    pub values: Vec<f64>,
}

impl EntitySeries {
    pub fn new(entity: impl Into<EntityId>, name: impl Into<String>, values: Vec<f64>) -> Self {
        EntitySeries {
            entity: entity.into(),
            name: name.into(),
            values,
        }
    }

    pub fn at_level(&self, level: u32) -> Option<f64> {
        let index = level.checked_sub(1)?;
        self.values.get(index as usize).copied()
    }
}

/// Evaluate a metric formula over a resolved block
///
/// `cp` sees the block's stats under their bare names. `dmg` and `hit` are
/// two-sided and run against an opponent whose declared stats are all zero.
pub fn evaluate_metric(rules: &RuleSet, block: &StatBlock, metric: Metric) -> Result<f64, EvalError> {
    let ctx = if metric.is_two_sided() {
        FormulaContext::versus(block, &rules.zero_block(), &rules.context)
    } else {
        FormulaContext::from_block(block)
    };
    rules.formula(metric).eval(&ctx)
}

/// Metric value for one entity at one level; failed evaluations read as 0
pub fn metric_at(entity: &Entity, level: u32, items: &[Item], rules: &RuleSet, metric: Metric) -> f64 {
    let block = resolve(entity, level, items, rules);
    evaluate_metric(rules, &block, metric).unwrap_or(0.0)
}

/// Series for every entity, in entity order
pub fn metric_series(
    rules: &RuleSet,
    entities: &[Entity],
    items: &[Item],
    metric: Metric,
    max_level: u32,
) -> Vec<EntitySeries> {
    entities
        .iter()
        .map(|entity| {
            let values = (1..=max_level)
                .map(|level| metric_at(entity, level, items, rules, metric))
                .collect();
            EntitySeries::new(entity.id.clone(), entity.name.clone(), values)
        })
        .collect()
}
