//! StatAccumulator - Collects stat values while sources are applied

use crate::stat_block::StatBlock;
use crate::types::{ModifierOp, StatName};

/// Running values for the declared stats during resolution
///
/// Only declared stats exist in the accumulator; writes to any other stat
/// name are dropped, which is how unknown item targets get ignored.
#[derive(Debug, Clone, Default)]
pub struct StatAccumulator {
    values: Vec<(StatName, f64)>,
}

impl StatAccumulator {
    /// Start every declared stat at zero
    pub fn new(declared: &[StatName]) -> Self {
        StatAccumulator {
            values: declared.iter().map(|name| (name.clone(), 0.0)).collect(),
        }
    }

    fn slot(&mut self, stat: &str) -> Option<&mut f64> {
        self.values
            .iter_mut()
            .find(|(name, _)| name.as_str() == stat)
            .map(|(_, value)| value)
    }

    /// Overwrite a stat's running value
    pub fn set(&mut self, stat: &str, value: f64) {
        if let Some(slot) = self.slot(stat) {
            *slot = value;
        }
    }

    /// Fold one modifier into a stat's running value
    pub fn apply(&mut self, stat: &str, op: ModifierOp, amount: f64) {
        if let Some(slot) = self.slot(stat) {
            *slot = op.apply(*slot, amount);
        }
    }

    pub fn get(&self, stat: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(name, _)| name.as_str() == stat)
            .map(|(_, value)| *value)
    }

    /// Declared stat names, in declaration order
    pub fn names(&self) -> impl Iterator<Item = &StatName> {
        self.values.iter().map(|(name, _)| name)
    }

    /// Freeze the accumulated values into a block
    pub fn finish(self) -> StatBlock {
        StatBlock::from_pairs(self.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declared() -> Vec<StatName> {
        vec![StatName::new("hp"), StatName::new("atk")]
    }

    #[test]
    fn test_starts_at_zero() {
        let acc = StatAccumulator::new(&declared());
        assert_eq!(acc.get("hp"), Some(0.0));
        assert_eq!(acc.get("atk"), Some(0.0));
    }

    #[test]
    fn test_sequential_modifiers() {
        let mut acc = StatAccumulator::new(&declared());
        acc.set("atk", 10.0);
        acc.apply("atk", ModifierOp::Add, 5.0);
        acc.apply("atk", ModifierOp::Multiply, 2.0);
        assert_eq!(acc.get("atk"), Some(30.0));
    }

    #[test]
    fn test_unknown_stat_ignored() {
        let mut acc = StatAccumulator::new(&declared());
        acc.set("mana", 50.0);
        acc.apply("mana", ModifierOp::Add, 5.0);
        assert_eq!(acc.get("mana"), None);
        assert_eq!(acc.finish().len(), 2);
    }
}
