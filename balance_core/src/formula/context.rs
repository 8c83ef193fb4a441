//! Variable lookup tables for formula evaluation

use crate::stat_block::StatBlock;
use crate::types::StatName;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Naming convention for two-sided (attacker vs defender) formulas
///
/// Every attacker stat is exposed as `<attacker_prefix>.<stat>` and every
/// defender stat as `<defender_prefix>.<stat>`. On top of that, attacker stats
/// may be flattened to bare names, and the stats listed in `defender_flat`
/// are flattened to bare names from the defender's block (these win over a
/// flattened attacker stat of the same name).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextRules {
    pub attacker_prefix: String,
    pub defender_prefix: String,
    pub flatten_attacker: bool,
    pub defender_flat: Vec<StatName>,
}

impl Default for ContextRules {
    fn default() -> Self {
        ContextRules {
            attacker_prefix: "a".to_string(),
            defender_prefix: "b".to_string(),
            flatten_attacker: true,
            defender_flat: vec![StatName::new("def")],
        }
    }
}

/// Named-variable context a formula is evaluated against
///
/// Dotted names (`a.atk`) are stored as plain keys, so lookup is one hash probe.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormulaContext {
    vars: HashMap<String, f64>,
}

impl FormulaContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-sided context: every stat under its bare name
    pub fn from_block(block: &StatBlock) -> Self {
        let mut ctx = FormulaContext::new();
        for (name, value) in block.iter() {
            ctx.set(name.as_str(), value);
        }
        ctx
    }

    /// Two-sided context following `rules`
    pub fn versus(attacker: &StatBlock, defender: &StatBlock, rules: &ContextRules) -> Self {
        let mut ctx = FormulaContext::new();

        if rules.flatten_attacker {
            for (name, value) in attacker.iter() {
                ctx.set(name.as_str(), value);
            }
        }
        for stat in &rules.defender_flat {
            if let Some(value) = defender.get(stat.as_str()) {
                ctx.set(stat.as_str(), value);
            }
        }
        for (name, value) in attacker.iter() {
            ctx.set(format!("{}.{}", rules.attacker_prefix, name), value);
        }
        for (name, value) in defender.iter() {
            ctx.set(format!("{}.{}", rules.defender_prefix, name), value);
        }

        ctx
    }

    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.vars.insert(name.into(), value);
    }

    /// Builder-style `set`
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.vars.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for FormulaContext {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut ctx = FormulaContext::new();
        for (name, value) in iter {
            ctx.set(name, value);
        }
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(pairs: &[(&str, f64)]) -> StatBlock {
        StatBlock::from_pairs(pairs.iter().map(|(n, v)| (StatName::new(n), *v)))
    }

    #[test]
    fn test_from_block_flat_names() {
        let ctx = FormulaContext::from_block(&block(&[("hp", 100.0), ("atk", 12.0)]));
        assert_eq!(ctx.get("hp"), Some(100.0));
        assert_eq!(ctx.get("atk"), Some(12.0));
        assert_eq!(ctx.get("a.hp"), None);
    }

    #[test]
    fn test_versus_prefixes_and_flattening() {
        let attacker = block(&[("atk", 50.0), ("def", 5.0)]);
        let defender = block(&[("atk", 30.0), ("def", 20.0)]);
        let ctx = FormulaContext::versus(&attacker, &defender, &ContextRules::default());

        assert_eq!(ctx.get("a.atk"), Some(50.0));
        assert_eq!(ctx.get("b.def"), Some(20.0));
        assert_eq!(ctx.get("atk"), Some(50.0));
        // defender's def overrides the flattened attacker def
        assert_eq!(ctx.get("def"), Some(20.0));
    }

    #[test]
    fn test_versus_without_attacker_flattening() {
        let rules = ContextRules {
            flatten_attacker: false,
            defender_flat: vec![],
            ..ContextRules::default()
        };
        let ctx = FormulaContext::versus(&block(&[("atk", 1.0)]), &block(&[("def", 2.0)]), &rules);
        assert_eq!(ctx.get("atk"), None);
        assert_eq!(ctx.get("def"), None);
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn test_collect_from_pairs() {
        let ctx: FormulaContext = vec![("x", 1.0), ("y", 2.0)].into_iter().collect();
        assert_eq!(ctx.get("y"), Some(2.0));
    }
}
