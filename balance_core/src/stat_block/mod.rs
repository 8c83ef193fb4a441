//! StatBlock - Resolved stats for one entity at one level

mod aggregator;
mod computed;

pub use aggregator::StatAccumulator;

use crate::model::{Entity, Item, Trait};
use crate::rules::RuleSet;
use crate::source::{ItemSource, LevelCurveSource, StatSource};
use crate::types::StatName;
use serde::{Deserialize, Serialize};

/// Post-modifier stat values, in rule-set declaration order
///
/// Blocks are values: combat and analysis code derive new blocks rather
/// than mutating one that has been handed out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatBlock {
    values: Vec<(StatName, f64)>,
}

impl StatBlock {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (StatName, f64)>) -> Self {
        StatBlock {
            values: pairs.into_iter().collect(),
        }
    }

    /// Every listed stat at zero
    pub fn zeroed(stats: &[StatName]) -> Self {
        Self::from_pairs(stats.iter().map(|name| (name.clone(), 0.0)))
    }

    /// Build a block by applying sources in priority order
    ///
    /// Sources with equal priority keep the order they were passed in.
    pub fn from_sources(declared: &[StatName], sources: &[&dyn StatSource]) -> Self {
        let mut accumulator = StatAccumulator::new(declared);

        let mut sorted: Vec<&&dyn StatSource> = sources.iter().collect();
        sorted.sort_by_key(|s| s.priority());

        for source in sorted {
            source.apply(&mut accumulator);
        }

        accumulator.finish()
    }

    pub fn get(&self, stat: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(name, _)| name.as_str() == stat)
            .map(|(_, value)| *value)
    }

    /// Stat value, `0.0` when the stat is not in the block
    pub fn value(&self, stat: &str) -> f64 {
        self.get(stat).unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StatName, f64)> {
        self.values.iter().map(|(name, value)| (name, *value))
    }

    pub fn names(&self) -> impl Iterator<Item = &StatName> {
        self.values.iter().map(|(name, _)| name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Copy of this block with one stat replaced; unknown stats are ignored
    pub fn with_value(&self, stat: &str, value: f64) -> StatBlock {
        let mut copy = self.clone();
        if let Some(slot) = copy.values.iter_mut().find(|(name, _)| name.as_str() == stat) {
            slot.1 = value;
        }
        copy
    }

    /// First stat whose value is NaN or infinite
    pub fn first_non_finite(&self) -> Option<&StatName> {
        self.values
            .iter()
            .find(|(_, value)| !value.is_finite())
            .map(|(name, _)| name)
    }
}

/// Effective stats of `entity` at `level` with applicable items equipped
///
/// Each declared stat starts from the entity's curve (`{0, 0}` when unset),
/// then every active item that targets the entity applies its modifiers in
/// declaration order, items in list order. Levels below 1 are treated as 1.
pub fn resolve(entity: &Entity, level: u32, items: &[Item], rules: &RuleSet) -> StatBlock {
    let curves = LevelCurveSource::new(entity, level);
    let gear: Vec<ItemSource> = items
        .iter()
        .filter(|item| item.applies_to(&entity.id))
        .map(ItemSource::new)
        .collect();

    let mut sources: Vec<&dyn StatSource> = Vec::with_capacity(gear.len() + 1);
    sources.push(&curves);
    sources.extend(gear.iter().map(|s| s as &dyn StatSource));

    StatBlock::from_sources(&rules.stats, &sources)
}

/// Traits the entity carries into combat, in item order
pub fn resolve_traits<'a>(entity: &Entity, items: &'a [Item]) -> Vec<&'a Trait> {
    items
        .iter()
        .filter(|item| item.applies_to(&entity.id))
        .flat_map(|item| item.traits.iter())
        .collect()
}
