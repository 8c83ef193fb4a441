//! Combat simulation - Duels between two resolved entities
//!
//! A trial runs both sides on fixed time ticks until one reaches 0 HP or the
//! time limit passes. Batch mode summarizes attacker wins; Monte Carlo mode
//! adds per-trial rates, histograms and a few playback logs.
//!
//! All randomness comes from the `Rng` passed in, so seeded generators give
//! reproducible results.

mod batch;
mod duel;
mod fighter;
mod resolution;
mod result;
mod traits;

pub use batch::MonteCarloConfig;
pub use duel::Duel;
pub use fighter::Combatant;
pub use result::{
    hp_bucket, BatchResult, CombatEvent, EventKind, MonteCarloResult, SideTally, TrialLog,
    TrialOutcome,
};

use crate::formula::{EvalError, FormulaContext};
use crate::model::{Entity, Item};
use crate::rules::RuleSet;
use crate::stat_block::StatBlock;
use crate::types::{EntityId, StatName};
use rand::Rng;
use thiserror::Error;

/// Whole-run simulation failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("Unknown entity: {0}")]
    UnknownEntity(EntityId),
    #[error("Trial count must be at least 1")]
    ZeroTrials,
    #[error("Invalid level {0}: levels start at 1")]
    InvalidLevel(u32),
    #[error("Entity {entity} has a non-finite value for {stat}")]
    NonFiniteStat { entity: EntityId, stat: StatName },
    #[error("Entity {entity} has variance {variance}; expected 0 to {}", MAX_VARIANCE)]
    InvalidVariance { entity: EntityId, variance: f64 },
}

/// Largest damage variance fraction a combatant may carry
pub const MAX_VARIANCE: f64 = 1.0;

/// Damage of one plain hit from `attacker` against `defender`
///
/// Evaluates the rule set's damage formula in the two-sided context.
pub fn base_damage(
    rules: &RuleSet,
    attacker: &StatBlock,
    defender: &StatBlock,
) -> Result<f64, EvalError> {
    let ctx = FormulaContext::versus(attacker, defender, &rules.context);
    rules.dmg_formula.eval(&ctx)
}

/// Read-only view of everything a duel is resolved from
#[derive(Debug, Clone, Copy)]
pub struct Arena<'a> {
    pub rules: &'a RuleSet,
    pub entities: &'a [Entity],
    pub items: &'a [Item],
}

impl<'a> Arena<'a> {
    pub fn new(rules: &'a RuleSet, entities: &'a [Entity], items: &'a [Item]) -> Self {
        Arena {
            rules,
            entities,
            items,
        }
    }

    pub fn entity(&self, id: &str) -> Result<&'a Entity, SimulationError> {
        self.entities
            .iter()
            .find(|e| e.id.0 == id)
            .ok_or_else(|| SimulationError::UnknownEntity(EntityId::from(id)))
    }

    pub fn combatant(&self, id: &str, level: u32) -> Result<Combatant, SimulationError> {
        Combatant::from_entity(self.entity(id)?, level, self.items, self.rules)
    }

    /// Resolve both sides at `level`
    pub fn duel(&self, attacker: &str, defender: &str, level: u32) -> Result<Duel<'a>, SimulationError> {
        Ok(Duel::new(
            self.rules,
            self.combatant(attacker, level)?,
            self.combatant(defender, level)?,
        ))
    }
}

/// Resolve a pairing and run `trials` batch trials
pub fn run_battle_batch<R: Rng + ?Sized>(
    arena: &Arena<'_>,
    attacker: &str,
    defender: &str,
    level: u32,
    trials: u32,
    rng: &mut R,
) -> Result<BatchResult, SimulationError> {
    arena.duel(attacker, defender, level)?.run_batch(trials, rng)
}

/// Resolve a pairing and run a Monte Carlo study
pub fn run_monte_carlo<R: Rng + ?Sized>(
    arena: &Arena<'_>,
    attacker: &str,
    defender: &str,
    level: u32,
    config: &MonteCarloConfig,
    rng: &mut R,
) -> Result<MonteCarloResult, SimulationError> {
    arena.duel(attacker, defender, level)?.run_monte_carlo(config, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ItemModifier;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn roster() -> (RuleSet, Vec<Entity>, Vec<Item>) {
        let rules = RuleSet::default();
        let entities = vec![
            Entity::new("knight", "Knight")
                .with_stat("hp", 200.0, 20.0)
                .with_stat("atk", 20.0, 2.0)
                .with_stat("aspd", 1.0, 0.0),
            Entity::new("rat", "Rat")
                .with_stat("hp", 20.0, 1.0)
                .with_stat("atk", 2.0, 0.1)
                .with_stat("aspd", 1.0, 0.0),
        ];
        let items = vec![Item::new("sword", "Sword")
            .targeting("knight")
            .with_modifier(ItemModifier::add("atk", 10.0))];
        (rules, entities, items)
    }

    #[test]
    fn test_base_damage_default_formula() {
        let rules = RuleSet::default();
        let a = StatBlock::from_pairs([(StatName::new("atk"), 100.0)]);
        let b = StatBlock::from_pairs([(StatName::new("def"), 100.0)]);
        assert!((base_damage(&rules, &a, &b).unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_entity() {
        let (rules, entities, items) = roster();
        let arena = Arena::new(&rules, &entities, &items);
        let err = arena.duel("knight", "dragon", 1).unwrap_err();
        assert_eq!(err, SimulationError::UnknownEntity("dragon".into()));
    }

    #[test]
    fn test_items_reach_the_duel() {
        let (rules, entities, items) = roster();
        let arena = Arena::new(&rules, &entities, &items);
        let duel = arena.duel("knight", "rat", 1).unwrap();
        // (20 + 10) * 100 / (100 + 0)
        assert!((duel.base_damage(crate::types::Side::Attacker) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_run_battle_batch() {
        let (rules, entities, items) = roster();
        let arena = Arena::new(&rules, &entities, &items);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let result = run_battle_batch(&arena, "knight", "rat", 5, 200, &mut rng).unwrap();
        assert_eq!(result.trials, 200);
        assert!(result.win_rate > 99.0);
    }

    #[test]
    fn test_out_of_range_variance_rejected() {
        let (rules, mut entities, items) = roster();
        entities[1].variance = 1e308;
        let arena = Arena::new(&rules, &entities, &items);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let err = run_battle_batch(&arena, "knight", "rat", 1, 10, &mut rng).unwrap_err();
        assert!(matches!(err, SimulationError::InvalidVariance { .. }));
    }

    #[test]
    fn test_level_zero_rejected() {
        let (rules, entities, items) = roster();
        let arena = Arena::new(&rules, &entities, &items);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let config = MonteCarloConfig::default();
        let err = run_monte_carlo(&arena, "knight", "rat", 0, &config, &mut rng).unwrap_err();
        assert_eq!(err, SimulationError::InvalidLevel(0));
    }
}
