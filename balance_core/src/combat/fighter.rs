//! Combatants and their trial-local state

use super::result::SideTally;
use super::{SimulationError, MAX_VARIANCE};
use crate::model::{Entity, Item, Trait};
use crate::rules::{CombatRoles, RuleSet};
use crate::stat_block::{resolve, resolve_traits, StatBlock};
use crate::types::{EntityId, StatName};

/// A resolved side of a duel: stats, variance and carried traits
#[derive(Debug, Clone, PartialEq)]
pub struct Combatant {
    pub id: EntityId,
    pub name: String,
    pub stats: StatBlock,
    pub variance: f64,
    pub traits: Vec<Trait>,
}

impl Combatant {
    /// Resolve an entity at a level with its applicable items
    pub fn from_entity(
        entity: &Entity,
        level: u32,
        items: &[Item],
        rules: &RuleSet,
    ) -> Result<Self, SimulationError> {
        if level == 0 {
            return Err(SimulationError::InvalidLevel(level));
        }
        let stats = resolve(entity, level, items, rules);
        let traits = resolve_traits(entity, items).into_iter().cloned().collect();
        Self::new(entity.id.clone(), entity.name.clone(), stats, entity.variance, traits)
    }

    /// Build from an explicit stat block, rejecting non-finite stats
    pub fn new(
        id: EntityId,
        name: String,
        stats: StatBlock,
        variance: f64,
        traits: Vec<Trait>,
    ) -> Result<Self, SimulationError> {
        if let Some(stat) = stats.first_non_finite() {
            return Err(SimulationError::NonFiniteStat {
                entity: id,
                stat: stat.clone(),
            });
        }
        if !(0.0..=MAX_VARIANCE).contains(&variance) {
            return Err(SimulationError::InvalidVariance { entity: id, variance });
        }
        Ok(Combatant {
            id,
            name,
            stats,
            variance,
            traits,
        })
    }
}

/// A stat change that reverts at `expires_at`
#[derive(Debug, Clone)]
pub(crate) struct TimedChange {
    pub stat: StatName,
    pub amount: f64,
    pub expires_at: f64,
}

/// Mutable per-trial state of one side
#[derive(Debug, Clone)]
pub(crate) struct Fighter<'a> {
    pub combatant: &'a Combatant,
    pub stats: StatBlock,
    pub hp: f64,
    pub max_hp: f64,
    pub interval: Option<f64>,
    pub next_attack: f64,
    pub evasion: f64,
    pub crit_chance: f64,
    pub crit_multiplier: f64,
    /// Damage of a plain hit before variance and crits
    pub base_damage: f64,
    pub changes: Vec<TimedChange>,
    pub tally: SideTally,
}

impl<'a> Fighter<'a> {
    pub fn new(combatant: &'a Combatant, roles: &CombatRoles, base_damage: f64) -> Self {
        let max_hp = combatant.stats.max_hp(roles);
        let interval = combatant.stats.attack_interval(roles);
        Fighter {
            combatant,
            stats: combatant.stats.clone(),
            hp: max_hp,
            max_hp,
            interval,
            // both sides are ready at t = 0
            next_attack: if interval.is_some() { 0.0 } else { f64::INFINITY },
            evasion: combatant.stats.evasion(roles),
            crit_chance: combatant.stats.crit_chance(roles),
            crit_multiplier: combatant.stats.crit_multiplier(roles),
            base_damage,
            changes: Vec::new(),
            tally: SideTally::default(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    pub fn variance(&self) -> f64 {
        self.combatant.variance
    }

    /// Whether a cooldown has come due at `time`
    pub fn ready(&self, time: f64) -> bool {
        self.next_attack <= time + 1e-9
    }

    pub fn advance_cooldown(&mut self) {
        match self.interval {
            Some(interval) => self.next_attack += interval,
            None => self.next_attack = f64::INFINITY,
        }
    }

    pub fn heal(&mut self, amount: f64) {
        self.hp = (self.hp + amount).min(self.max_hp);
    }

    /// Add `amount` to a stat and refresh the role values read from it
    ///
    /// Returns `false` when the stat is not in the block. Any applied change
    /// may feed the damage formula, so callers re-evaluate base damage.
    pub fn shift_stat(&mut self, stat: &StatName, amount: f64, roles: &CombatRoles, time: f64) -> bool {
        let Some(current) = self.stats.get(stat.as_str()) else {
            return false;
        };
        self.stats = self.stats.with_value(stat.as_str(), current + amount);

        if *stat == roles.hp {
            self.max_hp += amount;
            self.hp = (self.hp + amount.max(0.0)).min(self.max_hp);
        } else if *stat == roles.speed {
            let was_idle = self.interval.is_none();
            self.interval = self.stats.attack_interval(roles);
            match self.interval {
                Some(interval) if was_idle => self.next_attack = time + interval,
                None => self.next_attack = f64::INFINITY,
                _ => {}
            }
        } else if *stat == roles.evasion {
            self.evasion = self.stats.evasion(roles);
        } else if *stat == roles.crit_chance {
            self.crit_chance = self.stats.crit_chance(roles);
        } else if *stat == roles.crit_damage {
            self.crit_multiplier = self.stats.crit_multiplier(roles);
        }
        true
    }

    /// Revert every change whose duration has elapsed; returns whether any did
    pub fn expire_changes(&mut self, roles: &CombatRoles, time: f64) -> bool {
        if self.changes.is_empty() {
            return false;
        }
        let (expired, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.changes)
            .into_iter()
            .partition(|c| c.expires_at <= time + 1e-9);
        self.changes = kept;
        for change in &expired {
            self.shift_stat(&change.stat, -change.amount, roles, time);
        }
        !expired.is_empty()
    }
}
