//! RuleSet - declared stats and the formulas that give them meaning

use crate::config::ConfigError;
use crate::formula::{ContextRules, Formula, FormulaError};
use crate::model::{Entity, StatCurve};
use crate::stat_block::StatBlock;
use crate::types::{EntityId, Metric, StatName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DEFAULT_DMG_FORMULA: &str = "a.atk * (100 / (100 + b.def))";
const DEFAULT_HIT_FORMULA: &str = "clamp(100 - b.eva, 0, 100)";
const DEFAULT_CP_FORMULA: &str = "hp * 0.5 + atk * 2 + def * 1.5";

/// Which declared stats the combat simulator reads, plus trial constants
///
/// A role whose stat is not declared falls back to its default value
/// (hp 0, attack speed 1, evasion 0, crit chance 0, crit damage
/// `default_crit_multiplier`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatRoles {
    pub hp: StatName,
    pub speed: StatName,
    /// Percent (0-100) chance an incoming attack misses
    pub evasion: StatName,
    /// Percent (0-100) chance a landed hit is critical
    pub crit_chance: StatName,
    /// Damage multiplier applied to critical hits
    pub crit_damage: StatName,
    pub default_crit_multiplier: f64,
    /// Simulated time advanced per step
    pub tick: f64,
    /// Simulated time after which a trial is a draw
    pub time_limit: f64,
    /// Bucket count for remaining-HP histograms
    pub hp_buckets: u32,
}

impl Default for CombatRoles {
    fn default() -> Self {
        CombatRoles {
            hp: StatName::new("hp"),
            speed: StatName::new("aspd"),
            evasion: StatName::new("eva"),
            crit_chance: StatName::new("crit"),
            crit_damage: StatName::new("crit_dmg"),
            default_crit_multiplier: 1.5,
            tick: 0.1,
            time_limit: 120.0,
            hp_buckets: 10,
        }
    }
}

/// Active stat set and formulas for a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RuleSetFile")]
pub struct RuleSet {
    /// Declared stats, in display order
    pub stats: Vec<StatName>,
    pub dmg_formula: Formula,
    pub hit_formula: Formula,
    pub cp_formula: Formula,
    /// Curves new entities start from
    pub default_values: BTreeMap<StatName, StatCurve>,
    pub combat: CombatRoles,
    pub context: ContextRules,
}

/// Serialized shape of a rule set; formulas are validated on conversion
#[derive(Debug, Clone, Deserialize)]
struct RuleSetFile {
    stats: Vec<StatName>,
    dmg_formula: String,
    hit_formula: String,
    cp_formula: String,
    #[serde(default)]
    default_values: BTreeMap<StatName, StatCurve>,
    #[serde(default)]
    combat: CombatRoles,
    #[serde(default)]
    context: ContextRules,
}

impl TryFrom<RuleSetFile> for RuleSet {
    type Error = ConfigError;

    fn try_from(file: RuleSetFile) -> Result<Self, Self::Error> {
        let compile = |field: &'static str, source: &str| {
            Formula::compile(source).map_err(|source| ConfigError::Formula { field, source })
        };

        let rules = RuleSet {
            dmg_formula: compile("dmg_formula", &file.dmg_formula)?,
            hit_formula: compile("hit_formula", &file.hit_formula)?,
            cp_formula: compile("cp_formula", &file.cp_formula)?,
            stats: file.stats,
            default_values: file.default_values,
            combat: file.combat,
            context: file.context,
        };
        rules.validate()?;
        Ok(rules)
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        let stats: Vec<StatName> = ["hp", "atk", "def", "aspd", "eva", "crit", "crit_dmg"]
            .into_iter()
            .map(StatName::new)
            .collect();

        let default_values = [
            ("hp", 100.0, 10.0),
            ("atk", 10.0, 2.0),
            ("def", 5.0, 1.0),
            ("aspd", 1.0, 0.0),
            ("eva", 5.0, 0.0),
            ("crit", 5.0, 0.0),
            ("crit_dmg", 1.5, 0.0),
        ]
        .into_iter()
        .map(|(name, base, growth)| (StatName::new(name), StatCurve::new(base, growth)))
        .collect();

        RuleSet {
            stats,
            dmg_formula: compile_or_zero(DEFAULT_DMG_FORMULA),
            hit_formula: compile_or_zero(DEFAULT_HIT_FORMULA),
            cp_formula: compile_or_zero(DEFAULT_CP_FORMULA),
            default_values,
            combat: CombatRoles::default(),
            context: ContextRules::default(),
        }
    }
}

fn compile_or_zero(source: &str) -> Formula {
    Formula::compile(source).unwrap_or_else(|_| Formula::constant(0.0))
}

impl RuleSet {
    /// Build a rule set, validating every formula
    pub fn new(
        stats: Vec<StatName>,
        dmg_formula: &str,
        hit_formula: &str,
        cp_formula: &str,
    ) -> Result<Self, FormulaError> {
        Ok(RuleSet {
            stats,
            dmg_formula: Formula::compile(dmg_formula)?,
            hit_formula: Formula::compile(hit_formula)?,
            cp_formula: Formula::compile(cp_formula)?,
            default_values: BTreeMap::new(),
            combat: CombatRoles::default(),
            context: ContextRules::default(),
        })
    }

    /// Structural checks beyond formula syntax
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stats.is_empty() {
            return Err(ConfigError::ValidationError("rule set declares no stats".into()));
        }
        for (i, stat) in self.stats.iter().enumerate() {
            if self.stats[..i].contains(stat) {
                return Err(ConfigError::ValidationError(format!(
                    "stat '{}' declared twice",
                    stat
                )));
            }
        }
        if !(self.combat.tick > 0.0) || !(self.combat.time_limit > 0.0) {
            return Err(ConfigError::ValidationError(
                "combat tick and time_limit must be positive".into(),
            ));
        }
        if !(1..=100).contains(&self.combat.hp_buckets) {
            return Err(ConfigError::ValidationError(format!(
                "hp_buckets must be between 1 and 100, got {}",
                self.combat.hp_buckets
            )));
        }
        Ok(())
    }

    pub fn formula(&self, metric: Metric) -> &Formula {
        match metric {
            Metric::Cp => &self.cp_formula,
            Metric::Dmg => &self.dmg_formula,
            Metric::Hit => &self.hit_formula,
        }
    }

    /// Replace a formula; the old one is kept if the new source is invalid
    pub fn set_formula(&mut self, metric: Metric, source: &str) -> Result<(), FormulaError> {
        let formula = Formula::compile(source)?;
        match metric {
            Metric::Cp => self.cp_formula = formula,
            Metric::Dmg => self.dmg_formula = formula,
            Metric::Hit => self.hit_formula = formula,
        }
        Ok(())
    }

    pub fn is_declared(&self, stat: &str) -> bool {
        self.stats.iter().any(|s| s.as_str() == stat)
    }

    /// Opponent whose every declared stat is zero
    pub fn zero_block(&self) -> StatBlock {
        StatBlock::zeroed(&self.stats)
    }

    /// New entity seeded with this rule set's default curves
    pub fn new_entity(&self, id: impl Into<EntityId>, name: impl Into<String>) -> Entity {
        let mut entity = Entity::new(id, name);
        for stat in &self.stats {
            let curve = self.default_values.get(stat).copied().unwrap_or_default();
            entity.stats.insert(stat.clone(), curve);
        }
        entity
    }
}
