//! Designer-authored records: entities, items and combat traits

use crate::types::{EntityId, ModifierOp, StatName};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Linear per-level progression of one stat
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatCurve {
    pub base: f64,
    pub growth: f64,
}

impl StatCurve {
    pub fn new(base: f64, growth: f64) -> Self {
        StatCurve { base, growth }
    }

    /// Value at a 1-indexed level: `base + (level - 1) * growth`
    pub fn at(&self, level: u32) -> f64 {
        self.base + (level.max(1) - 1) as f64 * self.growth
    }
}

/// A character whose stats grow with level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    /// Display color, carried through for charting
    #[serde(default)]
    pub color_tag: String,
    /// Symmetric damage variance as a fraction (0.1 = ±10%)
    #[serde(default)]
    pub variance: f64,
    #[serde(default)]
    pub stats: BTreeMap<StatName, StatCurve>,
}

impl Entity {
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>) -> Self {
        Entity {
            id: id.into(),
            name: name.into(),
            color_tag: String::new(),
            variance: 0.0,
            stats: BTreeMap::new(),
        }
    }

    /// Builder: set a stat curve
    pub fn with_stat(mut self, stat: &str, base: f64, growth: f64) -> Self {
        self.stats.insert(StatName::new(stat), StatCurve::new(base, growth));
        self
    }

    /// Builder: set damage variance
    pub fn with_variance(mut self, variance: f64) -> Self {
        self.variance = variance;
        self
    }

    /// Curve for a stat, `{0, 0}` if the entity does not define it
    pub fn curve(&self, stat: &str) -> StatCurve {
        self.stats.get(stat).copied().unwrap_or_default()
    }

    /// Copy of this entity with one stat's growth replaced
    pub fn with_growth(&self, stat: &StatName, growth: f64) -> Entity {
        let mut copy = self.clone();
        let curve = copy.stats.entry(stat.clone()).or_default();
        curve.growth = growth;
        copy
    }
}

/// One stat modification carried by an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemModifier {
    pub stat: StatName,
    pub op: ModifierOp,
    pub amount: f64,
}

impl ItemModifier {
    pub fn add(stat: &str, amount: f64) -> Self {
        ItemModifier {
            stat: StatName::new(stat),
            op: ModifierOp::Add,
            amount,
        }
    }

    pub fn multiply(stat: &str, amount: f64) -> Self {
        ItemModifier {
            stat: StatName::new(stat),
            op: ModifierOp::Multiply,
            amount,
        }
    }
}

/// Equipment: ordered stat modifiers plus combat traits, bound to target entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub targets: BTreeSet<EntityId>,
    #[serde(default)]
    pub modifiers: Vec<ItemModifier>,
    #[serde(default)]
    pub traits: Vec<Trait>,
}

fn default_active() -> bool {
    true
}

impl Item {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Item {
            id: id.into(),
            name: name.into(),
            active: true,
            targets: BTreeSet::new(),
            modifiers: Vec::new(),
            traits: Vec::new(),
        }
    }

    pub fn targeting(mut self, entity: impl Into<EntityId>) -> Self {
        self.targets.insert(entity.into());
        self
    }

    pub fn with_modifier(mut self, modifier: ItemModifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    pub fn with_trait(mut self, t: Trait) -> Self {
        self.traits.push(t);
        self
    }

    /// Whether this item contributes to `entity`
    pub fn applies_to(&self, entity: &EntityId) -> bool {
        self.active && self.targets.contains(entity)
    }
}

/// Combat moment that can fire a trait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitTrigger {
    /// Once, before the first tick
    BattleStart,
    /// Owner attempts an attack, hit or miss
    OnAttack,
    /// Owner's attack lands
    OnHit,
    /// Owner's attack lands as a critical hit
    OnCrit,
    /// Owner's attack misses
    OnMiss,
    /// Owner evades an incoming attack
    OnDodge,
    /// Owner takes hit damage and survives
    OnDamaged,
}

/// Gate evaluated each time the trigger fires
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraitCondition {
    #[default]
    Always,
    /// Fires with `percent` chance (0-100)
    Chance { percent: f64 },
}

/// Who a trait effect lands on, relative to the trait's owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitTarget {
    #[serde(rename = "self")]
    Owner,
    Enemy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraitEffect {
    Heal,
    Damage,
    /// Adds `magnitude` to a stat, reverting after `duration` if one is set
    StatChange { stat: StatName },
}

/// Conditional combat effect carried by an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trait {
    pub name: String,
    pub trigger: TraitTrigger,
    #[serde(default)]
    pub condition: TraitCondition,
    pub effect: TraitEffect,
    pub target: TraitTarget,
    pub magnitude: f64,
    #[serde(default)]
    pub duration: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curve_at_level() {
        let curve = StatCurve::new(100.0, 10.0);
        assert!((curve.at(1) - 100.0).abs() < f64::EPSILON);
        assert!((curve.at(5) - 140.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_entity_missing_curve_defaults_to_zero() {
        let entity = Entity::new("knight", "Knight").with_stat("hp", 100.0, 5.0);
        assert_eq!(entity.curve("hp"), StatCurve::new(100.0, 5.0));
        assert_eq!(entity.curve("atk"), StatCurve::default());
    }

    #[test]
    fn test_with_growth_leaves_original() {
        let entity = Entity::new("knight", "Knight").with_stat("atk", 10.0, 1.0);
        let tuned = entity.with_growth(&StatName::new("atk"), 3.0);
        assert!((tuned.curve("atk").growth - 3.0).abs() < f64::EPSILON);
        assert!((entity.curve("atk").growth - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_item_applies_only_when_active_and_targeted() {
        let knight = EntityId::from("knight");
        let mut item = Item::new("sword", "Sword").targeting("knight");
        assert!(item.applies_to(&knight));
        assert!(!item.applies_to(&EntityId::from("mage")));
        item.active = false;
        assert!(!item.applies_to(&knight));
    }

    #[test]
    fn test_trait_deserialization() {
        let json = r#"{
            "name": "Vampiric",
            "trigger": "on_crit",
            "condition": { "type": "chance", "percent": 50 },
            "effect": { "type": "heal" },
            "target": "self",
            "magnitude": 20
        }"#;
        let t: Trait = serde_json::from_str(json).unwrap();
        assert_eq!(t.trigger, TraitTrigger::OnCrit);
        assert_eq!(t.target, TraitTarget::Owner);
        assert_eq!(t.condition, TraitCondition::Chance { percent: 50.0 });
        assert!(t.duration.is_none());
    }
}
