//! Core identifier and selector types

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Interned stat identifier (e.g. `hp`, `atk`)
///
/// Cloning is a reference-count bump, so stat names can be handed around
/// freely while resolving blocks level after level.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct StatName(Arc<str>);

impl StatName {
    pub fn new(name: &str) -> Self {
        StatName(Arc::from(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StatName {
    fn from(s: &str) -> Self {
        StatName::new(s)
    }
}

impl From<String> for StatName {
    fn from(s: String) -> Self {
        StatName(Arc::from(s))
    }
}

impl Borrow<str> for StatName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for StatName {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for StatName {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl fmt::Display for StatName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for StatName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_str().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StatName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(StatName::from(s))
    }
}

/// Identifier for an entity in a project
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        EntityId(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        EntityId(s)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which rule-set formula reduces a stat block to a scalar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Combat power, evaluated over the entity's own stats
    Cp,
    /// Damage formula, evaluated against a zero-valued opponent
    Dmg,
    /// Hit formula, evaluated against a zero-valued opponent
    Hit,
}

impl Metric {
    pub fn all() -> &'static [Metric] {
        &[Metric::Cp, Metric::Dmg, Metric::Hit]
    }

    /// Whether the metric formula expects the two-sided context
    pub fn is_two_sided(self) -> bool {
        !matches!(self, Metric::Cp)
    }
}

impl std::str::FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cp" => Ok(Metric::Cp),
            "dmg" | "damage" => Ok(Metric::Dmg),
            "hit" => Ok(Metric::Hit),
            other => Err(format!("unknown metric '{}' (expected cp, dmg or hit)", other)),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Cp => f.write_str("cp"),
            Metric::Dmg => f.write_str("dmg"),
            Metric::Hit => f.write_str("hit"),
        }
    }
}

/// Item modifier operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierOp {
    Add,
    Multiply,
}

impl ModifierOp {
    /// Apply this operator to a running stat value
    pub fn apply(self, value: f64, amount: f64) -> f64 {
        match self {
            ModifierOp::Add => value + amount,
            ModifierOp::Multiply => value * amount,
        }
    }
}

/// One side of a duel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Attacker,
    Defender,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Attacker => Side::Defender,
            Side::Defender => Side::Attacker,
        }
    }
}
