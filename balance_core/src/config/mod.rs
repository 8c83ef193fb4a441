//! Configuration parsing from TOML
//!
//! The core never touches the filesystem; callers read files and hand the
//! text to [`parse_project`] or [`parse_toml`].

use crate::combat::{Arena, MAX_VARIANCE};
use crate::formula::FormulaError;
use crate::model::{Entity, Item};
use crate::rules::RuleSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::warn;

/// Configuration loading error
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Configuration validation error: {0}")]
    ValidationError(String),
    #[error("Invalid {field}: {source}")]
    Formula {
        field: &'static str,
        source: FormulaError,
    },
}

/// Parse a TOML string into any deserializable config type
pub fn parse_toml<T: serde::de::DeserializeOwned>(content: &str) -> Result<T, ConfigError> {
    let config: T = toml::from_str(content)?;
    Ok(config)
}

/// A rule set with the entities and items it governs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub rules: RuleSet,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub items: Vec<Item>,
}

impl Project {
    pub fn new(rules: RuleSet) -> Self {
        Project {
            rules,
            entities: Vec::new(),
            items: Vec::new(),
        }
    }

    pub fn arena(&self) -> Arena<'_> {
        Arena::new(&self.rules, &self.entities, &self.items)
    }

    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id.0 == id)
    }

    /// Check ids are unique and numeric settings are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rules.validate()?;

        let mut seen = BTreeSet::new();
        for entity in &self.entities {
            if !seen.insert(entity.id.0.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate entity id '{}'",
                    entity.id
                )));
            }
            if !(0.0..=MAX_VARIANCE).contains(&entity.variance) {
                return Err(ConfigError::ValidationError(format!(
                    "entity '{}' has variance {}; expected 0 to {}",
                    entity.id, entity.variance, MAX_VARIANCE
                )));
            }
            for (stat, curve) in &entity.stats {
                if !curve.base.is_finite() || !curve.growth.is_finite() {
                    return Err(ConfigError::ValidationError(format!(
                        "entity '{}' has a non-finite curve for '{}'",
                        entity.id, stat
                    )));
                }
            }
        }

        let mut item_ids = BTreeSet::new();
        for item in &self.items {
            if !item_ids.insert(item.id.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate item id '{}'",
                    item.id
                )));
            }
            for target in &item.targets {
                if !seen.contains(target.0.as_str()) {
                    warn!(item = %item.id, target = %target, "item targets an unknown entity");
                }
            }
        }
        Ok(())
    }
}

/// Parse and validate a project file
pub fn parse_project(content: &str) -> Result<Project, ConfigError> {
    let project: Project = parse_toml(content)?;
    project.validate()?;
    Ok(project)
}

/// Built-in sample project
pub fn default_project() -> Project {
    let toml = include_str!("../../config/default_project.toml");
    parse_project(toml).unwrap_or_else(|_| Project::new(RuleSet::default()))
}
