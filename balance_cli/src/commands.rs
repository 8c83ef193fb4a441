//! Subcommand implementations; each returns a serializable report

use crate::error::CliError;
use balance_core::analysis::{evaluate_metric, EntitySeries};
use balance_core::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub formula: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub identifiers: Vec<String>,
}

pub fn check(source: &str) -> CheckReport {
    match Formula::compile(source) {
        Ok(formula) => CheckReport {
            formula: source.to_string(),
            valid: true,
            error: None,
            identifiers: formula.identifiers().into_iter().map(String::from).collect(),
        },
        Err(e) => CheckReport {
            formula: source.to_string(),
            valid: false,
            error: Some(e.to_string()),
            identifiers: Vec::new(),
        },
    }
}

/// Parse `name=value` pairs into a context
pub fn parse_vars(vars: &[String]) -> Result<FormulaContext, CliError> {
    vars.iter()
        .map(|pair| {
            let (name, value) = pair
                .split_once('=')
                .ok_or_else(|| CliError::Argument(format!("expected name=value, got '{}'", pair)))?;
            let value: f64 = value
                .trim()
                .parse()
                .map_err(|_| CliError::Argument(format!("'{}' is not a number", value)))?;
            Ok((name.trim().to_string(), value))
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct ResolveReport {
    pub entity: EntityId,
    pub level: u32,
    pub stats: StatBlock,
    pub cp: f64,
}

pub fn resolve_entity(project: &Project, id: &str, level: u32) -> Result<ResolveReport, CliError> {
    let entity = find(project, id)?;
    let stats = resolve(entity, level, &project.items, &project.rules);
    let cp = evaluate_metric(&project.rules, &stats, Metric::Cp).unwrap_or(0.0);
    Ok(ResolveReport {
        entity: entity.id.clone(),
        level,
        stats,
        cp,
    })
}

pub fn series(project: &Project, metric: Metric, max_level: u32) -> Vec<EntitySeries> {
    let series = metric_series(&project.rules, &project.entities, &project.items, metric, max_level);
    debug!(%metric, max_level, entities = series.len(), "computed series");
    series
}

pub fn crossovers(project: &Project, metric: Metric, max_level: u32) -> Vec<CrossoverEvent> {
    let events = analyze(&series(project, metric, max_level), max_level);
    info!(%metric, events = events.len(), "crossover scan finished");
    events
}

pub fn batch(
    project: &Project,
    attacker: &str,
    defender: &str,
    level: u32,
    trials: u32,
    rng: &mut ChaCha8Rng,
) -> Result<BatchResult, CliError> {
    let result = run_battle_batch(&project.arena(), attacker, defender, level, trials, rng)?;
    info!("{} vs {}: {}", attacker, defender, result.summary());
    Ok(result)
}

pub fn monte_carlo(
    project: &Project,
    attacker: &str,
    defender: &str,
    level: u32,
    config: &MonteCarloConfig,
    rng: &mut ChaCha8Rng,
) -> Result<MonteCarloResult, CliError> {
    let result = run_monte_carlo(&project.arena(), attacker, defender, level, config, rng)?;
    info!(
        "{} vs {}: {}, {:.1}% draws",
        attacker,
        defender,
        result.summary.summary(),
        result.draw_rate
    );
    Ok(result)
}

#[derive(Debug, Serialize)]
pub struct SolveReport {
    pub entity: EntityId,
    #[serde(flatten)]
    pub target: GrowthTarget,
    pub growth: f64,
}

pub fn solve(project: &Project, id: &str, target: GrowthTarget) -> Result<SolveReport, CliError> {
    let entity = find(project, id)?;
    if !project.rules.is_declared(target.stat.as_str()) {
        return Err(CliError::Argument(format!("stat '{}' is not declared", target.stat)));
    }
    let growth = solve_growth(entity, &project.items, &project.rules, &target).ok_or_else(|| {
        CliError::Unsolved(format!(
            "no growth for {} reaches {} {} at level {}",
            target.stat, target.metric, target.value, target.level
        ))
    })?;
    Ok(SolveReport {
        entity: entity.id.clone(),
        target,
        growth,
    })
}

fn find<'p>(project: &'p Project, id: &str) -> Result<&'p Entity, CliError> {
    project
        .entity(id)
        .ok_or_else(|| CliError::Argument(format!("unknown entity '{}'", id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_check_reports_errors() {
        let ok = check("a.atk * 2");
        assert!(ok.valid);
        assert_eq!(ok.identifiers, vec!["a.atk".to_string()]);

        let bad = check("atk +");
        assert!(!bad.valid);
        assert!(bad.error.is_some());
    }

    #[test]
    fn test_parse_vars() {
        let ctx = parse_vars(&["atk=100".into(), "def = 0".into()]).unwrap();
        assert_eq!(ctx.get("atk"), Some(100.0));
        assert_eq!(ctx.get("def"), Some(0.0));
        assert!(parse_vars(&["atk".into()]).is_err());
        assert!(parse_vars(&["atk=lots".into()]).is_err());
    }

    #[test]
    fn test_resolve_unknown_entity() {
        let project = default_project();
        assert!(resolve_entity(&project, "nobody", 1).is_err());
    }

    #[test]
    fn test_batch_on_sample() {
        let project = default_project();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let result = batch(&project, "knight", "mage", 5, 50, &mut rng).unwrap();
        assert_eq!(result.trials, 50);
    }

    #[test]
    fn test_solve_rejects_undeclared_stat() {
        let project = default_project();
        let target = GrowthTarget {
            stat: StatName::new("mana"),
            metric: Metric::Cp,
            level: 10,
            value: 100.0,
        };
        assert!(matches!(solve(&project, "knight", target), Err(CliError::Argument(_))));
    }
}
