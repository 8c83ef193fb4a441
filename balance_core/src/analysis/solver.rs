//! Growth solver - find the growth rate that hits a metric target

use super::series::evaluate_metric;
use crate::model::{Entity, Item};
use crate::rules::RuleSet;
use crate::stat_block::resolve;
use crate::types::{Metric, StatName};
use serde::{Deserialize, Serialize};
use tracing::trace;

const INITIAL_STEP: f64 = 10.0;
const MAX_BRACKET_STEPS: u32 = 100;
const MAX_BISECT_STEPS: u32 = 100;
const TOLERANCE: f64 = 0.001;

/// What to solve for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthTarget {
    pub stat: StatName,
    pub metric: Metric,
    pub level: u32,
    pub value: f64,
}

/// Metric value at the target level with `stat`'s growth set to `growth`
///
/// `None` when the formula fails or the result is not finite.
fn probe(entity: &Entity, items: &[Item], rules: &RuleSet, target: &GrowthTarget, growth: f64) -> Option<f64> {
    let candidate = entity.with_growth(&target.stat, growth);
    let block = resolve(&candidate, target.level, items, rules);
    evaluate_metric(rules, &block, target.metric)
        .ok()
        .filter(|v| v.is_finite())
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Solve for the growth of `target.stat` that makes the metric equal
/// `target.value` at `target.level`
///
/// Brackets the root by doubling steps away from 0, then bisects. Returns
/// the closest growth seen, rounded to 3 decimals, or `None` if no bracket
/// is found or any evaluation along the way fails.
pub fn solve_growth(entity: &Entity, items: &[Item], rules: &RuleSet, target: &GrowthTarget) -> Option<f64> {
    let f = |g: f64| probe(entity, items, rules, target, g).map(|v| v - target.value);

    let err0 = f(0.0)?;
    if err0 == 0.0 {
        return Some(0.0);
    }

    // Walk up when the metric rises with growth and sits below the target
    let slope = f(INITIAL_STEP)? - err0;
    let direction = if slope == 0.0 || (slope > 0.0) == (err0 < 0.0) { 1.0 } else { -1.0 };

    let (mut lo, mut err_lo) = (0.0, err0);
    let mut step = INITIAL_STEP * direction;
    let mut bracket = None;
    for i in 0..MAX_BRACKET_STEPS {
        let err = f(step)?;
        trace!(step = i, growth = step, error = err, "bracketing");
        if err == 0.0 {
            return Some(round3(step));
        }
        if err.signum() != err_lo.signum() {
            bracket = Some((lo, err_lo, step));
            break;
        }
        lo = step;
        err_lo = err;
        step *= 2.0;
    }
    let (mut lo, mut err_lo, mut hi) = bracket?;

    let mut best = if err_lo.abs() <= f(hi)?.abs() { lo } else { hi };
    let mut best_err = f(best)?.abs();
    for i in 0..MAX_BISECT_STEPS {
        let mid = (lo + hi) / 2.0;
        let err = f(mid)?;
        trace!(step = i, growth = mid, error = err, "bisecting");
        if err.abs() < best_err {
            best = mid;
            best_err = err.abs();
        }
        if best_err < TOLERANCE {
            break;
        }
        if err.signum() == err_lo.signum() {
            lo = mid;
            err_lo = err;
        } else {
            hi = mid;
        }
    }

    Some(round3(best))
}
