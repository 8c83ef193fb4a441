//! Trial outcomes and aggregated simulation results

use crate::types::Side;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of a logged combat event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A landed, non-critical hit
    Attack,
    /// A landed critical hit
    Crit,
    Miss,
    Die,
    /// A trait effect; `value` is the magnitude applied
    Trait,
}

/// One entry of a trial's playback log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatEvent {
    pub time: f64,
    pub kind: EventKind,
    pub actor: Side,
    pub target: Side,
    pub value: f64,
    /// Trait name for `Trait` events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Per-side counters for one trial
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SideTally {
    pub attempts: u32,
    pub hits: u32,
    pub crits: u32,
    pub misses: u32,
    /// Hit damage dealt, capped at the target's remaining HP
    pub damage: f64,
}

/// Everything recorded about a single trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialOutcome {
    /// `None` when the time limit was reached
    pub winner: Option<Side>,
    /// Time of the killing blow, or the time limit for a draw
    pub time: f64,
    /// Side that attempted the first attack
    pub first_actor: Option<Side>,
    pub attacker: SideTally,
    pub defender: SideTally,
    /// Damage of the killing blow beyond what was needed to reach 0 HP
    pub overkill: Option<f64>,
    /// Winner's remaining HP as a fraction of its starting HP
    pub winner_hp_fraction: Option<f64>,
    /// Filled only when the trial was run with logging on
    pub events: Vec<CombatEvent>,
}

impl TrialOutcome {
    pub fn tally(&self, side: Side) -> &SideTally {
        match side {
            Side::Attacker => &self.attacker,
            Side::Defender => &self.defender,
        }
    }

    /// Completed attack exchanges, counted as the attacker's attempts
    pub fn turns(&self) -> u32 {
        self.attacker.attempts
    }

    pub fn is_draw(&self) -> bool {
        self.winner.is_none()
    }
}

/// Summary of N independent trials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub trials: u32,
    pub wins: u32,
    /// Attacker wins as a percentage of all trials
    pub win_rate: f64,
    /// Mean time-to-kill over the attacker's winning trials
    pub avg_ttk: f64,
    /// Mean turns over the attacker's winning trials
    pub avg_turns: f64,
}

/// A retained trial log for playback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialLog {
    pub trial: u32,
    pub winner: Option<Side>,
    pub events: Vec<CombatEvent>,
}

/// Detailed statistics over a large number of trials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloResult {
    #[serde(flatten)]
    pub summary: BatchResult,
    pub defender_win_rate: f64,
    pub draw_rate: f64,
    /// Percentage of trials won by whichever side attacked first
    pub first_turn_win_rate: f64,
    /// Mean turns over all trials
    pub avg_turns_all: f64,
    pub avg_damage_per_turn: f64,
    /// Mean overkill over trials that ended in a kill
    pub avg_overkill: f64,
    /// Observed attacker crits per landed hit (percent)
    pub realized_crit_rate: f64,
    /// Observed attacker misses per attempt (percent)
    pub realized_dodge_rate: f64,
    /// Configured attacker crit chance (percent)
    pub nominal_crit_rate: f64,
    /// Configured defender evasion (percent)
    pub nominal_dodge_rate: f64,
    /// Turn count → number of trials
    pub turn_distribution: BTreeMap<u32, u32>,
    /// Remaining-HP bucket (lower bound, percent) → attacker wins
    pub win_hp_distribution_attacker: BTreeMap<u32, u32>,
    /// Remaining-HP bucket (lower bound, percent) → defender wins
    pub win_hp_distribution_defender: BTreeMap<u32, u32>,
    pub sample_logs: Vec<TrialLog>,
}

impl BatchResult {
    /// Get a summary string
    pub fn summary(&self) -> String {
        format!(
            "{:.1}% win rate over {} trials, {:.2} avg TTK",
            self.win_rate, self.trials, self.avg_ttk
        )
    }
}

/// Bucket lower bound (percent) for a remaining-HP fraction
pub fn hp_bucket(fraction: f64, buckets: u32) -> u32 {
    let buckets = buckets.clamp(1, 100);
    let index = (fraction.clamp(0.0, 1.0) * buckets as f64).floor() as u32;
    index.min(buckets - 1) * 100 / buckets
}
