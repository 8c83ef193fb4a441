//! Batch and Monte Carlo runs over independent trials

use super::duel::Duel;
use super::result::{hp_bucket, BatchResult, MonteCarloResult, TrialLog, TrialOutcome};
use super::SimulationError;
use crate::types::Side;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Settings for a Monte Carlo run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    pub trials: u32,
    /// Number of leading trials that keep their full event log
    pub log_samples: u32,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        MonteCarloConfig {
            trials: 10_000,
            log_samples: 5,
        }
    }
}

fn percent(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn mean(sum: f64, count: u32) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Running sums behind a BatchResult
#[derive(Debug, Default)]
struct WinTally {
    trials: u32,
    wins: u32,
    ttk_sum: f64,
    turns_sum: f64,
}

impl WinTally {
    fn record(&mut self, outcome: &TrialOutcome) {
        self.trials += 1;
        if outcome.winner == Some(Side::Attacker) {
            self.wins += 1;
            self.ttk_sum += outcome.time;
            self.turns_sum += outcome.turns() as f64;
        }
    }

    fn finish(&self) -> BatchResult {
        BatchResult {
            trials: self.trials,
            wins: self.wins,
            win_rate: percent(self.wins, self.trials),
            avg_ttk: mean(self.ttk_sum, self.wins),
            avg_turns: mean(self.turns_sum, self.wins),
        }
    }
}

impl Duel<'_> {
    /// Run `trials` trials and summarize the attacker's wins
    ///
    /// Draws count as non-wins. TTK and turn averages cover winning trials
    /// only and are 0 when the attacker never wins.
    pub fn run_batch<R: Rng + ?Sized>(
        &self,
        trials: u32,
        rng: &mut R,
    ) -> Result<BatchResult, SimulationError> {
        if trials == 0 {
            return Err(SimulationError::ZeroTrials);
        }
        let mut tally = WinTally::default();
        for _ in 0..trials {
            tally.record(&self.run_trial(rng, false));
        }
        let result = tally.finish();
        debug!(
            attacker = %self.combatant(Side::Attacker).id,
            defender = %self.combatant(Side::Defender).id,
            trials,
            win_rate = result.win_rate,
            "battle batch finished"
        );
        Ok(result)
    }

    /// Run a Monte Carlo study with per-trial detail
    ///
    /// Only the first `log_samples` trials keep an event log.
    pub fn run_monte_carlo<R: Rng + ?Sized>(
        &self,
        config: &MonteCarloConfig,
        rng: &mut R,
    ) -> Result<MonteCarloResult, SimulationError> {
        if config.trials == 0 {
            return Err(SimulationError::ZeroTrials);
        }
        let roles = &self.rules().combat;

        let mut tally = WinTally::default();
        let mut defender_wins = 0u32;
        let mut draws = 0u32;
        let mut first_actor_trials = 0u32;
        let mut first_actor_wins = 0u32;
        let mut turns_all = 0u64;
        let mut attempts = 0u64;
        let mut hits = 0u64;
        let mut crits = 0u64;
        let mut misses = 0u64;
        let mut damage = 0.0;
        let mut overkill_sum = 0.0;
        let mut kills = 0u32;
        let mut turn_distribution = BTreeMap::new();
        let mut hp_attacker = BTreeMap::new();
        let mut hp_defender = BTreeMap::new();
        let mut sample_logs = Vec::new();

        for trial in 0..config.trials {
            let outcome = self.run_trial(rng, trial < config.log_samples);
            tally.record(&outcome);

            match outcome.winner {
                None => draws += 1,
                Some(Side::Defender) => defender_wins += 1,
                Some(Side::Attacker) => {}
            }
            if let Some(first) = outcome.first_actor {
                first_actor_trials += 1;
                if outcome.winner == Some(first) {
                    first_actor_wins += 1;
                }
            }

            let turns = outcome.turns();
            turns_all += turns as u64;
            *turn_distribution.entry(turns).or_insert(0u32) += 1;

            attempts += outcome.attacker.attempts as u64;
            hits += outcome.attacker.hits as u64;
            crits += outcome.attacker.crits as u64;
            misses += outcome.attacker.misses as u64;
            damage += outcome.attacker.damage;

            if let Some(overkill) = outcome.overkill {
                overkill_sum += overkill;
                kills += 1;
            }
            if let (Some(winner), Some(fraction)) = (outcome.winner, outcome.winner_hp_fraction) {
                let histogram = match winner {
                    Side::Attacker => &mut hp_attacker,
                    Side::Defender => &mut hp_defender,
                };
                *histogram.entry(hp_bucket(fraction, roles.hp_buckets)).or_insert(0u32) += 1;
            }

            if trial < config.log_samples {
                sample_logs.push(TrialLog {
                    trial,
                    winner: outcome.winner,
                    events: outcome.events,
                });
            }
        }

        let ratio = |part: u64, whole: u64| {
            if whole == 0 {
                0.0
            } else {
                part as f64 / whole as f64 * 100.0
            }
        };
        let attacker = self.combatant(Side::Attacker);
        let defender = self.combatant(Side::Defender);

        let result = MonteCarloResult {
            summary: tally.finish(),
            defender_win_rate: percent(defender_wins, config.trials),
            draw_rate: percent(draws, config.trials),
            first_turn_win_rate: percent(first_actor_wins, first_actor_trials),
            avg_turns_all: turns_all as f64 / config.trials as f64,
            avg_damage_per_turn: if attempts == 0 { 0.0 } else { damage / attempts as f64 },
            avg_overkill: mean(overkill_sum, kills),
            realized_crit_rate: ratio(crits, hits),
            realized_dodge_rate: ratio(misses, attempts),
            nominal_crit_rate: attacker.stats.crit_chance(roles).clamp(0.0, 100.0),
            nominal_dodge_rate: defender.stats.evasion(roles).clamp(0.0, 100.0),
            turn_distribution,
            win_hp_distribution_attacker: hp_attacker,
            win_hp_distribution_defender: hp_defender,
            sample_logs,
        };
        debug!(
            attacker = %attacker.id,
            defender = %defender.id,
            trials = config.trials,
            win_rate = result.summary.win_rate,
            draw_rate = result.draw_rate,
            "monte carlo finished"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::Combatant;
    use crate::rules::RuleSet;
    use crate::stat_block::StatBlock;
    use crate::types::{Metric, StatName};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn fighter(id: &str, pairs: &[(&str, f64)], variance: f64) -> Combatant {
        let stats = StatBlock::from_pairs(pairs.iter().map(|(n, v)| (StatName::new(n), *v)));
        Combatant::new(id.into(), id.into(), stats, variance, vec![]).unwrap()
    }

    fn rules() -> RuleSet {
        let mut rules = RuleSet::default();
        rules.set_formula(Metric::Dmg, "a.atk").unwrap();
        rules
    }

    #[test]
    fn test_zero_trials_rejected() {
        let rules = rules();
        let stats = [("hp", 10.0), ("atk", 1.0)];
        let duel = Duel::new(&rules, fighter("a", &stats, 0.0), fighter("b", &stats, 0.0));
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(duel.run_batch(0, &mut rng).unwrap_err(), SimulationError::ZeroTrials);
        let config = MonteCarloConfig { trials: 0, log_samples: 0 };
        assert!(duel.run_monte_carlo(&config, &mut rng).is_err());
    }

    #[test]
    fn test_mirror_match_favors_first_actor() {
        let rules = rules();
        let stats = [("hp", 100.0), ("atk", 10.0), ("aspd", 1.0)];
        let duel = Duel::new(&rules, fighter("a", &stats, 0.0), fighter("b", &stats, 0.0));
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let result = duel.run_batch(1000, &mut rng).unwrap();
        assert_eq!(result.wins, 1000);
        assert!((result.win_rate - 100.0).abs() < f64::EPSILON);
        assert!((result.avg_turns - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_monte_carlo_exact_mirror_statistics() {
        let rules = rules();
        let stats = [("hp", 100.0), ("atk", 10.0), ("aspd", 1.0)];
        let duel = Duel::new(&rules, fighter("a", &stats, 0.0), fighter("b", &stats, 0.0));
        let config = MonteCarloConfig { trials: 50, log_samples: 0 };
        let result = duel.run_monte_carlo(&config, &mut ChaCha8Rng::seed_from_u64(8)).unwrap();

        assert_eq!(result.first_turn_win_rate, 100.0);
        assert_eq!(result.avg_overkill, 0.0);
        assert!((result.avg_damage_per_turn - 10.0).abs() < 1e-9);
        assert!((result.avg_turns_all - 10.0).abs() < 1e-9);
        assert_eq!(result.turn_distribution, BTreeMap::from([(10, 50)]));
        // winner ends on 10 of 100 HP
        assert_eq!(result.win_hp_distribution_attacker, BTreeMap::from([(10, 50)]));
        assert!(result.win_hp_distribution_defender.is_empty());
        assert!(result.sample_logs.is_empty());
    }

    #[test]
    fn test_monte_carlo_uneven_kill_overkill() {
        let rules = rules();
        let duel = Duel::new(
            &rules,
            fighter("a", &[("hp", 100.0), ("atk", 30.0), ("aspd", 1.0)], 0.0),
            fighter("b", &[("hp", 100.0), ("atk", 10.0), ("aspd", 1.0)], 0.0),
        );
        let config = MonteCarloConfig { trials: 40, log_samples: 1 };
        let result = duel.run_monte_carlo(&config, &mut ChaCha8Rng::seed_from_u64(8)).unwrap();

        // 30 x 4 against 100 HP
        assert!((result.avg_overkill - 20.0).abs() < 1e-9);
        // the killing blow only counts the 10 HP that were left
        assert!((result.avg_damage_per_turn - 25.0).abs() < 1e-9);
        assert_eq!(result.turn_distribution, BTreeMap::from([(4, 40)]));
        let counted: u32 = result.win_hp_distribution_attacker.values().sum();
        assert_eq!(counted, 40);
        assert!(result.win_hp_distribution_defender.is_empty());
    }

    #[test]
    fn test_all_draws_keep_stats_finite() {
        let mut rules = rules();
        rules.set_formula(Metric::Dmg, "0").unwrap();
        let stats = [("hp", 100.0), ("atk", 10.0)];
        let duel = Duel::new(&rules, fighter("a", &stats, 0.0), fighter("b", &stats, 0.0));
        let config = MonteCarloConfig { trials: 20, log_samples: 2 };
        let result = duel.run_monte_carlo(&config, &mut ChaCha8Rng::seed_from_u64(1)).unwrap();

        assert_eq!(result.summary.wins, 0);
        assert!((result.draw_rate - 100.0).abs() < f64::EPSILON);
        assert_eq!(result.summary.avg_ttk, 0.0);
        assert_eq!(result.avg_overkill, 0.0);
        assert!(result.win_hp_distribution_attacker.is_empty());
        assert!(result.first_turn_win_rate.is_finite());
    }

    #[test]
    fn test_monte_carlo_rates_and_logs() {
        let rules = rules();
        let attacker = fighter("a", &[("hp", 100.0), ("atk", 10.0), ("crit", 25.0)], 0.1);
        let defender = fighter("b", &[("hp", 100.0), ("atk", 10.0), ("eva", 30.0)], 0.1);
        let duel = Duel::new(&rules, attacker, defender);
        let config = MonteCarloConfig { trials: 2000, log_samples: 3 };
        let result = duel.run_monte_carlo(&config, &mut ChaCha8Rng::seed_from_u64(99)).unwrap();

        assert_eq!(result.sample_logs.len(), 3);
        assert!(result.sample_logs.iter().all(|log| !log.events.is_empty()));
        assert!((result.realized_dodge_rate - 30.0).abs() < 3.0);
        assert!((result.realized_crit_rate - 25.0).abs() < 3.0);
        assert_eq!(result.nominal_dodge_rate, 30.0);

        let total = result.summary.win_rate + result.defender_win_rate + result.draw_rate;
        assert!((total - 100.0).abs() < 1e-6);
        let counted: u32 = result.turn_distribution.values().sum();
        assert_eq!(counted, 2000);
    }

    #[test]
    fn test_seeded_runs_reproduce() {
        let rules = rules();
        let duel = Duel::new(
            &rules,
            fighter("a", &[("hp", 100.0), ("atk", 12.0), ("eva", 10.0)], 0.2),
            fighter("b", &[("hp", 110.0), ("atk", 11.0), ("eva", 10.0)], 0.2),
        );
        let config = MonteCarloConfig { trials: 500, log_samples: 1 };
        let first = duel.run_monte_carlo(&config, &mut ChaCha8Rng::seed_from_u64(5)).unwrap();
        let second = duel.run_monte_carlo(&config, &mut ChaCha8Rng::seed_from_u64(5)).unwrap();
        assert_eq!(first, second);
    }
}
