//! Duel - A fixed attacker/defender pairing and its trial loop

use super::fighter::{Combatant, Fighter};
use super::resolution::resolve_attack;
use super::result::{CombatEvent, EventKind, TrialOutcome};
use super::traits::{fire, index, Fired};
use super::base_damage;
use crate::model::TraitTrigger;
use crate::rules::RuleSet;
use crate::types::Side;
use rand::Rng;
use tracing::warn;

const SIDES: [Side; 2] = [Side::Attacker, Side::Defender];

/// How a trial ended before the time limit
#[derive(Debug, Clone, Copy)]
struct Ending {
    winner: Side,
    overkill: f64,
}

/// A resolved pairing ready to run trials
///
/// Base damage is evaluated once per side here; trials only re-evaluate it
/// when a trait changes a stat mid-fight.
#[derive(Debug, Clone)]
pub struct Duel<'r> {
    rules: &'r RuleSet,
    attacker: Combatant,
    defender: Combatant,
    base: [f64; 2],
}

impl<'r> Duel<'r> {
    pub fn new(rules: &'r RuleSet, attacker: Combatant, defender: Combatant) -> Self {
        let base = [
            base_or_zero(rules, &attacker, &defender),
            base_or_zero(rules, &defender, &attacker),
        ];
        Duel {
            rules,
            attacker,
            defender,
            base,
        }
    }

    pub fn rules(&self) -> &RuleSet {
        self.rules
    }

    pub fn combatant(&self, side: Side) -> &Combatant {
        match side {
            Side::Attacker => &self.attacker,
            Side::Defender => &self.defender,
        }
    }

    /// Damage of a plain hit from `side`, before variance and crits
    pub fn base_damage(&self, side: Side) -> f64 {
        self.base[index(side)]
    }

    /// Run one trial; `log` keeps the full event list in the outcome
    ///
    /// Time advances in fixed ticks. Within a tick the attacker acts before
    /// the defender, and each side attacks at most once.
    pub fn run_trial<R: Rng + ?Sized>(&self, rng: &mut R, log: bool) -> TrialOutcome {
        let roles = &self.rules.combat;
        let mut fighters = [
            Fighter::new(&self.attacker, roles, self.base[0]),
            Fighter::new(&self.defender, roles, self.base[1]),
        ];
        let mut events = log.then(Vec::new);
        let mut first_actor = None;

        for side in SIDES {
            let fired = fire(TraitTrigger::BattleStart, side, &mut fighters, roles, 0.0, rng, &mut events);
            if let Some(ending) = self.settle(fired, side, &mut fighters, 0.0, &mut events) {
                return finish(&fighters, ending, 0.0, first_actor, events);
            }
        }

        let steps = (roles.time_limit / roles.tick - 1e-9).ceil() as u64;
        for step in 0..steps {
            let time = step as f64 * roles.tick;

            let mut expired = false;
            for fighter in fighters.iter_mut() {
                expired |= fighter.expire_changes(roles, time);
            }
            if expired {
                self.refresh_base_damage(&mut fighters);
                // reverting a max-HP buff can leave a side at 0
                for side in SIDES {
                    if !fighters[index(side)].is_alive() {
                        let ending = Ending {
                            winner: side.opponent(),
                            overkill: -fighters[index(side)].hp,
                        };
                        log_death(&mut events, time, side.opponent(), side, ending.overkill);
                        return finish(&fighters, ending, time, first_actor, events);
                    }
                }
            }

            for side in SIDES {
                if !fighters[index(side)].ready(time) {
                    continue;
                }
                first_actor.get_or_insert(side);
                if let Some(ending) = self.attack(side, &mut fighters, time, rng, &mut events) {
                    return finish(&fighters, ending, time, first_actor, events);
                }
                fighters[index(side)].advance_cooldown();
            }
        }

        TrialOutcome {
            winner: None,
            time: roles.time_limit,
            first_actor,
            attacker: fighters[0].tally,
            defender: fighters[1].tally,
            overkill: None,
            winner_hp_fraction: None,
            events: events.unwrap_or_default(),
        }
    }

    /// One attack from `actor` plus the traits it triggers
    fn attack<R: Rng + ?Sized>(
        &self,
        actor: Side,
        fighters: &mut [Fighter<'_>; 2],
        time: f64,
        rng: &mut R,
        events: &mut Option<Vec<CombatEvent>>,
    ) -> Option<Ending> {
        let roles = &self.rules.combat;
        let target = actor.opponent();

        let fired = fire(TraitTrigger::OnAttack, actor, fighters, roles, time, rng, events);
        if let Some(ending) = self.settle(fired, actor, fighters, time, events) {
            return Some(ending);
        }

        let result = {
            let (attacker, defender) = pair_mut(fighters, actor);
            resolve_attack(attacker, defender, rng)
        };

        if let Some(log) = events.as_mut() {
            let kind = match (result.landed, result.crit) {
                (false, _) => EventKind::Miss,
                (true, true) => EventKind::Crit,
                (true, false) => EventKind::Attack,
            };
            log.push(CombatEvent {
                time,
                kind,
                actor,
                target,
                value: result.damage,
                label: None,
            });
        }

        if result.killed {
            log_death(events, time, actor, target, result.overkill);
            return Some(Ending {
                winner: actor,
                overkill: result.overkill,
            });
        }

        let triggers = match (result.landed, result.crit) {
            (false, _) => [
                Some((TraitTrigger::OnMiss, actor)),
                Some((TraitTrigger::OnDodge, target)),
                None,
            ],
            (true, false) => [
                Some((TraitTrigger::OnHit, actor)),
                Some((TraitTrigger::OnDamaged, target)),
                None,
            ],
            (true, true) => [
                Some((TraitTrigger::OnHit, actor)),
                Some((TraitTrigger::OnCrit, actor)),
                Some((TraitTrigger::OnDamaged, target)),
            ],
        };
        for (trigger, owner) in triggers.into_iter().flatten() {
            let fired = fire(trigger, owner, fighters, roles, time, rng, events);
            if let Some(ending) = self.settle(fired, owner, fighters, time, events) {
                return Some(ending);
            }
        }
        None
    }

    /// Apply the consequences of a trigger: refresh damage, detect a death
    fn settle(
        &self,
        fired: Fired,
        owner: Side,
        fighters: &mut [Fighter<'_>; 2],
        time: f64,
        events: &mut Option<Vec<CombatEvent>>,
    ) -> Option<Ending> {
        if fired.stats_changed {
            self.refresh_base_damage(fighters);
        }
        let kill = fired.kill?;
        log_death(events, time, owner, kill.victim, kill.overkill);
        Some(Ending {
            winner: kill.victim.opponent(),
            overkill: kill.overkill,
        })
    }

    fn refresh_base_damage(&self, fighters: &mut [Fighter<'_>; 2]) {
        let forward = base_damage(self.rules, &fighters[0].stats, &fighters[1].stats).unwrap_or(0.0);
        let backward = base_damage(self.rules, &fighters[1].stats, &fighters[0].stats).unwrap_or(0.0);
        fighters[0].base_damage = forward;
        fighters[1].base_damage = backward;
    }
}

fn base_or_zero(rules: &RuleSet, attacker: &Combatant, defender: &Combatant) -> f64 {
    match base_damage(rules, &attacker.stats, &defender.stats) {
        Ok(value) => value,
        Err(e) => {
            warn!(
                attacker = %attacker.id,
                defender = %defender.id,
                formula = rules.dmg_formula.source(),
                error = %e,
                "damage formula failed, hits deal 0"
            );
            0.0
        }
    }
}

fn pair_mut<'f, 'a>(
    fighters: &'f mut [Fighter<'a>; 2],
    actor: Side,
) -> (&'f mut Fighter<'a>, &'f mut Fighter<'a>) {
    let [attacker, defender] = fighters;
    match actor {
        Side::Attacker => (attacker, defender),
        Side::Defender => (defender, attacker),
    }
}

fn log_death(events: &mut Option<Vec<CombatEvent>>, time: f64, actor: Side, victim: Side, overkill: f64) {
    if let Some(log) = events.as_mut() {
        log.push(CombatEvent {
            time,
            kind: EventKind::Die,
            actor,
            target: victim,
            value: overkill,
            label: None,
        });
    }
}

fn finish(
    fighters: &[Fighter<'_>; 2],
    ending: Ending,
    time: f64,
    first_actor: Option<Side>,
    events: Option<Vec<CombatEvent>>,
) -> TrialOutcome {
    let survivor = &fighters[index(ending.winner)];
    let fraction = if survivor.max_hp > 0.0 {
        (survivor.hp / survivor.max_hp).clamp(0.0, 1.0)
    } else {
        0.0
    };
    TrialOutcome {
        winner: Some(ending.winner),
        time,
        first_actor,
        attacker: fighters[0].tally,
        defender: fighters[1].tally,
        overkill: Some(ending.overkill.max(0.0)),
        winner_hp_fraction: Some(fraction),
        events: events.unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Trait, TraitCondition, TraitEffect, TraitTarget};
    use crate::stat_block::StatBlock;
    use crate::types::StatName;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn fighter(id: &str, pairs: &[(&str, f64)], traits: Vec<Trait>) -> Combatant {
        let stats = StatBlock::from_pairs(pairs.iter().map(|(n, v)| (StatName::new(n), *v)));
        Combatant::new(id.into(), id.to_uppercase(), stats, 0.0, traits).unwrap()
    }

    fn flat_rules(dmg: &str) -> RuleSet {
        let mut rules = RuleSet::default();
        rules.set_formula(crate::types::Metric::Dmg, dmg).unwrap();
        rules
    }

    #[test]
    fn test_attacker_acts_first_and_wins_mirror() {
        let rules = flat_rules("a.atk");
        let stats = [("hp", 100.0), ("atk", 10.0), ("aspd", 1.0)];
        let duel = Duel::new(&rules, fighter("a", &stats, vec![]), fighter("b", &stats, vec![]));
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let outcome = duel.run_trial(&mut rng, false);
        assert_eq!(outcome.winner, Some(Side::Attacker));
        assert_eq!(outcome.first_actor, Some(Side::Attacker));
        assert_eq!(outcome.turns(), 10);
        assert_eq!(outcome.defender.attempts, 9);
        assert!((outcome.time - 9.0).abs() < 1e-6);
        assert!((outcome.winner_hp_fraction.unwrap() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_zero_damage_is_a_draw() {
        let rules = flat_rules("0");
        let stats = [("hp", 100.0), ("atk", 10.0)];
        let duel = Duel::new(&rules, fighter("a", &stats, vec![]), fighter("b", &stats, vec![]));
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let outcome = duel.run_trial(&mut rng, false);
        assert!(outcome.is_draw());
        assert!((outcome.time - rules.combat.time_limit).abs() < f64::EPSILON);
        assert!(outcome.overkill.is_none());
    }

    #[test]
    fn test_failing_formula_degrades_to_zero() {
        let rules = flat_rules("a.missing * 2");
        let stats = [("hp", 100.0), ("atk", 10.0)];
        let duel = Duel::new(&rules, fighter("a", &stats, vec![]), fighter("b", &stats, vec![]));
        assert_eq!(duel.base_damage(Side::Attacker), 0.0);
        let outcome = duel.run_trial(&mut ChaCha8Rng::seed_from_u64(1), false);
        assert!(outcome.is_draw());
    }

    #[test]
    fn test_faster_side_wins() {
        let rules = flat_rules("a.atk");
        let duel = Duel::new(
            &rules,
            fighter("a", &[("hp", 100.0), ("atk", 10.0), ("aspd", 1.0)], vec![]),
            fighter("b", &[("hp", 100.0), ("atk", 10.0), ("aspd", 2.0)], vec![]),
        );
        let outcome = duel.run_trial(&mut ChaCha8Rng::seed_from_u64(3), false);
        assert_eq!(outcome.winner, Some(Side::Defender));
        assert!((outcome.time - 4.5).abs() < 1e-6);
    }

    #[test]
    fn test_event_log_ends_with_death() {
        let rules = flat_rules("a.atk");
        let stats = [("hp", 30.0), ("atk", 10.0)];
        let duel = Duel::new(&rules, fighter("a", &stats, vec![]), fighter("b", &stats, vec![]));
        let outcome = duel.run_trial(&mut ChaCha8Rng::seed_from_u64(3), true);

        let last = outcome.events.last().unwrap();
        assert_eq!(last.kind, EventKind::Die);
        assert_eq!(last.target, Side::Defender);
        let attacks = outcome.events.iter().filter(|e| e.kind == EventKind::Attack).count();
        assert_eq!(attacks, 5);
    }

    #[test]
    fn test_no_log_when_disabled() {
        let rules = flat_rules("a.atk");
        let stats = [("hp", 30.0), ("atk", 10.0)];
        let duel = Duel::new(&rules, fighter("a", &stats, vec![]), fighter("b", &stats, vec![]));
        let outcome = duel.run_trial(&mut ChaCha8Rng::seed_from_u64(3), false);
        assert!(outcome.events.is_empty());
    }

    #[test]
    fn test_overkill_recorded() {
        let rules = flat_rules("a.atk");
        let duel = Duel::new(
            &rules,
            fighter("a", &[("hp", 100.0), ("atk", 40.0)], vec![]),
            fighter("b", &[("hp", 50.0), ("atk", 1.0)], vec![]),
        );
        let outcome = duel.run_trial(&mut ChaCha8Rng::seed_from_u64(3), false);
        assert_eq!(outcome.winner, Some(Side::Attacker));
        assert!((outcome.overkill.unwrap() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_battle_start_damage_trait_kills() {
        let rules = flat_rules("a.atk");
        let bomb = Trait {
            name: "Bomb".into(),
            trigger: TraitTrigger::BattleStart,
            condition: TraitCondition::Always,
            effect: TraitEffect::Damage,
            target: TraitTarget::Enemy,
            magnitude: 500.0,
            duration: None,
        };
        let duel = Duel::new(
            &rules,
            fighter("a", &[("hp", 100.0), ("atk", 1.0)], vec![]),
            fighter("b", &[("hp", 100.0), ("atk", 1.0)], vec![bomb]),
        );
        let outcome = duel.run_trial(&mut ChaCha8Rng::seed_from_u64(3), true);
        assert_eq!(outcome.winner, Some(Side::Defender));
        assert!(outcome.first_actor.is_none());
        assert_eq!(outcome.time, 0.0);
    }

    #[test]
    fn test_max_hp_drain_ends_trial_before_any_attack() {
        let rules = flat_rules("a.atk");
        let wither = Trait {
            name: "Wither".into(),
            trigger: TraitTrigger::BattleStart,
            condition: TraitCondition::Always,
            effect: TraitEffect::StatChange { stat: StatName::new("hp") },
            target: TraitTarget::Enemy,
            magnitude: -150.0,
            duration: None,
        };
        let duel = Duel::new(
            &rules,
            fighter("a", &[("hp", 100.0), ("atk", 10.0)], vec![]),
            fighter("b", &[("hp", 10.0), ("atk", 1.0)], vec![wither]),
        );
        let outcome = duel.run_trial(&mut ChaCha8Rng::seed_from_u64(3), true);

        assert_eq!(outcome.winner, Some(Side::Defender));
        assert_eq!(outcome.time, 0.0);
        assert_eq!(outcome.attacker.attempts, 0);
        assert!((outcome.overkill.unwrap() - 50.0).abs() < 1e-9);
        let kinds: Vec<EventKind> = outcome.events.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EventKind::Trait, EventKind::Die]);
        assert_eq!(outcome.events[1].target, Side::Attacker);
    }

    #[test]
    fn test_stat_change_trait_updates_damage() {
        let rules = flat_rules("a.atk");
        let rage = Trait {
            name: "Rage".into(),
            trigger: TraitTrigger::BattleStart,
            condition: TraitCondition::Always,
            effect: TraitEffect::StatChange { stat: StatName::new("atk") },
            target: TraitTarget::Owner,
            magnitude: 10.0,
            duration: None,
        };
        let duel = Duel::new(
            &rules,
            fighter("a", &[("hp", 100.0), ("atk", 10.0)], vec![rage]),
            fighter("b", &[("hp", 40.0), ("atk", 1.0)], vec![]),
        );
        let outcome = duel.run_trial(&mut ChaCha8Rng::seed_from_u64(3), false);
        assert_eq!(outcome.winner, Some(Side::Attacker));
        assert_eq!(outcome.turns(), 2);
    }
}
