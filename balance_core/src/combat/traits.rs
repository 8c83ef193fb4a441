//! Trait firing during a trial

use super::fighter::{Fighter, TimedChange};
use super::result::{CombatEvent, EventKind};
use crate::model::{TraitCondition, TraitEffect, TraitTarget, TraitTrigger};
use crate::rules::CombatRoles;
use crate::types::Side;
use rand::Rng;

/// A death caused by a trait effect
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TraitKill {
    pub victim: Side,
    pub overkill: f64,
}

/// What firing one trigger did to the fight
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Fired {
    /// A stat changed, so base damage must be re-evaluated
    pub stats_changed: bool,
    pub kill: Option<TraitKill>,
}

pub(crate) fn index(side: Side) -> usize {
    match side {
        Side::Attacker => 0,
        Side::Defender => 1,
    }
}

fn condition_met<R: Rng + ?Sized>(condition: &TraitCondition, rng: &mut R) -> bool {
    match condition {
        TraitCondition::Always => true,
        TraitCondition::Chance { percent } => {
            if *percent >= 100.0 {
                true
            } else if *percent <= 0.0 {
                false
            } else {
                rng.gen_range(0.0..100.0) < *percent
            }
        }
    }
}

/// Fire every trait `owner` carries for `trigger`, in carry order
///
/// Effects never trigger further traits. Firing stops at the first death.
pub(crate) fn fire<R: Rng + ?Sized>(
    trigger: TraitTrigger,
    owner: Side,
    fighters: &mut [Fighter<'_>; 2],
    roles: &CombatRoles,
    time: f64,
    rng: &mut R,
    events: &mut Option<Vec<CombatEvent>>,
) -> Fired {
    let mut fired = Fired::default();
    let combatant = fighters[index(owner)].combatant;

    for t in combatant.traits.iter().filter(|t| t.trigger == trigger) {
        if !condition_met(&t.condition, rng) {
            continue;
        }
        let target = match t.target {
            TraitTarget::Owner => owner,
            TraitTarget::Enemy => owner.opponent(),
        };
        let fighter = &mut fighters[index(target)];

        match &t.effect {
            TraitEffect::Heal => fighter.heal(t.magnitude),
            TraitEffect::Damage => {
                let hp_before = fighter.hp;
                fighter.hp -= t.magnitude;
                if !fighter.is_alive() {
                    fired.kill = Some(TraitKill {
                        victim: target,
                        overkill: t.magnitude - hp_before,
                    });
                }
            }
            TraitEffect::StatChange { stat } => {
                if fighter.shift_stat(stat, t.magnitude, roles, time) {
                    fired.stats_changed = true;
                    // lowering max HP can drop current HP to 0
                    if !fighter.is_alive() {
                        fired.kill = Some(TraitKill {
                            victim: target,
                            overkill: -fighter.hp,
                        });
                    }
                    if let Some(duration) = t.duration.filter(|d| *d > 0.0) {
                        fighter.changes.push(TimedChange {
                            stat: stat.clone(),
                            amount: t.magnitude,
                            expires_at: time + duration,
                        });
                    }
                }
            }
        }

        if let Some(log) = events.as_mut() {
            log.push(CombatEvent {
                time,
                kind: EventKind::Trait,
                actor: owner,
                target,
                value: t.magnitude,
                label: Some(t.name.clone()),
            });
        }

        if fired.kill.is_some() {
            break;
        }
    }

    fired
}
