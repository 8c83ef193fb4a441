//! Attack resolution - One attack attempt from one fighter against another

use super::fighter::Fighter;
use rand::Rng;

/// What a single attack attempt did
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct AttackResult {
    pub landed: bool,
    pub crit: bool,
    /// Damage applied (0 on a miss)
    pub damage: f64,
    pub killed: bool,
    /// Damage beyond what reduced the defender to exactly 0 HP
    pub overkill: f64,
}

/// Resolve one attack attempt, updating HP and the attacker's tally
///
/// 1. Roll uniform [0, 100); the attack misses when the roll is below the
///    defender's evasion
/// 2. Scale base damage by `1 + uniform(-variance, +variance)`
/// 3. Roll the attacker's crit chance; crits multiply by its crit multiplier
/// 4. Subtract from the defender's HP; HP <= 0 is a kill
pub(crate) fn resolve_attack<R: Rng + ?Sized>(
    attacker: &mut Fighter<'_>,
    defender: &mut Fighter<'_>,
    rng: &mut R,
) -> AttackResult {
    attacker.tally.attempts += 1;

    let roll: f64 = rng.gen_range(0.0..100.0);
    if roll < defender.evasion {
        attacker.tally.misses += 1;
        return AttackResult::default();
    }

    let variance = attacker.variance();
    let multiplier = if variance > 0.0 {
        1.0 + rng.gen_range(-variance..=variance)
    } else {
        1.0
    };
    let mut damage = (attacker.base_damage * multiplier).max(0.0);

    let crit = attacker.crit_chance > 0.0 && rng.gen_range(0.0..100.0) < attacker.crit_chance;
    if crit {
        damage *= attacker.crit_multiplier;
        attacker.tally.crits += 1;
    }
    attacker.tally.hits += 1;

    let hp_before = defender.hp;
    defender.hp -= damage;
    attacker.tally.damage += damage.min(hp_before.max(0.0));

    let killed = !defender.is_alive();
    AttackResult {
        landed: true,
        crit,
        damage,
        killed,
        overkill: if killed { damage - hp_before } else { 0.0 },
    }
}
