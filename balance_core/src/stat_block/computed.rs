//! Combat-role readings of a StatBlock

use crate::rules::CombatRoles;
use crate::stat_block::StatBlock;

impl StatBlock {
    /// Starting hit points
    pub fn max_hp(&self, roles: &CombatRoles) -> f64 {
        self.value(roles.hp.as_str())
    }

    /// Attacks per time unit; `1.0` when the speed stat is not declared
    pub fn attack_speed(&self, roles: &CombatRoles) -> f64 {
        self.get(roles.speed.as_str()).unwrap_or(1.0)
    }

    /// Time between attacks, `None` when the side never attacks
    pub fn attack_interval(&self, roles: &CombatRoles) -> Option<f64> {
        let speed = self.attack_speed(roles);
        if speed > 0.0 && speed.is_finite() {
            Some(1.0 / speed)
        } else {
            None
        }
    }

    /// Evasion as a percent roll threshold
    pub fn evasion(&self, roles: &CombatRoles) -> f64 {
        self.value(roles.evasion.as_str())
    }

    /// Crit chance as a percent (0-100)
    pub fn crit_chance(&self, roles: &CombatRoles) -> f64 {
        self.value(roles.crit_chance.as_str())
    }

    /// Damage multiplier for critical hits
    pub fn crit_multiplier(&self, roles: &CombatRoles) -> f64 {
        self.get(roles.crit_damage.as_str())
            .unwrap_or(roles.default_crit_multiplier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StatName;

    fn block(pairs: &[(&str, f64)]) -> StatBlock {
        StatBlock::from_pairs(pairs.iter().map(|(n, v)| (StatName::new(n), *v)))
    }

    #[test]
    fn test_attack_interval() {
        let roles = CombatRoles::default();
        let interval = block(&[("aspd", 2.0)]).attack_interval(&roles).unwrap();
        assert!((interval - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_speed_defaults_to_one() {
        let roles = CombatRoles::default();
        let interval = block(&[("hp", 10.0)]).attack_interval(&roles).unwrap();
        assert!((interval - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_speed_never_attacks() {
        let roles = CombatRoles::default();
        assert!(block(&[("aspd", 0.0)]).attack_interval(&roles).is_none());
    }

    #[test]
    fn test_crit_multiplier_default() {
        let roles = CombatRoles::default();
        assert!((block(&[]).crit_multiplier(&roles) - 1.5).abs() < f64::EPSILON);
        assert!((block(&[("crit_dmg", 2.0)]).crit_multiplier(&roles) - 2.0).abs() < f64::EPSILON);
    }
}
