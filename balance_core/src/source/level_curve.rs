//! LevelCurveSource - Stats from an entity's growth curves

use crate::model::Entity;
use crate::source::StatSource;
use crate::stat_block::StatAccumulator;

/// Base values of an entity at a level
pub struct LevelCurveSource<'a> {
    pub entity: &'a Entity,
    /// 1-indexed level; 0 is read as 1
    pub level: u32,
}

impl<'a> LevelCurveSource<'a> {
    pub fn new(entity: &'a Entity, level: u32) -> Self {
        LevelCurveSource { entity, level }
    }
}

impl StatSource for LevelCurveSource<'_> {
    fn id(&self) -> &str {
        self.entity.id.0.as_str()
    }

    fn priority(&self) -> i32 {
        -100 // Curves seed the values items then modify
    }

    fn apply(&self, stats: &mut StatAccumulator) {
        let declared: Vec<_> = stats.names().cloned().collect();
        for stat in declared {
            let value = self.entity.curve(stat.as_str()).at(self.level);
            stats.set(stat.as_str(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StatName;

    fn declared() -> Vec<StatName> {
        vec![StatName::new("hp"), StatName::new("mana")]
    }

    #[test]
    fn test_level_curve_scaling() {
        let entity = Entity::new("hero", "Hero").with_stat("hp", 50.0, 12.0);
        let source = LevelCurveSource::new(&entity, 10);
        let mut acc = StatAccumulator::new(&declared());
        source.apply(&mut acc);

        // Level 10 = 9 levels of growth: 50 + 9 * 12
        assert!((acc.get("hp").unwrap() - 158.0).abs() < 0.01);
        // Undefined curve stays at zero
        assert!((acc.get("mana").unwrap() - 0.0).abs() < 0.01);
    }

    #[test]
    fn test_level_zero_reads_as_one() {
        let entity = Entity::new("hero", "Hero").with_stat("hp", 50.0, 12.0);
        let mut acc = StatAccumulator::new(&declared());
        LevelCurveSource::new(&entity, 0).apply(&mut acc);
        assert!((acc.get("hp").unwrap() - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_source_id_and_priority() {
        let entity = Entity::new("hero", "Hero");
        let source = LevelCurveSource::new(&entity, 1);
        assert_eq!(source.id(), "hero");
        assert_eq!(source.priority(), -100);
    }
}
