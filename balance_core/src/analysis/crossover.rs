//! Crossover detection - levels where two entities swap ranking

use super::series::EntitySeries;
use crate::types::EntityId;
use serde::{Deserialize, Serialize};

/// A level at which `winner` overtakes `loser`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossoverEvent {
    pub level: u32,
    pub winner: EntityId,
    pub loser: EntityId,
}

/// Scan every unordered pair of series for leadership changes
///
/// The leader at a level is whichever value is strictly greater. A tie keeps
/// the previous leader, and the first leader seen is not itself an event.
/// Events come out pair by pair, in level order within a pair.
pub fn analyze(series: &[EntitySeries], max_level: u32) -> Vec<CrossoverEvent> {
    let mut events = Vec::new();
    for (i, first) in series.iter().enumerate() {
        for second in &series[i + 1..] {
            scan_pair(first, second, max_level, &mut events);
        }
    }
    events
}

fn scan_pair(a: &EntitySeries, b: &EntitySeries, max_level: u32, events: &mut Vec<CrossoverEvent>) {
    let mut leader: Option<bool> = None;
    let levels = a.values.iter().zip(&b.values).take(max_level as usize);

    for (index, (va, vb)) in levels.enumerate() {
        let now = if va > vb {
            Some(true)
        } else if vb > va {
            Some(false)
        } else {
            None
        };
        let Some(a_leads) = now else {
            continue;
        };
        if leader.is_some_and(|previous| previous != a_leads) {
            let (winner, loser) = if a_leads { (a, b) } else { (b, a) };
            events.push(CrossoverEvent {
                level: index as u32 + 1,
                winner: winner.entity.clone(),
                loser: loser.entity.clone(),
            });
        }
        leader = Some(a_leads);
    }
}
