//! ItemSource - Stats from equipped items

use crate::model::Item;
use crate::source::StatSource;
use crate::stat_block::StatAccumulator;

/// Modifiers of one applicable item
///
/// Applicability (active + targeted) is decided by the caller; the source
/// applies every modifier, in declaration order.
pub struct ItemSource<'a> {
    pub item: &'a Item,
}

impl<'a> ItemSource<'a> {
    pub fn new(item: &'a Item) -> Self {
        ItemSource { item }
    }
}

impl StatSource for ItemSource<'_> {
    fn id(&self) -> &str {
        &self.item.id
    }

    fn priority(&self) -> i32 {
        0 // Items apply at default priority
    }

    fn apply(&self, stats: &mut StatAccumulator) {
        for modifier in &self.item.modifiers {
            stats.apply(modifier.stat.as_str(), modifier.op, modifier.amount);
        }
    }
}
