//! Base-game hammer award
//!
//! Outside the bonus every hammer on the settled grid smashes all of its
//! 4-adjacent pigs. Each smashed pig rolls a value that pays at once.
//! The grid itself is not changed.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::grid::{BoardGeometry, Grid};
use crate::rng::RandomSource;
use crate::symbols::{SymbolCatalog, SymbolRole};

use super::pig_value::PigValueTable;

/// A pig smashed in the base game
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseSmash {
    pub hammer: usize,
    pub at: usize,
    pub amount: f64,
}

/// Result of the base-game hammer pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseHammerAward {
    /// Credits paid for all smashed pigs
    pub total: f64,
    /// Hammers plus smashed pigs, de-duplicated, in discovery order
    pub highlight: Vec<usize>,
    pub smashed: Vec<BaseSmash>,
}

impl BaseHammerAward {
    pub fn is_empty(&self) -> bool {
        self.smashed.is_empty()
    }
}

/// Smash every pig next to a hammer. A pig touching two hammers is
/// smashed once, by the first hammer in row-major order.
pub fn award_base_hammers(
    grid: &Grid,
    catalog: &SymbolCatalog,
    values: &PigValueTable,
    rng: &mut impl RandomSource,
) -> BaseHammerAward {
    let geometry = BoardGeometry::from(grid);
    let mut award = BaseHammerAward::default();
    let mut taken = BTreeSet::new();
    let mut seen = BTreeSet::new();

    for hammer in grid.find(|s| catalog.is_hammer(s)) {
        if seen.insert(hammer) {
            award.highlight.push(hammer);
        }
        for at in geometry.neighbors(hammer) {
            let Some(symbol) = grid.get(at) else { continue };
            let gold = match catalog.role_of(symbol) {
                Some(SymbolRole::Pig) => false,
                Some(SymbolRole::GoldPig) => true,
                _ => continue,
            };
            if !taken.insert(at) {
                continue;
            }
            let amount = values.roll(gold, rng);
            award.total += amount;
            award.smashed.push(BaseSmash { hammer, at, amount });
            if seen.insert(at) {
                award.highlight.push(at);
            }
        }
    }

    if !award.is_empty() {
        log::debug!(
            "base hammers: {} pigs smashed for {:.0}",
            award.smashed.len(),
            award.total
        );
    }
    award
}
