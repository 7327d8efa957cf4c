//! Hammer resolution for the Lock & Win bonus
//!
//! One [`step_hammers`] call per respin, after the reels settle:
//!
//! 1. seed: every visible hammer position carries the total of the hammer
//!    already there, or starts at 0
//! 2. fuse: each 4-adjacent pair (row-major pair order) sets both totals to
//!    their sum
//! 3. act (row-major): smash the lowest-index adjacent locked cell and move
//!    onto it, or roam to a random cell other than the current and previous
//! 4. re-key: positions are updated in place; hammers keep a stable id
//!
//! Hammers live in an arena with stable [`HammerId`]s, so two operations
//! touching the same board index in one step never alias each other.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::grid::BoardGeometry;
use crate::rng::RandomSource;
use crate::symbols::SymbolId;

/// A cell that absorbed a lockable symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockedCell {
    pub index: usize,
    /// Credits held by the cell
    pub amount: f64,
    pub symbol: SymbolId,
}

/// Locked cells by board index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockedCells {
    cells: BTreeMap<usize, LockedCell>,
}

impl LockedCells {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock `index`; false if it was already locked
    pub fn lock(&mut self, index: usize, amount: f64, symbol: SymbolId) -> bool {
        if self.cells.contains_key(&index) {
            return false;
        }
        self.cells.insert(
            index,
            LockedCell {
                index,
                amount,
                symbol,
            },
        );
        true
    }

    pub fn remove(&mut self, index: usize) -> Option<LockedCell> {
        self.cells.remove(&index)
    }

    pub fn get(&self, index: usize) -> Option<&LockedCell> {
        self.cells.get(&index)
    }

    pub fn is_locked(&self, index: usize) -> bool {
        self.cells.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Credits still held by locked cells
    pub fn total(&self) -> f64 {
        self.cells.values().map(|c| c.amount).sum()
    }

    /// Cells in row-major order
    pub fn iter(&self) -> impl Iterator<Item = &LockedCell> {
        self.cells.values()
    }

    pub fn indices(&self) -> Vec<usize> {
        self.cells.keys().copied().collect()
    }
}

/// Stable hammer identity within one bonus round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HammerId(pub u32);

/// A hammer entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hammer {
    pub id: HammerId,
    pub position: usize,
    /// Credits absorbed so far, never decreases
    pub total: f64,
    /// Where the hammer stood before its last move
    pub prev_position: Option<usize>,
}

/// All hammers of a round
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HammerBoard {
    hammers: Vec<Hammer>,
    next_id: u32,
}

impl HammerBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fresh hammer at `position`
    pub fn spawn(&mut self, position: usize, total: f64) -> HammerId {
        let id = HammerId(self.next_id);
        self.next_id += 1;
        self.hammers.push(Hammer {
            id,
            position,
            total,
            prev_position: None,
        });
        id
    }

    pub fn get(&self, id: HammerId) -> Option<&Hammer> {
        self.hammers.iter().find(|h| h.id == id)
    }

    /// First hammer standing on `position`
    pub fn at(&self, position: usize) -> Option<&Hammer> {
        self.hammers.iter().find(|h| h.position == position)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hammer> {
        self.hammers.iter()
    }

    pub fn len(&self) -> usize {
        self.hammers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hammers.is_empty()
    }

    /// Occupied positions, sorted and de-duplicated
    pub fn positions(&self) -> Vec<usize> {
        let mut positions: Vec<usize> = self.hammers.iter().map(|h| h.position).collect();
        positions.sort_unstable();
        positions.dedup();
        positions
    }

    /// Sum of all hammer totals
    pub fn total(&self) -> f64 {
        self.hammers.iter().map(|h| h.total).sum()
    }

    fn get_mut(&mut self, id: HammerId) -> Option<&mut Hammer> {
        self.hammers.iter_mut().find(|h| h.id == id)
    }
}

/// Two adjacent hammers merged
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HammerFuse {
    pub first: usize,
    pub second: usize,
    pub total: f64,
}

/// A hammer moved (smash or roam)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HammerMove {
    pub hammer: HammerId,
    pub from: usize,
    pub to: usize,
}

/// A locked cell consumed by a hammer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Smash {
    pub hammer: HammerId,
    pub at: usize,
    pub amount: f64,
    /// Hammer total after the smash
    pub total: f64,
}

/// Outcome of one hammer step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HammerStep {
    /// Hammers after the step, positions updated
    pub board: HammerBoard,
    pub fused: Vec<HammerFuse>,
    /// One entry per acting hammer, in acting order
    pub moved: Vec<HammerMove>,
    pub smashed: Vec<Smash>,
}

impl HammerStep {
    /// `from → to` per moved hammer
    pub fn movement_map(&self) -> BTreeMap<usize, usize> {
        self.moved.iter().map(|m| (m.from, m.to)).collect()
    }
}

/// Seed hammers for the visible positions.
///
/// A position already held by one or more previous hammers carries their
/// combined total under the lowest id; others start at 0. Previous hammers
/// not on a visible position are dropped.
pub fn seed_hammers(visible: &[usize], previous: &HammerBoard) -> HammerBoard {
    let mut positions = visible.to_vec();
    positions.sort_unstable();
    positions.dedup();

    let mut board = HammerBoard {
        hammers: Vec::with_capacity(positions.len()),
        next_id: previous.next_id,
    };
    for position in positions {
        let mut here = previous.hammers.iter().filter(|h| h.position == position);
        match here.next() {
            Some(first) => {
                let mut hammer = first.clone();
                for other in here {
                    hammer.total += other.total;
                    hammer.id = hammer.id.min(other.id);
                }
                board.hammers.push(hammer);
            }
            None => {
                board.spawn(position, 0.0);
            }
        }
    }
    board.hammers.sort_by_key(|h| h.position);
    board
}

/// Fuse every adjacent pair: both totals become their sum
pub fn fuse_adjacent(board: &mut HammerBoard, geometry: &BoardGeometry) -> Vec<HammerFuse> {
    board.hammers.sort_by_key(|h| h.position);
    let mut fused = Vec::new();
    let n = board.hammers.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let (a, b) = (board.hammers[i].position, board.hammers[j].position);
            if !geometry.are_adjacent(a, b) {
                continue;
            }
            let sum = board.hammers[i].total + board.hammers[j].total;
            board.hammers[i].total = sum;
            board.hammers[j].total = sum;
            fused.push(HammerFuse {
                first: a,
                second: b,
                total: sum,
            });
        }
    }
    fused
}

/// One hammer acts: smash the lowest-index adjacent locked cell, else roam
pub fn act_hammer(
    board: &mut HammerBoard,
    id: HammerId,
    locked: &mut LockedCells,
    geometry: &BoardGeometry,
    rng: &mut impl RandomSource,
) -> Option<(HammerMove, Option<Smash>)> {
    let hammer = board.get_mut(id)?;
    let from = hammer.position;

    let target = geometry
        .neighbors(from)
        .into_iter()
        .filter(|n| locked.is_locked(*n))
        .min();

    if let Some((at, cell)) = target.and_then(|at| locked.remove(at).map(|cell| (at, cell))) {
        hammer.total += cell.amount;
        hammer.prev_position = Some(from);
        hammer.position = at;
        let smash = Smash {
            hammer: id,
            at,
            amount: cell.amount,
            total: hammer.total,
        };
        return Some((HammerMove { hammer: id, from, to: at }, Some(smash)));
    }

    let candidates: Vec<usize> = (0..geometry.cell_count())
        .filter(|i| *i != from && Some(*i) != hammer.prev_position)
        .collect();
    let to = if candidates.is_empty() {
        from
    } else {
        candidates[rng.pick_index(candidates.len())]
    };
    hammer.prev_position = Some(from);
    hammer.position = to;
    Some((HammerMove { hammer: id, from, to }, None))
}

/// Run one full step: seed, fuse, act in row-major order.
///
/// `locked` loses every smashed cell. A cell is smashed by at most one
/// hammer: the first actor claims it and later hammers no longer see it.
pub fn step_hammers(
    visible: &[usize],
    previous: &HammerBoard,
    locked: &mut LockedCells,
    geometry: &BoardGeometry,
    rng: &mut impl RandomSource,
) -> HammerStep {
    let mut board = seed_hammers(visible, previous);
    let fused = fuse_adjacent(&mut board, geometry);

    let order: Vec<HammerId> = board.hammers.iter().map(|h| h.id).collect();
    let mut moved = Vec::with_capacity(order.len());
    let mut smashed = Vec::new();
    for id in order {
        if let Some((step, smash)) = act_hammer(&mut board, id, locked, geometry, rng) {
            moved.push(step);
            smashed.extend(smash);
        }
    }

    log::debug!(
        "hammers: {} acted, {} fused, {} smashed, total {:.0}",
        moved.len(),
        fused.len(),
        smashed.len(),
        board.total()
    );

    HammerStep {
        board,
        fused,
        moved,
        smashed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{ScriptedRng, SlotRng};

    fn geo() -> BoardGeometry {
        BoardGeometry::new(5, 5)
    }

    fn board_with(hammers: &[(usize, f64)]) -> HammerBoard {
        let mut board = HammerBoard::new();
        for (pos, total) in hammers {
            board.spawn(*pos, *total);
        }
        board
    }

    fn locked_with(cells: &[(usize, f64)]) -> LockedCells {
        let mut locked = LockedCells::new();
        for (idx, amount) in cells {
            locked.lock(*idx, *amount, SymbolId::from("pig"));
        }
        locked
    }

    #[test]
    fn test_seed_carries_totals() {
        let previous = board_with(&[(7, 40.0)]);
        let board = seed_hammers(&[7, 20], &previous);
        assert_eq!(board.len(), 2);
        assert_eq!(board.at(7).unwrap().total, 40.0);
        assert_eq!(board.at(7).unwrap().id, HammerId(0));
        assert_eq!(board.at(20).unwrap().total, 0.0);
        assert_eq!(board.at(20).unwrap().id, HammerId(1));
    }

    #[test]
    fn test_seed_merges_colocated() {
        let mut previous = board_with(&[(3, 10.0), (9, 25.0)]);
        previous.hammers[1].position = 3;
        let board = seed_hammers(&[3], &previous);
        assert_eq!(board.len(), 1);
        assert_eq!(board.at(3).unwrap().total, 35.0);
    }

    #[test]
    fn test_fuse_pair_before_acting() {
        let mut board = board_with(&[(12, 30.0), (13, 70.0)]);
        let fused = fuse_adjacent(&mut board, &geo());
        assert_eq!(fused.len(), 1);
        assert_eq!(board.at(12).unwrap().total, 100.0);
        assert_eq!(board.at(13).unwrap().total, 100.0);
    }

    #[test]
    fn test_fuse_ignores_diagonal_and_row_wrap() {
        let mut board = board_with(&[(6, 10.0), (12, 20.0), (14, 5.0), (15, 5.0)]);
        assert!(fuse_adjacent(&mut board, &geo()).is_empty());
    }

    #[test]
    fn test_fuse_is_order_independent() {
        let mut a = board_with(&[(13, 3.0), (12, 1.0), (11, 2.0)]);
        let mut b = board_with(&[(11, 2.0), (12, 1.0), (13, 3.0)]);
        fuse_adjacent(&mut a, &geo());
        fuse_adjacent(&mut b, &geo());
        // (11,12) → 3,3 ; (12,13) → 6,6
        for pos in [11, 12, 13] {
            assert_eq!(a.at(pos).unwrap().total, b.at(pos).unwrap().total);
        }
        assert_eq!(a.at(11).unwrap().total, 3.0);
        assert_eq!(a.at(13).unwrap().total, 6.0);
    }

    #[test]
    fn test_step_smashes_adjacent_cell() {
        let previous = board_with(&[(12, 50.0)]);
        let mut locked = locked_with(&[(13, 100.0), (2, 300.0)]);
        let step = step_hammers(&[12], &previous, &mut locked, &geo(), &mut SlotRng::seeded(1));

        assert_eq!(step.smashed.len(), 1);
        assert_eq!(step.smashed[0].at, 13);
        assert_eq!(step.smashed[0].amount, 100.0);
        let hammer = step.board.at(13).unwrap();
        assert_eq!(hammer.total, 150.0);
        assert_eq!(hammer.prev_position, Some(12));
        assert!(!locked.is_locked(13));
        assert!(locked.is_locked(2));
        assert_eq!(step.movement_map().get(&12), Some(&13));
    }

    #[test]
    fn test_smash_picks_lowest_index() {
        let previous = board_with(&[(12, 0.0)]);
        // up (7), left (11), right (13), down (17)
        let mut locked = locked_with(&[(17, 1.0), (13, 2.0), (11, 3.0), (7, 4.0)]);
        let step = step_hammers(&[12], &previous, &mut locked, &geo(), &mut SlotRng::seeded(1));
        assert_eq!(step.smashed[0].at, 7);
    }

    #[test]
    fn test_first_actor_claims_shared_cell() {
        // hammers at 11 and 13 both touch locked 12
        let mut locked = locked_with(&[(12, 80.0)]);
        let step = step_hammers(
            &[13, 11],
            &HammerBoard::new(),
            &mut locked,
            &geo(),
            &mut ScriptedRng::constant(0.5),
        );
        assert_eq!(step.smashed.len(), 1);
        assert_eq!(step.smashed[0].at, 12);
        assert_eq!(step.moved[0].from, 11);
        assert_eq!(step.moved[0].to, 12);
        assert_ne!(step.moved[1].to, 13);
        assert!(locked.is_empty());
    }

    #[test]
    fn test_roam_avoids_current_and_previous() {
        let mut previous = board_with(&[(0, 10.0)]);
        previous.hammers[0].prev_position = Some(1);
        let mut rng = SlotRng::seeded(5);
        for _ in 0..200 {
            let step = step_hammers(&[0], &previous, &mut LockedCells::new(), &geo(), &mut rng);
            let to = step.moved[0].to;
            assert_ne!(to, 0);
            assert_ne!(to, 1);
            assert!(to < 25);
        }
    }

    #[test]
    fn test_roam_uses_remaining_cells_in_order() {
        // first candidate after excluding 0 is 1
        let previous = board_with(&[(0, 0.0)]);
        let step = step_hammers(
            &[0],
            &previous,
            &mut LockedCells::new(),
            &geo(),
            &mut ScriptedRng::constant(0.0),
        );
        assert_eq!(step.moved[0].to, 1);
        assert_eq!(step.board.hammers[0].prev_position, Some(0));
    }

    #[test]
    fn test_totals_never_decrease() {
        let mut rng = SlotRng::seeded(99);
        let mut board = HammerBoard::new();
        let mut locked = LockedCells::new();
        for idx in [1, 5, 8, 14, 18, 22] {
            locked.lock(idx, 100.0 + idx as f64, SymbolId::from("pig"));
        }
        let start_locked = locked.total();
        let mut visible = vec![0, 6, 24];

        for _ in 0..30 {
            let before = board.total();
            let locked_before = locked.len();
            let step = step_hammers(&visible, &board, &mut locked, &geo(), &mut rng);
            assert!(step.board.total() >= before);
            assert_eq!(locked_before - locked.len(), step.smashed.len());
            board = step.board;
            visible = board.positions();
        }
        // every smashed credit is inside some hammer
        assert!(board.total() >= start_locked - locked.total());
    }
}
