//! Ways-pay evaluation
//!
//! A way starts on the leftmost reel and continues while every next reel
//! holds the symbol or a wild. Ways = product of per-reel match counts.

use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use crate::symbols::{SymbolCatalog, SymbolId};

/// A winning run of one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WayWin {
    pub symbol: SymbolId,
    /// Consecutive reels matched from the left
    pub length: usize,
    /// Product of per-reel match counts
    pub ways: u32,
    /// Paytable multiplier for `length`
    pub multiplier: f64,
    /// `multiplier × ways × stake`
    pub payout: f64,
    /// Participating cells, row-major indices (highlight only)
    pub indices: Vec<usize>,
}

/// Result of evaluating a grid
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub wins: Vec<WayWin>,
    /// Sum of all win payouts
    pub total: f64,
    /// Win-to-stake ratio
    pub win_ratio: f64,
}

impl EvaluationResult {
    pub fn is_win(&self) -> bool {
        self.total > 0.0
    }

    pub fn win_count(&self) -> usize {
        self.wins.len()
    }

    /// Union of all winning cells, sorted and de-duplicated
    pub fn highlight(&self) -> Vec<usize> {
        let mut cells: Vec<usize> = self.wins.iter().flat_map(|w| w.indices.iter().copied()).collect();
        cells.sort_unstable();
        cells.dedup();
        cells
    }
}

/// Ways paytable over a symbol catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayTable {
    catalog: SymbolCatalog,
}

impl PayTable {
    pub fn new(catalog: SymbolCatalog) -> Self {
        Self { catalog }
    }

    /// Paytable over the standard symbol set
    pub fn standard() -> Self {
        Self::new(SymbolCatalog::standard())
    }

    pub fn catalog(&self) -> &SymbolCatalog {
        &self.catalog
    }

    /// Evaluate all ways wins on a finalized grid
    pub fn evaluate(&self, grid: &Grid, stake: f64) -> EvaluationResult {
        let mut wins = Vec::new();

        for symbol in self.starting_symbols(grid) {
            if let Some(win) = self.evaluate_symbol(grid, &symbol, stake) {
                wins.push(win);
            }
        }

        let total: f64 = wins.iter().map(|w| w.payout).sum();
        let win_ratio = if stake > 0.0 { total / stake } else { 0.0 };

        if !wins.is_empty() {
            log::debug!("ways: {} wins, total {:.2} ({:.2}x)", wins.len(), total, win_ratio);
        }

        EvaluationResult {
            wins,
            total,
            win_ratio,
        }
    }

    /// Distinct non-special symbols on reel 0, top to bottom
    fn starting_symbols(&self, grid: &Grid) -> Vec<SymbolId> {
        let mut seen: Vec<SymbolId> = Vec::new();
        for idx in grid.column_indices(0) {
            let Some(cell) = grid.get(idx) else { continue };
            if cell.is_empty() || self.catalog.is_special(cell) {
                continue;
            }
            let key = SymbolId::new(cell.normalized());
            if !seen.contains(&key) {
                seen.push(key);
            }
        }
        seen
    }

    fn evaluate_symbol(&self, grid: &Grid, symbol: &SymbolId, stake: f64) -> Option<WayWin> {
        let mut length = 0;
        let mut ways: u32 = 1;
        let mut indices = Vec::new();

        for col in 0..grid.cols() {
            let matches: Vec<usize> = grid
                .column_indices(col)
                .filter(|&idx| {
                    grid.get(idx).is_some_and(|cell| {
                        cell.normalized() == symbol.as_str() || self.catalog.is_wild(cell)
                    })
                })
                .collect();
            if matches.is_empty() {
                break;
            }
            length += 1;
            ways = ways.saturating_mul(matches.len() as u32);
            indices.extend(matches);
        }

        if length < 2 {
            return None;
        }

        let Some(def) = self.catalog.resolve(symbol.as_str()) else {
            log::warn!("ways: symbol '{symbol}' has no paytable entry, paying zero");
            return None;
        };

        let multiplier = def.pay_for(length);
        let payout = multiplier * ways as f64 * stake;
        if payout <= 0.0 {
            return None;
        }

        Some(WayWin {
            symbol: symbol.clone(),
            length,
            ways,
            multiplier,
            payout,
            indices,
        })
    }
}

impl Default for PayTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridSpec;
    use crate::symbols::keys;
    use approx::assert_relative_eq;

    /// 5×5 grid of filler with overrides at (row, col)
    fn grid_with(cells: &[(usize, usize, &str)]) -> Grid {
        let mut keys_vec = vec![keys::BANKER.to_string(); 25];
        for (r, c, s) in cells {
            keys_vec[r * 5 + c] = s.to_string();
        }
        Grid::from_keys(&GridSpec::standard_5x5(), &keys_vec).unwrap()
    }

    #[test]
    fn test_single_diamond_three_run() {
        let grid = grid_with(&[(0, 0, "diamond"), (1, 1, "diamond"), (2, 2, "diamond")]);
        let result = PayTable::standard().evaluate(&grid, 10.0);

        assert_eq!(result.wins.len(), 1);
        let win = &result.wins[0];
        assert_eq!(win.symbol.as_str(), "diamond");
        assert_eq!(win.length, 3);
        assert_eq!(win.ways, 1);
        assert_relative_eq!(win.payout, 5.0);
        assert_relative_eq!(result.total, 5.0);
        assert_eq!(win.indices, vec![0, 6, 12]);
    }

    #[test]
    fn test_ways_multiply_and_wild_substitutes() {
        // reel0: 2 coins, reel1: coin + wild, reel2: 1 coin
        let grid = grid_with(&[
            (0, 0, "coin"),
            (3, 0, "coin"),
            (1, 1, "coin"),
            (4, 1, "wild_feather"),
            (2, 2, "coin"),
        ]);
        let result = PayTable::standard().evaluate(&grid, 10.0);
        let win = &result.wins[0];
        assert_eq!(win.length, 3);
        assert_eq!(win.ways, 4);
        // coin length 3 = 0.5
        assert_relative_eq!(win.payout, 0.5 * 4.0 * 10.0);
        assert_eq!(win.indices.len(), 5);
    }

    #[test]
    fn test_run_stops_at_gap() {
        // reel 2 has no diamond, reel 3 does: length stays 2
        let grid = grid_with(&[(0, 0, "diamond"), (0, 1, "diamond"), (0, 3, "diamond")]);
        let result = PayTable::standard().evaluate(&grid, 1.0);
        assert_eq!(result.wins[0].length, 2);
        assert_relative_eq!(result.wins[0].payout, 0.25);
    }

    #[test]
    fn test_single_reel_pays_nothing() {
        let grid = grid_with(&[(0, 0, "money_bag")]);
        assert!(PayTable::standard().evaluate(&grid, 10.0).wins.is_empty());
    }

    #[test]
    fn test_specials_do_not_start_runs() {
        // wild and pig on reel 0 only; the rest banker (filler pays zero)
        let grid = grid_with(&[
            (0, 0, "wild_feather"),
            (1, 0, "pig"),
            (2, 0, "hammer"),
            (3, 0, "pig_gold"),
            (4, 0, "wild_feather"),
        ]);
        let result = PayTable::standard().evaluate(&grid, 10.0);
        assert!(result.wins.is_empty());
        assert_eq!(result.total, 0.0);
    }

    #[test]
    fn test_path_qualified_keys_normalized() {
        let grid = grid_with(&[
            (0, 0, "symbols/Diamond.png"),
            (0, 1, "diamond"),
            (0, 2, "assets/DIAMOND.webp?v=3"),
        ]);
        let result = PayTable::standard().evaluate(&grid, 10.0);
        assert_eq!(result.wins.len(), 1);
        assert_eq!(result.wins[0].length, 3);
    }

    #[test]
    fn test_unknown_symbol_pays_zero() {
        let grid = grid_with(&[(0, 0, "mystery"), (0, 1, "mystery"), (0, 2, "mystery")]);
        let result = PayTable::standard().evaluate(&grid, 10.0);
        assert!(result.wins.is_empty());
    }

    #[test]
    fn test_total_equals_sum_of_payouts() {
        let grid = grid_with(&[
            (0, 0, "diamond"),
            (1, 0, "coin"),
            (0, 1, "wild_feather"),
            (0, 2, "coin"),
            (1, 2, "diamond"),
        ]);
        let result = PayTable::standard().evaluate(&grid, 20.0);
        assert_eq!(result.wins.len(), 2);
        let sum: f64 = result.wins.iter().map(|w| w.payout).sum();
        assert_relative_eq!(result.total, sum);
        assert!(result.total >= 0.0);
        // shared wild cell appears in both runs, but once in the union
        assert_eq!(result.highlight(), vec![0, 1, 2, 5, 7]);
    }
}
