//! Finalized visible grid (row-major)

use serde::{Deserialize, Serialize};

use crate::config::GridSpec;
use crate::error::{SlotError, SlotResult};
use crate::symbols::SymbolId;

/// Immutable snapshot of the visible window, row-major
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    cols: usize,
    rows: usize,
    cells: Vec<SymbolId>,
}

impl Grid {
    /// Build from row-major cells; length must equal `cols × rows`
    pub fn new(cols: usize, rows: usize, cells: Vec<SymbolId>) -> SlotResult<Self> {
        let expected = cols * rows;
        if cells.len() != expected {
            return Err(SlotError::InvalidGrid {
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self { cols, rows, cells })
    }

    /// Cells already known to be `cols × rows` long
    pub(crate) fn from_parts(cols: usize, rows: usize, cells: Vec<SymbolId>) -> Self {
        debug_assert_eq!(cells.len(), cols * rows);
        Self { cols, rows, cells }
    }

    /// Build from string keys for a grid spec
    pub fn from_keys<S: AsRef<str>>(spec: &GridSpec, keys: &[S]) -> SlotResult<Self> {
        let cells = keys.iter().map(|k| SymbolId::new(k.as_ref())).collect();
        Self::new(spec.cols(), spec.rows(), cells)
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[SymbolId] {
        &self.cells
    }

    pub fn get(&self, index: usize) -> Option<&SymbolId> {
        self.cells.get(index)
    }

    /// Symbol at (row, col)
    pub fn at(&self, row: usize, col: usize) -> &SymbolId {
        &self.cells[row * self.cols + col]
    }

    /// Flat indices of one column, top to bottom
    pub fn column_indices(&self, col: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.rows).map(move |row| row * self.cols + col)
    }

    /// Indices whose symbol satisfies `pred`
    pub fn find(&self, mut pred: impl FnMut(&SymbolId) -> bool) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, s)| pred(s))
            .map(|(i, _)| i)
            .collect()
    }

    /// Plain string keys, row-major
    pub fn to_keys(&self) -> Vec<String> {
        self.cells.iter().map(|s| s.as_str().to_string()).collect()
    }
}

/// Row-major geometry helpers shared by the evaluators and feature logic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardGeometry {
    pub cols: usize,
    pub rows: usize,
}

impl BoardGeometry {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self { cols, rows }
    }

    pub fn cell_count(&self) -> usize {
        self.cols * self.rows
    }

    pub fn row_col(&self, index: usize) -> (usize, usize) {
        (index / self.cols, index % self.cols)
    }

    /// Orthogonal adjacency (no diagonals)
    pub fn are_adjacent(&self, a: usize, b: usize) -> bool {
        let (ra, ca) = self.row_col(a);
        let (rb, cb) = self.row_col(b);
        (ra == rb && ca.abs_diff(cb) == 1) || (ca == cb && ra.abs_diff(rb) == 1)
    }

    /// In-bounds 4-neighbourhood: left, right, up, down
    pub fn neighbors(&self, index: usize) -> Vec<usize> {
        let (r, c) = self.row_col(index);
        let mut out = Vec::with_capacity(4);
        if c > 0 {
            out.push(r * self.cols + c - 1);
        }
        if c + 1 < self.cols {
            out.push(r * self.cols + c + 1);
        }
        if r > 0 {
            out.push((r - 1) * self.cols + c);
        }
        if r + 1 < self.rows {
            out.push((r + 1) * self.cols + c);
        }
        out
    }
}

/// Cell index or count as carried by stage payloads; saturates at 255
pub(crate) fn stage_u8(n: usize) -> u8 {
    u8::try_from(n).unwrap_or(u8::MAX)
}

impl From<&Grid> for BoardGeometry {
    fn from(grid: &Grid) -> Self {
        Self::new(grid.cols, grid.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_length_checked() {
        let err = Grid::new(5, 5, vec![SymbolId::from("coin"); 24]).unwrap_err();
        assert!(matches!(err, SlotError::InvalidGrid { expected: 25, actual: 24 }));
    }

    #[test]
    fn test_column_indices() {
        let grid = Grid::new(5, 5, vec![SymbolId::from("coin"); 25]).unwrap();
        let col: Vec<usize> = grid.column_indices(2).collect();
        assert_eq!(col, vec![2, 7, 12, 17, 22]);
    }

    #[test]
    fn test_adjacency() {
        let geo = BoardGeometry::new(5, 5);
        let idx = |r: usize, c: usize| r * 5 + c;
        assert!(geo.are_adjacent(idx(2, 2), idx(2, 3)));
        assert!(geo.are_adjacent(idx(2, 2), idx(2, 1)));
        assert!(geo.are_adjacent(idx(2, 2), idx(1, 2)));
        assert!(geo.are_adjacent(idx(2, 2), idx(3, 2)));
        assert!(!geo.are_adjacent(idx(2, 2), idx(3, 3)));
        // row wrap is not adjacency
        assert!(!geo.are_adjacent(idx(0, 4), idx(1, 0)));
    }

    #[test]
    fn test_neighbors_in_bounds() {
        let geo = BoardGeometry::new(5, 5);
        assert_eq!(geo.neighbors(0), vec![1, 5]);
        assert_eq!(geo.neighbors(24), vec![23, 19]);
        assert_eq!(geo.neighbors(12).len(), 4);
    }

    #[test]
    fn test_stage_u8_saturates() {
        assert_eq!(stage_u8(24), 24);
        assert_eq!(stage_u8(255), 255);
        assert_eq!(stage_u8(256), 255);
        assert_eq!(stage_u8(10_000), 255);
    }
}
