//! Spin result

use serde::{Deserialize, Serialize};

use ps_stage::WinTier;

use crate::features::{BaseHammerAward, LockAndWinOutcome};
use crate::grid::Grid;
use crate::paytable::EvaluationResult;

/// Complete result of one paid spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinResult {
    /// Spin ID
    pub spin_id: String,
    /// Settled base grid
    pub grid: Grid,
    pub stake: f64,
    /// Ways evaluation (empty when the bonus triggered)
    pub ways: EvaluationResult,
    /// Base-game hammer award, when enabled and not in the bonus
    pub base_hammer: Option<BaseHammerAward>,
    /// Lock & Win result, when the spin triggered it
    pub feature: Option<LockAndWinOutcome>,
    /// Total credited
    pub total_win: f64,
    /// Win-to-stake ratio
    pub win_ratio: f64,
    pub win_tier: Option<WinTier>,
    /// Cells to highlight after the spin
    pub highlight: Vec<usize>,
    /// Balance after the win was credited
    pub balance: f64,
}

impl SpinResult {
    pub fn is_win(&self) -> bool {
        self.total_win > 0.0
    }

    pub fn triggered_feature(&self) -> bool {
        self.feature.is_some()
    }

    /// Part of the win paid by ways
    pub fn ways_win(&self) -> f64 {
        self.ways.total
    }

    /// Part of the win paid by base-game hammers
    pub fn hammer_win(&self) -> f64 {
        self.base_hammer.as_ref().map(|a| a.total).unwrap_or(0.0)
    }

    /// Part of the win paid by the bonus round
    pub fn feature_win(&self) -> f64 {
        self.feature.as_ref().map(|f| f.total).unwrap_or(0.0)
    }
}
