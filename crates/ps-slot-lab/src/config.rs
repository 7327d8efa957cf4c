//! Slot engine configuration

use serde::{Deserialize, Serialize};

use ps_stage::WinTier;

use crate::error::{SlotError, SlotResult};
use crate::features::pig_value::PigValueTable;
use crate::symbols::SymbolCatalog;
use crate::weights::SymbolGenerator;

/// Grid specification and reel buffer geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of reels (columns)
    pub reels: u8,
    /// Number of visible rows per reel
    pub rows: u8,
    /// Cell height in scroll units (pixels on the reference layout)
    pub cell_size: f64,
    /// Off-screen rows above the visible window
    pub buffer_above: u8,
    /// Off-screen rows below the visible window
    pub buffer_below: u8,
}

impl GridSpec {
    /// The Piggy Smash 5×5 board
    pub fn standard_5x5() -> Self {
        Self {
            reels: 5,
            rows: 5,
            cell_size: 140.0,
            buffer_above: 1,
            buffer_below: 4,
        }
    }

    pub fn cols(&self) -> usize {
        self.reels as usize
    }

    pub fn rows(&self) -> usize {
        self.rows as usize
    }

    /// Total grid positions
    pub fn total_positions(&self) -> usize {
        self.cols() * self.rows()
    }

    /// Symbols held per column buffer, off-screen rows included
    pub fn buffer_len(&self) -> usize {
        self.buffer_above as usize + self.rows() + self.buffer_below as usize
    }

    pub fn validate(&self) -> SlotResult<()> {
        if self.reels < 2 || self.rows == 0 {
            return Err(SlotError::InvalidConfig(format!(
                "grid {}x{} is too small",
                self.reels, self.rows
            )));
        }
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(SlotError::InvalidConfig("cell_size must be positive".into()));
        }
        if self.buffer_above == 0 {
            return Err(SlotError::InvalidConfig(
                "reels need at least one off-screen row above the window".into(),
            ));
        }
        Ok(())
    }
}

impl Default for GridSpec {
    fn default() -> Self {
        Self::standard_5x5()
    }
}

/// Reel motion and stop cadence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReelTiming {
    /// Delay before the first column stops (ms)
    pub decel_wait_ms: f64,
    /// Gap between consecutive column stops (ms)
    pub stagger_ms: f64,
    /// Spin speed multiplier, `[0.2, 3]`
    pub speed_scale: f64,
    /// Base scroll speed in cells per millisecond
    pub base_speed_cells_per_ms: f64,
}

impl ReelTiming {
    pub const MIN_SPEED_SCALE: f64 = 0.2;
    pub const MAX_SPEED_SCALE: f64 = 3.0;

    pub fn normal() -> Self {
        Self {
            decel_wait_ms: 160.0,
            stagger_ms: 110.0,
            speed_scale: 1.0,
            base_speed_cells_per_ms: 0.010,
        }
    }

    /// Upper bound on a staggered stop for `reels` columns
    pub fn stop_duration_ms(&self, reels: usize) -> f64 {
        self.decel_wait_ms + reels.saturating_sub(1) as f64 * self.stagger_ms
    }

    pub fn with_speed_scale(mut self, scale: f64) -> Self {
        self.speed_scale = scale;
        self
    }

    pub fn validate(&self) -> SlotResult<()> {
        if !(self.decel_wait_ms.is_finite() && self.decel_wait_ms >= 0.0) {
            return Err(SlotError::InvalidTiming(format!(
                "decel_wait_ms must be ≥ 0, got {}",
                self.decel_wait_ms
            )));
        }
        if !(self.stagger_ms.is_finite() && self.stagger_ms >= 0.0) {
            return Err(SlotError::InvalidTiming(format!(
                "stagger_ms must be ≥ 0, got {}",
                self.stagger_ms
            )));
        }
        if !(Self::MIN_SPEED_SCALE..=Self::MAX_SPEED_SCALE).contains(&self.speed_scale) {
            return Err(SlotError::InvalidTiming(format!(
                "speed_scale must be within [0.2, 3], got {}",
                self.speed_scale
            )));
        }
        if !(self.base_speed_cells_per_ms.is_finite() && self.base_speed_cells_per_ms > 0.0) {
            return Err(SlotError::InvalidTiming("base speed must be positive".into()));
        }
        Ok(())
    }
}

impl Default for ReelTiming {
    fn default() -> Self {
        Self::normal()
    }
}

/// Presentation pacing used when the engine drives the reels itself
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Base-game spin time before the automatic staggered stop (ms)
    pub auto_stop_ms: f64,
    /// Bonus-round spin time before the staggered stop (ms)
    pub respin_spin_ms: f64,
    /// Pause between bonus respins (ms)
    pub round_pause_ms: f64,
    /// Simulated frame length (ms)
    pub frame_ms: f64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            auto_stop_ms: 1100.0,
            respin_spin_ms: 520.0,
            round_pause_ms: 120.0,
            frame_ms: 1000.0 / 60.0,
        }
    }
}

impl PacingConfig {
    pub fn validate(&self) -> SlotResult<()> {
        let non_negative = [self.auto_stop_ms, self.respin_spin_ms, self.round_pause_ms];
        if non_negative.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(SlotError::InvalidTiming("pacing values must be ≥ 0".into()));
        }
        if !(self.frame_ms.is_finite() && self.frame_ms > 0.0) {
            return Err(SlotError::InvalidTiming("frame_ms must be positive".into()));
        }
        Ok(())
    }
}

/// Lock & Win variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockVariant {
    /// Plain lock-and-hold: locks are never removed
    Hold,
    /// Hammers fuse, smash locked cells and roam every respin
    #[default]
    Hammer,
}

/// Lock & Win bonus configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LockAndWinConfig {
    /// Pigs on a settled base grid needed to enter the bonus
    pub trigger_count: u8,
    /// Respins granted at entry and after every new lock
    pub start_respins: u8,
    pub variant: LockVariant,
    /// Reel speed scale while the bonus runs
    pub feature_speed_scale: f64,
    /// Payout multiplier when the round ends with every cell locked
    pub full_board_multiplier: f64,
}

impl Default for LockAndWinConfig {
    fn default() -> Self {
        Self {
            trigger_count: 8,
            start_respins: 3,
            variant: LockVariant::Hammer,
            feature_speed_scale: 0.6,
            full_board_multiplier: 1.0,
        }
    }
}

impl LockAndWinConfig {
    pub fn validate(&self) -> SlotResult<()> {
        if self.start_respins == 0 {
            return Err(SlotError::InvalidConfig("start_respins must be ≥ 1".into()));
        }
        if self.trigger_count == 0 {
            return Err(SlotError::InvalidConfig("trigger_count must be ≥ 1".into()));
        }
        if !(ReelTiming::MIN_SPEED_SCALE..=ReelTiming::MAX_SPEED_SCALE)
            .contains(&self.feature_speed_scale)
        {
            return Err(SlotError::InvalidTiming(format!(
                "feature_speed_scale must be within [0.2, 3], got {}",
                self.feature_speed_scale
            )));
        }
        if !(self.full_board_multiplier.is_finite() && self.full_board_multiplier >= 1.0) {
            return Err(SlotError::InvalidConfig(
                "full_board_multiplier must be ≥ 1".into(),
            ));
        }
        Ok(())
    }
}

/// Win tier thresholds (stake multiples)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WinTierThresholds {
    pub nice: f64,
    pub big: f64,
    pub mega: f64,
    pub epic: f64,
    pub legendary: f64,
}

impl Default for WinTierThresholds {
    fn default() -> Self {
        Self {
            nice: 2.0,
            big: 10.0,
            mega: 25.0,
            epic: 50.0,
            legendary: 100.0,
        }
    }
}

impl WinTierThresholds {
    pub fn threshold(&self, tier: WinTier) -> f64 {
        match tier {
            WinTier::Nice => self.nice,
            WinTier::Big => self.big,
            WinTier::Mega => self.mega,
            WinTier::Epic => self.epic,
            WinTier::Legendary => self.legendary,
        }
    }

    /// Highest tier reached by `win / stake`
    pub fn tier_for(&self, win: f64, stake: f64) -> Option<WinTier> {
        if stake <= 0.0 || win <= 0.0 {
            return None;
        }
        let ratio = win / stake;
        WinTier::ALL
            .iter()
            .rev()
            .find(|tier| ratio >= self.threshold(**tier))
            .copied()
    }
}

/// Allowed stakes; stepping wraps around
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetLadder {
    pub steps: Vec<f64>,
}

impl Default for BetLadder {
    fn default() -> Self {
        Self {
            steps: vec![10.0, 20.0, 50.0, 100.0, 200.0, 500.0],
        }
    }
}

impl BetLadder {
    /// Next stake one step up (`up = true`) or down, looping at the ends.
    /// An off-ladder stake steps from the first rung.
    pub fn step(&self, current: f64, up: bool) -> f64 {
        if self.steps.is_empty() {
            return current;
        }
        let len = self.steps.len();
        let idx = self.steps.iter().position(|s| *s == current).unwrap_or(0);
        let next = if up { (idx + 1) % len } else { (idx + len - 1) % len };
        self.steps[next]
    }

    pub fn validate(&self) -> SlotResult<()> {
        if self.steps.is_empty() || self.steps.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(SlotError::InvalidConfig(
                "bet ladder needs at least one positive stake".into(),
            ));
        }
        Ok(())
    }
}

/// Complete slot configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotConfig {
    pub grid: GridSpec,
    pub timing: ReelTiming,
    pub pacing: PacingConfig,
    pub symbols: SymbolCatalog,
    pub weights: SymbolGenerator,
    pub lock_and_win: LockAndWinConfig,
    pub pig_values: PigValueTable,
    pub win_tiers: WinTierThresholds,
    pub bet_ladder: BetLadder,
    /// Base-game hammers smash adjacent pigs for an instant award
    pub enable_hammer_base: bool,
    pub starting_balance: f64,
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            grid: GridSpec::default(),
            timing: ReelTiming::default(),
            pacing: PacingConfig::default(),
            symbols: SymbolCatalog::standard(),
            weights: SymbolGenerator::standard(),
            lock_and_win: LockAndWinConfig::default(),
            pig_values: PigValueTable::default(),
            win_tiers: WinTierThresholds::default(),
            bet_ladder: BetLadder::default(),
            enable_hammer_base: true,
            starting_balance: 10_000.0,
        }
    }
}

impl SlotConfig {
    /// Fail fast on anything that would otherwise break mid-round
    pub fn validate(&self) -> SlotResult<()> {
        self.grid.validate()?;
        self.timing.validate()?;
        self.pacing.validate()?;
        self.symbols.validate()?;
        self.weights.validate(&self.symbols)?;
        self.lock_and_win.validate()?;
        self.pig_values.validate()?;
        self.bet_ladder.validate()?;
        if !(self.starting_balance.is_finite() && self.starting_balance >= 0.0) {
            return Err(SlotError::InvalidConfig("starting_balance must be ≥ 0".into()));
        }
        Ok(())
    }

    /// Parse and validate a JSON config
    pub fn from_json_str(json: &str) -> SlotResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a YAML config
    pub fn from_yaml_str(yaml: &str) -> SlotResult<Self> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> SlotResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_yaml(&self) -> SlotResult<String> {
        Ok(serde_yml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = SlotConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.grid.total_positions(), 25);
        assert_eq!(config.grid.buffer_len(), 10);
    }

    #[test]
    fn test_timing_validation() {
        assert!(ReelTiming::normal().validate().is_ok());
        assert!(ReelTiming::normal().with_speed_scale(0.1).validate().is_err());
        assert!(ReelTiming::normal().with_speed_scale(3.5).validate().is_err());
        let mut timing = ReelTiming::normal();
        timing.stagger_ms = -1.0;
        assert!(matches!(timing.validate(), Err(SlotError::InvalidTiming(_))));
    }

    #[test]
    fn test_stop_duration_bound() {
        let timing = ReelTiming::normal();
        assert_eq!(timing.stop_duration_ms(5), 160.0 + 4.0 * 110.0);
    }

    #[test]
    fn test_win_tiers() {
        let tiers = WinTierThresholds::default();
        assert_eq!(tiers.tier_for(15.0, 10.0), None);
        assert_eq!(tiers.tier_for(20.0, 10.0), Some(WinTier::Nice));
        assert_eq!(tiers.tier_for(100.0, 10.0), Some(WinTier::Big));
        assert_eq!(tiers.tier_for(1000.0, 10.0), Some(WinTier::Legendary));
        assert_eq!(tiers.tier_for(50.0, 0.0), None);
    }

    #[test]
    fn test_bet_ladder_wraps() {
        let ladder = BetLadder::default();
        assert_eq!(ladder.step(10.0, true), 20.0);
        assert_eq!(ladder.step(500.0, true), 10.0);
        assert_eq!(ladder.step(10.0, false), 500.0);
        assert_eq!(ladder.step(33.0, true), 20.0);
    }

    #[test]
    fn test_json_roundtrip_and_partial() {
        let json = SlotConfig::default().to_json().unwrap();
        let back = SlotConfig::from_json_str(&json).unwrap();
        assert_eq!(back, SlotConfig::default());

        let partial = SlotConfig::from_json_str(r#"{ "enable_hammer_base": false }"#).unwrap();
        assert!(!partial.enable_hammer_base);
        assert_eq!(partial.lock_and_win.start_respins, 3);
    }

    #[test]
    fn test_yaml_rejects_bad_timing() {
        let yaml = "timing:\n  decel_wait_ms: -5.0\n  stagger_ms: 110.0\n  speed_scale: 1.0\n  base_speed_cells_per_ms: 0.01\n";
        assert!(matches!(
            SlotConfig::from_yaml_str(yaml),
            Err(SlotError::InvalidTiming(_))
        ));
    }

    #[test]
    fn test_zero_weight_table_rejected_at_setup() {
        let mut config = SlotConfig::default();
        config.weights.base = crate::weights::WeightTable::new([("coin", 0)]);
        assert!(matches!(config.validate(), Err(SlotError::ZeroWeightTable(_))));
    }
}
