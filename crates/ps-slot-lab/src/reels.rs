//! Reel state machine
//!
//! ```text
//! Idle ──start()──► Rolling ──request_stagger_stop()──► Staggering ──(all settled)──► Idle
//!   ▲                  │                                     │
//!   └──────────────────┴──────── stop_immediate() ───────────┘
//! ```
//!
//! Scrolling is continuous (per frame); the logical column buffer only
//! rotates when a column's offset crosses a whole cell, so the visible grid
//! changes on row boundaries only.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use ps_stage::{Stage, StageEvent};

use crate::config::{GridSpec, ReelTiming};
use crate::error::{SlotError, SlotResult};
use crate::features::RespinSource;
use crate::grid::{Grid, stage_u8};
use crate::rng::{RandomSource, SlotRng};
use crate::symbols::SymbolId;
use crate::weights::{SymbolGenerator, WeightMode};

/// Reel machine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReelPhase {
    #[default]
    Idle,
    Rolling,
    Staggering,
}

/// One column: symbols top to bottom, off-screen rows included
#[derive(Debug, Clone)]
struct ReelColumn {
    buffer: VecDeque<SymbolId>,
    offset: f64,
    settled: bool,
}

impl ReelColumn {
    /// Shift every symbol down one row and draw a fresh one on top
    fn rotate_down(&mut self, fresh: SymbolId) {
        self.buffer.pop_back();
        self.buffer.push_front(fresh);
    }
}

/// Per-column scrolling reels with a staggered stop schedule
#[derive(Debug)]
pub struct ReelStateMachine<R: RandomSource = SlotRng> {
    spec: GridSpec,
    timing: ReelTiming,
    generator: SymbolGenerator,
    mode: WeightMode,
    rng: R,
    columns: Vec<ReelColumn>,
    phase: ReelPhase,
    /// Time since the stop plan was computed
    elapsed_ms: f64,
    /// Total simulated time, used for stage timestamps
    clock_ms: f64,
    stop_plan: Vec<f64>,
    waiter: Option<oneshot::Sender<()>>,
    forced: Option<Grid>,
    highlights: Vec<usize>,
    frame_ms: f64,
    /// Speed scale saved by `enter_feature`
    saved_speed_scale: Option<f64>,
    stages: Vec<StageEvent>,
}

impl<R: RandomSource> ReelStateMachine<R> {
    /// Build reels and fill every column buffer from the base table
    pub fn new(
        spec: GridSpec,
        timing: ReelTiming,
        generator: SymbolGenerator,
        mut rng: R,
    ) -> SlotResult<Self> {
        spec.validate()?;
        timing.validate()?;
        if generator.base.total_weight() == 0 {
            return Err(SlotError::ZeroWeightTable("base".into()));
        }
        if generator.feature.total_weight() == 0 {
            return Err(SlotError::ZeroWeightTable("feature".into()));
        }

        let columns = (0..spec.cols())
            .map(|_| ReelColumn {
                buffer: (0..spec.buffer_len())
                    .map(|_| generator.draw(WeightMode::Base, &mut rng))
                    .collect(),
                offset: 0.0,
                settled: true,
            })
            .collect();

        Ok(Self {
            spec,
            timing,
            generator,
            mode: WeightMode::Base,
            rng,
            columns,
            phase: ReelPhase::Idle,
            elapsed_ms: 0.0,
            clock_ms: 0.0,
            stop_plan: Vec::new(),
            waiter: None,
            forced: None,
            highlights: Vec::new(),
            frame_ms: 1000.0 / 60.0,
            saved_speed_scale: None,
            stages: Vec::new(),
        })
    }

    /// Frame length used by [`run_spin`](Self::run_spin)
    pub fn with_frame_ms(mut self, frame_ms: f64) -> Self {
        if frame_ms.is_finite() && frame_ms > 0.0 {
            self.frame_ms = frame_ms;
        }
        self
    }

    pub fn phase(&self) -> ReelPhase {
        self.phase
    }

    /// True while any column is moving
    pub fn is_rolling(&self) -> bool {
        self.phase != ReelPhase::Idle
    }

    pub fn is_staggering(&self) -> bool {
        self.phase == ReelPhase::Staggering
    }

    pub fn timing(&self) -> &ReelTiming {
        &self.timing
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    pub fn weight_mode(&self) -> WeightMode {
        self.mode
    }

    /// Simulated milliseconds since construction
    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    /// Scroll offset of one column, in scroll units
    pub fn column_offset(&self, col: usize) -> Option<f64> {
        self.columns.get(col).map(|c| c.offset)
    }

    pub fn is_column_settled(&self, col: usize) -> bool {
        self.columns.get(col).is_some_and(|c| c.settled)
    }

    /// Stop times of the pending plan (empty when none)
    pub fn stop_plan(&self) -> &[f64] {
        &self.stop_plan
    }

    /// Replace decel/stagger/speed together
    pub fn set_timing(&mut self, timing: ReelTiming) -> SlotResult<()> {
        timing.validate()?;
        self.timing = timing;
        Ok(())
    }

    /// Change spin speed; must lie in `[0.2, 3]`
    pub fn set_speed_scale(&mut self, scale: f64) -> SlotResult<()> {
        self.set_timing(self.timing.with_speed_scale(scale))
    }

    /// Select the weight table for symbols drawn from now on
    pub fn set_feature_mode(&mut self, on: bool) {
        self.mode = WeightMode::from_feature_flag(on);
    }

    /// Idle → Rolling. Resets offsets, settle flags and highlights.
    pub fn start(&mut self) {
        if self.phase == ReelPhase::Staggering {
            log::debug!("reels: start() while staggering, previous stop plan dropped");
        }
        self.phase = ReelPhase::Rolling;
        self.elapsed_ms = 0.0;
        self.stop_plan.clear();
        for column in &mut self.columns {
            column.offset = 0.0;
            column.settled = false;
        }
        self.highlights.clear();
    }

    /// Advance the simulation by `delta_ms`
    pub fn update(&mut self, delta_ms: f64) {
        if self.phase == ReelPhase::Idle || !delta_ms.is_finite() || delta_ms <= 0.0 {
            return;
        }
        self.clock_ms += delta_ms;

        let cell = self.spec.cell_size;
        let step = self.timing.base_speed_cells_per_ms * cell * self.timing.speed_scale * delta_ms;
        for col in 0..self.columns.len() {
            if self.columns[col].settled {
                continue;
            }
            self.columns[col].offset += step;
            while self.columns[col].offset >= cell {
                self.columns[col].offset -= cell;
                let fresh = self.generator.draw(self.mode, &mut self.rng);
                self.columns[col].rotate_down(fresh);
            }
        }

        if self.phase != ReelPhase::Staggering {
            return;
        }
        self.elapsed_ms += delta_ms;
        for col in 0..self.columns.len() {
            let due = self.stop_plan.get(col).is_some_and(|t| self.elapsed_ms >= *t);
            if !self.columns[col].settled && due {
                self.settle_column(col);
            }
        }
        if self.columns.iter().all(|c| c.settled) {
            self.finish_stop();
        }
    }

    /// Rolling → Staggering with a left-to-right stop plan.
    ///
    /// Column `i` stops at `base + i × stagger_ms`, `base` is 0 when
    /// `immediate`, otherwise `decel_wait_ms`. No-op unless Rolling.
    pub fn request_stagger_stop(&mut self, immediate: bool) {
        if self.phase != ReelPhase::Rolling {
            return;
        }
        let base = if immediate { 0.0 } else { self.timing.decel_wait_ms };
        self.stop_plan = (0..self.columns.len())
            .map(|i| base + i as f64 * self.timing.stagger_ms)
            .collect();
        self.elapsed_ms = 0.0;
        self.phase = ReelPhase::Staggering;
    }

    /// Settle every column now. Safe in any phase; no-op when Idle.
    pub fn stop_immediate(&mut self) {
        if self.phase == ReelPhase::Idle {
            return;
        }
        for col in 0..self.columns.len() {
            if !self.columns[col].settled {
                self.settle_column(col);
            }
        }
        self.finish_stop();
    }

    /// Resolves when the machine next reaches Idle, or at once if Idle now.
    ///
    /// Only one waiter is kept: a second call replaces the first, whose
    /// receiver then reports the sender as dropped.
    pub fn once_all_stopped(&mut self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        if self.phase == ReelPhase::Idle {
            let _ = tx.send(());
        } else {
            if self.waiter.is_some() {
                log::warn!("reels: replacing a pending all-stopped waiter");
            }
            self.waiter = Some(tx);
        }
        rx
    }

    /// Current on-screen window, row-major. Meaningful once Idle.
    pub fn visible_grid(&self) -> Grid {
        let above = self.spec.buffer_above as usize;
        let cols = self.spec.cols();
        let rows = self.spec.rows();
        let mut cells = Vec::with_capacity(cols * rows);
        for row in 0..rows {
            for column in &self.columns {
                cells.push(column.buffer[above + row].clone());
            }
        }
        Grid::from_parts(cols, rows, cells)
    }

    /// Make the next settle land on `grid` (externally decided outcome).
    /// Applied at once when Idle.
    pub fn apply_result_grid(&mut self, grid: &Grid) -> SlotResult<()> {
        if grid.cols() != self.spec.cols() || grid.rows() != self.spec.rows() {
            return Err(SlotError::InvalidGrid {
                expected: self.spec.total_positions(),
                actual: grid.len(),
            });
        }
        self.forced = Some(grid.clone());
        if self.phase == ReelPhase::Idle {
            for col in 0..self.columns.len() {
                self.write_forced_column(col);
            }
            self.forced = None;
        }
        Ok(())
    }

    /// Mark cells for the win overlay; out-of-range indices are dropped
    pub fn highlight_cells(&mut self, indices: &[usize]) {
        let n = self.spec.total_positions();
        self.highlights = indices.iter().copied().filter(|i| *i < n).collect();
    }

    pub fn clear_highlights(&mut self) {
        self.highlights.clear();
    }

    pub fn highlights(&self) -> &[usize] {
        &self.highlights
    }

    /// Take the stage events emitted since the last drain
    pub fn drain_stages(&mut self) -> Vec<StageEvent> {
        std::mem::take(&mut self.stages)
    }

    /// Drive a full spin on the simulated clock: roll for `spin_time_ms`,
    /// request the staggered stop, tick until every column settles.
    pub fn run_spin(&mut self, spin_time_ms: f64) -> SlotResult<Grid> {
        self.spin_to(spin_time_ms, None)
    }

    /// [`run_spin`](Self::run_spin) that lands on `outcome` when given
    pub fn spin_to(&mut self, spin_time_ms: f64, outcome: Option<&Grid>) -> SlotResult<Grid> {
        self.start();
        if let Some(grid) = outcome {
            if let Err(err) = self.apply_result_grid(grid) {
                self.stop_immediate();
                return Err(err);
            }
        }
        let mut rolled = 0.0;
        while rolled < spin_time_ms {
            self.update(self.frame_ms);
            rolled += self.frame_ms;
        }
        self.request_stagger_stop(false);

        let mut stopped = self.once_all_stopped();
        let budget = self.timing.stop_duration_ms(self.columns.len()) + 2.0 * self.frame_ms;
        let mut waited = 0.0;
        while stopped.try_recv().is_err() {
            if waited > budget {
                self.stop_immediate();
                return Err(SlotError::ReelStalled(budget));
            }
            self.update(self.frame_ms);
            waited += self.frame_ms;
        }
        Ok(self.visible_grid())
    }

    fn settle_column(&mut self, col: usize) {
        self.write_forced_column(col);
        let column = &mut self.columns[col];
        column.settled = true;
        column.offset = 0.0;

        let above = self.spec.buffer_above as usize;
        let symbols = column
            .buffer
            .iter()
            .skip(above)
            .take(self.spec.rows())
            .map(|s| s.as_str().to_string())
            .collect();
        self.stages.push(StageEvent::new(
            Stage::ReelStop {
                reel_index: stage_u8(col),
                symbols,
            },
            self.clock_ms,
        ));
    }

    fn finish_stop(&mut self) {
        self.phase = ReelPhase::Idle;
        self.stop_plan.clear();
        self.elapsed_ms = 0.0;
        self.forced = None;
        for column in &mut self.columns {
            column.offset = 0.0;
        }
        self.stages
            .push(StageEvent::new(Stage::ReelsSettled, self.clock_ms));
        if let Some(waiter) = self.waiter.take() {
            let _ = waiter.send(());
        }
    }

    fn write_forced_column(&mut self, col: usize) {
        let Some(grid) = &self.forced else { return };
        let above = self.spec.buffer_above as usize;
        for row in 0..self.spec.rows() {
            self.columns[col].buffer[above + row] = grid.at(row, col).clone();
        }
    }
}

impl ReelStateMachine<SlotRng> {
    /// Reels with the standard 5×5 setup and a seeded stream
    pub fn standard(seed: Option<u64>) -> SlotResult<Self> {
        Self::new(
            GridSpec::standard_5x5(),
            ReelTiming::normal(),
            SymbolGenerator::standard(),
            SlotRng::new(seed),
        )
    }
}

impl<R: RandomSource> RespinSource for ReelStateMachine<R> {
    fn enter_feature(&mut self, speed_scale: f64) -> SlotResult<()> {
        let previous = self.timing.speed_scale;
        self.set_speed_scale(speed_scale)?;
        self.saved_speed_scale = Some(previous);
        self.set_feature_mode(true);
        Ok(())
    }

    fn respin(&mut self, spin_time_ms: f64) -> SlotResult<Grid> {
        self.run_spin(spin_time_ms)
    }

    fn exit_feature(&mut self) {
        self.stop_immediate();
        self.set_feature_mode(false);
        let restored = self.saved_speed_scale.take().unwrap_or(1.0);
        if let Err(err) = self.set_speed_scale(restored) {
            log::warn!("reels: could not restore speed scale {restored}: {err}");
        }
    }

    fn drain_stages(&mut self) -> Vec<StageEvent> {
        ReelStateMachine::drain_stages(self)
    }

    fn clock_ms(&self) -> Option<f64> {
        Some(self.clock_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedRng;
    use crate::symbols::keys;
    use crate::weights::WeightTable;

    fn reels() -> ReelStateMachine<SlotRng> {
        ReelStateMachine::standard(Some(7)).unwrap()
    }

    fn coin_only() -> SymbolGenerator {
        SymbolGenerator::new(
            WeightTable::new([(keys::COIN, 1)]),
            WeightTable::new([(keys::PIG, 1)]),
        )
    }

    #[test]
    fn test_rejects_bad_setup() {
        let empty = SymbolGenerator::new(WeightTable::new([(keys::COIN, 0)]), coin_only().feature);
        let err = ReelStateMachine::new(
            GridSpec::standard_5x5(),
            ReelTiming::normal(),
            empty,
            ScriptedRng::constant(0.1),
        )
        .unwrap_err();
        assert!(matches!(err, SlotError::ZeroWeightTable(_)));

        let slow = ReelTiming::normal().with_speed_scale(0.05);
        assert!(
            ReelStateMachine::new(GridSpec::standard_5x5(), slow, coin_only(), SlotRng::seeded(1))
                .is_err()
        );
    }

    #[test]
    fn test_start_update_offsets() {
        let mut reels = reels();
        reels.start();
        assert_eq!(reels.phase(), ReelPhase::Rolling);
        // 1.4 units per ms at scale 1: 50 ms = 70 units, half a cell
        reels.update(50.0);
        assert!((reels.column_offset(0).unwrap() - 70.0).abs() < 1e-9);
        // crossing a cell wraps the offset
        reels.update(100.0);
        assert!((reels.column_offset(0).unwrap() - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotation_draws_from_active_table() {
        let mut reels = ReelStateMachine::new(
            GridSpec::standard_5x5(),
            ReelTiming::normal(),
            coin_only(),
            SlotRng::seeded(3),
        )
        .unwrap();
        reels.set_feature_mode(true);
        reels.start();
        // 10 cells per column pushes every buffered coin out
        reels.update(1000.0);
        reels.stop_immediate();
        assert!(reels.visible_grid().cells().iter().all(|s| s.as_str() == keys::PIG));
    }

    #[test]
    fn test_stagger_plan_and_cascade() {
        let mut reels = reels();
        reels.start();
        reels.request_stagger_stop(false);
        assert_eq!(reels.phase(), ReelPhase::Staggering);
        assert_eq!(reels.stop_plan(), &[160.0, 270.0, 380.0, 490.0, 600.0]);

        reels.update(160.0);
        assert!(reels.is_column_settled(0));
        assert!(!reels.is_column_settled(1));
        reels.update(110.0);
        assert!(reels.is_column_settled(1));
        reels.update(330.0);
        assert_eq!(reels.phase(), ReelPhase::Idle);

        let stops: Vec<u8> = reels
            .drain_stages()
            .into_iter()
            .filter_map(|e| match e.stage {
                Stage::ReelStop { reel_index, .. } => Some(reel_index),
                _ => None,
            })
            .collect();
        assert_eq!(stops, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_immediate_stagger_starts_at_zero() {
        let mut reels = reels();
        reels.start();
        reels.request_stagger_stop(true);
        assert_eq!(reels.stop_plan()[0], 0.0);
        assert_eq!(reels.stop_plan()[4], 440.0);
    }

    #[test]
    fn test_stagger_request_ignored_unless_rolling() {
        let mut reels = reels();
        reels.request_stagger_stop(false);
        assert_eq!(reels.phase(), ReelPhase::Idle);

        reels.start();
        reels.request_stagger_stop(false);
        reels.update(100.0);
        reels.request_stagger_stop(true);
        // plan kept, elapsed not reset
        assert_eq!(reels.stop_plan()[0], 160.0);
        reels.update(60.0);
        assert!(reels.is_column_settled(0));
    }

    #[test]
    fn test_stop_immediate_idle_is_noop() {
        let mut reels = reels();
        let before = reels.visible_grid();
        reels.stop_immediate();
        reels.stop_immediate();
        assert_eq!(reels.phase(), ReelPhase::Idle);
        assert!(reels.drain_stages().is_empty());
        assert_eq!(reels.visible_grid(), before);
    }

    #[test]
    fn test_stop_immediate_resolves_waiter() {
        let mut reels = reels();
        reels.start();
        reels.update(30.0);
        let mut rx = reels.once_all_stopped();
        assert!(rx.try_recv().is_err());
        reels.stop_immediate();
        assert!(rx.try_recv().is_ok());
        assert!((0..5).all(|c| reels.column_offset(c) == Some(0.0)));

        let settled = reels
            .drain_stages()
            .iter()
            .filter(|e| e.stage == Stage::ReelsSettled)
            .count();
        assert_eq!(settled, 1);
    }

    #[test]
    fn test_once_all_stopped_when_idle() {
        let mut reels = reels();
        let mut rx = reels.once_all_stopped();
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_visible_grid_after_settle() {
        let mut reels = reels();
        let grid = reels.run_spin(1100.0).unwrap();
        assert_eq!(grid.len(), 25);
        assert!(grid.cells().iter().all(|s| !s.is_empty()));
        assert!(!reels.is_rolling());
    }

    #[test]
    fn test_apply_result_grid_lands_on_settle() {
        let mut reels = reels();
        let keys_vec: Vec<String> = (0..25)
            .map(|i| if i % 2 == 0 { "diamond".to_string() } else { "pig".to_string() })
            .collect();
        let target = Grid::from_keys(&GridSpec::standard_5x5(), &keys_vec).unwrap();

        reels.start();
        reels.apply_result_grid(&target).unwrap();
        reels.update(200.0);
        reels.request_stagger_stop(false);
        let mut rx = reels.once_all_stopped();
        for _ in 0..100 {
            reels.update(16.0);
        }
        assert!(rx.try_recv().is_ok());
        assert_eq!(reels.visible_grid(), target);
    }

    #[test]
    fn test_apply_result_grid_checks_shape() {
        let mut reels = reels();
        let small = Grid::new(3, 3, vec![SymbolId::from("coin"); 9]).unwrap();
        assert!(matches!(
            reels.apply_result_grid(&small),
            Err(SlotError::InvalidGrid { .. })
        ));
    }

    #[test]
    fn test_highlights_cleared_on_start() {
        let mut reels = reels();
        reels.highlight_cells(&[0, 3, 99]);
        assert_eq!(reels.highlights(), &[0, 3]);
        reels.start();
        assert!(reels.highlights().is_empty());
    }

    #[test]
    fn test_feature_enter_exit_restores() {
        let mut reels = reels();
        reels.enter_feature(0.6).unwrap();
        assert_eq!(reels.weight_mode(), WeightMode::Feature);
        assert_eq!(reels.timing().speed_scale, 0.6);
        reels.start();
        reels.exit_feature();
        assert!(!reels.is_rolling());
        assert_eq!(reels.weight_mode(), WeightMode::Base);
        assert_eq!(reels.timing().speed_scale, 1.0);

        assert!(reels.enter_feature(5.0).is_err());
    }
}
