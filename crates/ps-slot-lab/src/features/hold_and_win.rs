//! Lock & Win bonus round
//!
//! `Enter → (Respin → Evaluate)* → Finish`
//!
//! Entry locks every lockable cell of the triggering grid. Each respin locks
//! newly landed lockable symbols on unlocked cells, runs the hammer step
//! (hammer variant), then refills the respin counter if anything locked or
//! decrements it otherwise. The round ends when the counter hits zero or no
//! unlocked cell remains.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use ps_stage::{Stage, StageEvent, StagePayload};

use crate::config::{LockAndWinConfig, LockVariant, PacingConfig, ReelTiming};
use crate::error::SlotResult;
use crate::grid::{BoardGeometry, Grid, stage_u8};
use crate::rng::RandomSource;
use crate::symbols::{SymbolCatalog, SymbolId, SymbolRole};
use crate::timing::TimestampGenerator;

use super::RespinSource;
use super::hammer::{Hammer, HammerBoard, HammerStep, LockedCell, LockedCells, step_hammers};
use super::pig_value::PigValueTable;

/// What one respin changed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RespinReport {
    /// 1-based respin number
    pub round: u32,
    /// Cells locked this respin
    pub new_locks: Vec<usize>,
    pub respins_remaining: u8,
    /// Hammer step, when any hammer was on the board
    pub hammer_step: Option<HammerStep>,
}

/// Final result of a bonus round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockAndWinOutcome {
    /// Credits paid: still-locked cells plus hammer totals, times the
    /// full-board multiplier when it applies
    pub total: f64,
    /// Cells still locked at the end (smashed cells excluded)
    pub locked: Vec<LockedCell>,
    pub hammers: Vec<Hammer>,
    pub locked_total: f64,
    pub hammer_total: f64,
    pub respins_played: u32,
    /// Every cell locked when the round ended
    pub full_board: bool,
    pub multiplier: f64,
    /// Locked cells plus hammers holding credits
    pub highlight: Vec<usize>,
    pub stages: Vec<StageEvent>,
}

/// Orchestrates one Lock & Win round over a [`RespinSource`]
#[derive(Debug, Clone)]
pub struct LockAndWinRound {
    config: LockAndWinConfig,
    pacing: PacingConfig,
    catalog: SymbolCatalog,
    values: PigValueTable,
    geometry: BoardGeometry,
    locked: LockedCells,
    hammers: HammerBoard,
    respins_remaining: u8,
    round: u32,
    clock: TimestampGenerator,
    stages: Vec<StageEvent>,
}

impl LockAndWinRound {
    pub fn new(
        config: LockAndWinConfig,
        pacing: PacingConfig,
        timing: ReelTiming,
        catalog: SymbolCatalog,
        values: PigValueTable,
        geometry: BoardGeometry,
    ) -> Self {
        Self {
            config,
            pacing,
            catalog,
            values,
            geometry,
            locked: LockedCells::new(),
            hammers: HammerBoard::new(),
            respins_remaining: config.start_respins,
            round: 0,
            clock: TimestampGenerator::new(pacing, timing),
            stages: Vec::new(),
        }
    }

    /// Stage timestamps continue from `start_ms`
    pub fn starting_at(mut self, start_ms: f64) -> Self {
        self.clock.catch_up(start_ms);
        self
    }

    pub fn locked(&self) -> &LockedCells {
        &self.locked
    }

    pub fn hammers(&self) -> &HammerBoard {
        &self.hammers
    }

    pub fn respins_remaining(&self) -> u8 {
        self.respins_remaining
    }

    pub fn rounds_played(&self) -> u32 {
        self.round
    }

    pub fn unlocked_count(&self) -> usize {
        self.geometry.cell_count().saturating_sub(self.locked.len())
    }

    /// True once respins are exhausted or the board is full
    pub fn is_finished(&self) -> bool {
        self.respins_remaining == 0 || self.unlocked_count() == 0
    }

    /// Lock every lockable cell of the triggering grid and reset the counter
    pub fn enter(&mut self, grid: &Grid, rng: &mut impl RandomSource) -> usize {
        self.respins_remaining = self.config.start_respins;
        self.round = 0;
        let landed = self.lock_new(grid, rng);

        let ts = self.clock.current();
        self.stages.push(StageEvent::with_payload(
            Stage::FeatureEnter {
                locked_count: stage_u8(self.locked.len()),
                respins: self.respins_remaining,
            },
            ts,
            StagePayload::new()
                .highlight(self.locked.indices())
                .grid(grid.to_keys())
                .respins_remaining(self.respins_remaining as u32),
        ));
        log::info!(
            "lock & win: entered with {} locked ({:.0} credits), {} respins",
            landed.len(),
            self.locked.total(),
            self.respins_remaining
        );
        landed.len()
    }

    /// Resolve one settled respin grid
    pub fn resolve_respin(&mut self, grid: &Grid, rng: &mut impl RandomSource) -> RespinReport {
        self.round += 1;

        let new_locks = self.lock_new(grid, rng);

        let hammer_step = match self.config.variant {
            LockVariant::Hammer => self.resolve_hammers(grid, rng),
            LockVariant::Hold => None,
        };

        if new_locks.is_empty() {
            self.respins_remaining = self.respins_remaining.saturating_sub(1);
        } else {
            self.respins_remaining = self.config.start_respins;
        }

        let ts = self.clock.current();
        self.stages.push(StageEvent::new(
            Stage::RespinEnd {
                round: self.round,
                respins_remaining: self.respins_remaining,
                new_locks: stage_u8(new_locks.len()),
            },
            ts,
        ));
        log::debug!(
            "lock & win: respin {} locked {}, {} respins left",
            self.round,
            new_locks.len(),
            self.respins_remaining
        );

        RespinReport {
            round: self.round,
            new_locks,
            respins_remaining: self.respins_remaining,
            hammer_step,
        }
    }

    /// Drive the whole round on `source`. `exit_feature` always runs.
    pub fn run<S: RespinSource + ?Sized>(
        mut self,
        start_grid: &Grid,
        source: &mut S,
        rng: &mut impl RandomSource,
    ) -> SlotResult<LockAndWinOutcome> {
        self.enter(start_grid, rng);

        let result = source
            .enter_feature(self.config.feature_speed_scale)
            .and_then(|()| self.respin_loop(source, rng));
        source.exit_feature();
        let leftover = source.drain_stages();
        self.absorb_stages(leftover, source.clock_ms());
        result?;

        Ok(self.finish())
    }

    /// Close the round and compute the payout
    pub fn finish(mut self) -> LockAndWinOutcome {
        let locked_total = self.locked.total();
        let hammer_total = self.hammers.total();
        let full_board = self.unlocked_count() == 0;
        let multiplier = if full_board {
            self.config.full_board_multiplier
        } else {
            1.0
        };
        let total = (locked_total + hammer_total) * multiplier;

        let mut highlight: BTreeSet<usize> = self.locked.indices().into_iter().collect();
        highlight.extend(self.hammers.iter().filter(|h| h.total > 0.0).map(|h| h.position));
        let highlight: Vec<usize> = highlight.into_iter().collect();

        let ts = self.clock.round_pause();
        self.stages.push(StageEvent::with_payload(
            Stage::FeatureExit { total_win: total },
            ts,
            StagePayload::with_win(total, None).highlight(highlight.iter().copied()),
        ));
        log::info!(
            "lock & win: finished after {} respins, locked {:.0} + hammers {:.0} = {:.0}{}",
            self.round,
            locked_total,
            hammer_total,
            total,
            if full_board { " (full board)" } else { "" }
        );

        LockAndWinOutcome {
            total,
            locked: self.locked.iter().cloned().collect(),
            hammers: self.hammers.iter().cloned().collect(),
            locked_total,
            hammer_total,
            respins_played: self.round,
            full_board,
            multiplier,
            highlight,
            stages: self.stages,
        }
    }

    fn respin_loop<S: RespinSource + ?Sized>(
        &mut self,
        source: &mut S,
        rng: &mut impl RandomSource,
    ) -> SlotResult<()> {
        while !self.is_finished() {
            let ts = self.clock.current();
            self.stages.push(StageEvent::new(
                Stage::RespinStart {
                    round: self.round + 1,
                    respins_remaining: self.respins_remaining,
                },
                ts,
            ));

            let origin = source.clock_ms();
            let grid = source.respin(self.pacing.respin_spin_ms)?;
            let reel_stages = source.drain_stages();
            if origin.is_none() || reel_stages.is_empty() {
                self.clock.advance(self.pacing.respin_spin_ms);
                self.clock.stop_window(self.geometry.cols);
            }
            self.absorb_stages(reel_stages, origin);

            self.resolve_respin(&grid, rng);
            self.clock.round_pause();
        }
        Ok(())
    }

    /// Append source events, re-based from the source clock onto ours
    fn absorb_stages(&mut self, events: Vec<StageEvent>, origin: Option<f64>) {
        let base = self.clock.current();
        for mut event in events {
            let offset = origin.map(|o| event.timestamp_ms - o).unwrap_or(0.0);
            event.timestamp_ms = self.clock.catch_up(base + offset.max(0.0));
            self.stages.push(event);
        }
    }

    /// Lock lockable symbols on unlocked cells; returns the new indices
    fn lock_new(&mut self, grid: &Grid, rng: &mut impl RandomSource) -> Vec<usize> {
        let mut landed = Vec::new();
        for (index, symbol) in grid.cells().iter().enumerate() {
            if self.locked.is_locked(index) {
                continue;
            }
            let gold = match self.catalog.role_of(symbol) {
                Some(SymbolRole::Pig) => false,
                Some(SymbolRole::GoldPig) => true,
                _ => continue,
            };
            let amount = self.values.roll(gold, rng);
            let key = SymbolId::new(symbol.normalized());
            self.locked.lock(index, amount, key.clone());
            landed.push(index);

            let ts = self.clock.current();
            self.stages.push(StageEvent::new(
                Stage::SymbolLocked {
                    index: stage_u8(index),
                    amount,
                    symbol: key.to_string(),
                },
                ts,
            ));
        }
        landed
    }

    /// Existing hammers plus hammer symbols revealed on free cells
    fn resolve_hammers(&mut self, grid: &Grid, rng: &mut impl RandomSource) -> Option<HammerStep> {
        let mut visible = self.hammers.positions();
        for index in grid.find(|s| self.catalog.is_hammer(s)) {
            if !self.locked.is_locked(index) && !visible.contains(&index) {
                visible.push(index);
            }
        }
        if visible.is_empty() {
            return None;
        }

        let step = step_hammers(&visible, &self.hammers, &mut self.locked, &self.geometry, rng);

        let ts = self.clock.current();
        for fuse in &step.fused {
            self.stages.push(StageEvent::new(
                Stage::HammerFuse {
                    first: stage_u8(fuse.first),
                    second: stage_u8(fuse.second),
                    total: fuse.total,
                },
                ts,
            ));
        }
        for mv in &step.moved {
            let stage = match step.smashed.iter().find(|s| s.hammer == mv.hammer) {
                Some(smash) => Stage::HammerSmash {
                    from: stage_u8(mv.from),
                    at: stage_u8(smash.at),
                    amount: smash.amount,
                    total: smash.total,
                },
                None => Stage::HammerRoam {
                    from: stage_u8(mv.from),
                    to: stage_u8(mv.to),
                },
            };
            self.stages.push(StageEvent::new(stage, ts));
        }

        self.hammers = step.board.clone();
        Some(step)
    }
}
