//! Session engine: stake handling, base spin, bonus dispatch, statistics
//!
//! ```text
//! spin(stake)
//!   ├── debit stake
//!   ├── reels: start → auto stop → staggered stop → settled grid
//!   ├── pigs ≥ trigger ──► Lock & Win round (feature table, slow reels)
//!   ├── otherwise ───────► ways + base-game hammers
//!   └── credit win, tier, stats, stage trace
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use ps_stage::{Stage, StageEvent, StagePayload, StageTrace, WinTier};

use crate::config::SlotConfig;
use crate::error::{SlotError, SlotResult};
use crate::features::{
    BaseHammerAward, LockAndWinOutcome, LockAndWinRound, RespinSource, award_base_hammers,
};
use crate::grid::{BoardGeometry, Grid, stage_u8};
use crate::paytable::{EvaluationResult, PayTable};
use crate::reels::ReelStateMachine;
use crate::rng::SlotRng;
use crate::spin::SpinResult;
use crate::timing::TimestampGenerator;

/// Session statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_spins: u64,
    pub total_bet: f64,
    pub total_win: f64,
    pub wins: u64,
    pub losses: u64,
    pub features_triggered: u64,
    pub feature_win: f64,
    pub hammer_awards: u64,
    pub full_boards: u64,
    pub max_win_ratio: f64,
    /// Spins that reached each tier, lowest first
    pub tier_counts: [u64; 5],
}

impl SessionStats {
    /// Calculate RTP
    pub fn rtp(&self) -> f64 {
        if self.total_bet > 0.0 {
            (self.total_win / self.total_bet) * 100.0
        } else {
            0.0
        }
    }

    /// Calculate hit rate
    pub fn hit_rate(&self) -> f64 {
        if self.total_spins > 0 {
            (self.wins as f64 / self.total_spins as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Spins per bonus trigger
    pub fn feature_frequency(&self) -> Option<f64> {
        (self.features_triggered > 0).then(|| self.total_spins as f64 / self.features_triggered as f64)
    }

    /// Fold another session in (parallel simulation)
    pub fn merge(&mut self, other: &SessionStats) {
        self.total_spins += other.total_spins;
        self.total_bet += other.total_bet;
        self.total_win += other.total_win;
        self.wins += other.wins;
        self.losses += other.losses;
        self.features_triggered += other.features_triggered;
        self.feature_win += other.feature_win;
        self.hammer_awards += other.hammer_awards;
        self.full_boards += other.full_boards;
        self.max_win_ratio = self.max_win_ratio.max(other.max_win_ratio);
        for (mine, theirs) in self.tier_counts.iter_mut().zip(other.tier_counts) {
            *mine += theirs;
        }
    }

    fn record(&mut self, result: &SpinResult) {
        self.total_spins += 1;
        self.total_bet += result.stake;
        self.total_win += result.total_win;
        if result.is_win() {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        if let Some(feature) = &result.feature {
            self.features_triggered += 1;
            self.feature_win += feature.total;
            if feature.full_board {
                self.full_boards += 1;
            }
        }
        if result.base_hammer.as_ref().is_some_and(|a| !a.is_empty()) {
            self.hammer_awards += 1;
        }
        self.max_win_ratio = self.max_win_ratio.max(result.win_ratio);
        if let Some(tier) = result.win_tier {
            self.tier_counts[tier as usize] += 1;
        }
    }
}

/// Piggy Smash session engine
#[derive(Debug)]
pub struct SlotEngine {
    config: SlotConfig,
    paytable: PayTable,
    reels: ReelStateMachine<SlotRng>,
    /// Pig values and hammer roaming
    rng: SlotRng,
    balance: f64,
    stake: f64,
    stats: SessionStats,
    spin_count: u64,
    clock: TimestampGenerator,
    last_trace: Option<StageTrace>,
}

impl SlotEngine {
    /// Engine with the default configuration
    pub fn new(seed: Option<u64>) -> SlotResult<Self> {
        Self::with_config(SlotConfig::default(), seed)
    }

    /// Validate `config` and build the engine around it
    pub fn with_config(config: SlotConfig, seed: Option<u64>) -> SlotResult<Self> {
        config.validate()?;

        let reel_rng = SlotRng::new(seed);
        let rng = SlotRng::new(seed.map(|s| s.wrapping_add(0x9E37_79B9_7F4A_7C15)));
        let reels = ReelStateMachine::new(
            config.grid,
            config.timing,
            config.weights.clone(),
            reel_rng,
        )?
        .with_frame_ms(config.pacing.frame_ms);

        let stake = config.bet_ladder.steps.first().copied().unwrap_or(10.0);
        log::info!(
            "slot engine: {}x{} grid, balance {:.0}, stake {:.0}",
            config.grid.reels,
            config.grid.rows,
            config.starting_balance,
            stake
        );

        Ok(Self {
            paytable: PayTable::new(config.symbols.clone()),
            clock: TimestampGenerator::new(config.pacing, config.timing),
            balance: config.starting_balance,
            config,
            reels,
            rng,
            stake,
            stats: SessionStats::default(),
            spin_count: 0,
            last_trace: None,
        })
    }

    pub fn config(&self) -> &SlotConfig {
        &self.config
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn stake(&self) -> f64 {
        self.stake
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = SessionStats::default();
    }

    pub fn reels(&self) -> &ReelStateMachine<SlotRng> {
        &self.reels
    }

    pub fn paytable(&self) -> &PayTable {
        &self.paytable
    }

    /// Stage trace of the most recent spin
    pub fn last_trace(&self) -> Option<&StageTrace> {
        self.last_trace.as_ref()
    }

    /// Set the default stake
    pub fn set_stake(&mut self, stake: f64) -> SlotResult<()> {
        if !(stake.is_finite() && stake > 0.0) {
            return Err(SlotError::InvalidStake(stake));
        }
        self.stake = stake;
        Ok(())
    }

    /// Move one rung up or down the bet ladder (wraps)
    pub fn step_stake(&mut self, up: bool) -> f64 {
        self.stake = self.config.bet_ladder.step(self.stake, up);
        self.stake
    }

    pub fn deposit(&mut self, amount: f64) {
        if amount.is_finite() && amount > 0.0 {
            self.balance += amount;
        }
    }

    /// Spin at the current stake
    pub fn spin_default(&mut self) -> SlotResult<SpinResult> {
        self.spin(self.stake)
    }

    /// Paid spin with a locally generated grid
    pub fn spin(&mut self, stake: f64) -> SlotResult<SpinResult> {
        self.play(stake, None, None)
    }

    /// Paid spin landing on an externally decided grid
    pub fn spin_with_grid(&mut self, stake: f64, grid: &Grid) -> SlotResult<SpinResult> {
        self.play(stake, Some(grid), None)
    }

    /// Paid spin with both the base grid and any bonus respins decided
    /// externally
    pub fn spin_with_outcome(
        &mut self,
        stake: f64,
        grid: &Grid,
        respins: &mut dyn RespinSource,
    ) -> SlotResult<SpinResult> {
        self.play(stake, Some(grid), Some(respins))
    }

    fn play(
        &mut self,
        stake: f64,
        outcome: Option<&Grid>,
        respins: Option<&mut dyn RespinSource>,
    ) -> SlotResult<SpinResult> {
        if !(stake.is_finite() && stake > 0.0) {
            return Err(SlotError::InvalidStake(stake));
        }
        if self.balance < stake {
            return Err(SlotError::InsufficientBalance {
                needed: stake,
                available: self.balance,
            });
        }

        self.spin_count += 1;
        let spin_id = format!("spin-{:06}", self.spin_count);
        let mut trace = StageTrace::new(spin_id.clone());

        self.clock.reset();
        let origin = self.reels.clock_ms();
        trace.push(StageEvent::with_payload(
            Stage::SpinStart { stake },
            self.clock.current(),
            StagePayload::with_win(0.0, Some(stake)),
        ));

        self.balance -= stake;
        self.reels.set_feature_mode(false);
        let grid = match self.reels.spin_to(self.config.pacing.auto_stop_ms, outcome) {
            Ok(grid) => grid,
            Err(err) => {
                self.reels.drain_stages();
                self.balance += stake;
                return Err(err);
            }
        };
        self.absorb_reel_stages(&mut trace, origin);

        let pigs = grid.find(|s| self.config.symbols.is_lockable(s)).len();
        let triggered = pigs >= self.config.lock_and_win.trigger_count as usize;

        let mut ways = EvaluationResult::default();
        let mut base_hammer = None;
        let mut feature = None;

        if triggered {
            log::info!("{spin_id}: {pigs} pigs, entering lock & win");
            let round = LockAndWinRound::new(
                self.config.lock_and_win,
                self.config.pacing,
                self.config.timing,
                self.config.symbols.clone(),
                self.config.pig_values.clone(),
                BoardGeometry::from(&grid),
            )
            .starting_at(self.clock.current());

            let played = match respins {
                Some(source) => round.run(&grid, source, &mut self.rng),
                None => round.run(&grid, &mut self.reels, &mut self.rng),
            };
            let outcome = match played {
                Ok(outcome) => outcome,
                Err(err) => {
                    log::warn!("{spin_id}: lock & win aborted: {err}");
                    self.balance += stake;
                    return Err(err);
                }
            };
            if let Some(last) = outcome.stages.last() {
                self.clock.catch_up(last.timestamp_ms);
            }
            trace.extend(outcome.stages.iter().cloned());
            feature = Some(outcome);
        } else {
            trace.push(StageEvent::new(Stage::EvaluateWins, self.clock.current()));
            ways = self.paytable.evaluate(&grid, stake);
            if self.config.enable_hammer_base {
                let award = award_base_hammers(
                    &grid,
                    &self.config.symbols,
                    &self.config.pig_values,
                    &mut self.rng,
                );
                let ts = self.clock.current();
                for smash in &award.smashed {
                    trace.push(StageEvent::with_payload(
                        Stage::HammerAward {
                            hammer_index: stage_u8(smash.hammer),
                            pig_index: stage_u8(smash.at),
                            amount: smash.amount,
                        },
                        ts,
                        StagePayload::with_win(smash.amount, Some(stake)),
                    ));
                }
                base_hammer = Some(award);
            }
        }

        let total_win = ways.total
            + base_hammer.as_ref().map(|a| a.total).unwrap_or(0.0)
            + feature.as_ref().map(|f| f.total).unwrap_or(0.0);
        let win_ratio = total_win / stake;
        let win_tier = self.config.win_tiers.tier_for(total_win, stake);
        let highlight = Self::highlight_for(&ways, base_hammer.as_ref(), feature.as_ref());

        self.balance += total_win;
        if highlight.is_empty() {
            self.reels.clear_highlights();
        } else {
            self.reels.highlight_cells(&highlight);
        }

        if total_win > 0.0 {
            let ts = self.clock.win_reveal();
            trace.push(StageEvent::with_payload(
                Stage::WinPresent {
                    win_amount: total_win,
                    way_count: stage_u8(ways.win_count()),
                },
                ts,
                StagePayload::with_win(total_win, Some(stake)).highlight(highlight.iter().copied()),
            ));
            if let Some(tier) = win_tier {
                trace.push(StageEvent::new(
                    Stage::WinTierReached {
                        tier,
                        amount: total_win,
                    },
                    ts,
                ));
            }
        }
        trace.push(StageEvent::with_payload(
            Stage::SpinEnd,
            self.clock.current(),
            StagePayload::new().grid(grid.to_keys()),
        ));

        let result = SpinResult {
            spin_id,
            grid,
            stake,
            ways,
            base_hammer,
            feature,
            total_win,
            win_ratio,
            win_tier,
            highlight,
            balance: self.balance,
        };
        self.stats.record(&result);
        self.last_trace = Some(trace);

        log::debug!(
            "{}: win {:.2} ({:.2}x){}, balance {:.2}",
            result.spin_id,
            result.total_win,
            result.win_ratio,
            result.win_tier.map(|t| format!(" {}", t.title())).unwrap_or_default(),
            result.balance
        );
        Ok(result)
    }

    /// Move reel stage events into the trace on the engine clock
    fn absorb_reel_stages(&mut self, trace: &mut StageTrace, origin: f64) {
        let base = self.clock.current();
        for mut event in self.reels.drain_stages() {
            let offset = (event.timestamp_ms - origin).max(0.0);
            event.timestamp_ms = self.clock.catch_up(base + offset);
            trace.push(event);
        }
    }

    fn highlight_for(
        ways: &EvaluationResult,
        base_hammer: Option<&BaseHammerAward>,
        feature: Option<&LockAndWinOutcome>,
    ) -> Vec<usize> {
        if let Some(feature) = feature {
            return feature.highlight.clone();
        }
        let mut cells: BTreeSet<usize> = ways.highlight().into_iter().collect();
        if let Some(award) = base_hammer {
            cells.extend(award.highlight.iter().copied());
        }
        cells.into_iter().collect()
    }
}

/// Tier of a win for a default-configured game
pub fn classify_win(total_win: f64, stake: f64) -> Option<WinTier> {
    crate::config::WinTierThresholds::default().tier_for(total_win, stake)
}
