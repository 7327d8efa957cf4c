//! Bonus and base-game features
//!
//! ```text
//! settled base grid
//!     │
//!     ├── pigs ≥ trigger ──► LockAndWinRound ──► RespinSource (reels / scripted)
//!     │                           │
//!     │                           └── hammer::step_hammers (per respin)
//!     │
//!     └── otherwise ──────► ways evaluation + base_hammer::award_base_hammers
//! ```

pub mod base_hammer;
pub mod hammer;
pub mod hold_and_win;
pub mod pig_value;

pub use base_hammer::*;
pub use hammer::*;
pub use hold_and_win::*;
pub use pig_value::*;

use std::collections::VecDeque;

use ps_stage::StageEvent;

use crate::error::{SlotError, SlotResult};
use crate::grid::Grid;

/// Anything that can produce the settled grid of a bonus respin
pub trait RespinSource {
    /// Switch to bonus behaviour (feature weights, slower reels)
    fn enter_feature(&mut self, speed_scale: f64) -> SlotResult<()>;

    /// Spin once and return the settled grid
    fn respin(&mut self, spin_time_ms: f64) -> SlotResult<Grid>;

    /// Restore base behaviour. Must be safe to call in any state.
    fn exit_feature(&mut self);

    /// Stage events produced since the last call
    fn drain_stages(&mut self) -> Vec<StageEvent> {
        Vec::new()
    }

    /// Clock the drained stage timestamps are measured on, if any
    fn clock_ms(&self) -> Option<f64> {
        None
    }
}

/// Replays a fixed sequence of respin outcomes (external authority, tests)
#[derive(Debug, Clone, Default)]
pub struct ScriptedRespins {
    grids: VecDeque<Grid>,
    active: bool,
    played: usize,
}

impl ScriptedRespins {
    pub fn new(grids: impl IntoIterator<Item = Grid>) -> Self {
        Self {
            grids: grids.into_iter().collect(),
            active: false,
            played: 0,
        }
    }

    pub fn push(&mut self, grid: Grid) {
        self.grids.push_back(grid);
    }

    /// Outcomes not yet consumed
    pub fn remaining(&self) -> usize {
        self.grids.len()
    }

    pub fn played(&self) -> usize {
        self.played
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl RespinSource for ScriptedRespins {
    fn enter_feature(&mut self, _speed_scale: f64) -> SlotResult<()> {
        self.active = true;
        Ok(())
    }

    fn respin(&mut self, _spin_time_ms: f64) -> SlotResult<Grid> {
        let grid = self
            .grids
            .pop_front()
            .ok_or_else(|| SlotError::InvalidConfig("scripted respins exhausted".into()))?;
        self.played += 1;
        Ok(grid)
    }

    fn exit_feature(&mut self) {
        self.active = false;
    }
}
