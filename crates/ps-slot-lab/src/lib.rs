//! # ps-slot-lab: Piggy Smash rules engine
//!
//! A 5×5 ways-pay slot with a pig-locking bonus round driven by hammers.
//!
//! ## Features
//!
//! - **Weighted Symbols**: cumulative-weight draws from a base or feature table
//! - **Reel State Machine**: continuous scroll, staggered left-to-right stop
//! - **Ways Evaluation**: runs from the leftmost reel, wilds substitute
//! - **Hammer Resolution**: fuse, smash, roam once per respin
//! - **Lock & Win**: respin counter that refills on every new lock
//! - **Stage Generation**: `ps-stage` events for audio/FX/UI consumers
//!
//! ## Architecture
//!
//! ```text
//! SlotEngine
//!     │
//!     ├── SlotConfig (grid, timing, symbols, weights, bonus, tiers)
//!     ├── ReelStateMachine ── SymbolGenerator ── RandomSource
//!     ├── PayTable (ways)
//!     └── LockAndWinRound ── step_hammers
//!           │
//!           v
//!     SpinResult + StageTrace
//! ```
//!
//! Every random decision goes through [`RandomSource`]; seed [`SlotRng`] or
//! script [`ScriptedRng`] for reproducible runs.

pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod grid;
pub mod paytable;
pub mod reels;
pub mod rng;
pub mod spin;
pub mod symbols;
pub mod timing;
pub mod weights;

pub use config::*;
pub use engine::*;
pub use error::*;
pub use features::*;
pub use grid::*;
pub use paytable::*;
pub use reels::*;
pub use rng::*;
pub use spin::*;
pub use symbols::*;
pub use timing::*;
pub use weights::*;
