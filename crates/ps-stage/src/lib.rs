//! # ps-stage: Piggy Smash stage signals
//!
//! The rules engine never talks to audio, FX or the HUD directly. It emits
//! STAGES: semantic moments in the game flow (a reel settled, a pig locked,
//! a hammer smashed). Presentation layers subscribe to stages and re-derive
//! everything they draw from stage payloads and the engine's explicit outputs.
//!
//! ## Flow
//!
//! ```text
//! SpinStart → ReelStop ×5 → ReelsSettled → EvaluateWins → WinPresent → SpinEnd
//!                                        └→ FeatureEnter → (RespinStart → ReelStop ×5
//!                                             → SymbolLocked* → HammerFuse* → HammerSmash*/HammerRoam*
//!                                             → RespinEnd)* → FeatureExit
//! ```

pub mod event;
pub mod stage;
pub mod trace;

pub use event::*;
pub use stage::*;
pub use trace::*;
