//! Error types for the Piggy Smash engine

use thiserror::Error;

/// Engine error type
#[derive(Error, Debug)]
pub enum SlotError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Weight table '{0}' has zero total weight")]
    ZeroWeightTable(String),

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("Invalid stake: {0}")]
    InvalidStake(f64),

    #[error("Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: f64, available: f64 },

    #[error("Invalid grid: expected {expected} cells, got {actual}")]
    InvalidGrid { expected: usize, actual: usize },

    #[error("Invalid reel timing: {0}")]
    InvalidTiming(String),

    #[error("Reels did not settle within {0} ms")]
    ReelStalled(f64),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for SlotError {
    fn from(err: serde_json::Error) -> Self {
        SlotError::Parse(err.to_string())
    }
}

impl From<serde_yml::Error> for SlotError {
    fn from(err: serde_yml::Error) -> Self {
        SlotError::Parse(err.to_string())
    }
}

/// Result type alias
pub type SlotResult<T> = Result<T, SlotError>;
