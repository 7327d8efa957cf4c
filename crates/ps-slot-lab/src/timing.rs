//! Timestamps for stage events
//!
//! Engine time is simulated: the reel machine advances by frame deltas and
//! feature pacing advances by fixed presentation pauses. Nothing sleeps.

use crate::config::{PacingConfig, ReelTiming};

/// Timestamp generator for sequential events
#[derive(Debug, Clone)]
pub struct TimestampGenerator {
    current_ms: f64,
    pacing: PacingConfig,
    timing: ReelTiming,
}

impl TimestampGenerator {
    pub fn new(pacing: PacingConfig, timing: ReelTiming) -> Self {
        Self {
            current_ms: 0.0,
            pacing,
            timing,
        }
    }

    /// Reset to zero
    pub fn reset(&mut self) {
        self.current_ms = 0.0;
    }

    pub fn current(&self) -> f64 {
        self.current_ms
    }

    /// Advance by duration and return the new timestamp
    pub fn advance(&mut self, duration_ms: f64) -> f64 {
        if duration_ms.is_finite() && duration_ms > 0.0 {
            self.current_ms += duration_ms;
        }
        self.current_ms
    }

    /// Move forward to `timestamp_ms` if it is ahead (never backwards)
    pub fn catch_up(&mut self, timestamp_ms: f64) -> f64 {
        if timestamp_ms > self.current_ms {
            self.current_ms = timestamp_ms;
        }
        self.current_ms
    }

    /// Pause between bonus respins
    pub fn round_pause(&mut self) -> f64 {
        self.advance(self.pacing.round_pause_ms)
    }

    /// Worst-case staggered stop for `reels` columns
    pub fn stop_window(&mut self, reels: usize) -> f64 {
        self.advance(self.timing.stop_duration_ms(reels))
    }

    /// Win reveal follows the last settle by one stagger step
    pub fn win_reveal(&mut self) -> f64 {
        self.advance(self.timing.stagger_ms)
    }

    pub fn pacing(&self) -> &PacingConfig {
        &self.pacing
    }
}

impl Default for TimestampGenerator {
    fn default() -> Self {
        Self::new(PacingConfig::default(), ReelTiming::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic() {
        let mut ts = TimestampGenerator::default();
        assert_eq!(ts.current(), 0.0);

        let t1 = ts.round_pause();
        assert_eq!(t1, 120.0);
        let t2 = ts.advance(-50.0);
        assert_eq!(t2, t1);
        assert_eq!(ts.catch_up(100.0), t1);
        assert_eq!(ts.catch_up(500.0), 500.0);
    }

    #[test]
    fn test_stop_window() {
        let mut ts = TimestampGenerator::default();
        assert_eq!(ts.stop_window(5), 600.0);
        ts.reset();
        assert_eq!(ts.current(), 0.0);
    }
}
