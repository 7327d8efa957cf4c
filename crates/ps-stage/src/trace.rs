//! StageTrace: the full timeline of stage events for one spin

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::StageEvent;
use crate::stage::{Stage, StageCategory, WinTier};

/// A complete trace of stage events for one spin (bonus round included)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTrace {
    /// Unique identifier for this trace
    pub trace_id: String,

    /// All events in chronological order
    pub events: Vec<StageEvent>,

    /// When this trace was recorded
    pub recorded_at: DateTime<Utc>,
}

impl StageTrace {
    /// Create a new empty trace
    pub fn new(trace_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            events: Vec::new(),
            recorded_at: Utc::now(),
        }
    }

    /// Add an event to the trace
    pub fn push(&mut self, event: StageEvent) {
        self.events.push(event);
    }

    /// Append many events
    pub fn extend(&mut self, events: impl IntoIterator<Item = StageEvent>) {
        self.events.extend(events);
    }

    /// Total duration in milliseconds
    pub fn duration_ms(&self) -> f64 {
        match (self.events.first(), self.events.last()) {
            (Some(first), Some(last)) => last.timestamp_ms - first.timestamp_ms,
            _ => 0.0,
        }
    }

    /// Get events by category
    pub fn events_by_category(&self, category: StageCategory) -> Vec<&StageEvent> {
        self.events
            .iter()
            .filter(|e| e.stage.category() == category)
            .collect()
    }

    /// Get events by stage type name
    pub fn events_by_type(&self, type_name: &str) -> Vec<&StageEvent> {
        self.events
            .iter()
            .filter(|e| e.stage.type_name() == type_name)
            .collect()
    }

    /// Check if trace contains a specific stage type
    pub fn has_stage(&self, type_name: &str) -> bool {
        self.events.iter().any(|e| e.stage.type_name() == type_name)
    }

    /// Get all reel stop events
    pub fn reel_stops(&self) -> Vec<&StageEvent> {
        self.events_by_type("reel_stop")
    }

    /// Total win from the last win-carrying stage
    pub fn total_win(&self) -> f64 {
        for event in self.events.iter().rev() {
            if let Some(win) = event.payload.win_amount {
                return win;
            }
            match &event.stage {
                Stage::WinPresent { win_amount, .. } => return *win_amount,
                Stage::FeatureExit { total_win } => return *total_win,
                _ => continue,
            }
        }
        0.0
    }

    /// Highest win tier reached in this trace
    pub fn max_win_tier(&self) -> Option<WinTier> {
        self.events
            .iter()
            .filter_map(|e| match &e.stage {
                Stage::WinTierReached { tier, .. } => Some(*tier),
                _ => None,
            })
            .max()
    }

    /// Check if this spin entered the bonus round
    pub fn has_feature(&self) -> bool {
        self.has_stage("feature_enter")
    }

    /// Validate the trace has its bookends
    pub fn validate(&self) -> TraceValidation {
        TraceValidation {
            has_spin_start: self.has_stage("spin_start"),
            has_spin_end: self.has_stage("spin_end"),
            reel_stop_count: self.reel_stops().len(),
            feature_balanced: self.events_by_type("feature_enter").len()
                == self.events_by_type("feature_exit").len(),
        }
    }
}

/// Result of trace validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceValidation {
    pub has_spin_start: bool,
    pub has_spin_end: bool,
    pub reel_stop_count: usize,
    /// Every FeatureEnter has a matching FeatureExit
    pub feature_balanced: bool,
}

impl TraceValidation {
    pub fn is_valid(&self) -> bool {
        self.has_spin_start && self.has_spin_end && self.feature_balanced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_trace() -> StageTrace {
        let mut trace = StageTrace::new("spin-000001");
        trace.push(StageEvent::new(Stage::SpinStart { stake: 10.0 }, 0.0));
        for reel in 0..5u8 {
            trace.push(StageEvent::new(
                Stage::ReelStop { reel_index: reel, symbols: vec![] },
                1260.0 + reel as f64 * 110.0,
            ));
        }
        trace.push(StageEvent::new(
            Stage::WinTierReached { tier: WinTier::Big, amount: 120.0 },
            1800.0,
        ));
        trace.push(StageEvent::new(
            Stage::WinPresent { win_amount: 120.0, way_count: 2 },
            1800.0,
        ));
        trace.push(StageEvent::new(Stage::SpinEnd, 1900.0));
        trace
    }

    #[test]
    fn test_trace_queries() {
        let trace = sample_trace();
        assert_eq!(trace.reel_stops().len(), 5);
        assert_eq!(trace.total_win(), 120.0);
        assert_eq!(trace.max_win_tier(), Some(WinTier::Big));
        assert_eq!(trace.duration_ms(), 1900.0);
        assert!(!trace.has_feature());
    }

    #[test]
    fn test_trace_validation() {
        let trace = sample_trace();
        assert!(trace.validate().is_valid());

        let mut open = sample_trace();
        open.push(StageEvent::new(Stage::FeatureEnter { locked_count: 8, respins: 3 }, 2000.0));
        assert!(!open.validate().feature_balanced);
    }
}
