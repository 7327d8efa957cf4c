//! StageEvent: a stage occurrence with timing and payload

use serde::{Deserialize, Serialize};

use crate::stage::Stage;

/// A stage event with full metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageEvent {
    /// The canonical stage
    pub stage: Stage,

    /// Timestamp in milliseconds (from start of spin)
    pub timestamp_ms: f64,

    /// Additional payload data
    #[serde(default)]
    pub payload: StagePayload,

    /// Custom tags for filtering/routing
    #[serde(default)]
    pub tags: Vec<String>,
}

impl StageEvent {
    /// Create a new stage event
    pub fn new(stage: Stage, timestamp_ms: f64) -> Self {
        Self {
            stage,
            timestamp_ms,
            payload: StagePayload::default(),
            tags: Vec::new(),
        }
    }

    /// Create with payload
    pub fn with_payload(stage: Stage, timestamp_ms: f64, payload: StagePayload) -> Self {
        Self {
            stage,
            timestamp_ms,
            payload,
            tags: Vec::new(),
        }
    }

    /// Add a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Get stage type name
    pub fn type_name(&self) -> &'static str {
        self.stage.type_name()
    }
}

/// Additional payload data for a stage event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StagePayload {
    /// Total win amount
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub win_amount: Option<f64>,

    /// Stake (for ratio calculations)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stake: Option<f64>,

    /// Flat row-major cell indices to highlight
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub highlight: Vec<usize>,

    /// Full visible grid (row-major)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<Vec<String>>,

    /// Respins remaining in the bonus round
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respins_remaining: Option<u32>,
}

impl StagePayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payload carrying a win amount and optional stake
    pub fn with_win(win_amount: f64, stake: Option<f64>) -> Self {
        Self {
            win_amount: Some(win_amount),
            stake,
            ..Default::default()
        }
    }

    pub fn highlight(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.highlight.extend(indices);
        self
    }

    pub fn grid(mut self, grid: Vec<String>) -> Self {
        self.grid = Some(grid);
        self
    }

    pub fn respins_remaining(mut self, respins: u32) -> Self {
        self.respins_remaining = Some(respins);
        self
    }

    /// Win-to-stake ratio if both are known
    pub fn calculate_ratio(&self) -> Option<f64> {
        match (self.win_amount, self.stake) {
            (Some(win), Some(stake)) if stake > 0.0 => Some(win / stake),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_event_creation() {
        let event = StageEvent::new(Stage::ReelsSettled, 660.0).with_tag("base");
        assert_eq!(event.type_name(), "reels_settled");
        assert_eq!(event.timestamp_ms, 660.0);
        assert_eq!(event.tags, vec!["base".to_string()]);
    }

    #[test]
    fn test_payload_win_ratio() {
        let payload = StagePayload::with_win(250.0, Some(10.0));
        assert_eq!(payload.calculate_ratio(), Some(25.0));
        assert_eq!(StagePayload::with_win(5.0, Some(0.0)).calculate_ratio(), None);
    }

    #[test]
    fn test_payload_skips_empty_fields() {
        let payload = StagePayload::new().highlight([3, 4]);
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("highlight"));
        assert!(!json.contains("win_amount"));
    }
}
