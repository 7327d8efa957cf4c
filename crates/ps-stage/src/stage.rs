//! Stage: the enum defining every canonical moment of a Piggy Smash round
//!
//! A Stage is NOT an animation and NOT an engine callback.
//! A Stage is the SEMANTIC MEANING of a moment in the game flow.

use serde::{Deserialize, Serialize};

/// Win tier by win-to-stake ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinTier {
    /// ≥ 2× stake
    Nice,
    /// ≥ 10× stake
    Big,
    /// ≥ 25× stake
    Mega,
    /// ≥ 50× stake
    Epic,
    /// ≥ 100× stake
    Legendary,
}

impl WinTier {
    /// All tiers, lowest first
    pub const ALL: [WinTier; 5] = [
        WinTier::Nice,
        WinTier::Big,
        WinTier::Mega,
        WinTier::Epic,
        WinTier::Legendary,
    ];

    /// Display title shown by the win toast
    pub fn title(&self) -> &'static str {
        match self {
            Self::Nice => "Nice Win",
            Self::Big => "Big Win",
            Self::Mega => "Mega Win",
            Self::Epic => "Epic Win",
            Self::Legendary => "Legendary!",
        }
    }
}

/// Canonical game stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Stage {
    // ═══════════════════════════════════════════════════════════════════════
    // SPIN LIFECYCLE
    // ═══════════════════════════════════════════════════════════════════════
    /// Reels started rolling
    SpinStart {
        /// Stake wagered on this spin (0 for feature respins)
        #[serde(default)]
        stake: f64,
    },

    /// A single column settled
    ReelStop {
        /// Which column stopped (0-indexed, left to right)
        reel_index: u8,
        /// Visible symbols on this column (top to bottom)
        #[serde(default)]
        symbols: Vec<String>,
    },

    /// Every column settled; the visible grid is final
    ReelsSettled,

    /// Grid handed to the ways evaluator
    EvaluateWins,

    /// Spin complete, ready for next spin
    SpinEnd,

    // ═══════════════════════════════════════════════════════════════════════
    // WIN LIFECYCLE
    // ═══════════════════════════════════════════════════════════════════════
    /// Win presentation starting
    WinPresent {
        /// Total credited win
        #[serde(default)]
        win_amount: f64,
        /// Number of winning ways entries
        #[serde(default)]
        way_count: u8,
    },

    /// Win crossed a tier threshold
    WinTierReached {
        tier: WinTier,
        #[serde(default)]
        amount: f64,
    },

    /// Base-game hammer smashed an adjacent pig
    HammerAward {
        hammer_index: u8,
        pig_index: u8,
        #[serde(default)]
        amount: f64,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // LOCK & WIN
    // ═══════════════════════════════════════════════════════════════════════
    /// Bonus round entered
    FeatureEnter {
        /// Cells locked at entry
        #[serde(default)]
        locked_count: u8,
        /// Respins granted
        #[serde(default)]
        respins: u8,
    },

    /// A respin is about to roll
    RespinStart {
        round: u32,
        respins_remaining: u8,
    },

    /// A lockable symbol landed on an unlocked cell
    SymbolLocked {
        index: u8,
        #[serde(default)]
        amount: f64,
        #[serde(default)]
        symbol: String,
    },

    /// Two adjacent hammers merged their totals
    HammerFuse {
        first: u8,
        second: u8,
        #[serde(default)]
        total: f64,
    },

    /// A hammer smashed a locked cell and moved onto it
    HammerSmash {
        from: u8,
        at: u8,
        #[serde(default)]
        amount: f64,
        /// Hammer total after absorbing the cell
        #[serde(default)]
        total: f64,
    },

    /// A hammer with nothing to smash relocated
    HammerRoam { from: u8, to: u8 },

    /// A respin resolved
    RespinEnd {
        round: u32,
        respins_remaining: u8,
        #[serde(default)]
        new_locks: u8,
    },

    /// Bonus round finished
    FeatureExit {
        #[serde(default)]
        total_win: f64,
    },
}

impl Stage {
    /// Get category for this stage
    pub fn category(&self) -> StageCategory {
        match self {
            Stage::SpinStart { .. }
            | Stage::ReelStop { .. }
            | Stage::ReelsSettled
            | Stage::EvaluateWins
            | Stage::SpinEnd => StageCategory::SpinLifecycle,

            Stage::WinPresent { .. } | Stage::WinTierReached { .. } => StageCategory::Win,

            Stage::FeatureEnter { .. }
            | Stage::RespinStart { .. }
            | Stage::SymbolLocked { .. }
            | Stage::RespinEnd { .. }
            | Stage::FeatureExit { .. } => StageCategory::Feature,

            Stage::HammerAward { .. }
            | Stage::HammerFuse { .. }
            | Stage::HammerSmash { .. }
            | Stage::HammerRoam { .. } => StageCategory::Hammer,
        }
    }

    /// Get a simple string name for this stage type
    pub fn type_name(&self) -> &'static str {
        match self {
            Stage::SpinStart { .. } => "spin_start",
            Stage::ReelStop { .. } => "reel_stop",
            Stage::ReelsSettled => "reels_settled",
            Stage::EvaluateWins => "evaluate_wins",
            Stage::SpinEnd => "spin_end",
            Stage::WinPresent { .. } => "win_present",
            Stage::WinTierReached { .. } => "win_tier_reached",
            Stage::HammerAward { .. } => "hammer_award",
            Stage::FeatureEnter { .. } => "feature_enter",
            Stage::RespinStart { .. } => "respin_start",
            Stage::SymbolLocked { .. } => "symbol_locked",
            Stage::HammerFuse { .. } => "hammer_fuse",
            Stage::HammerSmash { .. } => "hammer_smash",
            Stage::HammerRoam { .. } => "hammer_roam",
            Stage::RespinEnd { .. } => "respin_end",
            Stage::FeatureExit { .. } => "feature_exit",
        }
    }

    /// All known type names
    pub fn all_type_names() -> &'static [&'static str] {
        &[
            "spin_start",
            "reel_stop",
            "reels_settled",
            "evaluate_wins",
            "spin_end",
            "win_present",
            "win_tier_reached",
            "hammer_award",
            "feature_enter",
            "respin_start",
            "symbol_locked",
            "hammer_fuse",
            "hammer_smash",
            "hammer_roam",
            "respin_end",
            "feature_exit",
        ]
    }

    /// Check if a type name is valid
    pub fn is_valid_type_name(name: &str) -> bool {
        Self::all_type_names().contains(&name.to_lowercase().as_str())
    }
}

/// Stage grouping for routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageCategory {
    SpinLifecycle,
    Win,
    Feature,
    Hammer,
}
