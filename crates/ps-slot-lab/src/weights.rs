//! Weighted symbol generator
//!
//! Two weight tables exist (base, feature). The active one is chosen per
//! draw by an explicit [`WeightMode`], never by shared mutable state.

use serde::{Deserialize, Serialize};

use crate::error::{SlotError, SlotResult};
use crate::rng::RandomSource;
use crate::symbols::{SymbolCatalog, SymbolId, keys};

/// Which weight table a draw uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightMode {
    #[default]
    Base,
    Feature,
}

impl WeightMode {
    pub fn from_feature_flag(on: bool) -> Self {
        if on { Self::Feature } else { Self::Base }
    }
}

/// One weight table entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub symbol: SymbolId,
    pub weight: u32,
}

/// Ordered symbol → relative probability table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightTable {
    entries: Vec<WeightEntry>,
}

impl WeightTable {
    /// Build from ordered `(symbol, weight)` pairs. Enumeration order is kept.
    pub fn new<S: Into<SymbolId>>(entries: impl IntoIterator<Item = (S, u32)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(symbol, weight)| WeightEntry {
                    symbol: symbol.into(),
                    weight,
                })
                .collect(),
        }
    }

    /// Base-game distribution: pigs common, wild/hammer rare
    pub fn standard_base() -> Self {
        let mut entries: Vec<(&str, u32)> = vec![
            (keys::DIAMOND, 10),
            (keys::GOLD_BARS, 10),
            (keys::CASH_STACK, 10),
            (keys::COIN, 10),
            (keys::DOLLAR, 10),
            (keys::MONEY_BAG, 10),
            (keys::WILD, 3),
            (keys::HAMMER, 3),
            (keys::PIG, 19),
            (keys::PIG_GOLD, 1),
            (keys::BANKER, 8),
        ];
        entries.extend(keys::ROYALS.iter().map(|k| (*k, 14)));
        Self::new(entries)
    }

    /// Bonus-round distribution: gold pigs suppressed, few pigs
    pub fn standard_feature() -> Self {
        let mut entries: Vec<(&str, u32)> = vec![
            (keys::DIAMOND, 20),
            (keys::GOLD_BARS, 20),
            (keys::CASH_STACK, 20),
            (keys::COIN, 20),
            (keys::DOLLAR, 20),
            (keys::MONEY_BAG, 20),
            (keys::WILD, 2),
            (keys::HAMMER, 2),
            (keys::PIG, 3),
            (keys::PIG_GOLD, 0),
            (keys::BANKER, 10),
        ];
        entries.extend(keys::ROYALS.iter().map(|k| (*k, 20)));
        Self::new(entries)
    }

    pub fn entries(&self) -> &[WeightEntry] {
        &self.entries
    }

    pub fn total_weight(&self) -> u64 {
        self.entries.iter().map(|e| e.weight as u64).sum()
    }

    /// Weight of a symbol (0 if absent)
    pub fn weight_of(&self, symbol: &str) -> u32 {
        self.entries
            .iter()
            .find(|e| e.symbol.as_str() == symbol)
            .map(|e| e.weight)
            .unwrap_or(0)
    }

    /// Reject empty / zero-sum tables and symbols the catalog cannot resolve
    pub fn validate(&self, name: &str, catalog: &SymbolCatalog) -> SlotResult<()> {
        if self.total_weight() == 0 {
            return Err(SlotError::ZeroWeightTable(name.to_string()));
        }
        for entry in &self.entries {
            if catalog.resolve(entry.symbol.as_str()).is_none() {
                return Err(SlotError::UnknownSymbol(entry.symbol.to_string()));
            }
        }
        Ok(())
    }

    /// Cumulative-weight sampling.
    ///
    /// Draws `r` in `[0, total)`, walks entries in order subtracting each
    /// weight and returns the first entry that takes `r` below zero. A
    /// zero-sum table falls back to the first entry.
    pub fn draw(&self, rng: &mut impl RandomSource) -> SymbolId {
        let total = self.total_weight();
        let mut r = rng.next_unit() * total as f64;
        for entry in &self.entries {
            r -= entry.weight as f64;
            if r < 0.0 {
                return entry.symbol.clone();
            }
        }
        self.entries
            .iter()
            .rev()
            .find(|e| e.weight > 0)
            .or_else(|| self.entries.first())
            .map(|e| e.symbol.clone())
            .unwrap_or_else(|| SymbolId::new(""))
    }
}

/// Draws symbols from the base or feature table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolGenerator {
    pub base: WeightTable,
    pub feature: WeightTable,
}

impl SymbolGenerator {
    pub fn new(base: WeightTable, feature: WeightTable) -> Self {
        Self { base, feature }
    }

    pub fn standard() -> Self {
        Self::new(WeightTable::standard_base(), WeightTable::standard_feature())
    }

    pub fn table(&self, mode: WeightMode) -> &WeightTable {
        match mode {
            WeightMode::Base => &self.base,
            WeightMode::Feature => &self.feature,
        }
    }

    /// Draw one symbol from the table selected by `mode`
    pub fn draw(&self, mode: WeightMode, rng: &mut impl RandomSource) -> SymbolId {
        self.table(mode).draw(rng)
    }

    /// Both tables must be drawable and resolvable
    pub fn validate(&self, catalog: &SymbolCatalog) -> SlotResult<()> {
        self.base.validate("base", catalog)?;
        self.feature.validate("feature", catalog)
    }
}

impl Default for SymbolGenerator {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{ScriptedRng, SlotRng};

    #[test]
    fn test_cumulative_walk() {
        let table = WeightTable::new([("a", 1), ("b", 3)]);
        // r = 0.2 * 4 = 0.8 → a
        assert_eq!(table.draw(&mut ScriptedRng::constant(0.2)).as_str(), "a");
        // r = 0.25 * 4 = 1.0 → 1 - 1 = 0, not < 0 → b
        assert_eq!(table.draw(&mut ScriptedRng::constant(0.25)).as_str(), "b");
        assert_eq!(table.draw(&mut ScriptedRng::constant(0.99)).as_str(), "b");
    }

    #[test]
    fn test_zero_weight_never_drawn() {
        let table = WeightTable::standard_feature();
        assert_eq!(table.weight_of(keys::PIG_GOLD), 0);
        let mut rng = SlotRng::seeded(1234);
        for _ in 0..50_000 {
            let symbol = table.draw(&mut rng);
            assert_ne!(symbol.as_str(), keys::PIG_GOLD);
            assert!(table.weight_of(symbol.as_str()) > 0);
        }
    }

    #[test]
    fn test_every_positive_weight_reachable() {
        let table = WeightTable::standard_base();
        let mut rng = SlotRng::seeded(99);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..50_000 {
            seen.insert(table.draw(&mut rng));
        }
        for entry in table.entries() {
            assert!(seen.contains(&entry.symbol), "{} never drawn", entry.symbol);
        }
    }

    #[test]
    fn test_zero_sum_falls_back_to_first_entry() {
        let table = WeightTable::new([(keys::COIN, 0), (keys::PIG, 0)]);
        assert_eq!(table.draw(&mut ScriptedRng::constant(0.7)).as_str(), keys::COIN);
    }

    #[test]
    fn test_zero_sum_rejected() {
        let catalog = SymbolCatalog::standard();
        let table = WeightTable::new([(keys::PIG, 0), (keys::COIN, 0)]);
        assert!(matches!(
            table.validate("broken", &catalog),
            Err(SlotError::ZeroWeightTable(_))
        ));
    }

    #[test]
    fn test_unknown_symbol_rejected() {
        let catalog = SymbolCatalog::standard();
        let table = WeightTable::new([("ruby", 5)]);
        assert!(matches!(
            table.validate("base", &catalog),
            Err(SlotError::UnknownSymbol(_))
        ));
    }

    #[test]
    fn test_mode_selects_table() {
        let generator = SymbolGenerator::new(
            WeightTable::new([("coin", 1)]),
            WeightTable::new([("pig", 1)]),
        );
        let mut rng = ScriptedRng::constant(0.5);
        assert_eq!(generator.draw(WeightMode::Base, &mut rng).as_str(), "coin");
        assert_eq!(generator.draw(WeightMode::Feature, &mut rng).as_str(), "pig");
    }
}
