//! Credit values rolled for lockable symbols

use serde::{Deserialize, Serialize};

use crate::error::{SlotError, SlotResult};
use crate::rng::RandomSource;

/// One possible amount inside a band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedAmount {
    pub amount: f64,
    pub weight: u32,
}

/// A probability band and the amounts it can produce
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueBand {
    /// Chance this band is selected
    pub probability: f64,
    pub amounts: Vec<WeightedAmount>,
}

impl ValueBand {
    /// Band whose amounts are equally likely
    pub fn uniform(probability: f64, amounts: &[f64]) -> Self {
        Self {
            probability,
            amounts: amounts
                .iter()
                .map(|&amount| WeightedAmount { amount, weight: 1 })
                .collect(),
        }
    }

    pub fn weighted(probability: f64, amounts: &[(f64, u32)]) -> Self {
        Self {
            probability,
            amounts: amounts
                .iter()
                .map(|&(amount, weight)| WeightedAmount { amount, weight })
                .collect(),
        }
    }

    fn pick(&self, rng: &mut impl RandomSource) -> f64 {
        let total: u64 = self.amounts.iter().map(|a| a.weight as u64).sum();
        let mut r = rng.next_unit() * total as f64;
        for entry in &self.amounts {
            r -= entry.weight as f64;
            if r < 0.0 {
                return entry.amount;
            }
        }
        self.amounts.last().map(|a| a.amount).unwrap_or(0.0)
    }
}

/// Heavy-tailed value distribution for one symbol kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PigRoll {
    pub bands: Vec<ValueBand>,
}

impl PigRoll {
    /// Two draws: band, then amount inside the band
    pub fn roll(&self, rng: &mut impl RandomSource) -> f64 {
        let r = rng.next_unit();
        let mut bound = 0.0;
        for band in &self.bands {
            bound += band.probability;
            if r < bound {
                return band.pick(rng);
            }
        }
        self.bands.last().map(|b| b.pick(rng)).unwrap_or(0.0)
    }

    /// Probability-weighted mean amount
    pub fn expected_value(&self) -> f64 {
        self.bands
            .iter()
            .map(|band| {
                let total: u64 = band.amounts.iter().map(|a| a.weight as u64).sum();
                if total == 0 {
                    return 0.0;
                }
                let mean: f64 = band
                    .amounts
                    .iter()
                    .map(|a| a.amount * a.weight as f64)
                    .sum::<f64>()
                    / total as f64;
                band.probability * mean
            })
            .sum()
    }

    fn validate(&self, name: &str) -> SlotResult<()> {
        let sum: f64 = self.bands.iter().map(|b| b.probability).sum();
        if self.bands.is_empty() || (sum - 1.0).abs() > 1e-9 {
            return Err(SlotError::InvalidConfig(format!(
                "{name} value bands must sum to 1, got {sum}"
            )));
        }
        for band in &self.bands {
            if band.probability < 0.0 || band.amounts.iter().all(|a| a.weight == 0) {
                return Err(SlotError::InvalidConfig(format!(
                    "{name} has an empty or negative band"
                )));
            }
            if band.amounts.iter().any(|a| !a.amount.is_finite() || a.amount <= 0.0) {
                return Err(SlotError::InvalidConfig(format!(
                    "{name} amounts must be positive"
                )));
            }
        }
        Ok(())
    }
}

/// Value tables for pink and gold pigs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PigValueTable {
    pub pink: PigRoll,
    pub gold: PigRoll,
}

impl PigValueTable {
    pub fn standard() -> Self {
        Self {
            pink: PigRoll {
                bands: vec![
                    ValueBand::uniform(0.65, &[50.0, 100.0, 150.0, 200.0]),
                    ValueBand::uniform(0.30, &[300.0, 500.0]),
                    ValueBand::weighted(0.05, &[(1000.0, 7), (2000.0, 3)]),
                ],
            },
            gold: PigRoll {
                bands: vec![
                    ValueBand::uniform(0.60, &[250.0, 500.0, 750.0]),
                    ValueBand::uniform(0.35, &[1000.0]),
                    ValueBand::weighted(0.05, &[(2500.0, 7), (5000.0, 3)]),
                ],
            },
        }
    }

    /// Roll a credit amount for a pink (`gold = false`) or gold pig
    pub fn roll(&self, gold: bool, rng: &mut impl RandomSource) -> f64 {
        if gold {
            self.gold.roll(rng)
        } else {
            self.pink.roll(rng)
        }
    }

    pub fn validate(&self) -> SlotResult<()> {
        self.pink.validate("pink pig")?;
        self.gold.validate("gold pig")
    }
}

impl Default for PigValueTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{ScriptedRng, SlotRng};

    #[test]
    fn test_standard_bands_valid() {
        assert!(PigValueTable::standard().validate().is_ok());
    }

    #[test]
    fn test_band_selection() {
        let table = PigValueTable::standard();
        // band 0 (r < 0.65), amount index 0.9 * 4 = 3 → 200
        assert_eq!(table.roll(false, &mut ScriptedRng::new([0.1, 0.9])), 200.0);
        // band 1, second amount
        assert_eq!(table.roll(false, &mut ScriptedRng::new([0.7, 0.6])), 500.0);
        // jackpot band: 70/30 split
        assert_eq!(table.roll(false, &mut ScriptedRng::new([0.97, 0.5])), 1000.0);
        assert_eq!(table.roll(false, &mut ScriptedRng::new([0.97, 0.8])), 2000.0);
        assert_eq!(table.roll(true, &mut ScriptedRng::new([0.8, 0.0])), 1000.0);
        assert_eq!(table.roll(true, &mut ScriptedRng::new([0.99, 0.95])), 5000.0);
    }

    #[test]
    fn test_rolls_stay_in_support() {
        let table = PigValueTable::standard();
        let mut rng = SlotRng::seeded(11);
        let pink = [50.0, 100.0, 150.0, 200.0, 300.0, 500.0, 1000.0, 2000.0];
        for _ in 0..2000 {
            assert!(pink.contains(&table.roll(false, &mut rng)));
        }
    }

    #[test]
    fn test_expected_value() {
        let ev = PigValueTable::standard().pink.expected_value();
        // 0.65*125 + 0.30*400 + 0.05*1300
        assert!((ev - 266.25).abs() < 1e-9);
    }

    #[test]
    fn test_bad_probabilities_rejected() {
        let mut table = PigValueTable::standard();
        table.gold.bands[0].probability = 0.9;
        assert!(matches!(table.validate(), Err(SlotError::InvalidConfig(_))));
    }
}
