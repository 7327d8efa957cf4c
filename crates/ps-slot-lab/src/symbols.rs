//! Symbol catalog: identifiers, roles and per-length pay multipliers

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{SlotError, SlotResult};

/// Canonical symbol keys
pub mod keys {
    pub const DIAMOND: &str = "diamond";
    pub const GOLD_BARS: &str = "gold_bars";
    pub const CASH_STACK: &str = "cash_stack";
    pub const COIN: &str = "coin";
    pub const DOLLAR: &str = "dollar";
    pub const MONEY_BAG: &str = "money_bag";
    pub const WILD: &str = "wild_feather";
    pub const PIG: &str = "pig";
    pub const PIG_GOLD: &str = "pig_gold";
    pub const HAMMER: &str = "hammer";
    pub const BANKER: &str = "banker";
    pub const ROYALS: [&str; 5] = ["a", "k", "q", "j", "10"];
}

const IMAGE_EXTENSIONS: [&str; 7] = [".png", ".jpg", ".jpeg", ".webp", ".avif", ".gif", ".svg"];

/// Normalize an asset-path style key to its logical symbol name.
///
/// `"ui/Hammer-Gray.png?v=2"` → `"hammer-gray"`
pub fn normalize_key(raw: &str) -> String {
    let base = raw.rsplit('/').next().unwrap_or(raw);
    let base = base.split(['?', '#']).next().unwrap_or(base);
    let mut key = base.to_lowercase();
    if let Some(ext) = IMAGE_EXTENSIONS.iter().find(|ext| key.ends_with(*ext)) {
        key.truncate(key.len() - ext.len());
    }
    key
}

/// True for `pig`, `pig_gold`, and variants like `pig_gold_v2` or `pig-bright`
pub fn is_pig_key(raw: &str) -> bool {
    let key = normalize_key(raw);
    key == keys::PIG || key.starts_with("pig_") || key.starts_with("pig-")
}

/// True for `pig_gold` and its variants
pub fn is_gold_pig_key(raw: &str) -> bool {
    normalize_key(raw).starts_with(keys::PIG_GOLD)
}

/// True for `hammer` and variants like `hammer_gray` or `hammer-01`
pub fn is_hammer_key(raw: &str) -> bool {
    let key = normalize_key(raw);
    key == keys::HAMMER || key.starts_with("hammer_") || key.starts_with("hammer-")
}

/// Opaque symbol identifier as it appears on the grid
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(String);

impl SymbolId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Logical name with any asset path or extension stripped
    pub fn normalized(&self) -> String {
        normalize_key(&self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for SymbolId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SymbolId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role a symbol plays in the rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolRole {
    /// Pays through the ways evaluator
    Paying,
    /// Substitutes for any paying symbol
    Wild,
    /// Lockable credit symbol
    Pig,
    /// Rarer lockable credit symbol with a richer value roll
    GoldPig,
    /// Feature symbol driving smash/roam resolution
    Hammer,
    /// Reel filler with no paytable row
    Filler,
}

impl SymbolRole {
    /// Special symbols never start or extend a ways run on their own
    pub fn is_special(&self) -> bool {
        matches!(self, Self::Wild | Self::Pig | Self::GoldPig | Self::Hammer)
    }

    /// Symbols that lock during Lock & Win
    pub fn is_lockable(&self) -> bool {
        matches!(self, Self::Pig | Self::GoldPig)
    }
}

/// A symbol definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolDef {
    pub role: SymbolRole,
    /// Pay multiplier per run length, indexed by reel count (0..=5)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pays: Vec<f64>,
}

impl SymbolDef {
    pub fn paying(pays: &[f64]) -> Self {
        Self {
            role: SymbolRole::Paying,
            pays: pays.to_vec(),
        }
    }

    pub fn special(role: SymbolRole) -> Self {
        Self {
            role,
            pays: Vec::new(),
        }
    }

    /// Multiplier for a run of `length` reels
    pub fn pay_for(&self, length: usize) -> f64 {
        self.pays.get(length).copied().unwrap_or(0.0)
    }
}

/// Static table of symbols, roles and pays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolCatalog {
    symbols: BTreeMap<String, SymbolDef>,
}

impl SymbolCatalog {
    /// Empty catalog
    pub fn empty() -> Self {
        Self {
            symbols: BTreeMap::new(),
        }
    }

    /// The Piggy Smash symbol set.
    ///
    /// Multipliers are × stake per way, indexed by run length.
    /// They are the game-client paytable divided by 4, so a diamond 3-run pays 0.5 × stake.
    pub fn standard() -> Self {
        let mut catalog = Self::empty();
        catalog.insert(keys::DIAMOND, SymbolDef::paying(&[0.0, 0.0, 0.25, 0.5, 1.0, 2.0]));
        catalog.insert(keys::GOLD_BARS, SymbolDef::paying(&[0.0, 0.0, 0.25, 0.5, 1.0, 2.0]));
        catalog.insert(keys::CASH_STACK, SymbolDef::paying(&[0.0, 0.0, 0.25, 0.5, 1.25, 2.5]));
        catalog.insert(keys::COIN, SymbolDef::paying(&[0.0, 0.0, 0.25, 0.5, 1.25, 3.0]));
        catalog.insert(keys::DOLLAR, SymbolDef::paying(&[0.0, 0.0, 0.25, 0.75, 1.5, 3.75]));
        catalog.insert(keys::MONEY_BAG, SymbolDef::paying(&[0.0, 0.0, 0.5, 1.0, 2.0, 5.0]));

        catalog.insert(keys::WILD, SymbolDef::special(SymbolRole::Wild));
        catalog.insert(keys::PIG, SymbolDef::special(SymbolRole::Pig));
        catalog.insert(keys::PIG_GOLD, SymbolDef::special(SymbolRole::GoldPig));
        catalog.insert(keys::HAMMER, SymbolDef::special(SymbolRole::Hammer));

        catalog.insert(keys::BANKER, SymbolDef::special(SymbolRole::Filler));
        for royal in keys::ROYALS {
            catalog.insert(royal, SymbolDef::special(SymbolRole::Filler));
        }
        catalog
    }

    /// Add or replace a symbol (key is normalized)
    pub fn insert(&mut self, key: &str, def: SymbolDef) {
        self.symbols.insert(normalize_key(key), def);
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Resolve a (possibly path-qualified) key.
    ///
    /// Exact normalized match first, then the pig / hammer variant families.
    pub fn resolve(&self, raw: &str) -> Option<&SymbolDef> {
        let key = normalize_key(raw);
        if let Some(def) = self.symbols.get(&key) {
            return Some(def);
        }
        let family = if is_gold_pig_key(&key) {
            keys::PIG_GOLD
        } else if is_pig_key(&key) {
            keys::PIG
        } else if is_hammer_key(&key) {
            keys::HAMMER
        } else {
            return None;
        };
        self.symbols.get(family)
    }

    /// Role of a symbol, if known
    pub fn role_of(&self, symbol: &SymbolId) -> Option<SymbolRole> {
        self.resolve(symbol.as_str()).map(|def| def.role)
    }

    pub fn is_special(&self, symbol: &SymbolId) -> bool {
        self.role_of(symbol).is_some_and(|role| role.is_special())
    }

    pub fn is_wild(&self, symbol: &SymbolId) -> bool {
        self.role_of(symbol) == Some(SymbolRole::Wild)
    }

    pub fn is_lockable(&self, symbol: &SymbolId) -> bool {
        self.role_of(symbol).is_some_and(|role| role.is_lockable())
    }

    pub fn is_hammer(&self, symbol: &SymbolId) -> bool {
        self.role_of(symbol) == Some(SymbolRole::Hammer)
    }

    /// Pay multiplier for `symbol` over `length` reels; 0 for unknown symbols
    pub fn pay_for(&self, symbol: &str, length: usize) -> f64 {
        self.resolve(symbol).map(|def| def.pay_for(length)).unwrap_or(0.0)
    }

    /// Iterate symbols in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SymbolDef)> {
        self.symbols.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Keys of all paying symbols
    pub fn paying_keys(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, def)| def.role == SymbolRole::Paying)
            .map(|(k, _)| k)
            .collect()
    }

    /// Check the catalog is usable: exactly one wild, at least one pig and
    /// one hammer, and only paying symbols carry pays.
    pub fn validate(&self) -> SlotResult<()> {
        let count = |role: SymbolRole| self.symbols.values().filter(|d| d.role == role).count();
        if count(SymbolRole::Wild) != 1 {
            return Err(SlotError::InvalidConfig(
                "catalog must define exactly one wild symbol".into(),
            ));
        }
        if count(SymbolRole::Pig) + count(SymbolRole::GoldPig) == 0 {
            return Err(SlotError::InvalidConfig("catalog defines no pig symbol".into()));
        }
        if count(SymbolRole::Hammer) == 0 {
            return Err(SlotError::InvalidConfig("catalog defines no hammer symbol".into()));
        }
        for (key, def) in &self.symbols {
            if def.role != SymbolRole::Paying && !def.pays.is_empty() {
                return Err(SlotError::InvalidConfig(format!(
                    "symbol '{key}' is both special and paying"
                )));
            }
            if def.pays.iter().any(|p| !p.is_finite() || *p < 0.0) {
                return Err(SlotError::InvalidConfig(format!(
                    "symbol '{key}' has a negative or non-finite pay"
                )));
            }
        }
        Ok(())
    }
}

impl Default for SymbolCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("ui/Hammer-Gray.png?v=2"), "hammer-gray");
        assert_eq!(normalize_key("symbols/diamond"), "diamond");
        assert_eq!(normalize_key("PIG_GOLD.webp#frame"), "pig_gold");
        assert_eq!(normalize_key("10"), "10");
    }

    #[test]
    fn test_family_checks() {
        assert!(is_pig_key("pig"));
        assert!(is_pig_key("assets/pig-bright.png"));
        assert!(is_pig_key("pig_gold"));
        assert!(!is_pig_key("piggy"));
        assert!(is_gold_pig_key("pig_gold_v2"));
        assert!(!is_gold_pig_key("pig"));
        assert!(is_hammer_key("hammer_gray"));
        assert!(!is_hammer_key("hammers"));
    }

    #[test]
    fn test_resolve_roles() {
        let catalog = SymbolCatalog::standard();
        assert_eq!(catalog.role_of(&"wild_feather".into()), Some(SymbolRole::Wild));
        assert_eq!(catalog.role_of(&"art/Pig_Gold_v2.png".into()), Some(SymbolRole::GoldPig));
        assert_eq!(catalog.role_of(&"hammer-01".into()), Some(SymbolRole::Hammer));
        assert_eq!(catalog.role_of(&"K".into()), Some(SymbolRole::Filler));
        assert_eq!(catalog.role_of(&"ruby".into()), None);
    }

    #[test]
    fn test_pay_lookup() {
        let catalog = SymbolCatalog::standard();
        assert_eq!(catalog.pay_for("diamond", 3), 0.5);
        assert_eq!(catalog.pay_for("reels/DIAMOND.png", 3), 0.5);
        assert_eq!(catalog.pay_for("money_bag", 5), 5.0);
        assert_eq!(catalog.pay_for("diamond", 6), 0.0);
        assert_eq!(catalog.pay_for("banker", 5), 0.0);
        assert_eq!(catalog.pay_for("ruby", 3), 0.0);
    }

    #[test]
    fn test_standard_catalog_is_valid() {
        let catalog = SymbolCatalog::standard();
        assert!(catalog.validate().is_ok());
        assert_eq!(catalog.paying_keys().len(), 6);
    }

    #[test]
    fn test_dual_mapped_symbol_rejected() {
        let mut catalog = SymbolCatalog::standard();
        catalog.insert(
            "hammer",
            SymbolDef {
                role: SymbolRole::Hammer,
                pays: vec![0.0, 0.0, 1.0],
            },
        );
        assert!(catalog.validate().is_err());
    }
}
