//! Symbol definitions and the weighted symbol set

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Symbol identifier, unique within a game variant
pub type SymbolId = u32;

/// Rarity label shown next to a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    #[default]
    Common,
    Rare,
    Epic,
    Legendary,
}

/// A symbol definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolDef {
    /// Unique symbol ID
    pub id: SymbolId,
    /// Display name (e.g. "Tiger", "Gold Coin")
    pub name: String,
    /// Display glyph, usually a single emoji
    #[serde(default)]
    pub glyph: String,
    #[serde(default)]
    pub rarity: Rarity,
    /// Relative draw weight for base draws. Equal weights draw uniformly.
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_weight() -> u32 {
    1
}

impl SymbolDef {
    /// Create a common symbol with weight 1
    pub fn new(id: SymbolId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            glyph: String::new(),
            rarity: Rarity::Common,
            weight: 1,
        }
    }

    pub fn with_glyph(mut self, glyph: impl Into<String>) -> Self {
        self.glyph = glyph.into();
        self
    }

    pub fn with_rarity(mut self, rarity: Rarity) -> Self {
        self.rarity = rarity;
        self
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    /// Glyph if set, otherwise the name
    pub fn label(&self) -> &str {
        if self.glyph.is_empty() {
            &self.name
        } else {
            &self.glyph
        }
    }
}

/// Ordered symbol set of a game variant.
///
/// Declaration order matters: it is the order of the weighted sampler and
/// the tie-break order when several symbols qualify for a role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolSet {
    pub symbols: Vec<SymbolDef>,
}

impl SymbolSet {
    pub fn new(symbols: Vec<SymbolDef>) -> Self {
        Self { symbols }
    }

    /// Get symbol by ID
    pub fn get(&self, id: SymbolId) -> Option<&SymbolDef> {
        self.symbols.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: SymbolId) -> bool {
        self.get(id).is_some()
    }

    /// Symbol IDs in declaration order
    pub fn ids(&self) -> Vec<SymbolId> {
        self.symbols.iter().map(|s| s.id).collect()
    }

    /// Draw weights in declaration order
    pub fn weights(&self) -> Vec<u32> {
        self.symbols.iter().map(|s| s.weight).collect()
    }

    /// Probability of a single base draw landing on `id`
    pub fn draw_probability(&self, id: SymbolId) -> f64 {
        let total: u64 = self.symbols.iter().map(|s| u64::from(s.weight)).sum();
        match (self.get(id), total) {
            (Some(symbol), total) if total > 0 => f64::from(symbol.weight) / total as f64,
            _ => 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SymbolDef> {
        self.symbols.iter()
    }

    /// Reject empty sets, duplicate IDs and zero weights
    pub fn validate(&self) -> ConfigResult<()> {
        if self.symbols.is_empty() {
            return Err(ConfigError::InvalidParam("symbol set is empty".into()));
        }

        let mut seen = HashSet::with_capacity(self.symbols.len());
        for symbol in &self.symbols {
            if !seen.insert(symbol.id) {
                return Err(ConfigError::DuplicateSymbol(symbol.id));
            }
            if symbol.weight == 0 {
                return Err(ConfigError::ZeroWeight { symbol: symbol.id });
            }
        }
        Ok(())
    }

    /// Reject a reference to an undefined symbol
    pub(crate) fn require(&self, id: SymbolId, context: impl Into<String>) -> ConfigResult<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(ConfigError::UnknownSymbol {
                context: context.into(),
                symbol: id,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_set() -> SymbolSet {
        SymbolSet::new(vec![
            SymbolDef::new(1, "Tiger").with_glyph("🐅").with_weight(1),
            SymbolDef::new(2, "Coin").with_weight(3),
        ])
    }

    #[test]
    fn test_lookup_and_order() {
        let set = sample_set();
        assert_eq!(set.ids(), vec![1, 2]);
        assert_eq!(set.get(2).map(|s| s.name.as_str()), Some("Coin"));
        assert!(set.get(9).is_none());
        assert_eq!(set.get(1).map(|s| s.label()), Some("🐅"));
        assert_eq!(set.get(2).map(|s| s.label()), Some("Coin"));
    }

    #[test]
    fn test_draw_probability() {
        let set = sample_set();
        assert!((set.draw_probability(1) - 0.25).abs() < 1e-12);
        assert!((set.draw_probability(2) - 0.75).abs() < 1e-12);
        assert_eq!(set.draw_probability(7), 0.0);
    }

    #[test]
    fn test_rejects_duplicates_and_zero_weight() {
        let dup = SymbolSet::new(vec![SymbolDef::new(1, "A"), SymbolDef::new(1, "B")]);
        assert!(matches!(dup.validate(), Err(ConfigError::DuplicateSymbol(1))));

        let zero = SymbolSet::new(vec![SymbolDef::new(1, "A").with_weight(0)]);
        assert!(matches!(zero.validate(), Err(ConfigError::ZeroWeight { symbol: 1 })));

        assert!(SymbolSet::default().validate().is_err());
        assert!(sample_set().validate().is_ok());
    }
}
