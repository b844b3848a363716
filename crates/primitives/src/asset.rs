//! Asset type definitions.

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

/// Dense 1-based identifier for an asset, assigned from the sorted set of
/// distinct symbols in a panel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Into, Serialize, Deserialize,
)]
pub struct AssetId(pub u64);

impl AssetId {
    /// Create a new asset ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw identifier value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Ticker symbol of a traded asset.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl Symbol {
    /// Create a new symbol.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_from_str() {
        let sym: Symbol = "BTC".into();
        assert_eq!(sym.as_str(), "BTC");
        assert_eq!(sym.to_string(), "BTC");
    }

    #[test]
    fn symbols_order_lexicographically() {
        let mut symbols = vec![Symbol::new("SOL"), Symbol::new("BTC"), Symbol::new("ETH")];
        symbols.sort();
        let names: Vec<&str> = symbols.iter().map(Symbol::as_str).collect();
        assert_eq!(names, ["BTC", "ETH", "SOL"]);
    }

    #[test]
    fn asset_id_roundtrip() {
        let id: AssetId = 7u64.into();
        assert_eq!(id.get(), 7);
        assert_eq!(u64::from(id), 7);
    }
}
