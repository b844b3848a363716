//! Per-asset column frame.

use std::collections::BTreeMap;

use ndarray::Array1;

use crate::{Date, Symbol};

/// The date-ordered rows of a single asset, stored column-wise.
///
/// Rolling features consume one `AssetFrame` at a time. Every column has
/// exactly `dates.len()` entries and missing observations are `NaN`.
#[derive(Debug, Clone)]
pub struct AssetFrame {
    symbol: Symbol,
    dates: Vec<Date>,
    columns: BTreeMap<String, Array1<f64>>,
}

impl AssetFrame {
    /// Create an empty frame for `symbol` over `dates`.
    #[must_use]
    pub const fn new(symbol: Symbol, dates: Vec<Date>) -> Self {
        Self { symbol, dates, columns: BTreeMap::new() }
    }

    /// Asset symbol.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Row dates in ascending order.
    #[must_use]
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the frame has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Look up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Array1<f64>> {
        self.columns.get(name)
    }

    /// Whether a column is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Insert or replace a column.
    ///
    /// Returns the rejected values if their length does not match the frame.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        values: Array1<f64>,
    ) -> Result<(), Array1<f64>> {
        if values.len() != self.len() {
            return Err(values);
        }
        self.columns.insert(name.into(), values);
        Ok(())
    }

    /// Insert or replace a column that is missing on every row.
    pub fn insert_missing(&mut self, name: impl Into<String>) {
        self.columns.insert(name.into(), Array1::from_elem(self.len(), f64::NAN));
    }

    /// Column names in lexical order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    fn dates(n: usize) -> Vec<Date> {
        let start = Date::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n).map(|i| start + chrono::Days::new(i as u64)).collect()
    }

    #[test]
    fn insert_and_lookup() {
        let mut frame = AssetFrame::new(Symbol::new("BTC"), dates(3));
        frame.insert("close", array![1.0, 2.0, f64::NAN]).unwrap();

        assert_eq!(frame.len(), 3);
        assert!(frame.contains("close"));
        assert!(frame.column("close").unwrap()[2].is_nan());
        assert!(frame.column("open").is_none());
    }

    #[test]
    fn missing_column_matches_frame_length() {
        let mut frame = AssetFrame::new(Symbol::new("SOL"), dates(4));
        frame.insert("vol", array![1.0, 2.0, 3.0, 4.0]).unwrap();
        frame.insert_missing("vol");
        let vol = frame.column("vol").unwrap();
        assert_eq!(vol.len(), 4);
        assert!(vol.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn insert_rejects_wrong_length() {
        let mut frame = AssetFrame::new(Symbol::new("ETH"), dates(2));
        let rejected = frame.insert("close", array![1.0, 2.0, 3.0]).unwrap_err();
        assert_eq!(rejected.len(), 3);
        assert!(!frame.contains("close"));
    }
}
