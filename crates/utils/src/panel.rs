//! Panel layout helpers.

use std::{collections::HashSet, ops::Range};

use dynafactor_primitives::{Symbol, columns::{DATE, SYMBOL}};
use ndarray::Array1;
use polars::prelude::*;

use crate::UtilsError;

/// Fail with the full list of absent columns.
///
/// # Errors
/// Returns [`UtilsError::MissingColumns`] naming every required column not in `df`.
pub fn require_columns<S: AsRef<str>>(df: &DataFrame, required: &[S]) -> Result<(), UtilsError> {
    let present: HashSet<&str> = df.get_column_names().into_iter().map(|c| c.as_str()).collect();

    let mut missing: Vec<String> = Vec::new();
    for name in required.iter().map(AsRef::as_ref) {
        if !present.contains(name) && !missing.iter().any(|m| m == name) {
            missing.push(name.to_string());
        }
    }

    if missing.is_empty() { Ok(()) } else { Err(UtilsError::MissingColumns(missing)) }
}

/// Sort a panel by `(symbol, date)`, normalising the date column to the `Date` dtype.
///
/// # Errors
/// Fails if the key columns are absent or the date column cannot be cast.
pub fn sort_panel(df: &DataFrame) -> Result<DataFrame, UtilsError> {
    require_columns(df, &[SYMBOL, DATE])?;

    let mut df = df.clone();
    if df.column(DATE)?.dtype() != &DataType::Date {
        let dates = df.column(DATE)?.cast(&DataType::Date)?;
        df.with_column(dates)?;
    }

    Ok(df.sort([SYMBOL, DATE], SortMultipleOptions::new().with_maintain_order(true))?)
}

/// A contiguous block of rows belonging to one asset in a sorted panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRun {
    /// Asset symbol.
    pub symbol: Symbol,
    /// First row of the block.
    pub offset: usize,
    /// Number of rows.
    pub len: usize,
}

impl AssetRun {
    /// Row range of the block.
    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// Split a `(symbol, date)`-sorted panel into per-asset runs.
///
/// # Errors
/// Fails on a missing or null symbol.
pub fn asset_runs(sorted: &DataFrame) -> Result<Vec<AssetRun>, UtilsError> {
    let symbols = symbol_values(sorted)?;
    let mut runs: Vec<AssetRun> = Vec::new();

    for (row, symbol) in symbols.into_iter().enumerate() {
        match runs.last_mut() {
            Some(run) if run.symbol.as_str() == symbol => run.len += 1,
            _ => runs.push(AssetRun { symbol: Symbol::new(symbol), offset: row, len: 1 }),
        }
    }

    Ok(runs)
}

/// Symbol of every row.
///
/// # Errors
/// Fails on a missing column or a null symbol.
pub fn symbol_values(df: &DataFrame) -> Result<Vec<String>, UtilsError> {
    let symbols = df.column(SYMBOL)?.cast(&DataType::String)?;
    symbols
        .str()?
        .into_iter()
        .enumerate()
        .map(|(row, s)| {
            s.map(str::to_string)
                .ok_or_else(|| UtilsError::NullKey { column: SYMBOL.to_string(), row })
        })
        .collect()
}

/// Date of every row as days since 1970-01-01.
///
/// # Errors
/// Fails on a missing column, an uncastable dtype or a null date.
pub fn epoch_day_values(df: &DataFrame) -> Result<Vec<i32>, UtilsError> {
    let days = df.column(DATE)?.cast(&DataType::Date)?.cast(&DataType::Int32)?;
    days.i32()?
        .into_iter()
        .enumerate()
        .map(|(row, d)| d.ok_or_else(|| UtilsError::NullKey { column: DATE.to_string(), row }))
        .collect()
}

/// Numeric column as `f64` values; nulls and non-finite values become `NaN`.
///
/// # Errors
/// Fails if the column is absent or cannot be cast to `Float64`.
pub fn float_values(df: &DataFrame, name: &str) -> Result<Array1<f64>, UtilsError> {
    let values = df.column(name)?.cast(&DataType::Float64)?;
    Ok(values
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()).unwrap_or(f64::NAN))
        .collect())
}

/// Build a `Float64` column; `NaN` and infinities are written as nulls.
#[must_use]
pub fn to_float_column(name: &str, values: &[f64]) -> Column {
    let values: Vec<Option<f64>> =
        values.iter().map(|v| v.is_finite().then_some(*v)).collect();
    Column::new(name.into(), values)
}

/// Build a `Date` column from days since 1970-01-01.
///
/// # Errors
/// Fails only if polars rejects the cast.
pub fn date_column(name: &str, days: &[i32]) -> Result<Column, UtilsError> {
    Ok(Column::new(name.into(), days.to_vec()).cast(&DataType::Date)?)
}
