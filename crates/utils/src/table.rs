//! Conversion between factor tables and frames.

use dynafactor_primitives::{FactorName, FactorTable, columns::DATE, date_from_epoch_days, epoch_days};
use ndarray::Array2;
use polars::prelude::*;

use crate::{UtilsError, date_column, epoch_day_values, float_values, require_columns};

/// Render a factor table as `date | factor...`.
///
/// # Errors
/// Fails only if polars rejects the assembled columns.
pub fn factor_table_to_frame(table: &FactorTable) -> Result<DataFrame, UtilsError> {
    let days: Vec<i32> = table.dates().iter().map(|d| epoch_days(*d)).collect();
    let mut columns = vec![date_column(DATE, &days)?];

    for (k, name) in table.names().iter().enumerate() {
        let values = table.values().column(k).to_vec();
        columns.push(crate::to_float_column(name.as_str(), &values));
    }

    Ok(DataFrame::new(columns)?)
}

/// Parse a `date | factor...` frame; every non-date column is a factor.
///
/// # Errors
/// Fails on a missing date column, duplicate dates or non-numeric factors.
pub fn factor_table_from_frame(df: &DataFrame) -> Result<FactorTable, UtilsError> {
    require_columns(df, &[DATE])?;
    let sorted = df.sort([DATE], SortMultipleOptions::new().with_maintain_order(true))?;

    let names: Vec<FactorName> = sorted
        .get_column_names()
        .into_iter()
        .filter(|c| c.as_str() != DATE)
        .map(|c| FactorName::new(c.as_str()))
        .collect();

    let days = epoch_day_values(&sorted)?;
    let dates = days
        .iter()
        .map(|&d| {
            date_from_epoch_days(d)
                .ok_or_else(|| UtilsError::InvalidParameter(format!("date out of range: {d}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut values = Array2::from_elem((dates.len(), names.len()), f64::NAN);
    for (k, name) in names.iter().enumerate() {
        values.column_mut(k).assign(&float_values(&sorted, name.as_str())?);
    }

    FactorTable::new(dates, names, values)
        .ok_or_else(|| UtilsError::InvalidParameter("factor table dates must be unique".to_string()))
}

#[cfg(test)]
mod tests {
    use dynafactor_primitives::Date;
    use ndarray::array;

    use super::*;

    #[test]
    fn frame_roundtrip() {
        let d0 = Date::from_ymd_opt(2024, 1, 1).unwrap();
        let d1 = Date::from_ymd_opt(2024, 1, 2).unwrap();
        let table = FactorTable::new(
            vec![d0, d1],
            vec!["MKT".into(), "SIZE".into()],
            array![[0.01, f64::NAN], [0.02, -0.03]],
        )
        .unwrap();

        let frame = factor_table_to_frame(&table).unwrap();
        assert_eq!(frame.column("SIZE").unwrap().null_count(), 1);

        let back = factor_table_from_frame(&frame).unwrap();
        assert_eq!(back.dates(), table.dates());
        assert_eq!(back.names(), table.names());
        assert_eq!(back.values()[[1, 1]], -0.03);
        assert!(back.values()[[0, 1]].is_nan());
    }

    #[test]
    fn duplicate_dates_rejected() {
        let frame = df! {
            "date" => &[19_723i32, 19_723],
            "MKT" => &[0.1, 0.2],
        }
        .unwrap();
        assert!(factor_table_from_frame(&frame).is_err());
    }
}
