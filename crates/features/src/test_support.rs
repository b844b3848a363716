//! Fixtures for feature unit tests.

use dynafactor_primitives::{AssetFrame, Date, Symbol, date_from_epoch_days};
use ndarray::Array1;

/// Consecutive daily dates starting 2024-01-01.
pub(crate) fn dates(n: usize) -> Vec<Date> {
    (0..n as i32).map(|i| date_from_epoch_days(19_723 + i).unwrap()).collect()
}

/// Asset frame holding the given columns.
pub(crate) fn frame(columns: &[(&str, Vec<f64>)]) -> AssetFrame {
    let n = columns.first().map_or(0, |(_, v)| v.len());
    let mut frame = AssetFrame::new(Symbol::new("TEST"), dates(n));
    for (name, values) in columns {
        frame.insert(*name, Array1::from_vec(values.clone())).unwrap();
    }
    frame
}

/// Look up an output column by name.
pub(crate) fn output<'a>(columns: &'a [(String, Array1<f64>)], name: &str) -> &'a Array1<f64> {
    &columns.iter().find(|(n, _)| n == name).unwrap().1
}
