//! CSV input and output.

use std::{fs::File, path::Path};

use polars::prelude::*;
use tracing::debug;

use crate::UtilsError;

/// Read a headed CSV file, parsing ISO dates into the `Date` dtype.
///
/// # Errors
/// Fails if the file cannot be opened or parsed.
pub fn read_csv(path: impl AsRef<Path>) -> Result<DataFrame, UtilsError> {
    let path = path.as_ref();
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_try_parse_dates(true))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    debug!(path = %path.display(), rows = df.height(), columns = df.width(), "read csv");
    Ok(df)
}

/// Write a frame as a headed CSV file.
///
/// The table is written to a sibling temporary file and renamed into place,
/// so a failure never leaves a truncated output behind.
///
/// # Errors
/// Fails if the file cannot be created, written or renamed.
pub fn write_csv(df: &DataFrame, path: impl AsRef<Path>) -> Result<(), UtilsError> {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .ok_or_else(|| UtilsError::InvalidParameter(format!("not a file path: {}", path.display())))?;
    let tmp = path.with_file_name(format!(".{}.partial", file_name.to_string_lossy()));

    let written = (|| -> Result<(), UtilsError> {
        let mut file = File::create(&tmp)?;
        let mut out = df.clone();
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_date_format(Some("%Y-%m-%d".to_string()))
            .finish(&mut out)?;
        file.sync_all()?;
        Ok(())
    })();

    if let Err(err) = written {
        let _ = std::fs::remove_file(&tmp);
        return Err(err);
    }

    std::fs::rename(&tmp, path)?;
    debug!(path = %path.display(), rows = df.height(), "wrote csv");
    Ok(())
}
