//! Output module for exporting session records
//!
//! Both exports contain exactly the records gathered in the current session
//! (not the whole store), one row per record, with the columns in
//! [`EXPORT_COLUMNS`](crate::record::EXPORT_COLUMNS) order.

mod spreadsheet;
mod tabular;

pub use spreadsheet::export_xlsx;
pub use tabular::export_csv;

use crate::config::OutputConfig;
use crate::record::Record;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while writing exports
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Too many rows for a spreadsheet: {0}")]
    TooManyRows(usize),
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;

/// Writes the CSV and spreadsheet exports configured in `output`
pub fn export_session(records: &[Record], output: &OutputConfig) -> ExportResult<()> {
    export_csv(records, Path::new(&output.csv_path))?;
    tracing::info!("Wrote {} rows to {}", records.len(), output.csv_path);

    export_xlsx(records, Path::new(&output.xlsx_path))?;
    tracing::info!("Wrote {} rows to {}", records.len(), output.xlsx_path);

    Ok(())
}
