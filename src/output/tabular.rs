//! CSV export

use crate::output::ExportResult;
use crate::record::{Record, EXPORT_COLUMNS};
use std::path::Path;

/// Writes `records` to a CSV file, header row first
///
/// The header is written even when there are no records.
pub fn export_csv(records: &[Record], path: &Path) -> ExportResult<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;

    writer.write_record(EXPORT_COLUMNS)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}
