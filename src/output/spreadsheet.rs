//! Spreadsheet (XLSX) export

use crate::output::{ExportError, ExportResult};
use crate::record::{Record, EXPORT_COLUMNS};
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;

/// Writes `records` to a single-sheet XLSX workbook, header row first
pub fn export_xlsx(records: &[Record], path: &Path) -> ExportResult<()> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name("hn_posts")?;

    for (col, name) in (0u16..).zip(EXPORT_COLUMNS) {
        sheet.write_string_with_format(0, col, name, &header)?;
    }

    for (index, record) in records.iter().enumerate() {
        let row = u32::try_from(index + 1).map_err(|_| ExportError::TooManyRows(records.len()))?;

        sheet.write_string(row, 0, &record.item_id)?;
        sheet.write_string(row, 1, &record.title)?;
        sheet.write_string(row, 2, &record.url)?;
        sheet.write_number(row, 3, f64::from(record.points))?;
        sheet.write_string(row, 4, &record.author)?;
        sheet.write_string(row, 5, &record.age_text)?;
        sheet.write_string(row, 6, &record.comments_link)?;
    }

    workbook.save(path)?;
    Ok(())
}
