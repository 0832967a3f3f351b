use rust_xlsxwriter::{Format, Workbook};

use super::{Exporter, Sheet};
use crate::error::{ExportError, Result};

const MAX_SHEET_NAME_CHARS: usize = 31;

pub struct ExcelExporter;

impl Exporter for ExcelExporter {
    fn export(&self, sheet: &Sheet<'_>) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();

        // Column indices are u16; anything wider must not wrap onto column 0.
        let column_count = u16::try_from(sheet.columns.len())
            .map_err(|_| ExportError::TooManyColumns(sheet.columns.len()))?;

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet_name(sheet.file_name))?;

        // Write headers
        for (col, label) in (0..column_count).zip(sheet.labels().iter()) {
            worksheet.write_string_with_format(0, col, label, &header_format)?;
        }

        // Write data
        for (row_num, row) in sheet.rows.iter().enumerate() {
            let row_idx = (row_num + 1) as u32;
            for (col, value) in (0..column_count).zip(row.cells(sheet.columns)) {
                worksheet.write_string(row_idx, col, value)?;
            }
        }

        if column_count > 0 {
            // Freeze header row
            worksheet.set_freeze_panes(1, 0)?;

            // Enable autofilter
            worksheet.autofilter(0, 0, sheet.rows.len() as u32, column_count - 1)?;
        }

        worksheet.autofit();

        Ok(workbook.save_to_buffer()?)
    }
}

/// Worksheet names are limited to 31 characters and may not contain `[]:*?/\`.
fn sheet_name(file_name: &str) -> String {
    let cleaned: String = file_name
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .take(MAX_SHEET_NAME_CHARS)
        .collect();

    let cleaned = cleaned.trim().trim_matches('\'').to_string();
    if cleaned.is_empty() {
        "Export".to_string()
    } else {
        cleaned
    }
}
