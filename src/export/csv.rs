use csv::{Terminator, WriterBuilder};
use std::io::Write;

use super::{Exporter, Sheet};
use crate::error::{ExportError, Result};

pub struct CsvExporter {
    delimiter: u8,
    with_bom: bool,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self {
            delimiter: b',',
            with_bom: false,
        }
    }
}

impl CsvExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only single-byte (ASCII) delimiters are accepted.
    pub fn with_delimiter(mut self, delimiter: char) -> Result<Self> {
        if !delimiter.is_ascii() {
            return Err(ExportError::InvalidDelimiter(delimiter));
        }
        self.delimiter = delimiter as u8;
        Ok(self)
    }

    /// Prefix the output with a UTF-8 BOM so spreadsheet apps detect the encoding.
    pub fn with_bom(mut self, with_bom: bool) -> Self {
        self.with_bom = with_bom;
        self
    }
}

impl Exporter for CsvExporter {
    fn export(&self, sheet: &Sheet<'_>) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();

        if self.with_bom {
            buffer.write_all(&[0xEF, 0xBB, 0xBF])?;
        }

        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .terminator(Terminator::Any(b'\n'))
            .flexible(true)
            .from_writer(buffer);

        // A record with no fields would be written as an empty line.
        if !sheet.columns.is_empty() {
            writer.write_record(sheet.labels())?;

            for row in sheet.rows {
                writer.write_record(row.cells(sheet.columns))?;
            }
        }

        writer.flush()?;
        writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::RenderedRow;
    use crate::export::PageOrientation;
    use crate::models::Column;
    use std::collections::BTreeMap;

    fn row(pairs: &[(&str, &str)]) -> RenderedRow {
        let mut row = RenderedRow::default();
        for (name, value) in pairs {
            row.insert(*name, *value);
        }
        row
    }

    fn export(exporter: &CsvExporter, columns: &[Column], rows: &[RenderedRow]) -> String {
        let extra = BTreeMap::new();
        let sheet = Sheet {
            file_name: "test",
            columns,
            rows,
            orientation: PageOrientation::Portrait,
            extra_view_data: &extra,
        };
        String::from_utf8(exporter.export(&sheet).unwrap()).unwrap()
    }

    #[test]
    fn test_labels_then_rows() {
        let columns = vec![Column::new("id").with_label("ID")];
        let rows = vec![row(&[("id", "1")]), row(&[("id", "2")])];
        assert_eq!(export(&CsvExporter::new(), &columns, &rows), "ID\n1\n2\n");
    }

    #[test]
    fn test_custom_delimiter_and_column_order() {
        let columns = vec![
            Column::new("name").with_label("Name"),
            Column::new("id").with_label("ID"),
        ];
        let rows = vec![row(&[("id", "7"), ("name", "Ada")])];
        let exporter = CsvExporter::new().with_delimiter(';').unwrap();
        assert_eq!(export(&exporter, &columns, &rows), "Name;ID\nAda;7\n");
    }

    #[test]
    fn test_quotes_fields_containing_delimiter() {
        let columns = vec![Column::new("note").with_label("Note")];
        let rows = vec![row(&[("note", "a, b")])];
        assert_eq!(export(&CsvExporter::new(), &columns, &rows), "Note\n\"a, b\"\n");
    }

    #[test]
    fn test_bom_prefix() {
        let columns = vec![Column::new("id").with_label("ID")];
        let out = export(&CsvExporter::new().with_bom(true), &columns, &[]);
        assert_eq!(out, "\u{feff}ID\n");
    }

    #[test]
    fn test_no_columns_is_empty_output() {
        assert_eq!(export(&CsvExporter::new(), &[], &[row(&[])]), "");
    }

    #[test]
    fn test_rejects_non_ascii_delimiter() {
        assert!(matches!(
            CsvExporter::new().with_delimiter('§'),
            Err(ExportError::InvalidDelimiter('§'))
        ));
    }
}
