pub mod columns;
pub mod csv;
pub mod download;
pub mod excel;
pub mod html;
pub mod pdf;
pub mod render;
pub mod request;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::info;

use crate::error::{ExportError, Result};
use crate::models::Column;

pub use self::columns::ColumnResolver;
pub use self::csv::CsvExporter;
pub use self::download::Download;
pub use self::excel::ExcelExporter;
pub use self::pdf::{PdfEngine, PdfEngineKind, PdfExporter};
pub use self::render::{RenderedRow, RowLoop, RowRenderer};
pub use self::request::{ExportRequest, ExportRequestBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Xlsx,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [Self::Xlsx, Self::Csv, Self::Pdf];

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
            Self::Pdf => "pdf",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Pdf => "application/pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => write!(f, "CSV"),
            Self::Xlsx => write!(f, "XLSX"),
            Self::Pdf => write!(f, "PDF"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" => Ok(Self::Xlsx),
            "pdf" => Ok(Self::Pdf),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageOrientation {
    #[default]
    Portrait,
    Landscape,
}

impl PageOrientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Portrait => "portrait",
            Self::Landscape => "landscape",
        }
    }
}

impl fmt::Display for PageOrientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageOrientation {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "portrait" => Ok(Self::Portrait),
            "landscape" => Ok(Self::Landscape),
            _ => Err(ExportError::UnsupportedOrientation(s.to_string())),
        }
    }
}

/// Everything a writer needs to serialize one export.
#[derive(Debug, Clone, Copy)]
pub struct Sheet<'a> {
    pub file_name: &'a str,
    pub columns: &'a [Column],
    pub rows: &'a [RenderedRow],
    pub orientation: PageOrientation,
    pub extra_view_data: &'a BTreeMap<String, String>,
}

impl<'a> Sheet<'a> {
    pub fn labels(&self) -> Vec<String> {
        self.columns.iter().map(Column::label).collect()
    }
}

pub trait Exporter {
    fn export(&self, sheet: &Sheet<'_>) -> Result<Vec<u8>>;
}

/// Dispatches a sheet to the writer for the requested format.
pub struct ExportWriter {
    csv: CsvExporter,
    excel: ExcelExporter,
    pdf: PdfExporter,
}

impl ExportWriter {
    pub fn new(csv: CsvExporter, pdf: PdfExporter) -> Self {
        Self {
            csv,
            excel: ExcelExporter,
            pdf,
        }
    }

    pub fn write(&self, sheet: &Sheet<'_>, format: ExportFormat) -> Result<Vec<u8>> {
        let exporter: &dyn Exporter = match format {
            ExportFormat::Csv => &self.csv,
            ExportFormat::Xlsx => &self.excel,
            ExportFormat::Pdf => &self.pdf,
        };

        let bytes = exporter.export(sheet)?;
        info!(
            format = %format,
            columns = sheet.columns.len(),
            rows = sheet.rows.len(),
            bytes = bytes.len(),
            "Export written"
        );
        Ok(bytes)
    }
}
