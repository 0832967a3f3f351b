use thiserror::Error;

/// Errors surfaced by an export attempt.
///
/// Configuration problems (`UnsupportedFormat`, `UnsupportedOrientation`,
/// `InvalidDelimiter`) are raised while building the request, before any
/// writer runs. Everything else is fatal to the single export attempt.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unsupported export format '{0}' (expected one of: csv, xlsx, pdf)")]
    UnsupportedFormat(String),

    #[error("unsupported page orientation '{0}' (expected portrait or landscape)")]
    UnsupportedOrientation(String),

    #[error("CSV delimiter must be a single ASCII character, got {0:?}")]
    InvalidDelimiter(char),

    #[error("unsupported PDF engine '{0}' (expected native or wkhtmltopdf)")]
    UnsupportedPdfEngine(String),

    #[error("{0} columns do not fit in a worksheet")]
    TooManyColumns(usize),

    #[error("table preview is disabled")]
    PreviewDisabled,

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("XLSX write failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("PDF write failed: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("PDF rendering with {engine} failed: {message}")]
    PdfRender { engine: &'static str, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;
