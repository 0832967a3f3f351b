use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::PathBuf;
use tracing::{info, warn};

use super::{
    html, ColumnResolver, CsvExporter, Download, ExportFormat, ExportWriter, PageOrientation,
    PdfEngineKind, PdfExporter, RenderedRow, RowRenderer, Sheet,
};
use crate::config::ExportConfig;
use crate::error::{ExportError, Result};
use crate::models::{Column, Paginator, Record, Table};

const FALLBACK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// An immutable description of one export: what to read, which columns to
/// show, and how to serialize it. Built once per export action.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    table: Table,
    records: Vec<Record>,
    file_name: String,
    format: ExportFormat,
    page_orientation: PageOrientation,
    filtered_columns: Vec<String>,
    additional_columns: Vec<Column>,
    with_columns: Vec<Column>,
    show_hidden: bool,
    csv_delimiter: char,
    pdf_engine: PdfEngineKind,
    wkhtmltopdf_binary: PathBuf,
    extra_view_data: BTreeMap<String, String>,
    preview_enabled: bool,
    preview_per_page: usize,
}

impl ExportRequest {
    pub fn builder(config: &ExportConfig) -> ExportRequestBuilder {
        ExportRequestBuilder::new(config.clone())
    }

    /// File name without extension.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn format(&self) -> ExportFormat {
        self.format
    }

    pub fn page_orientation(&self) -> PageOrientation {
        self.page_orientation
    }

    pub fn csv_delimiter(&self) -> char {
        self.csv_delimiter
    }

    pub fn pdf_engine(&self) -> PdfEngineKind {
        self.pdf_engine
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn extra_view_data(&self) -> &BTreeMap<String, String> {
        &self.extra_view_data
    }

    pub fn columns(&self) -> Vec<Column> {
        ColumnResolver::new(self.show_hidden).resolve(
            &self.table,
            &self.with_columns,
            &self.filtered_columns,
            &self.additional_columns,
        )
    }

    pub fn rows(&self) -> Vec<RenderedRow> {
        RowRenderer.render_rows(&self.columns(), &self.records, 0)
    }

    /// Resolve every record and serialize it in the requested format.
    pub fn download(&self) -> Result<Download> {
        let columns = self.columns();
        let rows = RowRenderer.render_rows(&columns, &self.records, 0);

        let csv = CsvExporter::new().with_delimiter(self.csv_delimiter)?;
        let pdf = PdfExporter::new(self.pdf_engine.build(&self.wkhtmltopdf_binary));
        let writer = ExportWriter::new(csv, pdf);

        let sheet = self.sheet(&columns, &rows);
        let bytes = writer.write(&sheet, self.format)?;

        let download = Download::new(&self.file_name, self.format, bytes);
        info!(file = %download.file_name, records = self.records.len(), "Export ready");
        Ok(download)
    }

    /// One page of the export as HTML (one-based page number, clamped).
    pub fn preview_html(&self, page: usize) -> Result<String> {
        if !self.preview_enabled {
            return Err(ExportError::PreviewDisabled);
        }

        let columns = self.columns();
        let paginator = Paginator::new(self.preview_per_page);
        let page = paginator.page(&self.records, page);
        let rows = RowRenderer.render_rows(&columns, page.records, page.offset);

        let pager = format!("Page {} of {}", page.number, page.last_page);
        Ok(html::render(&self.sheet(&columns, &rows), Some(&pager)))
    }

    /// Every record as a printable HTML page.
    pub fn print_html(&self) -> Result<String> {
        if !self.preview_enabled {
            return Err(ExportError::PreviewDisabled);
        }

        let columns = self.columns();
        let rows = RowRenderer.render_rows(&columns, &self.records, 0);
        Ok(html::render(&self.sheet(&columns, &rows), None))
    }

    fn sheet<'a>(&'a self, columns: &'a [Column], rows: &'a [RenderedRow]) -> Sheet<'a> {
        Sheet {
            file_name: &self.file_name,
            columns,
            rows,
            orientation: self.page_orientation,
            extra_view_data: &self.extra_view_data,
        }
    }
}

/// Fluent configuration for an [`ExportRequest`].
///
/// Nothing is validated until [`build`](Self::build).
pub struct ExportRequestBuilder {
    config: ExportConfig,
    table: Table,
    records: Vec<Record>,
    file_name: Option<String>,
    file_name_prefix: Option<String>,
    format: Option<String>,
    page_orientation: Option<String>,
    filtered_columns: Vec<String>,
    additional_columns: Vec<Column>,
    with_columns: Vec<Column>,
    show_hidden: bool,
    csv_delimiter: Option<char>,
    pdf_engine: Option<PdfEngineKind>,
    extra_view_data: BTreeMap<String, String>,
    now: Option<DateTime<Local>>,
}

impl ExportRequestBuilder {
    pub fn new(config: ExportConfig) -> Self {
        Self {
            config,
            table: Table::default(),
            records: Vec::new(),
            file_name: None,
            file_name_prefix: None,
            format: None,
            page_orientation: None,
            filtered_columns: Vec::new(),
            additional_columns: Vec::new(),
            with_columns: Vec::new(),
            show_hidden: false,
            csv_delimiter: None,
            pdf_engine: None,
            extra_view_data: BTreeMap::new(),
            now: None,
        }
    }

    pub fn table(mut self, table: Table) -> Self {
        self.table = table;
        self
    }

    pub fn records(mut self, records: Vec<Record>) -> Self {
        self.records = records;
        self
    }

    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn file_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_name_prefix = Some(prefix.into());
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn page_orientation(mut self, orientation: impl Into<String>) -> Self {
        self.page_orientation = Some(orientation.into());
        self
    }

    /// Names of declared columns to keep. Empty keeps all.
    pub fn filtered_columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filtered_columns = names.into_iter().map(Into::into).collect();
        self
    }

    /// User-entered title/value pairs, each becoming a constant column.
    pub fn additional_columns<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (title, value) in pairs {
            let title = title.into();
            self.additional_columns
                .push(Column::constant(title.clone(), value).with_label(title));
        }
        self
    }

    /// A computed column appended after filtering.
    pub fn additional_column(mut self, column: Column) -> Self {
        self.additional_columns.push(column);
        self
    }

    /// Columns merged with the declared ones before filtering.
    pub fn with_columns(mut self, columns: Vec<Column>) -> Self {
        self.with_columns = columns;
        self
    }

    pub fn with_hidden_columns(mut self, show_hidden: bool) -> Self {
        self.show_hidden = show_hidden;
        self
    }

    pub fn csv_delimiter(mut self, delimiter: char) -> Self {
        self.csv_delimiter = Some(delimiter);
        self
    }

    pub fn pdf_engine(mut self, engine: PdfEngineKind) -> Self {
        self.pdf_engine = Some(engine);
        self
    }

    pub fn extra_view_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_view_data.insert(key.into(), value.into());
        self
    }

    /// Clock used for the automatic file name.
    pub fn now(mut self, now: DateTime<Local>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn build(self) -> Result<ExportRequest> {
        let format = self
            .format
            .as_deref()
            .unwrap_or(&self.config.default_format)
            .parse::<ExportFormat>()?;

        let page_orientation = self
            .page_orientation
            .as_deref()
            .unwrap_or(&self.config.default_page_orientation)
            .parse::<PageOrientation>()?;

        let csv_delimiter = self.csv_delimiter.unwrap_or(self.config.csv_delimiter);
        if !csv_delimiter.is_ascii() {
            return Err(ExportError::InvalidDelimiter(csv_delimiter));
        }

        let filtered_columns = if self.config.disable_filter_columns {
            if !self.filtered_columns.is_empty() {
                warn!("Column filtering is disabled; ignoring column filter");
            }
            Vec::new()
        } else {
            self.filtered_columns
        };

        let additional_columns = if self.config.disable_additional_columns {
            if !self.additional_columns.is_empty() {
                warn!("Additional columns are disabled; ignoring {} column(s)", self.additional_columns.len());
            }
            Vec::new()
        } else {
            self.additional_columns
        };

        let file_name = resolve_file_name(
            &self.config,
            self.file_name,
            self.file_name_prefix.or_else(|| self.table.heading.clone()),
            self.now.unwrap_or_else(Local::now),
        );

        Ok(ExportRequest {
            table: self.table,
            records: self.records,
            file_name,
            format,
            page_orientation,
            filtered_columns,
            additional_columns,
            with_columns: self.with_columns,
            show_hidden: self.show_hidden,
            csv_delimiter,
            pdf_engine: self.pdf_engine.unwrap_or_else(|| self.config.pdf_engine()),
            wkhtmltopdf_binary: self.config.wkhtmltopdf_binary.clone(),
            extra_view_data: self.extra_view_data,
            preview_enabled: !self.config.disable_preview,
            preview_per_page: self.config.preview_per_page,
        })
    }
}

fn resolve_file_name(
    config: &ExportConfig,
    file_name: Option<String>,
    prefix: Option<String>,
    now: DateTime<Local>,
) -> String {
    let user_name = if config.disable_file_name {
        if file_name.is_some() {
            warn!("File name field is disabled; using the default file name");
        }
        None
    } else {
        file_name.filter(|name| !name.trim().is_empty())
    };

    let name = user_name.unwrap_or_else(|| timestamp(&config.time_format, now));

    let prefix = if config.disable_file_name_prefix {
        None
    } else {
        prefix.filter(|p| !p.trim().is_empty())
    };

    match prefix {
        Some(prefix) => format!("{}-{}", prefix.trim(), name),
        None => name,
    }
}

fn timestamp(time_format: &str, now: DateTime<Local>) -> String {
    let mut out = String::new();
    if write!(out, "{}", now.format(time_format)).is_ok() && !out.is_empty() {
        return out;
    }
    warn!(time_format, "Invalid time format; falling back to default");
    now.format(FALLBACK_TIME_FORMAT).to_string()
}
