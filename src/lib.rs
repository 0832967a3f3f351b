//! Export a table's records to CSV, XLSX or PDF.
//!
//! An [`ExportRequest`] resolves the columns to show (declared columns,
//! include filter, extra columns), renders each record into plain-text cells
//! and hands the result to the writer for the requested format.

pub mod config;
pub mod error;
pub mod export;
pub mod models;

pub use config::ExportConfig;
pub use error::{ExportError, Result};
pub use export::{
    Download, ExportFormat, ExportRequest, ExportRequestBuilder, PageOrientation, PdfEngineKind,
};
pub use models::{Column, ColumnKind, Record, StateFormat, StateSource, Table, TableData};
