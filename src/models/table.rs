use serde::{Deserialize, Serialize};

use super::{Column, Record};

/// The host table an export is taken from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    #[serde(default)]
    pub heading: Option<String>,
    /// Visible declared columns.
    #[serde(default)]
    pub columns: Vec<Column>,
    /// Toggled-off columns, only exported when hidden columns are shown.
    #[serde(default)]
    pub hidden_columns: Vec<Column>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            heading: None,
            columns,
            hidden_columns: Vec::new(),
        }
    }

    pub fn with_heading(mut self, heading: impl Into<String>) -> Self {
        self.heading = Some(heading.into());
        self
    }

    pub fn with_hidden_columns(mut self, hidden: Vec<Column>) -> Self {
        self.hidden_columns = hidden;
        self
    }

    /// Every declared column, visible ones first, in declaration order.
    pub fn cached_columns(&self) -> Vec<Column> {
        self.columns
            .iter()
            .chain(self.hidden_columns.iter())
            .cloned()
            .collect()
    }
}

/// A table description plus its records, as read from disk by the CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableData {
    #[serde(flatten)]
    pub table: Table,
    #[serde(default)]
    pub records: Vec<Record>,
}

/// One page of records together with its absolute row offset.
#[derive(Debug, Clone, Copy)]
pub struct Page<'a> {
    pub number: usize,
    pub last_page: usize,
    pub offset: usize,
    pub records: &'a [Record],
}

/// Splits records into fixed-size pages for previews.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    per_page: usize,
}

impl Paginator {
    pub fn new(per_page: usize) -> Self {
        Self {
            per_page: per_page.max(1),
        }
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    pub fn last_page(&self, total: usize) -> usize {
        total.div_ceil(self.per_page).max(1)
    }

    /// Page numbers are one-based and clamped into range.
    pub fn page<'a>(&self, records: &'a [Record], number: usize) -> Page<'a> {
        let last_page = self.last_page(records.len());
        let number = number.clamp(1, last_page);
        let offset = ((number - 1) * self.per_page).min(records.len());
        let end = (offset + self.per_page).min(records.len());

        Page {
            number,
            last_page,
            offset,
            records: &records[offset..end],
        }
    }
}
