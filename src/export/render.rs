use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::models::format::plain_text;
use crate::models::{Column, ColumnKind, Record, StateSource};

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->|<[^>]*>").expect("valid tag pattern"));
static WHITESPACE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));
static PLACEHOLDER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}").expect("valid placeholder pattern")
});

/// Position of a record within the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLoop {
    pub index: usize,
    pub iteration: usize,
}

impl RowLoop {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            iteration: index + 1,
        }
    }
}

/// Cell values of one record, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RenderedRow(BTreeMap<String, String>);

impl RenderedRow {
    pub fn get(&self, name: &str) -> &str {
        self.0.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Values in the order of `columns`.
    pub fn cells<'a>(&'a self, columns: &'a [Column]) -> impl Iterator<Item = &'a str> + 'a {
        columns.iter().map(move |column| self.get(&column.name))
    }
}

/// Turns (column, record, row position) into a single-line plain string.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowRenderer;

impl RowRenderer {
    pub fn render(&self, column: &Column, record: &Record, row: RowLoop) -> String {
        let state = resolve_state(column, record, row);

        let text = match (&state, &column.kind) {
            (Some(Value::Array(items)), _) => items
                .iter()
                .map(|item| state_text(column, item))
                .collect::<Vec<_>>()
                .join(", "),
            (_, ColumnKind::Image { root }) => {
                image_path(root.as_deref(), &state.as_ref().map(plain_text).unwrap_or_default())
            }
            (_, ColumnKind::View { template }) => {
                let value = state.as_ref().map(plain_text).unwrap_or_default();
                let text = render_template(&strip_markup(template), &value, record, row);
                collapse_whitespace(&text)
            }
            (Some(value), _) => state_text(column, value),
            (None, _) => String::new(),
        };

        single_line(&text)
    }

    /// Render every column for every record. Rows are independent of each other.
    pub fn render_rows(&self, columns: &[Column], records: &[Record], offset: usize) -> Vec<RenderedRow> {
        records
            .iter()
            .enumerate()
            .map(|(position, record)| {
                let row = RowLoop::new(offset + position);
                let mut rendered = RenderedRow::default();
                for column in columns {
                    rendered.insert(column.name.as_str(), self.render(column, record, row));
                }
                rendered
            })
            .collect()
    }
}

fn resolve_state(column: &Column, record: &Record, row: RowLoop) -> Option<Value> {
    let state = match column.source() {
        StateSource::Field(path) => record.get(&path),
        StateSource::Constant(text) => Some(Value::String(text)),
        StateSource::Index => Some(Value::from(row.index)),
        StateSource::Iteration => Some(Value::from(row.iteration)),
    };

    match state {
        None | Some(Value::Null) => column.default.clone().map(Value::String),
        Some(Value::String(s)) if s.is_empty() && column.default.is_some() => {
            column.default.clone().map(Value::String)
        }
        other => other,
    }
}

/// Formatting rule if the column declares one, plain text otherwise.
fn state_text(column: &Column, value: &Value) -> String {
    match &column.kind {
        ColumnKind::Formatted { format } => format.apply(value),
        _ => plain_text(value),
    }
}

fn image_path(root: Option<&str>, path: &str) -> String {
    match root {
        Some(root) if !path.is_empty() && !path.contains("://") => {
            format!("{}/{}", root.trim_end_matches('/'), path.trim_start_matches('/'))
        }
        _ => path.to_string(),
    }
}

fn render_template(template: &str, state: &str, record: &Record, row: RowLoop) -> String {
    PLACEHOLDER_PATTERN
        .replace_all(template, |captures: &regex::Captures<'_>| {
            let key = &captures[1];
            match key {
                "state" => state.to_string(),
                "index" => row.index.to_string(),
                "iteration" => row.iteration.to_string(),
                _ => key
                    .strip_prefix("record.")
                    .and_then(|path| record.get(path))
                    .map(|value| plain_text(&value))
                    .unwrap_or_default(),
            }
        })
        .into_owned()
}

/// Remove tags and comments, collapse whitespace runs, trim.
///
/// Markup written as entities (`&lt;b&gt;`) is removed too once decoded.
/// Placeholders are substituted after this, so record data never goes
/// through the tag pattern.
pub fn strip_markup(markup: &str) -> String {
    let without_tags = TAG_PATTERN.replace_all(markup, "");
    let decoded = decode_entities(&without_tags);
    collapse_whitespace(&TAG_PATTERN.replace_all(&decoded, ""))
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_PATTERN.replace_all(text, " ").trim().to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn single_line(text: &str) -> String {
    if text.contains(['\n', '\r']) {
        WHITESPACE_PATTERN.replace_all(text, " ").trim().to_string()
    } else {
        text.to_string()
    }
}
