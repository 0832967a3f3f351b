use serde::{Deserialize, Serialize};

use super::format::StateFormat;

/// What a column can do with its state. The renderer dispatches on this.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnKind {
    #[default]
    Plain,
    Formatted {
        format: StateFormat,
    },
    /// The state is a storage path; `root` is prepended when set.
    Image {
        #[serde(default)]
        root: Option<String>,
    },
    /// Free-form markup with `{{ state }}`, `{{ index }}`, `{{ iteration }}`
    /// and `{{ record.<path> }}` placeholders.
    View {
        template: String,
    },
}

/// Where a column's raw state comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum StateSource {
    Field(String),
    Constant(String),
    /// Zero-based row index.
    Index,
    /// One-based row counter.
    Iteration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(default)]
    pub kind: ColumnKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<StateSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            kind: ColumnKind::Plain,
            source: None,
            default: None,
        }
    }

    /// A column that shows the same text on every row.
    pub fn constant(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name).with_source(StateSource::Constant(value.into()))
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_kind(mut self, kind: ColumnKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_format(self, format: StateFormat) -> Self {
        self.with_kind(ColumnKind::Formatted { format })
    }

    pub fn with_source(mut self, source: StateSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn label(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => label_from_name(&self.name),
        }
    }

    /// State source, defaulting to the record field named like the column.
    pub fn source(&self) -> StateSource {
        self.source
            .clone()
            .unwrap_or_else(|| StateSource::Field(self.name.clone()))
    }
}

/// Derive a display label from a column name: `author.name` → `Author`,
/// `created_at` → `Created at`, `firstName` → `First name`.
pub fn label_from_name(name: &str) -> String {
    let base = match name.rsplit_once('.') {
        Some((head, _)) => head,
        None => name,
    };

    let mut words = String::with_capacity(base.len() + 4);
    let mut previous: Option<char> = None;
    for ch in base.chars() {
        if ch == '_' || ch == '-' || ch == '.' {
            words.push(' ');
        } else {
            if ch.is_uppercase() && previous.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit()) {
                words.push(' ');
            }
            words.extend(ch.to_lowercase());
        }
        previous = Some(ch);
    }

    let collapsed = words.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_label_from_name() {
        assert_eq!(label_from_name("id"), "Id");
        assert_eq!(label_from_name("created_at"), "Created at");
        assert_eq!(label_from_name("author.name"), "Author");
        assert_eq!(label_from_name("firstName"), "First name");
        assert_eq!(label_from_name("order-total"), "Order total");
        assert_eq!(label_from_name(""), "");
    }

    #[test]
    fn test_explicit_label_wins() {
        let column = Column::new("id").with_label("ID");
        assert_eq!(column.label(), "ID");
        assert_eq!(Column::new("id").label(), "Id");
    }

    #[test]
    fn test_source_defaults_to_field_of_same_name() {
        assert_eq!(
            Column::new("author.name").source(),
            StateSource::Field("author.name".to_string())
        );
        assert_eq!(
            Column::constant("note", "n/a").source(),
            StateSource::Constant("n/a".to_string())
        );
    }

    #[test]
    fn test_deserialize_column() {
        let column: Column = serde_json::from_value(json!({
            "name": "avatar",
            "label": "Avatar",
            "kind": {"type": "image", "root": "storage"}
        }))
        .unwrap();
        assert_eq!(column.label(), "Avatar");
        assert_eq!(
            column.kind,
            ColumnKind::Image {
                root: Some("storage".to_string())
            }
        );

        let rank: Column = serde_json::from_value(json!({
            "name": "rank",
            "source": {"type": "iteration"}
        }))
        .unwrap();
        assert_eq!(rank.source(), StateSource::Iteration);
        assert_eq!(rank.kind, ColumnKind::Plain);
    }
}
