use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Formatting rule a column may declare for its state.
///
/// Input that a rule cannot interpret falls back to its plain text, so
/// formatting never fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateFormat {
    Date {
        format: String,
    },
    Number {
        #[serde(default)]
        decimals: usize,
        #[serde(default)]
        thousands_separator: Option<char>,
    },
    Money {
        currency: String,
        #[serde(default = "default_money_decimals")]
        decimals: usize,
    },
    Limit {
        chars: usize,
    },
    Affix {
        #[serde(default)]
        prefix: String,
        #[serde(default)]
        suffix: String,
    },
    Options {
        labels: BTreeMap<String, String>,
    },
    Boolean {
        true_label: String,
        false_label: String,
    },
}

fn default_money_decimals() -> usize {
    2
}

impl StateFormat {
    pub fn apply(&self, value: &Value) -> String {
        match self {
            Self::Date { format } => format_date(value, format).unwrap_or_else(|| plain_text(value)),
            Self::Number {
                decimals,
                thousands_separator,
            } => as_number(value)
                .map(|n| format_number(n, *decimals, *thousands_separator))
                .unwrap_or_else(|| plain_text(value)),
            Self::Money { currency, decimals } => as_number(value)
                .map(|n| format_money(n, currency, *decimals))
                .unwrap_or_else(|| plain_text(value)),
            Self::Limit { chars } => limit(&plain_text(value), *chars),
            Self::Affix { prefix, suffix } => {
                let text = plain_text(value);
                if text.is_empty() {
                    text
                } else {
                    format!("{}{}{}", prefix, text, suffix)
                }
            }
            Self::Options { labels } => {
                let text = plain_text(value);
                labels.get(&text).cloned().unwrap_or(text)
            }
            Self::Boolean {
                true_label,
                false_label,
            } => {
                if is_truthy(value) {
                    true_label.clone()
                } else {
                    false_label.clone()
                }
            }
        }
    }
}

/// Stringify a JSON value the way a cell shows it.
pub fn plain_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !matches!(s.trim().to_lowercase().as_str(), "" | "0" | "false" | "no"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn format_date(value: &Value, format: &str) -> Option<String> {
    let datetime = match value {
        Value::String(s) => parse_datetime(s.trim())?,
        Value::Number(n) => DateTime::from_timestamp(n.as_i64()?, 0)?.naive_utc(),
        _ => return None,
    };

    // An invalid format string surfaces as a fmt::Error here instead of a panic.
    let mut out = String::new();
    write!(out, "{}", datetime.format(format)).ok()?;
    Some(out)
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

fn format_number(value: f64, decimals: usize, thousands_separator: Option<char>) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (integer, fraction) = match formatted.split_once('.') {
        Some((integer, fraction)) => (integer.to_string(), Some(fraction.to_string())),
        None => (formatted, None),
    };

    let integer = match thousands_separator {
        Some(separator) => group_thousands(&integer, separator),
        None => integer,
    };

    let sign = if value < 0.0 && (integer.chars().any(|c| c != '0' && c.is_ascii_digit())
        || fraction.as_deref().is_some_and(|f| f.chars().any(|c| c != '0')))
    {
        "-"
    } else {
        ""
    };

    match fraction {
        Some(fraction) => format!("{}{}.{}", sign, integer, fraction),
        None => format!("{}{}", sign, integer),
    }
}

fn group_thousands(digits: &str, separator: char) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(ch);
    }
    grouped
}

fn format_money(value: f64, currency: &str, decimals: usize) -> String {
    let amount = format_number(value, decimals, Some(','));
    let (sign, amount) = match amount.strip_prefix('-') {
        Some(rest) => ("-", rest.to_string()),
        None => ("", amount),
    };

    match currency.to_uppercase().as_str() {
        "USD" => format!("{}${}", sign, amount),
        "EUR" => format!("{}€{}", sign, amount),
        "GBP" => format!("{}£{}", sign, amount),
        "JPY" => format!("{}¥{}", sign, amount),
        other => format!("{}{} {}", sign, other, amount),
    }
}

fn limit(text: &str, chars: usize) -> String {
    if text.chars().count() <= chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(chars).collect();
    format!("{}...", truncated.trim_end())
}
