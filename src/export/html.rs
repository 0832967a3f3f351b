//! HTML rendering of an export, used as the page for PDF engines that
//! consume markup and for the preview/print views.

use std::fmt::Write;

use super::Sheet;

const STYLE: &str = "\
body { font-family: DejaVu Sans, Helvetica, Arial, sans-serif; font-size: 10px; color: #111827; }
h1 { font-size: 14px; margin: 0 0 8px 0; }
dl.view-data { margin: 0 0 8px 0; }
dl.view-data dt { font-weight: bold; float: left; clear: left; margin-right: 4px; }
dl.view-data dd { margin: 0; }
p.pager { color: #6b7280; margin: 0 0 8px 0; }
table { width: 100%; border-collapse: collapse; }
th, td { border: 1px solid #d1d5db; padding: 4px 6px; text-align: left; vertical-align: top; }
th { background: #f3f4f6; }
tr { page-break-inside: avoid; }";

/// Render the sheet as a standalone HTML document sized for A4.
///
/// `pager` is an optional line shown above the table (previews use it for
/// "Page X of Y").
pub fn render(sheet: &Sheet<'_>, pager: Option<&str>) -> String {
    let mut html = String::with_capacity(1024 + sheet.rows.len() * sheet.columns.len() * 24);

    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>{}</title>", escape(sheet.file_name));
    let _ = writeln!(
        html,
        "<style>\n@page {{ size: A4 {}; margin: 12mm; }}\n{}\n</style>",
        sheet.orientation, STYLE
    );
    html.push_str("</head>\n<body>\n");

    let _ = writeln!(html, "<h1>{}</h1>", escape(sheet.file_name));

    if !sheet.extra_view_data.is_empty() {
        html.push_str("<dl class=\"view-data\">\n");
        for (key, value) in sheet.extra_view_data {
            let _ = writeln!(html, "<dt>{}:</dt><dd>{}</dd>", escape(key), escape(value));
        }
        html.push_str("</dl>\n");
    }

    if let Some(pager) = pager {
        let _ = writeln!(html, "<p class=\"pager\">{}</p>", escape(pager));
    }

    html.push_str("<table>\n<thead>\n<tr>");
    for label in sheet.labels() {
        let _ = write!(html, "<th>{}</th>", escape(&label));
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");

    for row in sheet.rows {
        html.push_str("<tr>");
        for value in row.cells(sheet.columns) {
            let _ = write!(html, "<td>{}</td>", escape(value));
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    html
}

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
