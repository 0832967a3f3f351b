use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use super::{Paper, PdfDocument, PdfEngine};
use crate::error::Result;

const MARGIN: f32 = 36.0;
const TITLE_SIZE: f32 = 14.0;
const CAPTION_SIZE: f32 = 9.0;
const CELL_SIZE: f32 = 8.0;
const ROW_HEIGHT: f32 = 14.0;
const CELL_PADDING: f32 = 2.0;
/// Average Helvetica glyph width as a fraction of the font size.
const GLYPH_WIDTH: f32 = 0.5;

const REGULAR: &str = "F1";
const BOLD: &str = "F2";

/// In-process engine: lays the table out directly with `lopdf`.
///
/// Columns share the usable width equally, cell text is truncated to fit,
/// and the header row repeats on every page. Always emits at least one page.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativePdfEngine;

impl NativePdfEngine {
    pub fn new() -> Self {
        Self
    }
}

impl PdfEngine for NativePdfEngine {
    fn name(&self) -> &'static str {
        "native"
    }

    fn render(&self, document: &PdfDocument<'_>) -> Result<Vec<u8>> {
        let pages = layout(document);

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                REGULAR => regular_id,
                BOLD => bold_id,
            },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
        for operations in pages {
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    real(document.paper.width),
                    real(document.paper.height),
                ],
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(win_ansi(document.sheet.file_name)),
            "Producer" => Object::string_literal("table-export"),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);
        doc.compress();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        Ok(bytes)
    }
}

/// Content operations for each page.
fn layout(document: &PdfDocument<'_>) -> Vec<Vec<Operation>> {
    let sheet = document.sheet;
    let paper = document.paper;
    let grid = Grid::new(paper, sheet.columns.len());
    let labels = sheet.labels();

    let mut pages = Vec::new();
    let mut ops = Vec::new();
    let top = paper.height - MARGIN;
    let max_line = max_chars(paper.width - 2.0 * MARGIN, CAPTION_SIZE);
    let mut y = top;

    y -= TITLE_SIZE;
    let title_max = max_chars(paper.width - 2.0 * MARGIN, TITLE_SIZE);
    text(&mut ops, BOLD, TITLE_SIZE, MARGIN, y, &truncate(sheet.file_name, title_max));
    y -= TITLE_SIZE * 0.6;

    for (key, value) in sheet.extra_view_data {
        if y - (CAPTION_SIZE + 3.0) < MARGIN {
            pages.push(std::mem::take(&mut ops));
            y = top;
        }
        y -= CAPTION_SIZE + 3.0;
        let caption = format!("{}: {}", key, value);
        text(&mut ops, REGULAR, CAPTION_SIZE, MARGIN, y, &truncate(&caption, max_line));
    }
    y -= 8.0;

    if sheet.columns.is_empty() {
        pages.push(ops);
        return pages;
    }

    if y - ROW_HEIGHT < MARGIN {
        pages.push(std::mem::take(&mut ops));
        y = top;
    }
    y = grid.header(&mut ops, &labels, y);

    for row in sheet.rows {
        if y - ROW_HEIGHT < MARGIN {
            pages.push(std::mem::take(&mut ops));
            y = grid.header(&mut ops, &labels, top);
        }

        for (col, value) in row.cells(sheet.columns).enumerate() {
            text(&mut ops, REGULAR, CELL_SIZE, grid.x(col), y - ROW_HEIGHT + 4.0, &grid.fit(value));
        }
        y -= ROW_HEIGHT;
        rule(&mut ops, MARGIN, paper.width - MARGIN, y, 0.25);
    }

    pages.push(ops);
    pages
}

struct Grid {
    left: f32,
    right: f32,
    column_width: f32,
    max_chars: usize,
}

impl Grid {
    fn new(paper: Paper, columns: usize) -> Self {
        let usable = paper.width - 2.0 * MARGIN;
        let column_width = usable / columns.max(1) as f32;
        Self {
            left: MARGIN,
            right: paper.width - MARGIN,
            column_width,
            max_chars: max_chars(column_width - 2.0 * CELL_PADDING, CELL_SIZE),
        }
    }

    fn x(&self, col: usize) -> f32 {
        self.left + col as f32 * self.column_width + CELL_PADDING
    }

    fn fit(&self, value: &str) -> String {
        truncate(value, self.max_chars)
    }

    /// Draw the header row with its top edge at `y`; returns the new baseline.
    fn header(&self, ops: &mut Vec<Operation>, labels: &[String], y: f32) -> f32 {
        rule(ops, self.left, self.right, y, 0.75);
        for (col, label) in labels.iter().enumerate() {
            text(ops, BOLD, CELL_SIZE, self.x(col), y - ROW_HEIGHT + 4.0, &self.fit(label));
        }
        let bottom = y - ROW_HEIGHT;
        rule(ops, self.left, self.right, bottom, 0.75);
        bottom
    }
}

fn text(ops: &mut Vec<Operation>, font: &str, size: f32, x: f32, y: f32, value: &str) {
    if value.is_empty() {
        return;
    }
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![font.into(), real(size)]));
    ops.push(Operation::new("Td", vec![real(x), real(y)]));
    ops.push(Operation::new("Tj", vec![Object::string_literal(win_ansi(value))]));
    ops.push(Operation::new("ET", vec![]));
}

fn rule(ops: &mut Vec<Operation>, x1: f32, x2: f32, y: f32, width: f32) {
    ops.push(Operation::new("w", vec![real(width)]));
    ops.push(Operation::new("m", vec![real(x1), real(y)]));
    ops.push(Operation::new("l", vec![real(x2), real(y)]));
    ops.push(Operation::new("S", vec![]));
}

fn real(value: f32) -> Object {
    value.into()
}

fn max_chars(width: f32, size: f32) -> usize {
    (width / (size * GLYPH_WIDTH)).floor().max(1.0) as usize
}

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = value.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Encode for the standard 14 fonts; unmapped characters become `?`.
fn win_ansi(value: &str) -> Vec<u8> {
    value
        .chars()
        .map(|c| match c {
            ' '..='~' | '\u{a0}'..='\u{ff}' => c as u8,
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '™' => 0x99,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{PageOrientation, RenderedRow, Sheet};
    use crate::models::Column;
    use std::collections::BTreeMap;

    fn render(columns: &[Column], rows: &[RenderedRow], orientation: PageOrientation) -> Vec<u8> {
        let extra = BTreeMap::from([("Generated by".to_string(), "tests".to_string())]);
        render_sheet("report", columns, rows, orientation, &extra)
    }

    fn render_sheet(
        file_name: &str,
        columns: &[Column],
        rows: &[RenderedRow],
        orientation: PageOrientation,
        extra: &BTreeMap<String, String>,
    ) -> Vec<u8> {
        let sheet = Sheet {
            file_name,
            columns,
            rows,
            orientation,
            extra_view_data: extra,
        };
        let document = PdfDocument {
            sheet: &sheet,
            html: String::new(),
            paper: Paper::a4(orientation),
        };
        NativePdfEngine.render(&document).unwrap()
    }

    #[test]
    fn test_empty_export_is_single_page_pdf() {
        let bytes = render(&[], &[], PageOrientation::Portrait);
        assert!(bytes.starts_with(b"%PDF-1.5"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_many_rows_span_pages() {
        let columns = vec![Column::new("id").with_label("ID"), Column::new("name")];
        let rows: Vec<RenderedRow> = (0..200)
            .map(|i| {
                let mut row = RenderedRow::default();
                row.insert("id", i.to_string());
                row.insert("name", format!("Name {}", i));
                row
            })
            .collect();

        let portrait = Document::load_mem(&render(&columns, &rows, PageOrientation::Portrait)).unwrap();
        let landscape = Document::load_mem(&render(&columns, &rows, PageOrientation::Landscape)).unwrap();
        assert!(portrait.get_pages().len() > 1);
        assert!(landscape.get_pages().len() > portrait.get_pages().len());
    }

    #[test]
    fn test_page_text_contains_cells() {
        let columns = vec![Column::new("city").with_label("City")];
        let mut row = RenderedRow::default();
        row.insert("city", "Zürich");
        let bytes = render(&columns, &[row], PageOrientation::Portrait);

        let doc = Document::load_mem(&bytes).unwrap();
        let page_id = *doc.get_pages().get(&1).unwrap();
        let content = doc.get_page_content(page_id).unwrap();
        let decoded = Content::decode(&content).unwrap();
        let strings: Vec<Vec<u8>> = decoded
            .operations
            .iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| op.operands.first().and_then(|o| o.as_str().ok()).map(|s| s.to_vec()))
            .collect();

        assert!(strings.contains(&b"report".to_vec()));
        assert!(strings.contains(&b"City".to_vec()));
        assert!(strings.contains(&win_ansi("Zürich")));
        assert!(strings.contains(&b"Generated by: tests".to_vec()));
    }

    /// (`Td` x, `Td` y, `Tj` bytes) for each text run on a page.
    fn text_runs(doc: &Document, page: u32) -> Vec<(f32, f32, Vec<u8>)> {
        let page_id = *doc.get_pages().get(&page).unwrap();
        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        let mut runs = Vec::new();
        let mut position = (0.0, 0.0);
        for op in &content.operations {
            match op.operator.as_str() {
                "Td" => {
                    position = (
                        op.operands[0].as_float().unwrap(),
                        op.operands[1].as_float().unwrap(),
                    )
                }
                "Tj" => runs.push((position.0, position.1, op.operands[0].as_str().unwrap().to_vec())),
                _ => {}
            }
        }
        runs
    }

    #[test]
    fn test_long_captions_break_pages_and_keep_header() {
        let columns = vec![Column::new("id").with_label("ID")];
        let mut row = RenderedRow::default();
        row.insert("id", "1");
        let extra: BTreeMap<String, String> = (0..80)
            .map(|i| (format!("Key {:02}", i), format!("value {}", i)))
            .collect();

        let bytes = render_sheet("report", &columns, &[row], PageOrientation::Portrait, &extra);
        let doc = Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages().len() as u32;
        assert!(pages > 1);

        for page in 1..=pages {
            for (_, y, _) in text_runs(&doc, page) {
                assert!(y >= MARGIN, "text drawn below the bottom margin on page {}", page);
            }
        }

        let last: Vec<Vec<u8>> = text_runs(&doc, pages).into_iter().map(|run| run.2).collect();
        assert!(last.contains(&b"Key 79: value 79".to_vec()));
        assert!(last.contains(&b"ID".to_vec()));
        assert!(last.contains(&b"1".to_vec()));
    }

    #[test]
    fn test_long_title_is_truncated_to_page_width() {
        let title = "x".repeat(500);
        let bytes = render_sheet(&title, &[], &[], PageOrientation::Portrait, &BTreeMap::new());
        let doc = Document::load_mem(&bytes).unwrap();
        let runs = text_runs(&doc, 1);
        let max = max_chars(Paper::a4(PageOrientation::Portrait).width - 2.0 * MARGIN, TITLE_SIZE);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].2.len(), max);
        assert!(runs[0].2.ends_with(b"..."));
    }

    #[test]
    fn test_truncate_and_encoding() {
        assert_eq!(truncate("abcdef", 6), "abcdef");
        assert_eq!(truncate("abcdefgh", 6), "abc...");
        assert_eq!(win_ansi("a€☃"), vec![b'a', 0x80, b'?']);
    }
}
