mod native;
mod wkhtmltopdf;

pub use native::NativePdfEngine;
pub use wkhtmltopdf::WkhtmltopdfEngine;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use super::{html, Exporter, PageOrientation, Sheet};
use crate::error::{ExportError, Result};

/// A4 in PostScript points.
const A4_WIDTH: f32 = 595.28;
const A4_HEIGHT: f32 = 841.89;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paper {
    pub width: f32,
    pub height: f32,
    pub orientation: PageOrientation,
}

impl Paper {
    pub fn a4(orientation: PageOrientation) -> Self {
        let (width, height) = match orientation {
            PageOrientation::Portrait => (A4_WIDTH, A4_HEIGHT),
            PageOrientation::Landscape => (A4_HEIGHT, A4_WIDTH),
        };
        Self {
            width,
            height,
            orientation,
        }
    }
}

/// Input handed to a PDF engine: the sheet itself plus its HTML rendering.
pub struct PdfDocument<'a> {
    pub sheet: &'a Sheet<'a>,
    pub html: String,
    pub paper: Paper,
}

/// An HTML-to-PDF backend. Engines are interchangeable: only the renderer
/// differs, never the inputs or the shape of the result.
pub trait PdfEngine: Send + Sync {
    fn name(&self) -> &'static str;

    fn render(&self, document: &PdfDocument<'_>) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PdfEngineKind {
    #[default]
    Native,
    Wkhtmltopdf,
}

impl PdfEngineKind {
    pub fn build(self, wkhtmltopdf_binary: &Path) -> Box<dyn PdfEngine> {
        match self {
            Self::Native => Box::new(NativePdfEngine::new()),
            Self::Wkhtmltopdf => Box::new(WkhtmltopdfEngine::new(wkhtmltopdf_binary)),
        }
    }
}

impl fmt::Display for PdfEngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => write!(f, "native"),
            Self::Wkhtmltopdf => write!(f, "wkhtmltopdf"),
        }
    }
}

impl FromStr for PdfEngineKind {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" => Ok(Self::Native),
            "wkhtmltopdf" | "snappy" => Ok(Self::Wkhtmltopdf),
            _ => Err(ExportError::UnsupportedPdfEngine(s.to_string())),
        }
    }
}

pub struct PdfExporter {
    engine: Box<dyn PdfEngine>,
}

impl Default for PdfExporter {
    fn default() -> Self {
        Self::new(Box::new(NativePdfEngine::new()))
    }
}

impl PdfExporter {
    pub fn new(engine: Box<dyn PdfEngine>) -> Self {
        Self { engine }
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }
}

impl Exporter for PdfExporter {
    fn export(&self, sheet: &Sheet<'_>) -> Result<Vec<u8>> {
        let document = PdfDocument {
            sheet,
            html: html::render(sheet, None),
            paper: Paper::a4(sheet.orientation),
        };

        debug!(
            engine = self.engine.name(),
            orientation = %sheet.orientation,
            "Rendering PDF"
        );
        self.engine.render(&document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paper_orientation_swaps_dimensions() {
        let portrait = Paper::a4(PageOrientation::Portrait);
        let landscape = Paper::a4(PageOrientation::Landscape);
        assert!(portrait.height > portrait.width);
        assert_eq!(portrait.width, landscape.height);
        assert_eq!(portrait.height, landscape.width);
    }

    #[test]
    fn test_engine_kind_parsing() {
        assert_eq!("native".parse::<PdfEngineKind>().unwrap(), PdfEngineKind::Native);
        assert_eq!("snappy".parse::<PdfEngineKind>().unwrap(), PdfEngineKind::Wkhtmltopdf);
        assert!(matches!(
            "prince".parse::<PdfEngineKind>(),
            Err(ExportError::UnsupportedPdfEngine(_))
        ));
    }

    #[test]
    fn test_build_selects_engine() {
        let binary = Path::new("wkhtmltopdf");
        assert_eq!(PdfEngineKind::Native.build(binary).name(), "native");
        assert_eq!(PdfEngineKind::Wkhtmltopdf.build(binary).name(), "wkhtmltopdf");
    }
}
