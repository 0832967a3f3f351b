use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::export::{ExportFormat, PageOrientation, PdfEngineKind};

/// Process-wide export defaults, read once per export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub default_format: String,
    /// chrono format used for automatic file names.
    pub time_format: String,
    pub default_page_orientation: String,
    pub csv_delimiter: char,
    pub disable_additional_columns: bool,
    pub disable_filter_columns: bool,
    pub disable_file_name: bool,
    pub disable_file_name_prefix: bool,
    pub disable_preview: bool,
    /// Render PDFs through wkhtmltopdf instead of the built-in engine.
    pub use_snappy: bool,
    pub wkhtmltopdf_binary: PathBuf,
    pub preview_per_page: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_format: "xlsx".to_string(),
            time_format: "%b_%d_%Y-%H_%M".to_string(),
            default_page_orientation: "portrait".to_string(),
            csv_delimiter: ',',
            disable_additional_columns: false,
            disable_filter_columns: false,
            disable_file_name: false,
            disable_file_name_prefix: false,
            disable_preview: false,
            use_snappy: false,
            wkhtmltopdf_binary: PathBuf::from("wkhtmltopdf"),
            preview_per_page: 10,
        }
    }
}

impl ExportConfig {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Missing files yield the defaults; unreadable or malformed ones are errors.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;

        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "table-export", "table-export")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(proj_dirs.config_dir().join("config.json"))
    }

    pub fn pdf_engine(&self) -> PdfEngineKind {
        if self.use_snappy {
            PdfEngineKind::Wkhtmltopdf
        } else {
            PdfEngineKind::Native
        }
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.default_format.parse::<ExportFormat>().is_err() {
            errors.push(format!(
                "Default format '{}' is not one of csv, xlsx, pdf",
                self.default_format
            ));
        }

        if self.default_page_orientation.parse::<PageOrientation>().is_err() {
            errors.push(format!(
                "Default page orientation '{}' is not portrait or landscape",
                self.default_page_orientation
            ));
        }

        if !self.csv_delimiter.is_ascii() {
            errors.push(format!(
                "CSV delimiter {:?} must be a single ASCII character",
                self.csv_delimiter
            ));
        }

        if self.time_format.trim().is_empty() {
            errors.push("Time format is required".to_string());
        }

        if self.preview_per_page == 0 {
            errors.push("Preview page size must be at least 1".to_string());
        }

        errors
    }
}
