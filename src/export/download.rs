use std::fs;
use std::path::{Path, PathBuf};

use super::ExportFormat;
use crate::error::Result;

/// A finished export, ready to hand to a transport as an attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub file_name: String,
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

impl Download {
    pub fn new(stem: &str, format: ExportFormat, bytes: Vec<u8>) -> Self {
        Self {
            file_name: format!("{}.{}", stem, format.extension()),
            format,
            bytes,
        }
    }

    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }

    /// Write the attachment into `dir`, returning the full path.
    ///
    /// Path separators in the file name are replaced so the file always lands
    /// directly inside `dir`.
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(safe_file_name(&self.file_name));
        fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

fn safe_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => "export".to_string(),
        _ => cleaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_and_content_type() {
        let download = Download::new("Users-Oct_19_2026-09_02", ExportFormat::Xlsx, vec![1, 2]);
        assert_eq!(download.file_name, "Users-Oct_19_2026-09_02.xlsx");
        assert_eq!(
            download.content_type(),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
    }

    #[test]
    fn test_save_to_stays_inside_dir() {
        let dir = tempfile::tempdir().unwrap();
        let download = Download::new("../escape/report", ExportFormat::Csv, b"ID\n1\n".to_vec());

        let path = download.save_to(dir.path()).unwrap();
        assert_eq!(path.parent().unwrap(), dir.path());
        assert_eq!(path.file_name().unwrap(), ".._escape_report.csv");
        assert_eq!(fs::read(&path).unwrap(), b"ID\n1\n");
    }
}
