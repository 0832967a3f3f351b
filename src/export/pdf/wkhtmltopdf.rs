use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use tracing::debug;

use super::{PdfDocument, PdfEngine};
use crate::error::{ExportError, Result};
use crate::export::PageOrientation;

/// High-fidelity engine: pipes the HTML view through the `wkhtmltopdf` binary.
pub struct WkhtmltopdfEngine {
    binary: PathBuf,
}

impl WkhtmltopdfEngine {
    pub fn new(binary: impl AsRef<Path>) -> Self {
        Self {
            binary: binary.as_ref().to_path_buf(),
        }
    }

    fn failure(&self, message: impl Into<String>) -> ExportError {
        ExportError::PdfRender {
            engine: self.name(),
            message: message.into(),
        }
    }
}

impl PdfEngine for WkhtmltopdfEngine {
    fn name(&self) -> &'static str {
        "wkhtmltopdf"
    }

    fn render(&self, document: &PdfDocument<'_>) -> Result<Vec<u8>> {
        let orientation = match document.paper.orientation {
            PageOrientation::Portrait => "Portrait",
            PageOrientation::Landscape => "Landscape",
        };

        debug!(binary = %self.binary.display(), orientation, "Spawning wkhtmltopdf");

        let mut child = Command::new(&self.binary)
            .args(["--quiet", "--encoding", "utf-8", "--page-size", "A4"])
            .args(["--orientation", orientation])
            .args(["-", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.failure(format!("failed to start {}: {}", self.binary.display(), e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| self.failure("stdin was not captured"))?;

        // Feed stdin from a second thread so a full stdout pipe cannot stall us.
        let html = document.html.as_bytes();
        let (written, output) = thread::scope(|scope| {
            let feeder = scope.spawn(move || {
                let result = stdin.write_all(html);
                drop(stdin);
                result
            });
            let output = child.wait_with_output();
            (feeder.join(), output)
        });

        let output = output.map_err(|e| self.failure(format!("failed to collect output: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = match stderr.trim() {
                "" => format!("exited with {}", output.status),
                detail => format!("exited with {}: {}", output.status, detail),
            };
            return Err(self.failure(message));
        }

        match written {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(self.failure(format!("failed to write HTML: {}", e))),
            Err(_) => return Err(self.failure("HTML writer thread panicked")),
        }

        if output.stdout.is_empty() {
            return Err(self.failure("produced no output"));
        }

        Ok(output.stdout)
    }
}
