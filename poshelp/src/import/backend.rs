//! PDF access used by the importer.
//!
//! Native text and page counts come from `lopdf`. Rendering shells out to
//! `pdftoppm` (poppler) and OCR to `tesseract`.

use std::path::{Path, PathBuf};
use std::process::Command;

use lopdf::Document;

use crate::config::Config;
use crate::error::{HelpError, Result};

/// Opens PDF files.
pub trait PdfBackend {
    /// Open a PDF for page-level access.
    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>>;
}

/// Page-level access to one open PDF. Pages are 1-based.
pub trait PdfDocument {
    /// Number of pages.
    fn page_count(&self) -> u32;

    /// Embedded text of a page; empty when the page has none.
    fn page_text(&self, page: u32) -> Result<String>;

    /// Text of a page recognized from its rendered image.
    fn ocr_page(&self, page: u32) -> Result<String>;

    /// Render a page to a PNG file at `dest`.
    fn render_page(&self, page: u32, dest: &Path) -> Result<()>;
}

/// External tool settings shared by open documents.
#[derive(Debug, Clone)]
pub struct ToolBackend {
    /// `pdftoppm` executable.
    pdftoppm: PathBuf,
    /// `tesseract` executable.
    tesseract: PathBuf,
    /// Render resolution.
    dpi: u32,
    /// Tesseract language.
    language: String,
}

impl ToolBackend {
    /// Backend configured from `config`.
    pub fn from_config(config: &Config) -> Self {
        Self {
            pdftoppm: config.pdftoppm.clone(),
            tesseract: config.tesseract.clone(),
            dpi: config.render_dpi,
            language: config.ocr_language.clone(),
        }
    }

    /// Names of configured tools that cannot be started.
    pub fn missing_tools(&self) -> Vec<String> {
        let probes = [(&self.pdftoppm, "-v"), (&self.tesseract, "--version")];
        probes
            .into_iter()
            .filter(|(tool, flag)| Command::new(tool).arg(flag).output().is_err())
            .map(|(tool, _)| tool.display().to_string())
            .collect()
    }

    /// Render one page with `pdftoppm` to exactly `dest`.
    fn render(&self, pdf: &Path, page: u32, dest: &Path, gray: bool) -> Result<()> {
        // pdftoppm appends ".png" to the output prefix itself.
        let prefix = dest.with_extension("");
        let mut cmd = Command::new(&self.pdftoppm);
        cmd.arg("-png")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-f")
            .arg(page.to_string())
            .arg("-l")
            .arg(page.to_string())
            .arg("-singlefile");
        if gray {
            cmd.arg("-gray");
        }
        let output = cmd.arg(pdf).arg(&prefix).output().map_err(|e| HelpError::Tool {
            tool: "pdftoppm".to_string(),
            message: e.to_string(),
        })?;

        if !output.status.success() {
            return Err(HelpError::Tool {
                tool: "pdftoppm".to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    /// Run `tesseract` on an image and return the recognized text.
    fn recognize(&self, image: &Path) -> Result<String> {
        let output = Command::new(&self.tesseract)
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .map_err(|e| HelpError::Tool {
                tool: "tesseract".to_string(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(HelpError::Tool {
                tool: "tesseract".to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl PdfBackend for ToolBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>> {
        let doc = Document::load(path).map_err(|e| HelpError::Pdf {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let pages = u32::try_from(doc.get_pages().len()).unwrap_or(u32::MAX);
        tracing::debug!(path = %path.display(), pages, "opened PDF");

        Ok(Box::new(ToolDocument {
            path: path.to_path_buf(),
            doc,
            pages,
            tools: self.clone(),
        }))
    }
}

/// A PDF opened through [`ToolBackend`].
struct ToolDocument {
    /// Source file, passed to the external tools.
    path: PathBuf,
    /// Parsed document.
    doc: Document,
    /// Page count.
    pages: u32,
    /// Tool settings.
    tools: ToolBackend,
}

impl PdfDocument for ToolDocument {
    fn page_count(&self) -> u32 {
        self.pages
    }

    fn page_text(&self, page: u32) -> Result<String> {
        self.doc.extract_text(&[page]).map_err(|e| HelpError::Pdf {
            path: self.path.clone(),
            message: format!("page {page}: {e}"),
        })
    }

    fn ocr_page(&self, page: u32) -> Result<String> {
        let scratch = tempfile::tempdir()?;
        let image = scratch.path().join("page.png");
        self.tools.render(&self.path, page, &image, true)?;
        self.tools.recognize(&image)
    }

    fn render_page(&self, page: u32, dest: &Path) -> Result<()> {
        self.tools.render(&self.path, page, dest, false)
    }
}
