//! One-shot import of PDF manuals into per-section images and text files.
//!
//! Every PDF in the resource folder that has no non-empty section folder yet
//! is split along its table of contents. Failures on one page, section or
//! manual are logged and the import moves on.

pub mod backend;
pub mod naming;
pub mod toc;

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

pub use backend::{PdfBackend, PdfDocument, ToolBackend};
pub use naming::{FileNamer, clean_filename, helpful_summary, section_text};
pub use toc::{TocEntry, TocParser, section_pages};

use crate::config::{Config, ManualType};
use crate::error::Result;
use crate::library::list_pdfs;

/// Progress notifications emitted while importing.
#[derive(Debug, Clone, Copy)]
#[non_exhaustive]
pub enum ImportEvent<'a> {
    /// A manual is about to be processed.
    Started {
        /// Manual name.
        manual: &'a str,
        /// 1-based position among all PDFs.
        position: usize,
        /// Number of PDFs found.
        total: usize,
    },
    /// A manual already had output and was left alone.
    Skipped {
        /// Manual name.
        manual: &'a str,
    },
    /// A section page was written.
    PageWritten {
        /// Manual name.
        manual: &'a str,
        /// File stem of the page.
        stem: &'a str,
    },
}

/// A manual that could not be processed at all.
#[derive(Debug, Clone, Serialize)]
#[non_exhaustive]
pub struct ManualFailure {
    /// Manual name.
    pub manual: String,
    /// Error description.
    pub error: String,
}

/// Outcome of an import run.
#[derive(Debug, Clone, Default, Serialize)]
#[non_exhaustive]
pub struct ImportReport {
    /// Manuals that were split.
    pub processed: Vec<String>,
    /// Manuals skipped because output already existed.
    pub skipped: Vec<String>,
    /// Manuals that could not be opened.
    pub failed: Vec<ManualFailure>,
    /// Page images written.
    pub images_written: usize,
    /// Section text files written.
    pub texts_written: usize,
    /// Page-level failures (render, extraction, write).
    pub page_failures: usize,
    /// Guideline files written.
    pub guidelines: Vec<PathBuf>,
}

/// Converts PDF manuals into the section layout read by the library.
#[derive(Debug)]
pub struct Importer<'a, B: PdfBackend + ?Sized> {
    /// Paths and limits.
    config: &'a Config,
    /// PDF access.
    backend: &'a B,
    /// TOC line recognizer.
    toc: TocParser,
}

impl<'a, B: PdfBackend + ?Sized> Importer<'a, B> {
    /// Importer over `config.resources` using `backend`.
    pub fn new(config: &'a Config, backend: &'a B) -> Result<Self> {
        Ok(Self {
            config,
            backend,
            toc: TocParser::new()?,
        })
    }

    /// Import every unprocessed PDF, then write guideline files.
    pub fn run(&self, mut on_event: impl FnMut(ImportEvent<'_>)) -> Result<ImportReport> {
        let pdfs = list_pdfs(&self.config.resources)?;
        let mut report = ImportReport::default();

        if pdfs.is_empty() {
            tracing::info!(resources = %self.config.resources.display(), "no PDF files found");
            return Ok(report);
        }

        let images_root = self.config.images_root();
        let mut titles_by_manual: Vec<(String, Vec<String>)> = Vec::new();

        for (i, pdf) in pdfs.iter().enumerate() {
            let Some(manual) = pdf.file_stem().map(|s| s.to_string_lossy().to_string()) else {
                continue;
            };
            let output_dir = images_root.join(&manual);

            if has_output(&output_dir) {
                tracing::info!(manual = %manual, "skipping already processed manual");
                on_event(ImportEvent::Skipped { manual: &manual });
                report.skipped.push(manual);
                continue;
            }

            on_event(ImportEvent::Started {
                manual: &manual,
                position: i + 1,
                total: pdfs.len(),
            });
            tracing::info!(manual = %manual, "processing PDF");

            match self.import_manual(pdf, &manual, &output_dir, &mut report, &mut on_event) {
                Ok(titles) => {
                    titles_by_manual.push((manual.clone(), titles));
                    report.processed.push(manual);
                }
                Err(e) => {
                    tracing::warn!(manual = %manual, error = %e, "failed to read PDF");
                    report.failed.push(ManualFailure {
                        manual,
                        error: e.to_string(),
                    });
                }
            }
        }

        report.guidelines = write_guidelines(
            &self.config.resources,
            &self.config.manual_types,
            &titles_by_manual,
        );

        tracing::info!(
            processed = report.processed.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "finished import"
        );
        Ok(report)
    }

    /// Split one manual; returns every TOC title seen.
    fn import_manual(
        &self,
        pdf: &Path,
        manual: &str,
        output_dir: &Path,
        report: &mut ImportReport,
        on_event: &mut impl FnMut(ImportEvent<'_>),
    ) -> Result<Vec<String>> {
        fs::create_dir_all(output_dir)?;
        let doc = self.backend.open(pdf)?;
        let page_count = doc.page_count();

        let toc = self.toc.extract(doc.as_ref(), self.config.toc_scan_pages);
        if toc.is_empty() {
            tracing::warn!(manual, "no TOC entries found");
            return Ok(Vec::new());
        }

        let mut namer = FileNamer::new();
        let mut titles = Vec::with_capacity(toc.len());

        for (index, entry) in toc.iter().enumerate() {
            let slug = clean_filename(&entry.title);
            titles.push(entry.title.clone());

            for (j, page) in section_pages(&toc, index, page_count).enumerate() {
                if page < 1 || page > page_count {
                    continue;
                }
                let stem = namer.claim(&slug, j + 1);
                self.write_page(doc.as_ref(), page, &entry.title, output_dir, &stem, report);
                on_event(ImportEvent::PageWritten {
                    manual,
                    stem: &stem,
                });
            }
        }

        Ok(titles)
    }

    /// Write the image and text file of one page; failures are counted.
    fn write_page(
        &self,
        doc: &dyn PdfDocument,
        page: u32,
        title: &str,
        output_dir: &Path,
        stem: &str,
        report: &mut ImportReport,
    ) {
        let image_path = output_dir.join(format!("{stem}.png"));
        match doc.render_page(page, &image_path) {
            Ok(()) => {
                tracing::debug!(path = %image_path.display(), "saved image");
                report.images_written += 1;
            }
            Err(e) => {
                tracing::warn!(path = %image_path.display(), error = %e, "failed to save image");
                report.page_failures += 1;
            }
        }

        let text_path = output_dir.join(format!("{stem}.txt"));
        let text = match page_text_or_ocr(doc, page) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(page, error = %e, "failed to extract text");
                report.page_failures += 1;
                return;
            }
        };

        match fs::write(&text_path, section_text(title, &text)) {
            Ok(()) => {
                tracing::debug!(path = %text_path.display(), "saved text");
                report.texts_written += 1;
            }
            Err(e) => {
                tracing::warn!(path = %text_path.display(), error = %e, "failed to save text");
                report.page_failures += 1;
            }
        }
    }
}

/// Native page text, or OCR when the page has none.
fn page_text_or_ocr(doc: &dyn PdfDocument, page: u32) -> Result<String> {
    let text = match doc.page_text(page) {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!(page, error = %e, "native text failed, using OCR");
            String::new()
        }
    };
    if text.is_empty() {
        return doc.ocr_page(page);
    }
    Ok(text)
}

/// Whether a section folder exists with something in it.
fn has_output(dir: &Path) -> bool {
    fs::read_dir(dir).is_ok_and(|mut entries| entries.next().is_some())
}

/// Write one deduplicated title list per recognized manual type.
///
/// Manuals of unknown type and manuals without titles are skipped.
pub fn write_guidelines(
    resources: &Path,
    types: &[ManualType],
    titles_by_manual: &[(String, Vec<String>)],
) -> Vec<PathBuf> {
    let mut written = Vec::new();

    for (manual, titles) in titles_by_manual {
        let Some(kind) = types.iter().find(|t| t.matches(manual)) else {
            tracing::debug!(manual = %manual, "unknown manual type, no guideline");
            continue;
        };
        if titles.is_empty() {
            continue;
        }

        let mut seen = std::collections::HashSet::new();
        let content: String = titles
            .iter()
            .filter(|t| seen.insert(t.as_str()))
            .map(|t| format!("• {}\n", t.trim()))
            .collect();

        let path = resources.join(&kind.guideline);
        match fs::write(&path, content) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "saved guideline");
                written.push(path);
            }
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to save guideline"),
        }
    }

    written
}
