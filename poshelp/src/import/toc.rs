//! Table-of-contents parsing.

use regex::Regex;
use serde::Serialize;

use super::backend::PdfDocument;
use crate::error::Result;

/// `Title ........ 12`
const DOTTED_LEADER: &str = r"^(.*?)\s*\.{3,}\s*(\d{1,3})$";

/// `Title        12`
const SPACED_LEADER: &str = r"^(.*?)\s{2,}(\d{1,3})$";

/// One table-of-contents line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct TocEntry {
    /// Section title.
    pub title: String,
    /// 1-based start page.
    pub page: u32,
}

impl TocEntry {
    /// Create an entry.
    pub fn new(title: impl Into<String>, page: u32) -> Self {
        Self {
            title: title.into(),
            page,
        }
    }
}

/// Recognizes `title … page` lines.
#[derive(Debug, Clone)]
pub struct TocParser {
    /// Dotted leader pattern, tried first.
    dotted: Regex,
    /// Wide-gap pattern.
    spaced: Regex,
}

impl TocParser {
    /// Compile the line patterns.
    pub fn new() -> Result<Self> {
        Ok(Self {
            dotted: Regex::new(DOTTED_LEADER)?,
            spaced: Regex::new(SPACED_LEADER)?,
        })
    }

    /// Parse one line.
    pub fn parse_line(&self, line: &str) -> Option<TocEntry> {
        let line = line.trim();
        let caps = self
            .dotted
            .captures(line)
            .or_else(|| self.spaced.captures(line))?;
        let page = caps.get(2)?.as_str().parse().ok()?;
        Some(TocEntry::new(caps.get(1)?.as_str().trim(), page))
    }

    /// Parse every line that looks like a TOC entry, in order.
    pub fn parse<'a>(&self, lines: impl IntoIterator<Item = &'a str>) -> Vec<TocEntry> {
        lines.into_iter().filter_map(|l| self.parse_line(l)).collect()
    }

    /// Read the TOC from the first `scan_pages` pages.
    ///
    /// Native text is used when any page yields some; otherwise the pages
    /// are OCRed. Per-page failures are logged and skipped.
    pub fn extract(&self, doc: &dyn PdfDocument, scan_pages: u32) -> Vec<TocEntry> {
        let last = scan_pages.min(doc.page_count());
        let mut lines: Vec<String> = Vec::new();

        for page in 1..=last {
            match doc.page_text(page) {
                Ok(text) => lines.extend(text.lines().map(str::to_string)),
                Err(e) => tracing::warn!(page, error = %e, "TOC text extraction failed"),
            }
        }

        if lines.is_empty() {
            tracing::warn!("TOC text extraction found nothing, trying OCR");
            for page in 1..=last {
                match doc.ocr_page(page) {
                    Ok(text) => lines.extend(text.lines().map(str::to_string)),
                    Err(e) => tracing::warn!(page, error = %e, "OCR TOC extraction failed"),
                }
            }
        }

        self.parse(lines.iter().map(String::as_str))
    }
}

/// Page span of section `index`: up to the page before the next section,
/// or the last page for the final section.
pub fn section_pages(toc: &[TocEntry], index: usize, page_count: u32) -> std::ops::RangeInclusive<u32> {
    let start = toc[index].page;
    let end = toc
        .get(index + 1)
        .map_or(page_count, |next| next.page.saturating_sub(1));
    start..=end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_leader() {
        let parser = TocParser::new().unwrap();
        assert_eq!(
            parser.parse_line("Logging In ........... 5"),
            Some(TocEntry::new("Logging In", 5))
        );
        assert_eq!(
            parser.parse_line("  Void a Sale...12  "),
            Some(TocEntry::new("Void a Sale", 12))
        );
    }

    #[test]
    fn test_spaced_leader() {
        let parser = TocParser::new().unwrap();
        assert_eq!(
            parser.parse_line("Cash Drawer      27"),
            Some(TocEntry::new("Cash Drawer", 27))
        );
        assert_eq!(parser.parse_line("Cash Drawer 27"), None);
    }

    #[test]
    fn test_rejects_non_toc_lines() {
        let parser = TocParser::new().unwrap();
        assert_eq!(parser.parse_line("Table of Contents"), None);
        assert_eq!(parser.parse_line("Chapter .... 1234"), None);
        assert_eq!(parser.parse_line(""), None);
    }

    #[test]
    fn test_section_pages() {
        let toc = vec![
            TocEntry::new("A", 3),
            TocEntry::new("B", 5),
            TocEntry::new("C", 9),
        ];
        assert_eq!(section_pages(&toc, 0, 10), 3..=4);
        assert_eq!(section_pages(&toc, 1, 10), 5..=8);
        assert_eq!(section_pages(&toc, 2, 10), 9..=10);
    }
}
