//! The manual library: PDF sources and their extracted sections on disk.
//!
//! Layout under the resource folder:
//!
//! ```text
//! <resources>/<manual>.pdf
//! <resources>/images/<manual>/<slug>(<n>).png
//! <resources>/images/<manual>/<slug>(<n>).txt
//! <resources>/<type>_guideline.txt
//! ```

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{HelpError, Result};

/// One manual section page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct HelpEntry {
    /// Section title derived from the file name, uppercased.
    pub title: String,
    /// Extracted text of the page.
    pub body_text: String,
    /// Page image, relative to the resource folder.
    pub image_path: PathBuf,
}

impl HelpEntry {
    /// Create an entry.
    pub fn new(
        title: impl Into<String>,
        body_text: impl Into<String>,
        image_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            title: title.into(),
            body_text: body_text.into(),
            image_path: image_path.into(),
        }
    }
}

/// A PDF manual found in the resource folder.
#[derive(Debug, Clone, Serialize)]
#[non_exhaustive]
pub struct ManualInfo {
    /// Manual name (file stem).
    pub name: String,
    /// File name including extension.
    pub file_name: String,
    /// Full path of the PDF.
    pub pdf_path: PathBuf,
    /// Number of extracted section pages.
    pub sections: usize,
}

impl ManualInfo {
    /// Whether the manual has been imported.
    pub const fn is_imported(&self) -> bool {
        self.sections > 0
    }
}

/// Read access to manuals and their extracted sections.
#[derive(Debug, Clone)]
pub struct Library {
    /// Folder holding PDFs and generated output.
    resources: PathBuf,
    /// Folder holding one section folder per manual.
    images_root: PathBuf,
    /// Images folder name, used for entry image paths.
    images_dir: String,
    /// Guideline files per manual family.
    manual_types: Vec<crate::config::ManualType>,
}

impl Library {
    /// Create a library over the configured resource folder.
    pub fn new(config: &Config) -> Self {
        Self {
            resources: config.resources.clone(),
            images_root: config.images_root(),
            images_dir: config.images_dir.clone(),
            manual_types: config.manual_types.clone(),
        }
    }

    /// Resource folder.
    pub fn resources(&self) -> &Path {
        &self.resources
    }

    /// Section folder of a manual.
    pub fn manual_dir(&self, name: &str) -> PathBuf {
        self.images_root.join(name)
    }

    /// Resolve an entry's image path against the resource folder.
    pub fn image_file(&self, entry: &HelpEntry) -> PathBuf {
        self.resources.join(&entry.image_path)
    }

    /// List PDF manuals, sorted by file name.
    pub fn list_manuals(&self) -> Result<Vec<ManualInfo>> {
        let mut manuals: Vec<ManualInfo> = list_pdfs(&self.resources)?
            .into_iter()
            .filter_map(|pdf_path| {
                let name = pdf_path.file_stem()?.to_string_lossy().to_string();
                let file_name = pdf_path.file_name()?.to_string_lossy().to_string();
                let sections = count_sections(&self.manual_dir(&name));
                Some(ManualInfo {
                    name,
                    file_name,
                    pdf_path,
                    sections,
                })
            })
            .collect();
        manuals.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(manuals)
    }

    /// Resolve a manual by name or file name (case-insensitive).
    pub fn find_manual(&self, query: &str) -> Result<Option<ManualInfo>> {
        let wanted = query.trim();
        Ok(self.list_manuals()?.into_iter().find(|m| {
            m.name.eq_ignore_ascii_case(wanted) || m.file_name.eq_ignore_ascii_case(wanted)
        }))
    }

    /// Manual names resembling `query`, best first.
    pub fn suggest_manuals(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        let names: Vec<String> = self.list_manuals()?.into_iter().map(|m| m.name).collect();
        Ok(find_similar_names(&names, query, limit))
    }

    /// Load the extracted sections of a manual.
    ///
    /// Fails with [`HelpError::MissingManual`] when the section folder does
    /// not exist. A missing or unreadable text file yields an empty body.
    pub fn load_entries(&self, name: &str) -> Result<Vec<HelpEntry>> {
        let folder = self.manual_dir(name);
        if !folder.is_dir() {
            return Err(HelpError::MissingManual {
                name: name.to_string(),
            });
        }

        let mut images: Vec<PathBuf> = fs::read_dir(&folder)?
            .filter_map(std::result::Result::ok)
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "png"))
            .collect();
        images.sort_by(|a, b| compare_section_files(a, b));

        let mut entries = Vec::with_capacity(images.len());
        for image in images {
            let Some(file_name) = image.file_name().map(|f| f.to_string_lossy().to_string()) else {
                continue;
            };
            let stem = file_name.trim_end_matches(".png");
            let title = stem.replace('_', " ").to_uppercase();

            let text_path = image.with_extension("txt");
            let body_text = if text_path.exists() {
                match fs::read_to_string(&text_path) {
                    Ok(text) => text.trim().to_string(),
                    Err(e) => {
                        tracing::warn!(path = %text_path.display(), error = %e, "could not read section text");
                        String::new()
                    }
                }
            } else {
                String::new()
            };

            let image_path = Path::new(&self.images_dir).join(name).join(&file_name);
            entries.push(HelpEntry {
                title,
                body_text,
                image_path,
            });
        }

        tracing::info!(manual = name, entries = entries.len(), "loaded help entries");
        Ok(entries)
    }

    /// Guideline text for a manual, if one was generated.
    ///
    /// Looks for `<manual>_guideline.txt` (lowercased, spaces to `_`), then
    /// for the guideline file of the manual's family.
    pub fn guideline(&self, name: &str) -> Result<Option<String>> {
        let own = format!("{}_guideline.txt", name.to_lowercase().replace(' ', "_"));
        let mut candidates = vec![self.resources.join(own)];
        if let Some(kind) = self.manual_types.iter().find(|t| t.matches(name)) {
            candidates.push(self.resources.join(&kind.guideline));
        }

        for path in candidates {
            if path.is_file() {
                let content = fs::read_to_string(&path)?;
                return Ok(Some(content.trim().to_string()));
            }
        }

        tracing::debug!(manual = name, "guideline file not found");
        Ok(None)
    }
}

/// PDF files directly inside `dir` (extension matched case-insensitively).
pub fn list_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let pattern = format!(
        "{}/*.pdf",
        glob::Pattern::escape(&dir.to_string_lossy())
    );
    let options = glob::MatchOptions {
        case_sensitive: false,
        ..glob::MatchOptions::default()
    };

    let mut pdfs = Vec::new();
    for entry in glob::glob_with(&pattern, options)? {
        let path = entry?;
        if path.is_file() {
            pdfs.push(path);
        }
    }
    pdfs.sort();
    Ok(pdfs)
}

/// Count section images in a manual folder.
fn count_sections(folder: &Path) -> usize {
    if !folder.is_dir() {
        return 0;
    }
    WalkDir::new(folder)
        .max_depth(1)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "png"))
        .count()
}

/// Split a section stem `slug(n)_alt...` into its ordering parts.
fn section_key(stem: &str) -> (&str, usize, &str) {
    if let Some(open) = stem.rfind('(') {
        let rest = &stem[open + 1..];
        if let Some(close) = rest.find(')') {
            if let Ok(n) = rest[..close].parse::<usize>() {
                return (&stem[..open], n, &rest[close + 1..]);
            }
        }
    }
    (stem, 0, "")
}

/// Order section files by slug, then page index, then suffix.
fn compare_section_files(a: &Path, b: &Path) -> Ordering {
    let a_stem = a.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let b_stem = b.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    section_key(&a_stem).cmp(&section_key(&b_stem))
}

/// Fuzzy-rank `names` against `query`.
pub fn find_similar_names(names: &[String], query: &str, limit: usize) -> Vec<String> {
    let matcher = SkimMatcherV2::default();
    let mut scored: Vec<(i64, &String)> = names
        .iter()
        .filter_map(|n| matcher.fuzzy_match(n, query).map(|s| (s, n)))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().take(limit).map(|(_, n)| n.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library(dir: &Path) -> Library {
        let config = Config {
            resources: dir.to_path_buf(),
            ..Config::default()
        };
        Library::new(&config)
    }

    #[test]
    fn test_section_key() {
        assert_eq!(section_key("void_sale(2)"), ("void_sale", 2, ""));
        assert_eq!(section_key("void_sale(1)_alt_alt"), ("void_sale", 1, "_alt_alt"));
        assert_eq!(section_key("cover"), ("cover", 0, ""));
    }

    #[test]
    fn test_load_entries_orders_pages_numerically() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("images").join("Retail Manual");
        fs::create_dir_all(&folder).unwrap();
        for stem in ["login(10)", "login(2)", "cash_drawer(1)", "login(1)"] {
            fs::write(folder.join(format!("{stem}.png")), b"png").unwrap();
        }
        fs::write(folder.join("login(2).txt"), "  second page  \n").unwrap();

        let entries = library(dir.path()).load_entries("Retail Manual").unwrap();
        let titles: Vec<&str> = entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["CASH DRAWER(1)", "LOGIN(1)", "LOGIN(2)", "LOGIN(10)"]);
        assert_eq!(entries[2].body_text, "second page");
        assert_eq!(entries[1].body_text, "");
        assert_eq!(
            entries[0].image_path,
            Path::new("images").join("Retail Manual").join("cash_drawer(1).png")
        );
    }

    #[test]
    fn test_missing_manual_folder() {
        let dir = tempfile::tempdir().unwrap();
        let err = library(dir.path()).load_entries("Nope").unwrap_err();
        assert!(matches!(err, HelpError::MissingManual { ref name } if name == "Nope"));
    }

    #[test]
    fn test_list_manuals_case_insensitive_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b_manual.PDF"), b"%PDF").unwrap();
        fs::write(dir.path().join("a_manual.pdf"), b"%PDF").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        let folder = dir.path().join("images").join("a_manual");
        fs::create_dir_all(&folder).unwrap();
        fs::write(folder.join("intro(1).png"), b"png").unwrap();
        fs::write(folder.join("intro(1).txt"), b"txt").unwrap();

        let manuals = library(dir.path()).list_manuals().unwrap();
        let names: Vec<&str> = manuals.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["a_manual", "b_manual"]);
        assert_eq!(manuals[0].sections, 1);
        assert!(manuals[0].is_imported());
        assert!(!manuals[1].is_imported());
    }

    #[test]
    fn test_guideline_lookup_prefers_own_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("retail_guideline.txt"), "• Login\n").unwrap();
        let lib = library(dir.path());

        assert_eq!(lib.guideline("Retail Store").unwrap().as_deref(), Some("• Login"));
        fs::write(dir.path().join("retail_store_guideline.txt"), "• Own\n").unwrap();
        assert_eq!(lib.guideline("Retail Store").unwrap().as_deref(), Some("• Own"));
        assert_eq!(lib.guideline("Kitchen").unwrap(), None);
    }

    #[test]
    fn test_find_similar_names() {
        let names = vec!["Retail Manual".to_string(), "POSWeb Guide".to_string()];
        assert_eq!(
            find_similar_names(&names, "retail", 3),
            vec!["Retail Manual".to_string()]
        );
        assert_eq!(find_similar_names(&names, "posweb", 3), vec!["POSWeb Guide".to_string()]);
    }
}
