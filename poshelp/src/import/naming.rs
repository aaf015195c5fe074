//! File naming and text layout for extracted sections.

use std::collections::HashSet;

/// Suffix appended while a section file stem is already taken.
const COLLISION_SUFFIX: &str = "_alt";

/// Turn a section title into a file-name slug.
///
/// Keeps word characters, whitespace and `-`; trims; lowercases; spaces
/// become `_`; runs of `_` collapse to one.
pub fn clean_filename(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();
    let lowered = kept.trim().to_lowercase().replace(' ', "_");

    let mut slug = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        if c == '_' && slug.ends_with('_') {
            continue;
        }
        slug.push(c);
    }
    slug
}

/// Hands out unique file stems within one manual.
#[derive(Debug, Default)]
pub struct FileNamer {
    /// Stems already handed out.
    used: HashSet<String>,
}

impl FileNamer {
    /// Namer with nothing used.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stem for page `page_index` (1-based) of a section slug.
    pub fn claim(&mut self, slug: &str, page_index: usize) -> String {
        let mut stem = format!("{slug}({page_index})");
        while self.used.contains(&stem) {
            stem.push_str(COLLISION_SUFFIX);
        }
        self.used.insert(stem.clone());
        stem
    }
}

/// Some cased character and none lowercase.
fn is_all_upper(line: &str) -> bool {
    let mut cased = false;
    for c in line.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}

/// One-line description of a page for the `[GUIDELINE]` header.
pub fn helpful_summary(text: &str) -> String {
    if text.is_empty() {
        return "This page contains general POS instructions.".to_string();
    }
    text.trim()
        .lines()
        .map(str::trim)
        .find(|line| line.split_whitespace().count() > 3 && !is_all_upper(line))
        .map_or_else(
            || "This section contains important POS instructions.".to_string(),
            |line| format!("This section explains: {line}"),
        )
}

/// Content of a section text file.
pub fn section_text(title: &str, text: &str) -> String {
    let summary = helpful_summary(text);
    if text.is_empty() {
        format!("[GUIDELINE] {summary}\n\n{title}")
    } else {
        format!("[GUIDELINE] {summary}\n\n{title}\n\n{}", text.trim())
    }
}
