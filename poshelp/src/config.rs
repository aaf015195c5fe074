//! Configuration loading.
//!
//! Settings live in `<config_dir>/poshelp/config.yml`. Every field has a
//! default, so a missing file is the same as an empty one.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HelpError, Result};

/// Configuration file name inside the config directory.
const CONFIG_FILE: &str = "config.yml";

/// Application directory name under the platform config dir.
const APP_DIR: &str = "poshelp";

/// A manual family recognized by a keyword in its file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct ManualType {
    /// Keyword searched (case-insensitively) in the manual name.
    pub keyword: String,
    /// Guideline file written into the resource folder.
    pub guideline: String,
}

impl ManualType {
    /// Create a manual type.
    pub fn new(keyword: impl Into<String>, guideline: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            guideline: guideline.into(),
        }
    }

    /// Whether a manual name belongs to this family.
    pub fn matches(&self, manual_name: &str) -> bool {
        manual_name
            .to_uppercase()
            .contains(&self.keyword.to_uppercase())
    }
}

/// Runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct Config {
    /// Folder holding the PDF manuals and all generated output.
    pub resources: PathBuf,
    /// Sub-folder of `resources` receiving per-manual sections.
    pub images_dir: String,
    /// Artificial "typing" delay before a reply, in milliseconds.
    pub typing_delay_ms: u64,
    /// Similarity ratio a title must exceed to match without a substring hit.
    pub match_threshold: f64,
    /// Leading pages scanned for a table of contents.
    pub toc_scan_pages: u32,
    /// Page render resolution.
    pub render_dpi: u32,
    /// `pdftoppm` executable.
    pub pdftoppm: PathBuf,
    /// `tesseract` executable.
    pub tesseract: PathBuf,
    /// Tesseract language code.
    pub ocr_language: String,
    /// Recognized manual families and their guideline files.
    pub manual_types: Vec<ManualType>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resources: PathBuf::from("res"),
            images_dir: "images".to_string(),
            typing_delay_ms: 1000,
            match_threshold: 0.6,
            toc_scan_pages: 8,
            render_dpi: 200,
            pdftoppm: PathBuf::from("pdftoppm"),
            tesseract: PathBuf::from("tesseract"),
            ocr_language: "eng".to_string(),
            manual_types: vec![
                ManualType::new("RETAIL", "retail_guideline.txt"),
                ManualType::new("POSWEB", "posweb_guideline.txt"),
            ],
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default location.
    ///
    /// An explicit path must exist; the default location may be absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match default_config_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            if required {
                return Err(HelpError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Reject values the matcher and importer cannot work with.
    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.match_threshold) {
            return Err(HelpError::Config(format!(
                "match_threshold must be within 0..=1, got {}",
                self.match_threshold
            )));
        }
        if self.render_dpi == 0 {
            return Err(HelpError::Config("render_dpi must be positive".to_string()));
        }
        Ok(())
    }

    /// Folder receiving one sub-folder of sections per manual.
    pub fn images_root(&self) -> PathBuf {
        self.resources.join(&self.images_dir)
    }

    /// Typing delay as a duration.
    pub const fn typing_delay(&self) -> Duration {
        Duration::from_millis(self.typing_delay_ms)
    }

    /// Manual family for a manual name, if any.
    pub fn manual_type(&self, manual_name: &str) -> Option<&ManualType> {
        self.manual_types.iter().find(|t| t.matches(manual_name))
    }
}

/// Default configuration file location.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: Config = serde_yaml::from_str("typing_delay_ms: 0\nresources: manuals\n").unwrap();
        assert_eq!(config.typing_delay_ms, 0);
        assert_eq!(config.resources, PathBuf::from("manuals"));
        assert_eq!(config.toc_scan_pages, 8);
        assert_eq!(config.images_root(), PathBuf::from("manuals").join("images"));
    }

    #[test]
    fn test_manual_type_lookup() {
        let config = Config::default();
        assert_eq!(
            config.manual_type("Retail POS Manual").map(|t| t.guideline.as_str()),
            Some("retail_guideline.txt")
        );
        assert_eq!(
            config.manual_type("posweb_v2").map(|t| t.guideline.as_str()),
            Some("posweb_guideline.txt")
        );
        assert!(config.manual_type("Kitchen Display").is_none());
    }

    #[test]
    fn test_explicit_missing_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yml");
        assert!(matches!(
            Config::load(Some(&missing)),
            Err(HelpError::Config(_))
        ));
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, "match_threshold: 1.5\n").unwrap();
        assert!(matches!(Config::load(Some(&path)), Err(HelpError::Config(_))));
    }
}
