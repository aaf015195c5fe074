//! Error types for poshelp.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for poshelp operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HelpError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid glob pattern.
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Invalid regular expression.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// Failure while walking a glob result.
    #[error("Glob error: {0}")]
    Glob(#[from] glob::GlobError),

    /// PDF could not be opened or read.
    #[error("PDF error in {}: {message}", path.display())]
    Pdf {
        /// PDF being read.
        path: PathBuf,
        /// Backend message.
        message: String,
    },

    /// An external tool (pdftoppm, tesseract) failed.
    #[error("{tool} failed: {message}")]
    Tool {
        /// Tool name.
        tool: String,
        /// Captured stderr or spawn error.
        message: String,
    },

    /// The selected manual has no extracted section folder.
    #[error("No extracted images found for '{name}'")]
    MissingManual {
        /// Manual name (PDF stem).
        name: String,
    },

    /// A query was submitted with no text.
    #[error("Please enter a help topic")]
    EmptyQuery,

    /// No manual selected yet.
    #[error("No manual selected")]
    NoManualSelected,

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias for poshelp operations.
pub type Result<T> = std::result::Result<T, HelpError>;
