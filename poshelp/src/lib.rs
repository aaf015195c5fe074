//! poshelp - help chat for point-of-sale PDF manuals
//!
//! Imports PDF manuals into per-section page images and text files, then
//! answers free-text questions by matching them against section titles.
//!
//! ## Features
//!
//! - Table-of-contents driven import with OCR fallback
//! - Ratcliff/Obershelp title similarity with substring matching
//! - Multi-step answers paged with `continue`
//! - Per-manual guideline summaries

pub mod cli;
pub mod config;
pub mod conversation;
pub mod error;
pub mod formatter;
pub mod import;
pub mod library;
pub mod matcher;
pub mod scheduler;

pub use cli::{Cli, Commands, OutputFormat};
pub use config::{Config, ManualType};
pub use conversation::{
    BotMessage, CONTINUE_COMMAND, ChatSession, HistoryLog, StepController, StepSequence,
    is_continue,
};
pub use error::{HelpError, Result};
pub use import::{ImportEvent, ImportReport, Importer, PdfBackend, PdfDocument, ToolBackend};
pub use library::{HelpEntry, Library, ManualInfo};
pub use matcher::{DEFAULT_THRESHOLD, Hit, TopicMatch, match_topic, normalize, similarity};
pub use scheduler::EventQueue;
