//! Conversation state: step sequences, query history and the chat session.
//!
//! A topic query builds a [`StepSequence`] from the matcher output and shows
//! its first entry right away. `continue` shows the next entry until the
//! sequence is exhausted; after that it does nothing.

use std::collections::HashSet;

use serde::Serialize;

use crate::config::Config;
use crate::error::{HelpError, Result};
use crate::library::{HelpEntry, Library};
use crate::matcher::{match_topic, normalize};

/// Reserved command that advances a multi-step result.
pub const CONTINUE_COMMAND: &str = "continue";

/// Whether a raw input is the `continue` command.
pub fn is_continue(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case(CONTINUE_COMMAND)
}

/// Ordered result of one query, paged with `continue`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepSequence {
    /// Entries in display order.
    entries: Vec<HelpEntry>,
    /// Number of entries already shown; always within `0..=entries.len()`.
    cursor: usize,
}

impl StepSequence {
    /// Create a sequence with nothing shown yet.
    pub const fn new(entries: Vec<HelpEntry>) -> Self {
        Self { entries, cursor: 0 }
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the sequence has no steps.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Steps shown so far.
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether unshown steps remain.
    pub fn has_next(&self) -> bool {
        self.cursor < self.entries.len()
    }

    /// Show the next step, advancing the cursor.
    pub fn advance(&mut self) -> Option<&HelpEntry> {
        let entry = self.entries.get(self.cursor)?;
        self.cursor += 1;
        Some(entry)
    }
}

/// Queries asked during one manual selection.
#[derive(Debug, Clone, Default)]
pub struct HistoryLog {
    /// Normalized forms already present.
    seen: HashSet<String>,
    /// Display items in insertion order.
    items: Vec<String>,
}

impl HistoryLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `text` unless its lowercased, trimmed form is already present.
    ///
    /// Returns whether it was added.
    pub fn record(&mut self, text: &str) -> bool {
        let key = text.trim().to_lowercase();
        if key.is_empty() || !self.seen.insert(key) {
            return false;
        }
        self.items.push(text.trim().to_string());
        true
    }

    /// Display items in insertion order.
    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Item by 1-based position.
    pub fn get(&self, position: usize) -> Option<&str> {
        position
            .checked_sub(1)
            .and_then(|i| self.items.get(i))
            .map(String::as_str)
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.seen.clear();
        self.items.clear();
    }
}

/// A reply produced by the step controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[non_exhaustive]
pub enum BotMessage {
    /// A query matched `total` sections; step 1 follows.
    Found {
        /// Number of steps in the new sequence.
        total: usize,
    },
    /// One section to display.
    Section {
        /// 1-based step number.
        step: usize,
        /// The section.
        entry: HelpEntry,
    },
    /// A step was shown and more remain.
    StepCompleted {
        /// 1-based step just shown.
        step: usize,
        /// Whether the step was reached through `continue`.
        via_continue: bool,
    },
    /// The last step of the sequence was shown through `continue`.
    TopicFinished,
    /// Nothing matched the query.
    NotFound,
}

impl BotMessage {
    /// Plain-text rendering of status messages. Sections have none.
    pub fn status_text(&self) -> Option<String> {
        match self {
            Self::Found { total } => Some(format!(
                "Found {total} steps for this topic. Showing step 1..."
            )),
            Self::Section { .. } => None,
            Self::StepCompleted {
                step,
                via_continue: false,
            } => Some(format!(
                "Step {step} completed. Type continue to see the next step."
            )),
            Self::StepCompleted {
                step,
                via_continue: true,
            } => Some(format!(
                "Step {step} completed. Type continue to proceed or ask another topic."
            )),
            Self::TopicFinished => Some(
                "That's all for this topic. You can ask another help question anytime."
                    .to_string(),
            ),
            Self::NotFound => Some(
                "Sorry, I couldn't find any relevant help entries for that question.".to_string(),
            ),
        }
    }
}

/// Drives the active step sequence for one manual.
#[derive(Debug, Clone)]
pub struct StepController {
    /// Active (or exhausted) sequence.
    sequence: StepSequence,
    /// Normalized text of the last topic query.
    last_query: Option<String>,
    /// Similarity threshold for matching.
    threshold: f64,
}

impl Default for StepController {
    fn default() -> Self {
        Self::new(crate::matcher::DEFAULT_THRESHOLD)
    }
}

impl StepController {
    /// Controller with no active sequence.
    pub const fn new(threshold: f64) -> Self {
        Self {
            sequence: StepSequence {
                entries: Vec::new(),
                cursor: 0,
            },
            last_query: None,
            threshold,
        }
    }

    /// The current sequence.
    pub const fn sequence(&self) -> &StepSequence {
        &self.sequence
    }

    /// Whether a `continue` would show something.
    pub fn is_active(&self) -> bool {
        self.sequence.has_next()
    }

    /// Drop the sequence and the duplicate-query memory.
    pub fn reset(&mut self) {
        self.sequence = StepSequence::default();
        self.last_query = None;
    }

    /// Respond to one input against `entries`.
    ///
    /// Returns no messages for `continue` while idle and for a topic query
    /// identical to the one submitted right before it. A query with no text
    /// left after normalization matches nothing.
    pub fn respond(&mut self, input: &str, entries: &[HelpEntry]) -> Vec<BotMessage> {
        if is_continue(input) {
            self.last_query = None;
            return self.continue_topic();
        }

        let query = normalize(input);
        if query.is_empty() {
            self.last_query = None;
            return vec![BotMessage::NotFound];
        }
        if self.last_query.as_deref() == Some(query.as_str()) {
            tracing::debug!(query = %query, "ignoring repeated query");
            return Vec::new();
        }
        self.last_query = Some(query);

        self.start_topic(input, entries)
    }

    /// Replace the sequence with the matches of a new query.
    fn start_topic(&mut self, input: &str, entries: &[HelpEntry]) -> Vec<BotMessage> {
        let found = match_topic(input, entries, self.threshold);
        let steps: Vec<HelpEntry> = found
            .step_order()
            .into_iter()
            .filter_map(|i| entries.get(i).cloned())
            .collect();
        self.sequence = StepSequence::new(steps);

        let Some(first) = self.sequence.advance().cloned() else {
            return vec![BotMessage::NotFound];
        };

        let mut messages = vec![
            BotMessage::Found {
                total: self.sequence.len(),
            },
            BotMessage::Section {
                step: 1,
                entry: first,
            },
        ];
        if self.sequence.has_next() {
            messages.push(BotMessage::StepCompleted {
                step: 1,
                via_continue: false,
            });
        }
        messages
    }

    /// Show the next step of the active sequence.
    fn continue_topic(&mut self) -> Vec<BotMessage> {
        let Some(entry) = self.sequence.advance().cloned() else {
            tracing::debug!("continue with no active topic");
            return Vec::new();
        };

        let step = self.sequence.cursor();
        let mut messages = vec![BotMessage::Section { step, entry }];
        if self.sequence.has_next() {
            messages.push(BotMessage::StepCompleted {
                step,
                via_continue: true,
            });
        } else {
            messages.push(BotMessage::TopicFinished);
        }
        messages
    }
}

/// Per-user chat state: the selected manual, its entries and history.
#[derive(Debug)]
pub struct ChatSession {
    /// Manual storage.
    library: Library,
    /// Selected manual name.
    manual: Option<String>,
    /// Sections of the selected manual.
    entries: Vec<HelpEntry>,
    /// Step state.
    controller: StepController,
    /// Query history of the current selection.
    history: HistoryLog,
}

impl ChatSession {
    /// Session with no manual selected.
    pub fn new(config: &Config) -> Self {
        Self::with_library(Library::new(config), config.match_threshold)
    }

    /// Session over an existing library.
    pub fn with_library(library: Library, threshold: f64) -> Self {
        Self {
            library,
            manual: None,
            entries: Vec::new(),
            controller: StepController::new(threshold),
            history: HistoryLog::new(),
        }
    }

    /// The manual library.
    pub const fn library(&self) -> &Library {
        &self.library
    }

    /// Selected manual name.
    pub fn manual(&self) -> Option<&str> {
        self.manual.as_deref()
    }

    /// Loaded sections.
    pub fn entries(&self) -> &[HelpEntry] {
        &self.entries
    }

    /// History of the current selection.
    pub const fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// Step controller.
    pub const fn controller(&self) -> &StepController {
        &self.controller
    }

    /// Select a manual, discarding the previous entries, history and steps.
    ///
    /// The history is seeded with the section titles. When the section
    /// folder is missing the session is left with no entries and the error
    /// is returned.
    pub fn select_manual(&mut self, name: &str) -> Result<usize> {
        self.manual = Some(name.to_string());
        self.entries.clear();
        self.history.clear();
        self.controller.reset();

        self.entries = self.library.load_entries(name)?;
        for entry in &self.entries {
            self.history.record(&title_case(&entry.title));
        }
        Ok(self.entries.len())
    }

    /// Submit user input.
    ///
    /// Input that is empty after normalization is rejected before anything
    /// is recorded.
    pub fn submit(&mut self, input: &str) -> Result<Vec<BotMessage>> {
        let input = input.trim();
        if normalize(input).is_empty() {
            return Err(HelpError::EmptyQuery);
        }
        if self.manual.is_none() {
            return Err(HelpError::NoManualSelected);
        }

        self.history.record(input);
        Ok(self.controller.respond(input, &self.entries))
    }

    /// Re-submit a history item by 1-based position.
    pub fn resubmit(&mut self, position: usize) -> Result<Option<Vec<BotMessage>>> {
        let Some(item) = self.history.get(position).map(str::to_string) else {
            return Ok(None);
        };
        self.submit(&item).map(Some)
    }

    /// Guideline text of the selected manual.
    pub fn guideline(&self) -> Result<Option<String>> {
        match &self.manual {
            Some(name) => self.library.guideline(name),
            None => Err(HelpError::NoManualSelected),
        }
    }
}

/// Title-case each whitespace-separated word.
fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}
