//! Terminal and JSON rendering of chat replies.

use chrono::Local;
use colored::Colorize;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::conversation::BotMessage;
use crate::library::{HelpEntry, Library};

/// A display line of a section body.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BodyLine {
    /// A bullet point.
    Bullet(String),
    /// A paragraph.
    Paragraph(String),
}

/// Split section text into display lines.
///
/// Blank lines and running headers (`Point of Sales…`, `Page…`) are dropped;
/// lines starting with `•` or `-` become bullets.
pub fn format_body(text: &str) -> Vec<BodyLine> {
    text.trim()
        .lines()
        .map(str::trim)
        .filter(|line| {
            let lower = line.to_lowercase();
            !line.is_empty() && !lower.starts_with("point of sales") && !lower.starts_with("page")
        })
        .map(|line| {
            line.strip_prefix('•')
                .or_else(|| line.strip_prefix('-'))
                .map_or_else(
                    || BodyLine::Paragraph(line.to_string()),
                    |rest| BodyLine::Bullet(rest.trim().to_string()),
                )
        })
        .collect()
}

/// Current time as shown under chat bubbles.
pub fn timestamp() -> String {
    Local::now().format("%I:%M %p").to_string()
}

/// Render a section for the terminal.
pub fn render_section(step: usize, entry: &HelpEntry, library: &Library) -> String {
    let mut out = format!(
        "{} {}\n",
        format!("[{step}]").cyan(),
        entry.title.bold()
    );
    for line in format_body(&entry.body_text) {
        match line {
            BodyLine::Bullet(text) => out.push_str(&format!("  • {text}\n")),
            BodyLine::Paragraph(text) => out.push_str(&format!("{text}\n\n")),
        }
    }

    let image = library.image_file(entry);
    if image.exists() {
        out.push_str(&format!("{} {}\n", "Image:".dimmed(), image.display()));
    }
    out
}

/// Render one reply for the terminal.
pub fn render_message(message: &BotMessage, library: &Library) -> String {
    match message {
        BotMessage::Section { step, entry } => render_section(*step, entry, library),
        BotMessage::NotFound => message.status_text().unwrap_or_default().red().to_string(),
        other => other.status_text().unwrap_or_default().green().to_string(),
    }
}

/// Print a reply bubble: the bot marker, the messages and a timestamp.
pub fn print_reply(messages: &[BotMessage], library: &Library) {
    if messages.is_empty() {
        return;
    }
    for message in messages {
        println!("{} {}", "bot>".magenta().bold(), render_message(message, library));
    }
    println!("{}", timestamp().dimmed());
}

/// JSON shape of a one-shot answer.
#[derive(Debug, Serialize)]
struct AnswerJson<'a> {
    /// Manual asked.
    manual: &'a str,
    /// Query as typed.
    query: &'a str,
    /// Replies in order.
    messages: &'a [BotMessage],
}

/// Print a one-shot answer in the requested format.
pub fn format_answer(
    manual: &str,
    query: &str,
    messages: &[BotMessage],
    library: &Library,
    format: OutputFormat,
) -> crate::error::Result<()> {
    match format {
        OutputFormat::Cli => print_reply(messages, library),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&AnswerJson {
                manual,
                query,
                messages,
            })?;
            println!("{json}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_body_drops_headers_and_blank_lines() {
        let text = "Point of Sales User Guide\n\nVoid a Sale\n• Press VOID\n- Confirm with manager\nPage 12 of 40\n";
        assert_eq!(
            format_body(text),
            vec![
                BodyLine::Paragraph("Void a Sale".to_string()),
                BodyLine::Bullet("Press VOID".to_string()),
                BodyLine::Bullet("Confirm with manager".to_string()),
            ]
        );
    }

    #[test]
    fn test_format_body_keeps_guideline_header() {
        let lines = format_body("[GUIDELINE] This section explains: x\n\nLOGIN\n\nEnter PIN");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], BodyLine::Paragraph("LOGIN".to_string()));
    }

    #[test]
    fn test_render_not_found_text() {
        colored::control::set_override(false);
        let library = Library::new(&crate::config::Config::default());
        assert_eq!(
            render_message(&BotMessage::NotFound, &library),
            "Sorry, I couldn't find any relevant help entries for that question."
        );
    }
}
