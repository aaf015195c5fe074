//! MCP server over one shared chat session.
//!
//! Tool calls lock the session inside `spawn_blocking`, since manual loading
//! and history updates touch the filesystem synchronously.

use std::sync::{Arc, Mutex, MutexGuard};

use poshelp::formatter::{BodyLine, format_body};
use poshelp::{BotMessage, ChatSession, Config, HelpError, Library};
use rmcp::{
    ServerHandler,
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult, Content, Implementation, InitializeResult, ProtocolVersion,
        ServerCapabilities,
    },
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::Deserialize;
use thiserror::Error;

/// Type alias for ServerInfo (same as InitializeResult).
type ServerInfo = InitializeResult;

/// Failures inside a tool call.
#[derive(Debug, Error)]
enum ToolError {
    /// Library or session error.
    #[error(transparent)]
    Help(#[from] HelpError),

    /// A previous call panicked while holding the session.
    #[error("chat session is unavailable")]
    Poisoned,

    /// JSON rendering failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// MCP server answering questions about the imported POS manuals.
#[derive(Clone, Debug)]
pub struct PosHelpServer {
    /// Chat state shared by every tool call.
    session: Arc<Mutex<ChatSession>>,
    /// Tool router for handling tool calls.
    tool_router: ToolRouter<Self>,
}

impl PosHelpServer {
    /// Server with no manual selected.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self::with_session(ChatSession::new(config))
    }

    /// Server over an existing session.
    #[must_use]
    pub fn with_session(session: ChatSession) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            tool_router: Self::tool_router(),
        }
    }

    /// Run `f` on the locked session in the blocking pool.
    async fn with_locked<T, F>(&self, f: F) -> Result<T, rmcp::ErrorData>
    where
        T: Send + 'static,
        F: FnOnce(&mut ChatSession) -> Result<T, ToolError> + Send + 'static,
    {
        let session = Arc::clone(&self.session);
        tokio::task::spawn_blocking(move || {
            let mut guard: MutexGuard<'_, ChatSession> =
                session.lock().map_err(|_| ToolError::Poisoned)?;
            f(&mut guard)
        })
        .await
        .map_err(to_mcp_error)?
        .map_err(to_mcp_error)
    }
}

/// Parameters for select_manual tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SelectManualParams {
    /// Manual name or PDF file name (e.g. 'Retail Manual').
    pub name: String,
}

/// Parameters for ask tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AskParams {
    /// Help topic, or 'continue' for the next step of the current topic.
    pub query: String,
}

/// Outcome of a tool that can fail for user-facing reasons.
#[derive(Debug)]
enum Reply {
    /// Normal answer.
    Text(String),
    /// The request could not be served; shown to the caller as a tool error.
    Refused(String),
}

impl Reply {
    /// Tool result; refusals are flagged as errors.
    fn into_result(self) -> CallToolResult {
        match self {
            Self::Text(text) => CallToolResult::success(vec![Content::text(text)]),
            Self::Refused(text) => CallToolResult::error(vec![Content::text(text)]),
        }
    }
}

/// Convert a poshelp error to MCP error.
fn to_mcp_error(e: impl std::fmt::Display) -> rmcp::ErrorData {
    rmcp::ErrorData::internal_error(e.to_string(), None)
}

/// Plain-text rendering of bot replies.
fn render_messages(messages: &[BotMessage], library: &Library) -> String {
    let mut blocks = Vec::with_capacity(messages.len());
    for message in messages {
        if let BotMessage::Section { step, entry } = message {
            let mut block = format!("[{step}] {}\n", entry.title);
            for line in format_body(&entry.body_text) {
                match line {
                    BodyLine::Bullet(text) => block.push_str(&format!("  • {text}\n")),
                    BodyLine::Paragraph(text) => block.push_str(&format!("{text}\n")),
                    _ => {}
                }
            }
            block.push_str(&format!("Image: {}", library.image_file(entry).display()));
            blocks.push(block);
        } else if let Some(text) = message.status_text() {
            blocks.push(text);
        }
    }
    blocks.join("\n\n")
}

#[tool_router]
impl PosHelpServer {
    /// List the PDF manuals in the resource folder with their import status (JSON).
    #[tool(name = "manuals")]
    async fn manuals(&self) -> Result<CallToolResult, rmcp::ErrorData> {
        let json = self
            .with_locked(|session| {
                let manuals = session.library().list_manuals()?;
                Ok(serde_json::to_string_pretty(&manuals)?)
            })
            .await?;

        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    /// Select the manual to answer questions from. Clears the previous topic and history.
    #[tool(name = "select_manual")]
    async fn select_manual(
        &self,
        params: Parameters<SelectManualParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let p = params.0;

        let reply = self
            .with_locked(move |session| {
                let Some(info) = session.library().find_manual(&p.name)? else {
                    let suggestions = session.library().suggest_manuals(&p.name, 3)?;
                    let mut text = format!("Manual not found: {}", p.name);
                    if !suggestions.is_empty() {
                        text.push_str(&format!("\nDid you mean: {}", suggestions.join(", ")));
                    }
                    return Ok(Reply::Refused(text));
                };

                match session.select_manual(&info.name) {
                    Ok(count) => {
                        let mut text =
                            format!("Selected PDF: {} ({count} sections)", info.file_name);
                        if let Some(guideline) = session.guideline()? {
                            text.push_str(&format!("\n\n{guideline}"));
                        }
                        Ok(Reply::Text(text))
                    }
                    Err(e @ HelpError::MissingManual { .. }) => Ok(Reply::Refused(e.to_string())),
                    Err(e) => Err(e.into()),
                }
            })
            .await?;

        Ok(reply.into_result())
    }

    /// Ask a help question about the selected manual. Multi-step topics show one
    /// step per call; send 'continue' for the next one.
    #[tool(name = "ask")]
    async fn ask(&self, params: Parameters<AskParams>) -> Result<CallToolResult, rmcp::ErrorData> {
        let p = params.0;

        let reply = self
            .with_locked(move |session| match session.submit(&p.query) {
                Ok(messages) if messages.is_empty() => Ok(Reply::Text(String::new())),
                Ok(messages) => Ok(Reply::Text(render_messages(&messages, session.library()))),
                Err(e @ (HelpError::EmptyQuery | HelpError::NoManualSelected)) => {
                    Ok(Reply::Refused(e.to_string()))
                }
                Err(e) => Err(e.into()),
            })
            .await?;

        Ok(reply.into_result())
    }

    /// Show the guideline (list of covered topics) of the selected manual.
    #[tool(name = "guideline")]
    async fn guideline(&self) -> Result<CallToolResult, rmcp::ErrorData> {
        let reply = self
            .with_locked(|session| match session.guideline() {
                Ok(Some(text)) => Ok(Reply::Text(text)),
                Ok(None) => Ok(Reply::Text(format!(
                    "No guideline available for {}.",
                    session.manual().unwrap_or_default()
                ))),
                Err(e @ HelpError::NoManualSelected) => Ok(Reply::Refused(e.to_string())),
                Err(e) => Err(e.into()),
            })
            .await?;

        Ok(reply.into_result())
    }

    /// Show the numbered query history of the selected manual.
    #[tool(name = "history")]
    async fn history(&self) -> Result<CallToolResult, rmcp::ErrorData> {
        let lines = self
            .with_locked(|session| {
                Ok(session
                    .history()
                    .items()
                    .iter()
                    .enumerate()
                    .map(|(i, item)| format!("{}. {item}", i + 1))
                    .collect::<Vec<_>>())
            })
            .await?;

        let text = if lines.is_empty() {
            "History is empty".to_string()
        } else {
            lines.join("\n")
        };
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

#[tool_handler]
impl ServerHandler for PosHelpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "poshelp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "POS manual help. Use 'manuals' to see available manuals, 'select_manual' to \
                 pick one, then 'ask' with a topic. Send 'continue' to 'ask' for the next step."
                    .into(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::*;

    fn text_of(result: &CallToolResult) -> String {
        result
            .content
            .iter()
            .filter_map(|c| c.as_text().map(|t| t.text.clone()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn server_with_manual(root: &Path) -> PosHelpServer {
        fs::write(root.join("Retail Manual.pdf"), b"%PDF-1.4").unwrap();
        let sections = root.join("images").join("Retail Manual");
        fs::create_dir_all(&sections).unwrap();
        for (stem, body) in [
            ("LOGIN(1)", "LOGIN\n\nEnter your PIN"),
            ("PRINT_LABEL(1)", "PRINT LABEL\n\n• Select item"),
            ("PRINT_LABEL(2)", "PRINT LABEL\n\n• Press print"),
        ] {
            fs::write(sections.join(format!("{stem}.png")), b"png").unwrap();
            fs::write(sections.join(format!("{stem}.txt")), body).unwrap();
        }

        let mut config = Config::default();
        config.resources = root.to_path_buf();
        PosHelpServer::new(&config)
    }

    #[tokio::test]
    async fn test_ask_requires_manual() {
        let dir = tempfile::tempdir().unwrap();
        let server = server_with_manual(dir.path());

        let result = server
            .ask(Parameters(AskParams {
                query: "login".to_string(),
            }))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert_eq!(text_of(&result), "No manual selected");
    }

    #[tokio::test]
    async fn test_select_then_ask_and_continue() {
        let dir = tempfile::tempdir().unwrap();
        let server = server_with_manual(dir.path());

        let selected = server
            .select_manual(Parameters(SelectManualParams {
                name: "retail manual".to_string(),
            }))
            .await
            .unwrap();
        assert!(text_of(&selected).starts_with("Selected PDF: Retail Manual.pdf (3 sections)"));

        let first = server
            .ask(Parameters(AskParams {
                query: "print label".to_string(),
            }))
            .await
            .unwrap();
        let text = text_of(&first);
        assert!(text.starts_with("Found 2 steps for this topic. Showing step 1..."));
        assert!(text.contains("[1] PRINT LABEL(1)"));

        let next = server
            .ask(Parameters(AskParams {
                query: "continue".to_string(),
            }))
            .await
            .unwrap();
        let text = text_of(&next);
        assert!(text.contains("[2] PRINT LABEL(2)"));
        assert!(text.ends_with("That's all for this topic. You can ask another help question anytime."));
    }

    #[tokio::test]
    async fn test_select_unknown_manual_suggests() {
        let dir = tempfile::tempdir().unwrap();
        let server = server_with_manual(dir.path());

        let result = server
            .select_manual(Parameters(SelectManualParams {
                name: "Retail".to_string(),
            }))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).contains("Did you mean: Retail Manual"));
    }
}
