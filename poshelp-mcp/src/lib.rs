//! poshelp MCP server - ask POS manual questions over the Model Context Protocol.
//!
//! Exposes one chat session to AI assistants. The session behaves like the
//! interactive chat: select a manual, ask a topic, then `continue` through
//! its steps.
//!
//! ## Tools
//!
//! - `manuals`, `select_manual`, `guideline`
//! - `ask` (topics and `continue`)
//! - `history`
//!
//! ## Usage
//!
//! ```bash
//! poshelp-mcp --resources ./res --manual "Retail Manual"
//! ```

pub mod server;

pub use server::PosHelpServer;
