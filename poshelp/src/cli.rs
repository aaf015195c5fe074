//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// POS manual help chat.
#[derive(Parser, Debug)]
#[command(name = "poshelp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file.
    #[arg(long, global = true, env = "POSHELP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Folder holding the PDF manuals (overrides the config file).
    #[arg(long, global = true, env = "POSHELP_RESOURCES")]
    pub resources: Option<PathBuf>,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Command to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Split new PDF manuals into section images and text files.
    Import,

    /// List manuals and their import status.
    Manuals {
        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Cli)]
        format: OutputFormat,
    },

    /// Show the guideline summary of a manual.
    Guideline {
        /// Manual name (file name without `.pdf`).
        manual: String,
    },

    /// Ask a single question about a manual.
    Ask {
        /// Manual name.
        manual: String,

        /// Question.
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Cli)]
        format: OutputFormat,
    },

    /// Start an interactive help chat.
    Chat {
        /// Manual to select on start.
        #[arg(short, long)]
        manual: Option<String>,

        /// Do not import new manuals before chatting.
        #[arg(long)]
        no_import: bool,
    },
}

/// Output format for one-shot commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Coloured terminal output.
    #[default]
    Cli,
    /// JSON.
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask() {
        let cli = Cli::try_parse_from(["poshelp", "ask", "Retail", "void", "a", "sale", "--format", "json"])
            .unwrap();
        match cli.command {
            Commands::Ask {
                manual,
                query,
                format,
            } => {
                assert_eq!(manual, "Retail");
                assert_eq!(query.join(" "), "void a sale");
                assert_eq!(format, OutputFormat::Json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_chat_defaults() {
        let cli = Cli::try_parse_from(["poshelp", "chat"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Chat {
                manual: None,
                no_import: false
            }
        ));
    }
}
