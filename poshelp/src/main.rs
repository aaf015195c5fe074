//! poshelp - help chat for point-of-sale PDF manuals.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use poshelp::cli::{Cli, Commands, OutputFormat};
use poshelp::formatter::{format_answer, print_reply};
use poshelp::{
    ChatSession, Config, EventQueue, HelpError, ImportEvent, ImportReport, Importer, Library,
    ToolBackend, normalize,
};

/// Longest single sleep while waiting for a scheduled reply.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(resources) = cli.resources {
        config.resources = resources;
    }

    match cli.command {
        Commands::Import => handle_import(&config),
        Commands::Manuals { format } => handle_manuals(&config, format),
        Commands::Guideline { manual } => handle_guideline(&config, &manual),
        Commands::Ask {
            manual,
            query,
            format,
        } => handle_ask(&config, &manual, &query.join(" "), format),
        Commands::Chat { manual, no_import } => handle_chat(&config, manual.as_deref(), no_import),
    }
}

/// Log to stderr; `RUST_LOG` wins over the default level.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Handle import command.
fn handle_import(config: &Config) -> Result<()> {
    let report = run_import(config)?;
    print_import_report(&report);
    Ok(())
}

/// Import new manuals behind a spinner.
fn run_import(config: &Config) -> Result<ImportReport> {
    let backend = ToolBackend::from_config(config);
    for tool in backend.missing_tools() {
        eprintln!(
            "{} '{}' is not available; pages needing it will be skipped.",
            "Warning:".yellow(),
            tool
        );
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message("Looking for PDF manuals...");

    let importer = Importer::new(config, &backend)?;
    let report = importer.run(|event| match event {
        ImportEvent::Started {
            manual,
            position,
            total,
        } => spinner.set_message(format!("[{position}/{total}] Processing {manual}")),
        ImportEvent::PageWritten { manual, stem } => {
            spinner.set_message(format!("{manual}: {stem}"));
        }
        ImportEvent::Skipped { manual } => {
            spinner.println(format!("{} {}", "Skipped (already processed):".dimmed(), manual));
        }
        _ => {}
    });
    spinner.finish_and_clear();
    Ok(report?)
}

/// Print the outcome of an import.
fn print_import_report(report: &ImportReport) {
    if report.processed.is_empty() && report.skipped.is_empty() && report.failed.is_empty() {
        println!("No PDF files found.");
        return;
    }

    for manual in &report.processed {
        println!("{} Processed {}", "✓".green(), manual);
    }
    for failure in &report.failed {
        println!("{} {}: {}", "✗".red(), failure.manual, failure.error);
    }

    println!();
    println!("  {} {}", "Images:".dimmed(), report.images_written);
    println!("  {} {}", "Texts:".dimmed(), report.texts_written);
    println!("  {} {}", "Skipped:".dimmed(), report.skipped.len());
    if report.page_failures > 0 {
        println!(
            "  {} {}",
            "Page failures:".dimmed(),
            report.page_failures.to_string().yellow()
        );
    }
    for path in &report.guidelines {
        println!("  {} {}", "Guideline:".dimmed(), path.display());
    }
}

/// Handle manuals command.
fn handle_manuals(config: &Config, format: OutputFormat) -> Result<()> {
    let library = Library::new(config);
    let manuals = library.list_manuals()?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&manuals)?);
        return Ok(());
    }

    print_manuals(&library)?;
    Ok(())
}

/// Print the manual list with import status.
fn print_manuals(library: &Library) -> Result<()> {
    let manuals = library.list_manuals()?;
    if manuals.is_empty() {
        println!(
            "No PDF manuals found in {}",
            library.resources().display().to_string().cyan()
        );
        return Ok(());
    }

    println!("{}\n", "Manuals:".bold());
    for manual in &manuals {
        let status = if manual.is_imported() {
            format!("{} sections", manual.sections).green()
        } else {
            "not imported".yellow()
        };
        println!("  {} {}", manual.name.cyan(), format!("({status})").dimmed());
    }
    println!();
    Ok(())
}

/// Handle guideline command.
fn handle_guideline(config: &Config, manual: &str) -> Result<()> {
    let library = Library::new(config);
    let Some(info) = resolve_manual(&library, manual)? else {
        std::process::exit(1);
    };
    print_guideline(&info.name, library.guideline(&info.name)?.as_deref());
    Ok(())
}

/// Print a guideline panel.
fn print_guideline(manual: &str, guideline: Option<&str>) {
    match guideline {
        Some(text) => {
            println!("{} {}\n", "Guideline:".bold(), manual.cyan());
            println!("{text}\n");
        }
        None => println!("{}", format!("No guideline available for {manual}.").dimmed()),
    }
}

/// Find a manual by name, printing suggestions when it does not exist.
fn resolve_manual(library: &Library, query: &str) -> Result<Option<poshelp::ManualInfo>> {
    if let Some(info) = library.find_manual(query)? {
        return Ok(Some(info));
    }

    eprintln!("{} Manual not found: {}", "Error:".red(), query);
    let suggestions = library.suggest_manuals(query, 3)?;
    if !suggestions.is_empty() {
        eprintln!("Did you mean: {}", suggestions.join(", ").cyan());
    }
    Ok(None)
}

/// Handle ask command.
fn handle_ask(config: &Config, manual: &str, query: &str, format: OutputFormat) -> Result<()> {
    let mut session = ChatSession::new(config);
    let Some(info) = resolve_manual(session.library(), manual)? else {
        std::process::exit(1);
    };

    if let Err(e) = session.select_manual(&info.name) {
        eprintln!("{} {e}", "Error:".red());
        eprintln!("Run 'poshelp import' first.");
        std::process::exit(1);
    }

    let messages = match session.submit(query) {
        Ok(messages) => messages,
        Err(e @ HelpError::EmptyQuery) => {
            eprintln!("{} {e}", "Warning:".yellow());
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    format_answer(&info.name, query, &messages, session.library(), format)?;
    Ok(())
}

/// What the chat loop does after a slash command.
enum Flow {
    /// Read the next line.
    Next,
    /// Dispatch this text as if typed.
    Submit(String),
    /// Leave the chat.
    Quit,
}

/// Handle chat command.
fn handle_chat(config: &Config, manual: Option<&str>, no_import: bool) -> Result<()> {
    if !no_import {
        match run_import(config) {
            Ok(report) if !report.processed.is_empty() || !report.failed.is_empty() => {
                print_import_report(&report);
                println!();
            }
            Ok(_) => {}
            Err(e) => eprintln!("{} Import failed: {e}", "Warning:".yellow()),
        }
    }

    let mut session = ChatSession::new(config);
    print_manuals(session.library())?;
    if let Some(name) = manual {
        select_in_chat(&mut session, name)?;
    }
    println!(
        "{}",
        "Type a help topic, 'continue' for the next step, or /help for commands.".dimmed()
    );

    let delay = config.typing_delay();
    let mut queue: EventQueue<String> = EventQueue::new();
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("{} ", "you>".blue().bold());
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            break;
        }
        let input = line.trim();

        let text = match input.strip_prefix('/') {
            Some(command) => match handle_slash(&mut session, command) {
                Ok(Flow::Next) => continue,
                Ok(Flow::Quit) => break,
                Ok(Flow::Submit(text)) => text,
                Err(e) => {
                    eprintln!("{} {e:#}", "Error:".red());
                    continue;
                }
            },
            None => input.to_string(),
        };
        dispatch(&mut session, &mut queue, delay, text);
    }

    Ok(())
}

/// Queue a query and show the reply once the typing delay has passed.
///
/// The queue is drained before the next line is read, so it holds at most
/// one reply at a time.
fn dispatch(session: &mut ChatSession, queue: &mut EventQueue<String>, delay: Duration, text: String) {
    if normalize(&text).is_empty() {
        println!("{}", HelpError::EmptyQuery.to_string().yellow());
        return;
    }
    if session.manual().is_none() {
        println!(
            "{}",
            "Select a manual first with /manual <name>.".yellow()
        );
        return;
    }

    queue.schedule(delay, text);

    let spinner = ProgressBar::new_spinner();
    spinner.set_message("Typing...");
    spinner.enable_steady_tick(Duration::from_millis(120));

    queue.run_until_idle(
        |wait| std::thread::sleep(wait.min(POLL_INTERVAL)),
        |query| {
            spinner.finish_and_clear();
            match session.submit(&query) {
                Ok(messages) => print_reply(&messages, session.library()),
                Err(e) => eprintln!("{} {e}", "Error:".red()),
            }
        },
    );
}

/// Run a slash command.
fn handle_slash(session: &mut ChatSession, command: &str) -> Result<Flow> {
    let (name, arg) = command
        .split_once(char::is_whitespace)
        .map_or((command, ""), |(name, rest)| (name, rest.trim()));

    match name {
        "quit" | "exit" => return Ok(Flow::Quit),
        "help" => print_chat_help(),
        "manuals" => print_manuals(session.library())?,
        "manual" if arg.is_empty() => {
            eprintln!("{} Usage: /manual <name>", "Error:".red());
        }
        "manual" => select_in_chat(session, arg)?,
        "guideline" => match session.guideline() {
            Ok(text) => print_guideline(session.manual().unwrap_or_default(), text.as_deref()),
            Err(e @ HelpError::NoManualSelected) => eprintln!("{} {e}", "Error:".red()),
            Err(e) => return Err(e.into()),
        },
        "history" if arg.is_empty() => print_history(session),
        "history" => {
            let Ok(position) = arg.parse::<usize>() else {
                eprintln!("{} Not a history number: {}", "Error:".red(), arg);
                return Ok(Flow::Next);
            };
            match session.history().get(position) {
                Some(item) => {
                    println!("{} {}", "you>".blue().bold(), item);
                    return Ok(Flow::Submit(item.to_string()));
                }
                None => eprintln!("{} No history item {}", "Error:".red(), position),
            }
        }
        other => {
            eprintln!("{} Unknown command: /{}", "Error:".red(), other);
            print_chat_help();
        }
    }
    Ok(Flow::Next)
}

/// Select a manual from inside the chat and show its guideline.
fn select_in_chat(session: &mut ChatSession, query: &str) -> Result<()> {
    let Some(info) = resolve_manual(session.library(), query)? else {
        return Ok(());
    };

    match session.select_manual(&info.name) {
        Ok(count) => {
            println!("{} Selected PDF: {}", "✓".green(), info.file_name.cyan());
            println!("  {} {}", "Sections:".dimmed(), count);
            let guideline = session.guideline()?;
            print_guideline(&info.name, guideline.as_deref());
        }
        Err(e @ HelpError::MissingManual { .. }) => {
            eprintln!("{} {e}. Run 'poshelp import' first.", "Error:".red());
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Print the numbered history of the current manual.
fn print_history(session: &ChatSession) {
    if session.history().is_empty() {
        println!("{}", "History is empty.".dimmed());
        return;
    }
    for (i, item) in session.history().items().iter().enumerate() {
        println!("  {} {}", format!("{:>3}.", i + 1).dimmed(), item);
    }
}

/// Print the slash commands.
fn print_chat_help() {
    println!("{}", "Commands:".bold());
    println!("  {}          list manuals", "/manuals".cyan());
    println!("  {}    select a manual", "/manual <name>".cyan());
    println!("  {}        show the manual guideline", "/guideline".cyan());
    println!("  {}      show history, or re-ask item n", "/history [n]".cyan());
    println!("  {}             leave the chat", "/quit".cyan());
    println!(
        "  {}          show the next step of the current topic",
        "continue".cyan()
    );
}
