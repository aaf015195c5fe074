//! Chat session behavior over a prepared resource folder.

use std::fs;
use std::path::Path;

use poshelp::{BotMessage, ChatSession, Config, HelpError};

/// Lay out a manual the way the importer does.
fn write_manual(root: &Path, name: &str, sections: &[(&str, &str)]) {
    fs::write(root.join(format!("{name}.pdf")), b"%PDF").unwrap();
    let folder = root.join("images").join(name);
    fs::create_dir_all(&folder).unwrap();
    for (stem, text) in sections {
        fs::write(folder.join(format!("{stem}.png")), b"png").unwrap();
        fs::write(folder.join(format!("{stem}.txt")), text).unwrap();
    }
}

fn session(root: &Path) -> ChatSession {
    let mut config = Config::default();
    config.resources = root.to_path_buf();
    ChatSession::new(&config)
}

fn retail(root: &Path) {
    write_manual(
        root,
        "Retail Manual",
        &[
            ("login(1)", "LOGIN\n\nEnter PIN"),
            ("print(1)", "PRINT\n\nPress print"),
            ("print_label(1)", "PRINT LABEL\n\nChoose the label"),
            ("print_label(2)", "PRINT LABEL\n\nConfirm the quantity"),
        ],
    );
}

#[test]
fn test_submit_without_manual() {
    let dir = tempfile::tempdir().unwrap();
    let mut chat = session(dir.path());

    assert!(matches!(chat.submit("login"), Err(HelpError::NoManualSelected)));
    assert!(chat.history().is_empty());
}

#[test]
fn test_empty_input_is_rejected_before_recording() {
    let dir = tempfile::tempdir().unwrap();
    retail(dir.path());
    let mut chat = session(dir.path());
    chat.select_manual("Retail Manual").unwrap();
    let seeded = chat.history().len();

    assert!(matches!(chat.submit("   "), Err(HelpError::EmptyQuery)));
    assert_eq!(chat.history().len(), seeded);
}

#[test]
fn test_separator_only_input_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    retail(dir.path());
    let mut chat = session(dir.path());
    chat.select_manual("Retail Manual").unwrap();
    let seeded = chat.history().len();

    assert!(matches!(chat.submit("-"), Err(HelpError::EmptyQuery)));
    assert!(matches!(chat.submit(" __ "), Err(HelpError::EmptyQuery)));
    assert_eq!(chat.history().len(), seeded);
    assert!(!chat.controller().is_active());
}

#[test]
fn test_topic_can_be_asked_again_after_continue() {
    let dir = tempfile::tempdir().unwrap();
    retail(dir.path());
    let mut chat = session(dir.path());
    chat.select_manual("Retail Manual").unwrap();

    assert!(!chat.submit("login").unwrap().is_empty());
    assert!(chat.submit("login").unwrap().is_empty());
    chat.submit("continue").unwrap();
    assert!(!chat.submit("login").unwrap().is_empty());
}

#[test]
fn test_select_seeds_history_with_titles() {
    let dir = tempfile::tempdir().unwrap();
    retail(dir.path());
    let mut chat = session(dir.path());

    assert_eq!(chat.select_manual("Retail Manual").unwrap(), 4);
    assert_eq!(
        chat.history().items(),
        &["Login(1)", "Print(1)", "Print Label(1)", "Print Label(2)"]
    );
}

#[test]
fn test_missing_manual_clears_state() {
    let dir = tempfile::tempdir().unwrap();
    retail(dir.path());
    fs::write(dir.path().join("Kitchen.pdf"), b"%PDF").unwrap();
    let mut chat = session(dir.path());

    chat.select_manual("Retail Manual").unwrap();
    chat.submit("print").unwrap();
    assert!(chat.controller().is_active());

    let err = chat.select_manual("Kitchen").unwrap_err();
    assert!(matches!(err, HelpError::MissingManual { ref name } if name == "Kitchen"));
    assert_eq!(err.to_string(), "No extracted images found for 'Kitchen'");
    assert_eq!(chat.manual(), Some("Kitchen"));
    assert!(chat.entries().is_empty());
    assert!(chat.history().is_empty());
    assert!(!chat.controller().is_active());

    assert_eq!(chat.submit("print").unwrap(), vec![BotMessage::NotFound]);
}

#[test]
fn test_topic_then_continue_to_the_end() {
    let dir = tempfile::tempdir().unwrap();
    retail(dir.path());
    let mut chat = session(dir.path());
    chat.select_manual("Retail Manual").unwrap();

    // Best match first, then the other hits in manual order.
    let first = chat.submit("print label").unwrap();
    assert_eq!(first[0], BotMessage::Found { total: 2 });
    match &first[1] {
        BotMessage::Section { step, entry } => {
            assert_eq!(*step, 1);
            assert_eq!(entry.title, "PRINT LABEL(1)");
            assert_eq!(entry.body_text, "PRINT LABEL\n\nChoose the label");
        }
        other => panic!("expected a section, got {other:?}"),
    }
    assert_eq!(
        first[2],
        BotMessage::StepCompleted {
            step: 1,
            via_continue: false
        }
    );

    let second = chat.submit("Continue").unwrap();
    assert!(matches!(&second[0], BotMessage::Section { step: 2, entry } if entry.title == "PRINT LABEL(2)"));
    assert_eq!(second[1], BotMessage::TopicFinished);

    assert!(chat.submit("continue").unwrap().is_empty());
}

#[test]
fn test_resubmit_history_item() {
    let dir = tempfile::tempdir().unwrap();
    retail(dir.path());
    let mut chat = session(dir.path());
    chat.select_manual("Retail Manual").unwrap();

    let replies = chat.resubmit(1).unwrap().unwrap();
    assert!(matches!(replies[0], BotMessage::Found { .. }));
    assert!(chat.resubmit(99).unwrap().is_none());
}

#[test]
fn test_guideline_of_selected_manual() {
    let dir = tempfile::tempdir().unwrap();
    retail(dir.path());
    fs::write(dir.path().join("retail_guideline.txt"), "• Login\n• Print\n").unwrap();
    let mut chat = session(dir.path());

    assert!(matches!(chat.guideline(), Err(HelpError::NoManualSelected)));
    chat.select_manual("Retail Manual").unwrap();
    assert_eq!(chat.guideline().unwrap().as_deref(), Some("• Login\n• Print"));
}
