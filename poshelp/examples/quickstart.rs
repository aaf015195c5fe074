//! Minimal quickstart example - runs independently with a sample manual.
//!
//! Run: `cargo run --example quickstart`

mod common;

use anyhow::Result;
use poshelp::ChatSession;

fn main() -> Result<()> {
    let (_dir, config) = common::sample_resources()?;
    let mut session = ChatSession::new(&config);

    let sections = session.select_manual(common::MANUAL)?;
    println!("Selected {} ({sections} sections)", common::MANUAL);
    if let Some(guideline) = session.guideline()? {
        println!("\n{guideline}\n");
    }

    for input in ["void sale", "continue", "continue", "refund"] {
        println!("you> {input}");
        for message in session.submit(input)? {
            match message.status_text() {
                Some(text) => println!("bot> {text}"),
                None => {
                    if let poshelp::BotMessage::Section { step, entry } = &message {
                        println!("bot> [{step}] {}", entry.title);
                    }
                }
            }
        }
    }
    Ok(())
}
