//! Topic matching on its own - similarity scores and step order.
//!
//! Run: `cargo run --example matching`

mod common;

use anyhow::Result;
use poshelp::{DEFAULT_THRESHOLD, Library, match_topic, normalize, similarity};

fn main() -> Result<()> {
    let (_dir, config) = common::sample_resources()?;
    let entries = Library::new(&config).load_entries(common::MANUAL)?;

    for query in ["Void a Sale", "print", "log_in", "refund"] {
        println!("Query '{query}':");
        for entry in &entries {
            let score = similarity(&normalize(query), &normalize(&entry.title));
            println!("  {:.3} {}", score, entry.title);
        }

        let found = match_topic(query, &entries, DEFAULT_THRESHOLD);
        let order: Vec<&str> = found
            .step_order()
            .into_iter()
            .map(|i| entries[i].title.as_str())
            .collect();
        println!("  steps: {order:?}\n");
    }
    Ok(())
}
