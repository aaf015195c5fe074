//! Sample manual for examples.
//!
//! Writes a small resource folder in the layout produced by `poshelp import`
//! so examples run without PDFs or OCR tools.

use std::fs;
use std::path::Path;

use anyhow::Result;
use poshelp::Config;
use tempfile::TempDir;

/// Name of the sample manual.
pub const MANUAL: &str = "Retail Manual";

/// Sample sections: file stem and text.
pub const SECTIONS: &[(&str, &str)] = &[
    (
        "login(1)",
        "[GUIDELINE] This section explains: Enter your four digit PIN.\n\nLogin\n\nEnter your four digit PIN.\n• Press ENTER",
    ),
    (
        "void_a_sale(1)",
        "[GUIDELINE] This section explains: Select the item you want to remove.\n\nVoid a Sale\n\nSelect the item you want to remove.",
    ),
    (
        "void_a_sale(2)",
        "[GUIDELINE] This section explains: A manager must approve the void.\n\nVoid a Sale\n\nA manager must approve the void.\n• Press VOID",
    ),
    (
        "print_label(1)",
        "[GUIDELINE] This section contains important POS instructions.\n\nPrint Label\n\n• Scan item\n• Press PRINT",
    ),
];

/// Create a temporary resource folder holding the sample manual.
pub fn sample_resources() -> Result<(TempDir, Config)> {
    let dir = tempfile::tempdir()?;
    write_manual(dir.path())?;

    let mut config = Config::default();
    config.resources = dir.path().to_path_buf();
    config.typing_delay_ms = 0;
    Ok((dir, config))
}

fn write_manual(root: &Path) -> Result<()> {
    fs::write(root.join(format!("{MANUAL}.pdf")), b"%PDF-1.4\n")?;
    let folder = root.join("images").join(MANUAL);
    fs::create_dir_all(&folder)?;
    for (stem, text) in SECTIONS {
        fs::write(folder.join(format!("{stem}.png")), b"")?;
        fs::write(folder.join(format!("{stem}.txt")), text)?;
    }
    fs::write(
        root.join("retail_guideline.txt"),
        "• Login\n• Void a Sale\n• Print Label\n",
    )?;
    Ok(())
}
