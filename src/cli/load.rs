use std::path::PathBuf;

use crate::cli::parse_kind;
use crate::dataset::load_file;
use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};

pub fn run(file: &str, kind: &str) -> Result<()> {
    let kind = parse_kind(kind)?;
    let resolved = PathBuf::from(shellexpand_path(file));

    // Read it once so a bad file is rejected before it is remembered.
    let loaded = load_file(&resolved, kind)?;

    let mut settings = load_settings();
    settings.set_dataset_path(kind, resolved.to_string_lossy().to_string());
    save_settings(&settings)?;

    println!(
        "Loaded {} rows into {} from {}",
        loaded.dataset.len(),
        kind,
        resolved.display()
    );
    if loaded.skipped > 0 {
        println!("Skipped {} unreadable row(s).", loaded.skipped);
    }
    Ok(())
}
