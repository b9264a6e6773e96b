use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::cli::{latest_batch_csv, resolve_input};
use crate::error::Result;
use crate::pipeline;
use crate::settings::{downloads_dir, load_settings};

pub fn run(
    file: Option<String>,
    downloads_override: Option<String>,
    window_minutes: Option<u64>,
) -> Result<()> {
    let mut settings = load_settings();
    if let Some(minutes) = window_minutes {
        settings.recency_window_minutes = minutes;
    }

    let input = resolve_input(file, Path::new(&settings.input_dir))?;
    let batch = latest_batch_csv(Path::new(&settings.output_dir))?;
    let holding = match downloads_override {
        Some(dir) => PathBuf::from(dir),
        None => downloads_dir(&settings),
    };

    println!("Using batch:      {}", batch.display());
    println!("Scanning folder:  {}", holding.display());
    println!(
        "Recency window:   {} minutes",
        settings.recency_window_minutes
    );

    let summary = pipeline::collect(&input, &batch, &holding, &settings)?;

    if summary.candidates == 0 {
        println!(
            "{}",
            "No recently downloaded receipts found in the holding folder.".yellow()
        );
        println!("Download the receipts first, then run `cardbatch collect` again.");
        return Ok(());
    }

    println!(
        "{} {} of {} candidates matched and moved",
        "Matched".green(),
        summary.matched,
        summary.candidates
    );
    if summary.unmatched > 0 {
        println!(
            "{} {} transactions still have no receipt file",
            "Unmatched:".yellow(),
            summary.unmatched
        );
    }
    if summary.failed_moves > 0 {
        println!("{} {} file moves failed", "Warning:".yellow(), summary.failed_moves);
    }
    if !summary.leftovers.is_empty() {
        println!(
            "{} downloaded files could not be matched:",
            summary.leftovers.len()
        );
        for name in summary.leftovers.iter().take(5) {
            println!("  - {name}");
        }
        if summary.leftovers.len() > 5 {
            println!("  ... and {} more", summary.leftovers.len() - 5);
        }
    }

    #[cfg(feature = "pdf")]
    {
        let conv = &summary.conversion;
        println!(
            "PDF conversion: {} converted, {} copied, {} failed",
            conv.converted, conv.copied, conv.failed
        );
    }

    println!(
        "{} batch rewritten with {} records -> {}",
        "Done:".green(),
        summary.records,
        summary.output_path.display()
    );
    println!("Run `cardbatch verify` for a final sanity check.");
    Ok(())
}
