use std::path::{Path, PathBuf};

use chrono::Local;
use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::resolve_input;
use crate::error::Result;
use crate::fmt::money;
use crate::manifest;
use crate::pipeline::{self, ProcessSummary};
use crate::settings::load_settings;

pub fn run(file: Option<String>, output: Option<String>, no_launch: bool) -> Result<()> {
    let settings = load_settings();
    let input = resolve_input(file, Path::new(&settings.input_dir))?;
    let output_path = match output {
        Some(path) => PathBuf::from(path),
        None => generated_output_path(&input, Path::new(&settings.output_dir)),
    };

    println!("Processing {}", input.display());
    let summary = pipeline::process(&input, &output_path, &settings)?;

    println!(
        "Loaded {} transactions, kept {} ({} filtered as credits/invalid)",
        summary.loaded,
        summary.records.len(),
        summary.removed
    );

    let Some(batch_path) = &summary.output_path else {
        println!(
            "{}",
            "No positive transactions after filtering; nothing written.".yellow()
        );
        return Ok(());
    };

    let total: f64 = summary.records.iter().map(|r| r.invoice_amount).sum();
    println!(
        "{} {} invoice records ({}) -> {}",
        "Wrote".green(),
        summary.records.len(),
        money(total),
        batch_path.display()
    );
    print_sample(&summary);

    if summary.with_images > 0 {
        println!();
        println!(
            "{} transactions have receipt images to download.",
            summary.with_images
        );
        if let Some(path) = &summary.manifest_path {
            println!("  URL list: {}", path.display());
        }
        if let Some(launcher) = &summary.launcher_path {
            println!("  Launcher: {}", launcher.display());
            if no_launch {
                println!("  Run it when you are logged into the card portal.");
            } else {
                println!("  Opening receipt URLs in your browser...");
                manifest::run_launcher(launcher);
            }
        }
        println!();
        println!("Next: download each receipt, then run `cardbatch collect`.");
    }

    Ok(())
}

/// `{input stem}_MDS_READY_{timestamp}.csv` in the output folder.
fn generated_output_path(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("batch");
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    output_dir.join(format!("{stem}_MDS_READY_{timestamp}.csv"))
}

fn print_sample(summary: &ProcessSummary) {
    let mut table = Table::new();
    table.set_header(vec!["#", "Amount", "Invoice No.", "Description", "GL BA"]);
    for record in summary.records.iter().take(3) {
        table.add_row(vec![
            Cell::new(record.sequence),
            Cell::new(money(record.invoice_amount)),
            Cell::new(&record.invoice_number),
            Cell::new(&record.description),
            Cell::new(&record.gl_account_ba),
        ]);
    }
    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_output_path_shape() {
        let path = generated_output_path(
            Path::new("/in/january_export.csv"),
            Path::new("/out"),
        );
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("january_export_MDS_READY_"));
        assert!(name.ends_with(".csv"));
        assert!(path.starts_with("/out"));
    }
}
