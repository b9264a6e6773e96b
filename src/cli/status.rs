use std::path::Path;

use crate::cli::latest_batch_csv;
use crate::error::Result;
use crate::settings::{downloads_dir, load_settings};

pub fn run() -> Result<()> {
    let settings = load_settings();
    let input_dir = Path::new(&settings.input_dir);
    let output_dir = Path::new(&settings.output_dir);

    println!("Input folder:   {}", input_dir.display());
    println!("Output folder:  {}", output_dir.display());
    println!("Holding folder: {}", downloads_dir(&settings).display());
    println!("Vendor account: {}", settings.vendor_account);
    println!("GL BA fallback: {}", settings.gl_fallback_ba);

    println!();
    let exports = count_files(input_dir, |n| n.to_lowercase().ends_with(".csv"));
    println!("Card exports waiting: {exports}");

    match latest_batch_csv(output_dir) {
        Ok(batch) => {
            let rows = batch_row_count(&batch);
            println!(
                "Latest batch: {} ({} records)",
                batch.file_name().and_then(|n| n.to_str()).unwrap_or("?"),
                rows
            );
        }
        Err(_) => println!("Latest batch: none (run `cardbatch process`)"),
    }

    let receipts = count_files(output_dir, |n| {
        let lower = n.to_lowercase();
        lower.ends_with(".pdf") || lower.ends_with(".png") || lower.ends_with(".jpg")
    });
    println!("Receipt files in output folder: {receipts}");
    Ok(())
}

fn count_files(dir: &Path, keep: impl Fn(&str) -> bool) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .filter(|e| {
                    e.path().is_file()
                        && e.file_name().to_str().map_or(false, |n| keep(n))
                })
                .count()
        })
        .unwrap_or(0)
}

fn batch_row_count(path: &Path) -> usize {
    csv::Reader::from_path(path)
        .map(|mut rdr| rdr.records().flatten().count())
        .unwrap_or(0)
}
