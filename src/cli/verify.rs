use std::path::Path;

use colored::Colorize;

use crate::cli::resolve_input;
use crate::error::Result;
use crate::pipeline;
use crate::settings::load_settings;

pub fn run(file: Option<String>) -> Result<()> {
    let settings = load_settings();
    let input = resolve_input(file, Path::new(&settings.input_dir))?;
    let images_dir = Path::new(&settings.output_dir);

    let outcome = pipeline::verify(&input, images_dir)?;

    println!("Transactions with images: {}", outcome.with_images);
    println!("Receipts present:         {}", outcome.found.len());
    println!("Receipts missing:         {}", outcome.missing.len());

    if outcome.missing.is_empty() {
        if outcome.with_images > 0 {
            println!("{}", "All expected receipt files are present.".green());
        }
    } else {
        println!();
        println!("{}", "Missing receipt files:".yellow());
        for name in &outcome.missing {
            println!("  - {name}");
        }
        println!("Re-run the launcher script and `cardbatch collect` to fill the gaps.");
    }
    Ok(())
}
