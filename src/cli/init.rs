use std::path::PathBuf;

use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};

pub fn run(input_dir: Option<String>, output_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings();

    if let Some(dir) = input_dir {
        settings.input_dir = shellexpand_path(&dir);
    }
    if let Some(dir) = output_dir {
        settings.output_dir = shellexpand_path(&dir);
    }
    save_settings(&settings)?;

    let input = PathBuf::from(&settings.input_dir);
    let output = PathBuf::from(&settings.output_dir);
    std::fs::create_dir_all(&input)?;
    std::fs::create_dir_all(&output)?;

    println!("Initialized cardbatch");
    println!("  Input folder:  {}", input.display());
    println!("  Output folder: {}", output.display());
    println!();
    println!("Drop card export CSVs into the input folder, then run `cardbatch process`.");
    Ok(())
}
