pub mod collect;
pub mod init;
pub mod process;
pub mod status;
pub mod verify;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::error::{CardbatchError, Result};

#[derive(Parser)]
#[command(
    name = "cardbatch",
    about = "Convert corporate-card CSV exports into MDS invoice batches."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up cardbatch: choose input/output folders and save settings.
    Init {
        /// Folder where card export CSVs are dropped
        #[arg(long = "input-dir")]
        input_dir: Option<String>,
        /// Folder for batches, receipts and side files
        #[arg(long = "output-dir")]
        output_dir: Option<String>,
    },
    /// Transform a card export into an invoice batch and generate the
    /// receipt-download side files.
    Process {
        /// Card export CSV (default: newest CSV in the input folder)
        file: Option<String>,
        /// Batch output path (default: generated name in the output folder)
        #[arg(long)]
        output: Option<String>,
        /// Skip running the browser launcher script
        #[arg(long = "no-launch")]
        no_launch: bool,
    },
    /// Match downloaded receipts to transactions, convert them to PDF and
    /// rewrite the latest batch.
    Collect {
        /// Card export CSV (default: newest CSV in the input folder)
        file: Option<String>,
        /// Receipt holding area (default: platform downloads folder)
        #[arg(long = "downloads-dir")]
        downloads_dir: Option<String>,
        /// Recency window in minutes for download candidates
        #[arg(long)]
        window: Option<u64>,
    },
    /// Check that every expected receipt file exists (sanity check).
    Verify {
        /// Card export CSV (default: newest CSV in the input folder)
        file: Option<String>,
    },
    /// Show configured folders and the latest batch.
    Status,
}

// ---------------------------------------------------------------------------
// File resolution helpers
// ---------------------------------------------------------------------------

/// Newest CSV in the input folder, matching how exports pile up over time.
pub(crate) fn newest_input_csv(input_dir: &Path) -> Result<PathBuf> {
    newest_matching(input_dir, |name| name.to_lowercase().ends_with(".csv"))
        .ok_or_else(|| CardbatchError::NoInput(input_dir.display().to_string()))
}

/// Latest generated batch in the output folder.
pub(crate) fn latest_batch_csv(output_dir: &Path) -> Result<PathBuf> {
    newest_matching(output_dir, |name| {
        name.contains("_MDS_READY_") && name.to_lowercase().ends_with(".csv")
    })
    .ok_or_else(|| CardbatchError::NoBatch(output_dir.display().to_string()))
}

fn newest_matching(dir: &Path, keep: impl Fn(&str) -> bool) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut files: Vec<(std::time::SystemTime, PathBuf)> = entries
        .flatten()
        .filter_map(|entry| {
            let path = entry.path();
            let name = path.file_name()?.to_str()?;
            if !path.is_file() || !keep(name) {
                return None;
            }
            let modified = entry.metadata().ok()?.modified().ok()?;
            Some((modified, path))
        })
        .collect();
    files.sort_by(|a, b| b.0.cmp(&a.0));
    files.into_iter().next().map(|(_, path)| path)
}

pub(crate) fn resolve_input(file: Option<String>, input_dir: &Path) -> Result<PathBuf> {
    match file {
        Some(f) => Ok(PathBuf::from(f)),
        None => newest_input_csv(input_dir),
    }
}
