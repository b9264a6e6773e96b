use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::fmt::money;
use crate::matcher::expected_filename;
use crate::models::SourceTransaction;

pub const MANIFEST_NAME: &str = "receipt_image_urls.txt";
#[cfg(windows)]
pub const LAUNCHER_NAME: &str = "open_receipt_urls.bat";
#[cfg(not(windows))]
pub const LAUNCHER_NAME: &str = "open_receipt_urls.sh";

/// Seconds between browser tabs so the portal isn't hammered and the human
/// can keep up with the save dialogs.
const PACING_SECONDS: u64 = 2;
const LAUNCHER_WAIT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// URL manifest
// ---------------------------------------------------------------------------

/// Human-readable download worksheet: one block per transaction with an
/// image, listing what to fetch and the filename to save it under.
pub fn write_url_manifest(transactions: &[SourceTransaction], output_dir: &Path) -> Result<PathBuf> {
    let mut body = String::new();
    body.push_str("RECEIPT IMAGE URLS FOR MANUAL DOWNLOAD\n");
    body.push_str(&"=".repeat(50));
    body.push_str("\nINSTRUCTIONS:\n");
    body.push_str("1. Make sure you are logged into the card portal in your browser\n");
    body.push_str("2. Open each URL below (or run the launcher script)\n");
    body.push_str("3. Save each image into your downloads folder\n");
    body.push_str("4. Use the suggested filename shown below each URL\n");
    body.push_str(&"=".repeat(50));
    body.push_str("\n\n");

    for tx in transactions {
        let Some(url) = tx.image_url.as_deref().filter(|u| !u.is_empty()) else {
            continue;
        };
        let save_as = expected_filename(tx.index, tx.ref_id.as_deref(), url);
        let _ = writeln!(body, "Transaction {}:", tx.index + 1);
        let _ = writeln!(
            body,
            "Vendor: {}",
            tx.vendor_name.as_deref().unwrap_or("Unknown")
        );
        let _ = writeln!(body, "Amount: {}", money(tx.amount.unwrap_or(0.0)));
        let _ = writeln!(body, "Date: {}", tx.transaction_date);
        let _ = writeln!(body, "URL: {url}");
        let _ = writeln!(body, "Save as: {save_as}");
        body.push_str(&"-".repeat(40));
        body.push_str("\n\n");
    }

    let path = output_dir.join(MANIFEST_NAME);
    std::fs::write(&path, body)?;
    Ok(path)
}

// ---------------------------------------------------------------------------
// Launcher script
// ---------------------------------------------------------------------------

/// Script that opens every receipt URL in the default browser with a short
/// pacing delay between tabs.
pub fn write_launcher_script(
    transactions: &[SourceTransaction],
    output_dir: &Path,
) -> Result<PathBuf> {
    let urls: Vec<&str> = transactions
        .iter()
        .filter_map(|tx| tx.image_url.as_deref().filter(|u| !u.is_empty()))
        .collect();

    let path = output_dir.join(LAUNCHER_NAME);
    std::fs::write(&path, launcher_body(&urls))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    }
    Ok(path)
}

#[cfg(windows)]
fn launcher_body(urls: &[&str]) -> String {
    let mut body = String::from("@echo off\r\necho Opening receipt URLs in browser...\r\n");
    for url in urls {
        let _ = writeln!(body, "start \"\" \"{url}\"\r");
        let _ = writeln!(body, "timeout /t {PACING_SECONDS} /nobreak > nul\r");
    }
    body
}

#[cfg(not(windows))]
fn launcher_body(urls: &[&str]) -> String {
    let mut body = String::from(
        "#!/bin/sh\n\
         # Opens each receipt URL with a short delay between tabs.\n\
         opener=$(command -v xdg-open || command -v open)\n",
    );
    for url in urls {
        let quoted = url.replace('\'', "'\\''");
        let _ = writeln!(body, "\"$opener\" '{quoted}'");
        let _ = writeln!(body, "sleep {PACING_SECONDS}");
    }
    body
}

/// Best-effort run of the launcher: spawn it, wait a bounded time, then get
/// out of the way. URLs keep opening in the background either way, so
/// nothing here is ever fatal.
pub fn run_launcher(script: &Path) -> bool {
    if !script.exists() {
        eprintln!("warning: launcher script not found: {}", script.display());
        return false;
    }
    let spawned = if cfg!(windows) {
        Command::new("cmd").arg("/C").arg(script).spawn()
    } else {
        Command::new("sh").arg(script).spawn()
    };
    let mut child = match spawned {
        Ok(child) => child,
        Err(e) => {
            eprintln!("warning: could not run launcher script: {e}");
            return false;
        }
    };

    let deadline = Instant::now() + LAUNCHER_WAIT;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return status.success(),
            Ok(None) if Instant::now() >= deadline => return true,
            Ok(None) => std::thread::sleep(Duration::from_millis(250)),
            Err(e) => {
                eprintln!("warning: launcher script: {e}");
                return false;
            }
        }
    }
}
