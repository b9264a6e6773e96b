use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::error::Result;
use crate::models::SourceTransaction;

/// File types a browser download of a receipt can plausibly be.
const CANDIDATE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "gif", "bmp", "webp", "pdf"];

/// A file found in the holding area that may be a freshly downloaded receipt.
#[derive(Debug, Clone)]
pub struct ImageCandidate {
    pub path: PathBuf,
    pub name: String,
    pub modified: SystemTime,
}

/// A transaction (by load index) paired with the receipt file relocated for it.
#[derive(Debug, Clone)]
pub struct MatchAssignment {
    pub index: usize,
    pub path: PathBuf,
}

#[derive(Debug)]
pub struct MatchOutcome {
    pub assignments: Vec<MatchAssignment>,
    /// Candidates no transaction claimed, left for manual reconciliation.
    pub leftovers: Vec<ImageCandidate>,
    /// Transactions with an image URL that found no candidate.
    pub unmatched: usize,
    pub failed_moves: usize,
}

#[derive(Debug, Default)]
pub struct VerifyOutcome {
    pub with_images: usize,
    pub found: Vec<MatchAssignment>,
    /// Expected filenames absent from the working image area.
    pub missing: Vec<String>,
}

// ---------------------------------------------------------------------------
// Candidate discovery
// ---------------------------------------------------------------------------

/// List receipt-shaped files in the holding area modified within `window`.
/// Sorted oldest-first (name as tie-break) so the pool is scanned in
/// download order and repeated runs see a stable order.
pub fn discover_candidates(holding_dir: &Path, window: Duration) -> Result<Vec<ImageCandidate>> {
    let mut found = Vec::new();
    if !holding_dir.exists() {
        return Ok(found);
    }
    let now = SystemTime::now();
    for entry in std::fs::read_dir(holding_dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let ext_ok = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| CANDIDATE_EXTENSIONS.contains(&e.to_lowercase().as_str()));
        if !ext_ok {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        // A clock-skewed future mtime still counts as fresh.
        let fresh = now.duration_since(modified).map_or(true, |age| age <= window);
        if !fresh {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(String::from) else {
            continue;
        };
        found.push(ImageCandidate { path, name, modified });
    }
    found.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.name.cmp(&b.name)));
    Ok(found)
}

// ---------------------------------------------------------------------------
// Filename derivation
// ---------------------------------------------------------------------------

/// The portion of the URL path after the final `/`, without query string or
/// fragment. Falls back to "receipt.png" when the URL carries no filename.
pub fn last_url_segment(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path.rsplit('/').next().unwrap_or("");
    if segment.is_empty() {
        "receipt.png".to_string()
    } else {
        segment.to_string()
    }
}

/// Canonical name a matched receipt gets in the working image area:
/// `{index:04}_{first 8 chars of ref id or synthesized id}_{url filename}`.
pub fn expected_filename(index: usize, ref_id: Option<&str>, url: &str) -> String {
    let id = match ref_id {
        Some(r) if !r.is_empty() => r.to_string(),
        _ => format!("txn_{index}"),
    };
    let id8: String = id.chars().take(8).collect();
    format!("{index:04}_{id8}_{}", last_url_segment(url))
}

// ---------------------------------------------------------------------------
// Greedy match pass
// ---------------------------------------------------------------------------

/// Best-effort assignment of downloaded files to transactions expecting an
/// image. For each transaction, in order, the first remaining candidate whose
/// name case-insensitively contains the URL-derived filename wins and is
/// relocated into `images_dir` under its expected name; claimed candidates
/// leave the pool immediately so they can never double-match. Purely a
/// filename heuristic: it cannot tell two downloads with a shared suffix
/// apart, and unmatched rows are data for the operator, not errors.
pub fn match_candidates(
    transactions: &[SourceTransaction],
    mut pool: Vec<ImageCandidate>,
    images_dir: &Path,
) -> Result<MatchOutcome> {
    std::fs::create_dir_all(images_dir)?;

    let mut assignments = Vec::new();
    let mut unmatched = 0usize;
    let mut failed_moves = 0usize;

    for tx in transactions {
        let Some(url) = tx.image_url.as_deref().filter(|u| !u.is_empty()) else {
            continue;
        };
        let original = last_url_segment(url).to_lowercase();
        let target_name = expected_filename(tx.index, tx.ref_id.as_deref(), url);

        let mut matched = false;
        let mut pos = 0;
        while pos < pool.len() {
            if !pool[pos].name.to_lowercase().contains(&original) {
                pos += 1;
                continue;
            }
            let target = images_dir.join(&target_name);
            match move_file(&pool[pos].path, &target) {
                Ok(()) => {
                    pool.remove(pos);
                    assignments.push(MatchAssignment {
                        index: tx.index,
                        path: target,
                    });
                    matched = true;
                    break;
                }
                Err(e) => {
                    eprintln!("warning: could not move {}: {e}", pool[pos].name);
                    failed_moves += 1;
                    pos += 1;
                }
            }
        }
        if !matched {
            unmatched += 1;
        }
    }

    Ok(MatchOutcome {
        assignments,
        leftovers: pool,
        unmatched,
        failed_moves,
    })
}

/// Rename where possible; the downloads folder and the image area may sit on
/// different filesystems, so fall back to copy + delete.
fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    match std::fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(_) => {
            std::fs::copy(from, to)?;
            std::fs::remove_file(from)
        }
    }
}

// ---------------------------------------------------------------------------
// Verification pass
// ---------------------------------------------------------------------------

/// The inverse check: does each expected filename exist in the image area?
/// No scanning, no matching, no writes; safe to repeat any number of times.
pub fn verify_assignments(transactions: &[SourceTransaction], images_dir: &Path) -> VerifyOutcome {
    let mut out = VerifyOutcome::default();
    for tx in transactions {
        let Some(url) = tx.image_url.as_deref().filter(|u| !u.is_empty()) else {
            continue;
        };
        out.with_images += 1;
        let name = expected_filename(tx.index, tx.ref_id.as_deref(), url);
        let path = images_dir.join(&name);
        if path.exists() {
            out.found.push(MatchAssignment {
                index: tx.index,
                path,
            });
        } else {
            out.missing.push(name);
        }
    }
    out
}
