use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[cfg(feature = "pdf")]
use crate::convert;
use crate::builder;
use crate::error::Result;
use crate::importer::{self, FilterResult};
use crate::manifest;
use crate::matcher;
use crate::models::{ImageResolution, InvoiceRecord};
use crate::settings::Settings;

// ---------------------------------------------------------------------------
// process: card export -> invoice batch + download side files
// ---------------------------------------------------------------------------

pub struct ProcessSummary {
    pub loaded: usize,
    pub removed: usize,
    pub records: Vec<InvoiceRecord>,
    pub with_images: usize,
    /// None when filtering left nothing to write.
    pub output_path: Option<PathBuf>,
    pub manifest_path: Option<PathBuf>,
    pub launcher_path: Option<PathBuf>,
}

pub fn process(input: &Path, output: &Path, settings: &Settings) -> Result<ProcessSummary> {
    let rows = importer::load_transactions(input)?;
    let loaded = rows.len();
    let FilterResult { kept, removed } = importer::filter_positive(rows);

    if kept.is_empty() {
        return Ok(ProcessSummary {
            loaded,
            removed,
            records: Vec::new(),
            with_images: 0,
            output_path: None,
            manifest_path: None,
            launcher_path: None,
        });
    }

    let output_dir = batch_dir(output);
    std::fs::create_dir_all(&output_dir)?;

    let with_images = kept.iter().filter(|t| t.has_image()).count();
    let (manifest_path, launcher_path) = if with_images > 0 {
        (
            Some(manifest::write_url_manifest(&kept, &output_dir)?),
            Some(manifest::write_launcher_script(&kept, &output_dir)?),
        )
    } else {
        (None, None)
    };

    // First pass runs before any download exists; every file-spec comes from
    // the deterministic fallback until `collect` rewrites the batch.
    let records = builder::build_batch(&kept, &BTreeMap::new(), settings);
    builder::write_batch(&records, output)?;

    Ok(ProcessSummary {
        loaded,
        removed,
        records,
        with_images,
        output_path: Some(output.to_path_buf()),
        manifest_path,
        launcher_path,
    })
}

// ---------------------------------------------------------------------------
// collect: downloaded receipts -> matched/converted images + rewritten batch
// ---------------------------------------------------------------------------

pub struct CollectSummary {
    pub candidates: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub failed_moves: usize,
    pub leftovers: Vec<String>,
    #[cfg(feature = "pdf")]
    pub conversion: convert::ConversionSummary,
    pub records: usize,
    pub output_path: PathBuf,
}

pub fn collect(
    input: &Path,
    batch_csv: &Path,
    holding_dir: &Path,
    settings: &Settings,
) -> Result<CollectSummary> {
    let rows = importer::load_transactions(input)?;
    let kept = importer::filter_positive(rows).kept;

    let window = Duration::from_secs(settings.recency_window_minutes * 60);
    let pool = matcher::discover_candidates(holding_dir, window)?;
    let candidates = pool.len();

    let images_dir = batch_dir(batch_csv);
    std::fs::create_dir_all(&images_dir)?;
    let outcome = matcher::match_candidates(&kept, pool, &images_dir)?;

    let mut resolutions: BTreeMap<usize, ImageResolution> = BTreeMap::new();
    for assignment in &outcome.assignments {
        resolutions.entry(assignment.index).or_default().local_path =
            Some(assignment.path.clone());
    }

    #[cfg(feature = "pdf")]
    let conversion = convert::process_images(&mut resolutions, &images_dir);

    let records = builder::build_batch(&kept, &resolutions, settings);
    builder::write_batch(&records, batch_csv)?;

    Ok(CollectSummary {
        candidates,
        matched: outcome.assignments.len(),
        unmatched: outcome.unmatched,
        failed_moves: outcome.failed_moves,
        leftovers: outcome.leftovers.into_iter().map(|c| c.name).collect(),
        #[cfg(feature = "pdf")]
        conversion,
        records: records.len(),
        output_path: batch_csv.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// verify: pure existence check of previously matched receipts
// ---------------------------------------------------------------------------

pub fn verify(input: &Path, images_dir: &Path) -> Result<matcher::VerifyOutcome> {
    let rows = importer::load_transactions(input)?;
    let kept = importer::filter_positive(rows).kept;
    Ok(matcher::verify_assignments(&kept, images_dir))
}

fn batch_dir(batch_csv: &Path) -> PathBuf {
    batch_csv
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf()
}
