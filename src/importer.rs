use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::error::{CardbatchError, Result};
use crate::models::SourceTransaction;

/// Columns the card export must carry; loading fails listing any that are
/// absent. "Transaction Ref. ID" and "Image URL" are optional extras.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "Billing Total Gross Amount",
    "Transaction Date",
    "Vendor Name",
    "Description 1 (what the user types - typically purpose of expense)",
    "Field 1 value code",
    "Field 2 value code",
    "Field 3 value code",
];

// ---------------------------------------------------------------------------
// Field parsing
// ---------------------------------------------------------------------------

/// Parse an exported amount. Handles thousands separators, currency symbols
/// and parenthesized negatives; anything unparseable is treated as absent so
/// the positive-amount filter drops it.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let s = raw.replace(',', "").replace('$', "");
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return inner.trim().parse::<f64>().ok().map(|v| -v);
    }
    s.parse().ok()
}

pub fn de_amount<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_amount))
}

// ---------------------------------------------------------------------------
// Load + filter
// ---------------------------------------------------------------------------

pub fn load_transactions(path: &Path) -> Result<Vec<SourceTransaction>> {
    let file = File::open(path)?;
    let mut rdr = csv::Reader::from_reader(BufReader::new(file));

    let headers = rdr.headers()?.clone();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(CardbatchError::MissingColumns(missing));
    }

    let mut rows = Vec::new();
    for (index, result) in rdr.deserialize::<SourceTransaction>().enumerate() {
        let mut tx = result?;
        tx.index = index;
        rows.push(tx);
    }
    Ok(rows)
}

pub struct FilterResult {
    pub kept: Vec<SourceTransaction>,
    /// Rows dropped as credits or invalid amounts; reported, never fatal.
    pub removed: usize,
}

/// Keep rows whose amount is present and positive. Order is preserved and
/// each kept row retains its original load index.
pub fn filter_positive(rows: Vec<SourceTransaction>) -> FilterResult {
    let total = rows.len();
    let kept: Vec<SourceTransaction> = rows
        .into_iter()
        .filter(|r| r.amount.is_some_and(|a| a > 0.0))
        .collect();
    FilterResult {
        removed: total - kept.len(),
        kept,
    }
}
