use std::sync::OnceLock;

use chrono::{Duration, NaiveDate};
use regex::Regex;
use sha2::{Digest, Sha256};

/// Date layouts seen in card exports, tried in order.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y"];

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    // Some exports append a time component; the date prefix is enough.
    let raw = raw.trim().split_whitespace().next().unwrap_or("");
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
}

/// 8-character uppercase hex invoice number derived from the composite key
/// `{refIdOrIndex}_{rawDate}_{amount}`. Deterministic; collisions across a
/// batch are accepted as negligible, not prevented.
pub fn invoice_number(composite: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(composite.as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..8].to_uppercase()
}

/// CRC hash-input string the upload system re-verifies downstream:
/// `{refId truncated to 10 chars, or load index},{ISO date}`.
pub fn hash_input(ref_id: Option<&str>, index: usize, raw_date: &str) -> String {
    let base = match ref_id {
        Some(id) if !id.is_empty() => id.chars().take(10).collect::<String>(),
        _ => index.to_string(),
    };
    let iso = parse_date(raw_date)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    format!("{base},{iso}")
}

/// MM/DD/YY, or empty string when the date cannot be parsed. The blank
/// propagates to the output field; it never fails the row.
pub fn format_mmddyy(raw_date: &str) -> String {
    parse_date(raw_date)
        .map(|d| d.format("%m/%d/%y").to_string())
        .unwrap_or_default()
}

/// Transaction date plus the payment offset, MM/DD/YY. Same blank-on-error
/// policy as `format_mmddyy`.
pub fn due_date_mmddyy(raw_date: &str, offset_days: i64) -> String {
    parse_date(raw_date)
        .map(|d| (d + Duration::days(offset_days)).format("%m/%d/%y").to_string())
        .unwrap_or_default()
}

fn non_filename_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s-]").unwrap())
}

fn whitespace_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Reduce free text to something safe inside a filename: word characters and
/// hyphens survive, whitespace runs collapse to a single underscore, capped
/// at 50 characters. Missing text becomes the literal "unknown".
pub fn clean_for_filename(text: Option<&str>) -> String {
    let Some(text) = text else {
        return "unknown".to_string();
    };
    let stripped = non_filename_chars().replace_all(text, "");
    let cleaned = whitespace_runs().replace_all(&stripped, "_");
    cleaned.chars().take(50).collect()
}

pub fn invoice_description(vendor: Option<&str>, purpose: Option<&str>) -> String {
    format!(
        "{} | {}",
        vendor.unwrap_or("Unknown Vendor"),
        purpose.unwrap_or("Expense")
    )
}

/// Deterministic receipt filename for records that never got an image, so
/// the file-spec column is always populated. Unparseable dates fall back to
/// the 2025-01 stamp the legacy exports carried.
pub fn fallback_pdf_filename(sequence: usize, raw_date: &str, vendor: Option<&str>) -> String {
    let (year, month) = match parse_date(raw_date) {
        Some(d) => (d.format("%Y").to_string(), d.format("%m").to_string()),
        None => ("2025".to_string(), "01".to_string()),
    };
    format!(
        "{sequence:04}-{year}-{month}_amex_expense_-_{}.pdf",
        clean_for_filename(vendor)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        assert_eq!(parse_date("2025-01-10"), Some(expected));
        assert_eq!(parse_date("01/10/2025"), Some(expected));
        assert_eq!(parse_date("01/10/25"), Some(expected));
        assert_eq!(parse_date("2025-01-10 14:30:00"), Some(expected));
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_invoice_number_deterministic() {
        let a = invoice_number("TXN12345678_2025-01-10_45");
        let b = invoice_number("TXN12345678_2025-01-10_45");
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
        assert_eq!(a, a.to_uppercase());
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_invoice_number_varies_with_input() {
        assert_ne!(
            invoice_number("TXN1_2025-01-10_45"),
            invoice_number("TXN2_2025-01-10_45")
        );
    }

    #[test]
    fn test_hash_input_truncates_ref_id() {
        assert_eq!(
            hash_input(Some("TXN12345678"), 0, "2025-01-10"),
            "TXN1234567,2025-01-10"
        );
    }

    #[test]
    fn test_hash_input_falls_back_to_index() {
        assert_eq!(hash_input(None, 7, "2025-01-10"), "7,2025-01-10");
        assert_eq!(hash_input(Some(""), 7, "2025-01-10"), "7,2025-01-10");
    }

    #[test]
    fn test_format_mmddyy() {
        assert_eq!(format_mmddyy("2025-01-10"), "01/10/25");
        assert_eq!(format_mmddyy("garbage"), "");
    }

    #[test]
    fn test_due_date_adds_offset() {
        assert_eq!(due_date_mmddyy("2025-01-10", 8), "01/18/25");
        // Offset crossing a month boundary
        assert_eq!(due_date_mmddyy("2025-01-28", 8), "02/05/25");
        assert_eq!(due_date_mmddyy("garbage", 8), "");
    }

    #[test]
    fn test_clean_for_filename() {
        assert_eq!(clean_for_filename(Some("Acme Corp")), "Acme_Corp");
        assert_eq!(clean_for_filename(Some("A&B, Inc.")), "AB_Inc");
        assert_eq!(clean_for_filename(Some("co-op  store")), "co-op_store");
        assert_eq!(clean_for_filename(None), "unknown");
    }

    #[test]
    fn test_clean_for_filename_truncates() {
        let long = "x".repeat(80);
        assert_eq!(clean_for_filename(Some(&long)).len(), 50);
    }

    #[test]
    fn test_invoice_description_defaults() {
        assert_eq!(
            invoice_description(Some("Acme Corp"), Some("Client lunch")),
            "Acme Corp | Client lunch"
        );
        assert_eq!(
            invoice_description(None, None),
            "Unknown Vendor | Expense"
        );
        assert_eq!(
            invoice_description(None, Some("Taxi")),
            "Unknown Vendor | Taxi"
        );
    }

    #[test]
    fn test_fallback_pdf_filename() {
        assert_eq!(
            fallback_pdf_filename(1, "2025-01-10", Some("Acme Corp")),
            "0001-2025-01_amex_expense_-_Acme_Corp.pdf"
        );
    }

    #[test]
    fn test_fallback_pdf_filename_bad_date() {
        assert_eq!(
            fallback_pdf_filename(12, "???", None),
            "0012-2025-01_amex_expense_-_unknown.pdf"
        );
    }
}
