use std::collections::BTreeMap;
use std::path::Path;

use crate::codec;
use crate::error::{CardbatchError, Result};
use crate::models::{ImageResolution, InvoiceRecord, SourceTransaction};
use crate::settings::Settings;

/// Map the filtered transactions into upload records, order-preserving with
/// a dense 1-based sequence. `resolutions` is keyed by load index; rows
/// without an entry fall through to the deterministic generated filename so
/// the file-spec column is never empty.
pub fn build_batch(
    filtered: &[SourceTransaction],
    resolutions: &BTreeMap<usize, ImageResolution>,
    settings: &Settings,
) -> Vec<InvoiceRecord> {
    filtered
        .iter()
        .enumerate()
        .map(|(i, tx)| {
            let sequence = i + 1;
            let amount = tx.amount.unwrap_or(0.0);
            let id_or_index = match tx.ref_id.as_deref() {
                Some(r) if !r.is_empty() => r.to_string(),
                _ => tx.index.to_string(),
            };
            let composite = format!("{id_or_index}_{}_{amount}", tx.transaction_date);
            InvoiceRecord {
                sequence,
                company_code: settings.company_code.clone(),
                vendor_account: settings.vendor_account.clone(),
                invoice_amount: amount,
                gl_amount_1: amount,
                hash_input: codec::hash_input(tx.ref_id.as_deref(), tx.index, &tx.transaction_date),
                invoice_number: codec::invoice_number(&composite),
                invoice_date: codec::format_mmddyy(&tx.transaction_date),
                due_date: codec::due_date_mmddyy(&tx.transaction_date, settings.due_date_offset_days),
                description: codec::invoice_description(
                    tx.vendor_name.as_deref(),
                    tx.purpose.as_deref(),
                ),
                gl_account_ba: tx
                    .gl_ba
                    .clone()
                    .filter(|c| !c.is_empty())
                    .unwrap_or_else(|| settings.gl_fallback_ba.clone()),
                gl_account_bb: tx.gl_bb.clone().unwrap_or_default(),
                gl_account_bc: tx.gl_bc.clone().unwrap_or_default(),
                image_file_spec: resolve_file_spec(tx, sequence, resolutions.get(&tx.index)),
            }
        })
        .collect()
}

/// Filename only, no directory. Converted PDF beats the relocated download
/// beats the generated fallback.
fn resolve_file_spec(
    tx: &SourceTransaction,
    sequence: usize,
    resolution: Option<&ImageResolution>,
) -> String {
    if let Some(res) = resolution {
        let preferred = [res.pdf_path.as_deref(), res.local_path.as_deref()];
        for path in preferred.into_iter().flatten() {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                return name.to_string();
            }
        }
    }
    codec::fallback_pdf_filename(sequence, &tx.transaction_date, tx.vendor_name.as_deref())
}

/// Serialize the whole batch in memory, then write in one operation so a
/// failed write never leaves a torn file behind.
pub fn write_batch(records: &[InvoiceRecord], path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for record in records {
        wtr.serialize(record)?;
    }
    let buf = wtr
        .into_inner()
        .map_err(|e| CardbatchError::Other(format!("Batch serialization failed: {e}")))?;
    std::fs::write(path, buf)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn acme_tx() -> SourceTransaction {
        SourceTransaction {
            index: 0,
            amount: Some(45.0),
            transaction_date: "2025-01-10".to_string(),
            vendor_name: Some("Acme Corp".to_string()),
            purpose: Some("Client lunch".to_string()),
            gl_ba: Some("4470".to_string()),
            gl_bb: None,
            gl_bc: None,
            ref_id: Some("TXN12345678".to_string()),
            image_url: None,
        }
    }

    #[test]
    fn test_build_acme_scenario() {
        let records = build_batch(&[acme_tx()], &BTreeMap::new(), &Settings::default());
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.sequence, 1);
        assert_eq!(r.company_code, "BLM");
        assert_eq!(r.vendor_account, "AMEX");
        assert_eq!(r.invoice_amount, 45.0);
        assert_eq!(r.gl_amount_1, 45.0);
        assert_eq!(r.hash_input, "TXN1234567,2025-01-10");
        assert_eq!(r.invoice_number.len(), 8);
        assert_eq!(r.invoice_date, "01/10/25");
        assert_eq!(r.due_date, "01/18/25");
        assert_eq!(r.description, "Acme Corp | Client lunch");
        assert_eq!(r.gl_account_ba, "4470");
        assert_eq!(r.gl_account_bb, "");
        assert_eq!(r.gl_account_bc, "");
        assert_eq!(
            r.image_file_spec,
            "0001-2025-01_amex_expense_-_Acme_Corp.pdf"
        );
    }

    #[test]
    fn test_amount_invariant_and_dense_sequence() {
        let mut a = acme_tx();
        a.index = 2; // survived a filter that dropped rows 0 and 1
        let mut b = acme_tx();
        b.index = 5;
        b.amount = Some(19.99);
        let records = build_batch(&[a, b], &BTreeMap::new(), &Settings::default());
        let sequences: Vec<usize> = records.iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![1, 2]);
        for r in &records {
            assert_eq!(r.invoice_amount, r.gl_amount_1);
            assert!(r.invoice_amount > 0.0);
            assert!(!r.image_file_spec.is_empty());
        }
    }

    #[test]
    fn test_gl_fallback_applied_when_absent() {
        let mut tx = acme_tx();
        tx.gl_ba = None;
        let records = build_batch(&[tx], &BTreeMap::new(), &Settings::default());
        assert_eq!(records[0].gl_account_ba, "4470");

        let mut tx = acme_tx();
        tx.gl_ba = Some("5100".to_string());
        let records = build_batch(&[tx], &BTreeMap::new(), &Settings::default());
        assert_eq!(records[0].gl_account_ba, "5100");
    }

    #[test]
    fn test_file_spec_prefers_pdf_then_local() {
        let mut resolutions = BTreeMap::new();
        resolutions.insert(
            0,
            ImageResolution {
                local_path: Some(PathBuf::from("/images/0000_TXN12345_r.png")),
                pdf_path: Some(PathBuf::from("/images/0000_TXN12345_r.pdf")),
            },
        );
        let records = build_batch(&[acme_tx()], &resolutions, &Settings::default());
        assert_eq!(records[0].image_file_spec, "0000_TXN12345_r.pdf");

        resolutions.get_mut(&0).unwrap().pdf_path = None;
        let records = build_batch(&[acme_tx()], &resolutions, &Settings::default());
        assert_eq!(records[0].image_file_spec, "0000_TXN12345_r.png");
    }

    #[test]
    fn test_invoice_number_stable_across_builds() {
        let first = build_batch(&[acme_tx()], &BTreeMap::new(), &Settings::default());
        let second = build_batch(&[acme_tx()], &BTreeMap::new(), &Settings::default());
        assert_eq!(first[0].invoice_number, second[0].invoice_number);
        assert_eq!(first[0].hash_input, second[0].hash_input);
    }

    #[test]
    fn test_unparseable_date_degrades_to_blank_fields() {
        let mut tx = acme_tx();
        tx.transaction_date = "not-a-date".to_string();
        let records = build_batch(&[tx], &BTreeMap::new(), &Settings::default());
        assert_eq!(records[0].invoice_date, "");
        assert_eq!(records[0].due_date, "");
        // The record itself survives
        assert_eq!(records[0].invoice_amount, 45.0);
        assert!(!records[0].image_file_spec.is_empty());
    }

    #[test]
    fn test_write_batch_headers_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.csv");
        let records = build_batch(&[acme_tx()], &BTreeMap::new(), &Settings::default());
        write_batch(&records, &path).unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        let mut lines = body.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("Unnamed: 0,Company Code,Vendor Account,Invoice Amount"));
        assert!(header.ends_with("Image File Spec"));
        let row = lines.next().unwrap();
        assert!(row.contains("Acme Corp | Client lunch"));
        assert!(row.contains("01/18/25"));
    }
}
