use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One row of the card provider's CSV export. Immutable once loaded;
/// `index` is the row's position in the loaded batch and doubles as its
/// identity when no ref id was exported.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceTransaction {
    #[serde(skip)]
    pub index: usize,
    #[serde(
        rename = "Billing Total Gross Amount",
        deserialize_with = "crate::importer::de_amount"
    )]
    pub amount: Option<f64>,
    #[serde(rename = "Transaction Date")]
    pub transaction_date: String,
    #[serde(rename = "Vendor Name")]
    pub vendor_name: Option<String>,
    #[serde(rename = "Description 1 (what the user types - typically purpose of expense)")]
    pub purpose: Option<String>,
    #[serde(rename = "Field 1 value code")]
    pub gl_ba: Option<String>,
    #[serde(rename = "Field 2 value code")]
    pub gl_bb: Option<String>,
    #[serde(rename = "Field 3 value code")]
    pub gl_bc: Option<String>,
    #[serde(rename = "Transaction Ref. ID", default)]
    pub ref_id: Option<String>,
    #[serde(rename = "Image URL", default)]
    pub image_url: Option<String>,
}

impl SourceTransaction {
    pub fn has_image(&self) -> bool {
        self.image_url.as_deref().is_some_and(|u| !u.is_empty())
    }
}

/// One row of the MDS upload file. Header names and order are the upload
/// system's wire format, including the leading "Unnamed: 0" sequence column.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceRecord {
    #[serde(rename = "Unnamed: 0")]
    pub sequence: usize,
    #[serde(rename = "Company Code")]
    pub company_code: String,
    #[serde(rename = "Vendor Account")]
    pub vendor_account: String,
    #[serde(rename = "Invoice Amount")]
    pub invoice_amount: f64,
    #[serde(rename = "GL Amount 1")]
    pub gl_amount_1: f64,
    #[serde(rename = "Invoice Number CRC32 Hash Input String")]
    pub hash_input: String,
    #[serde(rename = "Invoice Number")]
    pub invoice_number: String,
    #[serde(rename = "Invoice Date MMDDYY")]
    pub invoice_date: String,
    #[serde(rename = "Due Date MMDDYY")]
    pub due_date: String,
    #[serde(rename = "Invoice Description")]
    pub description: String,
    #[serde(rename = "GL Account BA")]
    pub gl_account_ba: String,
    #[serde(rename = "GL Account BB")]
    pub gl_account_bb: String,
    #[serde(rename = "GL Account BC")]
    pub gl_account_bc: String,
    #[serde(rename = "Image File Spec")]
    pub image_file_spec: String,
}

/// Receipt files resolved for a transaction: `local_path` is the relocated
/// download, `pdf_path` the converted document.
#[derive(Debug, Clone, Default)]
pub struct ImageResolution {
    pub local_path: Option<PathBuf>,
    pub pdf_path: Option<PathBuf>,
}
