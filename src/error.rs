use thiserror::Error;

#[derive(Error, Debug)]
pub enum CardbatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("No card export CSV found in {0}")]
    NoInput(String),

    #[error("No processed batch found in {0} (run `cardbatch process` first)")]
    NoBatch(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("PDF conversion error: {0}")]
    Pdf(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CardbatchError>;
