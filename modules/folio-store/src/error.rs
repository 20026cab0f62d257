use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FolioError {
    #[error("Folio not found: {0}")]
    NotFound(String),

    #[error("Folio already exists: {0}")]
    AlreadyExists(String),

    #[error("Note index {index} out of range (folio has {len} notes)")]
    OutOfRange { index: i64, len: usize },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error in {} row {row}: {reason}", path.display())]
    Parse {
        path: PathBuf,
        row: usize,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, FolioError>;
