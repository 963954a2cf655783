// ==========================================
// Invoice Ingest - Parser Error Types
// ==========================================
// File-scoped errors abort the whole operation and surface to the
// caller. Row-scoped problems are RowError values (domain::types),
// recorded in the batch result and never raised.
// ==========================================

use thiserror::Error;

/// File-scoped parser errors.
#[derive(Error, Debug)]
pub enum ParseError {
    // ===== file supply =====
    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("unsupported file extension: {0} (expected .csv or .txt)")]
    UnsupportedFormat(String),

    #[error("file too large: {size} bytes (ceiling {ceiling})")]
    FileTooLarge { size: u64, ceiling: u64 },

    #[error("file read failed: {0}")]
    FileReadError(String),

    // ===== generic =====
    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for ParseError {
    fn from(err: std::io::Error) -> Self {
        ParseError::FileReadError(err.to_string())
    }
}

/// Result alias for file-scoped operations.
pub type ParseResult<T> = Result<T, ParseError>;
