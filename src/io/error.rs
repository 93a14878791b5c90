//! Error types for bounded file loading.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file too large: {found} bytes exceeds limit of {limit}")]
    FileTooLarge { limit: u64, found: u64 },
}

pub type Result<T> = std::result::Result<T, IoError>;
