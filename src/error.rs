//! Error and warning types for size analysis.
//!
//! Fatal conditions abort the run through [`SymsizeError`]; everything
//! recoverable is accumulated as [`AnalysisWarning`] values and surfaced on
//! the final report so callers can detect degraded-fidelity results.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::formats::elf::ElfError;
use crate::io::IoError;

/// Fatal analysis errors.
#[derive(Debug, Error)]
pub enum SymsizeError {
    /// The container failed structural validation
    #[error("invalid binary format: {0}")]
    InvalidFormat(String),

    /// A header field points outside the file
    #[error("parse error at offset {offset:#x}: {message}")]
    Parse { offset: u64, message: String },

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input exceeded a configured resource ceiling
    #[error("resource limit exceeded: {0}")]
    ResourceExhausted(String),
}

impl From<ElfError> for SymsizeError {
    fn from(err: ElfError) -> Self {
        match err {
            ElfError::Truncated { offset, needed } => SymsizeError::Parse {
                offset: offset as u64,
                message: format!("truncated, needed {} bytes", needed),
            },
            ElfError::InvalidOffset { offset } => SymsizeError::Parse {
                offset: offset as u64,
                message: "offset outside file".to_string(),
            },
            ElfError::SectionOutOfBounds { offset, .. } => SymsizeError::Parse {
                offset,
                message: err.to_string(),
            },
            other => SymsizeError::InvalidFormat(other.to_string()),
        }
    }
}

impl From<IoError> for SymsizeError {
    fn from(err: IoError) -> Self {
        match err {
            IoError::Io(e) => SymsizeError::Io(e),
            IoError::FileTooLarge { .. } => SymsizeError::ResourceExhausted(err.to_string()),
        }
    }
}

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, SymsizeError>;

/// Standardized kinds of recoverable anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub enum WarningKind {
    /// A debug-info record could not be decoded and was skipped
    MalformedDebugRecord,
    /// Symbol spans within a section did not add up against its size
    InconsistentSectionTotal,
    /// A symbol or symbol table referenced a section that does not exist
    UnresolvedSectionRef,
}

/// Concrete warning with optional detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisWarning {
    pub kind: WarningKind,
    pub message: Option<String>,
}

impl AnalysisWarning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
        }
    }

    pub fn bare(kind: WarningKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }
}

impl fmt::Display for AnalysisWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{:?}: {}", self.kind, msg),
            None => write!(f, "{:?}", self.kind),
        }
    }
}
