//! Error types for the cleaning pipeline.

use std::path::PathBuf;

use thiserror::Error;

use crate::geometry::InvalidFacet;

/// Result type for pipeline operations.
pub type StlResult<T> = Result<T, StlError>;

/// Fatal conditions. Any of these aborts the run before output is written.
#[derive(Debug, Error)]
pub enum StlError {
    /// Input is neither a recognizable ASCII nor binary STL.
    #[error("unrecognized STL structure: {reason}")]
    Format { reason: String },

    /// Malformed numeric content in an ASCII STL.
    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Keyword out of place or wrong vertex count in an ASCII STL.
    #[error("structure error on line {line}: {message}")]
    Structure { line: usize, message: String },

    /// Binary STL shorter than its declared facet count requires.
    #[error("truncated binary STL: expected {expected} bytes, got {actual}")]
    TruncatedFile { expected: u64, actual: u64 },

    /// Binary record carrying a NaN or infinite value.
    #[error("invalid facet record at byte {offset}: {source}")]
    InvalidValue {
        offset: u64,
        #[source]
        source: InvalidFacet,
    },

    #[error("{count} facets exceed the binary STL facet limit")]
    TooManyFacets { count: usize },

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("input and output must be different files: {}", path.display())]
    SameInputOutput { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StlError {
    pub fn format(reason: impl Into<String>) -> Self {
        Self::Format {
            reason: reason.into(),
        }
    }

    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    pub fn structure(line: usize, message: impl Into<String>) -> Self {
        Self::Structure {
            line,
            message: message.into(),
        }
    }

    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Line number for ASCII grammar errors.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Parse { line, .. } | Self::Structure { line, .. } => Some(*line),
            _ => None,
        }
    }
}
