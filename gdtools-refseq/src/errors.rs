use std::io;
use thiserror::Error;

/// Error type for reference sequence loading and editing.
#[derive(Error, Debug)]
pub enum RefSeqError {
    #[error("Reference sequence not found: {0}")]
    UnknownSequence(String),

    #[error("Requested range {start}-{end} is outside of reference sequence {seq_id} (length {length})")]
    OutOfRange {
        seq_id: String,
        start: i64,
        end: i64,
        length: i64,
    },

    #[error("Could not parse region: {0}")]
    InvalidRegion(String),

    #[error("Repeat family not found in reference sequences: {0}")]
    RepeatFamilyNotFound(String),

    #[error("Unsupported reference sequence file type: {0}")]
    UnsupportedFormat(String),

    #[error("Error parsing {file} at line {line}: {message}")]
    Parse {
        file: String,
        line: usize,
        message: String,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result type alias for reference sequence operations.
pub type Result<T> = std::result::Result<T, RefSeqError>;
