use std::io;
use thiserror::Error;

use gdtools_core::GenomeDiffError;
use gdtools_refseq::RefSeqError;

/// Error type for converting Genome Diff files to and from other formats.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Invalid VCF line {line_number}: {message}")]
    InvalidVcfLine { line_number: usize, message: String },

    #[error("Cannot convert {kind} record {id} to GVF: {message}")]
    Unconvertible {
        kind: String,
        id: String,
        message: String,
    },

    #[error(transparent)]
    GenomeDiff(#[from] GenomeDiffError),

    #[error(transparent)]
    Reference(#[from] RefSeqError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result type alias for format conversions.
pub type Result<T> = std::result::Result<T, ConvertError>;
