//! # gdtools-refseq
//!
//! Reference sequences and their feature annotations, as needed to apply and
//! validate Genome Diff mutations.
//!
//! ## Main Components
//!
//! - **`ReferenceSequences`**: an ordered, id-indexed set of mutable sequences
//! - **`Sequence`**: bases plus features, with coordinate-aware edit operations
//! - **`Feature`**: a GFF3-style annotation (genes, repeat regions, mobile elements)
//!
//! ## Example
//!
//! ```rust
//! use gdtools_refseq::{ReferenceSequences, Sequence};
//!
//! let mut refs = ReferenceSequences::new();
//! refs.push(Sequence::new("chr", "ACGTACGT"));
//! refs.replace_range("chr", 2, 3, "", "DEL 1").unwrap();
//!
//! assert_eq!(refs.subsequence("chr", 1, 6).unwrap(), "ATACGT");
//! ```
//!
pub mod errors;
pub mod fasta;
pub mod gff;
pub mod models;
pub mod reference;
pub mod utils;

// re-exports
pub use self::errors::{RefSeqError, Result};
pub use self::models::{Feature, Sequence};
pub use self::reference::{ReferenceSequences, RepeatPick};
pub use self::utils::{parse_region, reverse_complement};
