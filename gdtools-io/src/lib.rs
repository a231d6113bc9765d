//! # gdtools-io
//!
//! Converters between Genome Diff and other variant formats.
//!
//! - **`gvf`**: write mutations as GVF 1.0, with reference and variant bases
//! - **`vcf`**: read VCF calls as SNP, INS and DEL records
//!
pub mod errors;
pub mod gvf;
pub mod vcf;

// re-exports
pub use self::errors::{ConvertError, Result};
pub use self::gvf::{GvfFeature, GvfWrite};
pub use self::vcf::read_vcf;
