//! # gdtools-core
//!
//! The Genome Diff (GD) format: a tab-delimited record of mutations, the
//! evidence supporting them, and validation results, all against a reference
//! genome.
//!
//! ## Main Components
//!
//! - **`GenomeDiff`**: a parsed document; metadata plus an ordered list of records
//! - **`Record`**: one typed entry with an id, evidence ids and an attribute bag
//! - **set operations**: merge, subtract, intersect, union, weights and check
//! - **count**: per-document mutation tallies
//! - **apply**: rewriting a reference with every mutation, shifting later ones
//! - **normalize / validate / mask / filter / annotate / simulate**: the
//!   per-record transformations used by the `gdtools` command line
//!
//! ## Example
//!
//! ```rust
//! use gdtools_core::{GenomeDiff, Kind};
//!
//! let text = "#=GENOME_DIFF\t1.0\nSNP\t1\t.\tchr\t10\tA\n";
//! let gd = GenomeDiff::parse_str(text).unwrap();
//!
//! assert_eq!(gd.mutation_list().len(), 1);
//! assert_eq!(gd.entries()[0].kind, Kind::Snp);
//! ```
//!
pub mod annotate;
pub mod apply;
pub mod compare;
pub mod coords;
pub mod count;
pub mod errors;
pub mod filter;
pub mod genome_diff;
pub mod hotspots;
pub mod mask;
pub mod models;
pub mod mutation;
pub mod normalize;
pub mod ops;
pub mod parse;
pub mod schema;
pub mod settings;
pub mod simulate;
pub mod validate;
pub mod write;

// re-exports
pub use self::apply::ApplyStats;
pub use self::count::{MutationCounts, write_count_table};
pub use self::errors::{GenomeDiffError, ParseReport, Result};
pub use self::filter::Filter;
pub use self::genome_diff::GenomeDiff;
pub use self::models::{Group, Kind, Metadata, Record};
pub use self::ops::MergeOptions;
pub use self::settings::Settings;
pub use self::simulate::SimulationRequest;
