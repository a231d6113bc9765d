use std::collections::BTreeMap;
use std::fmt::{self, Display};

/// Feature types that count as repeat regions for repeat-family lookups.
pub const REPEAT_FEATURE_TYPES: [&str; 3] = ["repeat_region", "mobile_element", "insertion_sequence"];

///
/// Feature struct, one annotated interval on a reference sequence.
///
/// Coordinates are 1-based and inclusive.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub feature_type: String,
    pub start: i64,
    pub end: i64,
    pub strand: i8,
    pub name: String,
    pub accession: Option<String>,
    pub product: Option<String>,

    pub attributes: BTreeMap<String, String>,
}

impl Feature {
    pub fn new(feature_type: &str, start: i64, end: i64, strand: i8, name: &str) -> Self {
        Feature {
            feature_type: feature_type.to_string(),
            start,
            end,
            strand,
            name: name.to_string(),
            accession: None,
            product: None,
            attributes: BTreeMap::new(),
        }
    }

    ///
    /// Number of bases covered by the feature
    ///
    pub fn width(&self) -> i64 {
        self.end - self.start + 1
    }

    pub fn is_repeat(&self) -> bool {
        REPEAT_FEATURE_TYPES.contains(&self.feature_type.as_str())
    }

    pub fn is_gene(&self) -> bool {
        matches!(
            self.feature_type.as_str(),
            "gene" | "CDS" | "tRNA" | "rRNA" | "ncRNA"
        )
    }

    pub fn contains(&self, position: i64) -> bool {
        self.start <= position && position <= self.end
    }

    pub fn overlaps(&self, start: i64, end: i64) -> bool {
        self.start <= end && start <= self.end
    }
}

impl Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}-{} ({})",
            self.feature_type,
            self.name,
            self.start,
            self.end,
            if self.strand < 0 { "-" } else { "+" }
        )
    }
}
