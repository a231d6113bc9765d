//! `key OP value` filters over numeric record fields.
use std::fmt::{self, Display};
use std::str::FromStr;

use crate::errors::GenomeDiffError;
use crate::genome_diff::GenomeDiff;
use crate::models::{Kind, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Le,
    Ge,
    Lt,
    Gt,
}

impl FilterOp {
    // two-character operators first so that `<=` is not read as `<`
    const ALL: [FilterOp; 6] = [
        FilterOp::Eq,
        FilterOp::Ne,
        FilterOp::Le,
        FilterOp::Ge,
        FilterOp::Lt,
        FilterOp::Gt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "==",
            FilterOp::Ne => "!=",
            FilterOp::Le => "<=",
            FilterOp::Ge => ">=",
            FilterOp::Lt => "<",
            FilterOp::Gt => ">",
        }
    }

    fn holds(&self, a: f64, b: f64) -> bool {
        match self {
            FilterOp::Eq => a == b,
            FilterOp::Ne => a != b,
            FilterOp::Le => a <= b,
            FilterOp::Ge => a >= b,
            FilterOp::Lt => a < b,
            FilterOp::Gt => a > b,
        }
    }
}

///
/// A single filter such as `frequency < 0.5`. Records without the field, or
/// with a non-numeric value in it, never match.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub key: String,
    pub op: FilterOp,
    pub value: f64,
    value_text: String,
}

impl Filter {
    pub fn matches(&self, record: &Record) -> bool {
        record
            .get(&self.key)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .is_some_and(|v| self.op.holds(v, self.value))
    }
}

impl FromStr for Filter {
    type Err = GenomeDiffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        let invalid = || GenomeDiffError::InvalidFilter(s.to_string());

        let (op, at) = FilterOp::ALL
            .iter()
            .find_map(|op| compact.find(op.as_str()).map(|at| (*op, at)))
            .ok_or_else(invalid)?;
        let key = &compact[..at];
        let value_text = &compact[at + op.as_str().len()..];
        if key.is_empty() || value_text.is_empty() {
            return Err(invalid());
        }
        let value = value_text.parse::<f64>().map_err(|_| invalid())?;

        Ok(Filter {
            key: key.to_string(),
            op,
            value,
            value_text: value_text.to_string(),
        })
    }
}

impl Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.key, self.op.as_str(), self.value_text)
    }
}

impl GenomeDiff {
    ///
    /// Comment out every mutation matching at least one filter, recording the
    /// matching filters in its `filtered` field. `kinds` limits the
    /// candidates; all mutations are candidates otherwise.
    ///
    /// Returns the number of mutations filtered.
    ///
    pub fn filter_mutations(&mut self, filters: &[Filter], kinds: Option<&[Kind]>) -> usize {
        let mut count = 0;
        for record in self.entries.iter_mut() {
            let candidate = match kinds {
                Some(kinds) => kinds.contains(&record.kind),
                None => record.is_mutation(),
            };
            if !candidate || record.is_commented_out() {
                continue;
            }

            let reasons: Vec<String> = filters
                .iter()
                .filter(|f| f.matches(record))
                .map(|f| f.to_string())
                .collect();
            if reasons.is_empty() {
                continue;
            }

            log::info!("Filtered[{}]: {}", reasons.join(", "), record);
            record.set("filtered", reasons.join(", "));
            record.comment_out();
            count += 1;
        }
        count
    }
}
