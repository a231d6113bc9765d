use std::fmt;
use std::io;

use gdtools_refseq::RefSeqError;
use thiserror::Error;

///
/// One problem found while parsing or validating a Genome Diff.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIssue {
    pub line_number: usize,
    pub line: String,
    pub message: String,
    pub fatal: bool,
}

///
/// Every problem found in one file, fatal and advisory alike.
///
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub file: String,
    pub issues: Vec<ParseIssue>,
}

impl ParseReport {
    pub fn new(file: &str) -> Self {
        ParseReport {
            file: file.to_string(),
            issues: Vec::new(),
        }
    }

    pub fn add(&mut self, line_number: usize, line: &str, message: &str, fatal: bool) {
        self.issues.push(ParseIssue {
            line_number,
            line: line.to_string(),
            message: message.to_string(),
            fatal,
        });
    }

    pub fn is_fatal(&self) -> bool {
        self.issues.iter().any(|i| i.fatal)
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn fatal_count(&self) -> usize {
        self.issues.iter().filter(|i| i.fatal).count()
    }

    /// Emit every issue through the logger.
    pub fn log_issues(&self) {
        for issue in self.issues.iter() {
            if issue.fatal {
                log::error!("{}:{}: {}\n{}", self.file, issue.line_number, issue.message, issue.line);
            } else {
                log::warn!("{}:{}: {}\n{}", self.file, issue.line_number, issue.message, issue.line);
            }
        }
    }

    pub fn extend(&mut self, other: ParseReport) {
        self.issues.extend(other.issues);
    }
}

impl fmt::Display for ParseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} error(s) ({} fatal) in {}",
            self.issues.len(),
            self.fatal_count(),
            self.file
        )?;
        for issue in self.issues.iter() {
            writeln!(
                f,
                "  [{}] line {}: {}",
                if issue.fatal { "FATAL" } else { "WARNING" },
                issue.line_number,
                issue.message
            )?;
            if !issue.line.is_empty() {
                writeln!(f, "    {}", issue.line)?;
            }
        }
        Ok(())
    }
}

/// Error type for Genome Diff operations.
#[derive(Error, Debug)]
pub enum GenomeDiffError {
    #[error("{0}")]
    Parse(ParseReport),

    #[error("Unknown entry type: {0}")]
    UnknownKind(String),

    #[error("Missing required field '{field}' in entry:\n{entry}")]
    MissingField { field: String, entry: String },

    #[error("Expected integer for field '{field}' instead of [{value}] in entry:\n{entry}")]
    InvalidInteger {
        field: String,
        value: String,
        entry: String,
    },

    #[error("Identical diff entry items found in sort:\n1>>\n{0}\n2>>\n{1}")]
    DuplicateIdentity(String, String),

    #[error("Duplicate entries in Genome Diff:\n{0}\n{1}\nAdd a 'unique' tag to one if this is intentional.")]
    DuplicateEntry(String, String),

    #[error("Can't handle entry type {kind} in {operation}")]
    UnhandledKind { kind: String, operation: String },

    #[error("Negative deletion in repeat sequence for mutation:\n{0}")]
    NegativeDeletion(String),

    #[error("Mutation has zero or negative size after adjustment:\n{0}")]
    NonPositiveSize(String),

    #[error("Unknown MOB strand (?):\n{0}")]
    UnknownStrand(String),

    #[error("Duplicate sequence is empty. You may have specified an AMP with a new copy number of 1:\n{0}")]
    EmptyAmplification(String),

    #[error("Too many nested 'within' mutations, starting with:\n{0}")]
    NestingTooDeep(String),

    #[error("Could not be sorted due to invalid 'before' or 'within' constraint in mutation(s):\n{0}")]
    UnresolvedOrdering(String),

    #[error("Invalid filter expression: {0}")]
    InvalidFilter(String),

    #[error("Invalid simulation request: {0}")]
    InvalidSimulation(String),

    #[error(transparent)]
    Reference(#[from] RefSeqError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result type alias for Genome Diff operations.
pub type Result<T> = std::result::Result<T, GenomeDiffError>;

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_report_fatal() {
        let mut report = ParseReport::new("test.gd");
        report.add(3, "SNP\t1", "Key 'after' is DEPRECATED", false);
        assert!(!report.is_fatal());

        report.add(4, "XYZ\t1", "Unknown type for entry.", true);
        assert!(report.is_fatal());
        assert_eq!(report.fatal_count(), 1);
        assert!(report.to_string().contains("line 4"));
    }
}
