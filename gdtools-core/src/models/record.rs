use std::collections::BTreeMap;
use std::fmt;

use crate::errors::{GenomeDiffError, Result};
use crate::models::Kind;
use crate::schema::required_fields;

/// Fields starting with this prefix are bookkeeping and never written.
pub const HIDDEN_PREFIX: &str = "_";

/// Marks a record to be written as a `#` comment.
pub const COMMENT_OUT: &str = "comment_out";

/// Fields naming the lineage a mutation was observed in.
pub const LINEAGE_FIELDS: [&str; 2] = ["phylogeny_id", "population_id"];

///
/// One line of a Genome Diff: a mutation, an evidence item or a validation item.
///
/// Required fields (see [`crate::schema::required_fields`]) and optional
/// `key=value` attributes share one map of string values.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub kind: Kind,
    pub id: String,
    pub evidence: Vec<String>,
    pub fields: BTreeMap<String, String>,
}

impl Record {
    pub fn new(kind: Kind, id: &str) -> Self {
        Record {
            kind,
            id: id.to_string(),
            evidence: Vec::new(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field setter.
    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    pub fn with_evidence(mut self, evidence: &[&str]) -> Self {
        self.evidence = evidence.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn has(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn set(&mut self, key: &str, value: impl ToString) {
        self.fields.insert(key.to_string(), value.to_string());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.fields.remove(key)
    }

    fn missing(&self, key: &str) -> GenomeDiffError {
        GenomeDiffError::MissingField {
            field: key.to_string(),
            entry: self.to_string(),
        }
    }

    pub fn text(&self, key: &str) -> Result<&str> {
        self.get(key).ok_or_else(|| self.missing(key))
    }

    pub fn int(&self, key: &str) -> Result<i64> {
        let value = self.text(key)?;
        value
            .trim()
            .parse::<i64>()
            .map_err(|_| GenomeDiffError::InvalidInteger {
                field: key.to_string(),
                value: value.to_string(),
                entry: self.to_string(),
            })
    }

    /// Integer value of an optional field, `default` when absent.
    pub fn int_or(&self, key: &str, default: i64) -> Result<i64> {
        match self.has(key) {
            true => self.int(key),
            false => Ok(default),
        }
    }

    pub fn seq_id(&self) -> Result<&str> {
        self.text("seq_id")
    }

    pub fn position(&self) -> Result<i64> {
        self.int("position")
    }

    pub fn size(&self) -> Result<i64> {
        self.int("size")
    }

    pub fn new_seq(&self) -> Result<&str> {
        self.text("new_seq")
    }

    pub fn is_mutation(&self) -> bool {
        self.kind.is_mutation()
    }

    pub fn is_evidence(&self) -> bool {
        self.kind.is_evidence()
    }

    pub fn is_validation(&self) -> bool {
        self.kind.is_validation()
    }

    pub fn is_commented_out(&self) -> bool {
        self.has(COMMENT_OUT)
    }

    pub fn comment_out(&mut self) {
        self.set(COMMENT_OUT, "True");
    }

    /// Line this record was read from, 0 when created in memory.
    pub fn line_number(&self) -> usize {
        self.get("_line_number")
            .and_then(|n| n.parse().ok())
            .unwrap_or(0)
    }

    ///
    /// Split an id-referencing field (`before=3`, `within=5:2`) into the
    /// referenced id and the optional copy index.
    ///
    pub fn id_reference(&self, key: &str) -> Option<(&str, Option<&str>)> {
        let value = self.get(key)?;
        match value.split_once(':') {
            Some((id, copy)) => Some((id, Some(copy))),
            None => Some((value, None)),
        }
    }

    /// Canonical ids are positive integers.
    pub fn is_valid_id(id: &str) -> bool {
        id.parse::<i64>().map(|n| n >= 1).unwrap_or(false)
    }

    /// Copy without `phylogeny_id`/`population_id`, for comparisons that ignore lineage.
    pub fn without_lineage(&self) -> Record {
        let mut copy = self.clone();
        for key in LINEAGE_FIELDS {
            copy.remove(key);
        }
        copy
    }

    ///
    /// Drop every field that is not part of the kind's extended field list.
    ///
    pub fn strip_to_extended(&mut self) {
        let keep = crate::schema::extended_fields(self.kind);
        self.fields.retain(|k, _| keep.contains(&k.as_str()));
    }

    ///
    /// Build the tab-separated tokens of this record.
    ///
    /// With `strict`, a missing required field is an error; otherwise it is
    /// written as `.` (used for diagnostics).
    ///
    pub(crate) fn marshal(&self, strict: bool) -> Result<Vec<String>> {
        let mut tokens = vec![self.kind.to_string(), self.id.clone()];
        tokens.push(match self.evidence.is_empty() {
            true => ".".to_string(),
            false => self.evidence.join(","),
        });

        let required = required_fields(self.kind);
        for field in required {
            match self.get(field) {
                Some(v) => tokens.push(v.to_string()),
                None if strict => return Err(self.missing_strict(field)),
                None => tokens.push(".".to_string()),
            }
        }

        for (key, value) in self.fields.iter() {
            if required.contains(&key.as_str())
                || key.starts_with(HIDDEN_PREFIX)
                || key == COMMENT_OUT
                || value.is_empty()
            {
                continue;
            }
            tokens.push(format!("{}={}", key, value));
        }

        Ok(tokens)
    }

    // Cannot call Display here, it would recurse through marshal.
    fn missing_strict(&self, key: &str) -> GenomeDiffError {
        GenomeDiffError::MissingField {
            field: key.to_string(),
            entry: format!("{} {}", self.kind, self.id),
        }
    }

    /// The line written to a Genome Diff file (without a comment prefix).
    pub fn to_line(&self) -> Result<String> {
        Ok(self.marshal(true)?.join("\t"))
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.marshal(false) {
            Ok(tokens) => write!(f, "{}", tokens.join("\t")),
            Err(_) => Err(fmt::Error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn snp() -> Record {
        Record::new(Kind::Snp, "1")
            .with_evidence(&["5", "6"])
            .with("seq_id", "NC_000913")
            .with("position", 100)
            .with("new_seq", "A")
            .with("frequency", 1)
            .with("_line_number", 7)
    }

    #[rstest]
    fn test_to_line(snp: Record) {
        assert_eq!(
            snp.to_line().unwrap(),
            "SNP\t1\t5,6\tNC_000913\t100\tA\tfrequency=1"
        );
    }

    #[rstest]
    fn test_to_line_skips_hidden_and_empty(mut snp: Record) {
        snp.set("gene_name", "");
        snp.comment_out();
        assert_eq!(snp.to_line().unwrap(), "SNP\t1\t5,6\tNC_000913\t100\tA\tfrequency=1");
        assert_eq!(snp.line_number(), 7);
    }

    #[rstest]
    fn test_missing_required_field() {
        let del = Record::new(Kind::Del, "2").with("seq_id", "chr").with("position", 4);
        assert!(del.to_line().is_err());
        assert_eq!(del.to_string(), "DEL\t2\t.\tchr\t4\t.");
    }

    #[rstest]
    fn test_typed_accessors(snp: Record) {
        assert_eq!(snp.position().unwrap(), 100);
        assert_eq!(snp.int_or("size", 0).unwrap(), 0);
        assert!(snp.int("new_seq").is_err());
        assert!(snp.size().is_err());
    }

    #[rstest]
    fn test_id_reference() {
        let ins = Record::new(Kind::Ins, "3").with("within", "7:2").with("before", "9");
        assert_eq!(ins.id_reference("within"), Some(("7", Some("2"))));
        assert_eq!(ins.id_reference("before"), Some(("9", None)));
        assert_eq!(ins.id_reference("missing"), None);
    }

    #[rstest]
    #[case("1", true)]
    #[case("42", true)]
    #[case("0", false)]
    #[case("-3", false)]
    #[case(".", false)]
    #[case("a1", false)]
    fn test_is_valid_id(#[case] id: &str, #[case] expected: bool) {
        assert_eq!(Record::is_valid_id(id), expected);
    }
}
