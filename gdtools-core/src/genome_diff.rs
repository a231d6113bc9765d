use std::path::PathBuf;

use fxhash::FxHashSet as HashSet;

use crate::compare::{equivalent, sort_records};
use crate::errors::{GenomeDiffError, ParseReport, Result};
use crate::models::{Group, Kind, Metadata, Record};

///
/// A Genome Diff document: header metadata plus mutation, evidence and
/// validation records that refer to each other by id.
///
/// Id allocation state belongs to the document, so two documents never
/// share counters.
///
#[derive(Debug, Clone, Default)]
pub struct GenomeDiff {
    pub metadata: Metadata,
    pub file_path: Option<PathBuf>,
    pub(crate) entries: Vec<Record>,
    unique_id_counter: u32,
    unique_id_used: HashSet<String>,
}

impl GenomeDiff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Record] {
        &self.entries
    }

    /// Field-level access to every record. Use [`GenomeDiff::add`] and
    /// [`GenomeDiff::remove`] to change the set of records.
    pub fn entries_mut(&mut self) -> &mut [Record] {
        &mut self.entries
    }

    ///
    /// Next free id: one past the last handed out, skipping any already in use.
    ///
    pub fn new_unique_id(&mut self) -> String {
        self.unique_id_counter += 1;
        while self
            .unique_id_used
            .contains(&self.unique_id_counter.to_string())
        {
            self.unique_id_counter += 1;
        }
        self.unique_id_counter.to_string()
    }

    pub(crate) fn reset_unique_ids(&mut self) {
        self.unique_id_counter = 0;
        self.unique_id_used.clear();
    }

    pub(crate) fn mark_id_used(&mut self, id: &str) {
        if Record::is_valid_id(id) {
            self.unique_id_used.insert(id.to_string());
        }
    }

    pub fn id_in_use(&self, id: &str) -> bool {
        self.unique_id_used.contains(id)
    }

    ///
    /// Append a record, optionally giving it a fresh id. Returns the stored record.
    ///
    pub fn add(&mut self, mut record: Record, reassign_id: bool) -> &mut Record {
        if reassign_id {
            record.id = self.new_unique_id();
        }
        self.mark_id_used(&record.id);

        let index = self.entries.len();
        self.entries.push(record);
        &mut self.entries[index]
    }

    pub fn remove(&mut self, id: &str) -> Option<Record> {
        let index = self.entries.iter().position(|r| r.id == id)?;
        self.unique_id_used.remove(id);
        Some(self.entries.remove(index))
    }

    pub(crate) fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&Record) -> bool,
    {
        self.entries.retain(keep);
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Record> {
        self.entries.iter().find(|r| r.id == id)
    }

    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut Record> {
        self.entries.iter_mut().find(|r| r.id == id)
    }

    ///
    /// Records of the listed kinds, in document order. An empty list selects all.
    ///
    pub fn list(&self, kinds: &[Kind]) -> Vec<&Record> {
        self.entries
            .iter()
            .filter(|r| kinds.is_empty() || kinds.contains(&r.kind))
            .collect()
    }

    pub fn mutation_list(&self) -> Vec<&Record> {
        self.entries.iter().filter(|r| r.is_mutation()).collect()
    }

    pub fn evidence_list(&self) -> Vec<&Record> {
        self.entries.iter().filter(|r| r.is_evidence()).collect()
    }

    pub fn validation_list(&self) -> Vec<&Record> {
        self.entries.iter().filter(|r| r.is_validation()).collect()
    }

    /// Records cited in the evidence list of `mutation`.
    pub fn mutation_evidence_list(&self, mutation: &Record) -> Vec<&Record> {
        mutation
            .evidence
            .iter()
            .flat_map(|id| self.entries.iter().filter(move |r| r.id == *id))
            .collect()
    }

    pub fn remove_group(&mut self, group: Group) {
        self.entries.retain(|r| r.kind.group() != group);
    }

    pub fn remove_kind(&mut self, kind: Kind) {
        self.entries.retain(|r| r.kind != kind);
    }

    /// Drop every field that does not take part in record equality.
    pub fn strip_to_extended(&mut self) {
        for record in self.entries.iter_mut() {
            record.strip_to_extended();
        }
    }

    ///
    /// Sort records into output order.
    ///
    pub fn sort(&mut self) -> Result<()> {
        sort_records(&mut self.entries)
    }

    ///
    /// Sort, then reject neighbouring records that describe the same thing.
    ///
    /// Two equal records that are both `within` the same mutation copy are
    /// duplicates; equal records where only one is nested are not. With a
    /// report, duplicates are logged into it instead of returned as an error.
    ///
    pub fn sort_and_check_for_duplicates(
        &mut self,
        mut report: Option<&mut ParseReport>,
    ) -> Result<()> {
        self.sort()?;

        for pair in self.entries.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if a.is_validation() && a.kind != Kind::Mask {
                continue;
            }
            if !equivalent(a, b) || !same_nesting(a, b) {
                continue;
            }

            match report.as_deref_mut() {
                Some(report) => {
                    let first_line = match a.line_number() {
                        0 => "NA".to_string(),
                        n => n.to_string(),
                    };
                    report.add(
                        b.line_number(),
                        &b.to_string(),
                        &format!(
                            "Attempt to add duplicate of this existing entry from line {}:\n{}\nAdd a 'unique' tag to one if this is intentional.",
                            first_line,
                            a.to_string().replace('\t', "<tab>")
                        ),
                        true,
                    );
                }
                None => {
                    return Err(GenomeDiffError::DuplicateEntry(
                        a.to_string(),
                        b.to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

fn same_nesting(a: &Record, b: &Record) -> bool {
    match (a.get("within"), b.get("within")) {
        (None, None) => true,
        (Some(x), Some(y)) => x
            .split(':')
            .zip(y.split(':'))
            .all(|(p, q)| p == q),
        _ => false,
    }
}
