//! Set algebra, merging and id bookkeeping over whole documents.
//!
//! Records are matched with the comparator in [`crate::compare`], so two
//! records are "the same" when they describe the same change regardless of
//! their ids and evidence.
use std::cmp::Ordering;
use std::collections::BTreeMap;

use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};

use crate::compare::{compare, equivalent};
use crate::errors::Result;
use crate::genome_diff::GenomeDiff;
use crate::models::{Group, Kind, Record};
use crate::schema::ID_REFERENCE_KEYS;

///
/// Records sorted by the comparator for lookup by content.
///
struct RecordIndex {
    records: Vec<Record>,
}

impl RecordIndex {
    fn new<I: IntoIterator<Item = Record>>(records: I) -> Self {
        let mut records: Vec<Record> = records.into_iter().collect();
        records.sort_by(compare);
        RecordIndex { records }
    }

    fn find(&self, record: &Record) -> Option<&Record> {
        self.records
            .binary_search_by(|probe| compare(probe, record))
            .ok()
            .map(|i| &self.records[i])
    }

    fn contains(&self, record: &Record) -> bool {
        self.find(record).is_some()
    }
}

/// How [`GenomeDiff::merge`] treats incoming records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    /// Skip incoming records that match one already present.
    pub unique: bool,
    /// Give every added record a fresh id instead of keeping free ones.
    pub reassign_ids: bool,
    /// Let `phylogeny_id`/`population_id` distinguish otherwise equal records.
    pub phylogeny_aware: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        MergeOptions {
            unique: true,
            reassign_ids: false,
            phylogeny_aware: false,
        }
    }
}

///
/// Point the `before`/`within` keys of `record` at new ids. A key whose
/// target has no new id is dropped.
///
fn remap_id_references(record: &mut Record, ids: &HashMap<String, String>) {
    for key in ID_REFERENCE_KEYS {
        let Some(value) = record.get(key) else {
            continue;
        };
        let mut parts: Vec<String> = value.split(':').map(String::from).collect();
        match ids.get(&parts[0]) {
            Some(new_id) => {
                parts[0] = new_id.clone();
                record.set(key, parts.join(":"));
            }
            None => {
                log::warn!(
                    "Mutation that this mutation was 'before' or 'within' has been removed.\n{}",
                    record
                );
                record.remove(key);
            }
        }
    }
}

/// `1/n` with at most six decimals and no trailing zeros.
fn format_weight(count: usize) -> String {
    let formatted = format!("{:.6}", 1.0 / count as f64);
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

// Full value equality: kind plus every written field.
fn full_key(record: &Record) -> (Kind, Vec<(String, String)>) {
    let fields = record
        .fields
        .iter()
        .filter(|(k, _)| !k.starts_with(crate::models::record::HIDDEN_PREFIX))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    (record.kind, fields)
}

impl GenomeDiff {
    ///
    /// Renumber every record `1..=N`: mutations first in sorted order, then
    /// evidence and validation. Evidence lists and `before`/`within` keys
    /// follow the new numbering.
    ///
    pub fn reassign_unique_ids(&mut self) -> Result<()> {
        self.sort()?;
        self.reset_unique_ids();

        let mut counter = 0usize;
        let mut mutation_ids: HashMap<String, String> = HashMap::default();
        let mut cited_by: HashMap<String, Vec<usize>> = HashMap::default();

        for (i, record) in self.entries.iter_mut().enumerate() {
            if !record.is_mutation() {
                continue;
            }
            counter += 1;
            let new_id = counter.to_string();
            let old_id = std::mem::replace(&mut record.id, new_id.clone());
            mutation_ids.insert(old_id, new_id);
            for evidence_id in record.evidence.drain(..) {
                cited_by.entry(evidence_id).or_default().push(i);
            }
        }

        for i in 0..self.entries.len() {
            if self.entries[i].is_mutation() {
                continue;
            }
            counter += 1;
            let new_id = counter.to_string();
            if let Some(citers) = cited_by.get(&self.entries[i].id) {
                for &m in citers {
                    self.entries[m].evidence.push(new_id.clone());
                }
            }
            let record = &mut self.entries[i];
            record.evidence.clear();
            record.id = new_id;
        }

        for record in self.entries.iter_mut().filter(|r| r.is_mutation()) {
            remap_id_references(record, &mutation_ids);
        }

        let ids: Vec<String> = self.entries.iter().map(|r| r.id.clone()).collect();
        for id in ids {
            self.mark_id_used(&id);
        }
        Ok(())
    }

    ///
    /// Append every record of `other` without looking for matches. Records
    /// whose id is taken get a new one, and `other`'s references follow.
    ///
    pub fn fast_merge(&mut self, other: &GenomeDiff) {
        let mut renamed: HashMap<String, String> = HashMap::default();
        let mut added = Vec::with_capacity(other.len());

        for record in other.entries.iter() {
            let reassign = self.id_in_use(&record.id);
            let stored = self.add(record.clone(), reassign);
            if reassign {
                renamed.insert(record.id.clone(), stored.id.clone());
            }
            added.push(self.entries.len() - 1);
        }

        if renamed.is_empty() {
            return;
        }
        for i in added {
            let record = &mut self.entries[i];
            for evidence_id in record.evidence.iter_mut() {
                if let Some(new_id) = renamed.get(evidence_id) {
                    *evidence_id = new_id.clone();
                }
            }
            for key in ID_REFERENCE_KEYS {
                let Some((target, copy)) = record.id_reference(key) else {
                    continue;
                };
                if let Some(new_id) = renamed.get(target) {
                    let value = match copy {
                        Some(copy) => format!("{}:{}", new_id, copy),
                        None => new_id.clone(),
                    };
                    record.set(key, value);
                }
            }
        }
    }

    ///
    /// Add the records of `other` to this document.
    ///
    /// Evidence lists and `before`/`within` keys of added mutations are
    /// rewritten to the ids the cited records have here, whether they were
    /// just added or matched an existing record. Citations that cannot be
    /// resolved are dropped.
    ///
    pub fn merge(&mut self, other: &GenomeDiff, options: &MergeOptions) -> Result<()> {
        let mut incoming = other.entries.clone();
        if options.phylogeny_aware && !other.metadata.population.is_empty() {
            for record in incoming.iter_mut().filter(|r| r.is_mutation()) {
                record.set("population_id", &other.metadata.population);
            }
        }

        // lineage tags are hidden on the incoming side only
        let key = |record: &Record| match options.phylogeny_aware {
            true => record.clone(),
            false => record.without_lineage(),
        };
        let existing = RecordIndex::new(self.entries.iter().cloned());

        let mut ids: HashMap<String, String> = HashMap::default();
        let mut added = Vec::new();
        for record in incoming {
            if options.unique {
                if let Some(found) = existing.find(&key(&record)) {
                    ids.insert(record.id.clone(), found.id.clone());
                    continue;
                }
            }

            let old_id = record.id.clone();
            let reassign = options.reassign_ids
                || !Record::is_valid_id(&old_id)
                || self.id_in_use(&old_id);
            let stored = self.add(record, reassign);
            ids.insert(old_id, stored.id.clone());
            added.push(self.entries.len() - 1);
        }

        for i in added {
            let record = &mut self.entries[i];
            if !record.is_mutation() {
                continue;
            }
            record.evidence = record
                .evidence
                .iter()
                .filter_map(|e| ids.get(e).cloned())
                .collect();
            remap_id_references(record, &ids);
        }

        log::info!(
            "Merged {} record(s) into {} total",
            other.len(),
            self.len()
        );
        Ok(())
    }

    ///
    /// Remove every mutation matching one in `other`. Evidence and validation
    /// records stay. Without `phylogeny_aware`, mutations that differ only in
    /// `phylogeny_id`/`population_id` count as equal.
    ///
    pub fn subtract(&mut self, other: &GenomeDiff, phylogeny_aware: bool) -> Result<()> {
        let key = |record: &Record| match phylogeny_aware {
            true => record.clone(),
            false => record.without_lineage(),
        };
        let seen = RecordIndex::new(other.entries.iter().filter(|r| r.is_mutation()).map(key));

        self.retain(|r| !(r.is_mutation() && seen.contains(&key(r))));
        self.reassign_unique_ids()
    }

    ///
    /// Keep only mutations also found in `other`, without their evidence.
    /// Evidence and validation records are removed.
    ///
    pub fn intersect(&mut self, other: &GenomeDiff) -> Result<()> {
        let seen = RecordIndex::new(other.entries.iter().filter(|r| r.is_mutation()).cloned());

        self.remove_group(Group::Evidence);
        self.remove_group(Group::Validation);
        self.retain(|r| seen.contains(r));
        for record in self.entries.iter_mut() {
            record.evidence.clear();
        }
        self.reassign_unique_ids()
    }

    ///
    /// Mutations (or, in evidence mode, evidence) found in either document,
    /// without duplicates. Validation records are always removed.
    ///
    pub fn union(&mut self, other: &GenomeDiff, evidence_mode: bool, phylogeny_aware: bool) -> Result<()> {
        let dropped = match evidence_mode {
            true => Group::Mutations,
            false => Group::Evidence,
        };
        self.remove_group(dropped);
        self.remove_group(Group::Validation);

        let options = MergeOptions {
            unique: true,
            reassign_ids: true,
            phylogeny_aware,
        };
        self.merge(other, &options)?;

        self.remove_group(dropped);
        self.remove_group(Group::Validation);
        self.reassign_unique_ids()
    }

    ///
    /// Collapse matching mutations into the first of each run, which takes
    /// over the evidence of the ones removed. Matching evidence records are
    /// collapsed the same way. Evidence and validation that no remaining
    /// mutation cites is removed.
    ///
    pub fn unique(&mut self) -> Result<()> {
        self.sort()?;

        let entries = std::mem::take(&mut self.entries);
        let mut kept: Vec<Record> = Vec::with_capacity(entries.len());
        let mut evidence_renamed: HashMap<String, String> = HashMap::default();

        for record in entries {
            let collapse = !record.is_validation()
                && kept.last().is_some_and(|last| equivalent(last, &record));
            if !collapse {
                kept.push(record);
                continue;
            }

            let Some(survivor) = kept.last_mut() else {
                continue;
            };
            if record.is_mutation() {
                for evidence_id in record.evidence {
                    if !survivor.evidence.contains(&evidence_id) {
                        survivor.evidence.push(evidence_id);
                    }
                }
            } else {
                evidence_renamed.insert(record.id.clone(), survivor.id.clone());
            }
        }

        let mut cited: HashSet<String> = HashSet::default();
        for record in kept.iter_mut().filter(|r| r.is_mutation()) {
            let mut evidence: Vec<String> = Vec::with_capacity(record.evidence.len());
            for id in record.evidence.iter() {
                let id = evidence_renamed.get(id).unwrap_or(id);
                if !evidence.contains(id) {
                    evidence.push(id.clone());
                }
            }
            cited.extend(evidence.iter().cloned());
            record.evidence = evidence;
        }

        kept.retain(|r| {
            if r.is_mutation() || cited.contains(&r.id) {
                return true;
            }
            log::warn!(
                "Removing entry because no mutation referenced its ID:\n{}",
                r
            );
            false
        });

        self.entries = kept;
        Ok(())
    }

    ///
    /// Remove evidence records that no mutation cites.
    ///
    pub fn filter_not_used_as_evidence(&mut self) {
        let cited: HashSet<String> = self
            .entries
            .iter()
            .filter(|r| r.is_mutation())
            .flat_map(|r| r.evidence.iter().cloned())
            .collect();

        self.retain(|r| {
            let keep = !r.is_evidence() || cited.contains(&r.id);
            if !keep {
                log::debug!("Not used as evidence: {}", r.id);
            }
            keep
        });
    }

    ///
    /// Pool the mutations of every input. Identical mutations are kept once
    /// with `weight=1/n`, where `n` is how often they occurred.
    ///
    /// Identity here covers every written field, not only the ones the
    /// comparator looks at. Repeats collapse into their first copy, which
    /// takes the union of their evidence, so each distinct mutation appears
    /// once in the result.
    ///
    pub fn weights(inputs: &[GenomeDiff]) -> Result<GenomeDiff> {
        let mut pooled = GenomeDiff::new();
        if let Some(first) = inputs.first() {
            pooled.metadata = first.metadata.clone();
        }
        for gd in inputs {
            pooled.fast_merge(gd);
        }

        let mut groups: BTreeMap<(Kind, Vec<(String, String)>), Vec<usize>> = BTreeMap::new();
        for (i, record) in pooled.entries.iter().enumerate() {
            if record.is_mutation() {
                groups.entry(full_key(record)).or_default().push(i);
            }
        }

        let mut duplicates: HashSet<usize> = HashSet::default();
        for members in groups.values() {
            let weight = format_weight(members.len());
            let Some((first, rest)) = members.split_first() else {
                continue;
            };
            log::debug!("{}\t{}", weight, pooled.entries[*first]);

            let mut evidence = pooled.entries[*first].evidence.clone();
            for &i in rest {
                for id in pooled.entries[i].evidence.iter() {
                    if !evidence.contains(id) {
                        evidence.push(id.clone());
                    }
                }
                duplicates.insert(i);
            }

            let record = &mut pooled.entries[*first];
            record.set("weight", weight);
            record.evidence = evidence;
        }

        let entries = std::mem::take(&mut pooled.entries);
        pooled.entries = entries
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !duplicates.contains(i))
            .map(|(_, r)| r)
            .collect();

        pooled.reassign_unique_ids()?;
        Ok(pooled)
    }

    ///
    /// Label the mutations of `control` and `test`: `compare=TP` when found
    /// in both, `FN` for control only and `FP` for test only. The counts are
    /// stored in the `TP|FN|FP` header of the result, which otherwise takes
    /// the metadata of `test`.
    ///
    pub fn check(control: &GenomeDiff, test: &GenomeDiff) -> Result<GenomeDiff> {
        let prepare = |gd: &GenomeDiff| {
            let mut mutations: Vec<Record> = gd
                .entries
                .iter()
                .filter(|r| r.is_mutation())
                .map(|r| {
                    let mut r = r.without_lineage();
                    r.remove("unique");
                    r.evidence.clear();
                    r
                })
                .collect();
            mutations.sort_by(compare);
            mutations.dedup_by(|a, b| compare(a, b) == Ordering::Equal);
            mutations
        };
        let control_mutations = prepare(control);
        let test_mutations = prepare(test);

        let mut labeled: Vec<(Record, &str)> = Vec::new();
        let (mut c, mut t) = (control_mutations.iter().peekable(), test_mutations.iter().peekable());
        loop {
            let order = match (c.peek(), t.peek()) {
                (Some(a), Some(b)) => compare(a, b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => break,
            };
            let next = match order {
                Ordering::Equal => {
                    t.next();
                    c.next().map(|r| (r, "TP"))
                }
                Ordering::Less => c.next().map(|r| (r, "FN")),
                Ordering::Greater => t.next().map(|r| (r, "FP")),
            };
            if let Some((record, label)) = next {
                labeled.push((record.clone(), label));
            }
        }

        let mut result = GenomeDiff::new();
        result.metadata = test.metadata.clone();
        let (mut n_tp, mut n_fn, mut n_fp) = (0usize, 0usize, 0usize);
        for (mut record, label) in labeled {
            match label {
                "TP" => n_tp += 1,
                "FN" => n_fn += 1,
                _ => n_fp += 1,
            }
            record.set("compare", label);
            result.add(record, true);
        }

        let summary = format!("{}|{}|{}", n_tp, n_fn, n_fp);
        log::info!(
            "TP|FN|FP\t{} for {} versus {}",
            summary,
            control.metadata.title,
            test.metadata.title
        );
        result.metadata.set_extension("TP|FN|FP", summary);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    fn snp(id: &str, position: i64) -> Record {
        Record::new(Kind::Snp, id)
            .with("seq_id", "seq1")
            .with("position", position)
            .with("new_seq", "A")
    }

    fn ra(id: &str, position: i64) -> Record {
        Record::new(Kind::Ra, id)
            .with("seq_id", "seq1")
            .with("position", position)
            .with("insert_position", 0)
            .with("ref_base", "G")
            .with("new_base", "A")
    }

    fn gd_of(records: Vec<Record>) -> GenomeDiff {
        let mut gd = GenomeDiff::new();
        for record in records {
            gd.add(record, false);
        }
        gd
    }

    fn positions(gd: &GenomeDiff) -> Vec<i64> {
        gd.mutation_list()
            .iter()
            .map(|r| r.position().unwrap())
            .collect()
    }

    #[fixture]
    fn a() -> GenomeDiff {
        gd_of(vec![
            snp("1", 100).with_evidence(&["3"]),
            snp("2", 200).with_evidence(&["4"]),
            ra("3", 100),
            ra("4", 200),
        ])
    }

    #[fixture]
    fn b() -> GenomeDiff {
        gd_of(vec![
            snp("5", 100).with_evidence(&["7"]),
            snp("6", 300),
            ra("7", 100),
        ])
    }

    #[rstest]
    fn test_reassign_unique_ids() {
        let mut gd = gd_of(vec![
            ra("10", 100),
            snp("20", 100).with_evidence(&["10"]),
            snp("30", 150).with("before", "20"),
            Record::new(Kind::Ins, "40")
                .with("seq_id", "seq1")
                .with("position", 160)
                .with("new_seq", "AT")
                .with("within", "99:2"),
        ]);
        gd.reassign_unique_ids().unwrap();

        let snp1 = gd.find_by_id("1").unwrap();
        assert_eq!(snp1.position().unwrap(), 100);
        assert_eq!(snp1.evidence, vec!["4"]);
        assert_eq!(gd.find_by_id("2").unwrap().get("before"), Some("1"));
        assert_eq!(gd.find_by_id("3").unwrap().get("within"), None);
        assert_eq!(gd.find_by_id("4").unwrap().kind, Kind::Ra);
        assert!(gd.id_in_use("4"));
    }

    #[rstest]
    fn test_intersect(mut a: GenomeDiff, b: GenomeDiff) {
        a.intersect(&b).unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(positions(&a), vec![100]);
        assert!(a.entries()[0].evidence.is_empty());
    }

    #[rstest]
    fn test_subtract(mut a: GenomeDiff, b: GenomeDiff) {
        a.subtract(&b, false).unwrap();
        assert_eq!(positions(&a), vec![200]);
        assert_eq!(a.evidence_list().len(), 2);
    }

    #[rstest]
    fn test_subtract_phylogeny_aware() {
        let mut a = gd_of(vec![snp("1", 100).with("phylogeny_id", "A")]);
        let b = gd_of(vec![snp("1", 100).with("phylogeny_id", "B")]);

        let mut aware = a.clone();
        aware.subtract(&b, true).unwrap();
        assert_eq!(aware.len(), 1);

        a.subtract(&b, false).unwrap();
        assert!(a.is_empty());
    }

    #[rstest]
    fn test_union(mut a: GenomeDiff, b: GenomeDiff) {
        a.union(&b, false, false).unwrap();
        assert_eq!(positions(&a), vec![100, 200, 300]);
        assert!(a.evidence_list().is_empty());
    }

    #[rstest]
    fn test_merge_unique_rewires_evidence(mut a: GenomeDiff) {
        let b = gd_of(vec![
            snp("1", 100).with_evidence(&["2"]),
            ra("2", 100),
            snp("3", 500).with_evidence(&["4", "9"]),
            ra("4", 500),
        ]);
        a.merge(&b, &MergeOptions::default()).unwrap();
        assert_eq!(a.mutation_list().len(), 3);

        let added = a
            .mutation_list()
            .into_iter()
            .find(|r| r.position().unwrap() == 500)
            .unwrap();
        assert_eq!(added.evidence.len(), 1);
        let evidence = a.find_by_id(&added.evidence[0]).unwrap();
        assert_eq!(evidence.position().unwrap(), 500);
    }

    #[rstest]
    fn test_merge_keeps_other_lineage() {
        let mut a = gd_of(vec![snp("1", 100).with("phylogeny_id", "1")]);
        let b = gd_of(vec![snp("5", 100).with("phylogeny_id", "2")]);
        a.merge(&b, &MergeOptions::default()).unwrap();
        assert_eq!(a.mutation_list().len(), 2);

        // an untagged mutation here still absorbs a tagged copy
        let mut untagged = gd_of(vec![snp("1", 100)]);
        untagged.merge(&b, &MergeOptions::default()).unwrap();
        assert_eq!(untagged.mutation_list().len(), 1);
    }

    #[rstest]
    fn test_merge_same_cardinality(mut a: GenomeDiff) {
        let copy = a.clone();
        a.merge(&copy, &MergeOptions::default()).unwrap();
        assert_eq!(a.len(), copy.len());
    }

    #[rstest]
    fn test_unique_of_self_merge(a: GenomeDiff) {
        let mut merged = a.clone();
        let options = MergeOptions {
            unique: false,
            reassign_ids: true,
            phylogeny_aware: true,
        };
        merged.merge(&a, &options).unwrap();
        assert_eq!(merged.mutation_list().len(), 4);

        merged.unique().unwrap();
        assert_eq!(positions(&merged), positions(&a));
        assert_eq!(merged.evidence_list().len(), 2);
        for mutation in merged.mutation_list() {
            assert_eq!(mutation.evidence.len(), 1);
            assert!(merged.find_by_id(&mutation.evidence[0]).is_some());
        }
    }

    #[rstest]
    fn test_filter_not_used_as_evidence(mut a: GenomeDiff) {
        a.add(ra("9", 900), false);
        a.filter_not_used_as_evidence();
        assert!(a.find_by_id("9").is_none());
        assert_eq!(a.len(), 4);
    }

    #[rstest]
    fn test_fast_merge_renames_collisions(mut a: GenomeDiff, b: GenomeDiff) {
        let clash = gd_of(vec![snp("1", 700).with_evidence(&["2"]), ra("2", 700)]);
        a.fast_merge(&clash);
        a.fast_merge(&b);
        assert_eq!(a.len(), 9);

        let moved = a
            .mutation_list()
            .into_iter()
            .find(|r| r.position().unwrap() == 700)
            .unwrap();
        let evidence = a.find_by_id(&moved.evidence[0]).unwrap();
        assert_eq!(evidence.position().unwrap(), 700);
    }

    #[rstest]
    #[case(1, "1")]
    #[case(2, "0.5")]
    #[case(3, "0.333333")]
    #[case(8, "0.125")]
    fn test_format_weight(#[case] count: usize, #[case] expected: &str) {
        assert_eq!(format_weight(count), expected);
    }

    #[rstest]
    fn test_weights(a: GenomeDiff, b: GenomeDiff) {
        let weighted = GenomeDiff::weights(&[a, b]).unwrap();
        let weights: Vec<(i64, String)> = weighted
            .mutation_list()
            .iter()
            .map(|r| (r.position().unwrap(), r.get("weight").unwrap().to_string()))
            .collect();
        assert_eq!(
            weights,
            vec![
                (100, "0.5".to_string()),
                (200, "1".to_string()),
                (300, "1".to_string())
            ]
        );

        // the shared mutation is written once, citing the evidence of both copies
        let shared = weighted.mutation_list()[0];
        assert_eq!(shared.evidence.len(), 2);
        for id in shared.evidence.iter() {
            assert_eq!(weighted.find_by_id(id).unwrap().kind, Kind::Ra);
        }
    }

    #[rstest]
    fn test_check(a: GenomeDiff, b: GenomeDiff) {
        let result = GenomeDiff::check(&a, &b).unwrap();
        let labels: Vec<(i64, &str)> = result
            .mutation_list()
            .iter()
            .map(|r| (r.position().unwrap(), r.get("compare").unwrap()))
            .collect();
        assert_eq!(labels, vec![(100, "TP"), (200, "FN"), (300, "FP")]);
        assert_eq!(result.metadata.extension("TP|FN|FP"), Some("1|1|1"));
    }
}
