//! Applying a Genome Diff to reference sequences.
use std::collections::BTreeMap;

use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
use gdtools_refseq::ReferenceSequences;

use crate::coords::{Coordinate, reference_span};
use crate::errors::{GenomeDiffError, Result};
use crate::genome_diff::GenomeDiff;
use crate::hotspots::annotate_repeat_hotspots;
use crate::models::{Kind, Record};
use crate::mutation::{self, behavior, invert_position_sequence, shift_position};
use crate::settings::Settings;

/// Number of already applied records re-checked for stale hotspot tags.
const HOTSPOT_RECHECK_WINDOW: usize = 5;

///
/// Running totals of an apply.
///
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyStats {
    pub bases_changed: i64,
    pub bases_inserted: i64,
    pub bases_deleted: i64,
    /// Records applied, per kind.
    pub counts: BTreeMap<Kind, usize>,
}

///
/// What a mutation sees while being applied: the untouched reference for
/// repeat and region lookups, the sequences being edited, and the totals.
///
pub struct ApplyContext<'a> {
    pub original: &'a ReferenceSequences,
    pub target: &'a mut ReferenceSequences,
    pub stats: ApplyStats,
}

impl<'a> ApplyContext<'a> {
    pub fn new(original: &'a ReferenceSequences, target: &'a mut ReferenceSequences) -> Self {
        ApplyContext {
            original,
            target,
            stats: ApplyStats::default(),
        }
    }
}

// How one record moves when another is applied.
enum Shift {
    Nested(i64),
    Normal,
}

///
/// Give features that were copied by AMP or MOB distinct accessions: every
/// feature sharing a `(type, accession)` with another gets `_1`, `_2`, ...
///
pub fn fix_duplicate_accessions(refs: &mut ReferenceSequences) {
    let mut totals: HashMap<(String, String), usize> = HashMap::default();
    for feature in refs.iter().flat_map(|s| s.features.iter()) {
        if let Some(accession) = feature.accession.as_ref().filter(|a| !a.is_empty()) {
            *totals
                .entry((feature.feature_type.clone(), accession.clone()))
                .or_default() += 1;
        }
    }

    let mut seen: HashMap<(String, String), usize> = HashMap::default();
    for seq in refs.iter_mut() {
        for feature in seq.features.iter_mut() {
            let Some(accession) = feature.accession.as_mut().filter(|a| !a.is_empty()) else {
                continue;
            };
            let key = (feature.feature_type.clone(), accession.clone());
            if totals.get(&key).copied().unwrap_or_default() <= 1 {
                continue;
            }
            let n = seen.entry(key).or_default();
            *n += 1;
            accession.push_str(&format!("_{}", n));
        }
    }
}

fn is_polymorphic(record: &Record) -> bool {
    record
        .get("frequency")
        .map(|f| f.trim().parse::<f64>().map(|f| f != 1.0).unwrap_or(true))
        .unwrap_or(false)
}

impl GenomeDiff {
    ///
    /// Arrange records so that each one carrying `before=X` comes right
    /// before `X` and each one carrying `within=X` right after it. Everything
    /// else is in sorted order.
    ///
    pub fn sort_apply_order(&mut self) -> Result<()> {
        let (mut pending, rest): (Vec<Record>, Vec<Record>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|r| r.has("before") || r.has("within"));
        self.entries = rest;
        self.sort()?;

        while !pending.is_empty() {
            let waiting = pending.len();
            let mut unplaced = Vec::new();

            for record in pending {
                let (key, offset) = match record.has("before") {
                    true => ("before", 0),
                    false => ("within", 1),
                };
                let target = record
                    .id_reference(key)
                    .and_then(|(id, _)| self.entries.iter().position(|r| r.id == id));
                match target {
                    Some(i) => self.entries.insert(i + offset, record),
                    None => unplaced.push(record),
                }
            }

            if unplaced.len() == waiting {
                let listing = unplaced
                    .iter()
                    .map(|r| r.to_string())
                    .collect::<Vec<_>>()
                    .join("\n");
                self.entries.extend(unplaced);
                return Err(GenomeDiffError::UnresolvedOrdering(listing));
            }
            pending = unplaced;
        }
        Ok(())
    }

    ///
    /// Update every other mutation and MASK for the record at `current`
    /// having been applied: translate, resize or invert them, and move
    /// records nested `within` it into the right copy.
    ///
    pub fn shift_positions(&mut self, current: usize, refs: &ReferenceSequences) -> Result<()> {
        let applied = self.entries[current].clone();
        let delta = mutation::size_delta(&applied, refs)?;
        let seq_id = applied.seq_id()?.to_string();
        let (anchor, _) = reference_span(&applied)?;

        if applied.kind == Kind::Inv {
            log::debug!("Inverting region of {}", applied.id);
        } else {
            log::debug!("Shifting remaining entries by {} bp", delta);
        }

        for i in 0..self.entries.len() {
            if i == current || !self.entries[i].kind.is_applied() {
                continue;
            }

            let shift = match self.entries[i].id_reference("within") {
                Some((outer_id, copy)) if outer_id == applied.id => {
                    let copy = match copy {
                        Some(c) => c.parse::<i64>().map_err(|_| GenomeDiffError::InvalidInteger {
                            field: "within".to_string(),
                            value: c.to_string(),
                            entry: self.entries[i].to_string(),
                        })?,
                        None => -1,
                    };
                    let hook = behavior(applied.kind).ok_or_else(|| GenomeDiffError::UnhandledKind {
                        kind: applied.kind.to_string(),
                        operation: "nested shift".to_string(),
                    })?;
                    Shift::Nested(hook.nested_shift(&applied, copy, delta, refs)?)
                }
                Some((outer_id, _)) => {
                    let grand_id = self
                        .find_by_id(outer_id)
                        .and_then(|outer| outer.id_reference("within"))
                        .map(|(id, _)| id);
                    match grand_id {
                        Some(grand_id) => {
                            if self.find_by_id(grand_id).is_some_and(|g| g.has("within")) {
                                return Err(GenomeDiffError::NestingTooDeep(
                                    self.entries[i].to_string(),
                                ));
                            }
                            match grand_id == applied.id {
                                true => Shift::Nested(delta),
                                false => Shift::Normal,
                            }
                        }
                        None => Shift::Normal,
                    }
                }
                None => Shift::Normal,
            };

            let record = &mut self.entries[i];
            match shift {
                Shift::Nested(by) => {
                    shift_position(record, &seq_id, Coordinate::nested(), Coordinate::nested(), by)?
                }
                Shift::Normal if applied.kind == Kind::Inv => {
                    invert_position_sequence(record, &applied)?
                }
                Shift::Normal => shift_position(record, &seq_id, anchor, anchor, delta)?,
            }
        }
        Ok(())
    }

    // Mutations then MASKs, in current entry order.
    fn apply_snapshot(&self) -> Vec<usize> {
        let mutations = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_mutation())
            .map(|(i, _)| i);
        let masks = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, r)| r.kind == Kind::Mask)
            .map(|(i, _)| i);
        mutations.chain(masks).collect()
    }

    ///
    /// Apply every mutation and MASK to `target`, a copy of `original`.
    ///
    /// Records are applied in [`GenomeDiff::sort_apply_order`] order. Records
    /// not yet applied follow the coordinate changes of each applied one, so
    /// afterwards every record holds its position in `target`. Mutations
    /// with a `frequency` other than 1 are skipped.
    ///
    /// On error `target` is left partly edited and should be discarded.
    ///
    pub fn apply_to_sequences(
        &mut self,
        original: &ReferenceSequences,
        target: &mut ReferenceSequences,
        settings: &Settings,
    ) -> Result<ApplyStats> {
        self.sort_apply_order()?;

        let mut ctx = ApplyContext::new(original, target);
        let mut order = self.apply_snapshot();
        let mut done: HashSet<String> = HashSet::default();
        let mut step = 0;

        while step < order.len() {
            let i = order[step];
            step += 1;
            done.insert(self.entries[i].id.clone());

            if is_polymorphic(&self.entries[i]) {
                log::warn!(
                    "Attempt to apply polymorphic mutation with frequency != 1. This mutation will be skipped.\n{}",
                    self.entries[i]
                );
                continue;
            }

            annotate_repeat_hotspots(&mut self.entries[i], ctx.target, settings, false)?;

            let kind = self.entries[i].kind;
            let hook = behavior(kind).ok_or_else(|| GenomeDiffError::UnhandledKind {
                kind: kind.to_string(),
                operation: "apply".to_string(),
            })?;
            log::debug!("Applying mutation:\n{}", self.entries[i]);
            hook.apply(&mut self.entries[i], &mut ctx)?;
            *ctx.stats.counts.entry(kind).or_default() += 1;

            self.shift_positions(i, ctx.original)?;

            for &previous in order[..step - 1].iter().rev().take(HOTSPOT_RECHECK_WINDOW) {
                annotate_repeat_hotspots(&mut self.entries[previous], ctx.target, settings, true)?;
            }

            if kind == Kind::Inv {
                self.sort_apply_order()?;
                order = self
                    .apply_snapshot()
                    .into_iter()
                    .filter(|&j| !done.contains(&self.entries[j].id))
                    .collect();
                step = 0;
            }
        }

        fix_duplicate_accessions(ctx.target);
        let stats = ctx.stats;

        for (kind, count) in stats.counts.iter() {
            log::info!("{}: {}", kind, count);
        }
        self.metadata.set_extension("BASES-CHANGED", stats.bases_changed);
        self.metadata.set_extension("BASES-INSERTED", stats.bases_inserted);
        self.metadata.set_extension("BASES-DELETED", stats.bases_deleted);
        self.metadata
            .set_extension("GENOME-SIZE-INITIAL", original.total_length());
        self.metadata
            .set_extension("GENOME-SIZE-FINAL", target.total_length());

        target.remove_empty_sequences();
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use gdtools_refseq::{Feature, Sequence};
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn refs() -> ReferenceSequences {
        let mut refs = ReferenceSequences::new();
        refs.push(Sequence::new("seq1", "AAAAAAAAAAGGGGGCCCCCTTTTT"));
        refs
    }

    fn at(kind: Kind, id: &str, position: i64) -> Record {
        Record::new(kind, id)
            .with("seq_id", "seq1")
            .with("position", position)
    }

    fn bases(refs: &ReferenceSequences) -> String {
        String::from_utf8(refs.get("seq1").unwrap().bases.clone()).unwrap()
    }

    fn apply(gd: &mut GenomeDiff, refs: &ReferenceSequences) -> (ReferenceSequences, ApplyStats) {
        let mut target = refs.clone();
        let stats = gd
            .apply_to_sequences(refs, &mut target, &Settings::default())
            .unwrap();
        (target, stats)
    }

    #[rstest]
    fn test_sort_apply_order() {
        let mut gd = GenomeDiff::new();
        gd.add(at(Kind::Snp, "1", 10).with("new_seq", "T"), false);
        gd.add(at(Kind::Snp, "2", 20).with("new_seq", "T"), false);
        gd.add(at(Kind::Snp, "3", 30).with("new_seq", "T").with("before", "1"), false);
        gd.add(at(Kind::Snp, "4", 5).with("new_seq", "T").with("within", "2:1"), false);
        gd.sort_apply_order().unwrap();

        let ids: Vec<&str> = gd.entries().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1", "2", "4"]);
    }

    #[rstest]
    fn test_sort_apply_order_circular() {
        let mut gd = GenomeDiff::new();
        gd.add(at(Kind::Snp, "1", 10).with("new_seq", "T").with("before", "2"), false);
        gd.add(at(Kind::Snp, "2", 20).with("new_seq", "T").with("before", "1"), false);
        assert!(matches!(
            gd.sort_apply_order(),
            Err(GenomeDiffError::UnresolvedOrdering(_))
        ));
        assert_eq!(gd.len(), 2);
    }

    #[rstest]
    fn test_del_shifts_later_mutations(refs: ReferenceSequences) {
        let mut gd = GenomeDiff::new();
        gd.add(at(Kind::Del, "1", 10).with("size", 5), false);
        gd.add(at(Kind::Snp, "2", 20).with("new_seq", "T"), false);

        let (target, stats) = apply(&mut gd, &refs);
        assert_eq!(bases(&target), "AAAAAAAAAGCCCCTTTTTT");
        assert_eq!(gd.find_by_id("2").unwrap().position().unwrap(), 15);
        assert_eq!(stats.bases_deleted, 5);
        assert_eq!(stats.bases_changed, 1);
        assert_eq!(gd.metadata.extension("GENOME-SIZE-INITIAL"), Some("25"));
        assert_eq!(gd.metadata.extension("GENOME-SIZE-FINAL"), Some("20"));
    }

    #[rstest]
    fn test_ins_and_del_lengths(refs: ReferenceSequences) {
        let mut gd = GenomeDiff::new();
        gd.add(at(Kind::Ins, "1", 5).with("new_seq", "GGG"), false);
        gd.add(at(Kind::Del, "2", 20).with("size", 2), false);

        let (target, stats) = apply(&mut gd, &refs);
        assert_eq!(target.total_length(), 25 + 3 - 2);
        assert_eq!(gd.find_by_id("2").unwrap().position().unwrap(), 23);
        assert_eq!(stats.counts.get(&Kind::Ins), Some(&1));
        assert_eq!(gd.metadata.extension("BASES-INSERTED"), Some("3"));
    }

    #[rstest]
    fn test_polymorphic_skipped(refs: ReferenceSequences) {
        let mut gd = GenomeDiff::new();
        gd.add(at(Kind::Snp, "1", 1).with("new_seq", "T").with("frequency", 0.5), false);

        let (target, stats) = apply(&mut gd, &refs);
        assert_eq!(bases(&target), bases(&refs));
        assert!(stats.counts.is_empty());
    }

    #[rstest]
    fn test_inversion_moves_contained_mutation(refs: ReferenceSequences) {
        let mut gd = GenomeDiff::new();
        gd.add(at(Kind::Inv, "1", 1).with("size", 10), false);
        gd.add(at(Kind::Snp, "2", 3).with("new_seq", "C"), false);

        let (target, _) = apply(&mut gd, &refs);
        let snp = gd.find_by_id("2").unwrap();
        assert_eq!(snp.position().unwrap(), 8);
        assert_eq!(snp.get("new_seq"), Some("G"));
        assert_eq!(bases(&target), "TTTTTTTGTTGGGGGCCCCCTTTTT");
    }

    #[rstest]
    fn test_shift_positions_nested_in_amp(refs: ReferenceSequences) {
        let mut gd = GenomeDiff::new();
        gd.add(at(Kind::Amp, "1", 5).with("size", 4).with("new_copy_number", 2), false);
        gd.add(at(Kind::Snp, "2", 6).with("new_seq", "T").with("within", "1:2"), false);
        gd.add(at(Kind::Snp, "3", 6).with("new_seq", "G").with("within", "1:1"), false);
        gd.add(at(Kind::Snp, "4", 20).with("new_seq", "T"), false);

        gd.shift_positions(0, &refs).unwrap();
        let position = |id: &str| gd.find_by_id(id).unwrap().position().unwrap();
        assert_eq!(position("2"), 10);
        assert_eq!(position("3"), 6);
        assert_eq!(position("4"), 24);
    }

    #[rstest]
    fn test_shift_positions_too_deep(refs: ReferenceSequences) {
        let mut gd = GenomeDiff::new();
        gd.add(at(Kind::Amp, "1", 5).with("size", 4).with("new_copy_number", 2), false);
        gd.add(at(Kind::Amp, "2", 6).with("size", 2).with("new_copy_number", 2).with("within", "1:2"), false);
        gd.add(at(Kind::Amp, "3", 6).with("size", 1).with("new_copy_number", 2).with("within", "2:1"), false);
        gd.add(at(Kind::Snp, "4", 6).with("new_seq", "T").with("within", "3:1"), false);

        assert!(matches!(
            gd.shift_positions(0, &refs),
            Err(GenomeDiffError::NestingTooDeep(_))
        ));
    }

    #[rstest]
    fn test_fix_duplicate_accessions() {
        let mut seq = Sequence::new("seq1", "ACGT");
        for accession in ["b0001", "b0001", "b0002"] {
            let mut feature = Feature::new("gene", 1, 2, 1, "thrL");
            feature.accession = Some(accession.to_string());
            seq.features.push(feature);
        }
        let mut refs = ReferenceSequences::new();
        refs.push(seq);

        fix_duplicate_accessions(&mut refs);
        let accessions: Vec<String> = refs.get("seq1").unwrap().features.iter()
            .filter_map(|f| f.accession.clone())
            .collect();
        assert_eq!(accessions, vec!["b0001_1", "b0001_2", "b0002"]);
    }
}
