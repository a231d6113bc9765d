//! Cross-checks of a Genome Diff against its reference sequences.
use fxhash::FxHashMap as HashMap;
use gdtools_refseq::ReferenceSequences;

use crate::coords::{Coordinate, reference_span};
use crate::errors::{GenomeDiffError, ParseReport, Result};
use crate::genome_diff::GenomeDiff;
use crate::models::{Kind, Record};
use crate::mutation::structural::{mediated_repeat, mob_replace_sequence};

/// Kinds whose span duplicates or removes reference bases.
const CLAIMING_KINDS: [Kind; 5] = [Kind::Mob, Kind::Amp, Kind::Del, Kind::Sub, Kind::Con];

struct Claim<'a> {
    id: &'a str,
    start: Coordinate,
    end: Coordinate,
}

fn flag(report: &mut ParseReport, record: &Record, message: &str, fatal: bool) {
    report.add(record.line_number(), &record.to_string(), message, fatal);
}

///
/// The reference interval a record declared `within=outer[:copy]` must touch,
/// or the reason the declaration is malformed.
///
fn within_bounds(
    outer: &Record,
    within: &str,
    copy: Option<&str>,
    refs: &ReferenceSequences,
) -> std::result::Result<(i64, i64), String> {
    let copy = copy
        .map(|c| c.parse::<i64>())
        .transpose()
        .map_err(|_| format!("Copy index in 'within' is not an integer: {}", within))?;
    let position = outer.position().map_err(|e| e.to_string())?;

    match outer.kind {
        Kind::Amp => {
            if copy.is_none() {
                return Err(format!(
                    "Expected AMP field 'within' to be of form 'within=mutation_id:copy_index'. Instead, found: {}",
                    within
                ));
            }
            let mut end = position + outer.size().map_err(|e| e.to_string())? - 1;
            if outer.has("mediated") && outer.has("mediated_strand") {
                if let Some(pick) = mediated_repeat(outer, refs).map_err(|e| e.to_string())? {
                    end += pick.sequence.len() as i64;
                }
            }
            Ok((position, end))
        }
        Kind::Mob => {
            let duplication = outer
                .int("duplication_size")
                .map_err(|e| e.to_string())?
                .max(0);
            let text_len = |key: &str| outer.get(key).map(|s| s.len() as i64).unwrap_or(0);
            match copy {
                // inside the inserted element itself
                None => {
                    let (inserted, _) =
                        mob_replace_sequence(&mut outer.clone(), refs).map_err(|e| e.to_string())?;
                    let start = position + duplication;
                    Ok((start, start + inserted.len() as i64 - 1))
                }
                // inside one of the two target site copies
                Some(copy) => {
                    let mut end = position + duplication - 1;
                    match copy {
                        1 => end += text_len("ins_start"),
                        2 => end += text_len("ins_end"),
                        _ => {}
                    }
                    Ok((position, end))
                }
            }
        }
        Kind::Ins => {
            let Some(offset) = copy else {
                return Err(format!(
                    "Expected INS field 'within' to be of form 'within=mutation_id:position'. Instead, found: {}",
                    within
                ));
            };
            let inserted = outer.new_seq().map_err(|e| e.to_string())?.len() as i64;
            if !(1..=inserted).contains(&offset) {
                return Err(format!(
                    "Position of mutation in 'within=mutation_id:position' tag must be within the size of the INS 1-{} for mutation that is 'within' this mutation:\n{}",
                    inserted, outer
                ));
            }
            Ok((position, position))
        }
        _ => Err("Field 'within' provided for an entry that is not of AMP, MOB, or INS type.".to_string()),
    }
}

impl GenomeDiff {
    ///
    /// Check every record against `refs` and collect all problems found.
    ///
    /// Later checks only run when earlier ones found nothing fatal, since
    /// they assume sequences, positions and repeat families resolve.
    ///
    pub fn validation_report(&self, refs: &ReferenceSequences) -> ParseReport {
        let file = self
            .file_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let mut report = ParseReport::new(&file);

        self.check_locations(refs, &mut report);
        self.check_repeat_families(refs, &mut report);
        if report.is_fatal() {
            return report;
        }

        self.check_ordering_tags(refs, &mut report);
        if report.is_fatal() {
            return report;
        }

        self.check_redundant_sequences(refs, &mut report);
        report
    }

    ///
    /// Like [`GenomeDiff::validation_report`], but logs the problems and
    /// fails when any of them is fatal.
    ///
    pub fn validate_with_reference(&self, refs: &ReferenceSequences) -> Result<()> {
        let report = self.validation_report(refs);
        report.log_issues();
        if report.is_fatal() {
            return Err(GenomeDiffError::Parse(report));
        }
        Ok(())
    }

    fn check_locations(&self, refs: &ReferenceSequences, report: &mut ParseReport) {
        for record in self.entries.iter() {
            let Some(seq_id) = record.get("seq_id") else {
                continue;
            };
            let Ok(length) = refs.sequence_length(seq_id) else {
                flag(
                    report,
                    record,
                    &format!("Seq ID [{}] not found in reference sequence files provided for entry.", seq_id),
                    true,
                );
                continue;
            };

            let Some(position) = record.get("position") else {
                continue;
            };
            match position.parse::<i64>() {
                Ok(p) if (1..=length).contains(&p) => {}
                _ => flag(
                    report,
                    record,
                    &format!(
                        "Position [{}] is out of valid range for seq_id [1,{}] for entry.",
                        position, length
                    ),
                    true,
                ),
            }
        }
    }

    fn check_repeat_families(&self, refs: &ReferenceSequences, report: &mut ParseReport) {
        for record in self.entries.iter().filter(|r| r.is_mutation()) {
            let family = match record.kind {
                Kind::Mob => record.get("repeat_name"),
                Kind::Amp => record.get("mediated"),
                _ => None,
            };
            let Some(family) = family.filter(|f| !f.is_empty()) else {
                continue;
            };
            if refs.repeat_family_sequence(family, 1, None).is_err() {
                flag(
                    report,
                    record,
                    &format!("Repeat family name '{}' does not exist in reference sequence.", family),
                    true,
                );
            }
        }
    }

    fn check_ordering_tags(&self, refs: &ReferenceSequences, report: &mut ParseReport) {
        let mut claims: HashMap<&str, Vec<Claim>> = HashMap::default();
        for record in self.entries.iter().filter(|r| CLAIMING_KINDS.contains(&r.kind)) {
            let (Ok(seq_id), Ok((start, end))) = (record.seq_id(), reference_span(record)) else {
                flag(report, record, "Could not determine the span of this mutation.", true);
                continue;
            };
            claims.entry(seq_id).or_default().push(Claim {
                id: &record.id,
                start,
                end,
            });
        }

        for record in self.entries.iter().filter(|r| r.is_mutation()) {
            if let Some((outer_id, copy)) = record.id_reference("within") {
                self.check_within(record, outer_id, copy, refs, report);
            } else if let Some((before_id, _)) = record.id_reference("before") {
                if self.find_by_id(before_id).is_none() {
                    flag(
                        report,
                        record,
                        &format!(
                            "Attempt to put mutation 'before' a mutation with an id that does not exist in file: {}",
                            before_id
                        ),
                        true,
                    );
                }
            } else {
                let Ok((start, end)) = reference_span(record) else {
                    continue;
                };
                let enclosing = claims
                    .get(record.get("seq_id").unwrap_or_default())
                    .into_iter()
                    .flatten()
                    .filter(|c| c.id != record.id && start >= c.start && end <= c.end);
                for claim in enclosing {
                    // an enclosing mutation that is itself nested is left to the user
                    if self.find_by_id(claim.id).is_some_and(|r| r.has("within")) {
                        continue;
                    }
                    flag(
                        report,
                        record,
                        "Mutation requires 'before' or 'within' field to disambiguate when and how it occurs because it overlaps bases that are duplicated or deleted by another mutation.",
                        true,
                    );
                }
            }
        }
    }

    fn check_within(
        &self,
        record: &Record,
        outer_id: &str,
        copy: Option<&str>,
        refs: &ReferenceSequences,
        report: &mut ParseReport,
    ) {
        let Some(outer) = self.find_by_id(outer_id) else {
            flag(
                report,
                record,
                &format!(
                    "Attempt to put mutation 'within' a mutation with an id that does not exist in file: {}",
                    outer_id
                ),
                true,
            );
            return;
        };

        if outer.get("seq_id") != record.get("seq_id") {
            flag(
                report,
                record,
                &format!(
                    "Attempt to put mutation 'within' a mutation on a different reference sequence id:\n{}",
                    outer
                ),
                true,
            );
        }

        let within = record.get("within").unwrap_or_default();
        let (mut valid_start, valid_end) = match within_bounds(outer, within, copy, refs) {
            Ok(bounds) => bounds,
            Err(message) => {
                flag(report, record, &message, true);
                return;
            }
        };

        // an insertion may sit right before the interval, next to a mobile element
        if record.kind == Kind::Ins {
            valid_start -= 1;
        }

        let (Ok(position), Ok(size)) = (record.position(), record.int_or("size", 0)) else {
            flag(report, record, "Could not read the position of this mutation.", true);
            return;
        };
        let starts_inside = position >= valid_start && position <= valid_end;
        let covers_start = valid_start >= position && valid_start <= position + size - 1;
        if !starts_inside && !covers_start {
            flag(
                report,
                record,
                &format!(
                    "Mutation must overlap interval {}-{} for mutation that is 'within' this mutation:\n{}",
                    valid_start, valid_end, outer
                ),
                true,
            );
        }
    }

    fn check_redundant_sequences(&self, refs: &ReferenceSequences, report: &mut ParseReport) {
        for record in self.entries.iter().filter(|r| !r.has("within")) {
            let (Ok(seq_id), Ok(position)) = (record.seq_id(), record.position()) else {
                continue;
            };
            match record.kind {
                Kind::Ra => {
                    if record.get("error") == Some("polymorphic_without_reference_base") {
                        continue;
                    }
                    let reference_base = match record.int_or("insert_position", 0) {
                        Ok(0) => refs.subsequence(seq_id, position, position).unwrap_or_default(),
                        _ => ".".to_string(),
                    };
                    if record.get("ref_base") != Some(reference_base.as_str()) {
                        flag(
                            report,
                            record,
                            &format!(
                                "Specified REF_BASE does not match actual reference base ({}) at the specified positon.",
                                reference_base
                            ),
                            false,
                        );
                    }
                    if record.get("ref_base") == record.get("new_base") {
                        flag(report, record, "Specified REF_BASE and NEW_BASE are the same.", false);
                    }
                }
                Kind::Snp => {
                    let reference = refs.subsequence(seq_id, position, position).ok();
                    if reference.as_deref() == record.get("new_seq") {
                        flag(
                            report,
                            record,
                            "Specified NEW_SEQ is the same as the reference sequence at the specified position.",
                            false,
                        );
                    }
                }
                Kind::Sub => {
                    let Ok(size) = record.size() else {
                        continue;
                    };
                    let reference = refs.subsequence(seq_id, position, position + size - 1).ok();
                    if reference.as_deref() == record.get("new_seq") {
                        flag(
                            report,
                            record,
                            "Specified NEW_SEQ is the same as the reference sequence at the specified positions.",
                            false,
                        );
                    }
                }
                _ => {}
            }
        }
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
        let mut seq = Sequence::new("chr", &"ACGT".repeat(50));
        seq.features.push(Feature::new("repeat_region", 150, 169, 1, "IS1"));
        let mut refs = ReferenceSequences::new();
        refs.push(seq);
        refs
    }

    fn parse(body: &str) -> GenomeDiff {
        GenomeDiff::parse_str(&format!("#=GENOME_DIFF\t1.0\n{}", body)).unwrap()
    }

    #[rstest]
    fn test_valid_document(refs: ReferenceSequences) {
        let gd = parse("SNP\t1\t.\tchr\t10\tA\nDEL\t2\t.\tchr\t50\t5\nMOB\t3\t.\tchr\t120\tIS1\t1\t4\n");
        let report = gd.validation_report(&refs);
        assert!(report.is_empty(), "{}", report);
        assert!(gd.validate_with_reference(&refs).is_ok());
    }

    #[rstest]
    #[case("SNP\t1\t.\tplasmid\t10\tA\n")]
    #[case("SNP\t1\t.\tchr\t201\tA\n")]
    #[case("MOB\t1\t.\tchr\t10\tIS5\t1\t4\n")]
    #[case("AMP\t1\t.\tchr\t10\t20\t2\tmediated=IS5\tmediated_strand=1\n")]
    fn test_reference_mismatch(refs: ReferenceSequences, #[case] body: &str) {
        let gd = parse(body);
        assert!(gd.validation_report(&refs).is_fatal());
        assert!(matches!(
            gd.validate_with_reference(&refs),
            Err(GenomeDiffError::Parse(_))
        ));
    }

    #[rstest]
    fn test_ambiguous_overlap(refs: ReferenceSequences) {
        let gd = parse("SNP\t1\t.\tchr\t12\tA\nAMP\t2\t.\tchr\t10\t5\t2\n");
        let report = gd.validation_report(&refs);
        assert_eq!(report.fatal_count(), 1);

        let gd = parse("SNP\t1\t.\tchr\t12\tA\twithin=2:1\nAMP\t2\t.\tchr\t10\t5\t2\n");
        assert!(!gd.validation_report(&refs).is_fatal());

        let gd = parse("SNP\t1\t.\tchr\t12\tA\tbefore=2\nAMP\t2\t.\tchr\t10\t5\t2\n");
        assert!(!gd.validation_report(&refs).is_fatal());
    }

    #[rstest]
    fn test_enclosing_nested_mutation_exempt(refs: ReferenceSequences) {
        let gd = parse(
            "SNP\t1\t.\tchr\t12\tA\nDEL\t2\t.\tchr\t11\t3\twithin=3:1\nAMP\t3\t.\tchr\t10\t5\t2\n",
        );
        let report = gd.validation_report(&refs);
        // only the SNP inside the AMP is ambiguous
        assert_eq!(report.fatal_count(), 1);
        assert_eq!(report.issues[0].line_number, 2);
    }

    #[rstest]
    #[case("SNP\t1\t.\tchr\t12\tA\twithin=9:1\nAMP\t2\t.\tchr\t10\t5\t2\n")]
    #[case("SNP\t1\t.\tchr\t12\tA\twithin=2\nAMP\t2\t.\tchr\t10\t5\t2\n")]
    #[case("SNP\t1\t.\tchr\t40\tA\twithin=2:1\nAMP\t2\t.\tchr\t10\t5\t2\n")]
    #[case("SNP\t1\t.\tchr\t12\tA\twithin=2:1\nDEL\t2\t.\tchr\t10\t5\n")]
    #[case("SNP\t1\t.\tchr\t12\tA\tbefore=9\n")]
    #[case("INS\t1\t.\tchr\t12\tA\twithin=2:7\nINS\t2\t.\tchr\t12\tACGT\n")]
    fn test_bad_ordering_tags(refs: ReferenceSequences, #[case] body: &str) {
        assert!(parse(body).validation_report(&refs).is_fatal());
    }

    #[rstest]
    fn test_within_mob(refs: ReferenceSequences) {
        // MOB at 120 with a 4 bp duplication: the element occupies 124-143
        let gd = parse("MOB\t1\t.\tchr\t120\tIS1\t1\t4\nSNP\t2\t.\tchr\t130\tA\twithin=1\n");
        assert!(!gd.validation_report(&refs).is_fatal());

        let gd = parse("MOB\t1\t.\tchr\t120\tIS1\t1\t4\nSNP\t2\t.\tchr\t121\tA\twithin=1:2\n");
        assert!(!gd.validation_report(&refs).is_fatal());
    }

    #[rstest]
    fn test_redundant_sequences(refs: ReferenceSequences) {
        // position 1 is A, 2-3 are CG
        let gd = parse("SNP\t1\t.\tchr\t1\tA\nSUB\t2\t.\tchr\t2\t2\tCG\nRA\t3\t.\tchr\t1\t0\tT\tA\n");
        let report = gd.validation_report(&refs);
        assert!(!report.is_fatal());
        assert_eq!(report.issues.len(), 3);
    }
}
