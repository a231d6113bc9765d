//! Per-document mutation tallies for the `count` command.
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

use gdtools_refseq::ReferenceSequences;

use crate::errors::Result;
use crate::genome_diff::GenomeDiff;
use crate::models::Kind;

/// SNP classes reported as separate columns, taken from `snp_type`.
pub const SNP_TYPES: [&str; 5] = [
    "nonsynonymous",
    "synonymous",
    "noncoding",
    "pseudogene",
    "intergenic",
];

/// Indels and amplifications up to this size count as `small_indel`.
pub const SMALL_INDEL_MAX_SIZE: i64 = 20;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationCounts {
    pub name: String,
    pub total: usize,
    pub snp_types: BTreeMap<String, usize>,
    pub small_indel: usize,
    pub large_del: usize,
    pub deleted_bp: i64,
    pub inserted_bp: i64,
    pub repeat_inserted_bp: i64,
    pub amplification: usize,
    pub mobile_element: usize,
    /// MOB insertions and repeat-mediated indels, per repeat family.
    pub by_repeat: BTreeMap<String, usize>,
    pub gene_conversion: usize,
    /// Reference bases not covered by an UN region.
    pub called_bp: i64,
    pub total_bp: i64,
}

impl GenomeDiff {
    ///
    /// Tally the mutations of this document. Commented-out mutations are not
    /// counted, and MOB insertions count the length of their repeat family in
    /// `refs`.
    ///
    pub fn count_mutations(&self, refs: &ReferenceSequences) -> Result<MutationCounts> {
        let mut counts = MutationCounts {
            name: self.metadata.title.clone(),
            total_bp: refs.total_length(),
            ..Default::default()
        };

        for record in self.mutation_list() {
            if record.is_commented_out() {
                continue;
            }
            counts.total += 1;

            match record.kind {
                Kind::Snp => {
                    if let Some(snp_type) = record.get("snp_type") {
                        *counts.snp_types.entry(snp_type.to_string()).or_default() += 1;
                    }
                }
                Kind::Del => {
                    let size = record.size()?;
                    counts.deleted_bp += size;
                    if let Some(repeat) = record.get("mediated") {
                        *counts.by_repeat.entry(repeat.to_string()).or_default() += 1;
                    }
                    match size > SMALL_INDEL_MAX_SIZE {
                        true => counts.large_del += 1,
                        false => counts.small_indel += 1,
                    }
                }
                Kind::Ins => {
                    let size = record.new_seq()?.len() as i64;
                    counts.inserted_bp += size;
                    if size <= SMALL_INDEL_MAX_SIZE {
                        counts.small_indel += 1;
                    }
                }
                Kind::Amp => {
                    let size = record.size()?;
                    counts.inserted_bp += size * (record.int("new_copy_number")? - 1);
                    match size > SMALL_INDEL_MAX_SIZE {
                        true => counts.amplification += 1,
                        false => counts.small_indel += 1,
                    }
                }
                Kind::Mob => {
                    let repeat = record.text("repeat_name")?;
                    let length = refs.repeat_family_sequence(repeat, 1, None)?.sequence.len() as i64;
                    counts.inserted_bp += length;
                    counts.repeat_inserted_bp += length;
                    counts.mobile_element += 1;
                    *counts.by_repeat.entry(repeat.to_string()).or_default() += 1;
                }
                Kind::Con => counts.gene_conversion += 1,
                _ => {}
            }
        }

        let mut uncalled = 0;
        for un in self.list(&[Kind::Un]) {
            uncalled += un.int("end")? - un.int("start")? + 1;
        }
        counts.called_bp = counts.total_bp - uncalled;

        Ok(counts)
    }
}

///
/// Write one tab-separated row per document. Every repeat family seen in any
/// document gets its own column.
///
pub fn write_count_table<W: Write>(writer: &mut W, counts: &[MutationCounts]) -> Result<()> {
    let repeats: BTreeSet<&String> = counts.iter().flat_map(|c| c.by_repeat.keys()).collect();

    let mut header: Vec<String> = vec!["sample".to_string(), "total".to_string()];
    header.extend(SNP_TYPES.iter().map(|t| t.to_string()));
    header.extend(
        [
            "small_indel",
            "large_del",
            "deleted_bp",
            "inserted_bp",
            "repeat_inserted_bp",
            "amplification",
            "mobile_element",
        ]
        .map(String::from),
    );
    header.extend(repeats.iter().map(|r| r.to_string()));
    header.extend(["gene_conversion", "called_bp", "total_bp"].map(String::from));
    writeln!(writer, "{}", header.join("\t"))?;

    for c in counts {
        let mut row = vec![c.name.clone(), c.total.to_string()];
        row.extend(
            SNP_TYPES
                .iter()
                .map(|t| c.snp_types.get(*t).copied().unwrap_or_default().to_string()),
        );
        row.extend([
            c.small_indel.to_string(),
            c.large_del.to_string(),
            c.deleted_bp.to_string(),
            c.inserted_bp.to_string(),
            c.repeat_inserted_bp.to_string(),
            c.amplification.to_string(),
            c.mobile_element.to_string(),
        ]);
        row.extend(
            repeats
                .iter()
                .map(|r| c.by_repeat.get(*r).copied().unwrap_or_default().to_string()),
        );
        row.extend([
            c.gene_conversion.to_string(),
            c.called_bp.to_string(),
            c.total_bp.to_string(),
        ]);
        writeln!(writer, "{}", row.join("\t"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use gdtools_refseq::{Feature, Sequence};
    use pretty_assertions::assert_eq;
    use rstest::*;

    use crate::models::Record;

    #[fixture]
    fn refs() -> ReferenceSequences {
        let mut seq = Sequence::new("chr", &"ACGTTGCA".repeat(20));
        seq.features
            .push(Feature::new("repeat_region", 100, 109, 1, "IS1"));
        let mut refs = ReferenceSequences::new();
        refs.push(seq);
        refs
    }

    #[fixture]
    fn gd() -> GenomeDiff {
        let mut gd = GenomeDiff::new();
        gd.metadata.title = "clone_A".to_string();
        let records = vec![
            Record::new(Kind::Snp, "1")
                .with("seq_id", "chr")
                .with("position", 2)
                .with("new_seq", "T")
                .with("snp_type", "synonymous"),
            Record::new(Kind::Del, "2")
                .with("seq_id", "chr")
                .with("position", 5)
                .with("size", 3),
            Record::new(Kind::Del, "3")
                .with("seq_id", "chr")
                .with("position", 20)
                .with("size", 30)
                .with("mediated", "IS1"),
            Record::new(Kind::Ins, "4")
                .with("seq_id", "chr")
                .with("position", 60)
                .with("new_seq", "GG"),
            Record::new(Kind::Mob, "5")
                .with("seq_id", "chr")
                .with("position", 70)
                .with("repeat_name", "IS1")
                .with("strand", 1)
                .with("duplication_size", 4),
            Record::new(Kind::Amp, "6")
                .with("seq_id", "chr")
                .with("position", 120)
                .with("size", 25)
                .with("new_copy_number", 3),
            Record::new(Kind::Snp, "7")
                .with("seq_id", "chr")
                .with("position", 150)
                .with("new_seq", "A")
                .with("comment_out", "True"),
            Record::new(Kind::Un, "8").with("seq_id", "chr").with("start", 11).with("end", 20),
        ];
        for record in records {
            gd.add(record, false);
        }
        gd
    }

    #[rstest]
    fn test_count_mutations(gd: GenomeDiff, refs: ReferenceSequences) {
        let counts = gd.count_mutations(&refs).unwrap();

        assert_eq!(counts.name, "clone_A");
        assert_eq!(counts.total, 6);
        assert_eq!(counts.snp_types.get("synonymous"), Some(&1));
        assert_eq!((counts.small_indel, counts.large_del), (2, 1));
        assert_eq!(counts.deleted_bp, 33);
        // GG, the 10 bp IS1 copy and two extra 25 bp units
        assert_eq!(counts.inserted_bp, 2 + 10 + 50);
        assert_eq!(counts.repeat_inserted_bp, 10);
        assert_eq!(counts.amplification, 1);
        assert_eq!(counts.mobile_element, 1);
        assert_eq!(counts.by_repeat.get("IS1"), Some(&2));
        assert_eq!((counts.called_bp, counts.total_bp), (150, 160));
    }

    #[rstest]
    fn test_count_table_columns(gd: GenomeDiff, refs: ReferenceSequences) {
        let counts = vec![
            gd.count_mutations(&refs).unwrap(),
            GenomeDiff::new().count_mutations(&refs).unwrap(),
        ];
        let mut out = Vec::new();
        write_count_table(&mut out, &counts).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<Vec<&str>> = text.lines().map(|l| l.split('\t').collect()).collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), lines[1].len());
        assert_eq!(lines[0].len(), lines[2].len());

        let column = |name: &str| lines[0].iter().position(|h| *h == name).unwrap();
        assert_eq!(lines[1][column("IS1")], "2");
        assert_eq!(lines[2][column("IS1")], "0");
        assert_eq!(lines[1][column("total")], "6");
        assert_eq!(lines[2][column("called_bp")], "160");
    }
}
