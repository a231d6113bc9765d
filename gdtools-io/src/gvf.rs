//! Genome Variation Format (GVF 1.0) output.
use std::fmt::{self, Display};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use gdtools_core::mutation::structural::mob_replace_sequence;
use gdtools_core::{GenomeDiff, Kind, Record};
use gdtools_refseq::{ReferenceSequences, parse_region};

use crate::errors::{ConvertError, Result};

pub const GVF_SOURCE: &str = "gdtools";

const GVF_HEADER: [&str; 5] = [
    "##gff-version 3",
    "##gvf-version 1.0",
    "",
    "##source-method Source=gdtools;Type=SNV;Comment=Variants converted from Genome Diff;",
    "",
];

///
/// One GVF data line. Attributes keep their insertion order, after the
/// generated `ID`.
///
#[derive(Debug, Clone, PartialEq)]
pub struct GvfFeature {
    pub seq_id: String,
    pub feature_type: &'static str,
    pub start: i64,
    pub end: i64,
    pub score: Option<String>,
    pub strand: Option<char>,
    pub attributes: Vec<(&'static str, String)>,
}

impl GvfFeature {
    fn new(record: &Record, feature_type: &'static str, start: i64, end: i64) -> Result<Self> {
        Ok(GvfFeature {
            seq_id: record.seq_id()?.to_string(),
            feature_type,
            start,
            end,
            score: None,
            strand: None,
            attributes: Vec::new(),
        })
    }

    pub fn id(&self) -> String {
        format!("{}:{}:{}:{}", self.seq_id, GVF_SOURCE, self.feature_type, self.start)
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    fn push(&mut self, key: &'static str, value: impl ToString) {
        self.attributes.push((key, value.to_string()));
    }
}

impl Display for GvfFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut attributes = format!("ID={}", self.id());
        for (key, value) in &self.attributes {
            attributes.push_str(&format!(";{}={}", key, value));
        }
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t.\t{}",
            self.seq_id,
            GVF_SOURCE,
            self.feature_type,
            self.start,
            self.end,
            self.score.as_deref().unwrap_or("."),
            self.strand.map(String::from).as_deref().unwrap_or("."),
            attributes
        )
    }
}

fn variant_effect(snp_type: &str) -> Option<&'static str> {
    match snp_type {
        "nonsynonymous" => Some("non_synonymous_codon"),
        "synonymous" => Some("synonymous_codon"),
        "nonsense" => Some("nonsense_codon"),
        "intergenic" => Some("intergenic_variant"),
        "RNA" | "pseudogene" => Some("nc_transcript_variant"),
        _ => None,
    }
}

// `top/bottom` strand read counts
fn summed_coverage(value: &str) -> Option<i64> {
    value
        .split('/')
        .map(|c| c.trim().parse::<i64>().ok())
        .sum::<Option<i64>>()
}

fn snv(gd: &GenomeDiff, record: &Record, refs: &ReferenceSequences) -> Result<GvfFeature> {
    let position = record.position()?;
    let mut feature = GvfFeature::new(record, "SNV", position, position)?;
    feature.strand = Some('+');
    feature.push("Reference_seq", refs.subsequence(record.seq_id()?, position, position)?);
    feature.push("Variant_seq", record.new_seq()?);

    let evidence = gd.mutation_evidence_list(record);
    if let Some(ra) = evidence.iter().find(|e| e.kind == Kind::Ra) {
        feature.score = ra.get("consensus_score").map(str::to_string);
        if let Some(total) = ra.get("total_cov").and_then(summed_coverage) {
            feature.push("Total_reads", total);
        }
        if let Some(variant) = ra.get("new_cov").and_then(summed_coverage) {
            feature.push("Variant_reads", variant);
        }
        if let Some(frequency) = ra.get("frequency") {
            feature.push("Variant_freq", frequency);
        }
    }
    if let Some(effect) = record.get("snp_type").and_then(variant_effect) {
        feature.push("Variant_effect", effect);
    }
    Ok(feature)
}

///
/// Convert one mutation. Kinds with no GVF counterpart (MASK) give `None`.
///
pub fn gvf_feature(
    gd: &GenomeDiff,
    record: &Record,
    refs: &ReferenceSequences,
) -> Result<Option<GvfFeature>> {
    let seq_id = record.seq_id()?;
    let position = record.position()?;
    let span_end = || -> Result<i64> { Ok(position + record.size()? - 1) };

    let feature = match record.kind {
        Kind::Snp => snv(gd, record, refs)?,
        Kind::Sub => {
            let end = span_end()?;
            let mut feature = GvfFeature::new(record, "indel", position, end)?;
            feature.push("Reference_seq", refs.subsequence(seq_id, position, end)?);
            feature.push("Variant_seq", record.new_seq()?);
            feature
        }
        Kind::Del => {
            let end = span_end()?;
            let mut feature = GvfFeature::new(record, "deletion", position, end)?;
            feature.push("Reference_seq", refs.subsequence(seq_id, position, end)?);
            feature.push("Variant_seq", ".");
            feature
        }
        Kind::Ins => {
            let mut feature = GvfFeature::new(record, "insertion", position, position)?;
            feature.push("Reference_seq", ".");
            feature.push("Variant_seq", record.new_seq()?);
            feature
        }
        Kind::Mob => {
            let mut feature =
                GvfFeature::new(record, "mobile_element_insertion", position, position)?;
            feature.strand = Some(if record.int("strand")? > 0 { '+' } else { '-' });
            let (inserted, _) = mob_replace_sequence(&mut record.clone(), refs)?;
            feature.push("Reference_seq", ".");
            feature.push("Variant_seq", inserted);
            feature
        }
        Kind::Amp => {
            let mut feature = GvfFeature::new(record, "copy_number_gain", position, position)?;
            feature.push("Reference_seq", ".");
            feature.push("Variant_seq", refs.subsequence(seq_id, position, span_end()?)?);
            feature
        }
        Kind::Inv => GvfFeature::new(record, "inversion", position, span_end()?)?,
        Kind::Con => {
            let end = span_end()?;
            let region = record.text("region")?;
            let (source_id, start, stop) = parse_region(region)?;
            let mut feature = GvfFeature::new(record, "substitution", position, end)?;
            feature.push("Reference_seq", refs.subsequence(seq_id, position, end)?);
            feature.push("Variant_seq", refs.subsequence(&source_id, start, stop)?);
            feature
        }
        Kind::Mask => return Ok(None),
        _ => {
            return Err(ConvertError::Unconvertible {
                kind: record.kind.to_string(),
                id: record.id.clone(),
                message: "not a mutation".to_string(),
            });
        }
    };
    Ok(Some(feature))
}

///
/// GVF features for every mutation in `gd`, or only SNPs with `snv_only`.
///
pub fn gvf_features(
    gd: &GenomeDiff,
    refs: &ReferenceSequences,
    snv_only: bool,
) -> Result<Vec<GvfFeature>> {
    let mut features = Vec::new();
    for record in gd.mutation_list() {
        if snv_only && record.kind != Kind::Snp {
            continue;
        }
        if let Some(feature) = gvf_feature(gd, record, refs)? {
            features.push(feature);
        }
    }
    Ok(features)
}

pub fn write_gvf_records<W: Write>(writer: &mut W, features: &[GvfFeature]) -> Result<()> {
    for line in GVF_HEADER {
        writeln!(writer, "{}", line)?;
    }
    for feature in features {
        writeln!(writer, "{}", feature)?;
    }
    Ok(())
}

pub trait GvfWrite {
    ///
    /// Write the mutations to disk as a GVF file
    ///
    /// # Arguments
    /// - path: the path to the file to dump to
    /// - refs: reference the mutations are described against
    /// - snv_only: keep only single-base substitutions
    fn write_gvf<P: AsRef<Path>>(
        &self,
        path: P,
        refs: &ReferenceSequences,
        snv_only: bool,
    ) -> Result<()>;
}

impl GvfWrite for GenomeDiff {
    fn write_gvf<P: AsRef<Path>>(
        &self,
        path: P,
        refs: &ReferenceSequences,
        snv_only: bool,
    ) -> Result<()> {
        let path = path.as_ref();
        let features = gvf_features(self, refs, snv_only)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        write_gvf_records(&mut writer, &features)?;
        writer.flush()?;

        log::info!("Wrote {} GVF features to {}", features.len(), path.display());
        Ok(())
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
        gd.add(
            Record::new(Kind::Snp, "1")
                .with_evidence(&["10"])
                .with("seq_id", "chr")
                .with("position", 2)
                .with("new_seq", "T")
                .with("snp_type", "synonymous"),
            false,
        );
        gd.add(
            Record::new(Kind::Del, "2")
                .with("seq_id", "chr")
                .with("position", 5)
                .with("size", 3),
            false,
        );
        gd.add(
            Record::new(Kind::Mob, "3")
                .with("seq_id", "chr")
                .with("position", 40)
                .with("repeat_name", "IS1")
                .with("strand", -1)
                .with("duplication_size", 4),
            false,
        );
        gd.add(
            Record::new(Kind::Ra, "10")
                .with("seq_id", "chr")
                .with("position", 2)
                .with("insert_position", 0)
                .with("ref_base", "C")
                .with("new_base", "T")
                .with("consensus_score", "45.2")
                .with("total_cov", "10/12")
                .with("new_cov", "9/12")
                .with("frequency", "1"),
            false,
        );
        gd
    }

    #[rstest]
    fn test_snv_feature(gd: GenomeDiff, refs: ReferenceSequences) {
        let features = gvf_features(&gd, &refs, true).unwrap();
        assert_eq!(features.len(), 1);

        let snv = &features[0];
        assert_eq!(snv.feature_type, "SNV");
        assert_eq!(snv.score.as_deref(), Some("45.2"));
        assert_eq!(snv.attribute("Reference_seq"), Some("C"));
        assert_eq!(snv.attribute("Variant_seq"), Some("T"));
        assert_eq!(snv.attribute("Total_reads"), Some("22"));
        assert_eq!(snv.attribute("Variant_reads"), Some("21"));
        assert_eq!(snv.attribute("Variant_effect"), Some("synonymous_codon"));
        assert_eq!(
            snv.to_string(),
            "chr\tgdtools\tSNV\t2\t2\t45.2\t+\t.\tID=chr:gdtools:SNV:2;Reference_seq=C;Variant_seq=T;\
             Total_reads=22;Variant_reads=21;Variant_freq=1;Variant_effect=synonymous_codon"
        );
    }

    #[rstest]
    fn test_structural_features(gd: GenomeDiff, refs: ReferenceSequences) {
        let features = gvf_features(&gd, &refs, false).unwrap();
        let types: Vec<&str> = features.iter().map(|f| f.feature_type).collect();
        assert_eq!(types, vec!["SNV", "deletion", "mobile_element_insertion"]);

        let del = &features[1];
        assert_eq!((del.start, del.end), (5, 7));
        assert_eq!(del.attribute("Reference_seq"), Some("TGC"));

        let mob = &features[2];
        assert_eq!(mob.strand, Some('-'));
        assert_eq!(mob.attribute("Variant_seq").map(str::len), Some(10));
    }

    #[rstest]
    fn test_write_gvf(gd: GenomeDiff, refs: ReferenceSequences) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/mutations.gvf");
        gd.write_gvf(&path, &refs, false).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "##gff-version 3");
        assert_eq!(lines[1], "##gvf-version 1.0");
        assert_eq!(lines.iter().filter(|l| !l.starts_with('#') && !l.is_empty()).count(), 3);
    }
}
