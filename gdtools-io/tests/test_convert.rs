//! VCF and GVF conversion of the fixtures in tests/data.

use std::path::PathBuf;

use gdtools_core::{GenomeDiff, Kind};
use gdtools_io::{GvfWrite, read_vcf};
use gdtools_refseq::ReferenceSequences;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn data(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../tests/data")
        .join(name)
}

#[test]
fn test_vcf_calls_match_sample() {
    let mut calls = read_vcf(data("calls.vcf")).unwrap();
    let kinds: Vec<Kind> = calls.mutation_list().iter().map(|r| r.kind).collect();
    assert_eq!(kinds.len(), 3);
    assert!(kinds.contains(&Kind::Del));

    // the multi-allelic call is skipped; the rest are the sample mutations
    let sample = GenomeDiff::read(data("sample.gd")).unwrap();
    calls.subtract(&sample, false).unwrap();
    assert!(calls.mutation_list().is_empty());
}

#[test]
fn test_vcf_to_gd_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("calls.gd");
    let mut calls = read_vcf(data("calls.vcf")).unwrap();
    calls.write(&path).unwrap();

    let reread = GenomeDiff::read(&path).unwrap();
    let snp = reread
        .mutation_list()
        .into_iter()
        .find(|r| r.kind == Kind::Snp)
        .unwrap();
    assert_eq!(snp.get("DP"), Some("30"));
    assert_eq!(snp.get("AF"), Some("1.0"));
}

#[test]
fn test_sample_to_gvf() {
    let refs = ReferenceSequences::from_paths(&[data("reference.gff3")]).unwrap();
    let sample = GenomeDiff::read(data("sample.gd")).unwrap();
    let dir = tempdir().unwrap();

    let all = dir.path().join("sample.gvf");
    sample.write_gvf(&all, &refs, false).unwrap();
    let text = std::fs::read_to_string(&all).unwrap();
    let features: Vec<&str> = text
        .lines()
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect();
    assert_eq!(features.len(), 4);
    assert!(features.iter().any(|l| l.contains("\tdeletion\t80\t84\t")));
    assert!(features.iter().any(|l| l.contains("Variant_seq=CCA")));

    let snvs = dir.path().join("snvs.gvf");
    sample.write_gvf(&snvs, &refs, true).unwrap();
    let text = std::fs::read_to_string(&snvs).unwrap();
    let snv_lines: Vec<&str> = text.lines().filter(|l| l.starts_with("chr\t")).collect();
    assert_eq!(snv_lines.len(), 2);
    assert!(snv_lines[0].contains("Reference_seq=A;Variant_seq=G"));
}
