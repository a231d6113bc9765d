use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

use crate::errors::{RefSeqError, Result};
use crate::fasta::{read_fasta_lines, write_fasta_records};
use crate::models::{Feature, Sequence};
use crate::utils::get_dynamic_reader;

const ESCAPES: [(&str, &str); 6] = [
    ("%25", "%"),
    ("%3B", ";"),
    ("%3D", "="),
    ("%26", "&"),
    ("%2C", ","),
    ("%09", "\t"),
];

fn unescape(value: &str) -> String {
    if !value.contains('%') {
        return value.to_string();
    }
    let mut out = value.to_string();
    // %25 last so that an escaped percent sign is not decoded twice
    for (code, ch) in ESCAPES.iter().rev() {
        out = out.replace(code, ch);
    }
    out
}

fn escape(value: &str) -> String {
    let mut out = value.to_string();
    for (code, ch) in ESCAPES.iter() {
        out = out.replace(ch, code);
    }
    out
}

/// Parse the ninth GFF3 column into a key/value map.
pub fn parse_attributes(column: &str) -> BTreeMap<String, String> {
    column
        .split(';')
        .filter_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            Some((key.to_string(), unescape(value)))
        })
        .collect()
}

fn parse_feature_line(line: &str, file: &str, line_number: usize) -> Result<(String, Feature)> {
    let parse_error = |message: &str| RefSeqError::Parse {
        file: file.to_string(),
        line: line_number,
        message: message.to_string(),
    };

    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 9 {
        return Err(parse_error("expected 9 tab-delimited columns"));
    }

    let start = fields[3]
        .parse::<i64>()
        .map_err(|_| parse_error("invalid start coordinate"))?;
    let end = fields[4]
        .parse::<i64>()
        .map_err(|_| parse_error("invalid end coordinate"))?;
    let strand = match fields[6] {
        "-" => -1,
        _ => 1,
    };

    let mut attributes = parse_attributes(fields[8]);
    let name = ["Name", "gene", "locus_tag", "ID"]
        .iter()
        .find_map(|k| attributes.get(*k).cloned())
        .unwrap_or_default();
    let accession = attributes.remove("locus_tag");
    let product = attributes.remove("product");
    attributes.remove("Name");

    let feature = Feature {
        feature_type: fields[2].to_string(),
        start: start.min(end),
        end: start.max(end),
        strand,
        name,
        accession,
        product,
        attributes,
    };

    Ok((fields[0].to_string(), feature))
}

///
/// Read a GFF3 file with an optional trailing `##FASTA` section.
///
/// Features are attached to the sequence they name. Sequences referenced only by
/// features (no FASTA record) are returned without bases.
///
pub fn read_gff3<P: AsRef<Path>>(path: P) -> Result<Vec<Sequence>> {
    let file = path.as_ref().display().to_string();
    let reader = get_dynamic_reader(path.as_ref())?;

    let mut order: Vec<String> = Vec::new();
    let mut features: BTreeMap<String, Vec<Feature>> = BTreeMap::new();
    let mut fasta_lines: Vec<std::io::Result<String>> = Vec::new();
    let mut in_fasta = false;

    for (i, line) in reader.lines().enumerate() {
        let line = line?;

        if in_fasta {
            fasta_lines.push(Ok(line));
            continue;
        }

        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "##FASTA" {
            in_fasta = true;
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("##sequence-region") {
            if let Some(seq_id) = rest.split_whitespace().next() {
                if !order.iter().any(|s| s == seq_id) {
                    order.push(seq_id.to_string());
                }
            }
            continue;
        }
        if trimmed.starts_with('#') {
            continue;
        }

        let (seq_id, feature) = parse_feature_line(trimmed, &file, i + 1)?;
        if !order.iter().any(|s| *s == seq_id) {
            order.push(seq_id.clone());
        }
        features.entry(seq_id).or_default().push(feature);
    }

    let mut sequences = read_fasta_lines(fasta_lines)?;
    for seq_id in order {
        if !sequences.iter().any(|s| s.seq_id == seq_id) {
            sequences.push(Sequence::new(&seq_id, ""));
        }
    }

    for seq in sequences.iter_mut() {
        if let Some(list) = features.remove(&seq.seq_id) {
            seq.features = list;
            seq.sort_features();
        }
    }

    Ok(sequences)
}

fn format_attributes(feature: &Feature) -> String {
    let mut attributes = feature.attributes.clone();
    if !feature.name.is_empty() {
        attributes.insert("Name".to_string(), feature.name.clone());
    }
    if let Some(accession) = &feature.accession {
        attributes.insert("locus_tag".to_string(), accession.clone());
    }
    if let Some(product) = &feature.product {
        attributes.insert("product".to_string(), product.clone());
    }

    if attributes.is_empty() {
        return ".".to_string();
    }
    attributes
        .iter()
        .map(|(k, v)| format!("{}={}", k, escape(v)))
        .collect::<Vec<String>>()
        .join(";")
}

/// Write sequences and their features as GFF3 with an embedded FASTA section.
pub fn write_gff3_records<W: Write>(writer: &mut W, sequences: &[Sequence]) -> Result<()> {
    writeln!(writer, "##gff-version 3")?;
    for seq in sequences {
        writeln!(writer, "##sequence-region {} 1 {}", seq.seq_id, seq.length())?;
    }
    for seq in sequences {
        for f in seq.features.iter() {
            writeln!(
                writer,
                "{}\t.\t{}\t{}\t{}\t.\t{}\t.\t{}",
                seq.seq_id,
                f.feature_type,
                f.start,
                f.end,
                if f.strand < 0 { "-" } else { "+" },
                format_attributes(f)
            )?;
        }
    }
    writeln!(writer, "##FASTA")?;
    write_fasta_records(writer, sequences)
}

///
/// Write sequences to a GFF3 file.
///
pub fn write_gff3<P: AsRef<Path>>(path: P, sequences: &[Sequence]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_gff3_records(&mut writer, sequences)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_parse_attributes() {
        let attrs = parse_attributes("ID=gene1;Name=thrL;product=leader%3B peptide");
        assert_eq!(attrs.get("Name").unwrap(), "thrL");
        assert_eq!(attrs.get("product").unwrap(), "leader; peptide");
    }

    #[rstest]
    fn test_parse_feature_line() {
        let line = "NC_1\tsrc\tgene\t190\t255\t.\t-\t.\tID=g1;Name=thrL;locus_tag=b0001";
        let (seq_id, feature) = parse_feature_line(line, "x.gff3", 3).unwrap();
        assert_eq!(seq_id, "NC_1");
        assert_eq!(feature.name, "thrL");
        assert_eq!(feature.accession.as_deref(), Some("b0001"));
        assert_eq!(feature.strand, -1);
        assert_eq!(feature.width(), 66);
    }

    #[rstest]
    fn test_parse_feature_line_too_short() {
        assert!(parse_feature_line("NC_1\tsrc\tgene", "x.gff3", 1).is_err());
    }

    #[rstest]
    fn test_write_then_read_gff3() {
        let mut seq = Sequence::new("chr", "ACGTACGTAC");
        let mut repeat = Feature::new("repeat_region", 2, 5, -1, "IS1");
        repeat.accession = Some("IS1_1".to_string());
        seq.features.push(repeat);

        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("out.gff3");
        write_gff3(&path, &[seq.clone()]).unwrap();

        let read = read_gff3(&path).unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].bases, seq.bases);
        assert_eq!(read[0].features[0].name, "IS1");
        assert_eq!(read[0].features[0].accession.as_deref(), Some("IS1_1"));
        assert_eq!(read[0].features[0].strand, -1);
    }
}
