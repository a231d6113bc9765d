//! Variant Call Format input.
//!
//! Only the classifiable single-allele calls are kept: SNPs, and insertions
//! or deletions anchored on a shared leading base. INFO pairs become record
//! fields.
use std::io::BufRead;
use std::path::Path;

use gdtools_core::{GenomeDiff, Kind, Record};
use gdtools_refseq::utils::get_dynamic_reader;

use crate::errors::{ConvertError, Result};

// VCF column order
const CHROM: usize = 0;
const POS: usize = 1;
const REF: usize = 3;
const ALT: usize = 4;
const INFO: usize = 7;

///
/// Classify one VCF data line. `Ok(None)` means the call could not be
/// expressed as a Genome Diff mutation and was skipped.
///
pub fn vcf_record(line: &str, line_number: usize) -> Result<Option<Record>> {
    let tokens: Vec<&str> = line.split('\t').map(str::trim).collect();
    if tokens.len() <= INFO {
        return Err(ConvertError::InvalidVcfLine {
            line_number,
            message: format!("expected at least {} tab-delimited columns", INFO + 1),
        });
    }

    let position = tokens[POS]
        .parse::<i64>()
        .map_err(|_| ConvertError::InvalidVcfLine {
            line_number,
            message: format!("POS is not an integer: {}", tokens[POS]),
        })?;
    let (ref_seq, alt_seq) = (tokens[REF], tokens[ALT]);

    if alt_seq.contains(',') || alt_seq.starts_with('<') || alt_seq == "." || alt_seq == "*" {
        log::warn!("Can't classify line {}: {}", line_number, line);
        return Ok(None);
    }

    let mut record = if ref_seq.len() > alt_seq.len() {
        Record::new(Kind::Del, "")
            .with("seq_id", tokens[CHROM])
            .with("position", position + alt_seq.len() as i64)
            .with("size", ref_seq.len() - alt_seq.len())
    } else if ref_seq.len() < alt_seq.len() {
        let inserted = alt_seq.strip_prefix(ref_seq).unwrap_or(alt_seq);
        Record::new(Kind::Ins, "")
            .with("seq_id", tokens[CHROM])
            .with("position", position)
            .with("new_seq", inserted)
    } else if ref_seq.len() == 1 {
        Record::new(Kind::Snp, "")
            .with("seq_id", tokens[CHROM])
            .with("position", position)
            .with("new_seq", alt_seq)
    } else {
        log::warn!("Can't classify line {}: {}", line_number, line);
        return Ok(None);
    };

    for pair in tokens[INFO].split(';').filter(|p| *p != ".") {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        if record.has(key) {
            log::warn!("Ignoring INFO key {} that would replace a required field", key);
            continue;
        }
        record.set(key, value);
    }
    Ok(Some(record))
}

pub fn read_vcf_lines<I, S>(lines: I) -> Result<GenomeDiff>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut gd = GenomeDiff::new();
    let mut skipped = 0;
    for (i, line) in lines.into_iter().enumerate() {
        let line = line.as_ref();
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        match vcf_record(line, i + 1)? {
            Some(record) => {
                gd.add(record, true);
            }
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        log::info!("Skipped {} VCF lines that could not be classified", skipped);
    }
    Ok(gd)
}

///
/// Read a VCF file (optionally gzipped) into a new Genome Diff.
///
pub fn read_vcf<P: AsRef<Path>>(path: P) -> Result<GenomeDiff> {
    let path = path.as_ref();
    let reader = get_dynamic_reader(path)?;
    let lines = reader.lines().collect::<std::io::Result<Vec<String>>>()?;
    read_vcf_lines(lines)
}
