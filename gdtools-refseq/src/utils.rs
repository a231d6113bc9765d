use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::errors::{RefSeqError, Result};

///
/// Get a reader for either a gzip'd or non-gzip'd file.
///
/// # Arguments
///
/// - path: path to the file to read
///
pub fn get_dynamic_reader(path: &Path) -> Result<BufReader<Box<dyn Read>>> {
    let is_gzipped = path.extension() == Some(OsStr::new("gz"));
    let file = File::open(path)?;
    let file: Box<dyn Read> = match is_gzipped {
        true => Box::new(MultiGzDecoder::new(file)),
        false => Box::new(file),
    };

    Ok(BufReader::new(file))
}

///
/// Lowercased extension of a path, looking through a trailing `.gz`.
///
pub fn file_extension(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let name = name.strip_suffix(".gz").unwrap_or(name);
    Path::new(name)
        .extension()
        .and_then(OsStr::to_str)
        .map(|e| e.to_ascii_lowercase())
}

/// Complement a single IUPAC nucleotide, preserving case.
pub fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'T' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        b'a' => b't',
        b't' => b'a',
        b'c' => b'g',
        b'g' => b'c',
        b'R' => b'Y',
        b'Y' => b'R',
        b'K' => b'M',
        b'M' => b'K',
        b'B' => b'V',
        b'V' => b'B',
        b'D' => b'H',
        b'H' => b'D',
        other => other,
    }
}

/// Reverse complement a nucleotide string.
pub fn reverse_complement(seq: &str) -> String {
    seq.bytes().rev().map(|b| complement(b) as char).collect()
}

///
/// Parse a region string of the form `seq_id:start-end` (1-based, inclusive).
///
/// `start` may be greater than `end`, which callers interpret as the reverse strand.
///
pub fn parse_region(region: &str) -> Result<(String, i64, i64)> {
    let invalid = || RefSeqError::InvalidRegion(region.to_string());

    let (seq_id, span) = region.rsplit_once(':').ok_or_else(invalid)?;
    let (start, end) = span.split_once('-').ok_or_else(invalid)?;

    let start = start.trim().replace(',', "").parse::<i64>().map_err(|_| invalid())?;
    let end = end.trim().replace(',', "").parse::<i64>().map_err(|_| invalid())?;

    if seq_id.is_empty() || start < 1 || end < 1 {
        return Err(invalid());
    }

    Ok((seq_id.to_string(), start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case("ACGT", "ACGT")]
    #[case("AAAC", "GTTT")]
    #[case("ANNG", "CNNT")]
    #[case("", "")]
    fn test_reverse_complement(#[case] seq: &str, #[case] expected: &str) {
        assert_eq!(reverse_complement(seq), expected);
    }

    #[rstest]
    fn test_parse_region() {
        let (seq_id, start, end) = parse_region("NC_000913:100-250").unwrap();
        assert_eq!(seq_id, "NC_000913");
        assert_eq!(start, 100);
        assert_eq!(end, 250);
    }

    #[rstest]
    fn test_parse_region_reversed_and_colon_in_name() {
        let (seq_id, start, end) = parse_region("chr:1:1,000-20").unwrap();
        assert_eq!(seq_id, "chr:1");
        assert_eq!(start, 1000);
        assert_eq!(end, 20);
    }

    #[rstest]
    #[case("NC_000913")]
    #[case("NC_000913:100")]
    #[case("NC_000913:a-b")]
    #[case(":1-2")]
    #[case("seq:0-10")]
    fn test_parse_region_invalid(#[case] region: &str) {
        assert!(parse_region(region).is_err());
    }

    #[rstest]
    #[case("ref.fasta", Some("fasta"))]
    #[case("ref.GFF3.gz", Some("gff3"))]
    #[case("ref", None)]
    fn test_file_extension(#[case] path: &str, #[case] expected: Option<&str>) {
        assert_eq!(file_extension(Path::new(path)).as_deref(), expected);
    }
}
