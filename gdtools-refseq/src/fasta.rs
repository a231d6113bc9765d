use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

use crate::errors::Result;
use crate::models::Sequence;
use crate::utils::get_dynamic_reader;

/// Bases per line when writing FASTA.
pub const FASTA_LINE_WIDTH: usize = 60;

///
/// Read every record of a FASTA file (plain or gzipped).
///
/// The first whitespace-delimited word of a header becomes the `seq_id`, the rest
/// of the header line is kept as the description. Bases are uppercased.
///
pub fn read_fasta<P: AsRef<Path>>(path: P) -> Result<Vec<Sequence>> {
    let reader = get_dynamic_reader(path.as_ref())?;
    read_fasta_lines(reader.lines())
}

/// Parse FASTA records out of an iterator of lines.
pub fn read_fasta_lines<I>(lines: I) -> Result<Vec<Sequence>>
where
    I: IntoIterator<Item = std::io::Result<String>>,
{
    let mut sequences = Vec::new();
    let mut current: Option<Sequence> = None;

    for line in lines {
        let line = line?;
        let line = line.trim_end();

        if let Some(header) = line.strip_prefix('>') {
            if let Some(seq) = current.take() {
                sequences.push(seq);
            }
            let mut parts = header.trim().splitn(2, char::is_whitespace);
            let seq_id = parts.next().unwrap_or_default();
            let mut seq = Sequence::new(seq_id, "");
            seq.description = parts.next().unwrap_or_default().trim().to_string();
            current = Some(seq);
        } else if let Some(seq) = current.as_mut() {
            seq.bases.extend(
                line.bytes()
                    .filter(|b| !b.is_ascii_whitespace())
                    .map(|b| b.to_ascii_uppercase()),
            );
        }
    }

    if let Some(seq) = current.take() {
        sequences.push(seq);
    }

    Ok(sequences)
}

/// Write sequences as FASTA records to any writer.
pub fn write_fasta_records<W: Write>(writer: &mut W, sequences: &[Sequence]) -> Result<()> {
    for seq in sequences {
        if seq.description.is_empty() {
            writeln!(writer, ">{}", seq.seq_id)?;
        } else {
            writeln!(writer, ">{} {}", seq.seq_id, seq.description)?;
        }
        for chunk in seq.bases.chunks(FASTA_LINE_WIDTH) {
            writer.write_all(chunk)?;
            writer.write_all(b"\n")?;
        }
    }
    Ok(())
}

///
/// Write sequences to a FASTA file.
///
pub fn write_fasta<P: AsRef<Path>>(path: P, sequences: &[Sequence]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_fasta_records(&mut writer, sequences)?;
    writer.flush()?;
    Ok(())
}
