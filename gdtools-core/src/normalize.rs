//! Moving indels to a canonical position and flagging no-op mutations.
use gdtools_refseq::ReferenceSequences;

use crate::errors::Result;
use crate::genome_diff::GenomeDiff;
use crate::models::{Kind, Record};
use crate::settings::Settings;

/// Marker set on mutations that change nothing in the reference.
pub const NOT_VALID: &str = "is_not_valid";

fn rotate_left(seq: &str) -> String {
    let mut rotated = seq[1..].to_string();
    rotated.push_str(&seq[..1]);
    rotated
}

///
/// Shift a DEL right past every position where removing the same number of
/// bases gives the same sequence.
///
fn normalize_deletion(record: &mut Record, refs: &ReferenceSequences) -> Result<()> {
    let size = record.size()?;
    if size == 0 {
        record.comment_out();
        return Ok(());
    }

    let seq_id = record.seq_id()?.to_string();
    let position = record.position()?;
    let length = refs.sequence_length(&seq_id)?;

    for i in 0..length {
        let deleted = refs.circular_subsequence(&seq_id, position + i, size)?;
        let following = refs.circular_subsequence(&seq_id, position + i + size, size)?;
        if let Some(offset) = deleted
            .bytes()
            .zip(following.bytes())
            .position(|(a, b)| a != b)
        {
            record.set("position", position + i + offset as i64);
            return Ok(());
        }
    }

    log::warn!(
        "Deleted bases repeat along the whole sequence, leaving position as is:\n{}",
        record
    );
    Ok(())
}

///
/// Slide an INS right, whole copies of the insertion first and then single
/// bases, rotating the inserted sequence to keep the result unchanged. An
/// insertion that repeats the bases just before it becomes an AMP.
///
fn normalize_insertion(record: &mut Record, refs: &ReferenceSequences) -> Result<()> {
    let seq_id = record.seq_id()?.to_string();
    let original = record.position()?;
    let mut inserted = record.new_seq()?.to_string();
    let unit = inserted.len() as i64;
    if unit == 0 {
        return Ok(());
    }

    let length = refs.sequence_length(&seq_id)?;
    let mut position = original;

    while position + unit <= length
        && refs.circular_subsequence(&seq_id, position + 1, unit)? == inserted
    {
        position += unit;
    }
    while position < length
        && refs.circular_subsequence(&seq_id, position + 1, 1)?.as_bytes().first()
            == inserted.as_bytes().first()
    {
        inserted = rotate_left(&inserted);
        position += 1;
    }

    if position != original {
        record.set("position", position);
        record.set("new_seq", &inserted);
        record.set("norm_pos", format!("{}_to_{}", original, position));
    }

    let first = position - (unit - 1);
    if unit > 1 && first >= 1 && refs.subsequence(&seq_id, first, position)? == inserted {
        record.kind = Kind::Amp;
        record.remove("new_seq");
        record.remove("insert_position");
        record.set("position", first);
        record.set("size", unit);
        record.set("new_copy_number", 2);
        record.set("orig_type", "INS");
    }
    Ok(())
}

///
/// Canonicalize one mutation against `refs`. Records at position 0 or deleting
/// nothing are commented out; SNP and SUB that match the reference are marked
/// `norm=is_not_valid`.
///
pub fn normalize_record(record: &mut Record, refs: &ReferenceSequences) -> Result<()> {
    if record.position()? == 0 {
        record.comment_out();
        return Ok(());
    }

    match record.kind {
        Kind::Del => normalize_deletion(record, refs)?,
        Kind::Ins => normalize_insertion(record, refs)?,
        Kind::Snp => {
            let reference = refs.circular_subsequence(record.seq_id()?, record.position()?, 1)?;
            if reference == record.new_seq()? {
                record.set("norm", NOT_VALID);
            }
        }
        Kind::Sub => {
            let reference =
                refs.circular_subsequence(record.seq_id()?, record.position()?, record.size()?)?;
            if reference == record.new_seq()? {
                record.set("norm", NOT_VALID);
            }
        }
        _ => {}
    }
    Ok(())
}

impl GenomeDiff {
    ///
    /// Normalize every mutation against `refs`.
    ///
    /// Small AMPs are first rewritten as the equivalent INS so that they are
    /// placed like any other insertion. AMPs marked `within` or `no_normalize`,
    /// or running past the end of their sequence, are left alone.
    ///
    pub fn normalize_mutations(
        &mut self,
        refs: &ReferenceSequences,
        settings: &Settings,
    ) -> Result<()> {
        for record in self.entries.iter_mut().filter(|r| r.kind == Kind::Amp) {
            if record.has("within") || record.has("no_normalize") {
                continue;
            }
            let unit = record.size()?;
            if unit > settings.size_cutoff_amp_becomes_ins_del {
                continue;
            }
            let copies = record.int("new_copy_number")?;
            let position = record.position()?;
            let seq_id = record.seq_id()?.to_string();
            if position + unit * (copies - 1) - 1 > refs.sequence_length(&seq_id)? {
                continue;
            }

            let amplified = refs.subsequence(&seq_id, position, position + unit - 1)?;
            record.kind = Kind::Ins;
            record.set("new_seq", amplified.repeat((copies - 1).max(0) as usize));
            // an insertion goes after its position, an amplification starts at it
            record.set("position", position - 1);
            record.remove("new_copy_number");
            record.remove("size");
        }

        for record in self.entries.iter_mut().filter(|r| r.is_mutation()) {
            if record.is_commented_out() {
                continue;
            }
            let in_reference = record.get("seq_id").is_some_and(|s| refs.contains(s));
            if !in_reference {
                log::warn!("Skipping normalization of mutation on unknown sequence:\n{}", record);
                continue;
            }
            normalize_record(record, refs)?;
        }
        Ok(())
    }

    /// Comment out every record marked `norm=is_not_valid`.
    pub fn comment_out_not_valid(&mut self) -> usize {
        let mut count = 0;
        for record in self.entries.iter_mut() {
            if record.get("norm") == Some(NOT_VALID) && !record.is_commented_out() {
                record.comment_out();
                count += 1;
            }
        }
        count
    }
}
