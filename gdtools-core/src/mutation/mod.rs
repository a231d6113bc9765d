//! Per-kind behavior of the records that change sequence when applied.
//!
//! Each mutation kind (plus MASK) has one implementation of [`MutationKind`]
//! holding its span, length change, nested shift, strand flip and apply rules.
pub mod point;
pub mod structural;

use gdtools_refseq::ReferenceSequences;

use crate::apply::ApplyContext;
use crate::coords::{Coordinate, reference_span};
use crate::errors::{GenomeDiffError, Result};
use crate::models::{Kind, Record};

pub trait MutationKind: Sync {
    /// First and last reference coordinates the record covers.
    fn span(&self, record: &Record) -> Result<(Coordinate, Coordinate)>;

    /// Net change in sequence length caused by applying the record.
    fn size_delta(&self, record: &Record, refs: &ReferenceSequences) -> Result<i64>;

    ///
    /// Position shift for a record declared `within` this one at copy index
    /// `copy` (-1 when no copy was given). `delta` is this record's size delta.
    ///
    fn nested_shift(
        &self,
        _record: &Record,
        _copy: i64,
        _delta: i64,
        _refs: &ReferenceSequences,
    ) -> Result<i64> {
        Ok(0)
    }

    /// Flip the record to the other strand without moving it.
    fn reverse_complement(&self, record: &mut Record) -> Result<()>;

    /// Change the target sequences as described by the record.
    fn apply(&self, record: &mut Record, ctx: &mut ApplyContext) -> Result<()>;
}

///
/// Dispatch table for kinds that can be applied. Evidence and validation kinds
/// other than MASK have no behavior.
///
pub fn behavior(kind: Kind) -> Option<&'static dyn MutationKind> {
    let b: &'static dyn MutationKind = match kind {
        Kind::Snp => &point::Snp,
        Kind::Sub => &point::Sub,
        Kind::Ins => &point::Ins,
        Kind::Del => &point::Del,
        Kind::Mask => &point::Mask,
        Kind::Amp => &structural::Amp,
        Kind::Inv => &structural::Inv,
        Kind::Con => &structural::Con,
        Kind::Mob => &structural::Mob,
        _ => return None,
    };
    Some(b)
}

fn require(record: &Record, operation: &str) -> Result<&'static dyn MutationKind> {
    behavior(record.kind).ok_or_else(|| GenomeDiffError::UnhandledKind {
        kind: record.kind.to_string(),
        operation: operation.to_string(),
    })
}

pub fn size_delta(record: &Record, refs: &ReferenceSequences) -> Result<i64> {
    require(record, "size change")?.size_delta(record, refs)
}

pub fn reverse_complement(record: &mut Record) -> Result<()> {
    require(record, "reverse complement")?.reverse_complement(record)
}

/// The `apply_size_adjust` field, 0 when absent.
pub(crate) fn size_adjust(record: &Record) -> Result<i64> {
    record.int_or("apply_size_adjust", 0)
}

///
/// `size` plus `apply_size_adjust`, which must stay positive.
///
pub(crate) fn adjusted_size(record: &Record) -> Result<i64> {
    let size = record.size()? + size_adjust(record)?;
    if size <= 0 {
        return Err(GenomeDiffError::NonPositiveSize(record.to_string()));
    }
    Ok(size)
}

/// Audit tag attached to every reference edit.
pub(crate) fn audit_tag(record: &Record) -> String {
    format!("{} {}", record.kind, record.id)
}

pub(crate) fn span_of_size(record: &Record) -> Result<(Coordinate, Coordinate)> {
    let position = record.position()?;
    Ok((
        Coordinate::new(position),
        Coordinate::new(position + record.size()? - 1),
    ))
}

///
/// Move `record` to account for a length change of `delta` at
/// `shift_start..=shift_end` on `seq_id`.
///
/// A nested `shift_start` (see [`Coordinate::nested`]) means the change comes
/// from the record that `record` is declared `within`.
///
pub fn shift_position(
    record: &mut Record,
    seq_id: &str,
    shift_start: Coordinate,
    shift_end: Coordinate,
    delta: i64,
) -> Result<()> {
    if delta == 0 || record.get("seq_id") != Some(seq_id) {
        return Ok(());
    }

    let (original_start, original_end) = reference_span(record)?;
    let mut final_start = original_start.position;
    let mut final_size = original_end.position - original_start.position + 1;

    if shift_start.is_nested() {
        if shift_start <= original_start && shift_end >= original_end {
            final_start = shift_start.position;
            final_size = 0;
        } else if original_start >= shift_start && original_start <= shift_end {
            final_start = shift_start.position;
            final_size -= shift_end.position - original_start.position;
        } else if original_end >= shift_start && original_end <= shift_end {
            final_size = shift_start.position - original_start.position;
        } else if shift_start > original_start && shift_end < original_end {
            final_size += delta;
        } else if original_start >= shift_start {
            final_start += delta;
        }
    } else if shift_start >= original_start && shift_end <= original_end {
        final_size += delta;
    } else if original_start >= shift_start {
        final_start += delta;
    }

    record.set("position", final_start);
    if record.has("size") {
        record.set("size", final_size);
    }
    Ok(())
}

///
/// Mirror `record` through the inversion `inversion` when it lies entirely
/// inside it. Records crossing an inversion boundary are left alone.
///
pub fn invert_position_sequence(record: &mut Record, inversion: &Record) -> Result<()> {
    if record.get("seq_id") != inversion.get("seq_id") {
        return Ok(());
    }

    let start_inversion = inversion.position()?;
    let end_inversion = start_inversion + inversion.size()? - 1;
    let position = record.position()?;

    let (start, end) = reference_span(record)?;
    let ref_size = end.position - start.position + 1;

    if position + ref_size < start_inversion || position > end_inversion {
        return Ok(());
    }

    if position >= start_inversion && position + ref_size - 1 <= end_inversion {
        reverse_complement(record)?;
        if record.kind == Kind::Ins {
            // insertions sit between bases, and chained insert offsets flip order
            record.set("position", end_inversion - (position - start_inversion) - 1);
            if record.has("insert_position") {
                let insert = record.int("insert_position")?;
                record.set("insert_position", -insert);
            }
        } else {
            record.set(
                "position",
                end_inversion - (position + ref_size - 1 - start_inversion),
            );
        }
        return Ok(());
    }

    log::warn!(
        "This mutation:\n{}\nextends across an endpoint of inversion:\n{}\nIts sequence will not be reverse complemented and its coordinates will not be shifted.",
        record,
        inversion
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    fn del(position: i64, size: i64) -> Record {
        Record::new(Kind::Del, "2")
            .with("seq_id", "chr")
            .with("position", position)
            .with("size", size)
    }

    #[rstest]
    fn test_behavior_table() {
        assert!(behavior(Kind::Snp).is_some());
        assert!(behavior(Kind::Mask).is_some());
        assert!(behavior(Kind::Ra).is_none());
        assert!(behavior(Kind::Note).is_none());
    }

    #[rstest]
    #[case(50, 10, -5, 45, 10)]
    #[case(5, 10, -5, 5, 10)]
    #[case(15, 10, 7, 15, 17)]
    #[case(18, 10, 3, 21, 10)]
    fn test_shift_position_normal(
        #[case] position: i64,
        #[case] size: i64,
        #[case] delta: i64,
        #[case] expected_position: i64,
        #[case] expected_size: i64,
    ) {
        let mut record = del(position, size);
        let anchor = Coordinate::new(15);
        shift_position(&mut record, "chr", anchor, anchor, delta).unwrap();
        assert_eq!(record.position().unwrap(), expected_position);
        assert_eq!(record.size().unwrap(), expected_size);
    }

    #[rstest]
    fn test_shift_position_grows_enclosing() {
        let mut record = del(10, 20);
        let anchor = Coordinate::new(15);
        shift_position(&mut record, "chr", anchor, anchor, 4).unwrap();
        assert_eq!(record.position().unwrap(), 10);
        assert_eq!(record.size().unwrap(), 24);
    }

    #[rstest]
    fn test_shift_position_other_sequence() {
        let mut record = del(50, 10);
        let anchor = Coordinate::new(15);
        shift_position(&mut record, "plasmid", anchor, anchor, 10).unwrap();
        assert_eq!(record.position().unwrap(), 50);
    }

    #[rstest]
    fn test_shift_position_nested_translates() {
        let mut record = del(50, 10);
        shift_position(&mut record, "chr", Coordinate::nested(), Coordinate::nested(), 30).unwrap();
        assert_eq!(record.position().unwrap(), 80);
        assert_eq!(record.size().unwrap(), 10);
    }

    #[rstest]
    fn test_invert_contained() {
        let inversion = Record::new(Kind::Inv, "9")
            .with("seq_id", "chr")
            .with("position", 11)
            .with("size", 10);

        let mut snp = Record::new(Kind::Snp, "1")
            .with("seq_id", "chr")
            .with("position", 12)
            .with("new_seq", "A");
        invert_position_sequence(&mut snp, &inversion).unwrap();
        assert_eq!(snp.position().unwrap(), 19);
        assert_eq!(snp.get("new_seq"), Some("T"));

        let mut ins = Record::new(Kind::Ins, "3")
            .with("seq_id", "chr")
            .with("position", 12)
            .with("new_seq", "AAC");
        invert_position_sequence(&mut ins, &inversion).unwrap();
        assert_eq!(ins.position().unwrap(), 18);
        assert_eq!(ins.get("new_seq"), Some("GTT"));
    }

    #[rstest]
    fn test_invert_outside_and_crossing() {
        let inversion = Record::new(Kind::Inv, "9")
            .with("seq_id", "chr")
            .with("position", 11)
            .with("size", 10);

        let mut far = del(40, 2);
        invert_position_sequence(&mut far, &inversion).unwrap();
        assert_eq!(far.position().unwrap(), 40);

        let mut crossing = del(18, 6);
        invert_position_sequence(&mut crossing, &inversion).unwrap();
        assert_eq!(crossing.position().unwrap(), 18);
    }
}
