use gdtools_refseq::{ReferenceSequences, reverse_complement};

use super::{MutationKind, adjusted_size, audit_tag, size_adjust, span_of_size};
use crate::apply::ApplyContext;
use crate::coords::Coordinate;
use crate::errors::{GenomeDiffError, Result};
use crate::models::Record;

fn flip_new_seq(record: &mut Record) -> Result<()> {
    let flipped = reverse_complement(record.new_seq()?);
    record.set("new_seq", flipped);
    Ok(())
}

// Bases removed by a SUB or DEL, as a negative number.
fn removed_bases(record: &Record) -> Result<i64> {
    let removed = -record.size()? - size_adjust(record)?;
    if removed >= 0 {
        return Err(GenomeDiffError::NonPositiveSize(record.to_string()));
    }
    Ok(removed)
}

pub struct Snp;

impl MutationKind for Snp {
    fn span(&self, record: &Record) -> Result<(Coordinate, Coordinate)> {
        let c = Coordinate::new(record.position()?);
        Ok((c, c))
    }

    fn size_delta(&self, _record: &Record, _refs: &ReferenceSequences) -> Result<i64> {
        Ok(0)
    }

    fn reverse_complement(&self, record: &mut Record) -> Result<()> {
        flip_new_seq(record)
    }

    fn apply(&self, record: &mut Record, ctx: &mut ApplyContext) -> Result<()> {
        let position = record.position()?;
        ctx.target.replace_range(
            record.seq_id()?,
            position,
            position,
            record.new_seq()?,
            &audit_tag(record),
        )?;
        ctx.stats.bases_changed += 1;
        Ok(())
    }
}

pub struct Sub;

impl MutationKind for Sub {
    fn span(&self, record: &Record) -> Result<(Coordinate, Coordinate)> {
        span_of_size(record)
    }

    fn size_delta(&self, record: &Record, _refs: &ReferenceSequences) -> Result<i64> {
        Ok(removed_bases(record)? + record.new_seq()?.len() as i64)
    }

    fn reverse_complement(&self, record: &mut Record) -> Result<()> {
        flip_new_seq(record)
    }

    fn apply(&self, record: &mut Record, ctx: &mut ApplyContext) -> Result<()> {
        let size = adjusted_size(record)?;
        let position = record.position()?;
        let new_seq = record.new_seq()?;
        ctx.target.replace_range(
            record.seq_id()?,
            position,
            position + size - 1,
            new_seq,
            &audit_tag(record),
        )?;

        let new_len = new_seq.len() as i64;
        ctx.stats.bases_changed += size.min(new_len);
        ctx.stats.bases_deleted += (size - new_len).max(0);
        ctx.stats.bases_inserted += (new_len - size).max(0);
        Ok(())
    }
}

pub struct Ins;

impl MutationKind for Ins {
    fn span(&self, record: &Record) -> Result<(Coordinate, Coordinate)> {
        let c = Coordinate::with_insert(record.position()?, record.int_or("insert_position", 1)?);
        Ok((c, c))
    }

    fn size_delta(&self, record: &Record, _refs: &ReferenceSequences) -> Result<i64> {
        Ok(record.new_seq()?.len() as i64)
    }

    // The copy index of a record nested in an insertion is a base offset into it.
    fn nested_shift(
        &self,
        _record: &Record,
        copy: i64,
        _delta: i64,
        _refs: &ReferenceSequences,
    ) -> Result<i64> {
        Ok(copy)
    }

    fn reverse_complement(&self, record: &mut Record) -> Result<()> {
        flip_new_seq(record)
    }

    fn apply(&self, record: &mut Record, ctx: &mut ApplyContext) -> Result<()> {
        let new_seq = record.new_seq()?;
        ctx.target.insert_after(
            record.seq_id()?,
            record.position()?,
            new_seq,
            &audit_tag(record),
        )?;
        ctx.stats.bases_inserted += new_seq.len() as i64;
        Ok(())
    }
}

pub struct Del;

impl MutationKind for Del {
    fn span(&self, record: &Record) -> Result<(Coordinate, Coordinate)> {
        span_of_size(record)
    }

    fn size_delta(&self, record: &Record, _refs: &ReferenceSequences) -> Result<i64> {
        removed_bases(record)
    }

    fn reverse_complement(&self, _record: &mut Record) -> Result<()> {
        Ok(())
    }

    fn apply(&self, record: &mut Record, ctx: &mut ApplyContext) -> Result<()> {
        let size = adjusted_size(record)?;
        let position = record.position()?;
        ctx.target.replace_range(
            record.seq_id()?,
            position,
            position + size - 1,
            "",
            &audit_tag(record),
        )?;
        ctx.stats.bases_deleted += size;
        Ok(())
    }
}

/// Replaces a region with `N` without changing its length.
pub struct Mask;

impl MutationKind for Mask {
    fn span(&self, record: &Record) -> Result<(Coordinate, Coordinate)> {
        span_of_size(record)
    }

    fn size_delta(&self, _record: &Record, _refs: &ReferenceSequences) -> Result<i64> {
        Ok(0)
    }

    fn reverse_complement(&self, _record: &mut Record) -> Result<()> {
        Ok(())
    }

    fn apply(&self, record: &mut Record, ctx: &mut ApplyContext) -> Result<()> {
        let size = record.size()?;
        let position = record.position()?;
        let mask = "N".repeat(size.max(0) as usize);
        ctx.target.replace_range(
            record.seq_id()?,
            position,
            position + size - 1,
            &mask,
            &audit_tag(record),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::ApplyStats;
    use crate::models::Kind;

    use gdtools_refseq::Sequence;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn refs() -> ReferenceSequences {
        let mut refs = ReferenceSequences::new();
        refs.push(Sequence::new("chr", "AAAAAAAAAAGGGGGCCCCCTTTTT"));
        refs
    }

    fn apply_one(record: &mut Record, refs: &ReferenceSequences) -> (String, ApplyStats) {
        let mut target = refs.clone();
        let mut ctx = ApplyContext::new(refs, &mut target);
        crate::mutation::behavior(record.kind)
            .unwrap()
            .apply(record, &mut ctx)
            .unwrap();
        let stats = ctx.stats.clone();
        let seq = target.get("chr").unwrap();
        (String::from_utf8(seq.bases.clone()).unwrap(), stats)
    }

    fn record(kind: Kind, position: i64) -> Record {
        Record::new(kind, "1").with("seq_id", "chr").with("position", position)
    }

    #[rstest]
    fn test_snp(refs: ReferenceSequences) {
        let mut snp = record(Kind::Snp, 1).with("new_seq", "T");
        let (seq, stats) = apply_one(&mut snp, &refs);
        assert_eq!(seq, "TAAAAAAAAAGGGGGCCCCCTTTTT");
        assert_eq!(stats.bases_changed, 1);
    }

    #[rstest]
    fn test_del(refs: ReferenceSequences) {
        let mut del = record(Kind::Del, 10).with("size", 5);
        let (seq, stats) = apply_one(&mut del, &refs);
        assert_eq!(seq, "AAAAAAAAAGCCCCCTTTTT");
        assert_eq!(stats.bases_deleted, 5);
        assert_eq!(Del.size_delta(&del, &refs).unwrap(), -5);
    }

    #[rstest]
    fn test_del_size_adjust(refs: ReferenceSequences) {
        let del = record(Kind::Del, 10).with("size", 5).with("apply_size_adjust", -5);
        assert!(Del.size_delta(&del, &refs).is_err());
        assert!(adjusted_size(&del).is_err());
    }

    #[rstest]
    fn test_ins(refs: ReferenceSequences) {
        let mut ins = record(Kind::Ins, 10).with("new_seq", "TTT");
        let (seq, stats) = apply_one(&mut ins, &refs);
        assert_eq!(seq, "AAAAAAAAAATTTGGGGGCCCCCTTTTT");
        assert_eq!(stats.bases_inserted, 3);
        assert_eq!(Ins.size_delta(&ins, &refs).unwrap(), 3);
    }

    #[rstest]
    fn test_sub(refs: ReferenceSequences) {
        let mut sub = record(Kind::Sub, 11).with("size", 5).with("new_seq", "TT");
        let (seq, stats) = apply_one(&mut sub, &refs);
        assert_eq!(seq, "AAAAAAAAAATTCCCCCTTTTT");
        assert_eq!(stats.bases_changed, 2);
        assert_eq!(stats.bases_deleted, 3);
        assert_eq!(Sub.size_delta(&sub, &refs).unwrap(), -3);
    }

    #[rstest]
    fn test_mask(refs: ReferenceSequences) {
        let mut mask = record(Kind::Mask, 21).with("size", 5);
        let (seq, _) = apply_one(&mut mask, &refs);
        assert_eq!(seq, "AAAAAAAAAAGGGGGCCCCCNNNNN");
    }

    #[rstest]
    fn test_reverse_complement_new_seq() {
        let mut ins = record(Kind::Ins, 10).with("new_seq", "AAC");
        Ins.reverse_complement(&mut ins).unwrap();
        assert_eq!(ins.get("new_seq"), Some("GTT"));
    }
}
