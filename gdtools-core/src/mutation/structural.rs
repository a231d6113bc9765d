use gdtools_refseq::{
    Feature, RefSeqError, ReferenceSequences, RepeatPick, parse_region, reverse_complement,
};

use super::{MutationKind, adjusted_size, audit_tag, size_adjust, span_of_size};
use crate::apply::ApplyContext;
use crate::coords::Coordinate;
use crate::errors::{GenomeDiffError, Result};
use crate::models::Record;

/// Hidden field caching the length of the repeat picked for a MOB.
pub const REPEAT_SIZE: &str = "_repeat_size";

fn strand_of(record: &Record, key: &str) -> Result<i8> {
    Ok(if record.int(key)? < 0 { -1 } else { 1 })
}

///
/// The repeat copy duplicated alongside a `mediated` amplification, if any.
///
pub fn mediated_repeat(record: &Record, refs: &ReferenceSequences) -> Result<Option<RepeatPick>> {
    let Some(name) = record.get("mediated") else {
        return Ok(None);
    };
    let strand = strand_of(record, "mediated_strand")?;
    Ok(Some(refs.repeat_family_sequence(
        name,
        strand,
        record.get("mob_region"),
    )?))
}

fn mediated_length(record: &Record, refs: &ReferenceSequences) -> Result<i64> {
    Ok(mediated_repeat(record, refs)?
        .map(|pick| pick.sequence.len() as i64)
        .unwrap_or(0))
}

fn del_lengths(record: &Record) -> Result<(i64, i64)> {
    let del_start = record.int_or("del_start", 0)?;
    let del_end = record.int_or("del_end", 0)?;
    if del_start < 0 || del_end < 0 {
        return Err(GenomeDiffError::NegativeDeletion(record.to_string()));
    }
    Ok((del_start, del_end))
}

fn text_len(record: &Record, key: &str) -> i64 {
    record.get(key).map(|s| s.len() as i64).unwrap_or(0)
}

///
/// Sequence inserted for a mobile element, without target site duplication:
/// the repeat with `del_start`/`del_end` bases trimmed, flanked by
/// `ins_start`/`ins_end`. The repeat length is cached on the record.
///
pub fn mob_replace_sequence(
    record: &mut Record,
    refs: &ReferenceSequences,
) -> Result<(String, RepeatPick)> {
    let (del_start, del_end) = del_lengths(record)?;
    let pick = refs.repeat_family_sequence(
        record.text("repeat_name")?,
        strand_of(record, "strand")?,
        record.get("mob_region"),
    )?;
    record.set(REPEAT_SIZE, pick.sequence.len());

    let len = pick.sequence.len();
    let (trim_start, trim_end) = (del_start as usize, del_end as usize);
    if trim_start + trim_end > len {
        return Err(GenomeDiffError::NegativeDeletion(record.to_string()));
    }

    let mut sequence = String::new();
    sequence.push_str(record.get("ins_start").unwrap_or_default());
    sequence.push_str(&pick.sequence[trim_start..len - trim_end]);
    sequence.push_str(record.get("ins_end").unwrap_or_default());

    Ok((sequence, pick))
}

pub struct Amp;

impl MutationKind for Amp {
    fn span(&self, record: &Record) -> Result<(Coordinate, Coordinate)> {
        span_of_size(record)
    }

    fn size_delta(&self, record: &Record, refs: &ReferenceSequences) -> Result<i64> {
        let extra = record.int("new_copy_number")? - 1;
        let mut delta = record.size()? * extra;
        delta += mediated_length(record, refs)? * extra;
        if record.has("apply_size_adjust") {
            delta += size_adjust(record)? * extra;
            if delta <= 0 {
                return Err(GenomeDiffError::NonPositiveSize(record.to_string()));
            }
        }
        Ok(delta)
    }

    // Each copy before the requested one pushes it one unit to the right.
    fn nested_shift(
        &self,
        record: &Record,
        copy: i64,
        _delta: i64,
        refs: &ReferenceSequences,
    ) -> Result<i64> {
        let unit = record.size()? + mediated_length(record, refs)?;
        Ok(unit * (copy - 1))
    }

    fn reverse_complement(&self, _record: &mut Record) -> Result<()> {
        Ok(())
    }

    fn apply(&self, record: &mut Record, ctx: &mut ApplyContext) -> Result<()> {
        let size = adjusted_size(record)?;
        let position = record.position()?;
        let copies = record.int("new_copy_number")?;
        let seq_id = record.seq_id()?.to_string();
        let audit = audit_tag(record);

        let mediated = mediated_repeat(record, ctx.original)?;
        let mediated_strand = match mediated {
            Some(_) => strand_of(record, "mediated_strand")?,
            None => 1,
        };

        // Unit features relative to the unit start, wrapping around circular sequences.
        let length = ctx.target.sequence_length(&seq_id)?;
        let last = position + size - 1;
        let (unit, template) = if last <= length {
            let unit = ctx.target.subsequence(&seq_id, position, last)?;
            let template = relative_features(
                ctx.target.region_features(&seq_id, position, last)?,
                position,
                0,
            );
            (unit, template)
        } else {
            let wrap_end = last - length;
            let mut unit = ctx.target.subsequence(&seq_id, position, length)?;
            unit.push_str(&ctx.target.subsequence(&seq_id, 1, wrap_end)?);
            let mut template = relative_features(
                ctx.target.region_features(&seq_id, position, length)?,
                position,
                0,
            );
            template.extend(relative_features(
                ctx.target.region_features(&seq_id, 1, wrap_end)?,
                1,
                length - position + 1,
            ));
            (unit, template)
        };

        // Copies go in front of the existing one, pushing earlier copies forward.
        let mut added: i64 = 0;
        for _ in 1..copies {
            if let Some(pick) = &mediated {
                ctx.target
                    .insert_after(&seq_id, position - 1, &pick.sequence, &audit)?;
                ctx.target.repeat_features(
                    &seq_id,
                    position,
                    0,
                    0,
                    ctx.original,
                    &pick.seq_id,
                    mediated_strand,
                    pick.feature.start,
                    pick.feature.end,
                )?;
                added += pick.sequence.len() as i64;
            }

            ctx.target.insert_after(&seq_id, position - 1, &unit, &audit)?;
            ctx.target
                .add_features(&seq_id, placed_features(&template, position))?;
            added += unit.len() as i64;
        }

        if added == 0 {
            return Err(GenomeDiffError::EmptyAmplification(record.to_string()));
        }
        ctx.stats.bases_inserted += added;
        Ok(())
    }
}

fn relative_features(features: Vec<Feature>, start: i64, offset: i64) -> Vec<Feature> {
    features
        .into_iter()
        .map(|mut f| {
            f.start = f.start - start + offset;
            f.end = f.end - start + offset;
            f
        })
        .collect()
}

fn placed_features(template: &[Feature], position: i64) -> Vec<Feature> {
    template
        .iter()
        .cloned()
        .map(|mut f| {
            f.start += position;
            f.end += position;
            f
        })
        .collect()
}

pub struct Inv;

impl MutationKind for Inv {
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
        let size = adjusted_size(record)?;
        let position = record.position()?;
        ctx.target.invert_range(
            record.seq_id()?,
            position,
            position + size - 1,
            &audit_tag(record),
        )?;
        Ok(())
    }
}

/// Gene conversion: a span replaced by a copy of another region.
pub struct Con;

fn conversion_source(record: &Record) -> Result<(String, i64, i64, bool)> {
    let region = record.text("region")?;
    let (seq_id, start, end) = parse_region(region)?;
    if start == end {
        return Err(RefSeqError::InvalidRegion(region.to_string()).into());
    }
    Ok((seq_id, start.min(end), start.max(end), start > end))
}

impl MutationKind for Con {
    fn span(&self, record: &Record) -> Result<(Coordinate, Coordinate)> {
        span_of_size(record)
    }

    fn size_delta(&self, record: &Record, _refs: &ReferenceSequences) -> Result<i64> {
        let (_, start, end) = parse_region(record.text("region")?)?;
        let mut replaced = record.size()?;
        if record.has("apply_size_adjust") {
            replaced += size_adjust(record)?;
            if replaced <= 0 {
                return Err(GenomeDiffError::NonPositiveSize(record.to_string()));
            }
        }
        Ok((end - start).abs() + 1 - replaced)
    }

    fn reverse_complement(&self, record: &mut Record) -> Result<()> {
        let (seq_id, start, end) = parse_region(record.text("region")?)?;
        record.set("region", format!("{}:{}-{}", seq_id, end, start));
        Ok(())
    }

    fn apply(&self, record: &mut Record, ctx: &mut ApplyContext) -> Result<()> {
        let size = adjusted_size(record)?;
        let position = record.position()?;
        let (source_id, start, end, reversed) = conversion_source(record)?;

        // read from the unmodified reference so earlier edits do not move the source
        let mut replacement = ctx.original.subsequence(&source_id, start, end)?;
        if reversed {
            replacement = reverse_complement(&replacement);
        }

        ctx.target.replace_range(
            record.seq_id()?,
            position,
            position + size - 1,
            &replacement,
            &audit_tag(record),
        )?;
        Ok(())
    }
}

/// Mobile element insertion with optional target site duplication.
pub struct Mob;

impl MutationKind for Mob {
    fn span(&self, record: &Record) -> Result<(Coordinate, Coordinate)> {
        let position = record.position()?;
        let duplication = record.int("duplication_size")?;
        if duplication == 0 {
            let c = Coordinate::with_insert(position, 1);
            return Ok((c, c));
        }
        Ok((
            Coordinate::new(position),
            Coordinate::new(position + duplication.abs() - 1),
        ))
    }

    fn size_delta(&self, record: &Record, refs: &ReferenceSequences) -> Result<i64> {
        let repeat_size = match record.has(REPEAT_SIZE) {
            true => record.int(REPEAT_SIZE)?,
            false => refs
                .repeat_family_sequence(
                    record.text("repeat_name")?,
                    strand_of(record, "strand")?,
                    record.get("mob_region"),
                )?
                .sequence
                .len() as i64,
        };
        let (del_start, del_end) = del_lengths(record)?;

        Ok(repeat_size + record.int("duplication_size")? - del_start - del_end
            + text_len(record, "ins_start")
            + text_len(record, "ins_end"))
    }

    // Only the second copy of the target site moves, by the whole insertion.
    fn nested_shift(
        &self,
        _record: &Record,
        copy: i64,
        delta: i64,
        _refs: &ReferenceSequences,
    ) -> Result<i64> {
        Ok(if copy == 2 { delta } else { 0 })
    }

    fn reverse_complement(&self, record: &mut Record) -> Result<()> {
        let strand = record.int("strand")?;
        record.set("strand", -strand);

        let del_start = record.remove("del_start");
        let del_end = record.remove("del_end");
        let ins_start = record.remove("ins_start");
        let ins_end = record.remove("ins_end");

        if let Some(v) = del_end {
            record.set("del_start", v);
        }
        if let Some(v) = del_start {
            record.set("del_end", v);
        }
        if let Some(v) = ins_end {
            record.set("ins_start", reverse_complement(&v));
        }
        if let Some(v) = ins_start {
            record.set("ins_end", reverse_complement(&v));
        }
        Ok(())
    }

    fn apply(&self, record: &mut Record, ctx: &mut ApplyContext) -> Result<()> {
        if record.get("strand") == Some("?") {
            return Err(GenomeDiffError::UnknownStrand(record.to_string()));
        }
        let (del_start, del_end) = del_lengths(record)?;
        let duplication = record.int("duplication_size")?;
        let mut position = record.position()?;
        let seq_id = record.seq_id()?.to_string();
        let audit = audit_tag(record);

        // a negative duplication deletes bases at the site
        if duplication < 0 {
            ctx.target
                .replace_range(&seq_id, position, position - duplication - 1, "", &audit)?;
        }

        let mut new_seq = match duplication > 0 {
            true => ctx
                .target
                .subsequence(&seq_id, position, position + duplication - 1)?,
            false => String::new(),
        };
        let (element, pick) = mob_replace_sequence(record, ctx.original)?;
        new_seq.push_str(&element);

        // without a duplication the element goes after the named base
        if duplication == 0 {
            position += 1;
        }

        ctx.target
            .insert_after(&seq_id, position - 1, &new_seq, &audit)?;
        ctx.target.repeat_features(
            &seq_id,
            position + text_len(record, "ins_start") + duplication.max(0),
            del_start,
            del_end,
            ctx.original,
            &pick.seq_id,
            strand_of(record, "strand")?,
            pick.feature.start,
            pick.feature.end,
        )?;

        ctx.stats.bases_inserted += new_seq.len() as i64;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Kind;

    use gdtools_refseq::Sequence;
    use pretty_assertions::assert_eq;
    use rstest::*;

    // IS1 at 11-18 on the + strand
    #[fixture]
    fn refs() -> ReferenceSequences {
        let mut seq = Sequence::new("chr", "AAAAAAAAAACCCCGGTTAAAAAAAAAAGGGGG");
        seq.features
            .push(Feature::new("repeat_region", 11, 18, 1, "IS1"));
        let mut refs = ReferenceSequences::new();
        refs.push(seq);
        refs
    }

    fn bases(refs: &ReferenceSequences) -> String {
        String::from_utf8(refs.get("chr").unwrap().bases.clone()).unwrap()
    }

    fn record(kind: Kind, position: i64) -> Record {
        Record::new(kind, "1").with("seq_id", "chr").with("position", position)
    }

    fn mob(position: i64, strand: i64, duplication: i64) -> Record {
        record(Kind::Mob, position)
            .with("repeat_name", "IS1")
            .with("strand", strand)
            .with("duplication_size", duplication)
    }

    #[rstest]
    fn test_amp(refs: ReferenceSequences) {
        let mut amp = record(Kind::Amp, 29).with("size", 2).with("new_copy_number", 3);
        let mut target = refs.clone();
        let mut ctx = ApplyContext::new(&refs, &mut target);
        Amp.apply(&mut amp, &mut ctx).unwrap();
        assert_eq!(ctx.stats.bases_inserted, 4);
        assert_eq!(Amp.size_delta(&amp, &refs).unwrap(), 4);
        assert_eq!(bases(&target), "AAAAAAAAAACCCCGGTTAAAAAAAAAAGGGGGGGGG");
    }

    #[rstest]
    fn test_amp_copy_number_one(refs: ReferenceSequences) {
        let mut amp = record(Kind::Amp, 29).with("size", 2).with("new_copy_number", 1);
        let mut target = refs.clone();
        let mut ctx = ApplyContext::new(&refs, &mut target);
        assert!(Amp.apply(&mut amp, &mut ctx).is_err());
    }

    #[rstest]
    fn test_amp_mediated(refs: ReferenceSequences) {
        let amp = record(Kind::Amp, 19)
            .with("size", 10)
            .with("new_copy_number", 2)
            .with("mediated", "IS1")
            .with("mediated_strand", 1);
        assert_eq!(Amp.size_delta(&amp, &refs).unwrap(), 18);
        assert_eq!(Amp.nested_shift(&amp, 2, 18, &refs).unwrap(), 18);
    }

    #[rstest]
    fn test_inv(refs: ReferenceSequences) {
        let mut inv = record(Kind::Inv, 1).with("size", 12);
        let mut target = refs.clone();
        let mut ctx = ApplyContext::new(&refs, &mut target);
        Inv.apply(&mut inv, &mut ctx).unwrap();
        assert_eq!(bases(&target), "GGTTTTTTTTTTCCGGTTAAAAAAAAAAGGGGG");
    }

    #[rstest]
    fn test_con(refs: ReferenceSequences) {
        let mut con = record(Kind::Con, 1).with("size", 3).with("region", "chr:18-11");
        assert_eq!(Con.size_delta(&con, &refs).unwrap(), 5);

        let mut target = refs.clone();
        let mut ctx = ApplyContext::new(&refs, &mut target);
        Con.apply(&mut con, &mut ctx).unwrap();
        assert_eq!(bases(&target), "AACCGGGGAAAAAAACCCCGGTTAAAAAAAAAAGGGGG");

        Con.reverse_complement(&mut con).unwrap();
        assert_eq!(con.get("region"), Some("chr:11-18"));
    }

    #[rstest]
    fn test_mob_with_duplication(refs: ReferenceSequences) {
        let mut m = mob(2, 1, 3);
        let mut target = refs.clone();
        let mut ctx = ApplyContext::new(&refs, &mut target);
        Mob.apply(&mut m, &mut ctx).unwrap();

        assert_eq!(ctx.stats.bases_inserted, 11);
        assert_eq!(m.get(REPEAT_SIZE), Some("8"));
        assert_eq!(Mob.size_delta(&m, &refs).unwrap(), 11);
        assert_eq!(
            bases(&target),
            "AAAACCCCGGTTAAAAAAAAACCCCGGTTAAAAAAAAAAGGGGG"
        );

        let copies: Vec<i64> = target
            .get("chr")
            .unwrap()
            .repeats()
            .map(|f| f.start)
            .collect();
        assert_eq!(copies, vec![5, 22]);
    }

    #[rstest]
    fn test_mob_trimmed_reverse(refs: ReferenceSequences) {
        let mut m = mob(1, -1, 0)
            .with("del_start", 2)
            .with("ins_end", "TT");
        let (element, _) = mob_replace_sequence(&mut m, &refs).unwrap();
        assert_eq!(element, "CCGGGGTT");
        assert_eq!(Mob.size_delta(&m, &refs).unwrap(), 8);
    }

    #[rstest]
    fn test_mob_unknown_strand(refs: ReferenceSequences) {
        let mut m = mob(2, 1, 3).with("strand", "?");
        let mut target = refs.clone();
        let mut ctx = ApplyContext::new(&refs, &mut target);
        assert!(Mob.apply(&mut m, &mut ctx).is_err());
    }

    #[rstest]
    fn test_mob_reverse_complement() {
        let mut m = mob(1, 1, 4)
            .with("del_start", 2)
            .with("ins_start", "AAC");
        Mob.reverse_complement(&mut m).unwrap();
        assert_eq!(m.get("strand"), Some("-1"));
        assert_eq!(m.get("del_end"), Some("2"));
        assert_eq!(m.get("del_start"), None);
        assert_eq!(m.get("ins_end"), Some("GTT"));
    }

    #[rstest]
    fn test_mob_nested_shift(refs: ReferenceSequences) {
        let m = mob(2, 1, 3);
        assert_eq!(Mob.nested_shift(&m, 2, 11, &refs).unwrap(), 11);
        assert_eq!(Mob.nested_shift(&m, 1, 11, &refs).unwrap(), 0);
        assert_eq!(Mob.nested_shift(&m, -1, 11, &refs).unwrap(), 0);
    }
}
