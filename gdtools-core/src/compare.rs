//! Ordering and equality of records.
use std::cmp::Ordering;

use crate::errors::{GenomeDiffError, Result};
use crate::models::Record;
use crate::schema::{UNIQUENESS_FIELDS, extended_fields, field_kind, output_priority, sort_key};

fn compare_values(field: &str, a: &str, b: &str) -> Ordering {
    match field_kind(field) {
        Some(kind) if kind.is_numeric() => match (a.parse::<i64>(), b.parse::<i64>()) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            _ => a.cmp(b),
        },
        _ => a.cmp(b),
    }
}

// Secondary sort fields are positions for most kinds and names for a few.
fn compare_numeric_or_text(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

///
/// Total order over records used for sorting, deduplication and set algebra.
///
/// Records comparing `Equal` are the same mutation or evidence item. Neither the
/// `id` nor the evidence list takes part in the comparison.
///
pub fn compare(a: &Record, b: &Record) -> Ordering {
    let a_key = sort_key(a.kind);
    let b_key = sort_key(b.kind);

    let ordering = a_key
        .bucket
        .cmp(&b_key.bucket)
        .then_with(|| {
            let x = a.get(a_key.primary).unwrap_or_default();
            let y = b.get(b_key.primary).unwrap_or_default();
            x.cmp(y)
        })
        .then_with(|| {
            let x = a.get(a_key.secondary).unwrap_or_default();
            let y = b.get(b_key.secondary).unwrap_or_default();
            compare_numeric_or_text(x, y)
        })
        .then_with(|| output_priority(a.kind).cmp(&output_priority(b.kind)));

    if ordering != Ordering::Equal {
        return ordering;
    }

    let fields = extended_fields(a.kind)
        .iter()
        .chain(UNIQUENESS_FIELDS.iter());

    for field in fields {
        let ordering = match (a.get(field), b.get(field)) {
            (None, None) => Ordering::Equal,
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (Some(x), Some(y)) => compare_values(field, x, y),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}

pub fn equivalent(a: &Record, b: &Record) -> bool {
    compare(a, b) == Ordering::Equal
}

///
/// Stable output order: [`compare`], then numeric id, then textual id, then the
/// joined evidence list. Two records that still tie are a duplicate identity.
///
pub fn display_order(a: &Record, b: &Record) -> Result<Ordering> {
    let ordering = compare(a, b);
    if ordering != Ordering::Equal {
        return Ok(ordering);
    }

    let a_num = a.id.parse::<u32>().unwrap_or(0);
    let b_num = b.id.parse::<u32>().unwrap_or(0);
    let ordering = a_num
        .cmp(&b_num)
        .then_with(|| a.id.cmp(&b.id))
        .then_with(|| a.evidence.join(",").cmp(&b.evidence.join(",")));

    match ordering {
        Ordering::Equal => Err(GenomeDiffError::DuplicateIdentity(
            a.to_string(),
            b.to_string(),
        )),
        _ => Ok(ordering),
    }
}

///
/// Sort records in display order, failing on a duplicate identity.
///
pub fn sort_records(records: &mut [Record]) -> Result<()> {
    let mut error: Option<GenomeDiffError> = None;
    records.sort_by(|a, b| match display_order(a, b) {
        Ok(ordering) => ordering,
        Err(e) => {
            if error.is_none() {
                error = Some(e);
            }
            Ordering::Equal
        }
    });

    match error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Kind;

    use pretty_assertions::assert_eq;
    use rstest::*;

    fn snp(id: &str, position: i64, new_seq: &str) -> Record {
        Record::new(Kind::Snp, id)
            .with("seq_id", "chr")
            .with("position", position)
            .with("new_seq", new_seq)
    }

    fn del(id: &str, position: i64, size: i64) -> Record {
        Record::new(Kind::Del, id)
            .with("seq_id", "chr")
            .with("position", position)
            .with("size", size)
    }

    #[rstest]
    fn test_positions_compare_numerically() {
        assert_eq!(compare(&snp("1", 9, "A"), &snp("2", 100, "A")), Ordering::Less);
    }

    #[rstest]
    fn test_id_and_evidence_are_ignored() {
        let a = snp("1", 100, "A").with_evidence(&["3"]);
        let b = snp("7", 100, "A");
        assert!(equivalent(&a, &b));
    }

    #[rstest]
    fn test_kind_priority_at_same_position() {
        assert_eq!(compare(&del("1", 100, 3), &snp("2", 100, "A")), Ordering::Less);
    }

    #[rstest]
    fn test_uniqueness_fields() {
        let a = snp("1", 100, "A");
        let b = snp("2", 100, "A").with("unique", "1");
        assert_eq!(compare(&a, &b), Ordering::Less);

        let c = snp("3", 100, "A").with("phylogeny_id", "x");
        let d = snp("4", 100, "A").with("phylogeny_id", "y");
        assert_eq!(compare(&c, &d), Ordering::Less);
    }

    #[rstest]
    fn test_optional_fields_outside_schema_are_ignored() {
        let a = snp("1", 100, "A").with("frequency", "0.5");
        let b = snp("2", 100, "A");
        assert!(equivalent(&a, &b));
    }

    #[rstest]
    fn test_mutations_before_evidence() {
        let ra = Record::new(Kind::Ra, "9")
            .with("seq_id", "chr")
            .with("position", 1)
            .with("insert_position", 0)
            .with("ref_base", "A")
            .with("new_base", "G");
        assert_eq!(compare(&snp("1", 500, "A"), &ra), Ordering::Less);
    }

    #[rstest]
    fn test_display_order_breaks_ties_by_id() {
        let mut records = vec![snp("10", 100, "A"), snp("2", 100, "A")];
        sort_records(&mut records).unwrap();
        assert_eq!(records[0].id, "2");
    }

    #[rstest]
    fn test_display_order_duplicate_identity() {
        let mut records = vec![snp("1", 100, "A"), snp("1", 100, "A")];
        assert!(sort_records(&mut records).is_err());
    }

    #[rstest]
    fn test_transitivity_over_mixed_records() {
        let records = vec![
            snp("1", 5, "A"),
            del("2", 5, 10),
            snp("3", 5, "C"),
            del("4", 6, 1),
            snp("5", 7, "T").with("unique", "1"),
        ];
        for a in records.iter() {
            for b in records.iter() {
                assert_eq!(compare(a, b), compare(b, a).reverse());
                for c in records.iter() {
                    if compare(a, b) == Ordering::Less && compare(b, c) == Ordering::Less {
                        assert_eq!(compare(a, c), Ordering::Less);
                    }
                }
            }
        }
    }
}
