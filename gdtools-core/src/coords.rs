use std::fmt;

use crate::errors::{GenomeDiffError, Result};
use crate::models::{Kind, Record};
use crate::mutation::behavior;

///
/// A reference position, optionally between bases.
///
/// `insert` 0 means the base at `position` itself; positive values count
/// inserted bases after it. Coordinates order by position, then insert offset.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coordinate {
    pub position: i64,
    pub insert: i64,
}

impl Coordinate {
    pub fn new(position: i64) -> Self {
        Coordinate {
            position,
            insert: 0,
        }
    }

    pub fn with_insert(position: i64, insert: i64) -> Self {
        Coordinate { position, insert }
    }

    /// Marks a shift caused by the record a target is nested within.
    pub fn nested() -> Self {
        Coordinate {
            position: -1,
            insert: 0,
        }
    }

    pub fn is_nested(&self) -> bool {
        self.position < 0
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.insert {
            0 => write!(f, "{}", self.position),
            n => write!(f, "{}.{}", self.position, n),
        }
    }
}

///
/// First and last reference coordinates touched by a record.
///
pub fn reference_span(record: &Record) -> Result<(Coordinate, Coordinate)> {
    if let Some(b) = behavior(record.kind) {
        return b.span(record);
    }

    match record.kind {
        Kind::Ra => {
            let c = Coordinate::with_insert(record.position()?, record.int("insert_position")?);
            Ok((c, c))
        }
        Kind::Mc | Kind::Un => Ok((
            Coordinate::new(record.int("start")?),
            Coordinate::new(record.int("end")?),
        )),
        kind => Err(GenomeDiffError::UnhandledKind {
            kind: kind.to_string(),
            operation: "reference span".to_string(),
        }),
    }
}

///
/// Whether `record` lies inside the span of `outer` on the same sequence.
///
pub fn located_within(record: &Record, outer: &Record) -> Result<bool> {
    if record.get("seq_id") != outer.get("seq_id") {
        return Ok(false);
    }
    let (start, end) = reference_span(record)?;
    let (outer_start, outer_end) = reference_span(outer)?;
    Ok(start >= outer_start && end <= outer_end)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    fn at(kind: Kind, position: i64) -> Record {
        Record::new(kind, "1").with("seq_id", "chr").with("position", position)
    }

    #[rstest]
    fn test_coordinate_order() {
        assert!(Coordinate::new(10) < Coordinate::with_insert(10, 1));
        assert!(Coordinate::with_insert(10, 3) < Coordinate::new(11));
        assert!(Coordinate::nested() < Coordinate::new(1));
    }

    #[rstest]
    fn test_spans() {
        let snp = at(Kind::Snp, 5).with("new_seq", "A");
        assert_eq!(reference_span(&snp).unwrap(), (Coordinate::new(5), Coordinate::new(5)));

        let del = at(Kind::Del, 5).with("size", 10);
        assert_eq!(reference_span(&del).unwrap(), (Coordinate::new(5), Coordinate::new(14)));

        let ins = at(Kind::Ins, 5).with("new_seq", "AC");
        assert_eq!(
            reference_span(&ins).unwrap(),
            (Coordinate::with_insert(5, 1), Coordinate::with_insert(5, 1))
        );

        let mob = at(Kind::Mob, 5)
            .with("repeat_name", "IS1")
            .with("strand", 1)
            .with("duplication_size", 0);
        assert_eq!(
            reference_span(&mob).unwrap(),
            (Coordinate::with_insert(5, 1), Coordinate::with_insert(5, 1))
        );

        let mob = mob.with("duplication_size", -4);
        assert_eq!(reference_span(&mob).unwrap(), (Coordinate::new(5), Coordinate::new(8)));

        let mc = Record::new(Kind::Mc, "2").with("start", 3).with("end", 9);
        assert_eq!(reference_span(&mc).unwrap(), (Coordinate::new(3), Coordinate::new(9)));

        let note = Record::new(Kind::Note, "3").with("note", "hello");
        assert!(reference_span(&note).is_err());
    }

    #[rstest]
    fn test_located_within() {
        let amp = at(Kind::Amp, 100).with("size", 50).with("new_copy_number", 2);
        let snp = at(Kind::Snp, 120).with("new_seq", "G");
        let far = at(Kind::Snp, 300).with("new_seq", "G");
        assert!(located_within(&snp, &amp).unwrap());
        assert!(!located_within(&far, &amp).unwrap());
        assert!(!located_within(&snp.clone().with("seq_id", "other"), &amp).unwrap());
    }
}
