use crate::errors::{RefSeqError, Result};
use crate::models::Feature;
use crate::utils::complement;

///
/// One named, mutable reference sequence and its feature annotations.
///
/// All positions are 1-based and inclusive.
///
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sequence {
    pub seq_id: String,
    pub description: String,
    pub bases: Vec<u8>,
    pub features: Vec<Feature>,
}

impl Sequence {
    pub fn new(seq_id: &str, bases: &str) -> Self {
        Sequence {
            seq_id: seq_id.to_string(),
            description: String::new(),
            bases: bases.as_bytes().to_vec(),
            features: Vec::new(),
        }
    }

    pub fn length(&self) -> i64 {
        self.bases.len() as i64
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    fn out_of_range(&self, start: i64, end: i64) -> RefSeqError {
        RefSeqError::OutOfRange {
            seq_id: self.seq_id.clone(),
            start,
            end,
            length: self.length(),
        }
    }

    // An empty range is written as end == start - 1.
    fn check_range(&self, start: i64, end: i64) -> Result<()> {
        if start < 1 || end > self.length() || end < start - 1 {
            return Err(self.out_of_range(start, end));
        }
        Ok(())
    }

    ///
    /// Get the bases from `start` to `end`
    ///
    pub fn subsequence(&self, start: i64, end: i64) -> Result<String> {
        self.check_range(start, end)?;
        let slice = &self.bases[(start - 1) as usize..end as usize];
        Ok(String::from_utf8_lossy(slice).into_owned())
    }

    ///
    /// Get `size` bases beginning at `start`, wrapping around the ends as if the
    /// sequence were circular. `start` may be zero or negative.
    ///
    pub fn circular_subsequence(&self, start: i64, size: i64) -> String {
        if self.bases.is_empty() || size <= 0 {
            return String::new();
        }
        let len = self.length();
        (0..size)
            .map(|i| self.bases[(start - 1 + i).rem_euclid(len) as usize] as char)
            .collect()
    }

    ///
    /// Replace bases `start..=end` with `replacement`, updating feature coordinates.
    /// An empty replacement deletes the range.
    ///
    pub fn replace(&mut self, start: i64, end: i64, replacement: &str, audit: &str) -> Result<()> {
        self.check_range(start, end)?;
        log::debug!(
            "{}: replace {}:{}-{} with {} bases",
            audit,
            self.seq_id,
            start,
            end,
            replacement.len()
        );

        self.bases.splice(
            (start - 1) as usize..end as usize,
            replacement.bytes(),
        );

        let new_len = replacement.len() as i64;
        let delta = new_len - (end - start + 1);
        let replaced_end = start + new_len - 1;

        self.features.retain_mut(|f| {
            if f.end < start {
                // untouched
            } else if f.start > end {
                f.start += delta;
                f.end += delta;
            } else if f.start >= start && f.end <= end {
                if f.start > replaced_end {
                    return false;
                }
                f.end = f.end.min(replaced_end);
            } else if f.start < start && f.end > end {
                f.end += delta;
            } else if f.start < start {
                f.end = f.end.min(replaced_end).max(start - 1);
            } else {
                f.start = f.start.min(replaced_end + 1);
                f.end += delta;
            }
            f.end >= f.start
        });

        Ok(())
    }

    ///
    /// Insert `insertion` after `position` (0 inserts before the first base).
    ///
    pub fn insert_after(&mut self, position: i64, insertion: &str, audit: &str) -> Result<()> {
        if position < 0 || position > self.length() {
            return Err(self.out_of_range(position, position));
        }
        log::debug!(
            "{}: insert {} bases after {}:{}",
            audit,
            insertion.len(),
            self.seq_id,
            position
        );

        let at = position as usize;
        self.bases.splice(at..at, insertion.bytes());

        let len = insertion.len() as i64;
        for f in self.features.iter_mut() {
            if f.start > position {
                f.start += len;
                f.end += len;
            } else if f.end > position {
                f.end += len;
            }
        }

        Ok(())
    }

    ///
    /// Reverse complement bases `start..=end`. Features entirely inside the range are
    /// mirrored and flipped to the other strand.
    ///
    pub fn invert(&mut self, start: i64, end: i64, audit: &str) -> Result<()> {
        self.check_range(start, end)?;
        log::debug!("{}: invert {}:{}-{}", audit, self.seq_id, start, end);

        let range = &mut self.bases[(start - 1) as usize..end as usize];
        range.reverse();
        for b in range.iter_mut() {
            *b = complement(*b);
        }

        for f in self.features.iter_mut() {
            if f.start >= start && f.end <= end {
                let (s, e) = (start + end - f.end, start + end - f.start);
                f.start = s;
                f.end = e;
                f.strand = -f.strand;
            }
        }
        self.sort_features();

        Ok(())
    }

    pub fn repeats(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter().filter(|f| f.is_repeat())
    }

    pub fn sort_features(&mut self) {
        self.features
            .sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
    }
}
