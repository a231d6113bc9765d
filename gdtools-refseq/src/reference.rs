use std::path::Path;

use fxhash::FxHashMap as HashMap;

use crate::errors::{RefSeqError, Result};
use crate::fasta::{read_fasta, write_fasta};
use crate::gff::{read_gff3, write_gff3};
use crate::models::{Feature, Sequence};
use crate::utils::{file_extension, parse_region, reverse_complement};

///
/// A repeat family member chosen as the source sequence for a mobile element
/// insertion or a repeat-mediated amplification.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatPick {
    /// Repeat sequence oriented on the requested strand
    pub sequence: String,
    pub seq_id: String,
    pub feature: Feature,
}

///
/// The set of reference sequences a Genome Diff refers to.
///
#[derive(Debug, Clone, Default)]
pub struct ReferenceSequences {
    sequences: Vec<Sequence>,
    index: HashMap<String, usize>,
}

impl ReferenceSequences {
    pub fn new() -> Self {
        Self::default()
    }

    ///
    /// Load every reference file in `paths`. The format is chosen by extension:
    /// FASTA (`.fa`, `.fasta`, `.fna`, `.fas`) or GFF3 (`.gff`, `.gff3`), optionally gzipped.
    ///
    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut refs = ReferenceSequences::new();
        for path in paths {
            refs.load_file(path.as_ref())?;
        }
        Ok(refs)
    }

    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let loaded = match file_extension(path).as_deref() {
            Some("fa") | Some("fasta") | Some("fna") | Some("fas") => read_fasta(path)?,
            Some("gff") | Some("gff3") => read_gff3(path)?,
            _ => {
                return Err(RefSeqError::UnsupportedFormat(
                    path.display().to_string(),
                ));
            }
        };
        log::info!(
            "Loaded {} reference sequence(s) from {}",
            loaded.len(),
            path.display()
        );

        for seq in loaded {
            self.merge_sequence(seq);
        }
        Ok(())
    }

    // A GFF3 without sequence followed by a FASTA with the same seq_id fills in the bases.
    fn merge_sequence(&mut self, seq: Sequence) {
        match self.index.get(&seq.seq_id) {
            Some(&i) => {
                let existing = &mut self.sequences[i];
                if existing.bases.is_empty() {
                    existing.bases = seq.bases;
                }
                if existing.description.is_empty() {
                    existing.description = seq.description;
                }
                existing.features.extend(seq.features);
                existing.sort_features();
            }
            None => self.push(seq),
        }
    }

    pub fn push(&mut self, seq: Sequence) {
        self.index.insert(seq.seq_id.clone(), self.sequences.len());
        self.sequences.push(seq);
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .sequences
            .iter()
            .enumerate()
            .map(|(i, s)| (s.seq_id.clone(), i))
            .collect();
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sequence> {
        self.sequences.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Sequence> {
        self.sequences.iter_mut()
    }

    pub fn sequences(&self) -> &[Sequence] {
        &self.sequences
    }

    pub fn contains(&self, seq_id: &str) -> bool {
        self.index.contains_key(seq_id)
    }

    pub fn get(&self, seq_id: &str) -> Result<&Sequence> {
        self.index
            .get(seq_id)
            .map(|&i| &self.sequences[i])
            .ok_or_else(|| RefSeqError::UnknownSequence(seq_id.to_string()))
    }

    pub fn get_mut(&mut self, seq_id: &str) -> Result<&mut Sequence> {
        match self.index.get(seq_id) {
            Some(&i) => Ok(&mut self.sequences[i]),
            None => Err(RefSeqError::UnknownSequence(seq_id.to_string())),
        }
    }

    pub fn sequence_length(&self, seq_id: &str) -> Result<i64> {
        Ok(self.get(seq_id)?.length())
    }

    pub fn total_length(&self) -> i64 {
        self.sequences.iter().map(|s| s.length()).sum()
    }

    pub fn subsequence(&self, seq_id: &str, start: i64, end: i64) -> Result<String> {
        self.get(seq_id)?.subsequence(start, end)
    }

    pub fn circular_subsequence(&self, seq_id: &str, start: i64, size: i64) -> Result<String> {
        Ok(self.get(seq_id)?.circular_subsequence(start, size))
    }

    pub fn replace_range(
        &mut self,
        seq_id: &str,
        start: i64,
        end: i64,
        replacement: &str,
        audit: &str,
    ) -> Result<()> {
        self.get_mut(seq_id)?.replace(start, end, replacement, audit)
    }

    pub fn insert_after(&mut self, seq_id: &str, position: i64, insertion: &str, audit: &str) -> Result<()> {
        self.get_mut(seq_id)?.insert_after(position, insertion, audit)
    }

    pub fn invert_range(&mut self, seq_id: &str, start: i64, end: i64, audit: &str) -> Result<()> {
        self.get_mut(seq_id)?.invert(start, end, audit)
    }

    ///
    /// Sequence of a member of the named repeat family, oriented on `strand`.
    ///
    /// When `region` (`seq_id:start-end`) is given, the member at exactly that location
    /// is used. Otherwise the first member in reference order is picked.
    ///
    pub fn repeat_family_sequence(
        &self,
        name: &str,
        strand: i8,
        region: Option<&str>,
    ) -> Result<RepeatPick> {
        let wanted = match region {
            Some(r) => {
                let (seq_id, a, b) = parse_region(r)?;
                Some((seq_id, a.min(b), a.max(b)))
            }
            None => None,
        };

        for seq in self.sequences.iter() {
            for feature in seq.repeats().filter(|f| f.name == name) {
                if let Some((seq_id, start, end)) = &wanted {
                    if *seq_id != seq.seq_id || feature.start != *start || feature.end != *end {
                        continue;
                    }
                }

                let mut sequence = seq.subsequence(feature.start, feature.end)?;
                if feature.strand != strand {
                    sequence = reverse_complement(&sequence);
                }
                return Ok(RepeatPick {
                    sequence,
                    seq_id: seq.seq_id.clone(),
                    feature: feature.clone(),
                });
            }
        }

        Err(repeat_not_found(name, region))
    }

    ///
    /// Find the repeat whose boundary is closest to `position`, no more than `slop`
    /// bases away. Direction -1 looks for repeats ending at or before `position`,
    /// direction +1 for repeats starting at or after it.
    ///
    pub fn find_closest_repeat_boundary(
        &self,
        seq_id: &str,
        position: i64,
        slop: i64,
        direction: i8,
    ) -> Option<&Feature> {
        let seq = self.get(seq_id).ok()?;
        seq.repeats()
            .filter_map(|f| {
                let distance = if direction < 0 {
                    position - f.end
                } else {
                    f.start - position
                };
                (0..=slop).contains(&distance).then_some((distance, f))
            })
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, f)| f)
    }

    ///
    /// Copy the features found in `source_start..=source_end` of `source_seq_id` in
    /// `source` so that they begin at `position` on `seq_id`. `del_start`/`del_end`
    /// bases are trimmed off the copied region and `strand` -1 mirrors it.
    ///
    #[allow(clippy::too_many_arguments)]
    pub fn repeat_features(
        &mut self,
        seq_id: &str,
        position: i64,
        del_start: i64,
        del_end: i64,
        source: &ReferenceSequences,
        source_seq_id: &str,
        strand: i8,
        source_start: i64,
        source_end: i64,
    ) -> Result<()> {
        let copied_len = source_end - source_start + 1 - del_start - del_end;
        if copied_len <= 0 {
            return Ok(());
        }
        let last = position + copied_len - 1;

        let copies: Vec<Feature> = source
            .get(source_seq_id)?
            .features
            .iter()
            .filter(|f| f.start >= source_start && f.end <= source_end)
            .filter_map(|f| {
                let mut copy = f.clone();
                if strand >= 0 {
                    copy.start = position + (f.start - source_start) - del_start;
                    copy.end = position + (f.end - source_start) - del_start;
                } else {
                    copy.start = position + (source_end - f.end) - del_end;
                    copy.end = position + (source_end - f.start) - del_end;
                    copy.strand = -f.strand;
                }
                copy.start = copy.start.max(position);
                copy.end = copy.end.min(last);
                (copy.end >= copy.start).then_some(copy)
            })
            .collect();

        let seq = self.get_mut(seq_id)?;
        seq.features.extend(copies);
        seq.sort_features();
        Ok(())
    }

    ///
    /// Clones of the features lying entirely inside `start..=end` of `seq_id`.
    ///
    pub fn region_features(&self, seq_id: &str, start: i64, end: i64) -> Result<Vec<Feature>> {
        Ok(self
            .get(seq_id)?
            .features
            .iter()
            .filter(|f| f.start >= start && f.end <= end)
            .cloned()
            .collect())
    }

    pub fn add_features<I>(&mut self, seq_id: &str, features: I) -> Result<()>
    where
        I: IntoIterator<Item = Feature>,
    {
        let seq = self.get_mut(seq_id)?;
        seq.features.extend(features);
        seq.sort_features();
        Ok(())
    }

    ///
    /// Drop sequences left with no bases.
    ///
    pub fn remove_empty_sequences(&mut self) {
        self.sequences.retain(|s| !s.is_empty());
        self.rebuild_index();
    }

    pub fn write_fasta<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_fasta(path, &self.sequences)
    }

    pub fn write_gff3<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_gff3(path, &self.sequences)
    }
}

fn repeat_not_found(name: &str, region: Option<&str>) -> RefSeqError {
    match region {
        Some(r) => RefSeqError::RepeatFamilyNotFound(format!("{} at {}", name, r)),
        None => RefSeqError::RepeatFamilyNotFound(name.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn refs() -> ReferenceSequences {
        // IS1 at 11-18 (+) and 31-38 (-)
        let mut seq = Sequence::new("chr", "AAAAAAAAAACCCCGGTTAAAAAAAAAAAAAACCGGGGAAAAAAAAAA");
        let mut is1a = Feature::new("repeat_region", 11, 18, 1, "IS1");
        is1a.accession = Some("ISa".to_string());
        seq.features.push(is1a);
        seq.features.push(Feature::new("repeat_region", 31, 38, -1, "IS1"));
        seq.features.push(Feature::new("gene", 12, 14, 1, "insA"));

        let mut refs = ReferenceSequences::new();
        refs.push(seq);
        refs
    }

    #[rstest]
    fn test_lookup(refs: ReferenceSequences) {
        assert!(refs.contains("chr"));
        assert_eq!(refs.sequence_length("chr").unwrap(), 48);
        assert!(refs.get("missing").is_err());
    }

    #[rstest]
    fn test_repeat_family_sequence(refs: ReferenceSequences) {
        let pick = refs.repeat_family_sequence("IS1", 1, None).unwrap();
        assert_eq!(pick.sequence, "CCCCGGTT");
        assert_eq!(pick.feature.start, 11);

        let pick = refs.repeat_family_sequence("IS1", -1, None).unwrap();
        assert_eq!(pick.sequence, "AACCGGGG");

        let pick = refs.repeat_family_sequence("IS1", 1, Some("chr:31-38")).unwrap();
        assert_eq!(pick.feature.start, 31);
        assert_eq!(pick.sequence, "CCCCGGTT");

        assert!(refs.repeat_family_sequence("IS5", 1, None).is_err());
    }

    #[rstest]
    #[case(19, -1, Some(11))]
    #[case(22, -1, None)]
    #[case(28, 1, Some(31))]
    #[case(20, 1, None)]
    fn test_find_closest_repeat_boundary(
        refs: ReferenceSequences,
        #[case] position: i64,
        #[case] direction: i8,
        #[case] expected_start: Option<i64>,
    ) {
        let found = refs.find_closest_repeat_boundary("chr", position, 3, direction);
        assert_eq!(found.map(|f| f.start), expected_start);
    }

    #[rstest]
    fn test_repeat_features(refs: ReferenceSequences) {
        let source = refs.clone();
        let mut target = refs;
        target.insert_after("chr", 1, "CCCCGGTT", "MOB 1").unwrap();
        target
            .repeat_features("chr", 2, 0, 0, &source, "chr", 1, 11, 18)
            .unwrap();

        let seq = target.get("chr").unwrap();
        let copied: Vec<(i64, i64, &str)> = seq
            .features
            .iter()
            .filter(|f| f.start < 10)
            .map(|f| (f.start, f.end, f.name.as_str()))
            .collect();
        assert_eq!(copied, vec![(2, 9, "IS1"), (3, 5, "insA")]);
    }

    #[rstest]
    fn test_region_features(mut refs: ReferenceSequences) {
        let found = refs.region_features("chr", 11, 18).unwrap();
        let names: Vec<&str> = found.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["IS1", "insA"]);

        let moved: Vec<Feature> = found
            .into_iter()
            .map(|mut f| {
                f.start += 30;
                f.end += 30;
                f
            })
            .collect();
        refs.add_features("chr", moved).unwrap();
        assert_eq!(refs.get("chr").unwrap().features.len(), 5);
        assert!(refs.add_features("missing", Vec::new()).is_err());
    }

    #[rstest]
    fn test_remove_empty_sequences(mut refs: ReferenceSequences) {
        refs.push(Sequence::new("empty", ""));
        refs.remove_empty_sequences();
        assert_eq!(refs.len(), 1);
        assert!(!refs.contains("empty"));
        assert!(refs.contains("chr"));
    }
}
