//! Removing mutations inside masked regions or outside a region of interest.
use std::collections::BTreeMap;

use gdtools_refseq::parse_region;

use crate::coords::reference_span;
use crate::errors::Result;
use crate::genome_diff::GenomeDiff;
use crate::hotspots::is_small_mutation;
use crate::models::{Group, Kind, Record};
use crate::settings::Settings;

///
/// Sorted, non-overlapping intervals per sequence. Flagging an interval that
/// touches or overlaps existing ones merges them.
///
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlaggedRegions {
    regions: BTreeMap<String, Vec<(i64, i64)>>,
}

impl FlaggedRegions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flag(&mut self, seq_id: &str, start: i64, end: i64) {
        let (mut start, mut end) = (start.min(end), start.max(end));
        let list = self.regions.entry(seq_id.to_string()).or_default();

        list.retain(|&(s, e)| {
            let touches = s <= end + 1 && start <= e + 1;
            if touches {
                start = start.min(s);
                end = end.max(e);
            }
            !touches
        });
        let at = list.partition_point(|&(s, _)| s < start);
        list.insert(at, (start, end));
    }

    pub fn contains(&self, seq_id: &str, start: i64, end: i64) -> bool {
        self.regions
            .get(seq_id)
            .is_some_and(|l| l.iter().any(|&(s, e)| s <= start && end <= e))
    }

    pub fn overlaps(&self, seq_id: &str, start: i64, end: i64) -> bool {
        self.regions
            .get(seq_id)
            .is_some_and(|l| l.iter().any(|&(s, e)| s <= end && start <= e))
    }

    /// Every region, ordered by sequence id then start.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64, i64)> {
        self.regions
            .iter()
            .flat_map(|(seq_id, l)| l.iter().map(move |&(s, e)| (seq_id.as_str(), s, e)))
    }
}

fn flag_record(regions: &mut FlaggedRegions, record: &Record) -> Result<()> {
    let (start, end) = reference_span(record)?;
    regions.flag(record.seq_id()?, start.position, end.position);
    Ok(())
}

impl GenomeDiff {
    ///
    /// Drop mutations that lie inside a MASK or UN region of `mask_gd`, then
    /// replace all evidence with one UN record per masked or unknown region.
    ///
    /// With `only_small`, only small mutations are dropped, and never ones
    /// tagged `mediated` or `between`.
    ///
    pub fn mask_mutations(
        &mut self,
        mask_gd: &GenomeDiff,
        only_small: bool,
        settings: &Settings,
    ) -> Result<()> {
        let mut regions = FlaggedRegions::new();
        for record in mask_gd.list(&[Kind::Mask, Kind::Un]) {
            flag_record(&mut regions, record)?;
        }

        let mut masked = Vec::new();
        for record in self.entries.iter().filter(|r| r.is_mutation()) {
            if only_small {
                let small = is_small_mutation(record, settings.mask_small_max_size)?
                    && !record.has("mediated")
                    && !record.has("between");
                if !small {
                    continue;
                }
            }
            let (start, end) = reference_span(record)?;
            if regions.contains(record.seq_id()?, start.position, end.position) {
                log::info!("Removing mutation contained within masked region:\n{}", record);
                masked.push(record.id.clone());
            }
        }
        for id in masked {
            self.remove(&id);
        }

        for record in self.list(&[Kind::Un]) {
            flag_record(&mut regions, record)?;
        }
        self.remove_group(Group::Evidence);

        for (seq_id, start, end) in regions.iter() {
            let un = Record::new(Kind::Un, "")
                .with("seq_id", seq_id)
                .with("start", start)
                .with("end", end);
            self.add(un, true);
        }
        self.reassign_unique_ids()
    }

    ///
    /// Keep only mutations overlapping `region` (`seq_id:start-end`).
    ///
    pub fn filter_to_within_region(&mut self, region: &str) -> Result<()> {
        let (seq_id, start, end) = parse_region(region)?;
        let mut regions = FlaggedRegions::new();
        regions.flag(&seq_id, start, end);

        let mut outside = Vec::new();
        for record in self.entries.iter().filter(|r| r.is_mutation()) {
            let (s, e) = reference_span(record)?;
            if !regions.overlaps(record.seq_id()?, s.position, e.position) {
                outside.push(record.id.clone());
            }
        }
        for id in outside {
            self.remove(&id);
        }
        Ok(())
    }
}
