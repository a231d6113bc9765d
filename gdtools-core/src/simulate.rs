//! Seeded random mutations for benchmarking.
use std::str::FromStr;

use gdtools_refseq::{ReferenceSequences, Sequence};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::errors::{GenomeDiffError, Result};
use crate::genome_diff::GenomeDiff;
use crate::mask::FlaggedRegions;
use crate::models::{Kind, Record};
use crate::normalize::normalize_record;
use crate::settings::Settings;

const BASES: [char; 4] = ['A', 'C', 'G', 'T'];

///
/// What to simulate, parsed from `KIND[:min[-max[:min_copies[-max_copies]]]]`.
/// Sizes default to 1 and copy numbers, for AMP, to 2.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationRequest {
    pub kind: Kind,
    pub min_size: i64,
    pub max_size: i64,
    pub min_copies: i64,
    pub max_copies: i64,
}

impl FromStr for SimulationRequest {
    type Err = GenomeDiffError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = |why: &str| GenomeDiffError::InvalidSimulation(format!("{} ({})", why, s));
        let tokens: Vec<&str> = s.split([':', '-', ',']).map(str::trim).collect();

        let kind: Kind = tokens[0].parse()?;
        if !matches!(kind, Kind::Snp | Kind::Ins | Kind::Del | Kind::Amp | Kind::Mob) {
            return Err(invalid("only SNP, INS, DEL, AMP and MOB can be simulated"));
        }

        let numbers = tokens[1..]
            .iter()
            .map(|t| t.parse::<i64>())
            .collect::<std::result::Result<Vec<i64>, _>>()
            .map_err(|_| invalid("sizes must be integers"))?;
        let (min_size, max_size, min_copies, max_copies) = match numbers.as_slice() {
            [] => (1, 1, 2, 2),
            [size] => (*size, *size, 2, 2),
            [min, max] => (*min, *max, 2, 2),
            [min, max, copies] => (*min, *max, *copies, *copies),
            [min, max, min_c, max_c] => (*min, *max, *min_c, *max_c),
            _ => return Err(invalid("too many values")),
        };

        if min_size < 1 || max_size < min_size {
            return Err(invalid("sizes must be positive with min <= max"));
        }
        if min_copies < 2 || max_copies < min_copies {
            return Err(invalid("copy numbers must be at least 2 with min <= max"));
        }

        Ok(SimulationRequest {
            kind,
            min_size,
            max_size,
            min_copies,
            max_copies,
        })
    }
}

fn random_base_except(rng: &mut StdRng, base: char) -> char {
    let choices: Vec<char> = BASES.iter().copied().filter(|b| *b != base).collect();
    choices[rng.random_range(0..choices.len())]
}

fn random_bases(rng: &mut StdRng, size: i64) -> String {
    (0..size).map(|_| BASES[rng.random_range(0..BASES.len())]).collect()
}

// One attempt at a mutation; None when it normalizes into something else.
fn candidate(
    request: &SimulationRequest,
    seq: &Sequence,
    refs: &ReferenceSequences,
    rng: &mut StdRng,
    buffer: i64,
) -> Result<Option<(Record, i64, i64)>> {
    let size = match request.kind {
        Kind::Snp => 1,
        _ => rng.random_range(request.min_size..=request.max_size),
    };
    let last_start = seq.length() - buffer - size;
    if last_start <= buffer {
        return Err(GenomeDiffError::InvalidSimulation(format!(
            "reference sequence {} is too short for size {} with buffer {}",
            seq.seq_id, size, buffer
        )));
    }
    let position = rng.random_range(buffer + 1..=last_start);

    let mut record = Record::new(request.kind, "")
        .with("seq_id", &seq.seq_id)
        .with("position", position);

    match request.kind {
        Kind::Snp => {
            let reference = seq.subsequence(position, position)?;
            let base = reference.chars().next().unwrap_or('N');
            record.set("new_seq", random_base_except(rng, base));
        }
        Kind::Ins => record.set("new_seq", random_bases(rng, size)),
        Kind::Del => record.set("size", size),
        Kind::Amp => {
            let copies = rng.random_range(request.min_copies..=request.max_copies);
            record.set("size", size);
            record.set("new_copy_number", copies);
            return Ok(Some((record, position, size * copies)));
        }
        Kind::Mob => {
            // an insertion of the duplicated bases must stay where it is
            let duplicated = seq.subsequence(position, position + size - 1)?;
            let mut probe = Record::new(Kind::Ins, "")
                .with("seq_id", &seq.seq_id)
                .with("position", position)
                .with("new_seq", &duplicated);
            normalize_record(&mut probe, refs)?;
            if probe.kind != Kind::Ins
                || probe.position()? != position
                || probe.get("new_seq") != Some(duplicated.as_str())
            {
                return Ok(None);
            }

            let repeats: Vec<&str> = seq.repeats().map(|f| f.name.as_str()).collect();
            let repeat_name = repeats[rng.random_range(0..repeats.len())];
            let strand = if rng.random_bool(0.5) { 1 } else { -1 };
            record.set("repeat_name", repeat_name);
            record.set("strand", strand);
            record.set("duplication_size", size);
            return Ok(Some((record, position, size)));
        }
        _ => return Ok(None),
    }

    normalize_record(&mut record, refs)?;
    record.remove("norm_pos");
    if record.kind != request.kind || record.is_commented_out() {
        return Ok(None);
    }
    let position = record.position()?;
    Ok(Some((record, position, size)))
}

impl GenomeDiff {
    ///
    /// Add `count` random mutations on the first reference sequence, drawn
    /// from a stream seeded with `seed`.
    ///
    /// Sites keep `buffer` bases away from repeats and from each other. Each
    /// mutation gets up to `simulate_max_attempts` tries; generation stops
    /// early, with a warning, when no site can be found. Returns how many
    /// mutations were added.
    ///
    pub fn random_mutations(
        &mut self,
        request: &SimulationRequest,
        count: usize,
        buffer: i64,
        refs: &ReferenceSequences,
        seed: u64,
        settings: &Settings,
    ) -> Result<usize> {
        let seq = refs
            .iter()
            .next()
            .ok_or_else(|| GenomeDiffError::InvalidSimulation("no reference sequences".to_string()))?;
        if request.kind == Kind::Mob && seq.repeats().next().is_none() {
            return Err(GenomeDiffError::InvalidSimulation(format!(
                "no repeat regions in reference sequence {} to insert",
                seq.seq_id
            )));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut excluded = FlaggedRegions::new();
        for repeat in seq.repeats() {
            excluded.flag(&seq.seq_id, repeat.start, repeat.end);
        }
        let mut used = FlaggedRegions::new();

        let mut added = 0;
        'mutations: while added < count {
            for _ in 0..settings.simulate_max_attempts {
                let Some((record, position, span)) = candidate(request, seq, refs, &mut rng, buffer)? else {
                    continue;
                };
                let (start, end) = (position - buffer, position + span + buffer);
                if excluded.overlaps(&seq.seq_id, start, end) || used.overlaps(&seq.seq_id, start, end) {
                    continue;
                }

                used.flag(&seq.seq_id, position, position + span);
                self.add(record, true);
                added += 1;
                continue 'mutations;
            }

            log::warn!(
                "Forced to halt mutation generation after {} attempts; only {} of {} mutations were placed.",
                settings.simulate_max_attempts,
                added,
                count
            );
            break;
        }
        Ok(added)
    }
}
