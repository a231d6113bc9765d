//! `adjacent`, `between` and `mediated` tags for mutations next to repeats.
use fxhash::FxHashMap as HashMap;
use gdtools_refseq::ReferenceSequences;

use crate::coords::reference_span;
use crate::errors::Result;
use crate::models::{Kind, Record};
use crate::settings::Settings;

const IGNORE: &str = "ignore";
const HOTSPOT_KEYS: [&str; 3] = ["adjacent", "between", "mediated"];

///
/// Whether a mutation counts as a small indel or point change at `cutoff`.
///
pub fn is_small_mutation(record: &Record, cutoff: i64) -> Result<bool> {
    let small = match record.kind {
        Kind::Snp => true,
        Kind::Del => record.size()? <= cutoff || record.has("repeat_new_copies"),
        Kind::Ins => {
            record.new_seq()?.len() as i64 <= cutoff || record.has("repeat_new_copies")
        }
        Kind::Sub => (record.new_seq()?.len() as i64 - record.size()?).abs() <= cutoff,
        _ => false,
    };
    Ok(small)
}

///
/// Tag `record` with the repeat family found within `slop_distance` of its
/// boundaries in `refs`.
///
/// Large DEL/AMP with a repeat at both ends are `between` it, large DEL with
/// one at a single end is `mediated` by it, and small mutations near one are
/// `adjacent`. Existing tags are kept unless replaced. With `warn_only`, the
/// record is left untouched and tags that look stale are only reported.
///
pub fn annotate_repeat_hotspots(
    record: &mut Record,
    refs: &ReferenceSequences,
    settings: &Settings,
    warn_only: bool,
) -> Result<()> {
    let mut nearby: HashMap<&str, String> = HashMap::default();
    for key in HOTSPOT_KEYS {
        if let Some(value) = record.get(key) {
            nearby.insert(key, value.to_string());
        }
    }

    let mut both_close_key = IGNORE;
    let mut one_close_key = IGNORE;

    if matches!(record.kind, Kind::Del | Kind::Amp)
        && record.size()? > settings.size_cutoff_amp_becomes_ins_del
    {
        both_close_key = "between";
        one_close_key = match record.kind {
            Kind::Amp => IGNORE,
            _ => "mediated",
        };
    }
    if is_small_mutation(record, settings.mask_small_max_size)? {
        both_close_key = "adjacent";
        one_close_key = "adjacent";
    }
    if record.kind == Kind::Mob {
        both_close_key = IGNORE;
        one_close_key = IGNORE;
    }

    let seq_id = record.seq_id()?;
    let (start, end) = reference_span(record)?;
    let slop = settings.slop_distance;
    let near = |position: i64, first: i8, second: i8| {
        refs.find_closest_repeat_boundary(seq_id, position, slop, first)
            .or_else(|| refs.find_closest_repeat_boundary(seq_id, position, slop, second))
    };
    let start_repeat = near(start.position, -1, 1);
    let end_repeat = near(end.position, 1, -1);

    match (start_repeat, end_repeat) {
        (Some(s), Some(e)) if s.name != e.name => {
            log::warn!(
                "Mutation has boundaries near two different repeat families, saving only the first one:\n{}",
                record
            );
            nearby.insert(one_close_key, s.name.clone());
        }
        (Some(s), Some(_)) => {
            nearby.insert(both_close_key, s.name.clone());
        }
        (Some(f), None) | (None, Some(f)) => {
            nearby.insert(one_close_key, f.name.clone());
        }
        (None, None) => {}
    }

    if !warn_only {
        for key in HOTSPOT_KEYS {
            if let Some(value) = nearby.get(key) {
                record.set(key, value);
            }
        }
        return Ok(());
    }

    let found = |key: &str| nearby.get(key).map(String::as_str).unwrap_or_default();
    if record.get("adjacent").unwrap_or_default() != found("adjacent") {
        log::warn!(
            "Possible 'adjacent' tag should be added with value ({}) due to later mutation:\n{}",
            found("adjacent"),
            record
        );
    }
    if !record.has("between") && !record.has("mediated") {
        for key in ["between", "mediated"] {
            if !found(key).is_empty() {
                log::warn!(
                    "Possible '{}' tag should be added due to later mutation:\n{}",
                    key,
                    record
                );
            }
        }
    }
    Ok(())
}
